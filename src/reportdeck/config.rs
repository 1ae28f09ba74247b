use crate::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

const CONFIG_FILENAME: &str = "config.json";

/// Configuration for reportdeck, stored in `<config dir>/config.json`.
///
/// Every field falls back to the reference timings and limits when absent,
/// so a partial file only overrides what it names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportDeckConfig {
    /// Quiet period before a typed search query is propagated.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_progress_tick_ms")]
    pub progress_tick_ms: u64,

    #[serde(default = "default_progress_step")]
    pub progress_step: u8,

    /// Highest value the simulated progress reaches before the upload settles.
    #[serde(default = "default_progress_cap")]
    pub progress_cap: u8,

    /// Grace period after a successful upload before progress returns to 0.
    #[serde(default = "default_progress_reset_ms")]
    pub progress_reset_ms: u64,

    /// How long a success status stays visible in the upload widget.
    #[serde(default = "default_status_reset_ms")]
    pub status_reset_ms: u64,

    #[serde(default = "default_list_latency_ms")]
    pub list_latency_ms: u64,

    #[serde(default = "default_upload_latency_ms")]
    pub upload_latency_ms: u64,

    /// Probability in `[0, 1]` that a simulated upload is rejected.
    #[serde(default = "default_upload_failure_rate")]
    pub upload_failure_rate: f64,

    /// Largest accepted upload, in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    #[serde(default = "default_allowed_mime_types")]
    pub allowed_mime_types: Vec<String>,
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_progress_tick_ms() -> u64 {
    200
}

fn default_progress_step() -> u8 {
    10
}

fn default_progress_cap() -> u8 {
    90
}

fn default_progress_reset_ms() -> u64 {
    1000
}

fn default_status_reset_ms() -> u64 {
    5000
}

fn default_list_latency_ms() -> u64 {
    500
}

fn default_upload_latency_ms() -> u64 {
    2000
}

fn default_upload_failure_rate() -> f64 {
    0.1
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

fn default_allowed_extensions() -> Vec<String> {
    vec![".pdf".to_string(), ".csv".to_string()]
}

fn default_allowed_mime_types() -> Vec<String> {
    vec!["application/pdf".to_string(), "text/csv".to_string()]
}

impl Default for ReportDeckConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            progress_tick_ms: default_progress_tick_ms(),
            progress_step: default_progress_step(),
            progress_cap: default_progress_cap(),
            progress_reset_ms: default_progress_reset_ms(),
            status_reset_ms: default_status_reset_ms(),
            list_latency_ms: default_list_latency_ms(),
            upload_latency_ms: default_upload_latency_ms(),
            upload_failure_rate: default_upload_failure_rate(),
            max_file_size: default_max_file_size(),
            allowed_extensions: default_allowed_extensions(),
            allowed_mime_types: default_allowed_mime_types(),
        }
    }
}

/// Timings the store uses for its upload progress simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreTiming {
    pub tick: Duration,
    pub step: u8,
    pub cap: u8,
    pub reset_after: Duration,
}

impl Default for StoreTiming {
    fn default() -> Self {
        ReportDeckConfig::default().store_timing()
    }
}

/// Limits checked by the upload coordinator before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_file_size: u64,
    pub allowed_extensions: Vec<String>,
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadLimits {
    fn default() -> Self {
        ReportDeckConfig::default().upload_limits()
    }
}

/// Behaviour of the simulated repository.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepositorySettings {
    pub list_latency: Duration,
    pub upload_latency: Duration,
    pub upload_failure_rate: f64,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        ReportDeckConfig::default().repository_settings()
    }
}

impl ReportDeckConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: ReportDeckConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_dir.join(CONFIG_FILENAME), content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.upload_failure_rate) {
            return Err(ReportError::Config(format!(
                "upload_failure_rate must be between 0 and 1, got {}",
                self.upload_failure_rate
            )));
        }
        if self.progress_cap > 100 {
            return Err(ReportError::Config(format!(
                "progress_cap must not exceed 100, got {}",
                self.progress_cap
            )));
        }
        if self.progress_tick_ms == 0 {
            return Err(ReportError::Config(
                "progress_tick_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Current value of one field, as JSON.
    pub fn get_value(&self, key: &str) -> Result<serde_json::Value> {
        serde_json::to_value(self)?
            .get(key)
            .cloned()
            .ok_or_else(|| unknown_key(key))
    }

    /// Sets one field from its textual form. `raw` is read as JSON when it
    /// parses (`150`, `0.5`, `[".pdf"]`) and as a plain string otherwise.
    /// The result must pass [`validate`](Self::validate); on error `self` is
    /// left unchanged.
    pub fn set_value(&mut self, key: &str, raw: &str) -> Result<()> {
        let mut fields = serde_json::to_value(&*self)?;
        let slot = fields.get_mut(key).ok_or_else(|| unknown_key(key))?;
        *slot = serde_json::from_str(raw)
            .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));

        let updated: ReportDeckConfig = serde_json::from_value(fields)
            .map_err(|e| ReportError::Config(format!("Invalid value for {}: {}", key, e)))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Drops every simulated latency to zero. Timings that are user facing
    /// (debounce, status reset) are left alone.
    pub fn without_latency(mut self) -> Self {
        self.list_latency_ms = 0;
        self.upload_latency_ms = 0;
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn status_reset(&self) -> Duration {
        Duration::from_millis(self.status_reset_ms)
    }

    pub fn store_timing(&self) -> StoreTiming {
        StoreTiming {
            tick: Duration::from_millis(self.progress_tick_ms),
            step: self.progress_step,
            cap: self.progress_cap,
            reset_after: Duration::from_millis(self.progress_reset_ms),
        }
    }

    pub fn upload_limits(&self) -> UploadLimits {
        UploadLimits {
            max_file_size: self.max_file_size,
            allowed_extensions: self
                .allowed_extensions
                .iter()
                .map(|ext| normalize_extension(ext))
                .collect(),
            allowed_mime_types: self.allowed_mime_types.clone(),
        }
    }

    pub fn repository_settings(&self) -> RepositorySettings {
        RepositorySettings {
            list_latency: Duration::from_millis(self.list_latency_ms),
            upload_latency: Duration::from_millis(self.upload_latency_ms),
            upload_failure_rate: self.upload_failure_rate,
        }
    }
}

fn unknown_key(key: &str) -> ReportError {
    ReportError::Config(format!("Unknown config key: {}", key))
}

/// Lowercases an extension and makes sure it starts with a dot.
fn normalize_extension(ext: &str) -> String {
    let lower = ext.to_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{}", lower)
    }
}
