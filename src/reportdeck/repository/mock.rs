use super::ReportRepository;
use crate::config::RepositorySettings;
use crate::error::{ReportError, Result};
use crate::model::{Report, ReportKind, UploadFile};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time;

pub const UPLOAD_FAILED: &str = "Upload failed";
pub const LIST_FAILED: &str = "Could not list reports";

/// The two reports every fresh repository starts with.
pub fn seed_reports() -> Vec<Report> {
    vec![
        Report::new(
            1,
            "vibration_analysis_01.pdf",
            "2.4MB",
            ReportKind::Vibration,
            "2023-10-01",
        ),
        Report::new(
            2,
            "motor_thermal_B.csv",
            "1.1MB",
            ReportKind::Thermal,
            "2023-10-02",
        ),
    ]
}

/// In-memory repository that behaves like a slow, occasionally failing remote.
///
/// Uploaded reports are kept (most recent first) so later `list` calls see them.
/// Failure injection is explicit: a failure rate of `0.0` never rejects and
/// `1.0` always rejects, and the random source can be seeded.
pub struct MockRepository {
    reports: Arc<Mutex<Vec<Report>>>,
    settings: RepositorySettings,
    rng: Mutex<StdRng>,
    fail_list: AtomicBool,
    last_id: AtomicI64,
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new(RepositorySettings::default())
    }
}

impl MockRepository {
    pub fn new(settings: RepositorySettings) -> Self {
        Self::with_rng(settings, StdRng::from_entropy())
    }

    /// Repository whose failure rolls are reproducible.
    pub fn seeded(settings: RepositorySettings, seed: u64) -> Self {
        Self::with_rng(settings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(settings: RepositorySettings, rng: StdRng) -> Self {
        let reports = seed_reports();
        let last_id = reports.iter().map(|r| r.id).max().unwrap_or(0);
        Self {
            reports: Arc::new(Mutex::new(reports)),
            settings,
            rng: Mutex::new(rng),
            fail_list: AtomicBool::new(false),
            last_id: AtomicI64::new(last_id),
        }
    }

    pub fn settings(&self) -> RepositorySettings {
        self.settings
    }

    /// Makes every subsequent `list` call reject. The reference repository never
    /// does this on its own; it exists to exercise fetch failure handling.
    pub fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.reports().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn reports(&self) -> MutexGuard<'_, Vec<Report>> {
        self.reports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn should_fail_upload(&self) -> bool {
        let roll: f64 = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .gen();
        roll < self.settings.upload_failure_rate
    }

    /// Time-derived ids, bumped when two uploads land in the same millisecond.
    fn next_id(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let previous = self
            .last_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        now.max(previous + 1)
    }
}

impl ReportRepository for MockRepository {
    async fn list(&self) -> Result<Vec<Report>> {
        time::sleep(self.settings.list_latency).await;
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(ReportError::Repository(LIST_FAILED.to_string()));
        }
        Ok(self.reports().clone())
    }

    async fn upload(&self, file: &UploadFile) -> Result<Report> {
        time::sleep(self.settings.upload_latency).await;

        if self.should_fail_upload() {
            tracing::debug!(file = %file.name, "simulated upload rejection");
            return Err(ReportError::Repository(UPLOAD_FAILED.to_string()));
        }

        let report = Report::from_upload(self.next_id(), file, Utc::now().date_naive());
        self.reports().insert(0, report.clone());
        Ok(report)
    }
}
