use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportKind {
    Vibration,
    Thermal,
}

impl ReportKind {
    /// Name-based classification used for uploads.
    ///
    /// This only looks for the lowercase substring `vibration` in the file name;
    /// it is a placeholder label and says nothing about the file's content.
    pub fn classify(file_name: &str) -> Self {
        if file_name.contains("vibration") {
            ReportKind::Vibration
        } else {
            ReportKind::Thermal
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportKind::Vibration => write!(f, "Vibration"),
            ReportKind::Thermal => write!(f, "Thermal"),
        }
    }
}

/// A diagnostic report as listed by the deck. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub name: String,
    /// Human readable size, e.g. `2.4MB`.
    pub size: String,
    #[serde(rename = "type")]
    pub kind: ReportKind,
    /// ISO calendar date, `YYYY-MM-DD`.
    pub date: String,
}

impl Report {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        size: impl Into<String>,
        kind: ReportKind,
        date: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            size: size.into(),
            kind,
            date: date.into(),
        }
    }

    /// Builds the report that a successful upload of `file` produces.
    pub fn from_upload(id: i64, file: &UploadFile, date: NaiveDate) -> Self {
        Self {
            id,
            name: file.name.clone(),
            size: format_size_mb(file.size),
            kind: ReportKind::classify(&file.name),
            date: date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// A file handed to the deck by a picker or a drop, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    /// Byte length as reported by the file source.
    pub size: u64,
    pub mime_type: String,
    pub content: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: content.len() as u64,
            mime_type: mime_type.into(),
            content,
        }
    }

    /// A file known only by its metadata (no bytes loaded).
    pub fn from_metadata(name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
            content: Vec::new(),
        }
    }

    /// Lowercased extension including the leading dot, or `None` when the
    /// name has no dot at all.
    pub fn extension(&self) -> Option<String> {
        self.name
            .rfind('.')
            .map(|idx| self.name[idx..].to_lowercase())
    }

    pub fn size_mb(&self) -> f64 {
        bytes_to_mb(self.size)
    }
}

pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

/// Formats a byte count the way report sizes are displayed: one decimal, `MB` suffix.
pub fn format_size_mb(bytes: u64) -> String {
    format!("{:.1}MB", bytes_to_mb(bytes))
}
