use thiserror::Error;

/// Reasons a file is rejected before it ever reaches the repository.
///
/// The `Display` output is the exact text shown to the user.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error(
        "File size exceeds {}MB limit. Your file is {actual_mb:.1}MB.",
        format_limit_mb(.limit_mb)
    )]
    TooLarge { limit_mb: f64, actual_mb: f64 },

    #[error("Only PDF and CSV files are allowed. You selected a {extension} file.")]
    UnsupportedExtension { extension: String },

    #[error("Invalid file type. Only PDF and CSV files are supported.")]
    UnsupportedMimeType,
}

/// One decimal place, dropped when it is zero: `10`, `5.5`.
fn format_limit_mb(limit_mb: &f64) -> String {
    let rounded = format!("{:.1}", limit_mb);
    match rounded.strip_suffix(".0") {
        Some(whole) => whole.to_string(),
        None => rounded,
    }
}

#[derive(Error, Debug)]
pub enum ReportError {
    /// A remote (repository) call was rejected. The message is user-displayable.
    #[error("{0}")]
    Repository(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Report not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;
