use crate::config::UploadLimits;
use crate::error::ValidationError;
use crate::model::{bytes_to_mb, UploadFile};

/// Checks size, then extension, then MIME type, stopping at the first failure.
pub fn validate_file(file: &UploadFile, limits: &UploadLimits) -> Result<(), ValidationError> {
    if file.size > limits.max_file_size {
        return Err(ValidationError::TooLarge {
            limit_mb: bytes_to_mb(limits.max_file_size),
            actual_mb: file.size_mb(),
        });
    }

    // A name without a dot is reported whole, lowercased.
    let extension = file
        .extension()
        .unwrap_or_else(|| file.name.to_lowercase());
    if !limits.allowed_extensions.contains(&extension) {
        return Err(ValidationError::UnsupportedExtension { extension });
    }

    if !limits
        .allowed_mime_types
        .iter()
        .any(|mime| *mime == file.mime_type)
    {
        return Err(ValidationError::UnsupportedMimeType);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;

    fn check(name: &str, mime: &str, size: u64) -> Result<(), ValidationError> {
        validate_file(
            &UploadFile::from_metadata(name, mime, size),
            &UploadLimits::default(),
        )
    }

    #[test]
    fn accepts_pdf_and_csv() {
        assert!(check("a.pdf", "application/pdf", MB).is_ok());
        assert!(check("b.csv", "text/csv", MB).is_ok());
    }

    #[test]
    fn limit_is_inclusive() {
        assert!(check("a.pdf", "application/pdf", 10 * MB).is_ok());
        assert!(check("a.pdf", "application/pdf", 10 * MB + 1).is_err());
    }

    #[test]
    fn oversize_message_reports_actual_size() {
        let err = check("big.pdf", "application/pdf", 15 * MB).unwrap_err();
        assert_eq!(
            err.to_string(),
            "File size exceeds 10MB limit. Your file is 15.0MB."
        );
    }

    #[test]
    fn fractional_limit_is_reported_exactly() {
        let limits = UploadLimits {
            max_file_size: 5 * MB + MB / 2,
            ..UploadLimits::default()
        };
        let err = validate_file(
            &UploadFile::from_metadata("big.pdf", "application/pdf", 6 * MB),
            &limits,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "File size exceeds 5.5MB limit. Your file is 6.0MB."
        );
    }

    #[test]
    fn size_failure_short_circuits_other_checks() {
        let err = check("big.exe", "application/x-msdownload", 15 * MB).unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { .. }));
        assert!(!err.to_string().contains(".exe"));
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(check("REPORT.PDF", "application/pdf", MB).is_ok());
    }

    #[test]
    fn extension_message_names_detected_extension() {
        let err = check("notes.docx", "application/pdf", MB).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Only PDF and CSV files are allowed. You selected a .docx file."
        );
    }

    #[test]
    fn name_without_dot_is_reported_whole() {
        let err = check("README", "text/csv", MB).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnsupportedExtension {
                extension: "readme".to_string()
            }
        );
    }

    #[test]
    fn mime_failure_does_not_echo_type() {
        let err = check("data.csv", "application/vnd.ms-excel", MB).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid file type. Only PDF and CSV files are supported."
        );
    }
}
