//! Checks applied to uploaded files before they reach storage.

use regex::Regex;
use std::sync::LazyLock;

use super::body::UploadedFile;
use crate::config::UploadConfig;
use crate::http::response::ApiError;

static UNSAFE_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9.-]").expect("static regex"));

/// Reject a missing, empty, oversized or wrongly typed file.
pub fn validate_file<'a>(file: Option<&'a UploadedFile>, config: &UploadConfig) -> Result<&'a UploadedFile, ApiError> {
    let file = file.ok_or_else(|| ApiError::file("Resume file is required"))?;

    let declared = file
        .content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if !config.allowed_mime_types.iter().any(|m| m.eq_ignore_ascii_case(&declared)) {
        return Err(ApiError::file(
            "Invalid file type. Only PDF, DOC and DOCX files are allowed",
        ));
    }
    if file.is_empty() {
        return Err(ApiError::file("Resume file is empty"));
    }
    if file.len() > config.max_resume_bytes {
        return Err(file_too_large(config.max_resume_bytes));
    }
    Ok(file)
}

/// The rejection for a file over `max_bytes`.
pub fn file_too_large(max_bytes: usize) -> ApiError {
    ApiError::file(format!("File size exceeds the {} limit", size_label(max_bytes)))
}

/// Whole MB where exact, one decimal above 1 MB otherwise, KB below it.
fn size_label(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;
    if bytes >= MB && bytes % MB == 0 {
        format!("{} MB", bytes / MB)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else {
        format!("{} KB", bytes.div_ceil(KB))
    }
}

/// Object name for an upload: `<unix-millis>-<filename>` with unsafe
/// characters replaced by `_`.
pub fn storage_name(filename: &str, unix_millis: i64) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let base = if base.is_empty() || base.chars().all(|c| c == '.') {
        "resume"
    } else {
        base
    };
    format!("{unix_millis}-{}", UNSAFE_NAME_CHARS.replace_all(base, "_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::ErrorKind;
    use axum::body::Bytes;

    fn file(content_type: &str, size: usize) -> UploadedFile {
        UploadedFile {
            filename: "cv.pdf".into(),
            content_type: content_type.into(),
            bytes: Bytes::from(vec![b'x'; size]),
        }
    }

    #[test]
    fn test_accepts_allowed_types() {
        let config = UploadConfig::default();
        for ct in [
            "application/pdf",
            "application/msword",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ] {
            assert!(validate_file(Some(&file(ct, 10)), &config).is_ok(), "{ct}");
        }
    }

    #[test]
    fn test_rejections() {
        let config = UploadConfig::default();
        let too_big = config.max_resume_bytes + 1;
        let cases = [
            None,
            Some(file("image/png", 10)),
            Some(file("application/pdf", 0)),
            Some(file("application/pdf", too_big)),
        ];
        for case in cases {
            let err = validate_file(case.as_ref(), &config).unwrap_err();
            assert_eq!(err.kind, ErrorKind::FileValidationError);
        }
    }

    #[test]
    fn test_size_limit_message() {
        assert_eq!(file_too_large(5 * 1024 * 1024).message, "File size exceeds the 5 MB limit");
        assert_eq!(file_too_large(512 * 1024).message, "File size exceeds the 512 KB limit");
        assert_eq!(file_too_large(1000).message, "File size exceeds the 1 KB limit");
        assert_eq!(size_label(1536 * 1024), "1.5 MB");

        let config = UploadConfig {
            max_resume_bytes: 256 * 1024,
            ..UploadConfig::default()
        };
        let err = validate_file(Some(&file("application/pdf", 300 * 1024)), &config).unwrap_err();
        assert_eq!(err.message, "File size exceeds the 256 KB limit");
    }

    #[test]
    fn test_storage_name() {
        assert_eq!(storage_name("My CV (final).pdf", 1700000000000), "1700000000000-My_CV__final_.pdf");
        assert_eq!(storage_name("../../etc/passwd", 1), "1-passwd");
        assert_eq!(storage_name("..", 1), "1-resume");
        assert_eq!(storage_name("résumé.docx", 2), "2-r_sum_.docx");
    }
}
