use std::path::Path;

use chrono::Utc;

use crate::{config::ALLOWED_UPLOAD_EXTENSIONS, error::AppError};

/// Returns the lowercase extension when the filename is acceptable.
pub fn allowed_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?.to_lowercase();
    ALLOWED_UPLOAD_EXTENSIONS
        .contains(&ext.as_str())
        .then_some(ext)
}

/// Persists an uploaded submission file and returns its public URL.
///
/// Files are stored flat under the upload directory with a millisecond
/// timestamp name; the original filename only contributes its extension.
pub async fn store_upload(
    upload_dir: &str,
    original_name: &str,
    bytes: &[u8],
) -> Result<String, AppError> {
    let ext = allowed_extension(original_name).ok_or_else(|| {
        AppError::BadRequest("Only PDF, DOC, DOCX, PPTX and ZIP files are allowed".to_string())
    })?;

    let filename = format!("{}.{}", Utc::now().timestamp_millis(), ext);

    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let path = Path::new(upload_dir).join(&filename);
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(format!("/uploads/{}", filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_listed_extensions_case_insensitively() {
        assert_eq!(allowed_extension("report.PDF").as_deref(), Some("pdf"));
        assert_eq!(allowed_extension("slides.pptx").as_deref(), Some("pptx"));
        assert_eq!(allowed_extension("archive.zip").as_deref(), Some("zip"));
    }

    #[test]
    fn rejects_everything_else() {
        assert_eq!(allowed_extension("script.exe"), None);
        assert_eq!(allowed_extension("noextension"), None);
        assert_eq!(allowed_extension("image.png"), None);
    }
}
