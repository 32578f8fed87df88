//! Turns uploaded bytes into plain text according to their media type.

use axum::http::StatusCode;
use tracing::debug;

use crate::error_handler::{AppError, AppResult};

/// How an upload is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Pdf,
    Text,
}

/// Decides the decoding from the part's `Content-Type` (parameters ignored)
/// and, for `application/octet-stream` or a missing type, the file name.
///
/// # Errors
/// [`AppError::UnsupportedMediaType`] for anything that is neither PDF nor text.
pub fn classify(content_type: Option<&str>, file_name: Option<&str>) -> AppResult<UploadKind> {
    let essence = content_type
        .map(|ct| ct.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let pdf_name = file_name
        .map(|n| n.trim().to_ascii_lowercase().ends_with(".pdf"))
        .unwrap_or(false);

    match essence.as_str() {
        "application/pdf" => Ok(UploadKind::Pdf),
        "application/octet-stream" if pdf_name => Ok(UploadKind::Pdf),
        "application/octet-stream" | "application/json" => Ok(UploadKind::Text),
        t if t.starts_with("text/") => Ok(UploadKind::Text),
        other => Err(AppError::UnsupportedMediaType(other.to_string())),
    }
}

/// Extracts text from `bytes`. PDF parsing runs on the blocking pool.
pub async fn extract_text(kind: UploadKind, bytes: Vec<u8>) -> AppResult<String> {
    match kind {
        UploadKind::Text => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        UploadKind::Pdf => {
            let size = bytes.len();
            let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
                .await
                .map_err(|e| AppError::Http {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    code: "JOIN_ERROR",
                    message: format!("PDF extraction task failed: {e}"),
                })?
                .map_err(|e| AppError::Http {
                    status: StatusCode::UNPROCESSABLE_ENTITY,
                    code: "UNREADABLE_DOCUMENT",
                    message: format!("Could not read text from the PDF: {e}"),
                })?;
            debug!(size, chars = text.chars().count(), "pdf text extracted");
            Ok(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_by_type_or_by_name() {
        assert_eq!(classify(Some("application/pdf"), None).unwrap(), UploadKind::Pdf);
        assert_eq!(
            classify(Some("application/octet-stream"), Some("Prices.PDF")).unwrap(),
            UploadKind::Pdf
        );
        assert_eq!(classify(None, Some("faq.pdf")).unwrap(), UploadKind::Pdf);
    }

    #[test]
    fn text_like_types_are_decoded_as_text() {
        for ct in [
            "text/plain",
            "text/markdown; charset=utf-8",
            "application/json",
            "application/octet-stream",
            "TEXT/CSV",
        ] {
            assert_eq!(classify(Some(ct), Some("faq.txt")).unwrap(), UploadKind::Text, "{ct}");
        }
        assert_eq!(classify(None, None).unwrap(), UploadKind::Text);
    }

    #[test]
    fn other_types_are_unsupported() {
        let err = classify(Some("image/png"), Some("x.png")).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(err.error_code(), "UNSUPPORTED_MEDIA_TYPE");
    }

    #[tokio::test]
    async fn text_is_decoded_lossily() {
        let text = extract_text(UploadKind::Text, b"caf\xff price".to_vec()).await.unwrap();
        assert_eq!(text, "caf\u{fffd} price");
    }

    #[tokio::test]
    async fn garbage_pdf_is_unreadable() {
        let err = extract_text(UploadKind::Pdf, b"not a pdf at all".to_vec())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "UNREADABLE_DOCUMENT");
    }
}
