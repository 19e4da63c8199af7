//! Text extraction for uploaded documents.

use std::path::Path;
use thiserror::Error;

const PREVIEW_CHARS: usize = 500;

/// Errors raised while turning a file into plain text.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// File extension is neither `.pdf` nor `.txt`.
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),
    /// The PDF could not be parsed.
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    /// The document parsed but holds no text.
    #[error("No extractable text found in {0}")]
    NoExtractableText(String),
    /// A text file was not valid UTF-8.
    #[error("Text file is not valid UTF-8: {0}")]
    InvalidUtf8(String),
    /// Reading the file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Portable Document Format.
    Pdf,
    /// Plain UTF-8 text.
    Text,
}

/// Plain text extracted from a document.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    /// Original filename.
    pub filename: String,
    /// Detected format.
    pub kind: DocumentKind,
    /// Full extracted text.
    pub text: String,
}

impl ExtractedDocument {
    /// First 500 characters of the text, followed by `...` when the text is longer.
    pub fn preview(&self) -> String {
        let head: String = self.text.chars().take(PREVIEW_CHARS).collect();
        if self.text.chars().nth(PREVIEW_CHARS).is_some() {
            format!("{head}...")
        } else {
            head
        }
    }
}

/// Extract text from file bytes, choosing the parser by file extension.
pub fn extract_text(bytes: &[u8], filename: &str) -> Result<ExtractedDocument, DocumentError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    let (kind, text) = match extension.as_str() {
        "pdf" => {
            let text = pdf_extract::extract_text_from_mem(bytes)
                .map_err(|e| DocumentError::Pdf(e.to_string()))?;
            if text.trim().is_empty() {
                return Err(DocumentError::NoExtractableText(filename.to_string()));
            }
            (DocumentKind::Pdf, text)
        }
        "txt" => {
            let text = String::from_utf8(bytes.to_vec())
                .map_err(|_| DocumentError::InvalidUtf8(filename.to_string()))?;
            (DocumentKind::Text, text)
        }
        other => return Err(DocumentError::UnsupportedFormat(other.to_string())),
    };

    tracing::debug!(filename, kind = ?kind, chars = text.len(), "Extracted document text");
    Ok(ExtractedDocument {
        filename: filename.to_string(),
        kind,
        text,
    })
}

/// Read `path` from disk and extract its text.
pub fn load_document(path: &Path) -> Result<ExtractedDocument, DocumentError> {
    let bytes = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    extract_text(&bytes, &filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_plain_text() {
        let document = extract_text(b"Hello, world!\nSecond line.", "notes.TXT").unwrap();
        assert_eq!(document.kind, DocumentKind::Text);
        assert_eq!(document.filename, "notes.TXT");
        assert_eq!(document.text, "Hello, world!\nSecond line.");
    }

    #[test]
    fn rejects_unknown_extensions() {
        let error = extract_text(b"data", "slides.pptx").unwrap_err();
        assert!(matches!(error, DocumentError::UnsupportedFormat(ext) if ext == "pptx"));

        let error = extract_text(b"data", "README").unwrap_err();
        assert!(matches!(error, DocumentError::UnsupportedFormat(ext) if ext.is_empty()));
    }

    #[test]
    fn rejects_invalid_utf8() {
        let error = extract_text(&[0xff, 0xfe, 0x00], "broken.txt").unwrap_err();
        assert!(matches!(error, DocumentError::InvalidUtf8(_)));
    }

    #[test]
    fn garbage_pdf_reports_parse_error() {
        let error = extract_text(b"this is not a pdf", "paper.pdf").unwrap_err();
        assert!(matches!(error, DocumentError::Pdf(_)));
    }

    #[test]
    fn preview_is_capped_at_five_hundred_chars() {
        let document = ExtractedDocument {
            filename: "long.txt".into(),
            kind: DocumentKind::Text,
            text: "é".repeat(600),
        };
        let preview = document.preview();
        assert_eq!(preview.chars().count(), 503);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn short_preview_has_no_ellipsis() {
        let document = extract_text(b"Short note.", "a.txt").unwrap();
        assert_eq!(document.preview(), "Short note.");

        let exact = ExtractedDocument {
            filename: "exact.txt".into(),
            kind: DocumentKind::Text,
            text: "a".repeat(500),
        };
        assert_eq!(exact.preview(), "a".repeat(500));
    }

    #[test]
    fn loads_documents_from_disk() {
        let name = format!("research-assistant-{}.txt", std::process::id());
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, "Stored on disk.").unwrap();
        let document = load_document(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(document.text, "Stored on disk.");
        assert!(document.filename.ends_with(".txt"));

        let missing = load_document(Path::new("/nonexistent/missing.txt")).unwrap_err();
        assert!(matches!(missing, DocumentError::Io(_)));
    }
}
