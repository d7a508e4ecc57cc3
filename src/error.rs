//! Error types for the docblocks library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ExtractionError`]: an extractor could not turn the bytes it was
//!   dispatched into blocks (corrupt file, parser failure, a page that would
//!   not rasterise). It never escapes [`crate::process`]: the orchestrator
//!   folds it into a [`crate::output::DocumentResult`] with `status: error`
//!   and the error's `Display` text as the message.
//!
//! * [`DocBlocksError`]: **Fatal** for the library surface around the
//!   pipeline: reading an input, downloading a URL, writing output, building
//!   an invalid configuration. Returned as `Err` from the convenience
//!   functions and the CLI plumbing.

use std::path::PathBuf;
use thiserror::Error;

/// A failure inside one format extractor.
///
/// The message carries the underlying cause so the error envelope is useful
/// for diagnostics on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    // ── PDF ───────────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF could not be opened: {0}")]
    CorruptPdf(String),

    /// PDF requires a password but none was configured.
    #[error("PDF is encrypted and requires a password")]
    PasswordRequired,

    /// A password was configured but it is wrong.
    #[error("Wrong password for encrypted PDF")]
    WrongPassword,

    /// The text layer of a page could not be read.
    #[error("Text extraction failed for page {page}: {detail}")]
    TextExtractionFailed { page: usize, detail: String },

    /// pdfium returned an error while rendering a page without text.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// The pdfium library could not be bound.
    #[error(
        "PDF engine unavailable: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumUnavailable(String),

    // ── Images ────────────────────────────────────────────────────────────
    /// The byte stream sniffed as an image but could not be decoded.
    #[error("Image could not be decoded ({media_type}): {detail}")]
    ImageDecode { media_type: String, detail: String },

    /// PNG encoding of a decoded or rendered image failed.
    #[error("PNG encoding failed: {0}")]
    ImageEncode(String),

    // ── Office ────────────────────────────────────────────────────────────
    /// docx-rs could not parse the archive.
    #[error("DOCX could not be parsed: {0}")]
    Docx(String),

    /// The document parsed but contained neither paragraphs nor tables.
    #[error("document has no extractable text")]
    NoExtractableText,

    /// calamine could not parse the workbook or its first sheet.
    #[error("Spreadsheet could not be parsed: {0}")]
    Spreadsheet(String),

    /// The workbook parsed but has no sheets.
    #[error("Spreadsheet has no sheets")]
    EmptyWorkbook,

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (panicked worker, timeout, ...).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Fatal errors returned by the library surface around the pipeline.
#[derive(Debug, Error)]
pub enum DocBlocksError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a file path, `-`, or a valid HTTP/HTTPS URL.
    #[error("Invalid input '{input}': not a file path, '-', or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// Reading a local file or stdin failed.
    #[error("Failed to read '{input}': {source}")]
    ReadFailed {
        input: String,
        #[source]
        source: std::io::Error,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output JSON file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rasterisation_failed_display() {
        let e = ExtractionError::RasterisationFailed {
            page: 5,
            detail: "bitmap allocation".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("page 5"), "got: {msg}");
        assert!(msg.contains("bitmap allocation"));
    }

    #[test]
    fn no_extractable_text_display() {
        assert_eq!(
            ExtractionError::NoExtractableText.to_string(),
            "document has no extractable text"
        );
    }

    #[test]
    fn image_decode_display_names_media_type() {
        let e = ExtractionError::ImageDecode {
            media_type: "image/jpeg".into(),
            detail: "truncated".into(),
        };
        assert!(e.to_string().contains("image/jpeg"));
    }

    #[test]
    fn pdfium_unavailable_display_has_hint() {
        let e = ExtractionError::PdfiumUnavailable("dlopen failed".into());
        assert!(e.to_string().contains("PDFIUM_LIB_PATH"));
    }

    #[test]
    fn download_timeout_display() {
        let e = DocBlocksError::DownloadTimeout {
            url: "https://example.org/a.pdf".into(),
            secs: 30,
        };
        assert!(e.to_string().contains("30s"));
    }
}
