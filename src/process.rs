//! Pipeline orchestration: sniff, dispatch, wrap the outcome.
//!
//! [`process`] is the one synchronous entry point; everything else here is
//! a convenience around it for async callers. No extractor failure ever
//! escapes as `Err`: the envelope's `status` carries it.

use crate::config::PipelineConfig;
use crate::error::{DocBlocksError, ExtractionError};
use crate::output::{BlockKind, ContentBlock, DocumentResult};
use crate::pipeline::{docx, image, input, legacy_doc, pdf, pdfium, spreadsheet};
use crate::sniff::{sniff, DocumentFormat};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Turn raw bytes into a [`DocumentResult`].
///
/// The media type is always derived from `bytes`; there is no way to pass
/// a filename or declared type.
///
/// # Example
/// ```rust
/// use docblocks::{process, PipelineConfig, Status};
///
/// let result = process(b"\x7fELF\x02\x01\x01\x00", &PipelineConfig::default());
/// assert_eq!(result.status, Status::Unsupported);
/// assert!(result.blocks.is_empty());
/// ```
pub fn process(bytes: &[u8], config: &PipelineConfig) -> DocumentResult {
    let start = Instant::now();
    let media_type = sniff(bytes);
    debug!("Sniffed {} bytes as {}", bytes.len(), media_type);

    if let Some(cb) = &config.progress_callback {
        cb.on_document_start(&media_type);
    }

    let result = match DocumentFormat::from_media_type(&media_type) {
        Some(format) => {
            debug!("Dispatching to {} extractor", format.name());
            match extract(format, bytes, &media_type, config) {
                Ok(blocks) => {
                    let message = success_message(format, &media_type, &blocks);
                    DocumentResult::success(blocks, message)
                }
                Err(e) => {
                    warn!("{} extraction failed: {}", format.name(), e);
                    DocumentResult::error(e.to_string())
                }
            }
        }
        None => {
            info!("Unsupported media type: {}", media_type);
            DocumentResult::unsupported(&media_type)
        }
    };

    info!(
        "Processed {} → {} ({} text, {} image blocks) in {}ms",
        media_type,
        result.status,
        result.count(BlockKind::Text),
        result.count(BlockKind::Image),
        start.elapsed().as_millis()
    );

    if let Some(cb) = &config.progress_callback {
        cb.on_document_complete(result.status, result.blocks.len());
    }

    result
}

fn extract(
    format: DocumentFormat,
    bytes: &[u8],
    media_type: &str,
    config: &PipelineConfig,
) -> Result<Vec<ContentBlock>, ExtractionError> {
    match format {
        DocumentFormat::Pdf => pdf::extract_pdf_with(&pdfium::PdfiumBackend, bytes, config),
        DocumentFormat::Image => image::extract_image(bytes, media_type),
        DocumentFormat::LegacyWord => legacy_doc::extract_legacy_doc(bytes, media_type, config),
        DocumentFormat::Docx => docx::extract_docx(bytes),
        DocumentFormat::Xlsx => spreadsheet::extract_xlsx(bytes),
    }
}

fn success_message(format: DocumentFormat, media_type: &str, blocks: &[ContentBlock]) -> String {
    match format {
        DocumentFormat::Pdf => format!("PDF processed: {} pages", blocks.len()),
        DocumentFormat::Image => format!("Image file ({media_type}) processed."),
        DocumentFormat::LegacyWord => {
            "Legacy Word document processed (best effort).".to_string()
        }
        DocumentFormat::Docx => "DOCX file processed.".to_string(),
        DocumentFormat::Xlsx => "XLSX file processed.".to_string(),
    }
}

/// Run [`process`] on tokio's blocking pool.
///
/// Extraction is CPU-bound (and pdfium is synchronous), so it must not run
/// on an async worker thread. A panic inside the task becomes an error
/// envelope.
pub async fn process_async(bytes: Vec<u8>, config: &PipelineConfig) -> DocumentResult {
    let config = config.clone();
    match tokio::task::spawn_blocking(move || process(&bytes, &config)).await {
        Ok(result) => result,
        Err(e) => {
            warn!("Processing task failed: {}", e);
            let err = ExtractionError::Internal(format!("processing task failed: {e}"));
            DocumentResult::error(err.to_string())
        }
    }
}

/// [`process_async`] with an upper bound on wall-clock time.
///
/// The blocking task is not cancelled on expiry; its result is discarded.
pub async fn process_with_timeout(
    bytes: Vec<u8>,
    config: &PipelineConfig,
    timeout: Duration,
) -> DocumentResult {
    match tokio::time::timeout(timeout, process_async(bytes, config)).await {
        Ok(result) => result,
        Err(_) => {
            warn!("Processing timed out after {:?}", timeout);
            DocumentResult::error(format!("processing timed out after {timeout:?}"))
        }
    }
}

/// Process many documents with at most `concurrency` in flight.
///
/// Results come back in input order regardless of completion order.
pub async fn process_batch(
    inputs: Vec<Vec<u8>>,
    config: &PipelineConfig,
    concurrency: usize,
) -> Vec<DocumentResult> {
    let concurrency = concurrency.max(1);
    info!(
        "Processing {} documents, concurrency {}",
        inputs.len(),
        concurrency
    );

    stream::iter(inputs)
        .map(|bytes| process_async(bytes, config))
        .buffered(concurrency)
        .collect()
        .await
}

/// Read a local file and process it.
///
/// # Errors
/// Only read failures are returned as `Err`; extraction outcomes are always
/// in the envelope.
pub async fn process_file(
    path: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<DocumentResult, DocBlocksError> {
    let path = path.as_ref();
    let bytes = input::read_local(path).await?;
    info!("Processing file: {}", path.display());
    Ok(process_async(bytes, config).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Status;
    use crate::progress::ProcessProgressCallback;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Events(Mutex<Vec<String>>);

    impl ProcessProgressCallback for Events {
        fn on_document_start(&self, media_type: &str) {
            self.0.lock().unwrap().push(format!("start {media_type}"));
        }
        fn on_document_complete(&self, status: Status, block_count: usize) {
            self.0
                .lock()
                .unwrap()
                .push(format!("done {status} {block_count}"));
        }
    }

    #[test]
    fn elf_is_unsupported() {
        let elf = b"\x7fELF\x02\x01\x01\x00\x00\x00\x00\x00\x00\x00\x00\x00";
        let result = process(elf, &PipelineConfig::default());
        assert_eq!(result.status, Status::Unsupported);
        assert!(result.blocks.is_empty());
        assert!(result.message.ends_with("not supported"), "{}", result.message);
    }

    #[test]
    fn plain_text_is_unsupported() {
        let result = process(b"just some notes", &PipelineConfig::default());
        assert_eq!(result.status, Status::Unsupported);
        assert_eq!(result.message, "text/plain not supported");
    }

    #[test]
    fn empty_input_is_unsupported() {
        let result = process(&[], &PipelineConfig::default());
        assert_eq!(result.status, Status::Unsupported);
        assert_eq!(result.message, "application/octet-stream not supported");
    }

    #[test]
    fn broken_image_is_an_error_envelope() {
        // PNG signature followed by garbage
        let bytes = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDRgarbage";
        let result = process(bytes, &PipelineConfig::default());
        assert_eq!(result.status, Status::Error);
        assert!(result.blocks.is_empty());
        assert!(result.message.contains("image/png"), "{}", result.message);
    }

    #[test]
    fn callback_sees_start_and_completion() {
        let events = Arc::new(Events::default());
        let config = PipelineConfig::builder()
            .progress_callback(events.clone())
            .build()
            .unwrap();

        process(b"plain words", &config);

        let seen = events.0.lock().unwrap().clone();
        assert_eq!(seen, vec!["start text/plain", "done unsupported 0"]);
    }

    #[test]
    fn success_messages() {
        let blocks = vec![ContentBlock::text(Some(1), "a"), ContentBlock::text(Some(2), "b")];
        assert_eq!(
            success_message(DocumentFormat::Pdf, "application/pdf", &blocks),
            "PDF processed: 2 pages"
        );
        assert_eq!(
            success_message(DocumentFormat::Image, "image/gif", &[]),
            "Image file (image/gif) processed."
        );
    }

    #[tokio::test]
    async fn batch_keeps_input_order() {
        let inputs = vec![b"one".to_vec(), Vec::new(), b"\x7fELF\x02\x01\x01\x00".to_vec()];
        let results = process_batch(inputs, &PipelineConfig::default(), 2).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].message, "text/plain not supported");
        assert_eq!(results[1].message, "application/octet-stream not supported");
        assert_eq!(results[2].status, Status::Unsupported);
    }

    #[tokio::test]
    async fn generous_timeout_returns_result() {
        let config = PipelineConfig::default();
        let result = process_with_timeout(b"text".to_vec(), &config, Duration::from_secs(30)).await;
        assert_eq!(result.status, Status::Unsupported);
    }

    #[tokio::test]
    async fn process_file_missing_path() {
        let err = process_file("/no/such/upload.pdf", &PipelineConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DocBlocksError::FileNotFound { .. }));
    }
}
