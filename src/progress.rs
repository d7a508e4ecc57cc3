//! Progress-callback trait for per-document and per-page pipeline events.
//!
//! Inject an [`Arc<dyn ProcessProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events while a document is processed. The CLI drives its progress bar
//! from these; library callers can forward them to logs, channels, or
//! metrics without the pipeline knowing how.
//!
//! # Example
//!
//! ```rust
//! use docblocks::{BlockKind, PipelineConfig, ProcessProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct ScanCounter {
//!     scans: AtomicUsize,
//! }
//!
//! impl ProcessProgressCallback for ScanCounter {
//!     fn on_page_classified(&self, _page: usize, _total: usize, kind: BlockKind) {
//!         if kind == BlockKind::Image {
//!             self.scans.fetch_add(1, Ordering::SeqCst);
//!         }
//!     }
//! }
//!
//! let counter = Arc::new(ScanCounter { scans: AtomicUsize::new(0) });
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(counter as Arc<dyn ProcessProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::{BlockKind, Status};
use std::sync::Arc;

/// Called by the pipeline as it processes a document.
///
/// Implementations must be `Send + Sync`: batch processing runs documents
/// concurrently on the blocking pool. All methods default to no-ops so
/// callers only override what they care about.
pub trait ProcessProgressCallback: Send + Sync {
    /// Called once per document, right after sniffing.
    fn on_document_start(&self, media_type: &str) {
        let _ = media_type;
    }

    /// Called once a PDF has been opened and its page count is known.
    fn on_pdf_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called after each PDF page has been turned into a block.
    ///
    /// # Arguments
    /// * `page_num`   : 1-indexed page number
    /// * `total_pages`: page count of the document
    /// * `kind`       : whether the page yielded text or a rendered image
    fn on_page_classified(&self, page_num: usize, total_pages: usize, kind: BlockKind) {
        let _ = (page_num, total_pages, kind);
    }

    /// Called once per document with the final envelope status.
    fn on_document_complete(&self, status: Status, block_count: usize) {
        let _ = (status, block_count);
    }
}

/// A no-op implementation; the default when no callback is configured.
pub struct NoopProgressCallback;

impl ProcessProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn ProcessProgressCallback>;
