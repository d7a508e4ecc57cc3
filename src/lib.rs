//! # docblocks
//!
//! Turn an uploaded file of unknown type into an ordered list of text and
//! image blocks that a reading agent can consume directly.
//!
//! ## Why this crate?
//!
//! Uploads arrive as bytes with untrustworthy names. Each format needs its
//! own extractor, and PDFs are the awkward case: one document can mix born-
//! digital pages with scanned ones. This crate sniffs the real type, routes
//! to the right extractor, and for PDFs decides page by page whether the
//! text layer is usable or the page must be shown as an image.
//!
//! ## Pipeline Overview
//!
//! ```text
//! bytes
//!  │
//!  ├─ 1. Sniff     magic numbers + container peek (ZIP, OLE)
//!  ├─ 2. Dispatch  PDF │ image │ DOCX │ legacy .doc │ XLSX │ unsupported
//!  ├─ 3. Extract   per-format extractor → Vec<ContentBlock>
//!  └─ 4. Envelope  DocumentResult { status, blocks, message }
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docblocks::{process, PipelineConfig};
//!
//! let bytes = std::fs::read("upload.bin").unwrap();
//! let result = process(&bytes, &PipelineConfig::default());
//! println!("{}", serde_json::to_string_pretty(&result).unwrap());
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docblocks` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ## PDF engine
//!
//! PDFs need the pdfium shared library at runtime. It is bound on the first
//! PDF from `PDFIUM_LIB_PATH` or the system library path; without it, PDFs
//! come back as error envelopes and every other format keeps working.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod progress;
pub mod sniff;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use error::{DocBlocksError, ExtractionError};
pub use output::{BlockKind, ContentBlock, DocumentResult, ImageBlock, Status, TextBlock};
pub use pipeline::pdfium::pdfium_available;
pub use process::{process, process_async, process_batch, process_file, process_with_timeout};
pub use progress::{NoopProgressCallback, ProcessProgressCallback, ProgressCallback};
pub use sniff::{sniff, DocumentFormat};
