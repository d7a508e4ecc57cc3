//! Format extractors and the stages they share.
//!
//! Each extractor takes the raw bytes of one format and returns its blocks
//! in source order, or an [`crate::error::ExtractionError`]. None of them
//! sniff: [`crate::process`] has already decided the format.
//!
//! ## Data Flow
//!
//! ```text
//!                 ┌─▶ pdf ──(per page)──▶ text │ pdfium render ─▶ encode
//! input ─▶ sniff ─┼─▶ image ──────────────────────────────────▶ encode
//! (bytes)         ├─▶ docx ──────────▶ cleanup
//!                 ├─▶ legacy_doc ────▶ cleanup
//!                 └─▶ spreadsheet
//! ```
//!
//! 1. [`input`]      : path, `-`, or URL to bytes (CLI and `process_file`)
//! 2. [`pdf`]        : per-page text-or-image policy over the [`pdf::PdfPages`] seam
//! 3. [`pdfium`]     : the pdfium implementation of that seam; pdfium is
//!    synchronous, so async callers go through `spawn_blocking`
//! 4. [`image`]      : decode any raster format, re-encode as PNG
//! 5. [`docx`] / [`legacy_doc`] / [`spreadsheet`]: office formats to text
//! 6. [`encode`] / [`cleanup`]: PNG encoding and text cleanup rules

pub mod cleanup;
pub mod docx;
pub mod encode;
pub mod image;
pub mod input;
pub mod legacy_doc;
pub mod pdf;
pub mod pdfium;
pub mod spreadsheet;
