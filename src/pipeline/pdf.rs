//! PDF extractor: one block per page, text when the page has a text layer,
//! a rasterised PNG when it does not.
//!
//! The decision policy is written against the [`PdfPages`] seam rather than
//! pdfium directly, so it can be driven by a scripted document in tests. The
//! production backend lives in [`crate::pipeline::pdfium`].
//!
//! ## Per-page decision
//!
//! ```text
//! page_text(i, x_tolerance) ──▶ clean_text ──▶ non-empty? ──yes──▶ TextBlock(i+1)
//!                                                   │
//!                                                   no
//!                                                   ▼
//!                           render_page(i, dpi) ──▶ PNG ──▶ ImageBlock(i+1, application/pdf)
//! ```
//!
//! Any failure on any page aborts the document; partial block lists are
//! never returned.

use crate::config::PipelineConfig;
use crate::error::ExtractionError;
use crate::output::ContentBlock;
use crate::pipeline::cleanup::clean_text;
use crate::pipeline::encode::encode_png;
use crate::sniff::PDF;
use image::DynamicImage;
use std::time::Instant;
use tracing::{debug, info};

/// Read access to the pages of one opened PDF.
///
/// Page indices are 0-based here; blocks carry 1-based page numbers.
pub trait PdfPages {
    fn page_count(&self) -> usize;

    /// Text layer of a page, laid out with the given horizontal tolerance.
    fn page_text(&self, index: usize, x_tolerance: f32) -> Result<String, ExtractionError>;

    /// Rasterise a page at `dpi`, longest edge capped at `max_pixels`.
    fn render_page(
        &self,
        index: usize,
        dpi: u32,
        max_pixels: u32,
    ) -> Result<DynamicImage, ExtractionError>;
}

/// Something that can open PDF bytes and lend out their pages.
///
/// The opened document only lives for the duration of `f`.
pub trait PdfBackend: Send + Sync {
    fn with_document(
        &self,
        bytes: &[u8],
        password: Option<&str>,
        f: &mut dyn FnMut(&dyn PdfPages) -> Result<Vec<ContentBlock>, ExtractionError>,
    ) -> Result<Vec<ContentBlock>, ExtractionError>;
}

/// Extract a PDF with the given backend.
pub fn extract_pdf_with(
    backend: &dyn PdfBackend,
    bytes: &[u8],
    config: &PipelineConfig,
) -> Result<Vec<ContentBlock>, ExtractionError> {
    backend.with_document(bytes, config.password.as_deref(), &mut |pages: &dyn PdfPages| {
        extract_pdf_pages(pages, config)
    })
}

/// Classify every page of an opened document, in page order.
pub fn extract_pdf_pages(
    pages: &dyn PdfPages,
    config: &PipelineConfig,
) -> Result<Vec<ContentBlock>, ExtractionError> {
    let total = pages.page_count();
    info!("PDF opened: {} pages", total);
    if let Some(cb) = &config.progress_callback {
        cb.on_pdf_start(total);
    }

    let start = Instant::now();
    let mut blocks = Vec::with_capacity(total);
    for index in 0..total {
        let block = classify_page(pages, index, config)?;
        if let Some(cb) = &config.progress_callback {
            cb.on_page_classified(index + 1, total, block.kind());
        }
        blocks.push(block);
    }

    debug!(
        "Classified {} pages in {}ms",
        total,
        start.elapsed().as_millis()
    );
    Ok(blocks)
}

/// Turn one page into a text block, or an image block when it has no text.
pub fn classify_page(
    pages: &dyn PdfPages,
    index: usize,
    config: &PipelineConfig,
) -> Result<ContentBlock, ExtractionError> {
    let page_num = index + 1;
    let raw = pages.page_text(index, config.x_tolerance)?;
    let text = clean_text(&raw);

    if !text.is_empty() {
        debug!("Page {page_num}: text ({} chars)", text.len());
        return Ok(ContentBlock::text(Some(page_num as u32), text));
    }

    let img = pages.render_page(index, config.dpi, config.max_rendered_pixels)?;
    debug!(
        "Page {page_num}: no text layer, rendered {}x{}",
        img.width(),
        img.height()
    );
    let png = encode_png(&img)?;
    Ok(ContentBlock::image(Some(page_num as u32), PDF, png))
}

// ── Text layout ──────────────────────────────────────────────────────────────

/// A positioned character from a page's text layer, in PDF units
/// (origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub ch: char,
    pub left: f32,
    pub bottom: f32,
    pub width: f32,
    pub height: f32,
}

impl Glyph {
    fn right(&self) -> f32 {
        self.left + self.width
    }
}

/// Lay out glyphs (in content-stream order) as plain text.
///
/// * A vertical jump of more than half a glyph height starts a new line.
/// * On the same line, a horizontal gap wider than `x_tolerance` between two
///   glyphs becomes a single space; closer glyphs are joined.
/// * Whitespace glyphs are word boundaries, never copied verbatim.
pub fn layout_glyphs(glyphs: &[Glyph], x_tolerance: f32) -> String {
    let mut out = String::new();
    let mut last: Option<Glyph> = None;
    let mut pending_space = false;

    for g in glyphs {
        if g.ch.is_whitespace() || g.ch.is_control() {
            pending_space = true;
            continue;
        }

        if let Some(prev) = last {
            let line_height = prev.height.max(g.height).max(1.0);
            if (g.bottom - prev.bottom).abs() > line_height * 0.5 {
                out.push('\n');
            } else {
                let gap = g.left - prev.right();
                if pending_space || gap > x_tolerance {
                    out.push(' ');
                }
            }
        }

        out.push(g.ch);
        last = Some(*g);
        pending_space = false;
    }

    out
}
