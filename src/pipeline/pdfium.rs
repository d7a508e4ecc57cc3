//! pdfium-backed [`PdfBackend`]: library binding, document loading, page
//! text with glyph positions, and page rasterisation.
//!
//! ## Binding
//!
//! The native library is bound lazily on the first PDF, never at startup, so
//! workloads without PDFs do not pay for (or fail on) a missing pdfium. The
//! outcome of that first attempt is cached for the life of the process:
//!
//! 1. `PDFIUM_LIB_PATH`: a library file, or a directory holding the
//!    platform-named library (`libpdfium.so`, `libpdfium.dylib`, `pdfium.dll`)
//! 2. otherwise the system library search path
//!
//! Later documents create fresh bindings from the cached location.
//!
//! ## Threading
//!
//! pdfium keeps global state and is not re-entrant. Documents are processed
//! one at a time under a process-wide session lock; callers that want
//! concurrency across formats still get it, PDFs simply queue.

use crate::error::ExtractionError;
use crate::output::ContentBlock;
use crate::pipeline::pdf::{layout_glyphs, Glyph, PdfBackend, PdfPages};
use image::DynamicImage;
use once_cell::sync::Lazy;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info, warn};

const PDF_POINTS_PER_INCH: f32 = 72.0;

// ── Binding ──────────────────────────────────────────────────────────────────

enum BindingState {
    Uninitialized,
    /// Bound successfully; `None` means the system library.
    Ready { lib_path: Option<PathBuf> },
    Failed(String),
}

static PDFIUM_STATE: Lazy<Mutex<BindingState>> =
    Lazy::new(|| Mutex::new(BindingState::Uninitialized));

static PDFIUM_SESSION: Mutex<()> = Mutex::new(());

/// Library location requested through `PDFIUM_LIB_PATH`, if any.
fn library_path_from_env() -> Option<PathBuf> {
    let raw = std::env::var_os("PDFIUM_LIB_PATH")?;
    let path = PathBuf::from(raw);
    if path.is_dir() {
        Some(Pdfium::pdfium_platform_library_name_at_path(&path))
    } else {
        Some(path)
    }
}

fn bind_at(lib_path: Option<&Path>) -> Result<Box<dyn PdfiumLibraryBindings>, PdfiumError> {
    match lib_path {
        Some(path) => Pdfium::bind_to_library(path),
        None => Pdfium::bind_to_system_library(),
    }
}

/// Create a `Pdfium` instance, binding the library on first use.
fn bind_pdfium() -> Result<Pdfium, ExtractionError> {
    let mut state = PDFIUM_STATE
        .lock()
        .map_err(|e| ExtractionError::Internal(format!("pdfium state lock poisoned: {e}")))?;

    match &*state {
        BindingState::Uninitialized => {
            let lib_path = library_path_from_env();
            match bind_at(lib_path.as_deref()) {
                Ok(bindings) => {
                    match &lib_path {
                        Some(p) => info!("pdfium bound from {}", p.display()),
                        None => info!("pdfium bound from system library"),
                    }
                    *state = BindingState::Ready { lib_path };
                    Ok(Pdfium::new(bindings))
                }
                Err(e) => {
                    let msg = e.to_string();
                    warn!("pdfium binding failed: {msg}");
                    *state = BindingState::Failed(msg.clone());
                    Err(ExtractionError::PdfiumUnavailable(msg))
                }
            }
        }
        BindingState::Ready { lib_path } => bind_at(lib_path.as_deref())
            .map(Pdfium::new)
            .map_err(|e| ExtractionError::PdfiumUnavailable(e.to_string())),
        BindingState::Failed(msg) => Err(ExtractionError::PdfiumUnavailable(msg.clone())),
    }
}

/// Whether the pdfium library can be bound in this process.
pub fn pdfium_available() -> bool {
    let _session = PDFIUM_SESSION.lock().unwrap_or_else(PoisonError::into_inner);
    bind_pdfium().is_ok()
}

// ── Backend ──────────────────────────────────────────────────────────────────

/// The production PDF backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfiumBackend;

impl PdfBackend for PdfiumBackend {
    fn with_document(
        &self,
        bytes: &[u8],
        password: Option<&str>,
        f: &mut dyn FnMut(&dyn PdfPages) -> Result<Vec<ContentBlock>, ExtractionError>,
    ) -> Result<Vec<ContentBlock>, ExtractionError> {
        let _session = PDFIUM_SESSION.lock().unwrap_or_else(PoisonError::into_inner);
        let pdfium = bind_pdfium()?;

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, password)
            .map_err(|e| map_load_error(e, password.is_some()))?;

        let pages = PdfiumPages { document };
        f(&pages)
    }
}

fn map_load_error(err: PdfiumError, had_password: bool) -> ExtractionError {
    let password_problem = match &err {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => true,
        other => other.to_string().to_lowercase().contains("password"),
    };

    if password_problem {
        if had_password {
            ExtractionError::WrongPassword
        } else {
            ExtractionError::PasswordRequired
        }
    } else {
        ExtractionError::CorruptPdf(err.to_string())
    }
}

struct PdfiumPages<'a> {
    document: PdfDocument<'a>,
}

impl PdfiumPages<'_> {
    fn page(&self, index: usize) -> Result<PdfPage<'_>, String> {
        let idx = u16::try_from(index).map_err(|_| format!("page index {index} out of range"))?;
        self.document.pages().get(idx).map_err(|e| e.to_string())
    }
}

impl PdfPages for PdfiumPages<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_text(&self, index: usize, x_tolerance: f32) -> Result<String, ExtractionError> {
        let failed = |detail: String| ExtractionError::TextExtractionFailed {
            page: index + 1,
            detail,
        };

        let page = self.page(index).map_err(failed)?;
        let text = page.text().map_err(|e| failed(e.to_string()))?;
        let chars = text.chars();

        let mut glyphs = Vec::new();
        for pdf_char in chars.iter() {
            let Some(ch) = pdf_char.unicode_char() else {
                continue;
            };
            match pdf_char.loose_bounds() {
                Ok(bounds) => glyphs.push(Glyph {
                    ch,
                    left: bounds.left().value,
                    bottom: bounds.bottom().value,
                    width: bounds.width().value,
                    height: bounds.height().value,
                }),
                // Generated spaces and line breaks may have no box; they still
                // separate words.
                Err(_) if ch.is_whitespace() => glyphs.push(Glyph {
                    ch,
                    left: 0.0,
                    bottom: 0.0,
                    width: 0.0,
                    height: 0.0,
                }),
                Err(_) => {}
            }
        }

        debug!("Page {}: {} glyphs", index + 1, glyphs.len());
        Ok(layout_glyphs(&glyphs, x_tolerance))
    }

    fn render_page(
        &self,
        index: usize,
        dpi: u32,
        max_pixels: u32,
    ) -> Result<DynamicImage, ExtractionError> {
        let failed = |detail: String| ExtractionError::RasterisationFailed {
            page: index + 1,
            detail,
        };

        let page = self.page(index).map_err(failed)?;
        let (width, height) =
            render_size(page.width().value, page.height().value, dpi, max_pixels);

        let render_config = PdfRenderConfig::new()
            .set_target_width(width)
            .set_target_height(height);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| failed(e.to_string()))?;

        Ok(bitmap.as_image())
    }
}

/// Pixel size of a page rendered at `dpi`, longest edge capped at `max_pixels`.
fn render_size(width_pt: f32, height_pt: f32, dpi: u32, max_pixels: u32) -> (i32, i32) {
    let scale = dpi as f32 / PDF_POINTS_PER_INCH;
    let mut w = width_pt * scale;
    let mut h = height_pt * scale;

    let longest = w.max(h);
    if longest > max_pixels as f32 {
        let k = max_pixels as f32 / longest;
        w *= k;
        h *= k;
    }

    ((w.round() as i32).max(1), (h.round() as i32).max(1))
}
