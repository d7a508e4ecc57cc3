//! Content-based media type detection.
//!
//! A file's name and declared type are never consulted: the media type is
//! derived from the bytes on every call. Magic numbers come from `infer`;
//! two container formats need a second look because their signature alone
//! is ambiguous:
//!
//! * ZIP archives are OOXML documents when they carry `word/document.xml`
//!   (DOCX) or `xl/workbook.xml` (XLSX). Any other archive is left to
//!   `infer`, which names EPUB and OpenDocument packages before plain ZIP.
//! * OLE compound files are legacy Word documents when they carry a
//!   `WordDocument` stream.

use std::io::Cursor;
use tracing::trace;

pub const PDF: &str = "application/pdf";
pub const LEGACY_WORD: &str = "application/msword";
pub const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const ZIP: &str = "application/zip";
pub const OLE_STORAGE: &str = "application/x-ole-storage";
pub const PLAIN_TEXT: &str = "text/plain";
pub const OCTET_STREAM: &str = "application/octet-stream";

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const CFB_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// The closed set of formats the pipeline can extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Pdf,
    Image,
    LegacyWord,
    Docx,
    Xlsx,
}

impl DocumentFormat {
    /// Map a sniffed media type onto the dispatch table.
    ///
    /// Returns `None` for everything the pipeline does not handle.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        match media_type {
            PDF => Some(Self::Pdf),
            LEGACY_WORD => Some(Self::LegacyWord),
            DOCX => Some(Self::Docx),
            XLSX => Some(Self::Xlsx),
            m if m.starts_with("image/") => Some(Self::Image),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Image => "image",
            Self::LegacyWord => "doc",
            Self::Docx => "docx",
            Self::Xlsx => "xlsx",
        }
    }
}

/// Determine the media type of `bytes`.
///
/// Never fails: unrecognised content yields `application/octet-stream`.
pub fn sniff(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return OCTET_STREAM.to_string();
    }

    if bytes.starts_with(ZIP_MAGIC) {
        if let Some(mime) = sniff_zip(bytes) {
            return mime.to_string();
        }
    }

    if bytes.starts_with(CFB_MAGIC) {
        if let Some(mime) = sniff_compound_file(bytes) {
            return mime.to_string();
        }
    }

    if let Some(kind) = infer::get(bytes) {
        trace!(mime = kind.mime_type(), "signature match");
        return kind.mime_type().to_string();
    }

    if !bytes.contains(&0) && std::str::from_utf8(bytes).is_ok() {
        return PLAIN_TEXT.to_string();
    }

    OCTET_STREAM.to_string()
}

/// Look inside a ZIP directory for the OOXML main parts.
fn sniff_zip(bytes: &[u8]) -> Option<&'static str> {
    let archive = match zip::ZipArchive::new(Cursor::new(bytes)) {
        Ok(a) => a,
        Err(e) => {
            trace!("zip directory unreadable: {e}");
            return None;
        }
    };

    let has = |part: &str| archive.file_names().any(|n| n == part);
    if has("word/document.xml") {
        Some(DOCX)
    } else if has("xl/workbook.xml") {
        Some(XLSX)
    } else {
        None
    }
}

/// Look inside an OLE compound file for a Word body stream.
fn sniff_compound_file(bytes: &[u8]) -> Option<&'static str> {
    let compound = match cfb::CompoundFile::open(Cursor::new(bytes)) {
        Ok(c) => c,
        Err(e) => {
            trace!("compound file unreadable: {e}");
            return None;
        }
    };

    if compound.is_stream("/WordDocument") {
        Some(LEGACY_WORD)
    } else {
        // Excel/PowerPoint binaries: let `infer` name them if it can.
        infer::get(bytes)
            .map(|k| k.mime_type())
            .or(Some(OLE_STORAGE))
    }
}
