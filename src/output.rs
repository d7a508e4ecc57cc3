//! Output types: content blocks and the per-document result envelope.
//!
//! The in-memory shapes keep raw PNG bytes; base64 only appears when a
//! block is serialised, because the JSON boundary is text-only.
//!
//! Wire shape of a result:
//!
//! ```text
//! {
//!   "status": "success",
//!   "blocks": [
//!     {"type": "bloco_texto",  "source_page": 1, "content": "..."},
//!     {"type": "bloco_imagem", "source_page": 2,
//!      "content": {"original_mime_type": "application/pdf",
//!                  "image_base64_png": "iVBORw0KGgo..."}}
//!   ],
//!   "message": "PDF processed: 2 pages"
//! }
//! ```

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;

/// Which kind of block a page or document produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Text,
    Image,
}

/// Extracted text for one page (PDF) or one whole document (other formats).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextBlock {
    /// 1-indexed page number; only set for formats with intrinsic pages.
    pub source_page: Option<u32>,
    /// Non-empty text with trailing whitespace removed.
    #[serde(rename = "content")]
    pub text: String,
}

/// A rendered or re-encoded image, always PNG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlock {
    /// 1-indexed page number; only set for formats with intrinsic pages.
    pub source_page: Option<u32>,
    /// Media type of the file the image came from (e.g. `application/pdf`).
    pub original_media_type: String,
    /// PNG-encoded pixels.
    pub image_bytes: Vec<u8>,
}

impl Serialize for ImageBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Payload<'a> {
            original_mime_type: &'a str,
            image_base64_png: String,
        }

        let mut state = serializer.serialize_struct("ImageBlock", 2)?;
        state.serialize_field("source_page", &self.source_page)?;
        state.serialize_field(
            "content",
            &Payload {
                original_mime_type: &self.original_media_type,
                image_base64_png: STANDARD.encode(&self.image_bytes),
            },
        )?;
        state.end()
    }
}

/// One unit of extracted content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "bloco_texto")]
    Text(TextBlock),
    #[serde(rename = "bloco_imagem")]
    Image(ImageBlock),
}

impl ContentBlock {
    /// Build a text block, dropping trailing whitespace.
    pub fn text(source_page: Option<u32>, text: impl Into<String>) -> Self {
        let mut text = text.into();
        text.truncate(text.trim_end().len());
        ContentBlock::Text(TextBlock { source_page, text })
    }

    /// Build a PNG image block.
    pub fn image(
        source_page: Option<u32>,
        original_media_type: impl Into<String>,
        image_bytes: Vec<u8>,
    ) -> Self {
        ContentBlock::Image(ImageBlock {
            source_page,
            original_media_type: original_media_type.into(),
            image_bytes,
        })
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            ContentBlock::Text(_) => BlockKind::Text,
            ContentBlock::Image(_) => BlockKind::Image,
        }
    }

    pub fn source_page(&self) -> Option<u32> {
        match self {
            ContentBlock::Text(t) => t.source_page,
            ContentBlock::Image(i) => i.source_page,
        }
    }

    pub fn as_text(&self) -> Option<&TextBlock> {
        match self {
            ContentBlock::Text(t) => Some(t),
            ContentBlock::Image(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageBlock> {
        match self {
            ContentBlock::Image(i) => Some(i),
            ContentBlock::Text(_) => None,
        }
    }
}

/// Envelope status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
    Unsupported,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Success => "success",
            Status::Error => "error",
            Status::Unsupported => "unsupported",
        };
        f.write_str(s)
    }
}

/// The outcome of processing one file.
///
/// `blocks` is empty whenever `status` is not [`Status::Success`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentResult {
    pub status: Status,
    pub blocks: Vec<ContentBlock>,
    pub message: String,
}

impl DocumentResult {
    pub fn success(blocks: Vec<ContentBlock>, message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            blocks,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            blocks: Vec::new(),
            message: message.into(),
        }
    }

    /// Envelope for a media type outside the dispatch table.
    pub fn unsupported(media_type: &str) -> Self {
        Self {
            status: Status::Unsupported,
            blocks: Vec::new(),
            message: format!("{media_type} not supported"),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Number of blocks of the given kind.
    pub fn count(&self, kind: BlockKind) -> usize {
        self.blocks.iter().filter(|b| b.kind() == kind).count()
    }
}
