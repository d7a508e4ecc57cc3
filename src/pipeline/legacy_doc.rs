//! Legacy Word (`.doc`) extractor: best-effort text recovery.
//!
//! The binary Word format is not parsed. Instead a ranked list of
//! [`LegacyTextStrategy`]s is tried in order and the first one that recovers
//! enough text wins:
//!
//! 1. [`ContainerStreams`] opens the OLE compound file and scans the streams
//!    that hold document text for printable-ASCII word runs.
//! 2. [`EncodingFallback`] decodes the raw bytes under a series of legacy
//!    single- and double-byte encodings and keeps the first that produces
//!    enough word-like tokens.
//!
//! Recovered text is prefixed with a provenance note. When nothing usable is
//! found the document still succeeds with an advisory block telling the
//! reader to convert the file; this path never returns an error.

use crate::config::PipelineConfig;
use crate::error::ExtractionError;
use crate::output::ContentBlock;
use crate::pipeline::cleanup::clean_text;
use encoding_rs::Encoding;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{Cursor, Read};
use tracing::debug;

/// Streams of a Word compound file that carry text, in scan order.
const TEXT_STREAMS: &[&str] = &["WordDocument", "1Table", "0Table", "Data"];

static RE_WORD_LIKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[\p{L}\p{N}.,;:!?'"()\-]{3,45}$"#).unwrap());
static RE_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{L}").unwrap());

/// Letters, digits and basic punctuation; 3 to 45 characters with at least
/// one letter. A run of one repeated character (0xFF padding decodes to
/// `ÿÿÿÿ` under windows-1252) is not a word.
fn is_word_like(token: &str) -> bool {
    if !RE_WORD_LIKE.is_match(token) || !RE_LETTER.is_match(token) {
        return false;
    }
    let mut chars = token.chars();
    let first = chars.next();
    !chars.all(|c| Some(c) == first)
}

/// One way of pulling text out of a legacy document.
pub trait LegacyTextStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Recovered text, or `None` when this strategy found nothing.
    fn extract(&self, bytes: &[u8], config: &PipelineConfig) -> Option<String>;
}

/// The default strategy chain, in rank order.
pub fn default_strategies() -> Vec<Box<dyn LegacyTextStrategy>> {
    vec![Box::new(ContainerStreams), Box::new(EncodingFallback)]
}

/// Extract a legacy Word document with the default strategy chain.
pub fn extract_legacy_doc(
    bytes: &[u8],
    media_type: &str,
    config: &PipelineConfig,
) -> Result<Vec<ContentBlock>, ExtractionError> {
    extract_legacy_doc_with(&default_strategies(), bytes, media_type, config)
}

/// Extract with an explicit strategy chain.
pub fn extract_legacy_doc_with(
    strategies: &[Box<dyn LegacyTextStrategy>],
    bytes: &[u8],
    media_type: &str,
    config: &PipelineConfig,
) -> Result<Vec<ContentBlock>, ExtractionError> {
    for strategy in strategies {
        let Some(raw) = strategy.extract(bytes, config) else {
            debug!("legacy strategy '{}': nothing found", strategy.name());
            continue;
        };

        let text = clean_text(&raw);
        let chars = text.chars().count();
        if chars > config.min_text_chars {
            debug!("legacy strategy '{}': {} chars recovered", strategy.name(), chars);
            return Ok(vec![ContentBlock::text(
                None,
                format!("{}\n\n{}", provenance_note(media_type, strategy.name()), text),
            )]);
        }
        debug!(
            "legacy strategy '{}': only {} chars, below threshold {}",
            strategy.name(),
            chars,
            config.min_text_chars
        );
    }

    Ok(vec![ContentBlock::text(None, advisory(media_type, bytes.len()))])
}

fn provenance_note(media_type: &str, strategy: &str) -> String {
    format!(
        "[Best-effort text recovered from a legacy Word document ({media_type}) using {strategy}. \
Formatting may be lost and some passages may be missing or out of order. \
Convert the file to DOCX for a reliable extraction.]"
    )
}

fn advisory(media_type: &str, size: usize) -> String {
    format!(
        "This file is a legacy Word document ({media_type}, {size} bytes) and no readable text \
could be recovered from it. Please convert it to DOCX or PDF and submit it again."
    )
}

// ── Strategy 1: compound-file streams ───────────────────────────────────────

/// Scan the text-bearing streams of the OLE container for printable-ASCII
/// word runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerStreams;

impl LegacyTextStrategy for ContainerStreams {
    fn name(&self) -> &'static str {
        "container-streams"
    }

    fn extract(&self, bytes: &[u8], config: &PipelineConfig) -> Option<String> {
        let mut compound = match cfb::CompoundFile::open(Cursor::new(bytes)) {
            Ok(c) => c,
            Err(e) => {
                debug!("not a compound file: {e}");
                return None;
            }
        };

        let mut words: Vec<String> = Vec::new();
        for name in TEXT_STREAMS {
            let remaining = config.max_words_total.saturating_sub(words.len());
            if remaining == 0 {
                break;
            }

            let path = format!("/{name}");
            if !compound.is_stream(&path) {
                continue;
            }

            let mut data = Vec::new();
            let read = compound
                .open_stream(&path)
                .and_then(|mut s| s.read_to_end(&mut data));
            if let Err(e) = read {
                debug!("stream {path} unreadable: {e}");
                continue;
            }

            let before = words.len();
            words.extend(
                printable_runs(&data)
                    .filter(|run| is_word_like(run))
                    .take(config.max_words_per_stream.min(remaining))
                    .map(str::to_string),
            );
            debug!("stream {path}: {} word runs", words.len() - before);
        }

        if words.is_empty() {
            None
        } else {
            Some(words.join(" "))
        }
    }
}

/// Runs of printable ASCII, everything else acting as a separator.
fn printable_runs(data: &[u8]) -> impl Iterator<Item = &str> {
    data.split(|b| !(0x21..=0x7E).contains(b))
        .filter(|run| !run.is_empty())
        // Every byte is printable ASCII, so the run is valid UTF-8.
        .filter_map(|run| std::str::from_utf8(run).ok())
}

// ── Strategy 2: encoding fallback ───────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Codec {
    /// A WHATWG encoding label understood by `encoding_rs`.
    Label(&'static str),
    /// Byte-to-codepoint ISO-8859-1 (WHATWG folds that label into windows-1252).
    Latin1,
}

const FALLBACK_CODECS: &[Codec] = &[
    Codec::Label("windows-1252"),
    Codec::Latin1,
    Codec::Label("utf-16le"),
    Codec::Label("shift_jis"),
    Codec::Label("gbk"),
    Codec::Label("big5"),
    Codec::Label("euc-kr"),
];

impl Codec {
    fn name(&self) -> &'static str {
        match self {
            Codec::Label(label) => *label,
            Codec::Latin1 => "iso-8859-1",
        }
    }

    fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            Codec::Label(label) => {
                let enc = Encoding::for_label(label.as_bytes())?;
                let (text, _had_errors) = enc.decode_without_bom_handling(bytes);
                Some(text.into_owned())
            }
            Codec::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
        }
    }
}

/// Decode the raw bytes under successive legacy encodings.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodingFallback;

impl LegacyTextStrategy for EncodingFallback {
    fn name(&self) -> &'static str {
        "encoding-fallback"
    }

    fn extract(&self, bytes: &[u8], config: &PipelineConfig) -> Option<String> {
        for codec in FALLBACK_CODECS {
            let Some(decoded) = codec.decode(bytes) else {
                continue;
            };

            let tokens: Vec<&str> = decoded
                .split(|c: char| c.is_whitespace() || c.is_control())
                .filter(|t| is_word_like(t))
                .take(config.max_words_total)
                .collect();

            debug!("encoding {}: {} word-like tokens", codec.name(), tokens.len());
            if tokens.len() > config.min_encoding_tokens {
                return Some(tokens.join(" "));
            }
        }
        None
    }
}
