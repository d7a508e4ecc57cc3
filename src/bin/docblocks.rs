//! CLI binary for docblocks.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PipelineConfig`, resolves inputs, and prints the JSON envelopes.

use anyhow::{Context, Result};
use clap::Parser;
use docblocks::pipeline::input::{resolve_input, ResolvedInput};
use docblocks::{
    process_async, process_with_timeout, sniff, BlockKind, DocumentResult, PipelineConfig,
    ProcessProgressCallback, ProgressCallback, Status,
};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// One bar over all inputs; the message follows the most recent PDF page.
/// Documents may complete out of order when `--concurrency` > 1.
struct CliProgressCallback {
    bar: ProgressBar,
    scanned_pages: AtomicUsize,
}

impl CliProgressCallback {
    fn new(total_documents: usize) -> Arc<Self> {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        let bar = ProgressBar::new(total_documents as u64);
        bar.set_style(style);
        bar.set_prefix("Extracting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            scanned_pages: AtomicUsize::new(0),
        })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProcessProgressCallback for CliProgressCallback {
    fn on_document_start(&self, media_type: &str) {
        self.bar.set_message(media_type.to_string());
    }

    fn on_pdf_start(&self, total_pages: usize) {
        self.bar.set_message(format!("PDF, {total_pages} pages"));
    }

    fn on_page_classified(&self, page_num: usize, total_pages: usize, kind: BlockKind) {
        if kind == BlockKind::Image {
            self.scanned_pages.fetch_add(1, Ordering::Relaxed);
        }
        self.bar
            .set_message(format!("page {page_num}/{total_pages}"));
    }

    fn on_document_complete(&self, _status: Status, _block_count: usize) {
        self.bar.inc(1);
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # One file, JSON envelope on stdout
  docblocks upload.pdf

  # Several files, processed 8 at a time, written atomically to a file
  docblocks --concurrency 8 a.pdf b.docx c.xlsx -o results.json

  # Read from stdin
  cat scan.jpg | docblocks -

  # Download first
  docblocks https://example.org/report.pdf --pretty

  # Only report the detected media type
  docblocks --sniff-only mystery.bin

SUPPORTED FORMATS:
  application/pdf            text per page, or a PNG render for pages without text
  image/*                    re-encoded as PNG
  DOCX                       paragraphs, then tables
  application/msword         best-effort text recovery
  XLSX                       first sheet as a text table

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH            Path to libpdfium (file or directory)
  RUST_LOG                   Log filter, overrides --verbose/--quiet
  DOCBLOCKS_*                Fallback for every flag (e.g. DOCBLOCKS_DPI=300)

EXIT STATUS:
  0 when every input ends in success or unsupported, 1 when any ends in error.
"#;

/// Sniff files and turn them into ordered text/image content blocks.
#[derive(Parser, Debug)]
#[command(
    name = "docblocks",
    version,
    about = "Sniff files and turn them into ordered text/image content blocks",
    long_about = "Detect the real type of each input from its bytes and extract it into an \
ordered list of text and image blocks: PDF pages (text, or a rendered image when the page has \
no text), images, DOCX, legacy .doc, and XLSX. Prints one JSON envelope per input.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local file paths, `-` for stdin, or HTTP/HTTPS URLs.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Write JSON to this file instead of stdout.
    #[arg(short, long, env = "DOCBLOCKS_OUTPUT")]
    output: Option<PathBuf>,

    /// Render DPI for PDF pages without text (72–600).
    #[arg(long, env = "DOCBLOCKS_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Horizontal gap (PDF units) above which glyphs are split into words.
    #[arg(long, env = "DOCBLOCKS_X_TOLERANCE", default_value_t = 2.0)]
    x_tolerance: f32,

    /// Longest edge, in pixels, of a rendered PDF page.
    #[arg(long, env = "DOCBLOCKS_MAX_PIXELS", default_value_t = 10_000)]
    max_pixels: u32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "DOCBLOCKS_PASSWORD")]
    password: Option<String>,

    /// Per-document processing timeout in seconds.
    #[arg(long, env = "DOCBLOCKS_TIMEOUT")]
    timeout: Option<u64>,

    /// Number of documents processed concurrently.
    #[arg(short, long, env = "DOCBLOCKS_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "DOCBLOCKS_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Pretty-print the JSON output.
    #[arg(long, env = "DOCBLOCKS_PRETTY")]
    pretty: bool,

    /// Print the detected media type of each input, no extraction.
    #[arg(long)]
    sniff_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "DOCBLOCKS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCBLOCKS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCBLOCKS_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO-level library logs are suppressed while the progress bar is up.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.sniff_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Resolve inputs ───────────────────────────────────────────────────
    let mut resolved = Vec::with_capacity(cli.inputs.len());
    for input in &cli.inputs {
        let r = resolve_input(input, cli.download_timeout)
            .await
            .with_context(|| format!("Failed to read input '{input}'"))?;
        resolved.push(r);
    }

    // ── Sniff-only mode ──────────────────────────────────────────────────
    if cli.sniff_only {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        for r in &resolved {
            writeln!(handle, "{}\t{}", r.label, sniff(&r.bytes))
                .context("Failed to write to stdout")?;
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress = if show_progress {
        Some(CliProgressCallback::new(resolved.len()))
    } else {
        None
    };
    let config = build_config(
        &cli,
        progress
            .clone()
            .map(|p| p as Arc<dyn ProcessProgressCallback>),
    )?;

    // ── Run pipeline ─────────────────────────────────────────────────────
    let start = Instant::now();
    let results = run(&resolved, &config, cli.timeout, cli.concurrency).await;

    if let Some(p) = &progress {
        p.finish();
    }

    let json = render_json(&results, cli.pretty).context("Failed to serialise output")?;
    match &cli.output {
        Some(path) => write_atomic(path, &json).await?,
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(json.as_bytes())
                .context("Failed to write to stdout")?;
            handle.write_all(b"\n").ok();
        }
    }

    // ── Summary ──────────────────────────────────────────────────────────
    let failed = results.iter().filter(|r| r.status == Status::Error).count();
    if !cli.quiet {
        for (input, result) in resolved.iter().zip(&results) {
            print_summary_line(input, result);
        }
        let scanned = progress
            .as_ref()
            .map(|p| p.scanned_pages.load(Ordering::Relaxed))
            .unwrap_or(0);
        eprintln!(
            "{}  {}/{} files  {}ms{}{}",
            if failed == 0 { green("✔") } else { cyan("⚠") },
            results.len() - failed,
            results.len(),
            start.elapsed().as_millis(),
            if scanned > 0 {
                dim(&format!("  ({scanned} pages rendered)"))
            } else {
                String::new()
            },
            match &cli.output {
                Some(path) => format!("  →  {}", bold(&path.display().to_string())),
                None => String::new(),
            },
        );
    }

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .dpi(cli.dpi)
        .x_tolerance(cli.x_tolerance)
        .max_rendered_pixels(cli.max_pixels);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Process every input with bounded concurrency, results in input order.
async fn run(
    inputs: &[ResolvedInput],
    config: &PipelineConfig,
    timeout_secs: Option<u64>,
    concurrency: usize,
) -> Vec<DocumentResult> {
    stream::iter(inputs)
        .map(|input| {
            let bytes = input.bytes.clone();
            async move {
                match timeout_secs {
                    Some(secs) => {
                        process_with_timeout(bytes, config, Duration::from_secs(secs)).await
                    }
                    None => process_async(bytes, config).await,
                }
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}

/// A single envelope for one input, an array otherwise.
fn render_json(results: &[DocumentResult], pretty: bool) -> serde_json::Result<String> {
    match (results, pretty) {
        ([single], true) => serde_json::to_string_pretty(single),
        ([single], false) => serde_json::to_string(single),
        (many, true) => serde_json::to_string_pretty(many),
        (many, false) => serde_json::to_string(many),
    }
}

/// Write via a temp file + rename so readers never see a partial file.
async fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, contents)
        .await
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("Failed to write output file {}", path.display()))?;
    Ok(())
}

fn print_summary_line(input: &ResolvedInput, result: &DocumentResult) {
    let mark = match result.status {
        Status::Success => green("✓"),
        Status::Unsupported => dim("–"),
        Status::Error => red("✗"),
    };

    // Truncate very long messages to keep output tidy.
    let msg: String = if result.message.chars().count() > 80 {
        let cut: String = result.message.chars().take(79).collect();
        format!("{cut}\u{2026}")
    } else {
        result.message.clone()
    };

    eprintln!(
        "  {} {}  {}  {}",
        mark,
        input.label,
        dim(&format!(
            "{} text / {} image",
            result.count(BlockKind::Text),
            result.count(BlockKind::Image)
        )),
        if result.status == Status::Error {
            red(&msg)
        } else {
            msg
        },
    );
}
