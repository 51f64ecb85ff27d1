//! CLI binary for pdf2toc.
//!
//! A thin shim over the library crate that maps CLI flags to `TocConfig`
//! and prints the resulting record as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2toc::{
    extract_toc, inspect, ProgressCallback, TocConfig, TocOutcome, TocProgressCallback,
    TocResponse,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar over discovery windows plus
/// per-window log lines. Windows settle out of order under concurrency, so
/// all state is atomic.
struct CliProgress {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgress {
    /// Create a callback whose bar length is set by `on_discovery_start`
    /// (called once the page count is known).
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>2}/{len} windows  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Discovery");
    }
}

impl TocProgressCallback for CliProgress {
    fn on_discovery_start(&self, pages: usize, windows: usize) {
        self.activate_bar(windows);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!(
                "Scanning {pages} pages in {windows} windows…"
            ))
        ));
    }

    fn on_window_complete(&self, window: usize, windows: usize, entries: usize) {
        let note = if entries > 0 {
            green(&format!("{entries} entries"))
        } else {
            dim("no entries")
        };
        self.bar.println(format!(
            "  {} Window {:>2}/{:<2}  {}",
            green("✓"),
            window + 1,
            windows,
            note,
        ));
        self.bar.inc(1);
    }

    fn on_window_error(&self, window: usize, windows: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = if error.len() > 80 {
            format!("{}\u{2026}", &error[..79])
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Window {:>2}/{:<2}  {}",
            red("✗"),
            window + 1,
            windows,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_verification_start(&self, candidate_pages: usize) {
        self.bar.set_prefix("Verifying");
        self.bar
            .set_message(format!("{candidate_pages} candidate pages"));
    }

    fn on_complete(&self, entries: Option<usize>) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        match entries {
            Some(n) => {
                eprintln!("{} {} chapters extracted", green("✔"), bold(&n.to_string()));
                if failed > 0 {
                    eprintln!("  {} {failed} discovery windows failed", cyan("⚠"));
                }
            }
            None => eprintln!("{} no table of contents located", cyan("⚠")),
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract a TOC (JSON on stdout)
  pdf2toc book.pdf

  # Write the JSON to a file
  pdf2toc book.pdf -o toc.json

  # Extract from a URL, scanning more front matter
  pdf2toc https://example.org/book.pdf --max-pages 30

  # Use OpenAI models for both passes
  pdf2toc --provider openai --discovery-model gpt-4.1-nano \
          --verification-model gpt-4.1 book.pdf

  # Inspect PDF metadata (no API key needed)
  pdf2toc --inspect book.pdf

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default models)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  PDF2TOC_LLM_PROVIDER    Override provider (gemini, openai, anthropic, ollama)
  PDFIUM_LIB_PATH         Path to an existing libpdfium

OUTPUT:
  A single JSON object: {"book_title": …, "authors": […], "toc": […]}
  or {"error": …}. A document with no locatable TOC is reported as
  {"error": "no table of contents located"} with exit code 0 — it is a
  result, not a failure.
"#;

/// Extract book metadata and a verified table of contents from a PDF.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2toc",
    version,
    about = "Extract book metadata and a verified TOC from PDFs using Vision LLMs",
    long_about = "Extract book metadata and a table of contents from PDF documents \
(local files or URLs) using Vision Language Models. A fast discovery pass locates \
the contents pages; a higher-fidelity verification pass over just those pages \
produces the final listing.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Write JSON to this file instead of stdout.
    #[arg(short, long, env = "PDF2TOC_OUTPUT")]
    output: Option<PathBuf>,

    /// LLM provider: gemini, openai, anthropic, ollama.
    #[arg(
        long,
        env = "PDF2TOC_LLM_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          The default model pair (gemini-2.5-flash / gemini-2.5-pro) needs only GEMINI_API_KEY."
    )]
    provider: Option<String>,

    /// Model for the broad discovery pass.
    #[arg(long, env = "PDF2TOC_DISCOVERY_MODEL", default_value = "gemini-2.5-flash")]
    discovery_model: String,

    /// Model for the authoritative verification pass.
    #[arg(long, env = "PDF2TOC_VERIFICATION_MODEL", default_value = "gemini-2.5-pro")]
    verification_model: String,

    /// Front-matter pages to analyse.
    #[arg(long, env = "PDF2TOC_MAX_PAGES", default_value_t = 20)]
    max_pages: usize,

    /// Pages per discovery window.
    #[arg(long, env = "PDF2TOC_WINDOW_SIZE", default_value_t = 5)]
    window_size: usize,

    /// Number of concurrent discovery calls.
    #[arg(short, long, env = "PDF2TOC_CONCURRENCY", default_value_t = 8)]
    concurrency: usize,

    /// Rendering DPI (72–400).
    #[arg(long, env = "PDF2TOC_DPI", default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Total attempts per extraction call (first try included).
    #[arg(long, env = "PDF2TOC_MAX_ATTEMPTS", default_value_t = 3)]
    max_attempts: u32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2TOC_PASSWORD")]
    password: Option<String>,

    /// Overall pipeline deadline in seconds.
    #[arg(long, env = "PDF2TOC_TIMEOUT")]
    timeout: Option<u64>,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF2TOC_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Compact JSON output (single line).
    #[arg(long, env = "PDF2TOC_COMPACT")]
    compact: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2TOC_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no extraction.
    #[arg(long)]
    inspect: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2TOC_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the final JSON.
    #[arg(short, long, env = "PDF2TOC_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active; the
    // bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress;
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

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect {
        let info = inspect(&cli.input).await.context("Failed to inspect PDF")?;
        println!("File:         {}", cli.input);
        if let Some(ref t) = info.title {
            println!("Title:        {}", t);
        }
        if let Some(ref a) = info.author {
            println!("Author:       {}", a);
        }
        println!("Pages:        {}", info.page_count);
        println!("PDF Version:  {}", info.pdf_version);
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgress::new_dynamic() as Arc<dyn TocProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress)?;

    // ── Run extraction ───────────────────────────────────────────────────
    let json = match extract_toc(&cli.input, &config).await {
        Ok(report) => {
            if !cli.quiet && cli.no_progress {
                eprintln!(
                    "{} windows dispatched, {} flagged, {} candidate pages, {}ms total",
                    report.stats.windows_dispatched,
                    report.stats.windows_with_toc,
                    report.stats.candidate_pages,
                    report.stats.total_duration_ms,
                );
            }
            match report.outcome {
                TocOutcome::Toc(ref record) => render_json(&TocResponse::from(record), cli.compact)?,
                TocOutcome::NoTocFound => {
                    render_json(&error_body("no table of contents located"), cli.compact)?
                }
            }
        }
        // The process boundary reports failures as an {error} object too;
        // a non-zero exit code still signals genuine failure to shells.
        Err(e) => {
            let body = render_json(&error_body(&e.to_string()), cli.compact)?;
            emit(&cli, &body)?;
            return Err(e.into());
        }
    };

    emit(&cli, &json)?;
    Ok(())
}

/// Map CLI args to `TocConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<TocConfig> {
    let mut builder = TocConfig::builder()
        .dpi(cli.dpi)
        .max_pages(cli.max_pages)
        .window_size(cli.window_size)
        .concurrency(cli.concurrency)
        .discovery_model(&cli.discovery_model)
        .verification_model(&cli.verification_model)
        .max_attempts(cli.max_attempts)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password);
    }
    if let Some(secs) = cli.timeout {
        builder = builder.pipeline_timeout_secs(secs);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn error_body(message: &str) -> serde_json::Value {
    serde_json::json!({ "error": message })
}

fn render_json<T: serde::Serialize>(value: &T, compact: bool) -> Result<String> {
    if compact {
        serde_json::to_string(value).context("Failed to serialise output")
    } else {
        serde_json::to_string_pretty(value).context("Failed to serialise output")
    }
}

/// Write the final JSON to the output file or stdout.
fn emit(cli: &Cli, json: &str) -> Result<()> {
    if let Some(ref path) = cli.output {
        std::fs::write(path, format!("{json}\n"))
            .with_context(|| format!("Failed to write output file {:?}", path))?;
        if !cli.quiet {
            eprintln!("{} wrote {}", green("✔"), bold(&path.display().to_string()));
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(json.as_bytes())
            .context("Failed to write to stdout")?;
        handle.write_all(b"\n").ok();
    }
    Ok(())
}
