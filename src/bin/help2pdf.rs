//! CLI binary for help2pdf.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, waits for the conversion, and reports the outcome.
//!
//! A failed conversion is logged and the process still exits 0, so scripts
//! that export many topics keep going. Pass `--strict` to get a non-zero
//! exit status instead.

use anyhow::{Context, Result};
use clap::Parser;
use help2pdf::config::{DEFAULT_FRAGMENT, DEFAULT_RESOURCE_DIR, DEFAULT_TITLE};
use help2pdf::convert::SHUTDOWN_GRACE;
use help2pdf::{
    build_document, convert, ConversionConfig, ConversionProgressCallback, ConversionReport,
    Help2PdfError, Length, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner that follows the conversion stages.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, fragment: &Path) {
        self.bar.set_prefix("Reading");
        self.bar.set_message(fragment.display().to_string());
    }

    fn on_render_start(&self, html_len: usize) {
        self.bar.set_prefix("Rendering");
        self.bar.set_message(format!("{html_len} bytes of HTML"));
    }

    fn on_render_complete(&self, pdf_len: usize) {
        self.bar.set_prefix("Writing");
        self.bar.set_message(format!("{pdf_len} bytes"));
    }

    fn on_conversion_complete(&self, _report: &ConversionReport) {
        self.bar.finish_and_clear();
    }

    fn on_conversion_error(&self, _error: &Help2PdfError) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # With no arguments, run from the root of an InterSpec checkout: the
  # fragment is read from ./InterSpec_resources/static_text/ and the
  # stylesheets resolve against the current directory
  cd ~/src/InterSpec && help2pdf

  # Same, from anywhere
  help2pdf --root ~/src/InterSpec

  # Another topic, PDF into ./pdf/
  help2pdf --root ~/src/InterSpec energy_calibration_help.xml -o pdf

  # Letter-sized pages with a half-inch margin
  help2pdf --width 8.5in --height 11in --margin 0.5in compact_file_manager_help.xml

  # Inspect the wrapped HTML without launching a browser
  help2pdf --html-only peak_manager_help.xml > topic.html

  # Inside a container running as root
  help2pdf --no-sandbox --chrome /usr/bin/chromium

  # Fail the build when the export fails
  help2pdf --strict --json > report.json

LENGTHS:
  A number with unit in, cm, mm, px (1/96 in) or pt (1/72 in).
  A bare number is read as px.

ENVIRONMENT VARIABLES:
  HELP2PDF_ROOT           Resource root (default: current directory)
  HELP2PDF_CHROME         Path to Chrome / Chromium / Edge
  CHROME                  Used by auto-detection when HELP2PDF_CHROME is unset
  RUST_LOG                Override log filter (e.g. help2pdf=debug)
"#;

/// Render an HTML help-topic fragment to PDF with headless Chromium.
#[derive(Parser, Debug)]
#[command(
    name = "help2pdf",
    version,
    about = "Render an HTML help-topic fragment to PDF with headless Chromium",
    long_about = "Wraps a help-topic body fragment in a complete HTML document that links the \
application stylesheets, prints it with headless Chromium, and writes <basename>.pdf.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Fragment file name inside the resource directory.
    #[arg(env = "HELP2PDF_FRAGMENT", default_value = DEFAULT_FRAGMENT)]
    fragment: String,

    /// Root directory (an InterSpec checkout); resource and base directories
    /// are relative to it.
    #[arg(long, env = "HELP2PDF_ROOT", default_value = ".")]
    root: PathBuf,

    /// Directory holding the fragments, relative to --root.
    #[arg(long, env = "HELP2PDF_RESOURCE_DIR", default_value = DEFAULT_RESOURCE_DIR)]
    resource_dir: PathBuf,

    /// Directory stylesheets and images resolve against (default: --root).
    #[arg(long, env = "HELP2PDF_BASE_DIR")]
    base_dir: Option<PathBuf>,

    /// Directory the PDF is written to.
    #[arg(short, long, env = "HELP2PDF_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Page width (e.g. 10.5in, 210mm).
    #[arg(long, env = "HELP2PDF_WIDTH", default_value = "10.5in")]
    width: Length,

    /// Page height (e.g. 65in, 297mm).
    #[arg(long, env = "HELP2PDF_HEIGHT", default_value = "65in")]
    height: Length,

    /// Margin on all four sides.
    #[arg(long, env = "HELP2PDF_MARGIN")]
    margin: Option<Length>,

    /// Document title.
    #[arg(long, env = "HELP2PDF_TITLE", default_value = DEFAULT_TITLE)]
    title: String,

    /// Stylesheet href, repeatable. Replaces the built-in list.
    #[arg(long = "stylesheet", value_name = "HREF")]
    stylesheets: Vec<String>,

    /// Do not print CSS backgrounds.
    #[arg(long, env = "HELP2PDF_NO_BACKGROUND")]
    no_background: bool,

    /// Browser executable (default: auto-detect).
    #[arg(long, env = "HELP2PDF_CHROME")]
    chrome: Option<PathBuf>,

    /// Launch the browser without its sandbox (needed when running as root).
    #[arg(long, env = "HELP2PDF_NO_SANDBOX")]
    no_sandbox: bool,

    /// Rendering timeout in seconds.
    #[arg(long, env = "HELP2PDF_TIMEOUT", default_value_t = 60,
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Print the wrapped HTML to stdout instead of rendering.
    #[arg(long)]
    html_only: bool,

    /// Print the conversion report as JSON on stdout.
    #[arg(long, env = "HELP2PDF_JSON")]
    json: bool,

    /// Exit with a non-zero status when the conversion fails.
    #[arg(long, env = "HELP2PDF_STRICT")]
    strict: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "HELP2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "HELP2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "HELP2PDF_QUIET")]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters; keep INFO logs from
    // tearing through it unless -v was asked for.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.html_only;
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

    // Built by hand so shutdown is bounded: a render abandoned on timeout
    // must not keep the process alive.
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };
    let result = rt.block_on(run(&cli, show_progress));
    rt.shutdown_timeout(SHUTDOWN_GRACE);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            if cli.strict {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
    }
}

async fn run(cli: &Cli, show_progress: bool) -> Result<()> {
    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(cli, progress)?;

    // ── HTML-only mode ───────────────────────────────────────────────────
    if cli.html_only {
        let html = build_document(&config)
            .await
            .context("Failed to build document")?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(html.as_bytes())
            .context("Failed to write to stdout")?;
        handle.write_all(b"\n").ok();
        return Ok(());
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let report = convert(&config).await.context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        eprintln!(
            "{}  {}  {}  →  {}",
            green("✔"),
            dim(&format!("{} bytes", report.pdf_bytes)),
            dim(&format!("{}ms", report.total_duration_ms)),
            bold(&report.output.display().to_string()),
        );
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .root_dir(&cli.root)
        .resource_dir(&cli.resource_dir)
        .fragment(&cli.fragment)
        .output_dir(&cli.output_dir)
        .page_width(cli.width)
        .page_height(cli.height)
        .title(&cli.title)
        .print_background(!cli.no_background)
        .render_timeout_secs(cli.timeout)
        .sandbox(!cli.no_sandbox);

    if let Some(ref dir) = cli.base_dir {
        builder = builder.base_dir(dir);
    }
    if let Some(margin) = cli.margin {
        builder = builder.margin(margin);
    }
    if !cli.stylesheets.is_empty() {
        builder = builder.stylesheets(cli.stylesheets.iter().cloned());
    }
    if let Some(ref chrome) = cli.chrome {
        builder = builder.chrome_path(chrome);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_reproduce_help_export() {
        let cli = Cli::parse_from(["help2pdf"]);
        let config = build_config(&cli, None).unwrap();
        assert_eq!(config.fragment, "peak_manager_help.xml");
        assert_eq!(config.page_width.to_string(), "10.5in");
        assert_eq!(config.page_height.to_string(), "65in");
        assert_eq!(config.stylesheets.len(), 5);
        assert!(config.sandbox);
    }

    #[test]
    fn stylesheet_flags_replace_defaults() {
        let cli = Cli::parse_from([
            "help2pdf",
            "--stylesheet",
            "a.css",
            "--stylesheet",
            "b.css",
            "--no-sandbox",
            "energy_calibration_help.xml",
        ]);
        let config = build_config(&cli, None).unwrap();
        assert_eq!(config.stylesheets, vec!["a.css", "b.css"]);
        assert_eq!(config.fragment, "energy_calibration_help.xml");
        assert!(!config.sandbox);
    }

    #[test]
    fn long_help_explains_where_to_run_from() {
        use clap::CommandFactory;
        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("run from the root of an InterSpec checkout"));
        assert!(help.contains("./InterSpec_resources/static_text/"));
    }

    #[test]
    fn bad_length_is_a_parse_error() {
        assert!(Cli::try_parse_from(["help2pdf", "--width", "wide"]).is_err());
        assert!(Cli::try_parse_from(["help2pdf", "--timeout", "0"]).is_err());
    }
}
