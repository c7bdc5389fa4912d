//! CLI binary for pdfstack.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `BatchConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdfstack::{
    config::load_regions_file, engine, inspect_with, run_batch, BatchConfig,
    BatchProgressCallback, FailurePolicy, Fill, PdfStackError, PdfiumRenderer, Region,
};
use std::io;
use std::path::{Path, PathBuf};
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Progress bar with one log line per file.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} files  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        bar.set_prefix("Combining");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Processing {total_files} PDF file(s)…"))
        ));
    }

    fn on_file_start(&self, _file_num: usize, _total: usize, input: &Path) {
        self.bar.set_message(file_name(input));
    }

    fn on_file_complete(
        &self,
        file_num: usize,
        total: usize,
        input: &Path,
        output: &Path,
        width: u32,
        height: u32,
    ) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  →  {}  {}",
            green("✓"),
            file_num,
            total,
            file_name(input),
            file_name(output),
            dim(&format!("{width}x{height}")),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, file_num: usize, total: usize, input: &Path, error: &str) {
        // Keep the log to one line per file.
        let first_line = error.lines().next().unwrap_or(error);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            file_num,
            total,
            file_name(input),
            red(first_line),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, _total_files: usize, _success_count: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Two regions from the first page of every PDF in ./files
  pdfstack files output --region 90,10,680,200 --region 90,700,680,800

  # Regions from a JSON file: [[90,10,680,200],[90,700,680,800]]
  pdfstack files output --regions-file regions.json

  # Find page sizes (in pixels at the chosen DPI) before picking coordinates
  pdfstack files output --inspect-only

  # Keep going past broken files, print a JSON report
  pdfstack files output --regions-file regions.json --keep-going --json

COORDINATES:
  Regions are x1,y1,x2,y2 in pixels of the rendered first page, origin at the
  top-left. At the default 72 DPI one pixel is one PDF point, so a US Letter
  page is 612x792 px. The crop covers x1..x2 and y1..y2 (right and bottom
  edges exclusive). Crops are stacked top to bottom in the order given.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to an existing libpdfium — skips auto-download
  PDFSTACK_ENGINE_CACHE   Override the default pdfium cache directory
  RUST_LOG                Override the log filter (e.g. pdfstack=debug)
"#;

/// Crop regions from the first page of each PDF and stack them into one PNG.
#[derive(Parser, Debug)]
#[command(
    name = "pdfstack",
    version,
    about = "Crop regions from the first page of each PDF in a folder and stack them into one PNG",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory containing the .pdf files.
    input_dir: PathBuf,

    /// Directory receiving <name>_combined.png (created if missing).
    output_dir: PathBuf,

    /// Region to crop as x1,y1,x2,y2 (repeatable; stacked in order).
    #[arg(short, long = "region", value_name = "X1,Y1,X2,Y2", env = "PDFSTACK_REGIONS",
          value_delimiter = ';', value_parser = parse_region)]
    regions: Vec<Region>,

    /// JSON file with an array of [x1, y1, x2, y2] regions (placed before --region ones).
    #[arg(long, env = "PDFSTACK_REGIONS_FILE")]
    regions_file: Option<PathBuf>,

    /// Rendering DPI (72–400). Region coordinates are in pixels at this DPI.
    #[arg(long, env = "PDFSTACK_DPI", default_value_t = 72,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Background for areas no crop covers: white, black or #RRGGBB.
    #[arg(long, env = "PDFSTACK_FILL", default_value = "white", value_parser = parse_fill)]
    fill: Fill,

    /// Skip files that fail instead of stopping at the first one.
    #[arg(long, env = "PDFSTACK_KEEP_GOING")]
    keep_going: bool,

    /// Print the batch report as JSON on stdout.
    #[arg(long, env = "PDFSTACK_JSON")]
    json: bool,

    /// Print each PDF's page count and first-page size, then exit.
    #[arg(long)]
    inspect_only: bool,

    /// Path to the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Disable progress bar.
    #[arg(long, env = "PDFSTACK_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFSTACK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFSTACK_QUIET")]
    quiet: bool,
}

fn parse_region(s: &str) -> Result<Region, String> {
    s.parse().map_err(|e: PdfStackError| e.to_string())
}

fn parse_fill(s: &str) -> Result<Fill, String> {
    s.parse().map_err(|e: PdfStackError| e.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar covers per-file feedback, so library INFO logs are
    // hidden while it is shown.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
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
    if cli.inspect_only {
        let pdfium = bind_engine(&cli)?;
        return print_inspection(&cli, pdfium);
    }

    // ── Build config ─────────────────────────────────────────────────────
    // Checked before the engine is bound, which may mean a download.
    let mut config = build_config(&cli)?;

    // ── Ensure PDFium engine is available ────────────────────────────────
    let pdfium = bind_engine(&cli)?;
    if show_progress {
        config.progress_callback =
            Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>);
    }

    // ── Run batch ────────────────────────────────────────────────────────
    let renderer = PdfiumRenderer::new(pdfium, config.dpi);
    let report = run_batch(&renderer, &config).context("Batch failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    }

    if !cli.quiet {
        let stats = &report.stats;
        if stats.total_files == 0 {
            eprintln!(
                "{} No .pdf files found in {}",
                cyan("⚠"),
                bold(&cli.input_dir.display().to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} file(s) combined  {}ms  →  {}",
                if stats.failed == 0 { green("✔") } else { cyan("⚠") },
                stats.succeeded,
                stats.total_files,
                stats.total_duration_ms,
                bold(&config.output_dir.display().to_string()),
            );
        }
        for failed in report.files.iter().filter_map(|f| f.error.as_ref()) {
            eprintln!("   {} {}", red("✗"), failed);
        }
    }

    report.into_result().context("Some files were skipped")?;
    Ok(())
}

/// Bind pdfium, showing a download bar on first run.
fn bind_engine(cli: &Cli) -> Result<pdfium_render::prelude::Pdfium> {
    let explicit = cli.pdfium_lib.as_deref();
    if cli.quiet || engine::is_available_offline(explicit) {
        return engine::bind(explicit, None).context("Failed to load PDFium engine");
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    let on_progress = move |downloaded: u64, total: Option<u64>| {
        if let Some(t) = total {
            if bar.length() != Some(t) {
                bar.set_length(t);
            }
        }
        bar.set_position(downloaded);
    };
    let on_progress: engine::DownloadProgress<'_> = &on_progress;
    let pdfium =
        engine::bind(explicit, Some(on_progress)).context("Failed to download PDFium engine")?;

    dl_bar.finish_with_message("ready ✓");
    Ok(pdfium)
}

/// Map CLI args to `BatchConfig` and check the input directory exists.
fn build_config(cli: &Cli) -> Result<BatchConfig> {
    let mut regions = match cli.regions_file {
        Some(ref path) => load_regions_file(path)?,
        None => Vec::new(),
    };
    regions.extend(cli.regions.iter().copied());

    let mut builder = BatchConfig::builder(&cli.input_dir, &cli.output_dir)
        .regions(regions)
        .dpi(cli.dpi)
        .fill(cli.fill)
        .on_error(if cli.keep_going {
            FailurePolicy::Skip
        } else {
            FailurePolicy::Abort
        });

    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(lib);
    }

    let config = builder
        .build()
        .context("Invalid configuration (pass at least one --region or --regions-file)")?;

    if !config.input_dir.is_dir() {
        return Err(PdfStackError::InputDirNotFound {
            path: config.input_dir.clone(),
        }
        .into());
    }
    Ok(config)
}

fn print_inspection(cli: &Cli, pdfium: pdfium_render::prelude::Pdfium) -> Result<()> {
    let renderer = PdfiumRenderer::new(pdfium, cli.dpi);
    let rows = inspect_with(&renderer, &cli.input_dir).context("Failed to list input directory")?;

    if cli.json {
        let json: Vec<_> = rows
            .iter()
            .map(|(pdf, info)| {
                let file = pdf.to_string_lossy();
                match info {
                    Ok(i) => serde_json::json!({ "file": file, "page": i }),
                    Err(e) => serde_json::json!({ "file": file, "error": e.to_string() }),
                }
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&json).context("Failed to serialise page info")?
        );
        return Ok(());
    }

    println!("{:<40} {:>6}  {:>12}  (at {} DPI)", "File", "Pages", "Page 1 px", cli.dpi);
    for (pdf, info) in rows {
        match info {
            Ok(i) => println!(
                "{:<40} {:>6}  {:>12}",
                file_name(&pdf),
                i.page_count,
                format!("{}x{}", i.width_px, i.height_px)
            ),
            Err(e) => println!("{:<40} {}", file_name(&pdf), red(&e.to_string())),
        }
    }
    Ok(())
}
