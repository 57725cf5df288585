//! CLI binary for pdf2office.
//!
//! A thin shim over the library crate: validates the three positional
//! arguments, maps flags to `ConversionConfig`, runs the conversion and
//! turns the outcome into exit status 0 or 1.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use pdf2office::excel::TabulaExtractor;
use pdf2office::{convert_to_file, pdfium, ConversionConfig, ConvertError, TargetFormat};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Reflowed text document
  pdf2office report.pdf report.docx word

  # One worksheet per detected table
  TABULA_JAR=~/lib/tabula-1.0.5-jar-with-dependencies.jar \
    pdf2office invoices.pdf invoices.xlsx excel

  # One slide per page at 150 DPI
  pdf2office --dpi 150 deck.pdf deck.pptx ppt

  # Check that pdfium, java and tabula are usable
  pdf2office --check

STRATEGIES:
  word    pdfium text layout, falling back to plain text per page (lopdf)
  excel   tabula-java table detection; no tables found is an error
  ppt     pdfium page rendering, one full-width picture per slide

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to an existing libpdfium
  TABULA_JAR              tabula-java jar with dependencies (excel only)
  PDF2OFFICE_JAVA         Java executable (default: java on PATH)
  RUST_LOG                Override log filtering (e.g. pdf2office=debug)
"#;

/// Convert PDF files to Word, Excel or PowerPoint documents.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2office",
    version,
    about = "Convert PDF files to Word, Excel or PowerPoint documents",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Source PDF file.
    input: Option<PathBuf>,

    /// Destination file (.docx, .xlsx or .pptx).
    output: Option<PathBuf>,

    /// Target format: word, excel or ppt.
    format: Option<String>,

    /// Rendering DPI for ppt slides (72–400).
    #[arg(long, env = "PDF2OFFICE_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2OFFICE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Path to the tabula-java jar (excel only).
    #[arg(long, env = "TABULA_JAR")]
    tabula_jar: Option<PathBuf>,

    /// Java executable used to run tabula.
    #[arg(long, env = "PDF2OFFICE_JAVA", default_value = "java")]
    java: PathBuf,

    /// JVM maximum heap for tabula (-Xmx).
    #[arg(long, env = "PDF2OFFICE_JAVA_MAX_HEAP", default_value = "512m")]
    java_max_heap: String,

    /// JVM initial heap for tabula (-Xms).
    #[arg(long, env = "PDF2OFFICE_JAVA_INITIAL_HEAP", default_value = "128m")]
    java_initial_heap: String,

    /// Directory for temporary page images.
    #[arg(long, env = "PDF2OFFICE_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Print the conversion report as JSON instead of the success line.
    #[arg(long)]
    json: bool,

    /// Check that pdfium, java and the tabula jar are usable, then exit.
    #[arg(long)]
    check: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2OFFICE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2OFFICE_QUIET", conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    init_tracing(&cli);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// INFO and below go to stdout, WARN and ERROR to stderr.
fn init_tracing(cli: &Cli) {
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr.with_max_level(Level::WARN).or_else(io::stdout))
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let config = build_config(cli)?;

    if cli.check {
        return Ok(check(&config));
    }

    // ── Argument validation ──────────────────────────────────────────────
    let (input, output, format) = match (&cli.input, &cli.output, &cli.format) {
        (Some(i), Some(o), Some(f)) => (i, o, f),
        _ => {
            eprintln!(
                "Usage: pdf2office <input.pdf> <output-path> <format>\nFormats: {}",
                TargetFormat::supported_tokens()
            );
            return Ok(ExitCode::FAILURE);
        }
    };

    if !input.exists() {
        eprintln!("Error: Input file not found: {}", input.display());
        return Ok(ExitCode::FAILURE);
    }

    let format: TargetFormat = match format.parse() {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    // ── Conversion ───────────────────────────────────────────────────────
    let report = match convert_to_file(input, output, format, &config) {
        Ok(report) => report,
        Err(e) => {
            report_failure(&e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let size = std::fs::metadata(&report.output)
        .with_context(|| format!("Output file missing after conversion: {}", report.output.display()))?
        .len();

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else if !cli.quiet {
        println!(
            "Successfully converted to {}: {}",
            format.display_name(),
            report.output.display()
        );
        println!("  {} bytes in {}ms", size, report.duration_ms);
        if report.used_fallback() {
            println!("  (layout reconstruction failed; plain-text fallback used)");
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn report_failure(e: &ConvertError) {
    if e.is_degraded_result() {
        eprintln!("Error: {e}\nNothing was written.");
    } else {
        eprintln!("Error: {e}");
    }
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .dpi(cli.dpi)
        .java_binary(&cli.java)
        .java_max_heap(&cli.java_max_heap)
        .java_initial_heap(&cli.java_initial_heap);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }
    if let Some(ref jar) = cli.tabula_jar {
        builder = builder.tabula_jar(jar);
    }
    if let Some(ref dir) = cli.temp_dir {
        builder = builder.temp_dir(dir);
    }

    builder.build().context("Invalid configuration")
}

/// Probe every external collaborator; success only when all are usable.
fn check(config: &ConversionConfig) -> ExitCode {
    let mut ok = true;

    match pdfium::check_available() {
        Ok(()) => println!("pdfium:  ok"),
        Err(e) => {
            ok = false;
            println!("pdfium:  unavailable ({e})");
        }
    }

    match TabulaExtractor::from_config(config).check_available() {
        Ok(version) => println!("tabula:  ok ({version})"),
        Err(e) => {
            ok = false;
            println!("tabula:  unavailable ({e})");
        }
    }

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
