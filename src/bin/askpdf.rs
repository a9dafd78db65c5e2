//! CLI binary for askyourpdf.
//!
//! A thin terminal front-end over `SessionController`: select a file, show
//! its title and preview, upload it, and ask questions.

use anyhow::{Context, Result};
use askyourpdf::{
    ChatOutcome, DocumentSource, SessionConfig, SessionController, TitleSource, UploadOutcome,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

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

const AFTER_HELP: &str = r#"EXAMPLES:
  # Show title and write a page-1 preview
  askpdf report.pdf --preview report.png

  # Upload, then ask
  askpdf report.pdf --upload -p "Summarise section 2"

  # Chat against whatever the backend already indexed
  askpdf -p "What is the warranty period?"

  # Interactive: one prompt per line until EOF
  askpdf report.pdf --upload --interactive

ENVIRONMENT VARIABLES:
  ASKPDF_BACKEND_URL   Backend origin (default http://127.0.0.1:5000)
  ASKPDF_TIMEOUT       Request timeout in seconds
  PDFIUM_LIB_PATH      pdfium library file or directory
  RUST_LOG             Overrides the log filter
"#;

/// Chat with a PDF through an AskYourPDF backend.
#[derive(Parser, Debug)]
#[command(
    name = "askpdf",
    version,
    about = "Upload a PDF to an AskYourPDF backend and ask questions about it",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF to select. Optional: chat works without one.
    file: Option<PathBuf>,

    /// Backend origin.
    #[arg(long, env = "ASKPDF_BACKEND_URL", default_value = askyourpdf::config::DEFAULT_BACKEND_URL)]
    backend_url: String,

    /// Upload the selected file before asking.
    #[arg(short, long)]
    upload: bool,

    /// Prompt to send; repeat for several.
    #[arg(short, long = "prompt", value_name = "TEXT")]
    prompts: Vec<String>,

    /// Read prompts from stdin, one per line, until EOF.
    #[arg(short, long)]
    interactive: bool,

    /// Write the page-1 preview as PNG to this path.
    #[arg(long, value_name = "PNG")]
    preview: Option<PathBuf>,

    /// Preview width in pixels.
    #[arg(long, env = "ASKPDF_PREVIEW_WIDTH", default_value_t = 120)]
    preview_width: u32,

    /// Request timeout in seconds.
    #[arg(long, env = "ASKPDF_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// pdfium library file or directory.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Print the final session state as JSON.
    #[arg(long)]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "ASKPDF_VERBOSE")]
    verbose: bool,

    /// Suppress everything except answers and errors.
    #[arg(short, long, env = "ASKPDF_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;
    let session = SessionController::new(config).context("Failed to start session")?;

    // ── File selection ───────────────────────────────────────────────────
    if let Some(ref path) = cli.file {
        let source = DocumentSource::from_path(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        session.select_file(source).settled().await;

        let state = session.snapshot();
        if let Some(doc) = state.document.as_ref() {
            if !cli.quiet {
                let note = match doc.title_source() {
                    TitleSource::Metadata => "",
                    _ => " (no title metadata)",
                };
                eprintln!("{} {}{}", bold("Title:"), doc.title(), dim(note));
            }
        }

        if let Some(ref out) = cli.preview {
            match state.preview.as_ref() {
                Some(preview) => {
                    let png = preview
                        .surface
                        .to_png()
                        .context("Failed to encode preview")?;
                    tokio::fs::write(out, png)
                        .await
                        .with_context(|| format!("Failed to write {}", out.display()))?;
                    if !cli.quiet {
                        eprintln!(
                            "{} preview {}x{} → {}",
                            green("✓"),
                            preview.surface.width(),
                            preview.surface.height(),
                            out.display()
                        );
                    }
                }
                None => eprintln!("{} no preview available", red("✗")),
            }
        }
    }

    // ── Upload ───────────────────────────────────────────────────────────
    if cli.upload {
        let spinner = (!cli.quiet).then(uploading_spinner);
        let outcome = session.upload().await;
        if let Some(bar) = spinner {
            bar.finish_and_clear();
        }
        match outcome {
            UploadOutcome::Succeeded(receipt) => {
                if !cli.quiet {
                    eprintln!("{} {}", green("✔"), receipt.message);
                }
            }
            UploadOutcome::Failed(e) => eprintln!("{} Upload failed: {}", red("✘"), e),
            UploadOutcome::Skipped => eprintln!("{} No file selected; nothing to upload", dim("·")),
            UploadOutcome::Rejected => eprintln!("{} An upload is already running", dim("·")),
        }
    }

    // ── Chat ─────────────────────────────────────────────────────────────
    for prompt in &cli.prompts {
        print_answer(&session, prompt).await;
    }

    if cli.interactive {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
            print_answer(&session, &line).await;
        }
    }

    if cli.json {
        let summary = session.snapshot().summary();
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise state")?
        );
    }

    Ok(())
}

/// Map CLI args to `SessionConfig`.
fn build_config(cli: &Cli) -> Result<SessionConfig> {
    let mut builder = SessionConfig::builder()
        .backend_url(cli.backend_url.clone())
        .request_timeout_secs(cli.timeout)
        .preview_width(cli.preview_width);
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library_path(lib.clone());
    }
    builder.build().context("Invalid configuration")
}

fn uploading_spinner() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_message("Uploading…");
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

async fn print_answer(session: &SessionController, prompt: &str) {
    match session.ask(prompt).await {
        ChatOutcome::Answered(answer) => println!("{answer}"),
        ChatOutcome::Failed(e) => eprintln!("{} {}", red("✘"), e),
    }
}
