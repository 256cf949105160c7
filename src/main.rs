use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hoadon::core::{CancellationToken, ExportConfig, Progress, RunPhase, scan_folder};
use hoadon::rename::{PdfCollaborator, RenameRunner, RenameSummary};
use hoadon::report::{ExportRunner, ExportSummary};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_CONFIG: &str = "hoadon.toml";
const DEFAULT_PYTHON: &str = "python3";

#[derive(Parser)]
#[command(name = "hoadon")]
#[command(about = "Vietnamese e-invoice XML extraction, reporting and renaming", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract every invoice in a folder into one spreadsheet
    Extract {
        /// Folder containing the invoice XML files
        #[arg(value_name = "FOLDER")]
        folder: PathBuf,

        /// Output workbook
        #[arg(short, long, value_name = "FILE", default_value = "invoice_summary.xlsx")]
        output: PathBuf,

        /// Path to configuration file (TOML)
        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Copy invoices into Renamed/ as <YYMMDD>_<number>.xml
    Rename {
        /// Folder containing the XML and PDF files
        #[arg(value_name = "FOLDER")]
        folder: PathBuf,

        /// Destination for the Renamed and Renamed_failed folders
        #[arg(short, long, value_name = "DEST")]
        destination: PathBuf,

        /// Executable that renames PDFs (interpreter when --pdf-script is set)
        #[arg(long, value_name = "EXE")]
        pdf_runner: Option<PathBuf>,

        /// Script passed to the PDF runner
        #[arg(long, value_name = "SCRIPT")]
        pdf_script: Option<PathBuf>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(env_filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ExportConfig> {
    if let Some(path) = path {
        return ExportConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }
    // Try to load default config from current directory if it exists
    let default_path = PathBuf::from(DEFAULT_CONFIG);
    if default_path.exists() {
        ExportConfig::from_file(&default_path)
            .with_context(|| format!("Failed to load config from {}", default_path.display()))
    } else {
        Ok(ExportConfig::default())
    }
}

/// Ctrl-C flips the token; the worker notices at its next check.
fn watch_interrupt(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            cancel.cancel();
        }
    });
}

async fn print_progress(mut rx: mpsc::UnboundedReceiver<Progress>) {
    while let Some(progress) = rx.recv().await {
        if !progress.is_idle() {
            eprintln!("[{}/{}] {}", progress.current, progress.total, progress.message);
        }
    }
}

fn exit_code(phase: RunPhase) -> ExitCode {
    match phase {
        RunPhase::Completed => ExitCode::SUCCESS,
        RunPhase::Cancelled => ExitCode::from(130),
        _ => ExitCode::FAILURE,
    }
}

async fn extract(folder: PathBuf, output: PathBuf, config: ExportConfig) -> Result<ExportSummary> {
    let files = scan_folder(&folder, "xml")
        .with_context(|| format!("Failed to scan {}", folder.display()))?;
    let cancel = CancellationToken::new();
    watch_interrupt(cancel.clone());

    let (tx, rx) = mpsc::unbounded_channel();
    let worker = tokio::task::spawn_blocking(move || {
        let mut sink = move |p: &Progress| {
            let _ = tx.send(p.clone());
        };
        ExportRunner::new(config).run(&files, &output, &cancel, &mut sink)
    });
    print_progress(rx).await;

    let summary = worker.await.context("Export worker panicked")??;
    Ok(summary)
}

async fn rename(
    folder: PathBuf,
    destination: PathBuf,
    collaborator: Option<PdfCollaborator>,
) -> Result<RenameSummary> {
    let xml_files = scan_folder(&folder, "xml")
        .with_context(|| format!("Failed to scan {}", folder.display()))?;
    let pdf_files = scan_folder(&folder, "pdf")
        .with_context(|| format!("Failed to scan {}", folder.display()))?;
    let cancel = CancellationToken::new();
    watch_interrupt(cancel.clone());

    let (tx, rx) = mpsc::unbounded_channel();
    let worker = tokio::task::spawn_blocking(move || {
        let mut sink = move |p: &Progress| {
            let _ = tx.send(p.clone());
        };
        RenameRunner::new(collaborator).run(&xml_files, &pdf_files, &destination, &cancel, &mut sink)
    });
    print_progress(rx).await;

    let summary = worker.await.context("Rename worker panicked")??;
    Ok(summary)
}

fn print_export(summary: &ExportSummary) {
    println!(
        "{:?}: {}/{} invoices exported in {} ms",
        summary.phase, summary.processed, summary.total, summary.elapsed_ms
    );
    if let Some(output) = &summary.output {
        println!("Saved to {}", output.display());
    }
    for failure in &summary.failures {
        println!("  skipped {failure}");
    }
}

fn print_rename(summary: &RenameSummary) {
    println!(
        "{:?}: XML {} renamed, {} failed; PDF {} renamed, {} failed; total {} renamed, {} failed",
        summary.phase,
        summary.xml.success,
        summary.xml.failed,
        summary.pdf.success,
        summary.pdf.failed,
        summary.success(),
        summary.failed()
    );
    for failure in &summary.failures {
        println!("  failed {failure}");
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Extract {
            folder,
            output,
            config,
            json,
        } => {
            let config = load_config(config.as_deref())?;
            let summary = extract(folder, output, config).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_export(&summary);
            }
            Ok(exit_code(summary.phase))
        }
        Command::Rename {
            folder,
            destination,
            pdf_runner,
            pdf_script,
            json,
        } => {
            let collaborator = match (pdf_runner, pdf_script) {
                (Some(runner), script) => Some(PdfCollaborator::new(runner, script)),
                (None, Some(script)) => Some(PdfCollaborator::new(DEFAULT_PYTHON, Some(script))),
                (None, None) => None,
            };
            let summary = rename(folder, destination, collaborator).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_rename(&summary);
            }
            Ok(exit_code(summary.phase))
        }
    }
}
