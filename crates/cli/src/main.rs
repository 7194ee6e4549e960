//! # sheetmerge-cli
//!
//! Command-line front end for the sheetmerge engine.

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use sheetmerge::{
    compile, scan_directory, verify_files, CompilationResult, DateFormat, MergeConfig, MergeError,
    MergeEvent, RunOutcome, SortSpec, VerificationReport,
};
use sheetmerge_sheet::column_index;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// sheetmerge - combine spreadsheet and CSV files that share one header layout
#[derive(Parser, Debug)]
#[command(name = "sheetmerge")]
#[command(author, version, about = "Merge spreadsheet and CSV files into one workbook", long_about = None)]
struct Cli {
    /// Input files, or a single directory whose supported files are merged
    #[arg(value_name = "PATH", required = true)]
    inputs: Vec<PathBuf>,

    /// 1-based row where the header starts
    #[arg(long, value_name = "ROW")]
    header_start_row: Option<usize>,

    /// Number of header rows
    #[arg(long, value_name = "N")]
    header_rows: Option<usize>,

    /// Do not add the source file column
    #[arg(long)]
    no_source_label: bool,

    /// Repeat each file's header block above its rows
    #[arg(long)]
    repeat_headers: bool,

    /// Keep the merged cells of the header
    #[arg(long)]
    merge_header_cells: bool,

    /// Keep duplicate rows
    #[arg(long)]
    keep_duplicates: bool,

    /// Drop rows with no values
    #[arg(long)]
    remove_empty_rows: bool,

    /// Sort on a column, by letter (`B`) or 1-based number (`2`)
    #[arg(long, value_name = "COL")]
    sort: Option<String>,

    /// Leave column widths alone
    #[arg(long)]
    no_auto_width: bool,

    /// Do not freeze the rows above the data
    #[arg(long)]
    no_freeze: bool,

    /// Date display: iso, iso-datetime, dmy, dmy-time, mdy or an Excel pattern
    #[arg(long, value_name = "FORMAT")]
    date_format: Option<String>,

    /// Output file name (`.xlsx` is added when missing)
    #[arg(short, long, value_name = "NAME")]
    output: Option<String>,

    /// Directory receiving the output workbook
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Only check that the inputs fit the header settings
    #[arg(long, conflicts_with = "compatible_only")]
    verify: bool,

    /// Check the inputs first and merge only the compatible ones
    #[arg(long)]
    compatible_only: bool,

    /// Load settings from a JSON file; flags override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Save the effective settings to a JSON file
    #[arg(long, value_name = "FILE")]
    save_config: Option<PathBuf>,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();
    }

    let config = build_config(&cli)?;
    if let Some(path) = &cli.save_config {
        config
            .save(path)
            .with_context(|| format!("Failed to save settings: {}", path.display()))?;
        println!("{} {}", "Settings saved to".green(), path.display());
    }

    let (mut files, default_dir) = resolve_inputs(&cli.inputs, &config.output_file_name())?;
    if files.is_empty() {
        bail!("No supported input files found");
    }

    if cli.verify || cli.compatible_only {
        let report = verify_files(&files, config.header_start_row, config.header_rows);
        print_verification(&report);
        if cli.verify {
            return Ok(());
        }
        files = report.compatible;
        if files.is_empty() {
            bail!("No compatible input files");
        }
    }

    let output_dir = cli.output_dir.clone().unwrap_or(default_dir);
    tracing::info!(files = files.len(), output_dir = %output_dir.display(), "Starting compilation");
    let outcome = run(files, config, output_dir).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&run_report(&outcome))?);
    } else {
        print_result(outcome.result());
    }

    match outcome {
        RunOutcome::Written { path, .. } => {
            if !cli.json {
                println!("{} {}", "Output written to".green().bold(), path.display());
            }
            Ok(())
        }
        RunOutcome::NothingToWrite(_) => Err(MergeError::NothingToWrite.into()),
    }
}

/// Start from the saved settings (or defaults) and apply the flags on top.
fn build_config(cli: &Cli) -> Result<MergeConfig> {
    let mut config = match &cli.config {
        Some(path) => MergeConfig::load(path)
            .with_context(|| format!("Failed to load settings: {}", path.display()))?,
        None => MergeConfig::default(),
    };

    if let Some(row) = cli.header_start_row {
        config.header_start_row = row;
    }
    if let Some(rows) = cli.header_rows {
        config.header_rows = rows;
    }

    let normalization = &mut config.normalization;
    if cli.no_source_label {
        normalization.add_source_label = false;
    }
    if cli.repeat_headers {
        normalization.repeat_headers = true;
    }
    if cli.keep_duplicates {
        normalization.deduplicate = false;
    }
    if cli.remove_empty_rows {
        normalization.remove_empty_rows = true;
    }
    if let Some(column) = &cli.sort {
        let column = column_index(column)
            .with_context(|| format!("Invalid sort column: '{column}'"))?;
        normalization.sort = Some(SortSpec { column });
    }

    let layout = &mut config.layout;
    if cli.merge_header_cells {
        layout.preserve_merged_header_cells = true;
    }
    if cli.no_auto_width {
        layout.auto_column_width = false;
    }
    if cli.no_freeze {
        layout.freeze_header = false;
    }
    if let Some(format) = &cli.date_format {
        layout.date_format = format.parse::<DateFormat>()?;
    }

    if let Some(name) = &cli.output {
        config.output_name = name.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Expand the positional inputs into files, plus the default output directory.
///
/// A single directory is scanned for supported files, leaving out a previous
/// output; anything else is taken as an explicit file list.
fn resolve_inputs(inputs: &[PathBuf], output_name: &str) -> Result<(Vec<PathBuf>, PathBuf)> {
    if let [dir] = inputs {
        if dir.is_dir() {
            let files = scan_directory(dir, Some(output_name))
                .with_context(|| format!("Failed to read directory: {}", dir.display()))?;
            return Ok((files, dir.clone()));
        }
    }

    let default_dir = inputs
        .first()
        .and_then(|p| p.parent())
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    Ok((inputs.to_vec(), default_dir))
}

/// Run the merge on a blocking worker, printing progress as events arrive.
async fn run(files: Vec<PathBuf>, config: MergeConfig, output_dir: PathBuf) -> Result<RunOutcome> {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let worker = tokio::task::spawn_blocking(move || {
        compile(&files, &config, &output_dir, |event| {
            // The receiver only goes away if the foreground task died
            let _ = tx.send(event);
        })
    });

    while let Some(event) = rx.recv().await {
        print_event(&event);
    }

    let outcome = worker.await.context("Merge worker stopped unexpectedly")??;
    Ok(outcome)
}

fn print_event(event: &MergeEvent) {
    match event {
        MergeEvent::Progress { done, total } => {
            println!("{}", format!("[{done}/{total}]").dimmed());
        }
        MergeEvent::FileFailed { file, reason } => {
            println!("{} {file}: {reason}", "Skipped".yellow().bold());
        }
    }
}

fn print_verification(report: &VerificationReport) {
    println!("{}", "Verification".cyan().bold());
    for path in &report.compatible {
        println!("  {} {}", "ok".green(), path.display());
    }
    for failed in &report.incompatible {
        println!("  {} {}: {}", "incompatible".red(), failed.file, failed.reason);
    }
    if report.all_compatible() {
        println!("{}", "All files are compatible".green());
    } else {
        println!(
            "{} of {} files are incompatible",
            report.incompatible.len(),
            report.compatible.len() + report.incompatible.len()
        );
    }
}

fn print_result(result: &CompilationResult) {
    println!("{}", "Compilation report".cyan().bold());
    println!(
        "  {} file(s) merged, {} failed, {} row(s)",
        result.succeeded.len().to_string().green(),
        result.failed.len().to_string().red(),
        result.table.rows.len()
    );
    for file in &result.succeeded {
        println!("  {} {file}", "+".green());
    }
    for failed in &result.failed {
        println!("  {} {}: {}", "-".red(), failed.file, failed.reason);
    }

    let report = &result.normalization;
    if report.duplicates_removed > 0 {
        println!("  {} duplicate row(s) removed", report.duplicates_removed);
    }
    if report.empty_rows_removed > 0 {
        println!("  {} empty row(s) removed", report.empty_rows_removed);
    }
}

fn run_report(outcome: &RunOutcome) -> serde_json::Value {
    let result = outcome.result();
    serde_json::json!({
        "output": outcome.output_path(),
        "rows": result.table.rows.len(),
        "succeeded": result.succeeded,
        "failed": result.failed,
        "normalization": result.normalization,
    })
}
