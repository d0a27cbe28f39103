//! Command-line entry point.
//!
//! ```sh
//! sheetsplit output_gemini.txt -o output_excels
//! sheetsplit gemini_output.txt --mode per-entry
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use sheetsplit::{FileStatus, RunReport, SplitMode, SplitterBuilder, DEFAULT_OUTPUT_DIR};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// One workbook per JSON key
    PerEntry,
    /// Merge all tables and write one workbook per `pdffile` value
    ByPdffile,
}

impl From<ModeArg> for SplitMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::PerEntry => SplitMode::PerEntry,
            ModeArg::ByPdffile => SplitMode::ByPdfFile,
        }
    }
}

/// Split financial-extraction text into per-file Excel workbooks
#[derive(Parser, Debug)]
#[command(name = "sheetsplit", version)]
struct Args {
    /// Input text file (JSON object of key -> tab-separated table text)
    #[arg(value_name = "INPUT", default_value = "output_gemini.txt")]
    input: PathBuf,

    /// Output directory (created if absent)
    #[arg(short, long, value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output: PathBuf,

    /// How rows are grouped into output files
    #[arg(long, value_enum, default_value_t = ModeArg::ByPdffile)]
    mode: ModeArg,

    /// Write output files in parallel
    #[arg(long)]
    parallel: bool,

    /// Print the run summary as JSON instead of text
    #[arg(long)]
    report_json: bool,
}

fn print_report(report: &RunReport) {
    for failure in &report.entry_failures {
        println!("SKIP  {}: {}", failure.key, failure.error);
    }
    for file in &report.files {
        let name = file.file_name.as_deref().unwrap_or(&file.source);
        match &file.status {
            FileStatus::Written { sheets, .. } => {
                let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
                println!("OK    {} [{}]", name, names.join(", "));
                if !file.merged_sources.is_empty() {
                    println!(
                        "      rows from {} combined into {}",
                        file.merged_sources.join(", "),
                        name
                    );
                }
            }
            FileStatus::Skipped => println!("SKIP  {}: no rows matched any category", name),
            FileStatus::Failed(error) => println!("FAIL  {}: {}", name, error),
        }
    }
    if report.orphan_rows > 0 {
        println!("WARN  {} rows had no pdffile value", report.orphan_rows);
    }
    println!(
        "\n{} workbook(s) created in {}",
        report.success_count(),
        report.output_dir.display()
    );
}

fn main() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let splitter = match SplitterBuilder::new()
        .with_output_dir(&args.output)
        .with_mode(args.mode.into())
        .parallel_writes(args.parallel)
        .build()
    {
        Ok(splitter) => splitter,
        Err(e) => {
            println!("Error: {}", e);
            return;
        }
    };

    // 致命的なエラーも報告のみ行い、終了コードは変えない
    match splitter.run(&args.input) {
        Ok(report) if args.report_json => match serde_json::to_string_pretty(&report.summary()) {
            Ok(json) => println!("{}", json),
            Err(e) => println!("Error: failed to serialize report: {}", e),
        },
        Ok(report) => print_report(&report),
        Err(e) => println!("Error: {}", e),
    }
}
