//! sheetsplit - Split financial-extraction text into per-file Excel workbooks
//!
//! This crate reads the text produced by an upstream extraction step (a JSON
//! object whose values hold tab-separated tables, keyed by source file name),
//! recovers it even when the JSON is slightly broken, and writes one `.xlsx`
//! workbook per source file with one sheet per financial-statement category.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sheetsplit::SplitterBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Default settings: group rows by `pdffile`, write to `output_excels/`
//!     let splitter = SplitterBuilder::new().build()?;
//!
//!     let report = splitter.run("output_gemini.txt")?;
//!     println!("{} workbooks created", report.success_count());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Per-entry Output
//!
//! ```rust,no_run
//! use sheetsplit::{SplitMode, SplitterBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // One workbook per JSON key instead of per `pdffile` value
//!     let splitter = SplitterBuilder::new()
//!         .with_mode(SplitMode::PerEntry)
//!         .with_output_dir("workbooks")
//!         .build()?;
//!
//!     let report = splitter.run("gemini_output.txt")?;
//!     for failure in &report.entry_failures {
//!         eprintln!("skipped {}: {}", failure.key, failure.error);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Custom Categories
//!
//! ```rust,no_run
//! use sheetsplit::{Category, CategoryMap, SplitterBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let splitter = SplitterBuilder::new()
//!         .with_categories(CategoryMap::new(vec![
//!             Category::new("Income Statement", "IS"),
//!             Category::new("Cash Flow", "CF"),
//!         ]))
//!         .parallel_writes(true)
//!         .build()?;
//!
//!     splitter.run("output_gemini.txt")?;
//!     Ok(())
//! }
//! ```

mod api;
mod builder;
mod error;
mod extractor;
mod loader;
mod merger;
mod output;
mod report;
mod security;
mod types;

// 公開API
pub use api::{Category, CategoryMap, SplitMode};
pub use builder::{generate_workbooks, Splitter, SplitterBuilder, DEFAULT_OUTPUT_DIR};
pub use error::SheetSplitError;
pub use extractor::{extract_table, locate_table, parse_tsv};
pub use loader::{
    clean_content, parse_blobs, repair_missing_commas, ParseOutcome, ParseStrategy,
    OPAQUE_BLOB_KEY,
};
pub use merger::{concat_tables, merge_and_split, partition_by_pdffile, FileGroup, Partition};
pub use output::{categorize, output_file_name};
pub use report::{
    EntryFailure, FailureRecord, FileOutcome, FileStatus, ReportSummary, RunReport, SheetSummary,
    WrittenFile,
};
pub use types::{RawBlob, Row, Table, PDFFILE_COLUMN, TABLE_COLUMN};
