//! Builder Module
//!
//! Fluent Builder APIを提供し、`Splitter`インスタンスを段階的に構築する。

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::api::{CategoryMap, SplitMode};
use crate::error::SheetSplitError;
use crate::extractor::extract_table;
use crate::loader::load_input;
use crate::merger::merge_and_split;
use crate::output::{plan_writes, WorkbookWriter};
use crate::report::{EntryFailure, FileOutcome, RunReport};
use crate::security::SecurityConfig;
use crate::types::Table;

/// デフォルトの出力ディレクトリ
pub const DEFAULT_OUTPUT_DIR: &str = "output_excels";

/// Excelのシート名の最大長
const MAX_SHEET_NAME_LEN: usize = 31;

/// シート名に使用できない文字
const INVALID_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// 変換処理の設定を保持する内部構造体
#[derive(Debug, Clone)]
pub(crate) struct SplitConfig {
    /// 出力ディレクトリ
    pub output_dir: PathBuf,

    /// 分割方式
    pub mode: SplitMode,

    /// シートのカテゴリ
    pub categories: CategoryMap,

    /// 出力ファイルを並列に書き込むか
    pub parallel_writes: bool,

    /// 入力制限
    pub security: SecurityConfig,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            mode: SplitMode::ByPdfFile,
            categories: CategoryMap::default(),
            parallel_writes: false,
            security: SecurityConfig::default(),
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// `Splitter`インスタンスを段階的に構築するためのビルダーです。
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust,no_run
/// use sheetsplit::{SplitMode, SplitterBuilder};
///
/// # fn main() -> Result<(), sheetsplit::SheetSplitError> {
/// let splitter = SplitterBuilder::new()
///     .with_output_dir("workbooks")
///     .with_mode(SplitMode::PerEntry)
///     .build()?;
/// let report = splitter.run("gemini_output.txt")?;
/// println!("{} files written", report.success_count());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SplitterBuilder {
    /// 内部設定（構築中）
    config: SplitConfig,
}

impl Default for SplitterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SplitterBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - 出力ディレクトリ: `output_excels`
    /// - 分割方式: `SplitMode::ByPdfFile`
    /// - カテゴリ: Income Statement / Balance Sheet / Working Capital
    /// - 並列書き込み: 無効
    /// - 入力ファイルの最大サイズ: 256MB
    pub fn new() -> Self {
        Self {
            config: SplitConfig::default(),
        }
    }

    /// 出力ディレクトリを指定する（存在しない場合は作成されます）
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// 分割方式を指定する
    ///
    /// ```rust,no_run
    /// use sheetsplit::{SplitMode, SplitterBuilder};
    ///
    /// let builder = SplitterBuilder::new().with_mode(SplitMode::PerEntry);
    /// ```
    pub fn with_mode(mut self, mode: SplitMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// シートのカテゴリを置き換える
    ///
    /// # 制約
    ///
    /// * カテゴリが1つ以上あること
    /// * 検索キーが空でないこと
    /// * シート名が1〜31文字で、`[ ] : * ? / \`を含まず、`'`で始まらず終わらないこと
    /// * シート名が重複しないこと（大文字小文字を区別しない）
    ///
    /// 制約違反の場合、`build()`時に`SheetSplitError::Config`を返します。
    ///
    /// ```rust,no_run
    /// use sheetsplit::{Category, CategoryMap, SplitterBuilder};
    ///
    /// let builder = SplitterBuilder::new().with_categories(CategoryMap::new(vec![
    ///     Category::new("Income Statement", "P&L"),
    ///     Category::new("Cash Flow", "Cash Flow"),
    /// ]));
    /// ```
    pub fn with_categories(mut self, categories: CategoryMap) -> Self {
        self.config.categories = categories;
        self
    }

    /// 出力ファイルを`rayon`で並列に書き込むかを指定する
    ///
    /// 結果の順序は逐次処理の場合と同じです。
    pub fn parallel_writes(mut self, enabled: bool) -> Self {
        self.config.parallel_writes = enabled;
        self
    }

    /// 入力ファイルの最大サイズ（バイト）を指定する
    pub fn with_max_input_size(mut self, bytes: u64) -> Self {
        self.config.security.max_input_file_size = bytes;
        self
    }

    /// 設定を検証し、`Splitter`インスタンスを生成する
    ///
    /// # 発生し得るエラー
    ///
    /// * `SheetSplitError::Config(String)`: 設定の検証に失敗した場合
    pub fn build(self) -> Result<Splitter, SheetSplitError> {
        // 1. 出力ディレクトリ
        if self.config.output_dir.as_os_str().is_empty() {
            return Err(SheetSplitError::Config(
                "Output directory must not be empty".to_string(),
            ));
        }

        // 2. 入力制限
        if self.config.security.max_input_file_size == 0 {
            return Err(SheetSplitError::Config(
                "Maximum input size must be greater than zero".to_string(),
            ));
        }

        // 3. カテゴリ
        validate_categories(&self.config.categories)?;

        Ok(Splitter::new(self.config))
    }
}

fn validate_sheet_name(name: &str) -> Result<(), SheetSplitError> {
    let len = name.chars().count();
    if len == 0 || len > MAX_SHEET_NAME_LEN {
        return Err(SheetSplitError::Config(format!(
            "Sheet name must be 1-{} characters: '{}'",
            MAX_SHEET_NAME_LEN, name
        )));
    }
    if let Some(c) = name.chars().find(|c| INVALID_SHEET_CHARS.contains(c)) {
        return Err(SheetSplitError::Config(format!(
            "Sheet name contains invalid character '{}': '{}'",
            c, name
        )));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err(SheetSplitError::Config(format!(
            "Sheet name must not start or end with an apostrophe: '{}'",
            name
        )));
    }
    Ok(())
}

fn validate_categories(categories: &CategoryMap) -> Result<(), SheetSplitError> {
    if categories.is_empty() {
        return Err(SheetSplitError::Config(
            "Category list is empty".to_string(),
        ));
    }

    let mut seen: Vec<String> = Vec::with_capacity(categories.len());
    for category in categories.iter() {
        if category.key().trim().is_empty() {
            return Err(SheetSplitError::Config(format!(
                "Category key for sheet '{}' is empty",
                category.sheet_name()
            )));
        }
        validate_sheet_name(category.sheet_name())?;

        let folded = category.sheet_name().to_lowercase();
        if seen.contains(&folded) {
            return Err(SheetSplitError::Config(format!(
                "Duplicate sheet name: '{}'",
                category.sheet_name()
            )));
        }
        seen.push(folded);
    }
    Ok(())
}

/// 変換処理のファサード
///
/// 入力テキストファイルを読み込み、出力ディレクトリにワークブックを書き出します。
/// `SplitterBuilder`を使用して構築された設定に基づいて変換処理を実行します。
#[derive(Debug)]
pub struct Splitter {
    /// 変換設定
    config: SplitConfig,
}

impl Splitter {
    pub(crate) fn new(config: SplitConfig) -> Self {
        Self { config }
    }

    /// 分割方式
    pub fn mode(&self) -> SplitMode {
        self.config.mode
    }

    /// 出力ディレクトリ
    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    /// 入力ファイルを変換する
    ///
    /// # 処理フロー
    ///
    /// 1. 入力の読み込みとJSON復元
    /// 2. 出力ディレクトリの作成
    /// 3. 各エントリからテーブルを抽出（失敗したエントリは記録してスキップ）
    /// 4. `ByPdfFile`の場合は結合と`pdffile`による再分割
    /// 5. 同じ出力ファイル名になる識別子の行をまとめ、
    ///    出力ファイルごとにワークブックを書き込み（失敗したファイルは記録してスキップ）
    ///
    /// # 戻り値
    ///
    /// * `Ok(RunReport)` - 実行結果。個々のエントリやファイルの失敗はここに含まれます
    /// * `Err(SheetSplitError)` - 実行全体を継続できないエラー
    pub fn run(&self, input: impl AsRef<Path>) -> Result<RunReport, SheetSplitError> {
        let input = input.as_ref();
        let config = &self.config;

        // 1. 読み込み
        let loaded = load_input(input, config.mode, &config.security)?;

        // 2. 出力ディレクトリ
        if !config.output_dir.exists() {
            fs::create_dir_all(&config.output_dir)?;
            info!(dir = %config.output_dir.display(), "created output directory");
        }

        // 3. 抽出
        let mut extracted = Vec::new();
        let mut entry_failures = Vec::new();
        let mut tables: Vec<(String, Table)> = Vec::new();
        for blob in &loaded.blobs {
            match extract_table(blob) {
                Ok(table) => {
                    extracted.push(blob.key.clone());
                    tables.push((blob.key.clone(), table));
                }
                Err(error) => {
                    warn!(key = %blob.key, %error, "skipped entry");
                    entry_failures.push(EntryFailure {
                        key: blob.key.clone(),
                        error,
                    });
                }
            }
        }

        // 4. 出力単位の決定
        let mut orphan_rows = 0;
        let jobs: Vec<(String, Table)> = match config.mode {
            SplitMode::PerEntry => tables,
            SplitMode::ByPdfFile => {
                let tables: Vec<Table> = tables.into_iter().map(|(_, t)| t).collect();
                let partition = merge_and_split(&tables)?;
                orphan_rows = partition.orphan_rows;
                if orphan_rows > 0 {
                    warn!(orphan_rows, "rows without a pdffile value were dropped");
                }
                partition
                    .groups
                    .into_iter()
                    .map(|g| (g.pdffile, g.table))
                    .collect()
            }
        };

        // 5. 書き込み（出力先が重複しないよう、同じファイル名になる識別子をまとめる）
        let jobs = plan_writes(jobs, config.mode);
        let writer = WorkbookWriter::new(&config.output_dir, &config.categories, config.mode);
        let files: Vec<FileOutcome> = if config.parallel_writes {
            jobs.par_iter().map(|job| writer.write(job)).collect()
        } else {
            jobs.iter().map(|job| writer.write(job)).collect()
        };

        let report = RunReport {
            mode: config.mode,
            output_dir: config.output_dir.clone(),
            strategy: loaded.strategy,
            extracted,
            entry_failures,
            files,
            orphan_rows,
        };
        info!(
            written = report.success_count(),
            skipped = report.skipped_count(),
            failed = report.failure_count(),
            "finished"
        );
        Ok(report)
    }
}

/// デフォルト設定（`SplitMode::ByPdfFile`）で入力ファイルを変換する
///
/// ```rust,no_run
/// # fn main() -> Result<(), sheetsplit::SheetSplitError> {
/// let report = sheetsplit::generate_workbooks("output_gemini.txt", "output_excels")?;
/// # Ok(())
/// # }
/// ```
pub fn generate_workbooks(
    input: impl AsRef<Path>,
    output_dir: impl Into<PathBuf>,
) -> Result<RunReport, SheetSplitError> {
    SplitterBuilder::new()
        .with_output_dir(output_dir)
        .build()?
        .run(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Category;

    #[test]
    fn test_splitter_builder_new() {
        let builder = SplitterBuilder::new();
        assert_eq!(builder.config.output_dir, PathBuf::from("output_excels"));
        assert_eq!(builder.config.mode, SplitMode::ByPdfFile);
        assert_eq!(builder.config.categories, CategoryMap::default());
        assert!(!builder.config.parallel_writes);
    }

    #[test]
    fn test_builder_method_chaining() {
        let builder = SplitterBuilder::new()
            .with_output_dir("out")
            .with_mode(SplitMode::PerEntry)
            .parallel_writes(true)
            .with_max_input_size(1024);

        assert_eq!(builder.config.output_dir, PathBuf::from("out"));
        assert_eq!(builder.config.mode, SplitMode::PerEntry);
        assert!(builder.config.parallel_writes);
        assert_eq!(builder.config.security.max_input_file_size, 1024);
    }

    #[test]
    fn test_build_success() {
        let splitter = SplitterBuilder::new().build().unwrap();
        assert_eq!(splitter.mode(), SplitMode::ByPdfFile);
        assert_eq!(splitter.output_dir(), Path::new("output_excels"));
    }

    #[test]
    fn test_build_with_empty_output_dir() {
        match SplitterBuilder::new().with_output_dir("").build() {
            Err(SheetSplitError::Config(msg)) => assert!(msg.contains("Output directory")),
            _ => panic!("Expected Config error"),
        }
    }

    #[test]
    fn test_build_with_zero_input_size() {
        assert!(matches!(
            SplitterBuilder::new().with_max_input_size(0).build(),
            Err(SheetSplitError::Config(_))
        ));
    }

    #[test]
    fn test_build_with_empty_categories() {
        match SplitterBuilder::new()
            .with_categories(CategoryMap::new(vec![]))
            .build()
        {
            Err(SheetSplitError::Config(msg)) => assert!(msg.contains("empty")),
            _ => panic!("Expected Config error"),
        }
    }

    #[test]
    fn test_build_with_invalid_sheet_names() {
        let cases = [
            Category::new("x", ""),
            Category::new("x", "A very long sheet name beyond 31 chars"),
            Category::new("x", "P/L"),
            Category::new("x", "'quoted'"),
            Category::new("  ", "Blank key"),
        ];
        for category in cases {
            let result = SplitterBuilder::new()
                .with_categories(CategoryMap::new(vec![category.clone()]))
                .build();
            assert!(
                matches!(result, Err(SheetSplitError::Config(_))),
                "{:?} should be rejected",
                category
            );
        }
    }

    #[test]
    fn test_build_with_duplicate_sheet_names() {
        let result = SplitterBuilder::new()
            .with_categories(CategoryMap::new(vec![
                Category::new("Income", "Summary"),
                Category::new("Balance", "SUMMARY"),
            ]))
            .build();
        match result {
            Err(SheetSplitError::Config(msg)) => assert!(msg.contains("Duplicate")),
            _ => panic!("Expected Config error"),
        }
    }

    #[test]
    fn test_run_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let splitter = SplitterBuilder::new()
            .with_output_dir(dir.path().join("out"))
            .build()
            .unwrap();
        let result = splitter.run(dir.path().join("missing.txt"));
        assert!(matches!(result, Err(SheetSplitError::InputNotFound { .. })));
        // 読み込みに失敗した場合は出力ディレクトリを作成しない
        assert!(!dir.path().join("out").exists());
    }
}
