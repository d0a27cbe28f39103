//! Run Report
//!
//! 1回の実行結果（成功・スキップ・失敗）を保持するモジュール。
//! エラーは出力せずに収集し、呼び出し側が結果を検査できるようにします。

use std::path::PathBuf;

use serde::Serialize;

use crate::api::SplitMode;
use crate::error::SheetSplitError;
use crate::loader::ParseStrategy;

/// 書き込んだシートの情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetSummary {
    /// シート名
    pub name: String,
    /// データ行数（ヘッダーを除く）
    pub rows: usize,
}

/// 出力ファイル1つ分の処理結果
#[derive(Debug)]
pub enum FileStatus {
    /// ワークブックを書き込んだ
    Written {
        /// 出力先のパス
        path: PathBuf,
        /// 作成したシート（カテゴリ順）
        sheets: Vec<SheetSummary>,
    },
    /// どのカテゴリにも該当する行がなかったため、ファイルを作成しなかった
    Skipped,
    /// 書き込みに失敗した
    Failed(SheetSplitError),
}

/// 出力ファイル1つ分の結果
#[derive(Debug)]
pub struct FileOutcome {
    /// 元の識別子（キーまたは`pdffile`の値）
    pub source: String,
    /// 同じ出力ファイル名になり、このファイルに行を結合した後続の識別子
    pub merged_sources: Vec<String>,
    /// 出力ファイル名（導出できなかった場合は`None`）
    pub file_name: Option<String>,
    /// 処理結果
    pub status: FileStatus,
}

/// 抽出に失敗したエントリ
#[derive(Debug)]
pub struct EntryFailure {
    /// エントリのキー
    pub key: String,
    /// 失敗の理由
    pub error: SheetSplitError,
}

/// 1回の実行結果
#[derive(Debug)]
pub struct RunReport {
    /// 分割方式
    pub mode: SplitMode,
    /// 出力ディレクトリ
    pub output_dir: PathBuf,
    /// JSONの復元に成功した解析戦略
    pub strategy: ParseStrategy,
    /// テーブルの抽出に成功したエントリのキー（入力順）
    pub extracted: Vec<String>,
    /// テーブルの抽出に失敗したエントリ
    pub entry_failures: Vec<EntryFailure>,
    /// 出力ファイルごとの結果（処理順）
    pub files: Vec<FileOutcome>,
    /// `pdffile`が欠損していたため出力されなかった行数
    pub orphan_rows: usize,
}

impl RunReport {
    /// 書き込みに成功したファイル数
    pub fn success_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Written { .. }))
            .count()
    }

    /// スキップしたファイル数
    pub fn skipped_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Skipped))
            .count()
    }

    /// 失敗したファイル数
    pub fn failure_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Failed(_)))
            .count()
    }

    /// 書き込んだファイルのパス
    pub fn written_paths(&self) -> Vec<&PathBuf> {
        self.files
            .iter()
            .filter_map(|f| match &f.status {
                FileStatus::Written { path, .. } => Some(path),
                _ => None,
            })
            .collect()
    }

    /// シリアライズ可能な要約を作成
    pub fn summary(&self) -> ReportSummary {
        let mut written = Vec::new();
        let mut skipped = Vec::new();
        let mut failures: Vec<FailureRecord> = self
            .entry_failures
            .iter()
            .map(|f| FailureRecord {
                stage: "extract",
                item: f.key.clone(),
                message: f.error.to_string(),
            })
            .collect();

        for file in &self.files {
            let name = file.file_name.clone().unwrap_or_else(|| file.source.clone());
            match &file.status {
                FileStatus::Written { sheets, .. } => written.push(WrittenFile {
                    file: name,
                    sheets: sheets.clone(),
                    merged_sources: file.merged_sources.clone(),
                }),
                FileStatus::Skipped => skipped.push(name),
                FileStatus::Failed(error) => failures.push(FailureRecord {
                    stage: "write",
                    item: name,
                    message: error.to_string(),
                }),
            }
        }

        ReportSummary {
            mode: self.mode,
            strategy: self.strategy,
            output_dir: self.output_dir.display().to_string(),
            extracted_entries: self.extracted.len(),
            written,
            skipped,
            failures,
            orphan_rows: self.orphan_rows,
        }
    }
}

/// 書き込んだファイルの要約
#[derive(Debug, Clone, Serialize)]
pub struct WrittenFile {
    pub file: String,
    pub sheets: Vec<SheetSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub merged_sources: Vec<String>,
}

/// 失敗の要約
#[derive(Debug, Clone, Serialize)]
pub struct FailureRecord {
    /// `extract`または`write`
    pub stage: &'static str,
    pub item: String,
    pub message: String,
}

/// 実行結果の要約（JSON出力用）
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub mode: SplitMode,
    pub strategy: ParseStrategy,
    pub output_dir: String,
    pub extracted_entries: usize,
    pub written: Vec<WrittenFile>,
    pub skipped: Vec<String>,
    pub failures: Vec<FailureRecord>,
    pub orphan_rows: usize,
}
