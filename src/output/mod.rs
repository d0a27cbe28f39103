//! Output Module
//!
//! 行をカテゴリごとに振り分け、1つの`.xlsx`ファイルとして書き出すモジュール。

mod sheet;

use std::collections::HashMap;
use std::path::Path;

use rust_xlsxwriter::{DocProperties, ExcelDateTime, Workbook};
use tracing::{debug, info, warn};

use crate::api::{Category, CategoryMap, SplitMode};
use crate::error::SheetSplitError;
use crate::merger::concat_tables;
use crate::report::{FileOutcome, FileStatus, SheetSummary};
use crate::security::sanitize_base_name;
use crate::types::{Table, TABLE_COLUMN};

/// 分割方式ごとに取り除く拡張子
fn strip_suffixes(mode: SplitMode) -> &'static [&'static str] {
    match mode {
        SplitMode::PerEntry => &[".pdf"],
        SplitMode::ByPdfFile => &[".pdf", ".png"],
    }
}

/// 識別子から出力ファイル名（`<base>.xlsx`）を導出
///
/// ```rust
/// use sheetsplit::{output_file_name, SplitMode};
///
/// let name = output_file_name("report:Q1/2024.pdf", SplitMode::ByPdfFile).unwrap();
/// assert_eq!(name, "report_Q1_2024.xlsx");
/// ```
pub fn output_file_name(source: &str, mode: SplitMode) -> Result<String, SheetSplitError> {
    sanitize_base_name(source, strip_suffixes(mode))
        .map(|base| format!("{}.xlsx", base))
        .ok_or_else(|| SheetSplitError::InvalidOutputName {
            source_name: source.to_string(),
        })
}

/// 行をカテゴリごとのテーブルに振り分ける
///
/// 該当する行が1行もないカテゴリは結果に含まれません。
/// `table`列が欠損している行はどのカテゴリにも該当しません。
///
/// # 戻り値
///
/// * `Ok(Vec<(&Category, Table)>)` - カテゴリ順のシート候補
/// * `Err(SheetSplitError::MissingColumn)` - `table`列が存在しない場合
pub fn categorize<'a>(
    table: &Table,
    categories: &'a CategoryMap,
) -> Result<Vec<(&'a Category, Table)>, SheetSplitError> {
    let index = table
        .column_index(TABLE_COLUMN)
        .ok_or_else(|| SheetSplitError::MissingColumn {
            column: TABLE_COLUMN.to_string(),
        })?;

    Ok(categories
        .iter()
        .map(|category| {
            let subset =
                table.filter(|row| row.get(index).is_some_and(|v| category.matches(v)));
            (category, subset)
        })
        .filter(|(_, subset)| !subset.is_empty())
        .collect())
}

/// 1つの出力ファイルに書き込む内容
#[derive(Debug)]
pub(crate) struct WriteJob {
    /// 最初に現れた識別子
    pub source: String,
    /// 同じ出力ファイル名に合流した後続の識別子
    pub merged_sources: Vec<String>,
    pub table: Table,
}

impl WriteJob {
    pub fn new(source: impl Into<String>, table: Table) -> Self {
        Self {
            source: source.into(),
            merged_sources: Vec::new(),
            table,
        }
    }
}

/// 識別子ごとのテーブルを出力ファイル単位のジョブにまとめる
///
/// `a.pdf`と`a.png`のように異なる識別子が同じファイル名になる場合は、
/// 最初に現れた識別子のジョブに行を結合します（列は和集合）。
/// ジョブの順序は最初に現れた順で、各ジョブの出力先は互いに異なります。
/// ファイル名を導出できない識別子はそのまま残し、書き込み時に失敗として記録されます。
pub(crate) fn plan_writes(sources: Vec<(String, Table)>, mode: SplitMode) -> Vec<WriteJob> {
    let mut jobs: Vec<WriteJob> = Vec::with_capacity(sources.len());
    let mut by_name: HashMap<String, usize> = HashMap::new();

    for (source, table) in sources {
        let Ok(name) = output_file_name(&source, mode) else {
            jobs.push(WriteJob::new(source, table));
            continue;
        };

        match by_name.get(&name) {
            Some(&index) => {
                let job = &mut jobs[index];
                warn!(
                    file = %name,
                    first = %job.source,
                    %source,
                    "output name collision, combining rows"
                );
                job.table = concat_tables(&[std::mem::take(&mut job.table), table]);
                job.merged_sources.push(source);
            }
            None => {
                by_name.insert(name, jobs.len());
                jobs.push(WriteJob::new(source, table));
            }
        }
    }
    jobs
}

/// ワークブックの書き込みを担当する構造体
#[derive(Debug)]
pub(crate) struct WorkbookWriter<'a> {
    output_dir: &'a Path,
    categories: &'a CategoryMap,
    mode: SplitMode,
}

impl<'a> WorkbookWriter<'a> {
    pub fn new(output_dir: &'a Path, categories: &'a CategoryMap, mode: SplitMode) -> Self {
        Self {
            output_dir,
            categories,
            mode,
        }
    }

    /// 1つの出力ファイルを処理する
    ///
    /// エラーは`FileStatus::Failed`として返し、呼び出し側の処理は継続させます。
    pub fn write(&self, job: &WriteJob) -> FileOutcome {
        let source = job.source.as_str();
        let file_name = match output_file_name(source, self.mode) {
            Ok(name) => name,
            Err(error) => {
                warn!(%source, %error, "cannot derive output name");
                return FileOutcome {
                    source: source.to_string(),
                    merged_sources: job.merged_sources.clone(),
                    file_name: None,
                    status: FileStatus::Failed(error),
                };
            }
        };

        let path = self.output_dir.join(&file_name);
        let status = match self.write_file(&path, &job.table) {
            Ok(sheets) if sheets.is_empty() => {
                warn!(file = %file_name, "skipped, no rows matched any category");
                FileStatus::Skipped
            }
            Ok(sheets) => {
                info!(file = %file_name, sheets = sheets.len(), "created workbook");
                FileStatus::Written { path, sheets }
            }
            Err(error) => {
                warn!(file = %file_name, %error, "failed to write workbook");
                FileStatus::Failed(error)
            }
        };

        FileOutcome {
            source: source.to_string(),
            merged_sources: job.merged_sources.clone(),
            file_name: Some(file_name),
            status,
        }
    }

    /// シートがない場合はファイルを作成しない
    fn write_file(
        &self,
        path: &Path,
        table: &Table,
    ) -> Result<Vec<SheetSummary>, SheetSplitError> {
        let sheets = categorize(table, self.categories)?;
        if sheets.is_empty() {
            return Ok(Vec::new());
        }

        let mut workbook = Workbook::new();
        // 再実行時に同一のファイルになるよう作成日時を固定
        let created = ExcelDateTime::from_ymd(2000, 1, 1)?;
        workbook.set_properties(&DocProperties::new().set_creation_datetime(&created));

        let header = sheet::header_format();
        let mut summaries = Vec::with_capacity(sheets.len());
        for (category, subset) in &sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(category.sheet_name())?;
            sheet::write_table(worksheet, subset, &header)?;
            debug!(sheet = category.sheet_name(), rows = subset.len(), "wrote sheet");
            summaries.push(SheetSummary {
                name: category.sheet_name().to_string(),
                rows: subset.len(),
            });
        }

        workbook.save(path)?;
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Row;

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| {
                    Row::new(
                        r.iter()
                            .map(|v| if v.is_empty() { None } else { Some(v.to_string()) })
                            .collect(),
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn test_output_file_name_per_entry() {
        assert_eq!(
            output_file_name("file1", SplitMode::PerEntry).unwrap(),
            "file1.xlsx"
        );
        assert_eq!(
            output_file_name("annual.pdf", SplitMode::PerEntry).unwrap(),
            "annual.xlsx"
        );
        // PNGの拡張子はキーからは取り除かない
        assert_eq!(
            output_file_name("scan.png", SplitMode::PerEntry).unwrap(),
            "scan.png.xlsx"
        );
    }

    #[test]
    fn test_output_file_name_by_pdffile() {
        assert_eq!(
            output_file_name(" scan.png ", SplitMode::ByPdfFile).unwrap(),
            "scan.xlsx"
        );
        assert!(matches!(
            output_file_name(".pdf", SplitMode::ByPdfFile),
            Err(SheetSplitError::InvalidOutputName { .. })
        ));
    }

    #[test]
    fn test_categorize_routes_rows() {
        let t = table(
            &["pdffile", "table"],
            &[
                &["a.pdf", "income statement - detail"],
                &["a.pdf", "BALANCE SHEET"],
                &["a.pdf", "Cash Flow"],
                &["a.pdf", ""],
                &["a.pdf", "Income Statement"],
            ],
        );
        let categories = CategoryMap::default();
        let sheets = categorize(&t, &categories).unwrap();

        let names: Vec<&str> = sheets.iter().map(|(c, _)| c.sheet_name()).collect();
        assert_eq!(names, vec!["Income Statement", "Balance Sheet"]);
        assert_eq!(sheets[0].1.len(), 2);
        assert_eq!(sheets[1].1.len(), 1);
    }

    #[test]
    fn test_categorize_requires_table_column() {
        let t = table(&["pdffile", "kind"], &[&["a.pdf", "Balance Sheet"]]);
        assert!(matches!(
            categorize(&t, &CategoryMap::default()),
            Err(SheetSplitError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_write_skips_when_no_category_matches() {
        let dir = tempfile::tempdir().unwrap();
        let categories = CategoryMap::default();
        let writer = WorkbookWriter::new(dir.path(), &categories, SplitMode::PerEntry);
        let t = table(&["pdffile", "table"], &[&["a.pdf", "Notes"]]);

        let outcome = writer.write(&WriteJob::new("a.pdf", t));
        assert!(matches!(outcome.status, FileStatus::Skipped));
        assert!(!dir.path().join("a.xlsx").exists());
    }

    #[test]
    fn test_write_creates_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let categories = CategoryMap::default();
        let writer = WorkbookWriter::new(dir.path(), &categories, SplitMode::ByPdfFile);
        let t = table(
            &["pdffile", "table", "amount"],
            &[&["a.pdf", "Working Capital", "12.5"]],
        );

        let outcome = writer.write(&WriteJob::new("a.pdf", t));
        match outcome.status {
            FileStatus::Written { path, sheets } => {
                assert!(path.exists());
                assert_eq!(path.file_name().unwrap(), "a.xlsx");
                assert_eq!(sheets.len(), 1);
                assert_eq!(sheets[0].name, "Working Capital");
                assert_eq!(sheets[0].rows, 1);
            }
            other => panic!("Expected Written, got {:?}", other),
        }
    }

    #[test]
    fn test_write_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let categories = CategoryMap::default();
        let writer = WorkbookWriter::new(&missing, &categories, SplitMode::ByPdfFile);
        let t = table(&["pdffile", "table"], &[&["a.pdf", "Balance Sheet"]]);

        let outcome = writer.write(&WriteJob::new("a.pdf", t));
        assert!(matches!(outcome.status, FileStatus::Failed(_)));
    }

    #[test]
    fn test_plan_writes_combines_colliding_names() {
        let sources = vec![
            (
                "a.pdf".to_string(),
                table(&["pdffile", "table"], &[&["a.pdf", "Income Statement"]]),
            ),
            (
                "b.pdf".to_string(),
                table(&["pdffile", "table"], &[&["b.pdf", "Income Statement"]]),
            ),
            (
                "a.png".to_string(),
                table(
                    &["pdffile", "table", "amount"],
                    &[&["a.png", "Balance Sheet", "7"]],
                ),
            ),
        ];

        let jobs = plan_writes(sources, SplitMode::ByPdfFile);

        let order: Vec<&str> = jobs.iter().map(|j| j.source.as_str()).collect();
        assert_eq!(order, vec!["a.pdf", "b.pdf"]);
        assert_eq!(jobs[0].merged_sources, vec!["a.png"]);
        assert_eq!(jobs[0].table.columns(), &["pdffile", "table", "amount"]);
        assert_eq!(jobs[0].table.len(), 2);
        assert_eq!(jobs[0].table.value(0, "amount"), None);
        assert_eq!(jobs[0].table.value(1, "amount"), Some("7"));
        assert!(jobs[1].merged_sources.is_empty());
    }

    #[test]
    fn test_plan_writes_per_entry_keys() {
        let sources = vec![
            ("a".to_string(), table(&["table"], &[&["Balance Sheet"]])),
            ("a.pdf".to_string(), table(&["table"], &[&["Balance Sheet"]])),
            (".pdf".to_string(), table(&["table"], &[&["Balance Sheet"]])),
        ];

        let jobs = plan_writes(sources, SplitMode::PerEntry);

        // 名前を導出できない識別子は単独のジョブとして残る
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].merged_sources, vec!["a.pdf"]);
        assert_eq!(jobs[1].source, ".pdf");
    }
}
