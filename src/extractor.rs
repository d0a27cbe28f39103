//! Table Extractor Module
//!
//! テキストからタブ区切りテーブルを取り出すモジュール。
//! `pdffile`とタブを含む最初の行をヘッダーとみなし、それより前の説明文は破棄します。

use csv::ReaderBuilder;
use tracing::debug;

use crate::error::SheetSplitError;
use crate::types::{RawBlob, Row, Table, PDFFILE_COLUMN};

/// 欠損値として扱う文字列
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// ヘッダー行かどうかを判定
fn is_header_line(line: &str) -> bool {
    line.contains(PDFFILE_COLUMN) && line.contains('\t')
}

/// ヘッダー行から始まるテーブル部分を取り出す
///
/// # 戻り値
///
/// * `Some(&str)` - ヘッダー行以降のテキスト
/// * `None` - ヘッダー行が見つからない場合
pub fn locate_table(text: &str) -> Option<&str> {
    let text = text.trim();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if is_header_line(line) {
            return Some(&text[offset..]);
        }
        offset += line.len();
    }
    None
}

/// 列名を整える
///
/// 前後の空白を除去し、空の列名は`Unnamed: <位置>`、重複した列名は
/// `name.1`, `name.2`, ...とします。
fn normalize_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for (index, name) in raw.enumerate() {
        let name = name.trim();
        let base = if name.is_empty() {
            format!("Unnamed: {}", index)
        } else {
            name.to_string()
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while columns.contains(&candidate) {
            candidate = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        columns.push(candidate);
    }
    columns
}

fn to_cell(field: &str) -> Option<String> {
    if MISSING_MARKERS.contains(&field.trim()) {
        None
    } else {
        Some(field.to_string())
    }
}

/// タブ区切りテキストを解析してテーブルを構築
///
/// 1行目を列名として扱います。列数に満たない行は欠損値で埋め、
/// 列数を超える行はエラーになります。空行と、空白や欠損値だけの行は無視されます。
pub fn parse_tsv(key: &str, table_text: &str) -> Result<Table, SheetSplitError> {
    let parse_error = |message: String| SheetSplitError::TableParse {
        key: key.to_string(),
        message,
    };

    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_reader(table_text.as_bytes());

    let columns = normalize_headers(
        reader
            .headers()
            .map_err(|e| parse_error(e.to_string()))?
            .iter(),
    );

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| parse_error(e.to_string()))?;
        if record.len() > columns.len() {
            return Err(parse_error(format!(
                "expected {} fields in data row {}, saw {}",
                columns.len(),
                index + 1,
                record.len()
            )));
        }
        let cells: Vec<Option<String>> = record.iter().map(to_cell).collect();
        if cells.iter().all(Option::is_none) {
            continue;
        }
        rows.push(Row::new(cells));
    }

    Ok(Table::new(columns, rows))
}

/// 1エントリからテーブルを抽出
///
/// # 戻り値
///
/// * `Ok(Table)` - 抽出に成功した場合
/// * `Err(SheetSplitError::MissingHeader)` - ヘッダー行がない場合
/// * `Err(SheetSplitError::TableParse)` - テーブルの解析に失敗した場合
pub fn extract_table(blob: &RawBlob) -> Result<Table, SheetSplitError> {
    let table_text = locate_table(&blob.text).ok_or_else(|| SheetSplitError::MissingHeader {
        key: blob.key.clone(),
    })?;

    let table = parse_tsv(&blob.key, table_text)?;
    debug!(
        key = %blob.key,
        columns = table.columns().len(),
        rows = table.len(),
        "extracted table"
    );
    Ok(table)
}
