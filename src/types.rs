//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。

/// `pdffile`列の名前
pub const PDFFILE_COLUMN: &str = "pdffile";

/// `table`列の名前
pub const TABLE_COLUMN: &str = "table";

/// 入力JSONの1エントリ（キーとテキスト）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlob {
    /// 識別子（通常は元のPDFファイル名）
    pub key: String,
    /// プリアンブルとタブ区切りテーブルを含むテキスト
    pub text: String,
}

impl RawBlob {
    /// 新しいRawBlobを生成
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }
}

/// テーブルの1行
///
/// セルは所属するテーブルの列と同じ順序で並びます。
/// `None`は欠損値を表します。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    cells: Vec<Option<String>>,
}

impl Row {
    /// セルのリストから行を生成
    pub fn new(cells: Vec<Option<String>>) -> Self {
        Self { cells }
    }

    /// 指定した列位置のセル値（欠損値の場合は`None`）
    pub fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).and_then(|c| c.as_deref())
    }

    /// すべてのセル
    pub fn cells(&self) -> &[Option<String>] {
        &self.cells
    }

    /// 列数に満たない場合は欠損値で埋める
    pub(crate) fn pad_to(&mut self, width: usize) {
        if self.cells.len() < width {
            self.cells.resize(width, None);
        }
    }
}

/// 同一の列スキーマを共有する行の集合
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// 列名と行から生成
    ///
    /// 列数に満たない行は欠損値で埋められます。
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.pad_to(width);
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// 列名
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// 行
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// 行数
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 行が空かどうか
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 列名から列位置を取得
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// 列が存在するかを判定
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// 指定行・指定列のセル値
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)
    }

    /// 条件を満たす行だけを持つ新しいテーブル（列は維持）
    pub fn filter<F>(&self, mut predicate: F) -> Table
    where
        F: FnMut(&Row) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| predicate(r)).cloned().collect(),
        }
    }
}
