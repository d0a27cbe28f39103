//! Public API Types
//!
//! 公開APIで使用する列挙型とカテゴリ設定を定義するモジュール。

use serde::Serialize;

/// 出力ファイルの分割方式
///
/// 入力JSONのエントリをどの単位でワークブックに変換するかを指定します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum SplitMode {
    /// JSONのキーごとに1ファイルを出力
    ///
    /// 各エントリのテーブルをそのまま1つのワークブックに変換します。
    /// 出力ファイル名はキーから`.pdf`を取り除いたものになります。
    ///
    /// JSONの復元に失敗した場合は実行全体がエラーになります。
    PerEntry,

    /// `pdffile`列の値ごとに1ファイルを出力（デフォルト）
    ///
    /// すべてのエントリのテーブルを結合したうえで`pdffile`列の値で再分割します。
    /// 1つのエントリに複数ファイル分の行が含まれている場合や、同じファイルの行が
    /// 複数エントリに分散している場合に使用します。
    ///
    /// JSONの復元に失敗した場合でも、入力全体を1つのテキストとして扱い処理を続行します。
    ByPdfFile,
}

impl SplitMode {
    /// 表示用の名前
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitMode::PerEntry => "per-entry",
            SplitMode::ByPdfFile => "by-pdffile",
        }
    }
}

/// 行をシートへ振り分けるためのカテゴリ
///
/// `table`列の値に`key`が含まれる（大文字小文字を区別しない）行が、
/// `sheet_name`という名前のシートに出力されます。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    key: String,
    sheet_name: String,
}

impl Category {
    /// 新しいカテゴリを生成
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use sheetsplit::Category;
    ///
    /// let category = Category::new("Cash Flow", "Cash Flow");
    /// assert!(category.matches("cash flow statement"));
    /// ```
    pub fn new(key: impl Into<String>, sheet_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            sheet_name: sheet_name.into(),
        }
    }

    /// 検索キー（部分一致）
    pub fn key(&self) -> &str {
        &self.key
    }

    /// 出力シート名
    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// `table`列の値がこのカテゴリに該当するかを判定
    pub fn matches(&self, value: &str) -> bool {
        value.to_lowercase().contains(&self.key.to_lowercase())
    }
}

/// カテゴリの順序付きリスト
///
/// シートはこのリストの順序で作成されます。
/// デフォルトは財務三表のカテゴリです。
///
/// | キー | シート名 |
/// | ---- | -------- |
/// | Income Statement | Income Statement |
/// | Balance Sheet | Balance Sheet |
/// | Working Capital | Working Capital |
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryMap {
    categories: Vec<Category>,
}

impl Default for CategoryMap {
    fn default() -> Self {
        Self {
            categories: vec![
                Category::new("Income Statement", "Income Statement"),
                Category::new("Balance Sheet", "Balance Sheet"),
                Category::new("Working Capital", "Working Capital"),
            ],
        }
    }
}

impl CategoryMap {
    /// 任意のカテゴリリストから生成
    ///
    /// 内容の検証は`SplitterBuilder::build()`で行われます。
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// カテゴリを順に走査
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    /// カテゴリ数
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// カテゴリが空かどうか
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
