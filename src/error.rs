//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use thiserror::Error;

/// sheetsplitクレート全体で使用するエラー型
///
/// 入力ファイルの読み込み、JSON復元、TSV解析、ワークブック出力の各段階で
/// 発生するすべてのエラーを統一的に扱うために使用されます。
///
/// # エラーの種類
///
/// 実行全体を中断する致命的なエラー:
///
/// - `InputNotFound` / `Io` / `Utf8`: 入力ファイルが読めない
/// - `UnrecoverableJson` / `UnexpectedJsonShape`: JSONを復元できない
/// - `NoTables` / `MissingColumn`（`pdffile`）: 結合後のデータが分割できない
/// - `Config` / `SecurityViolation`: 設定や入力サイズの制限違反
///
/// エントリ単位・ファイル単位で記録され、処理は継続されるエラー:
///
/// - `MissingHeader` / `TableParse`: 1エントリのみスキップ
/// - `MissingColumn`（`table`） / `InvalidOutputName` / `Workbook` / `Io`: 1ファイルのみ失敗
///
/// # 使用例
///
/// ```rust,no_run
/// use sheetsplit::{SheetSplitError, SplitterBuilder};
///
/// # fn main() -> Result<(), SheetSplitError> {
/// let splitter = SplitterBuilder::new().build()?;
/// match splitter.run("missing.txt") {
///     Err(SheetSplitError::InputNotFound { path }) => {
///         println!("入力ファイルが見つかりません: {}", path);
///     }
///     _ => {}
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Error, Debug)]
pub enum SheetSplitError {
    /// I/O操作中に発生したエラー
    ///
    /// 入力ファイルの読み込み失敗、出力ディレクトリの作成失敗などで使用されます。
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 入力ファイルが存在しない
    #[error("Input file not found: {path}")]
    InputNotFound {
        /// 指定された入力パス
        path: String,
    },

    /// 入力ファイルがUTF-8として解釈できない
    #[error("Input is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// すべての解析戦略を試してもJSONを復元できなかった
    #[error("Failed to parse JSON even after repair: {0}")]
    UnrecoverableJson(String),

    /// JSONとしては正しいが、トップレベルがオブジェクトではない
    #[error("Expected a JSON object at the top level, found {0}")]
    UnexpectedJsonShape(String),

    /// `pdffile`とタブを含むヘッダー行が見つからない
    #[error("No header line containing 'pdffile' and a tab in entry '{key}'")]
    MissingHeader {
        /// 対象エントリのキー
        key: String,
    },

    /// タブ区切りテーブルの解析エラー
    #[error("Failed to parse table in entry '{key}': {message}")]
    TableParse {
        /// 対象エントリのキー
        key: String,
        /// 詳細メッセージ
        message: String,
    },

    /// 必須列が存在しない
    ///
    /// 結合後のデータに`pdffile`列がない場合は致命的エラー、
    /// 出力ファイル単位で`table`列がない場合はそのファイルのみ失敗となります。
    #[error("Required column '{column}' is missing")]
    MissingColumn {
        /// 列名
        column: String,
    },

    /// 抽出に成功したテーブルが1つもない
    #[error("No table could be extracted from the input")]
    NoTables,

    /// 出力ファイル名を導出できない（サニタイズ後に空になった等）
    #[error("Cannot derive an output file name from '{source_name}'")]
    InvalidOutputName {
        /// 元になった識別子（キーまたは`pdffile`の値）
        source_name: String,
    },

    /// ワークブック書き込み中のエラー
    ///
    /// `#[from]`属性により、`rust_xlsxwriter::XlsxError`から自動的に変換されます。
    #[error("Failed to write workbook: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    /// 設定の検証に失敗したエラー
    ///
    /// `SplitterBuilder::build()`時に設定を検証し、無効な設定が検出された
    /// 場合に発生します。例えば、カテゴリが空の場合や、シート名がExcelの
    /// 制約を満たさない場合などです。
    #[error("Configuration error: {0}")]
    Config(String),

    /// 入力サイズ等の制限に違反したエラー
    #[error("Security violation: {0}")]
    SecurityViolation(String),
}
