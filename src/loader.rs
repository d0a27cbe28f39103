//! Loader Module
//!
//! 入力テキストファイルを読み込み、キーとテキストの組（`RawBlob`）に復元するモジュール。
//!
//! 上流のテキスト生成器が出力するJSONは壊れていることがあるため、
//! 順序付きの解析戦略リストを先頭から試します。
//!
//! 1. `Strict` - 厳密なJSON解析
//! 2. `CommaRepair` - 欠落したカンマを補って再解析
//! 3. `OpaqueBlob` - 入力全体を1つのテキストとして扱う（`SplitMode::ByPdfFile`のみ）

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::SplitMode;
use crate::error::SheetSplitError;
use crate::security::SecurityConfig;
use crate::types::RawBlob;

/// JSONとして解析できなかった入力を格納するキー
pub const OPAQUE_BLOB_KEY: &str = "merged_data";

/// JSON復元の解析戦略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParseStrategy {
    /// 厳密なJSON解析
    Strict,
    /// 引用符の間に欠落したカンマを挿入してから解析
    CommaRepair,
    /// 入力全体を`merged_data`キーの1エントリとして扱う
    OpaqueBlob,
}

/// 解析戦略の結果
#[derive(Debug)]
pub enum ParseOutcome {
    /// 解析成功
    Parsed(Vec<RawBlob>),
    /// 失敗したが、次の戦略で回復できる可能性がある
    Retry(String),
    /// 後続の戦略でも回復できない
    Fatal(SheetSplitError),
}

impl ParseStrategy {
    /// 分割方式ごとの戦略リスト（試行順）
    pub fn chain(mode: SplitMode) -> &'static [ParseStrategy] {
        match mode {
            SplitMode::PerEntry => &[ParseStrategy::Strict, ParseStrategy::CommaRepair],
            SplitMode::ByPdfFile => &[
                ParseStrategy::Strict,
                ParseStrategy::CommaRepair,
                ParseStrategy::OpaqueBlob,
            ],
        }
    }

    /// クリーニング済みのテキストに対して戦略を1回試行する
    pub fn attempt(&self, cleaned: &str) -> ParseOutcome {
        match self {
            ParseStrategy::Strict => parse_object(cleaned),
            ParseStrategy::CommaRepair => parse_object(&repair_missing_commas(cleaned)),
            ParseStrategy::OpaqueBlob => {
                ParseOutcome::Parsed(vec![RawBlob::new(OPAQUE_BLOB_KEY, cleaned)])
            }
        }
    }
}

/// 前後の空白とMarkdownのコードフェンスを除去
pub fn clean_content(raw: &str) -> String {
    raw.trim()
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

fn comma_gap() -> &'static Regex {
    static COMMA_GAP: OnceLock<Regex> = OnceLock::new();
    // 直前がバックスラッシュでない閉じ引用符 + 空白 + 開き引用符
    COMMA_GAP.get_or_init(|| Regex::new(r#"([^\\]")\s+(")"#).expect("comma gap pattern"))
}

/// 空白だけで隔てられた2つの文字列トークンの間に`,\n`を挿入する
///
/// キーと値の組の間のカンマが欠落したJSONを対象とします。
///
/// ```rust
/// use sheetsplit::repair_missing_commas;
///
/// let fixed = repair_missing_commas("{\"a\": \"1\"\n\"b\": \"2\"}");
/// assert_eq!(fixed, "{\"a\": \"1\",\n\"b\": \"2\"}");
/// ```
pub fn repair_missing_commas(text: &str) -> String {
    comma_gap().replace_all(text, "${1},\n${2}").into_owned()
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// JSONの値をテキストとして扱う
fn value_to_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn parse_object(text: &str) -> ParseOutcome {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => ParseOutcome::Parsed(
            map.into_iter()
                .map(|(key, value)| RawBlob::new(key, value_to_text(value)))
                .collect(),
        ),
        Ok(other) => ParseOutcome::Fatal(SheetSplitError::UnexpectedJsonShape(
            describe(&other).to_string(),
        )),
        Err(e) => ParseOutcome::Retry(e.to_string()),
    }
}

/// 戦略リストを順に試し、最初に成功した結果を返す
///
/// # 戻り値
///
/// * `Ok((blobs, strategy))` - 復元したエントリと、成功した戦略
/// * `Err(SheetSplitError)` - `Fatal`が返された場合、またはすべての戦略が失敗した場合
pub fn parse_blobs(
    cleaned: &str,
    mode: SplitMode,
) -> Result<(Vec<RawBlob>, ParseStrategy), SheetSplitError> {
    let mut last_reason = String::from("no parse strategy available");

    for strategy in ParseStrategy::chain(mode) {
        match strategy.attempt(cleaned) {
            ParseOutcome::Parsed(blobs) => {
                debug!(?strategy, entries = blobs.len(), "parsed input");
                return Ok((blobs, *strategy));
            }
            ParseOutcome::Retry(reason) => {
                warn!(?strategy, %reason, "JSON parse failed, trying next strategy");
                last_reason = reason;
            }
            ParseOutcome::Fatal(error) => return Err(error),
        }
    }

    Err(SheetSplitError::UnrecoverableJson(last_reason))
}

/// 読み込み結果
#[derive(Debug)]
pub(crate) struct LoadedInput {
    pub blobs: Vec<RawBlob>,
    pub strategy: ParseStrategy,
}

/// 入力ファイルを読み込み、エントリに復元する
pub(crate) fn load_input(
    path: &Path,
    mode: SplitMode,
    security: &SecurityConfig,
) -> Result<LoadedInput, SheetSplitError> {
    if !path.exists() {
        return Err(SheetSplitError::InputNotFound {
            path: path.display().to_string(),
        });
    }

    let size = fs::metadata(path)?.len();
    if size > security.max_input_file_size {
        return Err(SheetSplitError::SecurityViolation(format!(
            "Input file size exceeds maximum: {} bytes (max: {} bytes)",
            size, security.max_input_file_size
        )));
    }

    let raw = String::from_utf8(fs::read(path)?)?;
    let cleaned = clean_content(&raw);
    let (blobs, strategy) = parse_blobs(&cleaned, mode)?;

    info!(
        path = %path.display(),
        entries = blobs.len(),
        ?strategy,
        "loaded input"
    );
    Ok(LoadedInput { blobs, strategy })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_clean_content_strips_fences() {
        let raw = "  ```json\n{\"a\": \"1\"}\n```  \n";
        assert_eq!(clean_content(raw), "{\"a\": \"1\"}");
    }

    #[test]
    fn test_clean_content_removes_inner_fences() {
        let raw = "{\"a\": \"x```y\"}";
        assert_eq!(clean_content(raw), "{\"a\": \"xy\"}");
    }

    #[test]
    fn test_repair_missing_comma() {
        let (blobs, strategy) =
            parse_blobs("{\"a\": \"1\"\n\"b\": \"2\"}", SplitMode::PerEntry).unwrap();
        assert_eq!(strategy, ParseStrategy::CommaRepair);
        assert_eq!(
            blobs,
            vec![RawBlob::new("a", "1"), RawBlob::new("b", "2")]
        );
    }

    #[test]
    fn test_repair_several_gaps() {
        let text = "{\"a\": \"1\"  \"b\": \"2\"\t\"c\": \"3\"}";
        let (blobs, _) = parse_blobs(text, SplitMode::PerEntry).unwrap();
        let keys: Vec<&str> = blobs.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_repair_ignores_escaped_quote() {
        let text = r#"{"a": "say \" "}"#;
        assert_eq!(repair_missing_commas(text), text);
    }

    #[test]
    fn test_strict_preserves_key_order() {
        let (blobs, strategy) =
            parse_blobs(r#"{"z": "1", "a": "2", "m": "3"}"#, SplitMode::PerEntry).unwrap();
        assert_eq!(strategy, ParseStrategy::Strict);
        let keys: Vec<&str> = blobs.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_non_string_values_are_coerced() {
        let (blobs, _) =
            parse_blobs(r#"{"n": 12, "b": true, "z": null}"#, SplitMode::PerEntry).unwrap();
        assert_eq!(blobs[0].text, "12");
        assert_eq!(blobs[1].text, "true");
        assert_eq!(blobs[2].text, "");
    }

    #[test]
    fn test_per_entry_fails_on_garbage() {
        let result = parse_blobs("not json at all", SplitMode::PerEntry);
        assert!(matches!(result, Err(SheetSplitError::UnrecoverableJson(_))));
    }

    #[test]
    fn test_by_pdffile_degrades_to_opaque_blob() {
        let text = "pdffile\ttable\na.pdf\tBalance Sheet";
        let (blobs, strategy) = parse_blobs(text, SplitMode::ByPdfFile).unwrap();
        assert_eq!(strategy, ParseStrategy::OpaqueBlob);
        assert_eq!(blobs, vec![RawBlob::new(OPAQUE_BLOB_KEY, text)]);
    }

    #[test]
    fn test_array_is_fatal_in_both_modes() {
        for mode in [SplitMode::PerEntry, SplitMode::ByPdfFile] {
            match parse_blobs(r#"["a", "b"]"#, mode) {
                Err(SheetSplitError::UnexpectedJsonShape(kind)) => assert_eq!(kind, "an array"),
                other => panic!("Expected UnexpectedJsonShape, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_strategy_chain_order() {
        assert_eq!(
            ParseStrategy::chain(SplitMode::PerEntry),
            &[ParseStrategy::Strict, ParseStrategy::CommaRepair]
        );
        assert_eq!(
            ParseStrategy::chain(SplitMode::ByPdfFile).last(),
            Some(&ParseStrategy::OpaqueBlob)
        );
    }

    #[test]
    fn test_attempt_outcomes() {
        assert!(matches!(
            ParseStrategy::Strict.attempt("{\"a\": \"1\"\n\"b\": \"2\"}"),
            ParseOutcome::Retry(_)
        ));
        assert!(matches!(
            ParseStrategy::CommaRepair.attempt("{\"a\": \"1\"\n\"b\": \"2\"}"),
            ParseOutcome::Parsed(_)
        ));
        assert!(matches!(
            ParseStrategy::OpaqueBlob.attempt("anything"),
            ParseOutcome::Parsed(_)
        ));
    }

    #[test]
    fn test_load_input_not_found() {
        let result = load_input(
            Path::new("definitely/not/here.txt"),
            SplitMode::PerEntry,
            &SecurityConfig::default(),
        );
        assert!(matches!(result, Err(SheetSplitError::InputNotFound { .. })));
    }

    #[test]
    fn test_load_input_size_limit() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"a\": \"0123456789\"}}").unwrap();
        let security = SecurityConfig {
            max_input_file_size: 4,
        };
        let result = load_input(file.path(), SplitMode::PerEntry, &security);
        assert!(matches!(result, Err(SheetSplitError::SecurityViolation(_))));
    }

    #[test]
    fn test_load_input_invalid_utf8() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[b'{', 0xff, 0xfe, b'}']).unwrap();
        let result = load_input(file.path(), SplitMode::ByPdfFile, &SecurityConfig::default());
        assert!(matches!(result, Err(SheetSplitError::Utf8(_))));
    }

    #[test]
    fn test_load_input_fenced_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "```json\n{{\"k\": \"v\"}}\n```\n").unwrap();
        let loaded = load_input(file.path(), SplitMode::PerEntry, &SecurityConfig::default())
            .unwrap();
        assert_eq!(loaded.strategy, ParseStrategy::Strict);
        assert_eq!(loaded.blobs, vec![RawBlob::new("k", "v")]);
    }
}
