//! Security Module
//!
//! 入力サイズの制限と、出力ファイル名のサニタイズを提供するモジュール。
//! 入力テキスト由来の識別子がパスとして解釈されないようにします。

/// 入力制限の設定
#[derive(Debug, Clone)]
pub(crate) struct SecurityConfig {
    /// 入力ファイルの最大サイズ（バイト）
    /// デフォルト: 256MB (268_435_456 bytes)
    pub max_input_file_size: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_input_file_size: 268_435_456, // 256MB
        }
    }
}

/// ファイル名として使用できない文字
const ILLEGAL_CHARS: [char; 9] = ['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// 識別子の末尾から拡張子を取り除く（大文字小文字を区別しない、繰り返し適用）
fn strip_suffixes<'a>(mut name: &'a str, suffixes: &[&str]) -> &'a str {
    loop {
        let before = name.len();
        for suffix in suffixes {
            if name.len() >= suffix.len() {
                let split = name.len() - suffix.len();
                if name.is_char_boundary(split) && name[split..].eq_ignore_ascii_case(suffix) {
                    name = name[..split].trim_end();
                }
            }
        }
        if name.len() == before {
            return name;
        }
    }
}

/// ファイル名に使用できない文字を`_`に置換
pub(crate) fn replace_illegal_chars(name: &str) -> String {
    name.chars()
        .map(|c| {
            if ILLEGAL_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// 出力ファイルのベース名（拡張子なし）を導出
///
/// 前後の空白を除去し、末尾の`suffixes`を取り除いてから、
/// ファイル名に使用できない文字を`_`に置換します。
///
/// # 戻り値
///
/// * `Some(String)` - ベース名
/// * `None` - 結果が空、または`.`/`..`になる場合
pub(crate) fn sanitize_base_name(raw: &str, suffixes: &[&str]) -> Option<String> {
    let stripped = strip_suffixes(raw.trim(), suffixes).trim();
    let sanitized = replace_illegal_chars(stripped);

    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        return None;
    }
    Some(sanitized)
}
