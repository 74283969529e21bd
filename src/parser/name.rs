//! 人名抽出モジュール

use super::sanitize_for_filename;
use crate::config::ConfigError;
use regex::Regex;
use std::str::FromStr;

/// 人名ではないキーワード (ロット名など)
const NON_NAME_KEYWORDS: &[&str] = &["LOTE", "BOTA", "FORA", "JARDIM", "GENEBRA", "GRAMA"];

/// 人名抽出の戦略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NameStrategy {
    /// 大文字で始まる2語以上の並びのみ
    Strict,
    /// 見つからなければ3文字以上の大文字単語1語にフォールバック
    #[default]
    WithFallback,
}

impl FromStr for NameStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "fallback" | "with-fallback" => Ok(Self::WithFallback),
            other => Err(ConfigError::InvalidValue {
                key: "name strategy",
                value: other.to_string(),
            }),
        }
    }
}

/// テキストから人名を抽出
/// 優先順位: 同一行の複数語 > 改行をまたぐ複数語 > 単一語 (フォールバック時のみ)
pub fn extract_name(text: &str, strategy: NameStrategy) -> Option<String> {
    let patterns = [
        // JOAO DA SILVA / Maria Souza
        r"\b\p{Lu}\p{L}*(?:[ \t]+\p{Lu}\p{L}*)+\b",
        // JOAO\nSILVA
        r"\b\p{Lu}\p{L}*(?:\s+\p{Lu}\p{L}*)+\b",
    ];

    for pattern in patterns {
        if let Ok(re) = Regex::new(pattern) {
            if let Some(m) = re.find(text) {
                let name = sanitize_for_filename(m.as_str());
                if !name.is_empty() {
                    return Some(name);
                }
            }
        }
    }

    if strategy == NameStrategy::Strict {
        return None;
    }

    extract_single_word(text)
}

/// 単一の大文字単語を抽出（キーワードは除外）
fn extract_single_word(text: &str) -> Option<String> {
    let re = Regex::new(r"\b\p{Lu}\p{L}{2,}\b").ok()?;

    re.find_iter(text)
        .map(|m| m.as_str())
        .find(|word| !is_non_name_keyword(word))
        .map(sanitize_for_filename)
        .filter(|name| !name.is_empty())
}

fn is_non_name_keyword(word: &str) -> bool {
    let upper = word.to_uppercase();
    NON_NAME_KEYWORDS.contains(&upper.as_str())
}
