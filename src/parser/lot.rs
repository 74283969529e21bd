//! ロット判定モジュール

use regex::Regex;
use serde::Serialize;
use std::fmt;

/// 固定ロット (表示名, パターン) - 先に一致したものを採用
const FIXED_LOTS: &[(&str, &[&str])] = &[
    ("Lote 01", &[r"\bLOTE\s*0*1\b"]),
    ("Bota Fora", &[r"\bBOTA\s*FORA\b"]),
    ("Jardim Genebra", &[r"\bJARDIM\s*GENEBRA\b", r"\bGENEBRA\b"]),
];

/// Grama のサブロット番号
const GRAMA_SUB_LOTS: std::ops::RangeInclusive<u32> = 2..=5;

/// ロット名 (`Grama/Grama 02` のように1階層のサブロットを含むことがある)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Lot(String);

impl Lot {
    /// どのロットにも一致しない場合のロット名
    pub const DEFAULT: &'static str = "Gerais";

    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// フォルダ階層
    pub fn components(&self) -> Vec<String> {
        self.0
            .split('/')
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Default for Lot {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

impl fmt::Display for Lot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// テキストからロットを判定
pub fn identify_lot(text: &str) -> Lot {
    let text_upper = text.to_uppercase();
    let matches = |pattern: &str| Regex::new(pattern).is_ok_and(|re| re.is_match(&text_upper));

    for (display_name, patterns) in FIXED_LOTS {
        if patterns.iter().any(|&p| matches(p)) {
            return Lot::new(*display_name);
        }
    }

    if matches(r"\bGRAMA\b") {
        for n in GRAMA_SUB_LOTS {
            if matches(&format!(r"\bGRAMA\s*0*{n}\b")) || matches(&format!(r"\bLOTE\s*0*{n}\b")) {
                return Lot::new(format!("Grama/Grama {n:02}"));
            }
        }
        return Lot::new("Grama");
    }

    Lot::default()
}
