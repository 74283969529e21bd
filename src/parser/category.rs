//! 区分判定モジュール (EPI / 工具)

use regex::Regex;
use serde::Serialize;

/// 書類の区分
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    /// 個人用保護具 (EPI)
    ProtectiveEquipment,
    /// 工具・その他
    #[default]
    Tools,
}

impl Category {
    /// フォルダ名
    pub fn label(&self) -> &'static str {
        match self {
            Self::ProtectiveEquipment => "EPI",
            Self::Tools => "Ferramentas",
        }
    }
}

/// 保護具を示すキーワード
const PROTECTIVE_EQUIPMENT_PATTERNS: &[&str] = &[
    r"\bEPIS?\b",
    r"\bEQUIPAMENTOS?\s+DE\s+PROTE[ÇC][ÃA]O\b",
    r"\bCAPACETES?\b",
    r"\bLUVAS?\b",
    r"\b[ÓO]CULOS\s+DE\s+PROTE[ÇC][ÃA]O\b",
    r"\bPROTETOR(?:ES)?\s+AURICULAR(?:ES)?\b",
    r"\bCINTO\s+DE\s+SEGURAN[ÇC]A\b",
    r"\bBOTINAS?\b",
    r"\bM[ÁA]SCARAS?\b",
    r"\bRESPIRADOR(?:ES)?\b",
];

/// テキストから区分を判定（キーワードがなければ工具）
pub fn extract_category(text: &str) -> Category {
    for pattern in PROTECTIVE_EQUIPMENT_PATTERNS {
        if let Ok(re) = Regex::new(&format!("(?i){}", pattern)) {
            if re.is_match(text) {
                return Category::ProtectiveEquipment;
            }
        }
    }

    Category::Tools
}
