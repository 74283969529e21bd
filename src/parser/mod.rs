//! テキスト解析モジュール - スキャン書類情報の抽出

mod category;
mod lot;
mod name;
mod year;

pub use category::{Category, extract_category};
pub use lot::{Lot, identify_lot};
pub use name::{NameStrategy, extract_name};
pub use year::extract_year;

use serde::Serialize;

/// 解析オプション
#[derive(Debug, Clone, Copy, Default)]
pub struct ParserOptions {
    /// 人名抽出の戦略
    pub name_strategy: NameStrategy,
}

/// 書類から抽出された情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedFields {
    /// 人名 (最大30文字、ファイル名として安全)
    pub name: Option<String>,
    /// 日付 (DD/MM/YYYY) の年
    pub year: Option<i32>,
    /// 区分 (EPI / 工具)
    pub category: Category,
    /// ロット
    pub lot: Lot,
}

impl ExtractedFields {
    /// テキストから書類情報を解析
    ///
    /// 一致しない項目は `None` または既定値になるだけで、失敗はしない。
    pub fn parse(text: &str, options: &ParserOptions) -> Self {
        Self {
            name: extract_name(text, options.name_strategy),
            year: extract_year(text),
            category: extract_category(text),
            lot: identify_lot(text),
        }
    }

    /// 人名、なければプレースホルダーを返す
    pub fn name_or<'a>(&'a self, placeholder: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(placeholder)
    }
}

/// 人名の最大文字数
const MAX_NAME_CHARS: usize = 30;

/// ファイル名に使用できない文字を置換
pub fn sanitize_for_filename(text: &str) -> String {
    let invalid_chars = ['\\', '/', ':', '*', '?', '"', '<', '>', '|', '\r', '\n'];

    let result: String = text
        .chars()
        .take(MAX_NAME_CHARS)
        .map(|c| if invalid_chars.contains(&c) { '_' } else { c })
        .collect();

    result.trim().to_string()
}
