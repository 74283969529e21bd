//! 日付抽出モジュール

use chrono::{Datelike, NaiveDate};
use regex::Regex;

/// テキストから最初の日付 (DD/MM/YYYY) を探し、その年を返す
///
/// 日付として不正なもの (31/02/2021 など) は `None`。
/// 2番目以降の日付は参照しない。
pub fn extract_year(text: &str) -> Option<i32> {
    let re = Regex::new(r"\b\d{2}/\d{2}/\d{4}\b").ok()?;
    let m = re.find(text)?;

    NaiveDate::parse_from_str(m.as_str(), "%d/%m/%Y")
        .ok()
        .map(|date| date.year())
}
