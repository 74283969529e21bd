//! 分類モジュール - リネーム後のファイルを年/区分/ロットごとにまとめる

use crate::config::ConfigError;
use crate::parser::{ExtractedFields, Lot};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// 分類方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClassificationScheme {
    /// 年
    Year,
    /// 年 → 区分
    YearCategory,
    /// ロット
    #[default]
    Lot,
}

impl FromStr for ClassificationScheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "year" => Ok(Self::Year),
            "year-category" | "year_category" => Ok(Self::YearCategory),
            "lot" => Ok(Self::Lot),
            other => Err(ConfigError::InvalidValue {
                key: "classification scheme",
                value: other.to_string(),
            }),
        }
    }
}

/// アーカイブ内のフォルダ階層
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Classification(Vec<String>);

impl Classification {
    pub fn new(components: Vec<String>) -> Self {
        Self(components)
    }

    pub fn components(&self) -> &[String] {
        &self.0
    }

    /// アーカイブのエントリパス (区切りは常に `/`)
    pub fn entry_path(&self, filename: &str) -> String {
        let mut parts: Vec<&str> = self.0.iter().map(String::as_str).collect();
        parts.push(filename);
        parts.join("/")
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

/// 1つの分類に属するファイル群
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub classification: Classification,
    pub files: Vec<String>,
}

/// ファイルを分類ごとに振り分ける
///
/// 年が必要な方式で年が取れなかったファイル、どのロットにも一致しなかった
/// ファイルは捨てずに予備フォルダへ入れる。
/// 分類もファイルも追加順を保つ。
#[derive(Debug)]
pub struct Organizer {
    scheme: ClassificationScheme,
    fallback_bucket: String,
    buckets: Vec<Bucket>,
    index: HashMap<Classification, usize>,
}

impl Organizer {
    pub fn new(scheme: ClassificationScheme, fallback_bucket: impl Into<String>) -> Self {
        let fallback_bucket = fallback_bucket.into();
        let fallback_bucket = if fallback_bucket.trim().is_empty() {
            Lot::DEFAULT.to_string()
        } else {
            fallback_bucket
        };

        Self {
            scheme,
            fallback_bucket,
            buckets: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// 抽出情報から分類を決定
    pub fn classify(&self, fields: &ExtractedFields) -> Classification {
        let components = match (self.scheme, fields.year) {
            (ClassificationScheme::Year, Some(year)) => vec![year.to_string()],
            (ClassificationScheme::YearCategory, Some(year)) => {
                vec![year.to_string(), fields.category.label().to_string()]
            }
            (ClassificationScheme::Lot, _) if fields.lot.as_str() == Lot::DEFAULT => {
                vec![self.fallback_bucket.clone()]
            }
            (ClassificationScheme::Lot, _) => fields.lot.components(),
            (_, None) => vec![self.fallback_bucket.clone()],
        };

        Classification::new(components)
    }

    /// ファイルを追加し、振り分け先を返す
    pub fn push(&mut self, filename: impl Into<String>, fields: &ExtractedFields) -> Classification {
        let classification = self.classify(fields);

        let slot = match self.index.get(&classification) {
            Some(&slot) => slot,
            None => {
                self.buckets.push(Bucket {
                    classification: classification.clone(),
                    files: Vec::new(),
                });
                self.index.insert(classification.clone(), self.buckets.len() - 1);
                self.buckets.len() - 1
            }
        };

        self.buckets[slot].files.push(filename.into());
        classification
    }

    pub fn into_buckets(self) -> Vec<Bucket> {
        self.buckets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Category;

    fn fields(year: Option<i32>, category: Category, lot: &str) -> ExtractedFields {
        ExtractedFields {
            name: None,
            year,
            category,
            lot: Lot::new(lot),
        }
    }

    #[test]
    fn groups_by_year_in_insertion_order() {
        let mut organizer = Organizer::new(ClassificationScheme::Year, "Gerais");
        organizer.push("B.png", &fields(Some(2022), Category::Tools, "Gerais"));
        organizer.push("A.png", &fields(Some(2021), Category::Tools, "Gerais"));
        organizer.push("C.png", &fields(Some(2022), Category::Tools, "Gerais"));

        let buckets = organizer.into_buckets();
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].classification.to_string(), "2022");
        assert_eq!(buckets[0].files, vec!["B.png", "C.png"]);
        assert_eq!(buckets[1].classification.to_string(), "2021");
        assert_eq!(buckets[1].files, vec!["A.png"]);
    }

    #[test]
    fn year_category_nests_category_under_year() {
        let mut organizer = Organizer::new(ClassificationScheme::YearCategory, "Gerais");
        let class = organizer.push("A.png", &fields(Some(2021), Category::ProtectiveEquipment, "Gerais"));
        assert_eq!(class.components(), ["2021".to_string(), "EPI".to_string()]);
        assert_eq!(class.entry_path("A.png"), "2021/EPI/A.png");

        let class = organizer.push("B.png", &fields(Some(2021), Category::Tools, "Gerais"));
        assert_eq!(class.entry_path("B.png"), "2021/Ferramentas/B.png");
        assert_eq!(organizer.into_buckets().len(), 2);
    }

    #[test]
    fn missing_year_goes_to_fallback_bucket() {
        let mut organizer = Organizer::new(ClassificationScheme::Year, "Gerais");
        let class = organizer.push("X.png", &fields(None, Category::Tools, "Lote 01"));
        assert_eq!(class.entry_path("X.png"), "Gerais/X.png");

        let mut organizer = Organizer::new(ClassificationScheme::YearCategory, "Sem Data");
        let class = organizer.push("X.png", &fields(None, Category::ProtectiveEquipment, "Gerais"));
        assert_eq!(class.entry_path("X.png"), "Sem Data/X.png");
    }

    #[test]
    fn empty_fallback_uses_default_label() {
        let organizer = Organizer::new(ClassificationScheme::Year, "  ");
        let class = organizer.classify(&fields(None, Category::Tools, "Gerais"));
        assert_eq!(class.to_string(), "Gerais");
    }

    #[test]
    fn lot_scheme_ignores_year_and_nests_sub_lots() {
        let mut organizer = Organizer::new(ClassificationScheme::Lot, "Gerais");
        let class = organizer.push("A.png", &fields(None, Category::Tools, "Grama/Grama 02"));
        assert_eq!(class.entry_path("A.png"), "Grama/Grama 02/A.png");

        let class = organizer.push("B.png", &fields(Some(2020), Category::Tools, "Gerais"));
        assert_eq!(class.entry_path("B.png"), "Gerais/B.png");
    }

    #[test]
    fn unmatched_lot_uses_configured_fallback() {
        let organizer = Organizer::new(ClassificationScheme::Lot, "Outros");
        let class = organizer.classify(&fields(Some(2020), Category::Tools, "Gerais"));
        assert_eq!(class.entry_path("B.png"), "Outros/B.png");

        let class = organizer.classify(&fields(None, Category::Tools, "Bota Fora"));
        assert_eq!(class.to_string(), "Bota Fora");
    }

    #[test]
    fn every_file_lands_in_exactly_one_bucket() {
        let mut organizer = Organizer::new(ClassificationScheme::Year, "Gerais");
        let inputs = [
            ("A.png", Some(2021)),
            ("B.png", None),
            ("C.png", Some(2021)),
            ("D.png", Some(2019)),
        ];
        for (name, year) in inputs {
            organizer.push(name, &fields(year, Category::Tools, "Gerais"));
        }

        let mut all: Vec<String> = organizer
            .into_buckets()
            .into_iter()
            .flat_map(|b| b.files)
            .collect();
        all.sort();
        assert_eq!(all, vec!["A.png", "B.png", "C.png", "D.png"]);
    }

    #[test]
    fn scheme_from_str() {
        assert_eq!("year".parse::<ClassificationScheme>().ok(), Some(ClassificationScheme::Year));
        assert_eq!(
            "year-category".parse::<ClassificationScheme>().ok(),
            Some(ClassificationScheme::YearCategory)
        );
        assert_eq!("LOT".parse::<ClassificationScheme>().ok(), Some(ClassificationScheme::Lot));
        assert!("month".parse::<ClassificationScheme>().is_err());
    }
}
