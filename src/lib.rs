//! OCRリネーマー - スキャン書類をOCRで読み取り、名前を付けて分類・ZIP化するツール
//!
//! # 機能
//! - Tesseract または Google Vision API でテキスト抽出 (ポルトガル語)
//! - 人名・日付(年)・区分・ロットの抽出
//! - 重複しないファイル名の割り当て
//! - 年/区分/ロットごとのフォルダ構成でZIP化 (PDF変換も可)

pub mod archive;
pub mod cli;
pub mod config;
pub mod naming;
pub mod ocr;
pub mod organize;
pub mod parser;
pub mod pdf;
pub mod pipeline;
pub mod vision;

pub use parser::ExtractedFields;
pub use pipeline::{Pipeline, RunReport};
