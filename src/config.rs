//! 設定 - 環境変数 (.env) から読み込み、CLI引数で上書きする

use crate::ocr::{OcrEngine, TesseractCli};
use crate::organize::ClassificationScheme;
use crate::parser::{Lot, NameStrategy, ParserOptions, sanitize_for_filename};
use crate::pipeline::PipelineOptions;
use crate::vision::VisionClient;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// 名前が抽出できなかった場合のファイル名
pub const DEFAULT_PLACEHOLDER: &str = "Documento";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} の値が不正です: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Vision API には GOOGLE_APPLICATION_CREDENTIALS の設定が必要です")]
    MissingCredentials,
}

/// OCRエンジンの種類
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EngineKind {
    #[default]
    Tesseract,
    Vision,
}

impl FromStr for EngineKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tesseract" => Ok(Self::Tesseract),
            "vision" | "google-vision" => Ok(Self::Vision),
            other => Err(ConfigError::InvalidValue {
                key: "OCR engine",
                value: other.to_string(),
            }),
        }
    }
}

/// 実行設定
#[derive(Debug, Clone)]
pub struct Settings {
    pub engine: EngineKind,
    /// tesseract 実行ファイル
    pub tesseract_path: PathBuf,
    /// tesseract の言語 (por)
    pub language: String,
    pub scheme: ClassificationScheme,
    pub name_strategy: NameStrategy,
    pub placeholder: String,
    /// 年が取れなかったファイルの分類先
    pub fallback_bucket: String,
    /// アーカイブの出力先
    pub output_dir: PathBuf,
    /// サービスアカウントJSON (Vision API)
    pub credentials_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            tesseract_path: PathBuf::from("tesseract"),
            language: "por".to_string(),
            scheme: ClassificationScheme::default(),
            name_strategy: NameStrategy::default(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            fallback_bucket: Lot::DEFAULT.to_string(),
            output_dir: PathBuf::from("."),
            credentials_path: None,
        }
    }
}

impl Settings {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// キーから値を引く関数で設定を組み立てる
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        // ファイル名・フォルダ名になる値
        let file_value = |key: &str| {
            value(key)
                .map(|v| sanitize_for_filename(&v))
                .filter(|v| !v.is_empty())
        };

        Ok(Self {
            engine: value("OCR_RENAMER_ENGINE")
                .map(|v| v.parse::<EngineKind>())
                .transpose()?
                .unwrap_or(defaults.engine),
            tesseract_path: value("TESSERACT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.tesseract_path),
            language: value("OCR_RENAMER_LANG").unwrap_or(defaults.language),
            scheme: value("OCR_RENAMER_SCHEME")
                .map(|v| v.parse::<ClassificationScheme>())
                .transpose()?
                .unwrap_or(defaults.scheme),
            name_strategy: value("OCR_RENAMER_NAME_STRATEGY")
                .map(|v| v.parse::<NameStrategy>())
                .transpose()?
                .unwrap_or(defaults.name_strategy),
            placeholder: file_value("OCR_RENAMER_PLACEHOLDER").unwrap_or(defaults.placeholder),
            fallback_bucket: file_value("OCR_RENAMER_FALLBACK_BUCKET")
                .unwrap_or(defaults.fallback_bucket),
            output_dir: value("OCR_RENAMER_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            credentials_path: value("GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from),
        })
    }

    /// パイプライン用のオプション
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            parser: ParserOptions {
                name_strategy: self.name_strategy,
            },
            placeholder: self.placeholder.clone(),
            scheme: self.scheme,
            fallback_bucket: self.fallback_bucket.clone(),
        }
    }

    /// 設定に従ってOCRエンジンを作成
    pub fn build_engine(&self) -> Result<OcrEngine> {
        match self.engine {
            EngineKind::Tesseract => Ok(OcrEngine::Tesseract(TesseractCli::new(
                &self.tesseract_path,
                &self.language,
            ))),
            EngineKind::Vision => {
                let path = self
                    .credentials_path
                    .as_ref()
                    .ok_or(ConfigError::MissingCredentials)?;
                let client = VisionClient::from_credentials_file(path)
                    .context("Vision APIクライアントの初期化に失敗")?;
                Ok(OcrEngine::Vision(client))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(settings.engine, EngineKind::Tesseract);
        assert_eq!(settings.language, "por");
        assert_eq!(settings.scheme, ClassificationScheme::Lot);
        assert_eq!(settings.name_strategy, NameStrategy::WithFallback);
        assert_eq!(settings.placeholder, "Documento");
        assert_eq!(settings.fallback_bucket, "Gerais");
        assert_eq!(settings.credentials_path, None);
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = settings_from(&[
            ("OCR_RENAMER_ENGINE", "vision"),
            ("OCR_RENAMER_SCHEME", "year-category"),
            ("OCR_RENAMER_NAME_STRATEGY", "strict"),
            ("OCR_RENAMER_PLACEHOLDER", "Sem Nome"),
            ("OCR_RENAMER_OUTPUT_DIR", "/tmp/saida"),
            ("GOOGLE_APPLICATION_CREDENTIALS", "/etc/sa.json"),
        ])
        .unwrap();

        assert_eq!(settings.engine, EngineKind::Vision);
        assert_eq!(settings.scheme, ClassificationScheme::YearCategory);
        assert_eq!(settings.name_strategy, NameStrategy::Strict);
        assert_eq!(settings.placeholder, "Sem Nome");
        assert_eq!(settings.output_dir, PathBuf::from("/tmp/saida"));
        assert_eq!(settings.credentials_path, Some(PathBuf::from("/etc/sa.json")));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let settings = settings_from(&[("OCR_RENAMER_PLACEHOLDER", "  ")]).unwrap();
        assert_eq!(settings.placeholder, "Documento");
    }

    #[test]
    fn file_name_values_are_sanitized() {
        let settings = settings_from(&[
            ("OCR_RENAMER_PLACEHOLDER", "Doc/X"),
            ("OCR_RENAMER_FALLBACK_BUCKET", "Sem:Data"),
        ])
        .unwrap();
        assert_eq!(settings.placeholder, "Doc_X");
        assert_eq!(settings.fallback_bucket, "Sem_Data");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = settings_from(&[("OCR_RENAMER_ENGINE", "easyocr")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn vision_requires_credentials() {
        let settings = Settings {
            engine: EngineKind::Vision,
            ..Settings::default()
        };
        assert!(settings.build_engine().is_err());
    }

    #[test]
    fn pipeline_options_follow_settings() {
        let settings = Settings {
            name_strategy: NameStrategy::Strict,
            placeholder: "Doc".to_string(),
            ..Settings::default()
        };
        let options = settings.pipeline_options();
        assert_eq!(options.parser.name_strategy, NameStrategy::Strict);
        assert_eq!(options.placeholder, "Doc");
    }
}
