//! Vision API クライアント

use super::auth::{ServiceAccountCredentials, get_access_token};
use crate::ocr::{TextExtractor, encode_png};
use anyhow::{Context, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const VISION_API_URL: &str = "https://vision.googleapis.com/v1/images:annotate";

/// 期限切れの少し前に更新する
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// キャッシュしたアクセストークン
#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn new(value: String, expires_in: Duration, now: Instant) -> Self {
        Self {
            value,
            expires_at: now + expires_in,
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        now + TOKEN_REFRESH_MARGIN < self.expires_at
    }
}

/// Vision APIクライアント
pub struct VisionClient {
    credentials: ServiceAccountCredentials,
    access_token: RwLock<Option<CachedToken>>,
    http_client: reqwest::Client,
    language_hints: Vec<String>,
}

impl VisionClient {
    /// 認証ファイルからクライアントを作成
    pub fn from_credentials_file(path: impl AsRef<Path>) -> Result<Self> {
        let credentials = ServiceAccountCredentials::from_file(path)?;
        Ok(Self::new(credentials))
    }

    pub fn new(credentials: ServiceAccountCredentials) -> Self {
        Self {
            credentials,
            access_token: RwLock::new(None),
            http_client: reqwest::Client::new(),
            language_hints: vec!["pt".to_string()],
        }
    }

    /// アクセストークンを取得（期限内ならキャッシュを使う）
    async fn get_token(&self) -> Result<String> {
        if let Some(ref cached) = *self.access_token.read().await {
            if cached.is_fresh(Instant::now()) {
                return Ok(cached.value.clone());
            }
        }

        let requested_at = Instant::now();
        let new_token = get_access_token(&self.http_client, &self.credentials).await?;
        let cached = CachedToken::new(new_token.token, new_token.expires_in, requested_at);
        let value = cached.value.clone();
        *self.access_token.write().await = Some(cached);

        Ok(value)
    }

    /// 画像からテキストを抽出
    async fn annotate(&self, image: &DynamicImage) -> Result<String> {
        let png = encode_png(image)?;
        let request = build_request(&png, &self.language_hints);

        let token = self.get_token().await?;

        let response = self
            .http_client
            .post(VISION_API_URL)
            .bearer_auth(&token)
            .json(&request)
            .send()
            .await
            .context("Vision APIリクエストに失敗")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Vision API エラー: {}", error_text);
        }

        let vision_response: VisionResponse = response
            .json()
            .await
            .context("Vision APIレスポンスのパースに失敗")?;

        Ok(vision_response.into_text())
    }
}

impl TextExtractor for VisionClient {
    async fn extract_text(&self, image: &DynamicImage) -> Result<String> {
        self.annotate(image).await
    }
}

fn build_request(png: &[u8], language_hints: &[String]) -> VisionRequest {
    VisionRequest {
        requests: vec![AnnotateImageRequest {
            image: Image {
                content: STANDARD.encode(png),
            },
            features: vec![Feature {
                feature_type: "DOCUMENT_TEXT_DETECTION".to_string(),
                max_results: 1,
            }],
            image_context: Some(ImageContext {
                language_hints: language_hints.to_vec(),
            }),
        }],
    }
}

// Vision API リクエスト/レスポンス構造体

#[derive(Serialize)]
struct VisionRequest {
    requests: Vec<AnnotateImageRequest>,
}

#[derive(Serialize)]
struct AnnotateImageRequest {
    image: Image,
    features: Vec<Feature>,
    #[serde(rename = "imageContext", skip_serializing_if = "Option::is_none")]
    image_context: Option<ImageContext>,
}

#[derive(Serialize)]
struct Image {
    content: String,
}

#[derive(Serialize)]
struct Feature {
    #[serde(rename = "type")]
    feature_type: String,
    #[serde(rename = "maxResults")]
    max_results: i32,
}

#[derive(Serialize)]
struct ImageContext {
    #[serde(rename = "languageHints")]
    language_hints: Vec<String>,
}

#[derive(Deserialize)]
struct VisionResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

impl VisionResponse {
    /// 最初のレスポンスの全文（なければ空文字列）
    fn into_text(self) -> String {
        self.responses
            .into_iter()
            .next()
            .and_then(|r| r.full_text_annotation)
            .map(|a| a.text)
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct AnnotateImageResponse {
    #[serde(rename = "fullTextAnnotation")]
    full_text_annotation: Option<TextAnnotation>,
}

#[derive(Deserialize)]
struct TextAnnotation {
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_portuguese_hint() {
        let request = build_request(b"png", &["pt".to_string()]);
        let json = serde_json::to_value(&request).unwrap();

        let first = &json["requests"][0];
        assert_eq!(first["image"]["content"], STANDARD.encode(b"png"));
        assert_eq!(first["features"][0]["type"], "DOCUMENT_TEXT_DETECTION");
        assert_eq!(first["imageContext"]["languageHints"][0], "pt");
    }

    #[test]
    fn cached_token_expires_before_its_deadline() {
        let now = Instant::now();
        let token = CachedToken::new("ya29.abc".to_string(), Duration::from_secs(3600), now);

        assert!(token.is_fresh(now));
        assert!(token.is_fresh(now + Duration::from_secs(3500)));
        assert!(!token.is_fresh(now + Duration::from_secs(3550)));
        assert!(!token.is_fresh(now + Duration::from_secs(7200)));
    }

    #[test]
    fn response_text_is_extracted() {
        let response: VisionResponse = serde_json::from_str(
            r#"{"responses":[{"fullTextAnnotation":{"text":"JOAO DA SILVA\n15/08/2021"}}]}"#,
        )
        .unwrap();
        assert_eq!(response.into_text(), "JOAO DA SILVA\n15/08/2021");
    }

    #[test]
    fn empty_response_is_empty_text() {
        let response: VisionResponse = serde_json::from_str(r#"{"responses":[{}]}"#).unwrap();
        assert_eq!(response.into_text(), "");

        let response: VisionResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.into_text(), "");
    }
}
