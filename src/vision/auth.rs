//! Google Cloud 認証処理

use anyhow::{Context, Result};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const VISION_SCOPE: &str = "https://www.googleapis.com/auth/cloud-vision";

/// JWTとトークンの有効期間 (秒)
const TOKEN_LIFETIME_SECS: u64 = 3600;

/// サービスアカウントの認証情報
#[derive(Debug, Deserialize)]
pub struct ServiceAccountCredentials {
    pub client_email: String,
    pub private_key: String,
    pub token_uri: String,
}

impl ServiceAccountCredentials {
    /// JSONファイルから認証情報を読み込む
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("認証ファイルの読み込みに失敗: {:?}", path))?;
        serde_json::from_str(&json).context("認証情報のパースに失敗")
    }
}

/// JWTクレーム
#[derive(Debug, Serialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    exp: u64,
    iat: u64,
}

/// アクセストークンレスポンス
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    TOKEN_LIFETIME_SECS
}

/// アクセストークンと有効期間
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_in: Duration,
}

/// アクセストークンを取得
pub async fn get_access_token(
    http_client: &reqwest::Client,
    credentials: &ServiceAccountCredentials,
) -> Result<AccessToken> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("システム時刻が不正です")?
        .as_secs();

    let claims = Claims {
        iss: credentials.client_email.clone(),
        scope: VISION_SCOPE.to_string(),
        aud: credentials.token_uri.clone(),
        exp: now + TOKEN_LIFETIME_SECS,
        iat: now,
    };

    // RSA秘密鍵でJWTを署名
    let key = EncodingKey::from_rsa_pem(credentials.private_key.as_bytes())
        .context("RSA秘密鍵のパースに失敗")?;
    let jwt = encode(&Header::new(Algorithm::RS256), &claims, &key).context("JWTの生成に失敗")?;

    let response = http_client
        .post(&credentials.token_uri)
        .form(&[
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", &jwt),
        ])
        .send()
        .await
        .context("トークンリクエストに失敗")?;

    if !response.status().is_success() {
        let error_text = response.text().await.unwrap_or_default();
        anyhow::bail!("トークン取得エラー: {}", error_text);
    }

    let token_response: TokenResponse = response
        .json()
        .await
        .context("トークンレスポンスのパースに失敗")?;

    Ok(AccessToken {
        token: token_response.access_token,
        expires_in: Duration::from_secs(token_response.expires_in),
    })
}
