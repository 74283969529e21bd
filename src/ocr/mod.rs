//! OCRモジュール - 画像からのテキスト抽出

mod tesseract;

pub use tesseract::TesseractCli;

use crate::vision::VisionClient;
use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat};
use std::future::Future;
use std::io::Cursor;

/// 画像からテキストを抽出するもの
///
/// 認識結果が空でもエラーにはしない。
pub trait TextExtractor {
    fn extract_text(&self, image: &DynamicImage) -> impl Future<Output = Result<String>>;
}

/// 設定で選ばれたOCRエンジン
pub enum OcrEngine {
    Tesseract(TesseractCli),
    Vision(VisionClient),
}

impl TextExtractor for OcrEngine {
    async fn extract_text(&self, image: &DynamicImage) -> Result<String> {
        match self {
            Self::Tesseract(engine) => engine.extract_text(image).await,
            Self::Vision(engine) => engine.extract_text(image).await,
        }
    }
}

/// 画像をPNGにエンコード
pub(crate) fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .context("PNGへのエンコードに失敗")?;
    Ok(buf.into_inner())
}
