//! Tesseract コマンドによるOCR

use super::{TextExtractor, encode_png};
use anyhow::{Context, Result};
use image::DynamicImage;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// `tesseract stdin stdout -l <lang>` を実行するOCR
#[derive(Debug, Clone)]
pub struct TesseractCli {
    program: PathBuf,
    language: String,
}

impl TesseractCli {
    pub fn new(program: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            language: language.into(),
        }
    }

    /// PNG画像を標準入力で渡し、認識結果を受け取る
    async fn recognize_png(&self, png: &[u8]) -> Result<String> {
        let mut command = Command::new(&self.program);
        command
            .args(["stdin", "stdout", "-l", &self.language])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(windows)]
        command.creation_flags(0x08000000); // CREATE_NO_WINDOW

        let mut child = command
            .spawn()
            .with_context(|| format!("tesseractの実行に失敗: {:?}", self.program))?;

        let mut stdin = child.stdin.take().context("tesseractの標準入力を開けません")?;
        stdin.write_all(png).await.context("tesseractへの画像送信に失敗")?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .context("tesseractの終了待ちに失敗")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("tesseract エラー: {}", stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl TextExtractor for TesseractCli {
    async fn extract_text(&self, image: &DynamicImage) -> Result<String> {
        let png = encode_png(image)?;
        self.recognize_png(&png).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[tokio::test]
    async fn missing_binary_is_an_error() {
        let engine = TesseractCli::new("/nonexistent/bin/tesseract", "por");
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([255, 255, 255])));

        let err = engine.extract_text(&image).await.unwrap_err();
        assert!(err.to_string().contains("tesseract"));
    }
}
