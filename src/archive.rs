//! アーカイブ作成モジュール - 分類ごとのフォルダ構成でZIPを書き出す

use crate::organize::Bucket;
use crate::pdf::image_to_pdf;
use image::ImageFormat;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// 出力名が空の場合のアーカイブ名
pub const DEFAULT_ARCHIVE_NAME: &str = "Processed_Files";

/// よく使うアーカイブ名
pub const ARCHIVE_NAME_PRESETS: &[&str] = &[
    "LOTE 01",
    "LOTE 03",
    "LOTE 05",
    "LOTE 08",
    "BOTA FORA",
    "GERAL",
    "GENEBRA",
];

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("アーカイブの書き込みに失敗: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIPエラー: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("元ファイルが見つかりません: {0}")]
    MissingSource(String),

    #[error("画像の読み込みに失敗 ({path}): {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("PDF変換に失敗 ({name}): {message}")]
    Pdf { name: String, message: String },
}

/// 分類済みファイルからZIPアーカイブを作成
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    convert_to_pdf: bool,
    discard_converted: bool,
}

impl ArchiveBuilder {
    pub fn new(convert_to_pdf: bool) -> Self {
        Self {
            convert_to_pdf,
            discard_converted: false,
        }
    }

    /// PDF化してアーカイブに入れた元画像を削除するか
    pub fn discard_converted(mut self, discard: bool) -> Self {
        self.discard_converted = discard;
        self
    }

    /// `staging_dir/{output_name}.zip` を書き出し、そのパスを返す
    ///
    /// `sources` はリネーム後のファイル名から元画像のパスへの対応。
    /// 途中で失敗した場合は書きかけのZIPを削除し、元画像には触れない。
    pub fn build(
        &self,
        buckets: &[Bucket],
        sources: &HashMap<String, PathBuf>,
        output_name: &str,
        staging_dir: &Path,
    ) -> Result<PathBuf, ArchiveError> {
        std::fs::create_dir_all(staging_dir)?;
        let archive_path = staging_dir.join(archive_file_name(output_name));

        if let Err(e) = self.write_to_path(&archive_path, buckets, sources) {
            if let Err(remove_err) = std::fs::remove_file(&archive_path) {
                warn!(path = %archive_path.display(), "書きかけのアーカイブを削除できません: {}", remove_err);
            }
            return Err(e);
        }
        info!(path = %archive_path.display(), "アーカイブを作成しました");

        // ZIPが確定してから元画像を削除する
        if self.convert_to_pdf && self.discard_converted {
            for source in archived_sources(buckets, sources) {
                if let Err(e) = std::fs::remove_file(source) {
                    warn!(file = %source.display(), "元画像を削除できません: {}", e);
                }
            }
        }

        Ok(archive_path)
    }

    fn write_to_path(
        &self,
        archive_path: &Path,
        buckets: &[Bucket],
        sources: &HashMap<String, PathBuf>,
    ) -> Result<(), ArchiveError> {
        let file = File::create(archive_path)?;
        let writer = self.write_archive(BufWriter::new(file), buckets, sources)?;
        writer
            .into_inner()
            .map_err(|e| ArchiveError::Io(e.into_error()))?
            .sync_all()?;
        Ok(())
    }

    /// 任意の書き込み先へZIPを書き出す (元画像は削除しない)
    pub fn write_archive<W: Write + Seek>(
        &self,
        writer: W,
        buckets: &[Bucket],
        sources: &HashMap<String, PathBuf>,
    ) -> Result<W, ArchiveError> {
        let mut zip = zip::ZipWriter::new(writer);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for bucket in buckets {
            for filename in &bucket.files {
                let source = sources
                    .get(filename)
                    .ok_or_else(|| ArchiveError::MissingSource(filename.clone()))?;

                let (entry_name, data) = if self.convert_to_pdf {
                    (pdf_file_name(filename), self.pdf_bytes(source, filename)?)
                } else {
                    (filename.clone(), png_bytes(source)?)
                };

                let entry_path = bucket.classification.entry_path(&entry_name);
                debug!(entry = %entry_path, "アーカイブに追加");
                zip.start_file(entry_path, options)?;
                zip.write_all(&data)?;
            }
        }

        Ok(zip.finish()?)
    }

    fn pdf_bytes(&self, source: &Path, filename: &str) -> Result<Vec<u8>, ArchiveError> {
        let image = open_image(source)?;
        let title = Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(filename);

        image_to_pdf(&image, title).map_err(|e| ArchiveError::Pdf {
            name: filename.to_string(),
            message: e.to_string(),
        })
    }
}

/// アーカイブに入った元画像のパス
fn archived_sources<'a>(
    buckets: &'a [Bucket],
    sources: &'a HashMap<String, PathBuf>,
) -> impl Iterator<Item = &'a PathBuf> + 'a {
    buckets
        .iter()
        .flat_map(|bucket| bucket.files.iter())
        .filter_map(|filename| sources.get(filename))
}

/// `{output_name}.zip` (空なら既定名)
pub fn archive_file_name(output_name: &str) -> String {
    let name = output_name.trim();
    let name = name.strip_suffix(".zip").unwrap_or(name);
    if name.is_empty() {
        format!("{}.zip", DEFAULT_ARCHIVE_NAME)
    } else {
        format!("{}.zip", name)
    }
}

/// 拡張子を .pdf に置き換える
fn pdf_file_name(filename: &str) -> String {
    Path::new(filename)
        .with_extension("pdf")
        .to_string_lossy()
        .into_owned()
}

fn open_image(source: &Path) -> Result<image::DynamicImage, ArchiveError> {
    image::open(source).map_err(|e| ArchiveError::Image {
        path: source.to_path_buf(),
        source: e,
    })
}

/// PNGはそのまま、それ以外はPNGに再エンコードする
fn png_bytes(source: &Path) -> Result<Vec<u8>, ArchiveError> {
    if ImageFormat::from_path(source).is_ok_and(|f| f == ImageFormat::Png) {
        return Ok(std::fs::read(source)?);
    }

    let image = open_image(source)?;
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| ArchiveError::Image {
            path: source.to_path_buf(),
            source: e,
        })?;
    Ok(buf.into_inner())
}
