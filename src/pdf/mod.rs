//! PDF処理モジュール - 画像から1ページのPDFへの変換

use anyhow::{Context, Result, anyhow};
use image::{DynamicImage, GenericImageView};
use printpdf::{ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfDocument, Pt, Px};
use std::io::BufWriter;

/// 横長ページの幅 (pt)
pub const LANDSCAPE_WIDTH_PT: f32 = 792.0;
/// 縦長ページの高さ (pt)
pub const PORTRAIT_HEIGHT_PT: f32 = 612.0;

/// 画像サイズからページサイズ (幅, 高さ) を pt で求める
///
/// 幅 >= 高さなら幅 792pt、そうでなければ高さ 612pt に合わせ、縦横比を保つ。
pub fn page_size(width_px: u32, height_px: u32) -> (f32, f32) {
    let aspect = width_px as f32 / height_px as f32;

    if width_px >= height_px {
        (LANDSCAPE_WIDTH_PT, LANDSCAPE_WIDTH_PT / aspect)
    } else {
        (PORTRAIT_HEIGHT_PT * aspect, PORTRAIT_HEIGHT_PT)
    }
}

/// 画像を1ページのPDFに変換し、PDFのバイト列を返す
pub fn image_to_pdf(image: &DynamicImage, title: &str) -> Result<Vec<u8>> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        anyhow::bail!("サイズが0の画像はPDFに変換できません");
    }

    let (page_width, page_height) = page_size(width, height);
    let (doc, page, layer) = PdfDocument::new(
        title,
        Mm::from(Pt(page_width)),
        Mm::from(Pt(page_height)),
        "Layer 1",
    );
    let layer = doc.get_page(page).get_layer(layer);

    let rgb = image.to_rgb8();
    let xobject = ImageXObject {
        width: Px(width as usize),
        height: Px(height as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: rgb.into_raw(),
        image_filter: None,
        smask: None,
        clipping_bbox: None,
    };

    // 表示サイズ(pt) = px * 72 / dpi なので、ページ幅に一致する dpi を使う
    let dpi = width as f32 * 72.0 / page_width;
    Image::from(xobject).add_to_layer(
        layer,
        ImageTransform {
            translate_x: Some(Mm(0.0)),
            translate_y: Some(Mm(0.0)),
            dpi: Some(dpi),
            ..Default::default()
        },
    );

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf).context("PDFの保存に失敗")?;
    buf.into_inner()
        .map_err(|e| anyhow!("PDFバッファの取得に失敗: {}", e))
}
