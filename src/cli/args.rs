//! コマンドライン引数

use crate::config::{EngineKind, Settings};
use crate::organize::ClassificationScheme;
use crate::parser::NameStrategy;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ocr_renamer")]
#[command(about = "Rename scanned documents by OCR and pack them into a classified ZIP")]
#[command(version)]
pub struct Args {
    /// Image files or folders (png, jpg, jpeg)
    #[arg(required_unless_present = "list_presets")]
    pub inputs: Vec<PathBuf>,

    /// Convert each image to a single-page PDF
    #[arg(long)]
    pub convert: bool,

    /// Archive name (without .zip)
    #[arg(short, long, env = "OCR_RENAMER_OUTPUT_NAME")]
    pub output_name: Option<String>,

    /// Folder where the archive is written
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Folder layout: year, year-category or lot
    #[arg(long)]
    pub scheme: Option<ClassificationScheme>,

    /// OCR engine: tesseract or vision
    #[arg(long)]
    pub engine: Option<EngineKind>,

    /// Name extraction: strict or fallback
    #[arg(long)]
    pub name_strategy: Option<NameStrategy>,

    /// Also rename the input files on disk
    #[arg(long)]
    pub rename_in_place: bool,

    /// Delete source images once their PDF is archived (with --convert)
    #[arg(long, requires = "convert")]
    pub discard_converted: bool,

    /// Write a JSON report of every file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Open the output folder when done
    #[arg(long)]
    pub open: bool,

    /// Print the usual archive names and exit
    #[arg(long)]
    pub list_presets: bool,
}

impl Args {
    /// 引数で指定された項目で設定を上書き
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(scheme) = self.scheme {
            settings.scheme = scheme;
        }
        if let Some(engine) = self.engine {
            settings.engine = engine;
        }
        if let Some(strategy) = self.name_strategy {
            settings.name_strategy = strategy;
        }
        if let Some(ref dir) = self.output_dir {
            settings.output_dir = dir.clone();
        }
    }
}
