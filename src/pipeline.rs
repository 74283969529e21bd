//! 処理パイプライン - OCR → 解析 → 命名 → 分類 を1ファイルずつ順番に行う

use crate::naming::{NameCounter, unique_path_in};
use crate::ocr::TextExtractor;
use crate::organize::{Bucket, ClassificationScheme, Organizer};
use crate::parser::{ExtractedFields, ParserOptions};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// 対応する画像の拡張子
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// パイプラインのオプション
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub parser: ParserOptions,
    /// 名前が取れなかった場合のファイル名
    pub placeholder: String,
    pub scheme: ClassificationScheme,
    pub fallback_bucket: String,
}

/// 進捗
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
    pub message: String,
}

impl Progress {
    /// 0.0 - 1.0
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.done as f32 / self.total as f32
        }
    }
}

/// 1ファイルの処理結果
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub original: String,
    pub source: PathBuf,
    pub new_name: Option<String>,
    pub classification: Option<String>,
    pub fields: Option<ExtractedFields>,
    pub error: Option<String>,
    /// 元ファイルをリネームした場合のパス
    pub renamed_path: Option<PathBuf>,
    /// 元ファイルのリネームに失敗した理由 (分類とアーカイブには影響しない)
    pub rename_error: Option<String>,
}

impl FileOutcome {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }

    fn failed(source: &Path, error: String) -> Self {
        Self {
            original: display_name(source),
            source: source.to_path_buf(),
            new_name: None,
            classification: None,
            fields: None,
            error: Some(error),
            renamed_path: None,
            rename_error: None,
        }
    }
}

/// 1回の実行結果
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub outcomes: Vec<FileOutcome>,
    pub buckets: Vec<Bucket>,
    pub cancelled: bool,
}

impl RunReport {
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }

    /// リネーム後のファイル名 → 元画像のパス
    pub fn sources(&self) -> HashMap<String, PathBuf> {
        self.outcomes
            .iter()
            .filter_map(|o| o.new_name.clone().map(|name| (name, o.source.clone())))
            .collect()
    }

    /// 成功したファイルの元画像を、割り当てた名前に (元の拡張子のまま) リネーム
    ///
    /// 失敗は `rename_error` に記録し、`renamed_path` は空のままにする。
    pub fn rename_sources(&mut self) -> usize {
        let mut renamed = 0;

        for outcome in self.outcomes.iter_mut() {
            let Some(ref new_name) = outcome.new_name else {
                continue;
            };
            match rename_source(&outcome.source, new_name) {
                Ok(path) => {
                    outcome.renamed_path = Some(path);
                    renamed += 1;
                }
                Err(e) => {
                    warn!(file = %outcome.original, "リネームに失敗: {:#}", e);
                    outcome.rename_error = Some(format!("{:#}", e));
                }
            }
        }

        renamed
    }
}

fn rename_source(source: &Path, new_name: &str) -> Result<PathBuf> {
    let stem = Path::new(new_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(new_name);
    let target_name = match source.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem.to_string(),
    };

    let directory = source.parent().unwrap_or(Path::new("."));
    if directory.join(&target_name) == source {
        return Ok(source.to_path_buf());
    }

    let target = unique_path_in(directory, &target_name);
    std::fs::rename(source, &target)
        .with_context(|| format!("{:?} → {:?}", source, target))?;
    Ok(target)
}

/// OCR結果からファイル名と分類を決めるパイプライン
pub struct Pipeline<E> {
    extractor: E,
    options: PipelineOptions,
}

impl<E: TextExtractor> Pipeline<E> {
    pub fn new(extractor: E, options: PipelineOptions) -> Self {
        Self { extractor, options }
    }

    /// 入力を順番に処理する
    ///
    /// 読み込みやOCRに失敗したファイルは結果に記録して次へ進む。
    /// `cancel` はファイルの合間に確認する。
    pub async fn run<F>(&self, inputs: &[PathBuf], mut on_progress: F, cancel: &AtomicBool) -> RunReport
    where
        F: FnMut(&Progress),
    {
        let total = inputs.len();
        let mut counter = NameCounter::new();
        let mut organizer = Organizer::new(self.options.scheme, self.options.fallback_bucket.clone());
        let mut outcomes = Vec::with_capacity(total);
        let mut cancelled = false;

        info!(total, "処理を開始");

        for (i, path) in inputs.iter().enumerate() {
            if cancel.load(Ordering::SeqCst) {
                warn!(done = i, total, "処理を中断しました");
                cancelled = true;
                break;
            }

            let outcome = match self.process_one(path, &mut counter, &mut organizer).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(file = %path.display(), "処理に失敗: {:#}", e);
                    FileOutcome::failed(path, format!("{:#}", e))
                }
            };
            outcomes.push(outcome);

            on_progress(&Progress {
                done: i + 1,
                total,
                message: format!("Processando arquivo {} de {}", i + 1, total),
            });
        }

        let report = RunReport {
            outcomes,
            buckets: organizer.into_buckets(),
            cancelled,
        };
        info!(
            success = report.success_count(),
            failed = report.failure_count(),
            "処理が完了"
        );
        report
    }

    /// 単一の画像を処理
    async fn process_one(
        &self,
        path: &Path,
        counter: &mut NameCounter,
        organizer: &mut Organizer,
    ) -> Result<FileOutcome> {
        let image = image::open(path).with_context(|| format!("画像の読み込みに失敗: {:?}", path))?;

        let text = self
            .extractor
            .extract_text(&image)
            .await
            .context("テキスト抽出エラー")?;

        let fields = ExtractedFields::parse(&text, &self.options.parser);
        let new_name = counter.assign(fields.name_or(&self.options.placeholder));
        let classification = organizer.push(new_name.clone(), &fields);

        debug!(
            file = %path.display(),
            new_name = %new_name,
            classification = %classification,
            "ファイルを分類"
        );

        Ok(FileOutcome {
            original: display_name(path),
            source: path.to_path_buf(),
            new_name: Some(new_name),
            classification: Some(classification.to_string()),
            fields: Some(fields),
            error: None,
            renamed_path: None,
            rename_error: None,
        })
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// 対応する画像ファイルか
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SUPPORTED_EXTENSIONS.iter().any(|s| e.eq_ignore_ascii_case(s)))
}

/// 入力パスを画像ファイルの一覧に展開する
///
/// ディレクトリは1階層だけ見て名前順に並べる。対応外のファイルは無視する。
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(path)
                .with_context(|| format!("フォルダの読み込みに失敗: {:?}", path))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_supported_image(p))
                .collect();
            entries.sort();
            files.extend(entries);
        } else if is_supported_image(path) {
            files.push(path.clone());
        } else {
            debug!(file = %path.display(), "対応外のファイルをスキップ");
        }
    }

    Ok(files)
}
