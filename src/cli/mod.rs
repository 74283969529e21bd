//! コマンドラインからの実行

mod args;

pub use args::Args;

use crate::archive::{ARCHIVE_NAME_PRESETS, ArchiveBuilder};
use crate::config::Settings;
use crate::pipeline::{Pipeline, Progress, RunReport, collect_inputs};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// 引数を解析して実行
pub async fn run() -> Result<()> {
    let args = Args::parse();

    if args.list_presets {
        for preset in ARCHIVE_NAME_PRESETS {
            println!("{}", preset);
        }
        return Ok(());
    }

    let mut settings = Settings::from_env()?;
    args.apply_to(&mut settings);

    let inputs = collect_inputs(&args.inputs)?;
    if inputs.is_empty() {
        anyhow::bail!("画像ファイル (png/jpg/jpeg) が見つかりません");
    }

    let engine = settings.build_engine()?;
    let pipeline = Pipeline::new(engine, settings.pipeline_options());

    // Ctrl-C でファイルの合間に中断
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.store(true, Ordering::SeqCst);
            }
        });
    }

    let mut report = pipeline.run(&inputs, print_progress, &cancel).await;
    eprintln!();

    if report.cancelled {
        print_summary(&report);
        anyhow::bail!("中断されました。アーカイブは作成していません");
    }

    let output_name = args.output_name.as_deref().unwrap_or_default();
    let archive_path = ArchiveBuilder::new(args.convert)
        .discard_converted(args.discard_converted)
        .build(&report.buckets, &report.sources(), output_name, &settings.output_dir)
        .context("アーカイブの作成に失敗")?;

    if args.rename_in_place {
        let renamed = report.rename_sources();
        info!(renamed, "元ファイルをリネームしました");
    }

    print_summary(&report);
    println!("→ {}", archive_path.display());

    if let Some(ref path) = args.report {
        write_report(&report, path)?;
    }

    if args.open {
        let folder = archive_path.parent().unwrap_or(Path::new("."));
        if let Err(e) = open::that(folder) {
            warn!("フォルダを開けません: {}", e);
        }
    }

    Ok(())
}

/// 進捗を1行で表示
fn print_progress(progress: &Progress) {
    let mut stderr = std::io::stderr();
    let _ = write!(
        stderr,
        "\r[{:>3.0}%] {}",
        progress.fraction() * 100.0,
        progress.message
    );
    let _ = stderr.flush();
}

/// 処理結果の一覧
fn print_summary(report: &RunReport) {
    for outcome in &report.outcomes {
        match (&outcome.new_name, &outcome.error) {
            (Some(new_name), None) => println!(
                "✓ {} → {}/{}",
                outcome.original,
                outcome.classification.as_deref().unwrap_or(""),
                new_name
            ),
            (_, Some(error)) => println!("✗ {} エラー: {}", outcome.original, error),
            (None, None) => {}
        }
        if let Some(ref error) = outcome.rename_error {
            println!("  ! {} リネーム失敗: {}", outcome.original, error);
        }
    }

    println!(
        "完了: {} 件成功, {} 件失敗",
        report.success_count(),
        report.failure_count()
    );
}

fn write_report(report: &RunReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).with_context(|| format!("レポートの書き込みに失敗: {:?}", path))
}
