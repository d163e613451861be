use clap::Parser;
use gemini_ocr::{analyzer, cli, config, error, export, logging, prompt, scanner};
use analyzer::GeminiClient;
use cli::Cli;
use config::Settings;
use error::{OcrError, Result};
use export::{ExportOutcome, FALLBACK_JSON_PATH};
use indicatif::{ProgressBar, ProgressStyle};
use scanner::ImageSelection;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if cli.api_key.trim().is_empty() {
        return Err(OcrError::MissingApiKey);
    }

    println!("📷 gemini-ocr - 画像OCR\n");

    let loaded = prompt::load_prompt(&cli.prompt_source());
    if let Some(reason) = &loaded.fallback_reason {
        println!("⚠ {}。デフォルトのOCR指示を使用します\n", reason);
    }

    // 1. 画像スキャン
    println!("[1/3] 画像をスキャン中...");
    let (images, source) = if cli.images.is_empty() {
        let images = match scanner::scan_folder(&cli.photo_dir) {
            Err(OcrError::FolderNotFound(dir)) => {
                tracing::warn!(dir = %dir, "photo folder does not exist");
                Vec::new()
            }
            other => other?,
        };
        (images, cli.photo_dir.display().to_string())
    } else {
        let mut selection = ImageSelection::new();
        selection.add_files(cli.images.iter().cloned());
        let source = cli
            .images
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        (selection.images().to_vec(), source)
    };

    if images.is_empty() {
        println!("画像が見つかりません: {}", source);
        return Ok(());
    }
    println!("✔ {}枚の画像を検出\n", images.len());

    if cli.save_settings {
        let mut settings = Settings::load()?;
        settings.api_key = cli.api_key.clone();
        settings.model = cli.model.clone();
        settings.last_photo_dir = cli.photo_dir.display().to_string();
        settings.last_output_path = cli.output_path.display().to_string();
        settings.last_prompt_file = cli.prompt_file.display().to_string();
        settings.save()?;
        println!("✔ 設定を保存: {}\n", settings.path().display());
    }

    // 2. OCR
    println!("[2/3] OCR処理中... (モデル: {})", cli.model);
    let client = GeminiClient::new(cli.api_key.as_str(), cli.model.as_str())
        .with_base_url(cli.api_base.as_str());

    let bar = ProgressBar::new(images.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("  {bar:40.cyan/blue} {pos}/{len} ({percent}%)")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    let records = analyzer::process_images(&client, &images, &loaded.text, |progress| {
        bar.set_position(progress.completed as u64);
    })
    .await;
    bar.finish_and_clear();

    let failed = records.iter().filter(|r| r.is_error()).count();
    println!("✔ OCR完了 (成功: {}, 失敗: {})\n", records.len() - failed, failed);
    if cli.verbose {
        for record in records.iter().filter(|r| r.is_error()) {
            println!("  ✗ {}: {}", record.image_file, record.error().unwrap_or_default());
        }
    }

    // 3. 保存
    println!("[3/3] 結果を保存中...");
    match export::export_results(&records, &cli.output_path, Path::new(FALLBACK_JSON_PATH))? {
        ExportOutcome::Spreadsheet(path) => println!("✔ 結果を保存: {}", path.display()),
        ExportOutcome::JsonFallback { path, reason } => {
            println!("⚠ Excel保存エラー: {}", reason);
            println!("✔ 代わりにJSONで保存: {}", path.display());
        }
    }

    println!("\n✅ 完了");
    Ok(())
}
