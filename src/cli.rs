use crate::analyzer::GEMINI_API_BASE;
use crate::config::DEFAULT_MODEL;
use crate::prompt::PromptSource;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gemini-ocr")]
#[command(about = "Gemini APIで画像をOCRし、結果をExcelに変換", long_about = None)]
pub struct Cli {
    /// Google APIキー
    #[arg(long = "api_key", env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Geminiモデル名
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// 画像フォルダ
    #[arg(long = "photo_dir", default_value = "Photo")]
    pub photo_dir: PathBuf,

    /// 出力Excelファイル
    #[arg(long = "output_path", default_value = "output.xlsx")]
    pub output_path: PathBuf,

    /// プロンプトファイル
    #[arg(long = "prompt_file", default_value = "prompt.txt")]
    pub prompt_file: PathBuf,

    /// プロンプトを直接指定（--prompt_file より優先）
    #[arg(long)]
    pub prompt: Option<String>,

    /// 画像ファイルを個別に指定（複数可、--photo_dir より優先）
    #[arg(long = "image", value_name = "FILE")]
    pub images: Vec<PathBuf>,

    /// APIキー・モデル・パスを設定ファイルに保存
    #[arg(long)]
    pub save_settings: bool,

    /// API接続先
    #[arg(long = "api_base", env = "GEMINI_API_BASE", default_value = GEMINI_API_BASE, hide = true)]
    pub api_base: String,

    /// 詳細ログを出力
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn prompt_source(&self) -> PromptSource {
        match &self.prompt {
            Some(text) => PromptSource::Text(text.clone()),
            None => PromptSource::File(self.prompt_file.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["gemini-ocr", "--api_key", "KEY"]).unwrap();
        assert_eq!(cli.api_key, "KEY");
        assert_eq!(cli.model, "gemini-2.0-flash");
        assert_eq!(cli.photo_dir, PathBuf::from("Photo"));
        assert_eq!(cli.output_path, PathBuf::from("output.xlsx"));
        assert_eq!(cli.prompt_file, PathBuf::from("prompt.txt"));
        assert!(cli.images.is_empty());
        assert!(matches!(cli.prompt_source(), PromptSource::File(p) if p == PathBuf::from("prompt.txt")));
    }

    #[test]
    fn test_all_flags() {
        let cli = Cli::try_parse_from([
            "gemini-ocr",
            "--api_key", "KEY",
            "--model", "gemini-1.5-pro",
            "--photo_dir", "scans",
            "--output_path", "out/result.xlsx",
            "--prompt_file", "p.txt",
            "--image", "a.jpg",
            "--image", "b.png",
            "--prompt", "日付を抽出",
        ])
        .unwrap();
        assert_eq!(cli.model, "gemini-1.5-pro");
        assert_eq!(cli.photo_dir, PathBuf::from("scans"));
        assert_eq!(cli.output_path, PathBuf::from("out/result.xlsx"));
        assert_eq!(cli.images, vec![PathBuf::from("a.jpg"), PathBuf::from("b.png")]);
        assert!(matches!(cli.prompt_source(), PromptSource::Text(t) if t == "日付を抽出"));
    }
}
