//! 設定ファイル（INI）
//!
//! 起動時に1度読み込み、呼び出し側が値を書き換えて `save()` で保存する。
//!
//! ```ini
//! [API]
//! api_key = ...
//!
//! [SETTINGS]
//! model = gemini-2.0-flash
//! last_photo_dir = ...
//! last_output_path = ...
//! last_prompt_file = ...
//! ```

use crate::error::{OcrError, Result};
use ini::{EscapePolicy, Ini, ParseOption};
use std::path::{Path, PathBuf};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// 選択可能なモデル
pub const SUPPORTED_MODELS: &[&str] = &[
    "gemini-2.0-flash",
    "gemini-2.0-pro",
    "gemini-1.5-flash",
    "gemini-1.5-pro",
];

const API_KEY_ENV: &str = "GEMINI_API_KEY";

const SECTION_API: &str = "API";
const SECTION_SETTINGS: &str = "SETTINGS";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    path: PathBuf,
    pub api_key: String,
    pub model: String,
    pub last_photo_dir: String,
    pub last_output_path: String,
    pub last_prompt_file: String,
}

impl Settings {
    /// ユーザー設定ディレクトリから読み込み
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// 指定パスから読み込み。ファイルがなければデフォルト値で作成する
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let settings = Self::with_defaults(path);
            settings.save()?;
            tracing::info!(path = %path.display(), "設定ファイルを作成しました");
            return Ok(settings);
        }

        // 値はエスケープ・引用符を解釈せずそのまま扱う（Windowsのパス対策）
        let verbatim = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..Default::default()
        };
        let conf = Ini::load_from_file_opt(path, verbatim)?;
        let get = |section: &str, key: &str| {
            conf.section(Some(section))
                .and_then(|props| props.get(key))
                .map(str::to_string)
        };

        Ok(Self {
            path: path.to_path_buf(),
            api_key: get(SECTION_API, "api_key").unwrap_or_default(),
            model: get(SECTION_SETTINGS, "model")
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            last_photo_dir: get(SECTION_SETTINGS, "last_photo_dir").unwrap_or_default(),
            last_output_path: get(SECTION_SETTINGS, "last_output_path").unwrap_or_default(),
            last_prompt_file: get(SECTION_SETTINGS, "last_prompt_file").unwrap_or_default(),
        })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut conf = Ini::new();
        conf.with_section(Some(SECTION_API))
            .set("api_key", self.api_key.as_str());
        conf.with_section(Some(SECTION_SETTINGS))
            .set("model", self.model.as_str())
            .set("last_photo_dir", self.last_photo_dir.as_str())
            .set("last_output_path", self.last_output_path.as_str())
            .set("last_prompt_file", self.last_prompt_file.as_str());

        conf.write_to_file_policy(&self.path, EscapePolicy::Nothing)?;
        tracing::debug!(path = %self.path.display(), "設定を保存しました");
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| OcrError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".gemini_ocr").join("config.ini"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// APIキーを取得（設定値が空なら環境変数 GEMINI_API_KEY）
    pub fn resolve_api_key(&self) -> Result<String> {
        pick_api_key(&self.api_key, std::env::var(API_KEY_ENV).ok().as_deref())
    }

    /// ファイルに触れずにデフォルト値を作る
    pub fn with_defaults(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            last_photo_dir: String::new(),
            last_output_path: String::new(),
            last_prompt_file: String::new(),
        }
    }
}

/// 入力済みのキーを優先し、空のときだけ環境変数の値を使う
pub fn pick_api_key(stored: &str, env: Option<&str>) -> Result<String> {
    let stored = stored.trim();
    if !stored.is_empty() {
        return Ok(stored.to_string());
    }
    env.map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .ok_or(OcrError::MissingApiKey)
}
