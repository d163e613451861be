use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use gemini_ocr::config::Settings;

const DEFAULT_OUTPUT_FILE: &str = "output.xlsx";

pub fn load_settings() -> Result<Settings> {
    let path = Settings::config_path().context("locate settings file")?;
    Settings::load_from(&path).with_context(|| format!("load {}", path.display()))
}

/// Settings to start the window with, plus a status line when loading failed.
pub fn load_settings_or_default() -> (Settings, Option<String>) {
    match load_settings() {
        Ok(settings) => (settings, None),
        Err(err) => {
            tracing::warn!(error = %format!("{err:#}"), "using default settings");
            let path = Settings::config_path().unwrap_or_else(|_| PathBuf::from("config.ini"));
            (
                Settings::with_defaults(&path),
                Some(format!("Settings load failed: {err:#}")),
            )
        }
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    settings
        .save()
        .with_context(|| format!("write {}", settings.path().display()))
}

pub fn initial_output_path(settings: &Settings) -> String {
    if settings.last_output_path.trim().is_empty() {
        DEFAULT_OUTPUT_FILE.to_string()
    } else {
        settings.last_output_path.clone()
    }
}

/// Folder to open a dialog in, if the remembered one still exists.
pub fn existing_dir(remembered: &str) -> Option<PathBuf> {
    let path = Path::new(remembered);
    if remembered.is_empty() {
        return None;
    }
    if path.is_dir() {
        Some(path.to_path_buf())
    } else {
        path.parent().filter(|p| p.is_dir()).map(Path::to_path_buf)
    }
}

/// Folder of the first picked file, remembered for the next dialog.
pub fn parent_dir(paths: &[PathBuf]) -> Option<String> {
    paths
        .first()
        .and_then(|path| path.parent())
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.display().to_string())
}
