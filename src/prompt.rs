//! ユーザープロンプトの読み込み
//!
//! 直接入力またはファイルから読み込む。読み込めない・空の場合はデフォルトの指示を使う。

use gemini_ocr_common::DEFAULT_CUSTOM_PROMPT;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum PromptSource {
    Text(String),
    File(PathBuf),
}

/// 読み込み結果
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedPrompt {
    pub text: String,
    /// デフォルトに切り替えた理由（ユーザーに表示する）
    pub fallback_reason: Option<String>,
}

impl LoadedPrompt {
    pub fn used_default(&self) -> bool {
        self.fallback_reason.is_some()
    }

    fn fallback(reason: String) -> Self {
        tracing::warn!("{}。デフォルトのOCR指示を使用します", reason);
        Self {
            text: DEFAULT_CUSTOM_PROMPT.to_string(),
            fallback_reason: Some(reason),
        }
    }
}

pub fn load_prompt(source: &PromptSource) -> LoadedPrompt {
    let (text, origin) = match source {
        PromptSource::Text(text) => (text.clone(), "入力されたプロンプト".to_string()),
        PromptSource::File(path) => match std::fs::read_to_string(path) {
            Ok(content) => (content, path.display().to_string()),
            Err(e) => {
                return LoadedPrompt::fallback(format!(
                    "プロンプトファイルを読み込めません ({}): {}",
                    path.display(),
                    e
                ));
            }
        },
    };

    let text = text.trim();
    if text.is_empty() {
        return LoadedPrompt::fallback(format!("プロンプトが空です: {}", origin));
    }

    LoadedPrompt {
        text: text.to_string(),
        fallback_reason: None,
    }
}
