//! OCR処理
//!
//! 画像1枚ごとにバックエンドを1回呼び出し、結果をレコードにする。
//! 失敗はレコードの `error` として記録し、残りの画像の処理を続ける。

pub mod gemini;
mod mime;

pub use gemini::{GeminiClient, GEMINI_API_BASE};
pub use mime::detect_mime_type;

use crate::error::Result;
use crate::scanner::ImageRef;
use async_trait::async_trait;
use gemini_ocr_common::{build_ocr_prompt, OcrRecord};

/// 画像+プロンプトからテキストを生成するモデル
#[async_trait]
pub trait OcrBackend: Send + Sync {
    async fn generate(&self, prompt: &str, image: &ImageRef) -> Result<String>;
}

/// 進捗（処理済み枚数 / 総枚数）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    /// 0〜100の表示値
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        (self.completed.min(self.total) * 100 / self.total) as u8
    }
}

/// 画像1枚を処理。エラーを返すことはない
pub async fn process_image<B>(backend: &B, image: &ImageRef, prompt: &str) -> OcrRecord
where
    B: OcrBackend + ?Sized,
{
    let image_path = image.path.display().to_string();

    match backend.generate(prompt, image).await {
        Ok(text) => OcrRecord::from_response(&image.file_name, image_path, &text),
        Err(e) => {
            tracing::warn!(image = %image_path, error = %e, "OCRに失敗しました");
            OcrRecord::failure(&image.file_name, image_path, e.to_string())
        }
    }
}

/// 画像を列挙順に1枚ずつ処理
///
/// 1枚処理するごとに `on_progress` を1回呼ぶ。
pub async fn process_images<B, F>(
    backend: &B,
    images: &[ImageRef],
    custom_prompt: &str,
    mut on_progress: F,
) -> Vec<OcrRecord>
where
    B: OcrBackend + ?Sized,
    F: FnMut(Progress),
{
    let prompt = build_ocr_prompt(custom_prompt);
    let total = images.len();
    let mut records = Vec::with_capacity(total);

    for (idx, image) in images.iter().enumerate() {
        tracing::debug!("[{}/{}] {}", idx + 1, total, image.path.display());
        records.push(process_image(backend, image, &prompt).await);
        on_progress(Progress {
            completed: idx + 1,
            total,
        });
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrError;
    use gemini_ocr_common::OcrOutcome;
    use std::sync::Mutex;

    /// ファイル名ごとに決まった応答を返すバックエンド
    struct ScriptedBackend {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl OcrBackend for ScriptedBackend {
        async fn generate(&self, prompt: &str, image: &ImageRef) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match image.file_name.as_str() {
                "fail.jpg" => Err(OcrError::ApiCall("403 PERMISSION_DENIED".into())),
                "text.jpg" => Ok("no json here".into()),
                _ => Ok(format!("```json\n{{\"name\": \"{}\"}}\n```", image.file_name)),
            }
        }
    }

    fn backend() -> ScriptedBackend {
        ScriptedBackend {
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn images(names: &[&str]) -> Vec<ImageRef> {
        names.iter().map(|n| ImageRef::new(format!("Photo/{}", n))).collect()
    }

    #[tokio::test]
    async fn test_one_record_per_image_in_order() {
        let backend = backend();
        let images = images(&["a.jpg", "fail.jpg", "text.jpg"]);

        let records = process_images(&backend, &images, "抽出して", |_| {}).await;

        assert_eq!(records.len(), 3);
        let names: Vec<&str> = records.iter().map(|r| r.image_file.as_str()).collect();
        assert_eq!(names, vec!["a.jpg", "fail.jpg", "text.jpg"]);
        assert!(matches!(records[0].outcome, OcrOutcome::Structured(_)));
        assert!(records[1].error().unwrap().contains("403"));
        assert_eq!(records[2].outcome, OcrOutcome::RawText("no json here".into()));
        assert_eq!(records.iter().filter(|r| r.is_error()).count(), 1);
    }

    #[tokio::test]
    async fn test_prompt_built_once_with_custom_text() {
        let backend = backend();
        process_images(&backend, &images(&["a.jpg", "b.jpg"]), "合計金額", |_| {}).await;

        let prompts = backend.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0], prompts[1]);
        assert!(prompts[0].contains("Please perform OCR on this image."));
        assert!(prompts[0].contains("合計金額"));
    }

    #[tokio::test]
    async fn test_progress_once_per_image() {
        let backend = backend();
        let mut events = Vec::new();
        process_images(&backend, &images(&["a.jpg", "fail.jpg", "c.jpg"]), "", |p| events.push(p)).await;

        let completed: Vec<usize> = events.iter().map(|p| p.completed).collect();
        assert_eq!(completed, vec![1, 2, 3]);
        assert!(events.iter().all(|p| p.total == 3));
        assert_eq!(events.last().map(Progress::percent), Some(100));
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(Progress { completed: 0, total: 4 }.percent(), 0);
        assert_eq!(Progress { completed: 1, total: 3 }.percent(), 33);
        assert_eq!(Progress { completed: 3, total: 3 }.percent(), 100);
        assert_eq!(Progress { completed: 0, total: 0 }.percent(), 100);
    }
}
