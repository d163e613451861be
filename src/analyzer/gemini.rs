//! Gemini API連携
//!
//! `models/{model}:generateContent` に指示テキストと画像（Base64）を1回送信し、
//! 最初の候補のテキストを返す。リトライ・タイムアウトは設定しない。

use super::mime::detect_mime_type;
use super::OcrBackend;
use crate::error::{OcrError, Result};
use crate::scanner::ImageRef;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Gemini APIリクエスト
#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

/// Gemini APIレスポンス
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// エラー時のレスポンス `{"error": {"code": 400, "message": "...", "status": "..."}}`
#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
    status: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: GEMINI_API_BASE.to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// 接続先を変更（プロキシ・テスト用）
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    fn build_request(prompt: &str, mime_type: &str, bytes: &[u8]) -> GeminiRequest {
        GeminiRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: prompt.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: mime_type.to_string(),
                            data: BASE64.encode(bytes),
                        },
                    },
                ],
            }],
        }
    }
}

#[async_trait]
impl OcrBackend for GeminiClient {
    async fn generate(&self, prompt: &str, image: &ImageRef) -> Result<String> {
        let bytes = tokio::fs::read(&image.path)
            .await
            .map_err(|e| OcrError::ImageLoad(format!("{}: {}", image.path.display(), e)))?;

        let mime_type = detect_mime_type(&image.path, &bytes);
        tracing::debug!(
            image = %image.path.display(),
            mime_type,
            size = bytes.len(),
            model = %self.model,
            "Gemini APIを呼び出します"
        );

        let request = Self::build_request(prompt, mime_type, &bytes);
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(OcrError::ApiCall(api_error_message(status, &body)));
        }

        let parsed: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| OcrError::ApiResponse(format!("JSONパースエラー: {}", e)))?;

        extract_text(parsed)
    }
}

fn api_error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(err) => match err.error.status {
            Some(code) => format!("{} {}: {}", status.as_u16(), code, err.error.message),
            None => format!("{}: {}", status.as_u16(), err.error.message),
        },
        Err(_) => {
            let preview: String = body.chars().take(200).collect();
            format!("{}: {}", status, preview.trim())
        }
    }
}

/// 最初の候補のテキストパートを連結
fn extract_text(response: GeminiResponse) -> Result<String> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "候補なし".to_string());
        return Err(OcrError::ApiResponse(format!("応答がブロックされました: {}", reason)));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "不明".to_string());
        return Err(OcrError::ApiResponse(format!("テキストが空です (finishReason: {})", reason)));
    }

    Ok(text)
}
