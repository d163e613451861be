use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが設定されていません。`--api_key` または環境変数 GEMINI_API_KEY で指定してください")]
    MissingApiKey,

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("API呼び出しエラー: {0}")]
    ApiCall(String),

    #[error("APIレスポンスが不正: {0}")]
    ApiResponse(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("ワーカーエラー: {0}")]
    Worker(String),

    #[error(transparent)]
    Common(#[from] gemini_ocr_common::Error),
}

impl From<ini::Error> for OcrError {
    fn from(err: ini::Error) -> Self {
        OcrError::Config(err.to_string())
    }
}

impl From<reqwest::Error> for OcrError {
    fn from(err: reqwest::Error) -> Self {
        OcrError::ApiCall(err.without_url().to_string())
    }
}

pub type Result<T> = std::result::Result<T, OcrError>;
