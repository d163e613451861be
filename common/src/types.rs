//! OCR結果の型定義
//!
//! 1画像につき1レコード。`image_file`/`image_path` は常に存在し、
//! 中身は構造化フィールド・`raw_text`・`error` のいずれか1つ。

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::parser::{parse_ocr_response, ParsedResponse};

pub const IMAGE_FILE_KEY: &str = "image_file";
pub const IMAGE_PATH_KEY: &str = "image_path";
pub const RAW_TEXT_KEY: &str = "raw_text";
pub const ERROR_KEY: &str = "error";

/// JSONがオブジェクト以外（配列・数値など）だった場合のエラーメッセージ
pub const UNEXPECTED_FORMAT: &str = "Unexpected result format";

/// 1画像分の解析結果
#[derive(Debug, Clone, PartialEq)]
pub enum OcrOutcome {
    /// モデルが返したJSONオブジェクト
    Structured(Map<String, Value>),
    /// JSONとして解釈できなかったレスポンス全文
    RawText(String),
    /// 画像読み込み・API呼び出しの失敗
    Error(String),
}

/// OCR結果レコード
#[derive(Debug, Clone, PartialEq)]
pub struct OcrRecord {
    /// 画像のファイル名（ベース名）
    pub image_file: String,
    /// 列挙時のフルパス（同名ファイルの区別用）
    pub image_path: String,
    pub outcome: OcrOutcome,
}

impl OcrRecord {
    pub fn new(image_file: impl Into<String>, image_path: impl Into<String>, outcome: OcrOutcome) -> Self {
        Self {
            image_file: image_file.into(),
            image_path: image_path.into(),
            outcome,
        }
    }

    /// モデルのレスポンステキストからレコードを作成
    pub fn from_response(
        image_file: impl Into<String>,
        image_path: impl Into<String>,
        response: &str,
    ) -> Self {
        let outcome = match parse_ocr_response(response) {
            ParsedResponse::Json(Value::Object(map)) => OcrOutcome::Structured(map),
            ParsedResponse::Json(_) => OcrOutcome::Error(UNEXPECTED_FORMAT.to_string()),
            ParsedResponse::RawText(text) => OcrOutcome::RawText(text),
        };
        Self::new(image_file, image_path, outcome)
    }

    pub fn failure(
        image_file: impl Into<String>,
        image_path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(image_file, image_path, OcrOutcome::Error(message.into()))
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, OcrOutcome::Error(_))
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            OcrOutcome::Error(message) => Some(message.as_str()),
            _ => None,
        }
    }

    /// フラットなJSONオブジェクトに変換
    ///
    /// 構造化フィールドに `image_file`/`image_path` が含まれていた場合はタグで上書きする。
    pub fn to_json_map(&self) -> Map<String, Value> {
        let mut map = match &self.outcome {
            OcrOutcome::Structured(fields) => fields.clone(),
            OcrOutcome::RawText(text) => {
                let mut map = Map::new();
                map.insert(RAW_TEXT_KEY.to_string(), Value::String(text.clone()));
                map
            }
            OcrOutcome::Error(message) => {
                let mut map = Map::new();
                map.insert(ERROR_KEY.to_string(), Value::String(message.clone()));
                map
            }
        };
        map.insert(IMAGE_FILE_KEY.to_string(), Value::String(self.image_file.clone()));
        map.insert(IMAGE_PATH_KEY.to_string(), Value::String(self.image_path.clone()));
        map
    }
}

impl Serialize for OcrRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let map = self.to_json_map();
        let mut out = serializer.serialize_map(Some(map.len()))?;
        for (key, value) in &map {
            out.serialize_entry(key, value)?;
        }
        out.end()
    }
}
