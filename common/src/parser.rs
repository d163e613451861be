//! APIレスポンスパーサー
//!
//! Geminiのテキストレスポンスから結果JSONを取り出す。
//! スキーマ検証は行わず、解釈できなければ元のテキストをそのまま返す。

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    static ref JSON_FENCE_RE: Regex =
        Regex::new(r"(?s)```json[ \t]*\r?\n(.*?)\r?\n[ \t]*```").unwrap();
}

/// パース結果
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    /// 任意のJSON値
    Json(Value),
    /// JSONとして解釈できなかったレスポンス全文
    RawText(String),
}

/// ```json ... ``` ブロックの中身を抽出
///
/// 複数ある場合は最初のブロック。
///
/// # Examples
/// ```
/// use gemini_ocr_common::extract_json_block;
///
/// let response = "結果:\n```json\n{\"a\": 1}\n```";
/// assert_eq!(extract_json_block(response), Some("{\"a\": 1}"));
/// assert_eq!(extract_json_block("{\"a\": 1}"), None);
/// ```
pub fn extract_json_block(response: &str) -> Option<&str> {
    JSON_FENCE_RE
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// レスポンステキストをパース
///
/// 優先順位:
/// 1. ```json ... ``` ブロック
/// 2. レスポンス全体
/// 3. どちらも失敗したら `RawText`（元のテキスト）
pub fn parse_ocr_response(response: &str) -> ParsedResponse {
    let candidate = extract_json_block(response).unwrap_or(response);

    match serde_json::from_str::<Value>(candidate) {
        Ok(value) => ParsedResponse::Json(value),
        Err(_) => ParsedResponse::RawText(response.to_string()),
    }
}
