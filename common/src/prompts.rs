//! プロンプト生成モジュール
//!
//! 固定のOCR指示にユーザー指定のプロンプトを埋め込む。

/// プロンプトが読み込めなかった場合に使う指示
pub const DEFAULT_CUSTOM_PROMPT: &str =
    "Extract all text from the image and organize it into structured data.";

/// OCR用プロンプト生成
///
/// # Arguments
/// * `custom_prompt` - ユーザー指定の指示（前後の空白は除去）
pub fn build_ocr_prompt(custom_prompt: &str) -> String {
    format!(
        "Please perform OCR on this image.\n\n{}\n\nReturn the results in a structured JSON format that can be converted to Excel.",
        custom_prompt.trim()
    )
}
