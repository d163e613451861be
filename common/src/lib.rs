//! Gemini OCR Common Library
//!
//! CLIとデスクトップ版で共有される型とユーティリティ

pub mod error;
pub mod export;
pub mod parser;
pub mod prompts;
pub mod table;
pub mod types;

pub use error::{Error, Result};
pub use parser::{extract_json_block, parse_ocr_response, ParsedResponse};
pub use prompts::{build_ocr_prompt, DEFAULT_CUSTOM_PROMPT};
pub use table::{flatten_records, Cell, Table};
pub use types::{OcrOutcome, OcrRecord, ERROR_KEY, IMAGE_FILE_KEY, IMAGE_PATH_KEY, RAW_TEXT_KEY};
