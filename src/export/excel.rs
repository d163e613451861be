//! Excel生成（CLI/デスクトップ共通）
//!
//! レコードをフラット化し、共通ライブラリでxlsxバッファを作ってファイルに書き出す。

use crate::error::Result;
use gemini_ocr_common::export::excel_core::generate_excel_buffer;
use gemini_ocr_common::{flatten_records, OcrRecord};
use std::path::Path;

pub fn generate_excel(records: &[OcrRecord], output_path: &Path) -> Result<()> {
    super::create_parent_dir(output_path)?;

    let table = flatten_records(records);
    tracing::debug!(
        rows = table.len(),
        columns = table.columns().len(),
        "Excelを生成します"
    );

    let buffer = generate_excel_buffer(&table)?;
    std::fs::write(output_path, buffer)?;
    Ok(())
}
