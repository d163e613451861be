//! Excel生成（共通ライブラリ）
//!
//! フラット化した表を1シートのExcelに書き出す。
//! 1行目がヘッダー、以降1レコード1行。空セルは書き込まない。

use crate::error::{Error, Result};
use crate::table::{Cell, Table};
use rust_xlsxwriter::*;

/// 出力シート名
pub const SHEET_NAME: &str = "OCR";

/// Excelをバッファに生成
///
/// Excelの制限（32,767文字を超えるセル、16,384列を超える表など）に
/// 当たった場合はエラーを返す。
pub fn generate_excel_buffer(table: &Table) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(0xAAAAAA));

    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(SHEET_NAME)
        .map_err(|e| Error::Excel(format!("シート名設定エラー: {}", e)))?;

    for (col, name) in table.columns().iter().enumerate() {
        let col = column_number(col)?;
        worksheet
            .write_string_with_format(0, col, name.as_str(), &header_format)
            .map_err(|e| Error::Excel(format!("ヘッダー書き込みエラー ({}): {}", name, e)))?;
    }

    for (row_idx, row) in table.rows().iter().enumerate() {
        let excel_row = u32::try_from(row_idx + 1)
            .map_err(|_| Error::Excel(format!("行数が上限を超えています: {}", table.len())))?;

        for (col, cell) in row.iter().enumerate() {
            let col = column_number(col)?;
            let written = match cell {
                Cell::Empty => continue,
                Cell::Text(text) => worksheet.write_string(excel_row, col, text.as_str()),
                Cell::Number(n) => worksheet.write_number(excel_row, col, *n),
                Cell::Bool(b) => worksheet.write_boolean(excel_row, col, *b),
            };
            written.map_err(|e| Error::Excel(format!("セル書き込みエラー (行{} 列{}): {}", excel_row + 1, u32::from(col) + 1, e)))?;
        }
    }

    worksheet
        .set_freeze_panes(1, 0)
        .map_err(|e| Error::Excel(format!("ウィンドウ枠固定エラー: {}", e)))?;
    worksheet.autofit();

    workbook
        .save_to_buffer()
        .map_err(|e| Error::Excel(format!("Excel保存エラー: {}", e)))
}

fn column_number(col: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| Error::Excel(format!("列数が上限を超えています: {}", col + 1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::flatten_records;
    use crate::types::{OcrOutcome, OcrRecord};

    #[test]
    fn test_generate_buffer() {
        let records = vec![
            OcrRecord::from_response("a.jpg", "a.jpg", r#"{"total": 100, "paid": true}"#),
            OcrRecord::failure("b.jpg", "b.jpg", "API error"),
        ];
        let buffer = generate_excel_buffer(&flatten_records(&records)).unwrap();
        // xlsx は zip（PK..）
        assert!(buffer.starts_with(b"PK"));
    }

    #[test]
    fn test_text_over_excel_limit_fails() {
        let records = vec![OcrRecord::new(
            "long.jpg",
            "long.jpg",
            OcrOutcome::RawText("x".repeat(40_000)),
        )];
        let result = generate_excel_buffer(&flatten_records(&records));
        assert!(matches!(result, Err(Error::Excel(_))));
    }
}
