pub mod excel;

use crate::error::Result;
use gemini_ocr_common::OcrRecord;
use std::path::{Path, PathBuf};

/// Excel保存に失敗したときの保存先
pub const FALLBACK_JSON_PATH: &str = "results.json";

/// 実際に保存した形式と保存先
#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    Spreadsheet(PathBuf),
    JsonFallback { path: PathBuf, reason: String },
}

impl ExportOutcome {
    pub fn path(&self) -> &Path {
        match self {
            ExportOutcome::Spreadsheet(path) => path,
            ExportOutcome::JsonFallback { path, .. } => path,
        }
    }

    /// GUI向けメッセージ
    pub fn message(&self) -> String {
        match self {
            ExportOutcome::Spreadsheet(path) => {
                format!("Processing complete. Results saved to {}", path.display())
            }
            ExportOutcome::JsonFallback { path, reason } => format!(
                "Excel export failed ({}). Results saved to {} instead",
                reason,
                path.display()
            ),
        }
    }
}

/// 結果をExcelに保存。失敗した場合は `fallback_path` にJSONで保存する
///
/// JSONの保存にも失敗した場合のみエラーを返す。
pub fn export_results(
    records: &[OcrRecord],
    output_path: &Path,
    fallback_path: &Path,
) -> Result<ExportOutcome> {
    match excel::generate_excel(records, output_path) {
        Ok(()) => Ok(ExportOutcome::Spreadsheet(output_path.to_path_buf())),
        Err(e) => {
            tracing::warn!(error = %e, "Excel保存に失敗しました。JSONで保存します");
            write_json(records, fallback_path)?;
            Ok(ExportOutcome::JsonFallback {
                path: fallback_path.to_path_buf(),
                reason: e.to_string(),
            })
        }
    }
}

/// フラット化前のレコード配列をJSONで保存
pub fn write_json(records: &[OcrRecord], path: &Path) -> Result<()> {
    create_parent_dir(path)?;
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemini_ocr_common::OcrOutcome;
    use tempfile::tempdir;

    #[test]
    fn test_export_spreadsheet() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out").join("result.xlsx");
        let fallback = dir.path().join("results.json");

        let records = vec![OcrRecord::from_response("a.jpg", "a.jpg", r#"{"a": 1}"#)];
        let outcome = export_results(&records, &output, &fallback).unwrap();

        assert_eq!(outcome, ExportOutcome::Spreadsheet(output.clone()));
        assert!(output.exists());
        assert!(!fallback.exists());
    }

    #[test]
    fn test_export_falls_back_to_json() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("result.xlsx");
        let fallback = dir.path().join("results.json");

        let records = vec![
            OcrRecord::new("long.jpg", "long.jpg", OcrOutcome::RawText("あ".repeat(40_000))),
            OcrRecord::failure("b.jpg", "b.jpg", "boom"),
        ];
        let outcome = export_results(&records, &output, &fallback).unwrap();

        match &outcome {
            ExportOutcome::JsonFallback { path, reason } => {
                assert_eq!(path, &fallback);
                assert!(!reason.is_empty());
            }
            other => panic!("JsonFallback expected: {:?}", other),
        }
        assert_eq!(outcome.path(), fallback.as_path());

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&fallback).unwrap()).unwrap();
        let saved = saved.as_array().unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0]["image_file"], "long.jpg");
        assert_eq!(saved[1]["error"], "boom");
    }

    #[test]
    fn test_outcome_message() {
        let outcome = ExportOutcome::Spreadsheet(PathBuf::from("out.xlsx"));
        assert!(outcome.message().contains("out.xlsx"));
    }
}
