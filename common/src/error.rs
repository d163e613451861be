//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    /// xlsxの生成失敗（セル文字数・列数の上限超過など）
    #[error("Excel error: {0}")]
    Excel(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_excel() {
        let error = Error::Excel("シート名設定エラー".to_string());
        assert_eq!(format!("{}", error), "Excel error: シート名設定エラー");
    }

    #[test]
    fn test_error_debug() {
        let debug = format!("{:?}", Error::Excel("テスト".to_string()));
        assert!(debug.contains("Excel"));
        assert!(debug.contains("テスト"));
    }
}
