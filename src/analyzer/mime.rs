use std::path::Path;

const FALLBACK_MIME_TYPE: &str = "image/jpeg";

/// 画像のMIMEタイプを判定
///
/// 中身のシグネチャ → 拡張子 → `image/jpeg` の順。
pub fn detect_mime_type(path: &Path, bytes: &[u8]) -> &'static str {
    infer::get(bytes)
        .map(|kind| kind.mime_type())
        .filter(|mime| mime.starts_with("image/"))
        .or_else(|| {
            mime_guess::from_path(path)
                .first_raw()
                .filter(|mime| mime.starts_with("image/"))
        })
        .unwrap_or(FALLBACK_MIME_TYPE)
}
