use crate::error::{OcrError, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 対応する画像拡張子（フォルダスキャン時はこの順にグループ化）
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub path: PathBuf,
    pub file_name: String,
}

impl ImageRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self { path, file_name }
    }

    /// 同一性判定用のキー（正規化済み絶対パス）
    fn identity(&self) -> PathBuf {
        std::fs::canonicalize(&self.path).unwrap_or_else(|_| self.path.clone())
    }
}

/// 対応拡張子のグループ番号（大文字小文字は区別しない）
fn extension_group(path: &Path) -> Option<usize> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    IMAGE_EXTENSIONS.iter().position(|&e| e == ext)
}

pub fn is_supported_image(path: &Path) -> bool {
    extension_group(path).is_some()
}

/// フォルダ直下の画像を列挙
///
/// 拡張子グループ（jpg, jpeg, png, bmp, gif の順）ごとに、グループ内はファイル名順。
pub fn scan_folder(folder: &Path) -> Result<Vec<ImageRef>> {
    if !folder.is_dir() {
        return Err(OcrError::FolderNotFound(folder.display().to_string()));
    }

    let mut grouped: Vec<Vec<ImageRef>> = vec![Vec::new(); IMAGE_EXTENSIONS.len()];

    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)  // 直下のみ（再帰しない）
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        if let Some(group) = extension_group(path) {
            grouped[group].push(ImageRef::new(path));
        }
    }

    Ok(grouped.into_iter().flatten().collect())
}

/// 画像の選択リスト
///
/// 追加順を保持し、同じパスの画像は1度だけ含める。
#[derive(Debug, Clone, Default)]
pub struct ImageSelection {
    images: Vec<ImageRef>,
    seen: HashSet<PathBuf>,
}

impl ImageSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// ファイルを追加（非対応の拡張子は無視）。追加された件数を返す
    pub fn add_files<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut added = 0;
        for path in paths {
            let image = ImageRef::new(path);
            if !is_supported_image(&image.path) {
                tracing::debug!(path = %image.path.display(), "対応していない拡張子のためスキップ");
                continue;
            }
            if self.push(image) {
                added += 1;
            }
        }
        added
    }

    /// フォルダ直下の画像を追加。追加された件数を返す
    pub fn add_folder(&mut self, folder: &Path) -> Result<usize> {
        let images = scan_folder(folder)?;
        Ok(images.into_iter().filter(|img| self.push(img.clone())).count())
    }

    pub fn remove(&mut self, index: usize) -> Option<ImageRef> {
        if index >= self.images.len() {
            return None;
        }
        let image = self.images.remove(index);
        self.seen.remove(&image.identity());
        Some(image)
    }

    pub fn clear(&mut self) {
        self.images.clear();
        self.seen.clear();
    }

    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    fn push(&mut self, image: ImageRef) -> bool {
        if self.seen.insert(image.identity()) {
            self.images.push(image);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_is_supported_image() {
        assert!(is_supported_image(Path::new("a.jpg")));
        assert!(is_supported_image(Path::new("a.JPG")));
        assert!(is_supported_image(Path::new("a.jpeg")));
        assert!(is_supported_image(Path::new("a.png")));
        assert!(is_supported_image(Path::new("a.bmp")));
        assert!(is_supported_image(Path::new("a.gif")));
        assert!(!is_supported_image(Path::new("a.txt")));
        assert!(!is_supported_image(Path::new("a.webp")));
        assert!(!is_supported_image(Path::new("jpg")));
    }

    #[test]
    fn test_scan_folder_not_found() {
        let result = scan_folder(Path::new("/nonexistent/folder"));
        assert!(matches!(result, Err(OcrError::FolderNotFound(_))));
    }

    #[test]
    fn test_scan_folder_filters_extensions() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("a.jpg")).unwrap();
        File::create(dir.path().join("b.png")).unwrap();
        File::create(dir.path().join("c.txt")).unwrap();

        let names: Vec<String> = scan_folder(dir.path())
            .unwrap()
            .into_iter()
            .map(|img| img.file_name)
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.png"]);
    }

    #[test]
    fn test_scan_folder_groups_by_extension() {
        let dir = tempdir().unwrap();
        for name in ["z.gif", "a.png", "m.jpg", "b.jpeg", "c.bmp", "a.jpg"] {
            File::create(dir.path().join(name)).unwrap();
        }

        let names: Vec<String> = scan_folder(dir.path())
            .unwrap()
            .into_iter()
            .map(|img| img.file_name)
            .collect();
        assert_eq!(names, vec!["a.jpg", "m.jpg", "b.jpeg", "a.png", "c.bmp", "z.gif"]);
    }

    #[test]
    fn test_scan_folder_is_not_recursive() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        File::create(dir.path().join("sub").join("inner.jpg")).unwrap();
        File::create(dir.path().join("top.jpg")).unwrap();

        let images = scan_folder(dir.path()).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].file_name, "top.jpg");
    }

    #[test]
    fn test_selection_dedupes_and_keeps_order() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.jpg");
        let b = dir.path().join("b.png");
        File::create(&a).unwrap();
        File::create(&b).unwrap();

        let mut selection = ImageSelection::new();
        assert_eq!(selection.add_files([b.clone(), a.clone(), dir.path().join("notes.txt")]), 2);
        assert_eq!(selection.add_files([a.clone()]), 0);
        assert_eq!(selection.add_folder(dir.path()).unwrap(), 0);

        let names: Vec<&str> = selection.images().iter().map(|i| i.file_name.as_str()).collect();
        assert_eq!(names, vec!["b.png", "a.jpg"]);
    }

    #[test]
    fn test_selection_remove_and_clear() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.jpg");
        File::create(&a).unwrap();

        let mut selection = ImageSelection::new();
        selection.add_files([a.clone()]);
        assert_eq!(selection.remove(0).map(|i| i.file_name), Some("a.jpg".to_string()));
        assert!(selection.remove(0).is_none());

        // 削除後は再追加できる
        assert_eq!(selection.add_files([a]), 1);
        selection.clear();
        assert!(selection.is_empty());
    }
}
