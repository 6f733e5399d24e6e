//! 保存前のバックアップ

use crate::error::Result;
use chrono::Local;
use std::path::{Path, PathBuf};

const BACKUP_MARKER: &str = "_backup_";

/// `<名前>_backup_YYYYMMDD_HHMMSS.<拡張子>` を同じフォルダに作成
pub fn create_backup(path: &Path) -> Result<PathBuf> {
    let backup = backup_path(path, &Local::now().format("%Y%m%d_%H%M%S").to_string());
    std::fs::copy(path, &backup)?;
    Ok(backup)
}

fn backup_path(path: &Path, timestamp: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let file_name = match path.extension() {
        Some(ext) => format!("{}{}{}.{}", stem, BACKUP_MARKER, timestamp, ext.to_string_lossy()),
        None => format!("{}{}{}", stem, BACKUP_MARKER, timestamp),
    };
    path.with_file_name(file_name)
}

/// バックアップファイルかどうか（一括処理の対象外）
pub fn is_backup_file(path: &Path) -> bool {
    path.file_stem()
        .map(|s| s.to_string_lossy().contains(BACKUP_MARKER))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_backup_path() {
        let path = backup_path(Path::new("/data/budget.xlsx"), "20260101_120000");
        assert_eq!(path, PathBuf::from("/data/budget_backup_20260101_120000.xlsx"));
        assert!(is_backup_file(&path));
        assert!(!is_backup_file(Path::new("/data/budget.xlsx")));
    }

    #[test]
    fn test_create_backup_copies_content() {
        let dir = tempdir().unwrap();
        let original = dir.path().join("budget.xlsx");
        std::fs::write(&original, b"workbook").unwrap();

        let backup = create_backup(&original).unwrap();
        assert!(is_backup_file(&backup));
        assert_eq!(std::fs::read(&backup).unwrap(), b"workbook");
        assert!(original.exists());
    }

    #[test]
    fn test_create_backup_missing_source() {
        let dir = tempdir().unwrap();
        assert!(create_backup(&dir.path().join("missing.xlsx")).is_err());
    }
}
