use crate::backup::is_backup_file;
use crate::error::{BudgetinatorError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct WorkbookFile {
    pub path: PathBuf,
    pub file_name: String,
}

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "XLSX", "XLSM"];

/// フォルダ内のワークブックを列挙
///
/// Excelのロックファイル（~$で始まる）とバックアップは除外する。
pub fn scan_folder(folder: &Path, recursive: bool) -> Result<Vec<WorkbookFile>> {
    if !folder.is_dir() {
        return Err(BudgetinatorError::FolderNotFound(folder.display().to_string()));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut workbooks = Vec::new();

    for entry in WalkDir::new(folder)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() || !is_workbook_file(path) {
            continue;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        workbooks.push(WorkbookFile {
            path: path.to_path_buf(),
            file_name,
        });
    }

    // パス順でソート
    workbooks.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(workbooks)
}

fn is_workbook_file(path: &Path) -> bool {
    let has_extension = path
        .extension()
        .map(|ext| WORKBOOK_EXTENSIONS.iter().any(|&e| e == ext.to_string_lossy()))
        .unwrap_or(false);
    let is_lock_file = path
        .file_name()
        .map(|n| n.to_string_lossy().starts_with("~$"))
        .unwrap_or(false);

    has_extension && !is_lock_file && !is_backup_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::tempdir;

    #[test]
    fn test_is_workbook_file() {
        assert!(is_workbook_file(Path::new("budget.xlsx")));
        assert!(is_workbook_file(Path::new("BUDGET.XLSX")));
        assert!(is_workbook_file(Path::new("macro.xlsm")));
        assert!(!is_workbook_file(Path::new("~$budget.xlsx")));
        assert!(!is_workbook_file(Path::new("budget.xls")));
        assert!(!is_workbook_file(Path::new("notes.txt")));
        assert!(!is_workbook_file(Path::new("budget_backup_20260101_120000.xlsx")));
    }

    #[test]
    fn test_scan_folder_not_found() {
        let result = scan_folder(Path::new("/nonexistent/folder"), false);
        assert!(matches!(result, Err(BudgetinatorError::FolderNotFound(_))));
    }

    #[test]
    fn test_scan_folder_sorted() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("c.xlsx")).unwrap();
        File::create(dir.path().join("a.xlsx")).unwrap();
        File::create(dir.path().join("b.xlsm")).unwrap();
        File::create(dir.path().join("~$a.xlsx")).unwrap();
        File::create(dir.path().join("readme.txt")).unwrap();

        let result = scan_folder(dir.path(), false).unwrap();
        let names: Vec<&str> = result.iter().map(|w| w.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.xlsx", "b.xlsm", "c.xlsx"]);
    }

    #[test]
    fn test_scan_recursive() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("2025");
        fs::create_dir_all(&sub).unwrap();
        File::create(dir.path().join("top.xlsx")).unwrap();
        File::create(sub.join("nested.xlsx")).unwrap();

        assert_eq!(scan_folder(dir.path(), false).unwrap().len(), 1);
        assert_eq!(scan_folder(dir.path(), true).unwrap().len(), 2);
    }
}
