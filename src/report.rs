//! 結果の表示とJSON出力

use crate::error::Result;
use crate::update::{FileReport, SummaryFormatting};
use budgetinator_common::{RowClassification, UpdateReport};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// 一括処理の失敗
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailure {
    pub file: PathBuf,
    pub error: String,
}

/// 一括処理の結果
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub files: Vec<FileReport>,
    pub failures: Vec<BatchFailure>,
}

pub fn print_update_report(report: &UpdateReport) {
    println!("  {}:", report.summary_sheet);
    for t in &report.transcriptions {
        println!(
            "    ✔ {} → 行{} ({}セル)",
            t.sheet_name, t.target_row, t.cells_written
        );
    }
    print_rows(&report.formatting.rows.iter().map(|r| (r.row, r.classification)).collect::<Vec<_>>());

    for warning in &report.warnings {
        println!("    ⚠ {}", warning);
    }
    for failure in &report.formatting.failures {
        println!("    ⚠ {}", failure);
    }
    if report.cancelled {
        println!("    ⚠ 中止されました（{}件まで処理）", report.partners_updated);
    }
}

pub fn print_formatting(formatting: &SummaryFormatting) {
    println!("  {}:", formatting.summary_sheet);
    print_rows(
        &formatting
            .report
            .rows
            .iter()
            .map(|r| (r.row, r.classification))
            .collect::<Vec<_>>(),
    );
    for failure in &formatting.report.failures {
        println!("    ⚠ {}", failure);
    }
}

fn print_rows(rows: &[(u32, RowClassification)]) {
    if rows.is_empty() {
        return;
    }
    let count = |c: RowClassification| rows.iter().filter(|(_, rc)| *rc == c).count();
    println!(
        "    書式: 完了 {} / 一部入力 {} / 未入力 {}",
        count(RowClassification::Complete),
        count(RowClassification::Partial),
        count(RowClassification::Empty)
    );
}

pub fn print_file_report(report: &FileReport) {
    for update in &report.updates {
        print_update_report(update);
    }
    for formatting in &report.formatting {
        print_formatting(formatting);
    }
    if let Some(backup) = &report.backup {
        println!("  バックアップ: {}", backup.display());
    }
}

/// 結果をJSONで保存
pub fn write_json_report<T: Serialize>(path: &Path, report: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_json_report() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reports").join("batch.json");

        let report = BatchReport {
            files: Vec::new(),
            failures: vec![BatchFailure {
                file: PathBuf::from("broken.xlsx"),
                error: "ワークブック読み込みエラー".to_string(),
            }],
        };
        write_json_report(&path, &report).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["failures"][0]["file"], "broken.xlsx");
        assert!(value["files"].as_array().unwrap().is_empty());
    }
}
