//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use budgetinator_common::ValidationError;
use project_budgetinator::error::BudgetinatorError;
use project_budgetinator::{excel, scanner, update};
use std::path::Path;
use tempfile::tempdir;

/// 存在しないフォルダをスキャンした場合
#[test]
fn test_scan_nonexistent_folder() {
    let result = scanner::scan_folder(Path::new("/nonexistent/path/12345"), false);
    assert!(result.is_err());

    let err = result.unwrap_err();
    assert!(matches!(err, BudgetinatorError::FolderNotFound(_)));
}

/// ワークブックのないフォルダをスキャンした場合
#[test]
fn test_scan_folder_no_workbooks() {
    let dir = tempdir().expect("Failed to create temp dir");

    std::fs::write(dir.path().join("test.txt"), "hello").unwrap();
    std::fs::write(dir.path().join("mapping.json"), "{}").unwrap();

    let result = scanner::scan_folder(dir.path(), false);
    assert!(result.is_ok());
    assert!(result.unwrap().is_empty());
}

/// 存在しないワークブックを読み込んだ場合
#[test]
fn test_load_missing_workbook() {
    let err = excel::load_workbook(Path::new("/nonexistent/budget.xlsx")).unwrap_err();
    assert!(matches!(err, BudgetinatorError::FileNotFound(_)));
}

/// xlsxではないファイルを読み込んだ場合
#[test]
fn test_load_invalid_workbook() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("broken.xlsx");
    std::fs::write(&path, "not a zip archive").unwrap();

    let err = excel::load_workbook(&path).unwrap_err();
    assert!(matches!(err, BudgetinatorError::WorkbookRead(_)));
}

/// 対応表ファイルが不正な場合
#[test]
fn test_invalid_mapping_file() {
    let dir = tempdir().expect("Failed to create temp dir");

    let missing = update::load_table(
        budgetinator_common::SummaryKind::BudgetOverview,
        Some(&dir.path().join("missing.json")),
    );
    assert!(matches!(missing, Err(BudgetinatorError::FileNotFound(_))));

    let path = dir.path().join("mapping.json");
    std::fs::write(&path, "{ invalid").unwrap();
    let invalid = update::load_table(budgetinator_common::SummaryKind::BudgetOverview, Some(&path));
    assert!(matches!(invalid, Err(BudgetinatorError::Mapping(_))));
}

/// 対応表の参照が不正な場合は起動時に検出
#[test]
fn test_malformed_reference_in_mapping() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("mapping.json");
    std::fs::write(
        &path,
        r#"{
            "summarySheet": "Budget Overview",
            "rowOffset": 7,
            "formatRange": "F:T",
            "groups": [{"name": "basic", "mappings": [
                {"field": "partner_acronym", "source": "D0", "targetColumn": "B"}
            ]}]
        }"#,
    )
    .unwrap();

    let err = update::load_table(budgetinator_common::SummaryKind::BudgetOverview, Some(&path)).unwrap_err();
    assert!(matches!(
        err,
        BudgetinatorError::Validation(ValidationError::MalformedReference(_))
    ));
}

/// BudgetinatorErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        BudgetinatorError::Config("テスト設定エラー".to_string()),
        BudgetinatorError::FileNotFound("budget.xlsx".to_string()),
        BudgetinatorError::FolderNotFound("/path/to/folder".to_string()),
        BudgetinatorError::Validation(ValidationError::NoPartnerSheets),
        BudgetinatorError::NoWorkbooksFound("フォルダ".to_string()),
        BudgetinatorError::Cancelled,
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "エラーメッセージが空: {:?}", err);
    }
}

/// 検証エラーのメッセージ確認
#[test]
fn test_validation_error_message() {
    let err: BudgetinatorError = ValidationError::MissingSummarySheet("PM Overview".to_string()).into();
    let display = format!("{}", err);

    assert!(display.contains("検証"));
    assert!(display.contains("PM Overview"));
}

/// IOエラーからの変換
#[test]
fn test_io_error_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: BudgetinatorError = io_err.into();

    assert!(matches!(err, BudgetinatorError::Io(_)));
    let display = format!("{}", err);
    assert!(display.contains("IO"));
}

/// JSONエラーからの変換
#[test]
fn test_json_error_conversion() {
    let json_err = serde_json::from_str::<serde_json::Value>("{ invalid }").unwrap_err();
    let err: BudgetinatorError = json_err.into();

    assert!(matches!(err, BudgetinatorError::JsonParse(_)));
}

/// common::Errorからの変換
#[test]
fn test_common_error_conversion() {
    let common_err = budgetinator_common::Error::Config("設定エラー".to_string());
    let err: BudgetinatorError = common_err.into();

    assert!(matches!(err, BudgetinatorError::Mapping(_)));
    assert!(format!("{}", err).contains("設定エラー"));
}
