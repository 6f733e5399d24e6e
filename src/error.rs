use budgetinator_common::ValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BudgetinatorError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("ワークブック読み込みエラー: {0}")]
    WorkbookRead(#[from] calamine::XlsxError),

    #[error("ワークブック保存エラー: {0}")]
    WorkbookWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("ワークブックの検証に失敗: {0}")]
    Validation(#[from] ValidationError),

    #[error("対応表エラー: {0}")]
    Mapping(#[from] budgetinator_common::Error),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("入力エラー: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("ワークブックが見つかりません: {0}")]
    NoWorkbooksFound(String),

    #[error("処理を中止しました")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, BudgetinatorError>;
