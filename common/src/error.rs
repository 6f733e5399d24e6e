//! エラー型定義
//!
//! - ValidationError: 書き込み前の検証エラー（処理全体を中断）
//! - CellAccessError: セル単位の読み書きエラー（ログ出力してスキップ）
//! - StyleApplicationError: 書式設定エラー（ログ出力してスキップ）
//! - FormulaAdjustmentError: 数式の参照書き換え失敗（値コピーにフォールバック）

use thiserror::Error;

/// 検証エラー（更新前に報告、ワークブックは変更されない）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Summary sheet not found: {0}")]
    MissingSummarySheet(String),

    #[error("No partner sheets (P2..P20) found in workbook")]
    NoPartnerSheets,

    #[error("Malformed cell reference: {0}")]
    MalformedReference(String),

    #[error("Partner sheet not found: P{0}")]
    PartnerNotFound(u32),

    #[error("Partner number out of range (2-20): {0}")]
    PartnerOutOfRange(u32),
}

/// セル読み書きエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CellAccessError {
    #[error("{cell} is inside merged region anchored at {anchor}")]
    MergedCell { cell: String, anchor: String },

    #[error("{cell} is unreadable: {reason}")]
    Unreadable { cell: String, reason: String },
}

/// 書式設定エラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Cannot style {cell}: {reason}")]
pub struct StyleApplicationError {
    pub cell: String,
    pub reason: String,
}

/// 数式の参照書き換えエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormulaAdjustmentError {
    #[error("Not a formula: {0}")]
    NotAFormula(String),

    #[error("Unbalanced string quotes in formula: {0}")]
    UnbalancedQuotes(String),

    #[error("Unterminated sheet name in formula: {0}")]
    UnterminatedSheetName(String),

    #[error("Unbalanced parentheses in formula: {0}")]
    UnbalancedParentheses(String),
}

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Cell access error: {0}")]
    CellAccess(#[from] CellAccessError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
