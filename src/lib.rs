//! Project Budgetinator
//!
//! 予算ワークブック（xlsx）の読み書きとCLIの処理。
//! 転記・書式設定のロジックは budgetinator-common にある。

pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod excel;
pub mod logging;
pub mod progress;
pub mod report;
pub mod scanner;
pub mod update;
