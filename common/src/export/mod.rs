//! xlsx書き出し用の変換（CLIの保存処理から使用）

#[cfg(feature = "excel")]
pub mod excel_core;
