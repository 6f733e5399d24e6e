//! xlsxファイルの読み書き
//!
//! 読み込みは calamine、保存は rust_xlsxwriter。

pub mod reader;
pub mod writer;

pub use reader::load_workbook;
pub use writer::save_workbook;
