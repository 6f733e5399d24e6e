//! Project Budgetinator Common Library
//!
//! パートナーシートから集計シートへの転記と、入力状況に応じた書式設定。
//! xlsxファイルの入出力に依存しないワークブックモデル上で動作する。

pub mod cell_ref;
pub mod classifier;
pub mod error;
pub mod export;
pub mod formula;
pub mod mapping;
pub mod orchestrator;
pub mod partner;
pub mod style;
pub mod transcriber;
pub mod workbook;

pub use cell_ref::{CellRef, ColumnRange};
pub use classifier::{classify, RowAnalysis, RowClassification};
pub use error::{CellAccessError, Error, Result, StyleApplicationError, ValidationError};
pub use mapping::{CellMappingTable, SummaryKind};
pub use orchestrator::{
    CancelFlag, NoopObserver, UpdateObserver, UpdateOptions, UpdateOrchestrator, UpdatePhase,
    UpdateReport,
};
pub use partner::{discover_partners, PartnerSheet};
pub use style::{StyleApplier, StyleDefinition, StylePalette};
pub use transcriber::{RowTranscriber, TranscribeMode, TranscriptionReport};
pub use workbook::{Cell, CellValue, MergedRegion, SheetAccess, Workbook, Worksheet};
