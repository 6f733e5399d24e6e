//! パートナーシート → 集計シートへの転記
//!
//! 対応表の各セルを読み取り、集計シートの `パートナー番号 + オフセット` 行に書き込む。
//! 1セルの失敗で転記全体を止めず、結果はフィールドごとに記録する。

use crate::cell_ref::CellRef;
use crate::error::ValidationError;
use crate::formula;
use crate::mapping::{ResolvedMapping, ResolvedTable};
use crate::partner::is_valid_partner;
use crate::workbook::{CellValue, SheetAccess};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// 数式セルの扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TranscribeMode {
    /// 計算結果の値のみコピー
    #[default]
    Values,
    /// 数式をコピーし、参照をコピー先の行に付け替える
    PreserveFormulas,
}

/// フィールドごとの転記結果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum FieldStatus {
    /// 値を書き込んだ
    Written,
    /// 参照を付け替えた数式を書き込んだ
    Formula { formula: String },
    /// 数式を書き換えられず、値を書き込んだ
    FormulaFallback { reason: String },
    /// コピー元が読めず、空にした
    Blanked { reason: String },
    /// コピー先に書き込めなかった
    Failed { reason: String },
}

impl FieldStatus {
    pub fn is_written(&self) -> bool {
        !matches!(self, FieldStatus::Failed { .. })
    }

    pub fn is_problem(&self) -> bool {
        matches!(self, FieldStatus::Blanked { .. } | FieldStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOutcome {
    pub field: String,
    pub source: String,
    pub target: String,
    #[serde(flatten)]
    pub status: FieldStatus,
}

/// 1パートナー分の転記結果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionReport {
    pub partner: u32,
    pub sheet_name: String,
    pub target_row: u32,
    pub cells_written: usize,
    pub fields: Vec<FieldOutcome>,
}

impl TranscriptionReport {
    /// 空にした・書き込めなかったフィールド
    pub fn problems(&self) -> impl Iterator<Item = &FieldOutcome> {
        self.fields.iter().filter(|f| f.status.is_problem())
    }
}

/// 転記処理
pub struct RowTranscriber<'a> {
    table: &'a ResolvedTable,
    mode: TranscribeMode,
}

impl<'a> RowTranscriber<'a> {
    pub fn new(table: &'a ResolvedTable, mode: TranscribeMode) -> Self {
        Self { table, mode }
    }

    pub fn target_row(&self, partner: u32) -> u32 {
        self.table.target_row(partner)
    }

    /// パートナーシートの値を集計シートの対応行に転記
    ///
    /// 書き込み済みセルのロールバックは行わない。
    pub fn transcribe<S, T>(
        &self,
        partner_sheet: &S,
        summary: &mut T,
        partner: u32,
    ) -> Result<TranscriptionReport, ValidationError>
    where
        S: SheetAccess + ?Sized,
        T: SheetAccess + ?Sized,
    {
        if !is_valid_partner(partner) {
            return Err(ValidationError::PartnerOutOfRange(partner));
        }
        let row = self.target_row(partner);

        let mut report = TranscriptionReport {
            partner,
            sheet_name: partner_sheet.name().to_string(),
            target_row: row,
            cells_written: 0,
            fields: Vec::with_capacity(self.table.mappings.len()),
        };

        for mapping in &self.table.mappings {
            let target = CellRef::new(mapping.target_col, row)?;
            let status = self.transcribe_field(partner_sheet, summary, mapping, target);

            if status.is_written() {
                report.cells_written += 1;
            }
            report.fields.push(FieldOutcome {
                field: mapping.field.clone(),
                source: mapping.source.to_string(),
                target: target.to_string(),
                status,
            });
        }

        debug!(
            "{} -> {} row {}: {} cells",
            report.sheet_name,
            summary.name(),
            row,
            report.cells_written
        );
        Ok(report)
    }

    fn transcribe_field<S, T>(
        &self,
        partner_sheet: &S,
        summary: &mut T,
        mapping: &ResolvedMapping,
        target: CellRef,
    ) -> FieldStatus
    where
        S: SheetAccess + ?Sized,
        T: SheetAccess + ?Sized,
    {
        let value = match partner_sheet.value(mapping.source) {
            Ok(CellValue::Error(code)) => {
                let reason = format!("{}!{} contains {}", partner_sheet.name(), mapping.source, code);
                return self.blank(summary, target, reason);
            }
            Ok(value) => value,
            Err(e) => {
                let reason = format!("{}: {}", partner_sheet.name(), e);
                return self.blank(summary, target, reason);
            }
        };

        if self.mode == TranscribeMode::PreserveFormulas {
            if let Some(text) = partner_sheet.formula(mapping.source) {
                match formula::adjust(
                    &text,
                    mapping.source.row(),
                    target.row(),
                    partner_sheet.name(),
                    summary.name(),
                ) {
                    Ok(adjusted) => {
                        return match summary.set_formula(target, &adjusted, value) {
                            Ok(()) => FieldStatus::Formula { formula: adjusted },
                            Err(e) => self.failed(summary.name(), e.to_string()),
                        };
                    }
                    Err(e) => {
                        debug!("formula fallback for {}: {}", mapping.field, e);
                        return match summary.set_value(target, value) {
                            Ok(()) => FieldStatus::FormulaFallback {
                                reason: e.to_string(),
                            },
                            Err(e) => self.failed(summary.name(), e.to_string()),
                        };
                    }
                }
            }
        }

        match summary.set_value(target, value) {
            Ok(()) => FieldStatus::Written,
            Err(e) => self.failed(summary.name(), e.to_string()),
        }
    }

    /// コピー元が読めない場合、コピー先を空にして続行
    fn blank<T: SheetAccess + ?Sized>(&self, summary: &mut T, target: CellRef, reason: String) -> FieldStatus {
        warn!("{}", reason);
        match summary.set_value(target, CellValue::Empty) {
            Ok(()) => FieldStatus::Blanked { reason },
            Err(e) => self.failed(summary.name(), format!("{}; {}", reason, e)),
        }
    }

    fn failed(&self, sheet: &str, reason: String) -> FieldStatus {
        warn!("{}: {}", sheet, reason);
        FieldStatus::Failed { reason }
    }
}
