//! 集計シート更新の全体制御
//!
//! ## 処理フロー
//! 1. 検証（集計シート・対応表・パートナーシートの存在）: 失敗時は何も書き込まない
//! 2. パートナーシートの検出（番号順）
//! 3. 転記（1パートナーの失敗で全体を止めない。キャンセルはパートナー間でのみ確認）
//! 4. 書式設定（対象行の分類と書式適用）
//! 5. 結果レポート

use crate::classifier::{classify, RowClassification};
use crate::error::{StyleApplicationError, ValidationError};
use crate::mapping::{CellMappingTable, ResolvedTable};
use crate::partner::{discover_partners, is_valid_partner, PartnerSheet};
use crate::style::{StyleApplier, StylePalette};
use crate::transcriber::{RowTranscriber, TranscribeMode, TranscriptionReport};
use crate::workbook::{SheetAccess, Workbook, Worksheet};
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 処理段階
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdatePhase {
    Idle,
    Validating,
    Discovering,
    Transcribing,
    Formatting,
    Completed(usize),
    Failed(ValidationError),
}

/// 進捗通知・キャンセル確認の受け口（UI側が実装する）
pub trait UpdateObserver {
    fn on_phase(&mut self, _phase: &UpdatePhase) {}

    fn on_partner_start(&mut self, _partner: &PartnerSheet, _index: usize, _total: usize) {}

    fn on_partner_done(&mut self, _report: &TranscriptionReport) {}

    /// パートナーの処理の合間に確認される
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// 何もしないオブザーバー
pub struct NoopObserver;

impl UpdateObserver for NoopObserver {}

/// 別スレッドから立てられるキャンセルフラグ
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl UpdateObserver for CancelFlag {
    fn is_cancelled(&self) -> bool {
        CancelFlag::is_cancelled(self)
    }
}

/// 更新オプション
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    pub mode: TranscribeMode,
    /// 指定時はこのパートナーのみ更新（追加・編集直後の更新）
    pub partner: Option<u32>,
    pub skip_formatting: bool,
}

/// 行ごとの書式設定結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowFormatting {
    pub row: u32,
    pub classification: RowClassification,
    pub filled: usize,
    pub styled: usize,
}

/// 書式設定の結果
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattingReport {
    pub rows: Vec<RowFormatting>,
    pub failures: Vec<String>,
}

/// 更新結果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReport {
    pub summary_sheet: String,
    pub partners_updated: usize,
    pub transcriptions: Vec<TranscriptionReport>,
    pub formatting: FormattingReport,
    pub warnings: Vec<String>,
    pub cancelled: bool,
}

/// 更新処理
pub struct UpdateOrchestrator<'a> {
    table: &'a CellMappingTable,
    palette: &'a StylePalette,
}

impl<'a> UpdateOrchestrator<'a> {
    pub fn new(table: &'a CellMappingTable, palette: &'a StylePalette) -> Self {
        Self { table, palette }
    }

    /// 転記と書式設定を実行
    ///
    /// 検証エラーのみ `Err` を返す。それ以外の失敗はレポートに記録する。
    pub fn run(
        &self,
        workbook: &mut Workbook,
        options: &UpdateOptions,
        observer: &mut dyn UpdateObserver,
    ) -> Result<UpdateReport, ValidationError> {
        observer.on_phase(&UpdatePhase::Validating);

        let (resolved, partners) = match self.validate(workbook, options.partner) {
            Ok(validated) => validated,
            Err(e) => {
                warn!("{}", e);
                observer.on_phase(&UpdatePhase::Failed(e.clone()));
                return Err(e);
            }
        };

        observer.on_phase(&UpdatePhase::Discovering);
        let targets: Vec<PartnerSheet> = match options.partner {
            Some(number) => partners.into_iter().filter(|p| p.number == number).collect(),
            None => partners,
        };
        info!(
            "{}: {} partner sheet(s) to update",
            resolved.summary_sheet,
            targets.len()
        );

        observer.on_phase(&UpdatePhase::Transcribing);
        let transcriber = RowTranscriber::new(&resolved, options.mode);
        let mut report = UpdateReport {
            summary_sheet: resolved.summary_sheet.clone(),
            partners_updated: 0,
            transcriptions: Vec::new(),
            formatting: FormattingReport::default(),
            warnings: Vec::new(),
            cancelled: false,
        };

        let total = targets.len();
        let mut affected_rows = Vec::new();
        for (index, partner) in targets.iter().enumerate() {
            if observer.is_cancelled() {
                info!("update cancelled after {} partner(s)", report.partners_updated);
                report.cancelled = true;
                break;
            }
            observer.on_partner_start(partner, index, total);

            let Some((source, summary)) =
                workbook.sheet_pair_mut(&partner.sheet_name, &resolved.summary_sheet)
            else {
                let message = format!("{}: sheet not accessible", partner.sheet_name);
                warn!("{}", message);
                report.warnings.push(message);
                continue;
            };

            match transcriber.transcribe(source, summary, partner.number) {
                Ok(transcription) => {
                    for problem in transcription.problems() {
                        report.warnings.push(format!(
                            "{} {} -> {}: {:?}",
                            transcription.sheet_name, problem.source, problem.target, problem.status
                        ));
                    }
                    affected_rows.push(transcription.target_row);
                    report.partners_updated += 1;
                    observer.on_partner_done(&transcription);
                    report.transcriptions.push(transcription);
                }
                Err(e) => {
                    let message = format!("{}: {}", partner.sheet_name, e);
                    warn!("{}", message);
                    report.warnings.push(message);
                }
            }
        }

        if !options.skip_formatting {
            observer.on_phase(&UpdatePhase::Formatting);
            if let Some(summary) = workbook.sheet_mut(&resolved.summary_sheet) {
                report.formatting = self.format_rows(summary, &resolved, &affected_rows);
            }
        }

        observer.on_phase(&UpdatePhase::Completed(report.partners_updated));
        Ok(report)
    }

    /// 書式設定のみ実行（転記なし）
    pub fn format_only(
        &self,
        workbook: &mut Workbook,
        partner: Option<u32>,
    ) -> Result<FormattingReport, ValidationError> {
        let (resolved, partners) = self.validate(workbook, partner)?;
        let rows = self.rows_for(&resolved, &partners, partner);
        let summary = workbook
            .sheet_mut(&resolved.summary_sheet)
            .ok_or_else(|| ValidationError::MissingSummarySheet(resolved.summary_sheet.clone()))?;
        Ok(self.format_rows(summary, &resolved, &rows))
    }

    /// 書式を解除
    pub fn clear_formatting(
        &self,
        workbook: &mut Workbook,
        partner: Option<u32>,
    ) -> Result<FormattingReport, ValidationError> {
        let (resolved, partners) = self.validate(workbook, partner)?;
        let rows = self.rows_for(&resolved, &partners, partner);
        let summary = workbook
            .sheet_mut(&resolved.summary_sheet)
            .ok_or_else(|| ValidationError::MissingSummarySheet(resolved.summary_sheet.clone()))?;

        let applier = StyleApplier::new(self.palette);
        let mut report = FormattingReport::default();
        for row in rows {
            let cleared = applier.clear(summary, row, &resolved.format_range);
            report.failures.extend(cleared.failures.iter().map(|e| e.to_string()));
        }
        Ok(report)
    }

    /// 検出されたパートナーシート（検証込み）
    pub fn partners(&self, workbook: &Workbook) -> Result<Vec<PartnerSheet>, ValidationError> {
        self.validate(workbook, None).map(|(_, partners)| partners)
    }

    fn validate(
        &self,
        workbook: &Workbook,
        partner: Option<u32>,
    ) -> Result<(ResolvedTable, Vec<PartnerSheet>), ValidationError> {
        debug!("validating workbook for {}", self.table.summary_sheet);
        let resolved = self.table.resolve()?;

        if workbook.sheet(&resolved.summary_sheet).is_none() {
            return Err(ValidationError::MissingSummarySheet(resolved.summary_sheet.clone()));
        }

        let partners = discover_partners(workbook.sheet_names());
        if partners.is_empty() {
            return Err(ValidationError::NoPartnerSheets);
        }

        if let Some(number) = partner {
            if !is_valid_partner(number) {
                return Err(ValidationError::PartnerOutOfRange(number));
            }
            if !partners.iter().any(|p| p.number == number) {
                return Err(ValidationError::PartnerNotFound(number));
            }
        }

        Ok((resolved, partners))
    }

    fn rows_for(&self, resolved: &ResolvedTable, partners: &[PartnerSheet], partner: Option<u32>) -> Vec<u32> {
        partners
            .iter()
            .filter(|p| partner.map(|n| n == p.number).unwrap_or(true))
            .map(|p| resolved.target_row(p.number))
            .collect()
    }

    fn format_rows(&self, summary: &mut Worksheet, resolved: &ResolvedTable, rows: &[u32]) -> FormattingReport {
        let applier = StyleApplier::new(self.palette);
        let mut report = FormattingReport::default();

        for &row in rows {
            let analysis = classify(&*summary, row, &resolved.format_range);
            let styled = applier.apply(summary, &resolved.format_range, &analysis);
            debug!("{} row {}: {}", summary.name(), row, analysis.classification);

            report
                .failures
                .extend(styled.failures.iter().map(StyleApplicationError::to_string));
            report.rows.push(RowFormatting {
                row,
                classification: analysis.classification,
                filled: analysis.filled_count(),
                styled: styled.styled,
            });
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell_ref::CellRef;
    use crate::mapping::SummaryKind;
    use crate::workbook::{CellValue, MergedRegion};

    fn cell(s: &str) -> CellRef {
        CellRef::parse(s).unwrap()
    }

    fn partner_sheet(name: &str, acronym: &str, wp_count: u32) -> Worksheet {
        let mut sheet = Worksheet::new(name);
        sheet.set_value(cell("D4"), acronym.into()).unwrap();
        for i in 0..wp_count {
            sheet
                .set_value(CellRef::new(7 + i, 13).unwrap(), 100.0.into())
                .unwrap();
        }
        sheet
    }

    fn workbook() -> Workbook {
        let mut wb = Workbook::new();
        wb.add_sheet(Worksheet::new("Budget Overview"));
        wb.add_sheet(partner_sheet("P2-ACME", "PARTNER-A", 15));
        wb.add_sheet(partner_sheet("P3-BETA", "PARTNER-B", 5));
        wb.add_sheet(partner_sheet("P4-GAMMA", "PARTNER-C", 0));
        wb
    }

    fn summary(wb: &Workbook) -> &Worksheet {
        wb.sheet("Budget Overview").unwrap()
    }

    /// 記録用オブザーバー
    #[derive(Default)]
    struct Recorder {
        phases: Vec<UpdatePhase>,
        started: Vec<u32>,
        cancel_after: Option<usize>,
    }

    impl UpdateObserver for Recorder {
        fn on_phase(&mut self, phase: &UpdatePhase) {
            self.phases.push(phase.clone());
        }
        fn on_partner_start(&mut self, partner: &PartnerSheet, _index: usize, _total: usize) {
            self.started.push(partner.number);
        }
        fn is_cancelled(&self) -> bool {
            self.cancel_after.map(|n| self.started.len() >= n).unwrap_or(false)
        }
    }

    #[test]
    fn test_full_update() {
        let table = CellMappingTable::budget_overview();
        let palette = StylePalette::default();
        let mut wb = workbook();
        let mut recorder = Recorder::default();

        let report = UpdateOrchestrator::new(&table, &palette)
            .run(&mut wb, &UpdateOptions::default(), &mut recorder)
            .unwrap();

        assert_eq!(report.partners_updated, 3);
        assert!(!report.cancelled);
        assert_eq!(recorder.started, vec![2, 3, 4]);
        assert_eq!(
            recorder.phases,
            vec![
                UpdatePhase::Validating,
                UpdatePhase::Discovering,
                UpdatePhase::Transcribing,
                UpdatePhase::Formatting,
                UpdatePhase::Completed(3),
            ]
        );

        let s = summary(&wb);
        assert_eq!(s.value(cell("B9")).unwrap(), CellValue::Text("PARTNER-A".to_string()));
        assert_eq!(s.value(cell("B10")).unwrap(), CellValue::Text("PARTNER-B".to_string()));

        let classes: Vec<RowClassification> =
            report.formatting.rows.iter().map(|r| r.classification).collect();
        assert_eq!(
            classes,
            vec![
                RowClassification::Complete,
                RowClassification::Partial,
                RowClassification::Empty,
            ]
        );
        assert_eq!(s.style(cell("F9")).unwrap(), palette.complete);
        assert_eq!(s.style(cell("J10")).unwrap(), palette.partial_filled);
        assert_eq!(s.style(cell("K10")).unwrap(), palette.partial_empty);
        assert_eq!(s.style(cell("F11")).unwrap(), palette.empty);
    }

    #[test]
    fn test_missing_summary_sheet_aborts_without_writes() {
        let table = CellMappingTable::pm_overview();
        let palette = StylePalette::default();
        let mut wb = workbook();
        let mut recorder = Recorder::default();

        let err = UpdateOrchestrator::new(&table, &palette)
            .run(&mut wb, &UpdateOptions::default(), &mut recorder)
            .unwrap_err();

        assert_eq!(err, ValidationError::MissingSummarySheet("PM Overview".to_string()));
        assert_eq!(recorder.phases.last(), Some(&UpdatePhase::Failed(err)));
        assert!(summary(&wb).cells().next().is_none());
    }

    #[test]
    fn test_no_partner_sheets() {
        let table = CellMappingTable::budget_overview();
        let palette = StylePalette::default();
        let mut wb = Workbook::new();
        wb.add_sheet(Worksheet::new("Budget Overview"));
        wb.add_sheet(Worksheet::new("P1-Coordinator"));

        let err = UpdateOrchestrator::new(&table, &palette)
            .run(&mut wb, &UpdateOptions::default(), &mut NoopObserver)
            .unwrap_err();
        assert_eq!(err, ValidationError::NoPartnerSheets);
    }

    #[test]
    fn test_malformed_mapping_aborts() {
        let mut table = CellMappingTable::budget_overview();
        table.groups[1].mappings[0].source = "G0".to_string();
        let palette = StylePalette::default();
        let mut wb = workbook();

        let err = UpdateOrchestrator::new(&table, &palette)
            .run(&mut wb, &UpdateOptions::default(), &mut NoopObserver)
            .unwrap_err();
        assert!(matches!(err, ValidationError::MalformedReference(_)));
        assert!(summary(&wb).cells().next().is_none());
    }

    #[test]
    fn test_single_partner_update() {
        let table = CellMappingTable::budget_overview();
        let palette = StylePalette::default();
        let mut wb = workbook();
        let options = UpdateOptions {
            partner: Some(3),
            ..Default::default()
        };

        let report = UpdateOrchestrator::new(&table, &palette)
            .run(&mut wb, &options, &mut NoopObserver)
            .unwrap();

        assert_eq!(report.partners_updated, 1);
        assert_eq!(report.formatting.rows.len(), 1);
        let s = summary(&wb);
        assert_eq!(s.value(cell("B9")).unwrap(), CellValue::Empty);
        assert_eq!(s.value(cell("B10")).unwrap(), CellValue::Text("PARTNER-B".to_string()));
    }

    #[test]
    fn test_single_partner_validation() {
        let table = CellMappingTable::budget_overview();
        let palette = StylePalette::default();
        let orchestrator = UpdateOrchestrator::new(&table, &palette);
        let mut wb = workbook();

        let missing = UpdateOptions {
            partner: Some(9),
            ..Default::default()
        };
        assert_eq!(
            orchestrator.run(&mut wb, &missing, &mut NoopObserver).unwrap_err(),
            ValidationError::PartnerNotFound(9)
        );

        let out_of_range = UpdateOptions {
            partner: Some(21),
            ..Default::default()
        };
        assert_eq!(
            orchestrator.run(&mut wb, &out_of_range, &mut NoopObserver).unwrap_err(),
            ValidationError::PartnerOutOfRange(21)
        );
    }

    #[test]
    fn test_cancel_between_partners() {
        let table = CellMappingTable::budget_overview();
        let palette = StylePalette::default();
        let mut wb = workbook();
        let mut recorder = Recorder {
            cancel_after: Some(1),
            ..Default::default()
        };

        let report = UpdateOrchestrator::new(&table, &palette)
            .run(&mut wb, &UpdateOptions::default(), &mut recorder)
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.partners_updated, 1);
        // 処理済みの行は書式設定される
        assert_eq!(report.formatting.rows.len(), 1);
        assert_eq!(summary(&wb).value(cell("B10")).unwrap(), CellValue::Empty);
    }

    #[test]
    fn test_cancel_flag() {
        let flag = CancelFlag::new();
        let observer_flag = flag.clone();
        assert!(!UpdateObserver::is_cancelled(&observer_flag));
        flag.cancel();
        assert!(UpdateObserver::is_cancelled(&observer_flag));

        let table = CellMappingTable::budget_overview();
        let palette = StylePalette::default();
        let mut wb = workbook();
        let mut observer = observer_flag;
        let report = UpdateOrchestrator::new(&table, &palette)
            .run(&mut wb, &UpdateOptions::default(), &mut observer)
            .unwrap();
        assert!(report.cancelled);
        assert_eq!(report.partners_updated, 0);
    }

    #[test]
    fn test_field_failures_do_not_stop_other_partners() {
        let table = CellMappingTable::budget_overview();
        let palette = StylePalette::default();
        let mut wb = workbook();
        wb.sheet_mut("Budget Overview")
            .unwrap()
            .add_merged_region(MergedRegion::new(cell("B9"), cell("C9")));

        let report = UpdateOrchestrator::new(&table, &palette)
            .run(&mut wb, &UpdateOptions::default(), &mut NoopObserver)
            .unwrap();

        assert_eq!(report.partners_updated, 3);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(summary(&wb).value(cell("B11")).unwrap(), CellValue::Text("PARTNER-C".to_string()));
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let table = CellMappingTable::budget_overview();
        let palette = StylePalette::default();
        let orchestrator = UpdateOrchestrator::new(&table, &palette);
        let mut wb = workbook();

        orchestrator.run(&mut wb, &UpdateOptions::default(), &mut NoopObserver).unwrap();
        let first: Vec<_> = summary(&wb).cells().map(|(k, v)| (*k, v.clone())).collect();
        orchestrator.run(&mut wb, &UpdateOptions::default(), &mut NoopObserver).unwrap();
        let second: Vec<_> = summary(&wb).cells().map(|(k, v)| (*k, v.clone())).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_format_only_and_clear() {
        let kind = SummaryKind::BudgetOverview;
        let palette = StylePalette::default();
        let orchestrator = UpdateOrchestrator::new(kind.builtin_table(), &palette);
        let mut wb = workbook();

        let report = orchestrator.format_only(&mut wb, None).unwrap();
        assert_eq!(report.rows.len(), 3);
        assert!(report.rows.iter().all(|r| r.classification == RowClassification::Empty));
        assert_eq!(summary(&wb).style(cell("F9")).unwrap(), palette.empty);

        orchestrator.clear_formatting(&mut wb, None).unwrap();
        assert!(summary(&wb).cells().next().is_none());
    }

    #[test]
    fn test_partners_listing() {
        let table = CellMappingTable::budget_overview();
        let palette = StylePalette::default();
        let wb = workbook();
        let partners = UpdateOrchestrator::new(&table, &palette).partners(&wb).unwrap();
        let numbers: Vec<u32> = partners.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![2, 3, 4]);
    }
}
