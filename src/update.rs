//! ワークブック1件分の更新処理
//!
//! 読み込み → 転記・書式設定 → バックアップ → 保存

use crate::backup::create_backup;
use crate::config::Config;
use crate::error::{BudgetinatorError, Result};
use crate::excel::{load_workbook, save_workbook};
use budgetinator_common::orchestrator::FormattingReport;
use budgetinator_common::{
    CellMappingTable, PartnerSheet, StylePalette, SummaryKind, UpdateObserver, UpdateOptions,
    UpdateOrchestrator, UpdateReport, ValidationError, Workbook,
};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// 更新対象の集計シート
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SummaryTarget {
    Budget,
    Pm,
    /// ワークブックにある集計シートすべて
    #[default]
    All,
}

impl SummaryTarget {
    pub fn kinds(&self) -> &'static [SummaryKind] {
        match self {
            SummaryTarget::Budget => &[SummaryKind::BudgetOverview],
            SummaryTarget::Pm => &[SummaryKind::PmOverview],
            SummaryTarget::All => &SummaryKind::ALL,
        }
    }
}

impl From<SummaryKind> for SummaryTarget {
    fn from(kind: SummaryKind) -> Self {
        match kind {
            SummaryKind::BudgetOverview => SummaryTarget::Budget,
            SummaryKind::PmOverview => SummaryTarget::Pm,
        }
    }
}

impl std::str::FromStr for SummaryTarget {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" | "both" => Ok(SummaryTarget::All),
            other => other.parse::<SummaryKind>().map(SummaryTarget::from),
        }
    }
}

impl std::fmt::Display for SummaryTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryTarget::Budget => write!(f, "budget"),
            SummaryTarget::Pm => write!(f, "pm"),
            SummaryTarget::All => write!(f, "all"),
        }
    }
}

/// 実行する処理
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// 転記と書式設定
    Update,
    /// 書式設定のみ
    Format,
    /// 書式の解除
    ClearFormat,
}

/// 更新ジョブ（対応表・オプション）
#[derive(Debug, Clone)]
pub struct UpdateJob {
    pub tables: Vec<CellMappingTable>,
    /// false の場合、集計シートがないワークブックは該当シートをスキップ
    pub explicit_target: bool,
    pub options: UpdateOptions,
    pub palette: StylePalette,
    pub backup: bool,
}

impl UpdateJob {
    /// 設定とコマンドライン指定からジョブを構築
    ///
    /// `mapping` はカスタム対応表（集計シートを1つ指定した場合のみ）。
    pub fn new(target: Option<SummaryTarget>, mapping: Option<&Path>, config: &Config) -> Result<Self> {
        let explicit_target = target.is_some();
        let target = target
            .or(config.default_summary.map(SummaryTarget::from))
            .unwrap_or_default();
        let kinds = target.kinds();

        if mapping.is_some() && kinds.len() != 1 {
            return Err(BudgetinatorError::Config(
                "--mapping は --summary budget または pm と併用してください".into(),
            ));
        }

        let tables = kinds
            .iter()
            .map(|&kind| load_table(kind, mapping.or(config.mapping_for(kind))))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            tables,
            explicit_target,
            options: UpdateOptions {
                mode: config.transcribe_mode(),
                partner: None,
                skip_formatting: !config.apply_formatting,
            },
            palette: config.palette.clone(),
            backup: config.backup_before_save,
        })
    }

    /// ワークブックに存在する集計シートの対応表
    fn tables_for<'a>(&'a self, workbook: &Workbook) -> Result<Vec<&'a CellMappingTable>> {
        if self.explicit_target {
            return Ok(self.tables.iter().collect());
        }

        let present: Vec<&CellMappingTable> = self
            .tables
            .iter()
            .filter(|t| workbook.sheet(&t.summary_sheet).is_some())
            .collect();

        match (present.is_empty(), self.tables.first()) {
            (true, Some(first)) => Err(ValidationError::MissingSummarySheet(first.summary_sheet.clone()).into()),
            _ => Ok(present),
        }
    }
}

/// 対応表を読み込む（指定がなければ組み込み表）
pub fn load_table(kind: SummaryKind, custom: Option<&Path>) -> Result<CellMappingTable> {
    let table = match custom {
        Some(path) => {
            if !path.exists() {
                return Err(BudgetinatorError::FileNotFound(path.display().to_string()));
            }
            CellMappingTable::from_file(path)?
        }
        None => kind.builtin_table().clone(),
    };
    // 起動時に参照をすべて検証
    table.resolve()?;
    Ok(table)
}

/// 集計シートごとの書式設定結果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryFormatting {
    pub summary_sheet: String,
    #[serde(flatten)]
    pub report: FormattingReport,
}

/// ファイル1件分の結果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub file: PathBuf,
    pub output: PathBuf,
    pub backup: Option<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub updates: Vec<UpdateReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub formatting: Vec<SummaryFormatting>,
}

impl FileReport {
    pub fn partners_updated(&self) -> usize {
        self.updates.iter().map(|u| u.partners_updated).sum()
    }

    pub fn cancelled(&self) -> bool {
        self.updates.iter().any(|u| u.cancelled)
    }
}

/// メモリ上のワークブックを更新
pub fn update_workbook(
    workbook: &mut Workbook,
    job: &UpdateJob,
    observer: &mut dyn UpdateObserver,
) -> Result<Vec<UpdateReport>> {
    let mut reports = Vec::new();
    for table in job.tables_for(workbook)? {
        let report = UpdateOrchestrator::new(table, &job.palette).run(workbook, &job.options, observer)?;
        info!("{}: {} partner(s) updated", report.summary_sheet, report.partners_updated);

        let cancelled = report.cancelled;
        reports.push(report);
        if cancelled {
            break;
        }
    }
    Ok(reports)
}

/// 書式設定のみ（clear: true で解除）
pub fn format_workbook(workbook: &mut Workbook, job: &UpdateJob, clear: bool) -> Result<Vec<SummaryFormatting>> {
    let mut results = Vec::new();
    for table in job.tables_for(workbook)? {
        let orchestrator = UpdateOrchestrator::new(table, &job.palette);
        let report = if clear {
            orchestrator.clear_formatting(workbook, job.options.partner)?
        } else {
            orchestrator.format_only(workbook, job.options.partner)?
        };
        results.push(SummaryFormatting {
            summary_sheet: table.summary_sheet.clone(),
            report,
        });
    }
    Ok(results)
}

/// 集計シートごとの検出パートナー
pub fn list_partners<'a>(
    workbook: &Workbook,
    job: &'a UpdateJob,
) -> Result<Vec<(&'a CellMappingTable, Vec<PartnerSheet>)>> {
    let mut listing = Vec::new();
    for table in job.tables_for(workbook)? {
        let partners = UpdateOrchestrator::new(table, &job.palette).partners(workbook)?;
        listing.push((table, partners));
    }
    Ok(listing)
}

/// ファイルを読み込み、処理して保存
///
/// 上書き保存の場合、設定に従ってバックアップを作成する。
/// キャンセルされた場合は保存しない。
pub fn process_file(
    input: &Path,
    output: &Path,
    job: &UpdateJob,
    action: Action,
    observer: &mut dyn UpdateObserver,
) -> Result<FileReport> {
    let mut workbook = load_workbook(input)?;

    let mut report = FileReport {
        file: input.to_path_buf(),
        output: output.to_path_buf(),
        backup: None,
        updates: Vec::new(),
        formatting: Vec::new(),
    };

    match action {
        Action::Update => report.updates = update_workbook(&mut workbook, job, observer)?,
        Action::Format => report.formatting = format_workbook(&mut workbook, job, false)?,
        Action::ClearFormat => report.formatting = format_workbook(&mut workbook, job, true)?,
    }

    if report.cancelled() {
        return Err(BudgetinatorError::Cancelled);
    }

    if job.backup && same_file(input, output) {
        report.backup = Some(create_backup(input)?);
    }
    save_workbook(&workbook, output)?;

    Ok(report)
}

/// 同じファイルを指すか（"./a.xlsx" や絶対パスも同一とみなす）
pub fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
