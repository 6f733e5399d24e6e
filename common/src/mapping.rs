//! セル対応表（パートナーシート → 集計シート）
//!
//! 対応表は起動時に一度だけ構築し、実行中は変更しない。
//! 組み込み表のほか、JSONファイルから読み込むこともできる。

use crate::cell_ref::{column_index, column_letters, CellRef, ColumnRange, MAX_ROW};
use crate::error::{Result, ValidationError};
use crate::partner::MAX_PARTNER;
use serde::{Deserialize, Serialize};

/// 集計シートの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SummaryKind {
    BudgetOverview,
    PmOverview,
}

impl SummaryKind {
    pub const ALL: [SummaryKind; 2] = [SummaryKind::BudgetOverview, SummaryKind::PmOverview];

    pub fn sheet_name(&self) -> &'static str {
        match self {
            SummaryKind::BudgetOverview => "Budget Overview",
            SummaryKind::PmOverview => "PM Overview",
        }
    }

    /// 集計行 = パートナー番号 + オフセット
    pub fn row_offset(&self) -> u32 {
        match self {
            SummaryKind::BudgetOverview => 7,
            SummaryKind::PmOverview => 4,
        }
    }

    /// 組み込みの対応表
    pub fn builtin_table(&self) -> &'static CellMappingTable {
        match self {
            SummaryKind::BudgetOverview => &BUDGET_OVERVIEW_TABLE,
            SummaryKind::PmOverview => &PM_OVERVIEW_TABLE,
        }
    }
}

impl std::str::FromStr for SummaryKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "budget" | "budget-overview" | "budget overview" => Ok(SummaryKind::BudgetOverview),
            "pm" | "pm-overview" | "pm overview" => Ok(SummaryKind::PmOverview),
            _ => Err(format!("Unknown summary: {}. Use budget or pm", s)),
        }
    }
}

impl std::fmt::Display for SummaryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sheet_name())
    }
}

/// 1フィールド分の対応（"G13" → "F"）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellMapping {
    pub field: String,
    pub source: String,
    pub target_column: String,
}

impl CellMapping {
    fn new(field: impl Into<String>, source: impl Into<String>, target_column: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            source: source.into(),
            target_column: target_column.into(),
        }
    }
}

/// 名前付きの対応グループ（基本情報、WP別、合計欄など）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingGroup {
    pub name: String,
    pub mappings: Vec<CellMapping>,
}

/// セル対応表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellMappingTable {
    pub summary_sheet: String,
    pub row_offset: u32,
    /// 書式判定の対象列（"F:T"）
    pub format_range: String,
    pub groups: Vec<MappingGroup>,
}

lazy_static::lazy_static! {
    static ref BUDGET_OVERVIEW_TABLE: CellMappingTable = CellMappingTable::budget_overview();
    static ref PM_OVERVIEW_TABLE: CellMappingTable = CellMappingTable::pm_overview();
}

/// WP1..WP15 の連続した対応を生成
fn work_package_mappings(source_row: u32, first_source_col: u32, first_target_col: u32) -> Vec<CellMapping> {
    (0..15)
        .map(|i| {
            CellMapping::new(
                format!("wp{}", i + 1),
                format!("{}{}", column_letters(first_source_col + i), source_row),
                column_letters(first_target_col + i),
            )
        })
        .collect()
}

impl CellMappingTable {
    /// Budget Overview（行 = n + 7、B..W列）
    pub fn budget_overview() -> Self {
        let kind = SummaryKind::BudgetOverview;
        Self {
            summary_sheet: kind.sheet_name().to_string(),
            row_offset: kind.row_offset(),
            format_range: "F:T".to_string(),
            groups: vec![
                MappingGroup {
                    name: "basic".to_string(),
                    mappings: vec![
                        CellMapping::new("partner_acronym", "D4", "B"),
                        CellMapping::new("partner_name", "D5", "C"),
                        CellMapping::new("country", "D6", "D"),
                        CellMapping::new("role", "D7", "E"),
                    ],
                },
                MappingGroup {
                    name: "work_packages".to_string(),
                    // G13..U13 → F..T
                    mappings: work_package_mappings(13, 7, 6),
                },
                MappingGroup {
                    name: "totals".to_string(),
                    mappings: vec![
                        CellMapping::new("subtotal", "V13", "U"),
                        CellMapping::new("subcontracting", "W13", "V"),
                        CellMapping::new("total", "X13", "W"),
                    ],
                },
            ],
        }
    }

    /// PM Overview（行 = n + 4、C..Q列）
    pub fn pm_overview() -> Self {
        let kind = SummaryKind::PmOverview;
        Self {
            summary_sheet: kind.sheet_name().to_string(),
            row_offset: kind.row_offset(),
            format_range: "C:Q".to_string(),
            groups: vec![MappingGroup {
                name: "work_packages".to_string(),
                // G14..U14 → C..Q
                mappings: work_package_mappings(14, 7, 3),
            }],
        }
    }

    /// JSONファイルから読み込み
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// JSON文字列から読み込み
    pub fn from_json(json: &str) -> Result<Self> {
        let table: Self = serde_json::from_str(json)?;
        Ok(table)
    }

    pub fn target_row(&self, partner: u32) -> u32 {
        partner.saturating_add(self.row_offset)
    }

    /// 全対応（グループ順）
    pub fn mappings(&self) -> impl Iterator<Item = &CellMapping> {
        self.groups.iter().flat_map(|g| g.mappings.iter())
    }

    /// フィールド名 → (コピー元セル, コピー先列)
    pub fn lookup(&self, field: &str) -> Option<(&str, &str)> {
        self.mappings()
            .find(|m| m.field == field)
            .map(|m| (m.source.as_str(), m.target_column.as_str()))
    }

    /// 全参照を検証して解決済みの表を作る
    pub fn resolve(&self) -> std::result::Result<ResolvedTable, ValidationError> {
        let format_range = ColumnRange::parse(&self.format_range)?;

        if self.target_row(MAX_PARTNER) > MAX_ROW {
            return Err(ValidationError::MalformedReference(format!(
                "row offset {}",
                self.row_offset
            )));
        }

        let mappings = self
            .mappings()
            .map(|m| {
                Ok(ResolvedMapping {
                    field: m.field.clone(),
                    source: CellRef::parse(&m.source)?,
                    target_col: column_index(m.target_column.trim())?,
                })
            })
            .collect::<std::result::Result<Vec<_>, ValidationError>>()?;

        Ok(ResolvedTable {
            summary_sheet: self.summary_sheet.clone(),
            row_offset: self.row_offset,
            format_range,
            mappings,
        })
    }
}

/// 検証済みの対応
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMapping {
    pub field: String,
    pub source: CellRef,
    pub target_col: u32,
}

/// 検証済みの対応表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTable {
    pub summary_sheet: String,
    pub row_offset: u32,
    pub format_range: ColumnRange,
    pub mappings: Vec<ResolvedMapping>,
}

impl ResolvedTable {
    pub fn target_row(&self, partner: u32) -> u32 {
        partner.saturating_add(self.row_offset)
    }
}
