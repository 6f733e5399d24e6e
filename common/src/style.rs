//! 行分類に応じた書式の定義と適用
//!
//! - Complete: 緑の塗りつぶし・太字
//! - Partial: 入力済みセルは青、未入力セルは灰色・斜体
//! - Empty: 赤の塗りつぶし

use crate::cell_ref::ColumnRange;
use crate::classifier::{RowAnalysis, RowClassification};
use crate::error::StyleApplicationError;
use crate::workbook::SheetAccess;
use log::warn;
use serde::{Deserialize, Serialize};

/// 罫線の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BorderKind {
    Hair,
    Thin,
    Medium,
}

/// 罫線
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Border {
    pub kind: BorderKind,
    /// 0xRRGGBB
    pub color: u32,
}

/// セル書式（0xRRGGBB形式の色）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleDefinition {
    pub fill_color: u32,
    pub font_color: u32,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub border: Option<Border>,
}

const GRID_BORDER: Border = Border {
    kind: BorderKind::Thin,
    color: 0xBFBFBF,
};

/// 分類ごとの書式セット
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StylePalette {
    pub complete: StyleDefinition,
    pub partial_filled: StyleDefinition,
    pub partial_empty: StyleDefinition,
    pub empty: StyleDefinition,
}

impl Default for StylePalette {
    fn default() -> Self {
        Self {
            complete: StyleDefinition {
                fill_color: 0xC6EFCE,
                font_color: 0x006100,
                bold: true,
                italic: false,
                border: Some(GRID_BORDER),
            },
            partial_filled: StyleDefinition {
                fill_color: 0xDDEBF7,
                font_color: 0x1F4E78,
                bold: false,
                italic: false,
                border: Some(GRID_BORDER),
            },
            partial_empty: StyleDefinition {
                fill_color: 0xF2F2F2,
                font_color: 0x808080,
                bold: false,
                italic: true,
                border: Some(GRID_BORDER),
            },
            empty: StyleDefinition {
                fill_color: 0xFFC7CE,
                font_color: 0x9C0006,
                bold: false,
                italic: false,
                border: Some(GRID_BORDER),
            },
        }
    }
}

impl StylePalette {
    /// セル単位の書式を選択
    pub fn style_for(&self, classification: RowClassification, filled: bool) -> &StyleDefinition {
        match classification {
            RowClassification::Complete => &self.complete,
            RowClassification::Empty => &self.empty,
            RowClassification::Partial if filled => &self.partial_filled,
            RowClassification::Partial => &self.partial_empty,
        }
    }
}

/// 1行分の書式適用結果
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleReport {
    pub row: u32,
    pub styled: usize,
    #[serde(skip)]
    pub failures: Vec<StyleApplicationError>,
}

/// 書式適用
pub struct StyleApplier<'a> {
    palette: &'a StylePalette,
}

impl<'a> StyleApplier<'a> {
    pub fn new(palette: &'a StylePalette) -> Self {
        Self { palette }
    }

    /// 分類結果に従って行の範囲に書式を設定
    ///
    /// セル単位の失敗はログに出してスキップし、残りのセルは処理を続ける。
    pub fn apply<S: SheetAccess + ?Sized>(
        &self,
        sheet: &mut S,
        range: &ColumnRange,
        analysis: &RowAnalysis,
    ) -> StyleReport {
        let mut report = StyleReport {
            row: analysis.row,
            ..Default::default()
        };

        for (cell, filled) in range.cells(analysis.row).zip(analysis.filled.iter()) {
            let style = self.palette.style_for(analysis.classification, *filled);
            match sheet.set_style(cell, Some(style.clone())) {
                Ok(()) => report.styled += 1,
                Err(e) => {
                    warn!("{}: {}", sheet.name(), e);
                    report.failures.push(e);
                }
            }
        }

        report
    }

    /// 行の範囲の書式を解除
    pub fn clear<S: SheetAccess + ?Sized>(
        &self,
        sheet: &mut S,
        row: u32,
        range: &ColumnRange,
    ) -> StyleReport {
        let mut report = StyleReport {
            row,
            ..Default::default()
        };

        for cell in range.cells(row) {
            if sheet.style(cell).is_none() {
                continue;
            }
            match sheet.set_style(cell, None) {
                Ok(()) => report.styled += 1,
                Err(e) => {
                    warn!("{}: {}", sheet.name(), e);
                    report.failures.push(e);
                }
            }
        }

        report
    }
}
