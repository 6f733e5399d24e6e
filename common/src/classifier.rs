//! 集計行の入力状況分類（Complete / Partial / Empty）

use crate::cell_ref::ColumnRange;
use crate::workbook::SheetAccess;
use log::debug;
use serde::Serialize;

/// 行分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RowClassification {
    Complete,
    Partial,
    Empty,
}

impl std::fmt::Display for RowClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowClassification::Complete => write!(f, "complete"),
            RowClassification::Partial => write!(f, "partial"),
            RowClassification::Empty => write!(f, "empty"),
        }
    }
}

/// 分類結果（セルごとの入力有無を範囲の左から順に保持）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowAnalysis {
    pub row: u32,
    pub classification: RowClassification,
    pub filled: Vec<bool>,
}

impl RowAnalysis {
    pub fn filled_count(&self) -> usize {
        self.filled.iter().filter(|f| **f).count()
    }
}

/// 行を分類する
///
/// 空白のみの文字列は未入力扱い。読み取れないセルも未入力として数える。
pub fn classify<S: SheetAccess + ?Sized>(sheet: &S, row: u32, range: &ColumnRange) -> RowAnalysis {
    let filled: Vec<bool> = range
        .cells(row)
        .map(|cell| match sheet.value(cell) {
            Ok(value) => value.is_filled(),
            Err(e) => {
                debug!("{}: {}", sheet.name(), e);
                false
            }
        })
        .collect();

    let count = filled.iter().filter(|f| **f).count();
    let classification = if count == 0 {
        RowClassification::Empty
    } else if count == filled.len() {
        RowClassification::Complete
    } else {
        RowClassification::Partial
    };

    RowAnalysis {
        row,
        classification,
        filled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell_ref::CellRef;
    use crate::workbook::{CellValue, Worksheet};

    fn sheet_with(values: &[(&str, CellValue)]) -> Worksheet {
        let mut sheet = Worksheet::new("Budget Overview");
        for (cell, value) in values {
            sheet.set_value(CellRef::parse(cell).unwrap(), value.clone()).unwrap();
        }
        sheet
    }

    #[test]
    fn test_complete() {
        let range = ColumnRange::parse("F:H").unwrap();
        let sheet = sheet_with(&[
            ("F9", 1.0.into()),
            ("G9", "x".into()),
            ("H9", CellValue::Bool(false)),
        ]);
        let analysis = classify(&sheet, 9, &range);
        assert_eq!(analysis.classification, RowClassification::Complete);
        assert_eq!(analysis.filled, vec![true, true, true]);
    }

    #[test]
    fn test_partial() {
        let range = ColumnRange::parse("F:H").unwrap();
        let sheet = sheet_with(&[("G9", 0.0.into())]);
        let analysis = classify(&sheet, 9, &range);
        assert_eq!(analysis.classification, RowClassification::Partial);
        assert_eq!(analysis.filled, vec![false, true, false]);
        assert_eq!(analysis.filled_count(), 1);
    }

    #[test]
    fn test_empty() {
        let range = ColumnRange::parse("F:H").unwrap();
        let sheet = sheet_with(&[("F9", "".into())]);
        assert_eq!(classify(&sheet, 9, &range).classification, RowClassification::Empty);
    }

    #[test]
    fn test_whitespace_only_is_empty() {
        let range = ColumnRange::parse("F:G").unwrap();
        let sheet = sheet_with(&[("F9", "  ".into()), ("G9", "\t \t".into())]);
        let analysis = classify(&sheet, 9, &range);
        assert_eq!(analysis.classification, RowClassification::Empty);

        let sheet = sheet_with(&[("F9", "  ".into()), ("G9", "ok".into())]);
        assert_eq!(classify(&sheet, 9, &range).classification, RowClassification::Partial);
    }

    #[test]
    fn test_partition_is_exhaustive() {
        // 3セルの全組み合わせで、分類が入力数と一致すること
        let range = ColumnRange::parse("A:C").unwrap();
        for mask in 0u8..8 {
            let mut sheet = Worksheet::new("S");
            for bit in 0..3u32 {
                if mask & (1 << bit) != 0 {
                    sheet.set_value(CellRef::new(bit + 1, 1).unwrap(), "v".into()).unwrap();
                }
            }
            let analysis = classify(&sheet, 1, &range);
            let expected = match mask.count_ones() {
                0 => RowClassification::Empty,
                3 => RowClassification::Complete,
                _ => RowClassification::Partial,
            };
            assert_eq!(analysis.classification, expected, "mask {:03b}", mask);
        }
    }
}
