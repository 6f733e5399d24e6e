use crate::error::{BudgetinatorError, Result};
use budgetinator_common::{Cell, CellRef, CellValue, MergedRegion, Workbook, Worksheet};
use calamine::{open_workbook, Data, Reader, Xlsx};
use log::debug;
use std::collections::BTreeMap;
use std::path::Path;

/// xlsxファイルを読み込む（値・数式・結合セル）
///
/// 書式は読み込まない。
pub fn load_workbook(path: &Path) -> Result<Workbook> {
    if !path.exists() {
        return Err(BudgetinatorError::FileNotFound(path.display().to_string()));
    }

    let mut xlsx: Xlsx<_> = open_workbook(path)?;
    xlsx.load_merged_regions()?;

    let mut workbook = Workbook::new();
    for name in xlsx.sheet_names() {
        let mut cells: BTreeMap<CellRef, Cell> = BTreeMap::new();

        let range = xlsx.worksheet_range(&name)?;
        let (row0, col0) = range.start().unwrap_or((0, 0));
        for (r, c, data) in range.used_cells() {
            let cell = to_cell_ref(row0 + r as u32, col0 + c as u32)?;
            cells.entry(cell).or_default().value = to_cell_value(data);
        }

        // 数式は "=" なしで返される
        let formulas = xlsx.worksheet_formula(&name)?;
        let (row0, col0) = formulas.start().unwrap_or((0, 0));
        for (r, c, formula) in formulas.used_cells() {
            if formula.is_empty() {
                continue;
            }
            let cell = to_cell_ref(row0 + r as u32, col0 + c as u32)?;
            let entry = cells.entry(cell).or_default();
            // エラー値は "=#REF!" の数式として保存されている
            if CellValue::is_error_code(formula) {
                entry.value = CellValue::Error(formula.trim().to_string());
                entry.formula = None;
            } else {
                entry.formula = Some(format!("={}", formula));
            }
        }

        let mut sheet = Worksheet::new(name.as_str());
        for (cell, content) in cells {
            sheet.insert(cell, content);
        }
        for (_, _, dims) in xlsx.merged_regions_by_sheet(&name) {
            sheet.add_merged_region(MergedRegion::new(
                to_cell_ref(dims.start.0, dims.start.1)?,
                to_cell_ref(dims.end.0, dims.end.1)?,
            ));
        }

        debug!("loaded sheet {} ({} cells)", name, sheet.cells().count());
        workbook.add_sheet(sheet);
    }

    Ok(workbook)
}

/// 0始まりの (行, 列) → セル参照
fn to_cell_ref(row: u32, col: u32) -> Result<CellRef> {
    Ok(CellRef::new(col + 1, row + 1)?)
}

fn to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Error(e) => CellValue::Error(e.to_string()),
        Data::DateTime(dt) if dt.is_duration() => CellValue::Duration(dt.as_f64()),
        Data::DateTime(dt) => CellValue::DateTime(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{CellErrorType, ExcelDateTime, ExcelDateTimeType};

    #[test]
    fn test_to_cell_value() {
        assert_eq!(to_cell_value(&Data::Int(3)), CellValue::Number(3.0));
        assert_eq!(
            to_cell_value(&Data::String("ACME".to_string())),
            CellValue::Text("ACME".to_string())
        );
        assert_eq!(
            to_cell_value(&Data::Error(CellErrorType::Ref)),
            CellValue::Error("#REF!".to_string())
        );
        assert_eq!(to_cell_value(&Data::Empty), CellValue::Empty);
    }

    #[test]
    fn test_to_cell_value_keeps_dates() {
        let date = ExcelDateTime::new(45717.0, ExcelDateTimeType::DateTime, false);
        assert_eq!(to_cell_value(&Data::DateTime(date)), CellValue::DateTime(45717.0));

        let elapsed = ExcelDateTime::new(0.5, ExcelDateTimeType::TimeDelta, false);
        assert_eq!(to_cell_value(&Data::DateTime(elapsed)), CellValue::Duration(0.5));
    }

    #[test]
    fn test_to_cell_ref_is_one_based() {
        assert_eq!(to_cell_ref(0, 0).unwrap().to_string(), "A1");
        assert_eq!(to_cell_ref(12, 6).unwrap().to_string(), "G13");
    }

    #[test]
    fn test_missing_file() {
        let result = load_workbook(Path::new("/nonexistent/budget.xlsx"));
        assert!(matches!(result, Err(BudgetinatorError::FileNotFound(_))));
    }
}
