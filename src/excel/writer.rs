use crate::error::Result;
use budgetinator_common::export::excel_core::to_format;
use budgetinator_common::{Cell, CellValue, SheetAccess, Workbook, Worksheet};
use log::debug;
use rust_xlsxwriter::{Format, Formula, Workbook as XlsxWorkbook, Worksheet as XlsxWorksheet};
use std::path::Path;

/// ワークブックをxlsxとして保存
pub fn save_workbook(workbook: &Workbook, path: &Path) -> Result<()> {
    let mut xlsx = XlsxWorkbook::new();

    for sheet in workbook.sheets() {
        let worksheet = xlsx.add_worksheet();
        worksheet.set_name(sheet.name())?;
        write_sheet(worksheet, sheet)?;
    }

    xlsx.save(path)?;
    debug!("saved {}", path.display());
    Ok(())
}

fn write_sheet(worksheet: &mut XlsxWorksheet, sheet: &Worksheet) -> Result<()> {
    // 結合セルを先に書き、先頭セルの内容は後で上書きする
    for region in sheet.merged_regions() {
        if region.first == region.last {
            continue;
        }
        let format = sheet
            .style(region.first)
            .map(|s| to_format(&s))
            .unwrap_or_else(Format::new);
        worksheet.merge_range(
            region.first.row() - 1,
            (region.first.col() - 1) as u16,
            region.last.row() - 1,
            (region.last.col() - 1) as u16,
            "",
            &format,
        )?;
    }

    for (cell_ref, cell) in sheet.cells() {
        if sheet.merged_anchor(*cell_ref).is_some() {
            continue;
        }
        write_cell(worksheet, cell_ref.row() - 1, (cell_ref.col() - 1) as u16, cell)?;
    }

    Ok(())
}

fn write_cell(worksheet: &mut XlsxWorksheet, row: u32, col: u16, cell: &Cell) -> Result<()> {
    let format = cell_format(cell);

    if let Some(formula) = &cell.formula {
        let formula = Formula::new(formula).set_result(formula_result(&cell.value));
        worksheet.write_formula_with_format(row, col, formula, &format)?;
        return Ok(());
    }

    match &cell.value {
        CellValue::Empty => {
            if cell.style.is_some() {
                worksheet.write_blank(row, col, &format)?;
            }
        }
        CellValue::Text(s) => {
            worksheet.write_string_with_format(row, col, s, &format)?;
        }
        CellValue::Number(n) => {
            worksheet.write_number_with_format(row, col, *n, &format)?;
        }
        CellValue::Bool(b) => {
            worksheet.write_boolean_with_format(row, col, *b, &format)?;
        }
        CellValue::DateTime(serial) | CellValue::Duration(serial) => {
            worksheet.write_number_with_format(row, col, *serial, &format)?;
        }
        // 文字列にせず、エラーを返す数式として残す
        CellValue::Error(code) => {
            let formula = Formula::new(code).set_result(code);
            worksheet.write_formula_with_format(row, col, formula, &format)?;
        }
    }

    Ok(())
}

/// セルの書式（日付・時間は表示形式を付ける）
fn cell_format(cell: &Cell) -> Format {
    let format = cell.style.as_ref().map(to_format).unwrap_or_else(Format::new);
    match date_format(&cell.value) {
        Some(num_format) => format.set_num_format(num_format),
        None => format,
    }
}

fn date_format(value: &CellValue) -> Option<&'static str> {
    match value {
        CellValue::DateTime(serial) if serial.fract() == 0.0 => Some("yyyy-mm-dd"),
        CellValue::DateTime(serial) if *serial < 1.0 => Some("hh:mm:ss"),
        CellValue::DateTime(_) => Some("yyyy-mm-dd hh:mm:ss"),
        CellValue::Duration(_) => Some("[h]:mm:ss"),
        _ => None,
    }
}

/// 数式のキャッシュ値（Excelで開くまで表示される値）
fn formula_result(value: &CellValue) -> String {
    match value {
        CellValue::Empty => String::new(),
        CellValue::Text(s) => s.clone(),
        CellValue::Number(n) | CellValue::DateTime(n) | CellValue::Duration(n) => n.to_string(),
        CellValue::Bool(true) => "TRUE".to_string(),
        CellValue::Bool(false) => "FALSE".to_string(),
        CellValue::Error(code) => code.clone(),
    }
}
