//! メモリ上のワークブックモデル
//!
//! xlsxの読み書きは呼び出し側（CLI）が担当し、ここではセル値・数式・
//! 書式・結合セルのみを保持する。

use crate::cell_ref::CellRef;
use crate::error::{CellAccessError, StyleApplicationError};
use crate::style::StyleDefinition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Excelのエラー値
pub const ERROR_CODES: [&str; 8] = [
    "#NULL!", "#DIV/0!", "#VALUE!", "#REF!", "#NAME?", "#NUM!", "#N/A", "#GETTING_DATA",
];

/// セル値
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Error(String),
    /// 日付・時刻（Excelのシリアル値）
    DateTime(f64),
    /// 経過時間（日数単位のシリアル値）
    Duration(f64),
}

impl CellValue {
    /// 空白のみの文字列は未入力として扱う
    pub fn is_filled(&self) -> bool {
        match self {
            CellValue::Empty => false,
            CellValue::Text(s) => !s.trim().is_empty(),
            _ => true,
        }
    }

    /// データ型タグ（xlsxの t 属性に準拠）
    pub fn type_tag(&self) -> &'static str {
        match self {
            CellValue::Empty => "z",
            CellValue::Text(_) => "s",
            CellValue::Number(_) => "n",
            CellValue::Bool(_) => "b",
            CellValue::Error(_) => "e",
            CellValue::DateTime(_) => "d",
            CellValue::Duration(_) => "n",
        }
    }

    /// エラー値の文字列（"#REF!" 等）か
    pub fn is_error_code(text: &str) -> bool {
        ERROR_CODES.contains(&text.trim())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// セル
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub value: CellValue,
    /// 先頭の "=" を含む数式文字列
    pub formula: Option<String>,
    pub style: Option<StyleDefinition>,
}

/// 結合セル範囲
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedRegion {
    pub first: CellRef,
    pub last: CellRef,
}

impl MergedRegion {
    pub fn new(first: CellRef, last: CellRef) -> Self {
        Self { first, last }
    }

    pub fn contains(&self, cell: CellRef) -> bool {
        (self.first.row()..=self.last.row()).contains(&cell.row())
            && (self.first.col()..=self.last.col()).contains(&cell.col())
    }
}

/// セル操作のインターフェース
///
/// 値・数式・書式・データ型タグの取得/設定を提供する。
pub trait SheetAccess {
    fn name(&self) -> &str;

    fn value(&self, cell: CellRef) -> Result<CellValue, CellAccessError>;

    fn formula(&self, cell: CellRef) -> Option<String>;

    fn set_value(&mut self, cell: CellRef, value: CellValue) -> Result<(), CellAccessError>;

    /// 数式を書き込む（cached はキャッシュ済みの計算結果）
    fn set_formula(
        &mut self,
        cell: CellRef,
        formula: &str,
        cached: CellValue,
    ) -> Result<(), CellAccessError>;

    fn style(&self, cell: CellRef) -> Option<StyleDefinition>;

    fn set_style(
        &mut self,
        cell: CellRef,
        style: Option<StyleDefinition>,
    ) -> Result<(), StyleApplicationError>;

    fn data_type(&self, cell: CellRef) -> &'static str {
        self.value(cell).map(|v| v.type_tag()).unwrap_or("e")
    }
}

/// ワークシート
#[derive(Debug, Clone, Default)]
pub struct Worksheet {
    name: String,
    cells: BTreeMap<CellRef, Cell>,
    merged: Vec<MergedRegion>,
}

impl Worksheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            merged: Vec::new(),
        }
    }

    pub fn cell(&self, cell: CellRef) -> Option<&Cell> {
        self.cells.get(&cell)
    }

    /// 全セル（行優先順）
    pub fn cells(&self) -> impl Iterator<Item = (&CellRef, &Cell)> {
        self.cells.iter()
    }

    /// 読み込み時の直接挿入（結合セルのチェックなし）
    pub fn insert(&mut self, cell: CellRef, content: Cell) {
        self.cells.insert(cell, content);
    }

    pub fn add_merged_region(&mut self, region: MergedRegion) {
        self.merged.push(region);
    }

    pub fn merged_regions(&self) -> &[MergedRegion] {
        &self.merged
    }

    /// 結合範囲の先頭以外のセルなら、その結合範囲の先頭セルを返す
    pub fn merged_anchor(&self, cell: CellRef) -> Option<CellRef> {
        self.merged
            .iter()
            .find(|r| r.contains(cell) && r.first != cell)
            .map(|r| r.first)
    }

    fn check_writable(&self, cell: CellRef) -> Result<(), CellAccessError> {
        match self.merged_anchor(cell) {
            Some(anchor) => Err(CellAccessError::MergedCell {
                cell: cell.to_string(),
                anchor: anchor.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// 値も数式も書式もないセルを削除
    fn prune(&mut self, cell: CellRef) {
        let remove = self
            .cells
            .get(&cell)
            .map(|c| c.value == CellValue::Empty && c.formula.is_none() && c.style.is_none())
            .unwrap_or(false);
        if remove {
            self.cells.remove(&cell);
        }
    }
}

impl SheetAccess for Worksheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self, cell: CellRef) -> Result<CellValue, CellAccessError> {
        Ok(self
            .cells
            .get(&cell)
            .map(|c| c.value.clone())
            .unwrap_or_default())
    }

    fn formula(&self, cell: CellRef) -> Option<String> {
        self.cells.get(&cell).and_then(|c| c.formula.clone())
    }

    fn set_value(&mut self, cell: CellRef, value: CellValue) -> Result<(), CellAccessError> {
        self.check_writable(cell)?;
        let entry = self.cells.entry(cell).or_default();
        entry.value = value;
        entry.formula = None;
        self.prune(cell);
        Ok(())
    }

    fn set_formula(
        &mut self,
        cell: CellRef,
        formula: &str,
        cached: CellValue,
    ) -> Result<(), CellAccessError> {
        self.check_writable(cell)?;
        let entry = self.cells.entry(cell).or_default();
        entry.value = cached;
        entry.formula = Some(formula.to_string());
        Ok(())
    }

    fn style(&self, cell: CellRef) -> Option<StyleDefinition> {
        self.cells.get(&cell).and_then(|c| c.style.clone())
    }

    fn set_style(
        &mut self,
        cell: CellRef,
        style: Option<StyleDefinition>,
    ) -> Result<(), StyleApplicationError> {
        self.check_writable(cell).map_err(|e| StyleApplicationError {
            cell: cell.to_string(),
            reason: e.to_string(),
        })?;
        self.cells.entry(cell).or_default().style = style;
        self.prune(cell);
        Ok(())
    }
}

/// ワークブック
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Worksheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sheet(&mut self, sheet: Worksheet) {
        self.sheets.push(sheet);
    }

    pub fn sheets(&self) -> &[Worksheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&Worksheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    /// 読み取り用シートと書き込み用シートを同時に借用
    pub fn sheet_pair_mut(&mut self, source: &str, target: &str) -> Option<(&Worksheet, &mut Worksheet)> {
        let src = self.sheets.iter().position(|s| s.name == source)?;
        let dst = self.sheets.iter().position(|s| s.name == target)?;
        if src == dst {
            return None;
        }

        if src < dst {
            let (head, tail) = self.sheets.split_at_mut(dst);
            Some((&head[src], &mut tail[0]))
        } else {
            let (head, tail) = self.sheets.split_at_mut(src);
            Some((&tail[0], &mut head[dst]))
        }
    }
}
