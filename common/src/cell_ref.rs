//! A1形式のセル参照
//!
//! 列 A〜XFD、行 1〜1,048,576 の範囲外は検証エラー。
//! 行・列はどちらも1始まりで保持する。

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 最大列番号（XFD）
pub const MAX_COLUMN: u32 = 16_384;
/// 最大行番号
pub const MAX_ROW: u32 = 1_048_576;

/// セル参照（行優先で順序付け）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    row: u32,
    col: u32,
}

impl CellRef {
    /// 列番号・行番号（1始まり）から作成
    pub fn new(col: u32, row: u32) -> Result<Self, ValidationError> {
        if col == 0 || col > MAX_COLUMN || row == 0 || row > MAX_ROW {
            return Err(ValidationError::MalformedReference(format!(
                "column {} / row {}",
                col, row
            )));
        }
        Ok(Self { row, col })
    }

    /// "G13" / "$G$13" 形式を解析（`$` は位置のみを表すので無視）
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let malformed = || ValidationError::MalformedReference(text.to_string());
        let s = text.trim();

        let s = s.strip_prefix('$').unwrap_or(s);
        let letters_end = s
            .find(|c: char| !c.is_ascii_alphabetic())
            .ok_or_else(malformed)?;
        let (letters, rest) = s.split_at(letters_end);
        let digits = rest.strip_prefix('$').unwrap_or(rest);

        if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }

        let col = column_index(letters).map_err(|_| malformed())?;
        let row: u32 = digits.parse().map_err(|_| malformed())?;
        Self::new(col, row).map_err(|_| malformed())
    }

    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn col(&self) -> u32 {
        self.col
    }

    /// 列記号（"G"）
    pub fn column_letters(&self) -> String {
        column_letters(self.col)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row)
    }
}

impl FromStr for CellRef {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CellRef {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CellRef> for String {
    fn from(value: CellRef) -> Self {
        value.to_string()
    }
}

impl Serialize for CellRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CellRef {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// 列記号 → 列番号（"A" = 1, "XFD" = 16384）
pub fn column_index(letters: &str) -> Result<u32, ValidationError> {
    let malformed = || ValidationError::MalformedReference(letters.to_string());

    if letters.is_empty() || letters.len() > 3 {
        return Err(malformed());
    }

    let mut index: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(malformed());
        }
        index = index * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }

    if index > MAX_COLUMN {
        return Err(malformed());
    }
    Ok(index)
}

/// 列番号 → 列記号
pub fn column_letters(mut index: u32) -> String {
    let mut letters = Vec::new();
    while index > 0 {
        let rem = (index - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        index = (index - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// 列範囲（"F:T"）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColumnRange {
    start: u32,
    end: u32,
}

impl ColumnRange {
    pub fn new(start: u32, end: u32) -> Result<Self, ValidationError> {
        if start == 0 || end > MAX_COLUMN || start > end {
            return Err(ValidationError::MalformedReference(format!(
                "column range {}:{}",
                column_letters(start),
                column_letters(end)
            )));
        }
        Ok(Self { start, end })
    }

    /// "F:T" 形式を解析
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let (first, last) = text
            .split_once(':')
            .ok_or_else(|| ValidationError::MalformedReference(text.to_string()))?;
        let start = column_index(first.trim())?;
        let end = column_index(last.trim())?;
        Self::new(start, end)
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn len(&self) -> usize {
        (self.end - self.start + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// 指定行のセル参照を左から順に列挙
    pub fn cells(&self, row: u32) -> impl Iterator<Item = CellRef> + '_ {
        (self.start..=self.end).map(move |col| CellRef { row, col })
    }
}

impl fmt::Display for ColumnRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", column_letters(self.start), column_letters(self.end))
    }
}

impl TryFrom<String> for ColumnRange {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ColumnRange> for String {
    fn from(value: ColumnRange) -> Self {
        value.to_string()
    }
}
