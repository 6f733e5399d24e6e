//! 数式の参照書き換え
//!
//! 行をコピーする際、コピー元の行を指す相対参照だけをコピー先の行に付け替える。
//!
//! - `$` 付きの行（`A$1`, `$A$1`）は変更しない
//! - 列記号は変更しない
//! - 行範囲（`18:18`）も各端を同じ規則で付け替える
//! - コピー元シート名で修飾された参照はコピー先シート名に書き換える
//! - 文字列リテラル内は対象外

use crate::cell_ref::{column_index, CellRef, MAX_ROW};
use crate::error::FormulaAdjustmentError;
use regex::{Captures, Regex};

enum Segment<'a> {
    Code(&'a str),
    Literal(&'a str),
}

/// 数式内の参照を書き換える
///
/// # Arguments
/// * `formula` - "=" で始まる数式
/// * `source_row` / `target_row` - コピー元/コピー先の行
/// * `source_sheet` / `target_sheet` - コピー元/コピー先のシート名
pub fn adjust(
    formula: &str,
    source_row: u32,
    target_row: u32,
    source_sheet: &str,
    target_sheet: &str,
) -> Result<String, FormulaAdjustmentError> {
    let body = formula
        .strip_prefix('=')
        .ok_or_else(|| FormulaAdjustmentError::NotAFormula(formula.to_string()))?;

    let segments = split_literals(body, formula)?;

    let mut adjusted = String::with_capacity(formula.len() + 16);
    adjusted.push('=');
    for segment in segments {
        match segment {
            Segment::Literal(text) => adjusted.push_str(text),
            Segment::Code(code) => {
                let code = rewrite_references(code, source_row, target_row, source_sheet, target_sheet);
                adjusted.push_str(&rewrite_row_ranges(
                    &code,
                    source_row,
                    target_row,
                    source_sheet,
                    target_sheet,
                ));
            }
        }
    }

    Ok(adjusted)
}

/// 文字列リテラルとそれ以外に分割し、括弧・引用符の対応を検証
fn split_literals<'a>(
    body: &'a str,
    formula: &str,
) -> Result<Vec<Segment<'a>>, FormulaAdjustmentError> {
    let mut segments = Vec::new();
    let mut depth: i32 = 0;
    let mut code_start = 0;
    let mut chars = body.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '"' => {
                if code_start < i {
                    segments.push(Segment::Code(&body[code_start..i]));
                }
                // "" はエスケープされた引用符
                let mut end = None;
                while let Some((j, d)) = chars.next() {
                    if d == '"' {
                        if matches!(chars.peek(), Some((_, '"'))) {
                            chars.next();
                            continue;
                        }
                        end = Some(j);
                        break;
                    }
                }
                let end = end
                    .ok_or_else(|| FormulaAdjustmentError::UnbalancedQuotes(formula.to_string()))?;
                segments.push(Segment::Literal(&body[i..=end]));
                code_start = end + 1;
            }
            '\'' => {
                let mut closed = false;
                while let Some((_, d)) = chars.next() {
                    if d == '\'' {
                        if matches!(chars.peek(), Some((_, '\''))) {
                            chars.next();
                            continue;
                        }
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(FormulaAdjustmentError::UnterminatedSheetName(
                        formula.to_string(),
                    ));
                }
            }
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(FormulaAdjustmentError::UnbalancedParentheses(
                        formula.to_string(),
                    ));
                }
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(FormulaAdjustmentError::UnbalancedParentheses(formula.to_string()));
    }
    if code_start < body.len() {
        segments.push(Segment::Code(&body[code_start..]));
    }

    Ok(segments)
}

lazy_static::lazy_static! {
    // [シート名!][$]列[$]行
    static ref CELL_REF_RE: Regex = Regex::new(
        r"(?:(?P<sheet>'(?:[^']|'')+'|[A-Za-z_][A-Za-z0-9_.]*)!)?(?P<col_abs>\$?)(?P<col>[A-Za-z]{1,3})(?P<row_abs>\$?)(?P<row>[0-9]+)"
    ).unwrap();

    // [シート名!][$]行:[$]行
    static ref ROW_RANGE_RE: Regex = Regex::new(
        r"(?:(?P<sheet>'(?:[^']|'')+'|[A-Za-z_][A-Za-z0-9_.]*)!)?(?P<first_abs>\$?)(?P<first>[0-9]+):(?P<last_abs>\$?)(?P<last>[0-9]+)"
    ).unwrap();
}

/// 関数名・名前付き範囲の一部ではないことを確認
fn is_reference_boundary(code: &str, start: usize, end: usize) -> bool {
    let before_ok = code[..start]
        .chars()
        .next_back()
        .map(|c| !(c.is_alphanumeric() || c == '_' || c == '.' || c == '$'))
        .unwrap_or(true);
    let after_ok = code[end..]
        .chars()
        .next()
        .map(|c| !(c.is_alphanumeric() || c == '_' || c == '(' || c == '!'))
        .unwrap_or(true);
    before_ok && after_ok
}

fn rewrite_references(
    code: &str,
    source_row: u32,
    target_row: u32,
    source_sheet: &str,
    target_sheet: &str,
) -> String {
    let quoted = quoted_spans(code);
    let mut out = String::with_capacity(code.len());
    let mut last = 0;

    for caps in CELL_REF_RE.captures_iter(code) {
        let Some(whole) = caps.get(0) else { continue };
        if !is_reference_boundary(code, whole.start(), whole.end())
            || inside_quoted(&quoted, whole.start())
        {
            continue;
        }
        let Some(row) = parse_reference_row(&caps) else { continue };

        out.push_str(&code[last..whole.start()]);

        push_sheet(&mut out, &caps, source_sheet, target_sheet);
        out.push_str(&caps["col_abs"]);
        out.push_str(&caps["col"]);
        out.push_str(&caps["row_abs"]);
        out.push_str(&move_row(row, &caps["row_abs"], source_row, target_row).to_string());
        last = whole.end();
    }

    out.push_str(&code[last..]);
    out
}

/// 行全体の範囲（`18:18`, `$5:7`）を書き換える
fn rewrite_row_ranges(
    code: &str,
    source_row: u32,
    target_row: u32,
    source_sheet: &str,
    target_sheet: &str,
) -> String {
    let quoted = quoted_spans(code);
    let mut out = String::with_capacity(code.len());
    let mut last = 0;

    for caps in ROW_RANGE_RE.captures_iter(code) {
        let Some(whole) = caps.get(0) else { continue };
        if !is_reference_boundary(code, whole.start(), whole.end())
            || inside_quoted(&quoted, whole.start())
        {
            continue;
        }
        let (Some(first), Some(last_row)) = (parse_row(&caps["first"]), parse_row(&caps["last"])) else {
            continue;
        };

        out.push_str(&code[last..whole.start()]);
        push_sheet(&mut out, &caps, source_sheet, target_sheet);
        out.push_str(&caps["first_abs"]);
        out.push_str(&move_row(first, &caps["first_abs"], source_row, target_row).to_string());
        out.push(':');
        out.push_str(&caps["last_abs"]);
        out.push_str(&move_row(last_row, &caps["last_abs"], source_row, target_row).to_string());
        last = whole.end();
    }

    out.push_str(&code[last..]);
    out
}

/// 引用符付きシート名の範囲（両端の ' を含む）
fn quoted_spans(code: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut open: Option<usize> = None;
    let mut chars = code.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c != '\'' {
            continue;
        }
        match open {
            None => open = Some(i),
            Some(_) if matches!(chars.peek(), Some((_, '\''))) => {
                chars.next();
            }
            Some(start) => {
                spans.push((start, i));
                open = None;
            }
        }
    }
    spans
}

/// シート名の途中から始まる一致か
fn inside_quoted(spans: &[(usize, usize)], pos: usize) -> bool {
    spans.iter().any(|&(start, end)| pos > start && pos <= end)
}

/// `$` なしでコピー元の行を指していればコピー先の行に付け替える
fn move_row(row: u32, anchor: &str, source_row: u32, target_row: u32) -> u32 {
    if anchor.is_empty() && row == source_row {
        target_row
    } else {
        row
    }
}

/// シート修飾子を書き出す（コピー元シートならコピー先に置き換える）
fn push_sheet(out: &mut String, caps: &Captures<'_>, source_sheet: &str, target_sheet: &str) {
    if let Some(sheet) = caps.name("sheet") {
        if unquote_sheet_name(sheet.as_str()) == source_sheet {
            out.push_str(&quote_sheet_name(target_sheet));
        } else {
            out.push_str(sheet.as_str());
        }
        out.push('!');
    }
}

fn parse_row(text: &str) -> Option<u32> {
    let row: u32 = text.parse().ok()?;
    (1..=MAX_ROW).contains(&row).then_some(row)
}

/// 列・行が範囲内の場合のみ行番号を返す
fn parse_reference_row(caps: &Captures<'_>) -> Option<u32> {
    column_index(&caps["col"]).ok()?;
    parse_row(&caps["row"])
}

fn unquote_sheet_name(raw: &str) -> String {
    match raw.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        Some(inner) => inner.replace("''", "'"),
        None => raw.to_string(),
    }
}

/// シート名を参照用に整形（必要なら単一引用符で囲む）
pub fn quote_sheet_name(name: &str) -> String {
    let plain = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        && CellRef::parse(name).is_err();

    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}
