//! セル書式 → rust_xlsxwriter の Format 変換

use crate::style::{BorderKind, StyleDefinition};
use rust_xlsxwriter::{Color, Format, FormatBorder};

/// 書式定義から Format を生成
pub fn to_format(style: &StyleDefinition) -> Format {
    let mut format = Format::new()
        .set_background_color(Color::RGB(style.fill_color))
        .set_font_color(Color::RGB(style.font_color));

    if style.bold {
        format = format.set_bold();
    }
    if style.italic {
        format = format.set_italic();
    }
    if let Some(border) = style.border {
        format = format
            .set_border(border_kind(border.kind))
            .set_border_color(Color::RGB(border.color));
    }

    format
}

fn border_kind(kind: BorderKind) -> FormatBorder {
    match kind {
        BorderKind::Hair => FormatBorder::Hair,
        BorderKind::Thin => FormatBorder::Thin,
        BorderKind::Medium => FormatBorder::Medium,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StylePalette;

    #[test]
    fn test_palette_formats_differ() {
        let palette = StylePalette::default();
        let complete = to_format(&palette.complete);
        let empty = to_format(&palette.empty);
        assert_ne!(complete, empty);
        assert_eq!(complete, to_format(&palette.complete));
    }

    #[test]
    fn test_plain_style() {
        let style = StyleDefinition {
            fill_color: 0xFFFFFF,
            font_color: 0x000000,
            bold: false,
            italic: false,
            border: None,
        };
        let expected = Format::new()
            .set_background_color(Color::RGB(0xFFFFFF))
            .set_font_color(Color::RGB(0x000000));
        assert_eq!(to_format(&style), expected);
    }
}
