//! パートナーシートの検出
//!
//! シート名 `P{n}` + 任意の区切り文字と名称（例: "P2-ACME", "P15 Uni Graz"）。
//! 番号 2〜20 以外は無視する。

use log::{debug, warn};
use regex::Regex;
use serde::Serialize;

pub const MIN_PARTNER: u32 = 2;
pub const MAX_PARTNER: u32 = 20;

/// 検出されたパートナーシート
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerSheet {
    pub number: u32,
    pub sheet_name: String,
}

lazy_static::lazy_static! {
    // P + 数字 + (終端 | 数字以外)
    static ref PARTNER_SHEET_RE: Regex = Regex::new(r"^P(\d+)(?:$|\D)").unwrap();
}

/// シート名からパートナー番号を取り出す（範囲チェックなし）
pub fn partner_number(sheet_name: &str) -> Option<u32> {
    PARTNER_SHEET_RE
        .captures(sheet_name.trim())
        .and_then(|caps| caps[1].parse().ok())
}

pub fn is_valid_partner(number: u32) -> bool {
    (MIN_PARTNER..=MAX_PARTNER).contains(&number)
}

/// パートナーシートを番号順に列挙
///
/// 同じ番号のシートが複数ある場合は最初のものを使う。
pub fn discover_partners<'a, I>(sheet_names: I) -> Vec<PartnerSheet>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut partners: Vec<PartnerSheet> = Vec::new();

    for name in sheet_names {
        let Some(number) = partner_number(name) else { continue };

        if !is_valid_partner(number) {
            debug!("partner number out of range, ignored: {}", name);
            continue;
        }
        if let Some(existing) = partners.iter().find(|p| p.number == number) {
            warn!(
                "duplicate partner P{}: using \"{}\", ignoring \"{}\"",
                number, existing.sheet_name, name
            );
            continue;
        }

        partners.push(PartnerSheet {
            number,
            sheet_name: name.to_string(),
        });
    }

    partners.sort_by_key(|p| p.number);
    partners
}
