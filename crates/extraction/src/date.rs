//! Heuristics for the due date ("vencimento") of a scanned utility bill.
//!
//! Bills carry several dates (reading date, next reading forecast, issue
//! date, authorization, protocol) and OCR flattens the layout, so the
//! strategies below run from most to least specific and every candidate has
//! to pass a plausibility check before it is accepted.

use chrono::NaiveDate;

use crate::amount::extract_amount;
use crate::patterns::{re_date, re_due_labeled, re_table_row};

/// Keywords marking dates that are never the due date.
const IGNORE_KEYWORDS: [&str; 8] = [
    "LEITURA",
    "PREV",
    "PREVISTA",
    "EMISSÃO",
    "EMISSAO",
    "AUTORIZAÇÃO",
    "AUTORIZACAO",
    "PROTOCOLO",
];

/// How far past the "VENCIMENTO" label the proximity fallback looks.
const PROXIMITY_WINDOW: usize = 300;
/// Context inspected around a candidate date for ignore keywords.
const CONTEXT_RADIUS: usize = 30;

/// Finds the due date in OCR text.
pub fn extract_due_date(text: &str) -> Option<NaiveDate> {
    from_table_row(text)
        .or_else(|| from_label(text))
        .or_else(|| from_label_line(text))
        .or_else(|| from_amount_line(text))
        .or_else(|| from_proximity_window(text))
}

/// "NOV/2025 03/12/2025 240,55" — the reference-month / due-date / amount
/// row most bills print; the date between month and amount is the due date.
fn from_table_row(text: &str) -> Option<NaiveDate> {
    let captures = re_table_row().captures(text)?;
    parse_plausible(captures.get(1)?.as_str())
}

/// A date directly after a "VENCIMENTO" / "VENC." / "DATA DE VENCIMENTO"
/// label.
fn from_label(text: &str) -> Option<NaiveDate> {
    let normalized = normalize(text);
    let captures = re_due_labeled().captures(&normalized)?;
    parse_plausible(captures.get(1)?.as_str())
}

/// A line mentioning "VENCIMENTO": take the date on that line, or failing
/// that scan the next 3 lines. Lines carrying an ignore keyword are skipped
/// rather than aborting the scan, because OCR interleaves table columns.
fn from_label_line(text: &str) -> Option<NaiveDate> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();

    for (i, line) in lines.iter().enumerate() {
        let upper = line.to_uppercase();
        if !upper.contains("VENCIMENTO") && !upper.contains("VENC.") {
            continue;
        }
        if has_ignore_keyword(&upper) {
            continue;
        }

        if let Some(date) = first_date_on(line) {
            return Some(date);
        }

        for next in lines.iter().skip(i + 1).take(3) {
            if has_ignore_keyword(&next.to_uppercase()) {
                continue;
            }
            if let Some(date) = first_date_on(next) {
                return Some(date);
            }
        }
    }
    None
}

/// Table fallback: locate the line carrying the extracted total and take
/// the last plausible date on it (the layout is usually
/// "reference | due date | amount").
fn from_amount_line(text: &str) -> Option<NaiveDate> {
    let amount = extract_amount(text)?;
    let formatted = amount.to_string();
    let rounded_reais = (amount.cents() + 50) / 100;

    for line in text.lines() {
        let has_amount = line.contains(&formatted)
            || line.contains(&format!("{rounded_reais},"))
            || line.contains(&format!("{rounded_reais}."));
        if !has_amount {
            continue;
        }

        let upper = line.to_uppercase();
        if upper.contains("LEITURA") || upper.contains("PREV") {
            continue;
        }

        let last = re_date()
            .find_iter(line)
            .filter_map(|m| parse_plausible(m.as_str()))
            .last();
        if last.is_some() {
            return last;
        }
    }
    None
}

/// Last resort: any plausible date within [`PROXIMITY_WINDOW`] characters
/// after "VENCIMENTO", unless an ignore keyword sits within
/// [`CONTEXT_RADIUS`] characters of the candidate.
fn from_proximity_window(text: &str) -> Option<NaiveDate> {
    let normalized = normalize(text);
    let start = normalized.find("VENCIMENTO")?;
    let window: String = normalized[start..].chars().take(PROXIMITY_WINDOW).collect();

    for m in re_date().find_iter(&window) {
        let before: String = {
            let head = &window[..m.start()];
            let len = head.chars().count();
            head.chars().skip(len.saturating_sub(CONTEXT_RADIUS)).collect()
        };
        let after: String = window[m.end()..].chars().take(CONTEXT_RADIUS).collect();
        let context = format!("{before} {after}");
        if has_ignore_keyword(&context) {
            continue;
        }
        if let Some(date) = parse_plausible(m.as_str()) {
            return Some(date);
        }
    }
    None
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

fn has_ignore_keyword(upper: &str) -> bool {
    IGNORE_KEYWORDS.iter().any(|keyword| upper.contains(keyword))
}

fn first_date_on(line: &str) -> Option<NaiveDate> {
    re_date()
        .find_iter(line)
        .find_map(|m| parse_plausible(m.as_str()))
}

/// Parses `DD/MM/YYYY` (or `-`-separated, or 2-digit year) and rejects
/// anything outside day 1-31, month 1-12, year 2020-2100.
fn parse_plausible(value: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = value.split(['/', '-']).collect();
    if parts.len() != 3 {
        return None;
    }

    let day: u32 = parts[0].parse().ok()?;
    let month: u32 = parts[1].parse().ok()?;
    let mut year: i32 = parts[2].parse().ok()?;
    if year < 100 {
        year += 2000;
    }
    if !(1..=31).contains(&day) || !(1..=12).contains(&month) || !(2020..=2100).contains(&year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn table_row_wins() {
        let text = "EDP Energia\nNOV/2025 03/12/2025 240,55\nLEITURA 15/11/2025";
        assert_eq!(extract_due_date(text), Some(date(2025, 12, 3)));
    }

    #[test]
    fn labeled_date() {
        assert_eq!(
            extract_due_date("VENCIMENTO: 15/03/2025"),
            Some(date(2025, 3, 15))
        );
        assert_eq!(
            extract_due_date("DATA DE VENCIMENTO 01-04-25"),
            Some(date(2025, 4, 1))
        );
    }

    #[test]
    fn label_line_scans_following_lines() {
        let text = "VENCIMENTO\nLEITURA PREVISTA 20/03/2025\n15/04/2025";
        assert_eq!(extract_due_date(text), Some(date(2025, 4, 15)));
    }

    #[test]
    fn reading_dates_are_ignored() {
        // The only labeled date sits on a reading-forecast line; nothing
        // else qualifies.
        let text = "LEITURA PREVISTA: 20/03/2025";
        assert_eq!(extract_due_date(text), None);
    }

    #[test]
    fn amount_line_takes_last_date() {
        // No VENCIMENTO label at all: fall back to the line carrying the
        // total and take the last date on it.
        let text = "Conta de luz\n10/11/2025 03/12/2025 240,55\nTOTAL A PAGAR 240,55";
        assert_eq!(extract_due_date(text), Some(date(2025, 12, 3)));
    }

    #[test]
    fn implausible_dates_rejected() {
        assert_eq!(extract_due_date("VENCIMENTO: 32/13/2025"), None);
        assert_eq!(extract_due_date("VENCIMENTO: 15/03/2019"), None);
        assert_eq!(extract_due_date("sem data nenhuma"), None);
    }

    #[test]
    fn two_digit_years_promoted() {
        assert_eq!(
            extract_due_date("VENCIMENTO: 03/12/25"),
            Some(date(2025, 12, 3))
        );
    }
}
