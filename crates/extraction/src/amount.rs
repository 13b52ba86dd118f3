//! Heuristics for the total amount of a scanned utility bill.

use engine::MoneyCents;

use crate::patterns::{re_amount_any, re_amount_labeled, re_amount_total_a_pagar};

/// Upper sanity bound: amounts of R$ 1.000.000,00 or more are OCR noise,
/// not a utility bill total.
const MAX_PLAUSIBLE_CENTS: i64 = 100_000_000;

/// Finds the invoice total in OCR text.
///
/// Label-anchored patterns win, most specific first ("TOTAL A PAGAR", then
/// the generic total labels). When no label matches, falls back to the
/// largest plausible Brazilian-formatted value on the page, which on utility
/// bills is normally the total.
pub fn extract_amount(text: &str) -> Option<MoneyCents> {
    let normalized = normalize(text);

    for pattern in [re_amount_total_a_pagar(), re_amount_labeled()] {
        if let Some(captures) = pattern.captures(&normalized)
            && let Some(amount) = parse_plausible(captures.get(1)?.as_str())
        {
            return Some(amount);
        }
    }

    re_amount_any()
        .captures_iter(&normalized)
        .filter_map(|captures| parse_plausible(captures.get(1)?.as_str()))
        .max()
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

fn parse_plausible(value: &str) -> Option<MoneyCents> {
    let amount: MoneyCents = value.parse().ok()?;
    (amount.is_positive() && amount.cents() < MAX_PLAUSIBLE_CENTS).then_some(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_a_pagar_label_wins() {
        let text = "Consumo 120,00\nTOTAL A PAGAR: R$ 240,55\nLeitura 999,99";
        assert_eq!(extract_amount(text), Some(MoneyCents::new(24_055)));
    }

    #[test]
    fn generic_label_used_when_specific_absent() {
        let text = "VALOR TOTAL 1.240,55\noutros 90,00";
        assert_eq!(extract_amount(text), Some(MoneyCents::new(124_055)));
    }

    #[test]
    fn falls_back_to_largest_value() {
        let text = "leitura 12,30\nconsumo 240,55\ntaxa 10,00";
        assert_eq!(extract_amount(text), Some(MoneyCents::new(24_055)));
    }

    #[test]
    fn implausible_values_are_skipped() {
        // Label matching is strict about the Brazilian format, and the
        // fallback drops anything at or above a million reais.
        let text = "TOTAL A PAGAR 9.999.999,99\nconsumo 240,55";
        assert_eq!(extract_amount(text), Some(MoneyCents::new(24_055)));
    }

    #[test]
    fn no_amount_in_text() {
        assert_eq!(extract_amount("nenhum valor aqui"), None);
        assert_eq!(extract_amount(""), None);
    }
}
