//! Vendor vocabulary lookup for the bill category.

use engine::InvoiceCategory;

const ELECTRICITY_KEYWORDS: [&str; 3] = ["EDP", "ENERGIA", "ELÉTRICA"];
const WATER_KEYWORDS: [&str; 3] = ["SABESP", "ÁGUA", "SANEPAR"];
const TELECOM_KEYWORDS: [&str; 6] = ["TELEFONE", "TELEFONIA", "VIVO", "TIM", "CLARO", "OI"];

/// Identifies the bill category from vendor names and service words in the
/// OCR text. Vocabularies are checked in a fixed order (electricity, water,
/// telecom) so a page mentioning several utilities resolves
/// deterministically.
pub fn identify_category(text: &str) -> Option<InvoiceCategory> {
    let upper = text.to_uppercase();

    if contains_any(&upper, &ELECTRICITY_KEYWORDS) {
        return Some(InvoiceCategory::Electricity);
    }
    if contains_any(&upper, &WATER_KEYWORDS) {
        return Some(InvoiceCategory::Water);
    }
    if contains_any(&upper, &TELECOM_KEYWORDS) {
        return Some(InvoiceCategory::Telecom);
    }
    None
}

fn contains_any(upper: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| upper.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_each_vocabulary() {
        assert_eq!(
            identify_category("EDP São Paulo - conta de energia"),
            Some(InvoiceCategory::Electricity)
        );
        assert_eq!(
            identify_category("Sabesp saneamento básico"),
            Some(InvoiceCategory::Water)
        );
        assert_eq!(
            identify_category("vivo fibra - fatura"),
            Some(InvoiceCategory::Telecom)
        );
    }

    #[test]
    fn electricity_wins_over_later_vocabularies() {
        assert_eq!(
            identify_category("ENERGIA para bombeamento de ÁGUA"),
            Some(InvoiceCategory::Electricity)
        );
    }

    #[test]
    fn unknown_vendor() {
        assert_eq!(identify_category("boleto de condomínio"), None);
    }
}
