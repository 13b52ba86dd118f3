//! Compiled regex cache shared by the heuristics.

use std::sync::OnceLock;

use regex::Regex;

macro_rules! re {
    ($name:ident, $pat:expr) => {
        pub(crate) fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

// Amounts in the Brazilian convention: optional thousands dots, comma
// decimals (240,55 / 1.240,55).
re!(
    re_amount_total_a_pagar,
    r"TOTAL\s+A\s+PAGAR[:\s]*(?:R\$\s*)?(\d{1,3}(?:\.\d{3})*,\d{2})"
);
re!(
    re_amount_labeled,
    r"(?:TOTAL|VALOR\s+TOTAL|VALOR\s+A\s+PAGAR)[:\s]*(?:R\$\s*)?(\d{1,3}(?:\.\d{3})*,\d{2})"
);
re!(re_amount_any, r"(\d{1,3}(?:\.\d{3})*,\d{2})");

// Dates as DD/MM/YYYY or DD-MM-YY variants.
re!(re_date, r"(\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4})");

// Table row common on utility bills: "NOV/2025 03/12/2025 240,55"
// (reference month, due date, amount).
re!(
    re_table_row,
    r"(?i)[A-Z]{3}/\d{4}\s+(\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4})\s+[\d.,]+"
);

// "VENCIMENTO"-anchored forms, most specific first.
re!(
    re_due_labeled,
    r"(?:DATA\s+DE\s+VENCIMENTO|VENCIMENTO|VENC\.?)[:\s]+(\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4})"
);
