//! Sequential document numbering.
//!
//! Numbers are scoped per organization and year and formatted as
//! `PREFIX-YYYY-NNNN` (FAC for invoices, DEV for quotes). The sequence itself
//! comes from an atomically incremented counter row; this module only formats.

use crate::domain::status::DocumentKind;

pub fn format_number(kind: DocumentKind, year: i32, seq: i64) -> String {
    format!("{}-{}-{:04}", kind.number_prefix(), year, seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_numbers_use_fac_prefix() {
        assert_eq!(format_number(DocumentKind::Invoice, 2026, 1), "FAC-2026-0001");
    }

    #[test]
    fn quote_numbers_use_dev_prefix() {
        assert_eq!(format_number(DocumentKind::Quote, 2026, 42), "DEV-2026-0042");
    }

    #[test]
    fn sequence_is_zero_padded_to_four_digits() {
        assert_eq!(format_number(DocumentKind::Invoice, 2025, 999), "FAC-2025-0999");
        assert_eq!(format_number(DocumentKind::Invoice, 2025, 1000), "FAC-2025-1000");
        // Padding never truncates past four digits.
        assert_eq!(format_number(DocumentKind::Invoice, 2025, 12345), "FAC-2025-12345");
    }
}
