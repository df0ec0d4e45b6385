//! Money and tax arithmetic.
//!
//! All amounts are rounded to 2 decimal places *per line*, before summation.
//! Summing first and rounding once would produce different document totals on
//! fractional inputs, and stored line amounts would no longer add up to the
//! stored totals.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round to 2 decimal places, half away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Tolerance absorbing rounding drift when comparing paid amounts against an
/// invoice total. Not a business allowance.
pub fn payment_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

/// Computed amounts for a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAmounts {
    /// Pre-tax amount.
    pub ht: Decimal,
    /// Tax amount.
    pub tva: Decimal,
    pub total: Decimal,
}

/// Pricing input for one line of a document.
#[derive(Debug, Clone, Copy)]
pub struct PricedLine {
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub tax_rate_percent: Decimal,
}

/// Aggregate totals for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocumentTotals {
    pub subtotal: Decimal,
    pub tax_total: Decimal,
    pub total: Decimal,
}

/// Compute HT/TVA/total for one line.
///
/// Callers validate quantity > 0 and unit_price >= 0 before reaching this
/// function; it never clamps.
pub fn compute_line(quantity: Decimal, unit_price: Decimal, tax_rate_percent: Decimal) -> LineAmounts {
    debug_assert!(quantity > Decimal::ZERO);
    debug_assert!(unit_price >= Decimal::ZERO);
    debug_assert!(tax_rate_percent >= Decimal::ZERO && tax_rate_percent <= Decimal::ONE_HUNDRED);

    let ht = round2(quantity * unit_price);
    let tva = round2(ht * tax_rate_percent / Decimal::ONE_HUNDRED);
    let total = round2(ht + tva);

    LineAmounts { ht, tva, total }
}

/// Compute document totals as the element-wise sum of per-line amounts.
pub fn compute_document(lines: &[PricedLine]) -> DocumentTotals {
    let mut totals = DocumentTotals::default();
    for line in lines {
        let amounts = compute_line(line.quantity, line.unit_price, line.tax_rate_percent);
        totals.subtotal += amounts.ht;
        totals.tax_total += amounts.tva;
        totals.total += amounts.total;
    }
    totals
}
