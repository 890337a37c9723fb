//! Money arithmetic for order totals.
//!
//! Prices are `rust_decimal::Decimal` end to end (`NUMERIC(12,2)` in storage),
//! so a total is an exact sum and never drifts the way binary floats do.

use rust_decimal::Decimal;

/// Largest quantity accepted on one order line.
pub const MAX_LINE_QUANTITY: i32 = 1_000_000;

/// Largest amount a `NUMERIC(12,2)` money column holds: 9,999,999,999.99.
#[must_use]
pub fn max_storable_amount() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

/// Whether `amount` can be written to a money column without overflow.
#[must_use]
pub fn fits_storage(amount: Decimal) -> bool {
    amount <= max_storable_amount()
}

/// Total for one line: `unit_price × quantity`.
#[must_use]
pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

/// Sum of `unit_price × quantity` over every line.
///
/// Takes `(unit_price, quantity)` pairs so callers can feed resolved
/// snapshot prices straight in.
#[must_use]
pub fn order_total<I>(lines: I) -> Decimal
where
    I: IntoIterator<Item = (Decimal, i32)>,
{
    lines
        .into_iter()
        .map(|(unit_price, quantity)| line_total(unit_price, quantity))
        .sum()
}
