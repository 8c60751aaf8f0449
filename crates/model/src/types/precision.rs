// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2026 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Functions for handling decimal precision.
//!
//! Quantities are stored as [`Decimal`] values which carry up to [`MAX_PRECISION`] fractional
//! digits. Alongside the magnitude every amount records a *stored precision*: the number of
//! fractional digits that are meaningful for that amount. Arithmetic derives the stored
//! precision of its result from the operands:
//!
//! | Operation | Result precision                           |
//! |-----------|--------------------------------------------|
//! | `a + b`   | max of both operands.                      |
//! | `a - b`   | max of both operands.                      |
//! | `a * b`   | sum of both operands.                      |
//! | `a / b`   | sum of both operands + [`EXTEND_BY_DIGITS`]. |
//!
//! When the amount has a commodity and is not keeping full precision, the product and quotient
//! precision is capped at the commodity precision plus [`EXTEND_BY_DIGITS`].

use rust_decimal::{Decimal, RoundingStrategy, prelude::FromPrimitive};
use tally_core::correctness::check_in_range_inclusive_u8;

/// The maximum number of fractional digits a quantity can hold.
pub const MAX_PRECISION: u8 = 28;

/// The number of extra digits kept when dividing.
pub const EXTEND_BY_DIGITS: u8 = 6;

/// The maximum precision that can be safely used with f64-based constructors.
pub const MAX_FLOAT_PRECISION: u8 = 16;

/// Checks if a given `precision` value is within the allowed range.
///
/// # Errors
///
/// Returns an error if `precision` exceeds [`MAX_PRECISION`].
pub fn check_precision(precision: u8) -> anyhow::Result<()> {
    check_in_range_inclusive_u8(precision, 0, MAX_PRECISION, "precision")
}

/// Returns the stored precision of a sum or difference.
#[must_use]
pub fn sum_precision(lhs: u8, rhs: u8) -> u8 {
    lhs.max(rhs)
}

/// Returns the stored precision of a product.
#[must_use]
pub fn product_precision(lhs: u8, rhs: u8, cap: Option<u8>) -> u8 {
    apply_cap(lhs.saturating_add(rhs), cap)
}

/// Returns the stored precision of a quotient.
#[must_use]
pub fn quotient_precision(lhs: u8, rhs: u8, cap: Option<u8>) -> u8 {
    apply_cap(
        lhs.saturating_add(rhs).saturating_add(EXTEND_BY_DIGITS),
        cap,
    )
}

/// Returns the cap applied to derived precision for a commodity of `display_precision`.
#[must_use]
pub fn commodity_cap(display_precision: u8) -> u8 {
    display_precision.saturating_add(EXTEND_BY_DIGITS)
}

fn apply_cap(precision: u8, cap: Option<u8>) -> u8 {
    let precision = cap.map_or(precision, |cap| precision.min(cap));
    precision.min(MAX_PRECISION)
}

/// Returns the number of fractional digits carried by `value`.
#[must_use]
pub fn decimal_precision(value: Decimal) -> u8 {
    u8::try_from(value.scale()).unwrap_or(MAX_PRECISION)
}

/// Rounds half away from zero to `precision` fractional digits.
#[must_use]
pub fn round_half_up(value: Decimal, precision: u8) -> Decimal {
    value.round_dp_with_strategy(u32::from(precision), RoundingStrategy::MidpointAwayFromZero)
}

/// Truncates toward zero to `precision` fractional digits.
#[must_use]
pub fn truncate(value: Decimal, precision: u8) -> Decimal {
    value.round_dp_with_strategy(u32::from(precision), RoundingStrategy::ToZero)
}

/// Rounds toward negative infinity to a whole unit.
#[must_use]
pub fn floor_whole(value: Decimal) -> Decimal {
    value.floor()
}

/// Converts a finite `f64` to a [`Decimal`] keeping at most [`MAX_FLOAT_PRECISION`] digits.
///
/// # Errors
///
/// Returns an error if `value` is NaN or infinite, or too large to represent.
pub fn decimal_from_f64(value: f64) -> anyhow::Result<Decimal> {
    if !value.is_finite() {
        anyhow::bail!("invalid f64 for a quantity, was {value}");
    }
    let decimal = Decimal::from_f64(value)
        .ok_or_else(|| anyhow::anyhow!("f64 {value} is out of range for a quantity"))?;
    Ok(decimal
        .round_dp(u32::from(MAX_FLOAT_PRECISION))
        .normalize())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use rust_decimal_macros::dec;

    use super::*;

    #[rstest]
    #[case(0)]
    #[case(8)]
    #[case(MAX_PRECISION)]
    fn test_valid_precision(#[case] precision: u8) {
        assert!(check_precision(precision).is_ok());
    }

    #[rstest]
    fn test_invalid_precision() {
        assert!(check_precision(MAX_PRECISION + 1).is_err());
    }

    #[rstest]
    #[case(2, 0, None, 8)]
    #[case(2, 0, Some(8), 8)]
    #[case(4, 4, Some(8), 8)]
    #[case(20, 20, None, MAX_PRECISION)]
    fn test_quotient_precision(
        #[case] lhs: u8,
        #[case] rhs: u8,
        #[case] cap: Option<u8>,
        #[case] expected: u8,
    ) {
        assert_eq!(quotient_precision(lhs, rhs, cap), expected);
    }

    #[rstest]
    #[case(2, 2, None, 4)]
    #[case(2, 8, Some(8), 8)]
    fn test_product_precision(
        #[case] lhs: u8,
        #[case] rhs: u8,
        #[case] cap: Option<u8>,
        #[case] expected: u8,
    ) {
        assert_eq!(product_precision(lhs, rhs, cap), expected);
    }

    #[rstest]
    #[case(dec!(0.665), 2, dec!(0.67))]
    #[case(dec!(-0.665), 2, dec!(-0.67))]
    #[case(dec!(0.664), 2, dec!(0.66))]
    fn test_round_half_up(#[case] value: Decimal, #[case] precision: u8, #[case] expected: Decimal) {
        assert_eq!(round_half_up(value, precision), expected);
    }

    #[rstest]
    #[case(dec!(0.669), 2, dec!(0.66))]
    #[case(dec!(-0.669), 2, dec!(-0.66))]
    fn test_truncate(#[case] value: Decimal, #[case] precision: u8, #[case] expected: Decimal) {
        assert_eq!(truncate(value, precision), expected);
    }

    #[rstest]
    #[case(dec!(0.66666667), dec!(0))]
    #[case(dec!(10.7), dec!(10))]
    #[case(dec!(-0.5), dec!(-1))]
    fn test_floor_whole(#[case] value: Decimal, #[case] expected: Decimal) {
        assert_eq!(floor_whole(value), expected);
    }

    #[rstest]
    #[case(10.7, dec!(10.7))]
    #[case(0.1, dec!(0.1))]
    #[case(-3.0, dec!(-3))]
    fn test_decimal_from_f64(#[case] value: f64, #[case] expected: Decimal) {
        assert_eq!(decimal_from_f64(value).unwrap(), expected);
    }

    #[rstest]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_decimal_from_f64_invalid(#[case] value: f64) {
        assert!(decimal_from_f64(value).is_err());
    }
}
