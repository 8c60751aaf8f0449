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

//! Number formatting utilities.

use rust_decimal::{Decimal, RoundingStrategy};

/// How the integral digits are grouped and which character marks the fraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NumberStyle {
    /// Character inserted between groups of three integral digits, if any.
    pub thousands: Option<char>,
    /// Character separating the integral and fractional digits.
    pub decimal_mark: char,
}

impl NumberStyle {
    /// `1234.56`
    pub const PLAIN: Self = Self {
        thousands: None,
        decimal_mark: '.',
    };

    /// Creates a style from the two flags a commodity carries.
    #[must_use]
    pub const fn new(thousands: bool, decimal_comma: bool) -> Self {
        let (decimal_mark, sep) = if decimal_comma { (',', '.') } else { ('.', ',') };
        Self {
            thousands: if thousands { Some(sep) } else { None },
            decimal_mark,
        }
    }
}

impl Default for NumberStyle {
    fn default() -> Self {
        Self::PLAIN
    }
}

fn separate_with(s: &str, style: NumberStyle) -> String {
    let (neg, digits) = if let Some(rest) = s.strip_prefix('-') {
        (true, rest)
    } else {
        (false, s)
    };

    let (int_part, dec_part) = match digits.find('.') {
        Some(pos) => (&digits[..pos], Some(&digits[pos + 1..])),
        None => (digits, None),
    };

    let mut result = String::with_capacity(s.len() + int_part.len() / 3);

    if neg {
        result.push('-');
    }

    let chars: Vec<char> = int_part.chars().collect();
    for (i, c) in chars.iter().enumerate() {
        if let Some(sep) = style.thousands
            && i > 0
            && (chars.len() - i).is_multiple_of(3)
        {
            result.push(sep);
        }
        result.push(*c);
    }

    if let Some(dec) = dec_part {
        result.push(style.decimal_mark);
        result.push_str(dec);
    }

    result
}

/// Renders `value` with exactly `precision` fractional digits, rounding half away from zero.
#[must_use]
pub fn format_decimal(value: Decimal, precision: u32, style: NumberStyle) -> String {
    let mut rounded = value.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(precision);
    if rounded.is_zero() {
        // Avoid rendering a negative zero such as "-0.00"
        rounded.set_sign_positive(true);
    }
    separate_with(&rounded.to_string(), style)
}

/// Renders `value` with at most `precision` fractional digits, dropping trailing zeros beyond
/// `min_precision`.
#[must_use]
pub fn format_decimal_trimmed(
    value: Decimal,
    precision: u32,
    min_precision: u32,
    style: NumberStyle,
) -> String {
    let text = format_decimal(value, precision, NumberStyle::PLAIN);
    let trimmed = match text.find('.') {
        Some(dot) => {
            let keep = dot + 1 + min_precision as usize;
            let mut end = text.len();
            while end > keep && text.as_bytes()[end - 1] == b'0' {
                end -= 1;
            }
            if end == dot + 1 { &text[..dot] } else { &text[..end] }
        }
        None => text.as_str(),
    };
    separate_with(trimmed, style)
}

/// Extension trait for formatting numbers with separators.
pub trait Separable {
    /// Formats the number with commas as thousand separators.
    fn separate_with_commas(&self) -> String;

    /// Formats the number with the given style.
    fn separate_with_style(&self, style: NumberStyle) -> String;
}

macro_rules! impl_separable {
    ($($t:ty),*) => {
        $(
            impl Separable for $t {
                fn separate_with_commas(&self) -> String {
                    separate_with(&self.to_string(), NumberStyle::new(true, false))
                }

                fn separate_with_style(&self, style: NumberStyle) -> String {
                    separate_with(&self.to_string(), style)
                }
            }
        )*
    };
}

impl_separable!(i32, i64, i128, u32, u64, Decimal);

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use rust_decimal_macros::dec;

    use super::*;

    #[rstest]
    #[case(0, "0")]
    #[case(123, "123")]
    #[case(1234, "1,234")]
    #[case(123456, "123,456")]
    #[case(1234567, "1,234,567")]
    #[case(-1234, "-1,234")]
    fn test_separate_with_commas(#[case] input: i64, #[case] expected: &str) {
        assert_eq!(input.separate_with_commas(), expected);
    }

    #[rstest]
    #[case(NumberStyle::PLAIN, "1234567.89")]
    #[case(NumberStyle::new(true, false), "1,234,567.89")]
    #[case(NumberStyle::new(false, true), "1234567,89")]
    #[case(NumberStyle::new(true, true), "1.234.567,89")]
    fn test_separate_with_style(#[case] style: NumberStyle, #[case] expected: &str) {
        assert_eq!(dec!(1234567.89).separate_with_style(style), expected);
    }

    #[rstest]
    #[case(dec!(0.666666666), 8, "0.66666667")]
    #[case(dec!(0.666666666), 2, "0.67")]
    #[case(dec!(2), 2, "2.00")]
    #[case(dec!(-0.001), 2, "0.00")]
    #[case(dec!(1.005), 2, "1.01")]
    #[case(dec!(-1.005), 2, "-1.01")]
    #[case(dec!(10.7), 0, "11")]
    fn test_format_decimal(#[case] value: Decimal, #[case] precision: u32, #[case] expected: &str) {
        assert_eq!(format_decimal(value, precision, NumberStyle::PLAIN), expected);
    }

    #[rstest]
    #[case(dec!(10.000), 3, 0, "10")]
    #[case(dec!(0.100), 3, 0, "0.1")]
    #[case(dec!(-2.50), 2, 0, "-2.5")]
    #[case(dec!(1), 8, 2, "1.00")]
    #[case(dec!(0.6666666666), 8, 2, "0.66666667")]
    #[case(dec!(0.5), 8, 2, "0.50")]
    fn test_format_decimal_trimmed(
        #[case] value: Decimal,
        #[case] precision: u32,
        #[case] min_precision: u32,
        #[case] expected: &str,
    ) {
        assert_eq!(
            format_decimal_trimmed(value, precision, min_precision, NumberStyle::PLAIN),
            expected
        );
    }
}
