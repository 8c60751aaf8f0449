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

//! Amount text parsing.
//!
//! The grammar accepted is:
//!
//! ```text
//! amount     := ['-'] (quantity [ws] [symbol] | symbol [ws] ['-'] quantity) annotation*
//! quantity   := ['.' | ','] digit (digit | '.' | ',')*
//! symbol     := '"' any-but-quote+ '"' | symbol-char+
//! annotation := '{' ['='] amount '}' | '{{' ['='] amount '}}' | '[' date ']' | '(' tag ')'
//! ```
//!
//! The decimal mark of a quantity is resolved from the separators present and the decimal
//! style of the commodity it belongs to. Unless told otherwise, parsing records the observed
//! style and precision on the commodity so later amounts render the way they were written.

use std::str::FromStr;

use bitflags::bitflags;
use rust_decimal::Decimal;
use tally_core::{datetime::parse_date, string::split_quoted};

use crate::{
    commodities::{
        Annotation, AnnotationFlags, CommodityFlags, CommodityPool, commodity::symbol_needs_quotes,
    },
    error::{ModelError, ModelResult},
    types::{Amount, precision::MAX_PRECISION},
};

bitflags! {
    /// Options controlling how amount text is parsed.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ParseFlags: u8 {
        /// Tolerate trailing text after the amount.
        const PARTIAL = 1 << 0;
        /// Parse a bare amount without lot annotations.
        const SINGLE = 1 << 1;
        /// Do not record the observed style and precision on the commodity.
        const NO_MIGRATE = 1 << 2;
        /// Do not convert to the smallest linked unit.
        const NO_REDUCE = 1 << 3;
        /// Fail on unknown symbols instead of registering them.
        const NO_ASSIGN = 1 << 4;
        /// Return a null amount instead of an error.
        const SOFT_FAIL = 1 << 5;
    }
}

/// Separator style observed while reading a quantity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QuantityStyle {
    /// A comma was read as the decimal mark.
    pub decimal_comma: bool,
    /// Thousands separators were present.
    pub thousands: bool,
}

fn is_symbol_char(c: char) -> bool {
    !symbol_needs_quotes(c.encode_utf8(&mut [0; 4]))
}

/// Reads a commodity symbol from the start of `text`, skipping leading whitespace.
///
/// Returns the raw symbol and the remaining text, or `None` if no symbol starts there.
///
/// # Errors
///
/// Returns [`ModelError::Parse`] if a quoted symbol is never closed or is empty.
pub fn scan_symbol(text: &str) -> ModelResult<Option<(String, &str)>> {
    let s = text.trim_start();
    if s.starts_with('"') {
        return match split_quoted(s) {
            Some(("", _)) => Err(ModelError::parse(text, "empty quoted commodity symbol")),
            Some((symbol, rest)) => Ok(Some((symbol.to_string(), rest))),
            None => Err(ModelError::parse(text, "unterminated quoted commodity symbol")),
        };
    }
    let end = s.find(|c: char| !is_symbol_char(c)).unwrap_or(s.len());
    if end == 0 {
        return Ok(None);
    }
    Ok(Some((s[..end].to_string(), &s[end..])))
}

/// Splits the digits and separators of a quantity from the start of `text`.
///
/// A quantity may open with a decimal mark (`.5`) and end with a period (`5.`). Returns `None`
/// if `text` does not start with a digit or a separator followed by a digit.
#[must_use]
pub fn scan_quantity(text: &str) -> Option<(&str, &str)> {
    let digits = text.strip_prefix(['.', ',']).unwrap_or(text);
    if !digits.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let end = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
        .unwrap_or(text.len());
    // A trailing comma belongs to the surrounding text
    let end = text[..end].trim_end_matches(',').len();
    Some((&text[..end], &text[end..]))
}

/// Converts the digits and separators of a quantity into a decimal and its precision.
///
/// With both `.` and `,` present the later one is the decimal mark. With one kind only it
/// is a thousands separator when repeated, or when it disagrees with `decimal_comma` and is
/// followed by exactly three digits. Otherwise it is the decimal mark.
///
/// # Errors
///
/// Returns [`ModelError::Parse`] if the separators are inconsistent or too many fractional
/// digits are given.
pub fn resolve_quantity(
    raw: &str,
    decimal_comma: bool,
) -> ModelResult<(Decimal, u8, QuantityStyle)> {
    let last_dot = raw.rfind('.');
    let last_comma = raw.rfind(',');
    let count = |c: char| raw.matches(c).count();

    let (decimal_mark, thousands): (Option<char>, Option<char>) = match (last_dot, last_comma) {
        (None, None) => (None, None),
        (Some(dot), Some(comma)) if dot > comma => (Some('.'), Some(',')),
        (Some(_), Some(_)) => (Some(','), Some('.')),
        (Some(_), None) | (None, Some(_)) => {
            let sep = if last_dot.is_some() { '.' } else { ',' };
            let style_mark = if decimal_comma { ',' } else { '.' };
            let digits_after = raw.len() - raw.rfind(sep).map_or(raw.len(), |pos| pos + 1);
            if count(sep) > 1 || (sep != style_mark && digits_after == 3) {
                (None, Some(sep))
            } else {
                (Some(sep), None)
            }
        }
    };

    if let Some(mark) = decimal_mark
        && count(mark) > 1
    {
        return Err(ModelError::parse(raw, "more than one decimal mark"));
    }

    let (integral, fraction) = match decimal_mark {
        Some(mark) => raw.split_once(mark).unwrap_or((raw, "")),
        None => (raw, ""),
    };
    let mut integral: String = integral.chars().filter(char::is_ascii_digit).collect();
    if integral.is_empty() {
        integral.push('0');
    }

    let precision = u8::try_from(fraction.len())
        .ok()
        .filter(|p| *p <= MAX_PRECISION)
        .ok_or_else(|| ModelError::parse(raw, "too many fractional digits"))?;

    let normalized = if fraction.is_empty() {
        integral
    } else {
        format!("{integral}.{fraction}")
    };
    let quantity = Decimal::from_str(&normalized)
        .map_err(|e| ModelError::parse(raw, e.to_string()))?;

    let style = QuantityStyle {
        decimal_comma: decimal_mark == Some(','),
        thousands: thousands.is_some(),
    };
    log::trace!("Resolved quantity '{raw}' as {quantity} (precision {precision})");
    Ok((quantity, precision, style))
}

fn closing(text: &str, close: &str, what: &str) -> ModelResult<(usize, usize)> {
    text.find(close)
        .map(|pos| (pos, pos + close.len()))
        .ok_or_else(|| ModelError::parse(text, format!("unterminated lot {what}")))
}

/// Reads lot annotations following an amount of `quantity` units.
///
/// Returns the annotation, which may be empty, and the remaining text.
///
/// # Errors
///
/// Returns [`ModelError::Parse`] if a detail is malformed or given twice.
pub fn parse_annotation<'a>(
    text: &'a str,
    quantity: Decimal,
    pool: &mut CommodityPool,
) -> ModelResult<(Annotation, &'a str)> {
    let mut details = Annotation::default();
    let mut rest = text;

    loop {
        let s = rest.trim_start();
        if let Some(inner) = s.strip_prefix('{') {
            if details.price.is_some() {
                return Err(ModelError::parse(text, "lot price given twice"));
            }
            let (total, inner, close) = match inner.strip_prefix('{') {
                Some(inner) => (true, inner, "}}"),
                None => (false, inner, "}"),
            };
            let (end, next) = closing(inner, close, "price")?;
            let mut price_text = inner[..end].trim();
            if let Some(fixated) = price_text.strip_prefix('=') {
                details.add_flags(AnnotationFlags::PRICE_FIXATED);
                price_text = fixated.trim_start();
            }
            let mut price = Amount::parse(price_text, pool, ParseFlags::NO_MIGRATE)?;
            if total {
                details.add_flags(AnnotationFlags::PRICE_NOT_PER_UNIT);
                if !quantity.is_zero() {
                    price = price.checked_div(&Amount::from(quantity.abs()))?;
                }
            }
            details.price = Some(price);
            rest = &inner[next..];
        } else if let Some(inner) = s.strip_prefix('[') {
            if details.date.is_some() {
                return Err(ModelError::parse(text, "lot date given twice"));
            }
            let (end, next) = closing(inner, "]", "date")?;
            let date =
                parse_date(inner[..end].trim()).map_err(|e| ModelError::parse(text, e.to_string()))?;
            details.date = Some(date);
            rest = &inner[next..];
        } else if let Some(inner) = s.strip_prefix('(') {
            if details.tag.is_some() {
                return Err(ModelError::parse(text, "lot tag given twice"));
            }
            let (end, next) = closing(inner, ")", "tag")?;
            details.tag = Some(inner[..end].to_string());
            rest = &inner[next..];
        } else {
            return Ok((details, rest));
        }
    }
}

/// Parses an amount from the start of `text`, returning it with the unconsumed text.
///
/// # Errors
///
/// Returns [`ModelError::Parse`] for malformed text, or [`ModelError::CommodityNotFound`] when
/// [`ParseFlags::NO_ASSIGN`] is set and the symbol is not registered.
pub fn parse_amount<'a>(
    text: &'a str,
    pool: &mut CommodityPool,
    flags: ParseFlags,
) -> ModelResult<(Amount, &'a str)> {
    let fail = |reason: &str| ModelError::parse(text, reason);

    let s = text.trim_start();
    let (mut negative, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, s),
    };

    let (symbol, raw, rest, suffixed, separated) = match scan_quantity(s) {
        Some((raw, after)) => {
            let trimmed = after.trim_start();
            match scan_symbol(after)? {
                Some((symbol, rest)) => {
                    (Some(symbol), raw, rest, true, trimmed.len() < after.len())
                }
                None => (None, raw, after, false, false),
            }
        }
        None => {
            let (symbol, after) = scan_symbol(s)?.ok_or_else(|| fail("no quantity specified"))?;
            let trimmed = after.trim_start();
            let separated = trimmed.len() < after.len();
            let trimmed = match trimmed.strip_prefix('-') {
                Some(unsigned) => {
                    negative = !negative;
                    unsigned
                }
                None => trimmed,
            };
            let (raw, rest) = scan_quantity(trimmed).ok_or_else(|| fail("no quantity specified"))?;
            (Some(symbol), raw, rest, false, separated)
        }
    };

    let mut newly_created = false;
    let commodity = match symbol.as_deref() {
        None | Some("") => None,
        Some(symbol) => {
            if flags.contains(ParseFlags::NO_ASSIGN) && !pool.contains(symbol) {
                return Err(ModelError::not_found(symbol));
            }
            newly_created = !pool.contains(symbol);
            Some(pool.find_or_create(symbol, None))
        }
    };

    let decimal_comma = commodity.as_ref().map_or_else(
        || pool.decimal_comma_by_default(),
        |c| c.has_flags(CommodityFlags::STYLE_DECIMAL_COMMA),
    );
    let (mut quantity, precision, style) = resolve_quantity(raw, decimal_comma)?;
    if negative {
        quantity.set_sign_negative(!quantity.is_zero());
    }

    // A commodity always takes on the style it was first seen with
    if let Some(commodity) = &commodity
        && (newly_created
            || (!flags.contains(ParseFlags::NO_MIGRATE)
                && !commodity.has_flags(CommodityFlags::STYLE_NO_MIGRATE)))
    {
        let mut observed = CommodityFlags::empty();
        observed.set(CommodityFlags::STYLE_SUFFIXED, suffixed);
        observed.set(CommodityFlags::STYLE_SEPARATED, separated);
        observed.set(CommodityFlags::STYLE_DECIMAL_COMMA, style.decimal_comma);
        observed.set(CommodityFlags::STYLE_THOUSANDS, style.thousands);
        commodity.add_flags(observed);
        if precision > commodity.precision() {
            commodity.set_precision(precision);
        }
    }

    let (details, rest) = if flags.contains(ParseFlags::SINGLE) {
        (Annotation::default(), rest)
    } else {
        parse_annotation(rest, quantity, pool)?
    };

    let mut amount = Amount::from_parts(quantity, precision, commodity.as_ref());
    if !details.is_empty() {
        match &commodity {
            Some(commodity) => {
                let annotated = pool.find_or_create(&commodity.base_symbol(), Some(&details));
                amount.set_commodity(Some(&annotated));
            }
            None => amount.annotate(details),
        }
    }

    if !flags.contains(ParseFlags::NO_REDUCE) {
        amount.in_place_reduce()?;
    }

    log::trace!("Parsed amount '{}' as {amount}", text.trim());
    Ok((amount, rest))
}
