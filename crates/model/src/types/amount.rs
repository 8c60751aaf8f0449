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

//! Represents a signed quantity of a single commodity.

use std::{
    cmp::Ordering,
    fmt::{Debug, Display},
    hash::{Hash, Hasher},
    ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign},
};

use chrono::NaiveDateTime;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use tally_core::{
    correctness::FAILED,
    formatting::{NumberStyle, format_decimal, format_decimal_trimmed},
};

use super::precision::{
    MAX_PRECISION, commodity_cap, decimal_from_f64, decimal_precision, floor_whole,
    product_precision, quotient_precision, round_half_up, sum_precision, truncate,
};
use crate::{
    commodities::{
        Annotation, AnnotationFlags, Commodity, CommodityFlags, CommodityPool, KeepDetails,
    },
    error::{ModelError, ModelResult},
    parsing::{ParseFlags, parse_amount},
};

/// The maximum number of conversion links followed when reducing or converting an amount.
const MAX_LINK_DEPTH: usize = 16;

/// A signed decimal quantity with an optional commodity and lot annotation.
///
/// The stored precision records how many fractional digits the quantity is known to; it is
/// independent of the display precision of the commodity. Amounts render at the commodity's
/// precision unless `keep_precision` is set.
///
/// A null amount is the uninitialized state. It renders as an empty string and behaves as zero
/// in arithmetic.
#[derive(Clone)]
pub struct Amount {
    quantity: Decimal,
    precision: u8,
    keep_precision: bool,
    null: bool,
    commodity: Option<Commodity>,
    annotation: Option<Box<Annotation>>,
}

impl Default for Amount {
    /// Creates a null [`Amount`].
    fn default() -> Self {
        Self::null()
    }
}

impl Amount {
    /// Creates a null [`Amount`].
    #[must_use]
    pub const fn null() -> Self {
        Self {
            quantity: Decimal::ZERO,
            precision: 0,
            keep_precision: false,
            null: true,
            commodity: None,
            annotation: None,
        }
    }

    /// Creates a new [`Amount`] instance whose stored precision is the scale of `quantity`.
    #[must_use]
    pub fn new(quantity: Decimal, commodity: Option<&Commodity>) -> Self {
        Self::from_parts(quantity, decimal_precision(quantity), commodity)
    }

    pub(crate) fn from_parts(quantity: Decimal, precision: u8, commodity: Option<&Commodity>) -> Self {
        Self {
            quantity,
            precision: precision.min(MAX_PRECISION),
            keep_precision: false,
            null: false,
            commodity: commodity.filter(|c| !c.is_null()).cloned(),
            annotation: None,
        }
    }

    /// Creates a new [`Amount`] instance from an `f64` with correctness checking.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not finite or out of range.
    pub fn new_checked(value: f64, commodity: Option<&Commodity>) -> anyhow::Result<Self> {
        Ok(Self::new(decimal_from_f64(value)?, commodity))
    }

    /// Parses an amount such as `$-10.00`, `10,00 EUR` or `5 AAPL {$150} [2021/03/01] (lot)`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Parse`] for malformed text or unexpected trailing text (unless
    /// [`ParseFlags::PARTIAL`] is set). With [`ParseFlags::SOFT_FAIL`] every failure yields a
    /// null amount instead.
    pub fn parse(text: &str, pool: &mut CommodityPool, flags: ParseFlags) -> ModelResult<Self> {
        let parsed = parse_amount(text, pool, flags).and_then(|(amount, rest)| {
            if flags.contains(ParseFlags::PARTIAL) || rest.trim().is_empty() {
                Ok(amount)
            } else {
                Err(ModelError::parse(text, format!("unexpected trailing text '{}'", rest.trim())))
            }
        });
        match parsed {
            Err(e) if flags.contains(ParseFlags::SOFT_FAIL) => {
                log::trace!("Soft failure parsing amount: {e}");
                Ok(Self::null())
            }
            other => other,
        }
    }

    /// Parses an amount keeping every digit given, without touching the commodity's style.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Parse`] for malformed text.
    pub fn exact(text: &str, pool: &mut CommodityPool) -> ModelResult<Self> {
        let mut amount = Self::parse(text, pool, ParseFlags::NO_MIGRATE)?;
        amount.keep_precision = true;
        Ok(amount)
    }

    /// Registers a fixed conversion between the commodities of two amounts, e.g. `1.0h` and
    /// `60m`.
    ///
    /// # Errors
    ///
    /// Returns an error if either amount is malformed or lacks a commodity.
    pub fn parse_conversion(larger: &str, smaller: &str, pool: &mut CommodityPool) -> ModelResult<()> {
        pool.parse_conversion(larger, smaller)
    }

    // -- Accessors -------------------------------------------------------------------------------

    #[must_use]
    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    /// Returns the stored precision.
    #[must_use]
    pub fn precision(&self) -> u8 {
        self.precision
    }

    #[must_use]
    pub fn keep_precision(&self) -> bool {
        self.keep_precision
    }

    pub fn set_keep_precision(&mut self, keep: bool) {
        self.keep_precision = keep;
    }

    /// Returns the number of fractional digits the amount renders with.
    #[must_use]
    pub fn display_precision(&self) -> u8 {
        match &self.commodity {
            Some(commodity) if self.keep_precision => self.precision.max(commodity.precision()),
            Some(commodity) => commodity.precision(),
            None => self.precision,
        }
    }

    /// Returns `true` for the uninitialized amount.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.null
    }

    #[must_use]
    pub fn commodity(&self) -> Option<&Commodity> {
        self.commodity.as_ref()
    }

    #[must_use]
    pub fn has_commodity(&self) -> bool {
        self.commodity.is_some()
    }

    /// Relabels the amount with `commodity`. The null commodity clears it.
    pub fn set_commodity(&mut self, commodity: Option<&Commodity>) {
        self.commodity = commodity.filter(|c| !c.is_null()).cloned();
    }

    pub fn clear_commodity(&mut self) {
        self.commodity = None;
    }

    /// Returns the amount expressed in `commodity`.
    ///
    /// When `commodity` is reachable through registered conversion links the quantity is
    /// converted; otherwise the amount is relabeled.
    #[must_use]
    pub fn with_commodity(&self, commodity: Option<&Commodity>) -> Self {
        if let (Some(own), Some(target)) = (&self.commodity, commodity)
            && !own.same_referent(target)
            && let Some(converted) = self.convert_along_links(target)
        {
            return converted;
        }
        let mut relabeled = self.clone();
        relabeled.set_commodity(commodity);
        relabeled
    }

    fn convert_along_links(&self, target: &Commodity) -> Option<Self> {
        self.follow_links(target, Commodity::smaller, Self::checked_mul)
            .or_else(|| self.follow_links(target, Commodity::larger, Self::checked_div))
    }

    fn follow_links(
        &self,
        target: &Commodity,
        link: fn(&Commodity) -> Option<Self>,
        step: fn(&Self, &Self) -> ModelResult<Self>,
    ) -> Option<Self> {
        let mut current = self.clone();
        for _ in 0..MAX_LINK_DEPTH {
            let next = link(current.commodity.as_ref()?)?;
            current = step(&current, &next.number()).ok()?;
            current.set_commodity(next.commodity());
            if current.commodity.as_ref()?.same_referent(target) {
                return Some(current);
            }
        }
        None
    }

    /// Returns the bare quantity without commodity or annotation.
    #[must_use]
    pub fn number(&self) -> Self {
        Self {
            quantity: self.quantity,
            precision: self.precision,
            keep_precision: self.keep_precision,
            null: self.null,
            commodity: None,
            annotation: None,
        }
    }

    // -- Annotations -----------------------------------------------------------------------------

    /// Returns the lot details, from the annotated commodity or the amount itself.
    #[must_use]
    pub fn annotation(&self) -> Option<&Annotation> {
        self.commodity
            .as_ref()
            .and_then(Commodity::details)
            .or(self.annotation.as_deref())
    }

    #[must_use]
    pub fn has_annotation(&self) -> bool {
        self.annotation().is_some()
    }

    /// Attaches lot details. An amount with a commodity moves onto the annotated form of it.
    pub fn annotate(&mut self, details: Annotation) {
        if details.is_empty() {
            return;
        }
        match &self.commodity {
            Some(commodity) => {
                if let Some(price) = &details.price {
                    let mask = if details.has_flags(AnnotationFlags::PRICE_FIXATED) {
                        CommodityFlags::SAW_ANN_PRICE_FIXATED
                    } else {
                        CommodityFlags::SAW_ANN_PRICE_FLOAT
                    };
                    log::trace!("Annotating {} with price {price}", commodity.symbol());
                    commodity.add_flags(mask | CommodityFlags::SAW_ANNOTATED);
                }
                self.commodity = Some(commodity.referent().annotate(details));
            }
            None => self.annotation = Some(Box::new(details)),
        }
    }

    /// Returns a copy carrying `details` as its lot annotation.
    #[must_use]
    pub fn annotated(&self, details: Annotation) -> Self {
        let mut amount = self.clone();
        amount.annotate(details);
        amount
    }

    /// Returns a copy holding only the lot details `keep` retains.
    #[must_use]
    pub fn strip_annotations(&self, keep: &KeepDetails) -> Self {
        let mut amount = self.clone();
        amount.commodity = self.commodity.as_ref().map(|c| c.strip_annotations(keep));
        amount.annotation = self
            .annotation
            .as_deref()
            .map(|details| details.filtered(keep, false))
            .filter(|details| !details.is_empty())
            .map(Box::new);
        amount
    }

    /// Returns the per-unit lot price, if the amount is annotated with one.
    #[must_use]
    pub fn price(&self) -> Option<Self> {
        self.annotation().and_then(|details| details.price.clone())
    }

    // -- Predicates and conversions --------------------------------------------------------------

    /// Returns -1, 0 or 1 according to the sign of the quantity.
    #[must_use]
    pub fn sign(&self) -> i32 {
        match self.quantity.cmp(&Decimal::ZERO) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        }
    }

    /// Returns `true` if the amount renders as zero at its display precision.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        round_half_up(self.quantity, self.display_precision()).is_zero()
    }

    /// Returns `true` if the stored quantity is exactly zero.
    #[must_use]
    pub fn is_realzero(&self) -> bool {
        self.quantity.is_zero()
    }

    #[must_use]
    pub fn is_nonzero(&self) -> bool {
        !self.is_zero()
    }

    #[must_use]
    pub fn to_double(&self) -> f64 {
        self.quantity.to_f64().unwrap_or_default()
    }

    /// Returns the quantity rounded to the nearest integer.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Overflow`] if the result does not fit in an `i64`.
    pub fn to_long(&self) -> ModelResult<i64> {
        round_half_up(self.quantity, 0)
            .to_i64()
            .ok_or(ModelError::Overflow("conversion to integer"))
    }

    /// Returns `true` if [`Self::to_long`] would succeed.
    #[must_use]
    pub fn fits_in_long(&self) -> bool {
        self.to_long().is_ok()
    }

    fn number_style(&self) -> NumberStyle {
        self.commodity
            .as_ref()
            .map_or(NumberStyle::PLAIN, Commodity::number_style)
    }

    fn render_quantity(&self, keep_precision: bool) -> String {
        let style = self.number_style();
        match &self.commodity {
            Some(commodity) if keep_precision => format_decimal(
                self.quantity,
                u32::from(self.precision.max(commodity.precision())),
                style,
            ),
            Some(commodity) => {
                format_decimal(self.quantity, u32::from(commodity.precision()), style)
            }
            None if keep_precision => {
                format_decimal(self.quantity, u32::from(self.precision), style)
            }
            None => format_decimal_trimmed(self.quantity, u32::from(self.precision), 0, style),
        }
    }

    /// Renders the quantity alone at display precision.
    #[must_use]
    pub fn quantity_string(&self) -> String {
        if self.null {
            return String::new();
        }
        self.render_quantity(self.keep_precision)
    }

    fn render(&self, keep_precision: bool) -> String {
        if self.null {
            return String::new();
        }
        let number = self.render_quantity(keep_precision);
        let mut out = match &self.commodity {
            None => number,
            Some(commodity) => {
                let gap = if commodity.has_flags(CommodityFlags::STYLE_SEPARATED) {
                    " "
                } else {
                    ""
                };
                if commodity.has_flags(CommodityFlags::STYLE_SUFFIXED) {
                    format!("{number}{gap}{}", commodity.symbol())
                } else {
                    format!("{}{gap}{number}", commodity.symbol())
                }
            }
        };
        if let Some(details) = self.annotation() {
            out.push_str(&details.write_annotations(false));
        }
        out
    }

    /// Renders the amount with every stored digit.
    #[must_use]
    pub fn to_fullstring(&self) -> String {
        self.render(true)
    }

    // -- Arithmetic ------------------------------------------------------------------------------

    fn check_compatible(&self, other: &Self, op: &'static str) -> ModelResult<()> {
        if let (Some(lhs), Some(rhs)) = (&self.commodity, &other.commodity)
            && lhs != rhs
        {
            return Err(ModelError::incompatible(op, self, other));
        }
        if let (Some(lhs), Some(rhs)) = (&self.annotation, &other.annotation)
            && lhs != rhs
        {
            return Err(ModelError::incompatible(op, self, other));
        }
        Ok(())
    }

    fn combined(&self, other: &Self, quantity: Decimal, precision: u8) -> Self {
        Self {
            quantity,
            precision,
            keep_precision: self.keep_precision,
            null: false,
            commodity: self.commodity.clone().or_else(|| other.commodity.clone()),
            annotation: self.annotation.clone().or_else(|| other.annotation.clone()),
        }
    }

    fn precision_cap(&self, other: &Self) -> Option<u8> {
        let commodity = self.commodity.as_ref().or(other.commodity.as_ref())?;
        if self.keep_precision {
            None
        } else {
            Some(commodity_cap(commodity.precision()))
        }
    }

    /// Adds two amounts of compatible commodities.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IncompatibleCommodity`] if both amounts carry different commodities
    /// or lot annotations, or [`ModelError::Overflow`] if the sum is out of range.
    pub fn checked_add(&self, other: &Self) -> ModelResult<Self> {
        self.check_compatible(other, "add")?;
        let quantity = self
            .quantity
            .checked_add(other.quantity)
            .ok_or(ModelError::Overflow("addition"))?;
        Ok(self.combined(other, quantity, sum_precision(self.precision, other.precision)))
    }

    /// Subtracts two amounts of compatible commodities.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IncompatibleCommodity`] if both amounts carry different commodities
    /// or lot annotations, or [`ModelError::Overflow`] if the difference is out of range.
    pub fn checked_sub(&self, other: &Self) -> ModelResult<Self> {
        self.check_compatible(other, "subtract")?;
        let quantity = self
            .quantity
            .checked_sub(other.quantity)
            .ok_or(ModelError::Overflow("subtraction"))?;
        Ok(self.combined(other, quantity, sum_precision(self.precision, other.precision)))
    }

    /// Multiplies two amounts. The result carries the left commodity, or else the right one.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Overflow`] if the product is out of range.
    pub fn checked_mul(&self, other: &Self) -> ModelResult<Self> {
        let quantity = self
            .quantity
            .checked_mul(other.quantity)
            .ok_or(ModelError::Overflow("multiplication"))?;
        let precision =
            product_precision(self.precision, other.precision, self.precision_cap(other));
        Ok(self.combined(other, quantity, precision))
    }

    /// Divides two amounts. The result carries the left commodity, or else the right one.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DivideByZero`] if `other` is zero, or [`ModelError::Overflow`] if
    /// the quotient is out of range.
    pub fn checked_div(&self, other: &Self) -> ModelResult<Self> {
        if other.quantity.is_zero() {
            return Err(ModelError::DivideByZero);
        }
        let quantity = self
            .quantity
            .checked_div(other.quantity)
            .ok_or(ModelError::Overflow("division"))?;
        let precision =
            quotient_precision(self.precision, other.precision, self.precision_cap(other));
        Ok(self.combined(other, quantity, precision))
    }

    /// Promotes a raw number to an amount in this amount's commodity.
    #[must_use]
    pub fn promote(&self, value: Decimal) -> Self {
        Self::new(value, self.commodity.as_ref())
    }

    #[must_use]
    pub fn negated(&self) -> Self {
        let mut amount = self.clone();
        amount.in_place_negate();
        amount
    }

    pub fn in_place_negate(&mut self) {
        self.quantity = -self.quantity;
    }

    #[must_use]
    pub fn abs(&self) -> Self {
        let mut amount = self.clone();
        amount.quantity = self.quantity.abs();
        amount
    }

    /// Returns the reciprocal.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DivideByZero`] if the quantity is zero.
    pub fn inverted(&self) -> ModelResult<Self> {
        if self.quantity.is_zero() {
            return Err(ModelError::DivideByZero);
        }
        let mut amount = self.clone();
        amount.quantity = Decimal::ONE
            .checked_div(self.quantity)
            .ok_or(ModelError::Overflow("inversion"))?;
        amount.precision = quotient_precision(0, self.precision, self.precision_cap(self));
        Ok(amount)
    }

    /// Compares two amounts by quantity.
    ///
    /// An amount without a commodity compares against any commodity.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IncompatibleCommodity`] if both carry different commodities.
    pub fn compare(&self, other: &Self) -> ModelResult<Ordering> {
        self.check_compatible(other, "compare")?;
        Ok(self.quantity.cmp(&other.quantity))
    }

    // -- Rounding --------------------------------------------------------------------------------

    fn rounding_precision(&self) -> u8 {
        self.commodity
            .as_ref()
            .map_or(self.precision, Commodity::precision)
    }

    /// Returns the amount rounded half away from zero to its display precision.
    #[must_use]
    pub fn rounded(&self) -> Self {
        let mut amount = self.clone();
        amount.in_place_round();
        amount
    }

    pub fn in_place_round(&mut self) {
        let precision = self.rounding_precision();
        self.quantity = round_half_up(self.quantity, precision);
        self.precision = precision;
        self.keep_precision = false;
    }

    /// Returns the amount truncated toward zero at its display precision.
    #[must_use]
    pub fn truncated(&self) -> Self {
        let mut amount = self.clone();
        amount.in_place_truncate();
        amount
    }

    pub fn in_place_truncate(&mut self) {
        let precision = self.rounding_precision();
        self.quantity = truncate(self.quantity, precision);
        self.precision = precision;
    }

    /// Returns the amount rounded toward negative infinity to a whole unit.
    #[must_use]
    pub fn floored(&self) -> Self {
        let mut amount = self.clone();
        amount.in_place_floor();
        amount
    }

    pub fn in_place_floor(&mut self) {
        self.quantity = floor_whole(self.quantity);
    }

    /// Returns the amount rendering every stored digit.
    #[must_use]
    pub fn unrounded(&self) -> Self {
        let mut amount = self.clone();
        amount.in_place_unround();
        amount
    }

    pub fn in_place_unround(&mut self) {
        self.keep_precision = true;
    }

    // -- Unit conversion -------------------------------------------------------------------------

    /// Returns the amount expressed in the smallest unit linked to its commodity.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Overflow`] if the conversion is out of range.
    pub fn reduced(&self) -> ModelResult<Self> {
        let mut amount = self.clone();
        amount.in_place_reduce()?;
        Ok(amount)
    }

    /// Converts the amount in place into the smallest unit linked to its commodity.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Overflow`] if the conversion is out of range.
    pub fn in_place_reduce(&mut self) -> ModelResult<()> {
        for _ in 0..MAX_LINK_DEPTH {
            let Some(smaller) = self.commodity.as_ref().and_then(Commodity::smaller) else {
                break;
            };
            let mut reduced = self.checked_mul(&smaller.number())?;
            reduced.set_commodity(smaller.commodity());
            *self = reduced;
        }
        Ok(())
    }

    /// Returns the amount expressed in the largest linked unit it amounts to at least one of.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Overflow`] if the conversion is out of range.
    pub fn unreduced(&self) -> ModelResult<Self> {
        let mut amount = self.clone();
        amount.in_place_unreduce()?;
        Ok(amount)
    }

    /// Converts the amount in place into the largest linked unit it amounts to at least one of.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Overflow`] if the conversion is out of range.
    pub fn in_place_unreduce(&mut self) -> ModelResult<()> {
        for _ in 0..MAX_LINK_DEPTH {
            let Some(larger) = self.commodity.as_ref().and_then(Commodity::larger) else {
                break;
            };
            let mut next = self.checked_div(&larger.number())?;
            if next.quantity.abs() < Decimal::ONE {
                break;
            }
            next.set_commodity(larger.commodity());
            *self = next;
        }
        Ok(())
    }

    // -- Valuation -------------------------------------------------------------------------------

    /// Returns the worth of the amount in `target`, or in whatever its latest price is quoted in.
    ///
    /// A fixated lot price takes precedence over market prices. Returns `None` when the amount
    /// has no commodity or no qualifying price is recorded.
    #[must_use]
    pub fn value(&self, target: Option<&Commodity>, moment: Option<NaiveDateTime>) -> Option<Self> {
        let commodity = self.commodity.as_ref()?;
        if target.is_none() && commodity.has_flags(CommodityFlags::PRIMARY) {
            return None;
        }

        let mut in_terms_of = target.cloned();
        let mut price = None;
        if let Some(details) = self.annotation()
            && let Some(lot_price) = &details.price
        {
            if details.has_flags(AnnotationFlags::PRICE_FIXATED) {
                price = Some(lot_price.clone());
            } else if target.is_none() {
                in_terms_of = lot_price.commodity().cloned();
            }
        }

        if let Some(in_terms_of) = &in_terms_of
            && commodity.same_referent(in_terms_of)
        {
            return Some(self.with_commodity(Some(&in_terms_of.referent())));
        }

        if price.is_none() {
            let referent = commodity.referent();
            let found = referent.find_price(in_terms_of.as_ref(), moment, None);
            let updated = referent.check_for_updated_price(found.as_ref(), moment, in_terms_of.as_ref());
            price = updated.or(found).map(|point| point.price);
        }

        let price = price?;
        price.checked_mul(&self.number()).ok()
    }

    /// Returns `false` if the amount is structurally unsound.
    #[must_use]
    pub fn valid(&self) -> bool {
        if self.precision > MAX_PRECISION {
            log::debug!("Amount precision {} exceeds maximum", self.precision);
            return false;
        }
        if self.null && (!self.quantity.is_zero() || self.commodity.is_some()) {
            log::debug!("Null amount carries a quantity or commodity");
            return false;
        }
        if let Some(commodity) = &self.commodity
            && !commodity.valid()
        {
            return false;
        }
        self.annotation.as_deref().is_none_or(Annotation::valid)
    }
}

// -- Traits ---------------------------------------------------------------------------------------

impl PartialEq for Amount {
    fn eq(&self, other: &Self) -> bool {
        self.null == other.null
            && self.quantity == other.quantity
            && self.commodity == other.commodity
            && self.annotation == other.annotation
    }
}

impl Eq for Amount {}

impl Hash for Amount {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.null.hash(state);
        self.quantity.hash(state);
        self.commodity.hash(state);
        self.annotation.hash(state);
    }
}

impl PartialOrd for Amount {
    /// Orders amounts of the same commodity and annotation by quantity.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.commodity != other.commodity || self.annotation != other.annotation {
            return None;
        }
        Some(self.quantity.cmp(&other.quantity))
    }
}

impl PartialEq<i64> for Amount {
    fn eq(&self, other: &i64) -> bool {
        !self.null && self.quantity == Decimal::from(*other)
    }
}

impl PartialOrd<i64> for Amount {
    fn partial_cmp(&self, other: &i64) -> Option<Ordering> {
        Some(self.quantity.cmp(&Decimal::from(*other)))
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self::new(value, None)
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self::new(Decimal::from(value), None)
    }
}

impl From<i32> for Amount {
    fn from(value: i32) -> Self {
        Self::new(Decimal::from(value), None)
    }
}

impl From<f64> for Amount {
    /// # Panics
    ///
    /// Panics if `value` is not finite or out of range.
    fn from(value: f64) -> Self {
        Self::new_checked(value, None).expect(FAILED)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render(self.keep_precision))
    }
}

impl Debug for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.null {
            return write!(f, "{}(<null>)", stringify!(Amount));
        }
        write!(f, "{}({})", stringify!(Amount), self.to_fullstring())
    }
}

// -- Operators ------------------------------------------------------------------------------------

macro_rules! impl_amount_op {
    ($trait:ident, $method:ident, $checked:ident) => {
        impl $trait<&Amount> for &Amount {
            type Output = Amount;

            /// # Panics
            ///
            /// Panics if the checked operation fails.
            fn $method(self, rhs: &Amount) -> Amount {
                self.$checked(rhs).unwrap_or_else(|e| panic!("{e}"))
            }
        }

        impl $trait for Amount {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self {
                (&self).$method(&rhs)
            }
        }
    };
}

impl_amount_op!(Add, add, checked_add);
impl_amount_op!(Sub, sub, checked_sub);
impl_amount_op!(Mul, mul, checked_mul);
impl_amount_op!(Div, div, checked_div);

macro_rules! impl_scalar_op {
    ($scalar:ty) => {
        impl Add<$scalar> for Amount {
            type Output = Self;

            fn add(self, rhs: $scalar) -> Self {
                let rhs = self.promote(Decimal::from(rhs));
                self + rhs
            }
        }

        impl Add<Amount> for $scalar {
            type Output = Amount;

            fn add(self, rhs: Amount) -> Amount {
                rhs.promote(Decimal::from(self)) + rhs
            }
        }

        impl Sub<$scalar> for Amount {
            type Output = Self;

            fn sub(self, rhs: $scalar) -> Self {
                let rhs = self.promote(Decimal::from(rhs));
                self - rhs
            }
        }

        impl Sub<Amount> for $scalar {
            type Output = Amount;

            fn sub(self, rhs: Amount) -> Amount {
                rhs.promote(Decimal::from(self)) - rhs
            }
        }

        impl Mul<$scalar> for Amount {
            type Output = Self;

            fn mul(self, rhs: $scalar) -> Self {
                self * Amount::from(Decimal::from(rhs))
            }
        }

        impl Mul<Amount> for $scalar {
            type Output = Amount;

            fn mul(self, rhs: Amount) -> Amount {
                rhs * Amount::from(Decimal::from(self))
            }
        }

        impl Div<$scalar> for Amount {
            type Output = Self;

            fn div(self, rhs: $scalar) -> Self {
                self / Amount::from(Decimal::from(rhs))
            }
        }

        impl Div<Amount> for $scalar {
            type Output = Amount;

            fn div(self, rhs: Amount) -> Amount {
                rhs.promote(Decimal::from(self)) / rhs
            }
        }
    };
}

impl_scalar_op!(i64);
impl_scalar_op!(i32);
impl_scalar_op!(Decimal);

impl Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self {
        self.negated()
    }
}

impl Neg for &Amount {
    type Output = Amount;

    fn neg(self) -> Amount {
        self.negated()
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        *self = &*self + &rhs;
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        *self = &*self - &rhs;
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::{
        commodities::PoolConfig,
        stubs::{datetime, pool},
    };

    fn parse(pool: &mut CommodityPool, text: &str) -> Amount {
        Amount::parse(text, pool, ParseFlags::empty()).unwrap()
    }

    #[rstest]
    fn test_null_amount() {
        let null = Amount::null();
        assert!(null.is_null());
        assert_eq!(null.to_string(), "");
        assert_eq!(format!("{null:?}"), "Amount(<null>)");
        assert_ne!(null, Amount::from(0));
        assert_eq!(Amount::default(), null);
        assert!(null.valid());
    }

    #[rstest]
    #[case("$-10.00", "$-10.00")]
    #[case("-$10.00", "$-10.00")]
    #[case("10 EUR", "10 EUR")]
    #[case("10.50EUR", "10.50EUR")]
    #[case("$ 1,000.5", "$ 1,000.5")]
    #[case("\"MY FUND\" 12", "\"MY FUND\" 12")]
    #[case("0.25", "0.25")]
    #[case("10.000", "10")]
    fn test_parse_and_display(mut pool: CommodityPool, #[case] text: &str, #[case] expected: &str) {
        assert_eq!(parse(&mut pool, text).to_string(), expected);
    }

    #[rstest]
    fn test_display_uses_widest_precision_seen(mut pool: CommodityPool) {
        let first = parse(&mut pool, "$1");
        parse(&mut pool, "$1.234");
        assert_eq!(first.to_string(), "$1.000");
        assert_eq!(first.to_fullstring(), "$1.000");
    }

    #[rstest]
    fn test_display_decimal_comma(mut pool: CommodityPool) {
        let amount = parse(&mut pool, "1.000,50 EUR");
        assert_eq!(amount.to_string(), "1.000,50 EUR");
        assert_eq!(amount.quantity(), dec!(1000.50));
        assert_eq!(amount.quantity_string(), "1.000,50");
    }

    #[rstest]
    fn test_decimal_comma_by_default() {
        let mut pool = CommodityPool::new(PoolConfig {
            decimal_comma_by_default: true,
            ..PoolConfig::default()
        });
        let amount = parse(&mut pool, "10,5 DKK");
        assert_eq!(amount.quantity(), dec!(10.5));
        assert_eq!(amount.to_string(), "10,5 DKK");
    }

    #[rstest]
    fn test_parse_trailing_text(mut pool: CommodityPool) {
        assert!(Amount::parse("10 EUR junk", &mut pool, ParseFlags::empty()).is_err());
        let amount = Amount::parse("10 EUR ; junk", &mut pool, ParseFlags::PARTIAL).unwrap();
        assert_eq!(amount.to_string(), "10 EUR");
    }

    #[rstest]
    fn test_parse_soft_fail(mut pool: CommodityPool) {
        let amount = Amount::parse("not an amount", &mut pool, ParseFlags::SOFT_FAIL).unwrap();
        assert!(amount.is_null());
    }

    #[rstest]
    fn test_exact_keeps_digits(mut pool: CommodityPool) {
        parse(&mut pool, "1 XAU");
        let amount = Amount::exact("1.2300 XAU", &mut pool).unwrap();
        assert!(amount.keep_precision());
        assert_eq!(amount.to_string(), "1.2300 XAU");
        assert_eq!(pool.get("XAU").unwrap().precision(), 0);
    }

    #[rstest]
    fn test_divide_keep_precision_then_round(mut pool: CommodityPool) {
        let mut amount = parse(&mut pool, "2.00 ZXC");
        amount.set_keep_precision(true);
        let third: Amount = amount / 3;
        assert_eq!(third.to_string(), "0.66666667 ZXC");
        assert_eq!(third.rounded().to_string(), "0.67 ZXC");
        assert!(!third.rounded().keep_precision());
    }

    #[rstest]
    fn test_floored(mut pool: CommodityPool) {
        let amount: Amount = parse(&mut pool, "2.00 ZXD") / 3;
        assert_eq!(amount.floored().to_string(), "0.00 ZXD");
        assert_eq!(parse(&mut pool, "-0.5 ZXD").floored().quantity(), dec!(-1));
    }

    #[rstest]
    fn test_truncated(mut pool: CommodityPool) {
        let mut amount: Amount = parse(&mut pool, "2.00 ZXE") / 3;
        amount.in_place_truncate();
        assert_eq!(amount.quantity(), dec!(0.66));
        assert_eq!(amount.to_string(), "0.66 ZXE");
    }

    #[rstest]
    fn test_unrounded(mut pool: CommodityPool) {
        let amount: Amount = parse(&mut pool, "2.00 ZXF") / 3;
        assert_eq!(amount.to_string(), "0.67 ZXF");
        assert_eq!(amount.unrounded().to_string(), "0.66666667 ZXF");
    }

    #[rstest]
    fn test_precision_rules(mut pool: CommodityPool) {
        let a = parse(&mut pool, "1.5 PRC");
        let b = parse(&mut pool, "2.25 PRC");
        assert_eq!((&a + &b).precision(), 2);
        assert_eq!((&a * &b).precision(), 3);
        assert_eq!((&a / &b).precision(), 8);
        assert_eq!((Amount::from(dec!(1.5)) / Amount::from(dec!(2.25))).precision(), 9);
    }

    #[rstest]
    fn test_add_incompatible_commodities(mut pool: CommodityPool) {
        let eur = parse(&mut pool, "10 EUR");
        let usd = parse(&mut pool, "10 USD");
        let err = eur.checked_add(&usd).unwrap_err();
        assert_eq!(err, ModelError::incompatible("add", "10 EUR", "10 USD"));
        assert!(eur.checked_sub(&usd).is_err());
        assert!(eur.compare(&usd).is_err());
        assert_eq!(eur.partial_cmp(&usd), None);
    }

    #[rstest]
    #[should_panic(expected = "Cannot add amounts with different commodities")]
    fn test_add_operator_panics_on_incompatible(mut pool: CommodityPool) {
        let _ = parse(&mut pool, "10 EUR") + parse(&mut pool, "10 USD");
    }

    #[rstest]
    fn test_add_commodity_less_promotes(mut pool: CommodityPool) {
        let eur = parse(&mut pool, "10 EUR");
        let sum = eur.checked_add(&Amount::from(5)).unwrap();
        assert_eq!(sum.to_string(), "15 EUR");
        assert_eq!((5_i64 + eur.clone()).to_string(), "15 EUR");
        assert_eq!((20_i64 - eur.clone()).to_string(), "10 EUR");
        assert_eq!((eur.clone() * 3_i64).to_string(), "30 EUR");
        assert_eq!((3_i64 * eur).to_string(), "30 EUR");
    }

    #[rstest]
    fn test_divide_by_zero(mut pool: CommodityPool) {
        let eur = parse(&mut pool, "10 EUR");
        assert_eq!(eur.checked_div(&Amount::from(0)).unwrap_err(), ModelError::DivideByZero);
        assert_eq!(Amount::from(0).inverted().unwrap_err(), ModelError::DivideByZero);
    }

    #[rstest]
    fn test_compare_commodity_less(mut pool: CommodityPool) {
        let eur = parse(&mut pool, "10 EUR");
        assert_eq!(eur.compare(&Amount::from(5)).unwrap(), Ordering::Greater);
        assert!(parse(&mut pool, "5 EUR") < eur);
        assert!(eur > 9);
        assert_eq!(Amount::from(10), 10);
    }

    #[rstest]
    fn test_sign_and_zero(mut pool: CommodityPool) {
        assert_eq!(parse(&mut pool, "$-1.00").sign(), -1);
        assert_eq!(Amount::from(0).sign(), 0);
        assert_eq!(Amount::from(3).sign(), 1);

        let tiny: Amount = parse(&mut pool, "$1.00") / 1000;
        assert!(tiny.is_zero());
        assert!(!tiny.is_realzero());
        assert!(!tiny.is_nonzero());
    }

    #[rstest]
    fn test_number_negate_abs(mut pool: CommodityPool) {
        let amount = parse(&mut pool, "$-12.50");
        assert_eq!(amount.number(), Amount::from(dec!(-12.50)));
        assert_eq!(amount.abs().to_string(), "$12.50");
        assert_eq!((-amount.clone()).to_string(), "$12.50");
        assert_eq!(amount.negated().negated(), amount);
    }

    #[rstest]
    fn test_to_long_and_double(mut pool: CommodityPool) {
        let amount = parse(&mut pool, "$12.50");
        assert_eq!(amount.to_long().unwrap(), 13);
        assert!(amount.fits_in_long());
        assert!((amount.to_double() - 12.5).abs() < f64::EPSILON);
        assert!(!Amount::from(Decimal::MAX).fits_in_long());
    }

    #[rstest]
    fn test_from_f64() {
        assert_eq!(Amount::from(10.7), Amount::from(dec!(10.7)));
        assert!(Amount::new_checked(f64::NAN, None).is_err());
    }

    #[rstest]
    fn test_annotate_and_strip(mut pool: CommodityPool) {
        let price = parse(&mut pool, "$150.00");
        let amount = parse(&mut pool, "10 AAPL");
        let details = Annotation::new(Some(price.clone()), None, Some("lot1".to_string()));
        let lot = amount.annotated(details.clone());

        assert!(lot.has_annotation());
        assert_eq!(lot.annotation(), Some(&details));
        assert_eq!(lot.price(), Some(price));
        assert_eq!(lot.to_string(), "10 AAPL {$150.00} (lot1)");
        assert_ne!(lot, amount);

        let stripped = lot.strip_annotations(&KeepDetails::default());
        assert_eq!(stripped, amount);
        let tag_only = lot.strip_annotations(&KeepDetails::new(false, false, true, false));
        assert_eq!(tag_only.to_string(), "10 AAPL (lot1)");
    }

    #[rstest]
    fn test_annotated_commodity_matches_registered(mut pool: CommodityPool) {
        let parsed = parse(&mut pool, "10 AAPL (lot1)");
        let built = parse(&mut pool, "10 AAPL").annotated(Annotation::with_tag("lot1"));
        assert_eq!(parsed, built);
        assert!(parsed.checked_add(&built).is_ok());
        assert!(parsed.checked_add(&parse(&mut pool, "1 AAPL")).is_err());
    }

    #[rstest]
    fn test_commodity_less_annotation() {
        let amount = Amount::from(10).annotated(Annotation::with_tag("x"));
        assert_eq!(amount.to_string(), "10 (x)");
        assert!(amount.has_annotation());
        assert!(!amount.strip_annotations(&KeepDetails::default()).has_annotation());
        assert!(amount.price().is_none());
    }

    #[rstest]
    fn test_reduce_and_unreduce() {
        let mut pool = CommodityPool::new(PoolConfig {
            time_units: true,
            ..PoolConfig::default()
        });
        let reduced = parse(&mut pool, "2.5h");
        assert_eq!(reduced.commodity().unwrap().symbol(), "s");
        assert_eq!(reduced.quantity(), dec!(9000));

        let unreduced = reduced.unreduced().unwrap();
        assert_eq!(unreduced.commodity().unwrap().symbol(), "h");
        assert_eq!(unreduced.quantity(), dec!(2.5));
        assert_eq!(unreduced.to_string(), "2.5h");

        let small = parse(&mut pool, "30s").unreduced().unwrap();
        assert_eq!(small.commodity().unwrap().symbol(), "s");

        let kept = Amount::parse("2.5h", &mut pool, ParseFlags::NO_REDUCE).unwrap();
        assert_eq!(kept.commodity().unwrap().symbol(), "h");
        assert_eq!(kept.reduced().unwrap(), reduced);
    }

    #[rstest]
    fn test_with_commodity_converts_along_links(mut pool: CommodityPool) {
        pool.parse_conversion("1 KG", "1000 G").unwrap();
        let grams = pool.get("G").unwrap();
        let kilos = pool.get("KG").unwrap();

        let amount = Amount::parse("2 KG", &mut pool, ParseFlags::NO_REDUCE).unwrap();
        assert_eq!(amount.with_commodity(Some(&grams)).quantity(), dec!(2000));

        let back = Amount::from(500).with_commodity(Some(&grams)).with_commodity(Some(&kilos));
        assert_eq!(back.quantity(), dec!(0.5));

        let eur = pool.find_or_create("EUR", None);
        let relabeled = amount.with_commodity(Some(&eur));
        assert_eq!(relabeled.quantity(), dec!(2));
        assert_eq!(relabeled.commodity(), Some(&eur));
    }

    #[rstest]
    fn test_parse_conversion_via_amount(mut pool: CommodityPool) {
        Amount::parse_conversion("100 FTR", "10 FTY", &mut pool).unwrap();
        let amount = parse(&mut pool, "20.00 FTR");
        assert_eq!(amount.commodity().unwrap().symbol(), "FTY");
        assert_eq!(amount.quantity(), dec!(2));
    }

    #[rstest]
    fn test_value_from_price_history(mut pool: CommodityPool) {
        let (gal, _) = pool.parse_price_directive("2020-01-15 GAL $3", false, false).unwrap();
        pool.parse_price_directive("2020-02-15 GAL $4", false, false).unwrap();
        let usd = pool.get("$").unwrap();
        let amount = parse(&mut pool, "10 GAL");

        let value = amount.value(Some(&usd), None).unwrap();
        assert_eq!(value.to_string(), "$40");
        let earlier = amount.value(Some(&usd), Some(datetime(2020, 1, 31))).unwrap();
        assert_eq!(earlier.to_string(), "$30");
        assert!(amount.value(Some(&usd), Some(datetime(2019, 1, 1))).is_none());
        assert_eq!(amount.value(None, None).unwrap().to_string(), "$40");
        assert!(Amount::from(10).value(Some(&usd), None).is_none());
        assert_eq!(gal.symbol(), "GAL");
    }

    #[rstest]
    fn test_value_uses_fixated_lot_price(mut pool: CommodityPool) {
        let amount = parse(&mut pool, "2 AAPL {=$100}");
        let usd = pool.get("$").unwrap();
        assert_eq!(amount.value(Some(&usd), None).unwrap().to_string(), "$200");
    }

    #[rstest]
    fn test_value_of_unpriced_is_none(mut pool: CommodityPool) {
        let amount = parse(&mut pool, "10 NOPRICE");
        assert!(amount.value(None, None).is_none());
    }

    #[rstest]
    fn test_valid(mut pool: CommodityPool) {
        assert!(parse(&mut pool, "10 EUR").valid());
        assert!(Amount::from(3).valid());
        let nested_price = Amount::from(1).annotated(Annotation::with_tag("inner"));
        let amount = Amount::from(3).annotated(Annotation::with_price(nested_price));
        assert!(!amount.valid());
    }

    proptest! {
        #[test]
        fn prop_add_then_sub_round_trips(
            a in -1_000_000_000i64..1_000_000_000,
            b in -1_000_000_000i64..1_000_000_000,
            scale_a in 0u32..6,
            scale_b in 0u32..6,
        ) {
            let mut pool = CommodityPool::default();
            let usd = pool.find_or_create("USD", None);
            let a = Amount::new(Decimal::new(a, scale_a), Some(&usd));
            let b = Amount::new(Decimal::new(b, scale_b), Some(&usd));
            let round_trip = a.checked_add(&b).unwrap().checked_sub(&b).unwrap();
            prop_assert_eq!(round_trip, a);
        }

        #[test]
        fn prop_negate_twice_is_identity(a in any::<i64>(), scale in 0u32..10) {
            let amount = Amount::from(Decimal::new(a, scale));
            prop_assert_eq!(amount.negated().negated(), amount);
        }
    }
}
