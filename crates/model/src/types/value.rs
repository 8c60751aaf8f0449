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

//! The dynamically typed value every calculation produces.
//!
//! A [`Value`] holds exactly one of a closed set of kinds. Binary operators promote the narrower
//! operand: an integer combined with an amount yields an amount, and any numeric kind combined
//! with a balance yields a balance. Amounts of different commodities never merge. Adding or
//! subtracting them produces a balance instead.

use std::{
    cmp::Ordering,
    fmt::Display,
    ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use rust_decimal::Decimal;
use tally_core::datetime::{format_date, format_datetime, parse_date, parse_datetime};

use super::{Amount, Balance, Mask};
use crate::{
    commodities::{Annotation, Commodity, CommodityPool, KeepDetails},
    enums::{BaseType, ValueType},
    error::{ModelError, ModelResult},
    parsing::{ParseFlags, resolve_quantity},
};

/// A value of one of the kinds listed in [`ValueType`].
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Void,
    Boolean(bool),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Integer(i64),
    Amount(Amount),
    Balance(Box<Balance>),
    String(String),
    Mask(Mask),
    Sequence(Vec<Value>),
}

fn unsupported(op: &'static str, left: &Value, right: &Value) -> ModelError {
    ModelError::UnsupportedOperation {
        op,
        left: left.label(),
        right: right.label(),
    }
}

fn invalid_cast(from: &Value, to: ValueType) -> ModelError {
    ModelError::InvalidCast {
        from: from.label(),
        to: to.label(),
    }
}

fn shift_date(date: NaiveDate, days: i64) -> ModelResult<NaiveDate> {
    TimeDelta::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or(ModelError::Overflow("date arithmetic"))
}

fn shift_datetime(datetime: NaiveDateTime, seconds: i64) -> ModelResult<NaiveDateTime> {
    TimeDelta::try_seconds(seconds)
        .and_then(|delta| datetime.checked_add_signed(delta))
        .ok_or(ModelError::Overflow("date arithmetic"))
}

fn elementwise(
    op: &'static str,
    lhs: &[Value],
    rhs: &[Value],
    f: fn(&Value, &Value) -> ModelResult<Value>,
) -> ModelResult<Value> {
    if lhs.len() != rhs.len() {
        return Err(ModelError::UnsupportedOperation {
            op,
            left: "a sequence",
            right: "a sequence of a different length",
        });
    }
    lhs.iter()
        .zip(rhs)
        .map(|(l, r)| f(l, r))
        .collect::<ModelResult<Vec<_>>>()
        .map(Value::Sequence)
}

impl Value {
    /// Parses `text` as an amount, creating its commodity in `pool` if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Parse`] if `text` is not an amount.
    pub fn parse(text: &str, pool: &mut CommodityPool) -> ModelResult<Self> {
        Amount::parse(text, pool, ParseFlags::empty()).map(Self::Amount)
    }

    /// Creates a commodity-less [`Value::Amount`] from an `f64` with correctness checking.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Parse`] if `value` is not finite or out of range.
    pub fn from_f64_checked(value: f64) -> ModelResult<Self> {
        Amount::new_checked(value, None)
            .map(Self::Amount)
            .map_err(|e| ModelError::parse(value.to_string(), e.to_string()))
    }

    // -- Kinds -----------------------------------------------------------------------------------

    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Void => ValueType::Void,
            Self::Boolean(_) => ValueType::Boolean,
            Self::DateTime(_) => ValueType::DateTime,
            Self::Date(_) => ValueType::Date,
            Self::Integer(_) => ValueType::Integer,
            Self::Amount(_) => ValueType::Amount,
            Self::Balance(_) => ValueType::Balance,
            Self::String(_) => ValueType::String,
            Self::Mask(_) => ValueType::Mask,
            Self::Sequence(_) => ValueType::Sequence,
        }
    }

    #[must_use]
    pub fn is_type(&self, kind: ValueType) -> bool {
        self.value_type() == kind
    }

    /// Returns the kind name with its article, such as "an amount".
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.value_type().label()
    }

    #[must_use]
    pub const fn basetype(&self) -> BaseType {
        self.value_type().basetype()
    }

    /// Returns `true` for [`Value::Void`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Void)
    }

    #[must_use]
    pub const fn is_boolean(&self) -> bool {
        matches!(self, Self::Boolean(_))
    }

    #[must_use]
    pub const fn is_datetime(&self) -> bool {
        matches!(self, Self::DateTime(_))
    }

    #[must_use]
    pub const fn is_date(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    #[must_use]
    pub const fn is_long(&self) -> bool {
        matches!(self, Self::Integer(_))
    }

    #[must_use]
    pub const fn is_amount(&self) -> bool {
        matches!(self, Self::Amount(_))
    }

    #[must_use]
    pub const fn is_balance(&self) -> bool {
        matches!(self, Self::Balance(_))
    }

    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    #[must_use]
    pub const fn is_mask(&self) -> bool {
        matches!(self, Self::Mask(_))
    }

    #[must_use]
    pub const fn is_sequence(&self) -> bool {
        matches!(self, Self::Sequence(_))
    }

    #[must_use]
    pub const fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::DateTime(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_long(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_amount(&self) -> Option<&Amount> {
        match self {
            Self::Amount(amount) => Some(amount),
            _ => None,
        }
    }

    pub fn as_amount_mut(&mut self) -> Option<&mut Amount> {
        match self {
            Self::Amount(amount) => Some(amount),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_balance(&self) -> Option<&Balance> {
        match self {
            Self::Balance(balance) => Some(balance),
            _ => None,
        }
    }

    pub fn as_balance_mut(&mut self) -> Option<&mut Balance> {
        match self {
            Self::Balance(balance) => Some(balance),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_mask(&self) -> Option<&Mask> {
        match self {
            Self::Mask(mask) => Some(mask),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Self]> {
        match self {
            Self::Sequence(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_sequence_mut(&mut self) -> Option<&mut Vec<Self>> {
        match self {
            Self::Sequence(values) => Some(values),
            _ => None,
        }
    }

    pub fn set_boolean(&mut self, value: bool) {
        *self = Self::Boolean(value);
    }

    pub fn set_datetime(&mut self, value: NaiveDateTime) {
        *self = Self::DateTime(value);
    }

    pub fn set_date(&mut self, value: NaiveDate) {
        *self = Self::Date(value);
    }

    pub fn set_long(&mut self, value: i64) {
        *self = Self::Integer(value);
    }

    pub fn set_amount(&mut self, value: Amount) {
        *self = Self::Amount(value);
    }

    pub fn set_balance(&mut self, value: Balance) {
        *self = Self::from(value);
    }

    pub fn set_string(&mut self, value: impl Into<String>) {
        *self = Self::String(value.into());
    }

    pub fn set_mask(&mut self, value: Mask) {
        *self = Self::Mask(value);
    }

    pub fn set_sequence(&mut self, value: Vec<Self>) {
        *self = Self::Sequence(value);
    }

    // -- Conversions -----------------------------------------------------------------------------

    /// Returns the truth of the value.
    ///
    /// Only `false`, void and numerically zero values are false. Strings are true when non-empty
    /// and sequences when any element is true.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidCast`] for a mask.
    pub fn to_boolean(&self) -> ModelResult<bool> {
        match self {
            Self::Void => Ok(false),
            Self::Boolean(value) => Ok(*value),
            Self::DateTime(_) | Self::Date(_) => Ok(true),
            Self::Integer(value) => Ok(*value != 0),
            Self::Amount(amount) => Ok(amount.is_nonzero()),
            Self::Balance(balance) => Ok(balance.is_nonzero()),
            Self::String(text) => Ok(!text.is_empty()),
            Self::Mask(_) => Err(invalid_cast(self, ValueType::Boolean)),
            Self::Sequence(values) => {
                for value in values {
                    if value.to_boolean()? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// Converts to an integer, rounding amounts to the nearest whole number.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidCast`] if the kind has no integer form, or the conversion
    /// errors of the held amount or balance.
    pub fn to_long(&self) -> ModelResult<i64> {
        match self {
            Self::Boolean(value) => Ok(i64::from(*value)),
            Self::Integer(value) => Ok(*value),
            Self::Amount(amount) => amount.to_long(),
            Self::Balance(balance) => balance.single_amount()?.to_long(),
            Self::String(text) => text
                .trim()
                .parse::<i64>()
                .map_err(|e| ModelError::parse(text.as_str(), e.to_string())),
            _ => Err(invalid_cast(self, ValueType::Integer)),
        }
    }

    /// Converts to a date-time. Dates convert to midnight.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidCast`] if the kind has no date-time form, or
    /// [`ModelError::Parse`] for a string that is not a date-time.
    pub fn to_datetime(&self) -> ModelResult<NaiveDateTime> {
        match self {
            Self::DateTime(value) => Ok(*value),
            Self::Date(value) => Ok(value.and_time(NaiveTime::MIN)),
            Self::String(text) => {
                parse_datetime(text).map_err(|e| ModelError::parse(text.as_str(), e.to_string()))
            }
            _ => Err(invalid_cast(self, ValueType::DateTime)),
        }
    }

    /// Converts to a date. Date-times drop their time of day.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidCast`] if the kind has no date form, or
    /// [`ModelError::Parse`] for a string that is not a date.
    pub fn to_date(&self) -> ModelResult<NaiveDate> {
        match self {
            Self::DateTime(value) => Ok(value.date()),
            Self::Date(value) => Ok(*value),
            Self::String(text) => {
                parse_date(text).map_err(|e| ModelError::parse(text.as_str(), e.to_string()))
            }
            _ => Err(invalid_cast(self, ValueType::Date)),
        }
    }

    /// Converts to an amount. A string must hold a plain number.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidCast`] if the kind has no amount form, or
    /// [`ModelError::AmbiguousConversion`] for a balance of several commodities.
    pub fn to_amount(&self) -> ModelResult<Amount> {
        match self {
            Self::Void => Ok(Amount::from(0)),
            Self::Integer(value) => Ok(Amount::from(*value)),
            Self::Amount(amount) => Ok(amount.clone()),
            Self::Balance(balance) => balance.single_amount(),
            Self::String(text) => Decimal::from_str(text.trim())
                .map(Amount::from)
                .map_err(|e| ModelError::parse(text.as_str(), e.to_string())),
            _ => Err(invalid_cast(self, ValueType::Amount)),
        }
    }

    /// Converts to a balance.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidCast`] if the kind has no balance form.
    pub fn to_balance(&self) -> ModelResult<Balance> {
        match self {
            Self::Void => Ok(Balance::new()),
            Self::Balance(balance) => Ok(balance.as_ref().clone()),
            Self::Integer(_) | Self::Amount(_) | Self::String(_) => {
                self.to_amount().map(Balance::from)
            }
            _ => Err(invalid_cast(self, ValueType::Balance)),
        }
    }

    /// Converts to a mask. Strings are compiled as patterns.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidCast`] if the kind has no mask form, or
    /// [`ModelError::Parse`] for an invalid pattern.
    pub fn to_mask(&self) -> ModelResult<Mask> {
        match self {
            Self::Mask(mask) => Ok(mask.clone()),
            Self::String(text) => {
                Mask::new_checked(text).map_err(|e| ModelError::parse(text.as_str(), e.to_string()))
            }
            _ => Err(invalid_cast(self, ValueType::Mask)),
        }
    }

    /// Returns the elements of a sequence, or the value itself as a single element.
    #[must_use]
    pub fn to_sequence(&self) -> Vec<Self> {
        match self {
            Self::Void => Vec::new(),
            Self::Sequence(values) => values.clone(),
            other => vec![other.clone()],
        }
    }

    /// Returns a copy converted to `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidCast`] if no conversion is defined from the current kind to
    /// `kind`, or the errors of the matching `to_*` conversion.
    pub fn casted(&self, kind: ValueType) -> ModelResult<Self> {
        if self.is_type(kind) {
            return Ok(self.clone());
        }
        match kind {
            ValueType::Void => Err(invalid_cast(self, kind)),
            ValueType::Boolean => self.to_boolean().map(Self::Boolean),
            ValueType::DateTime => self.to_datetime().map(Self::DateTime),
            ValueType::Date => self.to_date().map(Self::Date),
            ValueType::Integer => self.to_long().map(Self::Integer),
            ValueType::Amount => self.to_amount().map(Self::Amount),
            ValueType::Balance => self.to_balance().map(Self::from),
            ValueType::String => match self {
                Self::Sequence(_) => Err(invalid_cast(self, kind)),
                other => Ok(Self::String(other.to_string())),
            },
            ValueType::Mask => self.to_mask().map(Self::Mask),
            ValueType::Sequence => Ok(Self::Sequence(self.to_sequence())),
        }
    }

    /// Converts the value to `kind` in place.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::casted`], leaving the value unchanged.
    pub fn in_place_cast(&mut self, kind: ValueType) -> ModelResult<()> {
        *self = self.casted(kind)?;
        Ok(())
    }

    /// Returns the value in its simplest kind.
    ///
    /// A zero amount or balance becomes the integer zero, a single-commodity balance becomes an
    /// amount, and a whole commodity-less amount becomes an integer.
    #[must_use]
    pub fn simplified(&self) -> Self {
        match self {
            Self::Balance(balance) if balance.is_realzero() => Self::Integer(0),
            Self::Balance(balance) if balance.commodity_count() == 1 => balance
                .single_amount()
                .map_or_else(|_| self.clone(), |amount| Self::Amount(amount).simplified()),
            Self::Amount(amount) if amount.is_realzero() => Self::Integer(0),
            Self::Amount(amount)
                if !amount.has_commodity()
                    && !amount.has_annotation()
                    && amount.quantity().fract().is_zero() =>
            {
                amount.to_long().map_or_else(|_| self.clone(), Self::Integer)
            }
            other => other.clone(),
        }
    }

    pub fn in_place_simplify(&mut self) {
        *self = self.simplified();
    }

    /// Returns the bare number behind the value, dropping any commodity.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidOperand`] for kinds without a number.
    pub fn number(&self) -> ModelResult<Self> {
        match self {
            Self::Void => Ok(Self::Integer(0)),
            Self::Boolean(value) => Ok(Self::Integer(i64::from(*value))),
            Self::Integer(_) => Ok(self.clone()),
            Self::Amount(amount) => Ok(Self::Amount(amount.number())),
            Self::Balance(balance) => balance.number().map(Self::from),
            Self::Sequence(values) => values
                .iter()
                .try_fold(Self::Void, |sum, value| sum.checked_add(&value.number()?)),
            _ => Err(ModelError::InvalidOperand {
                op: "take the number of",
                kind: self.label(),
            }),
        }
    }

    // -- Predicates ------------------------------------------------------------------------------

    /// Returns `true` if the value renders as zero or is empty.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Void => true,
            Self::Boolean(value) => !value,
            Self::DateTime(_) | Self::Date(_) => false,
            Self::Integer(value) => *value == 0,
            Self::Amount(amount) => amount.is_zero(),
            Self::Balance(balance) => balance.is_zero(),
            Self::String(text) => text.is_empty(),
            Self::Mask(mask) => mask.is_empty(),
            Self::Sequence(values) => values.is_empty(),
        }
    }

    /// Returns `true` if the value is exactly zero or empty.
    #[must_use]
    pub fn is_realzero(&self) -> bool {
        match self {
            Self::Amount(amount) => amount.is_realzero(),
            Self::Balance(balance) => balance.is_realzero(),
            other => other.is_zero(),
        }
    }

    #[must_use]
    pub fn is_nonzero(&self) -> bool {
        !self.is_zero()
    }

    /// Returns `false` if a held amount or balance is structurally unsound.
    #[must_use]
    pub fn valid(&self) -> bool {
        match self {
            Self::Amount(amount) => amount.valid(),
            Self::Balance(balance) => balance.valid(),
            Self::Sequence(values) => values.iter().all(Self::valid),
            _ => true,
        }
    }

    // -- Annotations -----------------------------------------------------------------------------

    #[must_use]
    pub fn annotation(&self) -> Option<&Annotation> {
        self.as_amount().and_then(Amount::annotation)
    }

    #[must_use]
    pub fn has_annotation(&self) -> bool {
        self.annotation().is_some()
    }

    /// Attaches lot details to a held amount. Other kinds are left unchanged.
    pub fn annotate(&mut self, details: Annotation) {
        if let Self::Amount(amount) = self {
            amount.annotate(details);
        }
    }

    /// Strips lot details from held amounts, keeping those selected by `keep`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Overflow`] if merged lots of a balance sum out of range.
    pub fn strip_annotations(&self, keep: &KeepDetails) -> ModelResult<Self> {
        match self {
            Self::Amount(amount) => Ok(Self::Amount(amount.strip_annotations(keep))),
            Self::Balance(balance) => balance.strip_annotations(keep).map(Self::from),
            Self::Sequence(values) => values
                .iter()
                .map(|value| value.strip_annotations(keep))
                .collect::<ModelResult<Vec<_>>>()
                .map(Self::Sequence),
            other => Ok(other.clone()),
        }
    }

    // -- Sequences -------------------------------------------------------------------------------

    /// Appends `value`, turning a non-sequence into the sequence `[self, value]`.
    ///
    /// A void value becomes the single-element sequence `[value]`.
    pub fn push_back(&mut self, value: Self) {
        match self {
            Self::Sequence(values) => values.push(value),
            Self::Void => *self = Self::Sequence(vec![value]),
            _ => {
                let original = std::mem::take(self);
                *self = Self::Sequence(vec![original, value]);
            }
        }
    }

    /// Removes and returns the last element.
    ///
    /// A sequence left with a single element collapses to that element, and an emptied sequence
    /// becomes void. A non-sequence value is itself removed.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EmptySequence`] if there is nothing to remove.
    pub fn pop_back(&mut self) -> ModelResult<Self> {
        match self {
            Self::Void => Err(ModelError::EmptySequence),
            Self::Sequence(values) => {
                let last = values.pop().ok_or(ModelError::EmptySequence)?;
                match values.len() {
                    0 => *self = Self::Void,
                    1 => *self = values.remove(0),
                    _ => {}
                }
                Ok(last)
            }
            _ => Ok(std::mem::take(self)),
        }
    }

    /// Returns the number of elements: zero for void, one for a scalar.
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Self::Void => 0,
            Self::Sequence(values) => values.len(),
            _ => 1,
        }
    }

    // -- Valuation -------------------------------------------------------------------------------

    /// Values the held amount or balance in `target` at `moment`.
    ///
    /// Returns `None` for kinds without a market value or when no price is known.
    #[must_use]
    pub fn value(&self, target: Option<&Commodity>, moment: Option<NaiveDateTime>) -> Option<Self> {
        match self {
            Self::Amount(amount) => amount.value(target, moment).map(Self::Amount),
            Self::Balance(balance) => balance.value(target, moment).map(Self::from),
            Self::Sequence(values) => values
                .iter()
                .map(|value| value.value(target, moment))
                .collect::<Option<Vec<_>>>()
                .map(Self::Sequence),
            _ => None,
        }
    }

    /// Converts held amounts into the first of `commodities` each can be valued in.
    ///
    /// `commodities` is a comma separated list of symbols. An amount already in one of the
    /// listed commodities, or with no price in any of them, is kept as it is.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::CommodityNotFound`] if a listed symbol is not registered.
    pub fn exchange_commodities(
        &self,
        commodities: &str,
        pool: &CommodityPool,
        moment: Option<NaiveDateTime>,
    ) -> ModelResult<Self> {
        let targets = commodities
            .split(',')
            .map(str::trim)
            .filter(|symbol| !symbol.is_empty())
            .map(|symbol| pool.get(symbol))
            .collect::<ModelResult<Vec<_>>>()?;

        let exchange = |amount: &Amount| -> Amount {
            for target in &targets {
                if amount
                    .commodity()
                    .is_some_and(|commodity| commodity.referent() == target.referent())
                {
                    return amount.clone();
                }
                if let Some(valued) = amount.value(Some(target), moment) {
                    return valued;
                }
            }
            amount.clone()
        };

        match self {
            Self::Amount(amount) => Ok(Self::Amount(exchange(amount))),
            Self::Balance(balance) => {
                let mut result = Balance::new();
                for amount in balance.amounts() {
                    result.add_amount(&exchange(amount))?;
                }
                Ok(Self::from(result))
            }
            Self::Sequence(values) => values
                .iter()
                .map(|value| value.exchange_commodities(commodities, pool, moment))
                .collect::<ModelResult<Vec<_>>>()
                .map(Self::Sequence),
            other => Ok(other.clone()),
        }
    }

    // -- Unary operations ------------------------------------------------------------------------

    /// Returns the arithmetic negation, or the logical negation of a boolean.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidOperand`] for kinds that cannot be negated, or
    /// [`ModelError::Overflow`] for `i64::MIN`.
    pub fn negated(&self) -> ModelResult<Self> {
        match self {
            Self::Boolean(value) => Ok(Self::Boolean(!value)),
            Self::Integer(value) => value
                .checked_neg()
                .map(Self::Integer)
                .ok_or(ModelError::Overflow("negation")),
            Self::Amount(amount) => Ok(Self::Amount(amount.negated())),
            Self::Balance(balance) => Ok(Self::from(balance.negated())),
            Self::Sequence(values) => values
                .iter()
                .map(Self::negated)
                .collect::<ModelResult<Vec<_>>>()
                .map(Self::Sequence),
            _ => Err(ModelError::InvalidOperand {
                op: "negate",
                kind: self.label(),
            }),
        }
    }

    /// Negates the value in place.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::negated`], leaving the value unchanged.
    pub fn in_place_negate(&mut self) -> ModelResult<()> {
        *self = self.negated()?;
        Ok(())
    }

    /// Returns the absolute value.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidOperand`] for non-numeric kinds, or
    /// [`ModelError::Overflow`] for `i64::MIN`.
    pub fn abs(&self) -> ModelResult<Self> {
        match self {
            Self::Integer(value) => value
                .checked_abs()
                .map(Self::Integer)
                .ok_or(ModelError::Overflow("absolute value")),
            Self::Amount(amount) => Ok(Self::Amount(amount.abs())),
            Self::Balance(balance) => Ok(Self::from(balance.abs())),
            _ => Err(ModelError::InvalidOperand {
                op: "take the absolute value of",
                kind: self.label(),
            }),
        }
    }

    fn map_numeric(
        &self,
        op: &'static str,
        on_amount: fn(&Amount) -> ModelResult<Amount>,
        on_balance: fn(&Balance) -> ModelResult<Balance>,
    ) -> ModelResult<Self> {
        match self {
            Self::Integer(_) => Ok(self.clone()),
            Self::Amount(amount) => on_amount(amount).map(Self::Amount),
            Self::Balance(balance) => on_balance(balance).map(Self::from),
            Self::Sequence(values) => values
                .iter()
                .map(|value| value.map_numeric(op, on_amount, on_balance))
                .collect::<ModelResult<Vec<_>>>()
                .map(Self::Sequence),
            _ => Err(ModelError::InvalidOperand {
                op,
                kind: self.label(),
            }),
        }
    }

    /// Rounds held amounts to their display precision.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidOperand`] for non-numeric kinds.
    pub fn rounded(&self) -> ModelResult<Self> {
        self.map_numeric("round", |a| Ok(a.rounded()), |b| Ok(b.rounded()))
    }

    /// # Errors
    ///
    /// Returns [`ModelError::InvalidOperand`] for non-numeric kinds.
    pub fn in_place_round(&mut self) -> ModelResult<()> {
        *self = self.rounded()?;
        Ok(())
    }

    /// Truncates held amounts toward zero at their display precision.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidOperand`] for non-numeric kinds.
    pub fn truncated(&self) -> ModelResult<Self> {
        self.map_numeric("truncate", |a| Ok(a.truncated()), |b| Ok(b.truncated()))
    }

    /// # Errors
    ///
    /// Returns [`ModelError::InvalidOperand`] for non-numeric kinds.
    pub fn in_place_truncate(&mut self) -> ModelResult<()> {
        *self = self.truncated()?;
        Ok(())
    }

    /// Floors held amounts to whole units.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidOperand`] for non-numeric kinds.
    pub fn floored(&self) -> ModelResult<Self> {
        self.map_numeric("floor", |a| Ok(a.floored()), |b| Ok(b.floored()))
    }

    /// # Errors
    ///
    /// Returns [`ModelError::InvalidOperand`] for non-numeric kinds.
    pub fn in_place_floor(&mut self) -> ModelResult<()> {
        *self = self.floored()?;
        Ok(())
    }

    /// Marks held amounts to display at full precision.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidOperand`] for non-numeric kinds.
    pub fn unrounded(&self) -> ModelResult<Self> {
        self.map_numeric("unround", |a| Ok(a.unrounded()), |b| Ok(b.unrounded()))
    }

    /// # Errors
    ///
    /// Returns [`ModelError::InvalidOperand`] for non-numeric kinds.
    pub fn in_place_unround(&mut self) -> ModelResult<()> {
        *self = self.unrounded()?;
        Ok(())
    }

    /// Expresses held amounts in their smallest linked unit.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidOperand`] for non-numeric kinds, or the errors of
    /// [`Amount::reduced`].
    pub fn reduced(&self) -> ModelResult<Self> {
        self.map_numeric("reduce", Amount::reduced, Balance::reduced)
    }

    /// # Errors
    ///
    /// Returns the errors of [`Self::reduced`].
    pub fn in_place_reduce(&mut self) -> ModelResult<()> {
        *self = self.reduced()?;
        Ok(())
    }

    /// Expresses held amounts in the largest linked unit they amount to at least one of.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidOperand`] for non-numeric kinds, or the errors of
    /// [`Amount::unreduced`].
    pub fn unreduced(&self) -> ModelResult<Self> {
        self.map_numeric("unreduce", Amount::unreduced, Balance::unreduced)
    }

    /// # Errors
    ///
    /// Returns the errors of [`Self::unreduced`].
    pub fn in_place_unreduce(&mut self) -> ModelResult<()> {
        *self = self.unreduced()?;
        Ok(())
    }

    // -- Binary operations -----------------------------------------------------------------------

    fn combine_amounts(&self, rhs: &Self, subtract: bool) -> ModelResult<Self> {
        let lhs = self.to_amount()?;
        let rhs = rhs.to_amount()?;
        if lhs.commodity() == rhs.commodity() && lhs.annotation() == rhs.annotation() {
            let result = if subtract {
                lhs.checked_sub(&rhs)?
            } else {
                lhs.checked_add(&rhs)?
            };
            return Ok(Self::Amount(result));
        }
        let mut balance = Balance::from(lhs);
        if subtract {
            balance.sub_amount(&rhs)?;
        } else {
            balance.add_amount(&rhs)?;
        }
        Ok(Self::from(balance))
    }

    fn combine_balances(&self, rhs: &Self, subtract: bool) -> ModelResult<Self> {
        let mut balance = self.to_balance()?;
        let other = rhs.to_balance()?;
        if subtract {
            balance.sub_balance(&other)?;
        } else {
            balance.add_balance(&other)?;
        }
        Ok(Self::from(balance))
    }

    /// Adds two values, promoting to the wider kind.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnsupportedOperation`] if the kinds cannot be added, or the
    /// arithmetic errors of the promoted operands.
    pub fn checked_add(&self, rhs: &Self) -> ModelResult<Self> {
        match (self, rhs) {
            (Self::Void, other) | (other, Self::Void) => Ok(other.clone()),
            (Self::Sequence(lhs), Self::Sequence(rhs)) => {
                elementwise("add", lhs, rhs, Self::checked_add)
            }
            (Self::Sequence(values), other) => {
                let mut values = values.clone();
                values.push(other.clone());
                Ok(Self::Sequence(values))
            }
            (other, Self::Sequence(values)) => {
                let mut values = values.clone();
                values.insert(0, other.clone());
                Ok(Self::Sequence(values))
            }
            (Self::String(text), other) => Ok(Self::String(format!("{text}{other}"))),
            (other, Self::String(text)) => Ok(Self::String(format!("{other}{text}"))),
            (Self::Date(date), n @ (Self::Integer(_) | Self::Amount(_)))
            | (n @ (Self::Integer(_) | Self::Amount(_)), Self::Date(date)) => {
                Ok(Self::Date(shift_date(*date, n.to_long()?)?))
            }
            (Self::DateTime(datetime), n @ (Self::Integer(_) | Self::Amount(_)))
            | (n @ (Self::Integer(_) | Self::Amount(_)), Self::DateTime(datetime)) => {
                Ok(Self::DateTime(shift_datetime(*datetime, n.to_long()?)?))
            }
            (Self::Integer(a), Self::Integer(b)) => a
                .checked_add(*b)
                .map(Self::Integer)
                .ok_or(ModelError::Overflow("addition")),
            (Self::Integer(_) | Self::Amount(_), Self::Integer(_) | Self::Amount(_)) => {
                self.combine_amounts(rhs, false)
            }
            (
                Self::Integer(_) | Self::Amount(_) | Self::Balance(_),
                Self::Integer(_) | Self::Amount(_) | Self::Balance(_),
            ) => self.combine_balances(rhs, false),
            _ => Err(unsupported("add", self, rhs)),
        }
    }

    /// Subtracts `rhs`, promoting to the wider kind. Subtracting from a sequence removes every
    /// element equal to `rhs`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnsupportedOperation`] if the kinds cannot be subtracted, or the
    /// arithmetic errors of the promoted operands.
    pub fn checked_sub(&self, rhs: &Self) -> ModelResult<Self> {
        match (self, rhs) {
            (_, Self::Void) => Ok(self.clone()),
            (Self::Void, other) => other.negated(),
            (Self::Sequence(lhs), Self::Sequence(rhs)) => {
                elementwise("subtract", lhs, rhs, Self::checked_sub)
            }
            (Self::Sequence(values), other) => Ok(Self::Sequence(
                values
                    .iter()
                    .filter(|value| !value.is_equal_to(other))
                    .cloned()
                    .collect(),
            )),
            (Self::Date(date), n @ (Self::Integer(_) | Self::Amount(_))) => {
                let days = n.to_long()?.checked_neg().ok_or(ModelError::Overflow("negation"))?;
                Ok(Self::Date(shift_date(*date, days)?))
            }
            (Self::DateTime(datetime), n @ (Self::Integer(_) | Self::Amount(_))) => {
                let seconds = n.to_long()?.checked_neg().ok_or(ModelError::Overflow("negation"))?;
                Ok(Self::DateTime(shift_datetime(*datetime, seconds)?))
            }
            (Self::Integer(a), Self::Integer(b)) => a
                .checked_sub(*b)
                .map(Self::Integer)
                .ok_or(ModelError::Overflow("subtraction")),
            (Self::Integer(_) | Self::Amount(_), Self::Integer(_) | Self::Amount(_)) => {
                self.combine_amounts(rhs, true)
            }
            (
                Self::Integer(_) | Self::Amount(_) | Self::Balance(_),
                Self::Integer(_) | Self::Amount(_) | Self::Balance(_),
            ) => self.combine_balances(rhs, true),
            _ => Err(unsupported("subtract", self, rhs)),
        }
    }

    /// Multiplies two numeric values. An amount times an integer keeps the amount's commodity
    /// whichever side it is on.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnsupportedOperation`] for non-numeric kinds, or the arithmetic
    /// errors of the promoted operands.
    pub fn checked_mul(&self, rhs: &Self) -> ModelResult<Self> {
        match (self, rhs) {
            (Self::Integer(a), Self::Integer(b)) => a
                .checked_mul(*b)
                .map(Self::Integer)
                .ok_or(ModelError::Overflow("multiplication")),
            (Self::Integer(_), Self::Amount(amount)) => {
                amount.checked_mul(&self.to_amount()?).map(Self::Amount)
            }
            (Self::Amount(amount), Self::Integer(_) | Self::Amount(_)) => {
                amount.checked_mul(&rhs.to_amount()?).map(Self::Amount)
            }
            (Self::Balance(balance), Self::Integer(_) | Self::Amount(_) | Self::Balance(_)) => {
                balance.checked_mul(&rhs.to_amount()?).map(Self::from)
            }
            (Self::Integer(_) | Self::Amount(_), Self::Balance(balance)) => {
                balance.checked_mul(&self.to_amount()?).map(Self::from)
            }
            _ => Err(unsupported("multiply", self, rhs)),
        }
    }

    /// Divides by `rhs`. Integer division stays integral only when exact.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DivideByZero`] for a zero divisor,
    /// [`ModelError::UnsupportedOperation`] for non-numeric kinds, or the arithmetic errors of
    /// the promoted operands.
    pub fn checked_div(&self, rhs: &Self) -> ModelResult<Self> {
        match (self, rhs) {
            (Self::Integer(_), Self::Integer(0)) => Err(ModelError::DivideByZero),
            (Self::Integer(a), Self::Integer(b)) if a.checked_rem(*b) == Some(0) => a
                .checked_div(*b)
                .map(Self::Integer)
                .ok_or(ModelError::Overflow("division")),
            (Self::Integer(_) | Self::Amount(_), Self::Integer(_) | Self::Amount(_)) => self
                .to_amount()?
                .checked_div(&rhs.to_amount()?)
                .map(Self::Amount),
            (Self::Balance(balance), Self::Integer(_) | Self::Amount(_) | Self::Balance(_)) => {
                balance.checked_div(&rhs.to_amount()?).map(Self::from)
            }
            (Self::Integer(_) | Self::Amount(_), Self::Balance(_)) => self
                .to_amount()?
                .checked_div(&rhs.to_amount()?)
                .map(Self::Amount),
            _ => Err(unsupported("divide", self, rhs)),
        }
    }

    // -- Comparisons -----------------------------------------------------------------------------

    /// Returns `true` if both values are equal after promoting to a common kind.
    ///
    /// A balance equals an amount when it holds exactly that amount, or is empty and the amount
    /// is zero. Values of unrelated kinds are never equal.
    #[must_use]
    pub fn is_equal_to(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Void, Self::Void) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Integer(_) | Self::Amount(_), Self::Integer(_) | Self::Amount(_)) => {
                matches!((self.to_amount(), other.to_amount()), (Ok(a), Ok(b)) if a == b)
            }
            (Self::Balance(a), Self::Balance(b)) => a == b,
            (Self::Balance(balance), scalar @ (Self::Integer(_) | Self::Amount(_)))
            | (scalar @ (Self::Integer(_) | Self::Amount(_)), Self::Balance(balance)) => {
                match scalar.to_amount() {
                    Ok(amount) if amount.is_realzero() => balance.is_empty(),
                    Ok(amount) => {
                        balance.commodity_count() == 1
                            && balance.amounts().next() == Some(&amount)
                    }
                    Err(_) => false,
                }
            }
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Mask(a), Self::Mask(b)) => a == b,
            (Self::Sequence(a), Self::Sequence(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.is_equal_to(y))
            }
            _ => false,
        }
    }

    fn ordering(&self, other: &Self) -> ModelResult<Ordering> {
        match (self, other) {
            (Self::Boolean(a), Self::Boolean(b)) => Ok(a.cmp(b)),
            (Self::DateTime(a), Self::DateTime(b)) => Ok(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Ok(a.cmp(b)),
            (Self::Integer(a), Self::Integer(b)) => Ok(a.cmp(b)),
            (Self::Integer(_) | Self::Amount(_), Self::Integer(_) | Self::Amount(_)) => {
                self.to_amount()?.compare(&other.to_amount()?)
            }
            (Self::String(a), Self::String(b)) => Ok(a.cmp(b)),
            (Self::Sequence(a), Self::Sequence(b)) => {
                for (x, y) in a.iter().zip(b) {
                    if !x.is_equal_to(y) {
                        return x.ordering(y);
                    }
                }
                Ok(a.len().cmp(&b.len()))
            }
            _ => Err(unsupported("compare", self, other)),
        }
    }

    fn compares(&self, other: &Self, wanted: Ordering) -> ModelResult<bool> {
        match (self, other) {
            (Self::Balance(a), Self::Balance(b)) if !a.is_empty() && !b.is_empty() => {
                Err(unsupported("compare", self, other))
            }
            (Self::Balance(balance), _) if balance.is_empty() => {
                Self::Integer(0).compares(other, wanted)
            }
            (_, Self::Balance(balance)) if balance.is_empty() => {
                self.compares(&Self::Integer(0), wanted)
            }
            (Self::Balance(balance), _) => {
                for amount in balance.amounts() {
                    if Self::Amount(amount.clone()).ordering(other)? != wanted {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (_, Self::Balance(balance)) => {
                for amount in balance.amounts() {
                    if self.ordering(&Self::Amount(amount.clone()))? != wanted {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ => Ok(self.ordering(other)? == wanted),
        }
    }

    /// Returns `true` if this value is less than `other`.
    ///
    /// A balance is less than a scalar when every amount it holds is.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnsupportedOperation`] for kinds with no ordering, or
    /// [`ModelError::IncompatibleCommodity`] for amounts of different commodities.
    pub fn is_less_than(&self, other: &Self) -> ModelResult<bool> {
        self.compares(other, Ordering::Less)
    }

    /// Returns `true` if this value is greater than `other`.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::is_less_than`].
    pub fn is_greater_than(&self, other: &Self) -> ModelResult<bool> {
        self.compares(other, Ordering::Greater)
    }
}

// -- Construction ---------------------------------------------------------------------------------

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&i64> for Value {
    fn from(value: &i64) -> Self {
        Self::Integer(*value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

/// Convenience conversion for literals known to be finite. Use [`Value::from_f64_checked`]
/// otherwise.
impl From<f64> for Value {
    /// # Panics
    ///
    /// Panics if `value` is not finite or out of range.
    fn from(value: f64) -> Self {
        Self::Amount(Amount::from(value))
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Self::Amount(Amount::from(value))
    }
}

impl From<Amount> for Value {
    fn from(value: Amount) -> Self {
        Self::Amount(value)
    }
}

impl From<&Amount> for Value {
    fn from(value: &Amount) -> Self {
        Self::Amount(value.clone())
    }
}

impl From<Balance> for Value {
    fn from(value: Balance) -> Self {
        Self::Balance(Box::new(value))
    }
}

impl From<&Balance> for Value {
    fn from(value: &Balance) -> Self {
        Self::Balance(Box::new(value.clone()))
    }
}

impl From<Mask> for Value {
    fn from(value: Mask) -> Self {
        Self::Mask(value)
    }
}

/// Reads `text` as a commodity-less quantity such as `10`, `-1.5` or `.25`.
fn numeric_amount(text: &str) -> Option<Amount> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, text),
    };
    if !digits.contains(|c: char| c.is_ascii_digit())
        || !digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        || digits.matches('.').count() > 1
    {
        return None;
    }
    let (mut quantity, precision, _) = resolve_quantity(digits, false).ok()?;
    if negative {
        quantity.set_sign_negative(!quantity.is_zero());
    }
    Some(Amount::from_parts(quantity, precision, None))
}

/// Numeric text becomes a commodity-less [`Value::Amount`], anything else a [`Value::String`].
impl From<String> for Value {
    fn from(value: String) -> Self {
        match numeric_amount(&value) {
            Some(amount) => Self::Amount(amount),
            None => Self::String(value),
        }
    }
}

/// Numeric text becomes a commodity-less [`Value::Amount`], anything else a [`Value::String`].
impl From<&str> for Value {
    fn from(value: &str) -> Self {
        match numeric_amount(value) {
            Some(amount) => Self::Amount(amount),
            None => Self::String(value.to_string()),
        }
    }
}

impl From<Vec<Self>> for Value {
    fn from(values: Vec<Self>) -> Self {
        Self::Sequence(values)
    }
}

impl FromIterator<Self> for Value {
    fn from_iter<I: IntoIterator<Item = Self>>(iter: I) -> Self {
        Self::Sequence(iter.into_iter().collect())
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Void => Ok(()),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::DateTime(value) => write!(f, "{}", format_datetime(*value)),
            Self::Date(value) => write!(f, "{}", format_date(*value)),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Amount(amount) => write!(f, "{amount}"),
            Self::Balance(balance) => write!(f, "{balance}"),
            Self::String(text) => write!(f, "{text}"),
            Self::Mask(mask) => write!(f, "{mask}"),
            Self::Sequence(values) => {
                let items: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "({})", items.join(", "))
            }
        }
    }
}

// -- Comparison traits ----------------------------------------------------------------------------

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal_to(other)
    }
}

impl PartialOrd for Value {
    /// Returns `None` when the values have no ordering or are incomparable.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.is_equal_to(other) {
            Some(Ordering::Equal)
        } else if self.is_less_than(other).unwrap_or(false) {
            Some(Ordering::Less)
        } else if self.is_greater_than(other).unwrap_or(false) {
            Some(Ordering::Greater)
        } else {
            None
        }
    }
}

// -- Operators ------------------------------------------------------------------------------------

macro_rules! impl_value_op {
    ($trait:ident, $method:ident, $checked:ident) => {
        impl $trait<&Value> for &Value {
            type Output = Value;

            /// # Panics
            ///
            /// Panics if the operation is undefined for the operand kinds or overflows.
            fn $method(self, rhs: &Value) -> Value {
                self.$checked(rhs).unwrap_or_else(|e| panic!("{e}"))
            }
        }

        impl $trait for Value {
            type Output = Value;

            fn $method(self, rhs: Value) -> Value {
                (&self).$method(&rhs)
            }
        }
    };
}

impl_value_op!(Add, add, checked_add);
impl_value_op!(Sub, sub, checked_sub);
impl_value_op!(Mul, mul, checked_mul);
impl_value_op!(Div, div, checked_div);

/// Operators and comparisons between a value and a raw operand, in both orders.
macro_rules! impl_mixed_ops {
    ($t:ty) => {
        impl Add<$t> for Value {
            type Output = Value;

            fn add(self, rhs: $t) -> Value {
                &self + &Value::from(rhs)
            }
        }

        impl Add<Value> for $t {
            type Output = Value;

            fn add(self, rhs: Value) -> Value {
                &Value::from(self) + &rhs
            }
        }

        impl Sub<$t> for Value {
            type Output = Value;

            fn sub(self, rhs: $t) -> Value {
                &self - &Value::from(rhs)
            }
        }

        impl Sub<Value> for $t {
            type Output = Value;

            fn sub(self, rhs: Value) -> Value {
                &Value::from(self) - &rhs
            }
        }

        impl Mul<$t> for Value {
            type Output = Value;

            fn mul(self, rhs: $t) -> Value {
                &self * &Value::from(rhs)
            }
        }

        impl Mul<Value> for $t {
            type Output = Value;

            fn mul(self, rhs: Value) -> Value {
                &Value::from(self) * &rhs
            }
        }

        impl Div<$t> for Value {
            type Output = Value;

            fn div(self, rhs: $t) -> Value {
                &self / &Value::from(rhs)
            }
        }

        impl Div<Value> for $t {
            type Output = Value;

            fn div(self, rhs: Value) -> Value {
                &Value::from(self) / &rhs
            }
        }

        impl PartialEq<$t> for Value {
            fn eq(&self, other: &$t) -> bool {
                self.is_equal_to(&Value::from(other))
            }
        }

        impl PartialEq<Value> for $t {
            fn eq(&self, other: &Value) -> bool {
                Value::from(self).is_equal_to(other)
            }
        }

        impl PartialOrd<$t> for Value {
            fn partial_cmp(&self, other: &$t) -> Option<Ordering> {
                self.partial_cmp(&Value::from(other))
            }
        }

        impl PartialOrd<Value> for $t {
            fn partial_cmp(&self, other: &Value) -> Option<Ordering> {
                Value::from(self).partial_cmp(other)
            }
        }
    };
}

impl_mixed_ops!(i64);
impl_mixed_ops!(Amount);
impl_mixed_ops!(Balance);

impl AddAssign<&Self> for Value {
    fn add_assign(&mut self, rhs: &Self) {
        *self = &*self + rhs;
    }
}

impl SubAssign<&Self> for Value {
    fn sub_assign(&mut self, rhs: &Self) {
        *self = &*self - rhs;
    }
}

impl Neg for Value {
    type Output = Self;

    /// # Panics
    ///
    /// Panics if the kind cannot be negated.
    fn neg(self) -> Self {
        self.negated().unwrap_or_else(|e| panic!("{e}"))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::stubs::{datetime, pool};

    fn amount(pool: &mut CommodityPool, text: &str) -> Value {
        Value::parse(text, pool).unwrap()
    }

    #[rstest]
    fn test_default_is_void() {
        let value = Value::default();
        assert!(value.is_null());
        assert_eq!(value.value_type(), ValueType::Void);
        assert_eq!(value.size(), 0);
        assert_eq!(value.to_string(), "");
    }

    #[rstest]
    #[case(Value::from(true), ValueType::Boolean)]
    #[case(Value::from(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()), ValueType::Date)]
    #[case(Value::from(datetime(2024, 1, 2)), ValueType::DateTime)]
    #[case(Value::from(42_i64), ValueType::Integer)]
    #[case(Value::from(1.5_f64), ValueType::Amount)]
    #[case(Value::from(dec!(1.5)), ValueType::Amount)]
    #[case(Value::from(Balance::new()), ValueType::Balance)]
    #[case(Value::from(Mask::new("abc")), ValueType::Mask)]
    #[case(Value::from("text"), ValueType::String)]
    #[case(Value::from("10"), ValueType::Amount)]
    #[case(Value::from(String::from("1.5")), ValueType::Amount)]
    #[case(Value::from("10 EUR"), ValueType::String)]
    #[case(Value::from(vec![Value::from(1_i64)]), ValueType::Sequence)]
    fn test_construction_dispatch(#[case] value: Value, #[case] expected: ValueType) {
        assert_eq!(value.value_type(), expected);
        assert!(value.is_type(expected));
        assert_eq!(value.label(), expected.label());
        assert_eq!(value.basetype(), expected.basetype());
    }

    #[rstest]
    #[case("-1.50", dec!(-1.50), "-1.50")]
    #[case(".25", dec!(0.25), "0.25")]
    #[case("0", dec!(0), "0")]
    fn test_numeric_text_is_amount(#[case] text: &str, #[case] quantity: Decimal, #[case] shown: &str) {
        let value = Value::from(text);
        let amount = value.as_amount().unwrap();
        assert_eq!(amount.quantity(), quantity);
        assert!(!amount.has_commodity());
        assert_eq!(value.to_string(), shown);
    }

    #[rstest]
    #[case("")]
    #[case("-")]
    #[case("1.2.3")]
    #[case("1,000")]
    #[case("12abc")]
    fn test_non_numeric_text_is_string(#[case] text: &str) {
        assert!(Value::from(text).is_string());
    }

    #[rstest]
    fn test_from_f64_checked() {
        let value = Value::from_f64_checked(2.5).unwrap();
        assert_eq!(value, Value::from(dec!(2.5)));
        assert!(matches!(Value::from_f64_checked(f64::NAN), Err(ModelError::Parse { .. })));
        assert!(Value::from_f64_checked(f64::INFINITY).is_err());
    }

    #[rstest]
    fn test_copy_is_not_double_wrapped() {
        let original = Value::from(5_i64);
        let copy = original.clone();
        assert!(copy.is_long());
        assert_eq!(copy, original);
    }

    #[rstest]
    fn test_push_back_converts_to_sequence() {
        let mut value = Value::from(1_i64);
        value.push_back(Value::from(2_i64));
        assert!(value.is_sequence());
        assert_eq!(value.size(), 2);
        let items: Vec<String> = value
            .as_sequence()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(items, vec!["1", "2"]);
        assert_eq!(value.to_string(), "(1, 2)");
    }

    #[rstest]
    fn test_push_back_onto_void() {
        let mut value = Value::Void;
        value.push_back(Value::from("a"));
        assert_eq!(value.size(), 1);
        assert!(value.is_sequence());
    }

    #[rstest]
    fn test_pop_back_collapses() {
        let mut value: Value = [1_i64, 2, 3].into_iter().map(Value::from).collect();
        assert_eq!(value.pop_back().unwrap(), Value::from(3_i64));
        assert_eq!(value.size(), 2);
        assert_eq!(value.pop_back().unwrap(), Value::from(2_i64));
        assert!(value.is_long());
        assert_eq!(value.pop_back().unwrap(), Value::from(1_i64));
        assert!(value.is_null());
        assert_eq!(value.pop_back().unwrap_err(), ModelError::EmptySequence);
    }

    #[rstest]
    #[case(Value::from(5_i64))]
    #[case(Value::from(true))]
    #[case(Value::from(dec!(-2.50)))]
    #[case(Value::from(vec![Value::from(1_i64), Value::from(-4_i64)]))]
    fn test_double_negation_is_identity(#[case] value: Value) {
        let twice = value.negated().unwrap().negated().unwrap();
        assert_eq!(twice, value);
    }

    #[rstest]
    fn test_negate_boolean_and_errors() {
        assert_eq!(Value::from(true).negated().unwrap(), Value::from(false));
        assert!(matches!(
            Value::from("x").negated(),
            Err(ModelError::InvalidOperand { op: "negate", .. })
        ));
        assert_eq!(
            Value::from(i64::MIN).negated().unwrap_err(),
            ModelError::Overflow("negation")
        );
    }

    #[rstest]
    fn test_integer_arithmetic() {
        let a = Value::from(7_i64);
        let b = Value::from(2_i64);
        assert_eq!(&a + &b, Value::from(9_i64));
        assert_eq!(&a - &b, Value::from(5_i64));
        assert_eq!(&a * &b, Value::from(14_i64));
        assert!((&Value::from(8_i64) / &b).is_long());
        let inexact = &a / &b;
        assert!(inexact.is_amount());
        assert_eq!(inexact.to_amount().unwrap().quantity(), dec!(3.5));
        assert_eq!(a.checked_div(&Value::from(0_i64)).unwrap_err(), ModelError::DivideByZero);
        assert_eq!(
            Value::from(i64::MAX).checked_add(&Value::from(1_i64)).unwrap_err(),
            ModelError::Overflow("addition")
        );
    }

    #[rstest]
    fn test_amount_promotion_is_symmetric(mut pool: CommodityPool) {
        let dollars = amount(&mut pool, "$10.00");
        let forward = &dollars * &Value::from(3_i64);
        let backward = &Value::from(3_i64) * &dollars;
        assert_eq!(forward, backward);
        assert_eq!(forward.to_string(), "$30.00");

        let a = dollars.as_amount().unwrap().clone();
        assert_eq!(Value::from(2_i64) + a.clone(), a.clone() + Value::from(2_i64));
        assert_eq!(5_i64 * Value::from(2_i64), Value::from(2_i64) * 5_i64);
    }

    #[rstest]
    fn test_different_commodities_add_into_balance(mut pool: CommodityPool) {
        let sum = &amount(&mut pool, "10 EUR") + &amount(&mut pool, "$5");
        assert!(sum.is_balance());
        assert_eq!(sum.as_balance().unwrap().commodity_count(), 2);

        let back = &sum - &amount(&mut pool, "$5");
        assert!(back.is_balance());
        assert_eq!(back.simplified().to_string(), "10 EUR");
    }

    #[rstest]
    fn test_integer_plus_commodity_amount_is_balance(mut pool: CommodityPool) {
        let sum = &Value::from(1_i64) + &amount(&mut pool, "$5");
        assert!(sum.is_balance());
        assert_eq!(sum, &amount(&mut pool, "$5") + &Value::from(1_i64));
    }

    #[rstest]
    fn test_same_commodity_stays_amount(mut pool: CommodityPool) {
        let sum = &amount(&mut pool, "$5.00") + &amount(&mut pool, "$2.50");
        assert!(sum.is_amount());
        assert_eq!(sum.to_string(), "$7.50");
    }

    #[rstest]
    fn test_balance_arithmetic(mut pool: CommodityPool) {
        let balance = &amount(&mut pool, "10 EUR") + &amount(&mut pool, "$4");
        let doubled = &balance * &Value::from(2_i64);
        assert_eq!(doubled.to_string(), "$8\n20 EUR");
        assert_eq!(&Value::from(2_i64) * &balance, doubled);
        let halved = balance.clone() / 2_i64;
        assert_eq!(halved.to_string(), "$2\n5 EUR");
    }

    #[rstest]
    fn test_date_arithmetic() {
        let date = Value::from(NaiveDate::from_ymd_opt(2024, 2, 28).unwrap());
        let later = &date + &Value::from(2_i64);
        assert_eq!(later.to_string(), "2024/03/01");
        assert_eq!(&Value::from(2_i64) + &date, later);
        assert_eq!(&later - &Value::from(2_i64), date);

        let moment = Value::from(datetime(2024, 1, 1));
        assert_eq!(
            (&moment + &Value::from(90_i64)).to_string(),
            "2024/01/01 00:01:30"
        );
    }

    #[rstest]
    fn test_string_and_sequence_arithmetic() {
        assert_eq!(
            (&Value::from("total: ") + &Value::from(3_i64)).to_string(),
            "total: 3"
        );
        let seq = Value::from(vec![Value::from(1_i64), Value::from(2_i64), Value::from(1_i64)]);
        assert_eq!((&seq + &Value::from(4_i64)).size(), 4);
        assert_eq!((&seq - &Value::from(1_i64)).to_string(), "(2)");
        let doubled = &seq + &seq;
        assert_eq!(doubled.to_string(), "(2, 4, 2)");
        assert!(seq.checked_add(&Value::from(vec![Value::Void])).is_err());
        assert_eq!(&Value::Void + &Value::from(3_i64), Value::from(3_i64));
    }

    #[rstest]
    fn test_unsupported_operation() {
        let err = Value::from(true).checked_mul(&Value::from("x")).unwrap_err();
        assert_eq!(err.to_string(), "Cannot multiply a boolean with a string");
    }

    #[rstest]
    #[should_panic(expected = "Cannot divide")]
    fn test_operator_panics_on_unsupported() {
        let _ = Value::from(Mask::new("a")) / Value::from(1_i64);
    }

    #[rstest]
    fn test_comparisons(mut pool: CommodityPool) {
        let one = Value::from(1_i64);
        let two = Value::from(2_i64);
        assert!(one.is_less_than(&two).unwrap());
        assert!(two.is_greater_than(&one).unwrap());
        assert!(one < two);
        assert!(two >= one);
        assert_eq!(Value::from(dec!(2)), two);
        assert_eq!(2_i64, two);
        assert!(1_i64 < two);

        let five = amount(&mut pool, "$5");
        let ten = amount(&mut pool, "$10");
        assert!(five < ten);
        assert!(five.is_less_than(&amount(&mut pool, "10 EUR")).is_err());
        assert_eq!(five.partial_cmp(&amount(&mut pool, "10 EUR")), None);

        assert!(Value::from("apple") < Value::from("banana"));
        assert!(Value::from(Mask::new("a")).is_less_than(&Value::from(Mask::new("b"))).is_err());
    }

    #[rstest]
    fn test_balance_comparisons(mut pool: CommodityPool) {
        let balance = &amount(&mut pool, "$3") + &amount(&mut pool, "4 EUR");
        assert!(balance.is_less_than(&Value::from(5_i64)).unwrap());
        assert!(!balance.is_greater_than(&Value::from(3_i64)).unwrap());
        assert!(Value::from(Balance::new()) == Value::from(0_i64));
        let single = Value::from(Balance::from(amount(&mut pool, "$3").to_amount().unwrap()));
        assert_eq!(single, amount(&mut pool, "$3"));
    }

    #[rstest]
    #[case(Value::Void, false)]
    #[case(Value::from(false), false)]
    #[case(Value::from(0_i64), false)]
    #[case(Value::from(dec!(0.00)), false)]
    #[case(Value::from(""), false)]
    #[case(Value::from(Balance::new()), false)]
    #[case(Value::from(true), true)]
    #[case(Value::from(-3_i64), true)]
    #[case(Value::from("no"), true)]
    #[case(Value::from(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()), true)]
    fn test_to_boolean(#[case] value: Value, #[case] expected: bool) {
        assert_eq!(value.to_boolean().unwrap(), expected);
    }

    #[rstest]
    fn test_to_boolean_mask_fails() {
        assert!(Value::from(Mask::new("a")).to_boolean().is_err());
    }

    #[rstest]
    fn test_casts() {
        assert_eq!(
            Value::from("42").casted(ValueType::Integer).unwrap(),
            Value::from(42_i64)
        );
        assert_eq!(
            Value::from(42_i64).casted(ValueType::String).unwrap(),
            Value::String("42".to_string())
        );
        assert_eq!(
            Value::from("2024/05/06").casted(ValueType::Date).unwrap().to_string(),
            "2024/05/06"
        );
        let midnight = Value::from(NaiveDate::from_ymd_opt(2024, 5, 6).unwrap())
            .casted(ValueType::DateTime)
            .unwrap();
        assert_eq!(midnight.to_string(), "2024/05/06 00:00:00");
        assert!(Value::from("^food").casted(ValueType::Mask).unwrap().is_mask());
        assert_eq!(
            Value::from(1_i64).casted(ValueType::Sequence).unwrap().size(),
            1
        );
        assert_eq!(
            Value::from(true).casted(ValueType::Date).unwrap_err(),
            ModelError::InvalidCast {
                from: "a boolean",
                to: "a date",
            }
        );

        let mut value = Value::from(7_i64);
        value.in_place_cast(ValueType::Amount).unwrap();
        assert!(value.is_amount());
    }

    #[rstest]
    fn test_simplify(mut pool: CommodityPool) {
        assert_eq!(Value::from(dec!(3.0)).simplified(), Value::Integer(3));
        assert!(Value::from(dec!(3.5)).simplified().is_amount());
        assert_eq!(Value::from(Balance::new()).simplified(), Value::Integer(0));

        let mut single = Value::from(Balance::from(amount(&mut pool, "$3").to_amount().unwrap()));
        single.in_place_simplify();
        assert!(single.is_amount());
        assert_eq!(single.to_string(), "$3");
    }

    #[rstest]
    fn test_rounding_family(mut pool: CommodityPool) {
        let value = &amount(&mut pool, "2.00 ZXV") / &Value::from(3_i64);
        assert_eq!(value.rounded().unwrap().to_string(), "0.67 ZXV");
        assert_eq!(value.unrounded().unwrap().to_string(), "0.66666667 ZXV");
        assert!(Value::from(42_i64).rounded().unwrap().is_long());
        assert!(Value::from("x").rounded().is_err());
    }

    #[rstest]
    fn test_annotation_delegation(mut pool: CommodityPool) {
        let mut value = amount(&mut pool, "10 AAPL {$100}");
        assert!(value.has_annotation());
        let stripped = value.strip_annotations(&KeepDetails::default()).unwrap();
        assert!(!stripped.has_annotation());

        let mut text = Value::from("plain");
        text.annotate(Annotation::with_tag("lot"));
        assert_eq!(text, Value::from("plain"));

        value = Value::from(dec!(5));
        value.annotate(Annotation::with_tag("lot"));
        assert_eq!(value.annotation().unwrap().tag.as_deref(), Some("lot"));
    }

    #[rstest]
    fn test_number(mut pool: CommodityPool) {
        let value = amount(&mut pool, "$12.50");
        assert_eq!(
            value.number().unwrap().to_amount().unwrap().quantity(),
            dec!(12.50)
        );
        assert_eq!(Value::from(true).number().unwrap(), Value::from(1_i64));
    }

    #[rstest]
    fn test_value_and_exchange(mut pool: CommodityPool) {
        pool.parse_price_directive("2020-01-15 EUR $1.10", false, false)
            .unwrap();
        let usd = pool.get("$").unwrap();
        let euros = amount(&mut pool, "10 EUR");

        let valued = euros.value(Some(&usd), Some(datetime(2020, 2, 1))).unwrap();
        assert_eq!(valued.to_string(), "$11.00");
        assert!(Value::from(3_i64).value(Some(&usd), None).is_none());

        let mixed = &euros + &amount(&mut pool, "5 GAL");
        let exchanged = mixed.exchange_commodities("$", &pool, None).unwrap();
        let balance = exchanged.as_balance().unwrap();
        assert_eq!(balance.commodity_count(), 2);
        assert_eq!(balance.to_string(), "$11.00\n5 GAL");

        assert_eq!(
            euros.exchange_commodities("NOPE", &pool, None).unwrap_err(),
            ModelError::not_found("NOPE")
        );
    }

    #[rstest]
    fn test_valid() {
        assert!(Value::from(vec![Value::from(1_i64), Value::from(dec!(2))]).valid());
    }
}
