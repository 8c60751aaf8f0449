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

//! Represents a net position across several commodities.

use std::{
    fmt::{Debug, Display},
    ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign},
};

use chrono::NaiveDateTime;
use indexmap::IndexMap;

use super::Amount;
use crate::{
    commodities::{Annotation, Commodity, KeepDetails},
    error::{ModelError, ModelResult},
};

type BalanceKey = (Option<Commodity>, Option<Annotation>);

fn key_of(amount: &Amount) -> BalanceKey {
    (amount.commodity().cloned(), amount.annotation().cloned())
}

/// A mapping from commodity (and lot) to the non-zero amount held in it.
///
/// Amounts of distinct commodities or lots never merge. An entry that nets to zero is removed,
/// so the empty balance is the only zero balance.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Balance {
    amounts: IndexMap<BalanceKey, Amount>,
}

impl Balance {
    /// Creates a new empty [`Balance`] instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `amount` to the entry for its commodity, dropping the entry if it nets to zero.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Overflow`] if the sum is out of range.
    pub fn add_amount(&mut self, amount: &Amount) -> ModelResult<()> {
        if amount.is_null() || amount.is_realzero() {
            return Ok(());
        }
        let key = key_of(amount);
        match self.amounts.get(&key) {
            Some(existing) => {
                let sum = existing.checked_add(amount)?;
                if sum.is_realzero() {
                    self.amounts.shift_remove(&key);
                } else {
                    self.amounts.insert(key, sum);
                }
            }
            None => {
                self.amounts.insert(key, amount.clone());
            }
        }
        Ok(())
    }

    /// Subtracts `amount` from the entry for its commodity.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Overflow`] if the difference is out of range.
    pub fn sub_amount(&mut self, amount: &Amount) -> ModelResult<()> {
        self.add_amount(&amount.negated())
    }

    /// Merges every entry of `other` into this balance.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Overflow`] if a sum is out of range.
    pub fn add_balance(&mut self, other: &Self) -> ModelResult<()> {
        other.amounts.values().try_for_each(|amount| self.add_amount(amount))
    }

    /// Subtracts every entry of `other` from this balance.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Overflow`] if a difference is out of range.
    pub fn sub_balance(&mut self, other: &Self) -> ModelResult<()> {
        other.amounts.values().try_for_each(|amount| self.sub_amount(amount))
    }

    fn scale_by(
        &self,
        factor: &Amount,
        op: &'static str,
        apply: fn(&Amount, &Amount) -> ModelResult<Amount>,
    ) -> ModelResult<Self> {
        if let Some(commodity) = factor.commodity() {
            let only = self.single_commodity();
            if only.is_none_or(|only| only != commodity) {
                return Err(ModelError::incompatible(op, self, factor));
            }
        }
        let mut result = Self::new();
        for amount in self.amounts.values() {
            result.add_amount(&apply(amount, factor)?)?;
        }
        Ok(result)
    }

    fn single_commodity(&self) -> Option<&Commodity> {
        match self.amounts.len() {
            1 => self.amounts.values().next().and_then(Amount::commodity),
            _ => None,
        }
    }

    /// Multiplies every entry by `factor`.
    ///
    /// `factor` must be commodity-less, or the balance must hold a single amount in the same
    /// commodity.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IncompatibleCommodity`] if `factor` carries a commodity the balance
    /// cannot be scaled by, or [`ModelError::Overflow`] if a product is out of range.
    pub fn checked_mul(&self, factor: &Amount) -> ModelResult<Self> {
        if factor.is_realzero() {
            return Ok(Self::new());
        }
        self.scale_by(factor, "multiply", Amount::checked_mul)
    }

    /// Divides every entry by `divisor`, under the same commodity rule as [`Self::checked_mul`].
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DivideByZero`] if `divisor` is zero, or the errors of
    /// [`Self::checked_mul`].
    pub fn checked_div(&self, divisor: &Amount) -> ModelResult<Self> {
        if divisor.is_realzero() {
            return Err(ModelError::DivideByZero);
        }
        self.scale_by(divisor, "divide", Amount::checked_div)
    }

    fn map_amounts(&self, f: impl Fn(&Amount) -> ModelResult<Amount>) -> ModelResult<Self> {
        let mut result = Self::new();
        for amount in self.amounts.values() {
            result.add_amount(&f(amount)?)?;
        }
        Ok(result)
    }

    fn map_infallible(&self, f: impl Fn(&Amount) -> Amount) -> Self {
        Self {
            amounts: self
                .amounts
                .values()
                .map(f)
                .filter(|amount| !amount.is_realzero())
                .map(|amount| (key_of(&amount), amount))
                .collect(),
        }
    }

    #[must_use]
    pub fn negated(&self) -> Self {
        self.map_infallible(Amount::negated)
    }

    pub fn in_place_negate(&mut self) {
        *self = self.negated();
    }

    #[must_use]
    pub fn abs(&self) -> Self {
        self.map_infallible(Amount::abs)
    }

    // -- Queries ---------------------------------------------------------------------------------

    /// Returns `true` if the balance holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    /// Returns `true` if every entry renders as zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amounts.values().all(Amount::is_zero)
    }

    /// Returns `true` if every entry is exactly zero.
    #[must_use]
    pub fn is_realzero(&self) -> bool {
        self.amounts.values().all(Amount::is_realzero)
    }

    #[must_use]
    pub fn is_nonzero(&self) -> bool {
        !self.is_zero()
    }

    /// Returns the number of commodities (and lots) held.
    #[must_use]
    pub fn commodity_count(&self) -> usize {
        self.amounts.len()
    }

    /// Returns the entries in insertion order.
    pub fn amounts(&self) -> impl Iterator<Item = &Amount> {
        self.amounts.values()
    }

    /// Returns the entries ordered by commodity.
    #[must_use]
    pub fn sorted_amounts(&self) -> Vec<&Amount> {
        let mut amounts: Vec<&Amount> = self.amounts.values().collect();
        amounts.sort_by(|a, b| a.commodity().cmp(&b.commodity()));
        amounts
    }

    /// Returns the single amount held, or a zero amount for an empty balance.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::AmbiguousConversion`] if more than one commodity is held.
    pub fn single_amount(&self) -> ModelResult<Amount> {
        match self.amounts.len() {
            0 => Ok(Amount::from(0)),
            1 => Ok(self.amounts[0].clone()),
            n => Err(ModelError::AmbiguousConversion(n)),
        }
    }

    /// Converts to a single amount, as [`Self::single_amount`].
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::AmbiguousConversion`] if more than one commodity is held.
    pub fn to_amount(&self) -> ModelResult<Amount> {
        self.single_amount()
    }

    /// Returns the amount held in `commodity`, or the single amount held when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::AmbiguousConversion`] if `commodity` is `None` and more than one
    /// commodity is held.
    pub fn commodity_amount(&self, commodity: Option<&Commodity>) -> ModelResult<Option<Amount>> {
        match commodity {
            Some(commodity) => Ok(self
                .amounts
                .values()
                .find(|amount| amount.commodity() == Some(commodity))
                .cloned()),
            None if self.amounts.is_empty() => Ok(None),
            None => self.single_amount().map(Some),
        }
    }

    // -- Rounding and conversion -----------------------------------------------------------------

    #[must_use]
    pub fn rounded(&self) -> Self {
        self.map_infallible(Amount::rounded)
    }

    pub fn in_place_round(&mut self) {
        *self = self.rounded();
    }

    #[must_use]
    pub fn truncated(&self) -> Self {
        self.map_infallible(Amount::truncated)
    }

    pub fn in_place_truncate(&mut self) {
        *self = self.truncated();
    }

    #[must_use]
    pub fn floored(&self) -> Self {
        self.map_infallible(Amount::floored)
    }

    pub fn in_place_floor(&mut self) {
        *self = self.floored();
    }

    #[must_use]
    pub fn unrounded(&self) -> Self {
        self.map_infallible(Amount::unrounded)
    }

    pub fn in_place_unround(&mut self) {
        *self = self.unrounded();
    }

    /// Expresses every entry in its smallest linked unit.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Overflow`] if a conversion is out of range.
    pub fn reduced(&self) -> ModelResult<Self> {
        self.map_amounts(Amount::reduced)
    }

    /// Expresses every entry in the largest linked unit it amounts to at least one of.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Overflow`] if a conversion is out of range.
    pub fn unreduced(&self) -> ModelResult<Self> {
        self.map_amounts(Amount::unreduced)
    }

    /// Returns the sum of the bare quantities of every entry.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Overflow`] if the sum is out of range.
    pub fn number(&self) -> ModelResult<Self> {
        self.map_amounts(|amount| Ok(amount.number()))
    }

    /// Strips lot details, merging lots that become indistinguishable.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Overflow`] if merged lots sum out of range.
    pub fn strip_annotations(&self, keep: &KeepDetails) -> ModelResult<Self> {
        self.map_amounts(|amount| Ok(amount.strip_annotations(keep)))
    }

    /// Values every entry in `target` (or its own quote commodity) at `moment`.
    ///
    /// Commodity-less entries are kept as they are. Returns `None` if any other entry has no
    /// price.
    #[must_use]
    pub fn value(&self, target: Option<&Commodity>, moment: Option<NaiveDateTime>) -> Option<Self> {
        let mut result = Self::new();
        for amount in self.amounts.values() {
            let valued = if amount.has_commodity() {
                amount.value(target, moment)?
            } else {
                amount.clone()
            };
            result.add_amount(&valued).ok()?;
        }
        Some(result)
    }

    /// Returns `false` if the balance is structurally unsound.
    #[must_use]
    pub fn valid(&self) -> bool {
        self.amounts.iter().all(|(key, amount)| {
            if amount.is_realzero() {
                log::debug!("Balance holds a zero entry {amount}");
                return false;
            }
            if *key != key_of(amount) {
                log::debug!("Balance entry {amount} is filed under the wrong commodity");
                return false;
            }
            amount.valid()
        })
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        let mut balance = Self::new();
        if !amount.is_null() && !amount.is_realzero() {
            balance.amounts.insert(key_of(&amount), amount);
        }
        balance
    }
}

impl Display for Balance {
    /// Writes one amount per line ordered by commodity, or `0` when empty.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.amounts.is_empty() {
            return write!(f, "0");
        }
        let lines: Vec<String> = self
            .sorted_amounts()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        write!(f, "{}", lines.join("\n"))
    }
}

impl Debug for Balance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let amounts: Vec<String> = self
            .sorted_amounts()
            .into_iter()
            .map(Amount::to_fullstring)
            .collect();
        write!(f, "{}({})", stringify!(Balance), amounts.join(", "))
    }
}

// -- Operators ------------------------------------------------------------------------------------

impl AddAssign<&Amount> for Balance {
    /// # Panics
    ///
    /// Panics if the sum overflows.
    fn add_assign(&mut self, rhs: &Amount) {
        self.add_amount(rhs).unwrap_or_else(|e| panic!("{e}"));
    }
}

impl SubAssign<&Amount> for Balance {
    /// # Panics
    ///
    /// Panics if the difference overflows.
    fn sub_assign(&mut self, rhs: &Amount) {
        self.sub_amount(rhs).unwrap_or_else(|e| panic!("{e}"));
    }
}

impl AddAssign<&Self> for Balance {
    fn add_assign(&mut self, rhs: &Self) {
        self.add_balance(rhs).unwrap_or_else(|e| panic!("{e}"));
    }
}

impl SubAssign<&Self> for Balance {
    fn sub_assign(&mut self, rhs: &Self) {
        self.sub_balance(rhs).unwrap_or_else(|e| panic!("{e}"));
    }
}

impl Add<&Amount> for Balance {
    type Output = Self;

    fn add(mut self, rhs: &Amount) -> Self {
        self += rhs;
        self
    }
}

impl Sub<&Amount> for Balance {
    type Output = Self;

    fn sub(mut self, rhs: &Amount) -> Self {
        self -= rhs;
        self
    }
}

impl Add<&Self> for Balance {
    type Output = Self;

    fn add(mut self, rhs: &Self) -> Self {
        self += rhs;
        self
    }
}

impl Sub<&Self> for Balance {
    type Output = Self;

    fn sub(mut self, rhs: &Self) -> Self {
        self -= rhs;
        self
    }
}

impl Mul<&Amount> for &Balance {
    type Output = Balance;

    /// # Panics
    ///
    /// Panics if [`Balance::checked_mul`] fails.
    fn mul(self, rhs: &Amount) -> Balance {
        self.checked_mul(rhs).unwrap_or_else(|e| panic!("{e}"))
    }
}

impl Div<&Amount> for &Balance {
    type Output = Balance;

    /// # Panics
    ///
    /// Panics if [`Balance::checked_div`] fails.
    fn div(self, rhs: &Amount) -> Balance {
        self.checked_div(rhs).unwrap_or_else(|e| panic!("{e}"))
    }
}

impl Mul<i64> for &Balance {
    type Output = Balance;

    fn mul(self, rhs: i64) -> Balance {
        self * &Amount::from(rhs)
    }
}

impl Div<i64> for &Balance {
    type Output = Balance;

    fn div(self, rhs: i64) -> Balance {
        self / &Amount::from(rhs)
    }
}

impl Neg for Balance {
    type Output = Self;

    fn neg(self) -> Self {
        self.negated()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::{
        commodities::CommodityPool,
        parsing::ParseFlags,
        stubs::{datetime, pool},
    };

    fn parse(pool: &mut CommodityPool, text: &str) -> Amount {
        Amount::parse(text, pool, ParseFlags::empty()).unwrap()
    }

    #[rstest]
    fn test_empty_balance() {
        let balance = Balance::new();
        assert!(balance.is_empty());
        assert!(balance.is_zero());
        assert!(balance.is_realzero());
        assert_eq!(balance.commodity_count(), 0);
        assert_eq!(balance.to_string(), "0");
        assert_eq!(balance.single_amount().unwrap(), Amount::from(0));
        assert_eq!(balance.commodity_amount(None).unwrap(), None);
        assert!(balance.valid());
    }

    #[rstest]
    fn test_single_commodity() {
        let balance = Balance::from(Amount::from(10));
        assert_eq!(balance.single_amount().unwrap(), Amount::from(10));
        assert_eq!(balance.to_amount().unwrap(), Amount::from(10));
        assert_eq!(balance.commodity_count(), 1);
        assert!(!balance.is_empty());
    }

    #[rstest]
    fn test_from_zero_amount_is_empty() {
        assert!(Balance::from(Amount::from(0)).is_empty());
        assert!(Balance::from(Amount::null()).is_empty());
    }

    #[rstest]
    fn test_add_merges_same_commodity(mut pool: CommodityPool) {
        let mut balance = Balance::new();
        balance += &parse(&mut pool, "10 EUR");
        balance += &parse(&mut pool, "5 EUR");
        balance += &parse(&mut pool, "$3.00");
        assert_eq!(balance.commodity_count(), 2);
        let eur = pool.get("EUR").unwrap();
        assert_eq!(
            balance.commodity_amount(Some(&eur)).unwrap().unwrap().to_string(),
            "15 EUR"
        );
        assert_eq!(balance.to_string(), "$3.00\n15 EUR");
    }

    #[rstest]
    fn test_net_zero_entry_is_removed(mut pool: CommodityPool) {
        let mut balance = Balance::from(parse(&mut pool, "10 EUR"));
        balance += &parse(&mut pool, "$1");
        balance -= &parse(&mut pool, "10 EUR");
        assert_eq!(balance.commodity_count(), 1);
        assert_eq!(balance.to_string(), "$1");
        balance -= &parse(&mut pool, "$1");
        assert!(balance.is_empty());
        assert!(balance.valid());
    }

    #[rstest]
    fn test_lots_do_not_merge(mut pool: CommodityPool) {
        let mut balance = Balance::new();
        balance += &parse(&mut pool, "10 AAPL {$100}");
        balance += &parse(&mut pool, "5 AAPL {$110}");
        assert_eq!(balance.commodity_count(), 2);

        let stripped = balance.strip_annotations(&KeepDetails::default()).unwrap();
        assert_eq!(stripped.commodity_count(), 1);
        assert_eq!(stripped.single_amount().unwrap().to_string(), "15 AAPL");
    }

    #[rstest]
    fn test_multi_commodity_single_amount_is_ambiguous(mut pool: CommodityPool) {
        let balance = Balance::from(parse(&mut pool, "10 EUR")) + &parse(&mut pool, "10 USD");
        assert_eq!(
            balance.single_amount().unwrap_err(),
            ModelError::AmbiguousConversion(2)
        );
        assert_eq!(
            balance.to_amount().unwrap_err(),
            ModelError::AmbiguousConversion(2)
        );
        assert!(balance.commodity_amount(None).is_err());
    }

    #[rstest]
    fn test_multiply_and_divide(mut pool: CommodityPool) {
        let balance = Balance::from(parse(&mut pool, "10 EUR")) + &parse(&mut pool, "$4");
        let doubled = &balance * 2;
        assert_eq!(doubled.to_string(), "$8\n20 EUR");
        let halved = &balance / 2;
        assert_eq!(halved.to_string(), "$2\n5 EUR");
        assert!((&balance * 0).is_empty());
        assert_eq!(
            balance.checked_div(&Amount::from(0)).unwrap_err(),
            ModelError::DivideByZero
        );
    }

    #[rstest]
    fn test_multiply_by_commodity_amount(mut pool: CommodityPool) {
        let eur = parse(&mut pool, "10 EUR");
        let single = Balance::from(eur.clone());
        assert_eq!(
            single.checked_mul(&parse(&mut pool, "2 EUR")).unwrap().to_string(),
            "20 EUR"
        );
        assert!(single.checked_mul(&parse(&mut pool, "2 USD")).is_err());

        let multi = single + &parse(&mut pool, "$1");
        assert!(matches!(
            multi.checked_mul(&eur),
            Err(ModelError::IncompatibleCommodity { .. })
        ));
    }

    #[rstest]
    fn test_negate_and_abs(mut pool: CommodityPool) {
        let balance = Balance::from(parse(&mut pool, "-10 EUR")) + &parse(&mut pool, "$4");
        assert_eq!((-balance.clone()).to_string(), "$-4\n10 EUR");
        assert_eq!(balance.abs().to_string(), "$4\n10 EUR");
        assert_eq!(balance.negated().negated(), balance);
    }

    #[rstest]
    fn test_is_zero_at_display_precision(mut pool: CommodityPool) {
        parse(&mut pool, "$1.00");
        let tiny = parse(&mut pool, "$1.00") / 1000;
        let balance = Balance::from(tiny);
        assert!(!balance.is_empty());
        assert!(balance.is_zero());
        assert!(!balance.is_realzero());
    }

    #[rstest]
    fn test_rounding_family(mut pool: CommodityPool) {
        let balance = Balance::from(parse(&mut pool, "2.00 ZXC") / 3);
        assert_eq!(balance.rounded().to_string(), "0.67 ZXC");
        assert_eq!(balance.truncated().to_string(), "0.66 ZXC");
        assert!(balance.floored().is_empty());
        assert_eq!(balance.unrounded().to_string(), "0.66666667 ZXC");
    }

    #[rstest]
    fn test_number_sums_quantities(mut pool: CommodityPool) {
        let balance = Balance::from(parse(&mut pool, "10 EUR")) + &parse(&mut pool, "$4");
        let number = balance.number().unwrap();
        assert_eq!(number.single_amount().unwrap().quantity(), dec!(14));
    }

    #[rstest]
    fn test_value(mut pool: CommodityPool) {
        pool.parse_price_directive("2020-01-15 EUR $1.10", false, false)
            .unwrap();
        let usd = pool.get("$").unwrap();
        let balance = Balance::from(parse(&mut pool, "10 EUR")) + &parse(&mut pool, "$5.00");

        let valued = balance.value(Some(&usd), Some(datetime(2020, 2, 1))).unwrap();
        assert_eq!(valued.to_string(), "$16.00");

        let unpriced = balance + &parse(&mut pool, "3 GAL");
        assert!(unpriced.value(Some(&usd), None).is_none());
    }
}
