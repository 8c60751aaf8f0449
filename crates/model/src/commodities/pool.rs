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

//! The commodity registry.
//!
//! A [`CommodityPool`] is the explicit context every commodity lookup and price operation runs
//! against. It owns the plain commodities in creation order, the annotated commodities keyed by
//! symbol and annotation, and the quote settings shared with every commodity it creates.
//!
//! Commodities reference one another through price histories and conversion links. Dropping or
//! resetting the pool clears those references so no commodity outlives the session through a
//! reference cycle.

use std::{cell::RefCell, ops::Index, path::PathBuf, rc::Rc};

use chrono::{Local, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use tally_core::{
    correctness::FAILED,
    datetime::{parse_date, parse_datetime},
    string::next_element,
};
use ustr::Ustr;

use super::{
    annotation::{Annotation, AnnotationFlags, KeepDetails},
    commodity::{Commodity, CommodityFlags},
    config::PoolConfig,
    price::{CostBreakdown, PricePoint, PriceQuoteSource, QuoteSettings},
};
use crate::{
    error::{ModelError, ModelResult},
    parsing::{ParseFlags, scan_symbol},
    types::Amount,
};

/// Style flags a larger unit inherits from the smaller unit it converts into.
const CONVERSION_STYLE: CommodityFlags = CommodityFlags::STYLE_SUFFIXED
    .union(CommodityFlags::STYLE_SEPARATED)
    .union(CommodityFlags::STYLE_DECIMAL_COMMA)
    .union(CommodityFlags::STYLE_THOUSANDS);

/// Registry of commodities and their price relationships.
#[derive(Debug)]
pub struct CommodityPool {
    commodities: IndexMap<Ustr, Commodity>,
    annotated: IndexMap<(Ustr, Annotation), Commodity>,
    null_commodity: Commodity,
    default_commodity: Option<Commodity>,
    config: PoolConfig,
    quotes: Rc<RefCell<QuoteSettings>>,
}

impl Default for CommodityPool {
    /// Creates a new default [`CommodityPool`] instance.
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

impl CommodityPool {
    /// Creates a new [`CommodityPool`] instance.
    ///
    /// # Panics
    ///
    /// Panics if the built-in time unit conversions fail to register.
    #[must_use]
    pub fn new(config: PoolConfig) -> Self {
        let quotes = Rc::new(RefCell::new(QuoteSettings {
            get_quotes: config.get_quotes,
            quote_leeway: config.quote_leeway,
            source: None,
        }));
        let null_commodity = Commodity::new(
            Ustr::from(""),
            CommodityFlags::BUILTIN | CommodityFlags::NO_MARKET,
            Rc::clone(&quotes),
        );

        let mut pool = Self {
            commodities: IndexMap::new(),
            annotated: IndexMap::new(),
            null_commodity,
            default_commodity: None,
            config,
            quotes,
        };
        if pool.config.time_units {
            pool.register_time_units();
        }
        pool
    }

    fn register_time_units(&mut self) {
        for (larger, smaller) in [("1.0m", "60s"), ("1.0h", "60m")] {
            self.parse_conversion(larger, smaller).expect(FAILED);
        }
        for symbol in ["s", "m", "h"] {
            self[symbol].add_flags(CommodityFlags::BUILTIN | CommodityFlags::NO_MARKET);
        }
    }

    /// Discards every commodity, price and conversion and rebuilds the pool from its
    /// configuration. The quote source is removed.
    pub fn reset(&mut self) {
        log::debug!("Resetting commodity pool");
        *self = Self::new(self.config.clone());
    }

    // -- Configuration ---------------------------------------------------------------------------

    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    #[must_use]
    pub fn decimal_comma_by_default(&self) -> bool {
        self.config.decimal_comma_by_default
    }

    /// Sets whether commodities created from now on default to a decimal comma.
    pub fn set_decimal_comma_by_default(&mut self, value: bool) {
        self.config.decimal_comma_by_default = value;
    }

    #[must_use]
    pub fn keep_base(&self) -> bool {
        self.config.keep_base
    }

    pub fn set_keep_base(&mut self, value: bool) {
        self.config.keep_base = value;
    }

    #[must_use]
    pub fn price_db(&self) -> Option<&PathBuf> {
        self.config.price_db.as_ref()
    }

    pub fn set_price_db(&mut self, path: Option<PathBuf>) {
        self.config.price_db = path;
    }

    #[must_use]
    pub fn get_quotes(&self) -> bool {
        self.config.get_quotes
    }

    pub fn set_get_quotes(&mut self, value: bool) {
        self.config.get_quotes = value;
        self.quotes.borrow_mut().get_quotes = value;
    }

    #[must_use]
    pub fn quote_leeway(&self) -> i64 {
        self.config.quote_leeway
    }

    pub fn set_quote_leeway(&mut self, seconds: i64) {
        self.config.quote_leeway = seconds;
        self.quotes.borrow_mut().quote_leeway = seconds;
    }

    /// Installs the hook consulted by [`Commodity::check_for_updated_price`].
    pub fn set_quote_source(&mut self, source: Option<Rc<dyn PriceQuoteSource>>) {
        self.quotes.borrow_mut().source = source;
    }

    // -- Registry --------------------------------------------------------------------------------

    /// Returns the built-in commodity with the empty symbol.
    #[must_use]
    pub fn null_commodity(&self) -> &Commodity {
        &self.null_commodity
    }

    #[must_use]
    pub fn default_commodity(&self) -> Option<&Commodity> {
        self.default_commodity.as_ref()
    }

    pub fn set_default_commodity(&mut self, commodity: Option<Commodity>) {
        self.default_commodity = commodity;
    }

    /// Returns the commodity registered for `symbol` and `annotation`, if any.
    ///
    /// An empty annotation is treated as absent.
    #[must_use]
    pub fn find(&self, symbol: &str, annotation: Option<&Annotation>) -> Option<Commodity> {
        match annotation.filter(|details| !details.is_empty()) {
            None if symbol.is_empty() => Some(self.null_commodity.clone()),
            None => self.commodities.get(&Ustr::from(symbol)).cloned(),
            Some(details) => self
                .annotated
                .get(&(Ustr::from(symbol), details.clone()))
                .cloned(),
        }
    }

    /// Registers a new commodity.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::CommodityExists`] if the (symbol, annotation) key is already taken.
    pub fn create(&mut self, symbol: &str, annotation: Option<&Annotation>) -> ModelResult<Commodity> {
        if self.find(symbol, annotation).is_some() {
            let suffix = annotation.map(ToString::to_string).unwrap_or_default();
            return Err(ModelError::CommodityExists(format!("{symbol}{suffix}")));
        }
        Ok(match annotation.filter(|details| !details.is_empty()) {
            None => self.insert_plain(symbol),
            Some(details) => self.insert_annotated(symbol, details),
        })
    }

    /// Returns the registered commodity for the key, creating it first if needed.
    ///
    /// Repeated calls with the same key return handles onto the same registry entry.
    pub fn find_or_create(&mut self, symbol: &str, annotation: Option<&Annotation>) -> Commodity {
        if let Some(found) = self.find(symbol, annotation) {
            return found;
        }
        match annotation.filter(|details| !details.is_empty()) {
            None => self.insert_plain(symbol),
            Some(details) => self.insert_annotated(symbol, details),
        }
    }

    fn insert_plain(&mut self, symbol: &str) -> Commodity {
        let mut flags = CommodityFlags::empty();
        if self.config.decimal_comma_by_default {
            flags |= CommodityFlags::STYLE_DECIMAL_COMMA;
        }
        let symbol = Ustr::from(symbol);
        log::debug!("Creating commodity '{symbol}'");
        let commodity = Commodity::new(symbol, flags, Rc::clone(&self.quotes));
        self.commodities.insert(symbol, commodity.clone());
        commodity
    }

    fn insert_annotated(&mut self, symbol: &str, details: &Annotation) -> Commodity {
        let base = self.find_or_create(symbol, None);
        base.add_flags(CommodityFlags::SAW_ANNOTATED);
        if details.price.is_some() {
            if details.has_flags(AnnotationFlags::PRICE_FIXATED) {
                base.add_flags(CommodityFlags::SAW_ANN_PRICE_FIXATED);
            } else {
                base.add_flags(CommodityFlags::SAW_ANN_PRICE_FLOAT);
            }
        }
        log::debug!("Creating annotated commodity '{symbol}{details}'");
        let commodity = base.annotate(details.clone());
        self.annotated
            .insert((base.base_symbol(), details.clone()), commodity.clone());
        commodity
    }

    /// Returns the plain commodity registered for `symbol`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::CommodityNotFound`] if no such commodity is registered.
    pub fn get(&self, symbol: &str) -> ModelResult<Commodity> {
        self.find(symbol, None)
            .ok_or_else(|| ModelError::not_found(symbol))
    }

    /// Returns `true` if a plain commodity is registered for `symbol`.
    #[must_use]
    pub fn contains(&self, symbol: &str) -> bool {
        self.commodities.contains_key(&Ustr::from(symbol))
    }

    /// Returns the number of plain commodities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commodities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commodities.is_empty()
    }

    /// Returns the symbols of the plain commodities in creation order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.commodities.keys().map(|s| -> &str { s.as_str() })
    }

    /// Returns the plain commodities in creation order.
    pub fn values(&self) -> impl Iterator<Item = &Commodity> {
        self.commodities.values()
    }

    /// Returns (symbol, commodity) pairs in creation order.
    pub fn items(&self) -> impl Iterator<Item = (&str, &Commodity)> {
        self.commodities.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns (symbol, commodity) pairs in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Commodity)> {
        self.items()
    }

    /// Returns the annotated commodities in creation order.
    pub fn annotated(&self) -> impl Iterator<Item = &Commodity> {
        self.annotated.values()
    }

    // -- Prices and conversions ------------------------------------------------------------------

    /// Records `per_unit_cost` as the price of one unit of `commodity` at `moment`
    /// (now when absent). The price is recorded on the plain referent.
    pub fn exchange(
        &mut self,
        commodity: &Commodity,
        per_unit_cost: &Amount,
        moment: Option<NaiveDateTime>,
    ) {
        let moment = moment.unwrap_or_else(|| Local::now().naive_local());
        commodity.referent().add_price(moment, per_unit_cost, true);
    }

    /// Exchanges `amount` for `cost`, returning the lot-annotated amount and its costs.
    ///
    /// `cost` is a per-unit rate when `is_per_unit` is set, else the total paid. When
    /// `add_prices` is set the per-unit rate is recorded in price history, unless the amount is a
    /// lot with a fixated price or the cost is denominated in the amount's own commodity.
    ///
    /// # Errors
    ///
    /// Returns an error if the per-unit cost cannot be computed.
    #[allow(clippy::too_many_arguments)]
    pub fn exchange_cost(
        &mut self,
        amount: &Amount,
        cost: &Amount,
        is_per_unit: bool,
        add_prices: bool,
        moment: Option<NaiveDateTime>,
        tag: Option<String>,
    ) -> ModelResult<CostBreakdown> {
        let mut per_unit_cost = if is_per_unit || amount.is_realzero() {
            cost.abs()
        } else {
            cost.checked_div(&amount.number())?.abs()
        };
        if !cost.has_commodity() {
            per_unit_cost.clear_commodity();
        }
        if cost.has_annotation() {
            per_unit_cost = per_unit_cost.strip_annotations(&KeepDetails::default());
        }

        let lot = amount.annotation();
        let fixated = lot.is_some_and(|details| {
            details.price.is_some() && details.has_flags(AnnotationFlags::PRICE_FIXATED)
        });

        if add_prices
            && !per_unit_cost.is_realzero()
            && !fixated
            && let Some(commodity) = amount.commodity()
            && per_unit_cost
                .commodity()
                .is_some_and(|quoted_in| !quoted_in.same_referent(commodity))
        {
            self.exchange(commodity, &per_unit_cost, moment);
        }

        let final_cost = if is_per_unit {
            cost.checked_mul(&amount.number().abs())?
        } else {
            cost.clone()
        };
        let basis_cost = match lot.and_then(|details| details.price.as_ref()) {
            Some(price) => price.checked_mul(&amount.number())?.unrounded(),
            None => final_cost.clone(),
        };

        let details = Annotation::new(Some(per_unit_cost), moment.map(|m| m.date()), tag);
        let exchanged = amount
            .strip_annotations(&KeepDetails::default())
            .annotated(details);

        Ok(CostBreakdown {
            amount: exchanged,
            final_cost,
            basis_cost,
        })
    }

    /// Links `larger` and `smaller` so one unit of `larger` equals `rate` units of `smaller`.
    pub fn register_conversion(&mut self, larger: &Commodity, rate: Decimal, smaller: &Commodity) {
        log::debug!(
            "Registering conversion 1 {} = {rate} {}",
            larger.symbol(),
            smaller.symbol()
        );
        larger.set_smaller(Some(Amount::from(rate).with_commodity(Some(smaller))));
        larger.add_flags((smaller.flags() & CONVERSION_STYLE) | CommodityFlags::NO_MARKET);
        smaller.set_larger(Some(Amount::from(rate).with_commodity(Some(larger))));
    }

    /// Parses two amounts such as `"1.0h"` and `"60m"` and links their commodities.
    ///
    /// # Errors
    ///
    /// Returns an error if either amount fails to parse, lacks a commodity, or the larger amount
    /// is zero.
    pub fn parse_conversion(&mut self, larger: &str, smaller: &str) -> ModelResult<()> {
        let larger_amount = Amount::parse(larger, self, ParseFlags::NO_REDUCE)?;
        let smaller_amount = Amount::parse(smaller, self, ParseFlags::NO_REDUCE)?;

        let (Some(larger_comm), Some(smaller_comm)) =
            (larger_amount.commodity(), smaller_amount.commodity())
        else {
            return Err(ModelError::parse(
                format!("{larger} = {smaller}"),
                "a conversion requires two commodities",
            ));
        };
        let rate = smaller_amount
            .quantity()
            .checked_div(larger_amount.quantity())
            .ok_or(ModelError::DivideByZero)?;

        self.register_conversion(&larger_comm.referent(), rate, &smaller_comm.referent());
        Ok(())
    }

    /// Parses a price record: `<date>[ <time>] <symbol> <amount>`.
    ///
    /// When `no_date` is set the record carries no date and is stamped with the current time.
    /// Unless `do_not_add_price` is set the price is recorded in the commodity's history.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Parse`] if any field is missing or malformed.
    pub fn parse_price_directive(
        &mut self,
        text: &str,
        do_not_add_price: bool,
        no_date: bool,
    ) -> ModelResult<(Commodity, PricePoint)> {
        let line = text.trim();
        let fail = |reason: &str| ModelError::parse(line, reason);

        let (when, symbol_and_price) = match next_element(line) {
            (date_field, Some(rest))
                if !no_date && date_field.starts_with(|c: char| c.is_ascii_digit()) =>
            {
                match next_element(rest) {
                    (time_field, Some(after_time))
                        if time_field.starts_with(|c: char| c.is_ascii_digit()) =>
                    {
                        let when = parse_datetime(&format!("{date_field} {time_field}"))
                            .map_err(|e| fail(&e.to_string()))?;
                        (when, after_time)
                    }
                    _ => {
                        let date = parse_date(date_field).map_err(|e| fail(&e.to_string()))?;
                        (date.and_time(NaiveTime::MIN), rest)
                    }
                }
            }
            (_, None) if !no_date => return Err(fail("missing symbol and price")),
            _ => (Local::now().naive_local(), line),
        };

        let (symbol, price_text) = scan_symbol(symbol_and_price)?
            .ok_or_else(|| fail("missing commodity symbol"))?;
        let price_text = price_text.trim();
        if price_text.is_empty() {
            return Err(fail("missing price"));
        }

        let commodity = self.find_or_create(&symbol, None);
        let price = Amount::parse(price_text, self, ParseFlags::NO_MIGRATE)?;
        if !do_not_add_price {
            commodity.add_price(when, &price, true);
        }
        commodity.add_flags(CommodityFlags::KNOWN);

        Ok((commodity, PricePoint::new(when, price)))
    }
}

impl Drop for CommodityPool {
    fn drop(&mut self) {
        for commodity in self.commodities.values() {
            commodity.clear_links();
        }
        self.null_commodity.clear_links();
    }
}

impl Index<&str> for CommodityPool {
    type Output = Commodity;

    /// # Panics
    ///
    /// Panics with [`ModelError::CommodityNotFound`] if no commodity is registered for `symbol`.
    fn index(&self, symbol: &str) -> &Self::Output {
        match symbol {
            "" => &self.null_commodity,
            _ => match self.commodities.get(&Ustr::from(symbol)) {
                Some(commodity) => commodity,
                None => panic!("{}", ModelError::not_found(symbol)),
            },
        }
    }
}

impl<'a> IntoIterator for &'a CommodityPool {
    type Item = (&'a str, &'a Commodity);
    type IntoIter = Box<dyn Iterator<Item = Self::Item> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.items())
    }
}
