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

//! Commodities: named units of value with display style, conversion links and price history.
//!
//! A [`Commodity`] is a cheap handle onto registry-owned state. Cloning a handle shares that
//! state, so a precision or flag change made through one handle is seen through every other.
//! An annotated commodity is a handle carrying an [`Annotation`] next to the shared state of its
//! plain *referent*.

use std::{
    cell::{Cell, RefCell},
    fmt::{Debug, Display},
    hash::{Hash, Hasher},
    rc::Rc,
};

use bitflags::bitflags;
use chrono::{Local, NaiveDateTime};
use tally_core::formatting::NumberStyle;
use ustr::Ustr;

use super::{
    annotation::{Annotation, KeepDetails},
    price::{PriceHistory, PricePoint, QuoteSettings},
};
use crate::types::{Amount, precision::MAX_PRECISION};

bitflags! {
    /// Style and state flags of a commodity.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CommodityFlags: u16 {
        /// The symbol follows the quantity.
        const STYLE_SUFFIXED = 1 << 0;
        /// Whitespace separates symbol and quantity.
        const STYLE_SEPARATED = 1 << 1;
        /// A comma marks the fraction.
        const STYLE_DECIMAL_COMMA = 1 << 2;
        /// Integral digits are grouped in thousands.
        const STYLE_THOUSANDS = 1 << 3;
        /// Never looked up in price history.
        const NO_MARKET = 1 << 4;
        const BUILTIN = 1 << 5;
        const WALKED = 1 << 6;
        const KNOWN = 1 << 7;
        const PRIMARY = 1 << 8;
        const SAW_ANNOTATED = 1 << 9;
        const SAW_ANN_PRICE_FLOAT = 1 << 10;
        const SAW_ANN_PRICE_FIXATED = 1 << 11;
        /// Parsed amounts do not update this commodity's style.
        const STYLE_NO_MIGRATE = 1 << 12;
    }
}

const QUOTED_CHARS: &str = ".,;:?!-+*/^&|=<>{}[]()@\"";

/// Returns `true` if `symbol` must be wrapped in double quotes to be read back.
///
/// A symbol needs quoting when it contains whitespace, a digit, or an operator or
/// punctuation character.
#[must_use]
pub fn symbol_needs_quotes(symbol: &str) -> bool {
    symbol
        .chars()
        .any(|c| c.is_whitespace() || c.is_ascii_digit() || QUOTED_CHARS.contains(c))
}

pub(crate) struct CommodityBase {
    symbol: Ustr,
    qualified_symbol: Option<String>,
    name: RefCell<Option<String>>,
    note: RefCell<Option<String>>,
    precision: Cell<u8>,
    flags: Cell<CommodityFlags>,
    smaller: RefCell<Option<Amount>>,
    larger: RefCell<Option<Amount>>,
    prices: RefCell<PriceHistory>,
    quotes: Rc<RefCell<QuoteSettings>>,
}

/// A named unit of value, optionally carrying lot details.
#[derive(Clone)]
pub struct Commodity {
    base: Rc<CommodityBase>,
    details: Option<Rc<Annotation>>,
}

impl Commodity {
    pub(crate) fn new(
        symbol: Ustr,
        flags: CommodityFlags,
        quotes: Rc<RefCell<QuoteSettings>>,
    ) -> Self {
        let qualified_symbol = if symbol_needs_quotes(&symbol) {
            Some(format!("\"{symbol}\""))
        } else {
            None
        };
        Self {
            base: Rc::new(CommodityBase {
                symbol,
                qualified_symbol,
                name: RefCell::new(None),
                note: RefCell::new(None),
                precision: Cell::new(0),
                flags: Cell::new(flags),
                smaller: RefCell::new(None),
                larger: RefCell::new(None),
                prices: RefCell::new(PriceHistory::default()),
                quotes,
            }),
            details: None,
        }
    }

    /// Returns a handle onto the same commodity carrying `details`.
    pub(crate) fn annotate(&self, details: Annotation) -> Self {
        Self {
            base: Rc::clone(&self.base),
            details: Some(Rc::new(details)),
        }
    }

    /// Returns the display symbol, quoted when [`symbol_needs_quotes`] holds.
    #[must_use]
    pub fn symbol(&self) -> &str {
        self.base
            .qualified_symbol
            .as_deref()
            .unwrap_or(&self.base.symbol)
    }

    /// Returns the raw, unquoted symbol.
    #[must_use]
    pub fn base_symbol(&self) -> Ustr {
        self.base.symbol
    }

    /// Returns `true` for the pool's empty-symbol commodity.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.base.symbol.is_empty()
    }

    #[must_use]
    pub fn name(&self) -> Option<String> {
        self.base.name.borrow().clone()
    }

    pub fn set_name(&self, name: Option<String>) {
        *self.base.name.borrow_mut() = name;
    }

    #[must_use]
    pub fn note(&self) -> Option<String> {
        self.base.note.borrow().clone()
    }

    pub fn set_note(&self, note: Option<String>) {
        *self.base.note.borrow_mut() = note;
    }

    /// Returns the display precision.
    #[must_use]
    pub fn precision(&self) -> u8 {
        self.base.precision.get()
    }

    /// Sets the display precision, clamped to the maximum quantity precision.
    pub fn set_precision(&self, precision: u8) {
        self.base.precision.set(precision.min(MAX_PRECISION));
    }

    #[must_use]
    pub fn flags(&self) -> CommodityFlags {
        self.base.flags.get()
    }

    /// Returns `true` if every bit in `mask` is set.
    #[must_use]
    pub fn has_flags(&self, mask: CommodityFlags) -> bool {
        self.flags().contains(mask)
    }

    pub fn add_flags(&self, mask: CommodityFlags) {
        self.base.flags.set(self.flags() | mask);
    }

    pub fn drop_flags(&self, mask: CommodityFlags) {
        self.base.flags.set(self.flags() - mask);
    }

    pub fn clear_flags(&self) {
        self.base.flags.set(CommodityFlags::empty());
    }

    /// Returns the separator style used to render quantities of this commodity.
    #[must_use]
    pub fn number_style(&self) -> NumberStyle {
        NumberStyle::new(
            self.has_flags(CommodityFlags::STYLE_THOUSANDS),
            self.has_flags(CommodityFlags::STYLE_DECIMAL_COMMA),
        )
    }

    /// Returns how many units of the next smaller commodity make one unit of this one.
    #[must_use]
    pub fn smaller(&self) -> Option<Amount> {
        self.base.smaller.borrow().clone()
    }

    pub fn set_smaller(&self, smaller: Option<Amount>) {
        *self.base.smaller.borrow_mut() = smaller;
    }

    /// Returns how many units of this commodity make one unit of the next larger one.
    #[must_use]
    pub fn larger(&self) -> Option<Amount> {
        self.base.larger.borrow().clone()
    }

    pub fn set_larger(&self, larger: Option<Amount>) {
        *self.base.larger.borrow_mut() = larger;
    }

    // -- Annotations -----------------------------------------------------------------------------

    #[must_use]
    pub fn has_annotation(&self) -> bool {
        self.details.is_some()
    }

    /// Returns the lot details of an annotated commodity.
    #[must_use]
    pub fn details(&self) -> Option<&Annotation> {
        self.details.as_deref()
    }

    /// Returns the plain commodity underneath any annotation.
    #[must_use]
    pub fn referent(&self) -> Self {
        Self {
            base: Rc::clone(&self.base),
            details: None,
        }
    }

    /// Returns `true` if both handles share the same registry entry, ignoring annotations.
    #[must_use]
    pub fn same_referent(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.base, &other.base)
    }

    /// Returns this commodity with only the annotation details `keep` retains.
    ///
    /// Yields the plain referent when nothing is retained.
    #[must_use]
    pub fn strip_annotations(&self, keep: &KeepDetails) -> Self {
        let Some(details) = self.details.as_deref() else {
            return self.clone();
        };
        let kept = details.filtered(keep, self.has_flags(CommodityFlags::SAW_ANN_PRICE_FIXATED));
        if kept.is_empty() {
            self.referent()
        } else if kept == *details {
            self.clone()
        } else {
            self.annotate(kept)
        }
    }

    /// Renders the annotation suffix, or an empty string for a plain commodity.
    #[must_use]
    pub fn write_annotations(&self) -> String {
        self.details
            .as_deref()
            .map(|details| details.write_annotations(false))
            .unwrap_or_default()
    }

    // -- Price history ---------------------------------------------------------------------------

    /// Records `price` as the value of one unit of this commodity at `moment`.
    ///
    /// When `reflective` is set, the inverse rate is recorded in the price's commodity as well.
    pub fn add_price(&self, moment: NaiveDateTime, price: &Amount, reflective: bool) {
        log::debug!("Adding price for {}: {moment} {price}", self.symbol());
        self.base
            .prices
            .borrow_mut()
            .insert(moment, price.strip_annotations(&KeepDetails::default()));

        if !reflective {
            return;
        }
        if let Some(quoted_in) = price.commodity()
            && !quoted_in.same_referent(self)
            && !price.is_realzero()
            && let Ok(inverse) = price.number().inverted()
        {
            let inverse = inverse.with_commodity(Some(&self.referent()));
            quoted_in.add_price(moment, &inverse, false);
        }
    }

    /// Removes the price quoted in `quoted_in` recorded at `moment`.
    ///
    /// Returns `true` if an entry was removed.
    pub fn remove_price(&self, moment: NaiveDateTime, quoted_in: &Self) -> bool {
        let removed = self.base.prices.borrow_mut().remove(moment, quoted_in);
        if removed {
            log::debug!(
                "Removed price for {} in {} at {moment}",
                self.symbol(),
                quoted_in.symbol()
            );
        }
        removed
    }

    /// Returns the most recent price at or before `moment`, no older than `oldest`.
    ///
    /// When `target` is given only prices quoted in it qualify. A commodity is never priced in
    /// itself.
    #[must_use]
    pub fn find_price(
        &self,
        target: Option<&Self>,
        moment: Option<NaiveDateTime>,
        oldest: Option<NaiveDateTime>,
    ) -> Option<PricePoint> {
        if let Some(target) = target
            && target.same_referent(self)
        {
            return None;
        }
        if self.has_flags(CommodityFlags::NO_MARKET) {
            return None;
        }
        self.base.prices.borrow().latest(
            self.base.symbol,
            target.map(Self::base_symbol),
            moment,
            oldest,
        )
    }

    /// Asks the installed quote source for a fresher price than `point`.
    ///
    /// Returns `None` unless quote fetching is enabled, the commodity trades on a market, and
    /// `point` is missing or older than the pool's quote leeway. A returned quote is recorded in
    /// the price history.
    #[must_use]
    pub fn check_for_updated_price(
        &self,
        point: Option<&PricePoint>,
        moment: Option<NaiveDateTime>,
        target: Option<&Self>,
    ) -> Option<PricePoint> {
        let settings = self.base.quotes.borrow().clone();
        if !settings.get_quotes || self.has_flags(CommodityFlags::NO_MARKET) {
            return None;
        }

        if let Some(point) = point {
            let now = moment.unwrap_or_else(|| Local::now().naive_local());
            if (now - point.when).num_seconds() <= settings.quote_leeway {
                return None;
            }
        }

        let source = settings.source?;
        let quote = source.quote(self, target)?;
        if let Some(target) = target
            && quote
                .price
                .commodity()
                .is_none_or(|quoted_in| !quoted_in.same_referent(target))
        {
            log::warn!(
                "Quote for {} was not denominated in {}: {}",
                self.symbol(),
                target.symbol(),
                quote.price
            );
            return None;
        }
        self.add_price(quote.when, &quote.price, true);
        Some(quote)
    }

    /// Returns a snapshot of the recorded price history in time order.
    #[must_use]
    pub fn prices(&self) -> Vec<PricePoint> {
        self.base.prices.borrow().points()
    }

    /// Drops recorded prices and conversion links, releasing handles onto other commodities.
    pub(crate) fn clear_links(&self) {
        self.base.prices.borrow_mut().clear();
        self.set_smaller(None);
        self.set_larger(None);
    }

    /// Returns `false` if the commodity is structurally unsound.
    #[must_use]
    pub fn valid(&self) -> bool {
        if self.base.symbol.is_empty() && !self.has_flags(CommodityFlags::BUILTIN) {
            log::debug!("Commodity with an empty symbol is not built in");
            return false;
        }
        if self.precision() > MAX_PRECISION {
            log::debug!("Commodity {} precision exceeds maximum", self.symbol());
            return false;
        }
        self.details.as_deref().is_none_or(Annotation::valid)
    }
}

impl PartialEq for Commodity {
    fn eq(&self, other: &Self) -> bool {
        self.base.symbol == other.base.symbol && self.details == other.details
    }
}

impl Eq for Commodity {}

impl Hash for Commodity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.base.symbol.hash(state);
        self.details.as_deref().hash(state);
    }
}

impl PartialOrd for Commodity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Commodity {
    /// Orders by symbol, then plain before annotated, then by annotation text.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.base
            .symbol
            .as_str()
            .cmp(other.base.symbol.as_str())
            .then_with(|| self.write_annotations().cmp(&other.write_annotations()))
            .then_with(|| {
                let flags = |c: &Self| c.details().map_or(0, |d| d.flags().bits());
                flags(self).cmp(&flags(other))
            })
    }
}

impl Display for Commodity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl Debug for Commodity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}('{}{}')",
            stringify!(Commodity),
            self.symbol(),
            self.write_annotations()
        )
    }
}
