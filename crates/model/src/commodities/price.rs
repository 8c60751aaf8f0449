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

//! Price observations, cost breakdowns and the external quote hook.

use std::{
    collections::BTreeMap,
    fmt::{Debug, Display},
    rc::Rc,
};

use chrono::NaiveDateTime;
use tally_core::datetime::format_datetime;
use ustr::Ustr;

use super::commodity::Commodity;
use crate::types::Amount;

/// The default age in seconds after which a recorded price is considered stale.
pub const DEFAULT_QUOTE_LEEWAY_SECS: i64 = 86_400;

/// A price observed at an instant.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PricePoint {
    pub when: NaiveDateTime,
    pub price: Amount,
}

impl PricePoint {
    /// Creates a new [`PricePoint`] instance.
    #[must_use]
    pub const fn new(when: NaiveDateTime, price: Amount) -> Self {
        Self { when, price }
    }
}

impl Display for PricePoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", format_datetime(self.when), self.price)
    }
}

/// The outcome of exchanging an amount for a cost.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CostBreakdown {
    /// The exchanged amount annotated with its per-unit cost, date and tag.
    pub amount: Amount,
    /// The total cost paid.
    pub final_cost: Amount,
    /// The total cost at the lot's original price, or the final cost for unpriced lots.
    pub basis_cost: Amount,
}

/// Supplies fresh market quotes for a commodity.
///
/// Installed on a [`CommodityPool`](super::CommodityPool) and consulted only when quote
/// fetching is enabled. No implementation ships with the crate.
pub trait PriceQuoteSource {
    /// Returns the current price of `commodity`, quoted in `target` when given.
    fn quote(&self, commodity: &Commodity, target: Option<&Commodity>) -> Option<PricePoint>;
}

/// Quote settings shared between a pool and every commodity it created.
#[derive(Clone)]
pub(crate) struct QuoteSettings {
    pub get_quotes: bool,
    pub quote_leeway: i64,
    pub source: Option<Rc<dyn PriceQuoteSource>>,
}

impl Default for QuoteSettings {
    fn default() -> Self {
        Self {
            get_quotes: false,
            quote_leeway: DEFAULT_QUOTE_LEEWAY_SECS,
            source: None,
        }
    }
}

impl Debug for QuoteSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(QuoteSettings))
            .field("get_quotes", &self.get_quotes)
            .field("quote_leeway", &self.quote_leeway)
            .field("has_source", &self.source.is_some())
            .finish()
    }
}

/// Time-ordered price history of a single commodity, keyed by the symbol of the quoting commodity.
///
/// Prices without a commodity are stored under the empty symbol and never resolved.
#[derive(Clone, Debug, Default)]
pub(crate) struct PriceHistory {
    entries: BTreeMap<NaiveDateTime, BTreeMap<Ustr, Amount>>,
}

impl PriceHistory {
    pub fn insert(&mut self, when: NaiveDateTime, price: Amount) {
        let key = price
            .commodity()
            .map_or_else(|| Ustr::from(""), Commodity::base_symbol);
        self.entries.entry(when).or_default().insert(key, price);
    }

    pub fn remove(&mut self, when: NaiveDateTime, quoted_in: &Commodity) -> bool {
        let Some(quotes) = self.entries.get_mut(&when) else {
            return false;
        };
        let removed = quotes.remove(&quoted_in.base_symbol()).is_some();
        if quotes.is_empty() {
            self.entries.remove(&when);
        }
        removed
    }

    /// Returns the latest resolvable price at or before `moment` and at or after `oldest`.
    pub fn latest(
        &self,
        own_symbol: Ustr,
        target: Option<Ustr>,
        moment: Option<NaiveDateTime>,
        oldest: Option<NaiveDateTime>,
    ) -> Option<PricePoint> {
        let candidates: Box<dyn Iterator<Item = (&NaiveDateTime, &BTreeMap<Ustr, Amount>)>> =
            match moment {
                Some(moment) => Box::new(self.entries.range(..=moment).rev()),
                None => Box::new(self.entries.iter().rev()),
            };

        for (when, quotes) in candidates {
            if let Some(oldest) = oldest
                && *when < oldest
            {
                break;
            }
            let found = match target {
                Some(target) => quotes.get(&target),
                None => quotes
                    .iter()
                    .find(|(symbol, _)| !symbol.is_empty() && **symbol != own_symbol)
                    .map(|(_, price)| price),
            };
            if let Some(price) = found {
                return Some(PricePoint::new(*when, price.clone()));
            }
        }
        None
    }

    pub fn points(&self) -> Vec<PricePoint> {
        self.entries
            .iter()
            .flat_map(|(when, quotes)| {
                quotes
                    .values()
                    .map(|price| PricePoint::new(*when, price.clone()))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rstest::rstest;

    use super::*;
    use crate::{
        commodities::CommodityPool,
        stubs::{datetime, pool},
    };

    #[rstest]
    fn test_price_point_equality() {
        let when = datetime(2021, 5, 10);
        assert_eq!(
            PricePoint::new(when, Amount::from(10)),
            PricePoint::new(when, Amount::from(10))
        );
        assert_ne!(
            PricePoint::new(when, Amount::from(10)),
            PricePoint::new(when, Amount::from(11))
        );
    }

    #[rstest]
    fn test_price_point_display(mut pool: CommodityPool) {
        let price = Amount::parse("$3", &mut pool, Default::default()).unwrap();
        let point = PricePoint::new(datetime(2020, 1, 15), price);
        assert_eq!(point.to_string(), "2020/01/15 00:00:00 $3");
    }

    #[rstest]
    fn test_history_latest_respects_bounds(mut pool: CommodityPool) {
        let usd = pool.find_or_create("$", None);
        let mut history = PriceHistory::default();
        for (day, qty) in [(1, 10), (5, 20), (9, 30)] {
            history.insert(
                datetime(2021, 1, day),
                Amount::from(qty).with_commodity(Some(&usd)),
            );
        }
        let own = Ustr::from("GAL");

        let latest = history.latest(own, None, None, None).unwrap();
        assert_eq!(latest.when, datetime(2021, 1, 9));

        let at = history
            .latest(own, Some(usd.base_symbol()), Some(datetime(2021, 1, 6)), None)
            .unwrap();
        assert_eq!(at.price.number(), Amount::from(20));

        assert!(
            history
                .latest(own, None, Some(datetime(2021, 1, 4)), Some(datetime(2021, 1, 2)))
                .is_none()
        );
        assert!(
            history
                .latest(own, Some(Ustr::from("EUR")), None, None)
                .is_none()
        );
    }

    #[rstest]
    fn test_history_ignores_commodity_less_prices() {
        let mut history = PriceHistory::default();
        history.insert(datetime(2021, 1, 1), Amount::from(10));
        assert_eq!(history.len(), 1);
        assert!(history.latest(Ustr::from("A"), None, None, None).is_none());
    }

    #[rstest]
    fn test_history_remove(mut pool: CommodityPool) {
        let usd = pool.find_or_create("$", None);
        let mut history = PriceHistory::default();
        let when = NaiveDate::from_ymd_opt(2021, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        history.insert(when, Amount::from(1).with_commodity(Some(&usd)));
        assert!(history.remove(when, &usd));
        assert!(!history.remove(when, &usd));
        assert_eq!(history.len(), 0);
    }
}
