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

//! Fixtures for building pools, commodities and moments in tests.

use chrono::{NaiveDate, NaiveDateTime};
use rstest::fixture;

use crate::{
    commodities::{Commodity, CommodityPool, PoolConfig},
    parsing::ParseFlags,
    types::Amount,
};

/// Returns midnight on the given calendar day.
///
/// # Panics
///
/// Panics if the date does not exist.
#[must_use]
pub fn datetime(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .expect("valid test date")
}

/// A fresh pool with the default settings.
#[fixture]
pub fn pool() -> CommodityPool {
    CommodityPool::new(PoolConfig::default())
}

/// A pool that has already seen `$1,000.00`.
#[fixture]
pub fn usd_pool() -> CommodityPool {
    let mut pool = CommodityPool::new(PoolConfig::default());
    let _ = Amount::parse("$1,000.00", &mut pool, ParseFlags::empty());
    pool
}

/// The `$` commodity of [`usd_pool`].
///
/// # Panics
///
/// Panics if `pool` has not seen the `$` commodity.
#[must_use]
pub fn usd(pool: &CommodityPool) -> Commodity {
    pool.get("$").expect("usd_pool registers $")
}
