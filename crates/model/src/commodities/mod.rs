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

//! Commodities, lot annotations, price history and the commodity registry.

pub mod annotation;
pub mod commodity;
pub mod config;
pub mod pool;
pub mod price;

// Re-exports
pub use annotation::{Annotation, AnnotationFlags, KeepDetails};
pub use commodity::{Commodity, CommodityFlags, symbol_needs_quotes};
pub use config::PoolConfig;
pub use pool::CommodityPool;
pub use price::{CostBreakdown, DEFAULT_QUOTE_LEEWAY_SECS, PricePoint, PriceQuoteSource};
