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

//! The value model of a plain-text double-entry accounting engine.
//!
//! The `tally-model` crate provides exact, commodity-safe quantities and the registry relating
//! commodities to one another:
//!
//! - [`commodities`]: commodities, lot annotations, price history and the [`CommodityPool`].
//! - [`types`]: [`Amount`], [`Balance`], [`Mask`] and the dynamically typed [`Value`].
//! - [`parsing`]: the amount text grammar.
//!
//! # Feature flags
//!
//! - `stubs`: Enables rstest fixtures for testing in dependent crates.
//!
//! [`CommodityPool`]: commodities::CommodityPool
//! [`Amount`]: types::Amount
//! [`Balance`]: types::Balance
//! [`Mask`]: types::Mask
//! [`Value`]: types::Value

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]

pub mod commodities;
pub mod enums;
pub mod error;
pub mod parsing;
pub mod types;

#[cfg(any(test, feature = "stubs"))]
pub mod stubs;
