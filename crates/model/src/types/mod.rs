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

//! Value types for the accounting model.
//!
//! This module provides the quantities every calculation works with: [`Amount`] (a quantity in
//! at most one commodity), [`Balance`] (a net position across commodities), [`Mask`] (a
//! case-insensitive pattern) and [`Value`], the closed union over all of them.
//!
//! # Arithmetic operations
//!
//! Every type offers checked methods returning [`ModelResult`](crate::error::ModelResult) and
//! operator traits that panic on the error path.
//!
//! | Operation            | Result    | Notes                                                  |
//! |----------------------|-----------|--------------------------------------------------------|
//! | `Amount + Amount`    | `Amount`  | Errors if both carry different commodities.            |
//! | `Amount * Amount`    | `Amount`  | Precision is the sum of both operands.                 |
//! | `Amount / Amount`    | `Amount`  | Precision is the sum of both operands plus six.        |
//! | `Balance + Amount`   | `Balance` | Entries netting to zero are removed.                   |
//! | `Balance * Amount`   | `Balance` | The amount must be commodity-less or match the entry.  |
//! | `Value + Value`      | `Value`   | Promotes to the wider kind, see [`Value::checked_add`]. |
//!
//! # Precision
//!
//! Quantities are exact decimals. The stored precision only decides how many digits are shown.
//! Multiplication and division results are capped at [`precision::MAX_PRECISION`] digits, and
//! at six digits past the commodity's display precision unless the amount keeps its precision.

pub mod amount;
pub mod balance;
pub mod mask;
pub mod precision;
pub mod value;

// Re-exports
pub use amount::Amount;
pub use balance::Balance;
pub use mask::Mask;
pub use value::Value;
