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

//! Error model for commodity, amount and value operations.

use thiserror::Error;

/// Result type used across the model.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised by the value engine.
///
/// Structural invariant failures are never raised. They are reported by the
/// `valid()` methods returning `false` instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A commodity looked up by symbol is not registered.
    #[error("Could not find commodity {0}")]
    CommodityNotFound(String),

    /// A commodity with the same symbol and annotation is already registered.
    #[error("Commodity {0} already exists")]
    CommodityExists(String),

    /// Amount, annotation or price directive text is malformed.
    #[error("Failed to parse '{input}': {reason}")]
    Parse { input: String, reason: String },

    /// Two amounts of distinct commodities were combined directly.
    #[error("Cannot {op} amounts with different commodities: '{left}' and '{right}'")]
    IncompatibleCommodity {
        op: &'static str,
        left: String,
        right: String,
    },

    /// A balance holding several commodities was forced into a single amount.
    #[error("Cannot convert a balance with {0} commodities to an amount")]
    AmbiguousConversion(usize),

    /// Division by a zero quantity.
    #[error("Divide by zero")]
    DivideByZero,

    /// The result of an operation does not fit the numeric representation.
    #[error("Overflow during {0}")]
    Overflow(&'static str),

    /// The operator is not defined for the operand kinds.
    #[error("Cannot {op} {left} with {right}")]
    UnsupportedOperation {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    /// The unary operation is not defined for the operand kind.
    #[error("Cannot {op} {kind}")]
    InvalidOperand {
        op: &'static str,
        kind: &'static str,
    },

    /// The value kind cannot be converted to the requested kind.
    #[error("Cannot convert {from} to {to}")]
    InvalidCast {
        from: &'static str,
        to: &'static str,
    },

    /// An element was requested from an empty sequence.
    #[error("Cannot pop from an empty sequence")]
    EmptySequence,
}

impl ModelError {
    pub fn parse(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn incompatible(op: &'static str, left: impl ToString, right: impl ToString) -> Self {
        Self::IncompatibleCommodity {
            op,
            left: left.to_string(),
            right: right.to_string(),
        }
    }

    pub fn not_found(symbol: impl Into<String>) -> Self {
        Self::CommodityNotFound(symbol.into())
    }
}
