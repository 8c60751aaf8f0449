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

//! Enumerations for the value model.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, FromRepr};

/// The kind of datum a [`Value`](crate::types::Value) currently holds.
#[repr(C)]
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    AsRefStr,
    FromRepr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueType {
    /// No value.
    Void = 0,
    Boolean = 1,
    DateTime = 2,
    Date = 3,
    Integer = 4,
    Amount = 5,
    Balance = 6,
    String = 7,
    Mask = 8,
    Sequence = 9,
}

impl ValueType {
    /// Returns the human readable name of the kind, with its article.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Void => "an uninitialized value",
            Self::Boolean => "a boolean",
            Self::DateTime => "a date/time",
            Self::Date => "a date",
            Self::Integer => "an integer",
            Self::Amount => "an amount",
            Self::Balance => "a balance",
            Self::String => "a string",
            Self::Mask => "a regexp",
            Self::Sequence => "a sequence",
        }
    }

    /// Returns the primitive storage category of the kind.
    #[must_use]
    pub const fn basetype(self) -> BaseType {
        match self {
            Self::Void => BaseType::None,
            Self::Boolean => BaseType::Bool,
            Self::DateTime => BaseType::DateTime,
            Self::Date => BaseType::Date,
            Self::Integer => BaseType::Int,
            Self::Amount => BaseType::Amount,
            Self::Balance => BaseType::Balance,
            Self::String => BaseType::Str,
            Self::Mask => BaseType::Mask,
            Self::Sequence => BaseType::List,
        }
    }
}

/// The primitive storage category behind a [`ValueType`].
#[repr(C)]
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    AsRefStr,
    FromRepr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "lowercase")]
pub enum BaseType {
    None = 0,
    Bool = 1,
    Int = 2,
    Str = 3,
    Date = 4,
    DateTime = 5,
    Amount = 6,
    Balance = 7,
    Mask = 8,
    List = 9,
}
