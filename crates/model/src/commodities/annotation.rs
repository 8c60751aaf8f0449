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

//! Lot annotations and the policy deciding which of their details survive stripping.

use std::fmt::{Display, Write};

use bitflags::bitflags;
use chrono::NaiveDate;
use tally_core::datetime::format_date;

use super::commodity::Commodity;
use crate::types::Amount;

bitflags! {
    /// Marks which parts of an [`Annotation`] were derived rather than written explicitly.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AnnotationFlags: u8 {
        const PRICE_CALCULATED = 1 << 0;
        const PRICE_FIXATED = 1 << 1;
        const PRICE_NOT_PER_UNIT = 1 << 2;
        const DATE_CALCULATED = 1 << 3;
        const TAG_CALCULATED = 1 << 4;
    }
}

/// Lot details attached to a quantity of a commodity: what it cost, when it was acquired,
/// and a free-form tag.
///
/// An annotation with none of the three details is empty and behaves as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Annotation {
    /// The per-unit lot price.
    pub price: Option<Amount>,
    /// The lot acquisition date.
    pub date: Option<NaiveDate>,
    /// The lot tag.
    pub tag: Option<String>,
    flags: AnnotationFlags,
}

impl Annotation {
    /// Creates a new [`Annotation`] instance with no flags set.
    #[must_use]
    pub fn new(price: Option<Amount>, date: Option<NaiveDate>, tag: Option<String>) -> Self {
        Self {
            price,
            date,
            tag,
            flags: AnnotationFlags::empty(),
        }
    }

    /// Creates an annotation carrying only a price.
    #[must_use]
    pub fn with_price(price: Amount) -> Self {
        Self::new(Some(price), None, None)
    }

    /// Creates an annotation carrying only a tag.
    #[must_use]
    pub fn with_tag<T: Into<String>>(tag: T) -> Self {
        Self::new(None, None, Some(tag.into()))
    }

    /// Returns `true` if no price, date or tag is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.price.is_none() && self.date.is_none() && self.tag.is_none()
    }

    #[must_use]
    pub fn flags(&self) -> AnnotationFlags {
        self.flags
    }

    /// Returns `true` if every bit in `mask` is set.
    #[must_use]
    pub fn has_flags(&self, mask: AnnotationFlags) -> bool {
        self.flags.contains(mask)
    }

    pub fn add_flags(&mut self, mask: AnnotationFlags) {
        self.flags.insert(mask);
    }

    pub fn drop_flags(&mut self, mask: AnnotationFlags) {
        self.flags.remove(mask);
    }

    pub fn clear_flags(&mut self) {
        self.flags = AnnotationFlags::empty();
    }

    /// Renders the annotation suffix, optionally skipping calculated details.
    #[must_use]
    pub fn write_annotations(&self, no_computed: bool) -> String {
        let mut out = String::new();
        if let Some(price) = &self.price
            && (!no_computed || !self.has_flags(AnnotationFlags::PRICE_CALCULATED))
        {
            let fixated = if self.has_flags(AnnotationFlags::PRICE_FIXATED) {
                "="
            } else {
                ""
            };
            let _ = write!(out, " {{{fixated}{price}}}");
        }
        if let Some(date) = self.date
            && (!no_computed || !self.has_flags(AnnotationFlags::DATE_CALCULATED))
        {
            let _ = write!(out, " [{}]", format_date(date));
        }
        if let Some(tag) = &self.tag
            && (!no_computed || !self.has_flags(AnnotationFlags::TAG_CALCULATED))
        {
            let _ = write!(out, " ({tag})");
        }
        out
    }

    /// Returns a copy holding only the details `keep` retains.
    ///
    /// Calculated details are dropped when `keep.only_actuals` is set. A fixated price is kept
    /// when `saw_fixated` reports that the commodity has been seen with fixated lot prices.
    #[must_use]
    pub fn filtered(&self, keep: &KeepDetails, saw_fixated: bool) -> Self {
        let keep_price = (keep.keep_price
            || (self.has_flags(AnnotationFlags::PRICE_FIXATED) && saw_fixated))
            && (!keep.only_actuals || !self.has_flags(AnnotationFlags::PRICE_CALCULATED));
        let keep_date = keep.keep_date
            && (!keep.only_actuals || !self.has_flags(AnnotationFlags::DATE_CALCULATED));
        let keep_tag = keep.keep_tag
            && (!keep.only_actuals || !self.has_flags(AnnotationFlags::TAG_CALCULATED));

        let mut flags = AnnotationFlags::empty();
        if keep_price && self.price.is_some() {
            flags |= self.flags
                & (AnnotationFlags::PRICE_CALCULATED
                    | AnnotationFlags::PRICE_FIXATED
                    | AnnotationFlags::PRICE_NOT_PER_UNIT);
        }
        if keep_date && self.date.is_some() {
            flags |= self.flags & AnnotationFlags::DATE_CALCULATED;
        }
        if keep_tag && self.tag.is_some() {
            flags |= self.flags & AnnotationFlags::TAG_CALCULATED;
        }

        Self {
            price: self.price.clone().filter(|_| keep_price),
            date: self.date.filter(|_| keep_date),
            tag: self.tag.clone().filter(|_| keep_tag),
            flags,
        }
    }

    /// Returns `false` if the annotation is structurally unsound.
    #[must_use]
    pub fn valid(&self) -> bool {
        if let Some(price) = &self.price {
            if price.has_annotation() {
                log::debug!("Annotation price {price} is itself annotated");
                return false;
            }
            if !price.valid() {
                return false;
            }
        }
        true
    }
}

impl Display for Annotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.write_annotations(false))
    }
}

/// Which annotation details survive when annotations are stripped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct KeepDetails {
    pub keep_price: bool,
    pub keep_date: bool,
    pub keep_tag: bool,
    /// Drop details that were calculated rather than given explicitly.
    pub only_actuals: bool,
}

impl KeepDetails {
    /// Creates a new [`KeepDetails`] instance.
    #[must_use]
    pub const fn new(keep_price: bool, keep_date: bool, keep_tag: bool, only_actuals: bool) -> Self {
        Self {
            keep_price,
            keep_date,
            keep_tag,
            only_actuals,
        }
    }

    /// Returns `true` if every detail is kept, including calculated ones.
    #[must_use]
    pub const fn keep_all(&self) -> bool {
        self.keep_price && self.keep_date && self.keep_tag && !self.only_actuals
    }

    /// Returns `true` if [`Self::keep_all`] holds, or `commodity` has no annotation to strip.
    #[must_use]
    pub fn keep_all_for(&self, commodity: &Commodity) -> bool {
        !commodity.has_annotation() || self.keep_all()
    }

    /// Returns `true` if at least one detail is kept.
    #[must_use]
    pub const fn keep_any(&self) -> bool {
        self.keep_price || self.keep_date || self.keep_tag
    }

    /// Returns `true` if [`Self::keep_any`] holds, or `commodity` has no annotation to strip.
    #[must_use]
    pub fn keep_any_for(&self, commodity: &Commodity) -> bool {
        !commodity.has_annotation() || self.keep_any()
    }
}
