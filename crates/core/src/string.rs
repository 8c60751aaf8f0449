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

//! String scanning functionality.

/// Splits `line` at the first run of whitespace.
///
/// Returns the leading element and the remainder with its leading whitespace removed,
/// or `None` for the remainder when nothing follows the element.
///
/// # Examples
///
/// ```
/// use tally_core::string::next_element;
///
/// assert_eq!(next_element("2020-01-15 GAL $3"), ("2020-01-15", Some("GAL $3")));
/// assert_eq!(next_element("  GAL  "), ("GAL", None));
/// ```
#[must_use]
pub fn next_element(line: &str) -> (&str, Option<&str>) {
    let line = line.trim_start();
    match line.find(char::is_whitespace) {
        Some(pos) => {
            let rest = line[pos..].trim_start();
            let rest = rest.trim_end();
            (&line[..pos], if rest.is_empty() { None } else { Some(rest) })
        }
        None => (line.trim_end(), None),
    }
}

/// Returns the number of leading whitespace bytes in `s`.
#[must_use]
pub fn leading_whitespace_len(s: &str) -> usize {
    s.len() - s.trim_start().len()
}

/// Returns the contents of a double-quoted prefix of `s` and the text after the closing quote.
///
/// Returns `None` if `s` does not start with `"` or the quote is never closed.
#[must_use]
pub fn split_quoted(s: &str) -> Option<(&str, &str)> {
    let inner = s.strip_prefix('"')?;
    let end = inner.find('"')?;
    Some((&inner[..end], &inner[end + 1..]))
}
