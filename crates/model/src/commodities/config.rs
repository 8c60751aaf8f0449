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

//! Commodity pool configuration.
//!
//! # Spec String Format
//!
//! The `TALLY_POOL` environment variable uses a semicolon-separated format:
//!
//! ```text
//! decimal_comma;quote_leeway=3600;price_db=/var/prices.db;time_units
//! ```
//!
//! ## Supported Keys
//!
//! | Key              | Type    | Description                                           |
//! |------------------|---------|-------------------------------------------------------|
//! | `decimal_comma`  | Boolean | New commodities read and print `,` as decimal mark.   |
//! | `keep_base`      | Boolean | Report amounts in their base (reduced) units.         |
//! | `get_quotes`     | Boolean | Consult the installed quote source for stale prices.  |
//! | `quote_leeway`   | Seconds | Age after which a recorded price is stale.            |
//! | `price_db`       | Path    | Location of the price database, recorded only.        |
//! | `time_units`     | Boolean | Register the `s`, `m` and `h` conversions.            |

use std::{env, path::PathBuf};

use serde::{Deserialize, Serialize};

use super::price::DEFAULT_QUOTE_LEEWAY_SECS;

/// Configuration for a [`CommodityPool`](super::CommodityPool).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Commodities created by the pool default to a decimal comma.
    pub decimal_comma_by_default: bool,
    /// Report amounts in their base units.
    pub keep_base: bool,
    /// Consult the quote source when a price is older than the leeway.
    pub get_quotes: bool,
    /// Age in seconds after which a recorded price is stale.
    pub quote_leeway: i64,
    /// Location of the price database.
    pub price_db: Option<PathBuf>,
    /// Register the built-in time unit conversions.
    pub time_units: bool,
}

impl Default for PoolConfig {
    /// Creates a new default [`PoolConfig`] instance.
    fn default() -> Self {
        Self {
            decimal_comma_by_default: false,
            keep_base: false,
            get_quotes: false,
            quote_leeway: DEFAULT_QUOTE_LEEWAY_SECS,
            price_db: None,
            time_units: false,
        }
    }
}

impl PoolConfig {
    /// Parses a configuration from a spec string.
    ///
    /// # Errors
    ///
    /// Returns an error if the spec string contains an unknown key or an invalid value.
    pub fn from_spec(spec: &str) -> anyhow::Result<Self> {
        let mut config = Self::default();

        for kv in spec.split(';') {
            let kv = kv.trim();
            if kv.is_empty() {
                continue;
            }

            let (k, v) = match kv.split_once('=') {
                Some((k, v)) => (k.trim(), Some(v.trim())),
                None => (kv, None),
            };

            match (k.to_lowercase().as_str(), v) {
                ("decimal_comma", v) => config.decimal_comma_by_default = parse_flag(v),
                ("keep_base", v) => config.keep_base = parse_flag(v),
                ("get_quotes", v) => config.get_quotes = parse_flag(v),
                ("time_units", v) => config.time_units = parse_flag(v),
                ("quote_leeway", Some(v)) => {
                    config.quote_leeway = v
                        .parse()
                        .map_err(|_| anyhow::anyhow!("Invalid quote_leeway: {v}"))?;
                    if config.quote_leeway < 0 {
                        anyhow::bail!("Invalid quote_leeway: {v}, must be non-negative");
                    }
                }
                ("price_db", Some(v)) if !v.is_empty() => config.price_db = Some(PathBuf::from(v)),
                _ => anyhow::bail!("Invalid spec pair: {kv}"),
            }
        }

        Ok(config)
    }

    /// Parses configuration from the `TALLY_POOL` environment variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is unset or contains invalid syntax.
    pub fn from_env() -> anyhow::Result<Self> {
        let spec = env::var("TALLY_POOL")?;
        Self::from_spec(&spec)
    }
}

/// Returns `true` for a bare flag, or unless the value is "false", "0" or "no".
fn parse_flag(v: Option<&str>) -> bool {
    v.is_none_or(|v| !matches!(v.to_lowercase().as_str(), "false" | "0" | "no"))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_default_config() {
        let config = PoolConfig::default();
        assert!(!config.decimal_comma_by_default);
        assert!(!config.get_quotes);
        assert_eq!(config.quote_leeway, 86_400);
        assert!(config.price_db.is_none());
    }

    #[rstest]
    fn test_from_spec_empty_string() {
        assert_eq!(PoolConfig::from_spec("").unwrap(), PoolConfig::default());
    }

    #[rstest]
    fn test_from_spec_all_keys() {
        let config = PoolConfig::from_spec(
            " decimal_comma ; keep_base=true; get_quotes=1; quote_leeway=3600; price_db=/tmp/p.db; time_units",
        )
        .unwrap();
        assert!(config.decimal_comma_by_default);
        assert!(config.keep_base);
        assert!(config.get_quotes);
        assert_eq!(config.quote_leeway, 3600);
        assert_eq!(config.price_db, Some(PathBuf::from("/tmp/p.db")));
        assert!(config.time_units);
    }

    #[rstest]
    #[case("decimal_comma=false", false)]
    #[case("decimal_comma=no", false)]
    #[case("DECIMAL_COMMA=0", false)]
    #[case("decimal_comma=yes", true)]
    fn test_from_spec_flag_values(#[case] spec: &str, #[case] expected: bool) {
        let config = PoolConfig::from_spec(spec).unwrap();
        assert_eq!(config.decimal_comma_by_default, expected);
    }

    #[rstest]
    #[case("quote_leeway=abc")]
    #[case("quote_leeway=-5")]
    #[case("quote_leeway")]
    #[case("price_db=")]
    #[case("unknown_key=1")]
    fn test_from_spec_invalid(#[case] spec: &str) {
        assert!(PoolConfig::from_spec(spec).is_err());
    }
}
