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

//! Logging configuration types and parsing.
//!
//! # Spec String Format
//!
//! The `TALLY_LOG` environment variable uses a semicolon-separated format:
//!
//! ```text
//! stdout=Info;CommodityPool=Debug;tally_model::commodities=Trace;is_colored
//! ```
//!
//! ## Supported Keys
//!
//! | Key                   | Type      | Description                                  |
//! |-----------------------|-----------|----------------------------------------------|
//! | `stdout`              | Log level | Maximum level for stdout output.             |
//! | `is_colored`          | Boolean   | Enable ANSI colors (default: true).          |
//! | `is_json`             | Boolean   | Write each line as a JSON object.            |
//! | `print_config`        | Boolean   | Print config to stdout at startup.           |
//! | `log_components_only` | Boolean   | Only log components with explicit filters.   |
//! | `<component>`         | Log level | Component-specific log level (exact match).  |
//! | `<module::path>`      | Log level | Module-specific log level (prefix match).    |
//!
//! ## Log Levels
//!
//! All log levels are case-insensitive: `Off`, `Error`, `Warn`, `Info`, `Debug`, `Trace`.
//!
//! ## Boolean Values
//!
//! - Bare flag: `is_colored` → true
//! - Explicit: `is_colored=true`, `is_colored=false`, `is_colored=0`, `is_colored=no`

use std::{env, str::FromStr};

use ahash::AHashMap;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use ustr::Ustr;

/// Configuration for the tally logger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Maximum log level for stdout output. Errors always go to stderr.
    pub stdout_level: LevelFilter,
    /// Per-component log level overrides (exact match).
    pub component_level: AHashMap<Ustr, LevelFilter>,
    /// Per-module path log level overrides (prefix match).
    pub module_level: AHashMap<Ustr, LevelFilter>,
    /// Log only components with explicit level filters.
    pub log_components_only: bool,
    /// Use ANSI color codes in output.
    pub is_colored: bool,
    /// Write lines as JSON objects instead of text.
    pub is_json: bool,
    /// Print configuration to stdout at startup.
    pub print_config: bool,
}

impl Default for LoggerConfig {
    /// Creates a new default [`LoggerConfig`] instance.
    fn default() -> Self {
        Self {
            stdout_level: LevelFilter::Info,
            component_level: AHashMap::new(),
            module_level: AHashMap::new(),
            log_components_only: false,
            is_colored: true,
            is_json: false,
            print_config: false,
        }
    }
}

impl LoggerConfig {
    /// Parses a configuration from a spec string.
    ///
    /// # Format
    ///
    /// Semicolon-separated key-value pairs or bare flags:
    /// ```text
    /// stdout=Info;CommodityPool=Debug;tally_model::types=Trace;is_colored
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the spec string contains invalid syntax or log levels.
    pub fn from_spec(spec: &str) -> anyhow::Result<Self> {
        let mut config = Self::default();

        for kv in spec.split(';') {
            let kv = kv.trim();
            if kv.is_empty() {
                continue;
            }

            let kv_lower = kv.to_lowercase();

            // Handle bare flags (without =)
            if !kv.contains('=') {
                match kv_lower.as_str() {
                    "log_components_only" => config.log_components_only = true,
                    "is_colored" => config.is_colored = true,
                    "is_json" => config.is_json = true,
                    "print_config" => config.print_config = true,
                    _ => anyhow::bail!("Invalid spec pair: {kv}"),
                }
                continue;
            }

            let Some((k, v)) = kv.split_once('=') else {
                anyhow::bail!("Invalid spec pair: {kv}");
            };

            let k = k.trim();
            let v = v.trim();

            match k.to_lowercase().as_str() {
                "is_colored" => config.is_colored = parse_bool_value(v),
                "is_json" => config.is_json = parse_bool_value(v),
                "log_components_only" => config.log_components_only = parse_bool_value(v),
                "print_config" => config.print_config = parse_bool_value(v),
                "stdout" => config.stdout_level = parse_level(v)?,
                _ => {
                    let lvl = parse_level(v)?;
                    if k.contains("::") {
                        config.module_level.insert(Ustr::from(k), lvl);
                    } else {
                        config.component_level.insert(Ustr::from(k), lvl);
                    }
                }
            }
        }

        Ok(config)
    }

    /// Parses configuration from the `TALLY_LOG` environment variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is unset or contains invalid syntax.
    pub fn from_env() -> anyhow::Result<Self> {
        let spec = env::var("TALLY_LOG")?;
        Self::from_spec(&spec)
    }

    /// Returns the most verbose level any output or filter admits.
    #[must_use]
    pub fn max_level(&self) -> LevelFilter {
        self.component_level
            .values()
            .chain(self.module_level.values())
            .copied()
            .fold(self.stdout_level.max(LevelFilter::Error), Ord::max)
    }

    /// Returns the module filters ordered by descending path length.
    #[must_use]
    pub fn sorted_module_filters(&self) -> Vec<(Ustr, LevelFilter)> {
        let mut filters: Vec<_> = self
            .module_level
            .iter()
            .map(|(path, level)| (*path, *level))
            .collect();
        filters.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        filters
    }
}

/// Parses a boolean value from a string.
///
/// Returns `true` unless the value is explicitly "false", "0", or "no" (case-insensitive).
fn parse_bool_value(v: &str) -> bool {
    !matches!(v.to_lowercase().as_str(), "false" | "0" | "no")
}

/// Parses a log level from a string.
fn parse_level(v: &str) -> anyhow::Result<LevelFilter> {
    LevelFilter::from_str(v).map_err(|_| anyhow::anyhow!("Invalid log level: {v}"))
}
