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

//! The session context owning a commodity pool and its configuration.

use std::env::{self, VarError};

use log::Level;
use serde::{Deserialize, Serialize};
use tally_model::commodities::{CommodityPool, PoolConfig};
use ustr::Ustr;

use crate::{
    enums::LogColor,
    logging::{self, config::LoggerConfig, logger},
};

const SESSION: &str = "Session";
const TALLY_LOG: &str = "TALLY_LOG";
const TALLY_POOL: &str = "TALLY_POOL";

/// Configuration for a [`Session`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Logger configuration.
    pub logger: LoggerConfig,
    /// Commodity pool configuration.
    pub pool: PoolConfig,
}

impl SessionConfig {
    /// Parses a configuration from a logger spec and a pool spec.
    ///
    /// # Errors
    ///
    /// Returns an error if either spec string is invalid.
    pub fn from_specs(logger_spec: &str, pool_spec: &str) -> anyhow::Result<Self> {
        Ok(Self {
            logger: LoggerConfig::from_spec(logger_spec)?,
            pool: PoolConfig::from_spec(pool_spec)?,
        })
    }

    /// Parses configuration from the `TALLY_LOG` and `TALLY_POOL` environment variables.
    ///
    /// An unset variable leaves that part at its default.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is not unicode or contains invalid syntax.
    pub fn from_env() -> anyhow::Result<Self> {
        let logger = match read_env(TALLY_LOG)? {
            Some(spec) => LoggerConfig::from_spec(&spec)?,
            None => LoggerConfig::default(),
        };
        let pool = match read_env(TALLY_POOL)? {
            Some(spec) => PoolConfig::from_spec(&spec)?,
            None => PoolConfig::default(),
        };
        Ok(Self { logger, pool })
    }
}

fn read_env(key: &str) -> anyhow::Result<Option<String>> {
    match env::var(key) {
        Ok(spec) => Ok(Some(spec)),
        Err(VarError::NotPresent) => Ok(None),
        Err(e) => Err(anyhow::anyhow!("Invalid {key}: {e}")),
    }
}

/// The explicit context every commodity and price lookup goes through.
///
/// A session is created once per process (or per test) and passed by reference. Calling
/// [`Session::reset`] discards all commodities and price history.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    pool: CommodityPool,
}

impl Session {
    /// Creates a new [`Session`] instance.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        let pool = CommodityPool::new(config.pool.clone());
        Self { config, pool }
    }

    /// Creates a new [`Session`] configured from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment holds an invalid configuration.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::new(SessionConfig::from_env()?))
    }

    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub const fn pool(&self) -> &CommodityPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut CommodityPool {
        &mut self.pool
    }

    /// Installs the global logger from the session's logger configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a global logger is already installed.
    pub fn init_logging(&self) -> anyhow::Result<()> {
        logging::init_logging(self.config.logger.clone())
    }

    /// Discards every commodity, price and conversion, rebuilding the pool from the
    /// session configuration.
    pub fn reset(&mut self) {
        self.pool = CommodityPool::new(self.config.pool.clone());
        logger::log(
            Level::Debug,
            LogColor::Normal,
            Ustr::from(SESSION),
            "Reset commodity pool",
        );
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use log::LevelFilter;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_from_specs() {
        let config = SessionConfig::from_specs("stdout=Debug", "decimal_comma;time_units").unwrap();
        assert_eq!(config.logger.stdout_level, LevelFilter::Debug);
        assert!(config.pool.decimal_comma_by_default);
        assert!(config.pool.time_units);
    }

    #[rstest]
    #[case("stdout=Loud", "")]
    #[case("", "quote_leeway=-1")]
    fn test_from_specs_invalid(#[case] logger_spec: &str, #[case] pool_spec: &str) {
        assert!(SessionConfig::from_specs(logger_spec, pool_spec).is_err());
    }

    #[rstest]
    fn test_config_serde_roundtrip() {
        let config = SessionConfig::from_specs("stdout=Warn;is_json", "keep_base").unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: SessionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[rstest]
    fn test_session_pool_uses_config() {
        let config = SessionConfig::from_specs("", "time_units").unwrap();
        let session = Session::new(config);
        assert!(session.pool().contains("h"));
        assert!(session.pool().config().time_units);
    }

    #[rstest]
    fn test_reset_discards_commodities_and_prices() {
        let mut session = Session::default();
        let moment = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        session
            .pool_mut()
            .parse_price_directive("2024-01-01 EUR $1.10", false, false)
            .unwrap();
        let eur = session.pool().get("EUR").unwrap();
        assert!(eur.find_price(None, Some(moment), None).is_some());

        session.reset();

        assert!(!session.pool().contains("EUR"));
        assert!(session.pool().is_empty());
    }
}
