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

//! The logging framework for tally.
//!
//! Library code logs through the [`log`] facade. A host installs the [`logger::Logger`] once,
//! either explicitly with [`init_logging`] or lazily with [`ensure_logging_initialized`], which
//! reads the `TALLY_LOG` environment variable (see [`config`] for the format).

pub mod config;
pub mod logger;
pub mod writer;

use std::{
    env,
    sync::{
        OnceLock,
        atomic::{AtomicBool, Ordering},
    },
};

use self::logger::{Logger, LoggerConfig};

static LOGGING_INITIALIZED: AtomicBool = AtomicBool::new(false);
static LOGGING_BYPASSED: AtomicBool = AtomicBool::new(false);
static LAZY_INIT: OnceLock<bool> = OnceLock::new();

/// Returns whether the tally logger is installed.
pub fn logging_is_initialized() -> bool {
    LOGGING_INITIALIZED.load(Ordering::Relaxed)
}

/// Sets the logging subsystem to bypass mode.
pub fn logging_set_bypass() {
    LOGGING_BYPASSED.store(true, Ordering::Relaxed);
}

/// Ensures logging is initialized on first use.
///
/// If `TALLY_LOG` is set and valid, initializes the logger with the specified config.
/// Otherwise, initializes with INFO level to stdout.
///
/// Returns `true` if logging is available.
pub fn ensure_logging_initialized() -> bool {
    if LOGGING_INITIALIZED.load(Ordering::SeqCst) {
        return true;
    }

    LAZY_INIT.get_or_init(|| {
        let config = env::var("TALLY_LOG")
            .ok()
            .and_then(|spec| LoggerConfig::from_spec(&spec).ok())
            .unwrap_or_default();

        Logger::init_with_config(config).is_ok()
    });

    LOGGING_INITIALIZED.load(Ordering::SeqCst)
}

/// Initializes logging with `config`.
///
/// Should only be called once per process.
///
/// # Errors
///
/// Returns an error if the logging subsystem fails to initialize.
pub fn init_logging(config: LoggerConfig) -> anyhow::Result<()> {
    Logger::init_with_config(config)
}

