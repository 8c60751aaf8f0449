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

//! A synchronous [`log::Log`] implementation with component and module filtering.

use std::{
    fmt::{Debug, Display},
    sync::{Mutex, atomic::Ordering},
};

use ahash::AHashMap;
use chrono::{NaiveDateTime, Utc};
use log::{
    Level, LevelFilter, Log, STATIC_MAX_LEVEL,
    kv::{ToValue, Value},
    set_boxed_logger, set_max_level,
};
use serde::{Deserialize, Serialize};
use ustr::Ustr;

pub use super::config::LoggerConfig;
use super::{LOGGING_BYPASSED, LOGGING_INITIALIZED};
use crate::{
    enums::LogColor,
    logging::writer::{LogWriter, StderrWriter, StdoutWriter},
};

const KV_COLOR: &str = "color";
const KV_COMPONENT: &str = "component";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9fZ";

/// Represents a log event which includes a message.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogLine {
    /// The UTC timestamp for the event.
    pub timestamp: NaiveDateTime,
    /// The log level for the event.
    pub level: Level,
    /// The color for the log message content.
    pub color: LogColor,
    /// The component the log event originated from.
    pub component: Ustr,
    /// The log message content.
    pub message: String,
}

impl LogLine {
    /// Returns the plain text rendering, newline terminated.
    #[must_use]
    pub fn to_plain(&self) -> String {
        format!(
            "{} [{}] {}: {}\n",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.level,
            self.component,
            self.message,
        )
    }

    /// Returns the rendering with ANSI color codes, newline terminated.
    #[must_use]
    pub fn to_colored(&self) -> String {
        format!(
            "\x1b[1m{}\x1b[0m {}[{}] {}: {}\x1b[0m\n",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.color.as_ansi(),
            self.level,
            self.component,
            self.message,
        )
    }

    /// Returns the line as a JSON object, newline terminated.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> anyhow::Result<String> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{json}\n"))
    }

    /// Renders the line in the format selected by `config`.
    #[must_use]
    pub fn render(&self, config: &LoggerConfig) -> String {
        if config.is_json {
            match self.to_json() {
                Ok(json) => return json,
                Err(e) => eprintln!("Error serializing log line: {e}"),
            }
        }

        if config.is_colored {
            self.to_colored()
        } else {
            self.to_plain()
        }
    }
}

impl Display for LogLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.component, self.message)
    }
}

/// A logger writing each admitted record straight to its writers.
///
/// Records are filtered first by the global maximum level, then by the module and
/// component filters of the [`LoggerConfig`], and finally by each writer.
pub struct Logger {
    /// Configuration for logging levels and behavior.
    pub config: LoggerConfig,
    module_filters: Vec<(Ustr, LevelFilter)>,
    writers: Mutex<Vec<Box<dyn LogWriter + Send>>>,
}

impl Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(Logger))
            .field("config", &self.config)
            .field("module_filters", &self.module_filters)
            .finish_non_exhaustive()
    }
}

impl Logger {
    /// Creates a new [`Logger`] writing to stdout and stderr.
    #[must_use]
    pub fn new(config: LoggerConfig) -> Self {
        let writers: Vec<Box<dyn LogWriter + Send>> = vec![
            Box::new(StdoutWriter::new(config.stdout_level)),
            Box::new(StderrWriter::new()),
        ];
        Self::with_writers(config, writers)
    }

    /// Creates a new [`Logger`] with the given `writers`.
    #[must_use]
    pub fn with_writers(config: LoggerConfig, writers: Vec<Box<dyn LogWriter + Send>>) -> Self {
        Self {
            module_filters: config.sorted_module_filters(),
            config,
            writers: Mutex::new(writers),
        }
    }

    /// Initializes the logger based on the `TALLY_LOG` environment variable.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the environment variable or parsing the configuration fails.
    pub fn init_with_env() -> anyhow::Result<()> {
        let config = LoggerConfig::from_env()?;
        Self::init_with_config(config)
    }

    /// Installs a logger built from `config` as the global logger.
    ///
    /// # Errors
    ///
    /// Returns an error if a global logger is already installed.
    pub fn init_with_config(config: LoggerConfig) -> anyhow::Result<()> {
        if config.print_config {
            println!("STATIC_MAX_LEVEL={STATIC_MAX_LEVEL}");
            println!("Logger initialized with {config:?}");
        }

        let max_level = config.max_level();

        set_boxed_logger(Box::new(Self::new(config)))?;
        set_max_level(max_level);
        LOGGING_INITIALIZED.store(true, Ordering::SeqCst);

        Ok(())
    }

    fn line_from_record(record: &log::Record) -> LogLine {
        let level = record.level();
        let key_values = record.key_values();
        let color: LogColor = key_values
            .get(KV_COLOR.into())
            .and_then(|v| v.to_u64().and_then(|v| u8::try_from(v).ok()))
            .map_or_else(|| level.into(), LogColor::from);
        let component = key_values.get(KV_COMPONENT.into()).map_or_else(
            || Ustr::from(record.metadata().target()),
            |v| Ustr::from(&v.to_string()),
        );

        LogLine {
            timestamp: Utc::now().naive_utc(),
            level,
            color,
            component,
            message: format!("{}", record.args()),
        }
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        !LOGGING_BYPASSED.load(Ordering::Relaxed) && metadata.level() <= self.config.max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = Self::line_from_record(record);
        if should_filter_log(
            &line.component,
            line.level,
            &self.module_filters,
            &self.config.component_level,
            self.config.log_components_only,
        ) {
            return;
        }

        let rendered = line.render(&self.config);
        match self.writers.lock() {
            Ok(mut writers) => {
                for writer in writers.iter_mut().filter(|w| w.enabled(&line)) {
                    writer.write(&rendered);
                }
            }
            Err(_) => eprintln!("Error acquiring log writers: {line}"),
        }
    }

    fn flush(&self) {
        if let Ok(mut writers) = self.writers.lock() {
            for writer in writers.iter_mut() {
                writer.flush();
            }
        }
    }
}

/// Returns whether a line from `component` at `line_level` is dropped by the filters.
///
/// Module filters match by prefix and must be sorted by descending path length so the first
/// match is the longest. Component filters match exactly. A module match takes precedence.
#[must_use]
pub fn should_filter_log(
    component: &Ustr,
    line_level: Level,
    module_filters_sorted: &[(Ustr, LevelFilter)],
    component_level: &AHashMap<Ustr, LevelFilter>,
    log_components_only: bool,
) -> bool {
    if module_filters_sorted.is_empty() && component_level.is_empty() {
        return log_components_only;
    }

    let module_filter = module_filters_sorted
        .iter()
        .find(|(path, _)| component.starts_with(path.as_str()))
        .map(|(_, level)| *level);

    let component_filter = component_level.get(component).copied();

    if log_components_only && module_filter.is_none() && component_filter.is_none() {
        return true;
    }

    if let Some(filter_level) = module_filter.or(component_filter)
        && line_level > filter_level
    {
        return true;
    }

    false
}

/// Logs `message` at `level` on behalf of `component`.
pub fn log<T: AsRef<str>>(level: Level, color: LogColor, component: Ustr, message: T) {
    let color = Value::from(color as u8);

    match level {
        Level::Trace => {
            log::trace!(component = component.to_value(), color = color; "{}", message.as_ref());
        }
        Level::Debug => {
            log::debug!(component = component.to_value(), color = color; "{}", message.as_ref());
        }
        Level::Info => {
            log::info!(component = component.to_value(), color = color; "{}", message.as_ref());
        }
        Level::Warn => {
            log::warn!(component = component.to_value(), color = color; "{}", message.as_ref());
        }
        Level::Error => {
            log::error!(component = component.to_value(), color = color; "{}", message.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rstest::rstest;

    use super::*;
    use crate::logging::writer::BufferWriter;

    fn line(level: Level, component: &str) -> LogLine {
        LogLine {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(3, 4, 5)
                .unwrap(),
            level,
            color: LogColor::Green,
            component: Ustr::from(component),
            message: "Created commodity EUR".to_string(),
        }
    }

    fn buffered(config: LoggerConfig) -> (Logger, BufferWriter) {
        let buffer = BufferWriter::new(LevelFilter::Trace);
        let logger = Logger::with_writers(config, vec![Box::new(buffer.clone())]);
        (logger, buffer)
    }

    fn emit(logger: &Logger, level: Level, target: &str, message: &str) {
        logger.log(
            &log::Record::builder()
                .level(level)
                .target(target)
                .args(format_args!("{message}"))
                .build(),
        );
    }

    #[rstest]
    fn test_log_line_display() {
        assert_eq!(
            line(Level::Info, "CommodityPool").to_string(),
            "[INFO] CommodityPool: Created commodity EUR"
        );
    }

    #[rstest]
    fn test_log_line_plain() {
        assert_eq!(
            line(Level::Info, "CommodityPool").to_plain(),
            "2024-01-02T03:04:05.000000000Z [INFO] CommodityPool: Created commodity EUR\n"
        );
    }

    #[rstest]
    fn test_log_line_colored() {
        assert_eq!(
            line(Level::Warn, "CommodityPool").to_colored(),
            "\x1b[1m2024-01-02T03:04:05.000000000Z\x1b[0m \x1b[92m[WARN] CommodityPool: Created commodity EUR\x1b[0m\n"
        );
    }

    #[rstest]
    fn test_log_line_json() {
        let json = line(Level::Debug, "CommodityPool").to_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(json.trim_end()).unwrap();
        assert_eq!(parsed["level"], "DEBUG");
        assert_eq!(parsed["component"], "CommodityPool");
        assert_eq!(parsed["message"], "Created commodity EUR");
    }

    #[rstest]
    fn test_logger_writes_plain_lines() {
        let config = LoggerConfig::from_spec("stdout=Debug;is_colored=false").unwrap();
        let (logger, buffer) = buffered(config);

        emit(&logger, Level::Info, "CommodityPool", "Created commodity EUR");
        emit(&logger, Level::Trace, "CommodityPool", "dropped");

        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("[INFO] CommodityPool: Created commodity EUR\n"));
    }

    #[rstest]
    fn test_logger_applies_component_filter() {
        let config =
            LoggerConfig::from_spec("stdout=Debug;is_colored=false;CommodityPool=Warn").unwrap();
        let (logger, buffer) = buffered(config);

        emit(&logger, Level::Info, "CommodityPool", "filtered");
        emit(&logger, Level::Warn, "CommodityPool", "kept");
        emit(&logger, Level::Info, "Session", "kept too");

        assert_eq!(buffer.lines().len(), 2);
    }

    #[rstest]
    fn test_logger_writes_json_lines() {
        let config = LoggerConfig::from_spec("stdout=Info;is_json").unwrap();
        let (logger, buffer) = buffered(config);

        emit(&logger, Level::Info, "tally_model::commodities::pool", "json");

        let lines = buffer.lines();
        let parsed: serde_json::Value = serde_json::from_str(lines[0].trim_end()).unwrap();
        assert_eq!(parsed["component"], "tally_model::commodities::pool");
    }

    #[rstest]
    fn test_filter_no_filters_passes_all() {
        assert!(!should_filter_log(
            &Ustr::from("anything"),
            Level::Trace,
            &[],
            &AHashMap::new(),
            false
        ));
    }

    #[rstest]
    #[case(Level::Info, "CommodityPool", true)]
    #[case(Level::Error, "CommodityPool", false)]
    #[case(Level::Info, "Session", false)]
    fn test_filter_component_exact_match(
        #[case] level: Level,
        #[case] component: &str,
        #[case] expected: bool,
    ) {
        let component_level =
            AHashMap::from_iter([(Ustr::from("CommodityPool"), LevelFilter::Error)]);
        assert_eq!(
            should_filter_log(&Ustr::from(component), level, &[], &component_level, false),
            expected
        );
    }

    #[rstest]
    #[case("tally_model::commodities", Level::Debug, false)]
    #[case("tally_model::commodities::pool", Level::Debug, false)]
    #[case("tally_model::commodities::pool", Level::Trace, true)]
    #[case("tally_model::types", Level::Trace, false)]
    fn test_filter_module_prefix_match(
        #[case] component: &str,
        #[case] level: Level,
        #[case] expected: bool,
    ) {
        let module_filters = [(Ustr::from("tally_model::commodities"), LevelFilter::Debug)];
        assert_eq!(
            should_filter_log(
                &Ustr::from(component),
                level,
                &module_filters,
                &AHashMap::new(),
                false
            ),
            expected
        );
    }

    #[rstest]
    fn test_filter_longest_prefix_wins() {
        let config =
            LoggerConfig::from_spec("tally_model=Error;tally_model::commodities=Debug").unwrap();
        let module_filters = config.sorted_module_filters();
        let component_level = AHashMap::new();

        assert!(!should_filter_log(
            &Ustr::from("tally_model::commodities::pool"),
            Level::Debug,
            &module_filters,
            &component_level,
            false
        ));
        assert!(should_filter_log(
            &Ustr::from("tally_model::types"),
            Level::Debug,
            &module_filters,
            &component_level,
            false
        ));
    }

    #[rstest]
    fn test_filter_log_components_only_blocks_unknown() {
        let component_level =
            AHashMap::from_iter([(Ustr::from("CommodityPool"), LevelFilter::Debug)]);

        assert!(should_filter_log(
            &Ustr::from("Session"),
            Level::Info,
            &[],
            &component_level,
            true
        ));
        assert!(!should_filter_log(
            &Ustr::from("CommodityPool"),
            Level::Info,
            &[],
            &component_level,
            true
        ));
    }
}
