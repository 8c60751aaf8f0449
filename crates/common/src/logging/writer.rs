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

//! Output destinations for formatted log lines.

use std::{
    io::{self, Stderr, Stdout, Write},
    sync::{Arc, Mutex},
};

use log::LevelFilter;

use crate::logging::logger::LogLine;

pub trait LogWriter {
    /// Writes a log line.
    fn write(&mut self, line: &str);
    /// Flushes buffered logs.
    fn flush(&mut self);
    /// Checks if a line needs to be written to the writer or not.
    fn enabled(&self, line: &LogLine) -> bool;
}

#[derive(Debug)]
pub struct StdoutWriter {
    io: Stdout,
    level: LevelFilter,
}

impl StdoutWriter {
    /// Creates a new [`StdoutWriter`] instance.
    #[must_use]
    pub fn new(level: LevelFilter) -> Self {
        Self {
            io: io::stdout(),
            level,
        }
    }
}

impl LogWriter for StdoutWriter {
    fn write(&mut self, line: &str) {
        if let Err(e) = self.io.write_all(line.as_bytes()) {
            eprintln!("Error writing to stdout: {e:?}");
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.io.flush() {
            eprintln!("Error flushing stdout: {e:?}");
        }
    }

    fn enabled(&self, line: &LogLine) -> bool {
        // Error lines go to stderr only
        line.level > LevelFilter::Error && line.level <= self.level
    }
}

#[derive(Debug)]
pub struct StderrWriter {
    io: Stderr,
}

impl StderrWriter {
    /// Creates a new [`StderrWriter`] instance.
    #[must_use]
    pub fn new() -> Self {
        Self { io: io::stderr() }
    }
}

impl Default for StderrWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl LogWriter for StderrWriter {
    fn write(&mut self, line: &str) {
        if let Err(e) = self.io.write_all(line.as_bytes()) {
            eprintln!("Error writing to stderr: {e:?}");
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.io.flush() {
            eprintln!("Error flushing stderr: {e:?}");
        }
    }

    fn enabled(&self, line: &LogLine) -> bool {
        line.level == LevelFilter::Error
    }
}

/// Collects lines in memory, for embedding hosts that capture output.
#[derive(Debug, Clone)]
pub struct BufferWriter {
    lines: Arc<Mutex<Vec<String>>>,
    level: LevelFilter,
}

impl BufferWriter {
    /// Creates a new [`BufferWriter`] instance admitting lines up to `level`.
    #[must_use]
    pub fn new(level: LevelFilter) -> Self {
        Self {
            lines: Arc::new(Mutex::new(Vec::new())),
            level,
        }
    }

    /// Returns a copy of every line written so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }
}

impl LogWriter for BufferWriter {
    fn write(&mut self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }

    fn flush(&mut self) {}

    fn enabled(&self, line: &LogLine) -> bool {
        line.level <= self.level
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use log::Level;
    use rstest::rstest;
    use ustr::Ustr;

    use super::*;
    use crate::enums::LogColor;

    fn line(level: Level) -> LogLine {
        LogLine {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            level,
            color: LogColor::from(level),
            component: Ustr::from("CommodityPool"),
            message: "created".to_string(),
        }
    }

    #[rstest]
    #[case(Level::Error, false)]
    #[case(Level::Warn, true)]
    #[case(Level::Info, true)]
    #[case(Level::Debug, false)]
    fn test_stdout_enabled(#[case] level: Level, #[case] expected: bool) {
        let writer = StdoutWriter::new(LevelFilter::Info);
        assert_eq!(writer.enabled(&line(level)), expected);
    }

    #[rstest]
    #[case(Level::Error, true)]
    #[case(Level::Warn, false)]
    fn test_stderr_enabled(#[case] level: Level, #[case] expected: bool) {
        assert_eq!(StderrWriter::new().enabled(&line(level)), expected);
    }

    #[rstest]
    fn test_buffer_writer_collects_lines() {
        let mut writer = BufferWriter::new(LevelFilter::Debug);
        let shared = writer.clone();
        assert!(writer.enabled(&line(Level::Debug)));
        assert!(!writer.enabled(&line(Level::Trace)));
        writer.write("first\n");
        writer.write("second\n");
        assert_eq!(shared.lines(), vec!["first\n", "second\n"]);
    }
}
