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

//! Common date and date-time text formats used by plain-text journals.
//!
//! Dates are accepted in `YYYY-MM-DD`, `YYYY/MM/DD` and `YYYY.MM.DD` form. A date-time is a date
//! followed by whitespace and `HH:MM` or `HH:MM:SS`. All values are naive (no time zone).

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Output format for dates.
pub const DATE_FORMAT: &str = "%Y/%m/%d";

/// Output format for date-times.
pub const DATETIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

const DATE_INPUT_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];
const TIME_INPUT_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

/// Parses a calendar date.
///
/// # Errors
///
/// Returns an error if `text` is not a date in one of the accepted forms.
pub fn parse_date(text: &str) -> anyhow::Result<NaiveDate> {
    let text = text.trim();
    DATE_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .ok_or_else(|| anyhow::anyhow!("Invalid date '{text}'"))
}

/// Parses a time of day.
///
/// # Errors
///
/// Returns an error if `text` is not `HH:MM` or `HH:MM:SS`.
pub fn parse_time(text: &str) -> anyhow::Result<NaiveTime> {
    let text = text.trim();
    TIME_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
        .ok_or_else(|| anyhow::anyhow!("Invalid time '{text}'"))
}

/// Parses a date with an optional time of day, defaulting to midnight.
///
/// # Errors
///
/// Returns an error if either component is malformed or extra text follows.
pub fn parse_datetime(text: &str) -> anyhow::Result<NaiveDateTime> {
    let mut parts = text.split_whitespace();
    let date = match parts.next() {
        Some(date) => parse_date(date)?,
        None => anyhow::bail!("Invalid date-time, was empty"),
    };
    let time = match parts.next() {
        Some(time) => parse_time(time)?,
        None => NaiveTime::MIN,
    };
    if let Some(extra) = parts.next() {
        anyhow::bail!("Invalid date-time '{text}', unexpected '{extra}'");
    }
    Ok(date.and_time(time))
}

/// Returns `true` if `text` begins like a date (a leading ASCII digit).
#[must_use]
pub fn looks_like_date(text: &str) -> bool {
    text.trim_start().starts_with(|c: char| c.is_ascii_digit())
}

/// Formats a date in journal output form.
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Formats a date-time in journal output form.
#[must_use]
pub fn format_datetime(datetime: NaiveDateTime) -> String {
    datetime.format(DATETIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("2020-01-15")]
    #[case("2020/01/15")]
    #[case("2020.01.15")]
    #[case("  2020/01/15 ")]
    fn test_parse_date_forms(#[case] text: &str) {
        assert_eq!(
            parse_date(text).unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 15).unwrap()
        );
    }

    #[rstest]
    #[case("")]
    #[case("2020-13-01")]
    #[case("15/01/2020")]
    #[case("GAL")]
    fn test_parse_date_invalid(#[case] text: &str) {
        assert!(parse_date(text).is_err());
    }

    #[rstest]
    #[case("1989/01/15 12:00:00", 12, 0, 0)]
    #[case("1989-01-15 08:30", 8, 30, 0)]
    #[case("1989-01-15", 0, 0, 0)]
    fn test_parse_datetime(
        #[case] text: &str,
        #[case] hour: u32,
        #[case] minute: u32,
        #[case] second: u32,
    ) {
        let expected = NaiveDate::from_ymd_opt(1989, 1, 15)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap();
        assert_eq!(parse_datetime(text).unwrap(), expected);
    }

    #[rstest]
    fn test_parse_datetime_trailing_text_fails() {
        assert!(parse_datetime("1989/01/15 12:00:00 GAL").is_err());
    }

    #[rstest]
    #[case("2020-01-15 GAL $3", true)]
    #[case("GAL $3", false)]
    #[case("", false)]
    fn test_looks_like_date(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(looks_like_date(text), expected);
    }

    #[rstest]
    fn test_format_round_trip() {
        let dt = parse_datetime("2021/05/10 13:14:15").unwrap();
        assert_eq!(format_datetime(dt), "2021/05/10 13:14:15");
        assert_eq!(format_date(dt.date()), "2021/05/10");
    }
}
