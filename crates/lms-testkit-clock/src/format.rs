//! PHP `date()`-style pattern rendering.
//!
//! The host platform describes every time format with PHP `date()` pattern
//! characters (`Y-m-d H:i:s` and friends). [`format_php`] renders a
//! [`DateTime`] with such a pattern so mocked and real clocks produce
//! byte-identical strings.
//!
//! Unknown pattern characters are copied verbatim and a backslash escapes the
//! character that follows it. Malformed patterns never fail; they simply
//! produce malformed output.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Timelike};
use std::fmt::{self, Write};

/// Pattern used for the `mysql` time kind.
pub const MYSQL_FORMAT: &str = "Y-m-d H:i:s";

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Renders `dt` using a PHP `date()` pattern.
///
/// # Example
///
/// ```
/// use chrono::{DateTime, FixedOffset};
/// use lms_testkit_clock::format_php;
///
/// let dt = DateTime::from_timestamp(1_577_836_800, 0)
///     .unwrap()
///     .with_timezone(&FixedOffset::east_opt(0).unwrap());
///
/// assert_eq!(format_php(&dt, "Y-m-d H:i:s"), "2020-01-01 00:00:00");
/// assert_eq!(format_php(&dt, "l, F jS"), "Wednesday, January 1st");
/// assert_eq!(format_php(&dt, "\\Y\\e\\a\\r: Y"), "Year: 2020");
/// ```
pub fn format_php(dt: &DateTime<FixedOffset>, pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    // `fmt::Write` for `String` never returns an error.
    render(&mut out, dt, pattern).ok();
    out
}

fn render(out: &mut String, dt: &DateTime<FixedOffset>, pattern: &str) -> fmt::Result {
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push(chars.next().unwrap_or('\\')),

            // Day
            'd' => write!(out, "{:02}", dt.day())?,
            'D' => write!(out, "{}", &weekday_name(dt)[..3])?,
            'j' => write!(out, "{}", dt.day())?,
            'l' => write!(out, "{}", weekday_name(dt))?,
            'N' => write!(out, "{}", dt.weekday().number_from_monday())?,
            'S' => write!(out, "{}", ordinal_suffix(dt.day()))?,
            'w' => write!(out, "{}", dt.weekday().num_days_from_sunday())?,
            'z' => write!(out, "{}", dt.ordinal0())?,

            // Week
            'W' => write!(out, "{:02}", dt.iso_week().week())?,

            // Month
            'F' => write!(out, "{}", month_name(dt.month()))?,
            'm' => write!(out, "{:02}", dt.month())?,
            'M' => write!(out, "{}", &month_name(dt.month())[..3])?,
            'n' => write!(out, "{}", dt.month())?,
            't' => write!(out, "{}", days_in_month(dt.year(), dt.month()))?,

            // Year
            'L' => write!(out, "{}", u8::from(is_leap_year(dt.year())))?,
            'o' => write!(out, "{}", dt.iso_week().year())?,
            'Y' => write!(out, "{:04}", dt.year())?,
            'y' => write!(out, "{:02}", dt.year().rem_euclid(100))?,

            // Time
            'a' => write!(out, "{}", if dt.hour() < 12 { "am" } else { "pm" })?,
            'A' => write!(out, "{}", if dt.hour() < 12 { "AM" } else { "PM" })?,
            'B' => write!(out, "{:03}", swatch_beat(dt))?,
            'g' => write!(out, "{}", hour12(dt.hour()))?,
            'G' => write!(out, "{}", dt.hour())?,
            'h' => write!(out, "{:02}", hour12(dt.hour()))?,
            'H' => write!(out, "{:02}", dt.hour())?,
            'i' => write!(out, "{:02}", dt.minute())?,
            's' => write!(out, "{:02}", dt.second())?,
            'u' => write!(out, "{:06}", dt.nanosecond() / 1_000)?,
            'v' => write!(out, "{:03}", dt.nanosecond() / 1_000_000)?,

            // Timezone
            'e' | 'T' => write!(out, "{}", zone_name(dt.offset()))?,
            'I' => write!(out, "0")?,
            'O' => write!(out, "{}", offset_string(dt.offset(), false))?,
            'P' => write!(out, "{}", offset_string(dt.offset(), true))?,
            'p' => {
                if dt.offset().local_minus_utc() == 0 {
                    out.push('Z');
                } else {
                    write!(out, "{}", offset_string(dt.offset(), true))?;
                }
            }
            'Z' => write!(out, "{}", dt.offset().local_minus_utc())?,

            // Full date/time
            'c' => write!(out, "{}", format_php(dt, "Y-m-d\\TH:i:sP"))?,
            'r' => write!(out, "{}", format_php(dt, "D, d M Y H:i:s O"))?,
            'U' => write!(out, "{}", dt.timestamp())?,

            other => out.push(other),
        }
    }

    Ok(())
}

fn weekday_name(dt: &DateTime<FixedOffset>) -> &'static str {
    WEEKDAYS[dt.weekday().num_days_from_monday() as usize]
}

fn month_name(month: u32) -> &'static str {
    MONTHS[(month as usize).saturating_sub(1) % 12]
}

fn ordinal_suffix(day: u32) -> &'static str {
    match day {
        11..=13 => "th",
        _ => match day % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    }
}

fn hour12(hour: u32) -> u32 {
    match hour % 12 {
        0 => 12,
        h => h,
    }
}

/// Swatch Internet time is anchored to UTC+1.
fn swatch_beat(dt: &DateTime<FixedOffset>) -> i64 {
    let seconds = (dt.timestamp() + 3_600).rem_euclid(86_400);
    seconds * 10 / 864
}

pub(crate) fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(31, |last| last.day())
}

fn offset_string(offset: &FixedOffset, colon: bool) -> String {
    let total = offset.local_minus_utc();
    let sign = if total < 0 { '-' } else { '+' };
    let hours = total.abs() / 3_600;
    let minutes = (total.abs() % 3_600) / 60;

    if colon {
        format!("{sign}{hours:02}:{minutes:02}")
    } else {
        format!("{sign}{hours:02}{minutes:02}")
    }
}

fn zone_name(offset: &FixedOffset) -> String {
    if offset.local_minus_utc() == 0 {
        "UTC".to_string()
    } else {
        offset_string(offset, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ts: i64, offset_secs: i32) -> DateTime<FixedOffset> {
        DateTime::from_timestamp(ts, 0)
            .unwrap()
            .with_timezone(&FixedOffset::east_opt(offset_secs).unwrap())
    }

    #[test]
    fn test_mysql_format() {
        assert_eq!(format_php(&at(1_577_836_800, 0), MYSQL_FORMAT), "2020-01-01 00:00:00");
    }

    #[test]
    fn test_mysql_format_with_offset() {
        assert_eq!(
            format_php(&at(1_577_836_800, -5 * 3_600), MYSQL_FORMAT),
            "2019-12-31 19:00:00"
        );
    }

    #[test]
    fn test_day_and_month_names() {
        // 2021-03-02 was a Tuesday
        let dt = at(1_614_643_200, 0);
        assert_eq!(format_php(&dt, "D l N w"), "Tue Tuesday 2 2");
        assert_eq!(format_php(&dt, "F M n m"), "March Mar 3 03");
    }

    #[test]
    fn test_ordinal_suffixes() {
        let base = 1_577_836_800; // 2020-01-01
        let suffix = |day: i64| format_php(&at(base + (day - 1) * 86_400, 0), "jS");
        assert_eq!(suffix(1), "1st");
        assert_eq!(suffix(2), "2nd");
        assert_eq!(suffix(3), "3rd");
        assert_eq!(suffix(4), "4th");
        assert_eq!(suffix(11), "11th");
        assert_eq!(suffix(12), "12th");
        assert_eq!(suffix(13), "13th");
        assert_eq!(suffix(21), "21st");
        assert_eq!(suffix(22), "22nd");
        assert_eq!(suffix(31), "31st");
    }

    #[test]
    fn test_twelve_hour_clock() {
        // 2020-01-01 00:30:00 and 13:05:00
        assert_eq!(format_php(&at(1_577_838_600, 0), "g:i a h A"), "12:30 am 12 AM");
        assert_eq!(format_php(&at(1_577_883_900, 0), "g:i a G H"), "1:05 pm 13 13");
    }

    #[test]
    fn test_year_fields() {
        let dt = at(1_577_836_800, 0);
        assert_eq!(format_php(&dt, "Y y L t z"), "2020 20 1 31 0");
    }

    #[test]
    fn test_iso_week_year_boundary() {
        // 2021-01-01 belongs to ISO week 53 of 2020
        let dt = at(1_609_459_200, 0);
        assert_eq!(format_php(&dt, "o-\\WW"), "2020-W53");
    }

    #[test]
    fn test_timezone_fields() {
        let dt = at(1_577_836_800, 5 * 3_600 + 30 * 60);
        assert_eq!(format_php(&dt, "O P Z"), "+0530 +05:30 19800");
        assert_eq!(format_php(&at(0, 0), "e T p"), "UTC UTC Z");
        assert_eq!(format_php(&dt, "p I"), "+05:30 0");
    }

    #[test]
    fn test_composite_formats() {
        let dt = at(1_577_836_800, 0);
        assert_eq!(format_php(&dt, "c"), "2020-01-01T00:00:00+00:00");
        assert_eq!(format_php(&dt, "r"), "Wed, 01 Jan 2020 00:00:00 +0000");
        assert_eq!(format_php(&dt, "U"), "1577836800");
    }

    #[test]
    fn test_escapes_and_literals() {
        let dt = at(1_577_836_800, 0);
        assert_eq!(format_php(&dt, "\\d\\a\\y: d"), "day: 01");
        assert_eq!(format_php(&dt, "Y/m/d @ #"), "2020/01/01 @ #");
        assert_eq!(format_php(&dt, "Y\\"), "2020\\");
    }

    #[test]
    fn test_swatch_beat() {
        // Midnight UTC is 01:00 BMT, i.e. beat 041
        assert_eq!(format_php(&at(1_577_836_800, 0), "B"), "041");
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2020, 2), 29);
        assert_eq!(days_in_month(2021, 2), 28);
        assert_eq!(days_in_month(2021, 12), 31);
        assert_eq!(days_in_month(2021, 4), 30);
    }
}
