//! Best-effort natural-language date parsing.
//!
//! [`parse_datetime`] understands the subset of `strtotime()` inputs that
//! show up in plugin tests: absolute dates in the common layouts, `@<unix>`,
//! RFC 3339/2822 strings, keywords (`now`, `today`, `tomorrow`, ...), and
//! relative offsets such as `+1 day`, `2 weeks ago` or `next monday`.
//! Relative parts may follow an absolute date (`2020-01-01 +1 month`).

use chrono::{
    DateTime, Datelike, FixedOffset, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta,
    TimeZone, Weekday,
};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%B %d %Y %H:%M:%S",
    "%B %d %Y %H:%M",
    "%d %B %Y %H:%M:%S",
    "%d %B %Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%B %d %Y",
    "%d %B %Y",
];

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(i64),
    Word(String),
    Time(NaiveTime),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Fortnight,
    Month,
    Year,
}

/// Parses `text` into a Unix timestamp.
///
/// `now` anchors relative expressions and `offset` is the zone that naive
/// dates are interpreted in. Returns `None` when the text cannot be
/// understood.
///
/// # Example
///
/// ```
/// use chrono::FixedOffset;
/// use lms_testkit_clock::parse_datetime;
///
/// let utc = FixedOffset::east_opt(0).unwrap();
/// assert_eq!(parse_datetime("2020-01-01 00:00:00", 0, utc), Some(1_577_836_800));
/// assert_eq!(parse_datetime("+1 day", 1_577_836_800, utc), Some(1_577_923_200));
/// assert_eq!(parse_datetime("whenever", 0, utc), None);
/// ```
pub fn parse_datetime(text: &str, now: i64, offset: FixedOffset) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(rest) = text.strip_prefix('@') {
        return rest.trim().parse().ok();
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.timestamp());
    }

    let normalized = text.replace(',', " ");
    let words: Vec<&str> = normalized.split_whitespace().collect();

    // Longest absolute prefix wins, the rest must be relative.
    for split in (1..=words.len()).rev() {
        if let Some(base) = parse_absolute(&words[..split].join(" ")) {
            let local = apply_relative(base, &words[split..])?;
            return to_timestamp(local, offset);
        }
    }

    let now_local = DateTime::from_timestamp(now, 0)?
        .with_timezone(&offset)
        .naive_local();
    let local = apply_relative(now_local, &words)?;
    to_timestamp(local, offset)
}

fn parse_absolute(text: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

fn to_timestamp(local: NaiveDateTime, offset: FixedOffset) -> Option<i64> {
    offset
        .from_local_datetime(&local)
        .single()
        .map(|dt| dt.timestamp())
}

fn tokenize(words: &[&str]) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();

    for word in words {
        let word = word.to_lowercase();

        if word.contains(':') {
            let time = NaiveTime::parse_from_str(&word, "%H:%M:%S")
                .or_else(|_| NaiveTime::parse_from_str(&word, "%H:%M"))
                .ok()?;
            tokens.push(Token::Time(time));
            continue;
        }

        let mut chars = word.chars().peekable();
        let mut negative = false;

        while let Some(&c) = chars.peek() {
            if c == '+' || c == '-' {
                negative = c == '-';
                chars.next();
            } else if c.is_ascii_digit() {
                let mut digits = String::new();
                while let Some(&d) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    digits.push(d);
                    chars.next();
                }
                let value: i64 = digits.parse().ok()?;
                tokens.push(Token::Number(if negative { -value } else { value }));
                negative = false;
            } else if c.is_alphabetic() {
                let mut letters = String::new();
                while let Some(&l) = chars.peek() {
                    if !l.is_alphabetic() {
                        break;
                    }
                    letters.push(l);
                    chars.next();
                }
                tokens.push(Token::Word(letters));
            } else {
                return None;
            }
        }
    }

    Some(tokens)
}

fn apply_relative(mut dt: NaiveDateTime, words: &[&str]) -> Option<NaiveDateTime> {
    let tokens = tokenize(words)?;
    let mut i = 0;

    while i < tokens.len() {
        match &tokens[i] {
            Token::Time(time) => {
                dt = dt.date().and_time(*time);
            }
            Token::Number(amount) => {
                let Some(Token::Word(next)) = tokens.get(i + 1) else {
                    return None;
                };
                i += 1;

                if let Some(hour) = meridiem_hour(*amount, next) {
                    dt = dt.date().and_hms_opt(hour, 0, 0)?;
                } else {
                    let unit = parse_unit(next)?;
                    let mut amount = *amount;
                    if matches!(tokens.get(i + 1), Some(Token::Word(w)) if w == "ago") {
                        amount = -amount;
                        i += 1;
                    }
                    dt = shift(dt, unit, amount)?;
                }
            }
            Token::Word(word) => match word.as_str() {
                "now" => {}
                "today" | "midnight" => dt = dt.date().and_time(NaiveTime::MIN),
                "noon" => dt = dt.date().and_hms_opt(12, 0, 0)?,
                "tomorrow" => dt = shift(dt, Unit::Day, 1)?.date().and_time(NaiveTime::MIN),
                "yesterday" => dt = shift(dt, Unit::Day, -1)?.date().and_time(NaiveTime::MIN),
                "next" | "last" | "previous" | "this" => {
                    let Some(Token::Word(target)) = tokens.get(i + 1) else {
                        return None;
                    };
                    i += 1;

                    let direction = match word.as_str() {
                        "next" => 1,
                        "this" => 0,
                        _ => -1,
                    };

                    if let Some(weekday) = parse_weekday(target) {
                        dt = move_to_weekday(dt, weekday, direction)?;
                    } else {
                        dt = shift(dt, parse_unit(target)?, direction)?;
                    }
                }
                other => {
                    let weekday = parse_weekday(other)?;
                    dt = move_to_weekday(dt, weekday, 0)?;
                }
            },
        }
        i += 1;
    }

    Some(dt)
}

fn meridiem_hour(amount: i64, word: &str) -> Option<u32> {
    let hour = u32::try_from(amount).ok().filter(|h| (1..=12).contains(h))?;
    match word {
        "am" => Some(hour % 12),
        "pm" => Some(hour % 12 + 12),
        _ => None,
    }
}

fn parse_unit(word: &str) -> Option<Unit> {
    match word {
        "sec" | "secs" | "second" | "seconds" => Some(Unit::Second),
        "min" | "mins" | "minute" | "minutes" => Some(Unit::Minute),
        "hour" | "hours" => Some(Unit::Hour),
        "day" | "days" => Some(Unit::Day),
        "week" | "weeks" => Some(Unit::Week),
        "fortnight" | "fortnights" => Some(Unit::Fortnight),
        "month" | "months" => Some(Unit::Month),
        "year" | "years" => Some(Unit::Year),
        _ => None,
    }
}

fn parse_weekday(word: &str) -> Option<Weekday> {
    match word {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thur" | "thurs" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

fn shift(dt: NaiveDateTime, unit: Unit, amount: i64) -> Option<NaiveDateTime> {
    let delta = match unit {
        Unit::Second => TimeDelta::try_seconds(amount)?,
        Unit::Minute => TimeDelta::try_minutes(amount)?,
        Unit::Hour => TimeDelta::try_hours(amount)?,
        Unit::Day => TimeDelta::try_days(amount)?,
        Unit::Week => TimeDelta::try_weeks(amount)?,
        Unit::Fortnight => TimeDelta::try_weeks(amount.checked_mul(2)?)?,
        Unit::Month => return shift_months(dt, amount),
        Unit::Year => return shift_months(dt, amount.checked_mul(12)?),
    };
    dt.checked_add_signed(delta)
}

fn shift_months(dt: NaiveDateTime, amount: i64) -> Option<NaiveDateTime> {
    let months = Months::new(u32::try_from(amount.unsigned_abs()).ok()?);
    if amount >= 0 {
        dt.checked_add_months(months)
    } else {
        dt.checked_sub_months(months)
    }
}

/// Moves to midnight of the target weekday.
///
/// Direction `1` is strictly after today, `-1` strictly before, `0` is today
/// or the next occurrence.
fn move_to_weekday(dt: NaiveDateTime, target: Weekday, direction: i64) -> Option<NaiveDateTime> {
    let current = i64::from(dt.weekday().num_days_from_monday());
    let target = i64::from(target.num_days_from_monday());

    let days = match direction {
        d if d < 0 => {
            let back = (current - target).rem_euclid(7);
            -(if back == 0 { 7 } else { back })
        }
        0 => (target - current).rem_euclid(7),
        _ => {
            let ahead = (target - current).rem_euclid(7);
            if ahead == 0 {
                7
            } else {
                ahead
            }
        }
    };

    let date = dt.date().checked_add_signed(TimeDelta::days(days))?;
    Some(date.and_time(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Wednesday 2020-01-01 00:00:00 UTC
    const NOW: i64 = 1_577_836_800;
    const DAY: i64 = 86_400;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn parse(text: &str) -> Option<i64> {
        parse_datetime(text, NOW, utc())
    }

    #[test]
    fn test_absolute_datetime() {
        assert_eq!(parse("2020-01-01 00:00:00"), Some(NOW));
        assert_eq!(parse("2020-01-01T00:00:00"), Some(NOW));
        assert_eq!(parse("2020-01-01 10:30"), Some(NOW + 37_800));
        assert_eq!(parse("2020/01/01 00:00:00"), Some(NOW));
    }

    #[test]
    fn test_absolute_date_only_is_midnight() {
        assert_eq!(parse("2020-01-01"), Some(NOW));
        assert_eq!(parse("01/01/2020"), Some(NOW));
        assert_eq!(parse("January 1, 2020"), Some(NOW));
        assert_eq!(parse("1 January 2020"), Some(NOW));
        assert_eq!(parse("Jan 1 2020"), Some(NOW));
    }

    #[test]
    fn test_month_name_with_time() {
        assert_eq!(parse("1 January 2020 10:30"), Some(NOW + 37_800));
    }

    #[test]
    fn test_unix_and_rfc_formats() {
        assert_eq!(parse("@1577836800"), Some(NOW));
        assert_eq!(parse("2020-01-01T00:00:00Z"), Some(NOW));
        assert_eq!(parse("2020-01-01T05:00:00+05:00"), Some(NOW));
        assert_eq!(parse("Wed, 01 Jan 2020 00:00:00 +0000"), Some(NOW));
    }

    #[test]
    fn test_offset_applies_to_naive_dates() {
        let plus_two = FixedOffset::east_opt(2 * 3_600).unwrap();
        assert_eq!(
            parse_datetime("2020-01-01 00:00:00", NOW, plus_two),
            Some(NOW - 7_200)
        );
    }

    #[test]
    fn test_relative_offsets() {
        assert_eq!(parse("now"), Some(NOW));
        assert_eq!(parse("+1 day"), Some(NOW + DAY));
        assert_eq!(parse("-1 day"), Some(NOW - DAY));
        assert_eq!(parse("+1day"), Some(NOW + DAY));
        assert_eq!(parse("2 weeks ago"), Some(NOW - 14 * DAY));
        assert_eq!(parse("+1 week 2 days"), Some(NOW + 9 * DAY));
        assert_eq!(parse("+90 minutes"), Some(NOW + 5_400));
        assert_eq!(parse("+1 fortnight"), Some(NOW + 14 * DAY));
    }

    #[test]
    fn test_relative_months_and_years() {
        // 2020-02-01
        assert_eq!(parse("+1 month"), Some(1_580_515_200));
        // 2021-01-01
        assert_eq!(parse("+1 year"), Some(1_609_459_200));
        // 2019-12-01
        assert_eq!(parse("last month"), Some(1_575_158_400));
    }

    #[test]
    fn test_absolute_with_relative_suffix() {
        assert_eq!(parse("2020-01-01 +1 day"), Some(NOW + DAY));
        assert_eq!(parse("2020-01-01 10:00 -2 hours"), Some(NOW + 8 * 3_600));
    }

    #[test]
    fn test_keywords() {
        let midday = NOW + 12 * 3_600;
        assert_eq!(parse_datetime("today", midday, utc()), Some(NOW));
        assert_eq!(parse_datetime("midnight", midday, utc()), Some(NOW));
        assert_eq!(parse_datetime("tomorrow", midday, utc()), Some(NOW + DAY));
        assert_eq!(parse_datetime("yesterday", midday, utc()), Some(NOW - DAY));
        assert_eq!(parse("noon"), Some(midday));
        assert_eq!(parse("tomorrow noon"), Some(NOW + DAY + 12 * 3_600));
    }

    #[test]
    fn test_weekdays() {
        // 2020-01-06 is the following Monday
        assert_eq!(parse("next monday"), Some(NOW + 5 * DAY));
        assert_eq!(parse("monday"), Some(NOW + 5 * DAY));
        // Friday 2019-12-27
        assert_eq!(parse("last friday"), Some(NOW - 5 * DAY));
        assert_eq!(parse("wednesday"), Some(NOW));
        assert_eq!(parse("next wednesday"), Some(NOW + 7 * DAY));
        assert_eq!(parse("last wednesday"), Some(NOW - 7 * DAY));
    }

    #[test]
    fn test_time_of_day() {
        assert_eq!(parse("10:00"), Some(NOW + 10 * 3_600));
        assert_eq!(parse("10:00:30"), Some(NOW + 10 * 3_600 + 30));
        assert_eq!(parse("3pm"), Some(NOW + 15 * 3_600));
        assert_eq!(parse("12am"), Some(NOW));
        assert_eq!(parse("tomorrow 9am"), Some(NOW + DAY + 9 * 3_600));
    }

    #[test]
    fn test_unparseable() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("   "), None);
        assert_eq!(parse("not a date"), None);
        assert_eq!(parse("+1 parsecs"), None);
        assert_eq!(parse("+1"), None);
        assert_eq!(parse("next"), None);
        assert_eq!(parse("25:99"), None);
        assert_eq!(parse("@soon"), None);
    }

    #[test]
    fn test_weekday_past_calendar_end() {
        assert_eq!(parse("+262142-12-31 next monday"), None);
    }
}
