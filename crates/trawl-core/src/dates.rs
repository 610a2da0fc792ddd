use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Utc};
use regex::Regex;

use crate::classify::contains_term;

static RELATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\d+)\s*(minute|min|hour|hr|day|week|month|хвилин|хв|годин|год|день|дні|днів|дня|тиждень|тижні|тижнів|недел|місяц|месяц)",
    )
    .expect("relative date pattern is valid")
});

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})").expect("iso date pattern is valid")
});

static DOTTED_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})\.(\d{1,2})\.(\d{4})\b").expect("dotted date pattern is valid")
});

/// Parse a posted-date label relative to `now`.
///
/// Understands RFC 3339 timestamps, `YYYY-MM-DD`, `DD.MM.YYYY`, "today",
/// "yesterday", "N days/weeks/months ago" and their Ukrainian and Russian
/// equivalents. Returns `None` for anything else.
pub fn parse_posted_date(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }

    let lower = text.to_lowercase();
    if ["just now", "today", "сьогодні", "сегодня", "new"]
        .iter()
        .any(|w| contains_term(&lower, w))
    {
        return Some(now);
    }
    if ["yesterday", "вчора", "вчера"]
        .iter()
        .any(|w| contains_term(&lower, w))
    {
        return now.checked_sub_signed(TimeDelta::days(1));
    }

    if let Some(caps) = ISO_DATE.captures(&lower) {
        return ymd(&caps[1], &caps[2], &caps[3]);
    }
    if let Some(caps) = DOTTED_DATE.captures(&lower) {
        return ymd(&caps[3], &caps[2], &caps[1]);
    }

    let caps = RELATIVE.captures(&lower)?;
    let amount: i64 = caps[1].parse().ok()?;
    let unit = &caps[2];
    let delta = if unit.starts_with("min") || unit.starts_with("хв") {
        TimeDelta::try_minutes(amount)
    } else if unit.starts_with("h") || unit.starts_with("год") {
        TimeDelta::try_hours(amount)
    } else if unit.starts_with("week") || unit.starts_with("тиж") || unit.starts_with("недел") {
        TimeDelta::try_weeks(amount)
    } else if unit.starts_with("month") || unit.starts_with("міс") || unit.starts_with("мес") {
        amount.checked_mul(30).and_then(TimeDelta::try_days)
    } else {
        TimeDelta::try_days(amount)
    }?;
    now.checked_sub_signed(delta)
}

fn ymd(y: &str, m: &str, d: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    #[test]
    fn relative_english() {
        assert_eq!(
            parse_posted_date("3 days ago", now()),
            Some(now() - TimeDelta::days(3))
        );
        assert_eq!(
            parse_posted_date("Posted 2 weeks ago", now()),
            Some(now() - TimeDelta::weeks(2))
        );
        assert_eq!(
            parse_posted_date("5 hours ago", now()),
            Some(now() - TimeDelta::hours(5))
        );
        assert_eq!(parse_posted_date("Yesterday", now()), Some(now() - TimeDelta::days(1)));
    }

    #[test]
    fn relative_cyrillic() {
        assert_eq!(
            parse_posted_date("2 дні тому", now()),
            Some(now() - TimeDelta::days(2))
        );
        assert_eq!(parse_posted_date("сьогодні", now()), Some(now()));
    }

    #[test]
    fn absolute_dates() {
        let expected = Utc.with_ymd_and_hms(2026, 9, 30, 0, 0, 0).unwrap();
        assert_eq!(parse_posted_date("2026-09-30", now()), Some(expected));
        assert_eq!(parse_posted_date("30.09.2026", now()), Some(expected));
        assert_eq!(
            parse_posted_date("2026-09-30T08:00:00Z", now()),
            Some(Utc.with_ymd_and_hms(2026, 9, 30, 8, 0, 0).unwrap())
        );
    }

    #[test]
    fn unknown_labels() {
        assert_eq!(parse_posted_date("", now()), None);
        assert_eq!(parse_posted_date("Featured", now()), None);
    }

    #[test]
    fn out_of_range_ages_are_unknown() {
        assert_eq!(parse_posted_date("99999999 days ago", now()), None);
        assert_eq!(parse_posted_date("9223372036854775807 months ago", now()), None);
        assert_eq!(parse_posted_date("99999999999999999 minutes ago", now()), None);
        assert_eq!(parse_posted_date("99999999999999999999 weeks ago", now()), None);
    }
}
