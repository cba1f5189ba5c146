use std::collections::BTreeSet;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime, Weekday};
use regex::Regex;

use crate::calendar::models::{ClassTimes, Course};
use crate::error::{Error, Result};

/// Placeholder when a section has no known time
pub const UNKNOWN_TIME: &str = "?";

// a => start of the range | b => optional end of the range
static RANGE_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<a>\d+)(?:-(?P<b>\d+))?$").expect("static regex"));

// h => hour | m => minute
static TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<h>\d{1,2})(h|:)(?P<m>\d{2})$").expect("static regex"));

/// Parse a list of positive numbers written as `1-16` or `1,3,5` (or both, `1-4,6`)
pub fn parse_range(text: &str) -> Result<BTreeSet<u32>> {
    let err = |reason: &str| Error::Range {
        input: text.to_owned(),
        reason: reason.to_owned(),
    };

    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(err("empty"));
    }

    let mut result = BTreeSet::new();
    for part in compact.split(',') {
        let captures = RANGE_PART
            .captures(part)
            .ok_or_else(|| err(&format!("`{part}` is not a number or a range")))?;

        let number = |name: &str| -> Result<u32> {
            captures[name]
                .parse()
                .map_err(|_| err(&format!("`{part}` is too large")))
        };
        let start = number("a")?;
        let end = match captures.name("b") {
            Some(_) => number("b")?,
            None => start,
        };

        if start == 0 {
            return Err(err("numbers start at 1"));
        }
        if end < start {
            return Err(err(&format!("`{part}` goes backwards")));
        }

        result.extend(start..=end);
    }

    Ok(result)
}

/// Parse an ISO `YYYY-MM-DD` date
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|_| Error::Date(text.to_owned()))
}

/// Parse a 24-hour time, `08:00` or `8h00`
pub fn parse_time(text: &str) -> Result<NaiveTime> {
    let captures = TIME
        .captures(text.trim())
        .ok_or_else(|| Error::Time(text.to_owned()))?;

    let hour = captures["h"].parse().map_err(|_| Error::Time(text.to_owned()))?;
    let minute = captures["m"].parse().map_err(|_| Error::Time(text.to_owned()))?;

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| Error::Time(text.to_owned()))
}

pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Turn an ISO weekday number (1 is monday) into a chrono weekday
pub fn weekday(number: u32) -> Result<Weekday> {
    const WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    usize::try_from(number)
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| WEEKDAYS.get(i).copied())
        .ok_or(Error::Weekday(number))
}

/// Weekday number from `3`, `wed`, `Wednesday` or `周三`
pub fn parse_weekday(text: &str) -> Result<u32> {
    const NAMES: [[&str; 3]; 7] = [
        ["mon", "monday", "周一"],
        ["tue", "tuesday", "周二"],
        ["wed", "wednesday", "周三"],
        ["thu", "thursday", "周四"],
        ["fri", "friday", "周五"],
        ["sat", "saturday", "周六"],
        ["sun", "sunday", "周日"],
    ];

    let wanted = text.trim().to_lowercase();
    if let Ok(number) = wanted.parse() {
        weekday(number)?;
        return Ok(number);
    }

    (1..)
        .zip(NAMES)
        .find(|(_, names)| names.contains(&wanted.as_str()))
        .map(|(number, _)| number)
        .ok_or_else(|| Error::WeekdayName(text.to_owned()))
}

/// Sections covered by a course, i.e. `sections 1-2`
pub fn sections_label(course: &Course) -> String {
    let (first, last) = (course.first_section(), course.last_section());
    if first == last {
        format!("section {first}")
    } else {
        format!("sections {first}-{last}")
    }
}

/// Start time of the course, from its first section
pub fn start_time(course: &Course, class_times: &ClassTimes) -> Option<NaiveTime> {
    class_times.get(&course.first_section()).map(|time| time.start)
}

/// End time of the course, from its last section
pub fn end_time(course: &Course, class_times: &ClassTimes) -> Option<NaiveTime> {
    class_times.get(&course.last_section()).map(|time| time.end)
}

/// Time window of the course, `?` standing for the unknown bounds
pub fn time_window(course: &Course, class_times: &ClassTimes) -> String {
    let show = |time: Option<NaiveTime>| time.map_or_else(|| UNKNOWN_TIME.to_owned(), format_time);

    format!(
        "{}-{}",
        show(start_time(course, class_times)),
        show(end_time(course, class_times))
    )
}

/// Cut a string to fit in a table cell
pub fn etc_str(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_owned();
    }

    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_of_weeks() {
        let weeks = parse_range("1-4").unwrap();
        assert_eq!(weeks.into_iter().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn list_and_ranges_mixed() {
        let weeks = parse_range(" 1, 3 ,5-6,3").unwrap();
        assert_eq!(weeks.into_iter().collect::<Vec<_>>(), vec![1, 3, 5, 6]);
    }

    #[test]
    fn malformed_ranges_are_rejected() {
        for input in ["", "1-", "-3", "a", "1,,2", "4-2", "0-3", "1-2-3", "99999999999"] {
            assert!(
                matches!(parse_range(input), Err(Error::Range { .. })),
                "`{input}` should be rejected"
            );
        }
    }

    #[test]
    fn times() {
        assert_eq!(
            parse_time("08:05").unwrap(),
            NaiveTime::from_hms_opt(8, 5, 0).unwrap()
        );
        assert_eq!(
            parse_time("9h45").unwrap(),
            NaiveTime::from_hms_opt(9, 45, 0).unwrap()
        );
        assert!(parse_time("25:00").is_err());
        assert!(parse_time("8:5").is_err());
    }

    #[test]
    fn weekdays() {
        assert_eq!(weekday(1).unwrap(), Weekday::Mon);
        assert_eq!(weekday(7).unwrap(), Weekday::Sun);
        assert!(matches!(weekday(0), Err(Error::Weekday(0))));
        assert!(matches!(weekday(8), Err(Error::Weekday(8))));

        assert_eq!(parse_weekday(" 3 ").unwrap(), 3);
        assert_eq!(parse_weekday("Friday").unwrap(), 5);
        assert_eq!(parse_weekday("周日").unwrap(), 7);
        assert!(matches!(parse_weekday("9"), Err(Error::Weekday(9))));
        assert!(matches!(parse_weekday("someday"), Err(Error::WeekdayName(_))));
    }

    #[test]
    fn cut_long_names() {
        assert_eq!(etc_str("Algebra", 10), "Algebra");
        assert_eq!(etc_str("Linear algebra", 6), "Linea…");
    }
}
