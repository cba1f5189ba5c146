use std::path::Path;

use chrono::{NaiveDate, NaiveTime, Utc};
use ics::components::Parameter;
use ics::properties::{Description, DtEnd, DtStart, Location, Summary};
use ics::{Event, ICalendar};
use tracing::debug;

use crate::calendar::models::Snapshot;
use crate::calendar::{days, occurrences_on};
use crate::error::Result;
use crate::utils::{end_time, sections_label, start_time};

fn local(date: NaiveDate, time: NaiveTime) -> String {
    date.and_time(time).format("%Y%m%dT%H%M%S").to_string()
}

fn all_day(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Build the iCalendar of the year
///
/// Every course occurrence with known times becomes an event, and every important
/// date an all-day event.
pub fn build(snapshot: &Snapshot) -> ICalendar<'static> {
    let stamp = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
    let mut calendar = ICalendar::new(
        "2.0",
        format!("-//{}//{}//EN", env!("CARGO_PKG_NAME"), snapshot.school_name),
    );

    for semester in &snapshot.semesters {
        for date in days(semester) {
            for course in occurrences_on(snapshot, date) {
                let (Some(start), Some(end)) = (
                    start_time(course, &snapshot.class_times),
                    end_time(course, &snapshot.class_times),
                ) else {
                    debug!("{} on {date} has no known time, not exported", course.name);
                    continue;
                };

                let mut event = Event::new(uuid::Uuid::new_v4().to_string(), stamp.clone());
                event.push(Summary::new(course.name.clone()));
                event.push(DtStart::new(local(date, start)));
                event.push(DtEnd::new(local(date, end)));
                if !course.location.is_empty() {
                    event.push(Location::new(course.location.clone()));
                }
                event.push(Description::new(format!(
                    "{} - {}",
                    sections_label(course),
                    course.teacher
                )));
                calendar.add_event(event);
            }
        }
    }

    for important in &snapshot.important_dates {
        let mut event = Event::new(uuid::Uuid::new_v4().to_string(), stamp.clone());
        event.push(Summary::new(important.event.clone()));

        let mut start = DtStart::new(all_day(important.date));
        start.add(Parameter::new("VALUE", "DATE"));
        event.push(start);
        let mut end = DtEnd::new(all_day(crate::calendar::tomorrow(important.date)));
        end.add(Parameter::new("VALUE", "DATE"));
        event.push(end);

        event.push(Description::new(important.category.to_string()));
        calendar.add_event(event);
    }

    calendar
}

/// Export the year to an `.ics` file
pub fn export(snapshot: &Snapshot, path: &Path) -> Result<()> {
    build(snapshot).save_file(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::default_snapshot;

    #[test]
    fn courses_and_dates_exported() {
        let mut snapshot = default_snapshot();
        // Section 11 has no time, left out
        let mut ghost = snapshot.courses[0].clone();
        ghost.name = "Ghost".to_owned();
        ghost.sections = vec![11];
        snapshot.courses.push(ghost);

        let ics = build(&snapshot).to_string();

        // 5 weeks in each semester plus 8 important dates
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 5 * 2 + 8);
        assert!(ics.contains("DTSTART:20250908T080000"));
        assert!(ics.contains("DTEND:20250908T094500"));
        assert!(ics.contains("DTSTART;VALUE=DATE:20251001"));
        assert!(ics.contains("DTEND;VALUE=DATE:20251002"));
        assert!(!ics.contains("Ghost"));
    }

    #[test]
    fn written_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calendar.ics");

        export(&default_snapshot(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("BEGIN:VCALENDAR"));
    }
}
