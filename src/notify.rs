use std::fmt::Write as _;

use tracing::info;

use crate::reminder::models::{NotificationKind, ReminderEvent};
use crate::utils::{format_time, UNKNOWN_TIME};

/// Receiver of the reminders, delivery is fire-and-forget
pub trait NotificationSink: Send + Sync {
    fn notify(&self, kind: NotificationKind, event: &ReminderEvent);
}

/// Title and body of the message shown for a reminder
pub fn message(event: &ReminderEvent) -> (String, String) {
    match event {
        ReminderEvent::ClassAlarm(alarm) => {
            let end = alarm.end.map_or_else(|| UNKNOWN_TIME.to_owned(), format_time);
            let body = format!(
                "Class in {} minutes!\n\nCourse: {}\nTime: {}-{} ({})\nLocation: {}\nTeacher: {}",
                alarm.minutes_before,
                alarm.key.course,
                format_time(alarm.start),
                end,
                alarm.sections,
                alarm.location,
                alarm.teacher
            );
            ("Class reminder".to_owned(), body)
        }
        ReminderEvent::DayBeforeDigest(digest) => {
            let mut body = format!(
                "Tomorrow ({}) has {} course{}",
                digest.date.format("%a %d %b"),
                digest.courses.len(),
                if digest.courses.len() > 1 { "s" } else { "" }
            );
            if let (Some(semester), Some(week)) = (&digest.semester, digest.week) {
                let _ = write!(body, ", {semester} week {week}");
            }
            for course in &digest.courses {
                let start = course
                    .start
                    .map_or_else(|| UNKNOWN_TIME.to_owned(), format_time);
                let _ = write!(
                    body,
                    "\n  - {} ({start}, {}) {}",
                    course.course, course.sections, course.location
                );
            }
            ("Tomorrow's courses".to_owned(), body)
        }
    }
}

/// Print reminders on the terminal, ringing its bell
#[derive(Debug, Default)]
pub struct TerminalSink {
    pub bell: bool,
}

impl NotificationSink for TerminalSink {
    fn notify(&self, kind: NotificationKind, event: &ReminderEvent) {
        let (title, body) = message(event);
        info!(?kind, "{title}");

        let bell = if self.bell { "\x07" } else { "" };
        println!("{bell}== {title} ==\n{body}\n");
    }
}

/// Keep the reminders in memory
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: std::sync::Mutex<Vec<ReminderEvent>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn events(&self) -> Vec<ReminderEvent> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
impl NotificationSink for RecordingSink {
    fn notify(&self, _kind: NotificationKind, event: &ReminderEvent) {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;
    use crate::reminder::models::{ClassAlarm, DayBeforeDigest, DigestEntry, OccurrenceKey};

    #[test]
    fn alarm_message() {
        let event = ReminderEvent::ClassAlarm(ClassAlarm {
            key: OccurrenceKey {
                date: NaiveDate::from_ymd_opt(2025, 9, 8).unwrap(),
                course: "Maths".to_owned(),
                first_section: 2,
            },
            location: "Room 101".to_owned(),
            teacher: "Dr. Smith".to_owned(),
            start: NaiveTime::from_hms_opt(8, 55, 0).unwrap(),
            end: None,
            sections: "sections 2-3".to_owned(),
            minutes_before: 30,
        });

        let (title, body) = message(&event);
        assert_eq!(title, "Class reminder");
        assert!(body.starts_with("Class in 30 minutes!"));
        assert!(body.contains("Time: 08:55-? (sections 2-3)"));
        assert!(body.contains("Teacher: Dr. Smith"));
    }

    #[test]
    fn digest_message() {
        let event = ReminderEvent::DayBeforeDigest(DayBeforeDigest {
            date: NaiveDate::from_ymd_opt(2025, 9, 15).unwrap(),
            semester: Some("Fall".to_owned()),
            week: Some(2),
            courses: vec![
                DigestEntry {
                    course: "Maths".to_owned(),
                    start: NaiveTime::from_hms_opt(8, 0, 0),
                    sections: "sections 1-2".to_owned(),
                    location: "Room 101".to_owned(),
                },
                DigestEntry {
                    course: "Seminar".to_owned(),
                    start: None,
                    sections: "section 12".to_owned(),
                    location: "Hall".to_owned(),
                },
            ],
        });

        let (_, body) = message(&event);
        assert!(body.starts_with("Tomorrow (Mon 15 Sep) has 2 courses, Fall week 2"));
        assert!(body.contains("- Maths (08:00, sections 1-2) Room 101"));
        assert!(body.contains("- Seminar (?, section 12) Hall"));
    }
}
