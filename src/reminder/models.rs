use std::collections::HashSet;

use chrono::{NaiveDate, NaiveTime};

/// Identity of one course occurrence, an alarm fires at most once per key
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OccurrenceKey {
    pub date: NaiveDate,
    pub course: String,
    pub first_section: u32,
}

/// What the scheduler already fired during this run
#[derive(Debug, Default)]
pub struct ReminderState {
    pub fired_class_alarms: HashSet<OccurrenceKey>,
    /// Days whose digest went out, one digest per day
    pub fired_digests: HashSet<NaiveDate>,
    /// Mirror of the durable marker, the day the last digest was about
    pub last_digest: Option<NaiveDate>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    ClassAlarm,
    DayBeforeDigest,
}

/// Course starting soon
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassAlarm {
    pub key: OccurrenceKey,
    pub location: String,
    pub teacher: String,
    pub start: NaiveTime,
    /// Unknown when the last section has no time
    pub end: Option<NaiveTime>,
    pub sections: String,
    pub minutes_before: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DigestEntry {
    pub course: String,
    pub start: Option<NaiveTime>,
    pub sections: String,
    pub location: String,
}

/// Every course of the next day, sent once the day before
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DayBeforeDigest {
    pub date: NaiveDate,
    pub semester: Option<String>,
    pub week: Option<u32>,
    pub courses: Vec<DigestEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReminderEvent {
    ClassAlarm(ClassAlarm),
    DayBeforeDigest(DayBeforeDigest),
}

impl ReminderEvent {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Self::ClassAlarm(_) => NotificationKind::ClassAlarm,
            Self::DayBeforeDigest(_) => NotificationKind::DayBeforeDigest,
        }
    }
}
