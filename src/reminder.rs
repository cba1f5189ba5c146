//! Class alarms and day-before digests.
//!
//! The decisions are plain functions over a snapshot, an instant and the
//! [`ReminderState`], so they can be checked without timers. [`Reminder`] wraps
//! them with the clock, the settings and the sink, and serializes every tick.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::calendar::models::Snapshot;
use crate::calendar::{self, occurrences_on, resolve};
use crate::clock::Clock;
use crate::kv::KeyValueStore;
use crate::notify::NotificationSink;
use crate::store::CalendarStore;
use crate::utils::{end_time, parse_date, sections_label, start_time};

pub mod models;

use models::{
    ClassAlarm, DayBeforeDigest, DigestEntry, OccurrenceKey, ReminderEvent, ReminderState,
};

/// Settings key of the day the last digest was about
pub const DIGEST_MARKER: &str = "last_day_before_reminder";
/// Settings key enabling the class alarms
pub const ALARM_ENABLED: &str = "alarm_enabled";
/// Settings key enabling the day-before digest
pub const DIGEST_ENABLED: &str = "day_before_reminder";

/// When alarms go off relative to the class
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    /// Minutes between the alarm and the start of the class
    pub lead_minutes: i64,
    /// Accepted distance in minutes between a tick and the alarm time
    pub tolerance_minutes: i64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            lead_minutes: 30,
            tolerance_minutes: 1,
        }
    }
}

/// Alarms due at `now`, each occurrence firing once
///
/// An alarm whose window passed while nothing was ticking is not caught up.
pub fn class_alarms(
    snapshot: &Snapshot,
    now: NaiveDateTime,
    timing: Timing,
    state: &mut ReminderState,
) -> Vec<ReminderEvent> {
    let today = now.date();
    // Minute precision, as the alarm times
    let now = now.with_second(0).and_then(|n| n.with_nanosecond(0)).unwrap_or(now);

    let mut events = vec![];
    for course in occurrences_on(snapshot, today) {
        let Some(start) = start_time(course, &snapshot.class_times) else {
            debug!(
                "no time for section {} of {}, no alarm",
                course.first_section(),
                course.name
            );
            continue;
        };

        let Some(remind_at) = TimeDelta::try_minutes(timing.lead_minutes)
            .and_then(|lead| today.and_time(start).checked_sub_signed(lead))
        else {
            warn!("lead of {} minutes is out of range, no alarm", timing.lead_minutes);
            continue;
        };
        if (now - remind_at).num_minutes().abs() > timing.tolerance_minutes {
            continue;
        }

        let key = OccurrenceKey {
            date: today,
            course: course.name.clone(),
            first_section: course.first_section(),
        };
        if !state.fired_class_alarms.insert(key.clone()) {
            continue;
        }

        events.push(ReminderEvent::ClassAlarm(ClassAlarm {
            key,
            location: course.location.clone(),
            teacher: course.teacher.clone(),
            start,
            end: end_time(course, &snapshot.class_times),
            sections: sections_label(course),
            minutes_before: timing.lead_minutes,
        }));
    }

    events
}

/// Digest of tomorrow's courses, once per day even across restarts
///
/// `marker` holds the day of the last digest sent by any run.
pub fn day_before_digest(
    snapshot: &Snapshot,
    today: NaiveDate,
    state: &mut ReminderState,
    marker: &dyn KeyValueStore,
) -> Option<ReminderEvent> {
    let tomorrow = calendar::tomorrow(today);
    if state.last_digest == Some(tomorrow) || state.fired_digests.contains(&tomorrow) {
        return None;
    }

    let courses = occurrences_on(snapshot, tomorrow);
    if courses.is_empty() {
        return None;
    }

    let durable = marker
        .get(DIGEST_MARKER)
        .and_then(|value| parse_date(&value).ok());
    if durable == Some(tomorrow) {
        debug!("digest for {tomorrow} already sent by a previous run");
        state.last_digest = Some(tomorrow);
        return None;
    }

    if let Err(e) = marker.set(DIGEST_MARKER, &tomorrow.to_string()) {
        error!("cannot persist digest marker: {e}");
    }
    state.fired_digests.insert(tomorrow);
    state.last_digest = Some(tomorrow);

    let week = resolve(snapshot, tomorrow);
    Some(ReminderEvent::DayBeforeDigest(DayBeforeDigest {
        date: tomorrow,
        semester: week.map(|w| w.semester.name.clone()),
        week: week.map(|w| w.number),
        courses: courses
            .into_iter()
            .map(|course| DigestEntry {
                course: course.name.clone(),
                start: start_time(course, &snapshot.class_times),
                sections: sections_label(course),
                location: course.location.clone(),
            })
            .collect(),
    }))
}

/// Stateful scheduler, safe to tick from several places at once
pub struct Reminder {
    store: Arc<CalendarStore>,
    settings: Arc<dyn KeyValueStore>,
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    timing: Timing,
    state: Mutex<ReminderState>,
}

impl Reminder {
    pub fn new(
        store: Arc<CalendarStore>,
        settings: Arc<dyn KeyValueStore>,
        sink: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
        timing: Timing,
    ) -> Self {
        Self {
            store,
            settings,
            sink,
            clock,
            timing,
            state: Mutex::new(ReminderState::default()),
        }
    }

    /// Decide and emit the reminders due now
    ///
    /// The whole step holds the state lock so a forced check and the polling loop
    /// cannot both fire the same reminder.
    pub fn tick(&self) -> Vec<ReminderEvent> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = self.store.snapshot();
        let now = self.clock.now();

        let mut events = vec![];
        if self.settings.flag(DIGEST_ENABLED, true) {
            events.extend(day_before_digest(
                &snapshot,
                now.date(),
                &mut state,
                self.settings.as_ref(),
            ));
        }
        if self.settings.flag(ALARM_ENABLED, true) {
            events.extend(class_alarms(&snapshot, now, self.timing, &mut state));
        }

        for event in &events {
            info!(kind = ?event.kind(), "firing reminder");
            self.sink.notify(event.kind(), event);
        }

        events
    }

    /// Tick every `period` until Ctrl-C
    pub async fn watch(self: Arc<Self>, period: Duration) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("watching reminders every {}s", period.as_secs());

        // Listening for the whole loop, a Ctrl-C during a tick is not lost
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let reminder = Arc::clone(&self);
                    if let Err(e) = tokio::task::spawn_blocking(move || reminder.tick()).await {
                        error!("reminder tick failed: {e}");
                    }
                }
                _ = &mut ctrl_c => {
                    info!("stopping reminders");
                    break;
                }
            }
        }
    }
}
