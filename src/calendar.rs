use chrono::{Datelike, Days, NaiveDate};

use crate::calendar::models::{Course, ImportantDate, Semester, Snapshot, Week};

pub mod models;

/// Find the academic week of a date
///
/// Semesters are checked in priority order and the first one containing the date wins,
/// overlapping semesters are not rejected. `None` means vacation.
pub fn resolve(snapshot: &Snapshot, date: NaiveDate) -> Option<Week<'_>> {
    snapshot
        .semesters
        .iter()
        .find(|semester| semester.contains(date))
        .map(|semester| {
            let days = date.signed_duration_since(semester.start).num_days();
            Week {
                semester,
                // Non-negative since the semester contains the date
                number: u32::try_from(days / 7).unwrap_or_default() + 1,
            }
        })
}

/// Courses taking place on a date, ordered by their first section
pub fn occurrences_on(snapshot: &Snapshot, date: NaiveDate) -> Vec<&Course> {
    let Some(week) = resolve(snapshot, date) else {
        return vec![];
    };
    let weekday = date.weekday().number_from_monday();

    let mut courses: Vec<_> = snapshot
        .courses
        .iter()
        .filter(|course| course.weekday == weekday && course.weeks.contains(&week.number))
        .collect();
    // Stable, courses sharing a first section keep the roster order
    courses.sort_by_key(|course| course.first_section());

    courses
}

/// Important dates falling on a date
pub fn important_dates_on(snapshot: &Snapshot, date: NaiveDate) -> Vec<&ImportantDate> {
    snapshot
        .important_dates
        .iter()
        .filter(|important| important.date == date)
        .collect()
}

/// Every important date sorted by date, with its academic week when it has one
pub fn timeline(snapshot: &Snapshot) -> Vec<(&ImportantDate, Option<Week<'_>>)> {
    let mut dates: Vec<_> = snapshot
        .important_dates
        .iter()
        .map(|important| (important, resolve(snapshot, important.date)))
        .collect();
    dates.sort_by_key(|(important, _)| important.date);

    dates
}

/// Next semester starting after a date, with the number of days to wait
pub fn next_semester(snapshot: &Snapshot, date: NaiveDate) -> Option<(&Semester, i64)> {
    snapshot
        .semesters
        .iter()
        .filter(|semester| semester.start > date)
        .min_by_key(|semester| semester.start)
        .map(|semester| (semester, semester.start.signed_duration_since(date).num_days()))
}

/// Every day of the semester, in order
pub fn days(semester: &Semester) -> impl Iterator<Item = NaiveDate> + '_ {
    semester
        .start
        .iter_days()
        .take_while(move |date| *date <= semester.end)
}

/// Days of the semester with at least one course
pub fn class_days<'a>(
    snapshot: &'a Snapshot,
    semester: &'a Semester,
) -> impl Iterator<Item = NaiveDate> + 'a {
    days(semester).filter(move |date| !occurrences_on(snapshot, *date).is_empty())
}

/// Courses of an academic week, whatever the day
pub fn courses_in_week(snapshot: &Snapshot, week: u32) -> Vec<&Course> {
    snapshot
        .courses
        .iter()
        .filter(|course| course.weeks.contains(&week))
        .collect()
}

pub fn tomorrow(date: NaiveDate) -> NaiveDate {
    date.checked_add_days(Days::new(1)).unwrap_or(date)
}
