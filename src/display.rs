use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use chrono::NaiveDate;

use crate::calendar::models::{Course, Snapshot};
use crate::calendar::{self, important_dates_on, next_semester, occurrences_on, resolve};
use crate::utils::{etc_str, format_time, sections_label, time_window, UNKNOWN_TIME};

/// Width of the section column
const SECTION_CELL: usize = 11;
/// Width of a day column
const DAY_CELL: usize = 12;
const DAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

const VERTICAL: char = '│';
const HORIZONTAL: char = '─';

/// Horizontal rule of the week grid
enum Rule {
    Top,
    Middle,
    Bottom,
}

impl Rule {
    /// Left end, crossing with a column, right end
    fn corners(&self) -> [char; 3] {
        match self {
            Self::Top => ['┌', '┬', '┐'],
            Self::Middle => ['├', '┼', '┤'],
            Self::Bottom => ['└', '┴', '┘'],
        }
    }
}

/// Where the date stands in the academic year
pub fn position(snapshot: &Snapshot, date: NaiveDate) -> String {
    match resolve(snapshot, date) {
        Some(week) => format!("{} week {}", week.semester.name, week.number),
        None => match next_semester(snapshot, date) {
            Some((semester, days)) => {
                format!("vacation, {days} days until the {}", semester.name)
            }
            None => "vacation".to_owned(),
        },
    }
}

/// Summary of a day: position, important dates and courses
pub fn day(snapshot: &Snapshot, date: NaiveDate) -> String {
    let mut out = format!(
        "{} | {}\n",
        date.format("%a %d %B %Y"),
        position(snapshot, date)
    );

    for important in important_dates_on(snapshot, date) {
        let _ = writeln!(out, "  * {} ({})", important.event, important.category);
    }

    let courses = occurrences_on(snapshot, date);
    if courses.is_empty() {
        let _ = writeln!(out, "No course");
    } else {
        let _ = writeln!(out, "{} course(s):", courses.len());
        for course in courses {
            let _ = writeln!(out, "{}", course_line(snapshot, course));
        }
    }

    out
}

fn course_line(snapshot: &Snapshot, course: &Course) -> String {
    let mut line = format!(
        "  - {} {} ({})",
        time_window(course, &snapshot.class_times),
        course.name,
        sections_label(course)
    );
    if !course.location.is_empty() {
        let _ = write!(line, " @ {}", course.location);
    }
    if !course.teacher.is_empty() {
        let _ = write!(line, " - {}", course.teacher);
    }

    line
}

/// Dates, length and number of class days of each semester
pub fn semesters(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    for semester in &snapshot.semesters {
        let weeks = (semester.end.signed_duration_since(semester.start).num_days() + 7) / 7;
        let _ = writeln!(
            out,
            "{}: {} to {}, {weeks} weeks, {} class days",
            semester.name,
            semester.start,
            semester.end,
            calendar::class_days(snapshot, semester).count()
        );
    }

    out
}

/// Important dates of the year with their academic week
pub fn events(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    for (important, week) in calendar::timeline(snapshot) {
        let week = week.map_or_else(|| "-".to_owned(), |w| format!("week {}", w.number));
        let _ = writeln!(
            out,
            "{} {:>8}  {:<13} {}",
            important.date, week, important.category, important.event
        );
    }

    out
}

fn draw_rule(out: &mut String, rule: &Rule) {
    let [left, cross, right] = rule.corners();

    out.push(left);
    out.extend(std::iter::repeat(HORIZONTAL).take(SECTION_CELL));
    for _ in DAYS {
        out.push(cross);
        out.extend(std::iter::repeat(HORIZONTAL).take(DAY_CELL));
    }
    out.push(right);
    out.push('\n');
}

/// Timetable of an academic week, sections by weekdays
pub fn week(snapshot: &Snapshot, number: u32) -> String {
    let sep = VERTICAL;

    // (section, weekday) => course
    let mut cells = BTreeMap::new();
    for course in calendar::courses_in_week(snapshot, number) {
        for section in &course.sections {
            cells.entry((*section, course.weekday)).or_insert(course);
        }
    }

    let sections: BTreeSet<u32> = snapshot
        .class_times
        .keys()
        .copied()
        .chain(cells.keys().map(|(section, _)| *section))
        .collect();

    let mut out = format!("Week {number}\n");
    draw_rule(&mut out, &Rule::Top);
    let _ = write!(out, "{sep}{:^SECTION_CELL$}", "");
    for name in DAYS {
        let _ = write!(out, "{sep}{name:^DAY_CELL$}");
    }
    let _ = writeln!(out, "{sep}");

    for section in sections {
        draw_rule(&mut out, &Rule::Middle);

        let start = snapshot
            .class_times
            .get(&section)
            .map_or_else(|| UNKNOWN_TIME.to_owned(), |time| format_time(time.start));
        let _ = write!(out, "{sep}{:^SECTION_CELL$}", format!("{section:>2} {start}"));

        for weekday in 1..=7 {
            let name = cells
                .get(&(section, weekday))
                .map(|course| etc_str(&course.name, DAY_CELL - 2))
                .unwrap_or_default();
            let _ = write!(out, "{sep}{name:^DAY_CELL$}");
        }
        let _ = writeln!(out, "{sep}");
    }
    draw_rule(&mut out, &Rule::Bottom);

    out
}
