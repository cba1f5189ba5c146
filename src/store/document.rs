//! On-disk shape of the calendar, kept apart from the typed model so that a bad
//! entry only costs that entry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::calendar::models::{
    ClassTime, Course, ImportantDate, Semester, SemesterKey, Snapshot,
};
use crate::error::{Error, Result};
use crate::utils::{format_time, parse_date, parse_time, weekday};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub school_name: String,
    #[serde(default)]
    pub academic_year: String,
    #[serde(default)]
    pub semesters: Semesters,
    /// Section => `[start, end]`
    #[serde(default)]
    pub class_times: BTreeMap<String, [String; 2]>,
    #[serde(default)]
    pub important_dates: Vec<ImportantDateEntry>,
    #[serde(default)]
    pub courses: Vec<CourseEntry>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Semesters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fall: Option<SemesterEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spring: Option<SemesterEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SemesterEntry {
    #[serde(default)]
    pub name: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportantDateEntry {
    pub date: String,
    pub event: String,
    pub category: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CourseEntry {
    pub name: String,
    pub weeks: Vec<u32>,
    pub weekday: u32,
    pub sections: Vec<u32>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub teacher: String,
    #[serde(rename = "type", default)]
    pub category: String,
}

impl SemesterEntry {
    fn to_model(&self, key: SemesterKey) -> Result<Semester> {
        let start = parse_date(&self.start_date)?;
        let end = parse_date(&self.end_date)?;
        if end < start {
            return Err(Error::SemesterOrder {
                name: self.name.clone(),
                start,
                end,
            });
        }

        Ok(Semester {
            key,
            name: self.name.clone(),
            start,
            end,
        })
    }
}

impl From<&Semester> for SemesterEntry {
    fn from(semester: &Semester) -> Self {
        Self {
            name: semester.name.clone(),
            start_date: semester.start.to_string(),
            end_date: semester.end.to_string(),
        }
    }
}

impl ImportantDateEntry {
    fn to_model(&self) -> Result<ImportantDate> {
        Ok(ImportantDate {
            date: parse_date(&self.date)?,
            event: self.event.clone(),
            category: self.category.parse()?,
        })
    }
}

impl From<&ImportantDate> for ImportantDateEntry {
    fn from(important: &ImportantDate) -> Self {
        Self {
            date: important.date.to_string(),
            event: important.event.clone(),
            category: important.category.to_string(),
        }
    }
}

impl CourseEntry {
    fn to_model(&self) -> Result<Course> {
        weekday(self.weekday)?;
        if self.sections.is_empty() {
            return Err(Error::EmptySections);
        }

        Ok(Course {
            name: self.name.clone(),
            weeks: self.weeks.iter().copied().collect(),
            weekday: self.weekday,
            sections: self.sections.clone(),
            location: self.location.clone(),
            teacher: self.teacher.clone(),
            category: self.category.clone(),
        })
    }
}

impl From<&Course> for CourseEntry {
    fn from(course: &Course) -> Self {
        Self {
            name: course.name.clone(),
            weeks: course.weeks.iter().copied().collect(),
            weekday: course.weekday,
            sections: course.sections.clone(),
            location: course.location.clone(),
            teacher: course.teacher.clone(),
            category: course.category.clone(),
        }
    }
}

fn class_time(section: &str, [start, end]: &[String; 2]) -> Result<(u32, ClassTime)> {
    let number = section
        .trim()
        .parse()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| Error::Range {
            input: section.to_owned(),
            reason: "a section is a positive number".to_owned(),
        })?;

    Ok((
        number,
        ClassTime {
            start: parse_time(start)?,
            end: parse_time(end)?,
        },
    ))
}

/// Keep the valid entries, log and drop the others
fn keep_valid<T, U>(
    what: &str,
    entries: impl IntoIterator<Item = T>,
    convert: impl Fn(T) -> Result<U>,
) -> impl Iterator<Item = U> {
    let what = what.to_owned();
    entries
        .into_iter()
        .filter_map(move |entry| match convert(entry) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("ignoring {what}: {e}");
                None
            }
        })
}

impl Document {
    pub fn into_snapshot(self) -> Snapshot {
        let semesters = [
            (SemesterKey::Fall, &self.semesters.fall),
            (SemesterKey::Spring, &self.semesters.spring),
        ];

        Snapshot {
            semesters: keep_valid(
                "semester",
                semesters
                    .into_iter()
                    .filter_map(|(key, entry)| entry.as_ref().map(|e| (key, e))),
                |(key, entry)| entry.to_model(key),
            )
            .collect(),
            class_times: keep_valid("class time", &self.class_times, |(section, times)| {
                class_time(section, times)
            })
            .collect(),
            important_dates: keep_valid(
                "important date",
                &self.important_dates,
                ImportantDateEntry::to_model,
            )
            .collect(),
            courses: keep_valid("course", &self.courses, CourseEntry::to_model).collect(),
            school_name: self.school_name,
            academic_year: self.academic_year,
        }
    }
}

impl From<&Snapshot> for Document {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            school_name: snapshot.school_name.clone(),
            academic_year: snapshot.academic_year.clone(),
            semesters: Semesters {
                fall: snapshot.semester(SemesterKey::Fall).map(Into::into),
                spring: snapshot.semester(SemesterKey::Spring).map(Into::into),
            },
            class_times: snapshot
                .class_times
                .iter()
                .map(|(section, time)| {
                    (
                        section.to_string(),
                        [format_time(time.start), format_time(time.end)],
                    )
                })
                .collect(),
            important_dates: snapshot.important_dates.iter().map(Into::into).collect(),
            courses: snapshot.courses.iter().map(Into::into).collect(),
        }
    }
}
