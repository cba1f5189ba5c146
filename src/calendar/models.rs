use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};

use crate::error::Error;

/// Which semester slot of the academic year
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SemesterKey {
    Fall,
    Spring,
}

impl SemesterKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fall => "fall",
            Self::Spring => "spring",
        }
    }
}

impl FromStr for SemesterKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fall" | "autumn" | "1" => Ok(Self::Fall),
            "spring" | "2" => Ok(Self::Spring),
            _ => Err(Error::Semester(s.to_owned())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Semester {
    pub key: SemesterKey,

    /// Semester's name, shown to the user
    pub name: String,

    /// First day of week 1
    pub start: NaiveDate,

    /// Last day of the semester, included
    pub end: NaiveDate,
}

impl Semester {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Time slot of a section in the day
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClassTime {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Section number => time slot
pub type ClassTimes = BTreeMap<u32, ClassTime>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Vacation,
    TermStart,
    Registration,
    Class,
    Holiday,
    Practice,
    Exam,
}

impl Category {
    pub const ALL: [Self; 7] = [
        Self::Vacation,
        Self::TermStart,
        Self::Registration,
        Self::Class,
        Self::Holiday,
        Self::Practice,
        Self::Exam,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vacation => "vacation",
            Self::TermStart => "term-start",
            Self::Registration => "registration",
            Self::Class => "class",
            Self::Holiday => "holiday",
            Self::Practice => "practice",
            Self::Exam => "exam",
        }
    }

    /// Label used by calendars written in chinese
    fn chinese(self) -> &'static str {
        match self {
            Self::Vacation => "假期",
            Self::TermStart => "开学",
            Self::Registration => "注册",
            Self::Class => "上课",
            Self::Holiday => "节日",
            Self::Practice => "实践",
            Self::Exam => "考试",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['_', ' '], "-");
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == wanted || category.chinese() == s.trim())
            .ok_or_else(|| Error::Category(s.to_owned()))
    }
}

/// One-off date of the academic year
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportantDate {
    pub date: NaiveDate,
    pub event: String,
    pub category: Category,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Course {
    /// Course's name
    pub name: String,

    /// Academic weeks where the course takes place, starting at 1
    pub weeks: BTreeSet<u32>,

    /// Day of the week, 1 is monday and 7 is sunday
    pub weekday: u32,

    /// Sections the course takes up, never empty
    pub sections: Vec<u32>,

    /// Room where the course takes place
    pub location: String,

    /// Professor's name
    pub teacher: String,

    /// Free-form kind of course (mandatory, elective...)
    pub category: String,
}

impl Course {
    /// Section used to order the courses of a day and to identify an occurrence
    pub fn first_section(&self) -> u32 {
        self.sections.first().copied().unwrap_or_default()
    }

    pub fn last_section(&self) -> u32 {
        self.sections.last().copied().unwrap_or_default()
    }
}

/// Everything known about the academic year at one point in time
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub school_name: String,
    pub academic_year: String,
    /// Ordered by priority, the first semester containing a date wins
    pub semesters: Vec<Semester>,
    pub class_times: ClassTimes,
    pub important_dates: Vec<ImportantDate>,
    pub courses: Vec<Course>,
}

impl Snapshot {
    pub fn semester(&self, key: SemesterKey) -> Option<&Semester> {
        self.semesters.iter().find(|semester| semester.key == key)
    }

    /// Remove the courses with this name, only on `weekday` when given
    pub fn remove_course(&mut self, name: &str, weekday: Option<u32>) -> Result<usize, Error> {
        let before = self.courses.len();
        self.courses.retain(|course| {
            course.name != name || weekday.is_some_and(|day| course.weekday != day)
        });

        match before - self.courses.len() {
            0 => Err(Error::NotFound {
                what: "course",
                query: weekday.map_or_else(|| name.to_owned(), |day| format!("{name} (day {day})")),
            }),
            removed => Ok(removed),
        }
    }

    /// Remove the important dates of a day, only the `event` one when given
    pub fn remove_date(&mut self, date: NaiveDate, event: Option<&str>) -> Result<usize, Error> {
        let before = self.important_dates.len();
        self.important_dates.retain(|important| {
            important.date != date || event.is_some_and(|event| important.event != event)
        });

        match before - self.important_dates.len() {
            0 => Err(Error::NotFound {
                what: "important date",
                query: event.map_or_else(|| date.to_string(), |event| format!("{date} {event}")),
            }),
            removed => Ok(removed),
        }
    }

    /// Insert or replace a semester, keeping the priority order
    pub fn set_semester(&mut self, semester: Semester) {
        self.semesters.retain(|s| s.key != semester.key);
        self.semesters.push(semester);
        self.semesters.sort_by_key(|s| s.key);
    }
}

/// Position of a date in the academic year
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Week<'a> {
    pub semester: &'a Semester,
    /// Week number, starting at 1 on the first day of the semester
    pub number: u32,
}
