//! Course roster import.
//!
//! A roster is a CSV file with a header line then one course per row, columns in
//! this order: name, teacher, location, weekday, sections, weeks. Empty sections
//! default to `1-2` and empty weeks to `1-16`.

use std::collections::BTreeSet;
use std::io;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, warn};

use crate::calendar::models::Course;
use crate::error::Result;
use crate::utils::{parse_range, parse_weekday};

/// Category given to imported courses
pub const IMPORTED: &str = "imported";

/// Courses read from a roster
#[derive(Debug, Default)]
pub struct Roster {
    pub courses: Vec<Course>,
    /// Rows left out because of a bad weekday, section or week
    pub rejected: usize,
}

pub fn read(path: &Path) -> Result<Roster> {
    read_from(std::fs::File::open(path)?)
}

pub fn read_from(reader: impl io::Read) -> Result<Roster> {
    let mut csv = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut roster = Roster::default();
    for record in csv.records() {
        let record = match record {
            Ok(record) => record,
            // Only the row is unreadable, the reader goes on with the next one
            Err(e) if !e.is_io_error() => {
                warn!("ignoring roster row: {e}");
                roster.rejected += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let line = record.position().map_or(0, csv::Position::line);

        match course(&record) {
            Ok(Some(course)) => roster.courses.push(course),
            Ok(None) => debug!("skipping roster line {line} without a name"),
            Err(e) => {
                warn!("ignoring roster line {line}: {e}");
                roster.rejected += 1;
            }
        }
    }

    Ok(roster)
}

fn course(record: &StringRecord) -> Result<Option<Course>> {
    let field = |index| record.get(index).unwrap_or_default();

    let name = field(0);
    if name.is_empty() {
        return Ok(None);
    }

    let sections = match field(4) {
        "" => BTreeSet::from([1, 2]),
        text => parse_range(text)?,
    };
    let weeks = match field(5) {
        "" => (1..=16).collect(),
        text => parse_range(text)?,
    };

    Ok(Some(Course {
        name: name.to_owned(),
        weeks,
        weekday: parse_weekday(field(3))?,
        sections: sections.into_iter().collect(),
        location: field(2).to_owned(),
        teacher: field(1).to_owned(),
        category: IMPORTED.to_owned(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROSTER: &str = "\
课程名,教师,教室,星期,节次,周次
Linear algebra, Dr. Li, Building B 204, 周二, 3-4, 1-8
Databases,,Lab 3,5,,
,nobody,nowhere,1,1,1
Broken day,Dr. X,Room,someday,1-2,1-16
Broken weeks,Dr. Y,Room,1,1-2,8-1
Short row,Dr. Z
";

    #[test]
    fn good_rows_imported_bad_rows_counted() {
        let roster = read_from(ROSTER.as_bytes()).unwrap();

        let names: Vec<_> = roster.courses.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Linear algebra", "Databases"]);
        // Two bad values and a row missing its weekday
        assert_eq!(roster.rejected, 3);

        let algebra = &roster.courses[0];
        assert_eq!(algebra.teacher, "Dr. Li");
        assert_eq!(algebra.location, "Building B 204");
        assert_eq!(algebra.weekday, 2);
        assert_eq!(algebra.sections, vec![3, 4]);
        assert_eq!(algebra.weeks, (1..=8).collect::<BTreeSet<_>>());
        assert_eq!(algebra.category, IMPORTED);

        let databases = &roster.courses[1];
        assert_eq!(databases.weekday, 5);
        assert_eq!(databases.sections, vec![1, 2]);
        assert_eq!(databases.weeks.len(), 16);
        assert_eq!(databases.teacher, "");
    }

    #[test]
    fn read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.csv");
        std::fs::write(&path, ROSTER).unwrap();

        assert_eq!(read(&path).unwrap().courses.len(), 2);
        assert!(read(&dir.path().join("missing.csv")).is_err());
    }
}
