use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, warn};

use crate::calendar::models::{
    Category, ClassTime, Course, ImportantDate, Semester, SemesterKey, Snapshot,
};
use crate::error::Result;
use crate::utils::{parse_date, parse_time};

pub mod document;

use document::Document;

/// Owner of the current calendar snapshot
///
/// Readers get an `Arc` to a snapshot that never changes under them. Every change
/// builds a new snapshot, writes it to disk when the store has a file, and swaps it in.
#[derive(Debug)]
pub struct CalendarStore {
    current: RwLock<Arc<Snapshot>>,
    path: Option<PathBuf>,
}

impl CalendarStore {
    /// Store living only in memory
    pub fn in_memory(snapshot: Snapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
            path: None,
        }
    }

    /// Store backed by a file, starting from the built-in calendar when the file
    /// is missing or unreadable
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let snapshot = load(&path);

        Self {
            current: RwLock::new(Arc::new(snapshot)),
            path: Some(path),
        }
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap the whole calendar
    pub fn replace(&self, snapshot: Snapshot) -> Result<()> {
        self.update(|current| {
            *current = snapshot;
            Ok(())
        })
    }

    /// Change a copy of the calendar, save it then publish it
    ///
    /// Nothing is published when `change` or the save fails.
    pub fn update(&self, change: impl FnOnce(&mut Snapshot) -> Result<()>) -> Result<()> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);

        let mut next = Snapshot::clone(&current);
        change(&mut next)?;
        if let Some(path) = &self.path {
            save(path, &next)?;
        }
        *current = Arc::new(next);

        Ok(())
    }

    /// Go back to the built-in calendar
    pub fn reset(&self) -> Result<()> {
        info!("resetting calendar to the built-in data");
        self.replace(default_snapshot())
    }
}

/// Read a calendar file, falling back to the built-in calendar
pub fn load(path: &Path) -> Snapshot {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("no calendar at {}, using built-in data", path.display());
            return default_snapshot();
        }
        Err(e) => {
            warn!("cannot read calendar {}: {e}", path.display());
            return default_snapshot();
        }
    };

    match serde_json::from_slice::<Document>(&bytes) {
        Ok(document) => {
            debug!("loaded calendar from {}", path.display());
            document.into_snapshot()
        }
        Err(e) => {
            warn!("cannot parse calendar {}: {e}", path.display());
            default_snapshot()
        }
    }
}

/// Write a calendar file, creating its directory when needed
pub fn save(path: &Path, snapshot: &Snapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(&Document::from(snapshot))?;
    std::fs::write(path, json)?;
    debug!("saved calendar to {}", path.display());

    Ok(())
}

/// Sample calendar used on first run and after a reset
pub fn default_snapshot() -> Snapshot {
    let date = |text: &str| parse_date(text).unwrap_or_default();
    let time = |text: &str| parse_time(text).unwrap_or_default();

    let class_times = [
        ("08:00", "08:50"),
        ("08:55", "09:45"),
        ("10:05", "10:55"),
        ("11:00", "11:50"),
        ("14:00", "14:50"),
        ("14:55", "15:45"),
        ("16:05", "16:55"),
        ("17:00", "17:50"),
        ("19:00", "19:50"),
        ("19:55", "20:45"),
    ];

    let important_dates = [
        ("2025-09-05", "Staff back at school", Category::TermStart),
        ("2025-09-08", "Classes begin", Category::Class),
        ("2025-10-01", "National day", Category::Holiday),
        ("2026-01-01", "New year's day", Category::Holiday),
        ("2026-01-19", "Winter break begins", Category::Vacation),
        ("2026-02-17", "Spring festival", Category::Holiday),
        ("2026-03-02", "Classes begin", Category::Class),
        ("2026-05-01", "Labour day", Category::Holiday),
    ];

    Snapshot {
        school_name: "Sample school".to_owned(),
        academic_year: "2025-2026".to_owned(),
        semesters: vec![
            Semester {
                key: SemesterKey::Fall,
                name: "Fall semester".to_owned(),
                start: date("2025-09-08"),
                end: date("2026-01-18"),
            },
            Semester {
                key: SemesterKey::Spring,
                name: "Spring semester".to_owned(),
                start: date("2026-03-02"),
                end: date("2026-07-12"),
            },
        ],
        class_times: (1..)
            .zip(class_times)
            .map(|(section, (start, end))| {
                (
                    section,
                    ClassTime {
                        start: time(start),
                        end: time(end),
                    },
                )
            })
            .collect(),
        important_dates: important_dates
            .into_iter()
            .map(|(day, event, category)| ImportantDate {
                date: date(day),
                event: event.to_owned(),
                category,
            })
            .collect(),
        courses: vec![Course {
            name: "Sample course".to_owned(),
            weeks: (1..=5).collect(),
            weekday: 1,
            sections: vec![1, 2],
            location: "Building A, room 101".to_owned(),
            teacher: "Pr. Zhang".to_owned(),
            category: "mandatory".to_owned(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{self, occurrences_on};

    #[test]
    fn missing_file_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = CalendarStore::open(dir.path().join("calendar_data.json"));

        assert_eq!(*store.snapshot(), default_snapshot());
    }

    #[test]
    fn malformed_file_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calendar_data.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert_eq!(load(&path), default_snapshot());
    }

    #[test]
    fn bad_entries_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calendar_data.json");
        std::fs::write(
            &path,
            r#"{
                "school_name": "Test",
                "semesters": {
                    "fall": { "name": "Fall", "start_date": "2025-09-08", "end_date": "2026-01-18" },
                    "spring": { "name": "Spring", "start_date": "2026-13-01", "end_date": "2026-07-12" }
                },
                "class_times": { "1": ["08:00", "08:50"], "2": ["8am", "09:45"], "0": ["10:00", "10:50"] },
                "important_dates": [
                    { "date": "2025-10-01", "event": "National day", "category": "节日" },
                    { "date": "2025-10-02", "event": "Party", "category": "party" }
                ],
                "courses": [
                    { "name": "Maths", "weeks": [1, 2], "weekday": 1, "sections": [1, 2], "type": "mandatory" },
                    { "name": "Ghost", "weeks": [1], "weekday": 8, "sections": [1] },
                    { "name": "Empty", "weeks": [1], "weekday": 2, "sections": [] }
                ]
            }"#,
        )
        .unwrap();

        let snapshot = load(&path);
        assert_eq!(snapshot.school_name, "Test");
        assert_eq!(snapshot.semesters.len(), 1);
        assert_eq!(snapshot.class_times.len(), 1);
        assert_eq!(snapshot.important_dates.len(), 1);
        assert_eq!(snapshot.important_dates[0].category, Category::Holiday);
        assert_eq!(snapshot.courses.len(), 1);
        assert_eq!(snapshot.courses[0].location, "");
    }

    #[test]
    fn save_then_load_keeps_occurrences() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("calendar_data.json");

        let mut snapshot = default_snapshot();
        snapshot.courses.push(Course {
            name: "Evening lab".to_owned(),
            weeks: [2, 4, 6, 8].into_iter().collect(),
            weekday: 4,
            sections: vec![9, 10],
            location: "Lab".to_owned(),
            teacher: "Dr. Li".to_owned(),
            category: "practice".to_owned(),
        });
        save(&path, &snapshot).unwrap();
        let loaded = load(&path);

        assert_eq!(loaded, snapshot);
        for semester in &snapshot.semesters {
            for day in calendar::days(semester) {
                assert_eq!(
                    occurrences_on(&loaded, day),
                    occurrences_on(&snapshot, day),
                    "{day}"
                );
            }
        }
    }

    #[test]
    fn update_publishes_a_new_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calendar_data.json");
        let store = CalendarStore::open(&path);

        let before = store.snapshot();
        store
            .update(|snapshot| {
                snapshot.school_name = "Other school".to_owned();
                Ok(())
            })
            .unwrap();

        // Old readers keep their consistent view
        assert_eq!(before.school_name, "Sample school");
        assert_eq!(store.snapshot().school_name, "Other school");
        assert_eq!(load(&path).school_name, "Other school");
    }

    #[test]
    fn failed_update_changes_nothing() {
        let store = CalendarStore::in_memory(default_snapshot());

        let result = store.update(|snapshot| {
            snapshot.courses.clear();
            Err(crate::error::Error::EmptySections)
        });

        assert!(result.is_err());
        assert_eq!(store.snapshot().courses.len(), 1);
    }

    #[test]
    fn remove_one_course() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calendar_data.json");
        let store = CalendarStore::open(&path);
        store
            .update(|snapshot| {
                let mut tuesday = snapshot.courses[0].clone();
                tuesday.weekday = 2;
                snapshot.courses.push(tuesday);
                Ok(())
            })
            .unwrap();

        let mut removed = 0;
        store
            .update(|snapshot| {
                removed = snapshot.remove_course("Sample course", Some(2))?;
                Ok(())
            })
            .unwrap();

        assert_eq!(removed, 1);
        assert_eq!(store.snapshot().courses.len(), 1);
        assert_eq!(store.snapshot().courses[0].weekday, 1);
        assert_eq!(load(&path).courses.len(), 1);
    }

    #[test]
    fn removing_unknown_course_fails() {
        let store = CalendarStore::in_memory(default_snapshot());

        let result = store.update(|snapshot| snapshot.remove_course("Nope", None).map(drop));
        assert!(matches!(
            result,
            Err(crate::error::Error::NotFound { what: "course", .. })
        ));
        // Right name, wrong day
        assert!(store
            .update(|snapshot| snapshot.remove_course("Sample course", Some(3)).map(drop))
            .is_err());
        assert_eq!(*store.snapshot(), default_snapshot());
    }

    #[test]
    fn remove_dates_of_a_day() {
        let store = CalendarStore::in_memory(default_snapshot());
        let day = parse_date("2025-10-01").unwrap();
        store
            .update(|snapshot| {
                snapshot.important_dates.push(ImportantDate {
                    date: day,
                    event: "Sports day".to_owned(),
                    category: Category::Practice,
                });
                Ok(())
            })
            .unwrap();

        store
            .update(|snapshot| snapshot.remove_date(day, Some("Sports day")).map(drop))
            .unwrap();
        let events: Vec<_> = store
            .snapshot()
            .important_dates
            .iter()
            .filter(|important| important.date == day)
            .map(|important| important.event.clone())
            .collect();
        assert_eq!(events, vec!["National day"]);

        store
            .update(|snapshot| snapshot.remove_date(day, None).map(drop))
            .unwrap();
        assert_eq!(store.snapshot().important_dates.len(), 7);
        assert!(store
            .update(|snapshot| snapshot.remove_date(day, None).map(drop))
            .is_err());
    }

    #[test]
    fn reset_restores_default() {
        let store = CalendarStore::in_memory(Snapshot::default());
        store.reset().unwrap();

        assert_eq!(*store.snapshot(), default_snapshot());
    }
}
