/// Errors raised while parsing user input or touching the data files
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed section/week range, i.e. `1-`, `3-1` or `a,b`
    #[error("invalid range `{input}`: {reason}")]
    Range { input: String, reason: String },

    #[error("invalid date `{0}`, expected YYYY-MM-DD")]
    Date(String),

    #[error("invalid time `{0}`, expected HH:MM")]
    Time(String),

    #[error("weekday must be between 1 (monday) and 7 (sunday), got {0}")]
    Weekday(u32),

    #[error("unknown weekday `{0}`")]
    WeekdayName(String),

    #[error("a course needs at least one section")]
    EmptySections,

    #[error("unknown semester `{0}`, expected `fall` or `spring`")]
    Semester(String),

    #[error("unknown category `{0}`")]
    Category(String),

    #[error("semester `{name}` ends ({end}) before it starts ({start})")]
    SemesterOrder {
        name: String,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("no {what} matches `{query}`")]
    NotFound { what: &'static str, query: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
