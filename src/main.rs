use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context as _, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use dialoguer::Confirm;

use calendar::models::{Course, ImportantDate, Semester, SemesterKey};
use clock::{Clock, ManualClock, SystemClock};
use config::Paths;
use kv::{JsonFileStore, KeyValueStore, MemoryStore};
use notify::TerminalSink;
use reminder::{Reminder, Timing, ALARM_ENABLED, DIGEST_ENABLED};
use roster::Roster;
use store::CalendarStore;

mod calendar;
mod clock;
mod config;
mod display;
mod error;
mod ics;
mod kv;
mod notify;
mod reminder;
mod roster;
mod store;
mod utils;

#[derive(Parser)]
#[clap(version, about, long_about = None)]
struct Args {
    /// Directory of the calendar and settings files
    #[clap(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Log level, overridden by RUST_LOG
    #[clap(long, global = true, default_value = "warn", value_name = "LEVEL")]
    log_level: String,

    /// Don't write anything to the data directory
    #[clap(long, global = true)]
    ephemeral: bool,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Args)]
struct TimingArgs {
    /// Minutes between the alarm and the class, up to a day
    #[clap(long, default_value_t = 30, value_name = "MINUTES",
        value_parser = clap::value_parser!(i64).range(0..=1440))]
    lead: i64,

    /// Accepted lateness of a tick in minutes, up to an hour
    #[clap(long, default_value_t = 1, value_name = "MINUTES",
        value_parser = clap::value_parser!(i64).range(0..=60))]
    tolerance: i64,
}

impl From<&TimingArgs> for Timing {
    fn from(args: &TimingArgs) -> Self {
        Self {
            lead_minutes: args.lead,
            tolerance_minutes: args.tolerance,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Current week and today's courses (default)
    Today,

    /// Week, important dates and courses of a date
    Day {
        /// Date as YYYY-MM-DD
        date: NaiveDate,
    },

    /// Timetable of an academic week, the current one by default
    Week { number: Option<u32> },

    /// Semesters and important dates of the year
    Events,

    /// Fire the reminders due now, once
    Check {
        /// Pretend it is this local time (i.e. 2025-09-08T09:15:00), settings are not saved
        #[clap(long, value_name = "DATETIME")]
        at: Option<NaiveDateTime>,

        #[clap(flatten)]
        timing: TimingArgs,
    },

    /// Fire reminders until Ctrl-C
    Watch {
        /// Seconds between two checks
        #[clap(short, long, default_value_t = 60, value_name = "SECONDS")]
        interval: u64,

        #[clap(flatten)]
        timing: TimingArgs,

        /// Don't ring the terminal bell
        #[clap(long)]
        no_bell: bool,
    },

    /// Export courses and important dates to iCalendar format (.ics)
    Export {
        #[clap(value_name = "FILE NAME")]
        file: PathBuf,
    },

    /// Add a recurring course
    AddCourse {
        name: String,

        /// Day of the week, 1 is monday and 7 is sunday
        #[clap(short, long)]
        weekday: u32,

        /// Sections, i.e. `1-2` or `3,5`
        #[clap(short, long)]
        sections: String,

        /// Weeks, i.e. `1-16` or `1,3,5`
        #[clap(long)]
        weeks: String,

        #[clap(short, long, default_value = "")]
        location: String,

        #[clap(short, long, default_value = "")]
        teacher: String,

        #[clap(short, long, default_value = "course")]
        category: String,
    },

    /// Add the courses of a CSV roster: name, teacher, location, weekday, sections, weeks
    Import {
        #[clap(value_name = "FILE NAME")]
        file: PathBuf,
    },

    /// Remove a course
    RemoveCourse {
        name: String,

        /// Only on this day of the week, 1 is monday
        #[clap(short, long)]
        weekday: Option<u32>,
    },

    /// Add an important date
    AddDate {
        date: NaiveDate,
        event: String,

        /// vacation, term-start, registration, class, holiday, practice or exam
        #[clap(short, long, default_value = "holiday")]
        category: String,
    },

    /// Remove the important dates of a day
    RemoveDate {
        date: NaiveDate,

        /// Only the date with this event
        event: Option<String>,
    },

    /// Set the dates of a semester
    SetSemester {
        /// fall or spring
        semester: SemesterKey,
        start: NaiveDate,
        end: NaiveDate,

        #[clap(short, long)]
        name: Option<String>,
    },

    /// Set the school's name and academic year
    SetSchool { name: String, year: String },

    /// Remove every course
    ClearCourses {
        /// Don't ask for confirmation
        #[clap(short, long)]
        yes: bool,
    },

    /// Show or change which reminders are enabled
    Reminders {
        /// 30 minutes before class alarm
        #[clap(long)]
        alarm: Option<bool>,

        /// Digest of tomorrow's courses
        #[clap(long)]
        day_before: Option<bool>,
    },

    /// Go back to the built-in calendar
    Reset {
        /// Don't ask for confirmation
        #[clap(short, long)]
        yes: bool,
    },
}

/// Calendar and settings, on disk or in memory
struct Stores {
    store: Arc<CalendarStore>,
    settings: Arc<dyn KeyValueStore>,
}

impl Stores {
    fn open(paths: &Paths, ephemeral: bool) -> Self {
        if ephemeral {
            Self {
                store: Arc::new(CalendarStore::in_memory(store::load(&paths.calendar()))),
                settings: Arc::new(MemoryStore::default()),
            }
        } else {
            Self {
                store: Arc::new(CalendarStore::open(paths.calendar())),
                settings: Arc::new(JsonFileStore::open(paths.settings())),
            }
        }
    }
}

fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }

    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    config::init_logging(&args.log_level);

    let paths = Paths::resolve(args.data_dir);
    let ctx = Stores::open(&paths, args.ephemeral);

    match args.command.unwrap_or(Command::Today) {
        Command::Today => {
            let snapshot = ctx.store.snapshot();
            println!("{} {}", snapshot.school_name, snapshot.academic_year);
            print!("{}", display::day(&snapshot, today()));
        }
        Command::Day { date } => print!("{}", display::day(&ctx.store.snapshot(), date)),
        Command::Week { number } => {
            let snapshot = ctx.store.snapshot();
            // Outside of a semester show the first week
            let number = number
                .or_else(|| calendar::resolve(&snapshot, today()).map(|week| week.number))
                .unwrap_or(1);
            print!("{}", display::week(&snapshot, number));
        }
        Command::Events => {
            let snapshot = ctx.store.snapshot();
            print!("{}", display::semesters(&snapshot));
            print!("{}", display::events(&snapshot));
        }
        Command::Check { at, timing } => {
            // A simulated time keeps the toggles but not the real digest marker
            let (clock, settings): (Arc<dyn Clock>, Arc<dyn KeyValueStore>) = match at {
                Some(at) => (
                    Arc::new(ManualClock::new(at)) as Arc<dyn Clock>,
                    Arc::new(MemoryStore::seeded(
                        ctx.settings.as_ref(),
                        &[ALARM_ENABLED, DIGEST_ENABLED],
                    )?) as Arc<dyn KeyValueStore>,
                ),
                None => (Arc::new(SystemClock) as Arc<dyn Clock>, ctx.settings),
            };
            let reminder = Reminder::new(
                ctx.store,
                settings,
                Arc::new(TerminalSink { bell: false }),
                clock,
                (&timing).into(),
            );

            if reminder.tick().is_empty() {
                println!("Nothing to remind");
            }
        }
        Command::Watch {
            interval,
            timing,
            no_bell,
        } => {
            if interval == 0 {
                bail!("the interval must be at least one second");
            }

            let reminder = Arc::new(Reminder::new(
                ctx.store,
                ctx.settings,
                Arc::new(TerminalSink { bell: !no_bell }),
                Arc::new(SystemClock),
                (&timing).into(),
            ));
            reminder.watch(Duration::from_secs(interval)).await;
        }
        Command::Export { file } => {
            ics::export(&ctx.store.snapshot(), &file)
                .with_context(|| format!("cannot write {}", file.display()))?;
            println!("iCalendar file exported => {}", file.display());
        }
        Command::AddCourse {
            name,
            weekday,
            sections,
            weeks,
            location,
            teacher,
            category,
        } => {
            utils::weekday(weekday)?;
            let course = Course {
                name,
                weeks: utils::parse_range(&weeks)?,
                weekday,
                sections: utils::parse_range(&sections)?.into_iter().collect(),
                location,
                teacher,
                category,
            };

            let added = format!(
                "Added {} ({}, {})",
                course.name,
                utils::weekday(weekday)?,
                utils::sections_label(&course)
            );
            ctx.store.update(|snapshot| {
                snapshot.courses.push(course);
                Ok(())
            })?;
            println!("{added}");
        }
        Command::Import { file } => {
            let Roster { courses, rejected } =
                roster::read(&file).with_context(|| format!("cannot read {}", file.display()))?;
            let imported = courses.len();

            ctx.store.update(|snapshot| {
                snapshot.courses.extend(courses);
                Ok(())
            })?;
            println!("Imported {imported} course(s), {rejected} row(s) rejected");
        }
        Command::RemoveCourse { name, weekday } => {
            let mut removed = 0;
            ctx.store.update(|snapshot| {
                removed = snapshot.remove_course(&name, weekday)?;
                Ok(())
            })?;
            println!("Removed {removed} course(s)");
        }
        Command::RemoveDate { date, event } => {
            let mut removed = 0;
            ctx.store.update(|snapshot| {
                removed = snapshot.remove_date(date, event.as_deref())?;
                Ok(())
            })?;
            println!("Removed {removed} important date(s)");
        }
        Command::AddDate {
            date,
            event,
            category,
        } => {
            let important = ImportantDate {
                date,
                event,
                category: category.parse()?,
            };
            ctx.store.update(|snapshot| {
                snapshot.important_dates.push(important);
                Ok(())
            })?;
        }
        Command::SetSemester {
            semester,
            start,
            end,
            name,
        } => {
            let name = name.unwrap_or_else(|| match semester {
                SemesterKey::Fall => "Fall semester".to_owned(),
                SemesterKey::Spring => "Spring semester".to_owned(),
            });
            if end < start {
                return Err(error::Error::SemesterOrder { name, start, end }.into());
            }

            ctx.store.update(|snapshot| {
                snapshot.set_semester(Semester {
                    key: semester,
                    name,
                    start,
                    end,
                });
                Ok(())
            })?;
            println!("{} semester set", semester.as_str());
        }
        Command::SetSchool { name, year } => {
            ctx.store.update(|snapshot| {
                snapshot.school_name = name;
                snapshot.academic_year = year;
                Ok(())
            })?;
        }
        Command::ClearCourses { yes } => {
            if confirm("Remove every course?", yes)? {
                ctx.store.update(|snapshot| {
                    snapshot.courses.clear();
                    Ok(())
                })?;
            }
        }
        Command::Reminders { alarm, day_before } => {
            if let Some(enabled) = alarm {
                ctx.settings.set_flag(ALARM_ENABLED, enabled)?;
            }
            if let Some(enabled) = day_before {
                ctx.settings.set_flag(DIGEST_ENABLED, enabled)?;
            }

            println!(
                "Class alarm: {}\nDay-before digest: {}",
                ctx.settings.flag(ALARM_ENABLED, true),
                ctx.settings.flag(DIGEST_ENABLED, true)
            );
        }
        Command::Reset { yes } => {
            if confirm("Reset the calendar to the built-in data?", yes)? {
                ctx.store.reset()?;
                println!("Calendar reset");
            }
        }
    }

    Ok(())
}
