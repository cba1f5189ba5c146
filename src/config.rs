use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "SCHOOLCAL_DATA_DIR";

const CALENDAR_FILE: &str = "calendar_data.json";
const SETTINGS_FILE: &str = "settings.json";

/// Where the data files live
#[derive(Clone, Debug)]
pub struct Paths {
    pub data_dir: PathBuf,
}

impl Paths {
    /// Resolve the data directory: the flag, then `SCHOOLCAL_DATA_DIR`, then the
    /// platform data directory
    pub fn resolve(flag: Option<PathBuf>) -> Self {
        let data_dir = flag
            .or_else(|| std::env::var_os(DATA_DIR_ENV).map(PathBuf::from))
            .or_else(|| dirs::data_dir().map(|dir| dir.join(env!("CARGO_PKG_NAME"))))
            .unwrap_or_else(|| PathBuf::from("data"));

        Self { data_dir }
    }

    pub fn calendar(&self) -> PathBuf {
        self.data_dir.join(CALENDAR_FILE)
    }

    pub fn settings(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }
}

/// Log to stderr, `RUST_LOG` taking over the given level
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Already set up when called twice, keep the first one
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_wins() {
        let paths = Paths::resolve(Some(PathBuf::from("/tmp/somewhere")));

        assert_eq!(paths.calendar(), PathBuf::from("/tmp/somewhere/calendar_data.json"));
        assert_eq!(paths.settings(), PathBuf::from("/tmp/somewhere/settings.json"));
    }
}
