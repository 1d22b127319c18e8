//! Application and audit log files.
//!
//! Two `env_logger` loggers, each piped to its own append-only file. Records
//! logged with `target: AUDIT_TARGET` go to `audit.log`; everything else goes
//! to `app.log` at `info` unless `RUST_LOG` says otherwise.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use env_logger::{Builder, Env, Logger, Target, WriteStyle};
use log::{LevelFilter, Log, Metadata, Record};

use crate::error::{PhonebookError, Result};

/// Log target for create / update / delete audit lines.
pub const AUDIT_TARGET: &str = "phonebook::audit";

pub const APP_LOG: &str = "app.log";
pub const AUDIT_LOG: &str = "audit.log";

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| PhonebookError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// `2024-09-17 10:31:02,117 - INFO - message`
fn file_builder(file: File) -> Builder {
    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
                record.level(),
                record.args()
            )
        })
        .write_style(WriteStyle::Never)
        .target(Target::Pipe(Box::new(file)));
    builder
}

/// Routes each record to the app or audit logger by target.
pub struct Dispatch {
    app: Logger,
    audit: Logger,
}

impl Dispatch {
    /// Open (creating if needed) both log files under `log_dir`.
    pub fn new(log_dir: &Path) -> Result<Self> {
        fs::create_dir_all(log_dir).map_err(|source| PhonebookError::Io {
            path: log_dir.to_path_buf(),
            source,
        })?;

        let mut app = file_builder(open_append(&log_dir.join(APP_LOG))?);
        app.parse_env(Env::default().default_filter_or("info"));

        let mut audit = file_builder(open_append(&log_dir.join(AUDIT_LOG))?);
        audit.filter(Some(AUDIT_TARGET), LevelFilter::Info);

        Ok(Self {
            app: app.build(),
            audit: audit.build(),
        })
    }

    pub fn max_level(&self) -> LevelFilter {
        self.app.filter().max(self.audit.filter())
    }

    fn route(&self, target: &str) -> &Logger {
        if target == AUDIT_TARGET {
            &self.audit
        } else {
            &self.app
        }
    }
}

impl Log for Dispatch {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.route(metadata.target()).enabled(metadata)
    }

    fn log(&self, record: &Record) {
        self.route(record.target()).log(record);
    }

    fn flush(&self) {
        self.app.flush();
        self.audit.flush();
    }
}

/// Install the file loggers as the global logger. Returns the log directory.
/// A logger that is already installed is left in place.
pub fn init(log_dir: &Path) -> Result<PathBuf> {
    let dispatch = Dispatch::new(log_dir)?;
    let level = dispatch.max_level();

    if log::set_boxed_logger(Box::new(dispatch)).is_ok() {
        log::set_max_level(level);
    }
    Ok(log_dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;
    use tempfile::TempDir;

    fn read(dir: &TempDir, name: &str) -> String {
        fs::read_to_string(dir.path().join(name)).unwrap()
    }

    #[test]
    fn test_routes_audit_target_to_audit_log() {
        let dir = TempDir::new().unwrap();
        let dispatch = Dispatch::new(dir.path()).unwrap();

        dispatch.log(
            &Record::builder()
                .target(AUDIT_TARGET)
                .level(Level::Info)
                .args(format_args!("Contact added: Jane Doe"))
                .build(),
        );
        dispatch.log(
            &Record::builder()
                .target("phonebook::service")
                .level(Level::Warn)
                .args(format_args!("Skipping invalid record"))
                .build(),
        );
        dispatch.flush();

        let audit = read(&dir, AUDIT_LOG);
        let app = read(&dir, APP_LOG);
        assert!(audit.contains(" - INFO - Contact added: Jane Doe"));
        assert!(!audit.contains("Skipping"));
        assert!(app.contains(" - WARN - Skipping invalid record"));
        assert!(!app.contains("Contact added"));
    }

    #[test]
    fn test_line_format() {
        let dir = TempDir::new().unwrap();
        let dispatch = Dispatch::new(dir.path()).unwrap();
        dispatch.log(
            &Record::builder()
                .target(AUDIT_TARGET)
                .level(Level::Info)
                .args(format_args!("x"))
                .build(),
        );

        let line = read(&dir, AUDIT_LOG);
        let line = line.lines().next().unwrap();
        // "YYYY-MM-DD HH:MM:SS,mmm - INFO - x"
        let (stamp, rest) = line.split_at(23);
        assert_eq!(rest, " - INFO - x");
        assert_eq!(&stamp[4..5], "-");
        assert_eq!(&stamp[10..11], " ");
        assert_eq!(&stamp[19..20], ",");
    }

    #[test]
    fn test_files_are_appended() {
        let dir = TempDir::new().unwrap();
        for msg in ["first", "second"] {
            let dispatch = Dispatch::new(dir.path()).unwrap();
            dispatch.log(
                &Record::builder()
                    .target(AUDIT_TARGET)
                    .level(Level::Info)
                    .args(format_args!("{}", msg))
                    .build(),
            );
        }
        assert_eq!(read(&dir, AUDIT_LOG).lines().count(), 2);
    }

    #[test]
    fn test_audit_ignores_debug() {
        let dir = TempDir::new().unwrap();
        let dispatch = Dispatch::new(dir.path()).unwrap();
        let metadata = Metadata::builder()
            .target(AUDIT_TARGET)
            .level(Level::Debug)
            .build();
        assert!(!dispatch.enabled(&metadata));
    }
}
