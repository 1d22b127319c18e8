//! Runtime configuration.
//!
//! Each setting comes from its command-line flag, then its environment
//! variable, then a default under the user's config directory.

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};

use crate::cli::Cli;

// Environment variable names
pub const ENV_DB: &str = "PHONEBOOK_DB";
pub const ENV_LOG_DIR: &str = "PHONEBOOK_LOG_DIR";
pub const ENV_PAGE_SIZE: &str = "PHONEBOOK_PAGE_SIZE";
pub const ENV_MAX_ATTEMPTS: &str = "PHONEBOOK_MAX_ATTEMPTS";

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    /// Rows per page in listings
    pub page_size: u32,
    /// Tries an interactive prompt allows before giving up
    pub max_attempts: u32,
}

fn app_dir() -> Result<PathBuf> {
    let config_dir =
        dirs::config_dir().ok_or_else(|| anyhow!("Could not find config directory"))?;
    Ok(config_dir.join("phonebook"))
}

fn positive(name: &str, raw: &str) -> Result<u32> {
    let value: u32 = raw
        .trim()
        .parse()
        .with_context(|| format!("{} must be a positive number, got '{}'", name, raw))?;
    if value == 0 {
        bail!("{} must be greater than zero", name);
    }
    Ok(value)
}

impl Config {
    /// Resolve from parsed flags and the process environment.
    pub fn load(cli: &Cli) -> Result<Self> {
        Self::load_with(cli, |key| env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup.
    pub fn load_with(cli: &Cli, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let db_path = match cli.db.clone().or_else(|| var(ENV_DB).map(PathBuf::from)) {
            Some(path) => path,
            None => app_dir()?.join("phonebook.db"),
        };

        let log_dir = match cli.log_dir.clone().or_else(|| var(ENV_LOG_DIR).map(PathBuf::from)) {
            Some(dir) => dir,
            None => app_dir()?.join("logs"),
        };

        let page_size = match (cli.page_size, var(ENV_PAGE_SIZE)) {
            (Some(0), _) => bail!("--page-size must be greater than zero"),
            (Some(n), _) => n,
            (None, Some(raw)) => positive(ENV_PAGE_SIZE, &raw)?,
            (None, None) => DEFAULT_PAGE_SIZE,
        };

        let max_attempts = match var(ENV_MAX_ATTEMPTS) {
            Some(raw) => positive(ENV_MAX_ATTEMPTS, &raw)?,
            None => DEFAULT_MAX_ATTEMPTS,
        };

        Ok(Self {
            db_path,
            log_dir,
            page_size,
            max_attempts,
        })
    }
}
