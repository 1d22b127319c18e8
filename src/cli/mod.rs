use std::path::PathBuf;

use clap::Parser;

pub mod add;
pub mod delete;
pub mod display;
pub mod import;
pub mod list;
pub mod menu;
pub mod search;
pub mod ui;
pub mod update;

pub use add::run_add;
pub use delete::{run_batch_delete, run_delete};
pub use import::run_import;
pub use list::run_list;
pub use menu::run_menu;
pub use search::run_search;
pub use update::run_update;

#[derive(Parser, Debug)]
#[command(name = "phonebook")]
#[command(about = "Contact manager for the command line")]
#[command(version)]
pub struct Cli {
    /// SQLite database file [env: PHONEBOOK_DB]
    #[arg(long, value_name = "FILE")]
    pub db: Option<PathBuf>,

    /// Directory for app.log and audit.log [env: PHONEBOOK_LOG_DIR]
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Contacts per page [env: PHONEBOOK_PAGE_SIZE]
    #[arg(long, value_name = "N")]
    pub page_size: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from(["phonebook", "--db", "x.db", "--page-size", "20"]);
        assert_eq!(cli.db, Some(PathBuf::from("x.db")));
        assert_eq!(cli.page_size, Some(20));
        assert!(cli.log_dir.is_none());

        assert!(Cli::try_parse_from(["phonebook", "list"]).is_err());
    }
}
