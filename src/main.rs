use anyhow::Context;
use clap::Parser;
use phonebook::cli::{run_menu, Cli};
use phonebook::config::Config;
use phonebook::{logging, Database, Phonebook};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli)?;

    logging::init(&config.log_dir)
        .with_context(|| format!("Could not set up logs in {}", config.log_dir.display()))?;
    log::info!("Starting phonebook with database {}", config.db_path.display());

    let db = Database::open_at(&config.db_path)?;
    let book = Phonebook::open(&db, config.page_size)?;

    run_menu(&book, &config)
}
