pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod service;
pub mod validate;

pub use db::Database;
pub use error::{PhonebookError, Result};
pub use service::Phonebook;
