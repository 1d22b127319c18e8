use std::path::PathBuf;

use anyhow::Result;

use crate::cli::display::print_import_summary;
use crate::cli::ui::{prompt_field_optional, status, FormResult};
use crate::error::PhonebookError;
use crate::service::{Phonebook, REQUIRED_HEADERS};

/// Import contacts from a CSV file path entered by the user
pub fn run_import(book: &Phonebook) -> Result<()> {
    println!(
        "CSV with a header row; required columns: {}; optional: email, address.",
        REQUIRED_HEADERS.join(", ")
    );

    let path = match prompt_field_optional("file")? {
        FormResult::Value(v) if !v.is_empty() => PathBuf::from(v),
        _ => return Ok(()),
    };

    match book.import_csv(&path) {
        Ok(summary) => {
            log::info!(
                "Batch import from {}: {} added, {} failed",
                path.display(),
                summary.success_count,
                summary.failed_count()
            );
            print_import_summary(&summary);
            Ok(())
        }
        Err(PhonebookError::MalformedInput(msg)) => {
            log::error!("Batch import failed: {}", msg);
            status(&msg);
            Ok(())
        }
        Err(e) => {
            log::error!("Batch import failed: {}", e);
            Err(e.into())
        }
    }
}
