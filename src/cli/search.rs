use anyhow::Result;

use crate::cli::list::{page_through, run_list};
use crate::cli::ui::{prompt_field_optional, FormResult};
use crate::service::Phonebook;

/// Search by name or phone; an empty term lists everything
pub fn run_search(book: &Phonebook) -> Result<()> {
    let term = match prompt_field_optional("search (name or phone)")? {
        FormResult::Value(term) => term,
        FormResult::Cancelled => return Ok(()),
    };

    if term.is_empty() {
        return run_list(book);
    }

    log::info!("Searching contacts for '{}'", term);
    page_through(
        |n| book.search_page(&term, n),
        &format!("No contacts found for search term: {}", term),
    )
}
