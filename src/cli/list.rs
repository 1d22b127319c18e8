use anyhow::Result;
use crossterm::event::KeyCode;

use crate::cli::display::print_page;
use crate::cli::ui::{clear_screen, read_key, status};
use crate::service::{Page, Phonebook};

/// Paging key actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageAction {
    Next,
    Previous,
    Back,
    Ignore,
}

impl PageAction {
    fn from_key(code: KeyCode) -> Self {
        match code {
            KeyCode::Char('n') | KeyCode::Right | KeyCode::PageDown | KeyCode::Char(' ') => {
                PageAction::Next
            }
            KeyCode::Char('p') | KeyCode::Left | KeyCode::PageUp => PageAction::Previous,
            KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter => PageAction::Back,
            _ => PageAction::Ignore,
        }
    }
}

/// Page to show after `action`, or `None` to leave the listing
fn target_page(page: &Page, action: PageAction) -> Option<u32> {
    match action {
        PageAction::Next if page.has_next() => Some(page.number + 1),
        PageAction::Previous if page.has_previous() => Some(page.number - 1),
        PageAction::Back => None,
        _ => Some(page.number),
    }
}

/// Show pages from `fetch` until the user backs out
pub fn page_through(
    fetch: impl Fn(u32) -> crate::error::Result<Page>,
    empty_message: &str,
) -> Result<()> {
    let mut number = 1;

    loop {
        let page = fetch(number)?;
        if page.total == 0 {
            status(empty_message);
            return Ok(());
        }

        let _ = clear_screen();
        print_page(&page);
        println!("[n]ext [p]rev [q]uit");

        match target_page(&page, PageAction::from_key(read_key()?)) {
            Some(next) => number = next,
            None => return Ok(()),
        }
    }
}

/// Paginated view of every contact
pub fn run_list(book: &Phonebook) -> Result<()> {
    page_through(|n| book.list_page(n), "No contacts found.")
}
