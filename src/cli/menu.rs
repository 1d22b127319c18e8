//! Main menu for the phonebook
//!
//! Uses inquire for clean, reliable terminal interaction.

use anyhow::{anyhow, Result};
use inquire::Select;
use std::io::{self, IsTerminal};

use crate::cli::display::print_summary;
use crate::cli::ui::{clear_screen, minimal_render_config, wait_for_continue};
use crate::cli::{run_add, run_batch_delete, run_delete, run_import, run_list, run_search, run_update};
use crate::config::Config;
use crate::service::Phonebook;

/// Contacts listed under the startup summary
const SUMMARY_SIZE: u32 = 3;

/// Menu options with type-safe variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuOption {
    Add,
    View,
    Search,
    Update,
    Delete,
    Import,
    BatchDelete,
    Quit,
}

impl MenuOption {
    const ALL: &'static [MenuOption] = &[
        MenuOption::Add,
        MenuOption::View,
        MenuOption::Search,
        MenuOption::Update,
        MenuOption::Delete,
        MenuOption::Import,
        MenuOption::BatchDelete,
        MenuOption::Quit,
    ];

    fn label(self) -> &'static str {
        match self {
            MenuOption::Add => "Add contact",
            MenuOption::View => "View contacts",
            MenuOption::Search => "Search contacts",
            MenuOption::Update => "Update contact",
            MenuOption::Delete => "Delete contact",
            MenuOption::Import => "Import from CSV",
            MenuOption::BatchDelete => "Batch delete",
            MenuOption::Quit => "Quit",
        }
    }

    fn from_label(s: &str) -> Option<MenuOption> {
        MenuOption::ALL.iter().find(|opt| opt.label() == s).copied()
    }

    /// Options that leave their output on screen until the user continues
    fn pauses_after(self) -> bool {
        !matches!(self, MenuOption::View | MenuOption::Search | MenuOption::Quit)
    }
}

/// Run the interactive main menu
pub fn run_menu(book: &Phonebook, config: &Config) -> Result<()> {
    // TTY check: interactive menu requires a terminal
    if !io::stdin().is_terminal() {
        return Err(anyhow!(
            "Interactive menu requires a terminal. Run 'phonebook --help' for options."
        ));
    }

    let (total, first) = book.summary(SUMMARY_SIZE)?;
    print_summary(total, &first);

    let menu_labels: Vec<&str> = MenuOption::ALL.iter().map(|opt| opt.label()).collect();

    loop {
        println!();
        let selection = Select::new("phonebook", menu_labels.clone())
            .with_render_config(minimal_render_config())
            .with_page_size(menu_labels.len())
            .with_vim_mode(true)
            .prompt_skippable();

        // Handle prompt errors (Ctrl+C, terminal issues) - exit gracefully
        let selection = match selection {
            Ok(sel) => sel,
            Err(_) => return Ok(()),
        };

        let Some(choice_label) = selection else {
            // User pressed Escape
            return Ok(());
        };

        let Some(choice) = MenuOption::from_label(choice_label) else {
            continue;
        };

        if choice == MenuOption::Quit {
            log::info!("Exiting phonebook");
            return Ok(());
        }

        let _ = clear_screen();

        // Errors are reported and the menu keeps running
        if let Err(e) = execute_command(book, config, choice) {
            log::error!("{} failed: {:#}", choice.label(), e);
            eprintln!("\nError: {}", e);
        }

        if choice.pauses_after() {
            wait_for_continue();
        }
        let _ = clear_screen();
    }
}

fn execute_command(book: &Phonebook, config: &Config, choice: MenuOption) -> Result<()> {
    match choice {
        MenuOption::Add => run_add(book, config),
        MenuOption::View => run_list(book),
        MenuOption::Search => run_search(book),
        MenuOption::Update => run_update(book, config),
        MenuOption::Delete => run_delete(book, config),
        MenuOption::Import => run_import(book),
        MenuOption::BatchDelete => run_batch_delete(book),
        MenuOption::Quit => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_option_roundtrip() {
        for opt in MenuOption::ALL {
            let label = opt.label();
            let recovered = MenuOption::from_label(label);
            assert_eq!(recovered, Some(*opt), "Failed roundtrip for {:?}", opt);
        }
    }

    #[test]
    fn test_menu_option_from_invalid_label() {
        assert_eq!(MenuOption::from_label("Invalid"), None);
        assert_eq!(MenuOption::from_label(""), None);
    }

    #[test]
    fn test_menu_option_all_has_correct_count() {
        assert_eq!(MenuOption::ALL.len(), 8);
        assert_eq!(MenuOption::ALL.last(), Some(&MenuOption::Quit));
    }

    #[test]
    fn test_paging_screens_do_not_pause() {
        assert!(!MenuOption::View.pauses_after());
        assert!(MenuOption::Add.pauses_after());
    }
}
