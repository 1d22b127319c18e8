use anyhow::Result;

use crate::cli::display::{contact_line, print_contact};
use crate::cli::ui::{confirm, prompt_contact_ref, prompt_field_optional, status, warning, ContactRef, FormResult};
use crate::config::Config;
use crate::service::Phonebook;

/// Delete one contact chosen by phone or ID
pub fn run_delete(book: &Phonebook, config: &Config) -> Result<()> {
    let Some(target) = prompt_contact_ref("Delete", config.max_attempts)? else {
        status("Cancelled.");
        return Ok(());
    };

    let found = match target {
        ContactRef::Phone(ref phone) => book.find_by_phone(phone)?,
        ContactRef::Id(id) => book.find_by_id(id)?,
    };
    let Some(contact) = found else {
        status(&format!("No contact found with {}", target));
        return Ok(());
    };

    print_contact(&contact);
    println!();
    if !confirm(&format!("Delete {}?", contact.full_name()))? {
        return Ok(());
    }

    let deleted = match target {
        ContactRef::Phone(ref phone) => book.delete_by_phone(phone)?,
        ContactRef::Id(id) => book.delete_by_id(id)?,
    };
    match deleted {
        Some(contact) => status(&format!("Deleted {}", contact_line(&contact))),
        None => status(&format!("No contact found with {}", target)),
    }
    Ok(())
}

/// Split `"1, 2,x,3"` into ids and the tokens that were not ids
fn parse_ids(input: &str) -> (Vec<i64>, Vec<String>) {
    let mut ids = Vec::new();
    let mut invalid = Vec::new();

    for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match token.parse::<i64>() {
            Ok(id) if id > 0 => {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
            _ => invalid.push(token.to_string()),
        }
    }

    (ids, invalid)
}

/// Delete several contacts by comma-separated IDs
pub fn run_batch_delete(book: &Phonebook) -> Result<()> {
    let input = match prompt_field_optional("IDs to delete (comma-separated)")? {
        FormResult::Value(v) => v,
        FormResult::Cancelled => return Ok(()),
    };

    let (ids, invalid) = parse_ids(&input);
    if !invalid.is_empty() {
        warning(&format!("Ignoring invalid IDs: {}", invalid.join(", ")));
    }
    if ids.is_empty() {
        status("No IDs given.");
        return Ok(());
    }

    if !confirm(&format!("Delete {} contact(s)?", ids.len()))? {
        return Ok(());
    }

    let deleted = book.delete_many(&ids)?;
    if deleted.is_empty() {
        status("No contacts were found for the given IDs.");
        return Ok(());
    }

    println!("Deleted contacts:");
    for contact in &deleted {
        println!("  {}", contact_line(contact));
    }

    let missing: Vec<String> = ids
        .iter()
        .filter(|id| !deleted.iter().any(|c| c.id == **id))
        .map(|id| id.to_string())
        .collect();
    if !missing.is_empty() {
        status(&format!("Not found: {}", missing.join(", ")));
    }
    Ok(())
}
