use anyhow::Result;

use crate::cli::display::{print_changes, print_contact};
use crate::cli::ui::{prompt_contact_ref, prompt_validated, status, ContactRef};
use crate::config::Config;
use crate::models::{Contact, ContactChanges, PhoneNumber};
use crate::service::Phonebook;
use crate::validate::{optional_text, validate_email, validate_name};

/// Values entered on the edit form; every field defaults to the current value
#[derive(Debug, Clone, PartialEq, Eq)]
struct EditForm {
    first_name: String,
    last_name: String,
    phone: PhoneNumber,
    email: Option<String>,
    address: Option<String>,
}

impl EditForm {
    /// Only the fields that differ from `current`
    fn changes_from(self, current: &Contact) -> ContactChanges {
        ContactChanges {
            first_name: Some(self.first_name).filter(|v| *v != current.first_name),
            last_name: Some(self.last_name).filter(|v| *v != current.last_name),
            phone: Some(self.phone).filter(|v| *v != current.phone),
            email: self.email.filter(|v| Some(v) != current.email.as_ref()),
            address: self.address.filter(|v| Some(v) != current.address.as_ref()),
        }
    }
}

fn find(book: &Phonebook, target: &ContactRef) -> Result<Option<Contact>> {
    let found = match target {
        ContactRef::Phone(phone) => book.find_by_phone(phone)?,
        ContactRef::Id(id) => book.find_by_id(*id)?,
    };
    Ok(found)
}

fn prompt_form(current: &Contact, attempts: u32) -> Result<Option<EditForm>> {
    let Some(first_name) = prompt_validated("first name", Some(&current.first_name), attempts, |s| {
        validate_name("first name", s)
    })?
    else {
        return Ok(None);
    };
    let Some(last_name) = prompt_validated("last name", Some(&current.last_name), attempts, |s| {
        validate_name("last name", s)
    })?
    else {
        return Ok(None);
    };
    let Some(phone) = prompt_validated(
        "phone",
        Some(current.phone.as_str()),
        attempts,
        PhoneNumber::parse,
    )?
    else {
        return Ok(None);
    };
    let Some(email) = prompt_validated("email", current.email.as_deref(), attempts, |s| {
        validate_email(Some(s))
    })?
    else {
        return Ok(None);
    };
    let Some(address) = prompt_validated("address", current.address.as_deref(), attempts, |s| {
        Ok(optional_text(Some(s)))
    })?
    else {
        return Ok(None);
    };

    Ok(Some(EditForm {
        first_name,
        last_name,
        phone,
        email,
        address,
    }))
}

/// Look up a contact by phone or ID, edit it and show what changed
pub fn run_update(book: &Phonebook, config: &Config) -> Result<()> {
    let Some(target) = prompt_contact_ref("Update", config.max_attempts)? else {
        status("Cancelled.");
        return Ok(());
    };

    let Some(current) = find(book, &target)? else {
        status(&format!("No contact found with {}", target));
        return Ok(());
    };

    println!("\nCurrent:");
    print_contact(&current);
    println!("\nPress enter to keep a value.");

    let Some(form) = prompt_form(&current, config.max_attempts)? else {
        status("Cancelled.");
        return Ok(());
    };

    let changes = form.changes_from(&current);
    if changes.is_empty() {
        status("No changes.");
        return Ok(());
    }

    let result = match target {
        ContactRef::Phone(ref phone) => book.update_by_phone(phone, &changes),
        ContactRef::Id(id) => book.update_by_id(id, &changes),
    };

    let (before, after) = match result {
        Ok(pair) => pair,
        Err(e) if e.is_duplicate() => {
            status(&format!("{}. Nothing was changed.", e));
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!("\nUpdated:");
    print_contact(&after);
    println!("\nChanges:");
    print_changes(&before, &after);
    Ok(())
}
