use anyhow::Result;

use crate::cli::display::{print_changes, print_contact};
use crate::cli::ui::{prompt_validated, select, status, FormResult};
use crate::config::Config;
use crate::error::PhonebookError;
use crate::models::{Contact, ContactChanges, NewContact, PhoneNumber};
use crate::service::Phonebook;
use crate::validate::{optional_text, validate_email, validate_name};

/// What to do when the entered phone already belongs to someone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DuplicateChoice {
    ReEnter,
    UpdateExisting,
    Cancel,
}

impl DuplicateChoice {
    const ALL: [DuplicateChoice; 3] = [
        DuplicateChoice::ReEnter,
        DuplicateChoice::UpdateExisting,
        DuplicateChoice::Cancel,
    ];

    fn label(self) -> &'static str {
        match self {
            DuplicateChoice::ReEnter => "Re-enter a different phone number",
            DuplicateChoice::UpdateExisting => "Update the existing contact instead",
            DuplicateChoice::Cancel => "Cancel",
        }
    }
}

/// Outcome of the phone step
enum PhoneStep {
    Free(PhoneNumber),
    Existing(Contact),
    Cancelled,
}

fn prompt_phone(book: &Phonebook, config: &Config) -> Result<PhoneStep> {
    loop {
        let Some(phone) = prompt_validated("phone", None, config.max_attempts, PhoneNumber::parse)?
        else {
            return Ok(PhoneStep::Cancelled);
        };

        let Some(existing) = book.find_by_phone(&phone)? else {
            return Ok(PhoneStep::Free(phone));
        };

        println!("\nPhone number {} already belongs to:", phone);
        print_contact(&existing);
        println!();

        let labels: Vec<&str> = DuplicateChoice::ALL.iter().map(|c| c.label()).collect();
        match select("what now?", &labels)?.map(|i| DuplicateChoice::ALL[i]) {
            Some(DuplicateChoice::ReEnter) => continue,
            Some(DuplicateChoice::UpdateExisting) => return Ok(PhoneStep::Existing(existing)),
            Some(DuplicateChoice::Cancel) | None => return Ok(PhoneStep::Cancelled),
        }
    }
}

/// Optional email and address; `None` when cancelled
fn prompt_extras(config: &Config) -> Result<Option<(Option<String>, Option<String>)>> {
    let Some(email) = prompt_validated("email (optional)", None, config.max_attempts, |s| {
        validate_email(Some(s))
    })?
    else {
        return Ok(None);
    };

    let address = match crate::cli::ui::prompt_field_optional("address (optional)")? {
        FormResult::Value(v) => optional_text(Some(&v)),
        FormResult::Cancelled => return Ok(None),
    };

    Ok(Some((email, address)))
}

/// Interactive add with validated re-prompts and duplicate-phone handling
pub fn run_add(book: &Phonebook, config: &Config) -> Result<()> {
    let attempts = config.max_attempts;

    let Some(first) = prompt_validated("first name", None, attempts, |s| validate_name("first name", s))?
    else {
        status("Cancelled.");
        return Ok(());
    };
    let Some(last) = prompt_validated("last name", None, attempts, |s| validate_name("last name", s))?
    else {
        status("Cancelled.");
        return Ok(());
    };

    let phone = match prompt_phone(book, config)? {
        PhoneStep::Free(phone) => phone,
        PhoneStep::Existing(existing) => return update_existing(book, config, existing, &first, &last),
        PhoneStep::Cancelled => {
            status("Contact addition cancelled.");
            return Ok(());
        }
    };

    let Some((email, address)) = prompt_extras(config)? else {
        status("Cancelled.");
        return Ok(());
    };

    let contact = NewContact {
        first_name: first,
        last_name: last,
        phone,
        email,
        address,
    };

    match book.add_contact(&contact) {
        Ok(stored) => {
            println!("\nNew contact added:");
            print_contact(&stored);
            Ok(())
        }
        Err(PhonebookError::DuplicatePhone { existing }) => {
            // Taken between the check and the insert
            println!("\n{} now belongs to {}. Nothing was added.", existing.phone, existing.full_name());
            Ok(())
        }
        Err(e) if e.is_duplicate() => {
            status(&format!("{}. Nothing was added.", e));
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Apply the entered details to `existing` instead of adding a new contact
fn update_existing(
    book: &Phonebook,
    config: &Config,
    existing: Contact,
    first: &str,
    last: &str,
) -> Result<()> {
    let Some((email, address)) = prompt_extras(config)? else {
        status("Cancelled.");
        return Ok(());
    };

    let mut changes = ContactChanges::new().first_name(first)?.last_name(last)?;
    if let Some(ref email) = email {
        changes = changes.email(email)?;
    }
    if let Some(ref address) = address {
        changes = changes.address(address);
    }

    let (before, after) = book.update_by_id(existing.id, &changes)?;
    println!("\nUpdated contact:");
    print_contact(&after);
    println!();
    print_changes(&before, &after);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_choices_are_distinct() {
        let labels: Vec<&str> = DuplicateChoice::ALL.iter().map(|c| c.label()).collect();
        for (i, label) in labels.iter().enumerate() {
            assert!(!labels[i + 1..].contains(label));
        }
        assert_eq!(DuplicateChoice::ALL.len(), 3);
    }
}
