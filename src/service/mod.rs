//! Phonebook operations: duplicate checks, change tracking, paging and
//! application/audit logging on top of [`ContactRepository`].

use log::{info, warn};

use crate::db::{ContactRepository, Database};
use crate::error::{PhonebookError, Result};
use crate::logging::AUDIT_TARGET;
use crate::models::{Contact, ContactChanges, NewContact, PhoneNumber};

mod import;

pub use import::{FailedRecord, ImportRow, ImportSummary, REQUIRED_HEADERS};

/// One page of a listing or search.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub contacts: Vec<Contact>,
    /// 1-based
    pub number: u32,
    pub size: u32,
    /// Matching contacts across all pages
    pub total: u32,
}

impl Page {
    pub fn page_count(&self) -> u32 {
        self.total.div_ceil(self.size.max(1)).max(1)
    }

    pub fn has_next(&self) -> bool {
        self.number < self.page_count()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

pub struct Phonebook<'a> {
    repo: ContactRepository<'a>,
    page_size: u32,
}

impl<'a> Phonebook<'a> {
    pub fn open(db: &'a Database, page_size: u32) -> Result<Self> {
        Ok(Self {
            repo: ContactRepository::open(db)?,
            page_size: page_size.max(1),
        })
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn find_by_phone(&self, phone: &PhoneNumber) -> Result<Option<Contact>> {
        self.repo.find_by_phone(phone)
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<Contact>> {
        self.repo.find_by_id(id)
    }

    /// Insert a contact, refusing a phone that is already taken.
    pub fn add_contact(&self, contact: &NewContact) -> Result<Contact> {
        if let Some(existing) = self.repo.find_by_phone(&contact.phone)? {
            return Err(PhonebookError::DuplicatePhone {
                existing: Box::new(existing),
            });
        }

        let id = self.repo.add(contact)?;
        let stored = self.require_id(id)?;

        info!(
            "Added new contact: {}, Phone: {}",
            stored.full_name(),
            stored.phone
        );
        info!(target: AUDIT_TARGET, "Contact added: id {} ({})", stored.id, stored.full_name());
        Ok(stored)
    }

    /// Apply `changes` to the contact with `phone`. Returns the contact
    /// before and after the update.
    pub fn update_by_phone(
        &self,
        phone: &PhoneNumber,
        changes: &ContactChanges,
    ) -> Result<(Contact, Contact)> {
        let before = self
            .repo
            .find_by_phone(phone)?
            .ok_or_else(|| PhonebookError::NotFound {
                what: format!("phone {}", phone),
            })?;

        self.apply_changes(before, changes, |repo| repo.update_by_phone(phone, changes))
    }

    pub fn update_by_id(&self, id: i64, changes: &ContactChanges) -> Result<(Contact, Contact)> {
        let before = self.require_id(id)?;
        self.apply_changes(before, changes, |repo| repo.update_by_id(id, changes))
    }

    fn apply_changes(
        &self,
        before: Contact,
        changes: &ContactChanges,
        write: impl FnOnce(&ContactRepository<'a>) -> Result<usize>,
    ) -> Result<(Contact, Contact)> {
        if changes.is_empty() {
            return Ok((before.clone(), before));
        }

        if let Some(ref phone) = changes.phone {
            if let Some(owner) = self.repo.find_by_phone(phone)? {
                if owner.id != before.id {
                    return Err(PhonebookError::DuplicatePhone {
                        existing: Box::new(owner),
                    });
                }
            }
        }

        write(&self.repo)?;
        let after = self.require_id(before.id)?;

        let diff: Vec<String> = before
            .changes_to(&after)
            .into_iter()
            .map(|(field, old, new)| format!("{}: '{}' -> '{}'", field, old, new))
            .collect();
        info!("Updated contact {}: {}", after.id, diff.join(", "));
        info!(
            target: AUDIT_TARGET,
            "Contact updated: id {}, fields: {}",
            after.id,
            changes
                .assignments()
                .iter()
                .map(|(column, _)| *column)
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok((before, after))
    }

    /// Remove the contact with `phone`. `None` when no such contact exists.
    pub fn delete_by_phone(&self, phone: &PhoneNumber) -> Result<Option<Contact>> {
        let Some(contact) = self.repo.find_by_phone(phone)? else {
            info!("Delete skipped: no contact with phone {}", phone);
            return Ok(None);
        };
        self.repo.delete_by_phone(phone)?;
        self.log_deleted(&contact);
        Ok(Some(contact))
    }

    pub fn delete_by_id(&self, id: i64) -> Result<Option<Contact>> {
        let Some(contact) = self.repo.find_by_id(id)? else {
            info!("Delete skipped: no contact with id {}", id);
            return Ok(None);
        };
        self.repo.delete_by_id(id)?;
        self.log_deleted(&contact);
        Ok(Some(contact))
    }

    /// Delete each id in turn; unknown ids are skipped. Returns what was removed.
    pub fn delete_many(&self, ids: &[i64]) -> Result<Vec<Contact>> {
        let mut deleted = Vec::new();
        for &id in ids {
            if deleted.iter().any(|c: &Contact| c.id == id) {
                continue;
            }
            if let Some(contact) = self.delete_by_id(id)? {
                deleted.push(contact);
            }
        }

        if deleted.is_empty() {
            warn!("Batch delete matched none of {:?}", ids);
        } else {
            info!("Batch deleted {} contact(s)", deleted.len());
        }
        Ok(deleted)
    }

    fn log_deleted(&self, contact: &Contact) {
        info!(
            "Deleted contact {}: {}, Phone: {}",
            contact.id,
            contact.full_name(),
            contact.phone
        );
        info!(target: AUDIT_TARGET, "Contact deleted: id {}", contact.id);
    }

    fn require_id(&self, id: i64) -> Result<Contact> {
        self.repo.find_by_id(id)?.ok_or_else(|| PhonebookError::NotFound {
            what: format!("id {}", id),
        })
    }

    fn offset(&self, page: u32) -> u32 {
        page.saturating_sub(1).saturating_mul(self.page_size)
    }

    /// Page `page` (1-based) of all contacts in id order.
    pub fn list_page(&self, page: u32) -> Result<Page> {
        let number = page.max(1);
        Ok(Page {
            contacts: self.repo.list(self.page_size, self.offset(number))?,
            number,
            size: self.page_size,
            total: self.repo.count(None)?,
        })
    }

    /// Page `page` (1-based) of the contacts matching `term`.
    pub fn search_page(&self, term: &str, page: u32) -> Result<Page> {
        let number = page.max(1);
        Ok(Page {
            contacts: self.repo.search(term, self.page_size, self.offset(number))?,
            number,
            size: self.page_size,
            total: self.repo.count(Some(term))?,
        })
    }

    /// Total number of contacts and the first `n` of them.
    pub fn summary(&self, n: u32) -> Result<(u32, Vec<Contact>)> {
        Ok((self.repo.count(None)?, self.repo.list(n, 0)?))
    }
}
