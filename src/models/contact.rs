use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PhoneNumber;
use crate::error::Result;
use crate::validate::{optional_text, validate_email, validate_name};

/// A stored contact. `id` and both timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone: PhoneNumber,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Field-by-field differences against a newer version of the same contact:
    /// `(label, old, new)`.
    pub fn changes_to(&self, newer: &Contact) -> Vec<(&'static str, String, String)> {
        let pairs = [
            ("first name", Some(self.first_name.clone()), Some(newer.first_name.clone())),
            ("last name", Some(self.last_name.clone()), Some(newer.last_name.clone())),
            ("phone", Some(self.phone.to_string()), Some(newer.phone.to_string())),
            ("email", self.email.clone(), newer.email.clone()),
            ("address", self.address.clone(), newer.address.clone()),
        ];

        pairs
            .into_iter()
            .filter(|(_, old, new)| old != new)
            .map(|(label, old, new)| (label, old.unwrap_or_default(), new.unwrap_or_default()))
            .collect()
    }
}

/// A validated contact ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContact {
    pub first_name: String,
    pub last_name: String,
    pub phone: PhoneNumber,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl NewContact {
    /// Validate both names and canonicalize the phone.
    pub fn new(first_name: &str, last_name: &str, phone: &str) -> Result<Self> {
        Ok(Self {
            first_name: validate_name("first name", first_name)?,
            last_name: validate_name("last name", last_name)?,
            phone: PhoneNumber::parse(phone)?,
            email: None,
            address: None,
        })
    }

    pub fn with_email(mut self, email: Option<&str>) -> Result<Self> {
        self.email = validate_email(email)?;
        Ok(self)
    }

    pub fn with_address(mut self, address: Option<&str>) -> Self {
        self.address = optional_text(address);
        self
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A partial update. Unset fields are left untouched; each setter validates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<PhoneNumber>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl ContactChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn first_name(mut self, value: &str) -> Result<Self> {
        self.first_name = Some(validate_name("first name", value)?);
        Ok(self)
    }

    pub fn last_name(mut self, value: &str) -> Result<Self> {
        self.last_name = Some(validate_name("last name", value)?);
        Ok(self)
    }

    pub fn phone(mut self, value: &str) -> Result<Self> {
        self.phone = Some(PhoneNumber::parse(value)?);
        Ok(self)
    }

    /// A blank email is treated as "no change".
    pub fn email(mut self, value: &str) -> Result<Self> {
        self.email = validate_email(Some(value))?;
        Ok(self)
    }

    pub fn address(mut self, value: &str) -> Self {
        self.address = optional_text(Some(value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.address.is_none()
    }

    /// Set fields as `(column, value)` pairs, in column order.
    pub fn assignments(&self) -> Vec<(&'static str, String)> {
        let mut set = Vec::new();
        if let Some(ref v) = self.first_name {
            set.push(("first_name", v.clone()));
        }
        if let Some(ref v) = self.last_name {
            set.push(("last_name", v.clone()));
        }
        if let Some(ref v) = self.phone {
            set.push(("phone", v.to_string()));
        }
        if let Some(ref v) = self.email {
            set.push(("email", v.clone()));
        }
        if let Some(ref v) = self.address {
            set.push(("address", v.clone()));
        }
        set
    }
}
