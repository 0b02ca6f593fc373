use std::collections::BTreeMap;
use std::time::SystemTime;

use thiserror::Error;

use crate::shared::encoding::FaceEncoding;
use crate::shared::ids::ContactId;

use super::contact::Contact;
use super::encoding_matcher::EncodingMatcher;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("contact {0} already exists")]
    Conflict(ContactId),
    #[error("contact {0} not found")]
    NotFound(ContactId),
    #[error("contact id {0} is not valid here")]
    InvalidId(ContactId),
    #[error("contact name must not be empty")]
    EmptyName,
}

/// Single writer of contact records.
///
/// Lives on the control-loop thread; nothing here is shared across threads.
/// Roster ids are positive, provisional ids count down from -1, and no
/// operation ever overwrites an existing contact.
pub struct IdentityRegistry {
    contacts: BTreeMap<ContactId, Contact>,
    matcher: Box<dyn EncodingMatcher>,
    next_provisional: i64,
}

impl IdentityRegistry {
    pub fn new(matcher: Box<dyn EncodingMatcher>) -> Self {
        Self {
            contacts: BTreeMap::new(),
            matcher,
            next_provisional: -1,
        }
    }

    /// Adds a user-assigned (positive id) contact.
    pub fn insert(&mut self, contact: Contact) -> Result<(), RegistryError> {
        if !contact.contact_id.is_user_assigned() {
            return Err(RegistryError::InvalidId(contact.contact_id));
        }
        self.restore(contact)
    }

    /// Adds a previously persisted contact, provisional ids included.
    pub fn restore(&mut self, contact: Contact) -> Result<(), RegistryError> {
        let id = contact.contact_id;
        if id.0 == 0 {
            return Err(RegistryError::InvalidId(id));
        }
        if self.contacts.contains_key(&id) {
            return Err(RegistryError::Conflict(id));
        }
        if id.is_provisional() && id.0 <= self.next_provisional {
            self.next_provisional = id.0 - 1;
        }
        self.contacts.insert(id, contact);
        Ok(())
    }

    /// Enrolls a face learned at runtime under a fresh provisional id.
    pub fn provisional_insert(
        &mut self,
        name: &str,
        encoding: Option<FaceEncoding>,
    ) -> Result<ContactId, RegistryError> {
        let name = normalize_name(name)?;
        while self.contacts.contains_key(&ContactId(self.next_provisional)) {
            self.next_provisional -= 1;
        }
        let id = ContactId(self.next_provisional);
        self.next_provisional -= 1;
        self.contacts.insert(id, Contact::new(id, name, encoding));
        log::info!("Enrolled provisional contact {id}");
        Ok(id)
    }

    pub fn lookup_by_encoding(&self, encoding: &FaceEncoding) -> Option<ContactId> {
        let enrolled: Vec<(ContactId, &FaceEncoding)> = self
            .contacts
            .values()
            .filter_map(|c| c.enrollment_encoding.as_ref().map(|e| (c.contact_id, e)))
            .collect();
        if enrolled.is_empty() {
            return None;
        }
        self.matcher
            .best_match(encoding, &enrolled)
            .filter(|id| self.contacts.contains_key(id))
    }

    pub fn rename(&mut self, id: ContactId, name: &str) -> Result<(), RegistryError> {
        let name = normalize_name(name)?;
        let contact = self
            .contacts
            .get_mut(&id)
            .ok_or(RegistryError::NotFound(id))?;
        contact.display_name = name;
        Ok(())
    }

    /// Moves a contact to a new id, e.g. promoting a provisional contact
    /// into the persisted roster's id space.
    pub fn reassign(&mut self, old: ContactId, new: ContactId) -> Result<(), RegistryError> {
        if new.0 == 0 {
            return Err(RegistryError::InvalidId(new));
        }
        if self.contacts.contains_key(&new) {
            return Err(RegistryError::Conflict(new));
        }
        let mut contact = self
            .contacts
            .remove(&old)
            .ok_or(RegistryError::NotFound(old))?;
        contact.contact_id = new;
        if new.is_provisional() && new.0 <= self.next_provisional {
            self.next_provisional = new.0 - 1;
        }
        self.contacts.insert(new, contact);
        Ok(())
    }

    pub fn touch_seen(&mut self, id: ContactId, at: SystemTime) -> Result<(), RegistryError> {
        self.contacts
            .get_mut(&id)
            .ok_or(RegistryError::NotFound(id))?
            .mark_seen(at);
        Ok(())
    }

    pub fn remove(&mut self, id: ContactId) -> Result<Contact, RegistryError> {
        self.contacts.remove(&id).ok_or(RegistryError::NotFound(id))
    }

    pub fn get(&self, id: ContactId) -> Option<&Contact> {
        self.contacts.get(&id)
    }

    pub fn contains(&self, id: ContactId) -> bool {
        self.contacts.contains_key(&id)
    }

    /// Contact ids in ascending order.
    pub fn list(&self) -> Vec<ContactId> {
        self.contacts.keys().copied().collect()
    }

    pub fn contacts(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.values()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

fn normalize_name(name: &str) -> Result<String, RegistryError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RegistryError::EmptyName);
    }
    Ok(trimmed.to_string())
}
