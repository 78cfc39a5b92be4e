use std::collections::HashMap;

use crate::domain::identity::Identity;

/// Maps a normalized phone number to the single identity whose booking uses it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PhoneIndex {
    owners: HashMap<String, Identity>,
}

impl PhoneIndex {
    pub fn owner_of(&self, phone: &str) -> Option<&Identity> {
        self.owners.get(phone)
    }

    /// Points `phone` at `owner`. Returns the other identity that held it, if any.
    pub fn reassign(&mut self, phone: &str, owner: &Identity) -> Option<Identity> {
        if phone.is_empty() {
            return None;
        }
        self.owners.insert(phone.to_string(), owner.clone()).filter(|previous| previous != owner)
    }

    /// Removes the entry only while it still points at `owner`.
    pub fn release(&mut self, phone: &str, owner: &Identity) -> bool {
        if self.owners.get(phone) == Some(owner) {
            self.owners.remove(phone);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
