use serde::{Deserialize, Serialize};

use vitrina_core::{ContactsInfoId, Entity};

/// Shop contact details shown on the contacts page.
///
/// Only the first stored record is displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactsInfo {
    pub id: ContactsInfoId,
    pub phone: String,
    pub email: String,
    pub address: String,
}

impl ContactsInfo {
    pub fn new(
        phone: impl Into<String>,
        email: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            id: ContactsInfoId::new(),
            phone: phone.into(),
            email: email.into(),
            address: address.into(),
        }
    }
}

impl Entity for ContactsInfo {
    type Id = ContactsInfoId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
