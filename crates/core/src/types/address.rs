//! Shipping addresses.

use serde::{Deserialize, Serialize};

use super::id::{AddressId, UserId};

/// A user's shipping address.
///
/// A user has at most one address with `is_user_selected` set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub is_user_selected: bool,
}

/// Editable address fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressFields {
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl AddressFields {
    /// Names of required fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("streetAddress", &self.street_address),
            ("city", &self.city),
            ("state", &self.state),
            ("zipCode", &self.zip_code),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /// A new, unselected address owned by `user_id`.
    #[must_use]
    pub fn into_address(self, user_id: UserId) -> Address {
        Address {
            id: AddressId::generate(),
            user_id,
            street_address: self.street_address,
            city: self.city,
            state: self.state,
            zip_code: self.zip_code,
            is_user_selected: false,
        }
    }
}
