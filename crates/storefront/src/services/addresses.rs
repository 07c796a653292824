//! Address book.
//!
//! Every lookup is scoped to the calling user; an address owned by someone
//! else behaves exactly like one that does not exist.

use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use stride_core::{Address, AddressFields, AddressId, UserId};

use super::{CommerceError, with_deadline};
use crate::db::{AddressStore, RepositoryError};

/// Manages a user's shipping addresses.
#[derive(Clone)]
pub struct AddressService {
    addresses: Arc<dyn AddressStore>,
    timeout: Duration,
}

impl AddressService {
    #[must_use]
    pub fn new(addresses: Arc<dyn AddressStore>, timeout: Duration) -> Self {
        Self { addresses, timeout }
    }

    /// Add an address and return the user's full list.
    ///
    /// # Errors
    ///
    /// `Validation` if a field is blank, `UserNotFound` for an unknown user.
    #[instrument(skip(self, fields), fields(user_id = %user_id))]
    pub async fn add(
        &self,
        user_id: UserId,
        fields: AddressFields,
    ) -> Result<Vec<Address>, CommerceError> {
        ensure_complete(&fields)?;
        let address = fields.into_address(user_id);

        with_deadline(self.timeout, "add_address", async {
            match self.addresses.insert_address(&address).await {
                Ok(()) => {}
                Err(RepositoryError::NotFound) => return Err(CommerceError::UserNotFound),
                Err(e) => return Err(e.into()),
            }
            tracing::info!(address_id = %address.id, "address added");
            Ok(self.addresses.list_addresses(user_id).await?)
        })
        .await
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Address>, CommerceError> {
        with_deadline(self.timeout, "list_addresses", async {
            Ok(self.addresses.list_addresses(user_id).await?)
        })
        .await
    }

    /// The user's selected address, if one is selected.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn selected(&self, user_id: UserId) -> Result<Option<Address>, CommerceError> {
        with_deadline(self.timeout, "selected_address", async {
            Ok(self.addresses.selected_address(user_id).await?)
        })
        .await
    }

    /// Replace an address's fields and return the user's full list.
    ///
    /// # Errors
    ///
    /// `Validation` if a field is blank, `AddressNotFound` if the user does
    /// not own the address.
    #[instrument(skip(self, fields), fields(user_id = %user_id, address_id = %id))]
    pub async fn edit(
        &self,
        user_id: UserId,
        id: AddressId,
        fields: AddressFields,
    ) -> Result<Vec<Address>, CommerceError> {
        ensure_complete(&fields)?;

        with_deadline(self.timeout, "edit_address", async {
            self.addresses
                .update_address(user_id, id, &fields)
                .await?
                .ok_or(CommerceError::AddressNotFound)?;
            Ok(self.addresses.list_addresses(user_id).await?)
        })
        .await
    }

    /// Delete an address and return the remaining list.
    ///
    /// Orders that shipped to the address keep their reference to it.
    #[instrument(skip(self), fields(user_id = %user_id, address_id = %id))]
    pub async fn delete(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Vec<Address>, CommerceError> {
        with_deadline(self.timeout, "delete_address", async {
            if !self.addresses.delete_address(user_id, id).await? {
                return Err(CommerceError::AddressNotFound);
            }
            Ok(self.addresses.list_addresses(user_id).await?)
        })
        .await
    }

    /// Make `id` the user's only selected address and return the list.
    ///
    /// When the user does not own `id` nothing changes.
    #[instrument(skip(self), fields(user_id = %user_id, address_id = %id))]
    pub async fn select(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Vec<Address>, CommerceError> {
        with_deadline(self.timeout, "select_address", async {
            if !self.addresses.select_address(user_id, id).await? {
                return Err(CommerceError::AddressNotFound);
            }
            Ok(self.addresses.list_addresses(user_id).await?)
        })
        .await
    }
}

fn ensure_complete(fields: &AddressFields) -> Result<(), CommerceError> {
    let missing = fields.missing_fields();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CommerceError::validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn fields(street: &str) -> AddressFields {
        AddressFields {
            street_address: street.to_owned(),
            city: "Bengaluru".to_owned(),
            state: "KA".to_owned(),
            zip_code: "560001".to_owned(),
        }
    }

    async fn service() -> (AddressService, Arc<MemoryStore>, UserId) {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::generate();
        store.add_user(user).await;
        (
            AddressService::new(store.clone(), Duration::from_millis(500)),
            store,
            user,
        )
    }

    #[tokio::test]
    async fn test_add_returns_full_list() {
        let (service, _, user) = service().await;
        service.add(user, fields("1 MG Road")).await.unwrap();
        let list = service.add(user, fields("2 Brigade Road")).await.unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.iter().all(|a| !a.is_user_selected));
    }

    #[tokio::test]
    async fn test_add_rejects_blank_fields() {
        let (service, _, user) = service().await;
        let mut incomplete = fields("1 MG Road");
        incomplete.zip_code = "  ".to_owned();

        let err = service.add(user, incomplete).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: zipCode");
        assert!(service.list(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_for_unknown_user() {
        let (service, _, _) = service().await;
        let err = service
            .add(UserId::generate(), fields("1 MG Road"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::UserNotFound));
    }

    #[tokio::test]
    async fn test_select_moves_selection() {
        let (service, _, user) = service().await;
        let list = service.add(user, fields("1 MG Road")).await.unwrap();
        let first = list[0].id;
        let list = service.add(user, fields("2 Brigade Road")).await.unwrap();
        let second = list.iter().find(|a| a.id != first).unwrap().id;

        assert!(service.selected(user).await.unwrap().is_none());
        service.select(user, first).await.unwrap();
        let list = service.select(user, second).await.unwrap();
        assert_eq!(list.len(), 2);

        let flagged: Vec<_> = list.iter().filter(|a| a.is_user_selected).collect();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].id, second);
        assert_eq!(service.selected(user).await.unwrap().unwrap().id, second);
    }

    #[tokio::test]
    async fn test_foreign_address_is_not_found() {
        let (service, store, user) = service().await;
        let other = UserId::generate();
        store.add_user(other).await;
        let theirs = service.add(other, fields("9 Elsewhere")).await.unwrap()[0].id;

        let err = service.select(user, theirs).await.unwrap_err();
        assert!(matches!(err, CommerceError::AddressNotFound));
        let err = service
            .edit(user, theirs, fields("hijacked"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::AddressNotFound));
        let err = service.delete(user, theirs).await.unwrap_err();
        assert!(matches!(err, CommerceError::AddressNotFound));

        let untouched = service.list(other).await.unwrap();
        assert_eq!(untouched[0].street_address, "9 Elsewhere");
        assert!(!untouched[0].is_user_selected);
    }

    #[tokio::test]
    async fn test_edit_and_delete() {
        let (service, _, user) = service().await;
        let id = service.add(user, fields("1 MG Road")).await.unwrap()[0].id;

        let list = service.edit(user, id, fields("5 Church Street")).await.unwrap();
        assert_eq!(list[0].street_address, "5 Church Street");

        let remaining = service.delete(user, id).await.unwrap();
        assert!(remaining.is_empty());
        let err = service.delete(user, id).await.unwrap_err();
        assert!(matches!(err, CommerceError::AddressNotFound));
    }
}
