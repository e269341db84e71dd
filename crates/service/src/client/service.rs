use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::errors::ServiceError;

use super::repository::ClientStore;
use super::{Client, ClientFields, ClientFilter};

/// Application service for the client resource, independent of the web framework.
///
/// `get` is the single lookup primitive; `update` and `delete` branch on its
/// result before touching the store.
pub struct ClientService<S: ClientStore + ?Sized> {
    store: Arc<S>,
}

impl<S: ClientStore + ?Sized> ClientService<S> {
    pub fn new(store: Arc<S>) -> Self { Self { store } }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: ClientFilter) -> Result<Vec<Client>, ServiceError> {
        let clients = self.store.scan(filter).await?;
        info!(count = clients.len(), "clients_listed");
        Ok(clients)
    }

    pub async fn get(&self, id: i32) -> Result<Option<Client>, ServiceError> {
        self.store.find(id).await
    }

    /// Create a client from the whitelisted fields.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::attachments::DietPlanStore;
    /// use service::client::{memory::MemoryClientStore, ClientFields, ClientService};
    /// let store = Arc::new(MemoryClientStore::with_coaches(DietPlanStore::new(std::env::temp_dir()), [1]));
    /// let svc = ClientService::new(store);
    /// let fields = ClientFields {
    ///     mail_address: Some("anna@example.com".into()),
    ///     password: Some("Secret123".into()),
    ///     name: Some("Anna".into()),
    ///     last_name: Some("Nowak".into()),
    ///     coach_id: Some(1),
    ///     ..Default::default()
    /// };
    /// let client = tokio_test::block_on(svc.create(fields)).unwrap();
    /// assert_eq!(client.id, 1);
    /// assert!(client.is_pending);
    /// ```
    #[instrument(skip(self, input), fields(mail_address = ?input.mail_address))]
    pub async fn create(&self, input: ClientFields) -> Result<Client, ServiceError> {
        match self.store.insert(&input).await {
            Ok(client) => {
                info!(client_id = client.id, coach_id = client.coach_id, "client_created");
                Ok(client)
            }
            Err(e) => {
                warn!(error = %e, "client_create_rejected");
                Err(e)
            }
        }
    }

    #[instrument(skip(self, fields))]
    pub async fn update(&self, id: i32, fields: ClientFields) -> Result<Client, ServiceError> {
        let Some(existing) = self.get(id).await? else {
            return Err(ServiceError::not_found("client"));
        };
        let updated = self.store.update(existing, &fields).await?;
        info!(client_id = updated.id, "client_updated");
        Ok(updated)
    }

    /// Delete the client and its attachments, returning its last state.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<Client, ServiceError> {
        let Some(existing) = self.get(id).await? else {
            return Err(ServiceError::not_found("client"));
        };
        self.store.delete(&existing).await?;
        info!(client_id = existing.id, "client_deleted");
        Ok(existing)
    }
}
