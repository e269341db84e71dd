use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use tracing::debug;

use crate::attachments::DietPlanStore;
use crate::errors::ServiceError;

use super::{Client, ClientFields, ClientFilter};

/// Persistence port for clients. Implementations own validation (presence,
/// unique mail address, coach reference) and report failures as
/// `ServiceError::Validation` with field-level messages.
#[async_trait]
pub trait ClientStore: Send + Sync {
    /// All clients, newest `updated_at` first.
    async fn scan(&self, filter: ClientFilter) -> Result<Vec<Client>, ServiceError>;
    async fn find(&self, id: i32) -> Result<Option<Client>, ServiceError>;
    async fn insert(&self, fields: &ClientFields) -> Result<Client, ServiceError>;
    async fn update(&self, existing: Client, fields: &ClientFields) -> Result<Client, ServiceError>;
    /// Remove the record, then its diet plan attachments. Once the record is
    /// gone a failed purge is logged rather than reported.
    async fn delete(&self, existing: &Client) -> Result<(), ServiceError>;
}

/// SeaORM-backed store implementation.
pub struct SeaOrmClientStore {
    pub db: DatabaseConnection,
    pub attachments: DietPlanStore,
}

impl SeaOrmClientStore {
    pub fn new(db: DatabaseConnection, attachments: DietPlanStore) -> Self {
        Self { db, attachments }
    }
}

#[async_trait]
impl ClientStore for SeaOrmClientStore {
    async fn scan(&self, filter: ClientFilter) -> Result<Vec<Client>, ServiceError> {
        Ok(models::client::scan(&self.db, filter).await?)
    }

    async fn find(&self, id: i32) -> Result<Option<Client>, ServiceError> {
        Ok(models::client::find(&self.db, id).await?)
    }

    async fn insert(&self, fields: &ClientFields) -> Result<Client, ServiceError> {
        Ok(models::client::insert(&self.db, fields).await?)
    }

    async fn update(&self, existing: Client, fields: &ClientFields) -> Result<Client, ServiceError> {
        Ok(models::client::update(&self.db, existing, fields).await?)
    }

    async fn delete(&self, existing: &Client) -> Result<(), ServiceError> {
        if !models::client::delete(&self.db, existing.id).await? {
            return Err(ServiceError::not_found("client"));
        }
        if let Some(file) = existing.diet_plan.as_deref() {
            debug!(path = %self.attachments.path_for(existing.id, file).display(), "removing diet plan");
        }
        self.attachments.purge_orphaned(existing.id).await;
        Ok(())
    }
}
