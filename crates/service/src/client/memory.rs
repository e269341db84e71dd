use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use models::client::{MUST_EXIST, TAKEN};
use sea_orm::prelude::DateTimeWithTimeZone;
use models::errors::FieldErrors;
use tokio::sync::RwLock;

use crate::attachments::DietPlanStore;
use crate::errors::ServiceError;

use super::repository::ClientStore;
use super::{Client, ClientFields, ClientFilter};

#[derive(Default)]
struct Tables {
    clients: BTreeMap<i32, Client>,
    coaches: HashSet<i32>,
    last_id: i32,
    last_stamp: Option<DateTimeWithTimeZone>,
}

impl Tables {
    /// Write timestamps are strictly increasing so `updated_at` ordering is total.
    fn stamp(&mut self) -> DateTimeWithTimeZone {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let stamp = match self.last_stamp {
            Some(prev) if now <= prev => prev + Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }

    fn reference_errors(&self, fields: &ClientFields, except: Option<i32>) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if let Some(mail) = fields.mail_address.as_deref().filter(|m| !m.trim().is_empty()) {
            let taken = self
                .clients
                .values()
                .any(|c| c.mail_address == mail && Some(c.id) != except);
            if taken { errors.add("mail_address", TAKEN); }
        }
        if let Some(coach_id) = fields.coach_id {
            if !self.coaches.contains(&coach_id) { errors.add("coach", MUST_EXIST); }
        }
        errors
    }
}

/// In-memory store with the same validation rules as the SeaORM one.
/// Writers are serialized by the table lock.
pub struct MemoryClientStore {
    tables: RwLock<Tables>,
    attachments: DietPlanStore,
}

impl MemoryClientStore {
    pub fn new(attachments: DietPlanStore) -> Self {
        Self { tables: RwLock::new(Tables::default()), attachments }
    }

    /// Store with the given coach ids already registered.
    pub fn with_coaches<I: IntoIterator<Item = i32>>(attachments: DietPlanStore, coaches: I) -> Self {
        let tables = Tables { coaches: coaches.into_iter().collect(), ..Default::default() };
        Self { tables: RwLock::new(tables), attachments }
    }

    pub async fn add_coach(&self, id: i32) {
        self.tables.write().await.coaches.insert(id);
    }

    pub fn attachments(&self) -> &DietPlanStore {
        &self.attachments
    }
}

#[async_trait]
impl ClientStore for MemoryClientStore {
    async fn scan(&self, filter: ClientFilter) -> Result<Vec<Client>, ServiceError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Client> = tables
            .clients
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn find(&self, id: i32) -> Result<Option<Client>, ServiceError> {
        Ok(self.tables.read().await.clients.get(&id).cloned())
    }

    async fn insert(&self, fields: &ClientFields) -> Result<Client, ServiceError> {
        let mut errors = fields.validate_new();
        // hash before taking the table lock
        let digest = if errors.is_empty() { fields.password_digest().await? } else { None };

        let mut tables = self.tables.write().await;
        errors.merge(tables.reference_errors(fields, None));
        errors.into_result()?;

        let id = tables.last_id + 1;
        let now = tables.stamp();
        let client = fields.build(id, digest.unwrap_or_default(), now);
        tables.last_id = id;
        tables.clients.insert(id, client.clone());
        Ok(client)
    }

    async fn update(&self, existing: Client, fields: &ClientFields) -> Result<Client, ServiceError> {
        let mut errors = fields.validate_changes();
        let digest = if errors.is_empty() { fields.password_digest().await? } else { None };

        let mut tables = self.tables.write().await;
        if !tables.clients.contains_key(&existing.id) {
            return Err(ServiceError::not_found("client"));
        }
        errors.merge(tables.reference_errors(fields, Some(existing.id)));
        errors.into_result()?;

        let mut changed = existing;
        let now = tables.stamp();
        fields.apply_to(&mut changed, digest, now);
        tables.clients.insert(changed.id, changed.clone());
        Ok(changed)
    }

    async fn delete(&self, existing: &Client) -> Result<(), ServiceError> {
        let removed = self.tables.write().await.clients.remove(&existing.id);
        if removed.is_none() {
            return Err(ServiceError::not_found("client"));
        }
        self.attachments.purge_orphaned(existing.id).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryClientStore {
        let root = std::env::temp_dir().join(format!("memory_store_{}", uuid::Uuid::new_v4()));
        MemoryClientStore::with_coaches(DietPlanStore::new(root), [1, 2])
    }

    fn fields(mail: &str) -> ClientFields {
        ClientFields {
            mail_address: Some(mail.into()),
            password: Some("Secret123".into()),
            name: Some("Eva".into()),
            last_name: Some("Lis".into()),
            coach_id: Some(1),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn ids_are_sequential_and_unique() -> Result<(), anyhow::Error> {
        let s = store();
        let a = s.insert(&fields("a@example.com")).await?;
        let b = s.insert(&fields("b@example.com")).await?;
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        Ok(())
    }

    #[tokio::test]
    async fn rejected_insert_does_not_persist() -> Result<(), anyhow::Error> {
        let s = store();
        s.insert(&fields("a@example.com")).await?;
        let err = s.insert(&fields("a@example.com")).await.unwrap_err();
        match err {
            ServiceError::Validation(e) => assert_eq!(e.get("mail_address"), Some(&[TAKEN.to_string()][..])),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(s.scan(ClientFilter::default()).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_coach_must_exist() -> Result<(), anyhow::Error> {
        let s = store();
        let mut f = fields("c@example.com");
        f.coach_id = Some(99);
        assert!(matches!(s.insert(&f).await, Err(ServiceError::Validation(e)) if e.get("coach").is_some()));
        s.add_coach(99).await;
        assert!(s.insert(&f).await.is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn update_may_keep_own_mail_address() -> Result<(), anyhow::Error> {
        let s = store();
        let a = s.insert(&fields("a@example.com")).await?;
        let same = ClientFields { mail_address: Some("a@example.com".into()), ..Default::default() };
        let updated = s.update(a, &same).await?;
        assert_eq!(updated.mail_address, "a@example.com");
        Ok(())
    }

    #[tokio::test]
    async fn scan_orders_newest_first() -> Result<(), anyhow::Error> {
        let s = store();
        let a = s.insert(&fields("a@example.com")).await?;
        let b = s.insert(&fields("b@example.com")).await?;
        let ids: Vec<i32> = s.scan(ClientFilter::default()).await?.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);

        s.update(a.clone(), &ClientFields { name: Some("Ewa".into()), ..Default::default() }).await?;
        let ids: Vec<i32> = s.scan(ClientFilter::default()).await?.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
        Ok(())
    }

    #[tokio::test]
    async fn delete_succeeds_when_purge_fails() -> Result<(), anyhow::Error> {
        let s = store();
        let a = s.insert(&fields("a@example.com")).await?;
        let root = s.attachments().root().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        tokio::fs::write(root.join(a.id.to_string()), b"blocks the plan dir").await?;

        s.delete(&a).await?;
        assert!(s.find(a.id).await?.is_none());

        let _ = tokio::fs::remove_dir_all(&root).await;
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_inserts_get_distinct_ids() -> Result<(), anyhow::Error> {
        let s = std::sync::Arc::new(store());
        let tasks: Vec<_> = (0..4)
            .map(|i| {
                let s = s.clone();
                tokio::spawn(async move { s.insert(&fields(&format!("n{i}@example.com"))).await })
            })
            .collect();
        let mut ids = Vec::new();
        for t in tasks {
            let client = t.await??;
            assert!(client.password_digest.starts_with("$argon2"));
            ids.push(client.id);
        }
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        Ok(())
    }

    #[tokio::test]
    async fn delete_purges_attachments() -> Result<(), anyhow::Error> {
        let s = store();
        let a = s.insert(&fields("a@example.com")).await?;
        let plan = s.attachments().path_for(a.id, "plan.pdf");
        tokio::fs::create_dir_all(plan.parent().unwrap()).await?;
        tokio::fs::write(&plan, b"pdf").await?;

        s.delete(&a).await?;
        assert!(s.find(a.id).await?.is_none());
        assert!(tokio::fs::metadata(&plan).await.is_err());
        assert!(matches!(s.delete(&a).await, Err(ServiceError::NotFound(_))));

        let _ = tokio::fs::remove_dir_all(s.attachments().root()).await;
        Ok(())
    }
}
