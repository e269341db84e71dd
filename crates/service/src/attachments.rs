//! Diet plan attachment layout.
//!
//! Files live at `<root>/<client id>/diet_plan/<file name>`. This module only
//! maps paths and removes a client's attachments when the client goes away;
//! uploads are written by whatever fronts the storage root.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::ServiceError;

const DIET_PLAN_DIR: &str = "diet_plan";

#[derive(Clone, Debug)]
pub struct DietPlanStore {
    root: PathBuf,
}

impl DietPlanStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir_for(&self, client_id: i32) -> PathBuf {
        self.root.join(client_id.to_string()).join(DIET_PLAN_DIR)
    }

    pub fn path_for(&self, client_id: i32, file_name: &str) -> PathBuf {
        self.dir_for(client_id).join(file_name)
    }

    /// Remove every diet plan stored for the client. Returns whether anything
    /// was on disk.
    pub async fn purge(&self, client_id: i32) -> Result<bool, ServiceError> {
        let dir = self.dir_for(client_id);
        let removed = match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return Err(ServiceError::Attachment(format!("{}: {}", dir.display(), e))),
        };
        // drop the per-client directory too, but only if nothing else lives there
        if let Some(parent) = dir.parent() {
            let _ = tokio::fs::remove_dir(parent).await;
        }
        debug!(client_id, removed, dir = %dir.display(), "purged diet plans");
        Ok(removed)
    }

    /// Purge once the owning record is already gone. A failure leaves the files
    /// behind and is logged; it does not undo the delete.
    pub async fn purge_orphaned(&self, client_id: i32) {
        if let Err(e) = self.purge(client_id).await {
            warn!(client_id, error = %e, "client removed but diet plans remain on disk");
        }
    }
}
