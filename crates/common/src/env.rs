//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use tracing::{info, warn};

/// Ensure the attachment root exists, creating it when missing.
pub async fn ensure_storage_root(root: &str) -> anyhow::Result<()> {
    if root.trim().is_empty() {
        warn!("storage root is empty; attachments will resolve relative to the working directory");
        return Ok(());
    }
    if tokio::fs::metadata(root).await.is_err() {
        info!(%root, "creating client storage root");
    }
    tokio::fs::create_dir_all(root)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {root}: {e}"))?;
    Ok(())
}
