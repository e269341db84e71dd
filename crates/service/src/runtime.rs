//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` so binary crates can prepare the
//! attachment root without depending directly on `common`.

/// Ensure the client attachment root exists.
pub async fn ensure_storage_root(root: &str) -> anyhow::Result<()> {
    common::env::ensure_storage_root(root).await
}
