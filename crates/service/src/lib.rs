//! Service layer for the client resource.
//! - `client::repository::ClientStore` is the persistence port handlers depend on.
//! - Validation and hashing stay with the store (`models` crate); the service only
//!   sequences lookups and writes.

pub mod errors;
pub mod runtime;
pub mod attachments;
pub mod client;
#[cfg(test)]
pub mod test_support;
