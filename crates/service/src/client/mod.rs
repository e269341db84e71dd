//! Client resource: persistence port, its implementations, and the service.

pub mod repository;
pub mod memory;
pub mod service;

pub use models::client::{ClientFields, ClientFilter};
pub use service::ClientService;

/// A persisted client as the store returns it.
pub type Client = models::client::Model;
