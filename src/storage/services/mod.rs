//! Orchestration services for storage links.

mod link;

pub use link::{StorageLinkService, StorageLinkServiceError, StorageLinkServiceResult};
