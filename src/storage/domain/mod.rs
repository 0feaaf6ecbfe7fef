//! Domain model for OCCI storage links between compute and storage
//! resources.

mod error;
mod link;

pub use error::StorageLinkDomainError;
pub use link::{
    ATTR_CORE_ID, ATTR_DEVICE_ID, ATTR_LINK_STATE, ATTR_MOUNTPOINT, EntityKind, LinkEndpoint,
    StorageLink, StorageLinkId, StorageLinkRequest,
};
