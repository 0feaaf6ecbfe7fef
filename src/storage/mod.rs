//! OCCI storage links backed by compute volume attachments.
//!
//! A storage link joins a compute resource and a storage resource in either
//! direction. Creating one attaches the volume to the instance; deleting it
//! detaches the volume.
//!
//! - Domain types in [`domain`]
//! - Orchestration services in [`services`]

pub mod domain;
pub mod services;
