//! OCCI compute glue over an external compute management API.
//!
//! This module maps backend lifecycle tags to OCCI compute states and
//! permitted actions, extracts launch parameters from OCCI compute entities,
//! and drives VM lifecycle operations (create, rebuild, resize, snapshot,
//! start/stop/suspend/restart, volume attachment) through an injected
//! backend port. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
