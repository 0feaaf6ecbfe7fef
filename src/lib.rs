//! Nova OCCI: glue between an OCCI front end and a nova-style compute
//! backend.
//!
//! The crate translates OCCI compute and storage-link requests into backend
//! operations and reports backend lifecycle state as OCCI state plus the
//! actions a client may invoke next.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: State mapping, request extraction and validated identifiers
//! - **Ports**: Abstract trait interfaces for the compute backend and
//!   password generation
//! - **Adapters**: In-memory backend and random password generator
//!
//! # Modules
//!
//! - [`compute`]: VM lifecycle glue and the lifecycle-to-OCCI state mapper
//! - [`storage`]: Storage links realised as volume attachments

pub mod compute;
pub mod storage;
