//! Step definitions for OCCI state mapping scenarios.

pub mod then;
pub mod when;
pub mod world;
