//! Unit tests for the compute module.
//!
//! Tests are organised by concern: state classification, entity extraction
//! and service orchestration against mocked ports.
