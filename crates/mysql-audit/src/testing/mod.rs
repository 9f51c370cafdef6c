//! Testing utilities for the MySQL audit backend
//!
//! Docker-based MySQL server management for integration tests.

pub mod container;

pub use container::MySqlAuditContainer;
