//! MySQL implementation of the cdc-audit database boundary.
//!
//! [`MySqlCatalog`] reads `INFORMATION_SCHEMA` for the generator;
//! [`MySqlAuditStore`] streams, measures and trims audit tables for the
//! sync engine. Both wrap a [`MySqlSession`] opened by [`connect`].

mod catalog;
mod client;
mod store;
pub mod testing;

pub use catalog::MySqlCatalog;
pub use client::{connect, ConnectOpts, MySqlSession};
pub use store::MySqlAuditStore;
