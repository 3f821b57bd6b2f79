//! Business services behind the HTTP handlers.
//!
//! - data_source.rs: upstream JSON fetch and processing
//! - users.rs: in-memory user persistence

pub mod data_source;
pub mod users;

pub use data_source::{DataSource, DataSourceError};
pub use users::{User, UserStore, UserStoreError};
