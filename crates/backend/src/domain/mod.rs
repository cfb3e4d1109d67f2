//! Domain types - core archive entities
//!
//! Messages, stream and topic descriptors as the remote service reports them,
//! plus the configuration that scopes a sync run.

pub mod config;
pub mod filter;
pub mod message;
