pub mod client;
pub mod dirs;
mod domain;
pub mod error;
pub mod fetch;
pub mod partition;
pub mod store;
pub mod sync;

pub use domain::{config, filter, message};
pub use error::{ArchiveError, Result};

#[cfg(test)]
mod __tests__;
