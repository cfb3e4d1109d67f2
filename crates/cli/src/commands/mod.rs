//! CLI command implementations

mod config;
mod status;
mod sync;

pub use config::{cmd_config_init, cmd_config_show};
pub use status::cmd_status;
pub use sync::cmd_sync;
