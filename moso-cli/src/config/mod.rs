//! CLI configuration: user config file layered under command-line flags

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{GlobalArgs, RawMosoConfig};
