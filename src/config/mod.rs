//! Configuration module.
//!
//! Values are layered: built-in defaults, then the first config file found,
//! then `ORCA_*` environment variables, then command-line flags. The result
//! is read once at startup and passed down explicitly.

mod loader;
mod types;

pub use loader::*;
pub use types::*;
