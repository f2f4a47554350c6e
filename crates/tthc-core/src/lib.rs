//! Configuration and component wiring shared by the `tthc` binary.

pub mod bootstrap;
pub mod config;
pub mod secret;

pub use config::Config;
pub use secret::Secret;
