//! Registry credential model shared by providers and the exec protocol.

pub mod docker_config;
pub mod secret;

pub use docker_config::*;
pub use secret::*;
