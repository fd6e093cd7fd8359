//! Process-level helpers shared by the service crate and the binaries:
//! tracing setup and startup checks on the data directory.

pub mod env;
pub mod utils;
