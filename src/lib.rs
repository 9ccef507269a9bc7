// Library exports for the deployment binaries, tests and benchmarks

pub mod config;
pub mod error;
pub mod keys;
pub mod logging;
pub mod models;
pub mod provision;
pub mod token;

pub use error::{Error, Result};

/// Version string shown by `--version`, stamped by build.rs
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ", ",
    env!("RUST_VERSION"),
    ")"
);
