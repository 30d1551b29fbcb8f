pub mod client;
pub mod commands;
pub mod error;
pub mod protocol;
pub mod service;
pub mod utils;

// Crate version exposed for runtime queries
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
