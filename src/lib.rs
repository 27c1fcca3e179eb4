//! Reef infrastructure library.
//!
//! This library contains the concurrent, generic in-memory containers at
//! the core of the Reef stack: a linearizable concurrent map, a
//! skip-list backed ordered set, a lock-free doubly linked list with a
//! plugin pipeline, a B+ tree, and the supporting stack / heap / Bloom
//! filter / indexed list primitives, plus the seams those containers are
//! consumed through.
//!
//! # Architecture
//!
//! The library is designed with the following principles in mind:
//! - Containers own their memory; nothing here persists or networks
//! - Fallible operations report, they never abort the process
//! - Concurrency discipline is stated per container and tested
//! - The boundary collaborators appear as traits only, mockable in tests

// Re-export public modules
pub mod boundary;
pub mod config;
pub mod containers;
pub mod error;
pub mod logging;
pub mod utils;

// Internal modules that are not part of the public API
#[cfg(test)]
pub(crate) mod tests;

/// Version information for the Reef library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library initialization: validates `config` and installs the console
/// log subscriber it describes.
pub fn init(config: &crate::config::ReefConfig) -> error::ReefResult<()> {
    use crate::config::Validate;

    config.validate()?;
    logging::init(&config.log);
    Ok(())
}
