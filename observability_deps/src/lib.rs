//! A crate to assist with proper logging and error observability in IOx.
//!
//! This crate serves to assist with several different (but related) goals:
//! - to allow replacement of logging and metrics implementations
//! - to allow automatic inclusion of relevant context with all log lines (time, thread, module, etc)
//! - to make interaction with the logging in unit tests easier
//! - to provide a mechanism for integrating rust logs with C / C++ logs
//!
//! This crate is a very thin wrapper around the [tracing] crate. It
//! reexports the logging macros `error!`, `warn!`, `info!`, `debug!`
//! and `trace!` so crates across the workspace depend on this single
//! crate for the version they use, rather than pinning `tracing`
//! directly in every `Cargo.toml`.
//!
//! [tracing]: https://docs.rs/tracing

pub use tracing;
