//! Core types and trait definitions for the Docket appointment scheduler.
//!
//! Domain model, validation, the error taxonomy, and the [`store`]
//! abstraction live here. No HTTP or database dependencies: backends and
//! API layers depend on this crate, never the other way around.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod appointment;
pub mod directory;
pub mod error;
pub mod store;

pub use error::{Error, Result};
