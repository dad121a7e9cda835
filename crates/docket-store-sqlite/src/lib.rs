//! SQLite backend for the Docket appointment scheduler.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. The single serialized
//! connection doubles as the single writer the overlap invariant needs:
//! each check-then-write pair runs inside one `call` closure (and one SQL
//! transaction), so no two requests can interleave between the check and
//! the insert.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
