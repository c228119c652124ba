//! Describe the rows you want, get dialect-correct SQL and typed records back.
//!
//! Records derive [`Record`], a [`Session`] resolves them against the live
//! schema (cached per process) and compiles [`Condition`]s for the configured
//! [`Dialect`]. Dialects live in their own crates (`quarry-postgres`,
//! `quarry-mysql`, `quarry-sqlite`, `quarry-oracle`, `quarry-mssql`) and are
//! registered by the caller.
pub use quarry_core::*;
pub use quarry_macros::*;
