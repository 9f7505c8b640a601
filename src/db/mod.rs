//! Database module: the generic data-access layer.
//!
//! Layout:
//! - `schema.rs`: table registry and DDL (SQLite)
//! - `query.rs`: select/write request types
//! - `codec.rs`: JSON <-> SQL value conversion
//! - `exec.rs`: statement building and execution
//! - `actor.rs`: the actor that owns the pool and publishes change events
//! - `access.rs`: `DataAccess` trait and the typed `Store`

pub mod access;
pub mod actor;
pub mod query;
pub mod schema;

mod codec;
mod exec;

pub use access::{DataAccess, Store, from_row, to_row};
pub use actor::{DbActorHandle, spawn};
pub use query::{Filter, FilterOp, Ordering, Row, Select, Write};
