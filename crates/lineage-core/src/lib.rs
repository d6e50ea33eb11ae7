//! lineage-core: materialized relationship stores over SQLite.
//!
//! Two independent stores answer ascendant/descendant/subtree questions
//! in a single query round trip, trading cheaper reads for more
//! expensive structural mutation:
//!
//! - [`closure`] keeps the full transitive closure of a directed
//!   acyclic graph materialized as rows, partitioned by a `dag_id`
//!   namespace. Vertices may have multiple parents; cycles are
//!   rejected at edge insertion.
//! - [`interval`] keeps strict single-parent trees in the nested-set
//!   ("interval tree") encoding, partitioned by a `tree_type`
//!   namespace. Ancestry is interval containment, so a subtree is one
//!   range scan.
//!
//! # Transactions
//!
//! The stores are passive: every operation takes a shared
//! [`rusqlite::Connection`] and performs no threading or async work of
//! its own. Mutating operations read and then write several rows and
//! **must run inside one caller-managed transaction**: pass `&tx`
//! (a [`rusqlite::Transaction`] derefs to `Connection`). Structural
//! mutations on the same namespace must not run concurrently; the
//! caller serializes them (WAL's single writer plus the busy timeout
//! set by [`db::open_store`] covers the common case).
//!
//! # Conventions
//!
//! - **Errors**: typed enums per store ([`closure::ClosureError`],
//!   [`interval::TreeError`]); `rusqlite::Error` propagates unmodified.
//! - **Logging**: `tracing` macros (`debug!` on mutations).

pub mod closure;
pub mod db;
pub mod interval;

use std::fmt;
use std::hash::Hash;

use rusqlite::types::{FromSql, ToSql};

/// Bound for caller-chosen vertex/node id types.
///
/// Ids are stored in columns with no declared type affinity, so any
/// `ToSql`/`FromSql` pair round trips unchanged (`TEXT` uuids,
/// `INTEGER` surrogate keys, ...). `Display` feeds error messages,
/// tracing fields and the interval store's `tree_id` derivation.
pub trait EntityId: ToSql + FromSql + fmt::Display + Clone + Eq + Hash {}

impl<T: ToSql + FromSql + fmt::Display + Clone + Eq + Hash> EntityId for T {}
