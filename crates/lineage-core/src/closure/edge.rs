//! Edge row type for the materialized closure.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use rusqlite::Row;

use crate::EntityId;

/// One row of the `dag_edges` table.
///
/// Direct edges are the ones callers inserted; implied edges are
/// derived rows materializing longer paths. The lineage ids form a
/// dependency graph used to find every row that must go when a direct
/// edge is removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge<V> {
    /// Row identity.
    pub id: i64,
    /// Edge contributing this path's first hop.
    pub entry_edge_id: i64,
    /// Direct edge whose insertion created this row (itself for a
    /// direct edge).
    pub direct_edge_id: i64,
    /// Edge contributing this path's last hop.
    pub exit_edge_id: i64,
    pub start_vertex_id: V,
    pub end_vertex_id: V,
    /// Path length this row represents; `0` for direct edges.
    pub hops: i64,
    /// Namespace partition key.
    pub dag_id: String,
}

impl<V: EntityId> Edge<V> {
    /// Column order: `id, entry_edge_id, direct_edge_id, exit_edge_id,
    /// start_vertex_id, end_vertex_id, hops, dag_id`.
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            entry_edge_id: row.get(1)?,
            direct_edge_id: row.get(2)?,
            exit_edge_id: row.get(3)?,
            start_vertex_id: row.get(4)?,
            end_vertex_id: row.get(5)?,
            hops: row.get(6)?,
            dag_id: row.get(7)?,
        })
    }

    /// Caller-created edge (`hops == 0`).
    pub const fn is_direct(&self) -> bool {
        self.hops == 0
    }

    /// Derived row materializing a multi-hop path.
    pub const fn is_implied(&self) -> bool {
        self.hops > 0
    }
}
