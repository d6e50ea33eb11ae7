//! Closure maintenance operations.

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeSet, HashSet};

use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use tracing::debug;

use super::edge::Edge;
use crate::EntityId;

/// Errors surfaced by the closure store.
///
/// `DuplicateEdge`, `CycleDetected` and `EdgeNotFound` are domain
/// rejections: normal negative outcomes the caller maps to a
/// user-facing response. `EmptyNamespace` is a precondition violation
/// (programming error). `Db` is an infrastructure fault propagated
/// unmodified; retry policy belongs to the caller, and rollback of
/// the enclosing transaction undoes any partial mutation.
#[derive(Debug, thiserror::Error)]
pub enum ClosureError {
    /// The `dag_id` namespace key was empty.
    #[error("namespace (dag_id) must not be empty")]
    EmptyNamespace,

    /// A direct edge between the two vertices already exists in the
    /// namespace.
    #[error("edge from {start} to {end} already exists in '{dag_id}'")]
    DuplicateEdge {
        dag_id: String,
        start: String,
        end: String,
    },

    /// The end vertex is already an ascendant of the start vertex (or
    /// the two are the same vertex); inserting the edge would close a
    /// cycle.
    #[error("adding edge from {start} to {end} in '{dag_id}' would create a cycle")]
    CycleDetected {
        dag_id: String,
        start: String,
        end: String,
    },

    /// No direct edge between the two vertices exists in the namespace.
    #[error("edge from {start} to {end} does not exist in '{dag_id}'")]
    EdgeNotFound {
        dag_id: String,
        start: String,
        end: String,
    },

    /// Underlying persistence failure.
    #[error(transparent)]
    Db(#[from] rusqlite::Error),
}

impl ClosureError {
    /// `true` for domain rejections the caller should treat as a
    /// normal negative outcome rather than a system fault.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::DuplicateEdge { .. } | Self::CycleDetected { .. } | Self::EdgeNotFound { .. }
        )
    }
}

fn require_namespace(dag_id: &str) -> Result<(), ClosureError> {
    if dag_id.is_empty() {
        return Err(ClosureError::EmptyNamespace);
    }
    Ok(())
}

/// Insert a direct edge `start -> end` and materialize every path it
/// implies.
///
/// The three derived families keep the closure complete: fan-in
/// (ascendants of `start` now reach `end`), fan-out (`start` now
/// reaches descendants of `end`) and their cross product. Cost is
/// proportional to in-degree(start) × out-degree(end) in closure
/// terms. Must run inside a caller-managed transaction.
///
/// # Errors
///
/// [`ClosureError::EmptyNamespace`] for an empty `dag_id`,
/// [`ClosureError::DuplicateEdge`] if the direct edge already exists
/// in the namespace, [`ClosureError::CycleDetected`] if `end` already
/// reaches `start` (or equals it), [`ClosureError::Db`] on persistence
/// failure.
pub fn add_edge<V: EntityId>(
    conn: &Connection,
    dag_id: &str,
    start: &V,
    end: &V,
) -> Result<(), ClosureError> {
    require_namespace(dag_id)?;
    debug!(dag_id, %start, %end, "add edge");

    let duplicates: i64 = conn.query_row(
        "SELECT COUNT(*) FROM dag_edges
         WHERE dag_id = ?1 AND start_vertex_id = ?2 AND end_vertex_id = ?3 AND hops = 0",
        params![dag_id, start, end],
        |row| row.get(0),
    )?;
    if duplicates > 0 {
        return Err(ClosureError::DuplicateEdge {
            dag_id: dag_id.to_string(),
            start: start.to_string(),
            end: end.to_string(),
        });
    }

    // Cycle check against the materialized ascendant set: the closure
    // is complete at all times, so no traversal is needed.
    if start == end || incoming_vertices(conn, dag_id, start)?.contains(end) {
        return Err(ClosureError::CycleDetected {
            dag_id: dag_id.to_string(),
            start: start.to_string(),
            end: end.to_string(),
        });
    }

    conn.execute(
        "INSERT INTO dag_edges (start_vertex_id, end_vertex_id, hops, dag_id)
         VALUES (?1, ?2, 0, ?3)",
        params![start, end, dag_id],
    )?;
    let id = conn.last_insert_rowid();

    // A direct edge is its own lineage; the rowid is only known after
    // the insert, hence the second write.
    conn.execute(
        "UPDATE dag_edges
         SET entry_edge_id = ?1, direct_edge_id = ?1, exit_edge_id = ?1
         WHERE id = ?1",
        params![id],
    )?;

    // Fan-in: every X -> start becomes X -> end, one hop longer.
    let fan_in = conn.execute(
        "INSERT INTO dag_edges
             (entry_edge_id, direct_edge_id, exit_edge_id,
              start_vertex_id, end_vertex_id, hops, dag_id)
         SELECT id, ?1, ?1, start_vertex_id, ?2, hops + 1, ?3
         FROM dag_edges
         WHERE dag_id = ?3 AND end_vertex_id = ?4",
        params![id, end, dag_id, start],
    )?;

    // Fan-out: start now reaches everything end -> Y reached.
    let fan_out = conn.execute(
        "INSERT INTO dag_edges
             (entry_edge_id, direct_edge_id, exit_edge_id,
              start_vertex_id, end_vertex_id, hops, dag_id)
         SELECT ?1, ?1, id, ?2, end_vertex_id, hops + 1, ?3
         FROM dag_edges
         WHERE dag_id = ?3 AND start_vertex_id = ?4",
        params![id, start, dag_id, end],
    )?;

    // Cross product: every ascendant of start reaches every
    // descendant of end through the new edge.
    let cross = conn.execute(
        "INSERT INTO dag_edges
             (entry_edge_id, direct_edge_id, exit_edge_id,
              start_vertex_id, end_vertex_id, hops, dag_id)
         SELECT a.id, ?1, b.id, a.start_vertex_id, b.end_vertex_id,
                a.hops + b.hops + 1, ?2
         FROM dag_edges a, dag_edges b
         WHERE a.dag_id = ?2 AND b.dag_id = ?2
           AND a.end_vertex_id = ?3 AND b.start_vertex_id = ?4",
        params![id, dag_id, start, end],
    )?;

    debug!(dag_id, id, fan_in, fan_out, cross, "materialized implied edges");
    Ok(())
}

/// Remove the direct edge `start -> end` and cascade-delete every
/// implied row that depended on it. Must run inside a caller-managed
/// transaction.
///
/// # Errors
///
/// [`ClosureError::EmptyNamespace`] for an empty `dag_id`,
/// [`ClosureError::EdgeNotFound`] if no direct edge exists in the
/// namespace, [`ClosureError::Db`] on persistence failure.
pub fn remove_edge<V: EntityId>(
    conn: &Connection,
    dag_id: &str,
    start: &V,
    end: &V,
) -> Result<(), ClosureError> {
    require_namespace(dag_id)?;
    debug!(dag_id, %start, %end, "remove edge");

    let id: Option<i64> = conn
        .query_row(
            "SELECT id FROM dag_edges
             WHERE dag_id = ?1 AND start_vertex_id = ?2 AND end_vertex_id = ?3 AND hops = 0
             LIMIT 1",
            params![dag_id, start, end],
            |row| row.get(0),
        )
        .optional()?;

    match id {
        Some(id) => {
            cascade_remove(conn, id)?;
            Ok(())
        }
        None => Err(ClosureError::EdgeNotFound {
            dag_id: dag_id.to_string(),
            start: start.to_string(),
            end: end.to_string(),
        }),
    }
}

/// Remove every edge row (direct or implied) touching `vertex`, each
/// with full cascade, used when a vertex disappears entirely. Must
/// run inside a caller-managed transaction.
///
/// # Errors
///
/// [`ClosureError::EmptyNamespace`] for an empty `dag_id`,
/// [`ClosureError::Db`] on persistence failure.
pub fn remove_edges_of_vertex<V: EntityId>(
    conn: &Connection,
    dag_id: &str,
    vertex: &V,
) -> Result<(), ClosureError> {
    require_namespace(dag_id)?;
    debug!(dag_id, %vertex, "remove edges of vertex");

    let mut stmt = conn.prepare(
        "SELECT id FROM dag_edges
         WHERE dag_id = ?1 AND (start_vertex_id = ?2 OR end_vertex_id = ?2)",
    )?;
    let ids: Vec<i64> = stmt
        .query_map(params![dag_id, vertex], |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    // A cascade may already have deleted a later id in the list;
    // cascading a gone id is a no-op.
    for id in ids {
        cascade_remove(conn, id)?;
    }
    Ok(())
}

/// The full ascendant set of `vertex`: every start vertex of a row
/// ending at it. One query, since the closure is always materialized.
///
/// # Errors
///
/// [`ClosureError::EmptyNamespace`] for an empty `dag_id`,
/// [`ClosureError::Db`] on persistence failure.
pub fn incoming_vertices<V: EntityId>(
    conn: &Connection,
    dag_id: &str,
    vertex: &V,
) -> Result<HashSet<V>, ClosureError> {
    require_namespace(dag_id)?;

    let mut stmt = conn.prepare(
        "SELECT start_vertex_id FROM dag_edges
         WHERE dag_id = ?1 AND end_vertex_id = ?2",
    )?;
    let set = stmt
        .query_map(params![dag_id, vertex], |row| row.get(0))?
        .collect::<Result<HashSet<V>, _>>()?;
    Ok(set)
}

/// The full descendant set of `vertex`; symmetric to
/// [`incoming_vertices`].
///
/// # Errors
///
/// [`ClosureError::EmptyNamespace`] for an empty `dag_id`,
/// [`ClosureError::Db`] on persistence failure.
pub fn outgoing_vertices<V: EntityId>(
    conn: &Connection,
    dag_id: &str,
    vertex: &V,
) -> Result<HashSet<V>, ClosureError> {
    require_namespace(dag_id)?;

    let mut stmt = conn.prepare(
        "SELECT end_vertex_id FROM dag_edges
         WHERE dag_id = ?1 AND start_vertex_id = ?2",
    )?;
    let set = stmt
        .query_map(params![dag_id, vertex], |row| row.get(0))?
        .collect::<Result<HashSet<V>, _>>()?;
    Ok(set)
}

/// Every row of the namespace in insertion order. Diagnostic
/// accessor; the invariant-checking tests lean on it.
///
/// # Errors
///
/// [`ClosureError::EmptyNamespace`] for an empty `dag_id`,
/// [`ClosureError::Db`] on persistence failure.
pub fn edges<V: EntityId>(conn: &Connection, dag_id: &str) -> Result<Vec<Edge<V>>, ClosureError> {
    require_namespace(dag_id)?;

    let mut stmt = conn.prepare(
        "SELECT id, entry_edge_id, direct_edge_id, exit_edge_id,
                start_vertex_id, end_vertex_id, hops, dag_id
         FROM dag_edges
         WHERE dag_id = ?1
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![dag_id], |row| Edge::from_row(row))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Delete a direct edge's whole dependency closure.
///
/// Seeds with the edge itself plus the generation of implied rows its
/// insertion created (`direct_edge_id`), then runs the lineage
/// fixpoint: any implied row whose entry or exit edge is already
/// marked must go too, transitively.
fn cascade_remove(conn: &Connection, edge_id: i64) -> Result<usize, rusqlite::Error> {
    let mut remove: BTreeSet<i64> = BTreeSet::new();
    remove.insert(edge_id);

    let mut stmt = conn.prepare("SELECT id FROM dag_edges WHERE direct_edge_id = ?1")?;
    for id in stmt.query_map([edge_id], |row| row.get::<_, i64>(0))? {
        remove.insert(id?);
    }

    loop {
        let ids: Vec<i64> = remove.iter().copied().collect();
        let ph = placeholders(ids.len());
        let sql = format!(
            "SELECT id FROM dag_edges
             WHERE hops > 0
               AND (entry_edge_id IN ({ph}) OR exit_edge_id IN ({ph}))
               AND id NOT IN ({ph})"
        );
        let mut stmt = conn.prepare(&sql)?;
        let found: Vec<i64> = stmt
            .query_map(
                params_from_iter(ids.iter().chain(ids.iter()).chain(ids.iter())),
                |row| row.get(0),
            )?
            .collect::<Result<_, _>>()?;
        if found.is_empty() {
            break;
        }
        remove.extend(found);
    }

    let ids: Vec<i64> = remove.iter().copied().collect();
    let sql = format!(
        "DELETE FROM dag_edges WHERE id IN ({})",
        placeholders(ids.len())
    );
    let deleted = conn.execute(&sql, params_from_iter(ids.iter()))?;
    debug!(edge_id, deleted, "cascade removed edge rows");
    Ok(deleted)
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}
