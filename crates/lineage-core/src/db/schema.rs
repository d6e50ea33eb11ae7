//! Canonical SQLite schema for the relationship stores.
//!
//! Two unrelated tables share one database file:
//! - `dag_edges` materializes the transitive closure of a DAG; every
//!   reachable vertex pair has at least one row, direct edges have
//!   `hops = 0`, and the lineage columns (`entry_edge_id`,
//!   `direct_edge_id`, `exit_edge_id`) record which insertions caused
//!   an implied row so cascade deletion can find its dependents.
//! - `tree_nodes` holds nested-set intervals; ancestry within one
//!   `tree_id` is strict interval containment.
//!
//! `start_vertex_id`, `end_vertex_id` and `node_id` deliberately carry
//! no declared type so the columns get BLOB affinity and caller-chosen
//! id types round trip without coercion.

/// Migration v1: both store tables plus their read-path indexes.
pub const MIGRATION_V1_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS dag_edges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entry_edge_id INTEGER,
    direct_edge_id INTEGER,
    exit_edge_id INTEGER,
    start_vertex_id NOT NULL,
    end_vertex_id NOT NULL,
    hops INTEGER NOT NULL CHECK (hops >= 0),
    dag_id TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_dag_edges_start
    ON dag_edges(dag_id, start_vertex_id);

CREATE INDEX IF NOT EXISTS idx_dag_edges_end
    ON dag_edges(dag_id, end_vertex_id);

CREATE INDEX IF NOT EXISTS idx_dag_edges_direct
    ON dag_edges(direct_edge_id);

CREATE INDEX IF NOT EXISTS idx_dag_edges_entry
    ON dag_edges(entry_edge_id);

CREATE INDEX IF NOT EXISTS idx_dag_edges_exit
    ON dag_edges(exit_edge_id);

CREATE TABLE IF NOT EXISTS tree_nodes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    node_id NOT NULL,
    low INTEGER NOT NULL,
    high INTEGER NOT NULL CHECK (high > low),
    tree_id TEXT NOT NULL,
    tree_type TEXT NOT NULL,
    UNIQUE (tree_type, node_id)
);

CREATE INDEX IF NOT EXISTS idx_tree_nodes_span
    ON tree_nodes(tree_type, tree_id, low, high);
"#;

/// Indexes expected by the closure and interval query paths.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_dag_edges_start",
    "idx_dag_edges_end",
    "idx_dag_edges_direct",
    "idx_dag_edges_entry",
    "idx_dag_edges_exit",
    "idx_tree_nodes_span",
];
