//! Materialized transitive closure of a DAG.
//!
//! # Overview
//!
//! Every reachable vertex pair in a namespace (`dag_id`) is kept as a
//! row in `dag_edges`, so ascendant/descendant queries are one indexed
//! lookup with no traversal. The price is paid at mutation time:
//! adding a direct edge bulk-inserts the implied rows it creates
//! (fan-in, fan-out and the cross product of the two), and removing
//! one cascades through the lineage bookkeeping to delete every row
//! that depended on it.
//!
//! # Lineage
//!
//! A direct edge (`hops = 0`) references itself as its own entry,
//! direct and exit edge. An implied edge (`hops > 0`) records the
//! direct edge whose insertion created it (`direct_edge_id`) and the
//! edges contributing its first and last hop (`entry_edge_id`,
//! `exit_edge_id`). Cascade deletion is a fixpoint walk over those
//! references.
//!
//! # Transactions
//!
//! [`add_edge`], [`remove_edge`] and [`remove_edges_of_vertex`] issue
//! several statements and must run inside one caller-managed
//! transaction; see the crate docs.

mod edge;
mod store;

pub use edge::Edge;
pub use store::{
    ClosureError, add_edge, edges, incoming_vertices, outgoing_vertices, remove_edge,
    remove_edges_of_vertex,
};
