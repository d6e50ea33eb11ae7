//! Nested-set ("interval tree") encoding of strict single-parent trees.
//!
//! # Overview
//!
//! Every node of a tree owns a `[low, high]` interval; a node is an
//! ancestor of another exactly when its interval strictly contains the
//! other's. A subtree is therefore one contiguous range scan ordered
//! by `low`: pre-order traversal without recursion. Disjoint trees
//! share the table, separated by `tree_id` (one per tree, named after
//! its root) inside a `tree_type` namespace.
//!
//! Mutation is where the encoding earns its keep the hard way: adding
//! or removing a child shifts the intervals of everything to the right
//! of the insertion point and widens or narrows every ancestor, so a
//! structural change is a handful of predicate updates rather than a
//! per-node walk.
//!
//! # Transactions
//!
//! [`add_child`], [`remove_child`], [`move_child`] and [`delete_node`]
//! issue several statements and must run inside one caller-managed
//! transaction; see the crate docs.

mod node;
mod store;

pub use node::Node;
pub use store::{TreeError, add_child, delete_node, get_node, move_child, remove_child, subtree};
