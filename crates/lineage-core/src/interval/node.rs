//! Node row type and interval predicates.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use rusqlite::Row;

use crate::EntityId;

/// One row of the `tree_nodes` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node<N> {
    /// Row identity.
    pub id: i64,
    /// Caller-chosen node id, unique per `tree_type`.
    pub node_id: N,
    pub low: i64,
    pub high: i64,
    /// Which disjoint tree the node currently belongs to; equals the
    /// root's node id rendered as text.
    pub tree_id: String,
    /// Namespace partition key.
    pub tree_type: String,
}

impl<N: EntityId> Node<N> {
    /// Column order: `id, node_id, low, high, tree_id, tree_type`.
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            node_id: row.get(1)?,
            low: row.get(2)?,
            high: row.get(3)?,
            tree_id: row.get(4)?,
            tree_type: row.get(5)?,
        })
    }

    /// A leaf occupies the minimal interval.
    pub const fn is_leaf(&self) -> bool {
        self.high - self.low == 1
    }

    /// The root of a tree always starts at `low == 1`.
    pub const fn is_root(&self) -> bool {
        self.low == 1
    }

    /// A root whose interval never widened: no children, nothing to
    /// keep around once it is detached from use.
    pub const fn is_root_without_child(&self) -> bool {
        self.low == 1 && self.high == 2
    }

    /// Node count of the subtree below this node (excluding it).
    pub const fn subtree_size(&self) -> i64 {
        (self.high - 1 - self.low) / 2
    }

    /// Node count of the subtree including the node itself.
    pub const fn size(&self) -> i64 {
        1 + self.subtree_size()
    }

    /// Strict interval containment: `self` is a proper ancestor of
    /// `other` (same tree assumed).
    pub const fn contains(&self, other: &Self) -> bool {
        self.low < other.low && other.high < self.high
    }
}
