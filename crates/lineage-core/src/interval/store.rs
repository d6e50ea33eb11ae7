//! Interval maintenance operations.

#![allow(clippy::module_name_repetitions)]

use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use super::node::Node;
use crate::EntityId;

/// Errors surfaced by the interval store.
///
/// `NodeNotFound`, `NotAChild`, `ChildAttached` and `SameTree` are
/// domain rejections. `EmptyNamespace` is a precondition violation.
/// `Db` is an infrastructure fault propagated unmodified; rollback of
/// the enclosing transaction undoes any partial mutation.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// The `tree_type` namespace key was empty.
    #[error("namespace (tree_type) must not be empty")]
    EmptyNamespace,

    /// The named node does not exist in the namespace.
    #[error("node {node_id} does not exist in '{tree_type}'")]
    NodeNotFound { tree_type: String, node_id: String },

    /// The parent/child relation to remove does not exist.
    #[error("{child} is not a child of {parent} in '{tree_type}'")]
    NotAChild {
        tree_type: String,
        parent: String,
        child: String,
    },

    /// The child already has a parent; re-parenting goes through
    /// [`move_child`].
    #[error("{child} already has a parent in '{tree_type}'; use move_child to re-parent")]
    ChildAttached { tree_type: String, child: String },

    /// Both endpoints already belong to the same tree; attaching
    /// would nest a tree inside itself.
    #[error("{parent} and {child} are already members of the same tree in '{tree_type}'")]
    SameTree {
        tree_type: String,
        parent: String,
        child: String,
    },

    /// Underlying persistence failure.
    #[error(transparent)]
    Db(#[from] rusqlite::Error),
}

impl TreeError {
    /// `true` for domain rejections the caller should treat as a
    /// normal negative outcome rather than a system fault.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::NodeNotFound { .. }
                | Self::NotAChild { .. }
                | Self::ChildAttached { .. }
                | Self::SameTree { .. }
        )
    }
}

fn require_namespace(tree_type: &str) -> Result<(), TreeError> {
    if tree_type.is_empty() {
        return Err(TreeError::EmptyNamespace);
    }
    Ok(())
}

/// Attach `child` (and its whole subtree) as the last child of
/// `parent`. Either endpoint missing from the namespace is created as
/// a bare `(1, 2)` root first. Must run inside a caller-managed
/// transaction.
///
/// # Errors
///
/// [`TreeError::EmptyNamespace`] for an empty `tree_type`,
/// [`TreeError::SameTree`] when the endpoints already share a tree
/// (including `parent == child`), [`TreeError::ChildAttached`] when
/// the child already has a parent, [`TreeError::Db`] on persistence
/// failure.
pub fn add_child<N: EntityId>(
    conn: &Connection,
    tree_type: &str,
    parent_id: &N,
    child_id: &N,
) -> Result<(), TreeError> {
    require_namespace(tree_type)?;
    if parent_id == child_id {
        return Err(TreeError::SameTree {
            tree_type: tree_type.to_string(),
            parent: parent_id.to_string(),
            child: child_id.to_string(),
        });
    }
    debug!(tree_type, %parent_id, %child_id, "add child");

    let parent = get_node(conn, tree_type, parent_id)?;
    let child = get_node(conn, tree_type, child_id)?;

    if let (Some(parent), Some(child)) = (&parent, &child) {
        if parent.tree_id == child.tree_id {
            return Err(TreeError::SameTree {
                tree_type: tree_type.to_string(),
                parent: parent_id.to_string(),
                child: child_id.to_string(),
            });
        }
    }
    if let Some(child) = &child {
        if get_parent(conn, child)?.is_some() {
            return Err(TreeError::ChildAttached {
                tree_type: tree_type.to_string(),
                child: child_id.to_string(),
            });
        }
    }

    let parent = match parent {
        Some(parent) => parent,
        None => create(conn, tree_type, parent_id)?,
    };
    let child = match child {
        Some(child) => child,
        None => create(conn, tree_type, child_id)?,
    };

    attach(conn, &parent, &child)
}

/// Remove the direct parent/child relation. A leaf child's row is
/// deleted; a child with a subtree becomes the root of its own
/// standalone tree. Must run inside a caller-managed transaction.
///
/// # Errors
///
/// [`TreeError::EmptyNamespace`] for an empty `tree_type`,
/// [`TreeError::NodeNotFound`] when either endpoint is missing,
/// [`TreeError::NotAChild`] when `parent` is not the child's direct
/// parent, [`TreeError::Db`] on persistence failure.
pub fn remove_child<N: EntityId>(
    conn: &Connection,
    tree_type: &str,
    parent_id: &N,
    child_id: &N,
) -> Result<(), TreeError> {
    require_namespace(tree_type)?;
    debug!(tree_type, %parent_id, %child_id, "remove child");

    let parent =
        get_node(conn, tree_type, parent_id)?.ok_or_else(|| TreeError::NodeNotFound {
            tree_type: tree_type.to_string(),
            node_id: parent_id.to_string(),
        })?;
    let child = get_node(conn, tree_type, child_id)?.ok_or_else(|| TreeError::NodeNotFound {
        tree_type: tree_type.to_string(),
        node_id: child_id.to_string(),
    })?;

    match get_parent(conn, &child)? {
        Some(direct) if direct.id == parent.id => {}
        _ => {
            return Err(TreeError::NotAChild {
                tree_type: tree_type.to_string(),
                parent: parent_id.to_string(),
                child: child_id.to_string(),
            });
        }
    }

    detach(conn, &parent, &child, true)
}

/// Re-parent `child` under `new_parent`: detach from the current
/// parent (keeping the child's subtree as a standalone tree), then
/// attach. Missing endpoints are created like in [`add_child`]. Must
/// run inside a caller-managed transaction.
///
/// # Errors
///
/// As [`add_child`]; in particular [`TreeError::SameTree`] when the
/// new parent sits inside the child's own subtree.
pub fn move_child<N: EntityId>(
    conn: &Connection,
    tree_type: &str,
    new_parent_id: &N,
    child_id: &N,
) -> Result<(), TreeError> {
    require_namespace(tree_type)?;
    debug!(tree_type, %new_parent_id, %child_id, "move child");

    if let Some(child) = get_node(conn, tree_type, child_id)? {
        if let Some(current) = get_parent(conn, &child)? {
            detach(conn, &current, &child, false)?;
        }
    }
    add_child(conn, tree_type, new_parent_id, child_id)
}

/// Dissolve a node: detach it from its parent, delete it, drop its
/// leaf children and promote each non-leaf child to the root of its
/// own standalone tree. A missing node is a no-op. Must run inside a
/// caller-managed transaction.
///
/// Direct children are computed iteratively from one subtree snapshot
/// (subtree ranges are contiguous, so in ascending `low` order the
/// first row not consumed by a previous child's range starts the next
/// child), with no recursion tied to tree depth.
///
/// # Errors
///
/// [`TreeError::EmptyNamespace`] for an empty `tree_type`,
/// [`TreeError::Db`] on persistence failure.
pub fn delete_node<N: EntityId>(
    conn: &Connection,
    tree_type: &str,
    node_id: &N,
) -> Result<(), TreeError> {
    require_namespace(tree_type)?;
    debug!(tree_type, %node_id, "delete node");

    let Some(mut node) = get_node(conn, tree_type, node_id)? else {
        return Ok(());
    };

    if let Some(parent) = get_parent(conn, &node)? {
        detach(conn, &parent, &node, true)?;
        match get_node(conn, tree_type, node_id)? {
            Some(fresh) => node = fresh,
            // Was a leaf; the row is already gone.
            None => return Ok(()),
        }
    }

    if !node.is_leaf() {
        for child_id in direct_children(conn, &node)? {
            // Every removal shifts intervals; re-fetch both sides.
            let Some(node_now) = get_node(conn, tree_type, node_id)? else {
                break;
            };
            let Some(child_now) = get_node(conn, tree_type, &child_id)? else {
                continue;
            };
            detach(conn, &node_now, &child_now, true)?;
        }
    }

    // A childless root has no relation left to dissolve; drop the row.
    if let Some(node_now) = get_node(conn, tree_type, node_id)? {
        if node_now.is_root_without_child() {
            conn.execute("DELETE FROM tree_nodes WHERE id = ?1", [node_now.id])?;
        }
    }
    Ok(())
}

/// All nodes strictly inside the node's interval, ascending by `low`:
/// pre-order traversal of the subtree, excluding the node itself. A
/// missing node yields an empty list.
///
/// # Errors
///
/// [`TreeError::EmptyNamespace`] for an empty `tree_type`,
/// [`TreeError::Db`] on persistence failure.
pub fn subtree<N: EntityId>(
    conn: &Connection,
    tree_type: &str,
    node_id: &N,
) -> Result<Vec<N>, TreeError> {
    require_namespace(tree_type)?;

    let Some(node) = get_node(conn, tree_type, node_id)? else {
        return Ok(Vec::new());
    };
    if node.is_leaf() {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare(
        "SELECT node_id FROM tree_nodes
         WHERE tree_type = ?1 AND tree_id = ?2 AND low > ?3 AND high < ?4
         ORDER BY low ASC",
    )?;
    let ids = stmt
        .query_map(
            params![node.tree_type, node.tree_id, node.low, node.high],
            |row| row.get(0),
        )?
        .collect::<Result<Vec<N>, _>>()?;
    Ok(ids)
}

/// Look up a node row by its caller-chosen id. Diagnostic accessor;
/// the invariant-checking tests lean on it.
///
/// # Errors
///
/// [`TreeError::EmptyNamespace`] for an empty `tree_type`,
/// [`TreeError::Db`] on persistence failure.
pub fn get_node<N: EntityId>(
    conn: &Connection,
    tree_type: &str,
    node_id: &N,
) -> Result<Option<Node<N>>, TreeError> {
    require_namespace(tree_type)?;

    let found = conn
        .query_row(
            "SELECT id, node_id, low, high, tree_id, tree_type FROM tree_nodes
             WHERE tree_type = ?1 AND node_id = ?2",
            params![tree_type, node_id],
            Node::from_row,
        )
        .optional()?;
    Ok(found)
}

/// Nearest strictly-containing node in the same tree, or `None` for a
/// root.
fn get_parent<N: EntityId>(
    conn: &Connection,
    node: &Node<N>,
) -> Result<Option<Node<N>>, TreeError> {
    if node.is_root() {
        return Ok(None);
    }

    let found = conn
        .query_row(
            "SELECT id, node_id, low, high, tree_id, tree_type FROM tree_nodes
             WHERE tree_type = ?1 AND tree_id = ?2 AND low < ?3 AND high > ?4
             ORDER BY low DESC
             LIMIT 1",
            params![node.tree_type, node.tree_id, node.low, node.high],
            Node::from_row,
        )
        .optional()?;
    Ok(found)
}

fn create<N: EntityId>(
    conn: &Connection,
    tree_type: &str,
    node_id: &N,
) -> Result<Node<N>, TreeError> {
    conn.execute(
        "INSERT INTO tree_nodes (node_id, low, high, tree_id, tree_type)
         VALUES (?1, 1, 2, ?2, ?3)",
        params![node_id, node_id.to_string(), tree_type],
    )?;
    Ok(Node {
        id: conn.last_insert_rowid(),
        node_id: node_id.clone(),
        low: 1,
        high: 2,
        tree_id: node_id.to_string(),
        tree_type: tree_type.to_string(),
    })
}

fn attach<N: EntityId>(
    conn: &Connection,
    parent: &Node<N>,
    child: &Node<N>,
) -> Result<(), TreeError> {
    let offset = 2 * child.size();
    // Make room after the parent's current rightmost child, widen
    // every ancestor (the parent included), then slide the child's
    // tree into the gap.
    shift_follow_ups(conn, parent, parent.high, offset)?;
    shift_ancestor_highs(conn, parent, offset)?;
    relocate_subtree(conn, child, &parent.tree_id, parent.high - child.low)?;
    Ok(())
}

fn detach<N: EntityId>(
    conn: &Connection,
    parent: &Node<N>,
    child: &Node<N>,
    delete_leaf: bool,
) -> Result<(), TreeError> {
    if delete_leaf && child.is_leaf() {
        conn.execute("DELETE FROM tree_nodes WHERE id = ?1", [child.id])?;
    } else {
        // The child becomes the root of its own standalone tree,
        // compacted to start at low = 1.
        relocate_subtree(conn, child, &child.node_id.to_string(), 1 - child.low)?;
    }

    let offset = 2 * child.size();
    shift_follow_ups(conn, parent, child.high, -offset)?;
    shift_ancestor_highs(conn, parent, -offset)?;

    // A root that lost its last child is useless; drop it.
    if let Some(parent_now) = get_node(conn, &parent.tree_type, &parent.node_id)? {
        if parent_now.is_root_without_child() {
            conn.execute("DELETE FROM tree_nodes WHERE id = ?1", [parent_now.id])?;
        }
    }
    Ok(())
}

/// Shift both bounds of every node in the parent's tree placed after
/// `after_low`.
fn shift_follow_ups<N: EntityId>(
    conn: &Connection,
    parent: &Node<N>,
    after_low: i64,
    offset: i64,
) -> Result<(), TreeError> {
    let shifted = conn.execute(
        "UPDATE tree_nodes SET low = low + ?1, high = high + ?1
         WHERE tree_type = ?2 AND tree_id = ?3 AND low > ?4",
        params![offset, parent.tree_type, parent.tree_id, after_low],
    )?;
    debug!(offset, shifted, "shifted follow-up nodes");
    Ok(())
}

/// Widen/narrow the upper bound of every node containing the parent's
/// interval, the parent row itself included.
fn shift_ancestor_highs<N: EntityId>(
    conn: &Connection,
    parent: &Node<N>,
    offset: i64,
) -> Result<(), TreeError> {
    let shifted = conn.execute(
        "UPDATE tree_nodes SET high = high + ?1
         WHERE tree_type = ?2 AND tree_id = ?3 AND low <= ?4 AND high >= ?5",
        params![offset, parent.tree_type, parent.tree_id, parent.low, parent.high],
    )?;
    debug!(offset, shifted, "shifted ancestor bounds");
    Ok(())
}

/// Move the child's whole contiguous range into `new_tree_id`,
/// shifting both bounds by `delta`.
fn relocate_subtree<N: EntityId>(
    conn: &Connection,
    child: &Node<N>,
    new_tree_id: &str,
    delta: i64,
) -> Result<(), TreeError> {
    let moved = conn.execute(
        "UPDATE tree_nodes SET low = low + ?1, high = high + ?1, tree_id = ?2
         WHERE tree_type = ?3 AND tree_id = ?4 AND low >= ?5 AND high <= ?6",
        params![
            delta,
            new_tree_id,
            child.tree_type,
            child.tree_id,
            child.low,
            child.high
        ],
    )?;
    debug!(delta, moved, new_tree_id, "relocated subtree");
    Ok(())
}

/// Direct children of a node, ascending by `low`, computed from one
/// subtree snapshot.
fn direct_children<N: EntityId>(conn: &Connection, node: &Node<N>) -> Result<Vec<N>, TreeError> {
    let mut stmt = conn.prepare(
        "SELECT node_id, low, high FROM tree_nodes
         WHERE tree_type = ?1 AND tree_id = ?2 AND low > ?3 AND high < ?4
         ORDER BY low ASC",
    )?;
    let rows: Vec<(N, i64, i64)> = stmt
        .query_map(
            params![node.tree_type, node.tree_id, node.low, node.high],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?
        .collect::<Result<_, _>>()?;

    let mut children = Vec::new();
    let mut consumed_until = i64::MIN;
    for (id, low, high) in rows {
        if low > consumed_until {
            children.push(id);
            consumed_until = high;
        }
    }
    Ok(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn conn() -> Connection {
        crate::db::open_in_memory().expect("open in-memory store")
    }

    fn s(v: &str) -> String {
        v.to_string()
    }

    fn bounds(conn: &Connection, id: &str) -> (i64, i64) {
        let node = get_node(conn, "org", &s(id))
            .expect("get node")
            .unwrap_or_else(|| panic!("node {id} should exist"));
        (node.low, node.high)
    }

    #[test]
    fn add_child_auto_creates_both_endpoints() {
        let conn = conn();
        add_child(&conn, "org", &s("R"), &s("X")).expect("R->X");

        assert_eq!(bounds(&conn, "R"), (1, 4));
        assert_eq!(bounds(&conn, "X"), (2, 3));
        let root = get_node(&conn, "org", &s("R")).expect("get").expect("R");
        assert_eq!(root.tree_id, "R");
        let child = get_node(&conn, "org", &s("X")).expect("get").expect("X");
        assert_eq!(child.tree_id, "R");
    }

    #[test]
    fn siblings_sit_side_by_side_in_add_order() {
        let conn = conn();
        add_child(&conn, "org", &s("R"), &s("X")).expect("R->X");
        add_child(&conn, "org", &s("R"), &s("Y")).expect("R->Y");

        assert_eq!(bounds(&conn, "R"), (1, 6));
        assert_eq!(bounds(&conn, "X"), (2, 3));
        assert_eq!(bounds(&conn, "Y"), (4, 5));
        assert_eq!(subtree(&conn, "org", &s("R")).expect("subtree"), vec![
            s("X"),
            s("Y")
        ]);
    }

    #[test]
    fn grandchild_nests_inside_both_ancestors() {
        let conn = conn();
        add_child(&conn, "org", &s("R"), &s("X")).expect("R->X");
        add_child(&conn, "org", &s("X"), &s("Z")).expect("X->Z");

        assert_eq!(bounds(&conn, "R"), (1, 6));
        assert_eq!(bounds(&conn, "X"), (2, 5));
        assert_eq!(bounds(&conn, "Z"), (3, 4));
        assert_eq!(subtree(&conn, "org", &s("R")).expect("subtree"), vec![
            s("X"),
            s("Z")
        ]);
        assert_eq!(subtree(&conn, "org", &s("X")).expect("subtree"), vec![s(
            "Z"
        )]);
    }

    #[test]
    fn attaching_whole_tree_keeps_its_shape() {
        let conn = conn();
        // Standalone tree: X -> Z.
        add_child(&conn, "org", &s("X"), &s("Z")).expect("X->Z");
        // R does not exist yet; both trees merge under a fresh root.
        add_child(&conn, "org", &s("R"), &s("X")).expect("R->X");

        assert_eq!(bounds(&conn, "R"), (1, 6));
        assert_eq!(bounds(&conn, "X"), (2, 5));
        assert_eq!(bounds(&conn, "Z"), (3, 4));
        let z = get_node(&conn, "org", &s("Z")).expect("get").expect("Z");
        assert_eq!(z.tree_id, "R");
    }

    #[test]
    fn add_child_rejects_same_tree_and_self() {
        let conn = conn();
        add_child(&conn, "org", &s("R"), &s("X")).expect("R->X");
        add_child(&conn, "org", &s("R"), &s("Y")).expect("R->Y");

        let err = add_child(&conn, "org", &s("X"), &s("Y")).expect_err("same tree");
        assert!(matches!(err, TreeError::SameTree { .. }));
        assert!(err.is_rejection());

        let err = add_child(&conn, "org", &s("X"), &s("X")).expect_err("self");
        assert!(matches!(err, TreeError::SameTree { .. }));
    }

    #[test]
    fn add_child_rejects_attached_child() {
        let conn = conn();
        add_child(&conn, "org", &s("R"), &s("X")).expect("R->X");

        let err = add_child(&conn, "org", &s("Other"), &s("X")).expect_err("attached");
        assert!(matches!(err, TreeError::ChildAttached { .. }));
        // The would-be parent must not have been auto-created.
        assert!(
            get_node(&conn, "org", &s("Other"))
                .expect("get")
                .is_none()
        );
    }

    #[test]
    fn remove_leaf_child_deletes_it_and_shrinks_the_tree() {
        let conn = conn();
        add_child(&conn, "org", &s("R"), &s("X")).expect("R->X");
        add_child(&conn, "org", &s("R"), &s("Y")).expect("R->Y");

        remove_child(&conn, "org", &s("R"), &s("X")).expect("remove X");

        assert!(get_node(&conn, "org", &s("X")).expect("get").is_none());
        assert_eq!(bounds(&conn, "R"), (1, 4));
        assert_eq!(bounds(&conn, "Y"), (2, 3));
        assert_eq!(subtree(&conn, "org", &s("R")).expect("subtree"), vec![s(
            "Y"
        )]);
    }

    #[test]
    fn remove_subtree_child_detaches_it_standalone() {
        let conn = conn();
        add_child(&conn, "org", &s("R"), &s("X")).expect("R->X");
        add_child(&conn, "org", &s("X"), &s("Z")).expect("X->Z");

        remove_child(&conn, "org", &s("R"), &s("X")).expect("detach X");

        // X rides off as its own compacted tree...
        let x = get_node(&conn, "org", &s("X")).expect("get").expect("X");
        assert_eq!(x.tree_id, "X");
        assert_eq!((x.low, x.high), (1, 4));
        assert_eq!(subtree(&conn, "org", &s("X")).expect("subtree"), vec![s(
            "Z"
        )]);
        // ...and R, a root without children left, is dropped.
        assert!(get_node(&conn, "org", &s("R")).expect("get").is_none());
    }

    #[test]
    fn remove_child_rejects_missing_nodes_and_non_children() {
        let conn = conn();
        add_child(&conn, "org", &s("R"), &s("X")).expect("R->X");
        add_child(&conn, "org", &s("X"), &s("Z")).expect("X->Z");

        let err = remove_child(&conn, "org", &s("R"), &s("Nope")).expect_err("missing child");
        assert!(matches!(err, TreeError::NodeNotFound { .. }));

        let err = remove_child(&conn, "org", &s("Nope"), &s("X")).expect_err("missing parent");
        assert!(matches!(err, TreeError::NodeNotFound { .. }));

        // Z is a grandchild of R, not a direct child.
        let err = remove_child(&conn, "org", &s("R"), &s("Z")).expect_err("not a child");
        assert!(matches!(err, TreeError::NotAChild { .. }));
    }

    #[test]
    fn move_reparents_to_the_end_of_the_new_parent() {
        let conn = conn();
        add_child(&conn, "org", &s("R"), &s("X")).expect("R->X");
        add_child(&conn, "org", &s("R"), &s("Y")).expect("R->Y");

        move_child(&conn, "org", &s("Y"), &s("X")).expect("X under Y");

        assert_eq!(bounds(&conn, "R"), (1, 6));
        assert_eq!(bounds(&conn, "Y"), (2, 5));
        assert_eq!(bounds(&conn, "X"), (3, 4));
        assert_eq!(subtree(&conn, "org", &s("R")).expect("subtree"), vec![
            s("Y"),
            s("X")
        ]);
    }

    #[test]
    fn move_into_own_subtree_is_rejected() {
        let conn = conn();
        add_child(&conn, "org", &s("R"), &s("X")).expect("R->X");
        add_child(&conn, "org", &s("X"), &s("Z")).expect("X->Z");

        let err = move_child(&conn, "org", &s("Z"), &s("X")).expect_err("cycle");
        assert!(matches!(err, TreeError::SameTree { .. }));
    }

    #[test]
    fn move_of_detached_or_missing_child_attaches_it() {
        let conn = conn();
        add_child(&conn, "org", &s("R"), &s("X")).expect("R->X");

        // "New" never existed; move degenerates to add_child.
        move_child(&conn, "org", &s("R"), &s("New")).expect("attach new");
        assert_eq!(subtree(&conn, "org", &s("R")).expect("subtree"), vec![
            s("X"),
            s("New")
        ]);
    }

    #[test]
    fn delete_leaf_removes_single_row() {
        let conn = conn();
        add_child(&conn, "org", &s("R"), &s("X")).expect("R->X");
        add_child(&conn, "org", &s("R"), &s("Y")).expect("R->Y");

        delete_node(&conn, "org", &s("X")).expect("delete X");

        assert!(get_node(&conn, "org", &s("X")).expect("get").is_none());
        assert_eq!(bounds(&conn, "R"), (1, 4));
        assert_eq!(subtree(&conn, "org", &s("R")).expect("subtree"), vec![s(
            "Y"
        )]);
    }

    #[test]
    fn delete_mid_node_drops_leaf_children() {
        let conn = conn();
        add_child(&conn, "org", &s("R"), &s("X")).expect("R->X");
        add_child(&conn, "org", &s("X"), &s("Z")).expect("X->Z");
        add_child(&conn, "org", &s("R"), &s("Y")).expect("R->Y");

        delete_node(&conn, "org", &s("X")).expect("delete X");

        assert!(get_node(&conn, "org", &s("X")).expect("get").is_none());
        assert!(get_node(&conn, "org", &s("Z")).expect("get").is_none());
        assert_eq!(bounds(&conn, "R"), (1, 4));
        assert_eq!(subtree(&conn, "org", &s("R")).expect("subtree"), vec![s(
            "Y"
        )]);
    }

    #[test]
    fn delete_promotes_non_leaf_children_to_standalone_trees() {
        let conn = conn();
        add_child(&conn, "org", &s("R"), &s("X")).expect("R->X");
        add_child(&conn, "org", &s("X"), &s("Z")).expect("X->Z");
        add_child(&conn, "org", &s("Z"), &s("W")).expect("Z->W");

        delete_node(&conn, "org", &s("X")).expect("delete X");

        assert!(get_node(&conn, "org", &s("X")).expect("get").is_none());
        // R lost its last child and is dropped with it.
        assert!(get_node(&conn, "org", &s("R")).expect("get").is_none());
        // Z keeps its subtree as a fresh root.
        let z = get_node(&conn, "org", &s("Z")).expect("get").expect("Z");
        assert_eq!(z.tree_id, "Z");
        assert_eq!((z.low, z.high), (1, 4));
        assert_eq!(subtree(&conn, "org", &s("Z")).expect("subtree"), vec![s(
            "W"
        )]);
    }

    #[test]
    fn delete_bare_root_drops_the_row() {
        let conn = conn();
        conn.execute(
            "INSERT INTO tree_nodes (node_id, low, high, tree_id, tree_type)
             VALUES ('R', 1, 2, 'R', 'org')",
            [],
        )
        .expect("seed bare root");

        delete_node(&conn, "org", &s("R")).expect("delete bare root");
        assert!(get_node(&conn, "org", &s("R")).expect("get").is_none());
    }

    #[test]
    fn delete_missing_node_is_a_no_op() {
        let conn = conn();
        delete_node(&conn, "org", &s("ghost")).expect("no-op");
    }

    #[test]
    fn subtree_of_missing_or_leaf_node_is_empty() {
        let conn = conn();
        assert!(subtree(&conn, "org", &s("ghost")).expect("missing").is_empty());

        add_child(&conn, "org", &s("R"), &s("X")).expect("R->X");
        assert!(subtree(&conn, "org", &s("X")).expect("leaf").is_empty());
    }

    #[test]
    fn size_matches_subtree_row_count() {
        let conn = conn();
        add_child(&conn, "org", &s("R"), &s("X")).expect("R->X");
        add_child(&conn, "org", &s("X"), &s("Z")).expect("X->Z");
        add_child(&conn, "org", &s("R"), &s("Y")).expect("R->Y");

        for id in ["R", "X", "Z", "Y"] {
            let node = get_node(&conn, "org", &s(id)).expect("get").expect("node");
            let below = subtree(&conn, "org", &s(id)).expect("subtree");
            assert_eq!(
                node.size(),
                1 + i64::try_from(below.len()).expect("fits"),
                "size formula disagrees for {id}"
            );
        }
    }

    #[test]
    fn namespaces_are_isolated() {
        let conn = conn();
        add_child(&conn, "org", &s("R"), &s("X")).expect("org tree");
        // The reverse relation in another namespace is independent.
        add_child(&conn, "folders", &s("X"), &s("R")).expect("folders tree");

        assert_eq!(subtree(&conn, "org", &s("R")).expect("subtree"), vec![s(
            "X"
        )]);
        assert_eq!(subtree(&conn, "folders", &s("X")).expect("subtree"), vec![
            s("R")
        ]);
    }

    #[test]
    fn empty_namespace_is_a_precondition_violation() {
        let conn = conn();
        let err = add_child(&conn, "", &s("R"), &s("X")).expect_err("empty tree_type");
        assert!(matches!(err, TreeError::EmptyNamespace));
        assert!(!err.is_rejection());
    }

    #[test]
    fn integer_node_ids_round_trip() {
        let conn = conn();
        add_child(&conn, "org", &1_i64, &2_i64).expect("1->2");
        add_child(&conn, "org", &1_i64, &3_i64).expect("1->3");

        let root = get_node(&conn, "org", &1_i64).expect("get").expect("root");
        assert_eq!(root.tree_id, "1");
        assert_eq!(subtree(&conn, "org", &1_i64).expect("subtree"), vec![
            2_i64, 3_i64
        ]);
    }

    #[test]
    fn end_to_end_scenario() {
        let conn = conn();
        add_child(&conn, "org", &s("R"), &s("X")).expect("R->X");
        add_child(&conn, "org", &s("R"), &s("Y")).expect("R->Y");
        assert_eq!(subtree(&conn, "org", &s("R")).expect("subtree"), vec![
            s("X"),
            s("Y")
        ]);

        let before = bounds(&conn, "R");
        remove_child(&conn, "org", &s("R"), &s("X")).expect("remove X");
        assert_eq!(subtree(&conn, "org", &s("R")).expect("subtree"), vec![s(
            "Y"
        )]);
        let after = bounds(&conn, "R");
        assert_eq!(after.1, before.1 - 2);
    }
}
