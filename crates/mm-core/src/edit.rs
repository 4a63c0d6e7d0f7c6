//! Structural edit primitives.
//!
//! Every function takes the current root and returns a new root; the input
//! tree is never modified. Changing a node rebuilds its spine (the path from
//! the root down to it) and reuses every other subtree by pointer, so
//! `Arc::ptr_eq` holds for all untouched siblings.

use crate::error::{TreeError, TreeResult};
use crate::id::NodeId;
use crate::model::TopicNode;
use crate::tree::{find, is_descendant, position_of, sort_preorder};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

// ─── Spine rebuild ───────────────────────────────────────────────────────

/// Child indices leading from `root` to `id`. Empty for the root itself.
fn index_path(root: &TopicNode, id: NodeId) -> Option<Vec<usize>> {
    fn walk(node: &TopicNode, id: NodeId, path: &mut Vec<usize>) -> bool {
        if node.id == id {
            return true;
        }
        for (i, child) in node.children.iter().enumerate() {
            path.push(i);
            if walk(child, id, path) {
                return true;
            }
            path.pop();
        }
        false
    }

    let mut path = Vec::new();
    walk(root, id, &mut path).then_some(path)
}

fn rebuild_at(
    node: &Arc<TopicNode>,
    path: &[usize],
    f: impl FnOnce(&TopicNode) -> TopicNode,
) -> Arc<TopicNode> {
    match path.split_first() {
        None => Arc::new(f(node)),
        Some((&i, rest)) => {
            let mut copy = TopicNode::clone(node);
            copy.children[i] = rebuild_at(&node.children[i], rest, f);
            Arc::new(copy)
        }
    }
}

/// Replace node `id` with `f(node)` and rebuild its spine.
fn rebuild(
    root: &Arc<TopicNode>,
    id: NodeId,
    f: impl FnOnce(&TopicNode) -> TopicNode,
) -> TreeResult<Arc<TopicNode>> {
    let path = index_path(root, id).ok_or(TreeError::InvalidNodeId(id))?;
    Ok(rebuild_at(root, &path, f))
}

// ─── Insertion ───────────────────────────────────────────────────────────

/// Append `node` to `parent`'s children. A collapsed parent is expanded.
pub fn add_child(
    root: &Arc<TopicNode>,
    parent: NodeId,
    node: impl Into<Arc<TopicNode>>,
) -> TreeResult<Arc<TopicNode>> {
    let node = node.into();
    log::trace!("add_child {} under {parent}", node.id);
    rebuild(root, parent, |p| {
        let mut p = p.clone();
        p.expanded = true;
        p.children.push(node);
        p
    })
}

/// Insert `node` at `index` in `parent`'s children (clamped to the end).
/// The parent's `expanded` flag is left alone.
pub fn insert_child(
    root: &Arc<TopicNode>,
    parent: NodeId,
    index: usize,
    node: impl Into<Arc<TopicNode>>,
) -> TreeResult<Arc<TopicNode>> {
    let node = node.into();
    log::trace!("insert_child {} under {parent} at {index}", node.id);
    rebuild(root, parent, |p| {
        let mut p = p.clone();
        let index = index.min(p.children.len());
        p.children.insert(index, node);
        p
    })
}

/// Insert `node` directly after `id` in `id`'s parent.
pub fn add_sibling(
    root: &Arc<TopicNode>,
    id: NodeId,
    node: impl Into<Arc<TopicNode>>,
) -> TreeResult<Arc<TopicNode>> {
    let (parent, index) = position_of(root, id).ok_or(TreeError::InvalidNodeId(id))?;
    insert_child(root, parent.id, index + 1, node)
}

// ─── Removal ─────────────────────────────────────────────────────────────

/// A subtree cut out of the tree, with the slot it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Detached {
    pub node: Arc<TopicNode>,
    pub parent: NodeId,
    pub index: usize,
}

/// Remove `id` and its subtree, returning the new root and what was cut.
pub fn detach_node(root: &Arc<TopicNode>, id: NodeId) -> TreeResult<(Arc<TopicNode>, Detached)> {
    if root.id == id {
        return Err(TreeError::RootNodeViolation(id));
    }
    let path = index_path(root, id).ok_or(TreeError::InvalidNodeId(id))?;
    let (&index, parent_path) = path.split_last().ok_or(TreeError::RootNodeViolation(id))?;

    let mut cut = None;
    let new_root = rebuild_at(root, parent_path, |p| {
        let mut p = p.clone();
        cut = Some((p.id, p.children.remove(index)));
        p
    });
    let (parent, node) = cut.ok_or(TreeError::InvalidNodeId(id))?;
    log::trace!("detach {id} from {parent} at {index}");
    Ok((new_root, Detached { node, parent, index }))
}

/// Remove `id` and its subtree, discarding what was cut.
pub fn remove_node(root: &Arc<TopicNode>, id: NodeId) -> TreeResult<Arc<TopicNode>> {
    detach_node(root, id).map(|(root, _)| root)
}

// ─── Field updates ───────────────────────────────────────────────────────

/// Apply `patch` to a copy of node `id`. The patch may replace `children`;
/// the id is immutable and is restored if the patch changed it.
pub fn update_node(
    root: &Arc<TopicNode>,
    id: NodeId,
    patch: impl FnOnce(&mut TopicNode),
) -> TreeResult<Arc<TopicNode>> {
    rebuild(root, id, |n| {
        let mut n = n.clone();
        patch(&mut n);
        n.id = id;
        n
    })
}

/// Set the `expanded` flag of `id`. Children are untouched.
pub fn set_expanded(root: &Arc<TopicNode>, id: NodeId, expanded: bool) -> TreeResult<Arc<TopicNode>> {
    update_node(root, id, |n| n.expanded = expanded)
}

/// Flip the `expanded` flag of `id`.
pub fn toggle_expanded(root: &Arc<TopicNode>, id: NodeId) -> TreeResult<Arc<TopicNode>> {
    update_node(root, id, |n| n.expanded = !n.expanded)
}

// ─── Moves ───────────────────────────────────────────────────────────────

/// Where a moved node sat before the move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    pub id: NodeId,
    pub parent: NodeId,
    pub index: usize,
}

/// Everything needed to replay or revert a (batch) move exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    /// Moved nodes in preorder, with their slots captured before any removal.
    pub moved: Vec<Origin>,
    pub target: NodeId,
    /// Index of the first moved node in the target after the move.
    pub insert_at: usize,
    pub target_was_collapsed: bool,
}

impl MovePlan {
    pub fn ids(&self) -> Vec<NodeId> {
        self.moved.iter().map(|o| o.id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.moved.is_empty()
    }
}

/// Move one node under `new_parent`.
///
/// `index` is the slot in `new_parent`'s current children. When reordering
/// within the same parent past the node's own slot, the index is shifted
/// down by one to account for the node's removal. `None` appends.
pub fn move_node(
    root: &Arc<TopicNode>,
    id: NodeId,
    new_parent: NodeId,
    index: Option<usize>,
) -> TreeResult<(Arc<TopicNode>, MovePlan)> {
    if root.id == id {
        return Err(TreeError::RootNodeViolation(id));
    }
    if id == new_parent {
        return Err(TreeError::CycleViolation {
            node: id,
            target: new_parent,
        });
    }
    let node = find(root, id).ok_or(TreeError::InvalidNodeId(id))?;
    if is_descendant(node, new_parent) {
        return Err(TreeError::CycleViolation {
            node: id,
            target: new_parent,
        });
    }
    move_nodes(root, &[id], new_parent, index)
}

/// Move several nodes under `new_parent`, keeping their relative document
/// order regardless of the order `ids` were given in.
///
/// Duplicates, the root and `new_parent` itself are dropped from `ids`. A
/// moved node nested inside another moved node is detached from it and
/// lands as its sibling. `index` is adjusted for moved nodes that already
/// sat in `new_parent` before it; `None` appends.
pub fn move_nodes(
    root: &Arc<TopicNode>,
    ids: &[NodeId],
    new_parent: NodeId,
    index: Option<usize>,
) -> TreeResult<(Arc<TopicNode>, MovePlan)> {
    let mut seen = HashSet::new();
    let mut ids: Vec<NodeId> = ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .filter(|id| *id != root.id && *id != new_parent)
        .collect();

    let target = find(root, new_parent).ok_or(TreeError::InvalidNodeId(new_parent))?;
    let target_was_collapsed = !target.expanded;
    for &id in &ids {
        let node = find(root, id).ok_or(TreeError::InvalidNodeId(id))?;
        if is_descendant(node, new_parent) {
            return Err(TreeError::CycleViolation {
                node: id,
                target: new_parent,
            });
        }
    }

    sort_preorder(root, &mut ids);
    let moved = ids
        .iter()
        .map(|&id| {
            let (parent, index) = position_of(root, id).ok_or(TreeError::InvalidNodeId(id))?;
            Ok(Origin {
                id,
                parent: parent.id,
                index,
            })
        })
        .collect::<TreeResult<Vec<_>>>()?;

    if moved.is_empty() {
        let plan = MovePlan {
            moved,
            target: new_parent,
            insert_at: 0,
            target_was_collapsed,
        };
        return Ok((root.clone(), plan));
    }

    // Deepest first, so nested moved nodes leave their moved ancestors.
    let mut current = root.clone();
    let mut cut = HashMap::new();
    for origin in moved.iter().rev() {
        let (next, detached) = detach_node(&current, origin.id)?;
        cut.insert(origin.id, detached.node);
        current = next;
    }

    if target_was_collapsed {
        current = set_expanded(&current, new_parent, true)?;
    }

    let remaining = find(&current, new_parent)
        .map(|t| t.children.len())
        .ok_or(TreeError::InvalidNodeId(new_parent))?;
    let insert_at = match index {
        Some(requested) => {
            let shifted = moved
                .iter()
                .filter(|o| o.parent == new_parent && o.index < requested)
                .count();
            (requested - shifted).min(remaining)
        }
        None => remaining,
    };

    for (offset, origin) in moved.iter().enumerate() {
        let node = cut.remove(&origin.id).ok_or(TreeError::InvalidNodeId(origin.id))?;
        current = insert_child(&current, new_parent, insert_at + offset, node)?;
    }

    log::trace!("moved {} node(s) under {new_parent} at {insert_at}", moved.len());
    let plan = MovePlan {
        moved,
        target: new_parent,
        insert_at,
        target_was_collapsed,
    };
    Ok((current, plan))
}

/// Put every node of an applied `plan` back where it came from.
pub fn revert_move(root: &Arc<TopicNode>, plan: &MovePlan) -> TreeResult<Arc<TopicNode>> {
    let mut current = root.clone();
    let mut cut = HashMap::new();
    for origin in plan.moved.iter().rev() {
        let (next, detached) = detach_node(&current, origin.id)?;
        cut.insert(origin.id, detached.node);
        current = next;
    }

    if plan.target_was_collapsed {
        current = set_expanded(&current, plan.target, false)?;
    }

    // Preorder puts moved ancestors back before their moved descendants,
    // and siblings back in ascending slot order.
    for origin in &plan.moved {
        let node = cut.remove(&origin.id).ok_or(TreeError::InvalidNodeId(origin.id))?;
        current = insert_child(&current, origin.parent, origin.index, node)?;
    }
    Ok(current)
}

// ─── Reparenting ─────────────────────────────────────────────────────────

/// Splice `new_parent` into the slot `id` occupies, with `id`'s current
/// node as its sole child. Any children already on `new_parent` are
/// replaced.
pub fn insert_parent_node(
    root: &Arc<TopicNode>,
    id: NodeId,
    new_parent: TopicNode,
) -> TreeResult<Arc<TopicNode>> {
    if root.id == id {
        return Err(TreeError::RootNodeViolation(id));
    }
    let path = index_path(root, id).ok_or(TreeError::InvalidNodeId(id))?;
    let (&index, parent_path) = path.split_last().ok_or(TreeError::RootNodeViolation(id))?;
    log::trace!("insert {} above {id}", new_parent.id);
    Ok(rebuild_at(root, parent_path, move |p| {
        let mut p = p.clone();
        let mut wrapper = new_parent;
        wrapper.children = vec![p.children[index].clone()];
        p.children[index] = Arc::new(wrapper);
        p
    }))
}

/// Replace node `id` with its children, in order, in the slot it occupied.
/// Undoes `insert_parent_node`.
pub fn unwrap_node(root: &Arc<TopicNode>, id: NodeId) -> TreeResult<Arc<TopicNode>> {
    if root.id == id {
        return Err(TreeError::RootNodeViolation(id));
    }
    let path = index_path(root, id).ok_or(TreeError::InvalidNodeId(id))?;
    let (&index, parent_path) = path.split_last().ok_or(TreeError::RootNodeViolation(id))?;
    Ok(rebuild_at(root, parent_path, |p| {
        let mut p = p.clone();
        let lifted = p.children[index].children.clone();
        p.children.splice(index..=index, lifted);
        p
    }))
}
