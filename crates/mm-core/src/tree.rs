//! Read-only traversals over a topic tree.
//!
//! Nodes carry no parent pointers, so every "where is X" question is
//! answered by a depth-first walk from the root. Ids are assumed unique;
//! with duplicates the first match in preorder wins.

use crate::id::NodeId;
use crate::model::TopicNode;
use std::collections::HashMap;
use std::sync::Arc;

/// Depth-first search for `id`.
pub fn find(root: &Arc<TopicNode>, id: NodeId) -> Option<&Arc<TopicNode>> {
    if root.id == id {
        return Some(root);
    }
    root.children.iter().find_map(|child| find(child, id))
}

/// The node whose direct children contain `id`. `None` for the root or an
/// absent id.
pub fn find_parent(root: &Arc<TopicNode>, id: NodeId) -> Option<&Arc<TopicNode>> {
    position_of(root, id).map(|(parent, _)| parent)
}

/// Parent of `id` together with `id`'s index in the parent's children.
pub fn position_of(root: &Arc<TopicNode>, id: NodeId) -> Option<(&Arc<TopicNode>, usize)> {
    if let Some(index) = root.child_index(id) {
        return Some((root, index));
    }
    root.children.iter().find_map(|child| position_of(child, id))
}

/// True if `ancestor` is `id` or has `id` anywhere below it.
pub fn is_descendant(ancestor: &TopicNode, id: NodeId) -> bool {
    ancestor.id == id || ancestor.children.iter().any(|c| is_descendant(c, id))
}

/// Nodes from the root down to `id`, inclusive. `None` if `id` is absent.
pub fn ancestor_chain(root: &Arc<TopicNode>, id: NodeId) -> Option<Vec<&Arc<TopicNode>>> {
    let mut chain = Vec::new();
    if collect_chain(root, id, &mut chain) {
        Some(chain)
    } else {
        None
    }
}

fn collect_chain<'a>(node: &'a Arc<TopicNode>, id: NodeId, chain: &mut Vec<&'a Arc<TopicNode>>) -> bool {
    chain.push(node);
    if node.id == id {
        return true;
    }
    for child in &node.children {
        if collect_chain(child, id, chain) {
            return true;
        }
    }
    chain.pop();
    false
}

/// Preorder iterator: root first, then children left to right, recursively.
pub fn walk(root: &Arc<TopicNode>) -> Walk<'_> {
    Walk { stack: vec![root] }
}

pub struct Walk<'a> {
    stack: Vec<&'a Arc<TopicNode>>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Arc<TopicNode>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Map every id to its preorder rank.
pub fn preorder_index(root: &Arc<TopicNode>) -> HashMap<NodeId, usize> {
    walk(root).enumerate().map(|(rank, node)| (node.id, rank)).collect()
}

/// Stable preorder ordering of an arbitrary id set. Ids not in the tree
/// sort last, keeping their relative order.
pub fn sort_preorder(root: &Arc<TopicNode>, ids: &mut [NodeId]) {
    let ranks = preorder_index(root);
    ids.sort_by_key(|id| ranks.get(id).copied().unwrap_or(usize::MAX));
}
