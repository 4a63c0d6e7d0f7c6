//! Minimum common parent of a selection, for building summaries.

use crate::error::{SelectionIssue, TreeError, TreeResult};
use crate::id::NodeId;
use crate::model::TopicNode;
use crate::tree::ancestor_chain;
use std::collections::HashSet;
use std::sync::Arc;

/// Children `start..=end` of `parent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiblingRange {
    pub parent: NodeId,
    pub start: usize,
    pub end: usize,
}

/// One step down the tree: the ancestor and the index of the next node
/// on the path within its children.
type Step = (NodeId, usize);

/// Steps from the root down to `id`'s parent.
fn steps_to(root: &Arc<TopicNode>, id: NodeId) -> TreeResult<Vec<Step>> {
    let chain = ancestor_chain(root, id)
        .ok_or(TreeError::InvalidSelection(SelectionIssue::UnknownNode(id)))?;
    chain
        .windows(2)
        .map(|pair| {
            let index = pair[0]
                .child_index(pair[1].id)
                .ok_or(TreeError::InvalidNodeId(pair[1].id))?;
            Ok((pair[0].id, index))
        })
        .collect()
}

/// Resolve a selection to the deepest node that is a strict ancestor of
/// every selected node, plus the span of its children covering them.
///
/// The span is index-contiguous: unselected siblings between the outermost
/// anchors are inside it. Duplicate ids are ignored.
pub fn min_common_parent(root: &Arc<TopicNode>, ids: &[NodeId]) -> TreeResult<SiblingRange> {
    let mut seen = HashSet::new();
    let ids: Vec<NodeId> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
    if ids.is_empty() {
        return Err(TreeError::InvalidSelection(SelectionIssue::Empty));
    }
    if ids.contains(&root.id) {
        return Err(TreeError::InvalidSelection(SelectionIssue::IncludesRoot));
    }

    let chains = ids
        .iter()
        .map(|&id| steps_to(root, id))
        .collect::<TreeResult<Vec<_>>>()?;

    // Longest prefix of ancestors shared by every chain. Every chain starts
    // at the root, so this is at least 1.
    let (first, rest) = chains
        .split_first()
        .ok_or(TreeError::InvalidSelection(SelectionIssue::Empty))?;
    let depth = rest.iter().fold(first.len(), |depth, chain| {
        first
            .iter()
            .zip(chain)
            .take(depth)
            .take_while(|(a, b)| a.0 == b.0)
            .count()
    });
    if depth == 0 {
        return Err(TreeError::InvalidSelection(SelectionIssue::IncludesRoot));
    }

    let parent = first[depth - 1].0;
    let anchors = chains.iter().map(|chain| chain[depth - 1].1);
    let start = anchors.clone().min().unwrap_or(0);
    let end = anchors.max().unwrap_or(0);
    log::trace!("selection of {} resolves to {parent}[{start}..={end}]", ids.len());
    Ok(SiblingRange { parent, start, end })
}
