//! Typed failures for every structural edit and tree query.
//!
//! A failed operation never changes the document it was given; callers get
//! the prior tree back untouched along with one of these.

use crate::id::{ArrowId, NodeId, SummaryId};
use std::fmt;

/// Why a selection could not be resolved to a common parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionIssue {
    Empty,
    UnknownNode(NodeId),
    IncludesRoot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The referenced node is not in the tree.
    InvalidNodeId(NodeId),
    /// Delete, move or reparent-above was attempted on the root.
    RootNodeViolation(NodeId),
    /// `target` is `node` itself or lies inside the subtree being moved.
    CycleViolation { node: NodeId, target: NodeId },
    InvalidSelection(SelectionIssue),
    /// Summary bounds outside the parent's children, or `start > end`.
    InvalidRange {
        parent: NodeId,
        start: usize,
        end: usize,
        len: usize,
    },
    UnknownArrow(ArrowId),
    UnknownSummary(SummaryId),
    /// Paste without a copied subtree, or an undecodable clipboard payload.
    Clipboard(String),
}

impl fmt::Display for SelectionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "no node selected"),
            Self::UnknownNode(id) => write!(f, "selected node {id} is not in the tree"),
            Self::IncludesRoot => write!(f, "the root topic cannot be selected"),
        }
    }
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidNodeId(id) => write!(f, "node {id} not found"),
            Self::RootNodeViolation(id) => {
                write!(f, "operation not allowed on root node {id}")
            }
            Self::CycleViolation { node, target } if node == target => {
                write!(f, "cannot move node {node} into itself")
            }
            Self::CycleViolation { node, target } => {
                write!(f, "cannot move node {node} into its own descendant {target}")
            }
            Self::InvalidSelection(issue) => write!(f, "invalid selection: {issue}"),
            Self::InvalidRange {
                parent,
                start,
                end,
                len,
            } => write!(
                f,
                "summary range {start}..={end} out of bounds for {parent} with {len} children"
            ),
            Self::UnknownArrow(id) => write!(f, "arrow {id} not found"),
            Self::UnknownSummary(id) => write!(f, "summary {id} not found"),
            Self::Clipboard(reason) => write!(f, "clipboard: {reason}"),
        }
    }
}

impl std::error::Error for TreeError {}

pub type TreeResult<T> = Result<T, TreeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_move_reads_differently_from_descendant_move() {
        let a = NodeId::intern("err-a");
        let b = NodeId::intern("err-b");
        let self_move = TreeError::CycleViolation { node: a, target: a };
        let deep_move = TreeError::CycleViolation { node: a, target: b };
        assert_eq!(self_move.to_string(), "cannot move node err-a into itself");
        assert_eq!(
            deep_move.to_string(),
            "cannot move node err-a into its own descendant err-b"
        );
    }

    #[test]
    fn range_error_mentions_bounds() {
        let err = TreeError::InvalidRange {
            parent: NodeId::intern("err-p"),
            start: 2,
            end: 5,
            len: 3,
        };
        assert_eq!(
            err.to_string(),
            "summary range 2..=5 out of bounds for err-p with 3 children"
        );
    }
}
