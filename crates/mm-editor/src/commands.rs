//! Undo/Redo history.
//!
//! Every recorded edit is an `Operation` that carries exactly what it needs
//! to replay itself forward or revert itself. Entries live in one ordered
//! list with a cursor: `entries[..cursor]` are applied and undoable,
//! `entries[cursor..]` is the redo tail, dropped as soon as a new entry is
//! recorded.

use crate::config::HistoryConfig;
use mm_core::edit::{self, Detached, MovePlan};
use mm_core::id::NodeId;
use mm_core::model::{Arrow, Document, Summary, TopicNode};
use mm_core::TreeResult;
use smallvec::SmallVec;
use std::sync::Arc;

/// The caller's selected node ids, restored alongside the tree on undo/redo.
pub type Selection = SmallVec<[NodeId; 4]>;

/// A reversible edit.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// `node` inserted at `index` under `parent`. `expanded_parent` is set
    /// when the insert had to expand a collapsed parent.
    CreateNode {
        parent: NodeId,
        index: usize,
        node: Arc<TopicNode>,
        expanded_parent: bool,
    },
    /// Subtrees removed in this order; each slot was captured at its
    /// removal.
    DeleteNode { removed: Vec<Detached> },
    EditTopic {
        id: NodeId,
        before: String,
        after: String,
    },
    ToggleExpand { id: NodeId, before: bool },
    /// A (batch) move, replayed from the requested index.
    MoveNode {
        index: Option<usize>,
        plan: MovePlan,
    },
    /// `parent` (stored without children) spliced in above `id`.
    InsertParent { id: NodeId, parent: Box<TopicNode> },
    /// Any change to a node's own fields. Snapshots are stored without
    /// children.
    StyleChange {
        id: NodeId,
        before: Box<TopicNode>,
        after: Box<TopicNode>,
    },
    CreateArrow { arrow: Arrow },
    RemoveArrow { index: usize, arrow: Arrow },
    UpdateArrow { before: Arrow, after: Arrow },
    CreateSummary { summary: Summary },
    RemoveSummary { index: usize, summary: Summary },
    UpdateSummary { before: Summary, after: Summary },
}

/// Overwrite `id`'s own fields with `fields`, keeping its children.
fn restore_fields(doc: &Document, id: NodeId, fields: &TopicNode) -> TreeResult<Document> {
    let root = edit::update_node(&doc.root, id, |n| {
        let children = std::mem::take(&mut n.children);
        *n = fields.clone();
        n.children = children;
    })?;
    Ok(doc.with_root(root))
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateNode { .. } => "create node",
            Self::DeleteNode { .. } => "delete node",
            Self::EditTopic { .. } => "edit topic",
            Self::ToggleExpand { .. } => "toggle expand",
            Self::MoveNode { .. } => "move node",
            Self::InsertParent { .. } => "insert parent",
            Self::StyleChange { .. } => "style change",
            Self::CreateArrow { .. } => "create arrow",
            Self::RemoveArrow { .. } => "remove arrow",
            Self::UpdateArrow { .. } => "update arrow",
            Self::CreateSummary { .. } => "create summary",
            Self::RemoveSummary { .. } => "remove summary",
            Self::UpdateSummary { .. } => "update summary",
        }
    }

    /// Replay this operation on the state it was recorded against.
    pub fn apply(&self, doc: &Document) -> TreeResult<Document> {
        match self {
            Self::CreateNode {
                parent,
                index,
                node,
                expanded_parent,
            } => {
                let mut root = edit::insert_child(&doc.root, *parent, *index, node.clone())?;
                if *expanded_parent {
                    root = edit::set_expanded(&root, *parent, true)?;
                }
                Ok(doc.with_root(root))
            }
            Self::DeleteNode { removed } => {
                let mut root = doc.root.clone();
                for cut in removed {
                    root = edit::remove_node(&root, cut.node.id)?;
                }
                Ok(doc.with_root(root))
            }
            Self::EditTopic { id, after, .. } => {
                let root = edit::update_node(&doc.root, *id, |n| n.topic = after.clone())?;
                Ok(doc.with_root(root))
            }
            Self::ToggleExpand { id, before } => {
                let root = edit::set_expanded(&doc.root, *id, !before)?;
                Ok(doc.with_root(root))
            }
            Self::MoveNode { index, plan } => {
                let (root, _) = edit::move_nodes(&doc.root, &plan.ids(), plan.target, *index)?;
                Ok(doc.with_root(root))
            }
            Self::InsertParent { id, parent } => {
                let root = edit::insert_parent_node(&doc.root, *id, TopicNode::clone(parent))?;
                Ok(doc.with_root(root))
            }
            Self::StyleChange { id, after, .. } => restore_fields(doc, *id, after),
            Self::CreateArrow { arrow } => doc.add_arrow(arrow.clone()),
            Self::RemoveArrow { arrow, .. } => doc.remove_arrow(arrow.id).map(|(doc, _, _)| doc),
            Self::UpdateArrow { after, .. } => doc.replace_arrow(after.clone()).map(|(doc, _)| doc),
            Self::CreateSummary { summary } => doc.add_summary(summary.clone()),
            Self::RemoveSummary { summary, .. } => {
                doc.remove_summary(summary.id).map(|(doc, _, _)| doc)
            }
            Self::UpdateSummary { after, .. } => {
                doc.replace_summary(after.clone()).map(|(doc, _)| doc)
            }
        }
    }

    /// Undo this operation on the state it produced.
    pub fn revert(&self, doc: &Document) -> TreeResult<Document> {
        match self {
            Self::CreateNode {
                parent,
                node,
                expanded_parent,
                ..
            } => {
                let mut root = edit::remove_node(&doc.root, node.id)?;
                if *expanded_parent {
                    root = edit::set_expanded(&root, *parent, false)?;
                }
                Ok(doc.with_root(root))
            }
            Self::DeleteNode { removed } => {
                let mut root = doc.root.clone();
                for cut in removed.iter().rev() {
                    root = edit::insert_child(&root, cut.parent, cut.index, cut.node.clone())?;
                }
                Ok(doc.with_root(root))
            }
            Self::EditTopic { id, before, .. } => {
                let root = edit::update_node(&doc.root, *id, |n| n.topic = before.clone())?;
                Ok(doc.with_root(root))
            }
            Self::ToggleExpand { id, before } => {
                let root = edit::set_expanded(&doc.root, *id, *before)?;
                Ok(doc.with_root(root))
            }
            Self::MoveNode { plan, .. } => {
                let root = edit::revert_move(&doc.root, plan)?;
                Ok(doc.with_root(root))
            }
            Self::InsertParent { parent, .. } => {
                let root = edit::unwrap_node(&doc.root, parent.id)?;
                Ok(doc.with_root(root))
            }
            Self::StyleChange { id, before, .. } => restore_fields(doc, *id, before),
            Self::CreateArrow { arrow } => doc.remove_arrow(arrow.id).map(|(doc, _, _)| doc),
            Self::RemoveArrow { index, arrow } => Ok(doc.insert_arrow(*index, arrow.clone())),
            Self::UpdateArrow { before, .. } => {
                doc.replace_arrow(before.clone()).map(|(doc, _)| doc)
            }
            Self::CreateSummary { summary } => {
                doc.remove_summary(summary.id).map(|(doc, _, _)| doc)
            }
            Self::RemoveSummary { index, summary } => {
                Ok(doc.insert_summary(*index, summary.clone()))
            }
            Self::UpdateSummary { before, .. } => {
                doc.replace_summary(before.clone()).map(|(doc, _)| doc)
            }
        }
    }
}

/// An operation plus the selections to restore on either side of it.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub operation: Operation,
    pub selection_before: Selection,
    pub selection_after: Selection,
}

/// Bounded undo/redo list.
pub struct History {
    entries: Vec<HistoryEntry>,
    /// Entries before the cursor are applied; the rest can be redone.
    cursor: usize,
    config: HistoryConfig,
}

impl History {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            entries: Vec::with_capacity(config.max_history_size.min(256)),
            cursor: 0,
            config,
        }
    }

    /// Settings this history was built with.
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Record an already-applied operation. Discards the redo tail and
    /// evicts the oldest entry past the configured depth.
    pub fn record(&mut self, operation: Operation, selection_before: Selection, selection_after: Selection) {
        if !self.config.allow_undo {
            return;
        }
        log::debug!("record {}", operation.name());
        self.entries.truncate(self.cursor);
        self.entries.push(HistoryEntry {
            operation,
            selection_before,
            selection_after,
        });
        self.cursor = self.entries.len();
        while self.entries.len() > self.config.max_history_size {
            self.entries.remove(0);
            self.cursor -= 1;
        }
    }

    /// Revert the last applied entry on `doc`. Returns the selection to
    /// restore, or `None` when there is nothing to undo.
    pub fn undo(&mut self, doc: &mut Document) -> Option<Selection> {
        if !self.can_undo() {
            return None;
        }
        let entry = &self.entries[self.cursor - 1];
        match entry.operation.revert(doc) {
            Ok(next) => {
                log::debug!("undo {}", entry.operation.name());
                *doc = next;
                self.cursor -= 1;
                Some(entry.selection_before.clone())
            }
            Err(err) => {
                log::warn!("undo {} failed: {err}", entry.operation.name());
                None
            }
        }
    }

    /// Re-apply the next undone entry on `doc`. Returns the selection to
    /// restore, or `None` when there is nothing to redo.
    pub fn redo(&mut self, doc: &mut Document) -> Option<Selection> {
        if !self.can_redo() {
            return None;
        }
        let entry = &self.entries[self.cursor];
        match entry.operation.apply(doc) {
            Ok(next) => {
                log::debug!("redo {}", entry.operation.name());
                *doc = next;
                self.cursor += 1;
                Some(entry.selection_after.clone())
            }
            Err(err) => {
                log::warn!("redo {} failed: {err}", entry.operation.name());
                None
            }
        }
    }

    /// False when undo is disabled or nothing is applied.
    pub fn can_undo(&self) -> bool {
        self.config.allow_undo && self.cursor > 0
    }

    /// False when undo is disabled or the redo tail is empty.
    pub fn can_redo(&self) -> bool {
        self.config.allow_undo && self.cursor < self.entries.len()
    }

    /// Number of undoable entries.
    pub fn undo_depth(&self) -> usize {
        self.cursor
    }

    /// Drop every entry, undoable and redoable alike.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}
