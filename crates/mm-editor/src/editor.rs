//! High-level editing actions on a mind map.
//!
//! `MindMap` owns the document, the current selection and the history. Each
//! action resolves what it needs from the tree, builds the new document
//! through the `mm_core::edit` primitives, wraps the change in an
//! `Operation` and records it. On failure nothing changes: document,
//! selection and history stay as they were.

use crate::clipboard;
use crate::commands::{History, Operation, Selection};
use crate::config::HistoryConfig;
use mm_core::color::{HueSource, XorShiftHues, assign_root_child_color};
use mm_core::document::validate_range;
use mm_core::edit;
use mm_core::id::{ArrowId, NodeId, SummaryId};
use mm_core::model::{Arrow, Color, Document, Summary, TopicNode};
use mm_core::selection::min_common_parent;
use mm_core::tree::{find, is_descendant, position_of, sort_preorder};
use mm_core::{TreeError, TreeResult};
use smallvec::smallvec;
use std::collections::HashSet;
use std::sync::Arc;

pub struct MindMap {
    doc: Document,
    selection: Selection,
    history: History,
    clipboard: Option<Vec<u8>>,
    hues: Box<dyn HueSource>,
    palette: Vec<Color>,
}

impl MindMap {
    /// Editor over `doc` with branch hues seeded from the clock.
    pub fn new(doc: Document, config: HistoryConfig) -> Self {
        Self::with_hue_source(doc, config, Box::new(XorShiftHues::from_clock()))
    }

    /// Use `hues` for main-topic branch colors (deterministic in tests).
    pub fn with_hue_source(doc: Document, config: HistoryConfig, hues: Box<dyn HueSource>) -> Self {
        Self {
            doc,
            selection: Selection::new(),
            history: History::new(config),
            clipboard: None,
            hues,
            palette: Vec::new(),
        }
    }

    /// Positional colors the renderer gives uncolored main topics; used to
    /// keep new branch colors apart from them.
    pub fn set_palette(&mut self, palette: Vec<Color>) {
        self.palette = palette;
    }

    /// Current snapshot. Replaced, never mutated, by each action.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Root topic of the current snapshot.
    pub fn root(&self) -> &Arc<TopicNode> {
        &self.doc.root
    }

    /// Node `id` in the current snapshot.
    pub fn node(&self, id: NodeId) -> Option<&Arc<TopicNode>> {
        self.doc.node(id)
    }

    /// Ids selected after the last action, undo or redo.
    pub fn selection(&self) -> &[NodeId] {
        &self.selection
    }

    /// Replace the selection. Not recorded in history.
    pub fn select(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.selection = ids.into_iter().collect();
    }

    /// Recorded entries, for inspection.
    pub fn history(&self) -> &History {
        &self.history
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Returns true if the document changed.
    pub fn undo(&mut self) -> bool {
        match self.history.undo(&mut self.doc) {
            Some(selection) => {
                self.selection = selection;
                true
            }
            None => false,
        }
    }

    /// Returns true if the document changed.
    pub fn redo(&mut self) -> bool {
        match self.history.redo(&mut self.doc) {
            Some(selection) => {
                self.selection = selection;
                true
            }
            None => false,
        }
    }

    /// Install `next` and record `op` against it.
    fn commit(&mut self, op: Operation, next: Document, selection_after: Selection) {
        let selection_before = std::mem::replace(&mut self.selection, selection_after.clone());
        self.doc = next;
        self.history.record(op, selection_before, selection_after);
    }

    fn apply(&mut self, op: Operation, selection_after: Selection) -> TreeResult<()> {
        let next = op.apply(&self.doc)?;
        self.commit(op, next, selection_after);
        Ok(())
    }

    // ─── Topics ──────────────────────────────────────────────────────────

    fn insert_node(&mut self, parent: NodeId, index: usize, mut node: TopicNode, expand: bool) -> TreeResult<NodeId> {
        let parent_node = find(&self.doc.root, parent).ok_or(TreeError::InvalidNodeId(parent))?;
        if parent == self.doc.root.id && node.branch_color.is_none() {
            node.branch_color = Some(assign_root_child_color(&self.doc.root, &self.palette, self.hues.as_mut()));
        }
        let id = node.id;
        let op = Operation::CreateNode {
            parent,
            index,
            node: Arc::new(node),
            expanded_parent: expand && !parent_node.expanded,
        };
        self.apply(op, smallvec![id])?;
        Ok(id)
    }

    /// Append a new topic under `parent`, expanding it if collapsed. New
    /// main topics get an automatic branch color.
    pub fn add_child(&mut self, parent: NodeId, topic: &str) -> TreeResult<NodeId> {
        self.add_child_node(parent, TopicNode::with_topic(topic))
    }

    /// Append a prepared node under `parent`, as `add_child` does.
    pub fn add_child_node(&mut self, parent: NodeId, node: TopicNode) -> TreeResult<NodeId> {
        let len = find(&self.doc.root, parent)
            .map(|p| p.children.len())
            .ok_or(TreeError::InvalidNodeId(parent))?;
        self.insert_node(parent, len, node, true)
    }

    /// Insert a new topic directly after `id`.
    pub fn add_sibling(&mut self, id: NodeId, topic: &str) -> TreeResult<NodeId> {
        let (parent, index) = position_of(&self.doc.root, id).ok_or(TreeError::InvalidNodeId(id))?;
        let parent = parent.id;
        self.insert_node(parent, index + 1, TopicNode::with_topic(topic), false)
    }

    /// Remove `id` and its subtree. The root cannot be removed.
    pub fn remove_node(&mut self, id: NodeId) -> TreeResult<()> {
        self.remove_nodes(&[id])
    }

    /// Remove several subtrees as one undoable step. Nodes nested inside
    /// another removed node go with it. The parent of the first removed
    /// node becomes the selection.
    pub fn remove_nodes(&mut self, ids: &[NodeId]) -> TreeResult<()> {
        let root = self.doc.root.clone();
        let mut seen = HashSet::new();
        let mut ids: Vec<NodeId> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
        for &id in &ids {
            if id == root.id {
                return Err(TreeError::RootNodeViolation(id));
            }
            if find(&root, id).is_none() {
                return Err(TreeError::InvalidNodeId(id));
            }
        }
        sort_preorder(&root, &mut ids);
        let mut tops: Vec<NodeId> = Vec::with_capacity(ids.len());
        for id in ids {
            let covered = tops
                .iter()
                .any(|top| find(&root, *top).is_some_and(|n| is_descendant(n, id)));
            if !covered {
                tops.push(id);
            }
        }
        let Some(&first) = tops.first() else {
            return Ok(());
        };
        let focus = position_of(&root, first).map(|(p, _)| p.id);

        // Last in document order first, so earlier slots stay valid.
        let mut current = root;
        let mut removed = Vec::with_capacity(tops.len());
        for id in tops.iter().rev() {
            let (next, cut) = edit::detach_node(&current, *id)?;
            removed.push(cut);
            current = next;
        }

        let next = self.doc.with_root(current);
        self.commit(Operation::DeleteNode { removed }, next, focus.into_iter().collect());
        Ok(())
    }

    /// Replace the display text of `id`. Same text records nothing.
    pub fn edit_topic(&mut self, id: NodeId, text: &str) -> TreeResult<()> {
        let node = find(&self.doc.root, id).ok_or(TreeError::InvalidNodeId(id))?;
        if node.topic == text {
            return Ok(());
        }
        let op = Operation::EditTopic {
            id,
            before: node.topic.clone(),
            after: text.to_string(),
        };
        self.apply(op, smallvec![id])
    }

    pub fn set_expanded(&mut self, id: NodeId, expanded: bool) -> TreeResult<()> {
        let node = find(&self.doc.root, id).ok_or(TreeError::InvalidNodeId(id))?;
        if node.expanded == expanded {
            return Ok(());
        }
        self.toggle_expanded(id)
    }

    pub fn toggle_expanded(&mut self, id: NodeId) -> TreeResult<()> {
        let node = find(&self.doc.root, id).ok_or(TreeError::InvalidNodeId(id))?;
        let op = Operation::ToggleExpand {
            id,
            before: node.expanded,
        };
        let selection = self.selection.clone();
        self.apply(op, selection)
    }

    /// Change any of a node's own fields (style, tags, color, ...).
    /// Changes the patch makes to `children` are ignored; use the structural
    /// actions for those.
    pub fn update_fields(&mut self, id: NodeId, patch: impl FnOnce(&mut TopicNode)) -> TreeResult<()> {
        let node = find(&self.doc.root, id).ok_or(TreeError::InvalidNodeId(id))?;
        let before = node.detached();
        let mut after = before.clone();
        patch(&mut after);
        after.id = id;
        after.children.clear();
        if after == before {
            return Ok(());
        }
        let op = Operation::StyleChange {
            id,
            before: Box::new(before),
            after: Box::new(after),
        };
        self.apply(op, smallvec![id])
    }

    // ─── Moves ───────────────────────────────────────────────────────────

    /// Move `id` under `parent` at `index` (`None` appends). A move that
    /// lands the node back in its own slot records nothing.
    pub fn move_node(&mut self, id: NodeId, parent: NodeId, index: Option<usize>) -> TreeResult<()> {
        let (root, plan) = edit::move_node(&self.doc.root, id, parent, index)?;
        if root == self.doc.root {
            return Ok(());
        }
        let next = self.doc.with_root(root);
        self.commit(Operation::MoveNode { index, plan }, next, smallvec![id]);
        Ok(())
    }

    /// Move several nodes under `parent` as one undoable step.
    pub fn move_nodes(&mut self, ids: &[NodeId], parent: NodeId, index: Option<usize>) -> TreeResult<()> {
        let (root, plan) = edit::move_nodes(&self.doc.root, ids, parent, index)?;
        if plan.is_empty() || root == self.doc.root {
            return Ok(());
        }
        let selection = plan.ids().into_iter().collect();
        let next = self.doc.with_root(root);
        self.commit(Operation::MoveNode { index, plan }, next, selection);
        Ok(())
    }

    /// Swap `id` with its previous sibling. No-op for a first child.
    pub fn move_up(&mut self, id: NodeId) -> TreeResult<()> {
        if id == self.doc.root.id {
            return Err(TreeError::RootNodeViolation(id));
        }
        let (parent, index) = position_of(&self.doc.root, id).ok_or(TreeError::InvalidNodeId(id))?;
        if index == 0 {
            return Ok(());
        }
        let parent = parent.id;
        self.move_node(id, parent, Some(index - 1))
    }

    /// Swap `id` with its next sibling. No-op for a last child.
    pub fn move_down(&mut self, id: NodeId) -> TreeResult<()> {
        if id == self.doc.root.id {
            return Err(TreeError::RootNodeViolation(id));
        }
        let (parent, index) = position_of(&self.doc.root, id).ok_or(TreeError::InvalidNodeId(id))?;
        if index + 1 >= parent.children.len() {
            return Ok(());
        }
        let parent = parent.id;
        // Past the next sibling; the same-parent shift brings it to index + 1.
        self.move_node(id, parent, Some(index + 2))
    }

    /// Wrap `id` in a new topic that takes its place.
    pub fn insert_parent(&mut self, id: NodeId, topic: &str) -> TreeResult<NodeId> {
        if id == self.doc.root.id {
            return Err(TreeError::RootNodeViolation(id));
        }
        let wrapper = TopicNode::with_topic(topic);
        let wrapper_id = wrapper.id;
        let op = Operation::InsertParent {
            id,
            parent: Box::new(wrapper),
        };
        self.apply(op, smallvec![wrapper_id])?;
        Ok(wrapper_id)
    }

    // ─── Clipboard ───────────────────────────────────────────────────────

    /// Copy the subtree at `id` into the internal clipboard.
    pub fn copy(&mut self, id: NodeId) -> TreeResult<()> {
        let node = find(&self.doc.root, id).ok_or(TreeError::InvalidNodeId(id))?;
        self.clipboard = Some(clipboard::encode_subtree(node)?);
        Ok(())
    }

    /// The encoded subtree last copied, for handing to a system clipboard.
    pub fn clipboard_payload(&self) -> Option<&[u8]> {
        self.clipboard.as_deref()
    }

    /// Paste the last copied subtree as the last child of `parent`.
    pub fn paste(&mut self, parent: NodeId) -> TreeResult<NodeId> {
        let bytes = self
            .clipboard
            .clone()
            .ok_or_else(|| TreeError::Clipboard("nothing copied".into()))?;
        self.paste_payload(parent, &bytes)
    }

    /// Paste an encoded subtree (from `clipboard_payload`) under `parent`.
    /// Every pasted node gets a fresh id.
    pub fn paste_payload(&mut self, parent: NodeId, bytes: &[u8]) -> TreeResult<NodeId> {
        let node = clipboard::decode_subtree(bytes)?;
        self.add_child_node(parent, clipboard::with_fresh_ids(&node))
    }

    // ─── Arrows ──────────────────────────────────────────────────────────

    pub fn add_arrow(&mut self, from: NodeId, to: NodeId) -> TreeResult<ArrowId> {
        let arrow = Arrow::new(from, to);
        let id = arrow.id;
        let selection = self.selection.clone();
        self.apply(Operation::CreateArrow { arrow }, selection)?;
        Ok(id)
    }

    pub fn remove_arrow(&mut self, id: ArrowId) -> TreeResult<()> {
        let (next, index, arrow) = self.doc.remove_arrow(id)?;
        let selection = self.selection.clone();
        self.commit(Operation::RemoveArrow { index, arrow }, next, selection);
        Ok(())
    }

    /// Change an arrow's label, direction or control offsets. Its id and
    /// endpoints are fixed.
    pub fn update_arrow(&mut self, id: ArrowId, patch: impl FnOnce(&mut Arrow)) -> TreeResult<()> {
        let before = self.doc.arrow(id).cloned().ok_or(TreeError::UnknownArrow(id))?;
        let mut after = before.clone();
        patch(&mut after);
        after.id = before.id;
        after.from = before.from;
        after.to = before.to;
        if after == before {
            return Ok(());
        }
        let (next, _) = self.doc.replace_arrow(after.clone())?;
        let selection = self.selection.clone();
        self.commit(Operation::UpdateArrow { before, after }, next, selection);
        Ok(())
    }

    // ─── Summaries ───────────────────────────────────────────────────────

    /// Summarize the sibling span covering `ids` under their minimum common
    /// parent.
    pub fn add_summary(&mut self, ids: &[NodeId], label: Option<&str>) -> TreeResult<SummaryId> {
        let range = min_common_parent(&self.doc.root, ids)?;
        let mut summary = Summary::new(range.parent, range.start, range.end);
        summary.label = label.map(str::to_string);
        let id = summary.id;
        let selection = self.selection.clone();
        self.apply(Operation::CreateSummary { summary }, selection)?;
        Ok(id)
    }

    /// Summarize the current selection.
    pub fn summarize_selection(&mut self, label: Option<&str>) -> TreeResult<SummaryId> {
        let ids = self.selection.to_vec();
        self.add_summary(&ids, label)
    }

    pub fn remove_summary(&mut self, id: SummaryId) -> TreeResult<()> {
        let (next, index, summary) = self.doc.remove_summary(id)?;
        let selection = self.selection.clone();
        self.commit(Operation::RemoveSummary { index, summary }, next, selection);
        Ok(())
    }

    /// Change a summary's label, style or range. A changed range is checked
    /// against the current tree.
    pub fn update_summary(&mut self, id: SummaryId, patch: impl FnOnce(&mut Summary)) -> TreeResult<()> {
        let before = self.doc.summary(id).cloned().ok_or(TreeError::UnknownSummary(id))?;
        let mut after = before.clone();
        patch(&mut after);
        after.id = before.id;
        if after == before {
            return Ok(());
        }
        if (after.parent, after.start, after.end) != (before.parent, before.start, before.end) {
            validate_range(&self.doc.root, after.parent, after.start, after.end)?;
        }
        let (next, _) = self.doc.replace_summary(after.clone())?;
        let selection = self.selection.clone();
        self.commit(Operation::UpdateSummary { before, after }, next, selection);
        Ok(())
    }
}
