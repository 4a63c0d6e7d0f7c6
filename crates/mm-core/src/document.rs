//! Arrow and summary collections on a `Document`.
//!
//! Arrows and summaries point at topics by id only. Adding one checks that
//! its references resolve; later tree edits never touch them, so readers
//! should expect dangling references and skip them (`live_arrows`,
//! `live_summaries`).

use crate::error::{TreeError, TreeResult};
use crate::id::{ArrowId, NodeId, SummaryId};
use crate::model::{Arrow, Document, Summary, TopicNode};
use crate::tree::find;
use std::sync::Arc;

/// Check that `start..=end` addresses existing children of `parent`.
pub fn validate_range(root: &Arc<TopicNode>, parent: NodeId, start: usize, end: usize) -> TreeResult<()> {
    let node = find(root, parent).ok_or(TreeError::InvalidNodeId(parent))?;
    let len = node.children.len();
    if start > end || end >= len {
        return Err(TreeError::InvalidRange {
            parent,
            start,
            end,
            len,
        });
    }
    Ok(())
}

impl Document {
    /// Node `id` anywhere in the tree.
    pub fn node(&self, id: NodeId) -> Option<&Arc<TopicNode>> {
        find(&self.root, id)
    }

    /// True if `id` is in the tree.
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    // ─── Arrows ──────────────────────────────────────────────────────────

    /// Arrow `id`, dangling or not.
    pub fn arrow(&self, id: ArrowId) -> Option<&Arrow> {
        self.arrows.iter().find(|a| a.id == id)
    }

    /// Append `arrow`. Both endpoints must exist.
    pub fn add_arrow(&self, arrow: Arrow) -> TreeResult<Document> {
        for end in [arrow.from, arrow.to] {
            if !self.contains(end) {
                return Err(TreeError::InvalidNodeId(end));
            }
        }
        let len = self.arrows.len();
        Ok(self.insert_arrow(len, arrow))
    }

    /// Put `arrow` back at `index` (clamped). No reference checks.
    pub fn insert_arrow(&self, index: usize, arrow: Arrow) -> Document {
        let mut doc = self.clone();
        let index = index.min(doc.arrows.len());
        doc.arrows.insert(index, arrow);
        doc
    }

    /// Remove arrow `id`, returning the new document, its former index and
    /// the arrow itself.
    pub fn remove_arrow(&self, id: ArrowId) -> TreeResult<(Document, usize, Arrow)> {
        let index = self
            .arrows
            .iter()
            .position(|a| a.id == id)
            .ok_or(TreeError::UnknownArrow(id))?;
        let mut doc = self.clone();
        let arrow = doc.arrows.remove(index);
        Ok((doc, index, arrow))
    }

    /// Replace the arrow with the same id, returning the previous value.
    pub fn replace_arrow(&self, arrow: Arrow) -> TreeResult<(Document, Arrow)> {
        let index = self
            .arrows
            .iter()
            .position(|a| a.id == arrow.id)
            .ok_or(TreeError::UnknownArrow(arrow.id))?;
        let mut doc = self.clone();
        let previous = std::mem::replace(&mut doc.arrows[index], arrow);
        Ok((doc, previous))
    }

    /// Arrows whose endpoints both still exist.
    pub fn live_arrows(&self) -> impl Iterator<Item = &Arrow> {
        self.arrows
            .iter()
            .filter(|a| self.contains(a.from) && self.contains(a.to))
    }

    // ─── Summaries ───────────────────────────────────────────────────────

    /// Summary `id`, stale or not.
    pub fn summary(&self, id: SummaryId) -> Option<&Summary> {
        self.summaries.iter().find(|s| s.id == id)
    }

    /// Append `summary`. Its parent must exist and its range must address
    /// existing children.
    pub fn add_summary(&self, summary: Summary) -> TreeResult<Document> {
        validate_range(&self.root, summary.parent, summary.start, summary.end)?;
        let len = self.summaries.len();
        Ok(self.insert_summary(len, summary))
    }

    /// Put `summary` back at `index` (clamped). No range checks.
    pub fn insert_summary(&self, index: usize, summary: Summary) -> Document {
        let mut doc = self.clone();
        let index = index.min(doc.summaries.len());
        doc.summaries.insert(index, summary);
        doc
    }

    /// Remove summary `id`, returning the new document, its former index
    /// and the summary itself.
    pub fn remove_summary(&self, id: SummaryId) -> TreeResult<(Document, usize, Summary)> {
        let index = self
            .summaries
            .iter()
            .position(|s| s.id == id)
            .ok_or(TreeError::UnknownSummary(id))?;
        let mut doc = self.clone();
        let summary = doc.summaries.remove(index);
        Ok((doc, index, summary))
    }

    /// Replace the summary with the same id, returning the previous value.
    /// The range is not checked, so a summary that has gone stale can still
    /// be relabeled; callers changing the range validate it first.
    pub fn replace_summary(&self, summary: Summary) -> TreeResult<(Document, Summary)> {
        let index = self
            .summaries
            .iter()
            .position(|s| s.id == summary.id)
            .ok_or(TreeError::UnknownSummary(summary.id))?;
        let mut doc = self.clone();
        let previous = std::mem::replace(&mut doc.summaries[index], summary);
        Ok((doc, previous))
    }

    /// Summaries whose parent exists and whose range is still in bounds.
    pub fn live_summaries(&self) -> impl Iterator<Item = &Summary> {
        self.summaries
            .iter()
            .filter(|s| validate_range(&self.root, s.parent, s.start, s.end).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::remove_node;

    fn id(s: &str) -> NodeId {
        NodeId::intern(s)
    }

    fn sample() -> Document {
        Document::new(
            TopicNode::new("doc-r", "r")
                .with_child(TopicNode::new("doc-a", "a"))
                .with_child(TopicNode::new("doc-b", "b"))
                .with_child(TopicNode::new("doc-c", "c")),
        )
    }

    #[test]
    fn arrows_need_existing_endpoints() {
        let doc = sample();
        let ok = doc.add_arrow(Arrow::new(id("doc-a"), id("doc-c"))).unwrap();
        assert_eq!(ok.arrows.len(), 1);
        let err = doc.add_arrow(Arrow::new(id("doc-a"), id("doc-ghost"))).unwrap_err();
        assert_eq!(err, TreeError::InvalidNodeId(id("doc-ghost")));
    }

    #[test]
    fn remove_and_reinsert_arrow_restores_order() {
        let doc = sample();
        let first = Arrow::new(id("doc-a"), id("doc-b"));
        let second = Arrow::new(id("doc-b"), id("doc-c"));
        let doc = doc.add_arrow(first.clone()).unwrap().add_arrow(second).unwrap();
        let (without, index, arrow) = doc.remove_arrow(first.id).unwrap();
        assert_eq!(index, 0);
        assert_eq!(without.arrows.len(), 1);
        assert_eq!(without.insert_arrow(index, arrow), doc);
    }

    #[test]
    fn summary_range_is_validated() {
        let doc = sample();
        assert!(doc.add_summary(Summary::new(id("doc-r"), 0, 2)).is_ok());
        assert_eq!(
            doc.add_summary(Summary::new(id("doc-r"), 1, 3)).unwrap_err(),
            TreeError::InvalidRange {
                parent: id("doc-r"),
                start: 1,
                end: 3,
                len: 3
            }
        );
        assert!(matches!(
            doc.add_summary(Summary::new(id("doc-r"), 2, 1)),
            Err(TreeError::InvalidRange { .. })
        ));
        assert_eq!(
            doc.add_summary(Summary::new(id("doc-ghost"), 0, 0)).unwrap_err(),
            TreeError::InvalidNodeId(id("doc-ghost"))
        );
    }

    #[test]
    fn node_removal_leaves_references_dangling() {
        let doc = sample()
            .add_arrow(Arrow::new(id("doc-a"), id("doc-c")))
            .unwrap()
            .add_summary(Summary::new(id("doc-r"), 1, 2))
            .unwrap();
        let doc = doc.with_root(remove_node(&doc.root, id("doc-c")).unwrap());
        assert_eq!(doc.arrows.len(), 1);
        assert_eq!(doc.summaries.len(), 1);
        assert_eq!(doc.live_arrows().count(), 0);
        assert_eq!(doc.live_summaries().count(), 0);
    }

    #[test]
    fn replace_reports_previous_value() {
        let arrow = Arrow::new(id("doc-a"), id("doc-b"));
        let doc = sample().add_arrow(arrow.clone()).unwrap();
        let mut relabeled = arrow.clone();
        relabeled.label = Some("depends on".into());
        let (doc, previous) = doc.replace_arrow(relabeled).unwrap();
        assert_eq!(previous, arrow);
        assert_eq!(doc.arrow(arrow.id).and_then(|a| a.label.as_deref()), Some("depends on"));

        let stray = Arrow::new(id("doc-a"), id("doc-b"));
        assert_eq!(doc.replace_arrow(stray.clone()).unwrap_err(), TreeError::UnknownArrow(stray.id));
    }
}
