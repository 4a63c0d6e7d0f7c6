//! Copy/paste payloads for topic subtrees.
//!
//! A copied subtree is encoded as MessagePack so it can travel through a
//! system clipboard as opaque bytes. Pasting always re-ids every node, so
//! the same payload can be pasted any number of times.

use mm_core::id::NodeId;
use mm_core::model::TopicNode;
use mm_core::{TreeError, TreeResult};
use std::sync::Arc;

pub fn encode_subtree(node: &TopicNode) -> TreeResult<Vec<u8>> {
    rmp_serde::to_vec_named(node).map_err(|e| TreeError::Clipboard(e.to_string()))
}

pub fn decode_subtree(bytes: &[u8]) -> TreeResult<TopicNode> {
    rmp_serde::from_slice(bytes).map_err(|e| TreeError::Clipboard(e.to_string()))
}

/// Deep copy of `node` with a fresh id on every node.
pub fn with_fresh_ids(node: &TopicNode) -> TopicNode {
    TopicNode {
        id: NodeId::fresh(),
        children: node
            .children
            .iter()
            .map(|c| Arc::new(with_fresh_ids(c)))
            .collect(),
        ..node.clone()
    }
}
