//! Integration tests: editing actions and undo/redo history (mm-editor).
//!
//! Drives `MindMap` through the public action surface and checks that every
//! recorded step reverts and replays to the exact serialized document.

use mm_core::color::XorShiftHues;
use mm_core::id::{ArrowId, NodeId};
use mm_core::model::*;
use mm_core::tree::walk;
use mm_core::{SiblingRange, TreeError, min_common_parent};
use mm_editor::{HistoryConfig, MindMap};
use pretty_assertions::assert_eq;
use std::collections::HashSet;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn id(s: &str) -> NodeId {
    NodeId::intern(s)
}

fn load() -> Document {
    serde_json::from_str(include_str!("fixtures/launch_plan.json")).unwrap()
}

fn make_map(config: HistoryConfig) -> MindMap {
    init_logging();
    MindMap::with_hue_source(load(), config, Box::new(XorShiftHues::seeded(7)))
}

fn json(map: &MindMap) -> String {
    serde_json::to_string(map.document()).unwrap()
}

fn children(map: &MindMap, of: &str) -> Vec<&'static str> {
    map.node(id(of))
        .unwrap()
        .children
        .iter()
        .map(|c| c.id.as_str())
        .collect()
}

/// `R → [A, B]`, built in code so ids read like the examples.
fn small_map(prefix: &str) -> (MindMap, NodeId, NodeId, NodeId) {
    init_logging();
    let (r, a, b) = (
        format!("{prefix}-r"),
        format!("{prefix}-a"),
        format!("{prefix}-b"),
    );
    let doc = Document::new(
        TopicNode::new(r.as_str(), "R")
            .with_child(TopicNode::new(a.as_str(), "A"))
            .with_child(TopicNode::new(b.as_str(), "B")),
    );
    let map = MindMap::with_hue_source(doc, HistoryConfig::default(), Box::new(XorShiftHues::seeded(1)));
    (map, id(&r), id(&a), id(&b))
}

// ─── Worked examples ─────────────────────────────────────────────────────

#[test]
fn add_child_then_undo_redo() {
    let (mut map, r, a, b) = small_map("ex1");
    let new = map.add_child(r, "New").unwrap();
    assert_eq!(map.root().child_ids(), vec![a, b, new]);
    assert!(map.can_undo());

    assert!(map.undo());
    assert_eq!(map.root().child_ids(), vec![a, b]);

    assert!(map.redo());
    assert_eq!(map.root().child_ids(), vec![a, b, new]);
    assert_eq!(map.node(new).unwrap().topic, "New");
}

#[test]
fn move_reparent_then_undo() {
    let (mut map, r, a, b) = small_map("ex2");
    map.move_node(b, a, None).unwrap();
    assert_eq!(map.root().child_ids(), vec![a]);
    assert_eq!(map.node(a).unwrap().child_ids(), vec![b]);

    assert!(map.undo());
    assert_eq!(map.node(r).unwrap().child_ids(), vec![a, b]);
    assert!(map.node(a).unwrap().children.is_empty());
}

#[test]
fn common_parent_example() {
    let doc = Document::new(
        TopicNode::new("ex3-p", "P")
            .with_child(TopicNode::new("ex3-c0", "C0").with_child(TopicNode::new("ex3-g", "G")))
            .with_child(TopicNode::new("ex3-c1", "C1"))
            .with_child(TopicNode::new("ex3-c2", "C2")),
    );
    let range = min_common_parent(&doc.root, &[id("ex3-g"), id("ex3-c2")]).unwrap();
    assert_eq!(
        range,
        SiblingRange {
            parent: id("ex3-p"),
            start: 0,
            end: 2
        }
    );
}

// ─── Round trip ──────────────────────────────────────────────────────────

#[test]
fn every_step_reverts_and_replays_exactly() {
    let mut map = make_map(HistoryConfig::default());
    let mut snapshots = vec![json(&map)];

    map.add_child(id("root"), "Launch party").unwrap();
    snapshots.push(json(&map));
    map.add_sibling(id("users"), "Surveys").unwrap();
    snapshots.push(json(&map));
    map.edit_topic(id("api"), "Public API").unwrap();
    snapshots.push(json(&map));
    let summary = map.add_summary(&[id("api"), id("docs")], Some("engineering")).unwrap();
    snapshots.push(json(&map));
    map.toggle_expanded(id("build")).unwrap();
    snapshots.push(json(&map));
    map.move_nodes(&[id("docs"), id("users")], id("ship"), None).unwrap();
    snapshots.push(json(&map));
    map.move_node(id("ui"), id("research"), Some(0)).unwrap();
    snapshots.push(json(&map));
    map.insert_parent(id("market"), "Numbers").unwrap();
    snapshots.push(json(&map));
    map.update_fields(id("ship"), |n| n.note = Some("Friday".into())).unwrap();
    snapshots.push(json(&map));
    map.copy(id("research")).unwrap();
    map.paste(id("ship")).unwrap();
    snapshots.push(json(&map));
    map.add_arrow(id("api"), id("ui-kit")).unwrap();
    snapshots.push(json(&map));
    map.update_arrow(ArrowId::intern("research-to-ship"), |a| a.label = Some("drives".into()))
        .unwrap();
    snapshots.push(json(&map));
    map.remove_summary(summary).unwrap();
    snapshots.push(json(&map));
    map.remove_nodes(&[id("ui"), id("market")]).unwrap();
    snapshots.push(json(&map));

    let steps = snapshots.len() - 1;
    assert_eq!(map.history().undo_depth(), steps);

    for expected in snapshots.iter().rev().skip(1) {
        assert!(map.undo());
        assert_eq!(&json(&map), expected);
    }
    assert!(!map.undo());
    assert_eq!(json(&map), snapshots[0]);

    for expected in snapshots.iter().skip(1) {
        assert!(map.redo());
        assert_eq!(&json(&map), expected);
    }
    assert!(!map.redo());
}

// ─── History properties ──────────────────────────────────────────────────

#[test]
fn boundaries_leave_document_untouched() {
    let mut map = make_map(HistoryConfig::default());
    let before = json(&map);
    assert!(!map.undo());
    assert!(!map.redo());
    assert_eq!(json(&map), before);

    map.edit_topic(id("ship"), "Go live").unwrap();
    assert!(map.undo());
    let undone = json(&map);
    assert!(!map.undo());
    assert_eq!(json(&map), undone);
}

#[test]
fn new_edit_after_undo_drops_redo() {
    let mut map = make_map(HistoryConfig::default());
    map.edit_topic(id("ship"), "Go live").unwrap();
    map.undo();
    assert!(map.can_redo());
    map.toggle_expanded(id("research")).unwrap();
    assert!(!map.can_redo());
    assert!(!map.redo());
}

#[test]
fn history_keeps_only_the_newest_entries() {
    let mut map = make_map(HistoryConfig {
        allow_undo: true,
        max_history_size: 5,
    });
    for i in 0..8 {
        map.edit_topic(id("ship"), &format!("ship v{i}")).unwrap();
    }
    let mut undone = 0;
    while map.undo() {
        undone += 1;
    }
    assert_eq!(undone, 5);
    assert_eq!(map.node(id("ship")).unwrap().topic, "ship v2");
}

#[test]
fn disabled_history_still_edits() {
    let mut map = make_map(HistoryConfig {
        allow_undo: false,
        max_history_size: 100,
    });
    map.edit_topic(id("ship"), "Go live").unwrap();
    assert_eq!(map.node(id("ship")).unwrap().topic, "Go live");
    assert!(!map.can_undo());
    assert!(!map.undo());
    assert_eq!(map.node(id("ship")).unwrap().topic, "Go live");
}

#[test]
fn undo_restores_selection() {
    let mut map = make_map(HistoryConfig::default());
    map.select([id("docs")]);
    let party = map.add_child(id("root"), "Launch party").unwrap();
    assert_eq!(map.selection(), &[party]);
    map.undo();
    assert_eq!(map.selection(), &[id("docs")]);
    map.redo();
    assert_eq!(map.selection(), &[party]);
}

// ─── Rejections ──────────────────────────────────────────────────────────

#[test]
fn moves_into_own_subtree_are_rejected() {
    let mut map = make_map(HistoryConfig::default());
    let before = json(&map);
    let root = map.root().clone();
    for node in walk(&root).filter(|n| !n.children.is_empty() && n.id != root.id) {
        for below in walk(node).skip(1) {
            assert_eq!(
                map.move_node(node.id, below.id, None),
                Err(TreeError::CycleViolation {
                    node: node.id,
                    target: below.id
                })
            );
        }
    }
    assert_eq!(json(&map), before);
    assert!(!map.can_undo());
}

#[test]
fn root_is_protected() {
    let mut map = make_map(HistoryConfig::default());
    let before = json(&map);
    let root = id("root");
    assert_eq!(map.remove_node(root), Err(TreeError::RootNodeViolation(root)));
    assert_eq!(
        map.move_node(root, id("ship"), None),
        Err(TreeError::RootNodeViolation(root))
    );
    assert_eq!(
        map.insert_parent(root, "Above everything"),
        Err(TreeError::RootNodeViolation(root))
    );
    assert_eq!(json(&map), before);
    assert!(!map.can_undo());
}

#[test]
fn unknown_ids_are_reported() {
    let mut map = make_map(HistoryConfig::default());
    let ghost = id("ghost");
    assert_eq!(map.add_child(ghost, "x"), Err(TreeError::InvalidNodeId(ghost)));
    assert_eq!(map.edit_topic(ghost, "x"), Err(TreeError::InvalidNodeId(ghost)));
    assert_eq!(map.add_arrow(id("api"), ghost), Err(TreeError::InvalidNodeId(ghost)));
    assert!(!map.can_undo());
}

// ─── Batch edits ─────────────────────────────────────────────────────────

#[test]
fn batch_move_keeps_document_order() {
    let mut map = make_map(HistoryConfig::default());
    let before = json(&map);
    map.move_nodes(&[id("docs"), id("users"), id("api")], id("ship"), None)
        .unwrap();
    assert_eq!(children(&map, "ship"), vec!["users", "api", "docs"]);
    assert_eq!(children(&map, "research"), vec!["market"]);
    assert_eq!(children(&map, "build"), vec!["ui"]);
    assert_eq!(map.history().undo_depth(), 1);

    assert!(map.undo());
    assert_eq!(json(&map), before);
}

#[test]
fn moving_into_collapsed_parent_expands_it_until_undo() {
    let mut map = make_map(HistoryConfig::default());
    assert!(!map.node(id("build")).unwrap().expanded);
    map.move_node(id("ship"), id("build"), Some(1)).unwrap();
    assert_eq!(children(&map, "build"), vec!["api", "ship", "ui", "docs"]);
    assert!(map.node(id("build")).unwrap().expanded);

    map.undo();
    assert!(!map.node(id("build")).unwrap().expanded);
    assert_eq!(children(&map, "root"), vec!["research", "build", "ship"]);
}

#[test]
fn nested_removal_is_one_step() {
    let mut map = make_map(HistoryConfig::default());
    let before = json(&map);
    map.remove_nodes(&[id("ui-kit"), id("build"), id("users")]).unwrap();
    assert_eq!(children(&map, "root"), vec!["research", "ship"]);
    assert_eq!(children(&map, "research"), vec!["market"]);
    assert_eq!(map.selection(), &[id("research")]);

    assert!(map.undo());
    assert_eq!(json(&map), before);
}

// ─── Summaries, arrows, clipboard ────────────────────────────────────────

#[test]
fn summary_from_selection_uses_common_parent() {
    let mut map = make_map(HistoryConfig::default());
    map.select([id("ui-kit"), id("market")]);
    let sid = map.summarize_selection(Some("scope")).unwrap();
    let summary = map.document().summary(sid).unwrap();
    assert_eq!(
        (summary.parent, summary.start, summary.end),
        (id("root"), 0, 1)
    );
    assert_eq!(summary.label.as_deref(), Some("scope"));

    assert!(map.update_summary(sid, |s| s.end = 5).is_err());
    map.update_summary(sid, |s| s.end = 2).unwrap();
    assert_eq!(map.document().summary(sid).unwrap().end, 2);

    map.undo();
    assert_eq!(map.document().summary(sid).unwrap().end, 1);
    map.undo();
    assert!(map.document().summaries.is_empty());
}

#[test]
fn removed_topics_leave_arrows_dangling() {
    let mut map = make_map(HistoryConfig::default());
    map.remove_node(id("ship")).unwrap();
    assert_eq!(map.document().arrows.len(), 1);
    assert_eq!(map.document().live_arrows().count(), 0);

    map.undo();
    assert_eq!(map.document().live_arrows().count(), 1);
}

#[test]
fn pasting_twice_gives_distinct_ids() {
    let mut map = make_map(HistoryConfig::default());
    map.copy(id("ui")).unwrap();
    let first = map.paste(id("ship")).unwrap();
    let second = map.paste(id("ship")).unwrap();

    let ship = map.node(id("ship")).unwrap().clone();
    assert_eq!(ship.child_ids(), vec![first, second]);

    let ids: Vec<NodeId> = walk(map.root()).map(|n| n.id).collect();
    let unique: HashSet<NodeId> = ids.iter().copied().collect();
    assert_eq!(ids.len(), unique.len());
    assert_eq!(map.node(first).unwrap().children[0].topic, "Component kit");

    let payload = map.clipboard_payload().unwrap().to_vec();
    let third = map.paste_payload(id("research"), &payload).unwrap();
    assert_eq!(map.node(third).unwrap().topic, "UI");
}

#[test]
fn new_main_topics_get_distinct_branch_colors() {
    let mut map = make_map(HistoryConfig::default());
    let research = Color::from_hex("#3A7BD5").unwrap();
    let mut colors = HashSet::new();
    for i in 0..4 {
        let topic = map.add_child(id("root"), &format!("Main {i}")).unwrap();
        let color = map.node(topic).unwrap().branch_color.unwrap();
        assert_ne!(color, research);
        colors.insert(color);
    }
    assert_eq!(colors.len(), 4);

    let deep = map.add_child(id("api"), "Endpoint").unwrap();
    assert_eq!(map.node(deep).unwrap().branch_color, None);
}
