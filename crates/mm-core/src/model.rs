//! Core data model for mind-map documents.
//!
//! A document is a rooted, ordered tree of `TopicNode` values. Each node
//! owns its children; there are no parent pointers, so parentage is always
//! derived by traversal (see `tree`). Children are shared immutable subtrees
//! behind `Arc`, which lets an edit rebuild only the path from the root to
//! the changed node and reuse every other subtree as-is.

use crate::id::{ArrowId, NodeId, SummaryId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::sync::Arc;

// ─── Colors ──────────────────────────────────────────────────────────────

/// 8-bit RGBA color, serialized as a `#RRGGBB` / `#RRGGBBAA` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA`. The `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        let pair = |i: usize| -> Option<u8> { Some(hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?) };

        match bytes.len() {
            3 => Some(Self::rgb(
                hex_val(bytes[0])? * 17,
                hex_val(bytes[1])? * 17,
                hex_val(bytes[2])? * 17,
            )),
            6 => Some(Self::rgb(pair(0)?, pair(2)?, pair(4)?)),
            8 => Some(Self {
                r: pair(0)?,
                g: pair(2)?,
                b: pair(4)?,
                a: pair(6)?,
            }),
            _ => None,
        }
    }

    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }

    /// Build an opaque color from hue (degrees), saturation and lightness
    /// (both `0.0..=1.0`).
    pub fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        let h = hue.rem_euclid(360.0) / 60.0;
        let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = lightness - c / 2.0;
        let channel = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Self::rgb(channel(r), channel(g), channel(b))
    }

    /// Hue in whole degrees, `0..360`. Achromatic colors report 0.
    pub fn hue(&self) -> u16 {
        let r = f32::from(self.r) / 255.0;
        let g = f32::from(self.g) / 255.0;
        let b = f32::from(self.b) / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;
        if delta == 0.0 {
            return 0;
        }
        let h = if max == r {
            60.0 * ((g - b) / delta).rem_euclid(6.0)
        } else if max == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };
        (h.round() as u16) % 360
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid color {s:?}")))
    }
}

// ─── Topic passengers ────────────────────────────────────────────────────

/// Side of the root a main branch is laid out on. Descendants inherit it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

/// Inline text styling. Carried for the renderer, never read by the core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopicStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicImage {
    pub url: String,
    pub width: f32,
    pub height: f32,
}

// ─── Topic nodes ─────────────────────────────────────────────────────────

fn default_expanded() -> bool {
    true
}

fn is_true(v: &bool) -> bool {
    *v
}

/// A single topic in the mind-map tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicNode {
    /// Unique across the document; never changes once created.
    pub id: NodeId,

    /// Display text.
    pub topic: String,

    /// Ordered children. Order is meaningful and preserved by every edit.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Arc<TopicNode>>,

    /// Whether children are shown. Layout reads this; edits ignore it.
    #[serde(default = "default_expanded", skip_serializing_if = "is_true")]
    pub expanded: bool,

    /// Explicit branch color; unset nodes inherit from the nearest ancestor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_color: Option<Color>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<TopicStyle>,

    #[serde(default, skip_serializing_if = "SmallVec::is_empty")]
    pub tags: SmallVec<[String; 2]>,

    #[serde(default, skip_serializing_if = "SmallVec::is_empty")]
    pub icons: SmallVec<[String; 2]>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<TopicImage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hyperlink: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TopicNode {
    pub fn new(id: impl Into<NodeId>, topic: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            topic: topic.into(),
            children: Vec::new(),
            expanded: true,
            branch_color: None,
            direction: None,
            style: None,
            tags: SmallVec::new(),
            icons: SmallVec::new(),
            image: None,
            hyperlink: None,
            note: None,
        }
    }

    /// A new leaf topic with a freshly generated id.
    pub fn with_topic(topic: impl Into<String>) -> Self {
        Self::new(NodeId::fresh(), topic)
    }

    /// Builder: append `child` to this node's children.
    #[must_use]
    pub fn with_child(mut self, child: TopicNode) -> Self {
        self.children.push(Arc::new(child));
        self
    }

    pub fn child_ids(&self) -> Vec<NodeId> {
        self.children.iter().map(|c| c.id).collect()
    }

    /// Index of the direct child `id`, if any.
    pub fn child_index(&self, id: NodeId) -> Option<usize> {
        self.children.iter().position(|c| c.id == id)
    }

    /// A copy of this node's own data with no children.
    pub fn detached(&self) -> TopicNode {
        TopicNode {
            children: Vec::new(),
            ..self.clone()
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(|c| c.subtree_len()).sum::<usize>()
    }
}

// ─── Arrows & summaries ──────────────────────────────────────────────────

/// Offset of a bezier control point from its anchor node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlOffsets {
    pub start: Offset,
    pub end: Offset,
}

/// A cross-tree connection between two topics. Endpoints are soft references:
/// removing a topic leaves its arrows in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Arrow {
    pub id: ArrowId,
    pub from: NodeId,
    pub to: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub bidirectional: bool,
    #[serde(default)]
    pub control: ControlOffsets,
}

impl Arrow {
    pub fn new(from: NodeId, to: NodeId) -> Self {
        Self {
            id: ArrowId::fresh(),
            from,
            to,
            label: None,
            bidirectional: false,
            control: ControlOffsets::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SummaryStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_color: Option<Color>,
}

/// A bracket grouping the children `start..=end` of `parent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub id: SummaryId,
    pub parent: NodeId,
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<SummaryStyle>,
}

impl Summary {
    pub fn new(parent: NodeId, start: usize, end: usize) -> Self {
        Self {
            id: SummaryId::fresh(),
            parent,
            start,
            end,
            label: None,
            style: None,
        }
    }
}

// ─── Document ────────────────────────────────────────────────────────────

/// The complete mind map: topic tree plus arrows and summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub root: Arc<TopicNode>,
    #[serde(default)]
    pub arrows: Vec<Arrow>,
    #[serde(default)]
    pub summaries: Vec<Summary>,
}

impl Document {
    pub fn new(root: TopicNode) -> Self {
        Self {
            root: Arc::new(root),
            arrows: Vec::new(),
            summaries: Vec::new(),
        }
    }

    /// Same arrows and summaries, different tree.
    #[must_use]
    pub fn with_root(&self, root: Arc<TopicNode>) -> Self {
        Self {
            root,
            arrows: self.arrows.clone(),
            summaries: self.summaries.clone(),
        }
    }
}
