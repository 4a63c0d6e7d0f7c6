//! Branch color resolution and assignment for main topics.

use crate::error::{TreeError, TreeResult};
use crate::id::NodeId;
use crate::model::{Color, Direction, TopicNode};
use crate::tree::ancestor_chain;
use std::sync::Arc;

/// Random trials before giving up on finding a distinct hue.
pub const HUE_TRIALS: usize = 48;
/// Minimum circular distance, in degrees, from every sibling hue.
pub const MIN_HUE_DISTANCE: u16 = 16;
pub const BRANCH_SATURATION: f32 = 0.72;
pub const BRANCH_LIGHTNESS: f32 = 0.46;

/// Source of uniformly distributed hues in `0..360`.
pub trait HueSource {
    fn next_hue(&mut self) -> u16;
}

/// xorshift64 hue generator. Deterministic for a given seed.
#[derive(Debug, Clone)]
pub struct XorShiftHues {
    state: u64,
}

impl XorShiftHues {
    pub fn seeded(seed: u64) -> Self {
        // A zero state would stay zero forever.
        Self {
            state: seed.wrapping_add(0x9E37_79B9_7F4A_7C15) | 1,
        }
    }

    /// Seeded from the system clock.
    pub fn from_clock() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        Self::seeded(nanos)
    }
}

impl HueSource for XorShiftHues {
    fn next_hue(&mut self) -> u16 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        (self.state % 360) as u16
    }
}

/// The node's own branch color, else the nearest ancestor's, else `None`
/// (the renderer then falls back to its positional palette).
pub fn resolve_color(root: &Arc<TopicNode>, id: NodeId) -> TreeResult<Option<Color>> {
    let chain = ancestor_chain(root, id).ok_or(TreeError::InvalidNodeId(id))?;
    Ok(chain.iter().rev().find_map(|n| n.branch_color))
}

/// The node's layout side, inherited from the nearest ancestor that sets one.
pub fn resolve_direction(root: &Arc<TopicNode>, id: NodeId) -> TreeResult<Option<Direction>> {
    let chain = ancestor_chain(root, id).ok_or(TreeError::InvalidNodeId(id))?;
    Ok(chain.iter().rev().find_map(|n| n.direction))
}

fn hue_distance(a: u16, b: u16) -> u16 {
    let d = a.abs_diff(b) % 360;
    d.min(360 - d)
}

/// Pick a branch color for a new main topic that stands apart from its
/// siblings.
///
/// Sibling hues come from each main topic's resolved color (its own, else
/// the root's), or from `palette[index % len]` when neither is set. Best effort: after
/// [`HUE_TRIALS`] rejected candidates one more random hue is taken as-is.
pub fn assign_root_child_color(root: &TopicNode, palette: &[Color], source: &mut dyn HueSource) -> Color {
    let taken: Vec<u16> = root
        .children
        .iter()
        .enumerate()
        .filter_map(|(i, child)| {
            child
                .branch_color
                .or(root.branch_color)
                .or_else(|| (!palette.is_empty()).then(|| palette[i % palette.len()]))
        })
        .map(|c| c.hue())
        .collect();

    let distinct = (0..HUE_TRIALS)
        .map(|_| source.next_hue())
        .find(|&candidate| taken.iter().all(|&h| hue_distance(candidate, h) >= MIN_HUE_DISTANCE));
    let hue = match distinct {
        Some(hue) => hue,
        None => source.next_hue(),
    };

    log::debug!("assigned branch hue {hue} against {} sibling hue(s)", taken.len());
    Color::from_hsl(f32::from(hue), BRANCH_SATURATION, BRANCH_LIGHTNESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct Scripted(VecDeque<u16>);

    impl Scripted {
        fn new(hues: impl IntoIterator<Item = u16>) -> Self {
            Self(hues.into_iter().collect())
        }
    }

    impl HueSource for Scripted {
        fn next_hue(&mut self) -> u16 {
            self.0.pop_front().expect("script exhausted")
        }
    }

    fn branch(hue: f32) -> Color {
        Color::from_hsl(hue, BRANCH_SATURATION, BRANCH_LIGHTNESS)
    }

    fn hued(id: &str, hue: f32) -> TopicNode {
        let mut n = TopicNode::new(id, id);
        n.branch_color = Some(branch(hue));
        n
    }

    #[test]
    fn color_inherits_from_nearest_ancestor() {
        let mut mid = TopicNode::new("c-mid", "mid").with_child(TopicNode::new("c-leaf", "leaf"));
        mid.branch_color = Some(Color::rgb(10, 20, 30));
        let mut main = TopicNode::new("c-main", "main").with_child(mid);
        main.branch_color = Some(Color::rgb(200, 0, 0));
        let root = Arc::new(TopicNode::new("c-root", "root").with_child(main));

        let leaf = resolve_color(&root, NodeId::intern("c-leaf")).unwrap();
        assert_eq!(leaf, Some(Color::rgb(10, 20, 30)));
        let main = resolve_color(&root, NodeId::intern("c-main")).unwrap();
        assert_eq!(main, Some(Color::rgb(200, 0, 0)));
        assert_eq!(resolve_color(&root, NodeId::intern("c-root")).unwrap(), None);
        assert!(resolve_color(&root, NodeId::intern("c-ghost")).is_err());
    }

    #[test]
    fn direction_is_inherited() {
        let mut main = TopicNode::new("d-main", "main").with_child(TopicNode::new("d-leaf", "leaf"));
        main.direction = Some(Direction::Left);
        let root = Arc::new(TopicNode::new("d-root", "root").with_child(main));
        let got = resolve_direction(&root, NodeId::intern("d-leaf")).unwrap();
        assert_eq!(got, Some(Direction::Left));
    }

    #[test]
    fn rejects_hues_too_close_to_siblings() {
        let root = TopicNode::new("h-root", "root")
            .with_child(hued("h-red", 0.0))
            .with_child(hued("h-green", 120.0));
        // 5 and 130 are within 16° of a sibling; 60 is clear.
        let mut source = Scripted::new([5, 130, 60]);
        let color = assign_root_child_color(&root, &[], &mut source);
        assert_eq!(color, branch(60.0));
        assert!(source.0.is_empty());
    }

    #[test]
    fn distance_wraps_around_the_circle() {
        let root = TopicNode::new("w-root", "root").with_child(hued("w-a", 355.0));
        let mut source = Scripted::new([5, 12]);
        let color = assign_root_child_color(&root, &[], &mut source);
        assert_eq!(color, branch(12.0));
    }

    #[test]
    fn falls_back_to_unconditional_hue() {
        let root = TopicNode::new("f-root", "root").with_child(hued("f-a", 0.0));
        let script = std::iter::repeat_n(3, HUE_TRIALS).chain([7]);
        let mut source = Scripted::new(script);
        let color = assign_root_child_color(&root, &[], &mut source);
        assert_eq!(color, branch(7.0));
    }

    #[test]
    fn uncolored_siblings_use_the_palette() {
        let root = TopicNode::new("p-root", "root")
            .with_child(TopicNode::new("p-a", "a"))
            .with_child(TopicNode::new("p-b", "b"));
        let palette = [Color::rgb(255, 0, 0), Color::rgb(0, 0, 255)];
        let mut source = Scripted::new([236, 10, 90]);
        let color = assign_root_child_color(&root, &palette, &mut source);
        assert_eq!(color, branch(90.0));

        // Without a palette they contribute nothing.
        let mut source = Scripted::new([236]);
        assert_eq!(assign_root_child_color(&root, &[], &mut source), branch(236.0));
    }

    #[test]
    fn uncolored_siblings_inherit_the_root_color_before_the_palette() {
        let mut root = TopicNode::new("i-root", "root").with_child(TopicNode::new("i-a", "a"));
        root.branch_color = Some(branch(0.0));
        let palette = [branch(240.0)];
        // 8 sits next to the inherited root hue; 240 only clashes with the
        // unused palette entry.
        let mut source = Scripted::new([8, 240]);
        let color = assign_root_child_color(&root, &palette, &mut source);
        assert_eq!(color, branch(240.0));
        assert!(source.0.is_empty());
    }

    #[test]
    fn seeded_source_is_deterministic_and_in_range() {
        let mut a = XorShiftHues::seeded(42);
        let mut b = XorShiftHues::seeded(42);
        for _ in 0..1000 {
            let h = a.next_hue();
            assert!(h < 360);
            assert_eq!(h, b.next_hue());
        }
    }
}
