//! C4 primary tiling layout: a per-workspace binary space-partitioning tree.
//!
//! One tree instance lives per workspace (see [`crate::workspace::Workspace`]).

use crate::config::TilingScheme;
use crate::geometry::{Rect, SplitKind};
use crate::session::WindowId;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(WindowId),
    Split { kind: SplitKind, ratio: f32, first: Box<Node>, second: Box<Node> },
}

/// A one-shot directional hint that forces the next inserted window's split
/// side; cleared after a single use.
#[derive(Debug, Clone, Copy)]
pub struct Preselection {
    pub target: WindowId,
    pub direction: Direction,
}

#[derive(Default)]
pub struct BspTree {
    root: Option<Node>,
    pub preselection: Option<Preselection>,
}

impl BspTree {
    pub fn new() -> Self {
        Self { root: None, preselection: None }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn contains(&self, id: WindowId) -> bool {
        fn walk(node: &Node, id: WindowId) -> bool {
            match node {
                Node::Leaf(w) => *w == id,
                Node::Split { first, second, .. } => walk(first, id) || walk(second, id),
            }
        }
        self.root.as_ref().is_some_and(|n| walk(n, id))
    }

    fn first_leaf(&self) -> Option<WindowId> {
        fn walk(node: &Node) -> WindowId {
            match node {
                Node::Leaf(id) => *id,
                Node::Split { first, .. } => walk(first),
            }
        }
        self.root.as_ref().map(walk)
    }

    /// Inserts `new_id`. With no target, targets the first leaf found. With
    /// `orientation = None`, uses the configured scheme (spiral by depth, or
    /// longest-side of the target leaf's current rectangle). A preselection,
    /// if set for this target, overrides everything and is consumed.
    pub fn insert(
        &mut self,
        new_id: WindowId,
        target_id: Option<WindowId>,
        ratio: f32,
        bounds: Rect,
        scheme: TilingScheme,
    ) {
        let Some(root) = self.root.take() else {
            self.root = Some(Node::Leaf(new_id));
            return;
        };

        let target = target_id.or_else(|| self.first_leaf()).unwrap_or(new_id);

        if let Some(pre) = self.preselection.take() {
            if pre.target == target {
                let kind = match pre.direction {
                    Direction::Left | Direction::Right => SplitKind::Vertical,
                    Direction::Up | Direction::Down => SplitKind::Horizontal,
                };
                let new_is_first = matches!(pre.direction, Direction::Left | Direction::Up);
                self.root = Some(replace_leaf(root, target, 0, &mut |_leaf_rect, _depth| {
                    (kind, new_is_first)
                }, new_id, ratio, bounds));
                return;
            }
        }

        self.root = Some(replace_leaf(
            root,
            target,
            0,
            &mut |leaf_rect, depth| {
                let kind = match scheme {
                    TilingScheme::Spiral => {
                        if depth % 2 == 0 {
                            SplitKind::Vertical
                        } else {
                            SplitKind::Horizontal
                        }
                    }
                    TilingScheme::LongestSide => {
                        if leaf_rect.width >= leaf_rect.height {
                            SplitKind::Vertical
                        } else {
                            SplitKind::Horizontal
                        }
                    }
                };
                (kind, false)
            },
            new_id,
            ratio,
            bounds,
        ));
    }

    /// Removes `id`'s leaf, splicing its sibling up in its place. The tree
    /// may become empty.
    pub fn remove(&mut self, id: WindowId) {
        if let Some(root) = self.root.take() {
            self.root = remove_leaf(root, id);
        }
    }

    /// Recursively computes each window's rectangle. The union of the
    /// result equals `bounds` exactly and rectangles are pairwise disjoint.
    pub fn apply(&self, bounds: Rect) -> HashMap<WindowId, Rect> {
        let mut out = HashMap::new();
        if let Some(root) = &self.root {
            apply_node(root, bounds, &mut out);
        }
        out
    }

    /// Toggles the split kind at `id`'s parent; a no-op if `id` is the root
    /// leaf (no parent) or absent.
    pub fn rotate_split_at(&mut self, id: WindowId) {
        if let Some(root) = &mut self.root {
            rotate_parent_of(root, id);
        }
    }

    pub fn equalize(&mut self) {
        if let Some(root) = &mut self.root {
            equalize_node(root);
        }
    }

    /// Updates every internal ratio to match `rects` (keyed by window id),
    /// so the tree stays authoritative after a mouse-driven edge resize.
    pub fn sync_ratios_from_geometry(&mut self, rects: &HashMap<WindowId, Rect>) {
        if let Some(root) = &mut self.root {
            sync_node(root, rects);
        }
    }

    pub fn swap(&mut self, a: WindowId, b: WindowId) {
        if let Some(root) = &mut self.root {
            swap_leaves(root, a, b);
        }
    }
}

fn replace_leaf(
    node: Node,
    target: WindowId,
    depth: u32,
    decide: &mut dyn FnMut(Rect, u32) -> (SplitKind, bool),
    new_id: WindowId,
    ratio: f32,
    bounds: Rect,
) -> Node {
    match node {
        Node::Leaf(id) if id == target => {
            let (kind, new_is_first) = decide(bounds, depth);
            let (existing, incoming) = if new_is_first {
                (Node::Leaf(new_id), Node::Leaf(id))
            } else {
                (Node::Leaf(id), Node::Leaf(new_id))
            };
            Node::Split { kind, ratio, first: Box::new(existing), second: Box::new(incoming) }
        }
        Node::Leaf(id) => Node::Leaf(id),
        Node::Split { kind, ratio: node_ratio, first, second } => {
            let (first_bounds, second_bounds) = bounds.split(kind, node_ratio);
            let first = replace_leaf(*first, target, depth + 1, decide, new_id, ratio, first_bounds);
            let second = replace_leaf(*second, target, depth + 1, decide, new_id, ratio, second_bounds);
            Node::Split { kind, ratio: node_ratio, first: Box::new(first), second: Box::new(second) }
        }
    }
}

fn remove_leaf(node: Node, target: WindowId) -> Option<Node> {
    match node {
        Node::Leaf(id) if id == target => None,
        Node::Leaf(id) => Some(Node::Leaf(id)),
        Node::Split { kind, ratio, first, second } => {
            if matches!(*first, Node::Leaf(id) if id == target) {
                return Some(*second);
            }
            if matches!(*second, Node::Leaf(id) if id == target) {
                return Some(*first);
            }
            let first = remove_leaf(*first, target);
            let second = remove_leaf(*second, target);
            match (first, second) {
                (Some(f), Some(s)) => {
                    Some(Node::Split { kind, ratio, first: Box::new(f), second: Box::new(s) })
                }
                (Some(f), None) => Some(f),
                (None, Some(s)) => Some(s),
                (None, None) => None,
            }
        }
    }
}

fn apply_node(node: &Node, bounds: Rect, out: &mut HashMap<WindowId, Rect>) {
    match node {
        Node::Leaf(id) => {
            out.insert(*id, bounds);
        }
        Node::Split { kind, ratio, first, second } => {
            let (first_bounds, second_bounds) = bounds.split(*kind, *ratio);
            apply_node(first, first_bounds, out);
            apply_node(second, second_bounds, out);
        }
    }
}

fn rotate_parent_of(node: &mut Node, id: WindowId) -> bool {
    match node {
        Node::Leaf(_) => false,
        Node::Split { kind, first, second, .. } => {
            let first_is_target = matches!(first.as_ref(), Node::Leaf(w) if *w == id);
            let second_is_target = matches!(second.as_ref(), Node::Leaf(w) if *w == id);
            if first_is_target || second_is_target {
                *kind = kind.toggled();
                return true;
            }
            rotate_parent_of(first, id) || rotate_parent_of(second, id)
        }
    }
}

fn equalize_node(node: &mut Node) {
    if let Node::Split { ratio, first, second, .. } = node {
        *ratio = 0.5;
        equalize_node(first);
        equalize_node(second);
    }
}

/// Returns the bounding rect of `node`'s subtree given leaf rectangles,
/// updating ratios of internal nodes to match the observed child sizes.
fn sync_node(node: &mut Node, rects: &HashMap<WindowId, Rect>) -> Option<Rect> {
    match node {
        Node::Leaf(id) => rects.get(id).copied(),
        Node::Split { kind, ratio, first, second } => {
            let first_rect = sync_node(first, rects)?;
            let second_rect = sync_node(second, rects)?;
            *ratio = match kind {
                SplitKind::Vertical => {
                    let total = first_rect.width + second_rect.width;
                    if total == 0 { *ratio } else { first_rect.width as f32 / total as f32 }
                }
                SplitKind::Horizontal => {
                    let total = first_rect.height + second_rect.height;
                    if total == 0 { *ratio } else { first_rect.height as f32 / total as f32 }
                }
            };
            Some(union_rect(first_rect, second_rect))
        }
    }
}

fn union_rect(a: Rect, b: Rect) -> Rect {
    let x = a.x.min(b.x);
    let y = a.y.min(b.y);
    let right = a.right().max(b.right());
    let bottom = a.bottom().max(b.bottom());
    Rect::new(x, y, (right - x) as u16, (bottom - y) as u16)
}

fn swap_leaves(node: &mut Node, a: WindowId, b: WindowId) {
    match node {
        Node::Leaf(id) => {
            if *id == a {
                *id = b;
            } else if *id == b {
                *id = a;
            }
        }
        Node::Split { first, second, .. } => {
            swap_leaves(first, a, b);
            swap_leaves(second, a, b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rects_disjoint(rects: &HashMap<WindowId, Rect>) -> bool {
        let list: Vec<&Rect> = rects.values().collect();
        for i in 0..list.len() {
            for j in (i + 1)..list.len() {
                if list[i].intersects(list[j]) {
                    return false;
                }
            }
        }
        true
    }

    fn union_area(rects: &HashMap<WindowId, Rect>) -> u64 {
        rects.values().map(|r| r.area()).sum()
    }

    #[test]
    fn s2_bsp_spiral_scenario() {
        let bounds = Rect::new(0, 0, 80, 22);
        let mut tree = BspTree::new();
        tree.insert(1, None, 0.5, bounds, TilingScheme::Spiral);
        let rects = tree.apply(bounds);
        assert_eq!(rects[&1], bounds);

        tree.insert(2, Some(1), 0.5, bounds, TilingScheme::Spiral);
        let rects = tree.apply(bounds);
        assert_eq!(rects[&1], Rect::new(0, 0, 40, 22));
        assert_eq!(rects[&2], Rect::new(40, 0, 40, 22));

        tree.insert(3, Some(2), 0.5, bounds, TilingScheme::Spiral);
        let rects = tree.apply(bounds);
        assert_eq!(rects[&2], Rect::new(40, 0, 40, 11));
        assert_eq!(rects[&3], Rect::new(40, 11, 40, 11));

        tree.insert(4, Some(3), 0.5, bounds, TilingScheme::Spiral);
        let rects = tree.apply(bounds);
        assert_eq!(rects[&3], Rect::new(40, 11, 20, 11));
        assert_eq!(rects[&4], Rect::new(60, 11, 20, 11));

        assert!(rects_disjoint(&rects));
        assert_eq!(union_area(&rects), bounds.area());
    }

    #[test]
    fn apply_covers_bounds_exactly_for_arbitrary_inserts() {
        let bounds = Rect::new(0, 0, 123, 47);
        let mut tree = BspTree::new();
        tree.insert(1, None, 0.5, bounds, TilingScheme::Spiral);
        for (i, target) in [(2u32, 1u32), (3, 2), (4, 1), (5, 3)] {
            tree.insert(i, Some(target), 0.4, bounds, TilingScheme::Spiral);
        }
        let rects = tree.apply(bounds);
        assert_eq!(rects.len(), 5);
        assert!(rects_disjoint(&rects));
        assert_eq!(union_area(&rects), bounds.area());
    }

    #[test]
    fn remove_splices_sibling_up() {
        let bounds = Rect::new(0, 0, 80, 22);
        let mut tree = BspTree::new();
        tree.insert(1, None, 0.5, bounds, TilingScheme::Spiral);
        tree.insert(2, Some(1), 0.5, bounds, TilingScheme::Spiral);
        tree.remove(2);
        assert!(!tree.contains(2));
        let rects = tree.apply(bounds);
        assert_eq!(rects[&1], bounds);
    }

    #[test]
    fn equalize_sets_all_ratios_to_half() {
        let bounds = Rect::new(0, 0, 80, 22);
        let mut tree = BspTree::new();
        tree.insert(1, None, 0.5, bounds, TilingScheme::Spiral);
        tree.insert(2, Some(1), 0.8, bounds, TilingScheme::Spiral);
        tree.equalize();
        let rects = tree.apply(bounds);
        assert_eq!(rects[&1].width, 40);
        assert_eq!(rects[&2].width, 40);
    }

    #[test]
    fn sync_ratios_round_trips_with_apply() {
        let bounds = Rect::new(0, 0, 100, 40);
        let mut tree = BspTree::new();
        tree.insert(1, None, 0.5, bounds, TilingScheme::Spiral);
        tree.insert(2, Some(1), 0.3, bounds, TilingScheme::Spiral);
        let rects = tree.apply(bounds);
        tree.sync_ratios_from_geometry(&rects);
        let rects_again = tree.apply(bounds);
        assert_eq!(rects, rects_again);
    }

    #[test]
    fn swap_exchanges_leaves_in_place() {
        let bounds = Rect::new(0, 0, 80, 22);
        let mut tree = BspTree::new();
        tree.insert(1, None, 0.5, bounds, TilingScheme::Spiral);
        tree.insert(2, Some(1), 0.5, bounds, TilingScheme::Spiral);
        let before = tree.apply(bounds);
        tree.swap(1, 2);
        let after = tree.apply(bounds);
        assert_eq!(before[&1], after[&2]);
        assert_eq!(before[&2], after[&1]);
    }
}
