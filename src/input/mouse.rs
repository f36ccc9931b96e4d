//! Mouse hit-testing against visible windows (descending z order) and the
//! drag/resize gesture math that follows from a hit.

use crate::geometry::Rect;
use crate::session::WindowId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    TitleBar(WindowId),
    Corner(WindowId, Corner),
    Edge(WindowId, Edge),
    Body(WindowId),
    Dock(usize),
    Empty,
}

fn classify(rect: Rect, point: (i32, i32)) -> HitTarget {
    let (px, py) = point;
    let near = |a: i32, b: i32| (a - b).abs() <= 1;
    let at_left = near(px, rect.x);
    let at_right = near(px, rect.right() - 1);
    let at_top = near(py, rect.y);
    let at_bottom = near(py, rect.bottom() - 1);

    if at_top && at_left {
        return HitTarget::Corner(0, Corner::TopLeft);
    }
    if at_top && at_right {
        return HitTarget::Corner(0, Corner::TopRight);
    }
    if at_bottom && at_left {
        return HitTarget::Corner(0, Corner::BottomLeft);
    }
    if at_bottom && at_right {
        return HitTarget::Corner(0, Corner::BottomRight);
    }
    if at_top {
        return HitTarget::TitleBar(0);
    }
    if at_left {
        return HitTarget::Edge(0, Edge::Left);
    }
    if at_right {
        return HitTarget::Edge(0, Edge::Right);
    }
    if at_bottom {
        return HitTarget::Edge(0, Edge::Bottom);
    }
    HitTarget::Body(0)
}

fn with_id(target: HitTarget, id: WindowId) -> HitTarget {
    match target {
        HitTarget::Corner(_, c) => HitTarget::Corner(id, c),
        HitTarget::TitleBar(_) => HitTarget::TitleBar(id),
        HitTarget::Edge(_, e) => HitTarget::Edge(id, e),
        HitTarget::Body(_) => HitTarget::Body(id),
        other => other,
    }
}

/// Hit-tests `point` against `windows`, which must already be sorted
/// topmost-first (descending z) by the caller.
pub fn hit_test(windows_desc_z: &[(WindowId, Rect)], point: (i32, i32)) -> HitTarget {
    for (id, rect) in windows_desc_z {
        if rect.contains_point(point.0, point.1) {
            return with_id(classify(*rect, point), *id);
        }
    }
    HitTarget::Empty
}

/// Hit-tests the one-row dock footer, returning the item index under
/// `point`'s x-coordinate if it falls inside `dock_rect` and `item_count > 0`.
pub fn hit_test_dock(dock_rect: Rect, point: (i32, i32), item_count: usize) -> Option<usize> {
    if item_count == 0 || !dock_rect.contains_point(point.0, point.1) {
        return None;
    }
    let offset = (point.0 - dock_rect.x).max(0) as u32;
    let index = (offset * item_count as u32 / dock_rect.width.max(1) as u32) as usize;
    Some(index.min(item_count - 1))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Move { window_id: WindowId, grab_dx: i32, grab_dy: i32 },
    Resize { window_id: WindowId, corner: Corner, anchor: Rect },
    EdgeResize { window_id: WindowId, edge: Edge, anchor: Rect },
    Selection { window_id: WindowId, start: (i32, i32) },
}

/// Starts the gesture implied by hitting `target` at `point`, given the
/// window's current rectangle. Returns `None` for targets that do not
/// start a drag (dock clicks, empty space).
pub fn begin_gesture(target: HitTarget, rect: Rect, point: (i32, i32)) -> Option<Gesture> {
    match target {
        HitTarget::TitleBar(window_id) => {
            Some(Gesture::Move { window_id, grab_dx: point.0 - rect.x, grab_dy: point.1 - rect.y })
        }
        HitTarget::Corner(window_id, corner) => Some(Gesture::Resize { window_id, corner, anchor: rect }),
        HitTarget::Edge(window_id, edge) => Some(Gesture::EdgeResize { window_id, edge, anchor: rect }),
        HitTarget::Body(window_id) => Some(Gesture::Selection { window_id, start: point }),
        HitTarget::Dock(_) | HitTarget::Empty => None,
    }
}

/// Computes the new rectangle for a move gesture; width/height are
/// unchanged, only the origin follows the cursor minus the original grab
/// offset.
pub fn apply_move(rect: Rect, grab_dx: i32, grab_dy: i32, point: (i32, i32)) -> Rect {
    Rect::new(point.0 - grab_dx, point.1 - grab_dy, rect.width, rect.height)
}

/// Computes the new rectangle for a corner-resize gesture: the opposite
/// corner stays fixed, the dragged corner follows the cursor, and both
/// dimensions are floored at the configured minimum size.
pub fn apply_corner_resize(anchor: Rect, corner: Corner, point: (i32, i32), min_width: u16, min_height: u16) -> Rect {
    let (fixed_x, fixed_y) = match corner {
        Corner::TopLeft => (anchor.right(), anchor.bottom()),
        Corner::TopRight => (anchor.x, anchor.bottom()),
        Corner::BottomLeft => (anchor.right(), anchor.y),
        Corner::BottomRight => (anchor.x, anchor.y),
    };
    let (left, right) = if point.0 <= fixed_x { (point.0, fixed_x) } else { (fixed_x, point.0) };
    let (top, bottom) = if point.1 <= fixed_y { (point.1, fixed_y) } else { (fixed_y, point.1) };
    Rect::new(left, top, ((right - left) as u16).max(min_width), ((bottom - top) as u16).max(min_height))
}

/// Computes the new rectangle for a single-edge drag (used for tiling's
/// constraint-based edge resize and floating's plain edge resize alike).
pub fn apply_edge_resize(anchor: Rect, edge: Edge, point: (i32, i32), min_width: u16, min_height: u16) -> Rect {
    match edge {
        Edge::Left => {
            let right = anchor.right();
            let left = point.0.min(right - min_width as i32);
            Rect::new(left, anchor.y, (right - left) as u16, anchor.height)
        }
        Edge::Right => {
            let width = (point.0 - anchor.x).max(min_width as i32) as u16;
            Rect::new(anchor.x, anchor.y, width, anchor.height)
        }
        Edge::Top => {
            let bottom = anchor.bottom();
            let top = point.1.min(bottom - min_height as i32);
            Rect::new(anchor.x, top, anchor.width, (bottom - top) as u16)
        }
        Edge::Bottom => {
            let height = (point.1 - anchor.y).max(min_height as i32) as u16;
            Rect::new(anchor.x, anchor.y, anchor.width, height)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_test_picks_topmost_window_at_a_point() {
        let windows = vec![(2, Rect::new(5, 5, 20, 10)), (1, Rect::new(0, 0, 40, 20))];
        let hit = hit_test(&windows, (10, 10));
        assert!(matches!(hit, HitTarget::Body(2)));
    }

    #[test]
    fn corner_tolerance_is_one_cell() {
        let rect = Rect::new(0, 0, 20, 10);
        assert_eq!(classify(rect, (0, 0)), HitTarget::Corner(0, Corner::TopLeft));
        assert_eq!(classify(rect, (1, 1)), HitTarget::Corner(0, Corner::TopLeft));
        assert_eq!(classify(rect, (19, 9)), HitTarget::Corner(0, Corner::BottomRight));
    }

    #[test]
    fn title_bar_is_the_top_border_excluding_corners() {
        let rect = Rect::new(0, 0, 20, 10);
        assert_eq!(classify(rect, (10, 0)), HitTarget::TitleBar(0));
    }

    #[test]
    fn move_gesture_preserves_grab_offset() {
        let rect = Rect::new(10, 5, 20, 10);
        let target = classify(rect, (15, 5));
        let gesture = begin_gesture(with_id(target, 7), rect, (15, 5)).unwrap();
        assert_eq!(gesture, Gesture::Move { window_id: 7, grab_dx: 5, grab_dy: 0 });
        let moved = apply_move(rect, 5, 0, (20, 8));
        assert_eq!(moved, Rect::new(15, 8, 20, 10));
    }

    #[test]
    fn corner_resize_keeps_opposite_corner_fixed() {
        let anchor = Rect::new(0, 0, 20, 10);
        let resized = apply_corner_resize(anchor, Corner::TopLeft, (5, 5), 4, 4);
        assert_eq!(resized, Rect::new(5, 5, 15, 5));
    }

    #[test]
    fn edge_resize_respects_minimum_size() {
        let anchor = Rect::new(0, 0, 20, 10);
        let resized = apply_edge_resize(anchor, Edge::Right, (2, 5), 20, 4);
        assert_eq!(resized.width, 20);
    }

    #[test]
    fn dock_hit_test_divides_evenly() {
        let dock = Rect::new(0, 23, 80, 1);
        assert_eq!(hit_test_dock(dock, (5, 23), 4), Some(0));
        assert_eq!(hit_test_dock(dock, (75, 23), 4), Some(3));
        assert_eq!(hit_test_dock(dock, (5, 0), 4), None);
    }
}
