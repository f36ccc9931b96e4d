//! Constraint-based edge resize shared by keyboard and mouse-driven tiling
//! resizes: clamps a proposed edge move to each affected window's minimum size.

use crate::geometry::Rect;
use crate::session::WindowId;
use std::collections::HashMap;

/// Moves the vertical split line at `old_x` to as close to `new_x` as every
/// window touching that line allows, keeping every touched window at least
/// `min_width` wide. Returns the clamped line position actually applied.
fn move_vertical_line(rects: &mut HashMap<WindowId, Rect>, old_x: i32, new_x: i32, min_width: u16) -> i32 {
    let tolerance = 1;
    let left_ids: Vec<WindowId> = rects
        .iter()
        .filter(|(_, r)| (r.right() - old_x).abs() <= tolerance)
        .map(|(id, _)| *id)
        .collect();
    let right_ids: Vec<WindowId> = rects
        .iter()
        .filter(|(_, r)| (r.x - old_x).abs() <= tolerance)
        .map(|(id, _)| *id)
        .collect();

    if left_ids.is_empty() && right_ids.is_empty() {
        return old_x;
    }

    let min_allowed = left_ids
        .iter()
        .map(|id| rects[id].x + min_width as i32)
        .max()
        .unwrap_or(i32::MIN);
    let max_allowed = right_ids
        .iter()
        .map(|id| rects[id].right() - min_width as i32)
        .min()
        .unwrap_or(i32::MAX);

    let clamped = if min_allowed > max_allowed {
        old_x
    } else {
        new_x.clamp(min_allowed, max_allowed)
    };

    for id in left_ids {
        if let Some(r) = rects.get_mut(&id) {
            r.width = (clamped - r.x).max(1) as u16;
        }
    }
    for id in right_ids {
        if let Some(r) = rects.get_mut(&id) {
            let right = r.right();
            r.x = clamped;
            r.width = (right - clamped).max(1) as u16;
        }
    }
    clamped
}

/// Horizontal analogue of [`move_vertical_line`], moving a shared row
/// boundary instead of a column boundary.
fn move_horizontal_line(rects: &mut HashMap<WindowId, Rect>, old_y: i32, new_y: i32, min_height: u16) -> i32 {
    let tolerance = 1;
    let top_ids: Vec<WindowId> = rects
        .iter()
        .filter(|(_, r)| (r.bottom() - old_y).abs() <= tolerance)
        .map(|(id, _)| *id)
        .collect();
    let bottom_ids: Vec<WindowId> = rects
        .iter()
        .filter(|(_, r)| (r.y - old_y).abs() <= tolerance)
        .map(|(id, _)| *id)
        .collect();

    if top_ids.is_empty() && bottom_ids.is_empty() {
        return old_y;
    }

    let min_allowed = top_ids
        .iter()
        .map(|id| rects[id].y + min_height as i32)
        .max()
        .unwrap_or(i32::MIN);
    let max_allowed = bottom_ids
        .iter()
        .map(|id| rects[id].bottom() - min_height as i32)
        .min()
        .unwrap_or(i32::MAX);

    let clamped = if min_allowed > max_allowed {
        old_y
    } else {
        new_y.clamp(min_allowed, max_allowed)
    };

    for id in top_ids {
        if let Some(r) = rects.get_mut(&id) {
            r.height = (clamped - r.y).max(1) as u16;
        }
    }
    for id in bottom_ids {
        if let Some(r) = rects.get_mut(&id) {
            let bottom = r.bottom();
            r.y = clamped;
            r.height = (bottom - clamped).max(1) as u16;
        }
    }
    clamped
}

/// Applies a requested resize of `resized_id` to `requested`, propagating
/// the edges that moved to every window sharing that split line so
/// adjacency is preserved exactly. A defensive clamp runs at the end only
/// if the line-move above somehow left the resized window under the
/// minimum (it should not, in a well-formed tiling tree).
pub fn adjust_tiling_neighbors(
    rects: &mut HashMap<WindowId, Rect>,
    resized_id: WindowId,
    requested: Rect,
    min_width: u16,
    min_height: u16,
) {
    let Some(current) = rects.get(&resized_id).copied() else { return };

    if current.right() != requested.right() {
        move_vertical_line(rects, current.right(), requested.right(), min_width);
    }
    if current.x != requested.x {
        move_vertical_line(rects, current.x, requested.x, min_width);
    }
    if current.bottom() != requested.bottom() {
        move_horizontal_line(rects, current.bottom(), requested.bottom(), min_height);
    }
    if current.y != requested.y {
        move_horizontal_line(rects, current.y, requested.y, min_height);
    }

    if let Some(r) = rects.get_mut(&resized_id) {
        if r.width < min_width {
            r.width = min_width;
        }
        if r.height < min_height {
            r.height = min_height;
        }
    }
}

/// Tracks a visual-only resize in progress: constraint propagation runs on
/// every drag-move event, but the underlying PTYs are resized only once, on
/// release, via [`PendingResize::take`].
#[derive(Default)]
pub struct PendingResize {
    pending: Option<HashMap<WindowId, Rect>>,
}

impl PendingResize {
    pub fn new() -> Self {
        Self { pending: None }
    }

    /// Recomputes the constrained layout from `base_rects` (the last
    /// committed geometry) and stores it as the pending preview.
    pub fn update(
        &mut self,
        base_rects: &HashMap<WindowId, Rect>,
        resized_id: WindowId,
        requested: Rect,
        min_width: u16,
        min_height: u16,
    ) -> HashMap<WindowId, Rect> {
        let mut working = base_rects.clone();
        adjust_tiling_neighbors(&mut working, resized_id, requested, min_width, min_height);
        self.pending = Some(working.clone());
        working
    }

    pub fn is_active(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns and clears the pending geometry for the caller to apply to
    /// each window's PTY, then sync BSP ratios from.
    pub fn take(&mut self) -> Option<HashMap<WindowId, Rect>> {
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s3_constrained_resize_scenario() {
        let mut rects = HashMap::new();
        rects.insert(1, Rect::new(0, 0, 40, 22));
        rects.insert(2, Rect::new(40, 0, 40, 22));

        let requested = Rect::new(0, 0, 10, 22);
        adjust_tiling_neighbors(&mut rects, 1, requested, 20, 12);

        assert_eq!(rects[&1], Rect::new(0, 0, 20, 22));
        assert_eq!(rects[&2], Rect::new(20, 0, 60, 22));
    }

    #[test]
    fn resize_within_bounds_is_unclamped() {
        let mut rects = HashMap::new();
        rects.insert(1, Rect::new(0, 0, 40, 22));
        rects.insert(2, Rect::new(40, 0, 40, 22));

        let requested = Rect::new(0, 0, 50, 22);
        adjust_tiling_neighbors(&mut rects, 1, requested, 20, 12);

        assert_eq!(rects[&1], Rect::new(0, 0, 50, 22));
        assert_eq!(rects[&2], Rect::new(50, 0, 30, 22));
    }

    #[test]
    fn adjacency_preserved_across_three_windows_on_one_line() {
        let mut rects = HashMap::new();
        rects.insert(1, Rect::new(0, 0, 40, 11));
        rects.insert(2, Rect::new(0, 11, 40, 11));
        rects.insert(3, Rect::new(40, 0, 40, 22));

        // Move the shared vertical line (x=40) left to x=30.
        let requested = Rect::new(0, 0, 30, 11);
        adjust_tiling_neighbors(&mut rects, 1, requested, 10, 5);

        assert_eq!(rects[&1].right(), 30);
        assert_eq!(rects[&2].right(), 30);
        assert_eq!(rects[&3].x, 30);
    }

    #[test]
    fn pending_resize_does_not_mutate_base_until_taken() {
        let mut base = HashMap::new();
        base.insert(1, Rect::new(0, 0, 40, 22));
        base.insert(2, Rect::new(40, 0, 40, 22));

        let mut pending = PendingResize::new();
        let preview = pending.update(&base, 1, Rect::new(0, 0, 10, 22), 20, 12);
        assert_eq!(preview[&1].width, 20);
        assert_eq!(base[&1].width, 40);

        let applied = pending.take().unwrap();
        assert_eq!(applied[&1].width, 20);
        assert!(pending.take().is_none());
    }
}
