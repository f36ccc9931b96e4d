//! Floating mode: quarter/half/full snapping and the centered default
//! geometry new windows and unsnap fall back to.

use crate::animation::{Animation, AnimationKind};
use crate::geometry::Rect;
use crate::session::WindowId;
use std::time::Duration;

pub const SNAP_ANIMATION: Duration = Duration::from_millis(180);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapTarget {
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Full,
    Unsnap,
}

/// The area floating/snapped windows may occupy: the full viewport minus
/// the one-row dock footer.
pub fn usable_area(viewport: Rect, dock_height: u16) -> Rect {
    Rect::new(viewport.x, viewport.y, viewport.width, viewport.height.saturating_sub(dock_height))
}

fn enforce_minimum(mut rect: Rect, min_width: u16, min_height: u16) -> Rect {
    rect.width = rect.width.max(min_width);
    rect.height = rect.height.max(min_height);
    rect
}

/// The default centered geometry for a new floating window, or the target
/// of `Unsnap`.
pub fn centered_default(viewport: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(viewport.width.max(1));
    let height = height.min(viewport.height.max(1));
    let x = viewport.x + (viewport.width as i32 - width as i32) / 2;
    let y = viewport.y + (viewport.height as i32 - height as i32) / 2;
    Rect::new(x, y, width, height)
}

/// Computes the target rectangle for a snap gesture (scenario S1: `Full`
/// over an 80x24 viewport with a 2-row dock yields (0,0,80,22)).
pub fn snap_rect(
    target: SnapTarget,
    viewport: Rect,
    dock_height: u16,
    default_width: u16,
    default_height: u16,
    min_width: u16,
    min_height: u16,
) -> Rect {
    let usable = usable_area(viewport, dock_height);
    let half_w = (usable.width / 2).max(1);
    let half_h = (usable.height / 2).max(1);

    let rect = match target {
        SnapTarget::Full => usable,
        SnapTarget::Left => Rect::new(usable.x, usable.y, half_w, usable.height),
        SnapTarget::Right => {
            Rect::new(usable.x + half_w as i32, usable.y, usable.width - half_w, usable.height)
        }
        SnapTarget::TopLeft => Rect::new(usable.x, usable.y, half_w, half_h),
        SnapTarget::TopRight => Rect::new(usable.x + half_w as i32, usable.y, usable.width - half_w, half_h),
        SnapTarget::BottomLeft => Rect::new(usable.x, usable.y + half_h as i32, half_w, usable.height - half_h),
        SnapTarget::BottomRight => Rect::new(
            usable.x + half_w as i32,
            usable.y + half_h as i32,
            usable.width - half_w,
            usable.height - half_h,
        ),
        SnapTarget::Unsnap => centered_default(viewport, default_width, default_height),
    };

    enforce_minimum(rect, min_width, min_height)
}

/// Builds the [`Animation`] for a snap gesture, or `None` if the window is
/// already at the target rectangle (instant no-op, no animation needed).
pub fn resolve_snap(
    window_id: WindowId,
    current: Rect,
    target: SnapTarget,
    viewport: Rect,
    dock_height: u16,
    default_width: u16,
    default_height: u16,
    min_width: u16,
    min_height: u16,
) -> Option<Animation> {
    let end = snap_rect(target, viewport, dock_height, default_width, default_height, min_width, min_height);
    if end == current {
        return None;
    }
    Some(Animation::new(AnimationKind::Snap, window_id, current, end, SNAP_ANIMATION))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_snap_full_scenario() {
        let viewport = Rect::new(0, 0, 80, 24);
        let rect = snap_rect(SnapTarget::Full, viewport, 2, 40, 12, 20, 6);
        assert_eq!(rect, Rect::new(0, 0, 80, 22));
        assert_eq!(rect.content_size(), (78, 20));
    }

    #[test]
    fn quarters_tile_the_usable_area_exactly() {
        let viewport = Rect::new(0, 0, 80, 24);
        let tl = snap_rect(SnapTarget::TopLeft, viewport, 2, 40, 12, 1, 1);
        let tr = snap_rect(SnapTarget::TopRight, viewport, 2, 40, 12, 1, 1);
        let bl = snap_rect(SnapTarget::BottomLeft, viewport, 2, 40, 12, 1, 1);
        let br = snap_rect(SnapTarget::BottomRight, viewport, 2, 40, 12, 1, 1);
        let total = tl.area() + tr.area() + bl.area() + br.area();
        assert_eq!(total, usable_area(viewport, 2).area());
    }

    #[test]
    fn resolve_snap_is_none_when_already_at_target() {
        let viewport = Rect::new(0, 0, 80, 24);
        let full = snap_rect(SnapTarget::Full, viewport, 2, 40, 12, 20, 6);
        assert!(resolve_snap(1, full, SnapTarget::Full, viewport, 2, 40, 12, 20, 6).is_none());
    }

    #[test]
    fn resolve_snap_animates_between_distinct_rects() {
        let viewport = Rect::new(0, 0, 80, 24);
        let current = Rect::new(10, 5, 40, 12);
        let anim = resolve_snap(1, current, SnapTarget::Full, viewport, 2, 40, 12, 20, 6).unwrap();
        assert_eq!(anim.end, Rect::new(0, 0, 80, 22));
        assert_eq!(anim.start, current);
    }

    #[test]
    fn minimum_size_is_enforced_on_small_quarters() {
        let viewport = Rect::new(0, 0, 20, 10);
        let rect = snap_rect(SnapTarget::TopLeft, viewport, 2, 40, 12, 20, 6);
        assert!(rect.width >= 20);
        assert!(rect.height >= 6);
    }
}
