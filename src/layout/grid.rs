//! Grid tiling: the simple fallback layout used before a BSP tree exists
//! for a workspace, or when a caller wants a flat N-window arrangement.

use crate::geometry::{Rect, SplitKind};
use crate::session::WindowId;
use std::collections::HashMap;

/// Lays `ids` out as: 1 = full, 2 = halves, 3 = one full-height column
/// plus two stacked, 4 = 2x2, else a 2- or 3-column grid (2 columns when
/// `n <= 6`) with the last row and last column absorbing remainder cells.
pub fn compute_grid(ids: &[WindowId], bounds: Rect) -> HashMap<WindowId, Rect> {
    let n = ids.len();
    let mut out = HashMap::new();
    if n == 0 {
        return out;
    }
    if n == 1 {
        out.insert(ids[0], bounds);
        return out;
    }
    if n == 2 {
        let (a, b) = bounds.split(SplitKind::Vertical, 0.5);
        out.insert(ids[0], a);
        out.insert(ids[1], b);
        return out;
    }
    if n == 3 {
        let (left, right) = bounds.split(SplitKind::Vertical, 0.5);
        let (top, bottom) = right.split(SplitKind::Horizontal, 0.5);
        out.insert(ids[0], left);
        out.insert(ids[1], top);
        out.insert(ids[2], bottom);
        return out;
    }
    if n == 4 {
        let (left, right) = bounds.split(SplitKind::Vertical, 0.5);
        let (tl, bl) = left.split(SplitKind::Horizontal, 0.5);
        let (tr, br) = right.split(SplitKind::Horizontal, 0.5);
        out.insert(ids[0], tl);
        out.insert(ids[1], tr);
        out.insert(ids[2], bl);
        out.insert(ids[3], br);
        return out;
    }

    let cols = if n <= 6 { 2 } else { 3 };
    let rows = n.div_ceil(cols);
    let base_row_height = (bounds.height / rows as u16).max(1);

    let mut y = bounds.y;
    let mut idx = 0;
    for r in 0..rows {
        let remaining_items = n - idx;
        let items_in_row = remaining_items.min(cols);
        let row_height =
            if r == rows - 1 { (bounds.bottom() - y).max(1) as u16 } else { base_row_height };
        let base_col_width = (bounds.width / items_in_row as u16).max(1);

        let mut x = bounds.x;
        for c in 0..items_in_row {
            let col_width =
                if c == items_in_row - 1 { (bounds.right() - x).max(1) as u16 } else { base_col_width };
            out.insert(ids[idx], Rect::new(x, y, col_width, row_height));
            x += col_width as i32;
            idx += 1;
        }
        y += row_height as i32;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area_sum(rects: &HashMap<WindowId, Rect>) -> u64 {
        rects.values().map(|r| r.area()).sum()
    }

    #[test]
    fn single_window_fills_bounds() {
        let bounds = Rect::new(0, 0, 80, 22);
        let rects = compute_grid(&[1], bounds);
        assert_eq!(rects[&1], bounds);
    }

    #[test]
    fn two_windows_split_in_half() {
        let bounds = Rect::new(0, 0, 80, 22);
        let rects = compute_grid(&[1, 2], bounds);
        assert_eq!(rects[&1].width, 40);
        assert_eq!(rects[&2].width, 40);
        assert_eq!(area_sum(&rects), bounds.area());
    }

    #[test]
    fn three_windows_one_left_two_stacked_right() {
        let bounds = Rect::new(0, 0, 80, 22);
        let rects = compute_grid(&[1, 2, 3], bounds);
        assert_eq!(rects[&1].height, 22);
        assert_eq!(rects[&2].x, 40);
        assert_eq!(rects[&3].x, 40);
        assert!(rects[&2].y < rects[&3].y);
    }

    #[test]
    fn four_windows_two_by_two() {
        let bounds = Rect::new(0, 0, 80, 22);
        let rects = compute_grid(&[1, 2, 3, 4], bounds);
        assert_eq!(area_sum(&rects), bounds.area());
        assert_eq!(rects.len(), 4);
    }

    #[test]
    fn five_windows_uses_two_columns_and_covers_bounds() {
        let bounds = Rect::new(0, 0, 80, 21);
        let ids: Vec<WindowId> = (1..=5).collect();
        let rects = compute_grid(&ids, bounds);
        assert_eq!(rects.len(), 5);
        assert_eq!(area_sum(&rects), bounds.area());
    }

    #[test]
    fn seven_windows_uses_three_columns() {
        let bounds = Rect::new(0, 0, 90, 24);
        let ids: Vec<WindowId> = (1..=7).collect();
        let rects = compute_grid(&ids, bounds);
        assert_eq!(rects.len(), 7);
        assert_eq!(area_sum(&rects), bounds.area());
    }
}
