//! Shared geometry primitives used by the layout engine and renderer.

/// An axis-aligned rectangle measured in terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Content area inside the 1-cell border on every side, per the
    /// `max(width-2,1) x max(height-2,1)` invariant.
    pub fn content_size(&self) -> (u16, u16) {
        (self.width.saturating_sub(2).max(1), self.height.saturating_sub(2).max(1))
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// True if `other` is wholly outside `self` expanded by `margin` cells.
    pub fn culled_by_margin(&self, other: &Rect, margin: i32) -> bool {
        let expanded = Rect {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + (2 * margin).max(0) as u16,
            height: self.height + (2 * margin).max(0) as u16,
        };
        !expanded.intersects(other)
    }

    pub fn contains_point(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Splits this rectangle into two along `split`, at `ratio` (0.0..1.0) of
    /// the relevant dimension. Remainder cells go to the second child so the
    /// split is exact (no cell is ever dropped or double counted).
    pub fn split(&self, kind: SplitKind, ratio: f32) -> (Rect, Rect) {
        let ratio = ratio.clamp(0.1, 0.9);
        match kind {
            SplitKind::Vertical => {
                let first_w = ((self.width as f32) * ratio).round() as u16;
                let first_w = first_w.clamp(1, self.width.saturating_sub(1).max(1));
                let second_w = self.width - first_w;
                (
                    Rect::new(self.x, self.y, first_w, self.height),
                    Rect::new(self.x + first_w as i32, self.y, second_w, self.height),
                )
            }
            SplitKind::Horizontal => {
                let first_h = ((self.height as f32) * ratio).round() as u16;
                let first_h = first_h.clamp(1, self.height.saturating_sub(1).max(1));
                let second_h = self.height - first_h;
                (
                    Rect::new(self.x, self.y, self.width, first_h),
                    Rect::new(self.x, self.y + first_h as i32, self.width, second_h),
                )
            }
        }
    }
}

/// Orientation of a BSP split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitKind {
    Horizontal,
    Vertical,
}

impl SplitKind {
    pub fn toggled(self) -> Self {
        match self {
            SplitKind::Horizontal => SplitKind::Vertical,
            SplitKind::Vertical => SplitKind::Horizontal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_covers_parent_exactly() {
        let r = Rect::new(0, 0, 80, 22);
        let (a, b) = r.split(SplitKind::Vertical, 0.5);
        assert_eq!(a.width + b.width, r.width);
        assert_eq!(a.x, 0);
        assert_eq!(b.x, a.right());
    }

    #[test]
    fn content_size_respects_minimum() {
        let r = Rect::new(0, 0, 1, 1);
        assert_eq!(r.content_size(), (1, 1));
    }

    #[test]
    fn culled_by_margin_respects_margin() {
        let viewport = Rect::new(0, 0, 80, 24);
        let far = Rect::new(200, 200, 10, 10);
        assert!(viewport.culled_by_margin(&far, 5));
        let near = Rect::new(-3, -3, 10, 10);
        assert!(!viewport.culled_by_margin(&near, 5));
    }
}
