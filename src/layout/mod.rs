//! C4: the layout engine. Floating (snap/drag) and tiling (grid fallback,
//! BSP primary) share one [`LayoutEngine`] interface so the scheduler and
//! workspace code do not need to know which regime is active.

pub mod bsp;
pub mod constraint;
pub mod floating;
pub mod grid;

use crate::config::TilingScheme;
use crate::geometry::Rect;
use crate::session::WindowId;
use std::collections::HashMap;

/// Shared surface between the grid fallback and the BSP tree: place
/// windows into `bounds`, add one, remove one.
pub trait LayoutEngine {
    fn apply(&self, bounds: Rect) -> HashMap<WindowId, Rect>;
    fn insert(&mut self, id: WindowId, target: Option<WindowId>, bounds: Rect);
    fn remove(&mut self, id: WindowId);
}

/// The BSP tree, wired to a single tiling scheme and default split ratio.
pub struct BspLayout {
    pub tree: bsp::BspTree,
    pub scheme: TilingScheme,
    pub default_ratio: f32,
}

impl BspLayout {
    pub fn new(scheme: TilingScheme) -> Self {
        Self { tree: bsp::BspTree::new(), scheme, default_ratio: 0.5 }
    }
}

impl LayoutEngine for BspLayout {
    fn apply(&self, bounds: Rect) -> HashMap<WindowId, Rect> {
        self.tree.apply(bounds)
    }

    fn insert(&mut self, id: WindowId, target: Option<WindowId>, bounds: Rect) {
        self.tree.insert(id, target, self.default_ratio, bounds, self.scheme);
    }

    fn remove(&mut self, id: WindowId) {
        self.tree.remove(id);
    }
}

/// The plain N-window grid fallback; used before a workspace has a BSP
/// tree populated, or when `TilingScheme` selection prefers the simpler
/// layout for a given window count (left to the caller).
#[derive(Default)]
pub struct GridLayout {
    order: Vec<WindowId>,
}

impl GridLayout {
    pub fn new() -> Self {
        Self { order: Vec::new() }
    }
}

impl LayoutEngine for GridLayout {
    fn apply(&self, bounds: Rect) -> HashMap<WindowId, Rect> {
        grid::compute_grid(&self.order, bounds)
    }

    fn insert(&mut self, id: WindowId, _target: Option<WindowId>, _bounds: Rect) {
        if !self.order.contains(&id) {
            self.order.push(id);
        }
    }

    fn remove(&mut self, id: WindowId) {
        self.order.retain(|&w| w != id);
    }
}

/// Whether a workspace is tiling (BSP-driven) or floating (snap/drag).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    Floating,
    Tiling,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(engine: &mut dyn LayoutEngine, bounds: Rect) -> HashMap<WindowId, Rect> {
        engine.insert(1, None, bounds);
        engine.insert(2, Some(1), bounds);
        engine.insert(3, Some(2), bounds);
        engine.apply(bounds)
    }

    #[test]
    fn bsp_and_grid_both_satisfy_the_layout_engine_trait() {
        let bounds = Rect::new(0, 0, 80, 22);

        let mut bsp = BspLayout::new(TilingScheme::Spiral);
        let bsp_rects = exercise(&mut bsp, bounds);
        assert_eq!(bsp_rects.len(), 3);

        let mut grid = GridLayout::new();
        let grid_rects = exercise(&mut grid, bounds);
        assert_eq!(grid_rects.len(), 3);
    }

    #[test]
    fn grid_layout_remove_drops_window() {
        let bounds = Rect::new(0, 0, 80, 22);
        let mut grid = GridLayout::new();
        grid.insert(1, None, bounds);
        grid.insert(2, None, bounds);
        grid.remove(1);
        let rects = grid.apply(bounds);
        assert_eq!(rects.len(), 1);
        assert!(rects.contains_key(&2));
    }
}
