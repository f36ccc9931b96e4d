//! C8: workspaces. Each workspace owns its own tiling layout state and
//! master ratio; switching saves and restores focus per workspace rather
//! than sharing one global layout.

use crate::config::TilingScheme;
use crate::layout::{BspLayout, LayoutMode};
use crate::session::WindowId;
use crate::window::set::WindowSet;

const MASTER_RATIO_MIN: f32 = 0.3;
const MASTER_RATIO_MAX: f32 = 0.7;
const MASTER_RATIO_DEFAULT: f32 = 0.5;

pub struct Workspace {
    pub index: u8,
    pub last_focused: Option<WindowId>,
    pub master_ratio: f32,
    pub mode: LayoutMode,
    pub bsp: BspLayout,
}

impl Workspace {
    fn new(index: u8, scheme: TilingScheme) -> Self {
        Self {
            index,
            last_focused: None,
            master_ratio: MASTER_RATIO_DEFAULT,
            mode: LayoutMode::Tiling,
            bsp: BspLayout::new(scheme),
        }
    }

    pub fn set_master_ratio(&mut self, ratio: f32) {
        self.master_ratio = ratio.clamp(MASTER_RATIO_MIN, MASTER_RATIO_MAX);
    }
}

/// Owns all `N` workspaces and the currently active index.
pub struct WorkspaceManager {
    workspaces: Vec<Workspace>,
    current: u8,
}

impl WorkspaceManager {
    pub fn new(count: u8, scheme: TilingScheme) -> Self {
        let count = count.max(1);
        let workspaces = (0..count).map(|i| Workspace::new(i, scheme)).collect();
        Self { workspaces, current: 0 }
    }

    pub fn current(&self) -> u8 {
        self.current
    }

    pub fn count(&self) -> u8 {
        self.workspaces.len() as u8
    }

    pub fn get(&self, index: u8) -> Option<&Workspace> {
        self.workspaces.get(index as usize)
    }

    pub fn get_mut(&mut self, index: u8) -> Option<&mut Workspace> {
        self.workspaces.get_mut(index as usize)
    }

    pub fn current_mut(&mut self) -> &mut Workspace {
        self.workspaces.get_mut(self.current as usize).expect("current index always valid")
    }

    /// Switches to `target`: remembers the current workspace's focused
    /// window, restores the target's last-focused-and-still-visible
    /// window (falling back to the first visible window), marks every
    /// window in the target dirty so it redraws from a clean cache, and
    /// returns the id the caller should focus, if any.
    pub fn switch(&mut self, target: u8, windows: &mut WindowSet) -> Option<WindowId> {
        if target == self.current || target >= self.count() {
            return windows.focused;
        }

        if let Some(focused) = windows.focused {
            if let Some(w) = windows.get(focused) {
                if w.workspace == self.current {
                    self.current_mut().last_focused = Some(focused);
                }
            }
        }

        self.current = target;

        let remembered = self.get(target).and_then(|w| w.last_focused);
        let restored = match remembered {
            Some(id) if windows.get(id).is_some_and(|w| !w.minimized) => Some(id),
            _ => windows.next_visible(target, None),
        };

        for w in windows.iter_mut() {
            if w.workspace == target {
                w.mark_content_dirty();
                w.mark_position_dirty();
            }
        }

        if let Some(id) = restored {
            windows.focus(id);
        }
        restored
    }

    /// Moves `window_id` to `target`. If `follow`, the manager also
    /// switches to `target` and focuses the moved window; otherwise focus
    /// stays on the source workspace.
    pub fn move_window(&mut self, window_id: WindowId, target: u8, follow: bool, windows: &mut WindowSet) {
        let Some(window) = windows.get_mut(window_id) else { return };
        let source = window.workspace;
        if source == target {
            return;
        }
        window.workspace = target;
        window.mark_content_dirty();
        window.mark_position_dirty();

        if let Some(w) = self.get_mut(source) {
            w.bsp.remove(window_id);
            if w.last_focused == Some(window_id) {
                w.last_focused = None;
            }
        }

        if follow {
            self.current = target;
            if let Some(w) = self.get_mut(target) {
                w.last_focused = Some(window_id);
            }
            windows.focus(window_id);
        } else if let Some(next) = windows.next_visible(source, Some(window_id)) {
            windows.focus(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_manager_starts_on_workspace_zero_with_default_ratio() {
        let manager = WorkspaceManager::new(9, TilingScheme::Spiral);
        assert_eq!(manager.current(), 0);
        assert_eq!(manager.count(), 9);
        assert_eq!(manager.get(0).unwrap().master_ratio, MASTER_RATIO_DEFAULT);
    }

    #[test]
    fn switch_to_out_of_range_workspace_is_a_no_op() {
        let mut manager = WorkspaceManager::new(3, TilingScheme::Spiral);
        let mut windows = WindowSet::new();
        let result = manager.switch(10, &mut windows);
        assert_eq!(manager.current(), 0);
        assert_eq!(result, None);
    }

    #[test]
    fn switch_to_same_workspace_is_a_no_op() {
        let mut manager = WorkspaceManager::new(3, TilingScheme::Spiral);
        let mut windows = WindowSet::new();
        manager.switch(0, &mut windows);
        assert_eq!(manager.current(), 0);
    }

    #[test]
    fn master_ratio_is_clamped_to_the_valid_band() {
        let mut manager = WorkspaceManager::new(1, TilingScheme::Spiral);
        manager.current_mut().set_master_ratio(0.95);
        assert_eq!(manager.current_mut().master_ratio, MASTER_RATIO_MAX);
        manager.current_mut().set_master_ratio(0.01);
        assert_eq!(manager.current_mut().master_ratio, MASTER_RATIO_MIN);
    }
}
