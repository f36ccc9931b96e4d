//! C2: a Window pairs a [`crate::session::Session`] with geometry, visual
//! flags, copy-mode/selection state, and render caching.

pub mod set;

use crate::geometry::Rect;
use crate::session::{Session, WindowId};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CopyMode {
    #[default]
    Inactive,
    Normal,
    VisualChar,
    VisualLine,
    Search,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellPos {
    pub row: u16,
    pub col: u16,
}

#[derive(Debug, Default)]
pub struct SelectionState {
    pub start: Option<CellPos>,
    pub end: Option<CellPos>,
    pub cursor: CellPos,
    pub selected_text: String,
}

#[derive(Debug, Default)]
pub struct SearchState {
    pub query: String,
    pub matches: Vec<CellPos>,
    pub current_match: Option<usize>,
}

/// Cached render output for a window, reused across frames when nothing
/// about the window's content or geometry changed.
#[derive(Debug, Default, Clone)]
pub struct RenderCache {
    pub content: String,
    pub layer: Option<String>,
    pub geometry_at_cache: Option<Rect>,
}

pub struct Window {
    pub id: WindowId,
    pub custom_name: Option<String>,
    pub geometry: Rect,
    pub z: i32,
    pub workspace: u8,
    pub session: Session,

    pub minimized: bool,
    pub minimizing: bool,
    pub process_exited: bool,
    pub is_being_manipulated: bool,

    pub copy_mode: CopyMode,
    pub selection: SelectionState,
    pub search: SearchState,
    pub scrollback_offset: usize,

    pub dirty: bool,
    pub content_dirty: bool,
    pub position_dirty: bool,
    pub update_counter: u64,
    pub last_rendered_seq: u64,
    pub cache: RenderCache,

    pub pre_minimize_geometry: Rect,
    pub created_at: Instant,
}

impl Window {
    pub fn new(id: WindowId, geometry: Rect, workspace: u8, session: Session) -> Self {
        Self {
            id,
            custom_name: None,
            geometry,
            z: 0,
            workspace,
            session,
            minimized: false,
            minimizing: false,
            process_exited: false,
            is_being_manipulated: false,
            copy_mode: CopyMode::Inactive,
            selection: SelectionState::default(),
            search: SearchState::default(),
            scrollback_offset: 0,
            dirty: true,
            content_dirty: true,
            position_dirty: true,
            update_counter: 0,
            last_rendered_seq: 0,
            cache: RenderCache::default(),
            pre_minimize_geometry: geometry,
            created_at: Instant::now(),
        }
    }

    /// True if the window participates in composition this frame: in the
    /// current workspace, and either not minimized or mid-animation.
    pub fn is_visible(&self, current_workspace: u8) -> bool {
        self.workspace == current_workspace && (!self.minimized || self.minimizing)
    }

    pub fn display_name(&self) -> &str {
        self.custom_name.as_deref().unwrap_or("shell")
    }

    pub fn mark_content_dirty(&mut self) {
        self.content_dirty = true;
        self.dirty = true;
        self.update_counter += 1;
    }

    pub fn mark_position_dirty(&mut self) {
        self.position_dirty = true;
        self.dirty = true;
    }

    /// Applies a new rectangle, resizes the underlying PTY/VT, and marks the
    /// window's cached layer stale.
    pub fn apply_geometry(&mut self, rect: Rect) {
        if rect == self.geometry {
            return;
        }
        self.geometry = rect;
        let (cols, rows) = rect.content_size();
        if let Err(_e) = self.session.resize(cols, rows) {
            // Best-effort: resize failures are logged by the caller.
        }
        self.mark_position_dirty();
        self.content_dirty = true;
    }
}
