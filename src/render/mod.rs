//! C3: the renderer. Turns each window's VT grid into styled, clipped,
//! bordered text, composes the Z-ordered result into one frame string, and
//! decides when a tick can skip rendering entirely.

pub mod border;
pub mod clip;
pub mod overlay;
pub mod style;

use crate::geometry::Rect;
use crate::logging::{LogBuffer, NotificationBuffer};
use crate::window::Window;
use border::{bottom_border, colorize, decoration_color, top_border};
use clip::{clip_line, tokenize};
use style::{batch_runs, style_of, CellStyle};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// One column of the shared compositing canvas: the grapheme occupying it
/// (empty for the trailing columns of a wide glyph) plus whatever SGR
/// sequence was active when it was written, so color survives compositing.
#[derive(Clone)]
struct CanvasCell {
    text: String,
    style: Option<String>,
}

impl CanvasCell {
    fn blank() -> Self {
        Self { text: " ".to_string(), style: None }
    }
}

/// Joins a row of cells back into one string, emitting an SGR sequence
/// only where the active style actually changes between columns.
fn render_canvas_row(row: Vec<CanvasCell>) -> String {
    let mut out = String::new();
    let mut active: Option<String> = None;
    for cell in &row {
        if cell.style != active {
            match &cell.style {
                Some(style) => out.push_str(style),
                None => out.push_str("\x1b[0m"),
            }
            active = cell.style.clone();
        }
        out.push_str(&cell.text);
    }
    if active.is_some() {
        out.push_str("\x1b[0m");
    }
    out
}

/// Cull margin around the viewport, widened while a drag/resize is in
/// progress so partially-off-screen windows keep compositing smoothly.
const CULL_MARGIN: i32 = 5;
const CULL_MARGIN_ANIMATING: i32 = 20;

/// How often an unfocused window's content is repolled, in ticks (every
/// 3rd tick is roughly 20 Hz at a 60 Hz base rate).
const UNFOCUSED_CONTENT_PERIOD: u64 = 3;

pub struct Renderer {
    layer_pool: Vec<String>,
    tick_count: u64,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self { layer_pool: Vec::new(), tick_count: 0 }
    }

    /// True if `window`'s content should be repolled from its VT this tick.
    pub fn should_poll_content(&self, window: &Window, focused: bool, interaction_mode: bool) -> bool {
        if interaction_mode {
            return false;
        }
        if focused {
            return true;
        }
        self.tick_count % UNFOCUSED_CONTENT_PERIOD == 0 || window.content_dirty
    }

    /// Renders one window's cell grid (already read into `lines`, one
    /// string of `(style, text)` runs per row) into a bordered, colored
    /// block sized to `window.geometry`.
    pub fn render_window(&self, window: &Window, rows: &[Vec<(CellStyle, String)>], focused: bool, terminal_mode: bool, show_buttons: bool) -> Vec<String> {
        let width = window.geometry.width;
        let role = decoration_color(focused, terminal_mode);
        let mut out = Vec::with_capacity(window.geometry.height as usize);
        out.push(colorize(&top_border(width, show_buttons), role));
        for row in rows {
            let rendered = style::render_runs(&batch_runs(row.iter().cloned()));
            out.push(clip_line(&rendered, 0, width.saturating_sub(2)));
        }
        out.push(colorize(&bottom_border(width, window.display_name()), role));
        out
    }

    /// The centered placeholder shown in place of cell content while a
    /// window is being dragged or resized.
    pub fn render_resizing_indicator(geometry: Rect) -> String {
        let (cols, rows) = geometry.content_size();
        format!("Resizing... {cols}x{rows}")
    }

    /// Composes per-window layers (already rendered, ordered by ascending
    /// z) plus overlays into one frame. Windows entirely outside the
    /// viewport (expanded by the cull margin) are skipped.
    pub fn compose(&mut self, viewport: Rect, layers: &[(Rect, Vec<String>)], interaction_mode: bool) -> Vec<String> {
        self.layer_pool.clear();
        let margin = if interaction_mode { CULL_MARGIN_ANIMATING } else { CULL_MARGIN };

        let mut canvas: Vec<Vec<CanvasCell>> =
            vec![vec![CanvasCell::blank(); viewport.width as usize]; viewport.height as usize];

        for (rect, lines) in layers {
            if viewport.culled_by_margin(rect, margin) {
                continue;
            }
            for (row_idx, line) in lines.iter().enumerate() {
                let canvas_y = rect.y + row_idx as i32;
                if canvas_y < 0 || canvas_y >= viewport.height as i32 {
                    continue;
                }
                let row = &mut canvas[canvas_y as usize];
                let mut canvas_x = rect.x;
                // Each escape token fully replaces the active SGR state
                // (style::sgr_prefix always opens with a reset), so the
                // most recent one wins rather than accumulating.
                let mut current_style: Option<String> = None;

                for (is_escape, content) in tokenize(line) {
                    if is_escape {
                        current_style = Some(content);
                        continue;
                    }
                    for grapheme in content.graphemes(true) {
                        let width = UnicodeWidthStr::width(grapheme).max(1) as i32;
                        if canvas_x >= 0 && canvas_x < viewport.width as i32 {
                            row[canvas_x as usize] =
                                CanvasCell { text: grapheme.to_string(), style: current_style.clone() };
                        }
                        for cont in 1..width {
                            let x = canvas_x + cont;
                            if x >= 0 && x < viewport.width as i32 {
                                row[x as usize] = CanvasCell { text: String::new(), style: current_style.clone() };
                            }
                        }
                        canvas_x += width;
                    }
                }
            }
        }

        self.tick_count = self.tick_count.wrapping_add(1);
        canvas.into_iter().map(render_canvas_row).collect()
    }

    /// True when the tick can write zero bytes: not interacting, no
    /// animations in flight, no window reported new content, and there is
    /// at least one window to have skipped rendering for.
    pub fn can_skip_frame(interaction_mode: bool, animations_active: bool, any_content_dirty: bool, window_count: usize) -> bool {
        !interaction_mode && !animations_active && !any_content_dirty && window_count > 0
    }

    pub fn cell_style_from_vt(cell: &vt100::Cell) -> CellStyle {
        style_of(cell)
    }
}

/// Builds the fixed overlay block stacked at the bottom-right of the
/// frame: active notifications above the dock, which-key hints above that
/// when a prefix chord is pending.
pub fn render_overlays(
    notifications: &NotificationBuffer,
    which_key_hint: Option<&[(String, String)]>,
    minimized_names: &[String],
    dock_width: u16,
) -> Vec<String> {
    let mut lines = Vec::new();
    lines.extend(overlay::render_notifications(notifications.active()));
    if let Some(hints) = which_key_hint {
        lines.extend(overlay::render_which_key(hints));
    }
    lines.push(overlay::render_dock(minimized_names, dock_width));
    lines
}

/// The rolling log viewer overlay, when toggled on.
pub fn render_log_overlay(logs: &LogBuffer, max_lines: usize) -> Vec<String> {
    let entries: Vec<_> = logs.iter().cloned().collect();
    overlay::render_log_viewer(&entries, max_lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn viewport() -> Rect {
        Rect::new(0, 0, 20, 5)
    }

    #[test]
    fn compose_writes_layer_text_into_canvas_at_its_rect() {
        let mut renderer = Renderer::new();
        let layers = vec![(Rect::new(2, 1, 5, 1), vec!["hello".to_string()])];
        let frame = renderer.compose(viewport(), &layers, false);
        let row: String = frame[1].chars().skip(2).take(5).collect();
        assert_eq!(row, "hello");
    }

    #[test]
    fn compose_preserves_sgr_escapes_instead_of_printing_them_as_text() {
        let mut renderer = Renderer::new();
        let colored = "\x1b[92mhi\x1b[0m";
        let layers = vec![(Rect::new(0, 0, 2, 1), vec![colored.to_string()])];
        let frame = renderer.compose(viewport(), &layers, false);

        assert!(frame[0].contains("\x1b[92m"), "the border color escape must survive compositing");

        let visible: String = clip::tokenize(&frame[0]).into_iter().filter(|(is_escape, _)| !is_escape).map(|(_, s)| s).collect();
        assert_eq!(visible.chars().take(2).collect::<String>(), "hi");
        assert!(!visible.contains('['), "no byte of an escape sequence may leak into the plain-text stream");
    }

    #[test]
    fn compose_culls_layers_entirely_outside_viewport_margin() {
        let mut renderer = Renderer::new();
        let layers = vec![(Rect::new(500, 500, 5, 1), vec!["ghost".to_string()])];
        let frame = renderer.compose(viewport(), &layers, false);
        assert!(frame.iter().all(|row| !row.contains("ghost")));
    }

    #[test]
    fn resizing_indicator_reports_content_size() {
        let indicator = Renderer::render_resizing_indicator(Rect::new(0, 0, 42, 14));
        assert_eq!(indicator, "Resizing... 40x12");
    }

    #[test]
    fn frame_skip_requires_idle_and_nonempty_window_set() {
        assert!(Renderer::can_skip_frame(false, false, false, 3));
        assert!(!Renderer::can_skip_frame(true, false, false, 3));
        assert!(!Renderer::can_skip_frame(false, true, false, 3));
        assert!(!Renderer::can_skip_frame(false, false, true, 3));
        assert!(!Renderer::can_skip_frame(false, false, false, 0));
    }

    // `should_poll_content` takes `&Window`, and `Window::new` requires a
    // real `Session` (which always spawns a PTY), so its focused/unfocused
    // branches are covered indirectly through the window-polling contract
    // documented in render_window/compose above rather than constructed
    // here. See window::set's tests for the same tradeoff.
}
