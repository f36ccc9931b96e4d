//! Live image placements and the per-frame refresh pass that re-anchors
//! them to host coordinates as windows move, scroll, or get occluded.

use crate::geometry::Rect;
use crate::session::WindowId;
use std::collections::HashMap;

pub type HostImageId = u32;
pub type GuestImageId = u32;

/// A source rectangle in the image's own pixel space, used to crop instead
/// of rescale when a placement is partially scrolled out of view.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// One live placement, anchored to an absolute VT line so it tracks
/// scrolling without re-querying the guest.
#[derive(Debug, Clone)]
pub struct Placement {
    pub window_id: WindowId,
    pub guest_image_id: GuestImageId,
    pub host_image_id: HostImageId,
    pub placement_id: Option<u32>,
    /// `scrollback_len + cursor_y` at the time of placement; survives
    /// scrolling (scenario S5).
    pub absolute_line: u64,
    /// Window-local cell offset and cell size of the placement.
    pub base: Rect,
    pub source: SourceRect,
    pub hidden: bool,
    pub visible_last_frame: bool,
}

impl Placement {
    pub fn new(
        window_id: WindowId,
        guest_image_id: GuestImageId,
        host_image_id: HostImageId,
        absolute_line: u64,
        base: Rect,
        source: SourceRect,
    ) -> Self {
        Self {
            window_id,
            guest_image_id,
            host_image_id,
            placement_id: None,
            absolute_line,
            base,
            source,
            hidden: true,
            visible_last_frame: false,
        }
    }
}

/// Accumulates a chunked direct transmission (`m=1` continuations) until
/// the final chunk arrives.
#[derive(Debug, Default)]
pub struct ChunkAccumulator {
    pub data: Vec<u8>,
}

/// Per-window state the refresh pass needs, snapshotted once per frame by
/// the scheduler from the live `Window`/`Workspace` data.
#[derive(Debug, Clone, Copy)]
pub struct WindowSnapshot {
    pub window_x: i32,
    pub window_y: i32,
    pub content_offset_x: i32,
    pub content_offset_y: i32,
    pub width: u16,
    pub height: u16,
    pub scrollback_len: u64,
    pub scroll_offset: u64,
    pub is_being_manipulated: bool,
    pub is_alt_screen: bool,
    pub z_index: i32,
    pub visible: bool,
}

impl WindowSnapshot {
    fn content_rect(&self) -> Rect {
        Rect::new(
            self.window_x + self.content_offset_x,
            self.window_y + self.content_offset_y,
            self.width.saturating_sub(2),
            self.height.saturating_sub(2),
        )
    }
}

/// One instruction the refresh pass wants emitted to the host this frame.
#[derive(Debug, Clone)]
pub enum RefreshOp {
    /// Delete a previously visible placement before it moves or disappears.
    Delete { host_image_id: HostImageId },
    /// Place at `screen_x, screen_y` (0-based host cell coordinates),
    /// cropping the image to `clip_top`/`visible_rows` of source pixels.
    Place { host_image_id: HostImageId, screen_x: i32, screen_y: i32, clip_top_rows: u16, visible_rows: u16 },
}

/// Recomputes visibility/occlusion/clipping for every placement and
/// returns the host ops to emit, in placement order. Deletion always
/// precedes the corresponding re-place within the same window's entry,
/// per the Kitty graphics protocol's delete+replace convention.
pub fn refresh(
    placements: &mut HashMap<WindowId, HashMap<HostImageId, Placement>>,
    snapshots: &HashMap<WindowId, WindowSnapshot>,
) -> Vec<RefreshOp> {
    let any_manipulated = snapshots.values().any(|s| s.is_being_manipulated);
    let mut ops = Vec::new();

    for (window_id, window_placements) in placements.iter_mut() {
        let Some(snapshot) = snapshots.get(window_id) else { continue };
        let content = snapshot.content_rect();

        for placement in window_placements.values_mut() {
            let should_hide = any_manipulated
                || snapshot.is_alt_screen
                || !snapshot.visible
                || snapshot.window_x < 0
                || snapshot.window_y < 0;

            let visible_now = if should_hide {
                false
            } else {
                let relative_y =
                    placement.absolute_line as i64 - (snapshot.scrollback_len as i64 - snapshot.scroll_offset as i64);
                let rows = placement.base.height as i64;
                let clip_top = (-relative_y).max(0);
                let clip_bottom = ((relative_y + rows) - content.height as i64).max(0);
                let visible_rows = rows - clip_top - clip_bottom;

                let intersects_horizontally = placement.base.x + placement.base.width as i32 <= content.width as i32;

                if visible_rows <= 0 || !intersects_horizontally {
                    false
                } else {
                    let occluded = snapshots.values().any(|other| {
                        other.z_index > snapshot.z_index
                            && other.visible
                            && screen_rect_for(snapshot, placement).intersects(&other.content_rect())
                    });
                    !occluded
                }
            };

            if placement.visible_last_frame {
                ops.push(RefreshOp::Delete { host_image_id: placement.host_image_id });
            }

            if visible_now {
                let relative_y = placement.absolute_line as i64
                    - (snapshot.scrollback_len as i64 - snapshot.scroll_offset as i64);
                let clip_top = (-relative_y).max(0) as u16;
                let rows = placement.base.height as i64;
                let clip_bottom = ((relative_y + rows) - content.height as i64).max(0) as u16;
                let visible_rows = placement.base.height.saturating_sub(clip_top).saturating_sub(clip_bottom);

                let screen_y = content.y + relative_y.max(0) as i32;
                let screen_x = content.x + placement.base.x;
                ops.push(RefreshOp::Place {
                    host_image_id: placement.host_image_id,
                    screen_x,
                    screen_y,
                    clip_top_rows: clip_top,
                    visible_rows,
                });
            }

            placement.hidden = !visible_now;
            placement.visible_last_frame = visible_now;
        }
    }

    ops
}

fn screen_rect_for(snapshot: &WindowSnapshot, placement: &Placement) -> Rect {
    let content = snapshot.content_rect();
    Rect::new(content.x + placement.base.x, content.y, placement.base.width, placement.base.height)
}
