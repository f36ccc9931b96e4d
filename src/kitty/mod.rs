//! C5: rewrites guest Kitty graphics protocol commands into host-terminal
//! commands, tracking placements per window so images survive window
//! moves and scrolling. The scheduler owns the only instance; it is fed
//! one [`GraphicsCommand`] at a time (parsed by the VT's Kitty-command
//! callback) and drained once per frame via [`KittyPassthrough::refresh`]
//! and [`KittyPassthrough::take_host_output`].

pub mod command;
pub mod placement;

use crate::geometry::Rect;
use crate::session::WindowId;
use base64::Engine as _;
use command::{Action, GraphicsCommand};
use placement::{ChunkAccumulator, HostImageId, Placement, RefreshOp, SourceRect, WindowSnapshot};
use std::collections::HashMap;

/// Cells to reserve after a transmit+place so the VT can push the cursor
/// (or leave it, if `C=1`), mirroring the `c,r,C` response the protocol
/// defines for the final chunk of a `T` command.
#[derive(Debug, Clone, Copy)]
pub struct ReserveCells {
    pub cols: u32,
    pub rows: u32,
    pub cursor_move: bool,
}

/// What the scheduler should do with the result of handling one guest
/// command.
pub enum Outcome {
    /// Nothing further to do this command.
    None,
    /// Bytes to write back to the guest's own PTY (query responses never
    /// reach the host).
    ReplyToGuest(Vec<u8>),
    /// A chunked transmit+place finished; the VT should reserve this much
    /// space.
    Reserve(ReserveCells),
}

pub struct KittyPassthrough {
    placements: HashMap<WindowId, HashMap<HostImageId, Placement>>,
    image_id_map: HashMap<WindowId, HashMap<u32, HostImageId>>,
    next_host_id: HostImageId,
    pending_output: Vec<u8>,
    pending_direct_data: HashMap<WindowId, ChunkAccumulator>,
}

impl Default for KittyPassthrough {
    fn default() -> Self {
        Self::new()
    }
}

impl KittyPassthrough {
    pub fn new() -> Self {
        Self {
            placements: HashMap::new(),
            image_id_map: HashMap::new(),
            next_host_id: 1,
            pending_output: Vec::new(),
            pending_direct_data: HashMap::new(),
        }
    }

    fn alloc_host_id(&mut self) -> HostImageId {
        let id = self.next_host_id;
        self.next_host_id += 1;
        id
    }

    fn remap(&mut self, window_id: WindowId, guest_id: u32) -> HostImageId {
        if let Some(existing) = self.image_id_map.get(&window_id).and_then(|m| m.get(&guest_id)) {
            return *existing;
        }
        let host_id = self.alloc_host_id();
        self.image_id_map.entry(window_id).or_default().insert(guest_id, host_id);
        host_id
    }

    /// VT screen-clear callback: drops every placement for `window_id`.
    pub fn clear_window(&mut self, window_id: WindowId) {
        self.placements.remove(&window_id);
        self.image_id_map.remove(&window_id);
        self.pending_direct_data.remove(&window_id);
    }

    pub fn remove_window(&mut self, window_id: WindowId) {
        self.clear_window(window_id);
    }

    /// Handles one parsed guest command for `window_id`. `window_rect` and
    /// `cursor` are the window's current geometry and VT cursor position,
    /// used to compute host coordinates for `p`/final-chunk `T`.
    pub fn handle_command(
        &mut self,
        window_id: WindowId,
        cmd: &GraphicsCommand,
        window_rect: Rect,
        cursor: (u16, u16),
    ) -> Outcome {
        match cmd.action {
            Some(Action::Query) => {
                let guest_id = cmd.guest_image_id.unwrap_or(0);
                Outcome::ReplyToGuest(build_query_response(guest_id))
            }
            Some(Action::TransmitOnly) => {
                if self.pending_direct_data.contains_key(&window_id) {
                    self.pending_direct_data.entry(window_id).or_default().data.extend_from_slice(&cmd.payload);
                } else if cmd.more_chunks {
                    self.pending_direct_data.insert(window_id, ChunkAccumulator { data: cmd.payload.clone() });
                } else {
                    self.pending_output.extend_from_slice(&build_transmit_only_raw(cmd));
                }
                Outcome::None
            }
            Some(Action::TransmitAndPlace) => self.handle_transmit_and_place(window_id, cmd, window_rect),
            Some(Action::Place) => {
                let guest_id = cmd.guest_image_id.unwrap_or(0);
                let host_id = self.remap(window_id, guest_id);
                let (content_x, content_y) = (window_rect.x + 1, window_rect.y + 1);
                let screen_x = content_x + cursor.0 as i32;
                let screen_y = content_y + cursor.1 as i32;
                self.pending_output.extend_from_slice(&build_place_immediate(host_id, cmd.placement_id, screen_x, screen_y));
                Outcome::None
            }
            Some(Action::Delete) => {
                let guest_id = cmd.guest_image_id.unwrap_or(0);
                if let Some(host_id) = self.image_id_map.get(&window_id).and_then(|m| m.get(&guest_id)).copied() {
                    self.pending_output.extend_from_slice(&build_delete(host_id, cmd.delete_mode));
                    if let Some(per_window) = self.placements.get_mut(&window_id) {
                        per_window.remove(&host_id);
                    }
                }
                Outcome::None
            }
            None => Outcome::None,
        }
    }

    fn handle_transmit_and_place(
        &mut self,
        window_id: WindowId,
        cmd: &GraphicsCommand,
        window_rect: Rect,
    ) -> Outcome {
        let guest_id = cmd.guest_image_id.unwrap_or(0);
        let host_id = self.remap(window_id, guest_id);

        let accumulator = self.pending_direct_data.entry(window_id).or_default();
        accumulator.data.extend_from_slice(&cmd.payload);

        if cmd.more_chunks {
            return Outcome::None;
        }

        let data = self.pending_direct_data.remove(&window_id).unwrap_or_default().data;
        let decoded = base64::engine::general_purpose::STANDARD.decode(&data).unwrap_or_default();

        self.placements.entry(window_id).or_default().clear();

        let (content_cols, content_rows) = window_rect.content_size();
        let cols = cmd.cols.unwrap_or(content_cols as u32).min(content_cols as u32);
        let rows = cmd.rows.unwrap_or(content_rows as u32).min(content_rows as u32);

        self.pending_output.extend_from_slice(&build_transmit_only(host_id, cmd, cols, rows, &decoded));

        let absolute_line = 0u64; // stamped by the caller via `stamp_anchor` once VT cursor is known.
        let placement = Placement::new(
            window_id,
            guest_id,
            host_id,
            absolute_line,
            Rect::new(0, 0, cols as u16, rows as u16),
            SourceRect { x: cmd.src_x.unwrap_or(0), y: cmd.src_y.unwrap_or(0), w: cmd.src_w.unwrap_or(0), h: cmd.src_h.unwrap_or(0) },
        );
        self.placements.entry(window_id).or_default().insert(host_id, placement);

        Outcome::Reserve(ReserveCells { cols, rows, cursor_move: !cmd.suppress_cursor_move })
    }

    /// Stamps the absolute-line anchor on the just-created hidden
    /// placement for `window_id`/`host_id`; called by the scheduler right
    /// after `handle_command` returns `Outcome::Reserve`, once it has read
    /// the VT's current `scrollback_len + cursor_y`.
    pub fn stamp_anchor(&mut self, window_id: WindowId, host_id: HostImageId, absolute_line: u64, base_x: u16) {
        if let Some(p) = self.placements.get_mut(&window_id).and_then(|m| m.get_mut(&host_id)) {
            p.absolute_line = absolute_line;
            p.base.x = base_x as i32;
        }
    }

    /// Runs the per-frame placement refresh pass and appends the resulting
    /// host escape sequences to the pending output.
    pub fn refresh(&mut self, snapshots: &HashMap<WindowId, WindowSnapshot>) {
        let ops = placement::refresh(&mut self.placements, snapshots);
        for op in ops {
            match op {
                RefreshOp::Delete { host_image_id } => {
                    self.pending_output.extend_from_slice(&build_delete(host_image_id, Some('i')));
                }
                RefreshOp::Place { host_image_id, screen_x, screen_y, clip_top_rows, visible_rows } => {
                    self.pending_output.extend_from_slice(&build_place_clipped(
                        host_image_id,
                        screen_x,
                        screen_y,
                        clip_top_rows,
                        visible_rows,
                    ));
                }
            }
        }
    }

    /// Drains bytes accumulated since the last call, for the scheduler to
    /// append after the main screen string: kitty output flushes after the
    /// frame, never interleaved with it.
    pub fn take_host_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.pending_output)
    }

    pub fn placement_count(&self, window_id: WindowId) -> usize {
        self.placements.get(&window_id).map(|m| m.len()).unwrap_or(0)
    }

    /// Looks up the host image id a guest id was remapped to for
    /// `window_id`, for the caller to stamp an anchor on after a `Reserve`
    /// outcome (which itself carries no id of its own).
    pub fn host_id_for(&self, window_id: WindowId, guest_id: u32) -> Option<HostImageId> {
        self.image_id_map.get(&window_id).and_then(|m| m.get(&guest_id)).copied()
    }
}

const CELL_PX_FALLBACK: (u32, u32) = (9, 20);

fn build_query_response(guest_id: u32) -> Vec<u8> {
    format!("\x1b_Gi={guest_id};OK\x1b\\").into_bytes()
}

fn build_transmit_only_raw(cmd: &GraphicsCommand) -> Vec<u8> {
    let payload = base64::engine::general_purpose::STANDARD.encode(&cmd.payload);
    format!("\x1b_Ga=t,f={};{}\x1b\\", cmd.format.unwrap_or(32), payload).into_bytes()
}

fn build_transmit_only(host_id: HostImageId, cmd: &GraphicsCommand, cols: u32, rows: u32, decoded: &[u8]) -> Vec<u8> {
    let payload = base64::engine::general_purpose::STANDARD.encode(decoded);
    format!(
        "\x1b_Ga=t,i={host_id},f={},c={cols},r={rows};{payload}\x1b\\",
        cmd.format.unwrap_or(32)
    )
    .into_bytes()
}

fn build_place_immediate(host_id: HostImageId, placement_id: Option<u32>, x: i32, y: i32) -> Vec<u8> {
    let placement_clause = placement_id.map(|p| format!(",p={p}")).unwrap_or_default();
    format!(
        "\x1b[s\x1b[{};{}H\x1b_Ga=p,i={host_id}{placement_clause}\x1b\\\x1b[u",
        y.max(0) + 1,
        x.max(0) + 1
    )
    .into_bytes()
}

fn build_place_clipped(host_id: HostImageId, x: i32, y: i32, clip_top_rows: u16, visible_rows: u16) -> Vec<u8> {
    let (_, cell_h) = CELL_PX_FALLBACK;
    let src_y = clip_top_rows as u32 * cell_h;
    let src_h = visible_rows as u32 * cell_h;
    format!(
        "\x1b[s\x1b[{};{}H\x1b_Ga=p,i={host_id},y={src_y},h={src_h}\x1b\\\x1b[u",
        y.max(0) + 1,
        x.max(0) + 1
    )
    .into_bytes()
}

fn build_delete(host_id: HostImageId, mode: Option<char>) -> Vec<u8> {
    let mode = mode.unwrap_or('i');
    format!("\x1b_Ga=d,d={mode},i={host_id}\x1b\\").into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use command::parse;

    #[test]
    fn query_replies_to_guest_never_touches_host_output() {
        let mut kitty = KittyPassthrough::new();
        let cmd = parse("a=q,i=5", b"");
        let outcome = kitty.handle_command(1, &cmd, Rect::new(0, 0, 40, 20), (0, 0));
        match outcome {
            Outcome::ReplyToGuest(bytes) => assert!(String::from_utf8(bytes).unwrap().contains("i=5")),
            _ => panic!("expected a guest reply"),
        }
        assert!(kitty.take_host_output().is_empty());
    }

    #[test]
    fn transmit_and_place_single_chunk_reserves_cells_and_stores_hidden_placement() {
        let mut kitty = KittyPassthrough::new();
        let payload = base64::engine::general_purpose::STANDARD.encode(b"pixel-data");
        let cmd = parse("a=T,i=1,c=10,r=5", payload.as_bytes());
        let outcome = kitty.handle_command(1, &cmd, Rect::new(0, 0, 40, 20), (0, 0));
        match outcome {
            Outcome::Reserve(reserve) => {
                assert_eq!(reserve.cols, 10);
                assert_eq!(reserve.rows, 5);
            }
            _ => panic!("expected a reserve outcome"),
        }
        assert_eq!(kitty.placement_count(1), 1);
        assert!(!kitty.take_host_output().is_empty());
    }

    #[test]
    fn transmit_and_place_waits_for_final_chunk() {
        let mut kitty = KittyPassthrough::new();
        let cmd = parse("a=T,i=1,m=1", b"chunk1");
        let outcome = kitty.handle_command(1, &cmd, Rect::new(0, 0, 40, 20), (0, 0));
        assert!(matches!(outcome, Outcome::None));
        assert_eq!(kitty.placement_count(1), 0);
    }

    #[test]
    fn delete_emits_host_delete_and_drops_placement() {
        let mut kitty = KittyPassthrough::new();
        let payload = base64::engine::general_purpose::STANDARD.encode(b"x");
        let transmit = parse("a=T,i=3,c=4,r=4", payload.as_bytes());
        kitty.handle_command(1, &transmit, Rect::new(0, 0, 40, 20), (0, 0));
        kitty.take_host_output();

        let delete = parse("a=d,i=3,d=i", b"");
        kitty.handle_command(1, &delete, Rect::new(0, 0, 40, 20), (0, 0));
        assert_eq!(kitty.placement_count(1), 0);
        assert!(!kitty.take_host_output().is_empty());
    }
}
