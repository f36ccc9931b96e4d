//! C6: the single-threaded scheduler. Owns every piece of mutable state
//! (windows, workspaces, animations, the kitty passthrough, the renderer)
//! and drives it from one `tokio::select!` loop, following the
//! `EventHandler` pattern this codebase already uses for multiplexing
//! crossterm input with a tick timer.

use crate::animation::{Animation, AnimationKind, AnimationSet};
use crate::config::Config;
use crate::geometry::Rect;
use crate::input::{InputRouter, RouteOutcome};
use crate::kitty::placement::WindowSnapshot;
use crate::kitty::KittyPassthrough;
use crate::layout::LayoutEngine;
use crate::logging::{LogBuffer, NotificationBuffer, NotificationKind};
use crate::render::{render_log_overlay, render_overlays, Renderer};
use crate::session::{Session, WindowExit, WindowId};
use crate::window::set::WindowSet;
use crate::window::Window;
use crate::workspace::WorkspaceManager;
use anyhow::Result;
use crossterm::event::{Event as CrosstermEvent, KeyEvent, KeyEventKind, MouseEvent};
use futures::StreamExt;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

const TICK_NORMAL: Duration = Duration::from_millis(1000 / 60);
const TICK_INTERACTION: Duration = Duration::from_millis(1000 / 30);
const CPU_SAMPLE_MIN_INTERVAL: Duration = Duration::from_millis(500);
const WINDOW_EXIT_CHANNEL_CAPACITY: usize = 10;

/// Messages the scheduler reacts to each loop iteration.
#[derive(Debug, Clone)]
pub enum Event {
    Tick,
    Key(KeyEvent),
    Mouse(MouseEvent),
    Paste(String),
    Resize(u16, u16),
    WindowExit(WindowId),
    /// Scripted ("tape") input. Tape-file parsing itself is out of scope
    /// here; this variant documents where a tape driver would feed commands
    /// into the same dispatch path as a live keypress.
    #[allow(dead_code)]
    TapeCommand(String),
}

/// Forwards crossterm input into one channel alongside an adaptive tick
/// timer; mirrors this codebase's existing `EventHandler`, generalized to
/// a `Duration` the scheduler can change at runtime (60 Hz idle, 30 Hz
/// while dragging/resizing).
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    tick_tx: mpsc::UnboundedSender<Duration>,
}

impl EventHandler {
    pub fn new(initial_tick: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (tick_tx, mut tick_rx) = mpsc::unbounded_channel::<Duration>();
        let event_tx = tx.clone();

        tokio::spawn(async move {
            let mut event_stream = crossterm::event::EventStream::new();
            let mut tick_interval = tokio::time::interval(initial_tick);

            loop {
                tokio::select! {
                    maybe_new_rate = tick_rx.recv() => {
                        match maybe_new_rate {
                            Some(rate) => tick_interval = tokio::time::interval(rate),
                            None => break,
                        }
                    }
                    maybe_event = event_stream.next() => {
                        match maybe_event {
                            Some(Ok(CrosstermEvent::Key(key))) => {
                                if key.kind == KeyEventKind::Press && event_tx.send(Event::Key(key)).is_err() {
                                    break;
                                }
                            }
                            Some(Ok(CrosstermEvent::Mouse(mouse))) => {
                                if event_tx.send(Event::Mouse(mouse)).is_err() {
                                    break;
                                }
                            }
                            Some(Ok(CrosstermEvent::Paste(text))) => {
                                if event_tx.send(Event::Paste(text)).is_err() {
                                    break;
                                }
                            }
                            Some(Ok(CrosstermEvent::Resize(cols, rows))) => {
                                if event_tx.send(Event::Resize(cols, rows)).is_err() {
                                    break;
                                }
                            }
                            Some(Err(_)) | None => break,
                            _ => {}
                        }
                    }
                    _ = tick_interval.tick() => {
                        if event_tx.send(Event::Tick).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Self { rx, tick_tx }
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    pub fn set_tick_rate(&self, rate: Duration) {
        let _ = self.tick_tx.send(rate);
    }
}

pub struct Scheduler {
    config: Config,
    shell: String,
    viewport: Rect,
    windows: WindowSet,
    workspaces: WorkspaceManager,
    animations: AnimationSet,
    renderer: Renderer,
    input: InputRouter,
    kitty: KittyPassthrough,
    logs: LogBuffer,
    notifications: NotificationBuffer,
    interaction_mode: bool,
    show_log_viewer: bool,
    last_cpu_sample: Instant,
    window_exit_tx: mpsc::Sender<WindowExit>,
    window_exit_rx: mpsc::Receiver<WindowExit>,
    /// The window under a live mouse-driven move/resize/selection gesture.
    gesture: Option<crate::input::mouse::Gesture>,
    /// Window being renamed and its in-progress name, while the rename
    /// prompt owns keyboard input.
    renaming: Option<(WindowId, String)>,
}

impl Scheduler {
    pub fn new(config: Config, shell: String, viewport: Rect) -> Self {
        let (window_exit_tx, window_exit_rx) = mpsc::channel(WINDOW_EXIT_CHANNEL_CAPACITY);
        let input = InputRouter::new(&config);
        let notification_duration = Duration::from_millis(config.notification_duration_ms);
        let workspace_count = config.workspace_count;
        let tiling_scheme = config.tiling_scheme;
        Self {
            config,
            shell,
            viewport,
            windows: WindowSet::new(),
            workspaces: WorkspaceManager::new(workspace_count, tiling_scheme),
            animations: AnimationSet::new(),
            renderer: Renderer::new(),
            input,
            kitty: KittyPassthrough::new(),
            logs: LogBuffer::new(),
            notifications: NotificationBuffer::new(notification_duration),
            interaction_mode: false,
            show_log_viewer: false,
            last_cpu_sample: Instant::now(),
            window_exit_tx,
            window_exit_rx,
            gesture: None,
            renaming: None,
        }
    }

    /// Runs until the event stream closes or a quit action is dispatched.
    pub async fn run(&mut self, events: &mut EventHandler) -> Result<()> {
        self.spawn_window()?;
        let mut ticking_fast = false;
        loop {
            tokio::select! {
                event = events.next() => {
                    match event {
                        Some(Event::Tick) => {
                            if let Some(frame) = self.tick() {
                                self.flush_frame(&frame)?;
                            }
                        }
                        Some(other) => {
                            if !self.handle_event(other)? {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                exit = self.window_exit_rx.recv() => {
                    if let Some(exit) = exit {
                        let _ = self.handle_event(Event::WindowExit(exit.window_id));
                    }
                }
            }
            if self.interaction_mode != ticking_fast {
                ticking_fast = self.interaction_mode;
                events.set_tick_rate(if ticking_fast { TICK_INTERACTION } else { TICK_NORMAL });
            }
        }
        Ok(())
    }

    /// Handles one non-tick event. Returns `false` to request shutdown.
    fn handle_event(&mut self, event: Event) -> Result<bool> {
        match event {
            Event::Tick => unreachable!("tick is handled by the caller"),
            Event::WindowExit(id) => self.reap(id),
            Event::Resize(cols, rows) => {
                self.viewport = Rect::new(0, 0, cols, rows);
                self.retile_current_workspace();
            }
            Event::Paste(text) => {
                if let Some(window) = self.focused_window_mut() {
                    let _ = window.session.write(text.as_bytes());
                }
            }
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::TapeCommand(bytes) => {
                if let Some(window) = self.focused_window_mut() {
                    let _ = window.session.write(bytes.as_bytes());
                }
            }
            Event::Key(key) => return Ok(self.handle_key(key)),
        }
        Ok(true)
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        use crossterm::event::KeyCode;
        if let Some((id, mut buf)) = self.renaming.take() {
            match key.code {
                KeyCode::Enter => {
                    if let Some(window) = self.windows.get_mut(id) {
                        window.custom_name = if buf.is_empty() { None } else { Some(buf) };
                        window.mark_content_dirty();
                    }
                }
                KeyCode::Esc => {}
                KeyCode::Backspace => {
                    buf.pop();
                    self.renaming = Some((id, buf));
                }
                KeyCode::Char(c) => {
                    buf.push(c);
                    self.renaming = Some((id, buf));
                }
                _ => self.renaming = Some((id, buf)),
            }
            return true;
        }

        let raw_key = crate::input::keymap::normalize(&format_key(&key));
        let raw_bytes = key_to_bytes(&key);
        let copy_mode_active = self
            .focused_window()
            .map(|w| w.copy_mode != crate::window::CopyMode::Inactive)
            .unwrap_or(false);

        match self.input.handle_key(&raw_key, &raw_bytes, copy_mode_active) {
            RouteOutcome::WriteToPty(bytes) => {
                if let Some(window) = self.focused_window_mut() {
                    let _ = window.session.write(&bytes);
                }
            }
            RouteOutcome::Action(action) => return self.dispatch_action(&action),
            RouteOutcome::CopyAction(action) => self.dispatch_copy_action(action),
            RouteOutcome::EnteredPrefix
            | RouteOutcome::Descended(_)
            | RouteOutcome::PrefixCancelled
            | RouteOutcome::None => {}
        }
        true
    }

    /// One minimum size floating/mouse-driven resizes are clamped to,
    /// matching the default window size's own floor.
    const MOUSE_MIN_WIDTH: u16 = 10;
    const MOUSE_MIN_HEIGHT: u16 = 4;

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        use crossterm::event::{MouseButton, MouseEventKind};
        let point = (mouse.column as i32, mouse.row as i32);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.begin_mouse_gesture(point),
            MouseEventKind::Drag(MouseButton::Left) => self.apply_mouse_gesture(point),
            MouseEventKind::Up(MouseButton::Left) => self.end_mouse_gesture(),
            _ => {}
        }
    }

    fn begin_mouse_gesture(&mut self, point: (i32, i32)) {
        use crate::input::mouse::{hit_test, hit_test_dock, HitTarget};

        let workspace = self.workspaces.current();
        let dock_rect = Rect::new(0, self.viewport.height as i32 - 1, self.viewport.width, 1);
        if dock_rect.contains_point(point.0, point.1) {
            let minimized: Vec<WindowId> =
                self.windows.iter().filter(|w| w.workspace == workspace && w.minimized).map(|w| w.id).collect();
            if let Some(id) = hit_test_dock(dock_rect, point, minimized.len()).and_then(|i| minimized.get(i).copied()) {
                self.restore_window(id);
            }
            return;
        }

        let mut candidates: Vec<(WindowId, Rect, i32)> =
            self.windows.iter().filter(|w| w.is_visible(workspace)).map(|w| (w.id, w.geometry, w.z)).collect();
        candidates.sort_by_key(|(_, _, z)| std::cmp::Reverse(*z));
        let windows_desc_z: Vec<(WindowId, Rect)> = candidates.into_iter().map(|(id, rect, _)| (id, rect)).collect();

        let target = hit_test(&windows_desc_z, point);
        let id = match target {
            HitTarget::TitleBar(id) | HitTarget::Corner(id, _) | HitTarget::Edge(id, _) | HitTarget::Body(id) => id,
            HitTarget::Dock(_) | HitTarget::Empty => return,
        };
        let Some(rect) = self.windows.get(id).map(|w| w.geometry) else { return };

        self.windows.focus(id);
        self.gesture = crate::input::mouse::begin_gesture(target, rect, point);
        if let Some(gesture) = self.gesture {
            let is_selection = matches!(gesture, crate::input::mouse::Gesture::Selection { .. });
            if let Some(window) = self.windows.get_mut(id) {
                window.is_being_manipulated = !is_selection;
            }
            self.interaction_mode = true;
        }
    }

    fn apply_mouse_gesture(&mut self, point: (i32, i32)) {
        use crate::input::mouse::Gesture;
        let Some(gesture) = self.gesture else { return };
        match gesture {
            Gesture::Move { window_id, grab_dx, grab_dy } => {
                if let Some(window) = self.windows.get_mut(window_id) {
                    let rect = crate::input::mouse::apply_move(window.geometry, grab_dx, grab_dy, point);
                    window.apply_geometry(rect);
                }
            }
            Gesture::Resize { window_id, corner, anchor } => {
                if let Some(window) = self.windows.get_mut(window_id) {
                    let rect = crate::input::mouse::apply_corner_resize(
                        anchor,
                        corner,
                        point,
                        Self::MOUSE_MIN_WIDTH,
                        Self::MOUSE_MIN_HEIGHT,
                    );
                    window.apply_geometry(rect);
                }
            }
            Gesture::EdgeResize { window_id, edge, anchor } => {
                if let Some(window) = self.windows.get_mut(window_id) {
                    // TODO: route tiling workspaces through
                    // layout::constraint::adjust_tiling_neighbors so the
                    // neighboring pane follows the dragged edge instead of
                    // being left to overlap it.
                    let rect = crate::input::mouse::apply_edge_resize(
                        anchor,
                        edge,
                        point,
                        Self::MOUSE_MIN_WIDTH,
                        Self::MOUSE_MIN_HEIGHT,
                    );
                    window.apply_geometry(rect);
                }
            }
            Gesture::Selection { window_id, start } => {
                if let Some(window) = self.windows.get_mut(window_id) {
                    window.selection.start = Some(cell_pos_in_window(window.geometry, start));
                    window.selection.end = Some(cell_pos_in_window(window.geometry, point));
                    window.mark_content_dirty();
                }
            }
        }
    }

    fn end_mouse_gesture(&mut self) {
        if let Some(id) = self.gesture.take().map(gesture_window_id) {
            if let Some(window) = self.windows.get_mut(id) {
                window.is_being_manipulated = false;
            }
        }
        self.interaction_mode = false;
    }

    fn restore_window(&mut self, id: WindowId) {
        if self.windows.restore(id).is_some() {
            self.retile_current_workspace();
        }
    }

    /// Dispatches a resolved window-management action name. Returns
    /// `false` only for `quit`.
    fn dispatch_action(&mut self, action: &str) -> bool {
        match action {
            "quit" => return false,
            "new_window" => {
                if let Err(e) = self.spawn_window() {
                    self.logs.error(format!("failed to spawn window: {e}"));
                    self.notifications.push(NotificationKind::Error, "failed to open window");
                }
            }
            "close_window" => {
                if let Some(id) = self.windows.focused {
                    if let Some(window) = self.windows.get(id) {
                        window.session.close();
                    }
                }
            }
            "next_window" | "prev_window" => self.cycle_focus(action == "next_window"),
            "minimize" => {
                if let Some(id) = self.windows.focused {
                    self.minimize_window(id);
                }
            }
            "toggle_log_viewer" => self.show_log_viewer = !self.show_log_viewer,
            "copy_mode" => {
                if let Some(window) = self.focused_window_mut() {
                    window.copy_mode = crate::window::CopyMode::Normal;
                }
            }
            "snap_fullscreen" => self.snap_focused(crate::layout::floating::SnapTarget::Full),
            "snap_left" => self.snap_focused(crate::layout::floating::SnapTarget::Left),
            "snap_right" => self.snap_focused(crate::layout::floating::SnapTarget::Right),
            "rotate_split" => {
                if let Some(id) = self.windows.focused {
                    self.workspaces.current_mut().bsp.tree.rotate_split_at(id);
                    self.retile_current_workspace();
                }
            }
            "equalize" => {
                self.workspaces.current_mut().bsp.tree.equalize();
                self.retile_current_workspace();
            }
            "rename" => {
                if let Some(id) = self.windows.focused {
                    let existing = self.windows.get(id).and_then(|w| w.custom_name.clone()).unwrap_or_default();
                    self.renaming = Some((id, existing));
                }
            }
            other if other.starts_with("switch_workspace:") => {
                if let Some(target) = other.strip_prefix("switch_workspace:").and_then(|s| s.parse::<u8>().ok()) {
                    self.workspaces.switch(target, &mut self.windows);
                    self.retile_current_workspace();
                }
            }
            other if other.starts_with("move_to_workspace:") => {
                if let Some(target) = other.strip_prefix("move_to_workspace:").and_then(|s| s.parse::<u8>().ok()) {
                    if let Some(id) = self.windows.focused {
                        self.workspaces.move_window(id, target, true, &mut self.windows);
                        self.retile_current_workspace();
                    }
                }
            }
            other if other.starts_with("restore_minimized:") => {
                if let Some(index) = other.strip_prefix("restore_minimized:").and_then(|s| s.parse::<usize>().ok()) {
                    let workspace = self.workspaces.current();
                    let minimized: Vec<WindowId> = self
                        .windows
                        .iter()
                        .filter(|w| w.workspace == workspace && w.minimized)
                        .map(|w| w.id)
                        .collect();
                    if let Some(&id) = minimized.get(index) {
                        self.restore_window(id);
                    }
                }
            }
            other => self.logs.debug(format!("unhandled action: {other}")),
        }
        true
    }

    /// Snaps the focused floating window toward `target`, pushing the
    /// resulting animation if its rectangle actually changes.
    fn snap_focused(&mut self, target: crate::layout::floating::SnapTarget) {
        let Some(id) = self.windows.focused else { return };
        let Some(current) = self.windows.get(id).map(|w| w.geometry) else { return };
        let anim = crate::layout::floating::resolve_snap(
            id,
            current,
            target,
            self.viewport,
            1,
            self.config.default_window_width,
            self.config.default_window_height,
            Self::MOUSE_MIN_WIDTH,
            Self::MOUSE_MIN_HEIGHT,
        );
        if let Some(anim) = anim {
            self.animations.push(anim);
        }
    }

    fn dispatch_copy_action(&mut self, action: crate::input::copy_mode::CopyAction) {
        use crate::input::copy_mode::CopyAction;
        let Some(window) = self.focused_window_mut() else { return };
        let (rows, cols) = window.session.with_screen(|s| s.size());

        match action {
            CopyAction::Exit | CopyAction::ExitToTerminal => {
                window.copy_mode = crate::window::CopyMode::Inactive;
                window.selection.start = None;
                window.selection.end = None;
            }
            CopyAction::VisualChar => {
                window.copy_mode = crate::window::CopyMode::VisualChar;
                window.selection.start = Some(window.selection.cursor);
            }
            CopyAction::VisualLine => {
                window.copy_mode = crate::window::CopyMode::VisualLine;
                window.selection.start = Some(window.selection.cursor);
            }
            CopyAction::Left => window.selection.cursor.col = window.selection.cursor.col.saturating_sub(1),
            CopyAction::Right => {
                window.selection.cursor.col = (window.selection.cursor.col + 1).min(cols.saturating_sub(1))
            }
            CopyAction::Up => {
                if window.selection.cursor.row == 0 {
                    window.scrollback_offset = window.scrollback_offset.saturating_add(1);
                } else {
                    window.selection.cursor.row -= 1;
                }
            }
            CopyAction::Down => {
                if window.scrollback_offset > 0 {
                    window.scrollback_offset -= 1;
                } else {
                    window.selection.cursor.row = (window.selection.cursor.row + 1).min(rows.saturating_sub(1));
                }
            }
            CopyAction::LineStart => window.selection.cursor.col = 0,
            CopyAction::LineEnd => window.selection.cursor.col = cols.saturating_sub(1),
            CopyAction::Top => {
                window.scrollback_offset = window.scrollback_offset.saturating_add(rows as usize);
                window.selection.cursor.row = 0;
            }
            CopyAction::Bottom => {
                window.scrollback_offset = 0;
                window.selection.cursor.row = rows.saturating_sub(1);
            }
            CopyAction::WordForward | CopyAction::WordBack | CopyAction::WordEnd => move_by_word(window, action),
            CopyAction::FindChar { kind, ch } => find_char_in_row(window, kind, ch),
            CopyAction::RepeatFind | CopyAction::RepeatFindReverse => {
                // The last find target isn't retained across dispatches yet,
                // so a repeat has nothing to repeat.
            }
            CopyAction::SearchForward => window.copy_mode = crate::window::CopyMode::Search,
            CopyAction::SearchNext => advance_search_match(window, true),
            CopyAction::SearchPrev => advance_search_match(window, false),
            CopyAction::Yank => {
                window.selection.selected_text = extract_selection_text(window);
                window.copy_mode = crate::window::CopyMode::Inactive;
            }
        }
        window.mark_content_dirty();
    }

    fn cycle_focus(&mut self, forward: bool) {
        let workspace = self.workspaces.current();
        let mut ids: Vec<WindowId> =
            self.windows.iter().filter(|w| w.workspace == workspace && !w.minimized).map(|w| w.id).collect();
        if ids.is_empty() {
            return;
        }
        ids.sort_unstable();
        let current_pos = self.windows.focused.and_then(|f| ids.iter().position(|&id| id == f));
        let next_pos = match (current_pos, forward) {
            (Some(pos), true) => (pos + 1) % ids.len(),
            (Some(pos), false) => (pos + ids.len() - 1) % ids.len(),
            (None, _) => 0,
        };
        self.windows.focus(ids[next_pos]);
    }

    fn minimize_window(&mut self, id: WindowId) {
        let Some(window) = self.windows.get(id) else { return };
        let start = window.geometry;
        self.windows.minimize(id);
        self.animations.push(Animation::new(AnimationKind::Minimize, id, start, start, Duration::from_millis(150)));
        self.retile_current_workspace();
    }

    fn spawn_window(&mut self) -> Result<WindowId> {
        let id = self.windows.alloc_id();
        let (cols, rows) = Rect::new(0, 0, self.config.default_window_width, self.config.default_window_height).content_size();
        let session = Session::open(rows, cols, &[], &self.shell, id, self.window_exit_tx.clone())?;
        let workspace = self.workspaces.current();
        let geometry = Rect::new(0, 0, self.config.default_window_width, self.config.default_window_height);
        let window = Window::new(id, geometry, workspace, session);
        self.windows.insert(window);
        self.workspaces.current_mut().bsp.insert(id, None, self.viewport);
        self.retile_current_workspace();
        Ok(id)
    }

    fn reap(&mut self, id: WindowId) {
        let Some(removed) = self.windows.delete(id) else { return };
        self.animations.remove_for_window(id);
        self.kitty.remove_window(id);
        if let Some(ws) = self.workspaces.get_mut(removed.workspace) {
            ws.bsp.remove(id);
        }
        self.retile_current_workspace();
    }

    fn retile_current_workspace(&mut self) {
        let workspace = self.workspaces.current();
        let rects = self.workspaces.current_mut().bsp.apply(self.viewport);
        for (id, rect) in rects {
            if let Some(window) = self.windows.get_mut(id) {
                if window.workspace == workspace {
                    window.apply_geometry(rect);
                }
            }
        }
    }

    fn focused_window(&self) -> Option<&Window> {
        self.windows.focused.and_then(|id| self.windows.get(id))
    }

    fn focused_window_mut(&mut self) -> Option<&mut Window> {
        let id = self.windows.focused?;
        self.windows.get_mut(id)
    }

    /// One full tick: reap, animate, sample, poll content, decide
    /// frame-skip, and if not skipped, render and return the frame bytes
    /// (main screen string plus any pending kitty escape output).
    fn tick(&mut self) -> Option<Vec<u8>> {
        self.drain_exits();
        self.advance_animations();
        self.sample_resources();
        self.notifications.prune();
        self.process_kitty_commands();

        let any_content_dirty = self.poll_content();

        if Renderer::can_skip_frame(self.interaction_mode, !self.animations.is_empty(), any_content_dirty, self.windows.len()) {
            return None;
        }

        Some(self.render_frame())
    }

    fn drain_exits(&mut self) {
        while let Ok(exit) = self.window_exit_rx.try_recv() {
            self.reap(exit.window_id);
        }
    }

    fn advance_animations(&mut self) {
        self.animations.advance_all();
        for anim in self.animations.drain_completed() {
            if let Some(window) = self.windows.get_mut(anim.window_id) {
                window.minimizing = false;
                if anim.kind != AnimationKind::Minimize {
                    window.apply_geometry(anim.end);
                }
            }
        }
    }

    fn sample_resources(&mut self) {
        if self.last_cpu_sample.elapsed() < CPU_SAMPLE_MIN_INTERVAL {
            return;
        }
        self.last_cpu_sample = Instant::now();
        self.logs.debug("cpu/ram sample tick (widget rendering out of scope)");
    }

    /// Drains each window's PTY-stripped Kitty graphics commands, rewrites
    /// them into host-terminal commands via `self.kitty`, and routes the
    /// result back to the guest (query replies) or into the placement
    /// table (reserved transmit+place anchors).
    fn process_kitty_commands(&mut self) {
        let ids: Vec<WindowId> = self.windows.iter().map(|w| w.id).collect();
        for id in ids {
            let commands = match self.windows.get(id) {
                Some(window) => window.session.take_kitty_commands(),
                None => continue,
            };
            if commands.is_empty() {
                continue;
            }
            let Some((geometry, cursor_row, cursor_col)) = self.windows.get(id).map(|window| {
                let (row, col) = window.session.with_screen(|s| s.cursor_position());
                (window.geometry, row, col)
            }) else {
                continue;
            };
            let cursor = (cursor_col, cursor_row);

            for (control, payload) in commands {
                let cmd = crate::kitty::command::parse(&control, &payload);
                let guest_id = cmd.guest_image_id.unwrap_or(0);
                match self.kitty.handle_command(id, &cmd, geometry, cursor) {
                    crate::kitty::Outcome::ReplyToGuest(bytes) => {
                        if let Some(window) = self.windows.get(id) {
                            let _ = window.session.pty_input_tx.send(bytes);
                        }
                    }
                    crate::kitty::Outcome::Reserve(_) => {
                        if let Some(host_id) = self.kitty.host_id_for(id, guest_id) {
                            self.kitty.stamp_anchor(id, host_id, cursor_row as u64, cursor_col);
                        }
                    }
                    crate::kitty::Outcome::None => {}
                }
            }
        }
    }

    /// Applies the per-window content-polling cache rule and returns
    /// whether any window reported new content this tick.
    fn poll_content(&mut self) -> bool {
        let focused = self.windows.focused;
        let mut any_dirty = false;
        for window in self.windows.iter_mut() {
            let is_focused = Some(window.id) == focused;
            let should_poll = if self.interaction_mode {
                false
            } else if is_focused {
                true
            } else {
                window.update_counter % 3 == 0 || window.content_dirty
            };
            if should_poll && window.content_dirty {
                any_dirty = true;
                window.content_dirty = false;
            }
            window.update_counter = window.update_counter.wrapping_add(1);
        }
        any_dirty
    }

    fn render_frame(&mut self) -> Vec<u8> {
        let workspace = self.workspaces.current();
        let focused = self.windows.focused;
        let terminal_mode = matches!(self.input.mode, crate::input::Mode::Terminal);
        let show_buttons = self.config.show_border_buttons;

        let mut layers: Vec<(Rect, Vec<String>)> = Vec::new();
        let mut snapshots: HashMap<WindowId, WindowSnapshot> = HashMap::new();
        let mut minimized_names = Vec::new();

        let mut ordered: Vec<&Window> = self.windows.iter().filter(|w| w.is_visible(workspace)).collect();
        ordered.sort_by_key(|w| w.z);

        for window in &ordered {
            let (content_cols, content_rows) = window.geometry.content_size();
            let rows: Vec<Vec<(crate::render::style::CellStyle, String)>> = window.session.with_screen(|screen| {
                (0..content_rows)
                    .map(|row| {
                        (0..content_cols)
                            .map(|col| {
                                screen
                                    .cell(row, col)
                                    .map(|cell| (crate::render::style::style_of(cell), cell.contents()))
                                    .unwrap_or_default()
                            })
                            .collect()
                    })
                    .collect()
            });

            let is_focused = Some(window.id) == focused;
            let rendered = if window.is_being_manipulated {
                let mut lines = vec![Renderer::render_resizing_indicator(window.geometry)];
                lines.resize(window.geometry.height as usize, String::new());
                lines
            } else {
                self.renderer.render_window(window, &rows, is_focused, terminal_mode, show_buttons)
            };
            layers.push((window.geometry, rendered));

            snapshots.insert(
                window.id,
                WindowSnapshot {
                    window_x: window.geometry.x,
                    window_y: window.geometry.y,
                    content_offset_x: 1,
                    content_offset_y: 1,
                    width: window.geometry.width,
                    height: window.geometry.height,
                    scrollback_len: 0,
                    scroll_offset: window.scrollback_offset as u64,
                    is_being_manipulated: window.is_being_manipulated,
                    is_alt_screen: window.session.with_screen(|s| s.alternate_screen()),
                    z_index: window.z,
                    visible: true,
                },
            );
        }

        for window in self.windows.iter() {
            if window.workspace == workspace && window.minimized {
                minimized_names.push(window.display_name().to_string());
            }
        }

        let mut frame = self.renderer.compose(self.viewport, &layers, self.interaction_mode);

        let overlay_lines = render_overlays(&self.notifications, None, &minimized_names, self.viewport.width);
        append_overlay(&mut frame, &overlay_lines);
        if self.show_log_viewer {
            append_overlay(&mut frame, &render_log_overlay(&self.logs, 10));
        }

        self.kitty.refresh(&snapshots);
        let kitty_bytes = self.kitty.take_host_output();

        let mut out = frame.join("\r\n").into_bytes();
        out.extend_from_slice(&kitty_bytes);
        out
    }

    fn flush_frame(&self, frame: &[u8]) -> Result<()> {
        use std::io::Write;
        let mut stdout = std::io::stdout();
        stdout.write_all(b"\x1b[H")?;
        stdout.write_all(frame)?;
        stdout.flush()?;
        Ok(())
    }
}

fn gesture_window_id(gesture: crate::input::mouse::Gesture) -> WindowId {
    use crate::input::mouse::Gesture;
    match gesture {
        Gesture::Move { window_id, .. }
        | Gesture::Resize { window_id, .. }
        | Gesture::EdgeResize { window_id, .. }
        | Gesture::Selection { window_id, .. } => window_id,
    }
}

/// Converts an absolute screen point into a cell position relative to
/// `geometry`'s content area (inside the one-cell border).
fn cell_pos_in_window(geometry: Rect, point: (i32, i32)) -> crate::window::CellPos {
    let col = (point.0 - geometry.x - 1).max(0) as u16;
    let row = (point.1 - geometry.y - 1).max(0) as u16;
    crate::window::CellPos { row, col }
}

/// Moves a copy-mode cursor by one word within its current row, vim-style.
/// Does not wrap across rows.
fn move_by_word(window: &mut Window, action: crate::input::copy_mode::CopyAction) {
    use crate::input::copy_mode::CopyAction;

    let row = window.selection.cursor.row;
    let chars = row_chars(window, row);
    let col = window.selection.cursor.col as usize;
    let is_word = |c: char| !c.is_whitespace();

    let new_col = match action {
        CopyAction::WordForward => {
            let mut i = col;
            while i < chars.len() && is_word(chars[i]) {
                i += 1;
            }
            while i < chars.len() && !is_word(chars[i]) {
                i += 1;
            }
            i
        }
        CopyAction::WordBack => {
            let mut i = col;
            while i > 0 && !is_word(chars[i - 1]) {
                i -= 1;
            }
            while i > 0 && is_word(chars[i - 1]) {
                i -= 1;
            }
            i
        }
        CopyAction::WordEnd => {
            let mut i = (col + 1).min(chars.len());
            while i < chars.len() && !is_word(chars[i]) {
                i += 1;
            }
            while i + 1 < chars.len() && is_word(chars[i + 1]) {
                i += 1;
            }
            i
        }
        _ => col,
    };
    window.selection.cursor.col = new_col.min(chars.len().saturating_sub(1)) as u16;
}

/// Moves a copy-mode cursor to the next (or previous) occurrence of `ch` on
/// its current row, per vim's `f`/`F`/`t`/`T`.
fn find_char_in_row(window: &mut Window, kind: crate::input::copy_mode::FindKind, ch: char) {
    use crate::input::copy_mode::FindKind;

    let row = window.selection.cursor.row;
    let chars = row_chars(window, row);
    let col = window.selection.cursor.col as usize;

    let found = match kind {
        FindKind::ForwardTo | FindKind::ForwardTill => {
            chars.iter().enumerate().skip(col + 1).find(|(_, &c)| c == ch).map(|(i, _)| i)
        }
        FindKind::BackwardTo | FindKind::BackwardTill => {
            chars.iter().enumerate().take(col).rev().find(|(_, &c)| c == ch).map(|(i, _)| i)
        }
    };

    if let Some(mut i) = found {
        match kind {
            FindKind::ForwardTill if i > 0 => i -= 1,
            FindKind::BackwardTill => i += 1,
            _ => {}
        }
        window.selection.cursor.col = i as u16;
    }
}

/// Reads `row`'s visible cells out of the VT grid as a flat `Vec<char>`,
/// one entry per column (taking only the first char of each cell's
/// contents, which covers the plain-ASCII navigation this supports).
fn row_chars(window: &Window, row: u16) -> Vec<char> {
    window.session.with_screen(|screen| {
        let (_, cols) = screen.size();
        (0..cols)
            .map(|col| screen.cell(row, col).and_then(|cell| cell.contents().chars().next()).unwrap_or(' '))
            .collect()
    })
}

/// Advances to the next (or previous) search match, wrapping around, and
/// moves the copy-mode cursor onto it.
fn advance_search_match(window: &mut Window, forward: bool) {
    let len = window.search.matches.len();
    if len == 0 {
        return;
    }
    let next = match window.search.current_match {
        Some(i) if forward => (i + 1) % len,
        Some(i) => (i + len - 1) % len,
        None => 0,
    };
    window.search.current_match = Some(next);
    window.selection.cursor = window.search.matches[next];
}

/// Reads the plain text covered by the active selection out of the VT grid,
/// normalizing `start`/`end` into reading order first.
fn extract_selection_text(window: &Window) -> String {
    let Some(start) = window.selection.start else { return String::new() };
    let end = window.selection.end.unwrap_or(window.selection.cursor);
    let (start, end) = if (start.row, start.col) <= (end.row, end.col) { (start, end) } else { (end, start) };

    window.session.with_screen(|screen| {
        let (_, cols) = screen.size();
        let mut out = String::new();
        for row in start.row..=end.row {
            let row_start = if row == start.row { start.col } else { 0 };
            let row_end = if row == end.row { end.col } else { cols.saturating_sub(1) };
            for col in row_start..=row_end {
                if let Some(cell) = screen.cell(row, col) {
                    out.push_str(&cell.contents());
                }
            }
            if row != end.row {
                out.push('\n');
            }
        }
        out
    })
}

/// Overwrites the bottom rows of `frame` with `overlay_lines`, bottom-
/// aligned, without changing the frame's row count.
fn append_overlay(frame: &mut [String], overlay_lines: &[String]) {
    let start = frame.len().saturating_sub(overlay_lines.len());
    for (row, line) in frame[start..].iter_mut().zip(overlay_lines) {
        *row = line.clone();
    }
}

fn format_key(key: &KeyEvent) -> String {
    use crossterm::event::{KeyCode, KeyModifiers};
    let mut parts = Vec::new();
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        parts.push("ctrl".to_string());
    }
    if key.modifiers.contains(KeyModifiers::ALT) {
        parts.push("alt".to_string());
    }
    if key.modifiers.contains(KeyModifiers::SHIFT) {
        parts.push("shift".to_string());
    }
    let name = match key.code {
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Esc => "esc".to_string(),
        KeyCode::Backspace => "backspace".to_string(),
        KeyCode::Tab => "tab".to_string(),
        KeyCode::Left => "left".to_string(),
        KeyCode::Right => "right".to_string(),
        KeyCode::Up => "up".to_string(),
        KeyCode::Down => "down".to_string(),
        other => format!("{other:?}").to_lowercase(),
    };
    parts.push(name);
    parts.join("+")
}

fn key_to_bytes(key: &KeyEvent) -> Vec<u8> {
    use crossterm::event::{KeyCode, KeyModifiers};
    match key.code {
        KeyCode::Char(c) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) && c.is_ascii_alphabetic() {
                vec![(c.to_ascii_lowercase() as u8) & 0x1f]
            } else {
                c.to_string().into_bytes()
            }
        }
        KeyCode::Enter => b"\r".to_vec(),
        KeyCode::Esc => b"\x1b".to_vec(),
        KeyCode::Backspace => b"\x7f".to_vec(),
        KeyCode::Tab => b"\t".to_vec(),
        KeyCode::Left => b"\x1b[D".to_vec(),
        KeyCode::Right => b"\x1b[C".to_vec(),
        KeyCode::Up => b"\x1b[A".to_vec(),
        KeyCode::Down => b"\x1b[B".to_vec(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_overlay_replaces_only_bottom_rows() {
        let mut frame = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        append_overlay(&mut frame, &["X".to_string()]);
        assert_eq!(frame, vec!["a".to_string(), "b".to_string(), "X".to_string()]);
    }

    #[test]
    fn format_key_orders_modifiers_and_names_plain_chars() {
        let key = KeyEvent::new(crossterm::event::KeyCode::Char('c'), crossterm::event::KeyModifiers::CONTROL);
        assert_eq!(format_key(&key), "ctrl+c");
    }

    #[test]
    fn key_to_bytes_maps_ctrl_chars_to_control_codes() {
        let key = KeyEvent::new(crossterm::event::KeyCode::Char('c'), crossterm::event::KeyModifiers::CONTROL);
        assert_eq!(key_to_bytes(&key), vec![0x03]);
    }

    #[test]
    fn key_to_bytes_maps_plain_char_to_utf8() {
        let key = KeyEvent::new(crossterm::event::KeyCode::Char('a'), crossterm::event::KeyModifiers::NONE);
        assert_eq!(key_to_bytes(&key), b"a".to_vec());
    }
}
