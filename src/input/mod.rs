//! C7: the modal input router. Raw keys are classified before anything
//! else reaches a window: leader detection, prefix chords, copy-mode, then
//! either an action name or a raw passthrough to the focused PTY.

pub mod copy_mode;
pub mod keymap;
pub mod mouse;
pub mod prefix;

use crate::config::Config;
use copy_mode::{CopyAction, CopyModeKeymap};
use keymap::{normalize, Keymap};
use prefix::{FeedResult, PrefixMachine};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    WindowManagement,
    Terminal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    WriteToPty(Vec<u8>),
    Action(String),
    CopyAction(CopyAction),
    EnteredPrefix,
    Descended(char),
    PrefixCancelled,
    None,
}

pub struct InputRouter {
    pub mode: Mode,
    keymap: Keymap,
    prefix: PrefixMachine,
    copy_mode: CopyModeKeymap,
    leader: String,
}

impl InputRouter {
    pub fn new(config: &Config) -> Self {
        Self {
            mode: Mode::Terminal,
            keymap: Keymap::from_bindings(&config.keybinds),
            prefix: PrefixMachine::new(
                Duration::from_millis(config.prefix_timeout_ms),
                Duration::from_millis(config.which_key_delay_ms),
            ),
            copy_mode: CopyModeKeymap::new(),
            leader: normalize(&config.leader_key),
        }
    }

    pub fn prefix_active(&self) -> bool {
        self.prefix.is_active()
    }

    pub fn should_show_which_key(&self) -> bool {
        self.prefix.should_show_which_key()
    }

    /// Expires a stale prefix chord; call once per tick.
    pub fn tick_prefix_timeout(&mut self) -> bool {
        self.prefix.tick()
    }

    /// Routes one keypress. `raw_bytes` is what would be written verbatim
    /// to the PTY in terminal mode; `copy_mode_active` reflects the
    /// focused window's own copy-mode flag, since that state lives on the
    /// window, not the router.
    pub fn handle_key(&mut self, raw_key: &str, raw_bytes: &[u8], copy_mode_active: bool) -> RouteOutcome {
        if self.prefix.is_active() {
            return match self.prefix.feed(raw_key) {
                FeedResult::Descended(c) => RouteOutcome::Descended(c),
                FeedResult::Cancelled => RouteOutcome::PrefixCancelled,
                FeedResult::Command { sub, key } => match resolve_sub_command(sub, &key, &self.keymap) {
                    Some(action) => RouteOutcome::Action(action),
                    None => RouteOutcome::None,
                },
            };
        }

        if normalize(raw_key) == self.leader {
            self.prefix.activate();
            return RouteOutcome::EnteredPrefix;
        }

        if copy_mode_active {
            return match self.copy_mode.resolve(raw_key) {
                Some(action) => RouteOutcome::CopyAction(action),
                None => RouteOutcome::None,
            };
        }

        match self.mode {
            Mode::Terminal => RouteOutcome::WriteToPty(raw_bytes.to_vec()),
            Mode::WindowManagement => match self.keymap.lookup(raw_key) {
                Some(action) => RouteOutcome::Action(action.to_string()),
                None => RouteOutcome::None,
            },
        }
    }
}

/// Turns a resolved `Command { sub, key }` into an action name. `w`
/// (workspace) and `m` (minimize) sub-prefixes produce synthetic,
/// parameterized action names the scheduler recognizes by prefix rather
/// than a flat keymap entry, since they carry a workspace/slot number the
/// static keymap has no room for. `D`/`T` (debug/tape) pass the raw key
/// through the same way, for a catch-all handler to log. `t` has no
/// sub-specific behavior of its own, so it falls back to the flat keymap
/// alongside no sub-prefix at all.
fn resolve_sub_command(sub: Option<char>, key: &str, keymap: &Keymap) -> Option<String> {
    match sub {
        Some('w') => match key.strip_prefix("shift+") {
            Some(digit) => Some(format!("move_to_workspace:{digit}")),
            None => Some(format!("switch_workspace:{key}")),
        },
        Some('m') => {
            if !key.is_empty() && key.chars().all(|c| c.is_ascii_digit()) {
                Some(format!("restore_minimized:{key}"))
            } else {
                Some("minimize".to_string())
            }
        }
        Some('D') => Some(format!("debug:{key}")),
        Some('T') => Some(format!("tape:{key}")),
        Some('t') | None | Some(_) => keymap.lookup(key).map(|a| a.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_mode_passes_raw_bytes_through() {
        let config = Config::default();
        let mut router = InputRouter::new(&config);
        let outcome = router.handle_key("a", b"a", false);
        assert_eq!(outcome, RouteOutcome::WriteToPty(b"a".to_vec()));
    }

    #[test]
    fn leader_key_enters_prefix_from_any_mode() {
        let config = Config::default();
        let mut router = InputRouter::new(&config);
        let outcome = router.handle_key("ctrl+b", b"", false);
        assert_eq!(outcome, RouteOutcome::EnteredPrefix);
        assert!(router.prefix_active());
    }

    #[test]
    fn prefix_then_bound_key_resolves_to_its_action() {
        let config = Config::default();
        let mut router = InputRouter::new(&config);
        router.handle_key("ctrl+b", b"", false);
        let outcome = router.handle_key("c", b"c", false);
        assert_eq!(outcome, RouteOutcome::Action("new_window".to_string()));
    }

    #[test]
    fn sub_prefix_workspace_digit_resolves_to_switch_action() {
        let config = Config::default();
        let mut router = InputRouter::new(&config);
        router.handle_key("ctrl+b", b"", false);
        let descended = router.handle_key("w", b"w", false);
        assert_eq!(descended, RouteOutcome::Descended('w'));
        let outcome = router.handle_key("3", b"3", false);
        assert_eq!(outcome, RouteOutcome::Action("switch_workspace:3".to_string()));
    }

    #[test]
    fn sub_prefix_workspace_shifted_digit_resolves_to_move_action() {
        let config = Config::default();
        let mut router = InputRouter::new(&config);
        router.handle_key("ctrl+b", b"", false);
        router.handle_key("w", b"w", false);
        let outcome = router.handle_key("shift+3", b"", false);
        assert_eq!(outcome, RouteOutcome::Action("move_to_workspace:3".to_string()));
    }

    #[test]
    fn sub_prefix_minimize_digit_resolves_to_restore_action() {
        let config = Config::default();
        let mut router = InputRouter::new(&config);
        router.handle_key("ctrl+b", b"", false);
        router.handle_key("m", b"m", false);
        let outcome = router.handle_key("2", b"2", false);
        assert_eq!(outcome, RouteOutcome::Action("restore_minimized:2".to_string()));
    }

    #[test]
    fn copy_mode_active_routes_to_the_vim_keymap() {
        let config = Config::default();
        let mut router = InputRouter::new(&config);
        let outcome = router.handle_key("h", b"h", true);
        assert_eq!(outcome, RouteOutcome::CopyAction(CopyAction::Left));
    }

    #[test]
    fn window_management_mode_resolves_via_keymap_without_leader() {
        let config = Config::default();
        let mut router = InputRouter::new(&config);
        router.mode = Mode::WindowManagement;
        let outcome = router.handle_key("c", b"c", false);
        assert_eq!(outcome, RouteOutcome::Action("new_window".to_string()));
    }
}
