//! The vim-like copy-mode keymap: read-only scrollback navigation, search,
//! and visual selection, resolved directly from raw keys (this mode
//! bypasses the action registry entirely).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindKind {
    ForwardTo,
    BackwardTo,
    ForwardTill,
    BackwardTill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyAction {
    Left,
    Right,
    Up,
    Down,
    WordForward,
    WordBack,
    WordEnd,
    FindChar { kind: FindKind, ch: char },
    RepeatFind,
    RepeatFindReverse,
    LineStart,
    LineEnd,
    Top,
    Bottom,
    SearchForward,
    SearchNext,
    SearchPrev,
    VisualChar,
    VisualLine,
    Yank,
    ExitToTerminal,
    Exit,
}

/// Holds the one bit of cross-keypress state copy mode needs: a pending
/// `f`/`F`/`t`/`T` awaiting its target character, or a pending `g` awaiting
/// a second `g` (vim's `gg`).
#[derive(Default)]
pub struct CopyModeKeymap {
    pending_find: Option<FindKind>,
    pending_g: bool,
}

impl CopyModeKeymap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves one raw (unnormalized, case-preserved) key into an action,
    /// or `None` if it only advances internal state (e.g. the first `g` of
    /// `gg`, or `f` awaiting its target).
    pub fn resolve(&mut self, key: &str) -> Option<CopyAction> {
        if let Some(kind) = self.pending_find.take() {
            return single_char(key).map(|ch| CopyAction::FindChar { kind, ch });
        }
        if self.pending_g {
            self.pending_g = false;
            return (key == "g").then_some(CopyAction::Top);
        }

        match key {
            "h" => Some(CopyAction::Left),
            "l" => Some(CopyAction::Right),
            "j" => Some(CopyAction::Down),
            "k" => Some(CopyAction::Up),
            "w" => Some(CopyAction::WordForward),
            "b" => Some(CopyAction::WordBack),
            "e" => Some(CopyAction::WordEnd),
            "f" => {
                self.pending_find = Some(FindKind::ForwardTo);
                None
            }
            "F" => {
                self.pending_find = Some(FindKind::BackwardTo);
                None
            }
            "t" => {
                self.pending_find = Some(FindKind::ForwardTill);
                None
            }
            "T" => {
                self.pending_find = Some(FindKind::BackwardTill);
                None
            }
            ";" => Some(CopyAction::RepeatFind),
            "," => Some(CopyAction::RepeatFindReverse),
            "0" => Some(CopyAction::LineStart),
            "$" => Some(CopyAction::LineEnd),
            "g" => {
                self.pending_g = true;
                None
            }
            "G" => Some(CopyAction::Bottom),
            "/" => Some(CopyAction::SearchForward),
            "n" => Some(CopyAction::SearchNext),
            "N" => Some(CopyAction::SearchPrev),
            "v" => Some(CopyAction::VisualChar),
            "V" => Some(CopyAction::VisualLine),
            "y" => Some(CopyAction::Yank),
            "i" => Some(CopyAction::ExitToTerminal),
            "q" | "esc" | "Escape" => Some(CopyAction::Exit),
            _ => None,
        }
    }
}

fn single_char(key: &str) -> Option<char> {
    let mut chars = key.chars();
    let first = chars.next()?;
    chars.next().is_none().then_some(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gg_requires_two_presses() {
        let mut keymap = CopyModeKeymap::new();
        assert_eq!(keymap.resolve("g"), None);
        assert_eq!(keymap.resolve("g"), Some(CopyAction::Top));
    }

    #[test]
    fn single_g_then_other_key_drops_pending_state() {
        let mut keymap = CopyModeKeymap::new();
        assert_eq!(keymap.resolve("g"), None);
        assert_eq!(keymap.resolve("h"), None);
        // pending_g cleared; next plain key resolves normally
        assert_eq!(keymap.resolve("h"), Some(CopyAction::Left));
    }

    #[test]
    fn find_char_consumes_the_following_key() {
        let mut keymap = CopyModeKeymap::new();
        assert_eq!(keymap.resolve("f"), None);
        assert_eq!(keymap.resolve("x"), Some(CopyAction::FindChar { kind: FindKind::ForwardTo, ch: 'x' }));
    }

    #[test]
    fn visual_and_exit_keys_resolve_directly() {
        let mut keymap = CopyModeKeymap::new();
        assert_eq!(keymap.resolve("v"), Some(CopyAction::VisualChar));
        assert_eq!(keymap.resolve("V"), Some(CopyAction::VisualLine));
        assert_eq!(keymap.resolve("q"), Some(CopyAction::Exit));
    }
}
