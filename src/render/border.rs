//! Window border decoration: the boxed frame, the centered name pill on
//! the bottom edge, and the close/maximize/minimize buttons on the top
//! edge.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderColorRole {
    FocusedTerminal,
    FocusedWindow,
    Unfocused,
}

/// Focused-in-terminal-mode windows get bright green, focused-in-window-
/// management-mode get bright cyan, anything unfocused gets red.
pub fn decoration_color(focused: bool, terminal_mode: bool) -> BorderColorRole {
    match (focused, terminal_mode) {
        (false, _) => BorderColorRole::Unfocused,
        (true, true) => BorderColorRole::FocusedTerminal,
        (true, false) => BorderColorRole::FocusedWindow,
    }
}

fn sgr(role: BorderColorRole) -> &'static str {
    match role {
        BorderColorRole::FocusedTerminal => "\x1b[92m",
        BorderColorRole::FocusedWindow => "\x1b[96m",
        BorderColorRole::Unfocused => "\x1b[31m",
    }
}

pub fn colorize(line: &str, role: BorderColorRole) -> String {
    format!("{}{}\x1b[0m", sgr(role), line)
}

const BUTTONS: &str = " _ □ x";

/// The top border line: a plain horizontal rule, with minimize/maximize/
/// close buttons right-aligned when `show_buttons` and there's room.
pub fn top_border(width: u16, show_buttons: bool) -> String {
    let inner_width = width.saturating_sub(2) as usize;
    let mut inner = vec!['─'; inner_width];
    let button_chars: Vec<char> = BUTTONS.chars().collect();
    if show_buttons && inner_width > button_chars.len() + 1 {
        let insert_at = inner_width - button_chars.len();
        for (i, c) in button_chars.iter().enumerate() {
            inner[insert_at + i] = *c;
        }
    }
    format!("┌{}┐", inner.into_iter().collect::<String>())
}

/// The bottom border line: `name` centered in a pill, truncated with `…`
/// if it would not otherwise fit.
pub fn bottom_border(width: u16, name: &str) -> String {
    let inner_width = width.saturating_sub(2) as usize;
    if inner_width == 0 {
        return "└┘".to_string();
    }

    let label = if name.chars().count() + 2 > inner_width {
        let keep = inner_width.saturating_sub(3);
        let truncated: String = name.chars().take(keep).collect();
        format!("{truncated}…")
    } else {
        name.to_string()
    };

    let pill: String = format!(" {label} ").chars().take(inner_width).collect();
    let pill_len = pill.chars().count();
    let total_pad = inner_width - pill_len;
    let left_pad = total_pad / 2;
    let right_pad = total_pad - left_pad;
    format!("└{}{}{}┘", "─".repeat(left_pad), pill, "─".repeat(right_pad))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoration_color_follows_focus_and_mode() {
        assert_eq!(decoration_color(false, true), BorderColorRole::Unfocused);
        assert_eq!(decoration_color(true, true), BorderColorRole::FocusedTerminal);
        assert_eq!(decoration_color(true, false), BorderColorRole::FocusedWindow);
    }

    #[test]
    fn top_border_has_exact_width() {
        let border = top_border(20, true);
        assert_eq!(border.chars().count(), 20);
        assert!(border.contains('x'));
    }

    #[test]
    fn top_border_without_buttons_is_a_plain_rule() {
        let border = top_border(10, false);
        assert!(!border.contains('x'));
        assert_eq!(border.chars().count(), 10);
    }

    #[test]
    fn bottom_border_centers_the_name_pill() {
        let border = bottom_border(20, "shell");
        assert_eq!(border.chars().count(), 20);
        assert!(border.contains(" shell "));
    }

    #[test]
    fn bottom_border_truncates_long_names() {
        let border = bottom_border(12, "a-very-long-window-name");
        assert_eq!(border.chars().count(), 12);
        assert!(border.contains('…'));
    }

    #[test]
    fn colorize_wraps_with_sgr_and_reset() {
        let colored = colorize("border", BorderColorRole::FocusedTerminal);
        assert!(colored.starts_with("\x1b[92m"));
        assert!(colored.ends_with("\x1b[0m"));
    }
}
