//! Horizontal line clipping that never severs an ANSI escape sequence:
//! escapes are copied through verbatim regardless of the clip window,
//! only the underlying graphemes are counted against it.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Splits `line` into escape-sequence tokens and plain-text tokens,
/// preserving order.
pub(crate) fn tokenize(line: &str) -> Vec<(bool, String)> {
    let mut segments = Vec::new();
    let mut buf = String::new();
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\x1b' {
            if !buf.is_empty() {
                segments.push((false, std::mem::take(&mut buf)));
            }
            let start = i;
            i += 1;
            if i < chars.len() && chars[i] == '[' {
                i += 1;
                while i < chars.len() && !chars[i].is_ascii_alphabetic() {
                    i += 1;
                }
                if i < chars.len() {
                    i += 1;
                }
            } else if i < chars.len() {
                i += 1;
            }
            segments.push((true, chars[start..i].iter().collect()));
        } else {
            buf.push(chars[i]);
            i += 1;
        }
    }
    if !buf.is_empty() {
        segments.push((false, buf));
    }
    segments
}

/// Drops `skip_cols` display columns from the left and keeps up to
/// `max_cols` more, leaving every escape sequence untouched, and always
/// suffixing the result with a reset so style never leaks into the next
/// line drawn.
pub fn clip_line(line: &str, skip_cols: u16, max_cols: u16) -> String {
    let mut out = String::new();
    let mut skipped: u32 = 0;
    let mut used: u32 = 0;
    let mut done = false;

    for (is_escape, content) in tokenize(line) {
        if is_escape {
            out.push_str(&content);
            continue;
        }
        if done {
            continue;
        }
        for grapheme in content.graphemes(true) {
            let width = UnicodeWidthStr::width(grapheme).max(1) as u32;
            if skipped < skip_cols as u32 {
                skipped += width;
                continue;
            }
            if used + width > max_cols as u32 {
                done = true;
                break;
            }
            out.push_str(grapheme);
            used += width;
        }
    }

    out.push_str("\x1b[0m");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_sequences_survive_clipping_untouched() {
        let line = "\x1b[1;31mhello\x1b[0m world";
        let clipped = clip_line(line, 0, 5);
        assert!(clipped.contains("\x1b[1;31m"));
        assert!(clipped.contains("hello"));
        assert!(!clipped.contains("world"));
    }

    #[test]
    fn skip_cols_drops_leading_columns() {
        let clipped = clip_line("abcdef", 2, 3);
        assert_eq!(clipped, "cde\x1b[0m");
    }

    #[test]
    fn result_always_ends_with_reset() {
        let clipped = clip_line("plain", 0, 10);
        assert!(clipped.ends_with("\x1b[0m"));
    }

    #[test]
    fn wide_glyphs_count_as_two_columns() {
        // A fullwidth CJK character occupies two terminal cells.
        let clipped = clip_line("中a", 0, 2);
        assert_eq!(clipped, "中\x1b[0m");
    }
}
