//! Cell styling and the manual run-length batching pass: consecutive
//! cells with identical style are joined into one SGR-prefixed run, rather
//! than emitting an escape sequence per cell.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellStyle {
    pub fg: vt100::Color,
    pub bg: vt100::Color,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub inverse: bool,
}

impl Default for CellStyle {
    fn default() -> Self {
        Self {
            fg: vt100::Color::Default,
            bg: vt100::Color::Default,
            bold: false,
            italic: false,
            underline: false,
            inverse: false,
        }
    }
}

pub fn style_of(cell: &vt100::Cell) -> CellStyle {
    CellStyle {
        fg: cell.fgcolor(),
        bg: cell.bgcolor(),
        bold: cell.bold(),
        italic: cell.italic(),
        underline: cell.underline(),
        inverse: cell.inverse(),
    }
}

fn color_codes(color: vt100::Color, is_fg: bool) -> Vec<String> {
    match color {
        vt100::Color::Default => Vec::new(),
        vt100::Color::Idx(i) if i < 8 => vec![((if is_fg { 30 } else { 40 }) + i as u16).to_string()],
        vt100::Color::Idx(i) if i < 16 => vec![((if is_fg { 90 } else { 100 }) + (i - 8) as u16).to_string()],
        vt100::Color::Idx(i) => vec![if is_fg { "38" } else { "48" }.to_string(), "5".to_string(), i.to_string()],
        vt100::Color::Rgb(r, g, b) => {
            vec![if is_fg { "38" } else { "48" }.to_string(), "2".to_string(), r.to_string(), g.to_string(), b.to_string()]
        }
    }
}

/// The SGR escape sequence for `style`, always prefixed with a reset (`0`)
/// so runs never inherit terminal state left over from a previous cell.
pub fn sgr_prefix(style: &CellStyle) -> String {
    let mut codes = vec!["0".to_string()];
    if style.bold {
        codes.push("1".to_string());
    }
    if style.italic {
        codes.push("3".to_string());
    }
    if style.underline {
        codes.push("4".to_string());
    }
    if style.inverse {
        codes.push("7".to_string());
    }
    codes.extend(color_codes(style.fg, true));
    codes.extend(color_codes(style.bg, false));
    format!("\x1b[{}m", codes.join(";"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRun {
    pub style: CellStyle,
    pub text: String,
}

/// Merges consecutive `(style, text)` pairs sharing the same style into
/// single runs, so a line of identically-styled prose costs one escape
/// sequence rather than one per cell.
pub fn batch_runs(cells: impl IntoIterator<Item = (CellStyle, String)>) -> Vec<StyleRun> {
    let mut runs: Vec<StyleRun> = Vec::new();
    for (style, text) in cells {
        if let Some(last) = runs.last_mut() {
            if last.style == style {
                last.text.push_str(&text);
                continue;
            }
        }
        runs.push(StyleRun { style, text });
    }
    runs
}

/// Renders batched runs to one escape-sequence-interleaved string, with a
/// trailing reset so nothing leaks into whatever the renderer writes next.
pub fn render_runs(runs: &[StyleRun]) -> String {
    let mut out = String::new();
    for run in runs {
        out.push_str(&sgr_prefix(&run.style));
        out.push_str(&run.text);
    }
    if !runs.is_empty() {
        out.push_str("\x1b[0m");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(bold: bool) -> CellStyle {
        CellStyle { bold, ..Default::default() }
    }

    #[test]
    fn identical_styles_merge_into_one_run() {
        let cells = vec![(style(true), "a".to_string()), (style(true), "b".to_string()), (style(false), "c".to_string())];
        let runs = batch_runs(cells);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "ab");
        assert_eq!(runs[1].text, "c");
    }

    #[test]
    fn render_runs_wraps_each_run_and_resets_at_the_end() {
        let runs = batch_runs(vec![(style(true), "hi".to_string())]);
        let rendered = render_runs(&runs);
        assert!(rendered.starts_with("\x1b[0;1m"));
        assert!(rendered.ends_with("\x1b[0m"));
        assert!(rendered.contains("hi"));
    }

    #[test]
    fn empty_input_renders_to_empty_string() {
        assert_eq!(render_runs(&[]), "");
    }

    #[test]
    fn rgb_color_emits_truecolor_sgr() {
        let style = CellStyle { fg: vt100::Color::Rgb(10, 20, 30), ..Default::default() };
        let prefix = sgr_prefix(&style);
        assert!(prefix.contains("38;2;10;20;30"));
    }
}
