//! Parses the control-data portion of a Kitty graphics APC
//! (`<key>=<value>,<key>=<value>,...`) into a typed command. The wire
//! framing itself (the surrounding `ESC _G ... ESC \`) is the VT emulator's
//! concern; we only see the control-data string and the raw payload bytes
//! it already split out for us.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Query,
    TransmitOnly,
    TransmitAndPlace,
    Place,
    Delete,
}

impl Action {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'q' => Some(Action::Query),
            't' => Some(Action::TransmitOnly),
            'T' => Some(Action::TransmitAndPlace),
            'p' => Some(Action::Place),
            'd' => Some(Action::Delete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Medium {
    Direct,
    File,
    TempFile,
    SharedMemory,
}

impl Medium {
    fn from_char(c: char) -> Self {
        match c {
            'f' => Medium::File,
            't' => Medium::TempFile,
            's' => Medium::SharedMemory,
            _ => Medium::Direct,
        }
    }
}

/// One parsed Kitty graphics command. Fields map directly to the protocol's
/// own key letters (`i`, `p`, `f`, `c`, `r`, `x,y,w,h`, `X,Y`, `z`,
/// `U`, `o`, `m`, `q`, `C`, `d`).
#[derive(Debug, Clone, Default)]
pub struct GraphicsCommand {
    pub action: Option<Action>,
    pub medium: Medium,
    pub guest_image_id: Option<u32>,
    pub placement_id: Option<u32>,
    pub format: Option<u32>,
    pub cols: Option<u32>,
    pub rows: Option<u32>,
    pub src_x: Option<u32>,
    pub src_y: Option<u32>,
    pub src_w: Option<u32>,
    pub src_h: Option<u32>,
    pub x_offset: Option<i32>,
    pub y_offset: Option<i32>,
    pub z_index: Option<i32>,
    pub virtual_placement: bool,
    pub zlib_compressed: bool,
    pub more_chunks: bool,
    pub quiet: u8,
    pub suppress_cursor_move: bool,
    pub delete_mode: Option<char>,
    pub payload: Vec<u8>,
}

impl Medium {
    pub fn is_direct(self) -> bool {
        matches!(self, Medium::Direct)
    }
}

/// Parses `control` (the comma-separated `k=v` list) and attaches `payload`
/// (the base64 chunk, still encoded — the accumulator decodes once, on the
/// final chunk).
pub fn parse(control: &str, payload: &[u8]) -> GraphicsCommand {
    let mut cmd = GraphicsCommand { payload: payload.to_vec(), ..Default::default() };
    for pair in control.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let Some((key, value)) = pair.split_once('=') else { continue };
        match key {
            "a" => cmd.action = value.chars().next().and_then(Action::from_char),
            "t" => cmd.medium = value.chars().next().map(Medium::from_char).unwrap_or(Medium::Direct),
            "i" => cmd.guest_image_id = value.parse().ok(),
            "p" => cmd.placement_id = value.parse().ok(),
            "f" => cmd.format = value.parse().ok(),
            "c" => cmd.cols = value.parse().ok(),
            "r" => cmd.rows = value.parse().ok(),
            "x" => cmd.src_x = value.parse().ok(),
            "y" => cmd.src_y = value.parse().ok(),
            "w" => cmd.src_w = value.parse().ok(),
            "h" => cmd.src_h = value.parse().ok(),
            "X" => cmd.x_offset = value.parse().ok(),
            "Y" => cmd.y_offset = value.parse().ok(),
            "z" => cmd.z_index = value.parse().ok(),
            "U" => cmd.virtual_placement = value == "1",
            "o" => cmd.zlib_compressed = value == "z",
            "m" => cmd.more_chunks = value == "1",
            "q" => cmd.quiet = value.parse().unwrap_or(0),
            "C" => cmd.suppress_cursor_move = value == "1",
            "d" => cmd.delete_mode = value.chars().next(),
            _ => {}
        }
    }
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_transmit_and_place_control_data() {
        let cmd = parse("a=T,i=7,f=32,c=10,r=5,m=1", b"abcd");
        assert_eq!(cmd.action, Some(Action::TransmitAndPlace));
        assert_eq!(cmd.guest_image_id, Some(7));
        assert_eq!(cmd.format, Some(32));
        assert_eq!(cmd.cols, Some(10));
        assert_eq!(cmd.rows, Some(5));
        assert!(cmd.more_chunks);
        assert_eq!(cmd.payload, b"abcd");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let cmd = parse("a=q,i=1,bogus=xyz", b"");
        assert_eq!(cmd.action, Some(Action::Query));
        assert_eq!(cmd.guest_image_id, Some(1));
    }

    #[test]
    fn medium_defaults_to_direct() {
        let cmd = parse("a=t,i=2", b"");
        assert!(cmd.medium.is_direct());
    }
}
