//! C1: one PTY, one VT emulator, one shell process.
//!
//! Each session owns a spawned shell process keyed by a window id, with a
//! dedicated reader thread pumping PTY output into a `vt100` parser and a
//! writer side for input, plus exit signalling and graceful-kill semantics.

pub mod error;

use anyhow::{Context, Result};
use error::SessionError;
use parking_lot::RwLock;
use portable_pty::{native_pty_system, ChildKiller, CommandBuilder, MasterPty, PtySize};
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub type WindowId = u32;

const DRAIN_DELAY: Duration = Duration::from_millis(50);
const KILL_GRACE: Duration = Duration::from_millis(500);
const READ_BUF_SIZE: usize = 32 * 1024;

/// Fired exactly once per session, after the child has exited and final
/// output has been drained.
#[derive(Debug, Clone, Copy)]
pub struct WindowExit {
    pub window_id: WindowId,
}

struct SessionInner {
    master: Mutex<Box<dyn MasterPty + Send>>,
    writer: Mutex<Box<dyn Write + Send>>,
    child_killer: Mutex<Box<dyn ChildKiller + Send + Sync>>,
    vt: RwLock<vt100::Parser>,
    /// Gate the reader/writer pump threads check between iterations; closing
    /// takes the write side so in-flight reads/writes observe it atomically.
    active: RwLock<bool>,
    window_id: WindowId,
    close_once: AtomicBool,
    /// Kitty graphics APC commands stripped out of the PTY stream before it
    /// reaches the VT parser, awaiting the scheduler's next drain.
    pending_kitty: Mutex<Vec<(String, Vec<u8>)>>,
}

/// Owns a PTY-backed shell and its VT emulator.
pub struct Session {
    inner: Arc<SessionInner>,
    /// Channel synthesized replies (kitty query responses, DA/DSR) are
    /// pushed into; a dedicated thread drains it to the PTY master.
    pub pty_input_tx: std::sync::mpsc::Sender<Vec<u8>>,
}

impl Session {
    /// Spawns `shell` connected to a freshly allocated PTY sized to
    /// `(cols, rows)`. `env` is applied on top of the inherited environment.
    pub fn open(
        rows: u16,
        cols: u16,
        env: &[(String, String)],
        shell: &str,
        window_id: WindowId,
        exit_tx: mpsc::Sender<WindowExit>,
    ) -> Result<Self> {
        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize { rows, cols, pixel_width: 0, pixel_height: 0 })
            .map_err(|e| SessionError::SpawnFailed { message: e.to_string() })
            .context("opening pty")?;

        let writer = pair
            .master
            .take_writer()
            .map_err(|e| SessionError::SpawnFailed { message: e.to_string() })?;

        let mut cmd = CommandBuilder::new(shell);
        cmd.env("TERM", "xterm-256color");
        cmd.env("COLORTERM", "truecolor");
        cmd.env("TUIOS_WINDOW_ID", window_id.to_string());
        for (k, v) in env {
            cmd.env(k, v);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| SessionError::SpawnFailed { message: e.to_string() })?;

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| SessionError::SpawnFailed { message: e.to_string() })?;

        let vt = vt100::Parser::new(rows, cols, 10_000);

        let inner = Arc::new(SessionInner {
            master: Mutex::new(pair.master),
            writer: Mutex::new(writer),
            child_killer: Mutex::new(child.clone_killer()),
            vt: RwLock::new(vt),
            active: RwLock::new(true),
            window_id,
            close_once: AtomicBool::new(false),
            pending_kitty: Mutex::new(Vec::new()),
        });

        enable_bracketed_paste(&inner);

        let (pty_input_tx, pty_input_rx) = std::sync::mpsc::channel::<Vec<u8>>();

        let _reader_handle = spawn_pty_to_vt(Arc::clone(&inner), reader, exit_tx);
        let _writer_handle = spawn_vt_replies_to_pty(Arc::clone(&inner), pty_input_rx);

        Ok(Self { inner, pty_input_tx })
    }

    pub fn window_id(&self) -> WindowId {
        self.inner.window_id
    }

    /// Forwards `bytes` to the PTY master. A short write is surfaced as an
    /// error rather than silently dropping input.
    pub fn write(&self, bytes: &[u8]) -> Result<()> {
        if !*self.inner.active.read() {
            return Ok(());
        }
        let mut writer = self.inner.writer.lock().unwrap();
        writer
            .write_all(bytes)
            .map_err(|e| SessionError::SpawnFailed { message: e.to_string() })?;
        writer.flush().ok();
        Ok(())
    }

    /// Best-effort PTY + VT resize. Failures are logged by the caller, not
    /// fatal.
    pub fn resize(&self, cols: u16, rows: u16) -> Result<(), SessionError> {
        if cols == 0 || rows == 0 {
            return Ok(());
        }
        let master = self.inner.master.lock().unwrap();
        master
            .resize(PtySize { rows, cols, pixel_width: 0, pixel_height: 0 })
            .map_err(|e| SessionError::ResizeFailed { message: e.to_string() })?;
        drop(master);
        self.inner.vt.write().set_size(rows, cols);
        Ok(())
    }

    pub fn with_screen<R>(&self, f: impl FnOnce(&vt100::Screen) -> R) -> R {
        let vt = self.inner.vt.read();
        f(vt.screen())
    }

    /// Drains the Kitty graphics commands the reader thread has stripped
    /// out of this session's PTY stream since the last call.
    pub fn take_kitty_commands(&self) -> Vec<(String, Vec<u8>)> {
        std::mem::take(&mut *self.inner.pending_kitty.lock().unwrap())
    }

    /// Idempotent, thread-safe teardown: disables bracketed paste and kills
    /// the child. Returns immediately; the kill and its grace period run on
    /// a detached thread so callers (including the scheduler's event loop)
    /// never block on it. The reader thread notices EOF and sends
    /// `WindowExit` on its own schedule regardless.
    pub fn close(&self) {
        if self.inner.close_once.swap(true, Ordering::SeqCst) {
            return;
        }
        *self.inner.active.write() = false;
        disable_bracketed_paste(&self.inner);

        let inner = Arc::clone(&self.inner);
        std::thread::spawn(move || {
            let mut killer = inner.child_killer.lock().unwrap();
            let _ = killer.kill();
            drop(killer);
            std::thread::sleep(KILL_GRACE);
        });
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

fn enable_bracketed_paste(inner: &Arc<SessionInner>) {
    let mut writer = inner.writer.lock().unwrap();
    let _ = writer.write_all(b"\x1b[?2004h");
    let _ = writer.flush();
}

fn disable_bracketed_paste(inner: &Arc<SessionInner>) {
    let mut writer = inner.writer.lock().unwrap();
    let _ = writer.write_all(b"\x1b[?2004l");
    let _ = writer.flush();
}

/// EOF / closed-file / EIO are normal termination, not error conditions.
fn is_benign_eof(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        std::io::ErrorKind::UnexpectedEof | std::io::ErrorKind::BrokenPipe
    ) || {
        let msg = err.to_string();
        msg.contains("already closed") || msg.contains("Input/output error")
    }
}

const KITTY_APC_START: &[u8] = b"\x1b_G";
const KITTY_APC_END: &[u8] = b"\x1b\\";

/// Scans `holdover` (the previous call's unconsumed tail, extended with
/// `input`) for Kitty graphics APC sequences (`ESC _G <control>;<payload>
/// ESC \`), splitting each one out as a `(control, payload)` pair. Bytes
/// outside any APC sequence pass through unchanged for the VT parser. A
/// sequence (or the start marker itself) that hasn't closed by the end of
/// the buffer is left in `holdover` for the next read to complete.
fn split_kitty_commands(holdover: &mut Vec<u8>, input: &[u8]) -> (Vec<u8>, Vec<(String, Vec<u8>)>) {
    holdover.extend_from_slice(input);
    let mut passthrough = Vec::new();
    let mut commands = Vec::new();
    let mut pos = 0;

    loop {
        let Some(rel_start) = find_subslice(&holdover[pos..], KITTY_APC_START) else {
            let tail = trailing_partial_prefix_len(&holdover[pos..], KITTY_APC_START);
            let flush_end = holdover.len() - tail;
            passthrough.extend_from_slice(&holdover[pos..flush_end]);
            pos = flush_end;
            break;
        };
        let start = pos + rel_start;
        passthrough.extend_from_slice(&holdover[pos..start]);

        let body_start = start + KITTY_APC_START.len();
        let Some(rel_end) = find_subslice(&holdover[body_start..], KITTY_APC_END) else {
            pos = start;
            break;
        };
        let body_end = body_start + rel_end;
        let body = &holdover[body_start..body_end];
        match body.iter().position(|&b| b == b';') {
            Some(semi) => {
                let control = String::from_utf8_lossy(&body[..semi]).into_owned();
                commands.push((control, body[semi + 1..].to_vec()));
            }
            None => commands.push((String::from_utf8_lossy(body).into_owned(), Vec::new())),
        }
        pos = body_end + KITTY_APC_END.len();
    }

    let remainder = holdover[pos..].to_vec();
    *holdover = remainder;
    (passthrough, commands)
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Length of the longest suffix of `haystack` that is a (non-full) prefix
/// of `needle`, so a start marker split across two reads isn't flushed to
/// the VT as plain text.
fn trailing_partial_prefix_len(haystack: &[u8], needle: &[u8]) -> usize {
    let max = needle.len().saturating_sub(1).min(haystack.len());
    for len in (1..=max).rev() {
        if haystack[haystack.len() - len..] == needle[..len] {
            return len;
        }
    }
    0
}

fn spawn_pty_to_vt(
    inner: Arc<SessionInner>,
    mut reader: Box<dyn Read + Send>,
    exit_tx: mpsc::Sender<WindowExit>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut buf = [0u8; READ_BUF_SIZE];
            let mut kitty_holdover = Vec::new();
            loop {
                if !*inner.active.read() {
                    break;
                }
                match reader.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        let (passthrough, commands) = split_kitty_commands(&mut kitty_holdover, &buf[..n]);
                        if !commands.is_empty() {
                            inner.pending_kitty.lock().unwrap().extend(commands);
                        }
                        inner.vt.write().process(&passthrough);
                    }
                    Err(e) => {
                        if !is_benign_eof(&e) {
                            // Non-benign errors still terminate the loop; the
                            // exit signal below covers both cases uniformly.
                        }
                        break;
                    }
                }
            }
        }));
        if result.is_err() {
            // Panic inside the reader thread: terminate the thread only.
        }

        *inner.active.write() = false;
        std::thread::sleep(DRAIN_DELAY);
        let _ = exit_tx.try_send(WindowExit { window_id: inner.window_id });
    })
}

fn spawn_vt_replies_to_pty(
    inner: Arc<SessionInner>,
    rx: std::sync::mpsc::Receiver<Vec<u8>>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            while let Ok(bytes) = rx.recv() {
                if !*inner.active.read() {
                    break;
                }
                let mut writer = inner.writer.lock().unwrap();
                let _ = writer.write_all(&bytes);
                let _ = writer.flush();
            }
        }));
        let _ = result;
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn benign_eof_detection() {
        let err = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        assert!(is_benign_eof(&err));
        let err = std::io::Error::other("Input/output error");
        assert!(is_benign_eof(&err));
        let err = std::io::Error::other("permission denied");
        assert!(!is_benign_eof(&err));
    }

    #[test]
    fn split_kitty_commands_extracts_one_full_sequence() {
        let mut holdover = Vec::new();
        let input = b"before\x1b_Ga=T,i=1;cGF5bG9hZA==\x1b\\after";
        let (passthrough, commands) = split_kitty_commands(&mut holdover, input);
        assert_eq!(passthrough, b"beforeafter");
        assert_eq!(commands, vec![("a=T,i=1".to_string(), b"cGF5bG9hZA==".to_vec())]);
        assert!(holdover.is_empty());
    }

    #[test]
    fn split_kitty_commands_carries_an_incomplete_sequence_across_calls() {
        let mut holdover = Vec::new();
        let (passthrough, commands) = split_kitty_commands(&mut holdover, b"before\x1b_Ga=q,i=5;pa");
        assert_eq!(passthrough, b"before");
        assert!(commands.is_empty());
        assert!(!holdover.is_empty());

        let (passthrough, commands) = split_kitty_commands(&mut holdover, b"yload\x1b\\after");
        assert_eq!(passthrough, b"after");
        assert_eq!(commands, vec![("a=q,i=5".to_string(), b"payload".to_vec())]);
        assert!(holdover.is_empty());
    }

    #[test]
    fn split_kitty_commands_holds_back_a_split_start_marker() {
        let mut holdover = Vec::new();
        let (passthrough, commands) = split_kitty_commands(&mut holdover, b"plain\x1b_");
        assert_eq!(passthrough, b"plain");
        assert!(commands.is_empty());
        assert_eq!(holdover, b"\x1b_");

        let (passthrough, commands) = split_kitty_commands(&mut holdover, b"Ga=d,i=2;\x1b\\");
        assert!(passthrough.is_empty());
        assert_eq!(commands, vec![("a=d,i=2".to_string(), Vec::new())]);
        assert!(holdover.is_empty());
    }
}
