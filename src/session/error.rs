use std::fmt::{Display, Formatter};

/// Errors surfaced by [`super::Session`]. Follows the hand-written
/// `Display`/`Error` idiom this codebase already uses for domain errors
/// rather than a derive-macro crate, keeping error types free of
/// proc-macro dependencies at the lowest layer of the stack.
#[derive(Debug, Clone)]
pub enum SessionError {
    /// The PTY could not be allocated or the shell failed to spawn.
    SpawnFailed { message: String },
    /// A write to the PTY master wrote fewer bytes than requested.
    PartialWrite { requested: usize, written: usize },
    /// A resize call failed; callers should log and continue, not abort.
    ResizeFailed { message: String },
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SpawnFailed { message } => write!(f, "failed to spawn session: {message}"),
            Self::PartialWrite { requested, written } => {
                write!(f, "partial write to pty: wrote {written} of {requested} bytes")
            }
            Self::ResizeFailed { message } => write!(f, "failed to resize pty: {message}"),
        }
    }
}

impl std::error::Error for SessionError {}
