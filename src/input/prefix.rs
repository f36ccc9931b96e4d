//! The leader/prefix state machine (`Ctrl+B` by default) with one level of
//! sub-prefixes (`w`=workspace, `m`=minimize, `t`=window, `D`=debug,
//! `T`=tape) and a which-key delay before the overlay is shown.

use super::keymap::normalize;
use std::time::{Duration, Instant};

pub const SUB_PREFIXES: &[char] = &['w', 'm', 't', 'D', 'T'];

enum PrefixState {
    Idle,
    Active { sub: Option<char>, entered_at: Instant },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedResult {
    Cancelled,
    Descended(char),
    Command { sub: Option<char>, key: String },
}

pub struct PrefixMachine {
    state: PrefixState,
    timeout: Duration,
    which_key_delay: Duration,
}

impl PrefixMachine {
    pub fn new(timeout: Duration, which_key_delay: Duration) -> Self {
        Self { state: PrefixState::Idle, timeout, which_key_delay }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, PrefixState::Active { .. })
    }

    pub fn current_sub(&self) -> Option<char> {
        match &self.state {
            PrefixState::Active { sub, .. } => *sub,
            PrefixState::Idle => None,
        }
    }

    /// Called when the leader key is pressed while idle.
    pub fn activate(&mut self) {
        self.state = PrefixState::Active { sub: None, entered_at: Instant::now() };
    }

    /// Feeds one keypress while the prefix is active. Returns `Cancelled`
    /// if the chain is abandoned (explicit Escape). A one-character key
    /// matching a known sub-prefix descends instead of dispatching.
    pub fn feed(&mut self, raw_key: &str) -> FeedResult {
        let key = normalize(raw_key);
        let PrefixState::Active { sub, .. } = &self.state else {
            return FeedResult::Cancelled;
        };

        if key == "esc" {
            self.state = PrefixState::Idle;
            return FeedResult::Cancelled;
        }

        if sub.is_none() && key.chars().count() == 1 {
            if let Some(c) = key.chars().next().filter(|c| SUB_PREFIXES.contains(c)) {
                self.state = PrefixState::Active { sub: Some(c), entered_at: Instant::now() };
                return FeedResult::Descended(c);
            }
        }

        let sub = *sub;
        self.state = PrefixState::Idle;
        FeedResult::Command { sub, key }
    }

    /// Returns true (and resets to idle) if the active chain has expired.
    pub fn tick(&mut self) -> bool {
        if let PrefixState::Active { entered_at, .. } = &self.state {
            if entered_at.elapsed() > self.timeout {
                self.state = PrefixState::Idle;
                return true;
            }
        }
        false
    }

    pub fn should_show_which_key(&self) -> bool {
        matches!(&self.state, PrefixState::Active { entered_at, .. } if entered_at.elapsed() >= self.which_key_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leader_then_plain_key_dispatches_a_command() {
        let mut machine = PrefixMachine::new(Duration::from_secs(2), Duration::from_millis(500));
        machine.activate();
        assert!(machine.is_active());
        let result = machine.feed("c");
        assert_eq!(result, FeedResult::Command { sub: None, key: "c".to_string() });
        assert!(!machine.is_active());
    }

    #[test]
    fn sub_prefix_descent_then_command() {
        let mut machine = PrefixMachine::new(Duration::from_secs(2), Duration::from_millis(500));
        machine.activate();
        assert_eq!(machine.feed("w"), FeedResult::Descended('w'));
        assert_eq!(machine.current_sub(), Some('w'));
        let result = machine.feed("3");
        assert_eq!(result, FeedResult::Command { sub: Some('w'), key: "3".to_string() });
    }

    #[test]
    fn escape_cancels_at_any_depth() {
        let mut machine = PrefixMachine::new(Duration::from_secs(2), Duration::from_millis(500));
        machine.activate();
        machine.feed("w");
        assert_eq!(machine.feed("Escape"), FeedResult::Cancelled);
        assert!(!machine.is_active());
    }

    #[test]
    fn timeout_resets_to_idle() {
        let mut machine = PrefixMachine::new(Duration::from_millis(5), Duration::from_millis(500));
        machine.activate();
        std::thread::sleep(Duration::from_millis(20));
        assert!(machine.tick());
        assert!(!machine.is_active());
    }

    #[test]
    fn which_key_only_shows_after_delay() {
        let mut machine = PrefixMachine::new(Duration::from_secs(2), Duration::from_millis(5));
        machine.activate();
        assert!(!machine.should_show_which_key());
        std::thread::sleep(Duration::from_millis(10));
        assert!(machine.should_show_which_key());
    }
}
