//! Key string normalization and the action <-> key registry.

use std::collections::HashMap;

/// Canonicalizes a key string to `ctrl+alt+shift+<key>` order, with
/// modifiers present only if held, and the key name lowercased through the
/// alias table below. Idempotent: `normalize(normalize(k)) == normalize(k)`.
pub fn normalize(raw: &str) -> String {
    let mut ctrl = false;
    let mut alt = false;
    let mut shift = false;
    let mut key_token = "";

    for part in raw.split('+') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match part.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => ctrl = true,
            "alt" | "option" => alt = true,
            "shift" => shift = true,
            _ => key_token = part,
        }
    }

    let key = canonical_key_name(key_token);

    let mut out = String::new();
    if ctrl {
        out.push_str("ctrl+");
    }
    if alt {
        out.push_str("alt+");
    }
    if shift {
        out.push_str("shift+");
    }
    out.push_str(&key);
    out
}

fn canonical_key_name(key: &str) -> String {
    let lower = key.to_ascii_lowercase();
    match lower.as_str() {
        "return" | "enter" => "enter".to_string(),
        "esc" | "escape" => "esc".to_string(),
        "space" | " " => "space".to_string(),
        "up" | "arrowup" => "up".to_string(),
        "down" | "arrowdown" => "down".to_string(),
        "left" | "arrowleft" => "left".to_string(),
        "right" | "arrowright" => "right".to_string(),
        "tab" => "tab".to_string(),
        "backspace" => "backspace".to_string(),
        "delete" | "del" => "delete".to_string(),
        other => match other.strip_prefix('f').and_then(|rest| rest.parse::<u8>().ok()) {
            Some(n) => format!("f{n}"),
            None => other.to_string(),
        },
    }
}

/// Maps normalized key strings to action names, and action names back to
/// their bound keys, kept in sync on every `bind`.
#[derive(Default)]
pub struct Keymap {
    key_to_action: HashMap<String, String>,
    action_to_keys: HashMap<String, Vec<String>>,
}

impl Keymap {
    pub fn new() -> Self {
        Self { key_to_action: HashMap::new(), action_to_keys: HashMap::new() }
    }

    /// Builds a registry from a config-style action -> keys map, as loaded
    /// by [`crate::config::Config`].
    pub fn from_bindings(bindings: &HashMap<String, Vec<String>>) -> Self {
        let mut keymap = Self::new();
        for (action, keys) in bindings {
            for key in keys {
                keymap.bind(action, key);
            }
        }
        keymap
    }

    pub fn bind(&mut self, action: &str, raw_key: &str) {
        let key = normalize(raw_key);
        self.key_to_action.insert(key.clone(), action.to_string());
        let keys = self.action_to_keys.entry(action.to_string()).or_default();
        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    pub fn lookup(&self, raw_key: &str) -> Option<&str> {
        self.key_to_action.get(&normalize(raw_key)).map(|s| s.as_str())
    }

    pub fn keys(&self, action: &str) -> &[String] {
        self.action_to_keys.get(action).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_orders_modifiers_canonically() {
        assert_eq!(normalize("Shift+Ctrl+a"), "ctrl+shift+a");
        assert_eq!(normalize("alt+CTRL+A"), "ctrl+alt+a");
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["Ctrl+Shift+A", "esc", "ArrowUp", "F12", "ctrl+alt+shift+x"] {
            let once = normalize(raw);
            let twice = normalize(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn canonical_names_for_special_keys() {
        assert_eq!(normalize("Return"), "enter");
        assert_eq!(normalize("Escape"), "esc");
        assert_eq!(normalize("ArrowDown"), "down");
        assert_eq!(normalize("f12"), "f12");
    }

    #[test]
    fn keymap_round_trip_for_every_bound_action() {
        let mut bindings = HashMap::new();
        bindings.insert("new_window".to_string(), vec!["c".to_string()]);
        bindings.insert("close_window".to_string(), vec!["x".to_string(), "ctrl+w".to_string()]);
        let keymap = Keymap::from_bindings(&bindings);

        for (action, keys) in &bindings {
            for key in keys {
                assert_eq!(keymap.lookup(key), Some(action.as_str()));
                assert!(keymap.keys(action).contains(&normalize(key)));
            }
        }
    }
}
