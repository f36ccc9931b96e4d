//! Minimal configuration layer.
//!
//! Loading a config file is an external concern (the real product also
//! supports a full TOML config with theme palettes, SSH hosts, etc.) — here
//! we only keep the slice of configuration the core subsystems actually
//! consult: the leader key, keybind overrides, default window size, the
//! workspace count, and the tiling scheme. Any failure to read or parse the
//! file falls back to `Config::default()` with a logged warning rather than
//! aborting startup, since config loading itself is out of scope for the
//! core.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const DEFAULT_WINDOW_WIDTH: u16 = 40;
pub const DEFAULT_WINDOW_HEIGHT: u16 = 12;

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TilingScheme {
    #[default]
    Spiral,
    LongestSide,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub leader_key: String,
    pub keybinds: HashMap<String, Vec<String>>,
    pub default_window_width: u16,
    pub default_window_height: u16,
    pub workspace_count: u8,
    pub tiling_scheme: TilingScheme,
    pub show_border_buttons: bool,
    pub prefix_timeout_ms: u64,
    pub which_key_delay_ms: u64,
    pub notification_duration_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            leader_key: "ctrl+b".to_string(),
            keybinds: default_keybinds(),
            default_window_width: DEFAULT_WINDOW_WIDTH,
            default_window_height: DEFAULT_WINDOW_HEIGHT,
            workspace_count: 9,
            tiling_scheme: TilingScheme::default(),
            show_border_buttons: true,
            prefix_timeout_ms: 2_000,
            which_key_delay_ms: 500,
            notification_duration_ms: 3_000,
        }
    }
}

/// The baked-in action -> key bindings, overridable per-action by the user's
/// config file.
fn default_keybinds() -> HashMap<String, Vec<String>> {
    let pairs: &[(&str, &[&str])] = &[
        ("new_window", &["c"]),
        ("close_window", &["x"]),
        ("next_window", &["n"]),
        ("prev_window", &["p"]),
        ("snap_fullscreen", &["f"]),
        ("snap_left", &["h"]),
        ("snap_right", &["l"]),
        ("minimize", &["m"]),
        ("rotate_split", &["r"]),
        ("equalize", &["e"]),
        ("copy_mode", &["["]),
        ("rename", &[","]),
    ];
    pairs.iter().map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect())).collect()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file as TOML: {}", path.display()))?;
        config.merge_default_keybinds();
        config.validate()?;
        Ok(config)
    }

    /// Loads from `path` if given, else the platform config dir, else
    /// defaults. Never fails: any error is logged by the caller and
    /// defaults are used instead.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let resolved = path
            .map(|p| p.to_path_buf())
            .or_else(|| dirs::config_dir().map(|d| d.join("winmux").join("config.toml")));

        match resolved {
            Some(p) if p.exists() => Config::load(&p).unwrap_or_default(),
            _ => Config::default(),
        }
    }

    /// Any action missing from the loaded file keeps its built-in binding.
    fn merge_default_keybinds(&mut self) {
        for (action, keys) in default_keybinds() {
            self.keybinds.entry(action).or_insert(keys);
        }
    }

    fn validate(&self) -> Result<()> {
        if self.workspace_count == 0 {
            anyhow::bail!("workspace_count must be at least 1");
        }
        if self.default_window_width < 4 || self.default_window_height < 4 {
            anyhow::bail!("default window size must be at least 4x4 cells");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let config = Config::load_or_default(Some(Path::new("/nonexistent/winmux.toml")));
        assert_eq!(config.workspace_count, 9);
    }

    #[test]
    fn partial_toml_merges_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "leader_key = \"ctrl+a\"\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.leader_key, "ctrl+a");
        assert!(config.keybinds.contains_key("new_window"));
    }
}
