//! C11: command-line entry point flags.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "winmux")]
#[command(about = "A terminal-based window manager for PTY sessions")]
#[command(version)]
pub struct Cli {
    /// Shell binary to launch in each window. Defaults to `$SHELL`, then `/bin/sh`.
    #[arg(long)]
    pub shell: Option<String>,

    /// Number of workspaces to create. Overrides the config value.
    #[arg(long)]
    pub workspaces: Option<u8>,

    /// Path to a TOML config file. Defaults to the platform config dir.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the resolved keybind table and exit without starting the UI.
    #[arg(long)]
    pub print_keys: bool,
}

impl Cli {
    /// Resolves the shell to launch: `--shell`, else `$SHELL`, else `/bin/sh`.
    pub fn resolve_shell(&self) -> String {
        self.shell
            .clone()
            .or_else(|| std::env::var("SHELL").ok())
            .unwrap_or_else(|| "/bin/sh".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_shell_prefers_explicit_flag() {
        let cli = Cli { shell: Some("/bin/zsh".to_string()), workspaces: None, config: None, print_keys: false };
        assert_eq!(cli.resolve_shell(), "/bin/zsh");
    }

    #[test]
    fn resolve_shell_without_explicit_flag_falls_back_to_shell_env_or_sh() {
        let cli = Cli { shell: None, workspaces: None, config: None, print_keys: false };
        let resolved = cli.resolve_shell();
        assert!(!resolved.is_empty());
    }
}
