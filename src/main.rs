mod animation;
mod cli;
mod config;
mod geometry;
mod input;
mod kitty;
mod layout;
mod logging;
mod render;
mod scheduler;
mod session;
mod window;
mod workspace;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use crossterm::event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags};
use geometry::Rect;
use scheduler::{EventHandler, Scheduler};
use std::io::Write;
use std::time::Duration;

const TICK_NORMAL: Duration = Duration::from_millis(1000 / 60);
const CELL_SIZE_PROBE_TIMEOUT: Duration = Duration::from_millis(100);

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_keys {
        print_keys(&cli);
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    let result = runtime.block_on(async_main(cli));
    runtime.shutdown_timeout(Duration::from_millis(100));

    if let Err(ref e) = result {
        eprintln!("winmux: {e}");
    }
    result
}

fn print_keys(cli: &Cli) {
    let config = config::Config::load_or_default(cli.config.as_deref());
    let mut actions: Vec<(&String, &Vec<String>)> = config.keybinds.iter().collect();
    actions.sort_by_key(|(action, _)| action.as_str());
    for (action, keys) in actions {
        println!("{:<20} {}", action, keys.join(", "));
    }
}

async fn async_main(cli: Cli) -> Result<()> {
    let mut config = config::Config::load_or_default(cli.config.as_deref());
    if let Some(workspaces) = cli.workspaces {
        config.workspace_count = workspaces;
    }
    let shell = cli.resolve_shell();

    enter_terminal_ui_mode()?;
    let run_result = run_scheduler(config, shell).await;
    leave_terminal_ui_mode()?;

    run_result
}

async fn run_scheduler(config: config::Config, shell: String) -> Result<()> {
    let (cols, rows) = crossterm::terminal::size().context("reading terminal size")?;
    let viewport = Rect::new(0, 0, cols, rows);

    let mut scheduler = Scheduler::new(config, shell, viewport);
    let mut events = EventHandler::new(TICK_NORMAL);
    scheduler.run(&mut events).await
}

fn enter_terminal_ui_mode() -> Result<()> {
    crossterm::terminal::enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    crossterm::execute!(
        stdout,
        crossterm::terminal::EnterAlternateScreen,
        crossterm::event::EnableMouseCapture,
        crossterm::event::EnableBracketedPaste,
    )
    .context("entering alternate screen")?;

    // Best-effort: older terminals reject the keyboard enhancement push, in
    // which case we fall back to crossterm's default key disambiguation.
    let _ = crossterm::execute!(
        stdout,
        PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES | KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES
        )
    );

    probe_cell_pixel_size(&mut stdout);
    Ok(())
}

/// Probes `\e[14t` (pixel size) and `\e[16t` (cell size) with a short
/// timeout; a non-reply just means the fallback cell size in the kitty
/// module is used instead. Replies are swallowed here since the main
/// input loop is crossterm-event-based and would otherwise misparse them
/// as unknown escape sequences.
fn probe_cell_pixel_size(stdout: &mut std::io::Stdout) {
    let _ = stdout.write_all(b"\x1b[14t\x1b[16t");
    let _ = stdout.flush();
    std::thread::sleep(CELL_SIZE_PROBE_TIMEOUT);
    let _ = drain_pending_stdin();
}

fn drain_pending_stdin() -> Result<()> {
    while crossterm::event::poll(Duration::from_millis(0))? {
        let _ = crossterm::event::read()?;
    }
    Ok(())
}

fn leave_terminal_ui_mode() -> Result<()> {
    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(stdout, PopKeyboardEnhancementFlags);
    crossterm::execute!(
        stdout,
        crossterm::event::DisableBracketedPaste,
        crossterm::event::DisableMouseCapture,
        crossterm::terminal::LeaveAlternateScreen,
    )
    .context("leaving alternate screen")?;
    crossterm::terminal::disable_raw_mode().context("disabling raw mode")?;
    Ok(())
}
