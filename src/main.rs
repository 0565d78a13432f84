//! # pomo
//!
//! A terminal pomodoro timer with a small kanban board for the tasks you work
//! on during each pomodoro.
//!
//! ## Usage
//!
//! ### Interactive Mode (TUI)
//!
//! ```bash
//! pomo
//! # or explicitly
//! pomo ui
//! ```
//!
//! #### TUI Key Bindings
//!
//! **Pomodoro**
//! *   `s`: Start a pomodoro (when idle or after a break)
//! *   `x`: Cancel the running pomodoro or break
//! *   `b`: Complete the pomodoro and start a break
//!
//! **Board**
//! *   `n`: New task in the focused column
//! *   `e` / `Enter`: Edit the selected task
//! *   `d` / `Delete`: Delete the selected task
//! *   Arrows / `hjkl`: Select
//! *   Shift+arrows / `HJKL`: Move the selected task
//! *   `?`: Toggle help
//! *   `q`: Quit
//!
//! ### Command Line Interface (CLI)
//!
//! ```bash
//! # Pomodoros completed today
//! pomo history
//!
//! # ... and over the last week
//! pomo history --days 7
//! ```
//!
//! ## Data Storage
//!
//! Everything lives in `~/.pomo` as JSON files:
//! *   `config.json`: durations and daily goal
//! *   `current.json`: the session in progress
//! *   `history/`: one file per completed pomodoro
//!
//! You can override the location with `--data-dir` or the `POMO_DIR`
//! environment variable. Logs go to `pomo.log` in the same directory;
//! set `POMO_LOG` (e.g. `POMO_LOG=debug`) to change the level.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Mutex;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::EnvFilter;

use pomo::commands::cmd_history;
use pomo::config::{data_dir, Config, DATA_DIR_ENV};
use pomo::storage::FileStore;
use pomo::tui::run_tui;

const LOG_FILE: &str = "pomo.log";
const LOG_ENV: &str = "POMO_LOG";

#[derive(Parser)]
#[command(name = "pomo")]
#[command(about = "Pomodoro timer with a kanban board", long_about = None)]
struct Cli {
    /// Directory holding the configuration, current session and history
    #[arg(long, global = true, env = DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open interactive TUI
    Ui,
    /// List completed pomodoros
    History {
        /// Number of days to show, today included
        #[arg(short, long, default_value_t = 1)]
        days: u32,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "pomo", &mut io::stdout());
        return;
    }

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let dir = data_dir(cli.data_dir).context("locating data directory")?;
    fs::create_dir_all(&dir)
        .with_context(|| format!("creating data directory {}", dir.display()))?;
    init_logging(&dir)?;

    let config = Config::load(&dir).context("loading configuration")?;
    let store = FileStore::new(&dir).context("opening store")?;

    match cli.command {
        Some(Commands::History { days }) => {
            cmd_history(&store, days).context("reading history")?
        }
        Some(Commands::Ui) | None => run_tui(store, config).context("running TUI")?,
        Some(Commands::Completions { .. }) => {}
    }
    Ok(())
}

/// Sends tracing output to the log file; the terminal belongs to the TUI.
fn init_logging(dir: &Path) -> anyhow::Result<()> {
    let path = dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
