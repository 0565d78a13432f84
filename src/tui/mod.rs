pub mod app;
pub mod board;
pub mod editor;
pub mod prompt;
pub mod ui;

use std::{io, panic, time::Duration};

use crossterm::{
    cursor::Show,
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::info;

use crate::config::Config;
use crate::error::PomoError;
use crate::notify::notifier_from_env;
use crate::storage::Store;
use app::{App, Clock, Msg};
use ui::ui;

/// How long to block on input when nothing is scheduled.
const IDLE_POLL: Duration = Duration::from_secs(1);

pub fn run_tui<S: Store>(store: S, config: Config) -> Result<(), PomoError> {
    let mut app = App::new(store, config, notifier_from_env(), Clock::now());

    // Setup terminal
    install_panic_hook();
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    info!("interactive session started");
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    info!("interactive session ended");

    Ok(res?)
}

fn run_app<B: Backend, S: Store>(terminal: &mut Terminal<B>, app: &mut App<S>) -> io::Result<()> {
    while !app.should_quit() {
        terminal.draw(|f| ui(f, app))?;

        let clock = Clock::now();
        let timeout = app.scheduler().timeout(clock.mono, IDLE_POLL);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                app.update(Msg::Key(key), Clock::now());
            }
        }

        let clock = Clock::now();
        while let Some(msg) = app.pop_due(clock.mono) {
            app.update(msg, clock);
        }
    }
    Ok(())
}

/// Puts the terminal back before the panic message is printed.
fn install_panic_hook() {
    let previous_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
        previous_hook(panic_info);
    }));
}
