use crate::error::{Error, Result};
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout};

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Runs `f` on the alternate screen in raw mode and restores the terminal
/// afterwards, even when `f` fails.
pub fn with_terminal<T, F>(f: F) -> Result<T>
where
    F: FnOnce(&mut Tui) -> Result<T>,
{
    enable_raw_mode().map_err(|e| Error::Terminal(format!("Failed to enable raw mode: {}", e)))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)
        .map_err(|e| Error::Terminal(format!("Failed to enter alternate screen: {}", e)))?;

    let result = Terminal::new(CrosstermBackend::new(stdout))
        .map_err(|e| Error::Terminal(format!("Failed to initialize terminal: {}", e)))
        .and_then(|mut terminal| f(&mut terminal));

    disable_raw_mode().map_err(|e| Error::Terminal(format!("Failed to disable raw mode: {}", e)))?;
    execute!(io::stdout(), LeaveAlternateScreen)
        .map_err(|e| Error::Terminal(format!("Failed to leave alternate screen: {}", e)))?;

    result
}
