//! In-place terminal redraw for the watch views.

use console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while waiting for the first snapshot.
pub fn connect_spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .expect("progress bar template is a valid static string"),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Redraws a block of rendered lines in place, so repeated poll refreshes
/// update the view instead of scrolling it away.
pub struct WatchScreen {
    term: Term,
    drawn: usize,
}

impl WatchScreen {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
            drawn: 0,
        }
    }

    /// Replace the previously drawn block with `body`. Falls back to plain
    /// printing when the terminal refuses cursor movement.
    pub fn draw(&mut self, body: &str) {
        if self.term.clear_last_lines(self.drawn).is_err() {
            println!("{}", body);
            self.drawn = 0;
            return;
        }
        if self.term.write_line(body).is_err() {
            println!("{}", body);
        }
        self.drawn = body.lines().count();
    }
}

impl Default for WatchScreen {
    fn default() -> Self {
        Self::new()
    }
}
