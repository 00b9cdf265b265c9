//! Human-readable progress output.
//!
//! Not a machine-readable contract; the final report is what scripts should
//! consume (see the binary's `--output json`).

pub mod theme;

use std::sync::{Arc, Mutex, PoisonError};

use colored::{Color, Colorize};

use theme::{ICONS, THEME};

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleOptions {
    pub quiet: bool,
    pub no_color: bool,
}

/// Progress printer shared by the tour and its background subscription.
#[derive(Clone)]
pub struct Console {
    options: ConsoleOptions,
    sink: Sink,
}

#[derive(Clone)]
enum Sink {
    Stdout,
    Capture(Arc<Mutex<Vec<String>>>),
}

impl Console {
    pub fn stdout(options: ConsoleOptions) -> Self {
        Self {
            options,
            sink: Sink::Stdout,
        }
    }

    /// Keeps uncoloured lines in memory instead of printing them.
    pub fn capture() -> Self {
        Self {
            options: ConsoleOptions {
                quiet: false,
                no_color: true,
            },
            sink: Sink::Capture(Arc::new(Mutex::new(Vec::new()))),
        }
    }

    /// Lines recorded by a capturing console.
    pub fn captured(&self) -> Vec<String> {
        match &self.sink {
            Sink::Stdout => Vec::new(),
            Sink::Capture(lines) => lines.lock().unwrap_or_else(PoisonError::into_inner).clone(),
        }
    }

    /// Section header, preceded by a blank line.
    pub fn step(&self, icon: &str, title: &str) {
        self.emit(String::new());
        let line = if self.options.no_color {
            format!("{icon} {title}")
        } else {
            format!("{icon} {}", title.color(THEME.highlight).bold())
        };
        self.emit(line);
    }

    pub fn success(&self, message: &str) {
        self.emit_marked(ICONS.success, message, THEME.success);
    }

    pub fn info(&self, message: &str) {
        self.emit_marked(ICONS.arrow, message, THEME.value);
    }

    pub fn event(&self, message: &str) {
        self.emit_marked(ICONS.live, message, THEME.secondary);
    }

    pub fn warning(&self, message: &str) {
        self.emit_marked(ICONS.warning, message, THEME.warning);
    }

    /// Errors are printed even in quiet mode, on stderr.
    pub fn error(&self, message: &str) {
        let line = if self.options.no_color {
            format!("{} {message}", ICONS.error)
        } else {
            format!("{} {}", ICONS.error.color(THEME.error), message.color(THEME.error))
        };
        match &self.sink {
            Sink::Stdout => eprintln!("{line}"),
            Sink::Capture(lines) => lines.lock().unwrap_or_else(PoisonError::into_inner).push(line),
        }
    }

    fn emit_marked(&self, icon: &str, message: &str, color: Color) {
        let line = if self.options.no_color {
            format!("{icon} {message}")
        } else {
            format!("{icon} {}", message.color(color))
        };
        self.emit(line);
    }

    fn emit(&self, line: String) {
        if self.options.quiet {
            return;
        }
        match &self.sink {
            Sink::Stdout => println!("{line}"),
            Sink::Capture(lines) => lines.lock().unwrap_or_else(PoisonError::into_inner).push(line),
        }
    }
}
