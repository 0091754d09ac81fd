//! Interactive prompt for the cost center name.

use std::io::{self, IsTerminal};

use console::Term;

/// Source of an interactive override for the cost center name.
pub trait NamePrompt {
    /// Whether a person is at the terminal to answer.
    fn is_attended(&self) -> bool;

    /// Ask once for a name, showing `default` as the fallback.
    ///
    /// Returns the raw answer; an empty answer means "use the default".
    fn ask(&mut self, default: &str) -> io::Result<String>;
}

/// Prompt on the controlling terminal via stderr, leaving stdout for output.
pub struct TerminalPrompt {
    term: Term,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl NamePrompt for TerminalPrompt {
    fn is_attended(&self) -> bool {
        console::user_attended_stderr() && io::stdin().is_terminal()
    }

    fn ask(&mut self, default: &str) -> io::Result<String> {
        self.term.write_str(&format!("Cost center name [{}]: ", default))?;
        self.term.read_line()
    }
}

/// A prompt that never asks. Used for dry runs and `--no-prompt`.
pub struct NoPrompt;

impl NamePrompt for NoPrompt {
    fn is_attended(&self) -> bool {
        false
    }

    fn ask(&mut self, _default: &str) -> io::Result<String> {
        Ok(String::new())
    }
}
