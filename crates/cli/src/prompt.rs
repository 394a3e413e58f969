use std::io::{self, BufRead, Write};

use maptoposter_core::prompt::Confirmer;

/// Asks questions on a terminal (or any reader/writer pair).
///
/// Read or write failures count as a declined question.
pub struct TerminalConfirmer<R, W> {
    input: R,
    output: W,
}

impl TerminalConfirmer<io::StdinLock<'static>, io::Stderr> {
    /// Read answers from stdin and ask on stderr, keeping stdout for
    /// command output.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalConfirmer<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, question: &str) -> Option<String> {
        write!(self.output, "{question} ").ok()?;
        self.output.flush().ok()?;

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

impl<R: BufRead, W: Write> Confirmer for TerminalConfirmer<R, W> {
    fn confirm(&mut self, message: &str) -> bool {
        self.ask(&format!("{message} [y/N]"))
            .is_some_and(|answer| matches!(answer.to_lowercase().as_str(), "y" | "yes"))
    }

    fn prompt(&mut self, message: &str, default: &str) -> Option<String> {
        let answer = self.ask(&format!("{message} [{default}]"))?;
        if answer.is_empty() {
            Some(default.to_string())
        } else {
            Some(answer)
        }
    }
}
