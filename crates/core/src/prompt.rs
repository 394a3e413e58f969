//! Confirmation and prompt capability.
//!
//! Destructive preset actions ask before they run, and imports ask for a
//! mode. The question is put through [`Confirmer`] so the actions do not
//! depend on how the user is reached.

/// Asks the user yes/no questions and free-text questions.
pub trait Confirmer {
    /// Ask a yes/no question. `false` means declined.
    fn confirm(&mut self, message: &str) -> bool;

    /// Ask for a free-text answer, offering `default`. `None` means the
    /// user dismissed the question.
    fn prompt(&mut self, message: &str, default: &str) -> Option<String>;
}

impl<C: Confirmer + ?Sized> Confirmer for &mut C {
    fn confirm(&mut self, message: &str) -> bool {
        (**self).confirm(message)
    }

    fn prompt(&mut self, message: &str, default: &str) -> Option<String> {
        (**self).prompt(message, default)
    }
}

/// Answers every question the same way without asking.
///
/// Used for non-interactive runs (`--yes`, `--mode`).
#[derive(Debug, Clone, Default)]
pub struct FixedAnswers {
    pub confirm: bool,
    /// Answer to free-text prompts; `None` takes the offered default.
    pub answer: Option<String>,
}

impl FixedAnswers {
    pub fn yes() -> Self {
        Self {
            confirm: true,
            answer: None,
        }
    }

    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = Some(answer.into());
        self
    }
}

impl Confirmer for FixedAnswers {
    fn confirm(&mut self, _message: &str) -> bool {
        self.confirm
    }

    fn prompt(&mut self, _message: &str, default: &str) -> Option<String> {
        Some(self.answer.clone().unwrap_or_else(|| default.to_string()))
    }
}
