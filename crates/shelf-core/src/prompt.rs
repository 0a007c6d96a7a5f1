//! User interaction seam. The core never reads stdin itself; the CLI supplies a
//! console implementation and tests supply [`ScriptedPrompter`].

use std::collections::VecDeque;

/// A numbered choice shown to the user. Option `0` is always the escape
/// (`skip_label`); options are numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub question: String,
    pub options: Vec<String>,
    pub skip_label: String,
}

impl PromptRequest {
    pub fn new(question: impl Into<String>, options: Vec<String>, skip_label: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            options,
            skip_label: skip_label.into(),
        }
    }
}

pub trait Prompter {
    /// Returns the zero-based index of the chosen option, or `None` when the
    /// user picked the escape option.
    fn choose(&mut self, request: &PromptRequest) -> Option<usize>;

    /// Yes/no question. Declining is the safe answer.
    fn confirm(&mut self, question: &str) -> bool;

    fn is_interactive(&self) -> bool {
        true
    }
}

/// Batch mode: every choice is skipped, every confirmation declined.
#[derive(Debug, Default, Clone, Copy)]
pub struct NonInteractive;

impl Prompter for NonInteractive {
    fn choose(&mut self, request: &PromptRequest) -> Option<usize> {
        tracing::debug!(question = %request.question, "non-interactive: skipping choice");
        None
    }

    fn confirm(&mut self, question: &str) -> bool {
        tracing::debug!(question, "non-interactive: declining");
        false
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Replays canned answers, recording every question asked.
///
/// Choice answers use the on-screen numbering: `0` is the escape option and
/// `n` selects the n-th listed option. Running out of answers behaves like
/// [`NonInteractive`].
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    choices: VecDeque<usize>,
    confirmations: VecDeque<bool>,
    pub asked: Vec<PromptRequest>,
    pub confirmed: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(choices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            choices: choices.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn with_confirmations(mut self, answers: impl IntoIterator<Item = bool>) -> Self {
        self.confirmations = answers.into_iter().collect();
        self
    }
}

impl Prompter for ScriptedPrompter {
    fn choose(&mut self, request: &PromptRequest) -> Option<usize> {
        self.asked.push(request.clone());
        match self.choices.pop_front() {
            Some(n) if n >= 1 && n <= request.options.len() => Some(n - 1),
            _ => None,
        }
    }

    fn confirm(&mut self, question: &str) -> bool {
        self.confirmed.push(question.to_string());
        self.confirmations.pop_front().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PromptRequest {
        PromptRequest::new(
            "Multiple matches for 'The Office'",
            vec!["The Office (2001)".into(), "The Office (2005)".into()],
            "Keep original",
        )
    }

    #[test]
    fn test_non_interactive_skips() {
        let mut p = NonInteractive;
        assert_eq!(p.choose(&request()), None);
        assert!(!p.confirm("Overwrite?"));
        assert!(!p.is_interactive());
    }

    #[test]
    fn test_scripted_uses_screen_numbering() {
        let mut p = ScriptedPrompter::new([2, 0, 7]).with_confirmations([true]);
        assert_eq!(p.choose(&request()), Some(1));
        assert_eq!(p.choose(&request()), None);
        assert_eq!(p.choose(&request()), None, "out of range answers skip");
        assert_eq!(p.choose(&request()), None, "exhausted script skips");
        assert_eq!(p.asked.len(), 4);

        assert!(p.confirm("Overwrite?"));
        assert!(!p.confirm("Overwrite again?"));
        assert_eq!(p.confirmed.len(), 2);
    }
}
