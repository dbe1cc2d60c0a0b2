use std::fmt::Write as _;

use crate::llm::{Role, Turn};
use crate::locale::Locale;

/// Rounds of history kept in the prompt; one round is a user turn plus the
/// assistant turn that answered it.
pub const DEFAULT_HISTORY_LIMIT: usize = 5;

/// Renders a message and its history into a plain role-tagged prompt that
/// ends with an open assistant label.
#[derive(Clone, Debug)]
pub struct PromptBuilder {
    history_limit: usize,
    locale: Locale,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}

impl PromptBuilder {
    pub fn new(locale: Locale) -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            locale,
        }
    }

    pub fn with_history_limit(mut self, rounds: usize) -> Self {
        self.history_limit = rounds;
        self
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Most recent `history_limit * 2` entries; shorter histories pass through.
    pub fn window<'a>(&self, history: &'a [Turn]) -> &'a [Turn] {
        let keep = self.history_limit.saturating_mul(2);
        if history.len() > keep {
            &history[history.len() - keep..]
        } else {
            history
        }
    }

    pub fn build(&self, message: &str, history: &[Turn]) -> String {
        let sep = self.locale.separator();
        let user = self.locale.user_label();
        let assistant = self.locale.assistant_label();

        let mut prompt = String::new();
        for turn in self.window(history) {
            let label = match turn.role {
                Role::User => user,
                Role::Assistant => assistant,
                Role::Other(_) => continue,
            };
            let _ = writeln!(prompt, "{}{}{}", label, sep, turn.content);
        }
        let _ = write!(prompt, "{}{}{}\n{}{}", user, sep, message, assistant, sep);
        prompt
    }
}
