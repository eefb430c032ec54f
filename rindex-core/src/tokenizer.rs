use rindex_types::Token;

/// True for letters and the apostrophe.
pub fn is_word_char(c: char) -> bool {
    c.is_alphabetic() || c == '\''
}

/// Assembles lower-cased tokens one character at a time.
///
/// A token is completed by the first non-word character that follows it.
/// Text still pending when the input ends is never emitted.
#[derive(Debug, Default)]
pub struct Tokenizer {
    pending: String,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one character; returns the token it completes, if any.
    pub fn push(&mut self, c: char) -> Option<Token> {
        if is_word_char(c) {
            // Full Unicode lower-casing; one letter may become several chars.
            self.pending.extend(c.to_lowercase());
            None
        } else if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Drop the unfinished token, returning it.
    pub fn discard_pending(&mut self) -> Option<Token> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<Token> {
        let mut t = Tokenizer::new();
        text.chars().filter_map(|c| t.push(c)).collect()
    }

    #[test]
    fn splits_on_non_letters_and_lowercases() {
        assert_eq!(
            tokens("The cat's HAT, 42 times!\n"),
            vec!["the", "cat's", "hat", "times"]
        );
    }

    #[test]
    fn trailing_token_is_not_emitted() {
        let mut t = Tokenizer::new();
        let out: Vec<Token> = "one two".chars().filter_map(|c| t.push(c)).collect();
        assert_eq!(out, vec!["one"]);
        assert_eq!(t.pending(), "two");
        assert_eq!(t.discard_pending().as_deref(), Some("two"));
        assert_eq!(t.discard_pending(), None);
    }

    #[test]
    fn lowercasing_may_expand_a_letter() {
        assert_eq!(tokens("\u{130}stanbul "), vec!["i\u{307}stanbul"]);
    }

    #[test]
    fn runs_of_separators_yield_nothing() {
        assert!(tokens("  --  \t\n 123 ").is_empty());
    }

    #[test]
    fn non_ascii_letters_are_word_characters() {
        assert_eq!(tokens("Élan naïve\u{FFFD}"), vec!["élan", "naïve"]);
        assert!(!is_word_char('\u{FFFD}'));
        assert!(!is_word_char('-'));
    }
}
