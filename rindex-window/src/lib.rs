use rindex_types::Token;

/// Fixed-capacity ring buffer over the most recent tokens.
///
/// The write cursor always points at the oldest retained token, so offsets
/// passed to [`ContextWindow::item`] are relative to the oldest slot:
/// `item(0)` is the oldest, `item(capacity - 1)` the most recently pushed.
///
/// Unfilled slots hold the empty token. They take part in pair-keys and can
/// sit in the center slot like any other token during warm-up.
#[derive(Clone, Debug)]
pub struct ContextWindow {
    slots: Vec<Token>,
    cursor: usize,
    previous: usize,
}

impl ContextWindow {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "context window capacity must be > 0");
        Self {
            slots: vec![Token::new(); capacity],
            cursor: 0,
            previous: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Overwrite the oldest slot with `token` and advance the cursor.
    pub fn push(&mut self, token: Token) {
        self.slots[self.cursor] = token;
        self.previous = self.cursor;
        self.cursor = (self.cursor + 1) % self.slots.len();
    }

    /// Token at `offset` slots past the oldest one.
    ///
    /// `offset` must be below [`capacity`](Self::capacity).
    pub fn item(&self, offset: usize) -> &str {
        debug_assert!(offset < self.slots.len());
        &self.slots[(self.cursor + offset) % self.slots.len()]
    }

    /// The token just pushed; same as `item(capacity - 1)`.
    pub fn previous(&self) -> &str {
        &self.slots[self.previous]
    }

    /// The word the window currently gathers context for.
    pub fn center(&self) -> &str {
        self.item(self.slots.len() / 2)
    }

    /// Tokens from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        (0..self.slots.len()).map(move |i| self.item(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(capacity: usize, tokens: &[&str]) -> ContextWindow {
        let mut w = ContextWindow::new(capacity);
        for t in tokens {
            w.push(t.to_string());
        }
        w
    }

    #[test]
    fn starts_padded_with_empty_tokens() {
        let w = ContextWindow::new(5);
        assert!(w.iter().all(str::is_empty));
        assert_eq!(w.center(), "");
    }

    #[test]
    fn round_trip_in_push_order() {
        let w = filled(5, &["a", "b", "c", "d", "e"]);
        let got: Vec<&str> = w.iter().collect();
        assert_eq!(got, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(w.center(), "c");
        assert_eq!(w.previous(), "e");
    }

    #[test]
    fn push_evicts_oldest_and_advances_center() {
        let w = filled(5, &["a", "b", "c", "d", "e", "f"]);
        assert_eq!(w.item(0), "b");
        assert_eq!(w.item(4), "f");
        assert_eq!(w.center(), "d");
        assert_eq!(w.previous(), w.item(w.capacity() - 1));
    }

    #[test]
    fn partially_filled_window_keeps_newest_at_the_end() {
        let w = filled(5, &["a", "b"]);
        let got: Vec<&str> = w.iter().collect();
        assert_eq!(got, vec!["", "", "", "a", "b"]);
        assert_eq!(w.center(), "");
    }

    #[test]
    fn capacity_one_is_its_own_center() {
        let w = filled(1, &["x", "y"]);
        assert_eq!(w.center(), "y");
        assert_eq!(w.previous(), "y");
    }
}
