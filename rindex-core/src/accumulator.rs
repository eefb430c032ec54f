use rindex_embed::ProjectionCache;
use rindex_types::Token;
use rindex_window::ContextWindow;

use crate::VectorSpace;

/// Random Indexing accumulator.
///
/// Before each new token enters the window, the center word's vector gets
/// the projection of every adjacent pair `(last, current)` in the window,
/// except pairs whose `current` equals the center. `last` follows the
/// window position on every step, including skipped ones.
#[derive(Debug)]
pub struct Accumulator {
    window: ContextWindow,
    cache: ProjectionCache,
    space: VectorSpace,
}

impl Accumulator {
    pub fn new(window: usize, dimension: usize, trit_denominator: u32) -> Self {
        Self {
            window: ContextWindow::new(window),
            cache: ProjectionCache::new(dimension, trit_denominator),
            space: VectorSpace::new(dimension),
        }
    }

    /// Update the current center, then push `token` into the window.
    pub fn observe(&mut self, token: Token) {
        self.update_center();
        self.window.push(token);
    }

    fn update_center(&mut self) {
        let center = self.window.center();
        let target = self.space.entry(center);

        let mut last = self.window.item(0);
        for i in 1..self.window.capacity() {
            let current = self.window.item(i);
            if current != center {
                let projection = self.cache.lookup_pair(last, current);
                for (acc, &t) in target.iter_mut().zip(projection) {
                    *acc += i64::from(t);
                }
            }
            last = current;
        }
    }

    pub fn window(&self) -> &ContextWindow {
        &self.window
    }

    pub fn cache(&self) -> &ProjectionCache {
        &self.cache
    }

    pub fn space(&self) -> &VectorSpace {
        &self.space
    }

    pub fn into_space(self) -> VectorSpace {
        self.space
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashSet, VecDeque};

    use rindex_types::WordVector;

    use super::*;

    const DIM: usize = 64;

    fn run(window: usize, tokens: &[&str]) -> Accumulator {
        let mut acc = Accumulator::new(window, DIM, 6);
        for t in tokens {
            acc.observe(t.to_string());
        }
        acc
    }

    fn sum_of(keys: &[&str]) -> WordVector {
        let mut cache = ProjectionCache::new(DIM, 6);
        let mut out = vec![0i64; DIM];
        for key in keys {
            for (o, &t) in out.iter_mut().zip(cache.lookup(key)) {
                *o += i64::from(t);
            }
        }
        out
    }

    #[test]
    fn center_vector_matches_hand_computed_pairs() {
        let acc = run(5, &["a", "b", "c", "d", "e", "f"]);
        let space = acc.space();

        // window [a b c d e], center c: pairs ab, (c skipped), cd, de
        assert_eq!(space.get("c").unwrap(), &sum_of(&["ab", "cd", "de"]));
        // window ["" a b c d], center b: pairs "a", (b skipped), bc, cd
        assert_eq!(space.get("b").unwrap(), &sum_of(&["a", "bc", "cd"]));
        // window ["" "" a b c], center a: pairs "", (a skipped), ab, bc
        assert_eq!(space.get("a").unwrap(), &sum_of(&["", "ab", "bc"]));
        // d, e and f never reached the center
        assert!(space.get("d").is_none());
        assert!(space.get("f").is_none());
    }

    #[test]
    fn warm_up_center_is_the_empty_token() {
        // Preserved warm-up behavior: the padding token is embedded too.
        let acc = run(5, &["a", "b", "c"]);
        let space = acc.space();
        assert_eq!(space.len(), 1);
        // step 1 contributes nothing (every slot equals the center),
        // step 2 adds "a", step 3 adds "a" and "ab"
        assert_eq!(space.get("").unwrap(), &sum_of(&["a", "a", "ab"]));
    }

    #[test]
    fn repeated_center_word_is_skipped_everywhere() {
        let acc = run(3, &["x", "x", "x", "x"]);
        // whenever x is the center, every slot after the oldest is x too
        assert!(acc.space().get("x").unwrap().iter().all(|&v| v == 0));
        assert_eq!(acc.space().get("").unwrap(), &sum_of(&["x"]));
    }

    fn expected_keys(window: usize, tokens: &[&str]) -> HashSet<String> {
        let mut slots: VecDeque<String> = std::iter::repeat(String::new()).take(window).collect();
        let mut keys = HashSet::new();
        for t in tokens {
            let center = slots[window / 2].clone();
            for i in 1..window {
                if slots[i] != center {
                    keys.insert(format!("{}{}", slots[i - 1], slots[i]));
                }
            }
            slots.pop_front();
            slots.push_back(t.to_string());
        }
        keys
    }

    #[test]
    fn cache_holds_exactly_the_distinct_pair_keys() {
        let tokens: Vec<&str> = "the cat sat on the mat and the dog sat on the cat"
            .split(' ')
            .collect();
        let acc = run(5, &tokens);
        let expected = expected_keys(5, &tokens);
        assert_eq!(acc.cache().len(), expected.len());

        let mut again = acc;
        for t in &tokens {
            again.observe(t.to_string());
        }
        // replaying the text only adds keys it has not produced before
        let replay: Vec<&str> = tokens.iter().chain(tokens.iter()).copied().collect();
        assert_eq!(again.cache().len(), expected_keys(5, &replay).len());
        assert!(again.cache().hits() > 0);
    }

    #[test]
    fn six_token_run_builds_six_keys() {
        let acc = run(5, &["a", "b", "c", "d", "e", "f"]);
        // "", a, ab, bc, cd, de
        assert_eq!(acc.cache().len(), 6);
    }
}
