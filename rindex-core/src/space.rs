use std::cmp::Ordering;
use std::collections::HashMap;

use rindex_types::{Token, WordVector};
use sha2::{Digest, Sha256};

/// Word → accumulated integer vector, built up over one run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VectorSpace {
    dimension: usize,
    vectors: HashMap<Token, WordVector>,
}

impl VectorSpace {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: HashMap::new(),
        }
    }

    /// Vector for `word`, zero-initialized on first use.
    pub(crate) fn entry(&mut self, word: &str) -> &mut WordVector {
        let dimension = self.dimension;
        self.vectors
            .entry(word.to_owned())
            .or_insert_with(|| vec![0; dimension])
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn get(&self, word: &str) -> Option<&WordVector> {
        self.vectors.get(word)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Words in lexicographic order.
    pub fn sorted_words(&self) -> Vec<&str> {
        let mut words: Vec<&str> = self.vectors.keys().map(String::as_str).collect();
        words.sort_unstable();
        words
    }

    /// Convert to floating point, ordered by word.
    pub fn finalize(&self) -> DenseSpace {
        let words = self.sorted_words();
        let vectors = words
            .iter()
            .map(|w| self.vectors[*w].iter().map(|&x| x as f64).collect())
            .collect();
        DenseSpace {
            words: words.into_iter().map(str::to_owned).collect(),
            vectors,
        }
    }

    /// SHA-256 over every `(word, vector)` pair in word order, hex encoded.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for word in self.sorted_words() {
            hasher.update((word.len() as u64).to_le_bytes());
            hasher.update(word.as_bytes());
            for x in &self.vectors[word] {
                hasher.update(x.to_le_bytes());
            }
        }
        hex::encode(hasher.finalize())
    }
}

/// Finalized vectors handed to clustering; `vectors[i]` belongs to `words[i]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DenseSpace {
    pub words: Vec<Token>,
    pub vectors: Vec<Vec<f64>>,
}

impl DenseSpace {
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn index_of(&self, word: &str) -> Option<usize> {
        self.words
            .binary_search_by(|w| w.as_str().cmp(word))
            .ok()
    }

    pub fn vector(&self, word: &str) -> Option<&[f64]> {
        self.index_of(word).map(|i| self.vectors[i].as_slice())
    }

    /// The `n` words most similar to `word` by cosine, best first.
    ///
    /// Returns `None` if `word` is not in the space.
    pub fn nearest(&self, word: &str, n: usize) -> Option<Vec<(&str, f64)>> {
        let idx = self.index_of(word)?;
        let query = &self.vectors[idx];
        let mut scored: Vec<(&str, f64)> = self
            .words
            .iter()
            .zip(&self.vectors)
            .enumerate()
            .filter(|(i, _)| *i != idx)
            .map(|(_, (w, v))| (w.as_str(), cosine_similarity(query, v)))
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        scored.truncate(n);
        Some(scored)
    }
}

fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
