//! Streaming Random Indexing: word vectors from raw text without a
//! vocabulary-sized co-occurrence matrix.

pub mod tokenizer;
pub use tokenizer::{is_word_char, Tokenizer};

pub mod accumulator;
pub use accumulator::Accumulator;

pub mod space;
pub use space::{DenseSpace, VectorSpace};

pub mod pipeline;
pub use pipeline::{index_file, Pipeline, PipelineError, RunReport};

pub use rindex_cluster::{Clusterer, Clustering, KMeans};
pub use rindex_types::RindexConfig;
