use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rindex_cluster::{ClusterError, ClusterParams, Clusterer, Clustering};
use rindex_types::{ConfigError, ReadErrorPolicy, RindexConfig};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{Accumulator, DenseSpace, Tokenizer, VectorSpace};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The input failed mid-stream; earlier tokens are still accumulated.
    #[error("stream read failed after {words_processed} words: {source}")]
    StreamRead {
        words_processed: usize,
        #[source]
        source: io::Error,
    },
    #[error("clustering failed: {0}")]
    Cluster(#[from] ClusterError),
}

/// Outcome of one indexing run.
#[derive(Clone, Debug)]
pub struct RunReport {
    pub words_processed: usize,
    pub distinct_words: usize,
    pub cache_entries: usize,
    pub fingerprint: String,
    pub space: DenseSpace,
    /// `None` when clustering was skipped.
    pub clustering: Option<Clustering>,
}

/// Drives tokenization, accumulation and the final clustering hand-off.
///
/// The window, projection cache and vector space live exactly as long as
/// the pipeline; independent pipelines share nothing.
pub struct Pipeline {
    config: RindexConfig,
    tokenizer: Tokenizer,
    accumulator: Accumulator,
    words_processed: usize,
    clusterer: Arc<dyn Clusterer>,
}

impl Pipeline {
    pub fn new(config: RindexConfig, clusterer: Arc<dyn Clusterer>) -> Result<Self, PipelineError> {
        config.validate()?;
        debug!(
            window = config.window,
            dimension = config.dimension,
            trit_denominator = config.trit_denominator,
            "pipeline created"
        );
        let accumulator =
            Accumulator::new(config.window, config.dimension, config.trit_denominator);
        Ok(Self {
            config,
            tokenizer: Tokenizer::new(),
            accumulator,
            words_processed: 0,
            clusterer,
        })
    }

    pub fn config(&self) -> &RindexConfig {
        &self.config
    }

    pub fn words_processed(&self) -> usize {
        self.words_processed
    }

    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    pub fn vector_space(&self) -> &VectorSpace {
        self.accumulator.space()
    }

    pub fn feed_char(&mut self, c: char) {
        if let Some(token) = self.tokenizer.push(c) {
            self.accumulator.observe(token);
            self.words_processed += 1;
        }
    }

    pub fn feed_str(&mut self, text: &str) {
        for c in text.chars() {
            self.feed_char(c);
        }
    }

    /// Read `reader` to the end, returning the number of tokens it completed.
    ///
    /// Input is consumed in buffer-sized chunks; a UTF-8 sequence split
    /// across chunks is carried over. Invalid bytes decode to U+FFFD. The
    /// end of the reader is the end of a stream: an unterminated last word
    /// is dropped and never joins the next call's first word.
    ///
    /// What happens on a read failure depends on the configured
    /// [`ReadErrorPolicy`]. Either way every complete character read before
    /// the failure has been accumulated.
    pub fn ingest<R: BufRead>(&mut self, mut reader: R) -> Result<usize, PipelineError> {
        let start = self.words_processed;
        let mut tail: Vec<u8> = Vec::new();
        loop {
            let read = reader.fill_buf().map(|chunk| {
                tail.extend_from_slice(chunk);
                chunk.len()
            });
            match read {
                Ok(0) => {
                    if !tail.is_empty() {
                        // truncated sequence at end of input
                        self.feed_str(&String::from_utf8_lossy(&tail));
                    }
                    break;
                }
                Ok(n) => {
                    reader.consume(n);
                    self.feed_utf8(&mut tail);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(source) => {
                    self.end_stream();
                    match self.config.on_read_error {
                        ReadErrorPolicy::Halt => {
                            warn!(
                                error = %source,
                                words_processed = self.words_processed,
                                "read failed, halting with accumulated vectors"
                            );
                            break;
                        }
                        ReadErrorPolicy::Fail => {
                            return Err(PipelineError::StreamRead {
                                words_processed: self.words_processed,
                                source,
                            });
                        }
                    }
                }
            }
        }
        self.end_stream();
        Ok(self.words_processed - start)
    }

    /// Feed the valid prefix of `buf`, leaving an incomplete trailing
    /// sequence in place.
    fn feed_utf8(&mut self, buf: &mut Vec<u8>) {
        let mut pos = 0;
        while pos < buf.len() {
            match std::str::from_utf8(&buf[pos..]) {
                Ok(text) => {
                    self.feed_str(text);
                    pos = buf.len();
                }
                Err(e) => {
                    let valid = pos + e.valid_up_to();
                    if let Ok(text) = std::str::from_utf8(&buf[pos..valid]) {
                        self.feed_str(text);
                    }
                    match e.error_len() {
                        Some(len) => {
                            self.feed_char(char::REPLACEMENT_CHARACTER);
                            pos = valid + len;
                        }
                        None => {
                            pos = valid;
                            break;
                        }
                    }
                }
            }
        }
        buf.drain(..pos);
    }

    fn end_stream(&mut self) {
        if let Some(dropped) = self.tokenizer.discard_pending() {
            debug!(token = %dropped, "discarding unterminated trailing token");
        }
    }

    pub fn ingest_path(&mut self, path: impl AsRef<Path>) -> Result<usize, PipelineError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| PipelineError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        self.ingest(BufReader::new(file))
    }

    /// End the stream and cluster the finalized vectors.
    pub fn finish(self) -> Result<RunReport, PipelineError> {
        let params = ClusterParams {
            k: self.config.clusters,
            distance: self.config.distance,
            iterations: self.config.iterations,
            seed: self.config.cluster_seed,
        };
        let clusterer = Arc::clone(&self.clusterer);
        let mut report = self.finish_without_clustering();
        let clustering = clusterer.cluster(&report.space.vectors, &params)?;
        info!(
            clusters = clustering.num_clusters(),
            iterations = clustering.iterations,
            converged = clustering.converged,
            "clustering hand-off complete"
        );
        report.clustering = Some(clustering);
        Ok(report)
    }

    /// End the stream without clustering.
    pub fn finish_without_clustering(mut self) -> RunReport {
        self.end_stream();
        let cache = self.accumulator.cache();
        let cache_entries = cache.len();
        debug!(hits = cache.hits(), misses = cache.misses(), "projection cache stats");

        let space = self.accumulator.into_space();
        let report = RunReport {
            words_processed: self.words_processed,
            distinct_words: space.len(),
            cache_entries,
            fingerprint: space.fingerprint(),
            space: space.finalize(),
            clustering: None,
        };
        info!(
            count = report.words_processed,
            distinct_words = report.distinct_words,
            cache_entries = report.cache_entries,
            "indexing finished"
        );
        report
    }
}

/// Index one file and cluster the result.
pub fn index_file(
    path: impl AsRef<Path>,
    config: RindexConfig,
    clusterer: Arc<dyn Clusterer>,
) -> Result<RunReport, PipelineError> {
    let mut pipeline = Pipeline::new(config, clusterer)?;
    pipeline.ingest_path(path)?;
    pipeline.finish()
}
