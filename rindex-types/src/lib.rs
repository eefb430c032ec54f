use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A lower-cased run of letters and apostrophes.
pub type Token = String;

/// One coordinate of a projection vector: -1, 0 or +1.
pub type Trit = i8;

/// Sparse ternary index vector derived from a pair-key.
pub type ProjectionVector = Vec<Trit>;

/// Integer accumulator for a single word.
pub type WordVector = Vec<i64>;

pub const DEFAULT_WINDOW: usize = 17;
pub const DEFAULT_DIMENSION: usize = 1024;
pub const DEFAULT_TRIT_DENOMINATOR: u32 = 6;
pub const DEFAULT_CLUSTERS: usize = 1000;
pub const DEFAULT_ITERATIONS: usize = 1;

/// Distance metric handed to the clustering stage.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distance {
    Euclidean,
    Manhattan,
}

impl Distance {
    pub fn between(self, a: &[f64], b: &[f64]) -> f64 {
        match self {
            Distance::Euclidean => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f64>()
                .sqrt(),
            Distance::Manhattan => a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum(),
        }
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distance::Euclidean => f.write_str("euclidean"),
            Distance::Manhattan => f.write_str("manhattan"),
        }
    }
}

impl FromStr for Distance {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "euclidean" => Ok(Distance::Euclidean),
            "manhattan" => Ok(Distance::Manhattan),
            other => Err(ConfigError::UnknownDistance(other.to_string())),
        }
    }
}

/// What to do when the character stream fails mid-read.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadErrorPolicy {
    /// Surface the failure to the caller.
    Fail,
    /// Stop reading and keep what was accumulated, as if the stream ended.
    Halt,
}

impl fmt::Display for ReadErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadErrorPolicy::Fail => f.write_str("fail"),
            ReadErrorPolicy::Halt => f.write_str("halt"),
        }
    }
}

impl FromStr for ReadErrorPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fail" => Ok(ReadErrorPolicy::Fail),
            "halt" => Ok(ReadErrorPolicy::Halt),
            other => Err(ConfigError::UnknownReadErrorPolicy(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config yaml: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("window must be odd and non-zero, got {0}")]
    InvalidWindow(usize),
    #[error("dimension must be > 0")]
    ZeroDimension,
    #[error("trit_denominator must be >= 2, got {0}")]
    InvalidTritDenominator(u32),
    #[error("clusters must be > 0")]
    ZeroClusters,
    #[error("iterations must be > 0")]
    ZeroIterations,
    #[error("unknown distance metric '{0}'")]
    UnknownDistance(String),
    #[error("unknown read error policy '{0}'")]
    UnknownReadErrorPolicy(String),
}

/// Tunable parameters for one indexing run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RindexConfig {
    /// Context window capacity; odd so the center slot is well defined.
    pub window: usize,
    /// Projection / word vector dimension.
    pub dimension: usize,
    /// Each coordinate is +1 or -1 with probability 1/denominator each.
    pub trit_denominator: u32,
    pub clusters: usize,
    /// Upper bound on clustering passes.
    pub iterations: usize,
    pub distance: Distance,
    /// Seed for choosing initial centroids.
    pub cluster_seed: u64,
    pub on_read_error: ReadErrorPolicy,
}

impl Default for RindexConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            dimension: DEFAULT_DIMENSION,
            trit_denominator: DEFAULT_TRIT_DENOMINATOR,
            clusters: DEFAULT_CLUSTERS,
            iterations: DEFAULT_ITERATIONS,
            distance: Distance::Manhattan,
            cluster_seed: 0,
            on_read_error: ReadErrorPolicy::Fail,
        }
    }
}

impl RindexConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let cfg: RindexConfig = serde_yaml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window == 0 || self.window % 2 == 0 {
            return Err(ConfigError::InvalidWindow(self.window));
        }
        if self.dimension == 0 {
            return Err(ConfigError::ZeroDimension);
        }
        if self.trit_denominator < 2 {
            return Err(ConfigError::InvalidTritDenominator(self.trit_denominator));
        }
        if self.clusters == 0 {
            return Err(ConfigError::ZeroClusters);
        }
        if self.iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = RindexConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.window, 17);
        assert_eq!(cfg.dimension, 1024);
        assert_eq!(cfg.distance, Distance::Manhattan);
    }

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let cfg = RindexConfig::from_yaml("window: 5\ndistance: euclidean\n").unwrap();
        assert_eq!(cfg.window, 5);
        assert_eq!(cfg.distance, Distance::Euclidean);
        assert_eq!(cfg.dimension, DEFAULT_DIMENSION);
        assert_eq!(cfg.on_read_error, ReadErrorPolicy::Fail);
    }

    #[test]
    fn even_window_is_rejected() {
        let err = RindexConfig::from_yaml("window: 4\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWindow(4)));
    }

    #[test]
    fn degenerate_denominator_is_rejected() {
        let cfg = RindexConfig {
            trit_denominator: 1,
            ..RindexConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidTritDenominator(1))
        ));
    }

    #[test]
    fn distance_parses_case_insensitively() {
        assert_eq!("Manhattan".parse::<Distance>().unwrap(), Distance::Manhattan);
        assert_eq!("EUCLIDEAN".parse::<Distance>().unwrap(), Distance::Euclidean);
        assert!("cosine".parse::<Distance>().is_err());
    }

    #[test]
    fn distances_match_hand_computation() {
        let a = [0.0, 0.0];
        let b = [3.0, -4.0];
        assert_eq!(Distance::Euclidean.between(&a, &b), 5.0);
        assert_eq!(Distance::Manhattan.between(&a, &b), 7.0);
    }
}
