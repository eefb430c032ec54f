use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use rindex_cluster::KMeans;
use rindex_core::{Pipeline, RunReport};
use rindex_embed::{key_hash, ProjectionCache};
use rindex_types::{Distance, ReadErrorPolicy, RindexConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rindex", about = "Random Indexing word vectors from plain text")]
struct Cli {
    #[command(flatten)]
    overrides: Overrides,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Overrides {
    /// YAML config file; flags below take precedence over it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    window: Option<usize>,
    #[arg(long, global = true)]
    dimension: Option<usize>,
    #[arg(long, global = true)]
    clusters: Option<usize>,
    #[arg(long, global = true)]
    iterations: Option<usize>,
    #[arg(long, global = true)]
    distance: Option<Distance>,
    #[arg(long, global = true)]
    seed: Option<u64>,
    #[arg(long, global = true)]
    on_read_error: Option<ReadErrorPolicy>,
}

#[derive(Subcommand)]
enum Command {
    /// Index a text file and cluster the resulting vectors.
    Build {
        input: PathBuf,
        #[arg(long)]
        no_cluster: bool,
    },
    /// Index a text file and list the words closest to `word`.
    Neighbors {
        input: PathBuf,
        #[arg(long)]
        word: String,
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Show the projection vector derived for a pair-key.
    Lookup { key: String },
}

impl Overrides {
    fn resolve(&self) -> anyhow::Result<RindexConfig> {
        let mut cfg = match &self.config {
            Some(path) => RindexConfig::from_path(path)?,
            None => RindexConfig::default(),
        };
        if let Some(v) = self.window {
            cfg.window = v;
        }
        if let Some(v) = self.dimension {
            cfg.dimension = v;
        }
        if let Some(v) = self.clusters {
            cfg.clusters = v;
        }
        if let Some(v) = self.iterations {
            cfg.iterations = v;
        }
        if let Some(v) = self.distance {
            cfg.distance = v;
        }
        if let Some(v) = self.seed {
            cfg.cluster_seed = v;
        }
        if let Some(v) = self.on_read_error {
            cfg.on_read_error = v;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn index(cfg: RindexConfig, input: &Path, cluster: bool) -> anyhow::Result<RunReport> {
    let mut pipeline = Pipeline::new(cfg, Arc::new(KMeans::new()))?;
    pipeline.ingest_path(input)?;
    let report = if cluster {
        pipeline.finish()?
    } else {
        pipeline.finish_without_clustering()
    };
    Ok(report)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = cli.overrides.resolve()?;
    info!(
        window = cfg.window,
        dimension = cfg.dimension,
        clusters = cfg.clusters,
        iterations = cfg.iterations,
        distance = %cfg.distance,
        on_read_error = %cfg.on_read_error,
        "config resolved"
    );

    match cli.command {
        Command::Build { input, no_cluster } => {
            let report = index(cfg, &input, !no_cluster)?;
            println!("count={}", report.words_processed);
            println!("distinct_words={}", report.distinct_words);
            println!("cache_entries={}", report.cache_entries);
            println!("fingerprint={}", report.fingerprint);
            if let Some(clustering) = &report.clustering {
                let sizes = clustering.sizes();
                let largest = sizes.iter().copied().max().unwrap_or(0);
                let empty = sizes.iter().filter(|&&s| s == 0).count();
                println!(
                    "clusters={} iterations={} converged={} largest={} empty={}",
                    clustering.num_clusters(),
                    clustering.iterations,
                    clustering.converged,
                    largest,
                    empty
                );
            }
        }
        Command::Neighbors { input, word, top } => {
            let report = index(cfg, &input, false)?;
            let word = word.to_lowercase();
            let Some(ranked) = report.space.nearest(&word, top) else {
                anyhow::bail!("'{word}' never occupied the center of the window");
            };
            for (w, score) in ranked {
                println!("{score:.4}\t{w}");
            }
        }
        Command::Lookup { key } => {
            let mut cache = ProjectionCache::new(cfg.dimension, cfg.trit_denominator);
            println!("hash={:#018x}", key_hash(&key));
            let nonzero: Vec<String> = cache
                .lookup(&key)
                .iter()
                .enumerate()
                .filter(|&(_, &t)| t != 0)
                .map(|(i, &t)| format!("{i}:{t:+}"))
                .collect();
            println!("nonzero={}", nonzero.len());
            println!("{}", nonzero.join(" "));
        }
    }

    Ok(())
}
