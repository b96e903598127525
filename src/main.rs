use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use weaklabel::backend::word2vec::Similarity;
use weaklabel::config::Config;
use weaklabel::data::paths::{check_path_component, resolve_dataset, DEFAULT_GRANULARITY};
use weaklabel::data::seeds::SeedWords;
use weaklabel::embedding::train::{NegativeSamplingTrainer, DEFAULT_CLI_HYPER};
use weaklabel::hyper::HyperParams;
use weaklabel::output::terminal;
use weaklabel::pipeline::word2vec::Word2VecRequest;
use weaklabel::pipeline::{self, RunRequest};
use weaklabel::text::Tokenizer;

/// weaklabel: label documents from a handful of seed words per class.
///
/// Each run scores every document against every label's seed words,
/// stores the winning label as a new column, and logs macro/micro F1
/// against the ground truth.
#[derive(Parser)]
#[command(name = "weaklabel", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Label documents by the TF-IDF weight of each label's seed words
    Tfidf {
        /// Dataset to label (NYT, TWENTY_NEWS, or a directory name)
        #[arg(long)]
        set: String,

        /// Label granularity (default: coarse)
        #[arg(long, default_value = DEFAULT_GRANULARITY)]
        gran: String,

        /// Vectorizer hyperparameters as name=value pairs
        #[arg(long, num_args = 0..)]
        hyper: Vec<String>,
    },

    /// Label documents by similarity between word2vec embeddings
    W2v {
        /// Dataset to label (NYT, TWENTY_NEWS, or a directory name)
        #[arg(long)]
        set: String,

        /// Label granularity (default: coarse)
        #[arg(long, default_value = DEFAULT_GRANULARITY)]
        gran: String,

        /// Score cleaned text (lowercased, punctuation stripped)
        #[arg(long)]
        clean: bool,

        /// Tokenizer: tokenize, word_tokenize or split
        #[arg(long, default_value = "tokenize")]
        token: String,

        /// Similarity: cosine_sim, dot_sim or euclidean_sim
        #[arg(long, default_value = "cosine_sim")]
        sim: String,

        /// Training hyperparameters as name=value pairs
        /// (default: epochs=40 window=20 workers=4; pass `--hyper` alone
        /// for the trainer's own defaults)
        #[arg(long, num_args = 0..)]
        hyper: Option<Vec<String>>,
    },

    /// Show the seed words of a dataset
    Seeds {
        /// Dataset (NYT, TWENTY_NEWS, or a directory name)
        #[arg(long)]
        set: String,

        /// Label granularity (default: coarse)
        #[arg(long, default_value = DEFAULT_GRANULARITY)]
        gran: String,
    },
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("weaklabel=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Tfidf { set, gran, hyper } => {
            let request = RunRequest::new(&set, &gran, HyperParams::parse(&hyper)?)?;
            info!(set = %request.set, granularity = %request.granularity, "Starting TF-IDF run");
            let report = pipeline::tfidf::run(&config, &request)?;
            terminal::display_run_report(&report);
        }

        Commands::W2v {
            set,
            gran,
            clean,
            token,
            sim,
            hyper,
        } => {
            let hyper = match hyper {
                Some(tokens) => HyperParams::parse(&tokens)?,
                None => HyperParams::parse(DEFAULT_CLI_HYPER)?,
            };
            let request = Word2VecRequest {
                run: RunRequest::new(&set, &gran, hyper)?,
                clean,
                tokenizer: token.parse::<Tokenizer>()?,
                similarity: sim.parse::<Similarity>()?,
            };
            info!(
                set = %request.run.set,
                granularity = %request.run.granularity,
                tokenizer = %request.tokenizer,
                "Starting Word2Vec run"
            );
            let report = pipeline::word2vec::run(&config, &request, &NegativeSamplingTrainer)?;
            terminal::display_run_report(&report);
        }

        Commands::Seeds { set, gran } => {
            let set = resolve_dataset(&set)?;
            check_path_component("granularity", &gran)?;
            let seeds = SeedWords::load(&config, &set, &gran)?;
            terminal::display_seed_words(&seeds);
            println!(
                "{}",
                format!("\nRun: weaklabel tfidf --set {set} --gran {gran}").dimmed()
            );
        }
    }

    Ok(())
}
