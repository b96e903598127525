// Word embedding training.
//
// The backend only needs "give me word vectors for this tokenized corpus";
// the EmbeddingTrainer trait is that seam. The built-in trainer is a
// single-threaded word2vec with negative sampling (skip-gram or CBOW),
// frequent-word subsampling, and a linearly decaying learning rate. It is
// seeded, so identical inputs always produce identical vectors.

use std::collections::HashMap;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::vectors::WordVectors;
use crate::hyper::{expect_f64, expect_usize, HyperParams};

/// Hyperparameter names accepted by the word2vec backend.
pub const WORD2VEC_PARAMS: &[&str] = &[
    "vector_size",
    "window",
    "min_count",
    "epochs",
    "workers",
    "sg",
    "negative",
    "alpha",
    "min_alpha",
    "sample",
    "seed",
];

/// Hyperparameters applied when the command line gives none.
pub const DEFAULT_CLI_HYPER: &[&str] = &["epochs=40", "window=20", "workers=4"];

/// Size of the precomputed negative-sampling table.
const NEGATIVE_TABLE_SIZE: usize = 1_000_000;

/// Validated word2vec configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Word2VecParams {
    pub vector_size: usize,
    pub window: usize,
    pub min_count: usize,
    pub epochs: usize,
    /// Recorded for the cache key; training itself is single-threaded
    pub workers: usize,
    pub skip_gram: bool,
    pub negative: usize,
    pub alpha: f64,
    pub min_alpha: f64,
    pub sample: f64,
    pub seed: u64,
}

impl Default for Word2VecParams {
    fn default() -> Self {
        Self {
            vector_size: 100,
            window: 5,
            min_count: 5,
            epochs: 5,
            workers: 3,
            skip_gram: false,
            negative: 5,
            alpha: 0.025,
            min_alpha: 0.0001,
            sample: 0.001,
            seed: 1,
        }
    }
}

impl Word2VecParams {
    /// Validate a parsed hyperparameter set. Unknown names are rejected.
    pub fn from_hyper(params: &HyperParams) -> Result<Self> {
        let mut out = Self::default();
        for (name, value) in params.iter() {
            match name {
                "vector_size" => out.vector_size = expect_usize(name, value)?,
                "window" => out.window = expect_usize(name, value)?,
                "min_count" => out.min_count = expect_usize(name, value)?,
                "epochs" => out.epochs = expect_usize(name, value)?,
                "workers" => out.workers = expect_usize(name, value)?,
                "sg" => {
                    out.skip_gram = match expect_usize(name, value)? {
                        0 => false,
                        1 => true,
                        other => anyhow::bail!("Hyperparameter `sg` must be 0 or 1, got `{other}`"),
                    }
                }
                "negative" => out.negative = expect_usize(name, value)?,
                "alpha" => out.alpha = expect_f64(name, value)?,
                "min_alpha" => out.min_alpha = expect_f64(name, value)?,
                "sample" => out.sample = expect_f64(name, value)?,
                "seed" => out.seed = expect_usize(name, value)? as u64,
                other => anyhow::bail!(
                    "Unknown Word2Vec hyperparameter `{other}`. Accepted: {}",
                    WORD2VEC_PARAMS.join(", ")
                ),
            }
        }
        out.validate()?;
        Ok(out)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("vector_size", self.vector_size),
            ("window", self.window),
            ("epochs", self.epochs),
            ("negative", self.negative),
        ] {
            if value == 0 {
                anyhow::bail!("Hyperparameter `{name}` must be at least 1");
            }
        }
        if self.alpha <= 0.0 || self.min_alpha < 0.0 || self.min_alpha > self.alpha {
            anyhow::bail!("Learning rates must satisfy 0 <= min_alpha <= alpha and alpha > 0");
        }
        if self.sample < 0.0 {
            anyhow::bail!("Hyperparameter `sample` must not be negative");
        }
        Ok(())
    }
}

/// Trains word vectors from a tokenized corpus.
pub trait EmbeddingTrainer {
    /// Train over `sentences`. `on_epoch` is called once after each epoch
    /// with the number of completed epochs.
    fn train(
        &self,
        sentences: &[Vec<String>],
        params: &Word2VecParams,
        on_epoch: &mut dyn FnMut(usize),
    ) -> Result<WordVectors>;
}

/// Built-in word2vec trainer using negative sampling.
#[derive(Debug, Clone, Copy, Default)]
pub struct NegativeSamplingTrainer;

struct Vocab {
    words: Vec<String>,
    counts: Vec<u64>,
    ids: HashMap<String, usize>,
}

fn build_vocab(sentences: &[Vec<String>], min_count: usize) -> Vocab {
    let mut raw: HashMap<&str, u64> = HashMap::new();
    for sentence in sentences {
        for token in sentence {
            *raw.entry(token.as_str()).or_insert(0) += 1;
        }
    }
    let mut kept: Vec<(&str, u64)> = raw
        .into_iter()
        .filter(|&(_, c)| c >= min_count as u64)
        .collect();
    // Most frequent first, alphabetical among equals, for a deterministic layout
    kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let words: Vec<String> = kept.iter().map(|(w, _)| (*w).to_string()).collect();
    let counts: Vec<u64> = kept.iter().map(|(_, c)| *c).collect();
    let ids = words.iter().enumerate().map(|(i, w)| (w.clone(), i)).collect();
    Vocab { words, counts, ids }
}

/// Unigram^0.75 table for drawing negative samples.
fn negative_table(counts: &[u64]) -> Vec<usize> {
    let powered: Vec<f64> = counts.iter().map(|&c| (c as f64).powf(0.75)).collect();
    let total: f64 = powered.iter().sum();
    let size = NEGATIVE_TABLE_SIZE.max(counts.len());
    let mut table = Vec::with_capacity(size);
    let mut word = 0;
    let mut cumulative = powered[0] / total;
    for i in 0..size {
        table.push(word);
        if (i as f64 + 1.0) / size as f64 > cumulative && word + 1 < counts.len() {
            word += 1;
            cumulative += powered[word] / total;
        }
    }
    table
}

/// Probability of keeping each word under frequent-word subsampling.
fn keep_probabilities(counts: &[u64], sample: f64) -> Vec<f64> {
    if sample <= 0.0 {
        return vec![1.0; counts.len()];
    }
    let total: u64 = counts.iter().sum();
    let threshold = sample * total as f64;
    counts
        .iter()
        .map(|&c| {
            let c = c as f64;
            (((c / threshold).sqrt() + 1.0) * (threshold / c)).min(1.0)
        })
        .collect()
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

impl EmbeddingTrainer for NegativeSamplingTrainer {
    fn train(
        &self,
        sentences: &[Vec<String>],
        params: &Word2VecParams,
        on_epoch: &mut dyn FnMut(usize),
    ) -> Result<WordVectors> {
        let vocab = build_vocab(sentences, params.min_count);
        if vocab.words.is_empty() {
            anyhow::bail!(
                "No token occurs at least min_count={} times; cannot train embeddings",
                params.min_count
            );
        }

        let dim = params.vector_size;
        let n_words = vocab.words.len();
        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut input: Vec<f32> = (0..n_words * dim)
            .map(|_| (rng.gen::<f32>() - 0.5) / dim as f32)
            .collect();
        let mut output: Vec<f32> = vec![0.0; n_words * dim];

        let table = negative_table(&vocab.counts);
        let keep = keep_probabilities(&vocab.counts, params.sample);
        let corpus_words: u64 = vocab.counts.iter().sum();
        let total_work = (corpus_words * params.epochs as u64).max(1) as f64;

        info!(
            vocabulary = n_words,
            dim,
            epochs = params.epochs,
            skip_gram = params.skip_gram,
            "Training word2vec"
        );
        if params.workers > 1 {
            debug!(workers = params.workers, "Ignoring workers; training is single-threaded");
        }

        let mut processed: u64 = 0;
        let mut l1 = vec![0.0f32; dim];
        let mut neu1e = vec![0.0f32; dim];

        for epoch in 0..params.epochs {
            for sentence in sentences {
                let in_vocab: Vec<usize> = sentence
                    .iter()
                    .filter_map(|t| vocab.ids.get(t).copied())
                    .collect();
                processed += in_vocab.len() as u64;
                let ids: Vec<usize> = in_vocab
                    .into_iter()
                    .filter(|&id| keep[id] >= 1.0 || rng.gen::<f64>() < keep[id])
                    .collect();

                let progress = processed as f64 / total_work;
                let alpha = (params.alpha - (params.alpha - params.min_alpha) * progress)
                    .max(params.min_alpha) as f32;

                for (pos, &center) in ids.iter().enumerate() {
                    let reduced = rng.gen_range(0..params.window);
                    let span = params.window - reduced;
                    let start = pos.saturating_sub(span);
                    let end = (pos + span + 1).min(ids.len());
                    let context: Vec<usize> = (start..end)
                        .filter(|&c| c != pos)
                        .map(|c| ids[c])
                        .collect();
                    if context.is_empty() {
                        continue;
                    }

                    if params.skip_gram {
                        for &ctx in &context {
                            l1.copy_from_slice(&input[ctx * dim..(ctx + 1) * dim]);
                            neu1e.fill(0.0);
                            train_pair(&l1, center, &mut output, &mut neu1e, &table, params.negative, alpha, dim, &mut rng);
                            for (w, e) in input[ctx * dim..(ctx + 1) * dim].iter_mut().zip(&neu1e) {
                                *w += e;
                            }
                        }
                    } else {
                        l1.fill(0.0);
                        for &ctx in &context {
                            for (acc, w) in l1.iter_mut().zip(&input[ctx * dim..(ctx + 1) * dim]) {
                                *acc += w;
                            }
                        }
                        let scale = 1.0 / context.len() as f32;
                        l1.iter_mut().for_each(|v| *v *= scale);
                        neu1e.fill(0.0);
                        train_pair(&l1, center, &mut output, &mut neu1e, &table, params.negative, alpha, dim, &mut rng);
                        for &ctx in &context {
                            for (w, e) in input[ctx * dim..(ctx + 1) * dim].iter_mut().zip(&neu1e) {
                                *w += e;
                            }
                        }
                    }
                }
            }
            debug!(epoch = epoch + 1, "Finished word2vec epoch");
            on_epoch(epoch + 1);
        }

        let pairs = vocab
            .words
            .into_iter()
            .enumerate()
            .map(|(i, w)| (w, input[i * dim..(i + 1) * dim].to_vec()));
        WordVectors::from_pairs(dim, pairs)
    }
}

/// One negative-sampling update: push `l1` towards `target` and away from
/// sampled noise words. Accumulates the input-side gradient into `neu1e`.
#[allow(clippy::too_many_arguments)]
fn train_pair(
    l1: &[f32],
    target: usize,
    output: &mut [f32],
    neu1e: &mut [f32],
    table: &[usize],
    negative: usize,
    alpha: f32,
    dim: usize,
    rng: &mut StdRng,
) {
    for d in 0..=negative {
        let (word, label) = if d == 0 {
            (target, 1.0)
        } else {
            let sampled = table[rng.gen_range(0..table.len())];
            if sampled == target {
                continue;
            }
            (sampled, 0.0)
        };
        let row = &mut output[word * dim..(word + 1) * dim];
        let f: f32 = l1.iter().zip(row.iter()).map(|(a, b)| a * b).sum();
        let g = (label - sigmoid(f)) * alpha;
        for ((e, o), x) in neu1e.iter_mut().zip(row.iter_mut()).zip(l1) {
            *e += g * *o;
            *o += g * x;
        }
    }
}
