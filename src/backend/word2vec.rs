// Word2Vec scoring backend.
//
// Documents and seed-word sets are both reduced to a single vector by
// averaging the vectors of their known words; a document's score for a label
// is the similarity between the two. Seed vectors are computed once per run
// in prepare_label, so the per-document cost is one aggregation plus one
// similarity per label.
//
// Training is the expensive part. Trained vectors are cached under a name
// derived from the dataset, granularity, tokenizer, and hyperparameters, and
// a cache hit skips training entirely.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Result;
use tracing::{debug, info};

use super::traits::ScoringBackend;
use crate::embedding::train::{EmbeddingTrainer, Word2VecParams};
use crate::embedding::vectors::WordVectors;
use crate::hyper::{signature, HyperParams, HyperValue};
use crate::output::progress_bar;
use crate::text::Tokenizer;

/// Pluggable similarity between a document vector and a label vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Similarity {
    /// 1 − cosine distance
    #[default]
    Cosine,
    /// Raw dot product
    Dot,
    /// 1 / (1 + Euclidean distance)
    Euclidean,
}

impl Similarity {
    pub fn name(self) -> &'static str {
        match self {
            Similarity::Cosine => "cosine_sim",
            Similarity::Dot => "dot_sim",
            Similarity::Euclidean => "euclidean_sim",
        }
    }

    pub fn apply(self, u: &[f32], v: &[f32]) -> f64 {
        match self {
            Similarity::Cosine => cosine_similarity(u, v),
            Similarity::Dot => dot(u, v),
            Similarity::Euclidean => {
                let dist: f64 = u
                    .iter()
                    .zip(v)
                    .map(|(a, b)| (f64::from(*a) - f64::from(*b)).powi(2))
                    .sum::<f64>()
                    .sqrt();
                1.0 / (1.0 + dist)
            }
        }
    }
}

impl fmt::Display for Similarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Similarity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cosine_sim" => Ok(Similarity::Cosine),
            "dot_sim" => Ok(Similarity::Dot),
            "euclidean_sim" => Ok(Similarity::Euclidean),
            other => anyhow::bail!(
                "Unknown similarity `{other}`: expected one of cosine_sim, dot_sim, euclidean_sim"
            ),
        }
    }
}

fn dot(u: &[f32], v: &[f32]) -> f64 {
    u.iter().zip(v).map(|(a, b)| f64::from(*a) * f64::from(*b)).sum()
}

/// Cosine similarity, defined as 1 − cosine distance.
///
/// Ranges from −1.0 to 1.0: identical directions score 1.0 and orthogonal
/// vectors 0.0. A zero vector has no direction, so it scores 0.0 against
/// anything.
pub fn cosine_similarity(u: &[f32], v: &[f32]) -> f64 {
    let norm_u = dot(u, u).sqrt();
    let norm_v = dot(v, v).sqrt();
    let denom = norm_u * norm_v;
    if denom < f64::EPSILON {
        0.0
    } else {
        dot(u, v) / denom
    }
}

/// Reduction applied to the list of found word vectors.
pub type VectorReduce = fn(&[&[f32]]) -> Vec<f32>;

/// Element-wise mean of a non-empty list of equal-length vectors.
pub fn mean_vector(vectors: &[&[f32]]) -> Vec<f32> {
    let Some(first) = vectors.first() else {
        return Vec::new();
    };
    let mut mean = vec![0.0f32; first.len()];
    for v in vectors {
        for (m, x) in mean.iter_mut().zip(v.iter()) {
            *m += x;
        }
    }
    let n = vectors.len() as f32;
    mean.iter_mut().for_each(|m| *m /= n);
    mean
}

/// Aggregate the vectors of `words` into one vector.
///
/// Words missing from the table are skipped. If none are found the
/// reduction is undefined and an error is returned.
pub fn aggregate<S: AsRef<str>>(words: &[S], vectors: &WordVectors, reduce: VectorReduce) -> Result<Vec<f32>> {
    let found: Vec<&[f32]> = words.iter().filter_map(|w| vectors.get(w.as_ref())).collect();
    if found.is_empty() {
        anyhow::bail!(
            "None of the {} words are in the embedding vocabulary; nothing to aggregate",
            words.len()
        );
    }
    Ok(reduce(&found))
}

/// Hyperparameters that name a cached embedding artifact: `clean` when the
/// vectors are trained on cleaned text, the tokenizer when not the default,
/// plus the user-supplied training parameters.
pub fn artifact_params(tokenizer: Tokenizer, clean: bool, hyper: &HyperParams) -> HyperParams {
    let mut key = HyperParams::new();
    if clean {
        key.insert("clean", HyperValue::Str("true".to_string()));
    }
    if !tokenizer.is_default() {
        key.insert("token", HyperValue::Str(tokenizer.name().to_string()));
    }
    key.merged(hyper)
}

/// Path of the cached vectors for a dataset + configuration:
/// `<models>/<set>-<gran>[_<signature>].txt`.
pub fn artifact_path(
    models_dir: &Path,
    set: &str,
    granularity: &str,
    tokenizer: Tokenizer,
    clean: bool,
    hyper: &HyperParams,
) -> PathBuf {
    let key = artifact_params(tokenizer, clean, hyper);
    models_dir.join(signature(&format!("{set}-{granularity}"), &key, ".txt"))
}

/// Load cached vectors from `path`, or train and cache them.
///
/// Returns the vectors and whether training ran. Training tokenizes
/// `corpus` with `tokenizer` and reports each finished epoch to `on_epoch`;
/// progress bars are only shown on that branch.
pub fn load_or_train(
    path: &Path,
    corpus: &[&str],
    tokenizer: Tokenizer,
    params: &Word2VecParams,
    trainer: &dyn EmbeddingTrainer,
    on_epoch: &mut dyn FnMut(usize),
) -> Result<(WordVectors, bool)> {
    if path.is_file() {
        info!(path = %path.display(), "Loading cached word vectors");
        return Ok((WordVectors::load_text(path)?, false));
    }

    info!(
        path = %path.display(),
        "No embeddings cached for this dataset and configuration; training"
    );
    let pb = progress_bar(corpus.len() as u64, "Tokenizing");
    let sentences: Vec<Vec<String>> = corpus
        .iter()
        .map(|doc| {
            pb.inc(1);
            tokenizer.tokenize(doc)
        })
        .collect();
    pb.finish_and_clear();

    let pb = progress_bar(params.epochs as u64, "Training");
    let vectors = trainer.train(&sentences, params, &mut |epoch: usize| {
        pb.inc(1);
        on_epoch(epoch);
    })?;
    pb.finish_and_clear();
    vectors.save_text(path)?;
    info!(path = %path.display(), words = vectors.len(), "Saved word vectors");
    Ok((vectors, true))
}

/// Word2Vec backend: similarity between averaged document and seed vectors.
pub struct Word2VecBackend {
    vectors: WordVectors,
    tokenizer: Tokenizer,
    similarity: Similarity,
    reduce: VectorReduce,
}

impl Word2VecBackend {
    pub fn new(vectors: WordVectors, tokenizer: Tokenizer, similarity: Similarity) -> Self {
        Self {
            vectors,
            tokenizer,
            similarity,
            reduce: mean_vector,
        }
    }

    /// Replace the default element-wise mean.
    pub fn with_reduce(mut self, reduce: VectorReduce) -> Self {
        self.reduce = reduce;
        self
    }

    pub fn vectors(&self) -> &WordVectors {
        &self.vectors
    }
}

impl ScoringBackend for Word2VecBackend {
    type LabelState = Vec<f32>;
    type DocumentState = Vec<f32>;

    fn tag(&self) -> &'static str {
        "w2v"
    }

    fn display_name(&self) -> &'static str {
        "Word2Vec"
    }

    fn prepare_label(&self, label: &str, seeds: &[String]) -> Result<Self::LabelState> {
        // Seed lists are used verbatim, not re-tokenized
        aggregate(seeds, &self.vectors, self.reduce).map_err(|e| {
            anyhow::anyhow!("Cannot build an embedding for label `{label}`: {e}")
        })
    }

    fn prepare_document(&self, index: usize, text: &str) -> Result<Option<Self::DocumentState>> {
        let tokens = self.tokenizer.tokenize(text);
        if !tokens.iter().any(|t| self.vectors.contains(t)) {
            debug!(index, tokens = tokens.len(), "Document has no in-vocabulary tokens");
            return Ok(None);
        }
        aggregate(&tokens, &self.vectors, self.reduce).map(Some)
    }

    fn score(&self, document: &Self::DocumentState, label: &Self::LabelState) -> f64 {
        self.similarity.apply(document, label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> WordVectors {
        WordVectors::from_pairs(
            2,
            [
                ("ball", vec![1.0, 0.0]),
                ("goal", vec![1.0, 0.0]),
                ("vote", vec![0.0, 1.0]),
                ("election", vec![0.0, 1.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_cosine_identical_and_orthogonal() {
        assert!((cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]) - 1.0).abs() < 1e-9);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_opposite_is_negative() {
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_other_similarities() {
        assert!((Similarity::Dot.apply(&[1.0, 2.0], &[3.0, 4.0]) - 11.0).abs() < 1e-9);
        assert!((Similarity::Euclidean.apply(&[0.0, 0.0], &[3.0, 4.0]) - 1.0 / 6.0).abs() < 1e-9);
        assert!((Similarity::Euclidean.apply(&[1.0, 1.0], &[1.0, 1.0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_similarity_from_str() {
        assert_eq!("cosine_sim".parse::<Similarity>().unwrap(), Similarity::Cosine);
        assert!("manhattan".parse::<Similarity>().is_err());
    }

    #[test]
    fn test_aggregate_single_vector_unchanged() {
        let v = WordVectors::from_pairs(3, [("x", vec![0.25, -1.5, 2.0])]).unwrap();
        let agg = aggregate(&["x"], &v, mean_vector).unwrap();
        assert_eq!(agg, vec![0.25, -1.5, 2.0]);
    }

    #[test]
    fn test_aggregate_skips_unknown_words() {
        let agg = aggregate(&["ball", "unicorn", "vote"], &table(), mean_vector).unwrap();
        assert_eq!(agg, vec![0.5, 0.5]);
    }

    #[test]
    fn test_aggregate_empty_is_error() {
        let empty: [&str; 0] = [];
        assert!(aggregate(&empty, &table(), mean_vector).is_err());
        assert!(aggregate(&["unicorn"], &table(), mean_vector).is_err());
    }

    #[test]
    fn test_label_with_no_known_seeds_fails() {
        let backend = Word2VecBackend::new(table(), Tokenizer::default(), Similarity::Cosine);
        let err = backend
            .prepare_label("arts", &["paint".to_string()])
            .unwrap_err();
        assert!(err.to_string().contains("arts"));
    }

    #[test]
    fn test_document_with_no_known_tokens_is_skipped() {
        let backend = Word2VecBackend::new(table(), Tokenizer::default(), Similarity::Cosine);
        assert!(backend.prepare_document(0, "nothing here").unwrap().is_none());
        assert!(backend.prepare_document(0, "").unwrap().is_none());
    }

    #[test]
    fn test_artifact_path_includes_non_default_tokenizer() {
        let hyper = HyperParams::parse(&["epochs=40", "window=20", "workers=4"]).unwrap();
        let default_path = artifact_path(Path::new("models"), "nyt", "coarse", Tokenizer::Tokenize, false, &hyper);
        assert_eq!(
            default_path,
            PathBuf::from("models/nyt-coarse_epochs-40_window-20_workers-4.txt")
        );
        let split_path = artifact_path(Path::new("models"), "nyt", "coarse", Tokenizer::Split, false, &hyper);
        assert_eq!(
            split_path,
            PathBuf::from("models/nyt-coarse_epochs-40_token-split_window-20_workers-4.txt")
        );
        let bare = artifact_path(Path::new("models"), "nyt", "fine", Tokenizer::Tokenize, false, &HyperParams::new());
        assert_eq!(bare, PathBuf::from("models/nyt-fine.txt"));
        let cleaned = artifact_path(Path::new("models"), "nyt", "fine", Tokenizer::Tokenize, true, &HyperParams::new());
        assert_eq!(cleaned, PathBuf::from("models/nyt-fine_clean-true.txt"));
    }
}
