// TF-IDF scoring backend.
//
// The whole corpus is fitted once into a sparse document-term weight matrix.
// A document's score for a label is the mean of its weights for the label's
// seed words; seed words the vectorizer never saw contribute 0 instead of
// failing the run, so a badly chosen seed only drags its label down.
//
// The vectorizer mirrors the conventional TF-IDF defaults: lowercase, tokens
// of two or more word characters, smoothed idf = ln((1+n)/(1+df)) + 1, and
// L2-normalised rows.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use anyhow::Result;
use indicatif::ProgressBar;
use regex::Regex;
use stop_words::{get, LANGUAGE};
use tracing::{debug, info};

use super::traits::ScoringBackend;
use crate::hyper::{expect_bool, expect_usize, HyperParams, HyperValue};

/// Hyperparameter names accepted by the TF-IDF backend.
pub const TFIDF_PARAMS: &[&str] = &[
    "lowercase",
    "min_df",
    "max_df",
    "max_features",
    "ngram_range",
    "stop_words",
    "use_idf",
    "smooth_idf",
    "sublinear_tf",
    "binary",
    "norm",
];

fn token_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("valid regex"))
}

/// A document-frequency threshold: an absolute count or a corpus proportion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DocFrequency {
    Count(usize),
    Proportion(f64),
}

impl DocFrequency {
    fn parse(name: &str, value: &HyperValue) -> Result<Self> {
        match value {
            HyperValue::Int(_) => Ok(DocFrequency::Count(expect_usize(name, value)?)),
            HyperValue::Float(f) if (0.0..=1.0).contains(f) => Ok(DocFrequency::Proportion(*f)),
            other => anyhow::bail!(
                "Hyperparameter `{name}` must be a count or a proportion in [0, 1], got `{other}`"
            ),
        }
    }

    fn resolve(self, n_docs: usize) -> f64 {
        match self {
            DocFrequency::Count(c) => c as f64,
            DocFrequency::Proportion(p) => p * n_docs as f64,
        }
    }
}

/// Row normalisation applied after weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Norm {
    L1,
    L2,
    None,
}

/// Validated TF-IDF configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TfidfParams {
    pub lowercase: bool,
    pub min_df: DocFrequency,
    pub max_df: DocFrequency,
    pub max_features: Option<usize>,
    pub ngram_range: (usize, usize),
    pub stop_words: Option<HashSet<String>>,
    pub use_idf: bool,
    pub smooth_idf: bool,
    pub sublinear_tf: bool,
    pub binary: bool,
    pub norm: Norm,
}

impl Default for TfidfParams {
    fn default() -> Self {
        Self {
            lowercase: true,
            min_df: DocFrequency::Count(1),
            max_df: DocFrequency::Proportion(1.0),
            max_features: None,
            ngram_range: (1, 1),
            stop_words: None,
            use_idf: true,
            smooth_idf: true,
            sublinear_tf: false,
            binary: false,
            norm: Norm::L2,
        }
    }
}

impl TfidfParams {
    /// Validate a parsed hyperparameter set. Unknown names are rejected.
    pub fn from_hyper(params: &HyperParams) -> Result<Self> {
        let mut out = Self::default();
        for (name, value) in params.iter() {
            match name {
                "lowercase" => out.lowercase = expect_bool(name, value)?,
                "min_df" => out.min_df = DocFrequency::parse(name, value)?,
                "max_df" => out.max_df = DocFrequency::parse(name, value)?,
                "max_features" => out.max_features = Some(expect_usize(name, value)?),
                "ngram_range" => out.ngram_range = parse_ngram_range(value)?,
                "stop_words" => match value {
                    HyperValue::Str(s) if s == "english" => {
                        out.stop_words = Some(get(LANGUAGE::English).into_iter().collect());
                    }
                    other => anyhow::bail!(
                        "Hyperparameter `stop_words` only supports `english`, got `{other}`"
                    ),
                },
                "use_idf" => out.use_idf = expect_bool(name, value)?,
                "smooth_idf" => out.smooth_idf = expect_bool(name, value)?,
                "sublinear_tf" => out.sublinear_tf = expect_bool(name, value)?,
                "binary" => out.binary = expect_bool(name, value)?,
                "norm" => {
                    out.norm = match value.to_string().as_str() {
                        "l1" => Norm::L1,
                        "l2" => Norm::L2,
                        "none" | "None" => Norm::None,
                        other => anyhow::bail!(
                            "Hyperparameter `norm` must be one of l1, l2, none, got `{other}`"
                        ),
                    }
                }
                other => anyhow::bail!(
                    "Unknown TF-IDF hyperparameter `{other}`. Accepted: {}",
                    TFIDF_PARAMS.join(", ")
                ),
            }
        }
        if out.max_features == Some(0) {
            anyhow::bail!("Hyperparameter `max_features` must be at least 1");
        }
        Ok(out)
    }
}

fn parse_ngram_range(value: &HyperValue) -> Result<(usize, usize)> {
    let raw = value.to_string();
    let trimmed = raw.trim_matches(|c| c == '(' || c == ')');
    let parsed = trimmed
        .split_once(',')
        .and_then(|(lo, hi)| Some((lo.trim().parse::<usize>().ok()?, hi.trim().parse::<usize>().ok()?)));
    match parsed {
        Some((lo, hi)) if lo >= 1 && lo <= hi => Ok((lo, hi)),
        _ => anyhow::bail!(
            "Hyperparameter `ngram_range` must look like `min,max` with 1 <= min <= max, got `{raw}`"
        ),
    }
}

/// A fitted TF-IDF model: vocabulary plus the corpus weight matrix.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    params: TfidfParams,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    /// Sparse rows: (term id, weight), sorted by term id
    rows: Vec<Vec<(usize, f64)>>,
}

impl TfidfVectorizer {
    /// Fit the vocabulary and weights over `corpus`, one row per document.
    pub fn fit(corpus: &[&str], params: TfidfParams, progress: &ProgressBar) -> Result<Self> {
        if corpus.is_empty() {
            anyhow::bail!("Cannot fit TF-IDF on an empty corpus");
        }
        let n_docs = corpus.len();

        // Pass 1: per-document term counts and corpus statistics
        let mut doc_counts: Vec<HashMap<String, u32>> = Vec::with_capacity(n_docs);
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        let mut total_freq: HashMap<String, u64> = HashMap::new();
        for text in corpus {
            let mut counts: HashMap<String, u32> = HashMap::new();
            for term in analyze(text, &params) {
                *counts.entry(term).or_insert(0) += 1;
            }
            for (term, &c) in &counts {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
                *total_freq.entry(term.clone()).or_insert(0) += u64::from(c);
            }
            doc_counts.push(counts);
            progress.inc(1);
        }

        let vocabulary = build_vocabulary(&doc_freq, &total_freq, n_docs, &params)?;
        let n_terms = vocabulary.len();

        let mut idf = vec![1.0; n_terms];
        if params.use_idf {
            let n = n_docs as f64;
            for (term, &id) in &vocabulary {
                let df = doc_freq[term] as f64;
                idf[id] = if params.smooth_idf {
                    ((1.0 + n) / (1.0 + df)).ln() + 1.0
                } else {
                    (n / df).ln() + 1.0
                };
            }
        }

        // Pass 2: weighted, normalised rows
        let rows: Vec<Vec<(usize, f64)>> = doc_counts
            .into_iter()
            .map(|counts| weight_row(counts, &vocabulary, &idf, &params))
            .collect();

        info!(documents = n_docs, terms = n_terms, "Fitted TF-IDF vectorizer");

        Ok(Self {
            params,
            vocabulary,
            idf,
            rows,
        })
    }

    pub fn params(&self) -> &TfidfParams {
        &self.params
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn n_documents(&self) -> usize {
        self.rows.len()
    }

    pub fn term_id(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.term_id(term).map(|id| self.idf[id])
    }

    /// Weight of a vocabulary term in a document row (0 if absent from it).
    ///
    /// `None` if `document` is not a fitted row.
    pub fn weight(&self, document: usize, term_id: usize) -> Option<f64> {
        let row = self.rows.get(document)?;
        Some(
            row.binary_search_by_key(&term_id, |&(id, _)| id)
                .map_or(0.0, |pos| row[pos].1),
        )
    }
}

/// Lowercase, tokenize, drop stop words, and expand n-grams.
fn analyze(text: &str, params: &TfidfParams) -> Vec<String> {
    let text = if params.lowercase {
        text.to_lowercase()
    } else {
        text.to_string()
    };
    let tokens: Vec<&str> = token_pattern()
        .find_iter(&text)
        .map(|m| m.as_str())
        .filter(|t| {
            params
                .stop_words
                .as_ref()
                .map_or(true, |stop| !stop.contains(*t))
        })
        .collect();

    let (lo, hi) = params.ngram_range;
    let mut terms = Vec::new();
    for n in lo..=hi {
        if n > tokens.len() {
            break;
        }
        for window in tokens.windows(n) {
            terms.push(window.join(" "));
        }
    }
    terms
}

fn build_vocabulary(
    doc_freq: &HashMap<String, usize>,
    total_freq: &HashMap<String, u64>,
    n_docs: usize,
    params: &TfidfParams,
) -> Result<HashMap<String, usize>> {
    if doc_freq.is_empty() {
        anyhow::bail!("Empty vocabulary; perhaps the documents only contain stop words");
    }

    let max_docs = params.max_df.resolve(n_docs);
    let min_docs = params.min_df.resolve(n_docs);
    if max_docs < min_docs {
        anyhow::bail!("max_df corresponds to fewer documents than min_df");
    }

    let mut kept: Vec<&String> = doc_freq
        .iter()
        .filter(|(_, df)| (**df as f64) >= min_docs && (**df as f64) <= max_docs)
        .map(|(term, _)| term)
        .collect();
    kept.sort();

    if let Some(limit) = params.max_features {
        // Most frequent first; the stable sort keeps ties alphabetical
        kept.sort_by(|a, b| total_freq[*b].cmp(&total_freq[*a]));
        kept.truncate(limit);
        kept.sort();
    }

    if kept.is_empty() {
        anyhow::bail!("After pruning, no terms remain. Try a lower min_df or a higher max_df");
    }

    debug!(
        candidates = doc_freq.len(),
        kept = kept.len(),
        "Pruned TF-IDF vocabulary"
    );

    Ok(kept
        .into_iter()
        .enumerate()
        .map(|(id, term)| (term.clone(), id))
        .collect())
}

fn weight_row(
    counts: HashMap<String, u32>,
    vocabulary: &HashMap<String, usize>,
    idf: &[f64],
    params: &TfidfParams,
) -> Vec<(usize, f64)> {
    let mut row: Vec<(usize, f64)> = counts
        .into_iter()
        .filter_map(|(term, count)| {
            let id = *vocabulary.get(&term)?;
            let tf = if params.binary {
                1.0
            } else if params.sublinear_tf {
                1.0 + f64::from(count).ln()
            } else {
                f64::from(count)
            };
            Some((id, tf * idf[id]))
        })
        .collect();
    row.sort_by_key(|&(id, _)| id);

    let norm = match params.norm {
        Norm::L1 => row.iter().map(|(_, w)| w.abs()).sum::<f64>(),
        Norm::L2 => row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt(),
        Norm::None => 1.0,
    };
    if norm > 0.0 {
        for (_, w) in &mut row {
            *w /= norm;
        }
    }
    row
}

/// Reduction applied to a label's per-seed-word weights.
pub type ScoreReduce = fn(&[f64]) -> f64;

/// Arithmetic mean; 0 for an empty list.
pub fn mean_score(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// TF-IDF backend: scores documents by their weights for seed words.
pub struct TfidfBackend {
    vectorizer: TfidfVectorizer,
    reduce: ScoreReduce,
}

impl TfidfBackend {
    /// Fit the vectorizer over the corpus text field.
    pub fn fit(corpus: &[&str], params: TfidfParams, progress: &ProgressBar) -> Result<Self> {
        Ok(Self::from_vectorizer(TfidfVectorizer::fit(corpus, params, progress)?))
    }

    pub fn from_vectorizer(vectorizer: TfidfVectorizer) -> Self {
        Self {
            vectorizer,
            reduce: mean_score,
        }
    }

    /// Replace the default mean reduction.
    pub fn with_reduce(mut self, reduce: ScoreReduce) -> Self {
        self.reduce = reduce;
        self
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    /// Score a document (by row index) against a list of seed words.
    pub fn score_document(&self, index: usize, seeds: &[String]) -> Result<f64> {
        let row = self.prepare_document(index, "")?.unwrap_or(index);
        let label = self.prepare_label("", seeds)?;
        Ok(self.score(&row, &label))
    }
}

impl ScoringBackend for TfidfBackend {
    /// Vocabulary ids of the seed words; `None` for unseen words
    type LabelState = Vec<Option<usize>>;
    /// Row index into the fitted matrix
    type DocumentState = usize;

    fn tag(&self) -> &'static str {
        "tfidf"
    }

    fn display_name(&self) -> &'static str {
        "TF-IDF"
    }

    fn prepare_label(&self, label: &str, seeds: &[String]) -> Result<Self::LabelState> {
        let ids: Vec<Option<usize>> = seeds.iter().map(|w| self.vectorizer.term_id(w)).collect();
        let known = ids.iter().filter(|id| id.is_some()).count();
        if known == 0 {
            debug!(label, "No seed words in the TF-IDF vocabulary; label will score 0");
        }
        Ok(ids)
    }

    fn prepare_document(&self, index: usize, _text: &str) -> Result<Option<Self::DocumentState>> {
        let n = self.vectorizer.n_documents();
        if index >= n {
            anyhow::bail!("Document index {index} out of range for {n} fitted documents");
        }
        Ok(Some(index))
    }

    fn score(&self, document: &Self::DocumentState, label: &Self::LabelState) -> f64 {
        let contributions: Vec<f64> = label
            .iter()
            .map(|id| {
                id.and_then(|id| self.vectorizer.weight(*document, id))
                    .unwrap_or(0.0)
            })
            .collect();
        (self.reduce)(&contributions)
    }
}
