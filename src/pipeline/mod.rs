// Labeling runs: one backend over one dataset, end to end.
//
// Every run has the same shape: load the corpus and its seed words, build a
// backend, label every document, then persist the new column, score it
// against the ground truth, and append one line to the results log. The
// backends differ only in how they are built, which lives in the
// submodules.

pub mod tfidf;
pub mod word2vec;

use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use tracing::{info, warn};

use crate::assign::assign_labels;
use crate::backend::traits::ScoringBackend;
use crate::config::Config;
use crate::data::paths::{check_path_component, local_path, resolve_dataset, ArtifactKind};
use crate::data::seeds::SeedWords;
use crate::data::store::DocumentStore;
use crate::eval::{append_result, f1_scores, results_line, F1Scores, RunSummary};
use crate::hyper::HyperParams;
use crate::output::progress_bar;

/// What to run on: dataset, granularity and user hyperparameters.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub set: String,
    pub granularity: String,
    pub hyper: HyperParams,
}

impl RunRequest {
    /// Resolve dataset aliases and validate both path components.
    pub fn new(set: &str, granularity: &str, hyper: HyperParams) -> Result<Self> {
        let set = resolve_dataset(set)?;
        check_path_component("granularity", granularity)?;
        Ok(Self {
            set,
            granularity: granularity.to_string(),
            hyper,
        })
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Name of the result column written to the store
    pub column: String,
    pub scores: F1Scores,
    pub documents: usize,
    /// Documents left unlabeled because the backend couldn't represent them
    pub skipped: usize,
    /// The line appended to the results log
    pub results_line: String,
    pub store_path: PathBuf,
    /// Whether word vectors were trained (rather than loaded) for this run
    pub trained: bool,
}

/// Corpus and seed words for a request, with the local copies ensured.
pub(crate) fn load_inputs(config: &Config, request: &RunRequest) -> Result<(DocumentStore, SeedWords)> {
    let store = DocumentStore::load(config, &request.set, &request.granularity)?;
    let seeds = SeedWords::load(config, &request.set, &request.granularity)?;
    info!(
        set = %request.set,
        granularity = %request.granularity,
        documents = store.len(),
        labels = seeds.len(),
        "Loaded corpus and seed words"
    );
    Ok((store, seeds))
}

/// Label every document with `backend`, then persist, score and log.
///
/// The store is only written once the whole column has been computed, so a
/// failed run leaves the previous file untouched.
pub(crate) fn label_and_record<B: ScoringBackend>(
    config: &Config,
    request: &RunRequest,
    mut store: DocumentStore,
    seeds: &SeedWords,
    backend: &B,
    cleaned: bool,
    column: String,
) -> Result<RunReport> {
    let pb = progress_bar(store.len() as u64, "Labeling");
    let assignment = assign_labels(backend, seeds, &store.texts(cleaned), &pb)?;
    pb.finish_and_clear();

    if assignment.skipped > 0 {
        warn!(
            skipped = assignment.skipped,
            "Some documents were left unlabeled and count as misses"
        );
    }

    let scores = f1_scores(&store.true_labels(), &assignment.labels)?;
    let documents = store.len();
    store.set_column(&column, assignment.labels)?;

    let store_path = local_path(config, &request.set, &request.granularity, ArtifactKind::Data);
    store.save(&store_path)?;
    info!(column = %column, path = %store_path.display(), "Saved labeled corpus");

    let line = results_line(&RunSummary {
        set: &request.set,
        granularity: &request.granularity,
        cleaned,
        hyper: &request.hyper,
        backend: backend.display_name(),
        finished_at: Local::now(),
        scores,
    });
    append_result(&config.results_file, &line)?;

    Ok(RunReport {
        column,
        scores,
        documents,
        skipped: assignment.skipped,
        results_line: line,
        store_path,
        trained: false,
    })
}
