// TF-IDF run: fit the vectorizer over the raw sentences, then label.

use anyhow::Result;
use tracing::info;

use super::{label_and_record, load_inputs, RunReport, RunRequest};
use crate::backend::tfidf::{TfidfBackend, TfidfParams};
use crate::backend::traits::ScoringBackend;
use crate::config::Config;
use crate::hyper::style_name;
use crate::output::progress_bar;

/// Run the TF-IDF labeler for `request`.
///
/// Hyperparameters are validated before any file is read, so a typo fails
/// fast instead of after a full corpus load.
pub fn run(config: &Config, request: &RunRequest) -> Result<RunReport> {
    let params = TfidfParams::from_hyper(&request.hyper)?;
    let (store, seeds) = load_inputs(config, request)?;

    let pb = progress_bar(store.len() as u64, "Vectorizing");
    let backend = TfidfBackend::fit(&store.sentences(), params, &pb)?;
    pb.finish_and_clear();
    info!(
        terms = backend.vectorizer().vocabulary_size(),
        "Vocabulary ready"
    );

    let column = style_name(backend.tag(), &request.hyper);
    label_and_record(config, request, store, &seeds, &backend, false, column)
}
