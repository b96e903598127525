// Word2Vec run: load or train embeddings, then label by vector similarity.
//
// Training and scoring always see the same text. With `clean` set both use
// the cleaned text, which is computed once and stored alongside the corpus,
// and the cache key and column name carry `clean-true` so cleaned and raw
// vectors never mix.

use anyhow::Result;
use tracing::info;

use super::{label_and_record, load_inputs, RunReport, RunRequest};
use crate::backend::traits::ScoringBackend;
use crate::backend::word2vec::{artifact_params, artifact_path, load_or_train, Similarity, Word2VecBackend};
use crate::config::Config;
use crate::embedding::train::{EmbeddingTrainer, Word2VecParams};
use crate::hyper::style_name;
use crate::text::{clean_string, Tokenizer};

/// A Word2Vec run: the common request plus the backend's own options.
#[derive(Debug, Clone)]
pub struct Word2VecRequest {
    pub run: RunRequest,
    /// Score on cleaned text instead of the raw sentences
    pub clean: bool,
    pub tokenizer: Tokenizer,
    pub similarity: Similarity,
}

/// Run the Word2Vec labeler for `request`, training with `trainer` when no
/// cached vectors match the configuration.
pub fn run(config: &Config, request: &Word2VecRequest, trainer: &dyn EmbeddingTrainer) -> Result<RunReport> {
    let run = &request.run;
    let params = Word2VecParams::from_hyper(&run.hyper)?;
    let (mut store, seeds) = load_inputs(config, run)?;

    if request.clean {
        let cleaned = store.ensure_clean_text(clean_string);
        if cleaned > 0 {
            info!(documents = cleaned, "Cleaned document text");
        }
    }

    let path = artifact_path(
        &config.models_dir,
        &run.set,
        &run.granularity,
        request.tokenizer,
        request.clean,
        &run.hyper,
    );
    let (vectors, trained) = load_or_train(
        &path,
        &store.texts(request.clean),
        request.tokenizer,
        &params,
        trainer,
        &mut |_: usize| {},
    )?;
    info!(
        words = vectors.len(),
        dim = vectors.dim(),
        similarity = %request.similarity,
        "Word vectors ready"
    );

    let backend = Word2VecBackend::new(vectors, request.tokenizer, request.similarity);
    let column = style_name(backend.tag(), &artifact_params(request.tokenizer, request.clean, &run.hyper));
    let mut report = label_and_record(config, run, store, &seeds, &backend, request.clean, column)?;
    report.trained = trained;
    Ok(report)
}
