// Scoring backend trait: the swap-ready abstraction.
//
// Label assignment never knows which backend it is driving. A backend turns
// each label's seed words into some prepared state once per run, turns each
// document into prepared state once, and scores the pair. Keeping the two
// preparation steps separate means expensive work (like averaging seed-word
// vectors) is done per label, not per document × label.

use anyhow::Result;

/// The score a document received for one label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelScore {
    pub score: f64,
    pub label: String,
}

/// A strategy for scoring documents against seed-word sets.
pub trait ScoringBackend {
    /// Per-label state derived from the label's seed words.
    type LabelState;
    /// Per-document state derived from a document's row.
    type DocumentState;

    /// Short tag used in result column names (e.g. "tfidf").
    fn tag(&self) -> &'static str;

    /// Human-readable name used in the results log (e.g. "TF-IDF").
    fn display_name(&self) -> &'static str;

    /// Prepare a label from its seed words.
    fn prepare_label(&self, label: &str, seeds: &[String]) -> Result<Self::LabelState>;

    /// Prepare a document given its row index and the text to score.
    ///
    /// Returns `Ok(None)` when the document cannot be represented (e.g. none
    /// of its tokens are known); such documents are left unlabeled.
    fn prepare_document(&self, index: usize, text: &str) -> Result<Option<Self::DocumentState>>;

    /// Score one prepared document against one prepared label.
    fn score(&self, document: &Self::DocumentState, label: &Self::LabelState) -> f64;
}

/// Pick the best-scoring label.
///
/// Ties go to the label encountered first, so the result depends only on
/// the scores and the seed-word order. NaN scores never win. Returns `None`
/// only for an empty input.
pub fn predict(scores: &[LabelScore]) -> Option<&LabelScore> {
    let mut best: Option<&LabelScore> = None;
    for candidate in scores {
        match best {
            None => best = Some(candidate),
            Some(current) => {
                if candidate.score > current.score || (current.score.is_nan() && !candidate.score.is_nan()) {
                    best = Some(candidate);
                }
            }
        }
    }
    best
}
