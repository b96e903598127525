// Label assignment: score every label for every document, keep the best.
//
// Works against any ScoringBackend. Labels are prepared once, in seed-file
// order, before the first document is scored; a label that can't be prepared
// aborts the run before any work is wasted. Documents the backend can't
// represent are left unlabeled with a warning rather than given a guess.

use anyhow::Result;
use indicatif::ProgressBar;
use tracing::{info, warn};

use crate::backend::traits::{predict, LabelScore, ScoringBackend};
use crate::data::seeds::SeedWords;

/// Labels with their backend-prepared state, in seed-file order.
pub struct PreparedLabels<S> {
    entries: Vec<(String, S)>,
}

impl<S> PreparedLabels<S> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The outcome of assigning labels to a whole corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// One cell per document; `None` where the document couldn't be scored
    pub labels: Vec<Option<String>>,
    /// Number of `None` cells
    pub skipped: usize,
}

/// Prepare every label's state once for the run.
pub fn prepare_labels<B: ScoringBackend>(
    backend: &B,
    seeds: &SeedWords,
) -> Result<PreparedLabels<B::LabelState>> {
    if seeds.is_empty() {
        anyhow::bail!("No labels to assign: the seed-word map is empty");
    }
    let entries = seeds
        .iter()
        .map(|(label, words)| Ok((label.to_string(), backend.prepare_label(label, words)?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(PreparedLabels { entries })
}

/// Score one prepared document against every prepared label.
pub fn score_labels<B: ScoringBackend>(
    backend: &B,
    labels: &PreparedLabels<B::LabelState>,
    document: &B::DocumentState,
) -> Vec<LabelScore> {
    labels
        .entries
        .iter()
        .map(|(label, state)| LabelScore {
            score: backend.score(document, state),
            label: label.clone(),
        })
        .collect()
}

/// Predict the label of a single document, or `None` if it can't be scored.
pub fn predict_document<B: ScoringBackend>(
    backend: &B,
    labels: &PreparedLabels<B::LabelState>,
    index: usize,
    text: &str,
) -> Result<Option<String>> {
    let Some(document) = backend.prepare_document(index, text)? else {
        return Ok(None);
    };
    let scores = score_labels(backend, labels, &document);
    Ok(predict(&scores).map(|best| best.label.clone()))
}

/// Assign a label to every document in `texts` (row order).
///
/// Nothing is written anywhere; the caller persists the returned column
/// only once the whole corpus has been labeled.
pub fn assign_labels<B: ScoringBackend>(
    backend: &B,
    seeds: &SeedWords,
    texts: &[&str],
    progress: &ProgressBar,
) -> Result<Assignment> {
    let labels = prepare_labels(backend, seeds)?;
    info!(labels = labels.len(), backend = backend.tag(), "Prepared label representations");

    let mut assigned = Vec::with_capacity(texts.len());
    let mut skipped = 0;
    for (index, text) in texts.iter().enumerate() {
        let label = predict_document(backend, &labels, index, text)?;
        if label.is_none() {
            warn!(index, "Document could not be scored; leaving it unlabeled");
            skipped += 1;
        }
        assigned.push(label);
        progress.inc(1);
    }

    Ok(Assignment {
        labels: assigned,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scores a document by the number of times the label's first seed word
    /// appears in it. Empty documents can't be scored.
    struct CountingBackend;

    impl ScoringBackend for CountingBackend {
        type LabelState = String;
        type DocumentState = Vec<String>;

        fn tag(&self) -> &'static str {
            "count"
        }

        fn display_name(&self) -> &'static str {
            "Count"
        }

        fn prepare_label(&self, label: &str, seeds: &[String]) -> Result<String> {
            seeds
                .first()
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("label `{label}` has no seeds"))
        }

        fn prepare_document(&self, _index: usize, text: &str) -> Result<Option<Vec<String>>> {
            let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
            Ok((!words.is_empty()).then_some(words))
        }

        fn score(&self, document: &Vec<String>, label: &String) -> f64 {
            document.iter().filter(|w| *w == label).count() as f64
        }
    }

    fn seeds() -> SeedWords {
        SeedWords::new([("sports", vec!["ball"]), ("politics", vec!["vote"])]).unwrap()
    }

    #[test]
    fn test_assign_picks_best_label() {
        let texts = ["ball ball vote", "vote", "ball"];
        let result = assign_labels(&CountingBackend, &seeds(), &texts, &ProgressBar::hidden()).unwrap();
        assert_eq!(
            result.labels,
            vec![
                Some("sports".to_string()),
                Some("politics".to_string()),
                Some("sports".to_string())
            ]
        );
        assert_eq!(result.skipped, 0);
    }

    #[test]
    fn test_tie_goes_to_first_label() {
        let texts = ["ball vote", "nothing relevant"];
        for _ in 0..5 {
            let result =
                assign_labels(&CountingBackend, &seeds(), &texts, &ProgressBar::hidden()).unwrap();
            assert_eq!(result.labels[0].as_deref(), Some("sports"));
            assert_eq!(result.labels[1].as_deref(), Some("sports"));
        }
    }

    #[test]
    fn test_unscorable_documents_are_skipped() {
        let texts = ["ball", "   "];
        let result = assign_labels(&CountingBackend, &seeds(), &texts, &ProgressBar::hidden()).unwrap();
        assert_eq!(result.labels, vec![Some("sports".to_string()), None]);
        assert_eq!(result.skipped, 1);
    }

    #[test]
    fn test_label_preparation_failure_aborts() {
        let seeds = SeedWords::new([("sports", vec!["ball"]), ("empty", Vec::<&str>::new())]).unwrap();
        let result = assign_labels(&CountingBackend, &seeds, &["ball"], &ProgressBar::hidden());
        assert!(result.is_err());
    }

    #[test]
    fn test_predictions_are_always_seed_labels() {
        let texts = ["ball", "vote", "ball vote", "other words"];
        let result = assign_labels(&CountingBackend, &seeds(), &texts, &ProgressBar::hidden()).unwrap();
        for label in result.labels.iter().flatten() {
            assert!(seeds().get(label).is_some());
        }
    }
}
