// Evaluation: macro/micro F1 against ground truth, and the results log.
//
// The class set is the union of true labels and emitted predictions.
// Precision or recall that would divide by zero counts as 0. Unlabeled
// documents (None predictions) are misses for their true class and never
// count as a prediction, so with every document labeled micro F1 equals
// accuracy.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};

use crate::hyper::{format_float, HyperParams};

/// Macro and micro F1 for one result column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct F1Scores {
    pub macro_f1: f64,
    pub micro_f1: f64,
}

#[derive(Debug, Default, Clone, Copy)]
struct Counts {
    tp: u64,
    fp: u64,
    fn_: u64,
}

fn f1(tp: u64, fp: u64, fn_: u64) -> f64 {
    let precision = if tp + fp == 0 { 0.0 } else { tp as f64 / (tp + fp) as f64 };
    let recall = if tp + fn_ == 0 { 0.0 } else { tp as f64 / (tp + fn_) as f64 };
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Compute macro and micro F1 of `predicted` against `truth`.
pub fn f1_scores<T, P>(truth: &[T], predicted: &[Option<P>]) -> Result<F1Scores>
where
    T: AsRef<str>,
    P: AsRef<str>,
{
    if truth.len() != predicted.len() {
        anyhow::bail!(
            "Cannot score {} predictions against {} true labels",
            predicted.len(),
            truth.len()
        );
    }
    if truth.is_empty() {
        anyhow::bail!("Cannot compute F1 over zero documents");
    }

    let mut classes: BTreeSet<&str> = truth.iter().map(|t| t.as_ref()).collect();
    classes.extend(predicted.iter().flatten().map(|p| p.as_ref()));

    let mut per_class: BTreeMap<&str, Counts> = classes.iter().map(|c| (*c, Counts::default())).collect();
    for (t, p) in truth.iter().zip(predicted) {
        let t = t.as_ref();
        let p: Option<&str> = p.as_ref().map(AsRef::<str>::as_ref);
        match p {
            Some(p) if p == t => per_class.entry(t).or_default().tp += 1,
            Some(p) => {
                per_class.entry(p).or_default().fp += 1;
                per_class.entry(t).or_default().fn_ += 1;
            }
            None => per_class.entry(t).or_default().fn_ += 1,
        }
    }

    let macro_f1 = per_class.values().map(|c| f1(c.tp, c.fp, c.fn_)).sum::<f64>() / per_class.len() as f64;
    let total = per_class.values().fold(Counts::default(), |acc, c| Counts {
        tp: acc.tp + c.tp,
        fp: acc.fp + c.fp,
        fn_: acc.fn_ + c.fn_,
    });
    let micro_f1 = f1(total.tp, total.fp, total.fn_);

    Ok(F1Scores { macro_f1, micro_f1 })
}

/// Everything that identifies a run in the results log.
#[derive(Debug, Clone)]
pub struct RunSummary<'a> {
    pub set: &'a str,
    pub granularity: &'a str,
    pub cleaned: bool,
    pub hyper: &'a HyperParams,
    pub backend: &'a str,
    pub finished_at: DateTime<Local>,
    pub scores: F1Scores,
}

/// Format the single results-log line for a run.
///
/// Scores are rendered like hyperparameter floats, so `1.0` keeps its decimal.
pub fn results_line(summary: &RunSummary<'_>) -> String {
    let hyper = if summary.hyper.is_empty() {
        "default".to_string()
    } else {
        summary.hyper.to_mapping_string()
    };
    format!(
        "{}-{}({}) (hyperparameters: {}): {} finished running at {}. Macro F1: {}; Micro F1: {}",
        summary.set,
        summary.granularity,
        if summary.cleaned { "cleaned" } else { "original" },
        hyper,
        summary.backend,
        summary.finished_at.format("%a %b %e %H:%M:%S %Y"),
        format_float(summary.scores.macro_f1),
        format_float(summary.scores.micro_f1),
    )
}

/// Append one line to the results log, creating it if needed.
pub fn append_result(path: &Path, line: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open results log {}", path.display()))?;
    writeln!(file, "{line}").with_context(|| format!("Failed to append to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_perfect_predictions() {
        let truth = ["a", "b", "a"];
        let pred = [Some("a"), Some("b"), Some("a")];
        let scores = f1_scores(&truth, &pred).unwrap();
        assert!((scores.macro_f1 - 1.0).abs() < 1e-12);
        assert!((scores.micro_f1 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_length_mismatch_fails() {
        assert!(f1_scores(&["a"], &[Some("a"), Some("b")]).is_err());
    }

    #[test]
    fn test_prediction_outside_truth_is_a_class() {
        // "c" only appears as a prediction: it adds a zero-F1 class
        let truth = ["a", "b"];
        let pred = [Some("a"), Some("c")];
        let scores = f1_scores(&truth, &pred).unwrap();
        assert!((scores.macro_f1 - 1.0 / 3.0).abs() < 1e-12);
        assert!((scores.micro_f1 - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_results_line_format() {
        let hyper = HyperParams::parse(&["epochs=40", "window=20"]).unwrap();
        let summary = RunSummary {
            set: "nyt",
            granularity: "coarse",
            cleaned: true,
            hyper: &hyper,
            backend: "Word2Vec",
            finished_at: Local.with_ymd_and_hms(2026, 3, 5, 9, 7, 1).unwrap(),
            scores: F1Scores {
                macro_f1: 0.5,
                micro_f1: 0.75,
            },
        };
        assert_eq!(
            results_line(&summary),
            "nyt-coarse(cleaned) (hyperparameters: {'epochs': 40, 'window': 20}): Word2Vec \
             finished running at Thu Mar  5 09:07:01 2026. Macro F1: 0.5; Micro F1: 0.75"
        );
    }

    #[test]
    fn test_results_line_default_hyper() {
        let hyper = HyperParams::new();
        let summary = RunSummary {
            set: "20news",
            granularity: "fine",
            cleaned: false,
            hyper: &hyper,
            backend: "TF-IDF",
            finished_at: Local.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap(),
            scores: F1Scores {
                macro_f1: 1.0,
                micro_f1: 1.0,
            },
        };
        assert!(results_line(&summary).starts_with("20news-fine(original) (hyperparameters: default): TF-IDF"));
    }

    #[test]
    fn test_append_result_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f1_scores.txt");
        append_result(&path, "first").unwrap();
        append_result(&path, "second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }
}
