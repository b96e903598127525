// Unit tests for the scoring backends through the shared trait.
//
// Covers the properties every backend must hold: predictions come from the
// seed map, ties go to the first label, and unknown seed words degrade the
// TF-IDF score to zero instead of failing.

use indicatif::ProgressBar;

use weaklabel::assign::{assign_labels, prepare_labels, score_labels};
use weaklabel::backend::tfidf::{TfidfBackend, TfidfParams};
use weaklabel::backend::traits::{predict, LabelScore, ScoringBackend};
use weaklabel::backend::word2vec::{aggregate, mean_vector, Similarity, Word2VecBackend};
use weaklabel::data::seeds::SeedWords;
use weaklabel::embedding::vectors::WordVectors;
use weaklabel::text::Tokenizer;

fn corpus() -> Vec<&'static str> {
    vec![
        "the ball went in the goal",
        "voters cast a vote in the election",
        "the keeper saved the ball",
        "the election result was close",
    ]
}

fn fit_tfidf() -> TfidfBackend {
    TfidfBackend::fit(&corpus(), TfidfParams::default(), &ProgressBar::hidden()).unwrap()
}

// ============================================================
// TF-IDF backend
// ============================================================

#[test]
fn tfidf_unknown_seed_words_score_zero_everywhere() {
    let backend = fit_tfidf();
    let seeds = vec!["quark".to_string(), "boson".to_string()];
    let label = backend.prepare_label("physics", &seeds).unwrap();
    for index in 0..corpus().len() {
        let doc = backend.prepare_document(index, "").unwrap().unwrap();
        assert_eq!(backend.score(&doc, &label), 0.0);
    }
}

#[test]
fn tfidf_out_of_range_document_fails() {
    let backend = fit_tfidf();
    assert!(backend.prepare_document(99, "").is_err());
    assert!(backend.score_document(99, &["ball".to_string()]).is_err());
}

#[test]
fn tfidf_partial_seed_coverage_is_diluted() {
    let backend = fit_tfidf();
    let full = backend.score_document(0, &["ball".to_string()]).unwrap();
    let diluted = backend
        .score_document(0, &["ball".to_string(), "quark".to_string()])
        .unwrap();
    assert!(full > 0.0);
    assert!((diluted - full / 2.0).abs() < 1e-12);
}

#[test]
fn tfidf_predictions_are_seed_labels() {
    let backend = fit_tfidf();
    let seeds = SeedWords::new([
        ("sports", vec!["ball", "goal"]),
        ("politics", vec!["vote", "election"]),
        ("science", vec!["quark"]),
    ])
    .unwrap();
    let result = assign_labels(&backend, &seeds, &corpus(), &ProgressBar::hidden()).unwrap();
    assert_eq!(result.skipped, 0);
    for label in result.labels.iter().flatten() {
        assert!(seeds.get(label).is_some(), "unexpected label {label}");
    }
}

// ============================================================
// Tie-break
// ============================================================

#[test]
fn equal_scores_pick_first_label_every_time() {
    let scores = vec![
        LabelScore {
            score: 0.5,
            label: "first".to_string(),
        },
        LabelScore {
            score: 0.5,
            label: "second".to_string(),
        },
    ];
    for _ in 0..10 {
        assert_eq!(predict(&scores).unwrap().label, "first");
    }
}

#[test]
fn identical_seed_lists_tie_in_seed_file_order() {
    // Both labels share a seed list, so every document ties
    let backend = fit_tfidf();
    let seeds = SeedWords::new([("zeta", vec!["ball"]), ("alpha", vec!["ball"])]).unwrap();
    let result = assign_labels(&backend, &seeds, &corpus(), &ProgressBar::hidden()).unwrap();
    assert!(result.labels.iter().all(|l| l.as_deref() == Some("zeta")));
}

// ============================================================
// Word2Vec backend
// ============================================================

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
fn aggregate_of_one_vector_is_that_vector() {
    let v = WordVectors::from_pairs(3, [("x", vec![0.1, 0.2, 0.3])]).unwrap();
    assert_eq!(aggregate(&["x"], &v, mean_vector).unwrap(), vec![0.1, 0.2, 0.3]);
}

#[test]
fn aggregate_of_nothing_is_an_error() {
    let empty: [&str; 0] = [];
    assert!(aggregate(&empty, &table(), mean_vector).is_err());
    assert!(aggregate(&["unknown"], &table(), mean_vector).is_err());
}

#[test]
fn word2vec_label_without_known_seeds_fails() {
    let backend = Word2VecBackend::new(table(), Tokenizer::Tokenize, Similarity::Cosine);
    let seeds = SeedWords::new([("sports", vec!["ball"]), ("physics", vec!["quark"])]).unwrap();
    let err = prepare_labels(&backend, &seeds).err().unwrap();
    assert!(err.to_string().contains("physics"));
}

#[test]
fn word2vec_document_without_known_tokens_is_skipped() {
    let backend = Word2VecBackend::new(table(), Tokenizer::Tokenize, Similarity::Cosine);
    let seeds = SeedWords::new([("sports", vec!["ball"]), ("politics", vec!["vote"])]).unwrap();
    let texts = ["ball goal", "nothing known here", ""];
    let result = assign_labels(&backend, &seeds, &texts, &ProgressBar::hidden()).unwrap();
    assert_eq!(result.labels, vec![Some("sports".to_string()), None, None]);
    assert_eq!(result.skipped, 2);
}

#[test]
fn word2vec_scores_by_similarity_choice() {
    let seeds = SeedWords::new([("sports", vec!["ball"]), ("politics", vec!["vote"])]).unwrap();
    for similarity in [Similarity::Cosine, Similarity::Dot, Similarity::Euclidean] {
        let backend = Word2VecBackend::new(table(), Tokenizer::Split, similarity);
        let labels = prepare_labels(&backend, &seeds).unwrap();
        let doc = backend.prepare_document(0, "vote election").unwrap().unwrap();
        let scores = score_labels(&backend, &labels, &doc);
        assert_eq!(predict(&scores).unwrap().label, "politics", "{similarity}");
    }
}
