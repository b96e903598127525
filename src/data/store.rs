// DocumentStore: the tabular corpus that result columns are written into.
//
// Each record carries the raw text, the ground-truth label, an optional
// cached cleaned text, and any number of weak-label columns keyed by style
// name (e.g. "tfidf auto"). Row order is the join key between a backend's
// predictions and the store, so rows are never reordered or dropped.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use super::paths::{load_artifact, write_json, ArtifactKind};

/// Names that a weak-label column may not take.
const RESERVED_COLUMNS: &[&str] = &["index", "sentence", "label", "sentence_clean"];

/// A single document record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Stable row index carried over from the source dataset
    pub index: u64,
    /// Raw document text
    pub sentence: String,
    /// Ground-truth label
    pub label: String,
    /// Cleaned text, cached after the first `--clean` run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentence_clean: Option<String>,
    /// Weak-label columns; `None` marks a document that could not be scored
    #[serde(flatten)]
    pub weak_labels: BTreeMap<String, Option<String>>,
}

impl Document {
    pub fn new(index: u64, sentence: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            index,
            sentence: sentence.into(),
            label: label.into(),
            sentence_clean: None,
            weak_labels: BTreeMap::new(),
        }
    }
}

/// An ordered collection of documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentStore {
    documents: Vec<Document>,
}

impl DocumentStore {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Load `df.json` for a dataset, with reference fallback.
    pub fn load(config: &Config, set: &str, granularity: &str) -> Result<Self> {
        let store: DocumentStore = load_artifact(config, set, granularity, ArtifactKind::Data)?;
        if store.is_empty() {
            anyhow::bail!("Document store for {set}-{granularity} contains no documents");
        }
        Ok(store)
    }

    /// Persist the whole store to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, self)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Raw text of every document, in row order.
    pub fn sentences(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.sentence.as_str()).collect()
    }

    /// Ground-truth labels, in row order.
    pub fn true_labels(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.label.as_str()).collect()
    }

    /// Whether every document already carries a cleaned text.
    pub fn has_clean_text(&self) -> bool {
        self.documents.iter().all(|d| d.sentence_clean.is_some())
    }

    /// Fill in `sentence_clean` for every document that lacks it.
    ///
    /// Returns the number of documents that were cleaned.
    pub fn ensure_clean_text(&mut self, clean: impl Fn(&str) -> String) -> usize {
        let mut cleaned = 0;
        for doc in &mut self.documents {
            if doc.sentence_clean.is_none() {
                doc.sentence_clean = Some(clean(&doc.sentence));
                cleaned += 1;
            }
        }
        cleaned
    }

    /// Text to score, in row order: cleaned if requested and available.
    pub fn texts(&self, use_clean: bool) -> Vec<&str> {
        self.documents
            .iter()
            .map(|d| match (&d.sentence_clean, use_clean) {
                (Some(clean), true) => clean.as_str(),
                _ => d.sentence.as_str(),
            })
            .collect()
    }

    /// Write a full weak-label column, replacing any previous column of the
    /// same name. The column must have exactly one cell per document.
    pub fn set_column(&mut self, name: &str, values: Vec<Option<String>>) -> Result<()> {
        if RESERVED_COLUMNS.contains(&name) {
            anyhow::bail!("`{name}` is a reserved column name");
        }
        if values.len() != self.documents.len() {
            anyhow::bail!(
                "Column `{name}` has {} values but the store has {} documents",
                values.len(),
                self.documents.len()
            );
        }
        for (doc, value) in self.documents.iter_mut().zip(values) {
            doc.weak_labels.insert(name.to_string(), value);
        }
        Ok(())
    }

    /// Read a weak-label column back; `None` if no document has it.
    pub fn column(&self, name: &str) -> Option<Vec<Option<&str>>> {
        if !self.documents.iter().any(|d| d.weak_labels.contains_key(name)) {
            return None;
        }
        Some(
            self.documents
                .iter()
                .map(|d| d.weak_labels.get(name).and_then(|v| v.as_deref()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> DocumentStore {
        DocumentStore::new(vec![
            Document::new(0, "The Ball!", "sports"),
            Document::new(1, "Vote now", "politics"),
        ])
    }

    #[test]
    fn test_set_column_length_mismatch() {
        let mut store = sample_store();
        let result = store.set_column("tfidf auto", vec![Some("sports".into())]);
        assert!(result.is_err());
        assert!(store.column("tfidf auto").is_none());
    }

    #[test]
    fn test_set_column_rejects_reserved_name() {
        let mut store = sample_store();
        assert!(store.set_column("label", vec![None, None]).is_err());
    }

    #[test]
    fn test_set_column_overwrites() {
        let mut store = sample_store();
        store
            .set_column("tfidf auto", vec![Some("a".into()), Some("b".into())])
            .unwrap();
        store
            .set_column("tfidf auto", vec![Some("c".into()), None])
            .unwrap();
        assert_eq!(store.column("tfidf auto").unwrap(), vec![Some("c"), None]);
    }

    #[test]
    fn test_json_round_trip_with_weak_labels() {
        let mut store = sample_store();
        store
            .set_column("w2v auto", vec![Some("sports".into()), None])
            .unwrap();
        let json = serde_json::to_string(&store).unwrap();
        let back: DocumentStore = serde_json::from_str(&json).unwrap();
        assert_eq!(back, store);
        assert!(json.contains("\"w2v auto\":null"));
    }

    #[test]
    fn test_ensure_clean_text_only_fills_missing() {
        let mut store = sample_store();
        store.documents[0].sentence_clean = Some("cached".into());
        let cleaned = store.ensure_clean_text(|s| s.to_lowercase());
        assert_eq!(cleaned, 1);
        assert_eq!(store.texts(true), vec!["cached", "vote now"]);
        assert_eq!(store.texts(false), vec!["The Ball!", "Vote now"]);
        assert!(store.has_clean_text());
    }
}
