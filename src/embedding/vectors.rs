// WordVectors: a word → vector table and its on-disk text format.
//
// The cache format is the standard word2vec text layout: a header line with
// the vocabulary size and dimension, then one line per word with the word
// followed by its space-separated components. A file that doesn't parse is
// reported as an error; it is never silently retrained over.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

/// A dense table of word vectors, all of the same dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct WordVectors {
    dim: usize,
    words: Vec<String>,
    index: HashMap<String, usize>,
    /// Row-major, `words.len() * dim` values
    data: Vec<f32>,
}

impl WordVectors {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            words: Vec::new(),
            index: HashMap::new(),
            data: Vec::new(),
        }
    }

    /// Build a table from `(word, vector)` pairs.
    pub fn from_pairs<W: Into<String>>(dim: usize, pairs: impl IntoIterator<Item = (W, Vec<f32>)>) -> Result<Self> {
        let mut vectors = Self::new(dim);
        for (word, vector) in pairs {
            vectors.push(word.into(), &vector)?;
        }
        Ok(vectors)
    }

    /// Append a word. Fails on a dimension mismatch or a duplicate word.
    pub fn push(&mut self, word: String, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dim {
            anyhow::bail!(
                "Vector for `{word}` has {} components, expected {}",
                vector.len(),
                self.dim
            );
        }
        if self.index.contains_key(&word) {
            anyhow::bail!("Duplicate word `{word}` in word vectors");
        }
        self.index.insert(word.clone(), self.words.len());
        self.words.push(word);
        self.data.extend_from_slice(vector);
        Ok(())
    }

    pub fn get(&self, word: &str) -> Option<&[f32]> {
        self.index
            .get(word)
            .map(|&i| &self.data[i * self.dim..(i + 1) * self.dim])
    }

    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Write the table in word2vec text format.
    pub fn save_text(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let mut out = String::new();
        let _ = writeln!(out, "{} {}", self.words.len(), self.dim);
        for (i, word) in self.words.iter().enumerate() {
            out.push_str(word);
            for value in &self.data[i * self.dim..(i + 1) * self.dim] {
                let _ = write!(out, " {value}");
            }
            out.push('\n');
        }

        std::fs::write(path, out).with_context(|| format!("Failed to write {}", path.display()))?;
        debug!(path = %path.display(), words = self.words.len(), "Saved word vectors");
        Ok(())
    }

    /// Read a table written in word2vec text format.
    pub fn load_text(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read word vectors from {}", path.display()))?;
        Self::parse_text(&raw).with_context(|| format!("Malformed word vectors in {}", path.display()))
    }

    fn parse_text(raw: &str) -> Result<Self> {
        let mut lines = raw.lines();
        let header = lines.next().context("File is empty")?;
        let mut parts = header.split_whitespace();
        let (Some(count), Some(dim), None) = (parts.next(), parts.next(), parts.next()) else {
            anyhow::bail!("Header must be `<vocab size> <dimension>`, got `{header}`");
        };
        let count: usize = count.parse().context("Invalid vocabulary size in header")?;
        let dim: usize = dim.parse().context("Invalid dimension in header")?;

        let mut vectors = Self::new(dim);
        for (line_no, line) in lines.enumerate().filter(|(_, l)| !l.trim().is_empty()) {
            let mut fields = line.split(' ').filter(|f| !f.is_empty());
            let word = fields
                .next()
                .with_context(|| format!("Line {} has no word", line_no + 2))?;
            let values: Vec<f32> = fields
                .map(str::parse::<f32>)
                .collect::<Result<_, _>>()
                .with_context(|| format!("Line {} has a non-numeric component", line_no + 2))?;
            vectors
                .push(word.to_string(), &values)
                .with_context(|| format!("Line {}", line_no + 2))?;
        }

        if vectors.len() != count {
            anyhow::bail!(
                "Header declares {count} words but {} were read",
                vectors.len()
            );
        }
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_contains() {
        let v = WordVectors::from_pairs(2, [("ball", vec![1.0, 0.0]), ("vote", vec![0.0, 1.0])])
            .unwrap();
        assert_eq!(v.get("ball"), Some(&[1.0, 0.0][..]));
        assert!(v.contains("vote"));
        assert!(v.get("goal").is_none());
        assert_eq!(v.len(), 2);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let result = WordVectors::from_pairs(2, [("ball", vec![1.0])]);
        assert!(result.is_err());
    }

    #[test]
    fn test_text_format_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("vectors.txt");
        let v = WordVectors::from_pairs(3, [("a", vec![0.5, -1.25, 3.0]), ("b", vec![0.0, 0.0, 1e-3])])
            .unwrap();
        v.save_text(&path).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("2 3\n"));
        assert_eq!(WordVectors::load_text(&path).unwrap(), v);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        assert!(WordVectors::parse_text("").is_err());
        assert!(WordVectors::parse_text("2 2\nball 1 0\n").is_err());
        assert!(WordVectors::parse_text("1 2\nball 1 x\n").is_err());
        assert!(WordVectors::parse_text("1 2\nball 1 0 0\n").is_err());
    }
}
