// SeedWords: the human-provided label → seed-word lists.
//
// Label order matters: when two labels score identically, the one listed
// first wins. JSON objects are therefore read and written in document order
// rather than through a hash map.

use std::fmt;

use anyhow::Result;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::Config;
use super::paths::{load_artifact, ArtifactKind};

/// An ordered mapping from label name to its seed words.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedWords {
    entries: Vec<(String, Vec<String>)>,
}

impl SeedWords {
    /// Build from `(label, seeds)` pairs, rejecting duplicate labels.
    pub fn new<L, W>(entries: impl IntoIterator<Item = (L, Vec<W>)>) -> Result<Self>
    where
        L: Into<String>,
        W: Into<String>,
    {
        let mut seeds = Self::default();
        for (label, words) in entries {
            let label = label.into();
            if seeds.get(&label).is_some() {
                anyhow::bail!("Duplicate label `{label}` in seed words");
            }
            seeds
                .entries
                .push((label, words.into_iter().map(Into::into).collect()));
        }
        Ok(seeds)
    }

    /// Load `seedwords.json` for a dataset, with reference fallback.
    pub fn load(config: &Config, set: &str, granularity: &str) -> Result<Self> {
        let seeds: SeedWords = load_artifact(config, set, granularity, ArtifactKind::SeedWords)?;
        if seeds.is_empty() {
            anyhow::bail!("Seed-word file for {set}-{granularity} defines no labels");
        }
        Ok(seeds)
    }

    pub fn get(&self, label: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, words)| words.as_slice())
    }

    /// Iterate labels and their seed words in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(l, w)| (l.as_str(), w.as_slice()))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for SeedWords {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, words) in &self.entries {
            map.serialize_entry(label, words)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SeedWords {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = SeedWords;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping label names to lists of seed words")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<SeedWords, A::Error> {
                let mut seeds = SeedWords::default();
                while let Some((label, words)) = access.next_entry::<String, Vec<String>>()? {
                    if seeds.get(&label).is_some() {
                        return Err(serde::de::Error::custom(format!(
                            "duplicate label `{label}`"
                        )));
                    }
                    seeds.entries.push((label, words));
                }
                Ok(seeds)
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_preserves_label_order() {
        let json = r#"{"zeta": ["z"], "alpha": ["a", "b"], "mid": []}"#;
        let seeds: SeedWords = serde_json::from_str(json).unwrap();
        let labels: Vec<&str> = seeds.labels().collect();
        assert_eq!(labels, vec!["zeta", "alpha", "mid"]);
        assert_eq!(seeds.get("alpha").unwrap(), &["a".to_string(), "b".to_string()]);
        assert!(seeds.get("mid").unwrap().is_empty());
    }

    #[test]
    fn test_json_round_trip_keeps_order() {
        let seeds = SeedWords::new([("sports", vec!["ball"]), ("arts", vec!["paint"])]).unwrap();
        let json = serde_json::to_string(&seeds).unwrap();
        assert_eq!(json, r#"{"sports":["ball"],"arts":["paint"]}"#);
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let result = SeedWords::new([("a", vec!["x"]), ("a", vec!["y"])]);
        assert!(result.is_err());
    }
}
