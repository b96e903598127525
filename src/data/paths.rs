// Artifact path resolution with local-then-reference fallback.
//
// Datasets live under `<root>/<set>/<gran>/`. A run first looks in the local
// data root; if the file isn't there it reads the reference copy and caches
// it locally so the next run (and the result columns it writes) stay local.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::config::Config;

/// Default label granularity.
pub const DEFAULT_GRANULARITY: &str = "coarse";

/// Known dataset aliases and the directory names they resolve to.
const DATASET_ALIASES: &[(&str, &str)] = &[
    ("NYT", "nyt"),
    ("nyt", "nyt"),
    ("TWENTY_NEWS", "20news"),
    ("20news", "20news"),
];

/// Which per-dataset artifact to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// The document store (`df.json`)
    Data,
    /// The seed-word map (`seedwords.json`)
    SeedWords,
}

impl ArtifactKind {
    pub fn file_name(self) -> &'static str {
        match self {
            ArtifactKind::Data => "df.json",
            ArtifactKind::SeedWords => "seedwords.json",
        }
    }
}

impl FromStr for ArtifactKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "data" => Ok(ArtifactKind::Data),
            "seedwords" => Ok(ArtifactKind::SeedWords),
            other => anyhow::bail!(
                "Invalid artifact type `{other}`: must be one of ['data', 'seedwords']"
            ),
        }
    }
}

/// Resolve a dataset identifier given on the command line.
///
/// Known aliases map to their directory names; anything else is used as-is
/// provided it is safe to embed in a path.
pub fn resolve_dataset(name: &str) -> Result<String> {
    if let Some((_, dir)) = DATASET_ALIASES.iter().find(|(alias, _)| *alias == name) {
        return Ok((*dir).to_string());
    }
    check_path_component("dataset", name)?;
    Ok(name.to_string())
}

/// Reject names that would escape `<root>/<set>/<gran>/`.
pub fn check_path_component(what: &str, value: &str) -> Result<()> {
    let ok = !value.is_empty()
        && value != "."
        && value != ".."
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if !ok {
        anyhow::bail!("Invalid {what} name `{value}`: use letters, digits, '_', '-' or '.'");
    }
    Ok(())
}

/// Path of an artifact under the given root.
pub fn artifact_path(root: &Path, set: &str, granularity: &str, kind: ArtifactKind) -> PathBuf {
    root.join(set).join(granularity).join(kind.file_name())
}

/// Local path of an artifact (where results are written back).
pub fn local_path(config: &Config, set: &str, granularity: &str, kind: ArtifactKind) -> PathBuf {
    artifact_path(&config.data_dir, set, granularity, kind)
}

/// Load a JSON artifact, falling back to the reference copy.
///
/// When the reference copy is used it is written to the local path before
/// returning, creating directories as needed.
pub fn load_artifact<T>(config: &Config, set: &str, granularity: &str, kind: ArtifactKind) -> Result<T>
where
    T: DeserializeOwned + Serialize,
{
    let local = local_path(config, set, granularity, kind);
    if local.is_file() {
        return read_json(&local);
    }

    let reference = artifact_path(&config.reference_dir, set, granularity, kind);
    if !reference.is_file() {
        anyhow::bail!(
            "{} not found locally ({}) or in the reference copy ({})",
            kind.file_name(),
            local.display(),
            reference.display()
        );
    }

    info!(
        reference = %reference.display(),
        local = %local.display(),
        "Artifact missing locally, using reference copy"
    );
    let value: T = read_json(&reference)?;
    write_json(&local, &value)?;
    Ok(value)
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_kind_from_str() {
        assert_eq!("data".parse::<ArtifactKind>().unwrap(), ArtifactKind::Data);
        assert_eq!(
            "seedwords".parse::<ArtifactKind>().unwrap(),
            ArtifactKind::SeedWords
        );
        let err = "model".parse::<ArtifactKind>().unwrap_err();
        assert!(err.to_string().contains("must be one of"));
    }

    #[test]
    fn test_resolve_dataset_aliases() {
        assert_eq!(resolve_dataset("NYT").unwrap(), "nyt");
        assert_eq!(resolve_dataset("TWENTY_NEWS").unwrap(), "20news");
        assert_eq!(resolve_dataset("agnews").unwrap(), "agnews");
    }

    #[test]
    fn test_resolve_dataset_rejects_traversal() {
        assert!(resolve_dataset("..").is_err());
        assert!(resolve_dataset("a/b").is_err());
        assert!(resolve_dataset("").is_err());
    }

    #[test]
    fn test_artifact_path_layout() {
        let path = artifact_path(Path::new("data"), "nyt", "fine", ArtifactKind::SeedWords);
        assert_eq!(path, PathBuf::from("data/nyt/fine/seedwords.json"));
    }
}
