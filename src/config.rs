use std::env;
use std::path::PathBuf;

use anyhow::Result;

/// Default location of the reference copy of the datasets, relative to the
/// working directory.
pub const DEFAULT_REFERENCE_DIR: &str = "../ConWea/data";

/// Central configuration loaded from environment variables.
///
/// Nothing here is secret; the .env file is loaded at startup via dotenvy
/// so per-checkout overrides can live next to the data.
#[derive(Debug, Clone)]
pub struct Config {
    /// Local data root: `<data_dir>/<set>/<gran>/{df.json,seedwords.json}`
    pub data_dir: PathBuf,
    /// Reference data root consulted when a local artifact is missing
    pub reference_dir: PathBuf,
    /// Where trained word vectors are cached
    pub models_dir: PathBuf,
    /// Append-only log of F1 results, one line per run
    pub results_file: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every setting has a default, so this only fails if a variable is set
    /// to an empty string.
    pub fn load() -> Result<Self> {
        let config = Self {
            data_dir: path_var("WEAKLABEL_DATA_DIR", "data"),
            reference_dir: path_var("WEAKLABEL_REFERENCE_DIR", DEFAULT_REFERENCE_DIR),
            models_dir: path_var("WEAKLABEL_MODELS_DIR", "models"),
            results_file: path_var("WEAKLABEL_RESULTS_FILE", "f1_scores.txt"),
        };
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration rooted at a single directory (tests, scripting).
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            data_dir: root.join("data"),
            reference_dir: root.join("reference"),
            models_dir: root.join("models"),
            results_file: root.join("f1_scores.txt"),
        }
    }

    fn validate(&self) -> Result<()> {
        for (name, path) in [
            ("WEAKLABEL_DATA_DIR", &self.data_dir),
            ("WEAKLABEL_REFERENCE_DIR", &self.reference_dir),
            ("WEAKLABEL_MODELS_DIR", &self.models_dir),
            ("WEAKLABEL_RESULTS_FILE", &self.results_file),
        ] {
            if path.as_os_str().is_empty() {
                anyhow::bail!("{name} is set but empty. Unset it to use the default.");
            }
        }
        Ok(())
    }
}

fn path_var(name: &str, default: &str) -> PathBuf {
    env::var(name)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rooted_at_layout() {
        let config = Config::rooted_at("/tmp/wl");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/wl/data"));
        assert_eq!(config.reference_dir, PathBuf::from("/tmp/wl/reference"));
        assert_eq!(config.models_dir, PathBuf::from("/tmp/wl/models"));
        assert_eq!(config.results_file, PathBuf::from("/tmp/wl/f1_scores.txt"));
    }

    #[test]
    fn test_validate_rejects_empty_path() {
        let mut config = Config::rooted_at("/tmp/wl");
        config.models_dir = PathBuf::new();
        assert!(config.validate().is_err());
    }
}
