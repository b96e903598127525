// Text preparation: cleaning and the pluggable tokenizers.
//
// Tokenizers are named on the command line and the non-default ones are
// folded into the embedding cache key, so each variant has a stable name.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use anyhow::Result;
use regex::Regex;

fn non_word() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\W+").expect("valid regex"))
}

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

/// Runs of word characters other than digits (letters, marks, `_`).
fn alphabetic_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\w&&\D]+").expect("valid regex"))
}

fn word_or_punct() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\w+(?:'\w+)?|[^\w\s]").expect("valid regex"))
}

/// Lowercase, replace runs of non-word characters with a space, and
/// collapse whitespace.
pub fn clean_string(s: &str) -> String {
    let lower = s.to_lowercase();
    let spaced = non_word().replace_all(&lower, " ");
    whitespace_run().replace_all(&spaced, " ").into_owned()
}

/// Tokenizer selector for the embedding backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tokenizer {
    /// Runs of alphabetic characters; digits and punctuation are dropped
    #[default]
    Tokenize,
    /// Words (keeping inner apostrophes) plus punctuation marks as tokens
    WordTokenize,
    /// Plain whitespace split
    Split,
}

impl Tokenizer {
    pub fn name(self) -> &'static str {
        match self {
            Tokenizer::Tokenize => "tokenize",
            Tokenizer::WordTokenize => "word_tokenize",
            Tokenizer::Split => "split",
        }
    }

    pub fn is_default(self) -> bool {
        self == Tokenizer::default()
    }

    pub fn tokenize(self, text: &str) -> Vec<String> {
        match self {
            Tokenizer::Tokenize => alphabetic_run()
                .find_iter(text)
                .map(|m| m.as_str().to_string())
                .collect(),
            Tokenizer::WordTokenize => word_or_punct()
                .find_iter(text)
                .map(|m| m.as_str().to_string())
                .collect(),
            Tokenizer::Split => text.split_whitespace().map(str::to_string).collect(),
        }
    }
}

impl fmt::Display for Tokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tokenizer {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tokenize" => Ok(Tokenizer::Tokenize),
            "word_tokenize" => Ok(Tokenizer::WordTokenize),
            "split" => Ok(Tokenizer::Split),
            other => anyhow::bail!(
                "Unknown tokenizer `{other}`: expected one of tokenize, word_tokenize, split"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_string() {
        assert_eq!(clean_string("Hello,   World!! 42"), "hello world 42");
        assert_eq!(clean_string("tab\tand\nnewline"), "tab and newline");
    }

    #[test]
    fn test_tokenize_drops_digits_and_punctuation() {
        let tokens = Tokenizer::Tokenize.tokenize("The ball, 2 goals!");
        assert_eq!(tokens, vec!["The", "ball", "goals"]);
    }

    #[test]
    fn test_word_tokenize_keeps_punctuation() {
        let tokens = Tokenizer::WordTokenize.tokenize("It's a goal!");
        assert_eq!(tokens, vec!["It's", "a", "goal", "!"]);
    }

    #[test]
    fn test_clean_string_keeps_accented_letters() {
        assert_eq!(clean_string("Café"), "café");
        assert_eq!(clean_string("Café naïve, Zürich!"), "café naïve zürich");
    }

    #[test]
    fn test_tokenizers_keep_accented_words_whole() {
        assert_eq!(
            Tokenizer::Tokenize.tokenize("Café naïve Zürich"),
            vec!["Café", "naïve", "Zürich"]
        );
        assert_eq!(
            Tokenizer::WordTokenize.tokenize("L'été à Zürich."),
            vec!["L'été", "à", "Zürich", "."]
        );
    }

    #[test]
    fn test_split() {
        assert_eq!(Tokenizer::Split.tokenize(" a  b\tc "), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_from_str_round_trip() {
        for t in [Tokenizer::Tokenize, Tokenizer::WordTokenize, Tokenizer::Split] {
            assert_eq!(t.name().parse::<Tokenizer>().unwrap(), t);
        }
        assert!("nltk".parse::<Tokenizer>().is_err());
    }
}
