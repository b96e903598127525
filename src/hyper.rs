// Hyperparameters: parsing `name=value` tokens and rendering signatures.
//
// A hyperparameter set does double duty: it configures a backend, and its
// rendered signature names both the cached artifacts a run produces and the
// result column it writes. Two runs with the same backend and the same
// parameters must land on the same artifact and overwrite the same column,
// so the set is kept in canonical (sorted) order regardless of the order the
// tokens arrived in.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::Result;

/// A single coerced hyperparameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum HyperValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl HyperValue {
    /// Best-effort coercion: integer first, then float, then the raw string.
    pub fn coerce(raw: &str) -> Self {
        if let Ok(i) = raw.parse::<i64>() {
            HyperValue::Int(i)
        } else if let Ok(f) = raw.parse::<f64>() {
            HyperValue::Float(f)
        } else {
            HyperValue::Str(raw.to_string())
        }
    }

    /// Render the value the way it appears inside a mapping repr:
    /// strings quoted, numbers bare.
    fn repr(&self) -> String {
        match self {
            HyperValue::Str(s) => format!("'{s}'"),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for HyperValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HyperValue::Int(i) => write!(f, "{i}"),
            HyperValue::Float(x) => f.write_str(&format_float(*x)),
            HyperValue::Str(s) => f.write_str(s),
        }
    }
}

/// Render a float the way Python's `repr` does: shortest round-trip digits,
/// `.0` on whole numbers, and a signed two-digit exponent (`1e-05`, `1e+16`)
/// outside `[1e-4, 1e16)`.
pub fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    let debug = format!("{x:?}");
    let Some((mantissa, exponent)) = debug.split_once('e') else {
        return debug;
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}

/// A canonically ordered mapping of hyperparameter name to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HyperParams {
    values: BTreeMap<String, HyperValue>,
}

impl HyperParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse CLI tokens of the form `name=value`.
    ///
    /// Splits on the first `=`, so values may themselves contain `=`.
    /// A repeated name keeps the last value given.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        let mut params = Self::new();
        for token in tokens {
            let token = token.as_ref();
            let Some((name, value)) = token.split_once('=') else {
                anyhow::bail!(
                    "Invalid hyperparameter `{token}`: expected the form `name=value`"
                );
            };
            let name = name.trim();
            if name.is_empty() {
                anyhow::bail!("Invalid hyperparameter `{token}`: name is empty");
            }
            params.insert(name, HyperValue::coerce(value.trim()));
        }
        Ok(params)
    }

    pub fn insert(&mut self, name: &str, value: HyperValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&HyperValue> {
        self.values.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HyperValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merge `other` into a copy of `self`; entries in `other` win.
    pub fn merged(&self, other: &HyperParams) -> HyperParams {
        let mut values = self.values.clone();
        values.extend(other.values.iter().map(|(k, v)| (k.clone(), v.clone())));
        HyperParams { values }
    }

    /// Render as a mapping literal, e.g. `{'epochs': 40, 'norm': 'l1'}`.
    pub fn to_mapping_string(&self) -> String {
        let body: Vec<String> = self
            .values
            .iter()
            .map(|(k, v)| format!("'{k}': {}", v.repr()))
            .collect();
        format!("{{{}}}", body.join(", "))
    }
}

/// Render a hyperparameter set into a stable, filesystem-friendly string.
///
/// Format: `prefix`, then `_` if both the prefix and the set are non-empty,
/// then `name-value` pairs joined by `_`, then `suffix`. No escaping is done;
/// values containing path separators will produce unusable file names.
pub fn signature(prefix: &str, params: &HyperParams, suffix: &str) -> String {
    let mut out = String::from(prefix);
    if !params.is_empty() {
        if !prefix.is_empty() {
            out.push('_');
        }
        let pairs: Vec<String> = params.iter().map(|(k, v)| format!("{k}-{v}")).collect();
        out.push_str(&pairs.join("_"));
    }
    out.push_str(suffix);
    out
}

/// The result-column style for a backend: `"<tag> <signature>"`, with
/// `auto` standing in for an empty signature.
pub fn style_name(backend_tag: &str, params: &HyperParams) -> String {
    let sig = signature("", params, "");
    if sig.is_empty() {
        format!("{backend_tag} auto")
    } else {
        format!("{backend_tag} {sig}")
    }
}

/// Typed accessors used by backends when validating their parameter sets.
pub(crate) fn expect_usize(name: &str, value: &HyperValue) -> Result<usize> {
    match value {
        HyperValue::Int(i) if *i >= 0 => Ok(*i as usize),
        other => anyhow::bail!("Hyperparameter `{name}` must be a non-negative integer, got `{other}`"),
    }
}

pub(crate) fn expect_f64(name: &str, value: &HyperValue) -> Result<f64> {
    match value {
        HyperValue::Int(i) => Ok(*i as f64),
        HyperValue::Float(f) => Ok(*f),
        other => anyhow::bail!("Hyperparameter `{name}` must be a number, got `{other}`"),
    }
}

pub(crate) fn expect_bool(name: &str, value: &HyperValue) -> Result<bool> {
    match value {
        HyperValue::Int(0) => Ok(false),
        HyperValue::Int(1) => Ok(true),
        HyperValue::Str(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        HyperValue::Str(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        other => anyhow::bail!("Hyperparameter `{name}` must be a boolean, got `{other}`"),
    }
}
