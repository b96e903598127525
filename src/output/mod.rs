// Output formatting: terminal display and progress indicators.

pub mod terminal;

use indicatif::{ProgressBar, ProgressStyle};

/// A progress bar in the shared `  <label> [bar] pos/len (eta)` style.
pub fn progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!("  {label} [{{bar:30}}] {{pos}}/{{len}} ({{eta}})"))
            .expect("progress template is valid"),
    );
    pb
}

/// Format a score for display: fixed four decimals.
pub fn format_score(score: f64) -> String {
    format!("{score:.4}")
}
