// Colored terminal output for run reports and seed-word listings.
//
// main.rs prints through these functions; the library itself only logs.

use colored::Colorize;

use super::format_score;
use crate::data::seeds::SeedWords;
use crate::pipeline::RunReport;

/// Display the outcome of a labeling run.
pub fn display_run_report(report: &RunReport) {
    println!("\n{}", format!("=== {} ===", report.column).bold());
    println!(
        "  Macro F1: {}   Micro F1: {}",
        colorize_score(report.scores.macro_f1),
        colorize_score(report.scores.micro_f1),
    );
    println!("  Documents labeled: {}", report.documents - report.skipped);
    if report.skipped > 0 {
        println!(
            "  {} {} documents had no usable tokens and were left unlabeled",
            "!".yellow(),
            report.skipped
        );
    }
    if report.trained {
        println!("  {}", "Trained and cached new word vectors".dimmed());
    }
    println!("  Saved to: {}", report.store_path.display());
    println!("\n{}", report.results_line);
}

/// Display the seed words for each label, in seed-file order.
pub fn display_seed_words(seeds: &SeedWords) {
    println!("\n{}", format!("=== Seed words ({} labels) ===", seeds.len()).bold());
    for (label, words) in seeds.iter() {
        let list = if words.is_empty() {
            "(none)".dimmed().to_string()
        } else {
            words.join(", ")
        };
        println!("  {:<20} {}", label.cyan(), list);
    }
}

/// Color an F1 score by rough quality band.
fn colorize_score(score: f64) -> colored::ColoredString {
    let text = format_score(score);
    if score >= 0.75 {
        text.green()
    } else if score >= 0.5 {
        text.yellow()
    } else {
        text.red()
    }
}
