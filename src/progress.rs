//! Console output
//!
//! Styled status lines, the scan spinner and the end-of-run term counts.

use crate::output::OutputSummary;
use bytesize::ByteSize;
use colored::*;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Print the application banner
pub fn print_banner() {
    let banner = r#"
╔══════════════════════════════════════════════════════════════╗
║                        DICT-FILTER                           ║
║            Term Dictionary Filtering and Merging             ║
╚══════════════════════════════════════════════════════════════╝"#;

    println!("{}", banner.green());
}

/// Print a section header
pub fn print_header(text: &str) {
    println!("\n{} {}", "▶".green(), text.green().bold());
}

/// Print an info message
pub fn print_info(text: &str) {
    println!("  {} {}", "ℹ".cyan(), text);
}

/// Print a success message
pub fn print_success(text: &str) {
    println!("  {} {}", "✔".green(), text.green());
}

/// Print a warning message
pub fn print_warning(text: &str) {
    println!("  {} {}", "⚠".yellow(), text.yellow());
}

/// Print an error message
pub fn print_error(text: &str) {
    eprintln!("  {} {}", "✖".red(), text.red());
}

/// Print a bullet point
pub fn print_bullet(text: &str) {
    println!("  {} {}", "•".green(), text);
}

/// Spinner counting scanned terms; hidden in quiet mode
pub fn create_term_spinner(msg: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();

    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} terms {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
    );

    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    pb
}

/// Term counts for one scanned document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TermCounts {
    /// Every term seen
    pub scanned: u64,
    /// Terms dropped because they are disabled
    pub disabled: u64,
    /// Terms written to the output
    pub selected: u64,
}

impl TermCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_scanned(&mut self) {
        self.scanned += 1;
    }

    pub fn add_disabled(&mut self) {
        self.disabled += 1;
    }

    pub fn add_selected(&mut self) {
        self.selected += 1;
    }

    /// Enabled terms the selection turned down
    pub fn rejected(&self) -> u64 {
        self.scanned
            .saturating_sub(self.disabled)
            .saturating_sub(self.selected)
    }

    fn print_rows(&self) {
        println!("  {} {}", "Terms found:    ".green(), format_number(self.scanned));
        println!("  {} {}", "Disabled:       ".yellow(), format_number(self.disabled));
        println!("  {} {}", "Not selected:   ".green(), format_number(self.rejected()));
        println!(
            "  {} {}",
            "Written:        ".green().bold(),
            format_number(self.selected).green().bold()
        );
    }
}

impl fmt::Display for TermCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} terms found, {} disabled, {} written",
            format_number(self.scanned),
            format_number(self.disabled),
            format_number(self.selected)
        )
    }
}

impl std::ops::Add for TermCounts {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            scanned: self.scanned + other.scanned,
            disabled: self.disabled + other.disabled,
            selected: self.selected + other.selected,
        }
    }
}

/// Print the result of a single-document filter
pub fn print_filter_summary(counts: &TermCounts, output: &OutputSummary, elapsed: Duration) {
    print_rule("FILTER COMPLETE");
    counts.print_rows();
    print_footer(output, elapsed);
}

/// Print the result of a merge, one block per source plus totals
pub fn print_merge_summary(
    sources: [(&Path, &TermCounts); 2],
    output: &OutputSummary,
    elapsed: Duration,
) {
    print_rule("MERGE COMPLETE");

    let mut total = TermCounts::new();
    for (label, (path, counts)) in ["File A", "File B"].iter().zip(sources) {
        println!("  {} {:?}", format!("{}:", label).cyan().bold(), path);
        counts.print_rows();
        println!();
        total = total + *counts;
    }

    println!("  {}", "Total:".cyan().bold());
    total.print_rows();
    print_footer(output, elapsed);
}

/// Counts on one line, for quiet runs
pub fn print_counts_line(counts: &TermCounts, output: &OutputSummary) {
    println!("{} -> {:?}", counts, output.path);
}

fn print_rule(title: &str) {
    println!();
    println!("{}", "═".repeat(60).green());
    println!("{}", format!("{:^60}", title).green().bold());
    println!("{}", "═".repeat(60).green());
    println!();
}

fn print_footer(output: &OutputSummary, elapsed: Duration) {
    println!();
    println!("  {} {:?}", "Output:         ".green(), output.path);
    println!("  {} {}", "Output size:    ".green(), ByteSize(output.bytes));
    println!("  {} {}", "Duration:       ".green(), HumanDuration(elapsed));
    println!();
    println!("{}", "═".repeat(60).green());
}

/// Format a number with thousand separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let chars: Vec<char> = s.chars().collect();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }

    result
}
