//! Spinner and progress bar helpers shared by the commands

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner for a single Graph round trip
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Bar over the resources of an apply or destroy run
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let bar = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.cyan} {msg} [{bar:40.cyan/blue}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░ ");
    bar.set_style(style);
    bar.set_message(message.to_string());
    bar
}

pub fn finish_spinner_success(spinner: &ProgressBar, message: &str) {
    finish_with_prefix(spinner, "{prefix:.green} {msg}", "✓", message);
}

pub fn finish_spinner_error(spinner: &ProgressBar, message: &str) {
    finish_with_prefix(spinner, "{prefix:.red} {msg}", "✗", message);
}

fn finish_with_prefix(bar: &ProgressBar, template: &str, prefix: &'static str, message: &str) {
    bar.set_style(
        ProgressStyle::default_spinner()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_prefix(prefix);
    bar.finish_with_message(message.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_spinner() {
        let spinner = create_spinner("Reading...");
        assert!(!spinner.is_finished());
        spinner.finish();
        assert!(spinner.is_finished());
    }

    #[test]
    fn test_progress_bar_counts_resources() {
        let bar = create_progress_bar(3, "Applying");
        assert_eq!(bar.length(), Some(3));
        bar.inc(2);
        assert_eq!(bar.position(), 2);
        finish_spinner_success(&bar, "Applied");
        assert!(bar.is_finished());
    }

    #[test]
    fn test_finish_with_error() {
        let spinner = create_spinner("Working...");
        finish_spinner_error(&spinner, "Failed");
        assert!(spinner.is_finished());
    }
}
