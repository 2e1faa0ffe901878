//! Progress rendering for usdctl.
//!
//! Bars are suppressed when `--quiet` is passed, `USDCTL_QUIET=1` is set,
//! or stderr is not a TTY, so scripted callers get clean output.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::OnceLock;

use indicatif::{ProgressBar, ProgressStyle};
use usdctl_core::{ProgressEvent, ProgressSink};

/// Global quiet mode state
static QUIET_MODE: OnceLock<bool> = OnceLock::new();

/// Initialize quiet mode from flags and environment.
///
/// Call this once at startup with the --quiet flag value.
pub fn init_quiet_mode(quiet_flag: bool) {
    let quiet = quiet_flag
        || std::env::var("USDCTL_QUIET").map(|v| v == "1").unwrap_or(false)
        || !std::io::stderr().is_terminal();

    QUIET_MODE.set(quiet).ok();
}

/// Check if we're in quiet mode
pub fn is_quiet() -> bool {
    *QUIET_MODE.get().unwrap_or(&false)
}

fn bounded_bar(len: u64) -> Option<ProgressBar> {
    if is_quiet() {
        return None;
    }

    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::with_template("{msg} [{bar:30.cyan/dim}] {pos}/{len} ({eta})")
            .expect("valid template")
            .progress_chars("━╸─"),
    );
    Some(pb)
}

/// Projects scheduler progress onto an indicatif bar; labels are the
/// output paths relative to the batch root.
pub struct BatchProgress {
    bar: Option<ProgressBar>,
    root: PathBuf,
}

impl BatchProgress {
    pub fn new(total: usize, root: impl Into<PathBuf>) -> Self {
        Self {
            bar: bounded_bar(total as u64),
            root: root.into(),
        }
    }

    /// Clear the bar so the summary prints on a clean line.
    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

impl ProgressSink for BatchProgress {
    fn report(&self, event: ProgressEvent) {
        let Some(bar) = &self.bar else { return };

        let label = event
            .output
            .strip_prefix(&self.root)
            .unwrap_or(&event.output)
            .display()
            .to_string();
        bar.set_position(event.completed as u64);
        bar.set_message(truncate_label(&label, 48));
    }
}

/// Truncate a label to a maximum char count, adding ellipsis if needed
fn truncate_label(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let mut result = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i >= max_len - 1 {
                result.push('…');
                break;
            }
            result.push(ch);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_labels_pass_through() {
        assert_eq!(truncate_label("props/car.usda", 48), "props/car.usda");
    }

    #[test]
    fn long_labels_are_truncated_on_char_boundaries() {
        let long = "x".repeat(60);
        let truncated = truncate_label(&long, 48);
        assert_eq!(truncated.chars().count(), 48);
        assert!(truncated.ends_with('…'));
    }
}
