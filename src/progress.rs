//! Terminal progress reporting for downloads

use human_bytes::human_bytes;
use indicatif::{ProgressBar, ProgressState, ProgressStyle as IndicatifStyle};
use std::fmt::Write;
use std::time::Duration;

/// Progress display style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStyle {
    /// Known length: bar, percentage, rate and ETA
    Download,
    /// Unknown length: spinner with byte count and rate
    Stream,
}

impl ProgressStyle {
    /// `Stream` when the server did not report a length
    pub fn for_total(total: u64) -> Self {
        if total == 0 {
            ProgressStyle::Stream
        } else {
            ProgressStyle::Download
        }
    }
}

/// Create a progress bar with the specified style
pub fn create_progress_bar(total: u64, style: ProgressStyle) -> ProgressBar {
    let bar = match style {
        ProgressStyle::Download => ProgressBar::new(total),
        ProgressStyle::Stream => ProgressBar::new_spinner(),
    };
    apply_style(&bar, style);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

fn write_rate(state: &ProgressState, w: &mut dyn Write) {
    let bytes_per_sec = state.per_sec();
    if bytes_per_sec > 1_048_576.0 {
        let _ = write!(w, "{:>7.2} MiB/s", bytes_per_sec / 1_048_576.0);
    } else if bytes_per_sec > 1024.0 {
        let _ = write!(w, "{:>7.2} KiB/s", bytes_per_sec / 1024.0);
    } else {
        let _ = write!(w, "{:>7.0}  B/s", bytes_per_sec);
    }
}

/// Apply a style to an existing progress bar
pub fn apply_style(bar: &ProgressBar, style: ProgressStyle) {
    let template = match style {
        ProgressStyle::Download => {
            "[{bar:40.cyan/blue}] {percent:>3}% {bytes:>10}/{total_bytes:<10} {bytes_per_sec:>12} ETA {eta:>5} {msg}"
        }
        ProgressStyle::Stream => "{spinner:.cyan} {bytes:>10} {bytes_per_sec:>12} {msg}",
    };

    let Ok(indicatif_style) = IndicatifStyle::with_template(template) else {
        tracing::debug!("Invalid progress template, keeping the default style");
        return;
    };

    bar.set_style(
        indicatif_style
            .progress_chars("━━╸ ")
            .with_key("eta", |state: &ProgressState, w: &mut dyn Write| {
                let _ = write!(w, "{:>5.0}s", state.eta().as_secs_f64());
            })
            .with_key("bytes_per_sec", write_rate),
    );
}

/// `"{percent}% ({current}/{total})"`, or just the byte count when `total` is 0
pub fn format_progress(current: u64, total: u64) -> String {
    if total == 0 {
        return human_bytes(current as f64);
    }
    let percent = (current.min(total) as f64 / total as f64 * 100.0).floor();
    format!(
        "{:.0}% ({}/{})",
        percent,
        human_bytes(current as f64),
        human_bytes(total as f64)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_for_total() {
        assert_eq!(ProgressStyle::for_total(0), ProgressStyle::Stream);
        assert_eq!(ProgressStyle::for_total(10), ProgressStyle::Download);
    }

    #[test]
    fn test_format_progress() {
        let kib = human_bytes(1024.0);
        assert_eq!(format_progress(512, 1024), format!("50% ({}/{})", human_bytes(512.0), kib));
        assert_eq!(format_progress(1024, 1024), format!("100% ({}/{})", kib, kib));
        assert_eq!(format_progress(2048, 0), human_bytes(2048.0));
    }

    #[test]
    fn test_create_progress_bar() {
        let bar = create_progress_bar(100, ProgressStyle::Download);
        assert_eq!(bar.length(), Some(100));
        bar.finish_and_clear();

        let spinner = create_progress_bar(0, ProgressStyle::for_total(0));
        spinner.set_position(42);
        assert_eq!(spinner.position(), 42);
        spinner.finish_and_clear();
    }
}
