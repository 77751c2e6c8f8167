use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};

use crate::audit::ProgressCallback;

pub fn frame_bar_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{prefix:<10} {bar:40.cyan/blue} {percent:>3}% {pos}/{len} frames [{elapsed_precise}<{eta_precise}] {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
}

pub fn frame_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    bar.set_style(frame_bar_style());
    bar.set_prefix("auditing");
    bar
}

/// Advances `bar` by one frame per call. Workers report completions in any
/// order, so the reported count is not used as a position.
pub fn frame_callback(bar: &ProgressBar) -> ProgressCallback {
    let bar = bar.clone();
    Arc::new(move |_done: u64| bar.inc(1))
}
