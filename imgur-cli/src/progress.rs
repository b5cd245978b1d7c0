// ABOUTME: Terminal progress rendering for uploads using indicatif
// ABOUTME: Follows an SDK progress channel, switching from spinner to bar once the size is known

use crate::constants::progress as style;
use imgur_sdk::UploadProgress;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::sync::{oneshot, watch};

pub struct UploadBar {
    bar: ProgressBar,
    sized: bool,
    last: UploadProgress,
}

impl UploadBar {
    pub fn new(label: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(spinner_style());
        bar.set_message(format!("Uploading {}", label));
        bar.enable_steady_tick(Duration::from_millis(style::TICK_MS));
        Self {
            bar,
            sized: false,
            last: UploadProgress::default(),
        }
    }

    /// Track progress without drawing anything, for non-interactive runs
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            sized: false,
            last: UploadProgress::default(),
        }
    }

    pub fn update(&mut self, progress: UploadProgress) {
        if let (Some(total), false) = (progress.total, self.sized) {
            self.bar.set_length(total);
            self.bar.set_style(bar_style());
            self.sized = true;
        }
        self.bar.set_position(progress.completed);
        self.last = progress;
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn is_sized(&self) -> bool {
        self.sized
    }

    /// Drive the bar from `progress` until the sender goes away or `done` fires
    pub async fn follow(
        mut self,
        mut progress: watch::Receiver<UploadProgress>,
        mut done: oneshot::Receiver<()>,
    ) -> Self {
        loop {
            let snapshot = *progress.borrow_and_update();
            self.update(snapshot);
            tokio::select! {
                changed = progress.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = &mut done => {
                    let snapshot = *progress.borrow();
                    self.update(snapshot);
                    break;
                }
            }
        }
        self
    }

    /// Bytes sent, with the percentage once the total is known
    pub fn summary(&self) -> String {
        let sent = format_bytes(self.last.completed);
        match self.last.fraction().filter(|_| self.is_sized()) {
            Some(fraction) => format!("{}, {:.0}%", sent, fraction * 100.0),
            None => sent,
        }
    }

    pub fn finish(&self, outcome: &str) {
        self.bar
            .finish_with_message(format!("{} ({})", outcome, self.summary()));
    }

    pub fn abandon(&self) {
        self.bar
            .abandon_with_message(format!("Stopped ({})", self.summary()));
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(style::BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-")
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template(style::SPINNER_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
