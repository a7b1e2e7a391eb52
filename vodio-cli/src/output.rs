//! Terminal rendering of download events: one progress bar per item,
//! retry and status lines printed above it.

use colored::*;
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use vodio_engine::{EventSink, ItemState, ProgressEvent};

struct ActiveItem {
    bar: ProgressBar,
    title: String,
    state: ItemState,
}

/// Sink that renders engine events with indicatif. In quiet mode only
/// item failures are printed.
pub struct ProgressRenderer {
    active: Mutex<Option<ActiveItem>>,
    quiet: bool,
}

impl ProgressRenderer {
    pub fn new(quiet: bool) -> Self {
        Self {
            active: Mutex::new(None),
            quiet,
        }
    }

    fn println(&self, message: &str) {
        match self.active.lock().as_ref() {
            Some(item) => item.bar.println(message),
            None => println!("{message}"),
        }
    }
}

impl EventSink for ProgressRenderer {
    fn emit(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::ItemStarted { title, .. } => {
                if self.quiet {
                    return;
                }
                let mut active = self.active.lock();
                if let Some(previous) = active.take() {
                    previous.bar.finish_and_clear();
                }
                let bar = ProgressBar::new_spinner();
                bar.set_style(spinner_style());
                bar.set_prefix(title.clone());
                bar.enable_steady_tick(std::time::Duration::from_millis(120));
                *active = Some(ActiveItem {
                    bar,
                    title,
                    state: ItemState::Pending.advance(ItemState::Downloading),
                });
            }
            ProgressEvent::Progress { sample } => {
                let mut active = self.active.lock();
                let Some(item) = active.as_mut() else { return };
                if item.state == ItemState::Retrying {
                    item.state = item.state.advance(ItemState::Downloading);
                    item.bar.set_prefix(item.title.clone());
                }
                if let Some(total) = sample.bytes_total
                    && item.bar.length() != Some(total)
                {
                    item.bar.set_length(total);
                    item.bar.set_style(bar_style());
                }
                item.bar.set_position(sample.bytes_downloaded);
                item.bar
                    .set_message(format!("{}/s", HumanBytes(sample.bytes_per_sec as u64)));
            }
            ProgressEvent::ItemRetrying {
                title,
                retry_count,
                error,
            } => {
                if self.quiet {
                    return;
                }
                self.println(&format!(
                    "{} {title}: attempt {retry_count} failed ({error}), retrying",
                    "retry".yellow().bold()
                ));
                let mut active = self.active.lock();
                if let Some(item) = active.as_mut() {
                    item.state = item.state.advance(ItemState::Retrying);
                    item.bar.set_prefix(item.title.yellow().to_string());
                }
            }
            ProgressEvent::ItemCompleted { title, path } => {
                if let Some(item) = self.active.lock().take() {
                    item.bar.finish_and_clear();
                }
                if !self.quiet {
                    println!(
                        "{} {title} -> {}",
                        "done".green().bold(),
                        path.display()
                    );
                }
            }
            ProgressEvent::ItemFailed { title, error } => {
                if let Some(item) = self.active.lock().take() {
                    item.bar.finish_and_clear();
                }
                println!("{} {title}: {error}", "failed".red().bold());
            }
            ProgressEvent::Status { message } => {
                if self.quiet {
                    return;
                }
                self.println(&message.bold().to_string());
            }
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {prefix} {bytes} {msg}").unwrap()
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{spinner:.green} {prefix} [{bar:30.cyan/blue}] {bytes}/{total_bytes} {msg}",
    )
    .unwrap()
    .progress_chars("=>-")
}
