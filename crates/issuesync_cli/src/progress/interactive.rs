use std::sync::Mutex;
use std::time::Duration;

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use issuesync::sync::SyncProgress;

/// One bar per stage.
#[derive(Default)]
struct ProgressState {
    collect_bar: Option<ProgressBar>,
    match_bar: Option<ProgressBar>,
    update_bar: Option<ProgressBar>,
    dry_run: bool,
}

/// Interactive progress reporter using indicatif.
pub struct InteractiveReporter {
    multi: MultiProgress,
    state: Mutex<ProgressState>,
}

impl InteractiveReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            state: Mutex::new(ProgressState::default()),
        }
    }

    fn println(&self, line: String) {
        self.multi.println(line).ok();
    }

    fn spinner(&self, prefix: &str, message: String) -> ProgressBar {
        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(Self::counter_style());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_prefix(format!("{:8}", prefix));
        bar.set_message(message);
        bar
    }

    fn bar(&self, prefix: &str, len: usize, message: String) -> ProgressBar {
        let bar = self.multi.add(ProgressBar::new(len as u64));
        bar.set_style(Self::bar_style());
        bar.set_prefix(format!("{:8}", prefix));
        bar.set_message(message);
        bar
    }

    pub fn handle(&self, event: SyncProgress) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        match event {
            SyncProgress::TeamResolved { key, name } => {
                self.println(format!(
                    "{} Linear team {} ({})",
                    style("✓").green(),
                    style(key).bold(),
                    name
                ));
            }

            SyncProgress::CollectingIssues { repo, field } => {
                let bar = self.spinner(
                    "collect",
                    format!("Fetching open issues from {} ({})...", repo, field),
                );
                state.collect_bar = Some(bar);
            }

            SyncProgress::FetchedPage {
                page, total_so_far, ..
            } => {
                if let Some(ref bar) = state.collect_bar {
                    bar.set_position(total_so_far as u64);
                    bar.set_message(format!("issues collected (page {})", page));
                }
            }

            SyncProgress::QuotaLow {
                remaining,
                low_water,
            } => {
                self.println(format!(
                    "{} GitHub quota low ({} left, stopping below {})",
                    style("!").yellow(),
                    remaining,
                    low_water
                ));
            }

            SyncProgress::CollectionFailed { error } => {
                if let Some(bar) = state.collect_bar.take() {
                    bar.finish_with_message(format!("{} {}", style("failed:").red(), error));
                }
            }

            SyncProgress::CollectionComplete { total, early_exit } => {
                if let Some(bar) = state.collect_bar.take()
                    && !bar.is_finished()
                {
                    let suffix = if early_exit { " (stopped early)" } else { "" };
                    bar.set_position(total as u64);
                    bar.finish_with_message(format!("issues collected{}", suffix));
                }
            }

            SyncProgress::MatchingIssues { count } => {
                let bar = self.bar("match", count, "Searching Linear...".to_string());
                state.match_bar = Some(bar);
            }

            SyncProgress::Matched { identifiers, .. } => {
                if let Some(ref bar) = state.match_bar {
                    bar.inc(1);
                    bar.set_message(identifiers.join(", "));
                }
            }

            SyncProgress::Unmatched { .. } => {
                if let Some(ref bar) = state.match_bar {
                    bar.inc(1);
                }
            }

            SyncProgress::MatchError { number, error } => {
                if let Some(ref bar) = state.match_bar {
                    bar.inc(1);
                }
                self.println(format!(
                    "{} #{}: {}",
                    style("✗").red(),
                    number,
                    error
                ));
            }

            SyncProgress::MatchingComplete { pairs, unmatched } => {
                if let Some(bar) = state.match_bar.take() {
                    bar.finish_with_message(format!(
                        "{} matched, {} unmatched",
                        pairs, unmatched
                    ));
                }
            }

            SyncProgress::ActorUnresolved { handle } => {
                self.println(format!(
                    "{} No Linear user for GitHub login {}",
                    style("!").yellow(),
                    style(handle).bold()
                ));
            }

            SyncProgress::PlanReady { count, dry_run } => {
                state.dry_run = dry_run;
                if count > 0 {
                    let prefix = if dry_run { "dry-run" } else { "update" };
                    let bar = self.bar(prefix, count, String::new());
                    state.update_bar = Some(bar);
                }
            }

            SyncProgress::UpdateApplied {
                identifier,
                field,
                old,
                new,
                ..
            } => {
                if let Some(ref bar) = state.update_bar {
                    bar.inc(1);
                    bar.set_message(format!("{} {}: {} -> {}", identifier, field, old, new));
                }
            }

            SyncProgress::UpdateFailed {
                identifier,
                field,
                error,
            } => {
                if let Some(ref bar) = state.update_bar {
                    bar.inc(1);
                }
                self.println(format!(
                    "{} {} {}: {}",
                    style("✗").red(),
                    identifier,
                    field,
                    error
                ));
            }

            SyncProgress::SyncComplete {
                updated, failed, ..
            } => {
                if let Some(bar) = state.update_bar.take() {
                    let message = if state.dry_run {
                        "planned".to_string()
                    } else {
                        format!("{} updated, {} failed", updated, failed)
                    };
                    bar.finish_with_message(message);
                }
            }

            SyncProgress::Warning { message } => {
                self.println(format!("{} {}", style("!").yellow(), message));
            }

            _ => {}
        }
    }

    pub fn finish(&self) {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        for bar in [&state.collect_bar, &state.match_bar, &state.update_bar]
            .into_iter()
            .flatten()
        {
            if !bar.is_finished() {
                bar.finish();
            }
        }
    }

    fn counter_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.cyan} {spinner:.green} {pos:>4} {msg}")
            .expect("Invalid template")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos:>3}/{len:3} {msg}")
            .expect("Invalid template")
            .progress_chars("█▓░")
    }
}

impl Default for InteractiveReporter {
    fn default() -> Self {
        Self::new()
    }
}
