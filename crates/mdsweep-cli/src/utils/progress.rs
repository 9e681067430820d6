use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use mdsweep::engine::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

/// Counters carried across phases so every batch bar shows the sweep so far.
#[derive(Debug, Default)]
struct SweepTally {
    phase: String,
    finished: u64,
    failed: usize,
}

impl SweepTally {
    fn label(&self) -> String {
        match self.failed {
            0 => self.phase.clone(),
            n => format!("{} ({} failed)", self.phase, n),
        }
    }

    fn summary(&self) -> String {
        match self.failed {
            0 => "✓ Done".to_string(),
            n => format!("✓ Done, {} of {} unit(s) failed so far", n, self.finished),
        }
    }
}

struct BarState {
    pb: ProgressBar,
    tally: SweepTally,
}

/// Renders sweep progress on one terminal bar, keeping a running failure count.
#[derive(Clone)]
pub struct CliProgressHandler {
    state: Arc<Mutex<BarState>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let pb = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr())
            .with_style(spinner_style());
        pb.finish_and_clear();

        Self {
            state: Arc::new(Mutex::new(BarState {
                pb,
                tally: SweepTally::default(),
            })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let state = self.state.clone();

        Box::new(move |progress: Progress| {
            let Ok(mut guard) = state.lock() else {
                warn!("Progress state mutex was poisoned. Cannot update progress.");
                return;
            };
            let BarState { pb, tally } = &mut *guard;

            match progress {
                Progress::PhaseStart { name } => {
                    tally.phase = name;
                    pb.reset();
                    pb.set_length(0);
                    pb.set_style(spinner_style());
                    pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                    pb.set_message(tally.label());
                }
                Progress::TaskStart { total_steps } => {
                    pb.disable_steady_tick();
                    pb.set_length(total_steps);
                    pb.set_position(0);
                    pb.set_style(bar_style());
                }
                Progress::TaskIncrement => {
                    tally.finished += 1;
                    pb.inc(1);
                }
                Progress::TaskFinish => {
                    let length = pb.length().unwrap_or(0);
                    if pb.position() < length {
                        pb.set_position(length);
                    }
                }
                Progress::PhaseFinish => {
                    pb.disable_steady_tick();
                    pb.finish_with_message(tally.summary());
                }
                Progress::Message(msg) => {
                    tally.failed += 1;
                    if pb.is_finished() {
                        warn!("{}", msg);
                    } else {
                        pb.println(format!("  ✗ {}", msg));
                        pb.set_message(tally.label());
                    }
                }
            }
        })
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{msg:<28} [{bar:40.cyan/blue}] {pos}/{len} units ({elapsed_precise}, eta {eta})",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .with_key(
        "eta",
        |state: &ProgressState, w: &mut dyn std::fmt::Write| {
            let _ = write!(w, "{:.0}s", state.eta().as_secs_f64());
        },
    )
    .progress_chars("##-")
}
