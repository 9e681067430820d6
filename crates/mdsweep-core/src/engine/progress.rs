#[derive(Debug, Clone)]
pub enum Progress {
    PhaseStart { name: String },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}

impl ProgressReporter<'_> {
    pub fn phase_start(&self, name: impl Into<String>) {
        self.report(Progress::PhaseStart { name: name.into() });
    }

    /// Opens a counted task of `total` steps.
    pub fn task_start(&self, total: usize) {
        self.report(Progress::TaskStart {
            total_steps: total as u64,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn reporter_without_callback_is_silent() {
        let reporter = ProgressReporter::new();
        reporter.phase_start("nothing listens");
        reporter.report(Progress::TaskIncrement);
    }

    #[test]
    fn reporter_forwards_events_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reporter = ProgressReporter::with_callback(Box::new(move |p| {
            sink.lock().unwrap().push(format!("{:?}", p));
        }));

        reporter.phase_start("Batch 1 of 2");
        reporter.task_start(3);
        reporter.report(Progress::TaskIncrement);
        reporter.report(Progress::PhaseFinish);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert!(seen[0].contains("Batch 1 of 2"));
        assert!(seen[1].contains("total_steps: 3"));
        assert_eq!(seen[3], "PhaseFinish");
    }
}
