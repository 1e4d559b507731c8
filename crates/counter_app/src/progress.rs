use std::sync::atomic::{AtomicUsize, Ordering};

use counter_engine::{EngineEvent, ProgressSink};
use engine_logging::{engine_debug, engine_info, engine_trace};

/// Renders engine events as console log lines.
#[derive(Debug, Default)]
pub struct LogProgressSink {
    total: AtomicUsize,
    completed: AtomicUsize,
}

impl LogProgressSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&self, event: &EngineEvent) -> Option<String> {
        let total = self.total.load(Ordering::Relaxed);
        match event {
            EngineEvent::RepositoriesListed { .. } | EngineEvent::RepositoryFailed { .. } => None,
            EngineEvent::RepositoryStarted { repository } => {
                Some(format!("Starting processing repository {repository}"))
            }
            EngineEvent::PageFetched {
                repository,
                running_count,
                ..
            } => Some(format!(
                "Found {running_count} components so far in {repository}     (Completed repos: {}/{total})",
                self.completed.load(Ordering::Relaxed)
            )),
            EngineEvent::RepositoryCompleted {
                repository,
                count,
                completed,
                total,
            } => Some(format!(
                "Completed {completed}/{total}: {repository} ({count} components)"
            )),
            EngineEvent::SnapshotWritten { path, entries } => {
                Some(format!("Saved {entries} entries to {}", path.display()))
            }
        }
    }

    fn record(&self, event: &EngineEvent) {
        match event {
            EngineEvent::RepositoriesListed { count } => self.total.store(*count, Ordering::Relaxed),
            EngineEvent::RepositoryCompleted { completed, .. } => {
                self.completed.fetch_max(*completed, Ordering::Relaxed);
            }
            _ => {}
        }
    }
}

impl ProgressSink for LogProgressSink {
    fn emit(&self, event: EngineEvent) {
        self.record(&event);
        let Some(line) = self.line(&event) else {
            return;
        };
        match event {
            EngineEvent::SnapshotWritten { .. } => engine_trace!("{}", line),
            EngineEvent::RepositoryStarted { .. } => engine_debug!("{}", line),
            _ => engine_info!("{}", line),
        }
    }
}
