use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use counter_core::{ProgressCounter, Repository, ResultEntry, ResultMap};
use engine_logging::{engine_debug, engine_error};
use futures_util::future::join_all;
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::api::NexusApi;
use crate::fetch::{ApiClient, ProgressSink};
use crate::pages::{count_components, PagingSettings};
use crate::persist::PersistError;
use crate::snapshot::SnapshotWriter;
use crate::{EngineEvent, RepositoryFailure, TaskError};

pub const DEFAULT_CONCURRENCY: usize = 10;
/// Largest admission limit the limiter can hold.
pub const MAX_CONCURRENCY: usize = Semaphore::MAX_PERMITS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateSettings {
    /// Repositories paginated at the same time.
    pub concurrency: usize,
    pub paging: PagingSettings,
}

impl Default for AggregateSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            paging: PagingSettings::default(),
        }
    }
}

/// Result map shared by all tasks of a run.
#[derive(Debug, Default)]
pub struct SharedResults {
    inner: Mutex<ResultMap>,
}

impl SharedResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, name: &str, entry: ResultEntry) {
        self.lock().upsert(name, entry);
    }

    pub fn remove(&self, name: &str) -> Option<ResultEntry> {
        self.lock().remove(name)
    }

    pub fn snapshot(&self) -> ResultMap {
        self.lock().clone()
    }

    pub(crate) fn render_snapshot(&self) -> Result<(Vec<u8>, usize), serde_json::Error> {
        let results = self.lock();
        Ok((results.render_snapshot()?, results.len()))
    }

    // Entries are inserted whole, so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, ResultMap> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub total: usize,
    /// `(repository, count)` in completion order.
    pub completed: Vec<(String, u64)>,
    pub failures: Vec<RepositoryFailure>,
    /// Repositories whose count was merged and written to a snapshot.
    pub results: ResultMap,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// A snapshot failure wins over per-repository failures.
    pub fn into_result(self) -> Result<Self, AggregateError> {
        if self.failures.is_empty() {
            return Ok(self);
        }
        let total = self.total;
        let completed = self.completed.len();
        let mut failures = self.failures;
        if let Some(index) = failures
            .iter()
            .position(|failure| matches!(failure.error, TaskError::Persist(_)))
        {
            if let TaskError::Persist(err) = failures.remove(index).error {
                return Err(AggregateError::Persist(err));
            }
        }
        Err(AggregateError::RepositoriesFailed {
            failures,
            completed,
            total,
        })
    }
}

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("snapshot could not be written: {0}")]
    Persist(PersistError),
    #[error("{} of {total} repositories failed ({completed} completed): {}", .failures.len(), describe(.failures))]
    RepositoriesFailed {
        failures: Vec<RepositoryFailure>,
        completed: usize,
        total: usize,
    },
}

fn describe(failures: &[RepositoryFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

struct RunState {
    limiter: Semaphore,
    results: SharedResults,
    progress: ProgressCounter,
}

/// Counts components for many repositories with at most `concurrency`
/// repositories paginating at once, snapshotting after each one completes.
pub struct Aggregator<'a> {
    client: &'a dyn ApiClient,
    api: &'a NexusApi,
    snapshot: &'a SnapshotWriter,
    sink: &'a dyn ProgressSink,
    settings: AggregateSettings,
}

impl<'a> Aggregator<'a> {
    pub fn new(
        client: &'a dyn ApiClient,
        api: &'a NexusApi,
        snapshot: &'a SnapshotWriter,
        sink: &'a dyn ProgressSink,
        settings: AggregateSettings,
    ) -> Self {
        Self {
            client,
            api,
            snapshot,
            sink,
            settings,
        }
    }

    /// Runs one task per repository and waits for all of them.
    ///
    /// A task holds its admission slot from the first page request until its
    /// snapshot is written. A failing repository does not cancel the others. If
    /// a snapshot cannot be written, tasks still waiting for admission are
    /// aborted while admitted ones run to completion.
    pub async fn run(&self, repositories: &[Repository]) -> RunReport {
        let state = RunState {
            limiter: Semaphore::new(self.settings.concurrency.clamp(1, MAX_CONCURRENCY)),
            results: SharedResults::new(),
            progress: ProgressCounter::new(repositories.len()),
        };

        let outcomes = join_all(
            repositories
                .iter()
                .map(|repository| self.run_task(repository, &state)),
        )
        .await;

        let mut failures = Vec::new();
        for (repository, outcome) in repositories.iter().zip(outcomes) {
            if let Err(error) = outcome {
                failures.push(RepositoryFailure {
                    repository: repository.name.clone(),
                    error,
                });
            }
        }

        let results = state.results.snapshot();
        let failed: HashSet<&str> = failures
            .iter()
            .map(|failure| failure.repository.as_str())
            .collect();
        let completed = results
            .iter()
            .filter(|(name, _)| !failed.contains(name))
            .map(|(name, entry)| (name.to_string(), entry.count))
            .collect();

        RunReport {
            total: repositories.len(),
            completed,
            failures,
            results,
        }
    }

    async fn run_task(&self, repository: &Repository, state: &RunState) -> Result<u64, TaskError> {
        let outcome = self.process(repository, state).await;
        if let Err(err) = &outcome {
            engine_error!("Repository {} failed: {}", repository.name, err);
            self.sink.emit(EngineEvent::RepositoryFailed {
                repository: repository.name.clone(),
                reason: err.to_string(),
            });
        }
        outcome
    }

    async fn process(&self, repository: &Repository, state: &RunState) -> Result<u64, TaskError> {
        engine_debug!("Starting processing repository {}", repository.name);
        self.sink.emit(EngineEvent::RepositoryStarted {
            repository: repository.name.clone(),
        });

        let permit = state
            .limiter
            .acquire()
            .await
            .map_err(|_closed| TaskError::Aborted)?;
        let count = count_components(
            self.client,
            self.api,
            &repository.name,
            &self.settings.paging,
            self.sink,
        )
        .await?;
        state.results.upsert(
            &repository.name,
            ResultEntry {
                repo_type: repository.repo_type.clone(),
                format: repository.format.clone(),
                count,
            },
        );

        let entries = match self.snapshot.write(&state.results).await {
            Ok(entries) => entries,
            Err(err) => {
                // Closed before the permit is released, so nobody else gets in.
                state.limiter.close();
                state.results.remove(&repository.name);
                return Err(err.into());
            }
        };
        drop(permit);
        self.sink.emit(EngineEvent::SnapshotWritten {
            path: self.snapshot.path().to_path_buf(),
            entries,
        });

        let completed = state.progress.increment();
        engine_debug!(
            "Completed {}/{}: {}",
            completed,
            state.progress.total(),
            repository.name
        );
        self.sink.emit(EngineEvent::RepositoryCompleted {
            repository: repository.name.clone(),
            count,
            completed,
            total: state.progress.total(),
        });
        Ok(count)
    }
}
