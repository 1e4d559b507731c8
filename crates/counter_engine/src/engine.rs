use std::path::PathBuf;

use counter_core::RepositoryFilter;
use engine_logging::{engine_info, engine_warn};
use thiserror::Error;

use crate::aggregate::{AggregateError, AggregateSettings, Aggregator, RunReport};
use crate::api::NexusApi;
use crate::fetch::{ApiClient, FetchSettings, ProgressSink, ReqwestFetcher};
use crate::lister::list_repositories;
use crate::persist::{ensure_output_dir, PersistError};
use crate::snapshot::SnapshotWriter;
use crate::FetchError;

/// Everything one counting pass needs besides the HTTP client.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub base_url: String,
    pub filter: RepositoryFilter,
    pub output_dir: PathBuf,
    pub aggregate: AggregateSettings,
}

impl RunConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            filter: RepositoryFilter::default(),
            output_dir: PathBuf::from("."),
            aggregate: AggregateSettings::default(),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(self.filter.snapshot_filename())
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid API url: {0}")]
    InvalidUrl(FetchError),
    #[error("listing repositories failed: {0}")]
    Listing(FetchError),
    #[error(transparent)]
    OutputDir(PersistError),
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

pub struct Engine {
    client: Box<dyn ApiClient>,
}

impl Engine {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        Ok(Self::with_client(Box::new(ReqwestFetcher::new(settings)?)))
    }

    pub fn with_client(client: Box<dyn ApiClient>) -> Self {
        Self { client }
    }

    /// Lists repositories, counts their components and keeps the output file current.
    pub async fn run(
        &self,
        config: &RunConfig,
        sink: &dyn ProgressSink,
    ) -> Result<RunReport, EngineError> {
        let api = NexusApi::new(&config.base_url).map_err(EngineError::InvalidUrl)?;
        ensure_output_dir(&config.output_dir).map_err(EngineError::OutputDir)?;

        let repositories = list_repositories(self.client.as_ref(), &api, &config.filter, sink)
            .await
            .map_err(EngineError::Listing)?;
        if repositories.is_empty() {
            engine_warn!("No repositories matched; nothing to write");
        }

        let snapshot = SnapshotWriter::new(
            config.output_dir.clone(),
            config.filter.snapshot_filename(),
        );
        let aggregator = Aggregator::new(
            self.client.as_ref(),
            &api,
            &snapshot,
            sink,
            config.aggregate.clone(),
        );
        let report = aggregator.run(&repositories).await;
        if report.is_success() {
            engine_info!(
                "Counted {}/{} repositories into {}",
                report.completed.len(),
                report.total,
                snapshot.path().display()
            );
        } else {
            engine_warn!(
                "Counted {}/{} repositories into {}, {} failed",
                report.completed.len(),
                report.total,
                snapshot.path().display(),
                report.failures.len()
            );
        }
        report.into_result().map_err(EngineError::from)
    }
}
