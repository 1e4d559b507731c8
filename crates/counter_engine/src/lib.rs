//! Counter engine: repository listing, paged component counting and snapshots.
mod aggregate;
mod api;
mod engine;
mod fetch;
mod lister;
mod pages;
mod persist;
mod snapshot;
mod types;

pub use aggregate::{
    AggregateError, AggregateSettings, Aggregator, RunReport, SharedResults, DEFAULT_CONCURRENCY,
    MAX_CONCURRENCY,
};
pub use api::{NexusApi, CONTINUATION_TOKEN_PARAM};
pub use engine::{Engine, EngineError, RunConfig};
pub use fetch::{
    ApiClient, Credentials, FetchSettings, NoopProgressSink, ProgressSink, ReqwestFetcher,
};
pub use lister::list_repositories;
pub use pages::{count_components, PagingSettings};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use snapshot::SnapshotWriter;
pub use types::{EngineEvent, FailureKind, FetchError, RepositoryFailure, TaskError};
