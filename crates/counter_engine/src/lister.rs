use counter_core::{Repository, RepositoryFilter};
use engine_logging::engine_info;

use crate::api::NexusApi;
use crate::fetch::{ApiClient, ProgressSink};
use crate::{EngineEvent, FailureKind, FetchError};

/// Fetches the repository catalog once and keeps the entries matching `filter`.
pub async fn list_repositories(
    client: &dyn ApiClient,
    api: &NexusApi,
    filter: &RepositoryFilter,
    sink: &dyn ProgressSink,
) -> Result<Vec<Repository>, FetchError> {
    let url = api.repositories_url()?;
    let value = client.get_json(&url).await?;
    let catalog: Vec<Repository> = serde_json::from_value(value).map_err(|err| {
        FetchError::new(
            FailureKind::MalformedResponse,
            format!("repository catalog: {err}"),
        )
    })?;

    let repositories = filter.apply(catalog);
    engine_info!("Total repositories fetched: {}", repositories.len());
    sink.emit(EngineEvent::RepositoriesListed {
        count: repositories.len(),
    });
    Ok(repositories)
}
