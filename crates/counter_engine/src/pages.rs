use std::collections::HashSet;

use engine_logging::engine_debug;
use serde::de::IgnoredAny;
use serde::Deserialize;

use crate::api::NexusApi;
use crate::fetch::{ApiClient, ProgressSink};
use crate::{EngineEvent, FailureKind, FetchError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagingSettings {
    /// Upper bound on pages requested for one repository.
    pub max_pages: usize,
}

impl Default for PagingSettings {
    fn default() -> Self {
        Self { max_pages: 100_000 }
    }
}

#[derive(Debug, Deserialize)]
struct ComponentPage {
    items: Vec<IgnoredAny>,
    #[serde(rename = "continuationToken", default)]
    continuation_token: Option<String>,
}

/// Walks every components page of `repository` and returns the number of items.
///
/// Any failed page fails the whole count. A token seen twice, or more than
/// `settings.max_pages` pages, is reported as an error instead of looping.
pub async fn count_components(
    client: &dyn ApiClient,
    api: &NexusApi,
    repository: &str,
    settings: &PagingSettings,
    sink: &dyn ProgressSink,
) -> Result<u64, FetchError> {
    let mut total: u64 = 0;
    let mut page: usize = 0;
    let mut token: Option<String> = None;
    let mut seen_tokens = HashSet::new();

    loop {
        if page >= settings.max_pages {
            return Err(FetchError::new(
                FailureKind::PageLimitExceeded {
                    max_pages: settings.max_pages,
                },
                format!("{repository} still has pages after {page}"),
            ));
        }
        page += 1;

        let url = api.components_url(repository, token.as_deref())?;
        let value = client.get_json(&url).await?;
        let parsed: ComponentPage = serde_json::from_value(value).map_err(|err| {
            FetchError::new(
                FailureKind::MalformedResponse,
                format!("components page {page} of {repository}: {err}"),
            )
        })?;

        total += parsed.items.len() as u64;
        engine_debug!("Found {} components so far in {}", total, repository);
        sink.emit(EngineEvent::PageFetched {
            repository: repository.to_string(),
            page,
            running_count: total,
        });

        match parsed.continuation_token.filter(|next| !next.is_empty()) {
            None => return Ok(total),
            Some(next) => {
                if !seen_tokens.insert(next.clone()) {
                    return Err(FetchError::new(
                        FailureKind::PaginationCycle,
                        format!("{repository} returned token {next:?} twice"),
                    ));
                }
                token = Some(next);
            }
        }
    }
}
