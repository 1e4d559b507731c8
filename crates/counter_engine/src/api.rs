use url::Url;

use crate::{FailureKind, FetchError};

pub const CONTINUATION_TOKEN_PARAM: &str = "continuationToken";

/// Endpoint builder for the repository manager's REST API.
///
/// `base_url` is the API root, e.g. `https://nexus.example.com/service/rest/v1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NexusApi {
    base: String,
}

impl NexusApi {
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let base = base_url.trim().trim_end_matches('/');
        let parsed = Url::parse(base)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, format!("{base_url}: {err}")))?;
        if parsed.cannot_be_a_base() {
            return Err(FetchError::new(
                FailureKind::InvalidUrl,
                format!("{base_url}: not a base url"),
            ));
        }
        Ok(Self {
            base: base.to_string(),
        })
    }

    pub fn repositories_url(&self) -> Result<Url, FetchError> {
        self.endpoint("repositories")
    }

    /// First page when `continuation_token` is `None`, the following page otherwise.
    pub fn components_url(
        &self,
        repository: &str,
        continuation_token: Option<&str>,
    ) -> Result<Url, FetchError> {
        let mut url = self.endpoint("components")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("repository", repository);
            if let Some(token) = continuation_token {
                query.append_pair(CONTINUATION_TOKEN_PARAM, token);
            }
        }
        Ok(url)
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        let raw = format!("{}/{path}", self.base);
        Url::parse(&raw).map_err(|err| FetchError::new(FailureKind::InvalidUrl, format!("{raw}: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_ignored() {
        let api = NexusApi::new("https://nexus.example.com/service/rest/v1/").unwrap();
        assert_eq!(
            api.repositories_url().unwrap().as_str(),
            "https://nexus.example.com/service/rest/v1/repositories"
        );
    }

    #[test]
    fn first_page_has_only_repository_param() {
        let api = NexusApi::new("http://localhost:8081/service/rest/v1").unwrap();
        let url = api.components_url("npm-proxy", None).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8081/service/rest/v1/components?repository=npm-proxy"
        );
    }

    #[test]
    fn next_page_appends_encoded_token() {
        let api = NexusApi::new("http://localhost:8081/service/rest/v1").unwrap();
        let url = api.components_url("my repo", Some("a+b/c=")).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("repository".to_string(), "my repo".to_string()),
                ("continuationToken".to_string(), "a+b/c=".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_unparseable_base() {
        let err = NexusApi::new("not a url").unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidUrl);

        let err = NexusApi::new("mailto:admin@example.com").unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidUrl);
    }
}
