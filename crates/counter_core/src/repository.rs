use serde::{Deserialize, Serialize};

/// Filename component used when a filter is not set.
pub const ALL_SELECTOR: &str = "all";

/// One entry of the repository catalog.
///
/// Extra catalog fields (`url`, `attributes`, ...) are ignored on decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    #[serde(rename = "type")]
    pub repo_type: String,
    pub format: String,
}

impl Repository {
    pub fn new(
        name: impl Into<String>,
        repo_type: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            repo_type: repo_type.into(),
            format: format.into(),
        }
    }
}

/// Optional type and format selectors applied to the catalog.
///
/// Empty strings are treated the same as an unset selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryFilter {
    repo_type: Option<String>,
    format: Option<String>,
}

impl RepositoryFilter {
    pub fn new(repo_type: Option<String>, format: Option<String>) -> Self {
        Self {
            repo_type: repo_type.filter(|value| !value.is_empty()),
            format: format.filter(|value| !value.is_empty()),
        }
    }

    pub fn repo_type(&self) -> Option<&str> {
        self.repo_type.as_deref()
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn matches(&self, repository: &Repository) -> bool {
        self.repo_type
            .as_deref()
            .map_or(true, |wanted| repository.repo_type == wanted)
            && self
                .format
                .as_deref()
                .map_or(true, |wanted| repository.format == wanted)
    }

    /// Keeps matching repositories in their catalog order.
    pub fn apply(&self, repositories: Vec<Repository>) -> Vec<Repository> {
        repositories
            .into_iter()
            .filter(|repository| self.matches(repository))
            .collect()
    }

    /// `<type-or-all>_<format-or-all>_components.json`
    pub fn snapshot_filename(&self) -> String {
        format!(
            "{}_{}_components.json",
            self.repo_type().unwrap_or(ALL_SELECTOR),
            self.format().unwrap_or(ALL_SELECTOR)
        )
    }
}
