use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::PersistError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    RepositoriesListed {
        count: usize,
    },
    RepositoryStarted {
        repository: String,
    },
    PageFetched {
        repository: String,
        page: usize,
        running_count: u64,
    },
    RepositoryCompleted {
        repository: String,
        count: u64,
        completed: usize,
        total: usize,
    },
    RepositoryFailed {
        repository: String,
        reason: String,
    },
    SnapshotWritten {
        path: PathBuf,
        entries: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    MalformedResponse,
    PaginationCycle,
    PageLimitExceeded { max_pages: usize },
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::MalformedResponse => write!(f, "malformed response"),
            FailureKind::PaginationCycle => write!(f, "continuation token repeated"),
            FailureKind::PageLimitExceeded { max_pages } => {
                write!(f, "more than {max_pages} pages")
            }
        }
    }
}

/// Why a single repository's task did not record a result.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("snapshot failed: {0}")]
    Persist(#[from] PersistError),
    #[error("aborted after an earlier snapshot failure")]
    Aborted,
}

#[derive(Debug)]
pub struct RepositoryFailure {
    pub repository: String,
    pub error: TaskError,
}

impl fmt::Display for RepositoryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.repository, self.error)
    }
}
