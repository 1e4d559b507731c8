//! Counter core: pure data model for repository component counts.
mod progress;
mod repository;
mod results;

pub use progress::ProgressCounter;
pub use repository::{Repository, RepositoryFilter, ALL_SELECTOR};
pub use results::{ResultEntry, ResultMap};
