#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use counter_engine::{ApiClient, EngineEvent, FailureKind, FetchError, ProgressSink};
use serde_json::{json, Value};
use url::Url;

pub const BASE_URL: &str = "http://nexus.test/service/rest/v1";

#[derive(Debug, Clone)]
enum Pages {
    /// Items per page; tokens are `<repo>:<next page index>`.
    Finite(Vec<usize>),
    /// Every page points at the same token.
    Cyclic,
    /// Every page points at a fresh token.
    Endless,
}

/// In-memory stand-in for the repository manager API.
#[derive(Debug, Default)]
pub struct FakeApi {
    catalog: Vec<Value>,
    pages: HashMap<String, Pages>,
    failing: HashMap<(String, usize), u16>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requests: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repository(mut self, name: &str, repo_type: &str, format: &str, pages: &[usize]) -> Self {
        self.catalog
            .push(json!({"name": name, "type": repo_type, "format": format, "url": "ignored"}));
        self.pages
            .insert(name.to_string(), Pages::Finite(pages.to_vec()));
        self
    }

    pub fn cyclic_repository(mut self, name: &str) -> Self {
        self.catalog
            .push(json!({"name": name, "type": "hosted", "format": "raw"}));
        self.pages.insert(name.to_string(), Pages::Cyclic);
        self
    }

    pub fn endless_repository(mut self, name: &str) -> Self {
        self.catalog
            .push(json!({"name": name, "type": "hosted", "format": "raw"}));
        self.pages.insert(name.to_string(), Pages::Endless);
        self
    }

    /// `page` is zero-based.
    pub fn failing_page(mut self, name: &str, page: usize, status: u16) -> Self {
        self.failing.insert((name.to_string(), page), status);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn component_page(&self, url: &Url) -> Result<Value, FetchError> {
        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
        let repository = query.get("repository").cloned().unwrap_or_default();
        let index = query
            .get("continuationToken")
            .and_then(|token| token.rsplit(':').next())
            .and_then(|index| index.parse::<usize>().ok())
            .unwrap_or(0);

        if let Some(status) = self.failing.get(&(repository.clone(), index)) {
            return Err(FetchError::new(
                FailureKind::HttpStatus(*status),
                format!("{status} for {url}"),
            ));
        }

        let page = match self.pages.get(&repository) {
            Some(Pages::Finite(pages)) => {
                let items = pages.get(index).copied().unwrap_or(0);
                let token = (index + 1 < pages.len()).then(|| format!("{repository}:{}", index + 1));
                page_json(items, token)
            }
            Some(Pages::Cyclic) => page_json(1, Some(format!("{repository}:1"))),
            Some(Pages::Endless) => page_json(1, Some(format!("{repository}:{}", index + 1))),
            None => {
                return Err(FetchError::new(FailureKind::HttpStatus(404), "no such repository"))
            }
        };
        Ok(page)
    }
}

fn page_json(items: usize, token: Option<String>) -> Value {
    let items: Vec<Value> = (0..items).map(|id| json!({"id": id})).collect();
    json!({"items": items, "continuationToken": token})
}

#[async_trait::async_trait]
impl ApiClient for FakeApi {
    async fn get_json(&self, url: &Url) -> Result<Value, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if url.path().ends_with("/repositories") {
            return Ok(Value::Array(self.catalog.clone()));
        }
        self.component_page(url)
    }
}

#[derive(Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}
