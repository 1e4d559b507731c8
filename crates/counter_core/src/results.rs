use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Final record for one repository: its metadata plus its total component count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    #[serde(rename = "type")]
    pub repo_type: String,
    pub format: String,
    pub count: u64,
}

/// Completed repositories keyed by name, kept in completion order.
///
/// Only whole counts are ever inserted; a repository whose pagination has not
/// finished (or failed) is simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultMap {
    entries: IndexMap<String, ResultEntry>,
}

impl ResultMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the entry for `name`, returning the previous one.
    ///
    /// A replaced entry keeps its original completion position.
    pub fn upsert(&mut self, name: impl Into<String>, entry: ResultEntry) -> Option<ResultEntry> {
        self.entries.insert(name.into(), entry)
    }

    /// Removes the entry for `name`; the remaining entries keep their order.
    pub fn remove(&mut self, name: &str) -> Option<ResultEntry> {
        self.entries.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&ResultEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResultEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Entries sorted by count, highest first. Equal counts keep completion order.
    pub fn ranked(&self) -> IndexMap<String, ResultEntry> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|_, left, _, right| right.count.cmp(&left.count));
        ranked
    }

    /// Renders the ranked entries as a JSON object indented by four spaces.
    pub fn render_snapshot(&self) -> serde_json::Result<Vec<u8>> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.ranked().serialize(&mut serializer)?;
        Ok(buf)
    }
}
