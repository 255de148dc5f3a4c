use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A discovered job posting.
///
/// Two records are the same posting when their `link` matches; title and
/// summary may drift between fetches and are ignored for deduplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub link: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
}

impl JobRecord {
    pub fn new(link: impl Into<String>, title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            title: title.into(),
            summary: summary.into(),
        }
    }
}

impl PartialEq for JobRecord {
    fn eq(&self, other: &Self) -> bool {
        self.link == other.link
    }
}

impl Eq for JobRecord {}

impl std::hash::Hash for JobRecord {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.link.hash(state);
    }
}

impl fmt::Display for JobRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.title, self.link)
    }
}

/// Grow-only set of links that have already been notified.
///
/// There is no removal API: once a link is recorded it stays recorded for the
/// lifetime of the set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSet {
    links: HashSet<String>,
}

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, link: &str) -> bool {
        self.links.contains(link)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Merge the links of `records`, returning only the links that were not
    /// already present. Repeated links inside `records` collapse to one entry.
    pub fn merge_records(&mut self, records: &[JobRecord]) -> Vec<String> {
        let mut added = Vec::new();
        for record in records {
            if self.links.insert(record.link.clone()) {
                added.push(record.link.clone());
            }
        }
        added
    }
}

impl From<HashSet<String>> for LinkSet {
    fn from(links: HashSet<String>) -> Self {
        Self { links }
    }
}

impl FromIterator<String> for LinkSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            links: iter.into_iter().collect(),
        }
    }
}
