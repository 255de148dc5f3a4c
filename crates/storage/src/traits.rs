//! The durable link store capability.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::StoreError;

/// Durable, append-only memory of links that have already been notified.
///
/// Implementations decide the encoding. Callers never rewrite history: the
/// full set is read once with [`load_all`](LinkStore::load_all) and grown with
/// [`append_links`](LinkStore::append_links).
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Return every stored link. A store that does not exist yet yields an
    /// empty set, not an error.
    async fn load_all(&self) -> Result<HashSet<String>, StoreError>;

    /// Durably record additional links. Callers pass a non-empty slice of
    /// distinct links.
    async fn append_links(&self, links: &[String]) -> Result<(), StoreError>;

    /// Human-readable description of where links live (for logs).
    fn describe(&self) -> String;
}
