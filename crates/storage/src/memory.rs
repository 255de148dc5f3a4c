use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::traits::LinkStore;

/// Process-local link store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryLinkStore {
    links: Mutex<HashSet<String>>,
}

impl MemoryLinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_links<I: IntoIterator<Item = String>>(links: I) -> Self {
        Self {
            links: Mutex::new(links.into_iter().collect()),
        }
    }

    pub fn snapshot(&self) -> HashSet<String> {
        self.links.lock().expect("link store lock poisoned").clone()
    }
}

#[async_trait]
impl LinkStore for MemoryLinkStore {
    async fn load_all(&self) -> Result<HashSet<String>, StoreError> {
        Ok(self.snapshot())
    }

    async fn append_links(&self, links: &[String]) -> Result<(), StoreError> {
        self.links
            .lock()
            .expect("link store lock poisoned")
            .extend(links.iter().cloned());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
