// src/catalog/store.rs
//! In-memory catalog snapshot for the active view-session. Replaced
//! wholesale on refresh; filtering only ever reads a snapshot copy.

use std::sync::{Arc, RwLock};

use super::item::CatalogItem;

#[derive(Clone, Default)]
pub struct CatalogStore {
    inner: Arc<RwLock<Vec<CatalogItem>>>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<CatalogItem>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(items)),
        }
    }

    /// Swap in a fresh snapshot. Returns the new item count.
    pub fn replace(&self, items: Vec<CatalogItem>) -> usize {
        let n = items.len();
        if let Ok(mut guard) = self.inner.write() {
            *guard = items;
        }
        n
    }

    /// Owned copy of the current snapshot. The derivation pipeline works on
    /// this copy, so a concurrent refresh never tears a view.
    pub fn snapshot(&self) -> Vec<CatalogItem> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
