use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use switchyard_core::types::Coordinates;

/// Cache key for a forecast: `"{lat},{lon},{date}"`.
pub fn cache_key(coordinates: Coordinates, date: NaiveDate) -> String {
    format!(
        "{},{},{}",
        coordinates.latitude,
        coordinates.longitude,
        date.format("%Y-%m-%d")
    )
}

type Slot = Arc<Mutex<Option<String>>>;

/// Process-wide forecast cache keyed by location and date.
///
/// Reads of different keys run concurrently; writes to the same key are
/// serialised by that key's slot lock.
#[derive(Default)]
pub struct ResultCache {
    slots: RwLock<HashMap<String, Slot>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let slot = self.slots.read().await.get(key).cloned()?;
        let value = slot.lock().await.clone();
        debug!(key, hit = value.is_some(), "Cache lookup");
        value
    }

    pub async fn put(&self, key: &str, value: impl Into<String>) {
        let slot = {
            let existing = self.slots.read().await.get(key).cloned();
            match existing {
                Some(slot) => slot,
                None => {
                    let mut slots = self.slots.write().await;
                    slots
                        .entry(key.to_string())
                        .or_insert_with(|| Arc::new(Mutex::new(None)))
                        .clone()
                }
            }
        };
        *slot.lock().await = Some(value.into());
        debug!(key, "Cache updated");
    }

    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }
}
