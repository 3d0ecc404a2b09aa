use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use switchyard_core::config::MemoryConfig;

/// Most recent results kept per actor.
pub const ACTOR_MEMORY_CAPACITY: usize = 5;

type History = Arc<Mutex<VecDeque<serde_json::Value>>>;

/// Process-wide, bounded, most-recent-first history per actor.
///
/// The outer map lock is only held long enough to find or create a key's
/// history; writes to one key never wait on another key.
pub struct ActorMemory {
    capacity: usize,
    histories: RwLock<HashMap<String, History>>,
}

impl ActorMemory {
    pub fn new() -> Self {
        Self::with_capacity(ACTOR_MEMORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            histories: RwLock::new(HashMap::new()),
        }
    }

    /// Up to `capacity` entries, newest first. Unknown keys yield nothing.
    pub async fn get(&self, actor: &str) -> Vec<serde_json::Value> {
        let history = {
            let map = self.histories.read().await;
            match map.get(actor) {
                Some(h) => h.clone(),
                None => return Vec::new(),
            }
        };
        let entries = history.lock().await;
        entries.iter().cloned().collect()
    }

    /// Prepend a result, evicting the oldest past capacity.
    pub async fn record(&self, actor: &str, result: serde_json::Value) {
        let history = self.history_for(actor).await;
        let mut entries = history.lock().await;
        entries.push_front(result);
        while entries.len() > self.capacity {
            entries.pop_back();
        }
        debug!(actor, size = entries.len(), "Actor memory updated");
    }

    /// Number of actors with any history.
    pub async fn actor_count(&self) -> usize {
        self.histories.read().await.len()
    }

    async fn history_for(&self, actor: &str) -> History {
        if let Some(h) = self.histories.read().await.get(actor) {
            return h.clone();
        }
        let mut map = self.histories.write().await;
        map.entry(actor.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(VecDeque::with_capacity(self.capacity))))
            .clone()
    }
}

impl Default for ActorMemory {
    fn default() -> Self {
        Self::new()
    }
}

/// Derives the actor key from request text.
#[derive(Debug, Clone)]
pub struct ActorKeyResolver {
    prefixes: Vec<String>,
    default_actor: String,
}

impl ActorKeyResolver {
    pub fn new(prefixes: Vec<String>, default_actor: impl Into<String>) -> Self {
        Self {
            prefixes,
            default_actor: default_actor.into(),
        }
    }

    pub fn from_config(config: &MemoryConfig) -> Self {
        Self::new(config.account_prefixes.clone(), config.default_actor.clone())
    }

    /// First whitespace token starting with an account prefix, else the
    /// default actor.
    pub fn resolve<'a>(&'a self, request: &'a str) -> &'a str {
        request
            .split_whitespace()
            .find(|word| self.prefixes.iter().any(|p| word.starts_with(p.as_str())))
            .unwrap_or(self.default_actor.as_str())
    }
}

impl Default for ActorKeyResolver {
    fn default() -> Self {
        Self::from_config(&MemoryConfig::default())
    }
}
