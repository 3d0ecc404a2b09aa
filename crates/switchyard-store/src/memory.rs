use std::collections::HashMap;

use futures::future::BoxFuture;
use tokio::sync::RwLock;

use switchyard_core::error::Result;
use switchyard_core::traits::RecordStore;
use switchyard_core::types::{Record, Table};

use crate::ensure_id;

/// In-process record store. Records are kept in insertion order per table.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<Table, Vec<(String, Record)>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self, table: Table) -> usize {
        self.tables
            .read()
            .await
            .get(&table)
            .map_or(0, |rows| rows.len())
    }
}

impl RecordStore for MemoryStore {
    fn lookup(&self, table: Table, key: &str) -> BoxFuture<'_, Result<Option<Record>>> {
        let key = key.to_string();
        Box::pin(async move {
            let tables = self.tables.read().await;
            Ok(tables
                .get(&table)
                .and_then(|rows| rows.iter().find(|(id, _)| *id == key))
                .map(|(_, record)| record.clone()))
        })
    }

    fn insert(&self, table: Table, mut record: Record) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            let id = ensure_id(table, &mut record);
            let mut tables = self.tables.write().await;
            let rows = tables.entry(table).or_default();
            match rows.iter_mut().find(|(existing, _)| *existing == id) {
                Some((_, slot)) => *slot = record,
                None => rows.push((id.clone(), record)),
            }
            Ok(id)
        })
    }

    fn scan(&self, table: Table, limit: usize) -> BoxFuture<'_, Result<Vec<Record>>> {
        Box::pin(async move {
            let tables = self.tables.read().await;
            Ok(tables
                .get(&table)
                .map(|rows| {
                    rows.iter()
                        .rev()
                        .take(limit)
                        .map(|(_, record)| record.clone())
                        .collect()
                })
                .unwrap_or_default())
        })
    }
}
