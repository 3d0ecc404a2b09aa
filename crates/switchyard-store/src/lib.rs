mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use serde_json::Value;

use switchyard_core::types::{Record, Table};

/// Mint a new id for `table`, e.g. `SR-4F1A9C2B`.
pub fn mint_id(table: Table) -> String {
    let raw = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", table.id_prefix(), raw[..8].to_uppercase())
}

/// Return the record's primary key, minting and inserting one if absent.
pub(crate) fn ensure_id(table: Table, record: &mut Record) -> String {
    let key = table.primary_key();
    match record.get(key) {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            let id = mint_id(table);
            record.insert(key.to_string(), Value::String(id.clone()));
            id
        }
    }
}
