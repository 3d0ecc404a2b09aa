//! Shared fixtures and mock collaborators for Switchyard tests.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use futures::future::BoxFuture;
use serde_json::{json, Value};

use switchyard_core::error::{Result, SwitchyardError};
use switchyard_core::traits::{AlertProvider, AuditSink, RecordStore, WeatherProvider};
use switchyard_core::types::{AuditRecord, Coordinates, Record, Table};
use switchyard_store::MemoryStore;

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

pub fn sample_customers() -> Vec<Record> {
    vec![
        record(json!({
            "customer_id": "ACC1001",
            "name": "Priya Raman",
            "account_number": "ACC1001",
            "customer_type": "corporate",
            "relationship_manager_id": "RM002",
        })),
        record(json!({
            "customer_id": "ACC1002",
            "name": "Lena Vogt",
            "account_number": "ACC1002",
            "customer_type": "retail",
        })),
    ]
}

pub fn sample_relationship_managers() -> Vec<Record> {
    vec![
        record(json!({
            "manager_id": "RM001",
            "name": "Dana Whitfield",
            "email": "dana@bank.example",
            "phone": "+1-555-0101",
            "branch": "Downtown",
            "specialization": ["Retail Banking", "Mortgages"],
            "experience_years": 9,
        })),
        record(json!({
            "manager_id": "RM002",
            "name": "Sam Okafor",
            "email": "sam@bank.example",
            "phone": "+1-555-0102",
            "branch": "Midtown",
            "specialization": ["Trade Finance", "Corporate Payments"],
            "experience_years": 14,
        })),
    ]
}

/// Oldest first, so a store scan returns `TXN1001` first.
pub fn sample_transactions() -> Vec<Record> {
    vec![
        record(json!({
            "transaction_id": "TXN1003",
            "account_number": "ACC1001",
            "amount": 4800.5,
            "currency": "USD",
            "status": "pending",
            "transaction_date": "2025-08-03",
            "recipient_name": "Harbor Logistics",
        })),
        record(json!({
            "transaction_id": "TXN1002",
            "account_number": "ACC1001",
            "amount": 12500.0,
            "currency": "USD",
            "status": "failed",
            "transaction_date": "2025-08-02",
            "recipient_name": "Cobalt Supplies",
        })),
        record(json!({
            "transaction_id": "TXN1001",
            "account_number": "ACC1001",
            "amount": 250000.0,
            "currency": "USD",
            "status": "completed",
            "transaction_date": "2025-08-01",
            "recipient_name": "Northgate Holdings",
        })),
    ]
}

pub fn sample_nostro_accounts() -> Vec<Record> {
    vec![
        record(json!({
            "account_id": "NOS-EUR-001",
            "currency": "EUR",
            "account_type": "nostro",
            "correspondent_bank": "Deutsche Handelsbank",
            "correspondent_swift": "DEHBDEFF",
            "balance": 2_450_000.0,
            "available_balance": 2_300_000.0,
            "last_updated": "2025-08-04",
            "account_status": "active",
        })),
        record(json!({
            "account_id": "NOS-USD-001",
            "currency": "USD",
            "account_type": "nostro",
            "correspondent_bank": "First Atlantic Trust",
            "correspondent_swift": "FATRUS33",
            "balance": 5_100_000.0,
            "available_balance": 4_950_000.0,
            "last_updated": "2025-08-04",
            "account_status": "active",
        })),
    ]
}

/// Two EUR export settlements (one credited), plus one of each kind that
/// a EUR export check must ignore.
pub fn sample_settlements() -> Vec<Record> {
    vec![
        record(json!({
            "settlement_id": "SETT001",
            "export_reference": "EXP2025001",
            "settlement_type": "export",
            "amount": 150000.0,
            "currency": "EUR",
            "counterparty": "Lyon Textiles SA",
            "settlement_date": "2025-07-28",
            "expected_credit_date": "2025-07-30",
            "actual_credit_date": "2025-07-30",
            "status": "completed",
            "swift_message_ref": "MT910-0001",
        })),
        record(json!({
            "settlement_id": "SETT002",
            "export_reference": "EXP2025002",
            "settlement_type": "export",
            "amount": 87500.0,
            "currency": "EUR",
            "counterparty": "Milano Meccanica SpA",
            "settlement_date": "2025-08-01",
            "expected_credit_date": "2025-08-05",
            "status": "pending",
            "swift_message_ref": "MT910-0002",
        })),
        record(json!({
            "settlement_id": "SETT003",
            "export_reference": "EXP2025003",
            "settlement_type": "export",
            "amount": 40000.0,
            "currency": "USD",
            "status": "completed",
        })),
        record(json!({
            "settlement_id": "SETT004",
            "export_reference": "IMP2025001",
            "settlement_type": "import",
            "amount": 22000.0,
            "currency": "EUR",
            "status": "completed",
        })),
    ]
}

/// Every sample table, in insertion order.
pub fn sample_tables() -> Vec<(Table, Vec<Record>)> {
    vec![
        (Table::Customers, sample_customers()),
        (Table::RelationshipManagers, sample_relationship_managers()),
        (Table::Transactions, sample_transactions()),
        (Table::NostroAccounts, sample_nostro_accounts()),
        (Table::Settlements, sample_settlements()),
    ]
}

/// A `MemoryStore` loaded with every sample table.
pub async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for (table, records) in sample_tables() {
        for r in records {
            // MemoryStore inserts cannot fail.
            let _ = store.insert(table, r).await;
        }
    }
    store
}

/// Write `content` to a config file inside a fresh temp dir.
pub fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("switchyard.toml");
    std::fs::write(&path, content).unwrap();
    (dir, path)
}

/// A store whose every call fails with a storage error.
pub struct FailingStore;

impl RecordStore for FailingStore {
    fn lookup(&self, _table: Table, _key: &str) -> BoxFuture<'_, Result<Option<Record>>> {
        Box::pin(async { Err(SwitchyardError::Storage("store unavailable".into())) })
    }

    fn insert(&self, _table: Table, _record: Record) -> BoxFuture<'_, Result<String>> {
        Box::pin(async { Err(SwitchyardError::Storage("store unavailable".into())) })
    }

    fn scan(&self, _table: Table, _limit: usize) -> BoxFuture<'_, Result<Vec<Record>>> {
        Box::pin(async { Err(SwitchyardError::Storage("store unavailable".into())) })
    }
}

/// Returns the same forecast every time and counts calls.
pub struct CountingWeatherProvider {
    text: String,
    calls: AtomicUsize,
}

impl CountingWeatherProvider {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl WeatherProvider for CountingWeatherProvider {
    fn forecast(
        &self,
        _coordinates: Coordinates,
        _date: NaiveDate,
    ) -> BoxFuture<'_, Result<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = self.text.clone();
        Box::pin(async move { Ok(text) })
    }
}

/// A provider that is down.
pub struct FailingWeatherProvider;

impl WeatherProvider for FailingWeatherProvider {
    fn forecast(
        &self,
        _coordinates: Coordinates,
        _date: NaiveDate,
    ) -> BoxFuture<'_, Result<String>> {
        Box::pin(async { Err(SwitchyardError::Weather("provider unreachable".into())) })
    }
}

/// Returns the same alert text for every area and counts calls.
pub struct CountingAlertProvider {
    text: String,
    calls: AtomicUsize,
}

impl CountingAlertProvider {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AlertProvider for CountingAlertProvider {
    fn alerts(&self, _area: &str) -> BoxFuture<'_, Result<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = self.text.clone();
        Box::pin(async move { Ok(text) })
    }
}

/// Keeps every audit record it receives.
#[derive(Default)]
pub struct RecordingAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl RecordingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl AuditSink for RecordingAuditSink {
    fn name(&self) -> &str {
        "recording"
    }

    fn record(&self, record: AuditRecord) -> Result<()> {
        self.records.lock().unwrap().push(record);
        Ok(())
    }
}

/// Rejects every audit record.
pub struct FailingAuditSink;

impl AuditSink for FailingAuditSink {
    fn name(&self) -> &str {
        "failing"
    }

    fn record(&self, _record: AuditRecord) -> Result<()> {
        Err(SwitchyardError::Audit("sink offline".into()))
    }
}
