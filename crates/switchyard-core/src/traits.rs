use chrono::NaiveDate;
use futures::future::BoxFuture;

use crate::error::Result;
use crate::types::*;

/// Record store: persistence backend for payment data.
pub trait RecordStore: Send + Sync + 'static {
    /// Look up one record by its primary key.
    fn lookup(&self, table: Table, key: &str) -> BoxFuture<'_, Result<Option<Record>>>;

    /// Insert a record and return its id. A missing primary key is minted.
    fn insert(&self, table: Table, record: Record) -> BoxFuture<'_, Result<String>>;

    /// Most recent records first, at most `limit`.
    fn scan(&self, table: Table, limit: usize) -> BoxFuture<'_, Result<Vec<Record>>>;
}

/// Weather provider: forecast text for a point and a day.
///
/// A provider that cannot produce a forecast may either return an error or
/// return failure text (`"Unable to ..."`); the latter is retried in-band.
pub trait WeatherProvider: Send + Sync + 'static {
    fn forecast(
        &self,
        coordinates: Coordinates,
        date: NaiveDate,
    ) -> BoxFuture<'_, Result<String>>;
}

/// Alert provider: active weather alerts for an area such as `"CA"`.
///
/// Like `WeatherProvider`, "nothing to report" and "could not fetch" come
/// back as text; only an unreachable provider is an error.
pub trait AlertProvider: Send + Sync + 'static {
    fn alerts(&self, area: &str) -> BoxFuture<'_, Result<String>>;
}

/// Geocoder: resolve a place name to coordinates.
pub trait Geocoder: Send + Sync + 'static {
    fn locate(&self, location: &str) -> BoxFuture<'_, Result<Coordinates>>;
}

/// Audit sink: receives a snapshot after each audited node.
///
/// Must not block. Errors are logged by the caller and otherwise ignored.
pub trait AuditSink: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn record(&self, record: AuditRecord) -> Result<()>;
}
