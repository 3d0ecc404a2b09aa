//! Steps bound to the deployment graph's nodes.
//!
//! Payment steps talk to a `RecordStore`; weather steps talk to a `Geocoder`,
//! a `WeatherProvider`, an `AlertProvider` and the shared `ResultCache`. Collaborator errors are
//! returned as `Err` and end the run; everything else is written into the
//! state for the aggregator to render.

pub mod payments;
pub mod weather;

pub use payments::{
    CheckNostroCreditStep, GetNostroAccountsStep, GetRelationshipManagerStep,
    GetTransactionsStep, RaiseDisputeStep, VerifyTransactionStep,
};
pub use weather::{
    ActivitiesStep, AlertsStep, CacheLookupStep, CacheUpdateStep, FallbackStep, GeocodeStep,
    NotificationStep, ParseQueryStep, PlaygroundAdviceStep, PlaygroundBookingStep,
    PreferenceStep, ResolveDateStep, WeatherStep,
};

/// Strip leading and trailing punctuation from a request token.
pub(crate) fn clean_token(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric() && c != '_' && c != '-')
}
