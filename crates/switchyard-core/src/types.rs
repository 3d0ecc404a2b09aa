use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one workflow run.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A classification label describing one kind of requested operation.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionTag {
    GetTransactions,
    RaiseDispute,
    GetRm,
    VerifyTransaction,
    CheckNostro,
    GetNostroAccounts,
    Weather,
    Activity,
    Booking,
}

impl ActionTag {
    pub const ALL: [ActionTag; 9] = [
        Self::GetTransactions,
        Self::RaiseDispute,
        Self::GetRm,
        Self::VerifyTransaction,
        Self::CheckNostro,
        Self::GetNostroAccounts,
        Self::Weather,
        Self::Activity,
        Self::Booking,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetTransactions => "get_transactions",
            Self::RaiseDispute => "raise_dispute",
            Self::GetRm => "get_rm",
            Self::VerifyTransaction => "verify_transaction",
            Self::CheckNostro => "check_nostro",
            Self::GetNostroAccounts => "get_nostro_accounts",
            Self::Weather => "weather",
            Self::Activity => "activity",
            Self::Booking => "booking",
        }
    }
}

impl fmt::Display for ActionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionTag {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| format!("unknown action tag: {}", s))
    }
}

/// The set of actions a request was classified into.
pub type ActionSet = BTreeSet<ActionTag>;

/// Identifier of a node in the workflow graph.
///
/// The set is closed: every node is bound to exactly one step when the graph
/// is built, so there is no name lookup at run time.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeId {
    // Payments
    GetTransactions,
    GetRelationshipManager,
    RaiseDispute,
    VerifyTransaction,
    CheckNostroCredit,
    GetNostroAccounts,
    // Weather
    ParseQuery,
    ResolveDate,
    Preference,
    Geocode,
    CacheLookup,
    Weather,
    CacheUpdate,
    Alerts,
    Activities,
    PlaygroundAdvice,
    PlaygroundBooking,
    Notification,
    Fallback,
    // Terminal
    FormatResponse,
}

impl NodeId {
    pub const ALL: [NodeId; 20] = [
        Self::GetTransactions,
        Self::GetRelationshipManager,
        Self::RaiseDispute,
        Self::VerifyTransaction,
        Self::CheckNostroCredit,
        Self::GetNostroAccounts,
        Self::ParseQuery,
        Self::ResolveDate,
        Self::Preference,
        Self::Geocode,
        Self::CacheLookup,
        Self::Weather,
        Self::CacheUpdate,
        Self::Alerts,
        Self::Activities,
        Self::PlaygroundAdvice,
        Self::PlaygroundBooking,
        Self::Notification,
        Self::Fallback,
        Self::FormatResponse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetTransactions => "get_transactions",
            Self::GetRelationshipManager => "get_relationship_manager",
            Self::RaiseDispute => "raise_dispute",
            Self::VerifyTransaction => "verify_transaction",
            Self::CheckNostroCredit => "check_nostro_credit",
            Self::GetNostroAccounts => "get_nostro_accounts",
            Self::ParseQuery => "parse_query",
            Self::ResolveDate => "resolve_date",
            Self::Preference => "preference",
            Self::Geocode => "geocode",
            Self::CacheLookup => "cache_lookup",
            Self::Weather => "weather",
            Self::CacheUpdate => "cache_update",
            Self::Alerts => "alerts",
            Self::Activities => "activities",
            Self::PlaygroundAdvice => "playground_advice",
            Self::PlaygroundBooking => "playground_booking",
            Self::Notification => "notification",
            Self::Fallback => "fallback",
            Self::FormatResponse => "format_response",
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Well-known state field names.
pub mod fields {
    pub const TRANSACTIONS: &str = "transactions";
    pub const RELATIONSHIP_MANAGER: &str = "relationship_manager";
    pub const DISPUTE_DETAILS: &str = "dispute_details";
    pub const VERIFICATION_RESULT: &str = "verification_result";
    pub const NOSTRO_CREDIT_RESULT: &str = "nostro_credit_result";
    pub const NOSTRO_ACCOUNTS: &str = "nostro_accounts";
    pub const LOCATION_NAME: &str = "location_name";
    pub const DATE: &str = "date";
    pub const PREFERENCE: &str = "preference";
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
    pub const CACHE_HIT: &str = "cache_hit";
    pub const WEATHER: &str = "weather";
    pub const ALERTS: &str = "alerts";
    pub const ACTIVITIES: &str = "activities";
    pub const PLAYGROUND_ADVICE: &str = "playground_advice";
    pub const PLAYGROUND_BOOKING: &str = "playground_booking";
    pub const NOTIFICATION: &str = "notification";
    pub const FALLBACK: &str = "fallback";
    pub const FINAL_RESPONSE: &str = "final_response";
}

/// Shared state threaded through every step of one run.
///
/// The request text and its action set are fixed at construction. Everything
/// else lives in `data`, where an absent key, a JSON `null`, and an empty
/// string are three different things.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    request: String,
    actions: ActionSet,
    data: BTreeMap<String, serde_json::Value>,
}

impl WorkflowState {
    pub fn new(request: impl Into<String>, actions: ActionSet) -> Self {
        Self {
            request: request.into(),
            actions,
            data: BTreeMap::new(),
        }
    }

    /// The raw request text.
    pub fn request(&self) -> &str {
        &self.request
    }

    /// The classified action set for this run.
    pub fn actions(&self) -> &ActionSet {
        &self.actions
    }

    pub fn has_action(&self, tag: ActionTag) -> bool {
        self.actions.contains(&tag)
    }

    /// Get a value by key.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Get a value as a string, if it's a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.data.get(key).and_then(|v| v.as_f64())
    }

    /// Whether the key is present, including when its value is `null`.
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Set a value.
    pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.data.insert(key.into(), value);
    }

    /// Set a string value.
    pub fn set_str(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data
            .insert(key.into(), serde_json::Value::String(value.into()));
    }

    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.data.remove(key)
    }

    /// Fields whose value differs from `before` (added or changed).
    pub fn changed_since<'a>(
        &'a self,
        before: &'a WorkflowState,
    ) -> impl Iterator<Item = (&'a str, &'a serde_json::Value)> + 'a {
        self.data
            .iter()
            .filter(move |(k, v)| before.data.get(k.as_str()) != Some(*v))
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Get the underlying data map.
    pub fn data(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.data
    }
}

/// A flat record exchanged with the storage collaborator.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Tables the orchestrator reads from or writes to.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Customers,
    Transactions,
    RelationshipManagers,
    ServiceRequests,
    NostroAccounts,
    Settlements,
}

impl Table {
    pub const ALL: [Table; 6] = [
        Self::Customers,
        Self::Transactions,
        Self::RelationshipManagers,
        Self::ServiceRequests,
        Self::NostroAccounts,
        Self::Settlements,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customers => "customers",
            Self::Transactions => "transactions",
            Self::RelationshipManagers => "relationship_managers",
            Self::ServiceRequests => "service_requests",
            Self::NostroAccounts => "nostro_accounts",
            Self::Settlements => "settlements",
        }
    }

    /// Field holding the record's id.
    pub fn primary_key(&self) -> &'static str {
        match self {
            Self::Customers => "customer_id",
            Self::Transactions => "transaction_id",
            Self::RelationshipManagers => "manager_id",
            Self::ServiceRequests => "dispute_id",
            Self::NostroAccounts => "account_id",
            Self::Settlements => "settlement_id",
        }
    }

    /// Prefix used when the store has to mint an id.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Customers => "CUST",
            Self::Transactions => "TXN",
            Self::RelationshipManagers => "RM",
            Self::ServiceRequests => "SR",
            Self::NostroAccounts => "ACC",
            Self::Settlements => "SETT",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown table: {}", s))
    }
}

/// Latitude/longitude pair returned by a geocoder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Immutable snapshot of the state taken after an audited node.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    run_id: RunId,
    node: NodeId,
    timestamp: DateTime<Utc>,
    snapshot: WorkflowState,
}

impl AuditRecord {
    pub fn new(run_id: RunId, node: NodeId, state: &WorkflowState) -> Self {
        Self {
            run_id,
            node,
            timestamp: Utc::now(),
            snapshot: state.clone(),
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn snapshot(&self) -> &WorkflowState {
        &self.snapshot
    }
}
