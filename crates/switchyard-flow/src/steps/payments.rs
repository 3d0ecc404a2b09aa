use std::sync::Arc;

use chrono::Utc;
use futures::future::BoxFuture;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use switchyard_core::error::Result;
use switchyard_core::traits::RecordStore;
use switchyard_core::types::{fields, Record, Table, WorkflowState};

use super::clean_token;
use crate::graph::Step;
use crate::memory::{ActorKeyResolver, ActorMemory};

/// Upper bound for listings that need the whole table.
const FULL_SCAN: usize = 1_000;

pub const DISPUTE_REASON: &str = "Transaction failed to process within expected timeframe";

fn str_field<'a>(record: &'a Record, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str)
}

fn pick(record: &Record, keys: &[&str]) -> Value {
    let mut out = Map::new();
    for key in keys {
        out.insert(
            key.to_string(),
            record.get(*key).cloned().unwrap_or(Value::Null),
        );
    }
    Value::Object(out)
}

/// Fetches the most recent transactions and remembers them per actor.
pub struct GetTransactionsStep {
    store: Arc<dyn RecordStore>,
    memory: Arc<ActorMemory>,
    actors: ActorKeyResolver,
    limit: usize,
}

impl GetTransactionsStep {
    pub fn new(
        store: Arc<dyn RecordStore>,
        memory: Arc<ActorMemory>,
        actors: ActorKeyResolver,
        limit: usize,
    ) -> Self {
        Self {
            store,
            memory,
            actors,
            limit,
        }
    }
}

impl Step for GetTransactionsStep {
    fn run<'a>(&'a self, state: &'a mut WorkflowState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let records = self.store.scan(Table::Transactions, self.limit).await?;
            let actor = self.actors.resolve(state.request()).to_string();

            for record in &records {
                self.memory
                    .record(&actor, Value::Object(record.clone()))
                    .await;
            }

            info!(count = records.len(), actor = %actor, "Fetched recent transactions");
            state.set(
                fields::TRANSACTIONS,
                Value::Array(records.into_iter().map(Value::Object).collect()),
            );
            Ok(())
        })
    }
}

/// Finds the relationship manager for the requesting actor.
///
/// The actor's customer record names its manager; without one the first
/// manager on file is used. No manager at all stores `null`.
pub struct GetRelationshipManagerStep {
    store: Arc<dyn RecordStore>,
    actors: ActorKeyResolver,
}

impl GetRelationshipManagerStep {
    pub fn new(store: Arc<dyn RecordStore>, actors: ActorKeyResolver) -> Self {
        Self { store, actors }
    }

    async fn assigned_manager(&self, actor: &str) -> Result<Option<Record>> {
        let Some(customer) = self.store.lookup(Table::Customers, actor).await? else {
            return Ok(None);
        };
        match str_field(&customer, "relationship_manager_id") {
            Some(id) => self.store.lookup(Table::RelationshipManagers, id).await,
            None => Ok(None),
        }
    }
}

impl Step for GetRelationshipManagerStep {
    fn run<'a>(&'a self, state: &'a mut WorkflowState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let actor = self.actors.resolve(state.request()).to_string();

            let manager = match self.assigned_manager(&actor).await? {
                Some(rm) => Some(rm),
                None => self
                    .store
                    .scan(Table::RelationshipManagers, 1)
                    .await?
                    .into_iter()
                    .next(),
            };

            debug!(actor = %actor, found = manager.is_some(), "Relationship manager lookup");
            state.set(
                fields::RELATIONSHIP_MANAGER,
                manager.map(Value::Object).unwrap_or(Value::Null),
            );
            Ok(())
        })
    }
}

/// Opens a service request against the first failed or pending transaction.
pub struct RaiseDisputeStep {
    store: Arc<dyn RecordStore>,
}

impl RaiseDisputeStep {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

impl Step for RaiseDisputeStep {
    fn run<'a>(&'a self, state: &'a mut WorkflowState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let transactions: Vec<Record> = state
                .get(fields::TRANSACTIONS)
                .and_then(Value::as_array)
                .map(|list| {
                    list.iter()
                        .filter_map(|v| v.as_object().cloned())
                        .collect()
                })
                .unwrap_or_default();

            if transactions.is_empty() {
                state.set(
                    fields::DISPUTE_DETAILS,
                    json!({"error": "No transactions available to dispute"}),
                );
                return Ok(());
            }

            let disputable = transactions.iter().find(|txn| {
                matches!(str_field(txn, "status"), Some("failed") | Some("pending"))
            });
            let Some(txn) = disputable else {
                state.set(
                    fields::DISPUTE_DETAILS,
                    json!({"error": "No disputable transactions found"}),
                );
                return Ok(());
            };

            let manager = state
                .get(fields::RELATIONSHIP_MANAGER)
                .and_then(Value::as_object)
                .cloned();

            let mut request = Record::new();
            request.insert(
                "transaction_id".into(),
                txn.get("transaction_id").cloned().unwrap_or(Value::Null),
            );
            request.insert(
                "customer_account".into(),
                txn.get("account_number").cloned().unwrap_or(Value::Null),
            );
            request.insert("dispute_reason".into(), json!(DISPUTE_REASON));
            request.insert("status".into(), json!("open"));
            request.insert("created_date".into(), json!(Utc::now().to_rfc3339()));
            request.insert(
                "assigned_manager_id".into(),
                manager
                    .as_ref()
                    .and_then(|m| m.get("manager_id").cloned())
                    .unwrap_or(Value::Null),
            );

            let dispute_id = self
                .store
                .insert(Table::ServiceRequests, request.clone())
                .await?;

            info!(
                dispute_id = %dispute_id,
                transaction_id = str_field(txn, "transaction_id").unwrap_or_default(),
                "Service request opened"
            );

            let mut details = request;
            details.remove("assigned_manager_id");
            details.insert("dispute_id".into(), json!(dispute_id));
            details.insert(
                "assigned_manager".into(),
                manager
                    .map(|m| pick(&m, &["manager_id", "name", "email", "phone", "branch"]))
                    .unwrap_or(Value::Null),
            );
            state.set(fields::DISPUTE_DETAILS, Value::Object(details));
            Ok(())
        })
    }
}

/// Reports whether a transaction's amount has been credited.
pub struct VerifyTransactionStep {
    store: Arc<dyn RecordStore>,
}

impl VerifyTransactionStep {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// A `TXN...` token in the request, else the first fetched transaction,
    /// else the most recent one on file.
    async fn target_id(&self, state: &WorkflowState) -> Result<Option<String>> {
        if let Some(token) = state
            .request()
            .split_whitespace()
            .map(clean_token)
            .find(|w| w.starts_with("TXN"))
        {
            return Ok(Some(token.to_string()));
        }

        let fetched = state
            .get(fields::TRANSACTIONS)
            .and_then(Value::as_array)
            .and_then(|list| list.first())
            .and_then(|txn| txn.get("transaction_id"))
            .and_then(Value::as_str);
        if let Some(id) = fetched {
            return Ok(Some(id.to_string()));
        }

        let latest = self.store.scan(Table::Transactions, 1).await?;
        Ok(latest
            .first()
            .and_then(|txn| str_field(txn, "transaction_id"))
            .map(str::to_string))
    }
}

impl Step for VerifyTransactionStep {
    fn run<'a>(&'a self, state: &'a mut WorkflowState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let Some(id) = self.target_id(state).await? else {
                state.set(
                    fields::VERIFICATION_RESULT,
                    json!({"error": "No transaction ID available for verification"}),
                );
                return Ok(());
            };

            let result = match self.store.lookup(Table::Transactions, &id).await? {
                None => json!({
                    "transaction_id": id,
                    "is_credited": false,
                    "verification_status": "transaction_not_found",
                    "notes": "Transaction ID not found in system",
                }),
                Some(txn) => match str_field(&txn, "status") {
                    Some("completed") => json!({
                        "transaction_id": id,
                        "is_credited": true,
                        "verification_status": "credited",
                        "notes": "Transaction successfully credited to account",
                        "credited_amount": txn.get("amount").cloned().unwrap_or(Value::Null),
                        "currency": txn.get("currency").cloned().unwrap_or(json!("USD")),
                        "credited_date": txn.get("transaction_date").cloned().unwrap_or(Value::Null),
                    }),
                    Some("pending") => json!({
                        "transaction_id": id,
                        "is_credited": false,
                        "verification_status": "pending",
                        "notes": "Transaction is still being processed",
                    }),
                    _ => json!({
                        "transaction_id": id,
                        "is_credited": false,
                        "verification_status": "failed",
                        "notes": "Transaction failed and amount not credited",
                    }),
                },
            };

            debug!(transaction_id = %id, "Transaction verified");
            state.set(fields::VERIFICATION_RESULT, result);
            Ok(())
        })
    }
}

fn is_reference_keyword(word: &str) -> bool {
    matches!(word, "export" | "settlement" | "reference")
}

/// Extracts an export reference: the word after `export`, `settlement` or
/// `reference` when it starts with `EXP` or is longer than 8 characters.
/// Case is kept as typed, and a keyword is never taken as the reference.
pub fn export_reference(request: &str) -> Option<String> {
    let words: Vec<&str> = request.split_whitespace().map(clean_token).collect();
    words.windows(2).find_map(|pair| {
        let keyword = pair[0].to_lowercase();
        let candidate = pair[1];
        let looks_like_ref = !is_reference_keyword(&candidate.to_lowercase())
            && (candidate.to_uppercase().starts_with("EXP") || candidate.chars().count() > 8);
        (is_reference_keyword(&keyword) && looks_like_ref).then(|| candidate.to_string())
    })
}

/// Checks EUR export settlements against the EUR nostro account.
pub struct CheckNostroCreditStep {
    store: Arc<dyn RecordStore>,
}

impl CheckNostroCreditStep {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    async fn check(&self, reference: Option<&str>, currency: &str) -> Result<Value> {
        let settlements: Vec<Record> = self
            .store
            .scan(Table::Settlements, FULL_SCAN)
            .await?
            .into_iter()
            .filter(|s| {
                str_field(s, "currency") == Some(currency)
                    && str_field(s, "settlement_type") == Some("export")
                    && reference.map_or(true, |r| str_field(s, "export_reference") == Some(r))
            })
            .collect();

        if settlements.is_empty() {
            let suffix = reference
                .map(|r| format!(" for reference {}", r))
                .unwrap_or_default();
            return Ok(json!({
                "status": "not_found",
                "message": format!("No {} export settlements found{}", currency, suffix),
                "settlements": [],
            }));
        }

        let nostro = self
            .store
            .scan(Table::NostroAccounts, FULL_SCAN)
            .await?
            .into_iter()
            .find(|acc| str_field(acc, "currency") == Some(currency));
        let Some(nostro) = nostro else {
            return Ok(json!({
                "status": "error",
                "message": "Euro nostro account not found",
                "settlements": [],
            }));
        };

        let mut details = Vec::with_capacity(settlements.len());
        let mut credited_total = 0.0;
        let mut pending_total = 0.0;
        let mut credited_count = 0usize;

        for s in &settlements {
            let amount = s.get("amount").and_then(Value::as_f64).unwrap_or(0.0);
            let is_credited = str_field(s, "status") == Some("completed");
            if is_credited {
                credited_total += amount;
                credited_count += 1;
            } else {
                pending_total += amount;
            }
            let mut detail = pick(
                s,
                &[
                    "settlement_id",
                    "export_reference",
                    "amount",
                    "currency",
                    "counterparty",
                    "settlement_date",
                    "expected_credit_date",
                    "actual_credit_date",
                    "status",
                    "swift_message_ref",
                ],
            );
            if let Some(obj) = detail.as_object_mut() {
                obj.insert("is_credited".into(), json!(is_credited));
            }
            details.push(detail);
        }

        let mut account = pick(
            &nostro,
            &[
                "account_id",
                "currency",
                "correspondent_bank",
                "correspondent_swift",
                "available_balance",
                "last_updated",
            ],
        );
        if let Some(obj) = account.as_object_mut() {
            obj.insert(
                "current_balance".into(),
                nostro.get("balance").cloned().unwrap_or(json!(0.0)),
            );
        }

        Ok(json!({
            "status": "success",
            "message": format!("Found {} {} export settlement(s)", settlements.len(), currency),
            "nostro_account": account,
            "settlements": details,
            "summary": {
                "total_settlements": settlements.len(),
                "total_credited_amount": credited_total,
                "total_pending_amount": pending_total,
                "credited_count": credited_count,
                "pending_count": settlements.len() - credited_count,
            },
        }))
    }
}

impl Step for CheckNostroCreditStep {
    fn run<'a>(&'a self, state: &'a mut WorkflowState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let reference = export_reference(state.request());
            let result = self.check(reference.as_deref(), "EUR").await?;
            let status = result.get("status").and_then(Value::as_str).unwrap_or_default();
            debug!(reference = ?reference, status, "Nostro credit checked");
            state.set(fields::NOSTRO_CREDIT_RESULT, result);
            Ok(())
        })
    }
}

/// Currency filter named in the request, if any. The first keyword in the
/// list that appears anywhere in the text wins.
pub fn currency_filter(request: &str) -> Option<&'static str> {
    const KEYWORDS: [(&str, &str); 10] = [
        ("eur", "EUR"),
        ("euro", "EUR"),
        ("usd", "USD"),
        ("dollar", "USD"),
        ("gbp", "GBP"),
        ("pound", "GBP"),
        ("jpy", "JPY"),
        ("yen", "JPY"),
        ("chf", "CHF"),
        ("franc", "CHF"),
    ];
    let text = request.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(keyword, _)| text.contains(keyword))
        .map(|(_, code)| *code)
}

/// Lists nostro accounts, optionally filtered by currency.
pub struct GetNostroAccountsStep {
    store: Arc<dyn RecordStore>,
}

impl GetNostroAccountsStep {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

impl Step for GetNostroAccountsStep {
    fn run<'a>(&'a self, state: &'a mut WorkflowState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let currency = currency_filter(state.request());
            let accounts: Vec<Value> = self
                .store
                .scan(Table::NostroAccounts, FULL_SCAN)
                .await?
                .into_iter()
                .filter(|acc| currency.map_or(true, |c| str_field(acc, "currency") == Some(c)))
                .map(|acc| {
                    pick(
                        &acc,
                        &[
                            "account_id",
                            "currency",
                            "account_type",
                            "correspondent_bank",
                            "correspondent_swift",
                            "balance",
                            "available_balance",
                            "last_updated",
                            "account_status",
                        ],
                    )
                })
                .collect();

            debug!(currency = ?currency, count = accounts.len(), "Nostro accounts listed");
            state.set(
                fields::NOSTRO_ACCOUNTS,
                json!({
                    "total_count": accounts.len(),
                    "accounts": accounts,
                    "currency_filter": currency.unwrap_or("all"),
                }),
            );
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchyard_core::types::{ActionSet, ActionTag};
    use switchyard_test_utils::{seeded_store, FailingStore};

    fn state(request: &str) -> WorkflowState {
        WorkflowState::new(request, ActionSet::new())
    }

    #[test]
    fn test_export_reference_extraction() {
        assert_eq!(
            export_reference("check export EXP2025001 credit"),
            Some("EXP2025001".to_string())
        );
        assert_eq!(
            export_reference("is the settlement REF-12345678 in?"),
            Some("REF-12345678".to_string())
        );
        assert_eq!(export_reference("check export settlement status"), None);
        assert_eq!(export_reference("nostro credit"), None);
    }

    #[test]
    fn test_currency_filter() {
        assert_eq!(currency_filter("list nostro accounts in Euro"), Some("EUR"));
        assert_eq!(currency_filter("USD nostro list"), Some("USD"));
        assert_eq!(currency_filter("show nostro accounts"), None);
    }

    #[tokio::test]
    async fn test_get_transactions_records_memory() {
        let store = seeded_store().await;
        let memory = Arc::new(ActorMemory::new());
        let step = GetTransactionsStep::new(store, memory.clone(), ActorKeyResolver::default(), 5);

        let mut s = state("recent transactions for ACC1001");
        step.run(&mut s).await.unwrap();

        let txns = s.get(fields::TRANSACTIONS).unwrap().as_array().unwrap();
        assert_eq!(txns.len(), 3);
        assert_eq!(txns[0]["transaction_id"], "TXN1001");

        // Each record is prepended, so the last fetched is newest in memory.
        let remembered = memory.get("ACC1001").await;
        assert_eq!(remembered.len(), 3);
        assert_eq!(remembered[0]["transaction_id"], "TXN1003");
        assert!(memory.get("default_user").await.is_empty());
    }

    #[tokio::test]
    async fn test_get_transactions_propagates_store_errors() {
        let step = GetTransactionsStep::new(
            Arc::new(FailingStore),
            Arc::new(ActorMemory::new()),
            ActorKeyResolver::default(),
            5,
        );
        let err = step.run(&mut state("transactions")).await.unwrap_err();
        assert!(err.is_collaborator());
    }

    #[tokio::test]
    async fn test_rm_uses_customer_assignment() {
        let store = seeded_store().await;
        let step = GetRelationshipManagerStep::new(store, ActorKeyResolver::default());

        let mut s = state("who is the manager for ACC1001");
        step.run(&mut s).await.unwrap();
        assert_eq!(s.get(fields::RELATIONSHIP_MANAGER).unwrap()["manager_id"], "RM002");

        let mut s = state("who is my manager");
        step.run(&mut s).await.unwrap();
        assert!(s.get(fields::RELATIONSHIP_MANAGER).unwrap().is_object());
    }

    #[tokio::test]
    async fn test_rm_none_is_null() {
        let store = Arc::new(switchyard_store::MemoryStore::new());
        let step = GetRelationshipManagerStep::new(store, ActorKeyResolver::default());
        let mut s = state("manager");
        step.run(&mut s).await.unwrap();
        assert_eq!(s.get(fields::RELATIONSHIP_MANAGER), Some(&Value::Null));
    }

    #[tokio::test]
    async fn test_dispute_without_transactions() {
        let store = seeded_store().await;
        let step = RaiseDisputeStep::new(store);
        let mut s = state("dispute");
        step.run(&mut s).await.unwrap();
        assert_eq!(
            s.get(fields::DISPUTE_DETAILS).unwrap()["error"],
            "No transactions available to dispute"
        );
    }

    #[tokio::test]
    async fn test_dispute_without_disputable() {
        let store = seeded_store().await;
        let step = RaiseDisputeStep::new(store);
        let mut s = state("dispute");
        s.set(
            fields::TRANSACTIONS,
            json!([{"transaction_id": "TXN1001", "status": "completed"}]),
        );
        step.run(&mut s).await.unwrap();
        assert_eq!(
            s.get(fields::DISPUTE_DETAILS).unwrap()["error"],
            "No disputable transactions found"
        );
    }

    #[tokio::test]
    async fn test_dispute_opens_service_request() {
        let store = seeded_store().await;
        let step = RaiseDisputeStep::new(store.clone());
        let mut s = WorkflowState::new(
            "raise dispute",
            [ActionTag::RaiseDispute].into_iter().collect(),
        );
        s.set(
            fields::TRANSACTIONS,
            json!([
                {"transaction_id": "TXN1001", "status": "completed", "account_number": "ACC1001"},
                {"transaction_id": "TXN1002", "status": "failed", "account_number": "ACC1001"},
            ]),
        );
        s.set(
            fields::RELATIONSHIP_MANAGER,
            json!({"manager_id": "RM002", "name": "Sam Okafor", "email": "sam@bank.example"}),
        );
        step.run(&mut s).await.unwrap();

        let details = s.get(fields::DISPUTE_DETAILS).unwrap();
        assert_eq!(details["transaction_id"], "TXN1002");
        assert_eq!(details["status"], "open");
        assert_eq!(details["dispute_reason"], DISPUTE_REASON);
        assert_eq!(details["assigned_manager"]["name"], "Sam Okafor");

        let id = details["dispute_id"].as_str().unwrap();
        let stored = store.lookup(Table::ServiceRequests, id).await.unwrap().unwrap();
        assert_eq!(stored["assigned_manager_id"], "RM002");
    }

    #[tokio::test]
    async fn test_verify_statuses() {
        let store = seeded_store().await;
        let step = VerifyTransactionStep::new(store);

        let mut s = state("verify TXN1001 please");
        step.run(&mut s).await.unwrap();
        let v = s.get(fields::VERIFICATION_RESULT).unwrap();
        assert_eq!(v["verification_status"], "credited");
        assert_eq!(v["is_credited"], true);
        assert_eq!(v["credited_amount"], 250000.0);

        let mut s = state("verify TXN1003.");
        step.run(&mut s).await.unwrap();
        assert_eq!(s.get(fields::VERIFICATION_RESULT).unwrap()["verification_status"], "pending");

        let mut s = state("verify TXN1002");
        step.run(&mut s).await.unwrap();
        assert_eq!(s.get(fields::VERIFICATION_RESULT).unwrap()["verification_status"], "failed");

        let mut s = state("verify TXN9999");
        step.run(&mut s).await.unwrap();
        assert_eq!(
            s.get(fields::VERIFICATION_RESULT).unwrap()["verification_status"],
            "transaction_not_found"
        );
    }

    #[tokio::test]
    async fn test_verify_falls_back_to_latest() {
        let store = seeded_store().await;
        let step = VerifyTransactionStep::new(store);
        let mut s = state("was it credited?");
        step.run(&mut s).await.unwrap();
        assert_eq!(s.get(fields::VERIFICATION_RESULT).unwrap()["transaction_id"], "TXN1001");
    }

    #[tokio::test]
    async fn test_verify_with_empty_store() {
        let step = VerifyTransactionStep::new(Arc::new(switchyard_store::MemoryStore::new()));
        let mut s = state("verify");
        step.run(&mut s).await.unwrap();
        assert_eq!(
            s.get(fields::VERIFICATION_RESULT).unwrap()["error"],
            "No transaction ID available for verification"
        );
    }

    #[tokio::test]
    async fn test_nostro_credit_summary() {
        let store = seeded_store().await;
        let step = CheckNostroCreditStep::new(store);
        let mut s = state("euro nostro credit for export settlement");
        step.run(&mut s).await.unwrap();

        let r = s.get(fields::NOSTRO_CREDIT_RESULT).unwrap();
        assert_eq!(r["status"], "success");
        assert_eq!(r["nostro_account"]["account_id"], "NOS-EUR-001");
        assert_eq!(r["summary"]["total_settlements"], 2);
        assert_eq!(r["summary"]["credited_count"], 1);
        assert_eq!(r["summary"]["total_credited_amount"], 150000.0);
    }

    #[tokio::test]
    async fn test_nostro_credit_by_reference() {
        let store = seeded_store().await;
        let step = CheckNostroCreditStep::new(store);

        let mut s = state("check export EXP2025002");
        step.run(&mut s).await.unwrap();
        let r = s.get(fields::NOSTRO_CREDIT_RESULT).unwrap();
        assert_eq!(r["settlements"].as_array().unwrap().len(), 1);
        assert_eq!(r["settlements"][0]["is_credited"], false);

        let mut s = state("check export EXP0000000");
        step.run(&mut s).await.unwrap();
        let r = s.get(fields::NOSTRO_CREDIT_RESULT).unwrap();
        assert_eq!(r["status"], "not_found");
        assert_eq!(
            r["message"],
            "No EUR export settlements found for reference EXP0000000"
        );
    }

    #[tokio::test]
    async fn test_nostro_accounts_filter() {
        let store = seeded_store().await;
        let step = GetNostroAccountsStep::new(store);

        let mut s = state("nostro accounts in usd");
        step.run(&mut s).await.unwrap();
        let r = s.get(fields::NOSTRO_ACCOUNTS).unwrap();
        assert_eq!(r["total_count"], 1);
        assert_eq!(r["currency_filter"], "USD");
        assert_eq!(r["accounts"][0]["currency"], "USD");

        let mut s = state("nostro list");
        step.run(&mut s).await.unwrap();
        let r = s.get(fields::NOSTRO_ACCOUNTS).unwrap();
        assert_eq!(r["total_count"], 2);
        assert_eq!(r["currency_filter"], "all");
    }
}
