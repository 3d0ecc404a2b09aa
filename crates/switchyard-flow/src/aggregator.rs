use futures::future::BoxFuture;
use serde_json::Value;

use switchyard_core::error::Result;
use switchyard_core::types::{fields, WorkflowState};

use crate::graph::Step;
use crate::retry::FailureClassifier;

/// Emitted when no section is populated.
pub const NO_ACTION_RESPONSE: &str =
    "No actions were performed. Please specify what you'd like to do.";

/// Render an amount with thousands separators and two decimals.
pub fn format_amount(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac)
}

/// Terminal step: renders populated result fields in a fixed order.
///
/// Section order never depends on the order in which fields were written,
/// and rendering does not read `final_response`, so running it twice on the
/// same state yields the same text.
#[derive(Debug, Clone, Default)]
pub struct ResponseAggregator {
    failures: FailureClassifier,
}

impl ResponseAggregator {
    pub fn new(failures: FailureClassifier) -> Self {
        Self { failures }
    }

    pub fn render(&self, state: &WorkflowState) -> String {
        let mut parts: Vec<String> = Vec::new();

        if let Some(txns) = populated(state, fields::TRANSACTIONS).and_then(Value::as_array) {
            render_transactions(txns, &mut parts);
        }
        if let Some(rm) = populated(state, fields::RELATIONSHIP_MANAGER) {
            render_relationship_manager(rm, &mut parts);
        }
        if let Some(dispute) = populated(state, fields::DISPUTE_DETAILS) {
            render_dispute(dispute, &mut parts);
        }
        if let Some(verification) = populated(state, fields::VERIFICATION_RESULT) {
            render_verification(verification, &mut parts);
        }
        if let Some(credit) = populated(state, fields::NOSTRO_CREDIT_RESULT) {
            render_nostro_credit(credit, &mut parts);
        }
        if let Some(accounts) = populated(state, fields::NOSTRO_ACCOUNTS) {
            render_nostro_accounts(accounts, &mut parts);
        }
        if let Some(weather) = populated(state, fields::WEATHER) {
            self.render_weather(state, weather, &mut parts);
        }
        if let Some(alerts) = populated(state, fields::ALERTS) {
            parts.push(format!("**Weather Alerts:**\n{}", text(alerts)));
        }
        if let Some(activities) = populated(state, fields::ACTIVITIES) {
            parts.push(format!("**Suggested Activities:**\n{}", text(activities)));
        }
        if let Some(advice) = populated(state, fields::PLAYGROUND_ADVICE) {
            parts.push(format!("**Playground Advice:** {}", text(advice)));
        }
        if let Some(booking) = populated(state, fields::PLAYGROUND_BOOKING) {
            parts.push(format!("**Playground Booking:** {}", text(booking)));
        }
        if let Some(notification) = populated(state, fields::NOTIFICATION) {
            parts.push(format!("**Notification:** {}", text(notification)));
        }
        if let Some(notice) = populated(state, fields::FALLBACK) {
            parts.push(format!("**Notice:** {}", text(notice)));
        }

        if parts.is_empty() {
            return NO_ACTION_RESPONSE.to_string();
        }
        parts.join("\n\n")
    }

    fn render_weather(&self, state: &WorkflowState, weather: &Value, parts: &mut Vec<String>) {
        let forecast = text(weather);
        if self.failures.is_failure_text(&forecast) {
            parts.push(format!("**Weather Error:** {}", forecast));
            return;
        }

        let mut section = String::from("**Weather Forecast:**");
        if let Some(location) = state.get_str(fields::LOCATION_NAME) {
            section.push_str(&format!("\nLocation: {}", location));
        }
        if let Some(date) = state.get_str(fields::DATE) {
            section.push_str(&format!("\nDate: {}", date));
        }
        section.push_str(&format!("\nForecast: {}", forecast));
        if state.get(fields::CACHE_HIT).and_then(Value::as_bool) == Some(true) {
            section.push_str("\nSource: cache");
        }
        parts.push(section);
    }
}

impl Step for ResponseAggregator {
    fn run<'a>(&'a self, state: &'a mut WorkflowState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let response = self.render(state);
            state.set_str(fields::FINAL_RESPONSE, response);
            Ok(())
        })
    }
}

/// A field counts as populated when present and not null, empty text, or an
/// empty list/object.
fn populated<'a>(state: &'a WorkflowState, key: &str) -> Option<&'a Value> {
    state.get(key).filter(|v| match v {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        _ => true,
    })
}

/// Display form of a value: strings unquoted, `null`/absent as empty.
fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn field(record: &Value, key: &str) -> String {
    record.get(key).map(text).unwrap_or_default()
}

fn field_or(record: &Value, key: &str, default: &str) -> String {
    match record.get(key) {
        Some(Value::Null) | None => default.to_string(),
        Some(v) => text(v),
    }
}

fn money(record: &Value, key: &str) -> String {
    match record.get(key) {
        Some(v) => match v.as_f64() {
            Some(n) => format_amount(n),
            None => text(v),
        },
        None => format_amount(0.0),
    }
}

fn error_of(record: &Value) -> Option<String> {
    record.get("error").map(text)
}

fn render_transactions(txns: &[Value], parts: &mut Vec<String>) {
    parts.push("**Recent Transactions:**".to_string());
    for (i, txn) in txns.iter().enumerate() {
        parts.push(format!(
            "{}. Transaction ID: {}\n   Amount: {} {}\n   Status: {}\n   Date: {}\n   Recipient: {}",
            i + 1,
            field(txn, "transaction_id"),
            field(txn, "currency"),
            money(txn, "amount"),
            field(txn, "status"),
            field(txn, "transaction_date"),
            field(txn, "recipient_name"),
        ));
    }
}

fn render_relationship_manager(rm: &Value, parts: &mut Vec<String>) {
    let specialization = match rm.get("specialization") {
        Some(Value::Array(items)) => items.iter().map(text).collect::<Vec<_>>().join(", "),
        Some(other) => text(other),
        None => String::new(),
    };
    parts.push(format!(
        "**Relationship Manager Details:**\nName: {}\nEmail: {}\nPhone: {}\nBranch: {}\nSpecialization: {}\nExperience: {} years",
        field(rm, "name"),
        field(rm, "email"),
        field(rm, "phone"),
        field(rm, "branch"),
        specialization,
        field_or(rm, "experience_years", "0"),
    ));
}

fn render_dispute(dispute: &Value, parts: &mut Vec<String>) {
    if let Some(error) = error_of(dispute) {
        parts.push(format!("**Dispute Error:** {}", error));
        return;
    }
    let manager = dispute.get("assigned_manager").cloned().unwrap_or(Value::Null);
    parts.push(format!(
        "**Dispute Raised Successfully:**\nDispute ID: {}\nTransaction ID: {}\nStatus: {}\nAssigned Manager: {}\nManager Contact: {}",
        field(dispute, "dispute_id"),
        field(dispute, "transaction_id"),
        field(dispute, "status"),
        field_or(&manager, "name", "N/A"),
        field_or(&manager, "email", "N/A"),
    ));
}

fn render_verification(verification: &Value, parts: &mut Vec<String>) {
    if let Some(error) = error_of(verification) {
        parts.push(format!("**Verification Error:** {}", error));
        return;
    }
    let credited = verification
        .get("is_credited")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    parts.push(format!(
        "**Transaction Verification:**\nTransaction ID: {}\nIs Credited: {}\nStatus: {}\nNotes: {}",
        field(verification, "transaction_id"),
        if credited { "Yes" } else { "No" },
        field(verification, "verification_status"),
        field(verification, "notes"),
    ));
    if verification.get("credited_amount").is_some_and(|v| !v.is_null()) {
        parts.push(format!(
            "Credited Amount: {} {}",
            field_or(verification, "currency", "USD"),
            money(verification, "credited_amount"),
        ));
    }
    if let Some(date) = verification.get("credited_date").filter(|v| !v.is_null()) {
        parts.push(format!("Credited Date: {}", text(date)));
    }
}

fn render_nostro_credit(credit: &Value, parts: &mut Vec<String>) {
    if let Some(error) = error_of(credit) {
        parts.push(format!("**Euro Nostro Error:** {}", error));
        return;
    }
    parts.push("**Euro Nostro Account Credit Status:**".to_string());
    parts.push(format!("Status: {}", field_or(credit, "status", "unknown")));
    parts.push(format!("Message: {}", field(credit, "message")));

    if let Some(acc) = credit.get("nostro_account").filter(|v| v.is_object()) {
        let currency = field_or(acc, "currency", "EUR");
        parts.push(format!(
            "**Account Details:**\nAccount ID: {}\nCurrency: {}\nCorrespondent Bank: {}\nSWIFT: {}\nCurrent Balance: {} {}\nAvailable Balance: {} {}",
            field(acc, "account_id"),
            field(acc, "currency"),
            field(acc, "correspondent_bank"),
            field(acc, "correspondent_swift"),
            currency,
            money(acc, "current_balance"),
            currency,
            money(acc, "available_balance"),
        ));
    }

    if let Some(settlements) = credit
        .get("settlements")
        .and_then(Value::as_array)
        .filter(|s| !s.is_empty())
    {
        parts.push("**Export Settlements:**".to_string());
        for (i, s) in settlements.iter().enumerate() {
            let credited = s.get("is_credited").and_then(Value::as_bool) == Some(true);
            parts.push(format!(
                "{}. {} Settlement ID: {}\n   Export Reference: {}\n   Amount: {} {}\n   Counterparty: {}\n   Status: {}\n   Settlement Date: {}",
                i + 1,
                if credited { "[credited]" } else { "[pending]" },
                field(s, "settlement_id"),
                field(s, "export_reference"),
                field_or(s, "currency", "EUR"),
                money(s, "amount"),
                field(s, "counterparty"),
                field(s, "status"),
                field(s, "settlement_date"),
            ));
            if let Some(date) = s.get("actual_credit_date").filter(|v| !v.is_null()) {
                parts.push(format!("   Credited Date: {}", text(date)));
            }
        }
    }

    if let Some(summary) = credit.get("summary").filter(|v| v.is_object()) {
        parts.push(format!(
            "**Summary:**\nTotal Settlements: {}\nCredited: {} (EUR {})\nPending: {} (EUR {})",
            field_or(summary, "total_settlements", "0"),
            field_or(summary, "credited_count", "0"),
            money(summary, "total_credited_amount"),
            field_or(summary, "pending_count", "0"),
            money(summary, "total_pending_amount"),
        ));
    }
}

fn render_nostro_accounts(accounts: &Value, parts: &mut Vec<String>) {
    if let Some(error) = error_of(accounts) {
        parts.push(format!("**Nostro Accounts Error:** {}", error));
        return;
    }
    parts.push(format!(
        "**Nostro Accounts ({} filter):**",
        field_or(accounts, "currency_filter", "all")
    ));
    parts.push(format!(
        "Total Count: {}",
        field_or(accounts, "total_count", "0")
    ));
    let list = accounts
        .get("accounts")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for (i, acc) in list.iter().enumerate() {
        parts.push(format!(
            "{}. Account ID: {}\n   Currency: {}\n   Type: {}\n   Correspondent: {}\n   SWIFT: {}\n   Balance: {} {}\n   Status: {}",
            i + 1,
            field(acc, "account_id"),
            field(acc, "currency"),
            field(acc, "account_type"),
            field(acc, "correspondent_bank"),
            field(acc, "correspondent_swift"),
            field(acc, "currency"),
            money(acc, "balance"),
            field(acc, "account_status"),
        ));
    }
}
