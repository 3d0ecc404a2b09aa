use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SwitchyardError};
use crate::types::ActionTag;

/// Top-level Switchyard configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Step ceiling per run. 0 means node count times the retry bound.
    #[serde(default)]
    pub max_steps: usize,
    /// How many recent transactions the fetch step asks the store for.
    #[serde(default = "default_transactions_limit")]
    pub transactions_limit: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_steps: 0,
            transactions_limit: default_transactions_limit(),
        }
    }
}

fn default_transactions_limit() -> usize { 5 }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Case-sensitive substrings that mark a string result as a failure.
    #[serde(default = "default_failure_markers")]
    pub failure_markers: Vec<String>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            failure_markers: default_failure_markers(),
        }
    }
}

fn default_max_attempts() -> u32 { 3 }
fn default_failure_markers() -> Vec<String> {
    vec!["Unable".to_string(), "No".to_string()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// A request token starting with any of these names the actor.
    #[serde(default = "default_account_prefixes")]
    pub account_prefixes: Vec<String>,
    #[serde(default = "default_actor")]
    pub default_actor: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            account_prefixes: default_account_prefixes(),
            default_actor: default_actor(),
        }
    }
}

fn default_account_prefixes() -> Vec<String> {
    vec!["ACC".to_string(), "account_".to_string()]
}
fn default_actor() -> String { "default_user".to_string() }

/// One row of the keyword table: any keyword present yields the tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub tag: ActionTag,
    pub keywords: Vec<String>,
}

impl KeywordRule {
    fn new(tag: ActionTag, keywords: &[&str]) -> Self {
        Self {
            tag,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_rules")]
    pub rules: Vec<KeywordRule>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self { rules: default_rules() }
    }
}

fn default_rules() -> Vec<KeywordRule> {
    vec![
        KeywordRule::new(
            ActionTag::GetTransactions,
            &["transaction", "payment", "high value", "last 5"],
        ),
        KeywordRule::new(
            ActionTag::RaiseDispute,
            &["dispute", "raise dispute", "failed", "pending"],
        ),
        KeywordRule::new(ActionTag::GetRm, &["relationship manager", "manager", "rm"]),
        KeywordRule::new(
            ActionTag::VerifyTransaction,
            &["verify", "credited", "credit", "check transaction"],
        ),
        KeywordRule::new(
            ActionTag::CheckNostro,
            &["nostro", "euro nostro", "export settlement", "euro account", "euro credit"],
        ),
        KeywordRule::new(
            ActionTag::GetNostroAccounts,
            &["nostro accounts", "correspondent accounts", "nostro list"],
        ),
        KeywordRule::new(ActionTag::Weather, &["weather", "forecast", "rain", "sunny"]),
        KeywordRule::new(ActionTag::Activity, &["activity", "activities", "suggest"]),
        KeywordRule::new(ActionTag::Booking, &["book", "playground"]),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Entry priority, highest first. The first tag present picks the entry node.
    #[serde(default = "default_priority")]
    pub priority: Vec<ActionTag>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self { priority: default_priority() }
    }
}

fn default_priority() -> Vec<ActionTag> {
    vec![
        ActionTag::CheckNostro,
        ActionTag::GetNostroAccounts,
        ActionTag::GetTransactions,
        ActionTag::VerifyTransaction,
        // Must stay above GetRm: "rm" also matches "storm" and "Vermont".
        ActionTag::Weather,
        ActionTag::Activity,
        ActionTag::Booking,
        ActionTag::GetRm,
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_location")]
    pub default_location: String,
    /// Fixed "today" for date resolution. Unset means the current UTC date.
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,
    /// Alert area used when the location carries no two-letter state code.
    #[serde(default = "default_alert_area")]
    pub alert_area: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            default_location: default_location(),
            reference_date: None,
            alert_area: default_alert_area(),
        }
    }
}

impl WeatherConfig {
    pub fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Utc::now().date_naive())
    }
}

fn default_location() -> String { "Sacramento, CA".to_string() }
fn default_alert_area() -> String { "CA".to_string() }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { path: default_storage_path() }
    }
}

fn default_storage_path() -> String { "~/.switchyard/payments.db".to_string() }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

fn default_bind() -> String { "127.0.0.1:18790".to_string() }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Directory for JSONL audit files. Unset means log-only auditing.
    #[serde(default)]
    pub log_dir: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            log_dir: None,
        }
    }
}

fn default_audit_enabled() -> bool { true }

impl AppConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| SwitchyardError::ConfigNotFound(path.display().to_string()))?;

        // Expand ${ENV_VAR} references
        let expanded = expand_env_vars(&content);

        toml::from_str(&expanded).map_err(|e| SwitchyardError::Config(e.to_string()))
    }

    /// Resolve the storage database path (expand ~).
    pub fn storage_path(&self) -> PathBuf {
        expand_home(&self.storage.path)
    }

    /// Resolve the audit log directory (expand ~), if configured.
    pub fn audit_dir(&self) -> Option<PathBuf> {
        self.audit.log_dir.as_deref().map(expand_home)
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Expand `${ENV_VAR}` patterns in a string.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut var_name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_name.push(c);
            }
            match std::env::var(&var_name) {
                Ok(val) => result.push_str(&val),
                // Keep original if env var not set
                Err(_) => result.push_str(&format!("${{{}}}", var_name)),
            }
        } else {
            result.push(c);
        }
    }
    result
}

pub fn dirs_home() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}
