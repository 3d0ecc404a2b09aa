use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, warn};

use switchyard_core::config::RetryConfig;
use switchyard_core::error::Result;
use switchyard_core::types::WorkflowState;

use crate::graph::Step;

/// Decides whether an attempt's result counts as a failure.
///
/// Any string value containing one of the markers is a failure. Matching is
/// case-sensitive and substring-based, so `"No"` also matches `"None"` and
/// `"November"`.
#[derive(Debug, Clone)]
pub struct FailureClassifier {
    markers: Vec<String>,
}

impl FailureClassifier {
    pub fn new(markers: Vec<String>) -> Self {
        Self { markers }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.failure_markers.clone())
    }

    /// Whether a single text value carries a failure marker.
    pub fn is_failure_text(&self, text: &str) -> bool {
        self.markers
            .iter()
            .any(|m| !m.is_empty() && text.contains(m.as_str()))
    }

    /// Whether any string-valued field of a result is a failure.
    /// Non-string values are ignored.
    pub fn is_failure<'a, I>(&self, result: I) -> bool
    where
        I: IntoIterator<Item = (&'a str, &'a serde_json::Value)>,
    {
        result
            .into_iter()
            .any(|(_, v)| v.as_str().is_some_and(|s| self.is_failure_text(s)))
    }
}

impl Default for FailureClassifier {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Wraps a step and re-runs it until its result is classified as a success.
///
/// Every attempt starts from the state as it was before the first attempt.
/// The attempt's result is the set of fields it added or changed, so a step
/// that writes back failure text identical to what the state already held
/// counts as a success. After `max_attempts` failures the last attempt's
/// state is kept unchanged.
pub struct RetryStep {
    label: String,
    inner: Arc<dyn Step>,
    max_attempts: u32,
    classifier: FailureClassifier,
}

impl RetryStep {
    pub fn new(
        label: impl Into<String>,
        inner: Arc<dyn Step>,
        max_attempts: u32,
        classifier: FailureClassifier,
    ) -> Self {
        Self {
            label: label.into(),
            inner,
            max_attempts: max_attempts.max(1),
            classifier,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Step for RetryStep {
    fn run<'a>(&'a self, state: &'a mut WorkflowState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut last: Option<WorkflowState> = None;

            for attempt in 1..=self.max_attempts {
                let mut candidate = state.clone();
                self.inner.run(&mut candidate).await?;

                if !self.classifier.is_failure(candidate.changed_since(state)) {
                    debug!(step = %self.label, attempt, "Attempt succeeded");
                    *state = candidate;
                    return Ok(());
                }

                warn!(
                    step = %self.label,
                    attempt,
                    max_attempts = self.max_attempts,
                    "Attempt result classified as failure"
                );
                last = Some(candidate);
            }

            if let Some(candidate) = last {
                *state = candidate;
            }
            Ok(())
        })
    }
}
