use tracing::debug;

use switchyard_core::config::{ClassifierConfig, KeywordRule};
use switchyard_core::types::{ActionSet, ActionTag};

/// Deterministic keyword classifier.
///
/// Lowercases the request and tests each rule's keywords as plain
/// substrings. No tokenisation, so `"rm"` also matches inside `"confirm"`.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<KeywordRule>,
}

impl Classifier {
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|rule| KeywordRule {
                tag: rule.tag,
                keywords: rule.keywords.iter().map(|k| k.to_lowercase()).collect(),
            })
            .collect();
        Self { rules }
    }

    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::new(config.rules.clone())
    }

    /// Classify a request into its action set.
    pub fn classify(&self, request: &str) -> ActionSet {
        let mut actions = ActionSet::new();
        if request.trim().is_empty() {
            return actions;
        }

        let text = request.to_lowercase();
        for rule in &self.rules {
            if rule.keywords.iter().any(|k| !k.is_empty() && text.contains(k.as_str())) {
                actions.insert(rule.tag);
            }
        }

        // A dispute always needs a relationship manager to assign it to.
        if actions.contains(&ActionTag::RaiseDispute) {
            actions.insert(ActionTag::GetRm);
        }

        debug!(
            actions = ?actions.iter().map(|a| a.as_str()).collect::<Vec<_>>(),
            "Request classified"
        );
        actions
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_config(&ClassifierConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(actions: &ActionSet) -> Vec<&'static str> {
        actions.iter().map(|a| a.as_str()).collect()
    }

    #[test]
    fn test_empty_and_whitespace_yield_nothing() {
        let c = Classifier::default();
        assert!(c.classify("").is_empty());
        assert!(c.classify("   \t\n").is_empty());
    }

    #[test]
    fn test_no_keyword_yields_nothing() {
        let c = Classifier::default();
        assert!(c.classify("hello there").is_empty());
    }

    #[test]
    fn test_case_insensitive() {
        let c = Classifier::default();
        let actions = c.classify("Show me recent TRANSACTIONS");
        assert_eq!(tags(&actions), vec!["get_transactions"]);
    }

    #[test]
    fn test_dispute_implies_rm() {
        let c = Classifier::default();
        let actions = c.classify("please open a dispute");
        assert!(actions.contains(&ActionTag::RaiseDispute));
        assert!(actions.contains(&ActionTag::GetRm));
    }

    #[test]
    fn test_dispute_scenario() {
        let c = Classifier::default();
        let actions = c.classify("raise dispute on a failed transaction");
        assert_eq!(
            tags(&actions),
            vec!["get_transactions", "raise_dispute", "get_rm"]
        );
    }

    #[test]
    fn test_nostro_accounts_also_hits_nostro_check() {
        let c = Classifier::default();
        let actions = c.classify("list nostro accounts in EUR");
        assert!(actions.contains(&ActionTag::CheckNostro));
        assert!(actions.contains(&ActionTag::GetNostroAccounts));
    }

    #[test]
    fn test_weather_tags() {
        let c = Classifier::default();
        let actions = c.classify("What's the weather tomorrow? Book the playground");
        assert!(actions.contains(&ActionTag::Weather));
        assert!(actions.contains(&ActionTag::Booking));
        assert!(!actions.contains(&ActionTag::Activity));
    }

    #[test]
    fn test_custom_keywords_are_lowercased() {
        let c = Classifier::new(vec![KeywordRule {
            tag: ActionTag::Weather,
            keywords: vec!["Umbrella".into()],
        }]);
        assert!(c.classify("do I need an UMBRELLA").contains(&ActionTag::Weather));
    }
}
