//! Query enhancer: rewrites terse or ambiguous questions into explicit
//! ones before retrieval and generation.
//!
//! Enhancement is best-effort. A provider outage or an unusable rewrite
//! passes the original text through unchanged; the pipeline never fails
//! at this stage.

use std::sync::Arc;
use tracing::{debug, instrument, warn};

use spl_adapters::CompletionProvider;
use spl_core::{EnhancedQuery, Query};

const ENHANCE_TEMPERATURE: f32 = 0.2;
const ENHANCE_MAX_TOKENS: u32 = 256;

/// A rewrite longer than this multiple of the input is treated as the
/// model rambling and discarded.
const MAX_GROWTH_FACTOR: usize = 6;

pub struct QueryEnhancer {
    provider: Arc<dyn CompletionProvider>,
}

impl QueryEnhancer {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Rewrite the query into a more explicit form. Organization names
    /// and concrete values from the input must survive the rewrite, so
    /// the prompt forbids dropping them and the result is checked.
    #[instrument(skip(self, query), fields(query_id = %query.id))]
    pub async fn enhance(&self, query: &Query) -> EnhancedQuery {
        let original = query.text.trim();
        let prompt = build_prompt(original);

        let response = match self
            .provider
            .complete(&prompt, ENHANCE_TEMPERATURE, ENHANCE_MAX_TOKENS)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Enhancement service unavailable, passing query through");
                return EnhancedQuery::unchanged(original);
            }
        };

        match sanitize_rewrite(original, &response) {
            Some(rewritten) => {
                debug!(rewritten = %rewritten, "Query enhanced");
                let mut result = EnhancedQuery::rewritten(original, rewritten);
                for tag in context_tags(&result.original, &result.rewritten) {
                    result = result.with_context(tag);
                }
                result
            }
            None => {
                debug!("Rewrite rejected, keeping original query");
                EnhancedQuery::unchanged(original)
            }
        }
    }
}

const TIME_TERMS: &[&str] = &["hour", "day", "week", "month", "minute", "yesterday", "today"];
const SECURITY_TERMS: &[&str] = &["failed", "authentication", "login", "logon", "unauthorized", "security"];

/// Tags for context the rewrite introduced, derived by comparing the
/// two texts structurally.
fn context_tags(original: &str, rewritten: &str) -> Vec<&'static str> {
    let orig = original.to_lowercase();
    let new = rewritten.to_lowercase();
    let added = |terms: &[&str]| {
        terms
            .iter()
            .any(|t| new.contains(t) && !orig.contains(t))
    };

    let mut tags = Vec::new();
    if added(TIME_TERMS) {
        tags.push("time_window");
    }
    if added(SECURITY_TERMS) {
        tags.push("security_terms");
    }
    tags
}

fn build_prompt(original: &str) -> String {
    format!(
        "Rewrite the following question about Splunk log data so it is explicit \
         and self-contained. Keep every company name, field value, and number \
         exactly as written. Expand vague time references into concrete ranges. \
         Do not answer the question and do not write SPL. \
         Reply with the rewritten question only, on a single line.\n\
         Question: {}",
        original
    )
}

/// Validate and normalize the model's rewrite. Returns `None` when the
/// rewrite is unusable and the original should stand.
fn sanitize_rewrite(original: &str, response: &str) -> Option<String> {
    let mut line = response.lines().find(|l| !l.trim().is_empty())?.trim();
    line = line
        .trim_start_matches("Rewritten question:")
        .trim_start_matches("Rewritten:")
        .trim();
    let line = line.trim_matches('"').trim();

    if line.is_empty() || line == original {
        return None;
    }
    // SPL leaking into the rewrite means the model ignored instructions.
    if line.contains("index=") || line.contains("| ") {
        return None;
    }
    if line.len() > original.len().max(40) * MAX_GROWTH_FACTOR {
        return None;
    }
    // A rewrite that loses capitalized tokens from the input has dropped
    // names the generator needs.
    let lowered = line.to_lowercase();
    for word in original.split_whitespace() {
        let word = word.trim_matches(|c: char| !c.is_alphanumeric());
        if word.len() > 2 && word.chars().next().is_some_and(|c| c.is_uppercase()) {
            if !lowered.contains(&word.to_lowercase()) {
                return None;
            }
        }
    }

    Some(line.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spl_adapters::MockCompletionProvider;

    fn enhancer(provider: MockCompletionProvider) -> QueryEnhancer {
        QueryEnhancer::new(Arc::new(provider))
    }

    #[tokio::test]
    async fn test_rewrite_is_applied() {
        let e = enhancer(MockCompletionProvider::new().with_rule(
            "Rewrite",
            "Show all failed login events for TechCorp in the last 24 hours",
        ));

        let result = e.enhance(&Query::new("TechCorp failed logins recently")).await;
        assert!(result.was_rewritten());
        assert_eq!(
            result.rewritten,
            "Show all failed login events for TechCorp in the last 24 hours"
        );
        assert_eq!(result.original, "TechCorp failed logins recently");
        // The rewrite introduced an explicit time window.
        assert!(result.added_context.iter().any(|t| t == "time_window"));
    }

    #[tokio::test]
    async fn test_outage_passes_original_through() {
        let e = enhancer(MockCompletionProvider::failing());
        let result = e.enhance(&Query::new("show failed logins")).await;
        assert!(!result.was_rewritten());
        assert_eq!(result.rewritten, "show failed logins");
    }

    #[tokio::test]
    async fn test_rewrite_dropping_company_name_is_rejected() {
        let e = enhancer(
            MockCompletionProvider::new()
                .with_rule("Rewrite", "Show all failed login events in the last day"),
        );

        let result = e.enhance(&Query::new("SafeBank failed logins")).await;
        assert!(!result.was_rewritten());
        assert_eq!(result.rewritten, "SafeBank failed logins");
    }

    #[tokio::test]
    async fn test_spl_in_rewrite_is_rejected() {
        let e = enhancer(
            MockCompletionProvider::new()
                .with_rule("Rewrite", "index=main EventCode=4625 | stats count"),
        );

        let result = e.enhance(&Query::new("show failed logins")).await;
        assert!(!result.was_rewritten());
    }

    #[tokio::test]
    async fn test_quoted_and_labeled_rewrite_is_unwrapped() {
        let e = enhancer(MockCompletionProvider::new().with_rule(
            "Rewrite",
            "Rewritten question: \"List authentication failures from the past week\"",
        ));

        let result = e.enhance(&Query::new("auth failures past week")).await;
        assert!(result.was_rewritten());
        assert_eq!(
            result.rewritten,
            "List authentication failures from the past week"
        );
    }
}
