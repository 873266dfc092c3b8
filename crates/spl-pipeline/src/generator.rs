//! Query generator: composes the generation prompt and turns the
//! model's reply into a structured query.
//!
//! Parsing is all-or-nothing. A reply the cleanup pass cannot reduce to
//! a scoped query fails with a generation error; no partially populated
//! result ever leaves this module.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use spl_adapters::CompletionProvider;
use spl_core::{
    AppError, AppResult, CatalogSet, EnhancedQuery, GeneratedQuery, OrganizationProfile,
    RetrievalResult,
};
use spl_nlp::FieldPlan;

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 1024,
        }
    }
}

lazy_static! {
    static ref INDEX_RE: Regex = Regex::new(r"index=([^\s)]+)").unwrap();
    static ref SOURCETYPE_RE: Regex = Regex::new(r"sourcetype=([^\s)]+)").unwrap();
    static ref PIPE_SPACING_RE: Regex = Regex::new(r"\s*\|\s*").unwrap();
    static ref LIMIT_RE: Regex = Regex::new(r"\|\s*limit\s+(\d+)").unwrap();
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
}

pub struct QueryGenerator {
    provider: Arc<dyn CompletionProvider>,
    catalog: Arc<CatalogSet>,
    config: GeneratorConfig,
}

impl QueryGenerator {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        catalog: Arc<CatalogSet>,
        config: GeneratorConfig,
    ) -> Self {
        Self {
            provider,
            catalog,
            config,
        }
    }

    /// Generate a structured query. Service failures and unparsable
    /// replies are fatal here, unlike the earlier pipeline stages.
    #[instrument(skip_all)]
    pub async fn generate(
        &self,
        enhanced: &EnhancedQuery,
        profile: Option<&OrganizationProfile>,
        plan: &FieldPlan,
        examples: &RetrievalResult,
    ) -> AppResult<GeneratedQuery> {
        let prompt = self.build_prompt(enhanced, profile, plan, examples);
        let response = self
            .provider
            .complete(&prompt, self.config.temperature, self.config.max_tokens)
            .await
            .map_err(|e| {
                warn!(error = %e, "Generation call failed");
                AppError::generation_failure(format!("generation service call failed: {}", e))
            })?;

        let raw = clean_output(&response).ok_or_else(|| {
            AppError::generation_failure("model reply contained no scoped query")
        })?;

        let index = INDEX_RE
            .captures(&raw)
            .map(|c| c[1].trim_matches('"').to_string())
            .ok_or_else(|| AppError::generation_failure("generated query has no index clause"))?;
        let sourcetype = SOURCETYPE_RE
            .captures(&raw)
            .map(|c| c[1].trim_matches('"').to_string())
            .unwrap_or_else(|| "*".to_string());

        debug!(%index, %sourcetype, "Query generated");
        Ok(GeneratedQuery {
            raw,
            organization: profile.map(|p| p.name.clone()),
            index,
            sourcetype,
        })
    }

    fn build_prompt(
        &self,
        enhanced: &EnhancedQuery,
        profile: Option<&OrganizationProfile>,
        plan: &FieldPlan,
        examples: &RetrievalResult,
    ) -> String {
        let mut prompt = String::from(
            "You are an expert Splunk SPL engineer. Generate exactly one SPL search for \
             the request below. Reply with the SPL only, no explanation and no markdown.\n\n",
        );

        match profile {
            Some(p) => {
                let _ = writeln!(
                    prompt,
                    "Scope: index={} sourcetype={}. Prefer these fields: {}.",
                    p.index,
                    p.sourcetype,
                    p.priority_fields.join(", ")
                );
            }
            None => {
                let _ = writeln!(
                    prompt,
                    "Scope: the request spans all companies. Use index=* with a sourcetype \
                     clause ({}) and extract the company with \
                     | rex field=index \"^(?<company>[a-z]+)_\".",
                    self.wildcard_sourcetype_clause()
                );
            }
        }

        if !plan.chains.is_empty() {
            let _ = writeln!(
                prompt,
                "Normalize entity fields with coalesce ({} platform):",
                plan.platform
            );
            for chain in &plan.chains {
                let _ = writeln!(prompt, "  | {}", chain.eval_clause());
            }
        }

        if !examples.is_empty() {
            prompt.push_str("\nExamples:\n");
            for example in &examples.examples {
                let _ = writeln!(prompt, "Q: {}\nSPL: {}\n", example.question, example.answer);
            }
        }

        let _ = write!(prompt, "Q: {}\nSPL:", enhanced.rewritten);
        prompt
    }

    /// `sourcetype=A OR sourcetype=B ...` over the catalog's distinct
    /// sourcetypes, in catalog order.
    fn wildcard_sourcetype_clause(&self) -> String {
        let mut seen: Vec<&str> = Vec::new();
        for org in &self.catalog.organizations {
            if !seen.contains(&org.sourcetype.as_str()) {
                seen.push(&org.sourcetype);
            }
        }
        seen.iter()
            .map(|s| format!("sourcetype={}", s))
            .collect::<Vec<_>>()
            .join(" OR ")
    }
}

/// Reduce a model reply to the bare query string, or `None` when no
/// query is present. Strips fences, labels, and surrounding prose,
/// joins continuation lines, normalizes pipe spacing, and rewrites the
/// unsupported `| limit N` into `| head N`.
fn clean_output(response: &str) -> Option<String> {
    let mut lines: Vec<&str> = Vec::new();
    let mut in_query = false;
    let mut in_fence = false;
    for line in response.lines() {
        let trimmed = line.trim().trim_start_matches("SPL:").trim();
        if trimmed.starts_with("```") {
            if in_query && in_fence {
                break;
            }
            in_fence = !in_fence;
            continue;
        }
        if !in_query {
            if trimmed.contains("index=") || trimmed.starts_with("search ") {
                in_query = true;
                lines.push(trimmed);
            }
            continue;
        }
        // A long stage may wrap onto the next line without a leading
        // pipe; only blank lines and explanatory prose end the query.
        if trimmed.is_empty() || looks_like_prose(trimmed) {
            break;
        }
        lines.push(trimmed);
    }
    if lines.is_empty() {
        return None;
    }

    let joined = lines.join(" ");
    let piped = PIPE_SPACING_RE.replace_all(&joined, " | ");
    let headed = LIMIT_RE.replace_all(&piped, "| head $1");
    let collapsed = WHITESPACE_RE.replace_all(&headed, " ");
    let result = collapsed.trim().to_string();
    if result.is_empty() {
        None
    } else {
        Some(result)
    }
}

fn looks_like_prose(line: &str) -> bool {
    const MARKERS: &[&str] = &[
        "This ", "The ", "Note:", "Explanation:", "Generated", "**",
    ];
    MARKERS.iter().any(|m| line.starts_with(m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use spl_adapters::MockCompletionProvider;
    use spl_nlp::{FieldNormalizer, Platform};

    fn generator(provider: MockCompletionProvider) -> QueryGenerator {
        QueryGenerator::new(
            Arc::new(provider),
            Arc::new(CatalogSet::builtin()),
            GeneratorConfig::default(),
        )
    }

    fn empty_plan() -> FieldPlan {
        FieldPlan {
            platform: Platform::CrossPlatform,
            chains: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_fenced_reply_is_cleaned_and_parsed() {
        let g = generator(MockCompletionProvider::new().with_default(
            "Here is the query:\n```spl\nindex=techcorp_win sourcetype=WinEventLog EventCode=4625 earliest=-24h\n| stats count by TargetUserName\n```\nThis counts failures.",
        ));

        let catalog = CatalogSet::builtin();
        let profile = catalog.find_organization("TechCorp");
        let result = g
            .generate(
                &EnhancedQuery::unchanged("failed logins last day"),
                profile,
                &empty_plan(),
                &RetrievalResult::default(),
            )
            .await
            .unwrap();

        assert_eq!(result.index, "techcorp_win");
        assert_eq!(result.sourcetype, "WinEventLog");
        assert_eq!(result.organization.as_deref(), Some("TechCorp"));
        assert!(!result.raw.contains("```"));
        assert!(result.raw.contains("| stats count by TargetUserName"));
    }

    #[tokio::test]
    async fn test_wrapped_stage_lines_are_joined() {
        let g = generator(MockCompletionProvider::new().with_default(
            "index=main EventCode=4625 earliest=-24h\n| eval user=coalesce(TargetUserName,\nuser)\n| stats count by user",
        ));
        let result = g
            .generate(
                &EnhancedQuery::unchanged("failed logins per user"),
                None,
                &empty_plan(),
                &RetrievalResult::default(),
            )
            .await
            .unwrap();
        assert_eq!(
            result.raw,
            "index=main EventCode=4625 earliest=-24h | eval user=coalesce(TargetUserName, user) | stats count by user"
        );
    }

    #[tokio::test]
    async fn test_limit_rewritten_to_head() {
        let g = generator(
            MockCompletionProvider::new()
                .with_default("index=main | stats count by user | limit 10"),
        );
        let result = g
            .generate(
                &EnhancedQuery::unchanged("top users"),
                None,
                &empty_plan(),
                &RetrievalResult::default(),
            )
            .await
            .unwrap();
        assert!(result.raw.ends_with("| head 10"));
    }

    #[tokio::test]
    async fn test_reply_without_query_fails_all_or_nothing() {
        let g = generator(
            MockCompletionProvider::new()
                .with_default("I cannot produce a query for this request."),
        );
        let err = g
            .generate(
                &EnhancedQuery::unchanged("failed logins"),
                None,
                &empty_plan(),
                &RetrievalResult::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "generation_failure");
    }

    #[tokio::test]
    async fn test_service_outage_is_fatal_here() {
        let g = generator(MockCompletionProvider::failing());
        let err = g
            .generate(
                &EnhancedQuery::unchanged("failed logins"),
                None,
                &empty_plan(),
                &RetrievalResult::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "generation_failure");
    }

    #[tokio::test]
    async fn test_wildcard_prompt_lists_catalog_sourcetypes() {
        let g = generator(MockCompletionProvider::new().with_default("index=* | stats count"));
        let prompt = g.build_prompt(
            &EnhancedQuery::unchanged("failed logins everywhere"),
            None,
            &empty_plan(),
            &RetrievalResult::default(),
        );
        assert!(prompt.contains("index=*"));
        assert!(prompt.contains("sourcetype=WinEventLog OR sourcetype=linux_secure"));
        assert!(prompt.contains("rex field=index"));
    }

    #[tokio::test]
    async fn test_prompt_carries_field_chains_and_examples() {
        let g = generator(MockCompletionProvider::new().with_default("index=main"));
        let catalog = CatalogSet::builtin();
        let plan = FieldNormalizer::new(&catalog).map_fields("failed logins on windows", None);
        let examples = RetrievalResult {
            examples: vec![spl_core::RetrievedExample {
                question: "Show failed logins".to_string(),
                answer: "index=main EventCode=4625".to_string(),
                similarity: 0.9,
                rerank_score: 0.8,
                corpus_index: 0,
            }],
        };

        let prompt = g.build_prompt(
            &EnhancedQuery::unchanged("failed logins on windows"),
            catalog.find_organization("TechCorp"),
            &plan,
            &examples,
        );
        assert!(prompt.contains("eval user=coalesce(TargetUserName"));
        assert!(prompt.contains("Q: Show failed logins"));
        assert!(prompt.contains("SPL: index=main EventCode=4625"));
        assert!(prompt.contains("index=techcorp_win"));
    }
}
