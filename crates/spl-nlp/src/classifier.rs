//! Relevance classifier: aggregates the matcher ensemble into a single
//! decision.
//!
//! The confidence of the result is the maximum weight among hit signals,
//! never a sum; stacking several weak signals must not outrank one
//! specific piece of evidence.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use spl_adapters::{CompletionProvider, EmbeddingProvider};
use spl_core::{MatchMethod, MatchSignal, Query, RelevanceResult};

use crate::error::{NlpError, Result};
use crate::matchers::{lexical_matchers, Matcher};
use crate::semantic::SemanticMatcher;

/// Classifier tuning knobs.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Minimum confidence for `is_relevant`.
    pub decision_threshold: f64,
    /// Minimum cosine similarity for the semantic matcher to hit.
    pub similarity_threshold: f32,
    /// Queries longer than this are rejected up front.
    pub max_query_chars: usize,
    /// Minimum self-reported confidence for the LLM-intent verdict to count.
    pub llm_intent_threshold: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            decision_threshold: 0.35,
            similarity_threshold: 0.35,
            max_query_chars: 2000,
            llm_intent_threshold: 0.5,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LlmIntentVerdict {
    is_related: bool,
    #[serde(default)]
    confidence: f64,
}

lazy_static! {
    static ref JSON_BLOCK_RE: Regex = Regex::new(r"(?s)\{.*\}").unwrap();
}

/// Aggregating classifier over the six-matcher ensemble.
pub struct RelevanceClassifier {
    lexical: Vec<Box<dyn Matcher>>,
    semantic: SemanticMatcher,
    llm: Option<Arc<dyn CompletionProvider>>,
    config: ClassifierConfig,
}

impl RelevanceClassifier {
    /// Build the classifier, embedding the intent anchors up front.
    /// `llm` is optional; without it the LLM-intent matcher contributes
    /// no signal.
    pub async fn build(
        embeddings: Arc<dyn EmbeddingProvider>,
        llm: Option<Arc<dyn CompletionProvider>>,
        config: ClassifierConfig,
    ) -> Result<Self> {
        let semantic = SemanticMatcher::build(embeddings, config.similarity_threshold)
            .await
            .map_err(|e| NlpError::internal(format!("failed to embed intent anchors: {}", e)))?;

        Ok(Self {
            lexical: lexical_matchers(),
            semantic,
            llm,
            config,
        })
    }

    fn validate(&self, query: &Query) -> Result<()> {
        if query.text.trim().is_empty() {
            return Err(NlpError::validation("query text must not be empty"));
        }
        if query.text.len() > self.config.max_query_chars {
            return Err(NlpError::validation(format!(
                "query exceeds {} characters",
                self.config.max_query_chars
            )));
        }
        Ok(())
    }

    /// Classify a query. Provider outages degrade the affected matcher
    /// to "no signal"; only input validation can fail this call.
    #[instrument(skip(self, query), fields(query_id = %query.id))]
    pub async fn classify(&self, query: &Query) -> Result<RelevanceResult> {
        self.validate(query)?;
        let text = query.text.trim();

        let mut signals: Vec<MatchSignal> =
            self.lexical.iter().map(|m| m.evaluate(text)).collect();

        // Semantic similarity; unavailable service means no signal, not
        // a failed classification.
        let similarity = match self.semantic.similarity(text).await {
            Ok(sim) => {
                let mut signal = if self.semantic.is_hit(sim) {
                    MatchSignal::hit(MatchMethod::Embedding)
                } else {
                    MatchSignal::miss(MatchMethod::Embedding)
                };
                signal = signal.with_detail(format!("similarity={:.3}", sim));
                signals.push(signal);
                Some(sim)
            }
            Err(e) => {
                warn!(error = %e, "Embedding service unavailable, skipping semantic matcher");
                signals.push(
                    MatchSignal::miss(MatchMethod::Embedding).with_detail("service unavailable"),
                );
                None
            }
        };

        // The LLM matcher is the costliest call: consult it only when no
        // stronger signal has already decided the outcome.
        if !signals.iter().any(|s| s.hit) {
            if let Some(signal) = self.llm_intent_signal(text).await {
                signals.push(signal);
            }
        }

        let best_hit = signals
            .iter()
            .filter(|s| s.hit)
            .max_by(|a, b| a.weight.partial_cmp(&b.weight).unwrap_or(std::cmp::Ordering::Equal));

        let (confidence, winning_method) = match best_hit {
            Some(signal) => (signal.weight.clamp(0.0, 1.0), signal.method),
            // Nothing hit: report the raw embedding similarity so the
            // caller can see how far off-domain the query was.
            None => (
                similarity.unwrap_or(0.0).clamp(0.0, 1.0) as f64,
                MatchMethod::Embedding,
            ),
        };

        let is_relevant = confidence >= self.config.decision_threshold;
        debug!(
            is_relevant,
            confidence,
            method = %winning_method,
            "Relevance classified"
        );

        Ok(RelevanceResult {
            is_relevant,
            confidence,
            winning_method,
            signals,
        })
    }

    async fn llm_intent_signal(&self, text: &str) -> Option<MatchSignal> {
        let provider = self.llm.as_ref()?;
        let prompt = format!(
            "You are an expert Splunk SPL intent classifier. \
             Return only JSON: {{\"is_related\": true/false, \"confidence\": float}}. \
             Classify whether the query is about Splunk data search, analysis, or reporting.\n\
             Query: {}\nClassify intent.",
            text
        );

        match provider.complete(&prompt, 0.0, 128).await {
            Ok(response) => match parse_intent_verdict(&response) {
                Some(verdict) => {
                    let hit =
                        verdict.is_related && verdict.confidence >= self.config.llm_intent_threshold;
                    let signal = if hit {
                        MatchSignal::hit(MatchMethod::LlmIntent)
                    } else {
                        MatchSignal::miss(MatchMethod::LlmIntent)
                    };
                    Some(signal.with_detail(format!("confidence={:.2}", verdict.confidence)))
                }
                None => {
                    warn!("LLM intent response was not parseable JSON");
                    Some(MatchSignal::miss(MatchMethod::LlmIntent).with_detail("unparseable"))
                }
            },
            Err(e) => {
                warn!(error = %e, "LLM intent matcher unavailable");
                Some(MatchSignal::miss(MatchMethod::LlmIntent).with_detail("service unavailable"))
            }
        }
    }
}

fn parse_intent_verdict(response: &str) -> Option<LlmIntentVerdict> {
    let block = JSON_BLOCK_RE.find(response)?.as_str();
    serde_json::from_str(block).ok()
}
