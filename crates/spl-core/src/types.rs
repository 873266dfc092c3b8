//! Data model shared across pipeline stages.
//!
//! Everything here is immutable once constructed; pipeline stages derive
//! new values rather than mutating earlier ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Newtype wrapper for type safety

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryId(Uuid);

impl QueryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for QueryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for QueryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One incoming free-text question. Created once per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub id: QueryId,
    pub text: String,
    pub received_at: DateTime<Utc>,
    /// Client-supplied organization hint, if any.
    pub organization_hint: Option<String>,
    pub verbose: bool,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: QueryId::new(),
            text: text.into(),
            received_at: Utc::now(),
            organization_hint: None,
            verbose: false,
        }
    }

    pub fn with_organization_hint(mut self, hint: impl Into<String>) -> Self {
        self.organization_hint = Some(hint.into());
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// The relevance detection methods, ordered from most to least specific
/// evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    Syntax,
    Domain,
    SecurityKeyword,
    TimePattern,
    Embedding,
    LlmIntent,
}

impl MatchMethod {
    /// Fixed confidence weight from the priority table. More specific
    /// evidence carries more weight; the classifier takes the maximum
    /// among hits, never the sum.
    pub fn weight(&self) -> f64 {
        match self {
            Self::Syntax => 0.90,
            Self::Domain => 0.80,
            Self::SecurityKeyword => 0.70,
            Self::TimePattern => 0.60,
            Self::Embedding => 0.50,
            Self::LlmIntent => 0.40,
        }
    }
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Syntax => write!(f, "syntax"),
            Self::Domain => write!(f, "domain"),
            Self::SecurityKeyword => write!(f, "security_keyword"),
            Self::TimePattern => write!(f, "time_pattern"),
            Self::Embedding => write!(f, "embedding"),
            Self::LlmIntent => write!(f, "llm_intent"),
        }
    }
}

/// Outcome of one matcher for one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSignal {
    pub method: MatchMethod,
    pub hit: bool,
    pub weight: f64,
    /// Optional human-readable evidence (matched keyword, similarity, ...).
    pub detail: Option<String>,
}

impl MatchSignal {
    pub fn hit(method: MatchMethod) -> Self {
        Self {
            method,
            hit: true,
            weight: method.weight(),
            detail: None,
        }
    }

    pub fn miss(method: MatchMethod) -> Self {
        Self {
            method,
            hit: false,
            weight: method.weight(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Aggregated relevance decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelevanceResult {
    pub is_relevant: bool,
    /// Maximum weight among hit signals, in [0, 1].
    pub confidence: f64,
    pub winning_method: MatchMethod,
    /// All signals in evaluation order, hits and misses alike.
    pub signals: Vec<MatchSignal>,
}

/// Result of the query-enhancement stage. `rewritten == original` is a
/// valid outcome (no enhancement needed or service degraded).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancedQuery {
    pub original: String,
    pub rewritten: String,
    /// Context the rewrite introduced, e.g. "time_window".
    pub added_context: Vec<String>,
}

impl EnhancedQuery {
    /// Passthrough result when the enhancer is skipped or degraded.
    pub fn unchanged(original: impl Into<String>) -> Self {
        let original = original.into();
        Self {
            rewritten: original.clone(),
            original,
            added_context: Vec::new(),
        }
    }

    pub fn rewritten(original: impl Into<String>, rewritten: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            rewritten: rewritten.into(),
            added_context: Vec::new(),
        }
    }

    pub fn with_context(mut self, note: impl Into<String>) -> Self {
        self.added_context.push(note.into());
        self
    }

    pub fn was_rewritten(&self) -> bool {
        self.original != self.rewritten
    }
}

/// One retrieved exemplar with both retrieval-stage scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedExample {
    pub question: String,
    pub answer: String,
    /// Cosine similarity from the first retrieval stage.
    pub similarity: f32,
    /// Pairwise relevance score from the reranking stage.
    pub rerank_score: f32,
    /// Position in the corpus, used for deterministic tie-breaking.
    pub corpus_index: usize,
}

/// Ordered exemplar list; length K in [2, 6].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub examples: Vec<RetrievedExample>,
}

impl RetrievalResult {
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }
}

/// A candidate structured query produced by the generator. All-or-nothing:
/// never constructed from a partially parsed response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedQuery {
    pub raw: String,
    /// Organization the query is scoped to, or `None` for wildcard scope.
    pub organization: Option<String>,
    pub index: String,
    pub sourcetype: String,
}

/// Structural validation verdict; defects are data, not errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            issues: Vec::new(),
            suggestions: Vec::new(),
        }
    }
}

/// The single result surface the pipeline exposes to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Translation {
    pub query_id: QueryId,
    pub relevant: bool,
    pub confidence: f64,
    pub method: MatchMethod,
    pub enhancement: Option<EnhancedQuery>,
    pub organization: Option<String>,
    pub generated: Option<GeneratedQuery>,
    pub validation: Option<ValidationResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_id_uniqueness() {
        let id1 = QueryId::new();
        let id2 = QueryId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_method_weights_match_priority_table() {
        assert_eq!(MatchMethod::Syntax.weight(), 0.90);
        assert_eq!(MatchMethod::Domain.weight(), 0.80);
        assert_eq!(MatchMethod::SecurityKeyword.weight(), 0.70);
        assert_eq!(MatchMethod::TimePattern.weight(), 0.60);
        assert_eq!(MatchMethod::Embedding.weight(), 0.50);
        assert_eq!(MatchMethod::LlmIntent.weight(), 0.40);
    }

    #[test]
    fn test_method_display_names() {
        assert_eq!(MatchMethod::SecurityKeyword.to_string(), "security_keyword");
        assert_eq!(MatchMethod::TimePattern.to_string(), "time_pattern");
        assert_eq!(MatchMethod::LlmIntent.to_string(), "llm_intent");
    }

    #[test]
    fn test_enhanced_query_unchanged() {
        let e = EnhancedQuery::unchanged("show logins");
        assert!(!e.was_rewritten());
        assert!(e.added_context.is_empty());
    }

    #[test]
    fn test_signal_constructors() {
        let s = MatchSignal::hit(MatchMethod::Domain).with_detail("splunk");
        assert!(s.hit);
        assert_eq!(s.weight, 0.80);
        assert_eq!(s.detail.as_deref(), Some("splunk"));

        let m = MatchSignal::miss(MatchMethod::Embedding);
        assert!(!m.hit);
    }
}
