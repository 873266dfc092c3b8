//! Lexical and heuristic matchers.
//!
//! Each matcher is a pure function over the query text producing one
//! [`MatchSignal`] with a fixed confidence weight. The classifier
//! aggregates them with the max-weight rule; no matcher ever sees
//! another matcher's output.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

use spl_core::{MatchMethod, MatchSignal};

/// A signal producer over query text.
pub trait Matcher: Send + Sync {
    fn method(&self) -> MatchMethod;

    /// Evaluate the query and report a hit or miss with this matcher's
    /// fixed weight.
    fn evaluate(&self, query: &str) -> MatchSignal;
}

/// SPL command fragments that only appear in structured queries.
const SYNTAX_KEYWORDS: &[&str] = &[
    "index=", "sourcetype=", "source=", "host=", "earliest=", "latest=",
    "| stats", "| table", "| search", "| where", "| fields", "| rename",
    "| eval", "| timechart", "| transaction", "| bucket", "| top",
    "| rare", "| chart", "| dedup", "| rex", "| spath", "| sort",
    "| head", "| tail", "| join", "| lookup", "| mvexpand",
    "| inputlookup", "| append", "| datamodel", "| metadata",
];

const DOMAIN_KEYWORDS: &[&str] = &[
    "splunk", "spl", "dashboard", "search head", "indexer", "forwarder",
    "knowledge object", "enterprise security", "monitoring console",
    "universal forwarder", "heavy forwarder", "deployment server",
    "search processing language", "search job", "field extraction",
    "lookup table", "eventtype", "props.conf", "transforms.conf",
];

const SECURITY_KEYWORDS: &[&str] = &[
    "login", "logon", "logins", "logons", "authentication", "auth",
    "failed", "failure", "failures", "fails", "security", "alert",
    "alerts", "attack", "intrusion", "breach", "threat", "malware",
    "process", "registry", "firewall", "audit", "account", "accounts",
    "access", "permission", "privilege", "ssh", "rdp", "sudo",
    "password", "credential", "credentials", "lockout", "brute",
    "defender", "endpoint", "eventcode",
];

lazy_static! {
    /// Bare `key=value` filter expressions count as scope syntax.
    static ref KEY_VALUE_RE: Regex =
        Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*=\S").unwrap();

    /// Relative time ranges as used in log analysis. Deliberately
    /// stricter than single words like "today": a bare temporal noun is
    /// not evidence of a log-search intent.
    static ref TIME_PATTERN_RE: Regex = Regex::new(
        r"(?i)\b(last|past|previous|recent)\s+\d*\s*(minutes?|hours?|days?|weeks?|months?)\b|\byesterday\b|\b(per|every)\s+(minute|hour|day|week)\b|\breal[ -]?time\b",
    )
    .unwrap();
}

fn tokens(query: &str) -> HashSet<String> {
    query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '.' && c != '_')
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Hits on SPL syntax fragments or structured `key=value` filters.
pub struct SyntaxMatcher;

impl Matcher for SyntaxMatcher {
    fn method(&self) -> MatchMethod {
        MatchMethod::Syntax
    }

    fn evaluate(&self, query: &str) -> MatchSignal {
        let lower = query.to_lowercase();
        if let Some(keyword) = SYNTAX_KEYWORDS.iter().find(|k| lower.contains(*k)) {
            return MatchSignal::hit(self.method()).with_detail(*keyword);
        }
        if KEY_VALUE_RE.is_match(query) {
            return MatchSignal::hit(self.method()).with_detail("key=value filter");
        }
        MatchSignal::miss(self.method())
    }
}

/// Hits on Splunk product vocabulary.
pub struct DomainMatcher;

impl Matcher for DomainMatcher {
    fn method(&self) -> MatchMethod {
        MatchMethod::Domain
    }

    fn evaluate(&self, query: &str) -> MatchSignal {
        let lower = query.to_lowercase();
        let toks = tokens(query);
        for keyword in DOMAIN_KEYWORDS {
            let hit = if keyword.contains(' ') || keyword.contains('.') {
                lower.contains(keyword)
            } else {
                toks.contains(*keyword)
            };
            if hit {
                return MatchSignal::hit(self.method()).with_detail(*keyword);
            }
        }
        MatchSignal::miss(self.method())
    }
}

/// Hits on security and system-monitoring vocabulary. Token-exact so
/// that e.g. "auth" does not fire inside "author".
pub struct SecurityKeywordMatcher;

impl Matcher for SecurityKeywordMatcher {
    fn method(&self) -> MatchMethod {
        MatchMethod::SecurityKeyword
    }

    fn evaluate(&self, query: &str) -> MatchSignal {
        let toks = tokens(query);
        if let Some(keyword) = SECURITY_KEYWORDS.iter().find(|k| toks.contains(**k)) {
            return MatchSignal::hit(self.method()).with_detail(*keyword);
        }
        MatchSignal::miss(self.method())
    }
}

/// Hits on relative time-range phrasing ("last 24 hours", "past week").
pub struct TimePatternMatcher;

impl Matcher for TimePatternMatcher {
    fn method(&self) -> MatchMethod {
        MatchMethod::TimePattern
    }

    fn evaluate(&self, query: &str) -> MatchSignal {
        if let Some(m) = TIME_PATTERN_RE.find(query) {
            return MatchSignal::hit(self.method()).with_detail(m.as_str());
        }
        MatchSignal::miss(self.method())
    }
}

/// The lexical ensemble in evaluation order, most specific first.
pub fn lexical_matchers() -> Vec<Box<dyn Matcher>> {
    vec![
        Box::new(SyntaxMatcher),
        Box::new(DomainMatcher),
        Box::new(SecurityKeywordMatcher),
        Box::new(TimePatternMatcher),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_matcher_spl_fragment() {
        let signal = SyntaxMatcher.evaluate("index=main | stats count by host");
        assert!(signal.hit);
        assert_eq!(signal.weight, 0.90);
    }

    #[test]
    fn test_syntax_matcher_key_value() {
        let signal = SyntaxMatcher.evaluate("show events where EventCode=4625");
        assert!(signal.hit);
    }

    #[test]
    fn test_syntax_matcher_plain_text_misses() {
        assert!(!SyntaxMatcher.evaluate("show me failed logins").hit);
    }

    #[test]
    fn test_domain_matcher() {
        assert!(DomainMatcher.evaluate("how do I build a splunk dashboard").hit);
        assert!(!DomainMatcher.evaluate("how do I bake bread").hit);
    }

    #[test]
    fn test_security_matcher_token_exact() {
        assert!(SecurityKeywordMatcher.evaluate("show failed logins").hit);
        // "auth" must not fire inside "author".
        assert!(!SecurityKeywordMatcher.evaluate("who is the author of this book").hit);
    }

    #[test]
    fn test_time_pattern_requires_range_phrasing() {
        assert!(TimePatternMatcher.evaluate("errors in the last 24 hours").hit);
        assert!(TimePatternMatcher.evaluate("what happened yesterday").hit);
        assert!(TimePatternMatcher.evaluate("events per hour").hit);
        // A bare temporal noun is not a range.
        assert!(!TimePatternMatcher.evaluate("What is the weather today?").hit);
    }

    #[test]
    fn test_lexical_order_most_specific_first() {
        let methods: Vec<_> = lexical_matchers().iter().map(|m| m.method()).collect();
        assert_eq!(
            methods,
            vec![
                MatchMethod::Syntax,
                MatchMethod::Domain,
                MatchMethod::SecurityKeyword,
                MatchMethod::TimePattern,
            ]
        );
    }
}
