//! Rule-based syntax validator for generated queries.
//!
//! Purely structural, no network calls. Every violated rule lands in
//! `issues` so the caller sees the complete defect list; an invalid
//! query is still a result, not an error.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, instrument};

use spl_core::{GeneratedQuery, ValidationResult};

/// Commands allowed to open a piped stage.
const KNOWN_COMMANDS: &[&str] = &[
    "stats", "eventstats", "streamstats", "table", "fields", "sort", "where", "search", "eval",
    "rex", "regex", "rename", "timechart", "chart", "top", "rare", "dedup", "head", "tail", "bin",
    "bucket", "convert", "fillnull", "lookup", "join", "append", "transaction", "spath", "mvexpand",
    "inputlookup", "outputlookup", "collect", "multikv", "datamodel", "metadata", "savedsearch",
    "dbinspect", "mvcombine",
];

/// Boolean operators that may not open or close a stage.
const DANGLING_OPERATORS: &[&str] = &["AND", "OR", "NOT", "XOR"];

lazy_static! {
    static ref TIME_BOUND_RE: Regex = Regex::new(r"\b(earliest|latest)\s*=").unwrap();
}

pub struct SyntaxValidator;

impl SyntaxValidator {
    pub fn new() -> Self {
        Self
    }

    #[instrument(skip_all)]
    pub fn validate(&self, query: &GeneratedQuery) -> ValidationResult {
        let mut issues = Vec::new();
        let mut suggestions = Vec::new();
        let raw = query.raw.trim();

        if raw.is_empty() {
            issues.push("query body is empty".to_string());
            return ValidationResult {
                is_valid: false,
                issues,
                suggestions,
            };
        }

        if !raw.contains("index=") {
            issues.push("missing index scope clause".to_string());
        }
        if raw.starts_with('|') {
            issues.push("query starts with a pipe".to_string());
        }
        if raw.ends_with('|') {
            issues.push("query ends with a dangling pipe".to_string());
        }

        check_balance(raw, &mut issues);
        check_stages(raw, &mut issues);

        if !TIME_BOUND_RE.is_match(raw) {
            suggestions
                .push("add an explicit time window, e.g. earliest=-24h".to_string());
        }
        if raw.contains("| limit") {
            suggestions.push("use head instead of limit".to_string());
        }
        if query.index == "*" && !raw.contains("sourcetype=") {
            suggestions.push(
                "wildcard index searches should narrow by sourcetype".to_string(),
            );
        }

        let is_valid = issues.is_empty();
        debug!(is_valid, issue_count = issues.len(), "Query validated");
        ValidationResult {
            is_valid,
            issues,
            suggestions,
        }
    }
}

impl Default for SyntaxValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn check_balance(raw: &str, issues: &mut Vec<String>) {
    if raw.matches('"').count() % 2 != 0 {
        issues.push("unbalanced double quotes".to_string());
    }

    let mut depth: i32 = 0;
    for c in raw.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    break;
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        issues.push("unbalanced parentheses".to_string());
    }
}

fn check_stages(raw: &str, issues: &mut Vec<String>) {
    for (i, stage) in raw.split('|').enumerate() {
        let stage = stage.trim();
        if stage.is_empty() {
            if i > 0 {
                issues.push(format!("stage {} is empty", i));
            }
            continue;
        }

        let first = stage.split_whitespace().next().unwrap_or_default();
        let last = stage.split_whitespace().last().unwrap_or_default();
        if DANGLING_OPERATORS.contains(&first) {
            issues.push(format!("stage {} starts with dangling operator '{}'", i, first));
        }
        if DANGLING_OPERATORS.contains(&last) {
            issues.push(format!("stage {} ends with dangling operator '{}'", i, last));
        }

        // The first stage is the base search, not a command.
        if i > 0 && !KNOWN_COMMANDS.contains(&first.to_lowercase().as_str()) {
            issues.push(format!("stage {} uses unknown command '{}'", i, first));
        }
    }
}
