//! Field normalizer: maps the semantic roles a query talks about to
//! fallback-ordered lists of concrete field names.
//!
//! Raw logs name the same entity differently per platform and product
//! (`TargetUserName`, `acct`, `dest_user`, ...). The generator folds a
//! role's candidate list into a coalesce chain so the produced query
//! works whichever of the names the events actually carry.

use std::fmt;
use tracing::{debug, instrument};

use spl_core::{CatalogSet, FieldMapping, OrganizationProfile};

/// Platform scope inferred for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
    CrossPlatform,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Windows => write!(f, "windows"),
            Platform::Linux => write!(f, "linux"),
            Platform::CrossPlatform => write!(f, "cross_platform"),
        }
    }
}

/// One role's fallback chain, first candidate preferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleChain {
    pub role: String,
    pub candidates: Vec<String>,
}

impl RoleChain {
    /// `coalesce(A, B, role)` expression over the chain.
    pub fn coalesce_expr(&self) -> String {
        format!("coalesce({})", self.candidates.join(", "))
    }

    /// Full eval clause assigning the role its normalized value.
    pub fn eval_clause(&self) -> String {
        format!("eval {}={}", self.role, self.coalesce_expr())
    }
}

/// The normalizer's output for one query: detected platform plus a
/// chain for every role the query references.
#[derive(Debug, Clone)]
pub struct FieldPlan {
    pub platform: Platform,
    pub chains: Vec<RoleChain>,
}

impl FieldPlan {
    pub fn chain_for(&self, role: &str) -> Option<&RoleChain> {
        self.chains.iter().find(|c| c.role == role)
    }

    /// Every concrete field name the plan mentions, for validation.
    pub fn known_fields(&self) -> Vec<&str> {
        self.chains
            .iter()
            .flat_map(|c| c.candidates.iter().map(String::as_str))
            .collect()
    }
}

/// Role trigger vocabulary: a query mentioning any word on the left
/// implies the roles on the right.
const ROLE_TRIGGERS: &[(&[&str], &[&str])] = &[
    (
        &["login", "logins", "logon", "logons", "authentication", "auth", "signin", "credential", "credentials", "password"],
        &["user", "source_address"],
    ),
    (
        &["user", "users", "username", "usernames", "account", "accounts"],
        &["user"],
    ),
    (
        &["ip", "address", "addresses", "source", "remote", "origin"],
        &["source_address"],
    ),
    (
        &["process", "processes", "executable", "command", "binary", "spawned"],
        &["process", "user"],
    ),
    (
        &["host", "hosts", "server", "servers", "machine", "machines", "workstation", "endpoint", "endpoints"],
        &["host"],
    ),
    (
        &["port", "ports", "connection", "connections", "traffic", "network"],
        &["destination_port", "source_address"],
    ),
];

const WINDOWS_HINTS: &[&str] = &["windows", "wineventlog", "eventcode", "powershell", "active directory", "defender"];
const LINUX_HINTS: &[&str] = &["linux", "unix", "ssh", "sshd", "sudo", "syslog", "auditd", "bash"];

/// Stateless mapper over the field-mapping catalog.
pub struct FieldNormalizer {
    mappings: Vec<FieldMapping>,
}

impl FieldNormalizer {
    pub fn new(catalog: &CatalogSet) -> Self {
        Self {
            mappings: catalog.fields.clone(),
        }
    }

    pub fn from_mappings(mappings: Vec<FieldMapping>) -> Self {
        Self { mappings }
    }

    /// Build the field plan for a query. Roles not triggered by the
    /// text are omitted; unknown triggered roles are skipped, never an
    /// error.
    #[instrument(skip(self, text, profile))]
    pub fn map_fields(&self, text: &str, profile: Option<&OrganizationProfile>) -> FieldPlan {
        let lowered = text.to_lowercase();
        let platform = detect_platform(&lowered, profile);

        let mut roles: Vec<&str> = Vec::new();
        for (triggers, implied) in ROLE_TRIGGERS {
            let triggered = triggers.iter().any(|t| {
                if t.contains(' ') {
                    lowered.contains(t)
                } else {
                    lowered.split(|c: char| !c.is_alphanumeric()).any(|w| w == *t)
                }
            });
            if triggered {
                for role in *implied {
                    if !roles.contains(role) {
                        roles.push(*role);
                    }
                }
            }
        }

        let chains = roles
            .iter()
            .filter_map(|role| {
                self.mappings
                    .iter()
                    .find(|m| m.role == *role)
                    .map(|m| build_chain(m, platform))
            })
            .collect();

        debug!(%platform, roles = ?roles, "Field plan built");
        FieldPlan { platform, chains }
    }
}

fn detect_platform(lowered: &str, profile: Option<&OrganizationProfile>) -> Platform {
    if WINDOWS_HINTS.iter().any(|h| lowered.contains(h)) {
        return Platform::Windows;
    }
    if LINUX_HINTS.iter().any(|h| lowered.contains(h)) {
        return Platform::Linux;
    }
    // The organization's default sourcetype is a weaker hint than the
    // query text itself.
    if let Some(profile) = profile {
        let sourcetype = profile.sourcetype.to_lowercase();
        if sourcetype.contains("win") {
            return Platform::Windows;
        }
        if sourcetype.contains("linux") || sourcetype.contains("syslog") {
            return Platform::Linux;
        }
    }
    Platform::CrossPlatform
}

/// Platform-specific candidates first, then any cross-platform names
/// not already listed. The cross-platform list ends with the role name,
/// so every chain keeps the role itself as the final fallback.
fn build_chain(mapping: &FieldMapping, platform: Platform) -> RoleChain {
    let primary: &[String] = match platform {
        Platform::Windows => &mapping.windows,
        Platform::Linux => &mapping.linux,
        Platform::CrossPlatform => &[],
    };

    let mut candidates: Vec<String> = Vec::new();
    for name in primary.iter().chain(mapping.cross_platform.iter()) {
        if !candidates.contains(name) {
            candidates.push(name.clone());
        }
    }
    // Platform lists also end in the role name; keep it last after the
    // merge.
    if let Some(pos) = candidates.iter().position(|c| *c == mapping.role) {
        let role = candidates.remove(pos);
        candidates.push(role);
    }

    RoleChain {
        role: mapping.role.clone(),
        candidates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spl_core::CatalogSet;

    fn normalizer() -> FieldNormalizer {
        FieldNormalizer::new(&CatalogSet::builtin())
    }

    #[test]
    fn test_login_implies_user_and_source_roles() {
        let plan = normalizer().map_fields("show failed logins from remote hosts", None);
        assert!(plan.chain_for("user").is_some());
        assert!(plan.chain_for("source_address").is_some());
        assert!(plan.chain_for("destination_port").is_none());
    }

    #[test]
    fn test_every_chain_ends_with_the_role_name() {
        let n = normalizer();
        for text in [
            "failed logins on windows servers",
            "ssh logins by user",
            "network connections per process",
        ] {
            let plan = n.map_fields(text, None);
            assert!(!plan.chains.is_empty());
            for chain in &plan.chains {
                assert_eq!(chain.candidates.last().unwrap(), &chain.role);
            }
        }
    }

    #[test]
    fn test_windows_platform_puts_windows_names_first() {
        let plan = normalizer().map_fields("failed logins on windows", None);
        let chain = plan.chain_for("user").unwrap();
        assert_eq!(plan.platform, Platform::Windows);
        assert_eq!(chain.candidates.first().unwrap(), "TargetUserName");
    }

    #[test]
    fn test_linux_hint_in_text_beats_org_sourcetype() {
        let catalog = CatalogSet::builtin();
        let org = catalog.find_organization("TechCorp").unwrap();
        let plan = normalizer().map_fields("sudo usage by account", Some(org));
        assert_eq!(plan.platform, Platform::Linux);
        let chain = plan.chain_for("user").unwrap();
        assert_eq!(chain.candidates.first().unwrap(), "acct");
    }

    #[test]
    fn test_org_sourcetype_used_when_text_is_neutral() {
        let catalog = CatalogSet::builtin();
        let org = catalog.find_organization("HealthPlus").unwrap();
        let plan = normalizer().map_fields("failed logins last week", Some(org));
        assert_eq!(plan.platform, Platform::Linux);
    }

    #[test]
    fn test_no_triggers_yields_empty_plan() {
        let plan = normalizer().map_fields("summarize event volume by day", None);
        assert!(plan.chains.is_empty());
        assert_eq!(plan.platform, Platform::CrossPlatform);
    }

    #[test]
    fn test_eval_clause_shape() {
        let chain = RoleChain {
            role: "user".to_string(),
            candidates: vec!["TargetUserName".into(), "acct".into(), "user".into()],
        };
        assert_eq!(
            chain.eval_clause(),
            "eval user=coalesce(TargetUserName, acct, user)"
        );
    }
}
