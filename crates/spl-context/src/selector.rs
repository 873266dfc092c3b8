//! Organization-context selector.
//!
//! Picks at most one organization profile per query. An exact name
//! mention is worth twice a vocabulary hit, the strictly highest score
//! wins, and ties fall to catalog order so repeated calls always agree.

use tracing::{debug, instrument};

use spl_core::{CatalogSet, OrganizationProfile};

/// Phrases that explicitly ask for data across every tenant. Any of
/// these forces the wildcard scope even when a profile would otherwise
/// score.
const CROSS_ORG_PHRASES: &[&str] = &[
    "all companies",
    "all organizations",
    "all orgs",
    "every company",
    "every organization",
    "across companies",
    "across organizations",
    "across all",
    "cross-company",
    "cross company",
    "each company",
    "each organization",
    "compare companies",
    "compare organizations",
    "enterprise-wide",
    "enterprise wide",
];

pub struct ContextSelector {
    organizations: Vec<OrganizationProfile>,
}

impl ContextSelector {
    pub fn new(catalog: &CatalogSet) -> Self {
        Self {
            organizations: catalog.organizations.clone(),
        }
    }

    /// Select the profile for a query, or `None` for wildcard scope.
    ///
    /// A hint naming a known profile short-circuits scoring. Cross-org
    /// phrasing returns `None` regardless of mentions.
    #[instrument(skip(self, text))]
    pub fn select(&self, text: &str, hint: Option<&str>) -> Option<&OrganizationProfile> {
        if let Some(hint) = hint {
            if let Some(profile) = self.find(hint) {
                debug!(organization = %profile.name, "Organization taken from client hint");
                return Some(profile);
            }
            debug!(hint, "Client hint names no known organization, scoring instead");
        }

        let lowered = text.to_lowercase();
        if CROSS_ORG_PHRASES.iter().any(|p| lowered.contains(p)) {
            debug!("Cross-organization phrasing detected, using wildcard scope");
            return None;
        }

        let mut best: Option<(&OrganizationProfile, u32)> = None;
        for profile in &self.organizations {
            let score = score_profile(profile, &lowered);
            // Strictly-greater keeps the first registered profile on
            // ties.
            if score > 0 && best.map_or(true, |(_, s)| score > s) {
                best = Some((profile, score));
            }
        }

        match best {
            Some((profile, score)) => {
                debug!(organization = %profile.name, score, "Organization selected");
                Some(profile)
            }
            None => {
                debug!("No organization scored, using wildcard scope");
                None
            }
        }
    }

    fn find(&self, name: &str) -> Option<&OrganizationProfile> {
        let name = name.trim();
        self.organizations
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

/// 2 points for an exact name mention, 1 per matched vocabulary term.
fn score_profile(profile: &OrganizationProfile, lowered_text: &str) -> u32 {
    let mut score = 0;
    if lowered_text.contains(&profile.name.to_lowercase()) {
        score += 2;
    }
    for term in profile.scoring_terms() {
        if lowered_text.contains(&term.to_lowercase()) {
            score += 1;
        }
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use spl_core::CatalogSet;

    fn selector() -> ContextSelector {
        ContextSelector::new(&CatalogSet::builtin())
    }

    #[test]
    fn test_exact_name_mention_wins() {
        let s = selector();
        let profile = s
            .select("For TechCorp, show all failed logins in the last 24 hours", None)
            .unwrap();
        assert_eq!(profile.name, "TechCorp");
    }

    #[test]
    fn test_keyword_only_match_selects_profile() {
        let s = selector();
        let profile = s.select("show suspicious banking transactions", None).unwrap();
        assert_eq!(profile.name, "SafeBank");
    }

    #[test]
    fn test_name_mention_outscores_foreign_keywords() {
        // One name mention (2) must beat a single keyword hit (1) on
        // another profile.
        let s = selector();
        let profile = s
            .select("HealthPlus events mentioning banking users", None)
            .unwrap();
        assert_eq!(profile.name, "HealthPlus");
    }

    #[test]
    fn test_no_match_returns_none() {
        let s = selector();
        assert!(s.select("show failed logins in the last hour", None).is_none());
    }

    #[test]
    fn test_cross_org_phrasing_forces_wildcard() {
        let s = selector();
        assert!(s
            .select("compare failed logins across all companies", None)
            .is_none());
        // Even with an explicit name in the text.
        assert!(s
            .select("failed logins for TechCorp and every organization", None)
            .is_none());
    }

    #[test]
    fn test_hint_short_circuits_scoring() {
        let s = selector();
        let profile = s
            .select("show failed logins for TechCorp", Some("SafeBank"))
            .unwrap();
        assert_eq!(profile.name, "SafeBank");
    }

    #[test]
    fn test_unknown_hint_falls_back_to_scoring() {
        let s = selector();
        let profile = s
            .select("show failed logins for TechCorp", Some("NoSuchOrg"))
            .unwrap();
        assert_eq!(profile.name, "TechCorp");
    }

    #[test]
    fn test_selection_is_deterministic() {
        let s = selector();
        let text = "airline flight operations logins";
        let first = s.select(text, None).map(|p| p.name.clone());
        for _ in 0..5 {
            assert_eq!(s.select(text, None).map(|p| p.name.clone()), first);
        }
    }
}
