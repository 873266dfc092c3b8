//! Static catalogs: organization profiles, field mappings, and the
//! training-example corpus.
//!
//! Catalogs are loaded exactly once at startup (from JSON files or the
//! built-in defaults), validated, and then shared read-only across all
//! pipeline executions. No locking is needed because nothing mutates
//! them after initialization.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::{AppError, AppResult};

/// One tenant/domain profile with its scope defaults and vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationProfile {
    pub name: String,
    pub product: String,
    /// Industry/domain tags matched against query text.
    #[serde(default)]
    pub industry: Vec<String>,
    /// Additional vocabulary that suggests this organization.
    #[serde(default)]
    pub keywords: Vec<String>,
    pub index: String,
    pub sourcetype: String,
    /// Fields to prefer when aggregating for this tenant.
    #[serde(default)]
    pub priority_fields: Vec<String>,
}

impl OrganizationProfile {
    /// All terms that count toward the keyword portion of the selector
    /// score (industry tags plus explicit keywords).
    pub fn scoring_terms(&self) -> impl Iterator<Item = &str> {
        self.industry
            .iter()
            .map(String::as_str)
            .chain(self.keywords.iter().map(String::as_str))
    }
}

/// Ordered candidate field names for one semantic role, per platform.
/// Candidates are consumed as a coalesce chain: try the first, fall back
/// to the next. The final candidate is always the role name itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMapping {
    pub role: String,
    #[serde(default)]
    pub windows: Vec<String>,
    #[serde(default)]
    pub linux: Vec<String>,
    pub cross_platform: Vec<String>,
}

impl FieldMapping {
    fn validate(&self) -> AppResult<()> {
        for (platform, candidates) in [
            ("windows", &self.windows),
            ("linux", &self.linux),
            ("cross_platform", &self.cross_platform),
        ] {
            if platform == "cross_platform" && candidates.is_empty() {
                return Err(AppError::catalog(format!(
                    "field mapping '{}': cross_platform candidates must not be empty",
                    self.role
                )));
            }
            if let Some(last) = candidates.last() {
                if last != &self.role {
                    return Err(AppError::catalog(format!(
                        "field mapping '{}': {} candidate list must end with the role name, found '{}'",
                        self.role, platform, last
                    )));
                }
            }
        }
        Ok(())
    }
}

/// One prior question→answer exemplar from the fixed corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingExample {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub organization: Option<String>,
}

/// All read-only catalogs, loaded once behind an explicit init step and
/// passed by reference into each pipeline execution.
#[derive(Debug, Clone)]
pub struct CatalogSet {
    pub organizations: Vec<OrganizationProfile>,
    pub fields: Vec<FieldMapping>,
    pub corpus: Vec<TrainingExample>,
}

impl CatalogSet {
    /// Load catalogs from `organizations.json`, `field_mappings.json`,
    /// and `examples.json` under `dir`.
    pub fn load(dir: impl AsRef<Path>) -> AppResult<Self> {
        let dir = dir.as_ref();
        let organizations = read_json(&dir.join("organizations.json"))?;
        let fields = read_json(&dir.join("field_mappings.json"))?;
        let corpus = read_json(&dir.join("examples.json"))?;

        let set = Self {
            organizations,
            fields,
            corpus,
        };
        set.validate()?;
        info!(
            organizations = set.organizations.len(),
            field_roles = set.fields.len(),
            examples = set.corpus.len(),
            "Loaded catalogs"
        );
        Ok(set)
    }

    /// Built-in demo catalogs so the pipeline is usable (and testable)
    /// without any data files on disk.
    pub fn builtin() -> Self {
        let set = Self {
            organizations: builtin_organizations(),
            fields: builtin_field_mappings(),
            corpus: builtin_corpus(),
        };
        debug_assert!(set.validate().is_ok());
        set
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.organizations.is_empty() {
            return Err(AppError::catalog("organization catalog is empty"));
        }
        for mapping in &self.fields {
            mapping.validate()?;
        }
        for example in &self.corpus {
            if example.question.trim().is_empty() || example.answer.trim().is_empty() {
                return Err(AppError::catalog(
                    "training example with empty question or answer",
                ));
            }
        }
        Ok(())
    }

    pub fn find_organization(&self, name: &str) -> Option<&OrganizationProfile> {
        self.organizations
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn find_field(&self, role: &str) -> Option<&FieldMapping> {
        self.fields.iter().find(|f| f.role == role)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> AppResult<T> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| AppError::catalog(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&raw)
        .map_err(|e| AppError::catalog(format!("{}: {}", path.display(), e)))
}

fn org(
    name: &str,
    product: &str,
    industry: &[&str],
    keywords: &[&str],
    index: &str,
    sourcetype: &str,
    priority_fields: &[&str],
) -> OrganizationProfile {
    OrganizationProfile {
        name: name.to_string(),
        product: product.to_string(),
        industry: industry.iter().map(|s| s.to_string()).collect(),
        keywords: keywords.iter().map(|s| s.to_string()).collect(),
        index: index.to_string(),
        sourcetype: sourcetype.to_string(),
        priority_fields: priority_fields.iter().map(|s| s.to_string()).collect(),
    }
}

fn builtin_organizations() -> Vec<OrganizationProfile> {
    vec![
        org(
            "TechCorp",
            "Windows Infrastructure",
            &["technology", "software", "cloud"],
            &["workstation", "endpoint", "developer"],
            "techcorp_win",
            "WinEventLog",
            &["EventCode", "TargetUserName", "Source_Network_Address"],
        ),
        org(
            "SafeBank",
            "Core Banking",
            &["banking", "finance", "payment"],
            &["transaction", "atm", "fraud"],
            "safebank_win",
            "WinEventLog",
            &["EventCode", "TargetUserName", "host"],
        ),
        org(
            "HealthPlus",
            "Patient Records",
            &["healthcare", "hospital", "medical"],
            &["patient", "clinic", "hipaa"],
            "healthplus_linux",
            "linux_secure",
            &["user", "rhost", "process"],
        ),
        org(
            "AirLogix",
            "Flight Operations",
            &["aviation", "airline", "logistics"],
            &["flight", "booking", "cargo"],
            "airlogix_linux",
            "linux_syslog",
            &["user", "src_ip", "host"],
        ),
        org(
            "GreenEnergy",
            "Grid Telemetry",
            &["energy", "utility", "power"],
            &["grid", "scada", "turbine"],
            "greenenergy_win",
            "WinEventLog",
            &["EventCode", "host", "user"],
        ),
    ]
}

fn chain(role: &str, prefix: &[&str]) -> Vec<String> {
    prefix
        .iter()
        .map(|s| s.to_string())
        .chain(std::iter::once(role.to_string()))
        .collect()
}

fn builtin_field_mappings() -> Vec<FieldMapping> {
    vec![
        FieldMapping {
            role: "user".to_string(),
            windows: chain("user", &["TargetUserName", "User_Name", "Account_Name"]),
            linux: chain("user", &["acct", "auid"]),
            cross_platform: chain("user", &["TargetUserName", "User_Name", "account", "dest_user"]),
        },
        FieldMapping {
            role: "source_address".to_string(),
            windows: chain("source_address", &["Source_Network_Address", "IpAddress"]),
            linux: chain("source_address", &["rhost", "src_ip"]),
            cross_platform: chain(
                "source_address",
                &["Source_Network_Address", "src_ip", "src", "rhost"],
            ),
        },
        FieldMapping {
            role: "process".to_string(),
            windows: chain("process", &["New_Process_Name", "Process_Name"]),
            linux: chain("process", &["comm", "exe"]),
            cross_platform: chain("process", &["Process_Name", "process_name", "comm"]),
        },
        FieldMapping {
            role: "host".to_string(),
            windows: chain("host", &["ComputerName", "Workstation_Name"]),
            linux: chain("host", &["hostname"]),
            cross_platform: chain("host", &["ComputerName", "dest_host", "hostname"]),
        },
        FieldMapping {
            role: "destination_port".to_string(),
            windows: chain("destination_port", &["Destination_Port"]),
            linux: chain("destination_port", &["dest_port", "dport"]),
            cross_platform: chain("destination_port", &["Destination_Port", "dest_port", "dport"]),
        },
    ]
}

fn example(question: &str, answer: &str, organization: Option<&str>) -> TrainingExample {
    TrainingExample {
        question: question.to_string(),
        answer: answer.to_string(),
        organization: organization.map(|s| s.to_string()),
    }
}

fn builtin_corpus() -> Vec<TrainingExample> {
    vec![
        example(
            "For TechCorp, show all failed logins in the last 24 hours",
            "index=techcorp_win sourcetype=WinEventLog EventCode=4625 earliest=-24h \
             | eval user=coalesce(TargetUserName, User_Name, account, user) \
             | eval src=coalesce(Source_Network_Address, src_ip, src, source_address) \
             | stats count by user src | sort - count | head 20",
            Some("TechCorp"),
        ),
        example(
            "For SafeBank, list successful logons today grouped by user",
            "index=safebank_win sourcetype=WinEventLog EventCode=4624 earliest=@d \
             | eval user=coalesce(TargetUserName, User_Name, user) \
             | stats count by user | sort - count",
            Some("SafeBank"),
        ),
        example(
            "For HealthPlus, show failed SSH authentication attempts in the past week",
            "index=healthplus_linux sourcetype=linux_secure \"Failed password\" earliest=-7d \
             | eval user=coalesce(acct, auid, user) \
             | eval src=coalesce(rhost, src_ip, source_address) \
             | stats count by user src | sort - count | head 20",
            Some("HealthPlus"),
        ),
        example(
            "For TechCorp, which hosts had Windows Defender disabled in the last 7 days?",
            "index=techcorp_win sourcetype=WinEventLog (EventCode=5001 OR EventCode=5025) earliest=-7d \
             | stats latest(_time) as last_event by host | convert ctime(last_event) | sort - last_event",
            Some("TechCorp"),
        ),
        example(
            "Show failed login attempts across all organizations in the last 24 hours",
            "index=* (sourcetype=WinEventLog OR sourcetype=linux_secure OR sourcetype=syslog) earliest=-24h \
             | search EventCode=4625 OR \"Failed password\" \
             | rex field=index \"(?<company>\\w+)_\" \
             | eval user=coalesce(TargetUserName, acct, user) \
             | stats count by company user | sort - count | head 50",
            None,
        ),
        example(
            "For AirLogix, track sudo usage over the past day",
            "index=airlogix_linux sourcetype=linux_syslog \"sudo\" earliest=-24h \
             | eval user=coalesce(acct, user) \
             | stats count by user | sort - count",
            Some("AirLogix"),
        ),
        example(
            "For GreenEnergy, chart logon failures per hour over the last day",
            "index=greenenergy_win sourcetype=WinEventLog EventCode=4625 earliest=-24h \
             | timechart span=1h count",
            Some("GreenEnergy"),
        ),
        example(
            "For SafeBank, find accounts locked out this week",
            "index=safebank_win sourcetype=WinEventLog EventCode=4740 earliest=-7d \
             | eval user=coalesce(TargetUserName, User_Name, user) \
             | stats count by user | sort - count",
            Some("SafeBank"),
        ),
        example(
            "For HealthPlus, list new processes spawned by the www-data account today",
            "index=healthplus_linux sourcetype=linux_secure user=www-data earliest=@d \
             | eval process=coalesce(comm, exe, process) \
             | stats count by process | sort - count | head 20",
            Some("HealthPlus"),
        ),
        example(
            "For TechCorp, show network connections to unusual destination ports",
            "index=techcorp_win sourcetype=WinEventLog EventCode=5156 \
             | eval dport=coalesce(Destination_Port, dest_port, destination_port) \
             | stats count by dport | sort - count | head 25",
            Some("TechCorp"),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalogs_validate() {
        let set = CatalogSet::builtin();
        assert!(set.validate().is_ok());
        assert!(set.organizations.len() >= 5);
        assert!(set.corpus.len() >= 8);
    }

    #[test]
    fn test_candidate_lists_end_with_role_name() {
        let set = CatalogSet::builtin();
        for mapping in &set.fields {
            assert_eq!(mapping.cross_platform.last().unwrap(), &mapping.role);
            if !mapping.windows.is_empty() {
                assert_eq!(mapping.windows.last().unwrap(), &mapping.role);
            }
            if !mapping.linux.is_empty() {
                assert_eq!(mapping.linux.last().unwrap(), &mapping.role);
            }
        }
    }

    #[test]
    fn test_invalid_mapping_rejected() {
        let mapping = FieldMapping {
            role: "user".to_string(),
            windows: Vec::new(),
            linux: Vec::new(),
            cross_platform: vec!["TargetUserName".to_string()],
        };
        assert!(mapping.validate().is_err());
    }

    #[test]
    fn test_find_organization_case_insensitive() {
        let set = CatalogSet::builtin();
        assert!(set.find_organization("techcorp").is_some());
        assert!(set.find_organization("TECHCORP").is_some());
        assert!(set.find_organization("NoSuchOrg").is_none());
    }
}
