//! Command-line argument definitions

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "spl-copilot",
    author = "SPL CoPilot Team",
    version,
    about = "Translate natural-language security questions into SPL",
    long_about = "Translates a free-text security question into a validated SPL search.\n\n\
                  The pipeline classifies the question, rewrites it for clarity, picks the\n\
                  organization it is scoped to, retrieves similar known questions, and\n\
                  generates and validates the final search."
)]
pub struct Args {
    /// The question to translate
    pub question: String,

    /// Organization to scope the search to (skips automatic selection)
    #[arg(short, long, env = "SPL_ORGANIZATION")]
    pub organization: Option<String>,

    /// Directory holding the catalog JSON files; built-in catalogs are
    /// used when omitted
    #[arg(short, long, env = "SPL_DATA_DIR")]
    pub data_dir: Option<String>,

    /// Use deterministic in-process providers instead of remote services
    #[arg(long)]
    pub mock: bool,

    /// Emit the full translation as JSON instead of formatted text
    #[arg(long)]
    pub json: bool,

    /// Log the per-matcher signal breakdown
    #[arg(short, long)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SPL_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Log in JSON format
    #[arg(long)]
    pub json_logs: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Args::command().debug_assert()
    }

    #[test]
    fn test_minimal_invocation_parses() {
        let args = Args::parse_from(["spl-copilot", "show failed logins"]);
        assert_eq!(args.question, "show failed logins");
        assert!(!args.mock);
        assert!(args.organization.is_none());
    }
}
