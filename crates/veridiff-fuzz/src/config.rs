//! Run configuration
//!
//! Loaded from a TOML file; every field has a default, so an empty file
//! is a valid configuration. Command-line flags are applied on top.

use crate::error::{FuzzError, FuzzResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use veridiff_lower::{Language, LowerOptions};
use veridiff_tools::{CompositeVerdict, DEFAULT_IGNORE_LIST};

/// Command strings for the secondary tools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolCommands {
    pub dafny: String,
    pub boogie: String,
    pub compiler: String,
    /// First model-checker configuration
    pub cpachecker: String,
    /// Run when the first configuration finds no violation
    pub cpachecker_strong: String,
}

impl Default for ToolCommands {
    fn default() -> Self {
        Self {
            dafny: "dafny".to_string(),
            boogie: "boogie".to_string(),
            compiler: "gcc -O0 -w".to_string(),
            cpachecker: "cpa.sh -predicateAnalysis -spec sv-comp-reachability".to_string(),
            cpachecker_strong: "cpa.sh -kInduction -spec sv-comp-reachability".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FuzzConfig {
    /// Language the mutants are lowered to
    pub language: Language,
    /// Reference solver command
    pub solver: String,
    /// Fixed expected verdict; skips the reference solver when set
    pub oracle: Option<CompositeVerdict>,
    pub tools: ToolCommands,
    /// Java executable exported to CPAchecker
    pub java_path: Option<PathBuf>,
    /// Per-process timeout in seconds
    pub timeout_secs: u64,
    pub scratch_dir: PathBuf,
    pub bugs_dir: PathBuf,
    /// Keep scratch files after each mutant
    pub keep_mutants: bool,
    /// Mutants tested per seed
    pub iterations: usize,
    pub lowering: LowerOptions,
    /// Output fragments marking a solver's own internal errors
    pub ignore_list: Vec<String>,
    /// Draw random Dafny options on every run
    pub randomize_dafny_options: bool,
}

impl Default for FuzzConfig {
    fn default() -> Self {
        Self {
            language: Language::Dafny,
            solver: "z3 model_validate=true".to_string(),
            oracle: None,
            tools: ToolCommands::default(),
            java_path: None,
            timeout_secs: 8,
            scratch_dir: PathBuf::from("scratch"),
            bugs_dir: PathBuf::from("bugs"),
            keep_mutants: false,
            iterations: 300,
            lowering: LowerOptions::default(),
            ignore_list: DEFAULT_IGNORE_LIST.iter().map(|s| s.to_string()).collect(),
            randomize_dafny_options: true,
        }
    }
}

impl FuzzConfig {
    /// Load and validate a TOML configuration file
    pub fn load(path: &Path) -> FuzzResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FuzzError::Config(format!("cannot read '{}': {e}", path.display())))?;
        Self::from_toml_str(&content)
            .map_err(|e| FuzzError::Config(format!("'{}': {e}", path.display())))
    }

    pub fn from_toml_str(content: &str) -> FuzzResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| FuzzError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> FuzzResult<()> {
        if self.timeout_secs == 0 {
            return Err(FuzzError::Config("timeout_secs must be positive".to_string()));
        }
        if self.iterations == 0 {
            return Err(FuzzError::Config("iterations must be positive".to_string()));
        }
        if self.language == Language::Sql {
            return Err(FuzzError::Config(
                "sql has no verifier to fuzz; use `veridiff lower` for sql output".to_string(),
            ));
        }
        if self.oracle.is_none() && self.solver.trim().is_empty() {
            return Err(FuzzError::Config(
                "a solver command is required without a fixed oracle".to_string(),
            ));
        }
        if matches!(&self.oracle, Some(oracle) if oracle.is_empty()) {
            return Err(FuzzError::Config("the fixed oracle is empty".to_string()));
        }
        self.lowering
            .validate()
            .map_err(|e| FuzzError::Config(e.to_string()))?;
        let tools = &self.tools;
        let required: Vec<(&str, &String)> = match self.language {
            Language::C => vec![
                ("compiler", &tools.compiler),
                ("cpachecker", &tools.cpachecker),
                ("cpachecker_strong", &tools.cpachecker_strong),
            ],
            Language::Dafny => vec![("dafny", &tools.dafny)],
            Language::Boogie => vec![("boogie", &tools.boogie)],
            Language::Sql => Vec::new(),
        };
        if let Some((name, _)) = required.iter().find(|(_, cli)| cli.trim().is_empty()) {
            return Err(FuzzError::Config(format!("tools.{name} must not be empty")));
        }
        Ok(())
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veridiff_lower::OracleStyle;
    use veridiff_tools::Verdict;

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(FuzzConfig::from_toml_str("").unwrap(), FuzzConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let config = FuzzConfig::from_toml_str(
            r#"
            language = "c"
            oracle = ["sat"]
            timeout_secs = 3
            keep_mutants = true

            [tools]
            compiler = "clang"

            [lowering]
            method_mode = true
            oracle_style = "any-false"
            "#,
        )
        .unwrap();
        assert_eq!(config.language, Language::C);
        assert_eq!(config.oracle, Some(CompositeVerdict::single(Verdict::Sat)));
        assert_eq!(config.timeout(), Duration::from_secs(3));
        assert!(config.keep_mutants);
        assert_eq!(config.tools.compiler, "clang");
        assert_eq!(config.tools.dafny, "dafny");
        assert!(config.lowering.method_mode);
        assert_eq!(config.lowering.oracle_style, OracleStyle::AnyFalse);
        assert!(!config.lowering.real_mode);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(matches!(
            FuzzConfig::from_toml_str("timeout = 3"),
            Err(FuzzError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_lowering_keys_rejected() {
        assert!(matches!(
            FuzzConfig::from_toml_str("[lowering]\nmethod = true"),
            Err(FuzzError::Config(_))
        ));
        let config = FuzzConfig::from_toml_str("[lowering]\nmethod_mode = true").unwrap();
        assert!(config.lowering.method_mode);
    }

    #[test]
    fn test_validation() {
        for bad in [
            "timeout_secs = 0",
            "iterations = 0",
            "language = \"sql\"",
            "solver = \"  \"",
            "oracle = []",
            "language = \"c\"\n[tools]\ncpachecker_strong = \"\"",
            "[lowering]\nmax_fresh_ids = 0",
        ] {
            assert!(FuzzConfig::from_toml_str(bad).is_err(), "{bad} accepted");
        }
        assert!(FuzzConfig::from_toml_str("solver = \"\"\noracle = [\"unsat\"]").is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("veridiff.toml");
        std::fs::write(&path, "iterations = 5\n").unwrap();
        assert_eq!(FuzzConfig::load(&path).unwrap().iterations, 5);
        assert!(FuzzConfig::load(&dir.path().join("missing.toml")).is_err());
    }
}
