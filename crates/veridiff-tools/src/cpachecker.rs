//! CPAchecker model checker
//!
//! CPAchecker is a configurable software verification framework for C
//! programs. The C pipeline runs it twice: a cheap configuration first and
//! a stronger one when the first finds no violation.
//!
//! See: <https://cpachecker.sosy-lab.org/>

// =============================================
// Kani Proofs for CPAchecker
// =============================================

#[cfg(kani)]
mod kani_proofs {
    use super::*;

    // ---- CpacheckerConfig Default Tests ----

    /// Verify CpacheckerConfig::default java_path is None
    #[kani::proof]
    fn proof_cpachecker_config_default_java_none() {
        let config = CpacheckerConfig::default();
        kani::assert(config.java_path.is_none(), "Default java_path should be None");
    }

    // ---- parse_output Tests ----

    /// Verify parse_output returns Sat for FALSE result
    #[kani::proof]
    fn proof_parse_output_false() {
        let verdict = parse_output("Verification result: FALSE. Property violation");
        kani::assert(verdict == Ok(Verdict::Sat), "Should return Sat for FALSE");
    }

    /// Verify parse_output returns Unsat for TRUE result
    #[kani::proof]
    fn proof_parse_output_true() {
        let verdict = parse_output("Verification result: TRUE. No property violation");
        kani::assert(verdict == Ok(Verdict::Unsat), "Should return Unsat for TRUE");
    }
}

use crate::process::ToolRun;
use crate::tool::{match_banner, Tool, UnparsableOutput, Verifier};
use crate::verdict::Verdict;
use std::path::PathBuf;

const BANNERS: &[(&str, Verdict)] = &[
    ("Verification result: FALSE.", Verdict::Sat),
    ("Verification result: TRUE.", Verdict::Unsat),
    ("Verification result: UNKNOWN", Verdict::Unknown),
    ("Analysis interrupted", Verdict::Unknown),
];

/// CPAchecker's front end rejected the program
const PARSE_FAILURE: &str = "Parsing failed";

/// Configuration for one CPAchecker invocation
#[derive(Debug, Clone)]
pub struct CpacheckerConfig {
    /// Command string, e.g. `cpa.sh -predicateAnalysis -spec sv-comp-reachability`
    pub cli: String,
    /// Exported as `JAVA` for the launcher script
    pub java_path: Option<PathBuf>,
}

impl Default for CpacheckerConfig {
    fn default() -> Self {
        Self {
            cli: "cpa.sh -default".to_string(),
            java_path: None,
        }
    }
}

/// CPAchecker wrapper
#[derive(Debug, Clone, Default)]
pub struct Cpachecker {
    config: CpacheckerConfig,
}

impl Cpachecker {
    pub fn new(cli: impl Into<String>) -> Self {
        Self::with_config(CpacheckerConfig {
            cli: cli.into(),
            ..Default::default()
        })
    }

    pub fn with_config(config: CpacheckerConfig) -> Self {
        Self { config }
    }

    /// The run ended in a front-end parse error
    pub fn parse_failed(&self, run: &ToolRun) -> bool {
        run.stdout.contains(PARSE_FAILURE) || run.stderr.contains(PARSE_FAILURE)
    }
}

impl Tool for Cpachecker {
    fn name(&self) -> &'static str {
        "cpachecker"
    }

    fn cli(&self) -> &str {
        &self.config.cli
    }

    fn env(&self) -> Vec<(String, String)> {
        self.config
            .java_path
            .iter()
            .map(|java| ("JAVA".to_string(), java.display().to_string()))
            .collect()
    }
}

impl Verifier for Cpachecker {
    fn extract_verdict(&self, run: &ToolRun) -> Result<Verdict, UnparsableOutput> {
        parse_output(&run.combined_output())
    }
}

fn parse_output(output: &str) -> Result<Verdict, UnparsableOutput> {
    match_banner(output, BANNERS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Outcome;
    use std::path::Path;
    use std::time::Duration;

    fn run(stdout: &str, stderr: &str) -> ToolRun {
        ToolRun {
            command: "cpa.sh a.c".to_string(),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            returncode: 0,
            timed_out: false,
            missing: false,
            duration: Duration::ZERO,
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = CpacheckerConfig::default();
        assert!(config.java_path.is_none());
        assert!(Cpachecker::default().env().is_empty());
    }

    #[test]
    fn test_java_env() {
        let checker = Cpachecker::with_config(CpacheckerConfig {
            cli: "cpa.sh".to_string(),
            java_path: Some(PathBuf::from("/opt/jdk/bin/java")),
        });
        assert_eq!(
            checker.env(),
            vec![("JAVA".to_string(), "/opt/jdk/bin/java".to_string())]
        );
    }

    #[test]
    fn test_parse_output() {
        let checker = Cpachecker::new("cpa.sh");
        assert_eq!(
            checker.extract_verdict(&run("Verification result: FALSE. Property violation found", "")),
            Ok(Verdict::Sat)
        );
        assert_eq!(
            checker.extract_verdict(&run("Verification result: TRUE. No property violation found", "")),
            Ok(Verdict::Unsat)
        );
        assert_eq!(
            checker.extract_verdict(&run("", "Analysis interrupted (timeout)")),
            Ok(Verdict::Unknown)
        );
        assert_eq!(checker.extract_verdict(&run("", "")), Err(UnparsableOutput));
    }

    #[test]
    fn test_parse_failure() {
        let checker = Cpachecker::new("cpa.sh");
        assert!(checker.parse_failed(&run("", "Parsing failed: syntax error")));
        assert!(!checker.parse_failed(&run("Verification result: TRUE.", "")));
    }

    #[tokio::test]
    async fn test_run_unavailable() {
        let checker = Cpachecker::new("/no/cpachecker -default");
        let run = checker.run(Path::new("a.c"), Duration::from_secs(1)).await.unwrap();
        assert_eq!(checker.classify(&run), Outcome::ToolMissing);
    }
}
