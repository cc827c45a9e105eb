//! Bug-report bundles
//!
//! A finding is written as three files sharing one base name
//! `<kind>-<tool>-<seeds>-<random>`: the mutant (`.smt2`), the generated
//! program (`.c`, `.dfy`, `.bpl`) and a `.log` with the tool transcripts.

use rand::distr::Alphanumeric;
use rand::Rng;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};
use veridiff_tools::ToolRun;

const SUFFIX_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("cannot write {path}: {source}")]
    DiskExhausted {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Kind of finding, used as the file-name prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BugKind {
    /// The tool died on a fault signal
    Segfault,
    /// The tool failed or produced output with no verdict
    CompileError,
    /// The tool's verdict contradicts the reference
    Incorrect,
}

impl BugKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BugKind::Segfault => "segfault",
            BugKind::CompileError => "compile_error",
            BugKind::Incorrect => "incorrect",
        }
    }
}

impl fmt::Display for BugKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one tool invocation printed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub command: String,
    pub stdout: String,
    pub stderr: String,
}

impl From<&ToolRun> for Transcript {
    fn from(run: &ToolRun) -> Self {
        Self {
            command: run.command.clone(),
            stdout: run.stdout.clone(),
            stderr: run.stderr.clone(),
        }
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "command: {}\nstderr:\n{}stdout:\n{}",
            self.command, self.stderr, self.stdout
        )
    }
}

/// One finding, ready to be persisted
#[derive(Debug, Clone)]
pub struct BugReport<'a> {
    pub kind: BugKind,
    /// Configured command of the tool under test
    pub tool_cli: &'a str,
    pub seeds: &'a [String],
    pub mutant: &'a str,
    pub program: &'a str,
    /// Extension of the generated program, without the dot
    pub extension: &'a str,
    pub finding: Transcript,
    /// The reference solver's transcript, for soundness findings
    pub reference: Option<Transcript>,
}

impl BugReport<'_> {
    fn log(&self) -> String {
        match &self.reference {
            Some(reference) => format!(
                "*** REFERENCE \n{reference}\n\n*** INCORRECT \n{}",
                self.finding
            ),
            None => self.finding.to_string(),
        }
    }
}

/// Writes bug bundles into the bugs directory
#[derive(Debug, Clone)]
pub struct BugReporter {
    dir: PathBuf,
}

impl BugReporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist `report`, returning the bundle's base path (no extension)
    pub fn write(&self, report: &BugReport<'_>) -> Result<PathBuf, ReportError> {
        write_file(&self.dir, |dir| std::fs::create_dir_all(dir))?;

        let suffix: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(SUFFIX_LEN)
            .map(char::from)
            .collect();
        let name = format!(
            "{}-{}-{}-{suffix}",
            report.kind,
            plain(report.tool_cli),
            escape(&report.seeds.join("-")),
        );
        for (extension, content) in [
            ("smt2", report.mutant.to_string()),
            (report.extension, report.program.to_string()),
            ("log", report.log()),
        ] {
            let path = self.dir.join(format!("{name}.{extension}"));
            write_file(&path, |p| std::fs::write(p, &content))?;
        }
        let base = self.dir.join(name);
        info!(kind = %report.kind, path = %base.display(), "bug report written");
        Ok(base)
    }
}

fn write_file(
    path: &Path,
    op: impl FnOnce(&Path) -> std::io::Result<()>,
) -> Result<(), ReportError> {
    op(path).map_err(|source| {
        error!(path = %path.display(), %source, "cannot write bug report");
        ReportError::DiskExhausted {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Tool command as a file-name fragment: program base name plus arguments
fn plain(cli: &str) -> String {
    let mut parts = cli.split_whitespace();
    let program = parts
        .next()
        .map(|p| p.rsplit('/').next().unwrap_or(p))
        .unwrap_or("tool");
    std::iter::once(program)
        .chain(parts)
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect()
}

/// Keep a seed name safe to use inside a file name
fn escape(seeds: &str) -> String {
    seeds
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn transcript(command: &str, stdout: &str) -> Transcript {
        Transcript {
            command: command.to_string(),
            stdout: stdout.to_string(),
            stderr: "warn\n".to_string(),
        }
    }

    fn report<'a>(seeds: &'a [String], reference: Option<Transcript>) -> BugReport<'a> {
        BugReport {
            kind: BugKind::Incorrect,
            tool_cli: "/opt/bin/dafny /compile:0",
            seeds,
            mutant: "(assert true)\n",
            program: "method check() {}\n",
            extension: "dfy",
            finding: transcript("dafny m.dfy", "0 errors\n"),
            reference,
        }
    }

    #[test]
    fn test_name_fragments() {
        assert_eq!(plain("/usr/local/bin/z3 model_validate=true"), "z3-model_validatetrue");
        assert_eq!(plain(""), "tool");
        assert_eq!(escape("a b/c.smt2"), "a_b_c_smt2");
    }

    #[test]
    fn test_bundle_files() {
        let dir = TempDir::new().unwrap();
        let reporter = BugReporter::new(dir.path().join("bugs"));
        let seeds = vec!["seed1".to_string(), "seed2".to_string()];
        let base = reporter.write(&report(&seeds, None)).unwrap();

        let name = base.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("incorrect-dafny-compile0-seed1-seed2-"), "{name}");
        assert_eq!(name.len(), "incorrect-dafny-compile0-seed1-seed2-".len() + SUFFIX_LEN);

        let smt2 = std::fs::read_to_string(base.with_extension("smt2")).unwrap();
        assert_eq!(smt2, "(assert true)\n");
        assert!(base.with_extension("dfy").exists());
        let log = std::fs::read_to_string(base.with_extension("log")).unwrap();
        assert_eq!(log, "command: dafny m.dfy\nstderr:\nwarn\nstdout:\n0 errors\n");
    }

    #[test]
    fn test_soundness_log_has_both_sections() {
        let dir = TempDir::new().unwrap();
        let reporter = BugReporter::new(dir.path());
        let seeds = vec!["s".to_string()];
        let base = reporter
            .write(&report(&seeds, Some(transcript("z3 m.smt2", "sat\n"))))
            .unwrap();
        let log = std::fs::read_to_string(base.with_extension("log")).unwrap();
        assert!(log.starts_with("*** REFERENCE \ncommand: z3 m.smt2\n"));
        let incorrect = log.find("\n\n*** INCORRECT \ncommand: dafny m.dfy").unwrap();
        assert!(log[..incorrect].contains("sat\n"));
    }

    #[test]
    fn test_unwritable_directory_is_disk_exhaustion() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        let reporter = BugReporter::new(blocker.join("bugs"));
        let seeds = vec!["s".to_string()];
        assert!(matches!(
            reporter.write(&report(&seeds, None)),
            Err(ReportError::DiskExhausted { .. })
        ));
    }
}
