//! The translation-validation pipeline
//!
//! Each mutant goes through the same stages:
//!
//! 1. obtain the reference verdict (fixed oracle or the reference solver)
//! 2. re-parse and re-typecheck the persisted mutant
//! 3. lower it to the target language
//! 4. run the secondary tool(s) on the generated program
//! 5. classify how each tool exited
//! 6. compare the tool's verdict with the reference
//!
//! A stage that cannot continue turns into a [`MutantOutcome`]. Only a
//! missing tool or an unwritable bug report ends the run.

use crate::config::FuzzConfig;
use crate::error::{FuzzError, FuzzResult};
use crate::report::{BugKind, BugReport, BugReporter, Transcript};
use crate::source::MutantSource;
use crate::stats::Statistics;
use rand::distr::Alphanumeric;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use veridiff_lower::{GeneratedProgram, Language, LowerError, Transformer};
use veridiff_smt::{check_script, parse_script, Script};
use veridiff_tools::{
    aborted, Boogie, CompositeVerdict, Compiler, Cpachecker, CpacheckerConfig, Dafny, Outcome,
    Solver, SolverAnswer, Tool, ToolResult, ToolRun, Verdict, Verifier,
};

/// Timeouts tolerated per seed before moving on to the next one
pub const MAX_TIMEOUTS: usize = 32;

/// Why a mutant was dropped without a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The persisted mutant no longer parses or typechecks
    Revalidation,
    FreshIdExhausted,
    /// The formula uses something the target language cannot express
    Unsupported,
    /// The tool failed with an output known to be harmless
    BenignToolError,
}

/// How testing one mutant ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutantOutcome {
    Agreement,
    Timeout,
    /// The reference solver rejected the mutant
    Invalid,
    /// The reference verdict was all unknown
    Inconclusive,
    Skipped(SkipReason),
    Finding { kind: BugKind, report: PathBuf },
}

impl MutantOutcome {
    #[must_use]
    pub fn is_finding(&self) -> bool {
        matches!(self, MutantOutcome::Finding { .. })
    }
}

enum Secondary {
    C {
        compiler: Compiler,
        checker: Cpachecker,
        strong: Cpachecker,
    },
    Verifier(Box<dyn Verifier>),
}

/// Whether a configured tool is installed
#[derive(Debug)]
pub struct ToolStatus {
    pub name: &'static str,
    pub command: String,
    pub location: ToolResult<PathBuf>,
}

impl ToolStatus {
    fn of<T: Tool + ?Sized>(tool: &T) -> Self {
        Self {
            name: tool.name(),
            command: tool.cli().to_string(),
            location: tool.locate(),
        }
    }
}

/// Reference verdict for the current mutant
struct Reference {
    verdict: CompositeVerdict,
    /// Absent when the verdict is a fixed oracle
    transcript: Option<Transcript>,
}

impl Reference {
    /// The generated program asserts every assertion at once, so it is
    /// compared with the verdict of the final `check-sat`.
    fn final_verdict(&self) -> Verdict {
        self.verdict.last().unwrap_or(Verdict::Unknown)
    }

    fn accepts(&self, verdict: Verdict) -> bool {
        self.final_verdict().agrees_with(verdict)
    }
}

/// The mutant being tested and what it was lowered to
struct Subject<'a> {
    mutant: &'a str,
    program: &'a GeneratedProgram,
    reference: &'a Reference,
}

/// Scratch files of one mutant, removed on drop unless kept
struct Scratch {
    files: Vec<PathBuf>,
    keep: bool,
}

impl Scratch {
    fn track(&mut self, path: PathBuf) -> &Path {
        self.files.push(path);
        &self.files[self.files.len() - 1]
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        for file in &self.files {
            let _ = std::fs::remove_file(file);
        }
    }
}

pub struct VerifierFuzzer {
    config: FuzzConfig,
    solver: Solver,
    secondary: Arc<Secondary>,
    transformer: Transformer,
    reporter: BugReporter,
    stats: Statistics,
    seeds: Vec<String>,
    timeouts_of_seed: usize,
    run_id: String,
    counter: usize,
}

impl VerifierFuzzer {
    pub fn new(config: FuzzConfig) -> FuzzResult<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.scratch_dir)?;

        let secondary = match config.language {
            Language::C => {
                let checker = |cli: &str| {
                    Cpachecker::with_config(CpacheckerConfig {
                        cli: cli.to_string(),
                        java_path: config.java_path.clone(),
                    })
                };
                Secondary::C {
                    compiler: Compiler::new(config.tools.compiler.clone()),
                    checker: checker(&config.tools.cpachecker),
                    strong: checker(&config.tools.cpachecker_strong),
                }
            }
            Language::Dafny => Secondary::Verifier(Box::new(
                Dafny::new(config.tools.dafny.clone())
                    .with_randomized_options(config.randomize_dafny_options),
            )),
            Language::Boogie => {
                Secondary::Verifier(Box::new(Boogie::new(config.tools.boogie.clone())))
            }
            Language::Sql => {
                return Err(FuzzError::Config("sql has no verifier to fuzz".to_string()))
            }
        };

        let run_id = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(char::from)
            .collect();

        Ok(Self {
            solver: Solver::with_ignore_list(config.solver.clone(), config.ignore_list.clone()),
            secondary: Arc::new(secondary),
            transformer: Transformer::new(config.language, config.lowering.clone()),
            reporter: BugReporter::new(config.bugs_dir.clone()),
            stats: Statistics::new(),
            seeds: Vec::new(),
            timeouts_of_seed: 0,
            run_id,
            counter: 0,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &FuzzConfig {
        &self.config
    }

    #[must_use]
    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    /// Resolve every external tool this run would invoke
    pub fn locate_tools(&self) -> Vec<ToolStatus> {
        let mut tools = Vec::new();
        if self.config.oracle.is_none() {
            tools.push(ToolStatus::of(&self.solver));
        }
        match &*self.secondary {
            Secondary::C {
                compiler,
                checker,
                strong,
            } => {
                tools.push(ToolStatus::of(compiler));
                tools.push(ToolStatus::of(checker));
                tools.push(ToolStatus::of(strong));
            }
            Secondary::Verifier(verifier) => tools.push(ToolStatus::of(verifier.as_ref())),
        }
        tools
    }

    /// Test every seed file with mutants from `source`
    pub async fn fuzz(
        &mut self,
        seeds: &[PathBuf],
        source: &mut dyn MutantSource,
    ) -> FuzzResult<()> {
        info!(
            seeds = seeds.len(),
            source = source.name(),
            language = %self.config.language,
            "starting fuzzing run"
        );
        for path in seeds {
            let script = match load_seed(path) {
                Ok(script) => script,
                Err(reason) => {
                    self.stats.skipped_seeds += 1;
                    warn!(seed = %path.display(), %reason, "skipping seed");
                    continue;
                }
            };
            self.test_seed(seed_id(path), &script, source).await?;
        }
        info!(findings = self.stats.findings(), "fuzzing run finished");
        Ok(())
    }

    /// Test up to `iterations` mutants of one seed.
    ///
    /// Stops early on a finding, when the source runs dry, or when the
    /// seed has used up its timeout budget. A source that does not mutate
    /// is run once unless Dafny options are randomized.
    pub async fn test_seed(
        &mut self,
        id: String,
        seed: &Script,
        source: &mut dyn MutantSource,
    ) -> FuzzResult<()> {
        self.stats.seeds += 1;
        self.seeds = vec![id];
        self.timeouts_of_seed = 0;

        // An unchanged seed is worth repeating only when the verifier's
        // options are redrawn for each run.
        let rounds = if source.mutates() || self.redraws_options() {
            self.config.iterations
        } else {
            self.config.iterations.min(1)
        };
        for iteration in 0..rounds {
            let Some(mutant) = source.next_mutant(seed, iteration) else {
                debug!(iteration, "mutant source exhausted");
                break;
            };
            self.stats.mutants += 1;
            let outcome = self.test_mutant(&mutant, iteration).await?;
            debug!(iteration, ?outcome, "mutant tested");
            if outcome.is_finding() {
                break;
            }
            if self.timeouts_of_seed >= MAX_TIMEOUTS {
                info!(seed = ?self.seeds, "timeout budget exhausted, skipping rest of seed");
                break;
            }
        }
        Ok(())
    }

    fn redraws_options(&self) -> bool {
        self.config.language == Language::Dafny && self.config.randomize_dafny_options
    }

    /// Run one mutant through the whole pipeline
    pub async fn test_mutant(
        &mut self,
        mutant: &Script,
        iteration: usize,
    ) -> FuzzResult<MutantOutcome> {
        self.counter += 1;
        let prefix = self
            .config
            .scratch_dir
            .join(format!("{}-{}", self.run_id, self.counter));
        let mut scratch = Scratch {
            files: Vec::new(),
            keep: self.config.keep_mutants,
        };

        let mutant_text = mutant.to_string();
        let smt_path = scratch.track(with_extension(&prefix, "smt2")).to_path_buf();
        tokio::fs::write(&smt_path, &mutant_text).await?;

        let reference = match self.reference(&smt_path, iteration).await? {
            Ok(reference) => reference,
            Err(outcome) => return Ok(outcome),
        };

        let script = match revalidate(&smt_path).await {
            Ok(script) => script,
            Err(reason) => {
                self.stats.unsupported += 1;
                debug!(iteration, %reason, "mutant failed re-validation");
                return Ok(MutantOutcome::Skipped(SkipReason::Revalidation));
            }
        };

        let program = match self.transformer.transform_script(&script) {
            Ok(program) => program,
            Err(LowerError::FreshIdExhausted { limit }) => {
                debug!(iteration, limit, "fresh identifiers exhausted");
                return Ok(MutantOutcome::Skipped(SkipReason::FreshIdExhausted));
            }
            Err(err) => {
                self.stats.unsupported += 1;
                debug!(iteration, %err, "mutant cannot be lowered");
                return Ok(MutantOutcome::Skipped(SkipReason::Unsupported));
            }
        };
        let source_path = scratch
            .track(with_extension(&prefix, program.extension))
            .to_path_buf();
        tokio::fs::write(&source_path, &program.source).await?;

        let subject = Subject {
            mutant: &mutant_text,
            program: &program,
            reference: &reference,
        };
        let secondary = Arc::clone(&self.secondary);
        match &*secondary {
            Secondary::C {
                compiler,
                checker,
                strong,
            } => {
                let binary = scratch.track(Compiler::binary_path(&source_path)).to_path_buf();
                self.check_c(&subject, &source_path, &binary, compiler, [checker, strong])
                    .await
            }
            Secondary::Verifier(verifier) => {
                self.check_verifier(&subject, &source_path, verifier.as_ref())
                    .await
            }
        }
    }

    async fn reference(
        &mut self,
        smt_path: &Path,
        iteration: usize,
    ) -> FuzzResult<Result<Reference, MutantOutcome>> {
        if let Some(oracle) = &self.config.oracle {
            return Ok(Ok(Reference {
                verdict: oracle.clone(),
                transcript: None,
            }));
        }

        let run = self.solver.run(smt_path, self.config.timeout()).await?;
        match self.solver.classify(&run) {
            Outcome::Timeout => {
                debug!(iteration, "reference solver timed out");
                let name = self.solver.name();
                self.count_timeout(name);
                return Ok(Err(MutantOutcome::Timeout));
            }
            Outcome::ToolMissing => return Err(self.missing(&self.solver)),
            _ => {}
        }

        match self.solver.analyze(&run) {
            SolverAnswer::SelfReportedError(_) | SolverAnswer::NoResult => {
                self.stats.invalid_mutants += 1;
                debug!(iteration, "invalid mutant");
                Ok(Err(MutantOutcome::Invalid))
            }
            SolverAnswer::Verdict(verdict) if verdict.is_inconclusive() => {
                debug!(iteration, %verdict, "reference verdict inconclusive");
                Ok(Err(MutantOutcome::Inconclusive))
            }
            SolverAnswer::Verdict(verdict) => Ok(Ok(Reference {
                verdict,
                transcript: Some(Transcript::from(&run)),
            })),
        }
    }

    /// Compile, execute, then model-check with one or two configurations
    async fn check_c(
        &mut self,
        subject: &Subject<'_>,
        source: &Path,
        binary: &Path,
        compiler: &Compiler,
        checkers: [&Cpachecker; 2],
    ) -> FuzzResult<MutantOutcome> {
        let limit = self.config.timeout();

        self.stats.solver_calls += 1;
        let compiled = compiler.compile(source, limit).await?;
        if let Err(outcome) = self.settle(subject, compiler, &compiled, false)? {
            return Ok(outcome);
        }

        let executed = compiler.execute(binary, limit).await?;
        if executed.timed_out {
            self.count_timeout("binary");
            return Ok(MutantOutcome::Timeout);
        }
        if aborted(executed.returncode) && subject.reference.final_verdict() == Verdict::Unsat {
            info!("concrete execution violates an unsat formula");
            return self.report(subject, BugKind::Incorrect, compiler, &executed, None);
        }

        for (stage, checker) in checkers.into_iter().enumerate() {
            self.stats.solver_calls += 1;
            let run = checker.run(source, limit).await?;
            if let Err(outcome) = self.settle(subject, checker, &run, false)? {
                return Ok(outcome);
            }
            if checker.parse_failed(&run) {
                return self.crash(subject, BugKind::CompileError, checker, &run);
            }
            let Ok(verdict) = checker.extract_verdict(&run) else {
                return self.crash(subject, BugKind::CompileError, checker, &run);
            };
            if !subject.reference.accepts(verdict) {
                return self.soundness(subject, checker, &run);
            }
            if verdict == Verdict::Sat {
                break;
            }
            debug!(stage, "no violation found, trying stronger configuration");
        }
        Ok(MutantOutcome::Agreement)
    }

    async fn check_verifier(
        &mut self,
        subject: &Subject<'_>,
        source: &Path,
        verifier: &dyn Verifier,
    ) -> FuzzResult<MutantOutcome> {
        self.stats.solver_calls += 1;
        let run = verifier.run(source, self.config.timeout()).await?;
        let benign = verifier.is_benign_error(&run);
        if let Err(outcome) = self.settle(subject, verifier, &run, benign)? {
            return Ok(outcome);
        }
        match verifier.extract_verdict(&run) {
            Ok(verdict) if subject.reference.accepts(verdict) => Ok(MutantOutcome::Agreement),
            Ok(_) => self.soundness(subject, verifier, &run),
            Err(unparsable) => {
                debug!(%unparsable, "no verdict in tool output");
                self.crash(subject, BugKind::CompileError, verifier, &run)
            }
        }
    }

    /// Apply the outcome taxonomy to a secondary tool run.
    ///
    /// `Ok(Ok(()))` means the tool answered and its output can be read.
    fn settle<T: Tool + ?Sized>(
        &mut self,
        subject: &Subject<'_>,
        tool: &T,
        run: &ToolRun,
        benign: bool,
    ) -> FuzzResult<Result<(), MutantOutcome>> {
        match tool.classify(run) {
            Outcome::Ok => {
                self.stats.effective_calls += 1;
                Ok(Ok(()))
            }
            Outcome::Timeout => {
                self.count_timeout(tool.name());
                Ok(Err(MutantOutcome::Timeout))
            }
            Outcome::ToolMissing => Err(self.missing(tool)),
            Outcome::Crashed => self.crash(subject, BugKind::Segfault, tool, run).map(Err),
            Outcome::ToolError if benign => {
                warn!(tool = tool.name(), returncode = run.returncode, "ignoring benign tool error");
                Ok(Err(MutantOutcome::Skipped(SkipReason::BenignToolError)))
            }
            Outcome::ToolError => self.crash(subject, BugKind::CompileError, tool, run).map(Err),
        }
    }

    fn crash<T: Tool + ?Sized>(
        &mut self,
        subject: &Subject<'_>,
        kind: BugKind,
        tool: &T,
        run: &ToolRun,
    ) -> FuzzResult<MutantOutcome> {
        self.stats.crashes += 1;
        info!(tool = tool.name(), %kind, returncode = run.returncode, "crash trigger");
        let mut finding = Transcript::from(run);
        finding.stderr.push_str(&format!("returncode: {}\n", run.returncode));
        self.write_report(subject, kind, tool, finding, None)
    }

    fn soundness<T: Tool + ?Sized>(
        &mut self,
        subject: &Subject<'_>,
        tool: &T,
        run: &ToolRun,
    ) -> FuzzResult<MutantOutcome> {
        let reference = subject.reference.transcript.clone();
        self.report(subject, BugKind::Incorrect, tool, run, reference)
    }

    fn report<T: Tool + ?Sized>(
        &mut self,
        subject: &Subject<'_>,
        kind: BugKind,
        tool: &T,
        run: &ToolRun,
        reference: Option<Transcript>,
    ) -> FuzzResult<MutantOutcome> {
        self.stats.soundness += 1;
        info!(
            tool = tool.name(),
            expected = %subject.reference.verdict,
            "soundness trigger"
        );
        self.write_report(subject, kind, tool, Transcript::from(run), reference)
    }

    fn write_report<T: Tool + ?Sized>(
        &self,
        subject: &Subject<'_>,
        kind: BugKind,
        tool: &T,
        finding: Transcript,
        reference: Option<Transcript>,
    ) -> FuzzResult<MutantOutcome> {
        let report = self.reporter.write(&BugReport {
            kind,
            tool_cli: tool.cli(),
            seeds: &self.seeds,
            mutant: subject.mutant,
            program: &subject.program.source,
            extension: subject.program.extension,
            finding,
            reference,
        })?;
        Ok(MutantOutcome::Finding { kind, report })
    }

    fn count_timeout(&mut self, tool: &str) {
        self.stats.timeouts += 1;
        self.timeouts_of_seed += 1;
        debug!(tool, timeouts_of_seed = self.timeouts_of_seed, "tool timeout");
    }

    fn missing<T: Tool + ?Sized>(&self, tool: &T) -> FuzzError {
        FuzzError::ToolMissing {
            tool: tool.name(),
            command: tool.cli().to_string(),
        }
    }
}

/// `<prefix>.<extension>` without touching dots already in `prefix`
fn with_extension(prefix: &Path, extension: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

fn seed_id(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn load_seed(path: &Path) -> Result<Script, String> {
    let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let script = parse_script(&text).map_err(|e| e.to_string())?;
    check_script(&script).map_err(|e| e.to_string())?;
    Ok(script)
}

async fn revalidate(path: &Path) -> Result<Script, String> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| e.to_string())?;
    let script = parse_script(&text).map_err(|e| e.to_string())?;
    check_script(&script).map_err(|e| e.to_string())?;
    Ok(script)
}
