//! veridiff CLI
//!
//! # Commands
//!
//! - `veridiff lower <file>` - Lower an SMT-LIB script to C, Dafny, Boogie or SQL
//! - `veridiff fuzz <seeds>...` - Differentially test a verifier against a solver
//! - `veridiff check-tools` - Report which configured executables are installed
//!
//! The process exits with 0 (no findings), 1 (findings), 2 (usage error),
//! 3 (internal error), 4 (disk exhausted) or 5 (every call timed out).

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use veridiff_fuzz::{
    FuzzConfig, FuzzError, IdentitySource, ListSource, MutantSource, RunStatus, VerifierFuzzer,
};
use veridiff_lower::{GeneratedProgram, Language, LowerOptions, OracleStyle, Transformer};
use veridiff_smt::{check_script, parse_script, Script};
use veridiff_tools::CompositeVerdict;

#[derive(Parser)]
#[command(name = "veridiff")]
#[command(about = "Differential translation-validation fuzzer for SMT solvers and verifiers")]
#[command(version)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lower an SMT-LIB script to an imperative program
    Lower {
        /// Script to lower
        file: PathBuf,
        /// Target language
        #[arg(short, long, default_value = "c")]
        lang: Language,
        #[command(flatten)]
        lowering: LoweringArgs,
        /// Write the program here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Test seed scripts (or directories of them) against a verifier
    Fuzz(FuzzArgs),
    /// Report which configured executables are installed
    CheckTools {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Target language
        #[arg(short, long)]
        lang: Option<Language>,
    },
}

#[derive(Args, Default)]
struct LoweringArgs {
    /// Treat every numeric value as real
    #[arg(long)]
    real: bool,
    /// Emit one routine per assertion
    #[arg(long)]
    method: bool,
    /// Assert that at least one assertion is false
    #[arg(long)]
    any_false: bool,
    /// Upper bound on fresh identifiers
    #[arg(long)]
    vars: Option<usize>,
}

impl LoweringArgs {
    /// Flags only ever switch options on; anything unset keeps `base`
    fn apply(&self, mut base: LowerOptions) -> LowerOptions {
        base.real_mode |= self.real;
        base.method_mode |= self.method;
        if self.any_false {
            base.oracle_style = OracleStyle::AnyFalse;
        }
        if let Some(vars) = self.vars {
            base.max_fresh_ids = vars;
        }
        base
    }
}

#[derive(Args, Default)]
struct FuzzArgs {
    /// Seed scripts, or directories searched for `*.smt2`
    #[arg(required = true)]
    seeds: Vec<PathBuf>,
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Target language
    #[arg(short, long)]
    lang: Option<Language>,
    /// Reference solver command
    #[arg(short, long)]
    solver: Option<String>,
    /// Fixed expected verdict, e.g. `sat` or `unsat,sat`; skips the solver
    #[arg(long)]
    oracle: Option<CompositeVerdict>,
    /// Per-process timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,
    /// Mutants tested per seed
    #[arg(short = 'n', long)]
    iterations: Option<usize>,
    /// Replay these mutants for every seed instead of re-testing the seed
    #[arg(long = "mutant")]
    mutants: Vec<PathBuf>,
    #[arg(long)]
    scratch: Option<PathBuf>,
    #[arg(long)]
    bugs: Option<PathBuf>,
    /// Keep scratch files after each mutant
    #[arg(long)]
    keep_mutants: bool,
    #[command(flatten)]
    lowering: LoweringArgs,
    /// Print statistics as JSON
    #[arg(long)]
    json: bool,
}

impl FuzzArgs {
    fn apply(&self, config: &mut FuzzConfig) {
        if let Some(lang) = self.lang {
            config.language = lang;
        }
        if let Some(solver) = &self.solver {
            config.solver = solver.clone();
        }
        if let Some(oracle) = &self.oracle {
            config.oracle = Some(oracle.clone());
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(iterations) = self.iterations {
            config.iterations = iterations;
        }
        if let Some(scratch) = &self.scratch {
            config.scratch_dir = scratch.clone();
        }
        if let Some(bugs) = &self.bugs {
            config.bugs_dir = bugs.clone();
        }
        config.keep_mutants |= self.keep_mutants;
        config.lowering = self.lowering.apply(config.lowering.clone());
    }
}

fn load_config(path: Option<&Path>) -> Result<FuzzConfig, FuzzError> {
    match path {
        Some(path) => FuzzConfig::load(path),
        None => Ok(FuzzConfig::default()),
    }
}

fn read_script(path: &Path) -> anyhow::Result<Script> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let script = parse_script(&text).with_context(|| format!("parsing {}", path.display()))?;
    check_script(&script).with_context(|| format!("checking {}", path.display()))?;
    Ok(script)
}

fn lower_file(
    path: &Path,
    lang: Language,
    options: LowerOptions,
) -> anyhow::Result<GeneratedProgram> {
    let script = read_script(path)?;
    let program = Transformer::new(lang, options)
        .transform_script(&script)
        .with_context(|| format!("lowering {} to {lang}", path.display()))?;
    Ok(program)
}

/// Expand directories into their `*.smt2` files, sorted by name
fn collect_seeds(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut seeds = Vec::new();
    for path in paths {
        if !path.is_dir() {
            seeds.push(path.clone());
            continue;
        }
        let entries =
            std::fs::read_dir(path).with_context(|| format!("listing {}", path.display()))?;
        let mut found = Vec::new();
        for entry in entries {
            let file = entry?.path();
            if file.extension().is_some_and(|ext| ext == "smt2") {
                found.push(file);
            }
        }
        found.sort();
        if found.is_empty() {
            warn!(dir = %path.display(), "no .smt2 files in seed directory");
        }
        seeds.extend(found);
    }
    Ok(seeds)
}

async fn fuzz(args: &FuzzArgs) -> Result<RunStatus, FuzzError> {
    let mut config = load_config(args.config.as_deref())?;
    args.apply(&mut config);
    let seeds = collect_seeds(&args.seeds).map_err(|e| FuzzError::Config(format!("{e:#}")))?;

    let mut source: Box<dyn MutantSource> = if args.mutants.is_empty() {
        Box::new(IdentitySource)
    } else {
        let mutants = args
            .mutants
            .iter()
            .map(|path| read_script(path))
            .collect::<anyhow::Result<Vec<_>>>()
            .map_err(|e| FuzzError::Config(format!("{e:#}")))?;
        Box::new(ListSource::new(mutants))
    };

    let mut fuzzer = VerifierFuzzer::new(config)?;
    fuzzer.fuzz(&seeds, source.as_mut()).await?;

    let stats = fuzzer.statistics();
    if args.json {
        match stats.to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => warn!(error = %e, "cannot serialize statistics"),
        }
    } else {
        println!("{stats}");
    }
    Ok(RunStatus::from_statistics(stats))
}

/// Returns whether every tool was found
fn check_tools(config: Option<&Path>, lang: Option<Language>) -> Result<bool, FuzzError> {
    let mut config = load_config(config)?;
    if let Some(lang) = lang {
        config.language = lang;
    }
    let fuzzer = VerifierFuzzer::new(config)?;
    let mut all_found = true;
    for tool in fuzzer.locate_tools() {
        match &tool.location {
            Ok(path) => println!("  ✓ {:<12} {}", tool.name, path.display()),
            Err(e) => {
                all_found = false;
                println!("  ✗ {:<12} {e}", tool.name);
            }
        }
    }
    Ok(all_found)
}

async fn run(cli: Cli) -> RunStatus {
    match cli.command {
        Commands::Lower {
            file,
            lang,
            lowering,
            output,
        } => {
            let result = lower_file(&file, lang, lowering.apply(LowerOptions::default()))
                .and_then(|program| match &output {
                    Some(out) => std::fs::write(out, &program.source)
                        .with_context(|| format!("writing {}", out.display())),
                    None => {
                        print!("{}", program.source);
                        Ok(())
                    }
                });
            match result {
                Ok(()) => RunStatus::NoFindings,
                Err(e) => {
                    eprintln!("error: {e:#}");
                    RunStatus::Usage
                }
            }
        }
        Commands::Fuzz(args) => match fuzz(&args).await {
            Ok(status) => status,
            Err(e) => {
                eprintln!("error: {e}");
                RunStatus::from_error(&e)
            }
        },
        Commands::CheckTools { config, lang } => match check_tools(config.as_deref(), lang) {
            Ok(true) => RunStatus::NoFindings,
            Ok(false) => RunStatus::Usage,
            Err(e) => {
                eprintln!("error: {e}");
                RunStatus::from_error(&e)
            }
        },
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let status = run(cli).await;
    info!(status = ?status, "done");
    std::process::exit(status.code());
}
