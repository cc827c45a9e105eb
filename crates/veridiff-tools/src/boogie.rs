//! Boogie intermediate verifier

use crate::process::ToolRun;
use crate::tool::{match_banner, Tool, UnparsableOutput, Verifier};
use crate::verdict::Verdict;

const BANNERS: &[(&str, Verdict)] = &[
    ("assertion could not be proved", Verdict::Sat),
    ("getting info about 'unknown' response", Verdict::Unknown),
    ("out of resource", Verdict::Unknown),
    ("0 error", Verdict::Unsat),
];

#[derive(Debug, Clone)]
pub struct Boogie {
    cli: String,
}

impl Boogie {
    pub fn new(cli: impl Into<String>) -> Self {
        Self { cli: cli.into() }
    }
}

impl Tool for Boogie {
    fn name(&self) -> &'static str {
        "boogie"
    }

    fn cli(&self) -> &str {
        &self.cli
    }
}

impl Verifier for Boogie {
    fn extract_verdict(&self, run: &ToolRun) -> Result<Verdict, UnparsableOutput> {
        match_banner(&run.stdout, BANNERS)
    }
}
