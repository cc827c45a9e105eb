//! The `Tool` and `Verifier` traits

use crate::error::{ToolError, ToolResult};
use crate::outcome::Outcome;
use crate::process::{run_command, split_command, ToolRun};
use crate::verdict::Verdict;
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// An external executable driven over one input file
#[async_trait]
pub trait Tool: Send + Sync {
    /// Short family name used in logs and bug-report names
    fn name(&self) -> &'static str;

    /// The configured command string, e.g. `z3 model_validate=true`
    fn cli(&self) -> &str;

    /// Full argument vector for checking `file`
    fn command_line(&self, file: &Path) -> Vec<String> {
        let mut argv = split_command(self.cli());
        argv.push(file.display().to_string());
        argv
    }

    /// Extra environment variables for the child process
    fn env(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Map a run to an outcome. Families override this for exit codes
    /// that are not failures for them.
    fn classify(&self, run: &ToolRun) -> Outcome {
        Outcome::classify(run)
    }

    async fn run(&self, file: &Path, limit: Duration) -> ToolResult<ToolRun> {
        let argv = self.command_line(file);
        if argv.is_empty() {
            return Err(ToolError::EmptyCommand(self.name()));
        }
        run_command(&argv, &self.env(), limit).await
    }

    /// Resolve the executable on `PATH`
    fn locate(&self) -> ToolResult<PathBuf> {
        let Some(program) = split_command(self.cli()).into_iter().next() else {
            return Err(ToolError::EmptyCommand(self.name()));
        };
        let found = which::which(&program).map_err(|_| ToolError::NotFound { program })?;
        debug!(tool = self.name(), path = %found.display(), "located tool");
        Ok(found)
    }
}

/// Tool output did not contain any recognized verdict banner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnparsableOutput;

impl fmt::Display for UnparsableOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unparsable tool output")
    }
}

/// A secondary tool that answers with a single verdict
pub trait Verifier: Tool {
    /// Scan the run's output for the tool's verdict banners
    fn extract_verdict(&self, run: &ToolRun) -> Result<Verdict, UnparsableOutput>;

    /// A failing run whose output marks it as an expected condition
    /// rather than a finding
    fn is_benign_error(&self, _run: &ToolRun) -> bool {
        false
    }
}

/// Scan `text` for the first banner in `table` it contains
pub(crate) fn match_banner(text: &str, table: &[(&str, Verdict)]) -> Result<Verdict, UnparsableOutput> {
    table
        .iter()
        .find(|(banner, _)| text.contains(banner))
        .map(|(_, verdict)| *verdict)
        .ok_or(UnparsableOutput)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo(String);

    impl Tool for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn cli(&self) -> &str {
            &self.0
        }
    }

    #[test]
    fn test_default_command_line_appends_file() {
        let tool = Echo("echo  -n  ".to_string());
        assert_eq!(
            tool.command_line(Path::new("/tmp/a.c")),
            vec!["echo", "-n", "/tmp/a.c"]
        );
    }

    #[test]
    fn test_locate_missing_program() {
        let tool = Echo("veridiff-no-such-tool --flag".to_string());
        assert!(matches!(
            tool.locate(),
            Err(ToolError::NotFound { program }) if program == "veridiff-no-such-tool"
        ));
        assert!(matches!(
            Echo(String::new()).locate(),
            Err(ToolError::EmptyCommand("echo"))
        ));
    }

    #[test]
    fn test_match_banner_uses_table_order() {
        let table = [("error", Verdict::Sat), ("0 errors", Verdict::Unsat)];
        assert_eq!(match_banner("found 0 errors", &table), Ok(Verdict::Sat));
        assert_eq!(match_banner("nothing", &table), Err(UnparsableOutput));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_through_trait() {
        let tool = Echo("echo".to_string());
        let run = tool.run(Path::new("hello"), Duration::from_secs(10)).await.unwrap();
        assert_eq!(run.stdout, "hello\n");
        assert_eq!(tool.classify(&run), Outcome::Ok);
    }
}
