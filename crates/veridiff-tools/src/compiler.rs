//! C compiler stage: compile the generated program, then execute it

use crate::error::ToolResult;
use crate::process::{run_command, split_command, ToolRun};
use crate::tool::Tool;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Makes the generated nondet functions concrete so the binary links
pub const EXECUTE_DEFINE: &str = "-DVERIDIFF_EXECUTE";

#[derive(Debug, Clone)]
pub struct Compiler {
    cli: String,
}

impl Compiler {
    pub fn new(cli: impl Into<String>) -> Self {
        Self { cli: cli.into() }
    }

    /// Where the binary for `source` is written
    pub fn binary_path(source: &Path) -> PathBuf {
        source.with_extension("")
    }

    /// Compile `source` into [`Compiler::binary_path`]
    pub async fn compile(&self, source: &Path, limit: Duration) -> ToolResult<ToolRun> {
        self.run(source, limit).await
    }

    /// Run a compiled binary with no arguments
    pub async fn execute(&self, binary: &Path, limit: Duration) -> ToolResult<ToolRun> {
        debug!(binary = %binary.display(), "executing compiled program");
        run_command(&[binary.display().to_string()], &[], limit).await
    }
}

impl Tool for Compiler {
    fn name(&self) -> &'static str {
        "compiler"
    }

    fn cli(&self) -> &str {
        &self.cli
    }

    /// `<cli> -DVERIDIFF_EXECUTE <file> -o <binary>`
    fn command_line(&self, file: &Path) -> Vec<String> {
        let mut argv = split_command(&self.cli);
        if argv.is_empty() {
            return argv;
        }
        argv.push(EXECUTE_DEFINE.to_string());
        argv.push(file.display().to_string());
        argv.push("-o".to_string());
        argv.push(Self::binary_path(file).display().to_string());
        argv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{aborted, Outcome};

    #[test]
    fn test_compile_command_line() {
        let compiler = Compiler::new("gcc -O0");
        assert_eq!(
            compiler.command_line(Path::new("/s/m1.c")),
            vec!["gcc", "-O0", "-DVERIDIFF_EXECUTE", "/s/m1.c", "-o", "/s/m1"]
        );
        assert!(Compiler::new(" ").command_line(Path::new("a.c")).is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_reports_abort() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let binary = dir.path().join("prog");
        std::fs::write(&binary, "#!/bin/sh\nkill -ABRT $$\n").unwrap();
        std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755)).unwrap();

        let compiler = Compiler::new("cc");
        let run = compiler.execute(&binary, Duration::from_secs(10)).await.unwrap();
        assert!(aborted(run.returncode));
        assert_eq!(compiler.classify(&run), Outcome::ToolError);
    }
}
