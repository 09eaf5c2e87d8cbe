//! Schema Compiler Invocation
//!
//! The code generator itself is a black box behind [`SchemaCompiler`]. The
//! default implementation runs the `xjc` executable; tests substitute a fake
//! that records requests.

use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use crate::error::Result;
use crate::request::BuildRequest;

/// Marker that opens a new error block on the compiler's error stream
pub const ERROR_MARKER: &str = "[ERROR] ";

/// Raw result of one compiler run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CompilerOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Non-blank status lines
    pub fn status_lines(&self) -> Vec<&str> {
        self.stdout.lines().filter(|l| !l.trim().is_empty()).collect()
    }

    pub fn errors(&self) -> Vec<String> {
        parse_errors(&self.stderr)
    }
}

/// Runs the schema-to-source compiler for one request.
///
/// Implementations may assume the request was validated; they report the
/// exit status rather than turning it into an error.
pub trait SchemaCompiler {
    fn invoke(&mut self, request: &BuildRequest) -> Result<CompilerOutput>;
}

/// Invokes an external `xjc` compatible executable
#[derive(Debug, Clone)]
pub struct XjcCommand {
    program: PathBuf,
    working_dir: Option<PathBuf>,
}

impl XjcCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            working_dir: None,
        }
    }

    pub fn with_working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }
}

impl Default for XjcCommand {
    fn default() -> Self {
        Self::new("xjc")
    }
}

impl SchemaCompiler for XjcCommand {
    fn invoke(&mut self, request: &BuildRequest) -> Result<CompilerOutput> {
        let args = request.to_args()?;
        debug!(program = %self.program.display(), "Executing args: {}", args.join(" "));

        let mut command = Command::new(&self.program);
        command.args(&args);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        let output = command.output()?;

        Ok(CompilerOutput {
            // Killed by a signal
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Group the error stream into discrete error blocks.
///
/// A line starting with `[ERROR] ` opens a block (marker stripped); other
/// non-blank lines are trimmed and appended to the current block.
pub fn parse_errors(stderr: &str) -> Vec<String> {
    let mut blocks: Vec<String> = Vec::new();
    let mut current: Option<String> = None;

    for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
        if let Some(message) = line.strip_prefix(ERROR_MARKER) {
            blocks.extend(current.take());
            current = Some(message.trim_end().to_string());
        } else {
            let line = line.trim();
            match current.as_mut() {
                Some(block) => {
                    block.push('\n');
                    block.push_str(line);
                }
                None => current = Some(line.to_string()),
            }
        }
    }
    blocks.extend(current);
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_errors_groups_blocks() {
        let stderr = "[ERROR] src-resolve: Cannot resolve the name 'tns:Author'.\n  line 12 of file:/s/article_v3.xsd\n\n[ERROR] undefined simple or complex type 'tns:Status'\n  line 20 of file:/s/article_v3.xsd\n";
        assert_eq!(
            parse_errors(stderr),
            vec![
                "src-resolve: Cannot resolve the name 'tns:Author'.\nline 12 of file:/s/article_v3.xsd".to_string(),
                "undefined simple or complex type 'tns:Status'\nline 20 of file:/s/article_v3.xsd".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_errors_without_marker() {
        assert_eq!(parse_errors("  unexpected failure\n  details\n"), vec!["unexpected failure\ndetails"]);
        assert!(parse_errors("\n \n").is_empty());
    }

    #[test]
    fn test_status_lines_skip_blanks() {
        let output = CompilerOutput {
            status: 0,
            stdout: "parsing a schema...\n\ncompiling a schema...\n".to_string(),
            stderr: String::new(),
        };
        assert!(output.success());
        assert_eq!(output.status_lines(), vec!["parsing a schema...", "compiling a schema..."]);
    }

    #[test]
    fn test_missing_program_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("a.xsd");
        std::fs::write(&schema, "<x/>").unwrap();
        let request = BuildRequest::new(dir.path(), vec![schema]);

        let mut compiler = XjcCommand::new(dir.path().join("no-such-xjc"));
        assert!(matches!(compiler.invoke(&request), Err(crate::GeneratorError::Io(_))));
    }
}
