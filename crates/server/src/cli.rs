//! Adapter for the local Val Town CLI (`vt`).
//!
//! [`CliRunner`] is the seam the executor talks to; [`VtCli`] is the real
//! implementation backed by `tokio::process`.

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::OnceCell;

/// Captured result of one CLI invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Best human-readable reason for a failed invocation.
    pub fn reason(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }

    /// Stdout parsed as JSON, if it is JSON.
    pub fn json(&self) -> Option<Value> {
        parse_json_output(&self.stdout)
    }
}

/// Runs `vt` subcommands.
///
/// `run` never fails: a non-zero exit, a spawn error or a timeout are all
/// reported through [`CommandOutput::success`].
pub trait CliRunner: Send + Sync {
    /// Whether the CLI can be invoked at all. Implementations cache the answer.
    fn is_available(&self) -> impl Future<Output = bool> + Send;

    /// Run `vt <args>` in `cwd` (or the current directory).
    fn run(&self, args: &[&str], cwd: Option<&Path>) -> impl Future<Output = CommandOutput> + Send;
}

/// Parse CLI stdout as JSON. Blank or non-JSON output yields `None`.
pub fn parse_json_output(stdout: &str) -> Option<Value> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}

/// The `vt` binary.
#[derive(Debug, Clone)]
pub struct VtCli {
    program: PathBuf,
    timeout: Duration,
    available: Arc<OnceCell<bool>>,
}

impl VtCli {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
            available: Arc::new(OnceCell::new()),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    async fn detect(&self) -> bool {
        let probe = Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();
        let available = match tokio::time::timeout(self.timeout, probe).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                tracing::debug!(program = %self.program.display(), error = %e, "vt cli not found");
                false
            }
            Err(_) => false,
        };
        tracing::info!(program = %self.program.display(), available, "probed vt cli");
        available
    }
}

impl CliRunner for VtCli {
    async fn is_available(&self) -> bool {
        *self.available.get_or_init(|| self.detect()).await
    }

    async fn run(&self, args: &[&str], cwd: Option<&Path>) -> CommandOutput {
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }
        tracing::debug!(?args, cwd = ?cwd, "running vt");

        match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => CommandOutput {
                success: output.status.success(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            },
            Ok(Err(e)) => CommandOutput::failed(format!("failed to execute vt: {e}")),
            Err(_) => CommandOutput::failed(format!(
                "vt {} timed out after {}s",
                args.first().copied().unwrap_or_default(),
                self.timeout.as_secs()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CliRunner, CommandOutput, VtCli, parse_json_output};
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn parses_json_stdout() {
        assert_eq!(parse_json_output(" [1, 2]\n"), Some(json!([1, 2])));
        assert_eq!(parse_json_output("Pushed 3 files"), None);
        assert_eq!(parse_json_output("   "), None);
    }

    #[test]
    fn reason_prefers_stderr() {
        let out = CommandOutput {
            success: false,
            stdout: "partial".into(),
            stderr: " boom \n".into(),
        };
        assert_eq!(out.reason(), "boom");
        assert_eq!(CommandOutput::failed("").reason(), "");
    }

    #[tokio::test]
    async fn missing_binary_is_unavailable_and_never_errors() {
        let cli = VtCli::new("/nonexistent/vtmcp-test-vt", Duration::from_secs(5));
        assert!(!cli.is_available().await);
        let out = cli.run(&["branch", "--json"], None).await;
        assert!(!out.success);
        assert!(out.stderr.contains("failed to execute vt"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn availability_is_probed_once() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("probes.log");
        let script = dir.path().join("vt");
        std::fs::write(
            &script,
            format!("#!/bin/sh\necho probe >> '{}'\nexit 0\n", log.display()),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let cli = VtCli::new(&script, Duration::from_secs(5));
        assert!(cli.is_available().await);
        assert!(cli.clone().is_available().await);
        let probes = std::fs::read_to_string(&log).unwrap();
        assert_eq!(probes.lines().count(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let cli = VtCli::new("/bin/sh", Duration::from_secs(5));
        let out = cli.run(&["-c", "pwd"], Some(dir.path())).await;
        assert!(out.success);
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(
            std::path::Path::new(out.stdout.trim()).canonicalize().unwrap(),
            expected
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_commands_time_out() {
        let cli = VtCli::new("/bin/sh", Duration::from_millis(200));
        let out = cli.run(&["-c", "sleep 5"], None).await;
        assert!(!out.success);
        assert!(out.stderr.contains("timed out"));
    }
}
