//! External script execution.
//!
//! The builder and pipeline endpoints shell out to operator maintained
//! scripts. [`ScriptRunner`] is the seam between the service and the
//! operating system so the orchestration in [`BuildPipeline`] can be tested
//! without spawning processes.

use std::{
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{error, info, warn};

use crate::{
    config::ScriptsConfig,
    errors::{ScriptError, ScriptResult},
};

#[cfg(test)]
#[path = "scripts_tests.rs"]
mod tests;

/// A single script invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptInvocation {
    /// Interpreter or executable to start
    pub program: String,

    pub args: Vec<String>,

    /// Working directory; the caller's when `None`
    pub working_dir: Option<PathBuf>,

    pub timeout: Option<Duration>,
}

impl ScriptInvocation {
    /// Run `script` with `interpreter`, from the script's own directory.
    pub fn interpreted(interpreter: &str, script: &Path) -> Self {
        Self {
            program: interpreter.to_string(),
            args: vec![script.display().to_string()],
            working_dir: script.parent().map(Path::to_path_buf),
            timeout: None,
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Captured result of a finished script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptOutput {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,

    pub stdout: String,

    pub stderr: String,
}

impl ScriptOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Log the captured streams.
    pub fn log(&self, label: &str) {
        info!(script = label, exit_code = ?self.exit_code, "Script finished");
        if !self.stdout.is_empty() {
            info!(script = label, "stdout: {}", self.stdout);
        }
        if !self.stderr.is_empty() {
            warn!(script = label, "stderr: {}", self.stderr);
        }
    }
}

/// Runs external scripts.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    /// Run the invocation to completion and capture its output.
    async fn run(&self, invocation: &ScriptInvocation) -> ScriptResult<ScriptOutput>;
}

/// [`ScriptRunner`] backed by `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct ShellScriptRunner;

impl ShellScriptRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ScriptRunner for ShellScriptRunner {
    async fn run(&self, invocation: &ScriptInvocation) -> ScriptResult<ScriptOutput> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &invocation.working_dir {
            command.current_dir(dir);
        }

        info!(
            program = %invocation.program,
            args = ?invocation.args,
            "Starting script"
        );

        let child = command.spawn().map_err(|source| ScriptError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;

        let output = match invocation.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| ScriptError::TimedOut {
                    program: invocation.program.clone(),
                    seconds: limit.as_secs(),
                })?,
            None => child.wait_with_output().await,
        }
        .map_err(|source| ScriptError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;

        Ok(ScriptOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Outcome of one [`BuildPipeline::run`].
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub build: Option<ScriptOutput>,

    /// Present only when the build succeeded and the archive script ran
    pub archive: Option<ScriptOutput>,
}

impl PipelineReport {
    pub fn succeeded(&self) -> bool {
        self.build.as_ref().is_some_and(ScriptOutput::success)
            && self.archive.as_ref().is_some_and(ScriptOutput::success)
    }
}

/// Builds the update package and archives it on success.
#[derive(Debug, Clone)]
pub struct BuildPipeline {
    scripts: ScriptsConfig,
}

impl BuildPipeline {
    pub fn new(scripts: ScriptsConfig) -> Self {
        Self { scripts }
    }

    /// Fails fast when the build script is missing.
    pub fn check_ready(&self) -> ScriptResult<()> {
        if self.scripts.build_script.exists() {
            Ok(())
        } else {
            Err(ScriptError::NotFound {
                path: self.scripts.build_script.clone(),
            })
        }
    }

    fn build_invocation(&self) -> ScriptInvocation {
        ScriptInvocation::interpreted(&self.scripts.shell, &self.scripts.build_script)
            .with_timeout(self.scripts.build_timeout())
    }

    fn archive_invocation(&self) -> ScriptInvocation {
        ScriptInvocation::interpreted(&self.scripts.python, &self.scripts.archive_script)
            .with_timeout(self.scripts.archive_timeout())
    }

    /// Run the build script, then the archive script if the build exited
    /// with status 0.
    ///
    /// Failures are logged and reflected in the report; this never returns
    /// an error so it can run detached from any request.
    pub async fn run(&self, runner: &dyn ScriptRunner) -> PipelineReport {
        let mut report = PipelineReport::default();

        let build = match runner.run(&self.build_invocation()).await {
            Ok(output) => output,
            Err(e) => {
                error!("Build pipeline failed: {}", e);
                return report;
            }
        };
        build.log("build");
        let build_ok = build.success();
        report.build = Some(build);

        if !build_ok {
            error!(exit_code = ?report.build.as_ref().and_then(|b| b.exit_code), "Build failed");
            return report;
        }

        if !self.scripts.archive_script.exists() {
            error!(
                path = %self.scripts.archive_script.display(),
                "Archive script not found"
            );
            return report;
        }

        match runner.run(&self.archive_invocation()).await {
            Ok(output) => {
                output.log("archive");
                if !output.success() {
                    error!(exit_code = ?output.exit_code, "Archive script failed");
                }
                report.archive = Some(output);
            }
            Err(e) => error!("Archive script failed: {}", e),
        }

        report
    }
}

/// Invocation of the command pipeline launcher.
pub fn launcher_invocation(scripts: &ScriptsConfig) -> ScriptInvocation {
    ScriptInvocation::interpreted(&scripts.shell, &scripts.launcher_script)
        .with_args(scripts.launcher_args.iter().cloned())
}
