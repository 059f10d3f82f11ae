//! Guarded subprocess execution.
//!
//! The integration seam tool implementations call instead of spawning
//! directly: the candidate environment is validated against the deny list
//! before launch, the child runs with a cleared environment plus the
//! validated mapping, and captured output is scrubbed before it can reach a
//! transcript. Every outcome is audit-logged.

use crate::audit::{audit_logger, AuditLogger};
use crate::env_guard::{builtin_guard, EnvGuard, SecurityViolation};
use crate::redactor::Redactor;
use std::collections::HashMap;
use std::process::Output;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Command;

/// Result of executing a command, with output already scrubbed.
#[derive(Debug)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

impl CommandResult {
    fn from_output(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
        }
    }

    /// Get combined output (stderr + stdout).
    pub fn combined_output(&self) -> String {
        let mut result = String::new();
        if !self.stderr.is_empty() {
            result.push_str(&self.stderr);
        }
        if !self.stdout.is_empty() {
            if !result.is_empty() {
                result.push('\n');
            }
            result.push_str(&self.stdout);
        }
        result
    }
}

/// Why a guarded launch did not produce a result.
#[derive(Debug)]
pub enum ExecError {
    /// Environment validation failed; the process was never started.
    Rejected(SecurityViolation),
    /// The process could not be spawned or awaited.
    Spawn {
        program: String,
        source: std::io::Error,
    },
    /// The process exceeded its deadline.
    Timeout { program: String, timeout_secs: u64 },
}

impl std::fmt::Display for ExecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecError::Rejected(violation) => {
                write!(f, "launch rejected: {}", violation)
            }
            ExecError::Spawn { program, source } => {
                write!(f, "failed to execute '{}': {}", program, source)
            }
            ExecError::Timeout {
                program,
                timeout_secs,
            } => {
                write!(f, "'{}' timed out after {} seconds", program, timeout_secs)
            }
        }
    }
}

impl std::error::Error for ExecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExecError::Rejected(violation) => Some(violation),
            ExecError::Spawn { source, .. } => Some(source),
            ExecError::Timeout { .. } => None,
        }
    }
}

/// Executes subprocesses behind the environment guard and the redactor.
pub struct GuardedExecutor {
    guard: Arc<EnvGuard>,
    redactor: Redactor,
    audit: Arc<AuditLogger>,
}

impl GuardedExecutor {
    pub fn new(guard: Arc<EnvGuard>, redactor: Redactor, audit: Arc<AuditLogger>) -> Self {
        Self {
            guard,
            redactor,
            audit,
        }
    }

    /// Executor over the built-in deny list and pattern corpus.
    pub fn builtin() -> Self {
        Self::new(builtin_guard(), Redactor::builtin(), audit_logger())
    }

    /// Validate `env`, then run `program` with a cleared environment plus
    /// the validated mapping, scrubbing captured output before returning.
    pub async fn run(
        &self,
        program: &str,
        args: &[&str],
        env: &HashMap<String, String>,
        timeout_secs: u64,
    ) -> Result<CommandResult, ExecError> {
        if let Err(violation) = self.guard.validate(env) {
            self.audit.log_env_rejected(&violation);
            return Err(ExecError::Rejected(violation));
        }

        let mut command = Command::new(program);
        command.args(args).env_clear().envs(env).kill_on_drop(true);

        let start = Instant::now();
        let output = match tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            command.output(),
        )
        .await
        {
            Err(_) => {
                self.audit.log_timeout(program, timeout_secs);
                return Err(ExecError::Timeout {
                    program: program.to_string(),
                    timeout_secs,
                });
            }
            Ok(Err(e)) => {
                self.audit
                    .log_launch(program, false, Some(e.to_string()), ms_since(start));
                return Err(ExecError::Spawn {
                    program: program.to_string(),
                    source: e,
                });
            }
            Ok(Ok(output)) => output,
        };
        let duration_ms = ms_since(start);

        let raw = CommandResult::from_output(output);
        let (stdout, mut matches) = self.redactor.scrub_with_stats(&raw.stdout);
        let (stderr, stderr_matches) = self.redactor.scrub_with_stats(&raw.stderr);
        for (category, count) in stderr_matches {
            *matches.entry(category).or_insert(0) += count;
        }

        self.audit
            .log_scrub(program, raw.stdout.len() + raw.stderr.len(), &matches);
        self.audit.log_launch(program, raw.success, None, duration_ms);

        Ok(CommandResult {
            stdout,
            stderr,
            success: raw.success,
        })
    }
}

impl Default for GuardedExecutor {
    fn default() -> Self {
        Self::builtin()
    }
}

fn ms_since(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
