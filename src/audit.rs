//! Audit logging infrastructure for security events.
//!
//! Structured logging of guard decisions: scrubbed output, rejected
//! environments, sandbox enforcement, subprocess launches. The pure
//! `scrub`/`validate` calls never log; audit events are emitted by the
//! orchestration layer around them.

use crate::env_guard::{MatchKind, SecurityViolation};
use crate::redactor::ScrubStats;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Security levels for audit events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SecurityLevel {
    /// Informational security event (normal operation)
    Info,
    /// Warning - suspicious but allowed
    Warning,
    /// Error - security violation or failure
    Error,
    /// Critical - serious security breach attempt
    Critical,
}

/// Audit event types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum AuditEvent {
    /// Tool output passed through the redactor
    OutputScrubbed {
        source: String,
        bytes_in: usize,
        matches: ScrubStats,
    },

    /// Subprocess launch refused because of a forbidden environment variable
    EnvRejected {
        variable: String,
        match_kind: MatchKind,
        rule: String,
    },

    /// Strict mode forced execution into a sandbox
    SandboxForced { source: String },

    /// Subprocess launch attempt
    SubprocessLaunched {
        program: String,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        duration_ms: u64,
    },

    /// Operation timeout
    OperationTimeout {
        operation: String,
        timeout_secs: u64,
    },
}

/// Audit logger implementation.
#[derive(Clone)]
pub struct AuditLogger {
    // In future, could add structured log output, remote logging, etc.
    _marker: std::marker::PhantomData<()>,
}

impl AuditLogger {
    pub fn new() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }

    /// Log an audit event with security level.
    pub fn log(&self, level: SecurityLevel, event: AuditEvent) {
        let event_json = serde_json::to_string(&event)
            .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize event: {}\"}}", e));

        match level {
            SecurityLevel::Info => {
                info!(
                    security_level = "info",
                    event = %event_json,
                    "Security audit event"
                );
            }
            SecurityLevel::Warning => {
                warn!(
                    security_level = "warning",
                    event = %event_json,
                    "Security audit warning"
                );
            }
            SecurityLevel::Error => {
                error!(
                    security_level = "error",
                    event = %event_json,
                    "Security audit error"
                );
            }
            SecurityLevel::Critical => {
                error!(
                    security_level = "critical",
                    event = %event_json,
                    "CRITICAL security audit event"
                );
            }
        }
    }

    /// Log a scrub pass over tool output. Informational unless something
    /// was actually redacted.
    pub fn log_scrub(&self, source: &str, bytes_in: usize, matches: &ScrubStats) {
        let level = if matches.is_empty() {
            SecurityLevel::Info
        } else {
            SecurityLevel::Warning
        };
        self.log(
            level,
            AuditEvent::OutputScrubbed {
                source: source.to_string(),
                bytes_in,
                matches: matches.clone(),
            },
        );
    }

    /// Log a refused subprocess launch.
    pub fn log_env_rejected(&self, violation: &SecurityViolation) {
        self.log(
            SecurityLevel::Critical,
            AuditEvent::EnvRejected {
                variable: violation.variable_name.clone(),
                match_kind: violation.match_kind,
                rule: violation.matched_rule.clone(),
            },
        );
    }

    /// Log a strict-mode sandbox decision.
    pub fn log_sandbox_forced(&self, source: &str) {
        self.log(
            SecurityLevel::Info,
            AuditEvent::SandboxForced {
                source: source.to_string(),
            },
        );
    }

    /// Log a subprocess launch outcome.
    pub fn log_launch(
        &self,
        program: &str,
        success: bool,
        error: Option<String>,
        duration_ms: u64,
    ) {
        let level = if success {
            SecurityLevel::Info
        } else {
            SecurityLevel::Warning
        };
        self.log(
            level,
            AuditEvent::SubprocessLaunched {
                program: program.to_string(),
                success,
                error,
                duration_ms,
            },
        );
    }

    /// Log an operation timeout.
    pub fn log_timeout(&self, operation: &str, timeout_secs: u64) {
        let event = AuditEvent::OperationTimeout {
            operation: operation.to_string(),
            timeout_secs,
        };

        self.log(SecurityLevel::Warning, event);
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// Global audit logger instance.
static AUDIT_LOGGER: once_cell::sync::Lazy<Arc<AuditLogger>> =
    once_cell::sync::Lazy::new(|| Arc::new(AuditLogger::new()));

/// Get global audit logger.
pub fn audit_logger() -> Arc<AuditLogger> {
    Arc::clone(&AUDIT_LOGGER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env_guard::builtin_guard;

    #[test]
    fn test_audit_logger_creation() {
        let logger = AuditLogger::new();
        logger.log_launch("echo", true, None, 12);
        logger.log_timeout("slow-tool", 30);
    }

    #[test]
    fn test_global_audit_logger() {
        let logger = audit_logger();
        let mut stats = ScrubStats::new();
        stats.insert("ipv4".to_string(), 2);
        logger.log_scrub("bash", 512, &stats);
        logger.log_sandbox_forced("session-start");
    }

    #[test]
    fn test_env_rejected_event_serializes() {
        let violation = builtin_guard().check_name("LD_PRELOAD").unwrap_err();
        let event = AuditEvent::EnvRejected {
            variable: violation.variable_name.clone(),
            match_kind: violation.match_kind,
            rule: violation.matched_rule.clone(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("EnvRejected"));
        assert!(json.contains("LD_PRELOAD"));
        audit_logger().log_env_rejected(&violation);
    }
}
