//! Output-sanitization and environment-validation guard for agent tool
//! execution.
//!
//! This crate sits between a tool-execution layer and both the user-facing
//! transcript and the host operating system:
//!
//! - [`Redactor`] strips secrets, credentials, internal paths, and
//!   proprietary formulation data from text before it leaves the process
//!   boundary.
//! - [`EnvGuard`] refuses subprocess launches whose environment carries
//!   variables known to enable code injection (`LD_PRELOAD` and friends) or
//!   credential exfiltration (cloud keys, bot tokens).
//! - [`policy::should_force_sandbox`] projects the host configuration's
//!   strict-mode flag for the orchestrator.
//!
//! # Modules
//!
//! - [`registry`] - Ordered, immutable redaction rule registry
//! - [`redactor`] - Capture-aware text scrubbing
//! - [`env_guard`] - Environment deny-list evaluation
//! - [`policy`] - Host security policy projection
//! - [`audit`] - Security event logging
//! - [`exec`] - Guarded subprocess executor tying the pieces together
//!
//! # Concurrency
//!
//! `scrub` and `validate` are pure functions over process-wide configuration
//! that is initialized once (behind `Lazy`) and never mutated; they acquire
//! no locks, perform no I/O, and are safe to call from arbitrarily many
//! parallel callers.
//!
//! # Examples
//!
//! ```
//! use outguard::{builtin_guard, Redactor};
//! use std::collections::HashMap;
//!
//! let redactor = Redactor::builtin();
//! assert_eq!(redactor.scrub("token: abcdef1234567890xyz"), "token: [REDACTED]");
//!
//! let guard = builtin_guard();
//! let env = HashMap::from([("LD_PRELOAD".to_string(), "/tmp/x.so".to_string())]);
//! assert!(guard.validate(&env).is_err());
//! ```

pub mod audit;
pub mod env_guard;
pub mod exec;
pub mod policy;
pub mod redactor;
pub mod registry;

pub use audit::{audit_logger, AuditLogger, SecurityLevel};
pub use env_guard::{builtin_guard, DenyRule, EnvGuard, MatchKind, SecurityViolation};
pub use exec::{CommandResult, ExecError, GuardedExecutor};
pub use policy::{should_force_sandbox, GuardConfig};
pub use redactor::{Redactor, ScrubStats, REDACTION_MARKER};
pub use registry::{builtin_registry, Pattern, PatternRegistry, RuleSpec};
