//! Environment deny-list evaluation.
//!
//! Subprocess launches must not inherit variables that enable code injection
//! (dynamic-linker preload, runtime path hijack, shell startup hooks) or
//! credential exfiltration (cloud keys, bot tokens, database URLs). The
//! guard checks variable *names* only, case-insensitively; values are never
//! inspected. Validation fails fast on the first violation because the
//! caller's intent is to prevent any launch under violation, not to
//! enumerate every problem.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// How a variable name matched a deny rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchKind {
    ExactName,
    Prefix,
}

/// A forbidden environment variable was found; the launch must be aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityViolation {
    /// Variable name as supplied by the caller (case preserved).
    pub variable_name: String,
    pub match_kind: MatchKind,
    /// The deny rule that fired (uppercased name or prefix).
    pub matched_rule: String,
}

impl std::fmt::Display for SecurityViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.match_kind {
            MatchKind::ExactName => write!(
                f,
                "environment variable '{}' is forbidden on the host (deny rule '{}')",
                self.variable_name, self.matched_rule
            ),
            MatchKind::Prefix => write!(
                f,
                "environment variable '{}' matches forbidden prefix '{}'",
                self.variable_name, self.matched_rule
            ),
        }
    }
}

impl std::error::Error for SecurityViolation {}

/// A single deny-list entry.
#[derive(Debug, Clone, Deserialize)]
pub struct DenyRule {
    pub kind: MatchKind,
    /// Name or prefix; compared against the uppercased variable name.
    pub value: String,
}

/// Variables that enable library preload / runtime injection on the host.
const DENY_EXACT: &[&str] = &[
    // Dynamic linker / runtime injection
    "LD_PRELOAD",
    "LD_LIBRARY_PATH",
    "LD_AUDIT",
    "DYLD_INSERT_LIBRARIES",
    "DYLD_LIBRARY_PATH",
    "GCONV_PATH",
    // Language runtime hijack
    "NODE_OPTIONS",
    "NODE_PATH",
    "PYTHONPATH",
    "PYTHONHOME",
    "RUBYLIB",
    "PERL5LIB",
    // Shell startup hijack
    "BASH_ENV",
    "ENV",
    "IFS",
    // TLS key logging
    "SSLKEYLOGFILE",
    // Cloud / API credentials
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_TOKEN",
    "GOOGLE_APPLICATION_CREDENTIALS",
    "AZURE_STORAGE_KEY",
    "AZURE_STORAGE_ACCOUNT",
    "GITHUB_TOKEN",
    "GITHUB_PAT",
    // Application secrets
    "GATEWAY_TOKEN",
    "GATEWAY_PASSWORD",
    "HOOKS_TOKEN",
    "DISCORD_BOT_TOKEN",
    "TELEGRAM_BOT_TOKEN",
    "SLACK_BOT_TOKEN",
    "SLACK_APP_TOKEN",
    // Database credentials
    "DATABASE_URL",
    "POSTGRES_PASSWORD",
    "MYSQL_PWD",
];

const DENY_PREFIXES: &[&str] = &["DYLD_", "LD_", "AWS_"];

/// Immutable deny-list evaluator for candidate process environments.
///
/// Exact rules are checked before prefix rules so the diagnostic names the
/// most specific rule (`LD_PRELOAD` reports an exact match even though the
/// `LD_` prefix also covers it).
#[derive(Debug)]
pub struct EnvGuard {
    exact: HashSet<String>,
    prefixes: Vec<String>,
}

impl EnvGuard {
    /// Build a guard from explicit rules. Rule values are uppercased so
    /// comparisons stay case-insensitive regardless of how rules were
    /// written.
    pub fn new(rules: &[DenyRule]) -> Self {
        let mut exact = HashSet::new();
        let mut prefixes = Vec::new();
        for rule in rules {
            let value = rule.value.to_uppercase();
            match rule.kind {
                MatchKind::ExactName => {
                    exact.insert(value);
                }
                MatchKind::Prefix => prefixes.push(value),
            }
        }
        Self { exact, prefixes }
    }

    fn builtin_rules() -> Self {
        Self {
            exact: DENY_EXACT.iter().map(|s| s.to_string()).collect(),
            prefixes: DENY_PREFIXES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Validate a candidate environment mapping. Returns the first
    /// violation found; `Ok(())` means the launch may proceed.
    pub fn validate(&self, env: &HashMap<String, String>) -> Result<(), SecurityViolation> {
        for key in env.keys() {
            self.check_name(key)?;
        }
        Ok(())
    }

    /// Check a single variable name against the deny list.
    pub fn check_name(&self, name: &str) -> Result<(), SecurityViolation> {
        let upper = name.to_uppercase();
        if self.exact.contains(&upper) {
            return Err(SecurityViolation {
                variable_name: name.to_string(),
                match_kind: MatchKind::ExactName,
                matched_rule: upper,
            });
        }
        if let Some(prefix) = self.prefixes.iter().find(|p| upper.starts_with(p.as_str())) {
            return Err(SecurityViolation {
                variable_name: name.to_string(),
                match_kind: MatchKind::Prefix,
                matched_rule: prefix.clone(),
            });
        }
        Ok(())
    }
}

static BUILTIN_GUARD: Lazy<Arc<EnvGuard>> = Lazy::new(|| Arc::new(EnvGuard::builtin_rules()));

/// Process-wide built-in deny list, initialized on first use.
pub fn builtin_guard() -> Arc<EnvGuard> {
    Arc::clone(&BUILTIN_GUARD)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_ld_preload_exact_violation() {
        let guard = builtin_guard();
        let err = guard
            .validate(&env(&[("LD_PRELOAD", "/tmp/x.so")]))
            .unwrap_err();
        assert_eq!(err.match_kind, MatchKind::ExactName);
        assert_eq!(err.variable_name, "LD_PRELOAD");
        assert_eq!(err.matched_rule, "LD_PRELOAD");
    }

    #[test]
    fn test_aws_prefix_violation() {
        let guard = builtin_guard();
        let err = guard.validate(&env(&[("AWS_FOO", "bar")])).unwrap_err();
        assert_eq!(err.match_kind, MatchKind::Prefix);
        assert_eq!(err.variable_name, "AWS_FOO");
        assert_eq!(err.matched_rule, "AWS_");
    }

    #[test]
    fn test_benign_environment_passes() {
        let guard = builtin_guard();
        assert!(guard
            .validate(&env(&[
                ("PATH", "/usr/bin"),
                ("HOME", "/home/user"),
                ("TERM", "xterm-256color"),
                ("LANG", "en_US.UTF-8"),
            ]))
            .is_ok());
    }

    #[test]
    fn test_case_insensitive_match() {
        let guard = builtin_guard();
        let err = guard.validate(&env(&[("ld_preload", "x")])).unwrap_err();
        assert_eq!(err.match_kind, MatchKind::ExactName);
        // Original casing is preserved in the diagnostic.
        assert_eq!(err.variable_name, "ld_preload");
        assert_eq!(err.matched_rule, "LD_PRELOAD");
    }

    #[test]
    fn test_empty_environment_passes() {
        let guard = builtin_guard();
        assert!(guard.validate(&HashMap::new()).is_ok());
    }

    #[test]
    fn test_dyld_prefix_violation() {
        let guard = builtin_guard();
        let err = guard
            .validate(&env(&[("DYLD_FRAMEWORK_PATH", "/x")]))
            .unwrap_err();
        assert_eq!(err.match_kind, MatchKind::Prefix);
        assert_eq!(err.matched_rule, "DYLD_");
    }

    #[test]
    fn test_validation_is_deterministic() {
        let guard = builtin_guard();
        let input = env(&[("NODE_OPTIONS", "--require evil.js")]);
        let first = guard.validate(&input).unwrap_err();
        let second = guard.validate(&input).unwrap_err();
        assert_eq!(first, second);
    }

    #[test]
    fn test_display_names_variable_and_rule() {
        let guard = builtin_guard();
        let err = guard.check_name("aws_region").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("aws_region"));
        assert!(msg.contains("AWS_"));
    }

    #[test]
    fn test_custom_rules_uppercased() {
        let guard = EnvGuard::new(&[
            DenyRule {
                kind: MatchKind::ExactName,
                value: "my_secret".to_string(),
            },
            DenyRule {
                kind: MatchKind::Prefix,
                value: "internal_".to_string(),
            },
        ]);
        assert!(guard.check_name("MY_SECRET").is_err());
        assert!(guard.check_name("Internal_Token").is_err());
        assert!(guard.check_name("MY_OTHER").is_ok());
    }

    #[test]
    fn test_name_only_inspection() {
        // A dangerous-looking value under a benign name is allowed; the
        // guard checks names, never values.
        let guard = builtin_guard();
        assert!(guard
            .validate(&env(&[("MESSAGE", "LD_PRELOAD=/tmp/x.so")]))
            .is_ok());
    }
}
