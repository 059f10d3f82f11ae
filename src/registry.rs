//! Redaction rule registry.
//!
//! The registry is an *ordered* list of rules. Order is a deliberate,
//! curated property: narrow high-confidence rules (labeled secrets, bearer
//! tokens) run before broad low-confidence rules (generic path matchers), so
//! a broad rule can clean up residue left around an already-redacted secret
//! without swallowing a narrow rule's work.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

/// A single redaction rule.
///
/// `category` is a diagnostic tag only; it never drives control flow.
#[derive(Debug, Clone)]
pub struct Pattern {
    matcher: Regex,
    secret_group: Option<usize>,
    category: String,
}

impl Pattern {
    /// Compile a rule. Returns `None` (with a warning) when the regex does
    /// not compile or the secret group index does not exist in the regex,
    /// so one bad rule cannot disable the rest of the registry.
    pub fn compile(regex: &str, secret_group: Option<usize>, category: &str) -> Option<Self> {
        let matcher = match Regex::new(regex) {
            Ok(m) => m,
            Err(e) => {
                warn!(category = %category, error = %e, "Skipping uncompilable redaction rule");
                return None;
            }
        };
        if let Some(idx) = secret_group {
            // captures_len() counts group 0 (the whole match).
            if idx == 0 || idx >= matcher.captures_len() {
                warn!(
                    category = %category,
                    secret_group = idx,
                    "Skipping redaction rule with out-of-range secret group"
                );
                return None;
            }
        }
        Some(Self {
            matcher,
            secret_group,
            category: category.to_string(),
        })
    }

    pub fn matcher(&self) -> &Regex {
        &self.matcher
    }

    pub fn secret_group(&self) -> Option<usize> {
        self.secret_group
    }

    pub fn category(&self) -> &str {
        &self.category
    }
}

/// Declarative rule used when loading a registry from configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSpec {
    pub regex: String,
    #[serde(default)]
    pub secret_group: Option<usize>,
    pub category: String,
}

/// Ordered, immutable set of redaction rules.
///
/// Constructed once and never mutated afterwards; `scrub` calls read it
/// concurrently without coordination.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    patterns: Vec<Pattern>,
}

impl PatternRegistry {
    /// Build a registry from declarative rules, preserving their order.
    /// Rules that fail to compile are skipped, not fatal.
    pub fn from_rules(rules: &[RuleSpec]) -> Self {
        let patterns = rules
            .iter()
            .filter_map(|r| Pattern::compile(&r.regex, r.secret_group, &r.category))
            .collect();
        Self { patterns }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

struct BuiltinRule {
    regex: &'static str,
    secret_group: Option<usize>,
    category: &'static str,
}

/// Built-in rule corpus, in application order.
///
/// No rule's character classes accept `[` or `]`, so the redaction marker
/// itself can never re-match (scrubbing must stay idempotent).
const BUILTIN_RULES: &[BuiltinRule] = &[
    // Labeled secrets: `token: <value>`, `api_key=<value>`, quoted or bare.
    BuiltinRule {
        regex: r#"(?i)\b(?:api[_-]?key|credential|password|secret|token|auth|key|pwd)\s*[:=]\s*["']?([A-Za-z0-9._/+=-]{16,})["']?"#,
        secret_group: Some(1),
        category: "api-key",
    },
    // Bearer tokens in Authorization-style headers.
    BuiltinRule {
        regex: r"(?i)\bBearer\s+([A-Za-z0-9._/+=-]{16,})",
        secret_group: Some(1),
        category: "bearer-token",
    },
    // IPv4 literals, internal or external.
    BuiltinRule {
        regex: r"\b(?:\d{1,3}\.){3}\d{1,3}\b",
        secret_group: None,
        category: "ipv4",
    },
    // Windows-style absolute paths.
    BuiltinRule {
        regex: r"\b[A-Za-z]:\\[\w\\._-]+",
        secret_group: None,
        category: "fs-path",
    },
    // Unix home-directory prefixes (leak the local username).
    BuiltinRule {
        regex: r"/(?:home|Users)/[\w.-]+",
        secret_group: None,
        category: "fs-path",
    },
    // Formulation measurements after a domain keyword: `concentration: 12.5%`.
    BuiltinRule {
        regex: r"(?i)\b(?:formula|ingredient|component|accords?|ratio|percentage|concentration|top|heart|base|notes?|fragrance)\s*[:=]\s*(\d[\d.]*(?:\s*(?:%|g|ml|pts?))?)",
        secret_group: Some(1),
        category: "formula-ratio",
    },
    // CAS registry numbers (chemical identities).
    BuiltinRule {
        regex: r"\b\d{2,7}-\d{2}-\d\b",
        secret_group: None,
        category: "cas-number",
    },
    // Trial / batch / recipe identifiers: `batch #A-113`.
    BuiltinRule {
        regex: r"(?i)\b(?:trial|batch|recipe|formula)\s*#\s*([A-Za-z0-9_-]+)",
        secret_group: Some(1),
        category: "batch-id",
    },
];

static BUILTIN_REGISTRY: Lazy<Arc<PatternRegistry>> = Lazy::new(|| {
    let patterns = BUILTIN_RULES
        .iter()
        .map(|r| {
            Pattern::compile(r.regex, r.secret_group, r.category)
                .unwrap_or_else(|| panic!("built-in rule '{}' must compile", r.category))
        })
        .collect();
    Arc::new(PatternRegistry { patterns })
});

/// Process-wide built-in registry, initialized on first use.
pub fn builtin_registry() -> Arc<PatternRegistry> {
    Arc::clone(&BUILTIN_REGISTRY)
}
