//! Output scrubbing.
//!
//! Applies every registry rule in order to the progressively updated text:
//! each rule's output feeds the next rule's input, so a later broad rule can
//! clean residue around a secret an earlier narrow rule already redacted.
//! Scrubbing never fails — a defect in the sanitizer must not take down
//! output delivery — and it is idempotent: the replacement marker is shaped
//! so no registered rule can ever match it.

use crate::registry::{builtin_registry, PatternRegistry};
use regex::Captures;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Canonical replacement for redacted content.
pub const REDACTION_MARKER: &str = "[REDACTED]";

/// Inputs above this size are still scrubbed in full (matching is linear
/// time per rule), but are worth flagging to operators.
const LARGE_INPUT_WARN_BYTES: usize = 1024 * 1024;

/// Per-category match counts from a single scrub pass. Diagnostic only.
pub type ScrubStats = BTreeMap<String, usize>;

/// Applies the pattern registry to arbitrary text blobs.
///
/// Holds only a shared handle to the immutable registry; every call is a
/// pure function of the registry and its input, safe for concurrent use.
#[derive(Debug, Clone)]
pub struct Redactor {
    registry: Arc<PatternRegistry>,
}

impl Redactor {
    pub fn new(registry: Arc<PatternRegistry>) -> Self {
        Self { registry }
    }

    /// Redactor over the built-in rule corpus.
    pub fn builtin() -> Self {
        Self::new(builtin_registry())
    }

    /// Scrub sensitive content from `text`. Never fails; on any per-rule
    /// anomaly the rule is bypassed for this input and scrubbing continues.
    pub fn scrub(&self, text: &str) -> String {
        self.scrub_with_stats(text).0
    }

    /// Like [`scrub`](Self::scrub), but also reports how many matches each
    /// rule category produced, for audit diagnostics.
    pub fn scrub_with_stats(&self, text: &str) -> (String, ScrubStats) {
        if text.len() > LARGE_INPUT_WARN_BYTES {
            warn!(bytes = text.len(), "Scrubbing unusually large output blob");
        }

        let mut scrubbed = text.to_owned();
        let mut stats = ScrubStats::new();
        for pattern in self.registry.iter() {
            let mut matches = 0usize;
            let replaced = pattern.matcher().replace_all(&scrubbed, |caps: &Captures| {
                matches += 1;
                redact_match(caps, pattern.secret_group())
            });
            if let Cow::Owned(s) = replaced {
                scrubbed = s;
            }
            if matches > 0 {
                *stats.entry(pattern.category().to_string()).or_insert(0) += matches;
            }
        }
        (scrubbed, stats)
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Build the replacement for one match.
///
/// When the rule names a secret group and that group participated, only the
/// group's span inside the match is replaced, preserving the surrounding
/// label text (`token: [REDACTED]` rather than `[REDACTED]`). A group that
/// exists in the rule but did not participate in this particular match
/// over-redacts the whole span rather than leaking it; a group index the
/// regex does not have at all leaves the match untouched (rule bypassed).
fn redact_match(caps: &Captures, secret_group: Option<usize>) -> String {
    let whole = match caps.get(0) {
        Some(m) => m,
        None => return REDACTION_MARKER.to_string(),
    };
    let idx = match secret_group {
        None => return REDACTION_MARKER.to_string(),
        Some(idx) => idx,
    };
    if idx >= caps.len() {
        return whole.as_str().to_string();
    }
    match caps.get(idx) {
        Some(secret) => {
            let text = whole.as_str();
            let offset = whole.start();
            let mut out = String::with_capacity(text.len());
            out.push_str(&text[..secret.start() - offset]);
            out.push_str(REDACTION_MARKER);
            out.push_str(&text[secret.end() - offset..]);
            out
        }
        None => REDACTION_MARKER.to_string(),
    }
}
