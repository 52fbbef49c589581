//! Error classification
//!
//! Maps raw failures to a severity and a run-level action. Classification
//! is an ordered table of named predicates evaluated top-to-bottom over the
//! lowercased error message plus the pipeline stage it occurred in; the
//! first match wins. Predicates are pure functions so each rule is testable
//! in isolation.

use crate::HarvestError;

/// How severe a failure is for the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The run cannot continue
    Fatal,
    /// Worth retrying with backoff
    Transient,
    /// Log, drop the smallest unit of work, move on
    Ignorable,
}

/// What the enclosing loop should do about a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop the whole run (partial data is still exported)
    Terminate,
    /// Retry the current step via the rate scheduler
    Retry,
    /// Proceed with the remaining work
    Continue,
}

/// Pipeline stage an error occurred in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Startup,
    Navigation,
    Settle,
    Extraction,
    Normalization,
    Pagination,
    Persistence,
}

/// Context handed to the classifier alongside the error
#[derive(Debug, Clone, Copy)]
pub struct ErrorContext {
    pub stage: PipelineStage,
}

impl ErrorContext {
    pub fn new(stage: PipelineStage) -> Self {
        Self { stage }
    }
}

/// Phrases that indicate an anti-bot challenge rather than a plain failure
const BOT_INDICATORS: &[&str] = &[
    "captcha",
    "challenge",
    "cloudflare",
    "access denied",
    "blocked",
    "bot detection",
    "security check",
];

/// One classification rule: a named pure predicate and its severity
struct Rule {
    name: &'static str,
    severity: Severity,
    matches: fn(&str, &ErrorContext) -> bool,
}

/// Ordered rule table; evaluation stops at the first match
///
/// Fatal rules come first, then transient, so a message matching both (for
/// example a blocked response that also timed out) terminates the run.
const RULES: &[Rule] = &[
    Rule {
        name: "malformed-target",
        severity: Severity::Fatal,
        matches: |msg, _| msg.contains("invalid target url") || msg.contains("relative url without a base"),
    },
    Rule {
        name: "driver-start-failure",
        severity: Severity::Fatal,
        matches: |msg, ctx| {
            matches!(ctx.stage, PipelineStage::Startup)
                && (msg.contains("failed to start") || msg.contains("browser driver error"))
        },
    },
    Rule {
        name: "bot-detection",
        severity: Severity::Fatal,
        matches: |msg, _| is_bot_detection(msg),
    },
    Rule {
        name: "fs-permission-denied",
        severity: Severity::Fatal,
        matches: |msg, _| msg.contains("permission denied"),
    },
    Rule {
        name: "missing-output-directory",
        severity: Severity::Fatal,
        matches: |msg, ctx| {
            matches!(ctx.stage, PipelineStage::Persistence)
                && msg.contains("no such file or directory")
        },
    },
    Rule {
        name: "timeout",
        severity: Severity::Transient,
        matches: |msg, _| msg.contains("timed out") || msg.contains("timeout"),
    },
    Rule {
        name: "server-error",
        severity: Severity::Transient,
        matches: |msg, _| {
            msg.contains("http 5")
                || msg.contains("500")
                || msg.contains("502")
                || msg.contains("503")
                || msg.contains("504")
                || msg.contains("internal server error")
                || msg.contains("bad gateway")
                || msg.contains("service unavailable")
        },
    },
    Rule {
        name: "connection-failure",
        severity: Severity::Transient,
        matches: |msg, _| {
            msg.contains("connection refused")
                || msg.contains("connection reset")
                || msg.contains("connection closed")
        },
    },
    Rule {
        name: "rate-limited",
        severity: Severity::Transient,
        matches: |msg, _| {
            msg.contains("rate limit") || msg.contains("429") || msg.contains("too many requests")
        },
    },
    Rule {
        name: "network-failure",
        severity: Severity::Transient,
        matches: |msg, _| msg.contains("network") || msg.contains("dns"),
    },
];

/// Classifies an error into a severity
///
/// Anything no rule matches is ignorable: a single record's missing field
/// or a failed optional resource should never cost more than its own unit
/// of work.
pub fn classify(error: &HarvestError, context: &ErrorContext) -> Severity {
    let message = error.to_string().to_lowercase();

    for rule in RULES {
        if (rule.matches)(&message, context) {
            tracing::trace!("Error matched rule '{}': {}", rule.name, message);
            return rule.severity;
        }
    }

    Severity::Ignorable
}

/// Maps an error to the action the enclosing loop should take
///
/// One-to-one with `classify`.
pub fn act(error: &HarvestError, context: &ErrorContext) -> Action {
    match classify(error, context) {
        Severity::Fatal => Action::Terminate,
        Severity::Transient => Action::Retry,
        Severity::Ignorable => Action::Continue,
    }
}

/// Returns true when a message carries an anti-bot indicator
///
/// Exposed separately so the CLI can print a distinct terminal message for
/// challenge pages instead of a generic fatal error.
pub fn is_bot_detection(message: &str) -> bool {
    let message = message.to_lowercase();
    BOT_INDICATORS
        .iter()
        .any(|indicator| message.contains(indicator))
}
