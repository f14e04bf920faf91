//! Issue collection for the parse → translate pipeline.
//!
//! Recoverable input oddities (unsupported layer types, malformed keyframes,
//! unknown fields) are recorded here and travel alongside the document.
//! Collection is one-way: nothing on the control path reads the collector.

use std::fmt;

// ─── Issue types ─────────────────────────────────────────────────────────

/// Severity of a reported issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    /// The construct was dropped entirely.
    Error,
    /// The construct was approximated or partially translated.
    Warning,
    /// Informational — no visible effect on the output.
    Info,
}

/// A single issue discovered while reading or lowering a document.
#[derive(Debug, Clone)]
pub struct Issue {
    /// Stable short identifier (e.g. "LP0010").
    pub code: &'static str,
    /// Human-readable description.
    pub description: String,
    /// Severity level.
    pub severity: IssueSeverity,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.description)
    }
}

// ─── Collector ───────────────────────────────────────────────────────────

/// Ordered, collect-only sink for issues.
#[derive(Debug, Default)]
pub struct Issues {
    items: Vec<Issue>,
}

impl Issues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, code: &'static str, description: impl Into<String>) {
        self.push(code, description, IssueSeverity::Error);
    }

    pub fn warning(&mut self, code: &'static str, description: impl Into<String>) {
        self.push(code, description, IssueSeverity::Warning);
    }

    pub fn info(&mut self, code: &'static str, description: impl Into<String>) {
        self.push(code, description, IssueSeverity::Info);
    }

    fn push(&mut self, code: &'static str, description: impl Into<String>, severity: IssueSeverity) {
        let description = description.into();
        log::debug!("issue {code}: {description}");
        self.items.push(Issue {
            code,
            description,
            severity,
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Issue> {
        self.items.iter()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────
