//! Diagnostics shared by the normalizers, the roll-forward deriver and the
//! ledger validator.
//!
//! Every stage of the pipeline prefers partial results over aborting, so
//! problems are collected here instead of being returned as `Err`:
//!
//! - Severity levels (Warning, Error)
//! - Categories for grouping issues (`layout`, `schema`, `duplicate`, ...)
//! - Optional entity references (e.g. `"iso/2024/PJM"`, `"MISO"`)
//! - Optional line numbers for ledger rows
//!
//! # Example
//!
//! ```
//! use esr_core::diagnostics::Diagnostics;
//!
//! let mut diag = Diagnostics::new();
//! diag.add_warning("source", "wholesale_prices.csv not found");
//! diag.add_error_at_line("enum", "Invalid color_group 'green'", 7);
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert_eq!(diag.error_count(), 1);
//! ```

use serde::Serialize;

/// Severity level for diagnostic issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Unusual but the run continued (e.g. fallback value applied)
    Warning,
    /// An invariant was broken or an element could not be produced
    Error,
}

/// A single diagnostic issue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// Category for grouping (e.g. "columns", "duplicate", "cross-field")
    pub category: String,
    pub message: String,
    /// File line of the offending ledger row
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Entity reference (e.g. "state/2025/TX")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl DiagnosticIssue {
    pub fn new(
        severity: Severity,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
            line: None,
            entity: None,
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(line) = self.line {
            write!(f, "Line {}", line)?;
            if let Some(entity) = &self.entity {
                write!(f, " ({})", entity)?;
            }
            return write!(f, ": {}", self.message);
        }

        write!(f, "[{}] {}", self.category, self.message)?;
        if let Some(entity) = &self.entity {
            write!(f, " ({})", entity)?;
        }
        Ok(())
    }
}

/// Collection of diagnostic issues for one operation
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw issue directly
    pub fn add(&mut self, issue: DiagnosticIssue) {
        self.issues.push(issue);
    }

    // =========================================================================
    // Warning Methods
    // =========================================================================

    pub fn add_warning(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message));
    }

    pub fn add_warning_at_line(&mut self, category: &str, message: &str, line: usize) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message).with_line(line));
    }

    pub fn add_warning_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message).with_entity(entity));
    }

    // =========================================================================
    // Error Methods
    // =========================================================================

    pub fn add_error(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message));
    }

    pub fn add_error_at_line(&mut self, category: &str, message: &str, line: usize) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message).with_line(line));
    }

    /// Add an error located by both ledger line and row key
    pub fn add_row_error(&mut self, category: &str, message: &str, line: usize, entity: &str) {
        self.issues.push(
            DiagnosticIssue::new(Severity::Error, category, message)
                .with_line(line)
                .with_entity(entity),
        );
    }

    // =========================================================================
    // Query Methods
    // =========================================================================

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn issues_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.category == category)
    }

    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }

    /// Merge another diagnostics into this one
    pub fn merge(&mut self, other: Diagnostics) {
        self.issues.extend(other.issues);
    }

    pub fn summary(&self) -> String {
        let plural = |n: usize| if n == 1 { "" } else { "s" };
        match (self.warning_count(), self.error_count()) {
            (0, 0) => "No issues".to_string(),
            (w, 0) => format!("{} warning{}", w, plural(w)),
            (0, e) => format!("{} error{}", e, plural(e)),
            (w, e) => format!("{} warning{}, {} error{}", w, plural(w), e, plural(e)),
        }
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Diagnostics: {}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_summary() {
        let mut diag = Diagnostics::new();
        diag.add_warning("columns", "Extra columns (ignored): [\"notes2\"]");
        diag.add_error_at_line("duplicate", "Duplicate row", 5);
        diag.add_error("columns", "Missing columns");

        assert_eq!(diag.warning_count(), 1);
        assert_eq!(diag.error_count(), 2);
        assert!(diag.has_errors());
        assert_eq!(diag.summary(), "1 warning, 2 errors");
        assert_eq!(diag.issues_by_category("columns").count(), 2);
    }

    #[test]
    fn test_row_issue_display_leads_with_line() {
        let issue = DiagnosticIssue::new(Severity::Error, "enum", "Invalid view 'county'")
            .with_line(12)
            .with_entity("county/2024/X");
        assert_eq!(
            issue.to_string(),
            "Line 12 (county/2024/X): Invalid view 'county'"
        );
    }

    #[test]
    fn test_serialization_skips_missing_locators() {
        let mut diag = Diagnostics::new();
        diag.add_warning("source", "skipped");
        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("\"warning\""));
        assert!(!json.contains("\"line\""));
    }
}
