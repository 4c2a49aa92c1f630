//! Diagnostics
//!
//! Collects violations found while validating a model. The validator never
//! stops at the first defect: every item lands here, tagged with the entity
//! it concerns, and the caller receives the whole report at once.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Diagnostic code for categorizing violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    // === Naming ===
    /// Two classes or interfaces share a name
    DuplicateType,
    /// Two members of one class share a name
    DuplicateMember,
    /// Name is not a valid identifier
    InvalidIdentifier,

    // === References ===
    /// Field or association type is not primitive, declared or external
    UnresolvedType,
    /// Superclass missing or not a class
    UnresolvedSuperclass,
    /// Implemented interface missing or not an interface
    UnresolvedInterface,
    /// Superclass chain loops back on itself
    InheritanceCycle,
    /// Association marked bidirectional without a back-reference name
    MissingBackReference,
    /// Explicit association type disagrees with its target or collection
    AssociationTypeMismatch,

    // === Versions ===
    /// Lower bound above upper bound
    MalformedVersionRange,
    /// Element range escapes its owner's range
    RangeNotContained,
    /// Association active at a version where its target is not
    TargetNotActive,
    /// Bounded class without a deprecated version under checkDeprecation
    MissingDeprecation,
    /// Deprecated version outside the class's own range
    DeprecationOutsideRange,

    // === Defaults ===
    /// Default element with blank key/value or unknown key
    InvalidDefault,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DuplicateType => "E001",
            Self::DuplicateMember => "E002",
            Self::InvalidIdentifier => "E003",
            Self::UnresolvedType => "E004",
            Self::UnresolvedSuperclass => "E005",
            Self::UnresolvedInterface => "E006",
            Self::InheritanceCycle => "E007",
            Self::MissingBackReference => "E008",
            Self::MalformedVersionRange => "E009",
            Self::RangeNotContained => "E010",
            Self::TargetNotActive => "E011",
            Self::MissingDeprecation => "E012",
            Self::InvalidDefault => "E013",
            Self::AssociationTypeMismatch => "E014",
            Self::DeprecationOutsideRange => "W001",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::DeprecationOutsideRange => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Error family this code is reported under
    pub fn family(&self) -> &'static str {
        match self {
            Self::MissingDeprecation | Self::DeprecationOutsideRange => "DeprecationError",
            Self::UnresolvedType
            | Self::UnresolvedSuperclass
            | Self::UnresolvedInterface
            | Self::MalformedVersionRange => "ResolutionError",
            _ => "ValidationError",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

// =============================================================================
// Diagnostic Item
// =============================================================================

/// A single violation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticItem {
    /// Offending entity: `Class`, `Class.member` or `model`
    pub entity: String,
    pub code: DiagnosticCode,
    pub message: String,
    /// Hints and related entities
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
}

impl DiagnosticItem {
    pub fn new(entity: impl Into<String>, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for DiagnosticItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} ({})",
            self.code,
            self.code.severity(),
            self.message,
            self.entity
        )?;

        for ctx in &self.context {
            write!(f, "\n  - {}", ctx)?;
        }

        Ok(())
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

/// Collection of violations from a validation pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<DiagnosticItem>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic item
    pub fn push(&mut self, item: DiagnosticItem) {
        self.items.push(item);
    }

    /// Add an item built from parts
    pub fn report(
        &mut self,
        entity: impl Into<String>,
        code: DiagnosticCode,
        message: impl Into<String>,
    ) {
        self.push(DiagnosticItem::new(entity, code, message));
    }

    /// Add diagnostic for an unresolved type, with an optional suggestion
    pub fn unresolved_type(
        &mut self,
        entity: impl Into<String>,
        type_name: &str,
        suggestion: Option<&str>,
    ) {
        let mut item = DiagnosticItem::new(
            entity,
            DiagnosticCode::UnresolvedType,
            format!(
                "type '{}' is neither a primitive, a declared class or interface, nor an external type",
                type_name
            ),
        );
        if let Some(suggestion) = suggestion {
            item = item.with_context(format!("did you mean '{}'?", suggestion));
        }
        self.push(item);
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|i| i.severity() == Severity::Error)
    }

    /// Get all errors
    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Error)
    }

    /// Get all warnings
    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Warning)
    }

    /// Items carrying a given code
    pub fn with_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(move |i| i.code == code)
    }

    /// Items concerning a given entity
    pub fn for_entity<'a>(&'a self, entity: &'a str) -> impl Iterator<Item = &'a DiagnosticItem> {
        self.items.iter().filter(move |i| i.entity == entity)
    }

    pub fn all(&self) -> &[DiagnosticItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Merge another Diagnostics into this one
    pub fn merge(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    /// Keep only the warnings
    pub fn into_warnings(self) -> Diagnostics {
        Diagnostics {
            items: self
                .items
                .into_iter()
                .filter(|i| i.severity() == Severity::Warning)
                .collect(),
        }
    }

    /// Format all diagnostics for display
    pub fn format_all(&self) -> String {
        let mut output = String::new();

        for item in &self.items {
            output.push_str(&format!("{}\n", item));
        }

        if self.has_errors() {
            output.push_str(&format!(
                "\n{} error(s), {} warning(s)\n",
                self.error_count(),
                self.warning_count()
            ));
        } else if !self.is_empty() {
            output.push_str(&format!("\n{} warning(s)\n", self.warning_count()));
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_all())
    }
}

impl IntoIterator for Diagnostics {
    type Item = DiagnosticItem;
    type IntoIter = std::vec::IntoIter<DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a DiagnosticItem;
    type IntoIter = std::slice::Iter<'a, DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
