//! Diagnostic messages emitted while compiling a script.

use serde::Serialize;

use crate::Span;

/// A diagnostic message (error, warning, or info) with source location.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Diagnostic {
    /// Numeric diagnostic code (e.g. 104 for an ambiguous reference).
    pub code: u32,
    pub message: String,
    pub span: Span,
    pub severity: DiagnosticSeverity,
    pub phase: CompilationPhase,
}

impl Diagnostic {
    pub fn error(
        code: u32,
        message: impl Into<String>,
        span: Span,
        phase: CompilationPhase,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            span,
            severity: DiagnosticSeverity::Error,
            phase,
        }
    }

    pub fn warning(
        code: u32,
        message: impl Into<String>,
        span: Span,
        phase: CompilationPhase,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            span,
            severity: DiagnosticSeverity::Warning,
            phase,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
}

/// Compilation phase where a diagnostic was emitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum CompilationPhase {
    Parsing,
    NameResolution,
    Binding,
    Conversion,
}

/// Well-known diagnostic codes.
pub mod codes {
    pub const OPERATOR_NOT_APPLICABLE: u32 = 19;
    pub const CANNOT_INDEX: u32 = 21;
    pub const UNARY_OPERATOR_NOT_APPLICABLE: u32 = 23;
    pub const CANNOT_CONVERT_IMPLICITLY: u32 = 29;
    pub const CANNOT_CONVERT: u32 = 30;
    pub const NAME_NOT_FOUND: u32 = 103;
    pub const AMBIGUOUS_REFERENCE: u32 = 104;
    pub const MEMBER_NOT_FOUND: u32 = 117;
    pub const NAMESPACE_USED_AS_VALUE: u32 = 118;
    pub const TYPE_USED_AS_VALUE: u32 = 119;
    pub const AMBIGUOUS_CALL: u32 = 121;
    pub const NOT_INVOCABLE: u32 = 149;
    pub const NO_MATCHING_OVERLOAD: u32 = 1501;
    pub const NAMESPACE_MEMBER_NOT_FOUND: u32 = 234;
    pub const NAMESPACE_NOT_FOUND: u32 = 246;
    pub const METHOD_GROUP_AS_VALUE: u32 = 428;
    pub const SYNTAX_ERROR: u32 = 1001;
}

impl std::fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticSeverity::Error => write!(f, "ERROR"),
            DiagnosticSeverity::Warning => write!(f, "WARNING"),
            DiagnosticSeverity::Info => write!(f, "INFO"),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} QS{:04} at {}: {}",
            self.severity, self.code, self.span, self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::error(
            codes::AMBIGUOUS_REFERENCE,
            "'Sector' is ambiguous",
            Span::new(3, 9),
            CompilationPhase::NameResolution,
        );
        insta::assert_snapshot!(diag.to_string(), @"ERROR QS0104 at 3..9: 'Sector' is ambiguous");
        assert!(diag.is_error());
    }
}
