//! Error taxonomy. Hand-written `Display` impls in the style of
//! `types::Diagnostic`/`RuleCode` — no derive-macro error crate.

use std::fmt;

/// A 1-based (line, column) position, used only for error reporting (the
/// richer [`crate::text::FilePos`] is used everywhere else).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyntaxPos {
    pub line: usize,
    pub col: usize,
}

impl fmt::Display for SyntaxPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[derive(Debug, Clone)]
pub enum PyflybyError {
    /// Source could not be parsed under the active compiler flags.
    Syntax(SyntaxPos, String),
    /// A required name lookup failed.
    NoSuchImport(String),
    /// A contributor file had a malformed rewrite rule or import string.
    ImportFormat(String),
    /// A probe operation was needed but the probe returned `None`.
    ProbeUnavailable(String),
    /// Multiple known imports bind the same name with no preferred choice.
    AmbiguousImport(String, Vec<String>),
    /// An `ImportStatement` was built from non-import source.
    NonImportStatement(String),
}

impl fmt::Display for PyflybyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PyflybyError::Syntax(pos, msg) => write!(f, "{pos}: syntax error: {msg}"),
            PyflybyError::NoSuchImport(name) => write!(f, "no known import for `{name}`"),
            PyflybyError::ImportFormat(msg) => write!(f, "malformed import directive: {msg}"),
            PyflybyError::ProbeUnavailable(name) => {
                write!(f, "import probe could not resolve `{name}`")
            }
            PyflybyError::AmbiguousImport(name, candidates) => write!(
                f,
                "ambiguous import for `{name}`: candidates are {}",
                candidates.join(", ")
            ),
            PyflybyError::NonImportStatement(src) => {
                write!(f, "not an import statement: `{src}`")
            }
        }
    }
}

impl std::error::Error for PyflybyError {}

/// Severity of a non-fatal diagnostic emitted during a rewrite pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// A single structured diagnostic line: `<file>:<line>:<col>: <level>: <msg>`.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub file: String,
    pub line: usize,
    pub col: usize,
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}: {}",
            self.file, self.line, self.col, self.severity, self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display() {
        let e = PyflybyError::Syntax(SyntaxPos { line: 3, col: 5 }, "unexpected token".into());
        assert_eq!(e.to_string(), "3:5: syntax error: unexpected token");
    }

    #[test]
    fn test_ambiguous_import_display() {
        let e = PyflybyError::AmbiguousImport(
            "arange".into(),
            vec!["numpy.arange".into(), "dask.array.arange".into()],
        );
        assert!(e.to_string().contains("numpy.arange"));
    }

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic {
            file: "foo.py".into(),
            line: 1,
            col: 1,
            severity: Severity::Warning,
            message: "`os` imported but unused".into(),
        };
        assert_eq!(d.to_string(), "foo.py:1:1: warning: `os` imported but unused");
    }
}
