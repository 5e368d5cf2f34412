//! Dotted-name parsing and validation.
//!
//! `DottedName` is the unit every import revolves around: `os.path`,
//! `numpy.random.default_rng`, a bare `os`. Atoms borrow nothing — they are
//! owned `String`s, since imports are built, merged, and rewritten rather
//! than sliced once and discarded like the scope analyzer's name usages.

use crate::error::{PyflybyError, SyntaxPos};
use std::fmt;

/// An ordered, non-empty sequence of identifier atoms: `a.b.c`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DottedName {
    atoms: Vec<String>,
}

impl DottedName {
    /// Build from already-validated atoms. Panics on an empty slice — callers
    /// go through `parse` for untrusted input.
    pub fn new(atoms: Vec<String>) -> Self {
        assert!(!atoms.is_empty(), "DottedName must have at least one atom");
        Self { atoms }
    }

    /// Parse `"a.b.c"`, validating every atom against the identifier rule.
    pub fn parse(s: &str) -> Result<Self, PyflybyError> {
        if s.is_empty() {
            return Err(PyflybyError::Syntax(
                SyntaxPos::default(),
                "empty dotted name".to_string(),
            ));
        }
        let mut atoms = Vec::new();
        for atom in s.split('.') {
            if !is_valid_identifier(atom) {
                return Err(PyflybyError::Syntax(
                    SyntaxPos::default(),
                    format!("invalid identifier atom: `{atom}` in `{s}`"),
                ));
            }
            atoms.push(atom.to_string());
        }
        Ok(Self { atoms })
    }

    pub fn atoms(&self) -> &[String] {
        &self.atoms
    }

    pub fn first_atom(&self) -> &str {
        &self.atoms[0]
    }

    pub fn last_atom(&self) -> &str {
        self.atoms.last().expect("DottedName is never empty")
    }

    /// All prefixes, shortest first: `a`, `a.b`, `a.b.c`.
    pub fn prefixes(&self) -> impl Iterator<Item = DottedName> + '_ {
        (1..=self.atoms.len()).map(|n| DottedName::new(self.atoms[..n].to_vec()))
    }

    /// True iff `self`'s atoms start with all of `other`'s atoms.
    pub fn startswith(&self, other: &DottedName) -> bool {
        other.atoms.len() <= self.atoms.len() && self.atoms[..other.atoms.len()] == other.atoms[..]
    }

    /// Drop the leading `n` atoms shared with `old` and splice in `new`'s
    /// atoms in their place. Used by `transform_imports`/`canonicalize_imports`
    /// to rewrite a dotted prefix.
    pub fn with_prefix_replaced(&self, old: &DottedName, new: &DottedName) -> DottedName {
        debug_assert!(self.startswith(old));
        let mut atoms = new.atoms.clone();
        atoms.extend_from_slice(&self.atoms[old.atoms.len()..]);
        DottedName::new(atoms)
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for DottedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.atoms.join("."))
    }
}

/// Whether `s` is a valid identifier atom in the target language: starts with
/// a letter or underscore, continues with letters/digits/underscore. Accepts
/// non-ASCII alphabetic starts/continuations conservatively rather than
/// pulling in full Unicode XID tables.
pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        let d = DottedName::parse("a.b.c").unwrap();
        assert_eq!(d.to_string(), "a.b.c");
    }

    #[test]
    fn test_parse_single_atom() {
        let d = DottedName::parse("os").unwrap();
        assert_eq!(d.atoms(), &["os".to_string()]);
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(DottedName::parse("").is_err());
    }

    #[test]
    fn test_parse_rejects_invalid_atom() {
        assert!(DottedName::parse("a.1b.c").is_err());
        assert!(DottedName::parse("a..c").is_err());
    }

    #[test]
    fn test_prefixes() {
        let d = DottedName::parse("a.b.c").unwrap();
        let prefixes: Vec<String> = d.prefixes().map(|p| p.to_string()).collect();
        assert_eq!(prefixes, vec!["a", "a.b", "a.b.c"]);
    }

    #[test]
    fn test_startswith() {
        let d = DottedName::parse("a.b.c").unwrap();
        assert!(d.startswith(&DottedName::parse("a.b").unwrap()));
        assert!(d.startswith(&DottedName::parse("a.b.c").unwrap()));
        assert!(!d.startswith(&DottedName::parse("a.b.c.d").unwrap()));
        assert!(!d.startswith(&DottedName::parse("x").unwrap()));
    }

    #[test]
    fn test_with_prefix_replaced() {
        let d = DottedName::parse("numpy.random.default_rng").unwrap();
        let old = DottedName::parse("numpy").unwrap();
        let new = DottedName::parse("numpy2").unwrap();
        assert_eq!(
            d.with_prefix_replaced(&old, &new).to_string(),
            "numpy2.random.default_rng"
        );
    }

    #[test]
    fn test_first_last_atom() {
        let d = DottedName::parse("a.b.c").unwrap();
        assert_eq!(d.first_atom(), "a");
        assert_eq!(d.last_atom(), "c");
    }
}
