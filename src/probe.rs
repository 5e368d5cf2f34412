//! Import probe: the pluggable collaborator the rewriter consults for
//! star-expansion and broken-import removal.
//!
//! The core never imports anything to answer these questions itself — that
//! is explicitly out of scope. `NullProbe` is the only
//! implementation shipped here; a runtime-linked probe answering real
//! questions is an external collaborator.

use crate::ident::DottedName;
use crate::imports::{Import, ImportSet};

/// Contract the rewriter relies on for `replace_star_imports` and
/// `remove_broken_imports`.
pub trait ImportProbe: Send + Sync {
    /// The public names `module` exposes, or `None` if they can't be
    /// determined (module not found, probe unavailable, etc.).
    fn exports(&self, module: &DottedName) -> Option<ImportSet>;

    /// Whether importing `imp` would succeed in the intended environment.
    fn resolves(&self, imp: &Import) -> bool;
}

/// Answers `None`/`false` to everything, making `replace_star_imports` and
/// `remove_broken_imports` no-ops. The default probe; the
/// core ships no execution-based probe of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProbe;

impl ImportProbe for NullProbe {
    fn exports(&self, _module: &DottedName) -> Option<ImportSet> {
        None
    }

    fn resolves(&self, _imp: &Import) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dn(s: &str) -> DottedName {
        DottedName::parse(s).unwrap()
    }

    #[test]
    fn test_null_probe_exports_is_none() {
        assert!(NullProbe.exports(&dn("os.path")).is_none());
    }

    #[test]
    fn test_null_probe_resolves_is_false() {
        let imp = Import::new(dn("os"), None, 0);
        assert!(!NullProbe.resolves(&imp));
    }
}
