//! Sets and mappings over [`Import`]s.

use crate::error::PyflybyError;
use crate::ident::DottedName;
use crate::imports::stmt::{Import, ImportStatement};
use indexmap::IndexSet;
use std::collections::HashMap;

/// A deduplicated collection of [`Import`]s with two derived indexes:
/// `by_fullname` and `by_import_as` (bound name). Backed by an `IndexSet` so
/// iteration order matches insertion order — `pretty_print` re-sorts
/// explicitly, but a stable backing order keeps behavior deterministic for
/// anything that iterates before sorting.
#[derive(Debug, Clone, Default)]
pub struct ImportSet {
    imports: IndexSet<Import>,
    by_fullname: HashMap<DottedName, Vec<Import>>,
    by_import_as: HashMap<String, Vec<Import>>,
}

impl ImportSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_imports(imports: impl IntoIterator<Item = Import>) -> Self {
        let mut set = Self::new();
        for imp in imports {
            set.insert(imp);
        }
        set
    }

    /// Insert `imp`. Returns `false` if it was already present (no
    /// duplicates, per spec.md §3).
    pub fn insert(&mut self, imp: Import) -> bool {
        if !self.imports.insert(imp.clone()) {
            return false;
        }
        self.by_fullname
            .entry(imp.fullname.clone())
            .or_default()
            .push(imp.clone());
        self.by_import_as
            .entry(imp.bound_name().to_string())
            .or_default()
            .push(imp);
        true
    }

    pub fn contains(&self, imp: &Import) -> bool {
        self.imports.contains(imp)
    }

    pub fn len(&self) -> usize {
        self.imports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Import> {
        self.imports.iter()
    }

    /// Candidates (by `fullname`) for a given qualified name.
    pub fn by_fullname(&self, fullname: &DottedName) -> &[Import] {
        self.by_fullname.get(fullname).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Candidates binding a given bound name.
    pub fn by_import_as(&self, name: &str) -> &[Import] {
        self.by_import_as.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True iff more than one distinct import binds `name` (spec.md §4.6
    /// "conflicting" policy).
    pub fn is_conflicting(&self, name: &str) -> bool {
        self.by_import_as(name).len() > 1
    }

    /// Names with more than one binding candidate.
    pub fn conflicting_names(&self) -> Vec<&str> {
        self.by_import_as
            .iter()
            .filter(|(_, v)| v.len() > 1)
            .map(|(k, _)| k.as_str())
            .collect()
    }

    pub fn union(&self, other: &ImportSet) -> ImportSet {
        let mut result = self.clone();
        for imp in other.iter() {
            result.insert(imp.clone());
        }
        result
    }

    pub fn difference(&self, other: &ImportSet) -> ImportSet {
        ImportSet::from_imports(self.iter().filter(|i| !other.contains(i)).cloned())
    }

    pub fn intersection(&self, other: &ImportSet) -> ImportSet {
        ImportSet::from_imports(self.iter().filter(|i| other.contains(i)).cloned())
    }

    pub fn filter(&self, pred: impl Fn(&Import) -> bool) -> ImportSet {
        ImportSet::from_imports(self.iter().filter(|i| pred(i)).cloned())
    }

    /// Remove every import in `other`, by identity. Distinct from
    /// [`Self::difference`] only in name — spec.md §4.6 lists both operation
    /// names on `ImportSet` for readability at call sites (`without_imports`
    /// reads naturally in rewriter code: `set.without_imports(&unused)`).
    pub fn without_imports(&self, other: &ImportSet) -> ImportSet {
        self.difference(other)
    }

    /// Group into [`ImportStatement`]s by `(level, from_module)` and render,
    /// ordered per spec.md §4.9.
    ///
    /// `allow_conflicts = false` fails if any bound name has more than one
    /// candidate in the set; `true` emits every candidate,
    /// deterministically ordered by the group-sort + per-statement alias
    /// sort already applied during rendering.
    pub fn pretty_print(
        &self,
        params: &crate::format::FormatParams,
        allow_conflicts: bool,
    ) -> Result<String, PyflybyError> {
        crate::format::render_import_set(self, params, allow_conflicts)
    }

    /// Fold every import into one [`ImportStatement`] per `(level,
    /// from_module, style)` group. Used by both `pretty_print` and tests
    /// that want to inspect groups directly.
    pub fn group_into_statements(&self, allow_conflicts: bool) -> Result<Vec<ImportStatement>, PyflybyError> {
        if !allow_conflicts {
            if let Some(name) = self.conflicting_names().into_iter().min() {
                let candidates = self
                    .by_import_as(name)
                    .iter()
                    .map(|i| i.fullname.to_string())
                    .collect();
                return Err(PyflybyError::AmbiguousImport(name.to_string(), candidates));
            }
        }

        let mut groups: Vec<ImportStatement> = Vec::new();
        'imports: for imp in self.imports.iter() {
            for group in groups.iter_mut() {
                if group.is_compatible(imp) {
                    let _ = group.merge(imp.clone());
                    continue 'imports;
                }
            }
            let (from_module, _member, _as_name) = if imp.via_from() {
                imp.split_form()
            } else {
                (None, String::new(), None)
            };
            groups.push(
                ImportStatement::new(from_module, imp.level, vec![imp.clone()])
                    .expect("single-Import ImportStatement is always non-empty"),
            );
        }
        Ok(groups)
    }
}

/// A mapping from a qualified name to the set of imports that name maps to —
/// used by `transform_imports`/`canonicalize_imports`.
pub type ImportMap = HashMap<DottedName, ImportSet>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FormatParams;

    fn dn(s: &str) -> DottedName {
        DottedName::parse(s).unwrap()
    }

    #[test]
    fn test_insert_dedups() {
        let mut set = ImportSet::new();
        assert!(set.insert(Import::new(dn("os"), None, 0)));
        assert!(!set.insert(Import::new(dn("os"), None, 0)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_by_import_as_conflict() {
        let set = ImportSet::from_imports([
            Import::new_from_style(dn("numpy.arange"), None, 0),
            Import::new_from_style(dn("dask.array.arange"), None, 0),
        ]);
        assert!(set.is_conflicting("arange"));
        assert_eq!(set.by_import_as("arange").len(), 2);
    }

    #[test]
    fn test_union_difference_intersection() {
        let a = ImportSet::from_imports([Import::new(dn("os"), None, 0), Import::new(dn("sys"), None, 0)]);
        let b = ImportSet::from_imports([Import::new(dn("sys"), None, 0)]);
        assert_eq!(a.union(&b).len(), 2);
        assert_eq!(a.difference(&b).len(), 1);
        assert_eq!(a.intersection(&b).len(), 1);
    }

    #[test]
    fn test_pretty_print_rejects_conflicts_by_default() {
        let set = ImportSet::from_imports([
            Import::new_from_style(dn("numpy.arange"), None, 0),
            Import::new_from_style(dn("dask.array.arange"), None, 0),
        ]);
        assert!(set.pretty_print(&FormatParams::default(), false).is_err());
        assert!(set.pretty_print(&FormatParams::default(), true).is_ok());
    }

    #[test]
    fn test_group_into_statements_merges_same_module() {
        let set = ImportSet::from_imports([
            Import::new_from_style(dn("os.path"), None, 0),
            Import::new_from_style(dn("os.sep"), None, 0),
        ]);
        let groups = set.group_into_statements(false).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].imports().len(), 2);
    }

    #[test]
    fn test_group_into_statements_separates_plain_and_from() {
        let set = ImportSet::from_imports([
            Import::new(dn("os"), None, 0),
            Import::new_from_style(dn("os.path"), None, 0),
        ]);
        let groups = set.group_into_statements(false).unwrap();
        assert_eq!(groups.len(), 2);
    }
}
