//! A single import and the statement that groups several of them together.

use crate::ast::StmtKind;
use crate::error::PyflybyError;
use crate::fast_parser::parse_lenient;
use crate::format::FormatParams;
use crate::ident::DottedName;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// `{ fullname, import_as, level }` — one name brought into scope by an
/// `import` or `from ... import` statement.
///
/// A fourth field, `via_from`, is carried alongside those three fields but
/// deliberately excluded from `Eq`/`Hash`/`Ord` (manually implemented below):
/// `fullname` alone cannot tell `import os.path` (bound name `os`) apart from
/// `from os import path` (bound name `path`) when both happen to resolve to
/// the same dotted string, so `via_from` records which surface form this
/// Import came from. It does not participate in identity — two Imports with
/// identical (fullname, import_as, level) are the same import regardless of
/// which form produced them — but `bound_name` and `split_form` need it to
/// answer correctly.
#[derive(Debug, Clone)]
pub struct Import {
    pub fullname: DottedName,
    pub import_as: Option<String>,
    pub level: u32,
    via_from: bool,
}

impl PartialEq for Import {
    fn eq(&self, other: &Self) -> bool {
        self.fullname == other.fullname && self.import_as == other.import_as && self.level == other.level
    }
}
impl Eq for Import {}

impl Hash for Import {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fullname.hash(state);
        self.import_as.hash(state);
        self.level.hash(state);
    }
}

impl PartialOrd for Import {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Import {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.fullname, &self.import_as, self.level).cmp(&(&other.fullname, &other.import_as, other.level))
    }
}

impl Import {
    /// Build a plain-style import: `import fullname [as import_as]`.
    pub fn new(fullname: DottedName, import_as: Option<String>, level: u32) -> Self {
        Self {
            fullname,
            import_as,
            level,
            via_from: false,
        }
    }

    /// Build a `from`-style import: `fullname`'s last atom is the member
    /// name imported out of its leading atoms (the module).
    pub fn new_from_style(fullname: DottedName, import_as: Option<String>, level: u32) -> Self {
        Self {
            fullname,
            import_as,
            level,
            via_from: true,
        }
    }

    pub fn via_from(&self) -> bool {
        self.via_from
    }

    /// Whether this is a `from __future__ import ...` directive — never
    /// unused, regardless of whether its bound name is referenced.
    pub fn is_future(&self) -> bool {
        self.via_from && self.level == 0 && self.fullname.first_atom() == "__future__"
    }

    /// The name this import introduces into the enclosing namespace: the
    /// alias if present, else the first atom of `fullname` for a plain
    /// import, or the last atom for a `from`-style one.
    pub fn bound_name(&self) -> &str {
        if let Some(alias) = self.import_as.as_deref() {
            return alias;
        }
        if self.via_from {
            self.fullname.last_atom()
        } else {
            self.fullname.first_atom()
        }
    }

    /// `(from_module, member, as_name)`.
    pub fn split_form(&self) -> (Option<DottedName>, String, Option<String>) {
        if self.via_from && self.fullname.len() > 1 {
            let atoms = self.fullname.atoms();
            let member = atoms.last().expect("len() > 1 implies non-empty").clone();
            let from_module = DottedName::new(atoms[..atoms.len() - 1].to_vec());
            (Some(from_module), member, self.import_as.clone())
        } else {
            (None, self.fullname.to_string(), self.import_as.clone())
        }
    }

    /// If `fullname` starts with `old`'s atoms, return the Import with that
    /// prefix replaced by `new`, preserving the original bound name by
    /// setting `import_as` explicitly when the rename would otherwise change
    /// it.
    pub fn with_prefix_rewritten(&self, old: &DottedName, new: &DottedName) -> Option<Import> {
        if !self.fullname.startswith(old) {
            return None;
        }
        let new_fullname = self.fullname.with_prefix_replaced(old, new);
        let preserved_bound_name = self.bound_name().to_string();
        let natural_bound_name = if self.via_from {
            new_fullname.last_atom()
        } else {
            new_fullname.first_atom()
        };
        let import_as = if natural_bound_name == preserved_bound_name && self.import_as.is_none() {
            None
        } else {
            Some(preserved_bound_name)
        };
        Some(Self {
            fullname: new_fullname,
            import_as,
            level: self.level,
            via_from: self.via_from,
        })
    }
}

/// A non-empty ordered collection of [`Import`]s sharing one `from_module`
/// and `level`; renders as a single physical statement.
#[derive(Debug, Clone)]
pub struct ImportStatement {
    /// `None` for a plain `import a, b.c` group; `Some(m)` for `from m
    /// import ...` (also `None` for a bare relative `from . import x`).
    pub from_module: Option<DottedName>,
    pub level: u32,
    imports: Vec<Import>,
}

impl ImportStatement {
    pub fn new(
        from_module: Option<DottedName>,
        level: u32,
        imports: Vec<Import>,
    ) -> Result<Self, PyflybyError> {
        if imports.is_empty() {
            return Err(PyflybyError::NonImportStatement(
                "ImportStatement requires at least one Import".to_string(),
            ));
        }
        Ok(Self {
            from_module,
            level,
            imports,
        })
    }

    /// Parse a single `import ...` / `from ... import ...` source line (or
    /// multi-line parenthesised form) into an `ImportStatement`.
    pub fn from_source(src: &str) -> Result<Self, PyflybyError> {
        let stmts = parse_lenient(src);
        let stmt = stmts
            .into_iter()
            .find(|s| s.kind.is_import())
            .ok_or_else(|| PyflybyError::NonImportStatement(src.trim().to_string()))?;
        match stmt.kind {
            StmtKind::Import(aliases) => {
                let imports = aliases
                    .into_iter()
                    .map(|a| -> Result<Import, PyflybyError> {
                        Ok(Import::new(
                            DottedName::parse(a.name)?,
                            a.asname.map(str::to_string),
                            0,
                        ))
                    })
                    .collect::<Result<Vec<_>, PyflybyError>>()?;
                ImportStatement::new(None, 0, imports)
            }
            StmtKind::ImportFrom {
                module,
                names,
                level,
            } => {
                if names.is_empty() {
                    return Err(PyflybyError::NonImportStatement(
                        "star imports have no fixed alias list".to_string(),
                    ));
                }
                let from_module = match module {
                    Some(m) => Some(DottedName::parse(m)?),
                    None => None,
                };
                let imports = names
                    .into_iter()
                    .map(|a| -> Result<Import, PyflybyError> {
                        let member_name = DottedName::parse(a.name)?;
                        let fullname = match &from_module {
                            Some(m) => {
                                let mut atoms = m.atoms().to_vec();
                                atoms.extend(member_name.atoms().iter().cloned());
                                DottedName::new(atoms)
                            }
                            None => member_name,
                        };
                        Ok(Import::new_from_style(
                            fullname,
                            a.asname.map(str::to_string),
                            level,
                        ))
                    })
                    .collect::<Result<Vec<_>, PyflybyError>>()?;
                ImportStatement::new(from_module, level, imports)
            }
            _ => Err(PyflybyError::NonImportStatement(src.trim().to_string())),
        }
    }

    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    /// Split back into the constituent `Import`s.
    pub fn split(&self) -> Vec<Import> {
        self.imports.clone()
    }

    /// Whether `imp` could be folded into this statement: same `level` and
    /// (for `from`-style) the same `from_module`. Plain `import X` never
    /// folds with another plain import — pyflyby renders those one per
    /// line, sorted, not comma-joined (spec §4.9 item 2).
    pub fn is_compatible(&self, imp: &Import) -> bool {
        if imp.level != self.level {
            return false;
        }
        match &self.from_module {
            Some(m) if imp.via_from() => {
                imp.fullname.len() > m.len() && imp.fullname.startswith(m)
            }
            None if imp.via_from() && self.level > 0 => true,
            _ => false,
        }
    }

    /// Merge a compatible `Import` into this statement.
    pub fn merge(&mut self, imp: Import) -> Result<(), ()> {
        if !self.is_compatible(&imp) {
            return Err(());
        }
        self.imports.push(imp);
        Ok(())
    }

    /// Render this statement, choosing single-line or hanging-indent
    /// parenthesised form per `params`.
    pub fn render(&self, params: &FormatParams) -> String {
        crate::format::render_import_statement(self, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dn(s: &str) -> DottedName {
        DottedName::parse(s).unwrap()
    }

    #[test]
    fn test_bound_name_plain_multi_atom() {
        let imp = Import::new(dn("os.path"), None, 0);
        assert_eq!(imp.bound_name(), "os");
    }

    #[test]
    fn test_bound_name_from_style() {
        let imp = Import::new_from_style(dn("os.path"), None, 0);
        assert_eq!(imp.bound_name(), "path");
    }

    #[test]
    fn test_bound_name_aliased() {
        let imp = Import::new(dn("numpy"), Some("np".to_string()), 0);
        assert_eq!(imp.bound_name(), "np");
    }

    #[test]
    fn test_split_form_from_style() {
        let imp = Import::new_from_style(dn("os.path.join"), None, 0);
        let (from_module, member, as_name) = imp.split_form();
        assert_eq!(from_module.unwrap().to_string(), "os.path");
        assert_eq!(member, "join");
        assert_eq!(as_name, None);
    }

    #[test]
    fn test_split_form_plain_style() {
        let imp = Import::new(dn("os.path"), None, 0);
        let (from_module, member, _) = imp.split_form();
        assert!(from_module.is_none());
        assert_eq!(member, "os.path");
    }

    #[test]
    fn test_equality_ignores_via_from() {
        let plain = Import::new(dn("os.path"), None, 0);
        let from_style = Import::new_from_style(dn("os.path"), None, 0);
        assert_eq!(plain, from_style);
    }

    #[test]
    fn test_with_prefix_rewritten_preserves_bound_name() {
        let imp = Import::new(dn("numpy"), None, 0);
        let rewritten = imp
            .with_prefix_rewritten(&dn("numpy"), &dn("numpy2"))
            .unwrap();
        assert_eq!(rewritten.fullname.to_string(), "numpy2");
        assert_eq!(rewritten.import_as.as_deref(), Some("numpy"));
    }

    #[test]
    fn test_with_prefix_rewritten_no_match() {
        let imp = Import::new(dn("os"), None, 0);
        assert!(imp.with_prefix_rewritten(&dn("numpy"), &dn("numpy2")).is_none());
    }

    #[test]
    fn test_from_source_plain() {
        let stmt = ImportStatement::from_source("import os, sys\n").unwrap();
        assert_eq!(stmt.imports().len(), 2);
        assert!(stmt.from_module.is_none());
        assert!(!stmt.imports()[0].via_from());
    }

    #[test]
    fn test_from_source_from_import() {
        let stmt = ImportStatement::from_source("from os.path import join as j\n").unwrap();
        assert_eq!(stmt.from_module.as_ref().unwrap().to_string(), "os.path");
        assert_eq!(stmt.imports()[0].fullname.to_string(), "os.path.join");
        assert_eq!(stmt.imports()[0].import_as.as_deref(), Some("j"));
        assert!(stmt.imports()[0].via_from());
    }

    #[test]
    fn test_from_source_bare_relative() {
        let stmt = ImportStatement::from_source("from . import sibling\n").unwrap();
        assert!(stmt.from_module.is_none());
        assert_eq!(stmt.level, 1);
        assert_eq!(stmt.imports()[0].bound_name(), "sibling");
    }

    #[test]
    fn test_from_source_rejects_non_import() {
        assert!(ImportStatement::from_source("x = 1\n").is_err());
    }

    #[test]
    fn test_merge_compatible() {
        let mut stmt = ImportStatement::from_source("from os import path\n").unwrap();
        let extra = Import::new_from_style(dn("os.sep"), None, 0);
        assert!(stmt.merge(extra).is_ok());
        assert_eq!(stmt.imports().len(), 2);
    }

    #[test]
    fn test_merge_incompatible() {
        let mut stmt = ImportStatement::from_source("from os import path\n").unwrap();
        let extra = Import::new_from_style(dn("sys.argv"), None, 0);
        assert!(stmt.merge(extra).is_err());
    }
}
