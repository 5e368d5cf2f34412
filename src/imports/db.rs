//! The import database: a layered merge of `known`/`mandatory`/`forget`/
//! `canonical` directives across an ordered list of contributor files.
//!
//! Path resolution, directory traversal, and per-file directive parsing all
//! live here since they only ever feed `ImportDB::load`. The walker is a
//! small hand-rolled `read_dir` recursion rather than the `ignore`-crate
//! walker in `discovery.rs`: database contributors are *not*
//! `.gitignore`-filtered — every `.py` file under a root contributes,
//! unconditionally.

use crate::ast::{AssignTarget, Stmt, StmtKind};
use crate::error::PyflybyError;
use crate::fast_parser::parse_lenient;
use crate::ident::DottedName;
use crate::imports::collections::ImportSet;
use crate::imports::stmt::{Import, ImportStatement};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// `OLD -> NEW` dotted-prefix rewrite rules from `__canonical_imports__`,
/// applied by `canonicalize_imports`.
pub type RewriteMap = IndexMap<DottedName, DottedName>;

const ANCESTOR_SENTINEL_PREFIX: &str = ".../";

/// One entry of a database path spec.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSpecEntry {
    /// A literal file or directory contributor root.
    Root(PathBuf),
    /// `.../<name>`: search every ancestor of the target file for an entry
    /// named `<name>`, deepest first, stopping at the filesystem root.
    AncestorWalk(String),
}

/// A parsed database path-spec: an ordered list of roots and ancestor-walk
/// sentinels, as read from the host-OS-separator-delimited path variable.
#[derive(Debug, Clone, Default)]
pub struct PathSpec(Vec<PathSpecEntry>);

#[cfg(windows)]
const PATH_LIST_SEP: char = ';';
#[cfg(not(windows))]
const PATH_LIST_SEP: char = ':';

impl PathSpec {
    /// Parse the OS-path-separator-delimited database path variable. A bare
    /// `-` or `...` entry expands in place to [`default_roots`]; a
    /// `.../<name>` entry becomes an ancestor-walk sentinel.
    pub fn parse(spec: &str) -> PathSpec {
        let mut entries = Vec::new();
        for raw in spec.split(PATH_LIST_SEP) {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            if raw == "-" || raw == "..." {
                entries.extend(default_roots().into_iter().map(PathSpecEntry::Root));
            } else if let Some(name) = raw.strip_prefix(ANCESTOR_SENTINEL_PREFIX) {
                entries.push(PathSpecEntry::AncestorWalk(name.to_string()));
            } else {
                entries.push(PathSpecEntry::Root(PathBuf::from(raw)));
            }
        }
        PathSpec(entries)
    }

    pub fn from_roots(roots: impl IntoIterator<Item = PathBuf>) -> PathSpec {
        PathSpec(roots.into_iter().map(PathSpecEntry::Root).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The built-in default root list used when a path spec entry is `-`/`...`.
/// Real pyflyby installs ship `/etc/pyflyby` and `~/.pyflyby`; both are
/// harmless to list unconditionally since missing roots are tolerated.
fn default_roots() -> Vec<PathBuf> {
    let mut roots = vec![PathBuf::from("/etc/pyflyby")];
    if let Some(home) = std::env::var_os("HOME") {
        roots.push(PathBuf::from(home).join(".pyflyby"));
    }
    roots
}

/// Resolve a [`PathSpec`] against `target_file` into the ordered, flattened
/// list of individual contributor files (stable sorted order within each
/// directory), tolerant of roots that don't exist.
fn resolve_contributor_files(spec: &PathSpec, target_file: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in &spec.0 {
        match entry {
            PathSpecEntry::Root(root) => collect_root(root, &mut files),
            PathSpecEntry::AncestorWalk(name) => {
                let start = target_file.parent().unwrap_or(target_file);
                for ancestor in start.ancestors() {
                    collect_root(&ancestor.join(name), &mut files);
                }
            }
        }
    }
    files
}

fn collect_root(root: &Path, out: &mut Vec<PathBuf>) {
    let Ok(meta) = fs::metadata(root) else {
        return; // vanished / never existed: treated as absent, not an error.
    };
    if meta.is_file() {
        out.push(root.to_path_buf());
    } else if meta.is_dir() {
        collect_dir_sorted(root, out);
    }
}

/// Recursively walk `dir`, appending every `.py` file in stable,
/// locale-independent sorted order.
fn collect_dir_sorted(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(read) = fs::read_dir(dir) else {
        return;
    };
    let mut children: Vec<PathBuf> = read.filter_map(|e| e.ok()).map(|e| e.path()).collect();
    children.sort();
    for child in children {
        let Ok(meta) = fs::symlink_metadata(&child) else {
            continue;
        };
        if meta.is_dir() {
            collect_dir_sorted(&child, out);
        } else if meta.is_file() && child.extension().and_then(|e| e.to_str()) == Some("py") {
            out.push(child);
        }
    }
}

// ── Directives extracted from one contributor file ─────────────────────────

#[derive(Debug, Default)]
struct ContributorDirectives {
    known_adds: Vec<Import>,
    mandatory_adds: Vec<Import>,
    forget_removes: Vec<Import>,
    canonical_adds: Vec<(DottedName, DottedName)>,
}

/// Parse each listed import-statement source string, collecting any that
/// fail to parse as a diagnostic rather than aborting the whole file.
fn parse_import_strings(strings: &[String], diagnostics: &mut Vec<PyflybyError>) -> Vec<Import> {
    let mut imports = Vec::new();
    for s in strings {
        match ImportStatement::from_source(s) {
            Ok(stmt) => imports.extend(stmt.split()),
            Err(_) => diagnostics.push(PyflybyError::ImportFormat(s.clone())),
        }
    }
    imports
}

/// `__canonical_imports__`'s string list is collected in source order by the
/// parser regardless of brace/bracket nesting (it never distinguishes dict
/// keys from values), so a `{"OLD": "NEW", ...}` literal yields
/// `[OLD, NEW, OLD, NEW, ...]` — pair them up positionally.
fn parse_canonical_pairs(strings: &[String], diagnostics: &mut Vec<PyflybyError>) -> Vec<(DottedName, DottedName)> {
    let mut pairs = Vec::new();
    let mut chunks = strings.chunks_exact(2);
    for pair in &mut chunks {
        match (DottedName::parse(&pair[0]), DottedName::parse(&pair[1])) {
            (Ok(old), Ok(new)) => pairs.push((old, new)),
            _ => diagnostics.push(PyflybyError::ImportFormat(format!(
                "{} -> {}",
                pair[0], pair[1]
            ))),
        }
    }
    if !chunks.remainder().is_empty() {
        diagnostics.push(PyflybyError::ImportFormat(
            "__canonical_imports__ has an odd number of strings".to_string(),
        ));
    }
    pairs
}

/// Extract the `Import`s a single `import`/`from ... import` statement
/// introduces (empty for a star import or any non-import statement). Shared
/// with `rewriter.rs`, which uses it to collect the prologue's imports.
pub(crate) fn import_from_stmt_kind(kind: &StmtKind<'_>) -> Vec<Import> {
    match kind {
        StmtKind::Import(aliases) => aliases
            .iter()
            .filter_map(|a| {
                Some(Import::new(
                    DottedName::parse(a.name).ok()?,
                    a.asname.map(str::to_string),
                    0,
                ))
            })
            .collect(),
        StmtKind::ImportFrom {
            module,
            names,
            level,
        } => {
            let from_module = module.and_then(|m| DottedName::parse(m).ok());
            names
                .iter()
                .filter_map(|a| {
                    if a.name == "*" {
                        return None;
                    }
                    let member = DottedName::parse(a.name).ok()?;
                    let fullname = match &from_module {
                        Some(m) => {
                            let mut atoms = m.atoms().to_vec();
                            atoms.extend(member.atoms().iter().cloned());
                            DottedName::new(atoms)
                        }
                        None => member,
                    };
                    Some(Import::new_from_style(
                        fullname,
                        a.asname.map(str::to_string),
                        *level,
                    ))
                })
                .collect()
        }
        _ => Vec::new(),
    }
}

/// Walk one contributor file's already-parsed top-level statements and pull
/// out the three recognized assignment directives plus its plain top-level
/// imports. Never evaluates arbitrary code —
/// only matches the literal `NAME = [...]` / `NAME = {...}` shapes.
fn extract_directives(stmts: &[Stmt<'_>], diagnostics: &mut Vec<PyflybyError>) -> ContributorDirectives {
    let mut directives = ContributorDirectives::default();
    for stmt in stmts {
        match &stmt.kind {
            StmtKind::Import(_) | StmtKind::ImportFrom { .. } => {
                directives.known_adds.extend(import_from_stmt_kind(&stmt.kind));
            }
            StmtKind::Assign { targets, value } => {
                let Some(name) = targets.iter().find_map(|t| match t {
                    AssignTarget::Name(n, _) => Some(*n),
                    _ => None,
                }) else {
                    continue;
                };
                match name {
                    "__mandatory_imports__" => {
                        directives
                            .mandatory_adds
                            .extend(parse_import_strings(&value.string_list, diagnostics));
                    }
                    "__forget_imports__" => {
                        directives
                            .forget_removes
                            .extend(parse_import_strings(&value.string_list, diagnostics));
                    }
                    "__canonical_imports__" => {
                        directives
                            .canonical_adds
                            .extend(parse_canonical_pairs(&value.string_list, diagnostics));
                    }
                    _ => {} // any other top-level statement is ignored (with a warning)
                }
            }
            _ => {} // ignored with a warning
        }
    }
    directives
}

/// Remove every entry from `set` matching `imp` by `(fullname, level)` only —
/// not by bound name (DESIGN.md's resolution of spec.md §9's open question).
fn forget_matching(set: &ImportSet, forgotten: &Import) -> ImportSet {
    set.filter(|candidate| {
        !(candidate.fullname == forgotten.fullname && candidate.level == forgotten.level)
    })
}

/// Multi-file layered import database.
#[derive(Debug, Clone, Default)]
pub struct ImportDB {
    known_imports: ImportSet,
    mandatory_imports: ImportSet,
    canonical_imports: RewriteMap,
    preferred_import: HashMap<String, Import>,
}

impl ImportDB {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build an `ImportDB` by resolving `spec` against `target_file` and
    /// layering every contributor file left-to-right. Tolerant
    /// of files that vanish mid-scan; per-entry directive errors are
    /// collected rather than aborting the whole load.
    pub fn load(spec: &PathSpec, target_file: &Path) -> (ImportDB, Vec<PyflybyError>) {
        let mut db = ImportDB::default();
        let mut diagnostics = Vec::new();

        for file in resolve_contributor_files(spec, target_file) {
            let Ok(source) = fs::read_to_string(&file) else {
                continue; // vanished mid-scan: treated as absent.
            };
            let stmts = parse_lenient(&source);
            let directives = extract_directives(&stmts, &mut diagnostics);

            for imp in directives.forget_removes {
                db.known_imports = forget_matching(&db.known_imports, &imp);
                db.mandatory_imports = forget_matching(&db.mandatory_imports, &imp);
            }
            for imp in directives.known_adds {
                db.known_imports.insert(imp);
            }
            for imp in directives.mandatory_adds {
                db.mandatory_imports.insert(imp);
            }
            for (old, new) in directives.canonical_adds {
                db.canonical_imports.insert(old, new); // last writer wins
            }
        }

        (db, diagnostics)
    }

    pub fn known_imports(&self) -> &ImportSet {
        &self.known_imports
    }

    pub fn mandatory_imports(&self) -> &ImportSet {
        &self.mandatory_imports
    }

    pub fn canonical_imports(&self) -> &RewriteMap {
        &self.canonical_imports
    }

    /// Register an explicit `preferred_import` override: when `name` has
    /// several candidates in `known_imports`, this one wins.
    pub fn set_preferred_import(&mut self, name: impl Into<String>, imp: Import) {
        self.preferred_import.insert(name.into(), imp);
    }

    pub fn preferred_import(&self, name: &str) -> Option<&Import> {
        self.preferred_import.get(name)
    }

    /// Look up candidates for a missing bound name: the `preferred_import`
    /// override if set, else every `known_imports` candidate binding `name`.
    pub fn resolve_missing_name(&self, name: &str) -> Vec<Import> {
        if let Some(preferred) = self.preferred_import(name) {
            return vec![preferred.clone()];
        }
        self.known_imports.by_import_as(name).to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn dn(s: &str) -> DottedName {
        DottedName::parse(s).unwrap()
    }

    #[test]
    fn test_path_spec_parse_literal_roots() {
        let spec = PathSpec::parse("/a/b:/c/d");
        assert_eq!(spec.0.len(), 2);
    }

    #[test]
    fn test_path_spec_parse_default_sentinel() {
        let spec = PathSpec::parse("-");
        assert!(!spec.is_empty());
    }

    #[test]
    fn test_path_spec_parse_ancestor_sentinel() {
        let spec = PathSpec::parse(".../.pyflyby");
        assert_eq!(spec.0, vec![PathSpecEntry::AncestorWalk(".pyflyby".to_string())]);
    }

    #[test]
    fn test_load_known_import_from_contributor() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "import re\n").unwrap();
        let spec = PathSpec::from_roots(vec![dir.path().to_path_buf()]);
        let (db, diags) = ImportDB::load(&spec, &dir.path().join("target.py"));
        assert!(diags.is_empty());
        assert!(!db.known_imports().by_fullname(&dn("re")).is_empty());
    }

    #[test]
    fn test_load_mandatory_imports() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("a.py"),
            "__mandatory_imports__ = ['from __future__ import print_function']\n",
        )
        .unwrap();
        let spec = PathSpec::from_roots(vec![dir.path().to_path_buf()]);
        let (db, _) = ImportDB::load(&spec, &dir.path().join("target.py"));
        assert!(!db.mandatory_imports().by_import_as("print_function").is_empty());
    }

    #[test]
    fn test_forget_removes_earlier_known_import() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a_known.py"), "import re\n").unwrap();
        fs::write(
            dir.path().join("b_forget.py"),
            "__forget_imports__ = ['import re']\n",
        )
        .unwrap();
        let spec = PathSpec::from_roots(vec![dir.path().to_path_buf()]);
        let (db, _) = ImportDB::load(&spec, &dir.path().join("target.py"));
        assert!(db.known_imports().by_fullname(&dn("re")).is_empty());
    }

    #[test]
    fn test_forget_unknown_import_is_noop() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("a.py"),
            "import os\n__forget_imports__ = ['import sys']\n",
        )
        .unwrap();
        let spec = PathSpec::from_roots(vec![dir.path().to_path_buf()]);
        let (db, _) = ImportDB::load(&spec, &dir.path().join("target.py"));
        assert!(!db.known_imports().by_fullname(&dn("os")).is_empty());
    }

    #[test]
    fn test_canonical_imports_last_writer_wins() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("a.py"),
            "__canonical_imports__ = {'numpy': 'numpy1'}\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("b.py"),
            "__canonical_imports__ = {'numpy': 'numpy2'}\n",
        )
        .unwrap();
        let spec = PathSpec::from_roots(vec![dir.path().to_path_buf()]);
        let (db, _) = ImportDB::load(&spec, &dir.path().join("target.py"));
        assert_eq!(
            db.canonical_imports().get(&dn("numpy")).unwrap().to_string(),
            "numpy2"
        );
    }

    #[test]
    fn test_load_tolerates_missing_root() {
        let spec = PathSpec::from_roots(vec![PathBuf::from("/does/not/exist")]);
        let (db, diags) = ImportDB::load(&spec, Path::new("/tmp/target.py"));
        assert!(diags.is_empty());
        assert_eq!(db.known_imports().len(), 0);
    }

    #[test]
    fn test_ancestor_walk_finds_same_named_file() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("pkg").join("sub");
        fs::create_dir_all(&sub).unwrap();
        fs::write(dir.path().join(".pyflyby"), "import json\n").unwrap();
        let spec = PathSpec::parse(".../.pyflyby");
        let (db, _) = ImportDB::load(&spec, &sub.join("target.py"));
        assert!(!db.known_imports().by_fullname(&dn("json")).is_empty());
    }

    #[test]
    fn test_resolve_missing_name_uses_preferred() {
        let mut db = ImportDB::empty();
        db.known_imports.insert(Import::new_from_style(dn("numpy.arange"), None, 0));
        db.known_imports.insert(Import::new_from_style(dn("dask.array.arange"), None, 0));
        db.set_preferred_import("arange", Import::new_from_style(dn("numpy.arange"), None, 0));
        let candidates = db.resolve_missing_name("arange");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].fullname.to_string(), "numpy.arange");
    }
}
