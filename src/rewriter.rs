//! Rewriter orchestration: the seven primitives that turn parsed imports and
//! an analysis into a new file body — `reformat_import_statements`,
//! `tidy_imports`, `replace_star_imports`, `remove_broken_imports`,
//! `transform_imports`, `canonicalize_imports`, and the batch verb `collect`.
//!
//! Every pass shares one shape: parse the file into a [`Block`], locate the
//! *import prologue* (the leading docstring/shebang trivia plus the
//! contiguous run of top-level import statements that follows it), rebuild
//! the import set the pass cares about, render it, and splice the rendered
//! text back over the prologue's original byte span. Everything outside that
//! span — function bodies, the rest of the module — passes through
//! untouched, byte for byte.

use crate::ast::{Block, ExprKind, StmtKind, TopLevelStmt};
use crate::error::{Diagnostic, PyflybyError, Severity};
use crate::fast_parser::parse;
use crate::format::FormatParams;
use crate::ident::DottedName;
use crate::imports::db::{import_from_stmt_kind, RewriteMap};
use crate::imports::{Import, ImportDB, ImportSet};
use crate::probe::ImportProbe;
use crate::text::FileText;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// The result of a successfully-applied (non-cancelled) rewrite.
#[derive(Debug, Clone)]
pub struct RewriteResult {
    pub text: String,
    pub changed: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Every pass returns this: either it ran to completion, or the caller's
/// cancellation flag was observed set first.
#[derive(Debug, Clone)]
pub enum RewriteOutcome {
    Applied(RewriteResult),
    Cancelled,
}

fn cancelled(cancel: &AtomicBool) -> bool {
    cancel.load(Ordering::Relaxed)
}

fn diagnostic_for(file: &FileText, err: &PyflybyError) -> Diagnostic {
    let filename = file
        .filename()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<stdin>".to_string());
    Diagnostic {
        file: filename,
        line: 0,
        col: 0,
        severity: Severity::Warning,
        message: err.to_string(),
    }
}

// ── Prologue detection ──────────────────────────────────────────────────────

/// One `from M import *` found in the prologue, kept apart from the typed
/// `Import` set since `*` has no bound name to track.
#[derive(Debug, Clone)]
struct StarImport {
    module: Option<DottedName>,
    level: u32,
}

impl StarImport {
    fn render(&self) -> String {
        let dots = ".".repeat(self.level as usize);
        let module = self.module.as_ref().map(|m| m.to_string()).unwrap_or_default();
        format!("from {dots}{module} import *\n")
    }
}

/// The leading docstring/shebang trivia plus the contiguous run of top-level
/// imports that follows it.
struct Prologue {
    /// `[0, pre_trivia_end)`: preserved verbatim ahead of every rewritten
    /// import region (a module docstring, shebang line, or encoding cookie).
    pre_trivia_end: usize,
    /// `[pre_trivia_end, region_end)`: the byte span this prologue's import
    /// statements currently occupy; replaced wholesale by each pass.
    region_end: usize,
    imports: ImportSet,
    star_imports: Vec<StarImport>,
    /// Bound names of imports whose statement carries a `# noqa` pragma —
    /// exempted from removal regardless of usage or probe resolution.
    noqa_bound_names: HashSet<String>,
}

fn is_docstring_stmt(stmt: &crate::ast::Stmt<'_>) -> bool {
    matches!(&stmt.kind, StmtKind::Expr(info) if matches!(info.kind, ExprKind::StringLit(_)))
}

/// Split leading blank and comment-only lines off the front of a statement's
/// own source slice, without consuming any code.
fn split_leading_trivia(slice: &str) -> &str {
    let mut rest = slice;
    loop {
        let line_end = rest.find('\n').map(|i| i + 1).unwrap_or(rest.len());
        let line = &rest[..line_end];
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            rest = &rest[line_end..];
            if line_end == 0 {
                break;
            }
        } else {
            break;
        }
    }
    &slice[..slice.len() - rest.len()]
}

fn has_noqa_pragma(slice: &str) -> bool {
    slice.contains("# noqa") || slice.contains("#noqa")
}

fn detect_prologue(text: &str, block: &Block<'_>) -> Prologue {
    if block.is_empty() {
        return Prologue {
            pre_trivia_end: 0,
            region_end: 0,
            imports: ImportSet::new(),
            star_imports: Vec::new(),
            noqa_bound_names: HashSet::new(),
        };
    }

    let mut idx = 0;
    let pre_trivia_end = if is_docstring_stmt(&block[0].stmt) {
        idx = 1;
        block[0].end as usize
    } else {
        let first = &block[0];
        let slice = &text[first.start as usize..first.end as usize];
        first.start as usize + split_leading_trivia(slice).len()
    };

    let mut imports = ImportSet::new();
    let mut star_imports = Vec::new();
    let mut noqa_bound_names = HashSet::new();
    let mut region_end = pre_trivia_end;

    while idx < block.len() {
        let ts: &TopLevelStmt<'_> = &block[idx];
        if !ts.is_top_level_import_statement() {
            break;
        }
        match &ts.stmt.kind {
            StmtKind::ImportFrom { module, names, level } if names.is_empty() => {
                star_imports.push(StarImport {
                    module: module.and_then(|m| DottedName::parse(m).ok()),
                    level: *level,
                });
            }
            kind => {
                let slice = &text[ts.start as usize..ts.end as usize];
                let stmt_imports = import_from_stmt_kind(kind);
                if has_noqa_pragma(slice) {
                    for imp in &stmt_imports {
                        noqa_bound_names.insert(imp.bound_name().to_string());
                    }
                }
                for imp in stmt_imports {
                    imports.insert(imp);
                }
            }
        }
        region_end = ts.end as usize;
        idx += 1;
    }

    Prologue {
        pre_trivia_end,
        region_end,
        imports,
        star_imports,
        noqa_bound_names,
    }
}

fn render_region(imports: &ImportSet, star_imports: &[StarImport], params: &FormatParams) -> Result<String, PyflybyError> {
    let mut out = String::new();
    if !imports.is_empty() {
        out.push_str(&imports.pretty_print(params, false)?);
    }
    if !star_imports.is_empty() {
        if !out.is_empty() {
            out.push('\n');
        }
        for star in star_imports {
            out.push_str(&star.render());
        }
    }
    Ok(out)
}

/// Splice `rendered` over `[pre_trivia_end, region_end)`, inserting a single
/// blank line on either side when the adjoining text doesn't already have
/// one, so a freshly-written import block never runs straight into a
/// docstring above it or code below it (spec.md §4.9's "separate" policy,
/// extended to the prologue/body boundary).
fn splice(original: &str, pre_trivia_end: usize, region_end: usize, rendered: &str) -> String {
    let prefix = &original[..pre_trivia_end];
    let suffix = &original[region_end..];
    if rendered.is_empty() {
        return format!("{prefix}{suffix}");
    }
    let mut out = String::with_capacity(prefix.len() + rendered.len() + suffix.len() + 2);
    out.push_str(prefix);
    if !prefix.is_empty() && !prefix.ends_with("\n\n") {
        out.push('\n');
    }
    out.push_str(rendered);
    if !suffix.is_empty() && !rendered.ends_with("\n\n") && !suffix.starts_with('\n') {
        out.push('\n');
    }
    out.push_str(suffix);
    out
}

fn finish(original: &str, new_text: String, diagnostics: Vec<Diagnostic>) -> RewriteOutcome {
    RewriteOutcome::Applied(RewriteResult {
        changed: new_text != original,
        text: new_text,
        diagnostics,
    })
}

fn parse_block<'a>(file: &'a FileText) -> Result<Block<'a>, PyflybyError> {
    parse(file.text())
}

// ── reformat_import_statements ──────────────────────────────────────────────

/// Re-render the prologue's existing imports under `params`, without adding,
/// removing, or rewriting any of them.
pub fn reformat_import_statements(
    file: &FileText,
    params: &FormatParams,
    cancel: &AtomicBool,
) -> Result<RewriteOutcome, PyflybyError> {
    if cancelled(cancel) {
        return Ok(RewriteOutcome::Cancelled);
    }
    let block = parse_block(file)?;
    let prologue = detect_prologue(file.text(), &block);
    let rendered = render_region(&prologue.imports, &prologue.star_imports, params)?;
    let text = splice(file.text(), prologue.pre_trivia_end, prologue.region_end, &rendered);
    Ok(finish(file.text(), text, Vec::new()))
}

// ── tidy_imports ─────────────────────────────────────────────────────────────

/// Resolve `missing` names against `db`, drop `unused` imports (respecting
/// `# noqa` retentions), add any not-yet-present `mandatory_imports`, apply
/// `canonical_imports` rewrites, then reformat.
pub fn tidy_imports(
    file: &FileText,
    db: &ImportDB,
    params: &FormatParams,
    include_doc_cross_references: bool,
    cancel: &AtomicBool,
) -> Result<RewriteOutcome, PyflybyError> {
    if cancelled(cancel) {
        return Ok(RewriteOutcome::Cancelled);
    }
    let block = parse_block(file)?;
    let prologue = detect_prologue(file.text(), &block);
    let stmts: Vec<crate::ast::Stmt<'_>> = block.iter().map(|ts| ts.stmt.clone()).collect();

    let analysis = crate::scope::analyze(&stmts, &prologue.imports, include_doc_cross_references);
    let mut diagnostics = Vec::new();

    if cancelled(cancel) {
        return Ok(RewriteOutcome::Cancelled);
    }

    let mut working = prologue.imports.filter(|imp| {
        !analysis.unused.contains(imp) || prologue.noqa_bound_names.contains(imp.bound_name())
    });

    let mut missing_names: Vec<&String> = analysis.missing.iter().collect();
    missing_names.sort();
    for name in missing_names {
        let candidates = db.resolve_missing_name(name);
        match candidates.len() {
            0 => diagnostics.push(diagnostic_for(file, &PyflybyError::NoSuchImport(name.clone()))),
            1 => {
                working.insert(candidates.into_iter().next().expect("len == 1"));
            }
            _ => diagnostics.push(diagnostic_for(
                file,
                &PyflybyError::AmbiguousImport(
                    name.clone(),
                    candidates.iter().map(|i| i.fullname.to_string()).collect(),
                ),
            )),
        }
    }

    for imp in db.mandatory_imports().iter() {
        if !working.contains(imp) {
            working.insert(imp.clone());
        }
    }

    if cancelled(cancel) {
        return Ok(RewriteOutcome::Cancelled);
    }

    let canonicalized = apply_canonical(&working, db.canonical_imports());

    let rendered = render_region(&canonicalized, &prologue.star_imports, params)?;
    let text = splice(file.text(), prologue.pre_trivia_end, prologue.region_end, &rendered);
    Ok(finish(file.text(), text, diagnostics))
}

fn apply_canonical(imports: &ImportSet, canonical: &RewriteMap) -> ImportSet {
    let mut out = ImportSet::new();
    for imp in imports.iter() {
        let mut rewritten = None;
        for (old, new) in canonical {
            if let Some(r) = imp.with_prefix_rewritten(old, new) {
                rewritten = Some(r);
                break;
            }
        }
        out.insert(rewritten.unwrap_or_else(|| imp.clone()));
    }
    out
}

// ── transform_imports / canonicalize_imports ────────────────────────────────

/// Rewrite every prologue `Import` whose `fullname` starts with one of
/// `map`'s keys to the corresponding value, preserving each import's
/// original bound name. Leaves star imports and everything
/// else untouched.
pub fn transform_imports(
    file: &FileText,
    map: &RewriteMap,
    params: &FormatParams,
    cancel: &AtomicBool,
) -> Result<RewriteOutcome, PyflybyError> {
    if cancelled(cancel) {
        return Ok(RewriteOutcome::Cancelled);
    }
    let block = parse_block(file)?;
    let prologue = detect_prologue(file.text(), &block);
    let rewritten = apply_canonical(&prologue.imports, map);
    let rendered = render_region(&rewritten, &prologue.star_imports, params)?;
    let text = splice(file.text(), prologue.pre_trivia_end, prologue.region_end, &rendered);
    Ok(finish(file.text(), text, Vec::new()))
}

/// `transform_imports` against `db.canonical_imports()` (spec.md §4.7,
/// §4.10).
pub fn canonicalize_imports(
    file: &FileText,
    db: &ImportDB,
    params: &FormatParams,
    cancel: &AtomicBool,
) -> Result<RewriteOutcome, PyflybyError> {
    transform_imports(file, db.canonical_imports(), params, cancel)
}

// ── replace_star_imports ─────────────────────────────────────────────────────

/// Ask `probe` for each star import's exports; expand resolvable ones into an
/// explicit, alphabetically ordered import list merged with the prologue's
/// existing imports, and leave unresolvable ones in place with a
/// `ProbeUnavailable` diagnostic.
pub fn replace_star_imports(
    file: &FileText,
    probe: &dyn ImportProbe,
    params: &FormatParams,
    cancel: &AtomicBool,
) -> Result<RewriteOutcome, PyflybyError> {
    if cancelled(cancel) {
        return Ok(RewriteOutcome::Cancelled);
    }
    let block = parse_block(file)?;
    let prologue = detect_prologue(file.text(), &block);
    let mut imports = prologue.imports.clone();
    let mut diagnostics = Vec::new();
    let mut remaining_stars = Vec::new();

    for star in &prologue.star_imports {
        if cancelled(cancel) {
            return Ok(RewriteOutcome::Cancelled);
        }
        let Some(module) = &star.module else {
            diagnostics.push(diagnostic_for(
                file,
                &PyflybyError::ProbeUnavailable(format!("{}*", ".".repeat(star.level as usize))),
            ));
            remaining_stars.push(star.clone());
            continue;
        };
        match probe.exports(module) {
            Some(exports) => {
                let mut sorted: Vec<Import> = exports.iter().cloned().collect();
                sorted.sort_by(|a, b| a.bound_name().to_lowercase().cmp(&b.bound_name().to_lowercase()));
                for imp in sorted {
                    imports.insert(imp);
                }
            }
            None => {
                diagnostics.push(diagnostic_for(file, &PyflybyError::ProbeUnavailable(module.to_string())));
                remaining_stars.push(star.clone());
            }
        }
    }

    let rendered = render_region(&imports, &remaining_stars, params)?;
    let text = splice(file.text(), prologue.pre_trivia_end, prologue.region_end, &rendered);
    Ok(finish(file.text(), text, diagnostics))
}

// ── remove_broken_imports ────────────────────────────────────────────────────

/// Drop every prologue `Import` that `probe.resolves` rejects, keeping
/// `# noqa`-marked imports regardless. Star imports pass
/// through unchanged.
pub fn remove_broken_imports(
    file: &FileText,
    probe: &dyn ImportProbe,
    params: &FormatParams,
    cancel: &AtomicBool,
) -> Result<RewriteOutcome, PyflybyError> {
    if cancelled(cancel) {
        return Ok(RewriteOutcome::Cancelled);
    }
    let block = parse_block(file)?;
    let prologue = detect_prologue(file.text(), &block);
    let mut diagnostics = Vec::new();

    let kept = prologue.imports.filter(|imp| {
        if probe.resolves(imp) || prologue.noqa_bound_names.contains(imp.bound_name()) {
            true
        } else {
            false
        }
    });
    for imp in prologue.imports.iter() {
        if !kept.contains(imp) {
            diagnostics.push(diagnostic_for(file, &PyflybyError::NoSuchImport(imp.fullname.to_string())));
        }
    }

    let rendered = render_region(&kept, &prologue.star_imports, params)?;
    let text = splice(file.text(), prologue.pre_trivia_end, prologue.region_end, &rendered);
    Ok(finish(file.text(), text, diagnostics))
}

// ── collect: batch verb application across files ────────────────────────────

/// One of the seven orchestration primitives, bundled with whatever
/// arguments `collect` needs to apply it per-file.
pub enum Verb<'a> {
    Reformat,
    Tidy {
        db: &'a ImportDB,
        include_doc_cross_references: bool,
    },
    Transform(&'a RewriteMap),
    Canonicalize {
        db: &'a ImportDB,
    },
    ReplaceStar {
        probe: &'a (dyn ImportProbe + 'a),
    },
    RemoveBroken {
        probe: &'a (dyn ImportProbe + 'a),
    },
}

fn run_verb(file: &FileText, verb: &Verb<'_>, params: &FormatParams, cancel: &AtomicBool) -> Result<RewriteOutcome, PyflybyError> {
    match verb {
        Verb::Reformat => reformat_import_statements(file, params, cancel),
        Verb::Tidy { db, include_doc_cross_references } => {
            tidy_imports(file, db, params, *include_doc_cross_references, cancel)
        }
        Verb::Transform(map) => transform_imports(file, map, params, cancel),
        Verb::Canonicalize { db } => canonicalize_imports(file, db, params, cancel),
        Verb::ReplaceStar { probe } => replace_star_imports(file, *probe, params, cancel),
        Verb::RemoveBroken { probe } => remove_broken_imports(file, *probe, params, cancel),
    }
}

/// The outcome of applying a verb to one file in a [`collect`] batch: either
/// a rewrite result/cancellation, or the `Err` that kept this file from
/// being read or parsed — which never aborts the rest of the batch.
pub struct FileResult {
    pub path: PathBuf,
    pub outcome: Result<RewriteOutcome, PyflybyError>,
}

/// Apply `verb` to every file in `files` in parallel (spec.md §5's rayon
/// fan-out), collecting one [`FileResult`] per file regardless of whether
/// that file's own read/parse/rewrite failed.
pub fn collect(files: &[PathBuf], verb: &Verb<'_>, params: &FormatParams, cancel: &AtomicBool) -> Vec<FileResult> {
    files
        .par_iter()
        .map(|path| {
            if cancelled(cancel) {
                return FileResult {
                    path: path.clone(),
                    outcome: Ok(RewriteOutcome::Cancelled),
                };
            }
            let outcome = read_and_rewrite(path, verb, params, cancel);
            FileResult {
                path: path.clone(),
                outcome,
            }
        })
        .collect()
}

fn read_and_rewrite(path: &Path, verb: &Verb<'_>, params: &FormatParams, cancel: &AtomicBool) -> Result<RewriteOutcome, PyflybyError> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| PyflybyError::ImportFormat(format!("{}: {e}", path.display())))?;
    let file = FileText::from_string(source, Some(path.to_path_buf()));
    run_verb(&file, verb, params, cancel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imports::db::PathSpec;

    fn dn(s: &str) -> DottedName {
        DottedName::parse(s).unwrap()
    }

    fn ft(src: &str) -> FileText {
        FileText::from_string(src.to_string(), None)
    }

    fn applied(outcome: RewriteOutcome) -> RewriteResult {
        match outcome {
            RewriteOutcome::Applied(r) => r,
            RewriteOutcome::Cancelled => panic!("expected Applied, got Cancelled"),
        }
    }

    struct ExportsNumpy;
    impl ImportProbe for ExportsNumpy {
        fn exports(&self, module: &DottedName) -> Option<ImportSet> {
            if module.to_string() == "numpy" {
                Some(ImportSet::from_imports([
                    Import::new_from_style(dn("numpy.zeros"), None, 0),
                    Import::new_from_style(dn("numpy.arange"), None, 0),
                ]))
            } else {
                None
            }
        }
        fn resolves(&self, _imp: &Import) -> bool {
            true
        }
    }

    struct ResolvesOnly(&'static str);
    impl ImportProbe for ResolvesOnly {
        fn exports(&self, _module: &DottedName) -> Option<ImportSet> {
            None
        }
        fn resolves(&self, imp: &Import) -> bool {
            imp.fullname.first_atom() == self.0
        }
    }

    #[test]
    fn test_reformat_sorts_plain_imports_one_per_line() {
        let file = ft("import sys\nimport os\n\nprint(os.getcwd(), sys.argv)\n");
        let cancel = AtomicBool::new(false);
        let result = applied(reformat_import_statements(&file, &FormatParams::default(), &cancel).unwrap());
        assert!(result.text.starts_with("import os\nimport sys\n"));
        assert!(result.text.contains("print(os.getcwd(), sys.argv)"));
    }

    #[test]
    fn test_reformat_plain_import_order_is_insensitive_to_input_order() {
        let cancel = AtomicBool::new(false);
        let a = applied(
            reformat_import_statements(
                &ft("import sys\nimport os\n\npass\n"),
                &FormatParams::default(),
                &cancel,
            )
            .unwrap(),
        );
        let b = applied(
            reformat_import_statements(
                &ft("import os\nimport sys\n\npass\n"),
                &FormatParams::default(),
                &cancel,
            )
            .unwrap(),
        );
        assert_eq!(a.text, b.text);
        assert!(a.text.starts_with("import os\nimport sys\n"));
    }

    #[test]
    fn test_tidy_removes_unused_and_adds_mandatory() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("known.py"),
            "__mandatory_imports__ = ['from __future__ import print_function']\n",
        )
        .unwrap();
        let spec = PathSpec::from_roots(vec![dir.path().to_path_buf()]);
        let (db, _) = ImportDB::load(&spec, &dir.path().join("target.py"));

        let file = ft("import os, sys\nprint(os.getcwd())\n");
        let cancel = AtomicBool::new(false);
        let result = applied(tidy_imports(&file, &db, &FormatParams::default(), false, &cancel).unwrap());

        assert!(result.text.contains("from __future__ import print_function"));
        assert!(result.text.contains("import os"));
        assert!(!result.text.contains("sys"));
    }

    #[test]
    fn test_tidy_keeps_future_directive_with_no_other_usage() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("known.py"), "").unwrap();
        let spec = PathSpec::from_roots(vec![dir.path().to_path_buf()]);
        let (db, _) = ImportDB::load(&spec, &dir.path().join("target.py"));

        let file = ft("from __future__ import annotations\n\nx = 1\n");
        let cancel = AtomicBool::new(false);
        let result = applied(tidy_imports(&file, &db, &FormatParams::default(), false, &cancel).unwrap());

        assert!(result.text.contains("from __future__ import annotations"));
    }

    #[test]
    fn test_tidy_resolves_missing_from_known_imports() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("known.py"), "import re\n").unwrap();
        let spec = PathSpec::from_roots(vec![dir.path().to_path_buf()]);
        let (db, _) = ImportDB::load(&spec, &dir.path().join("target.py"));

        let file = ft("re.search('[a-z]+', 'hello')\n");
        let cancel = AtomicBool::new(false);
        let result = applied(tidy_imports(&file, &db, &FormatParams::default(), false, &cancel).unwrap());

        assert!(result.text.starts_with("import re\n"));
        assert!(result.text.contains("re.search"));
    }

    #[test]
    fn test_tidy_leaves_ambiguous_name_missing_with_diagnostic() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("known.py"), "from numpy import arange\nfrom dask.array import arange\n").unwrap();
        let spec = PathSpec::from_roots(vec![dir.path().to_path_buf()]);
        let (db, _) = ImportDB::load(&spec, &dir.path().join("target.py"));

        let file = ft("arange(10)\n");
        let cancel = AtomicBool::new(false);
        let result = applied(tidy_imports(&file, &db, &FormatParams::default(), false, &cancel).unwrap());
        assert!(!result.text.contains("import"));
        assert!(result.diagnostics.iter().any(|d| d.message.contains("ambiguous")));
    }

    #[test]
    fn test_tidy_respects_noqa_retention() {
        let file = ft("import os  # noqa\nprint('hi')\n");
        let cancel = AtomicBool::new(false);
        let result = applied(tidy_imports(&file, &ImportDB::empty(), &FormatParams::default(), false, &cancel).unwrap());
        assert!(result.text.contains("import os"));
    }

    #[test]
    fn test_transform_rewrites_prefix_preserving_bound_name() {
        let file = ft("import numpy\nnumpy.arange(3)\n");
        let mut map = RewriteMap::new();
        map.insert(dn("numpy"), dn("numpy2"));
        let cancel = AtomicBool::new(false);
        let result = applied(transform_imports(&file, &map, &FormatParams::default(), &cancel).unwrap());
        assert!(result.text.starts_with("import numpy2 as numpy\n"));
    }

    #[test]
    fn test_replace_star_imports_expands_resolvable_module() {
        let file = ft("from numpy import *\nzeros(3)\n");
        let cancel = AtomicBool::new(false);
        let result = applied(replace_star_imports(&file, &ExportsNumpy, &FormatParams::default(), &cancel).unwrap());
        assert!(result.text.contains("from numpy import arange, zeros"));
        assert!(!result.text.contains('*'));
    }

    #[test]
    fn test_replace_star_imports_leaves_unresolvable_with_diagnostic() {
        let file = ft("from unknownmod import *\nfoo()\n");
        let cancel = AtomicBool::new(false);
        let result = applied(replace_star_imports(&file, &crate::probe::NullProbe, &FormatParams::default(), &cancel).unwrap());
        assert!(result.text.contains("from unknownmod import *"));
        assert!(result.diagnostics.iter().any(|d| d.message.contains("probe")));
    }

    #[test]
    fn test_remove_broken_imports_drops_unresolvable() {
        let file = ft("import os\nimport nonexistentpkg\nos.getcwd()\n");
        let cancel = AtomicBool::new(false);
        let result = applied(remove_broken_imports(&file, &ResolvesOnly("os"), &FormatParams::default(), &cancel).unwrap());
        assert!(result.text.contains("import os"));
        assert!(!result.text.contains("nonexistentpkg"));
    }

    #[test]
    fn test_remove_broken_imports_keeps_noqa_marked() {
        let file = ft("import nonexistentpkg  # noqa\n");
        let cancel = AtomicBool::new(false);
        let result = applied(remove_broken_imports(&file, &ResolvesOnly("os"), &FormatParams::default(), &cancel).unwrap());
        assert!(result.text.contains("nonexistentpkg"));
    }

    #[test]
    fn test_cancellation_short_circuits() {
        let file = ft("import os\n");
        let cancel = AtomicBool::new(true);
        let outcome = reformat_import_statements(&file, &FormatParams::default(), &cancel).unwrap();
        assert!(matches!(outcome, RewriteOutcome::Cancelled));
    }

    #[test]
    fn test_reformat_preserves_module_docstring() {
        let file = ft("\"\"\"Module doc.\"\"\"\nimport os\nos.getcwd()\n");
        let cancel = AtomicBool::new(false);
        let result = applied(reformat_import_statements(&file, &FormatParams::default(), &cancel).unwrap());
        assert!(result.text.starts_with("\"\"\"Module doc.\"\"\"\n"));
    }

    #[test]
    fn test_collect_applies_verb_across_files_independently() {
        let dir = tempfile::TempDir::new().unwrap();
        let a = dir.path().join("a.py");
        let b = dir.path().join("b.py");
        std::fs::write(&a, "import sys\nimport os\nos.getcwd()\n").unwrap();
        std::fs::write(&b, "def f(\n").unwrap(); // unclosed paren: parse error, must not abort the batch

        let cancel = AtomicBool::new(false);
        let results = collect(&[a.clone(), b.clone()], &Verb::Reformat, &FormatParams::default(), &cancel);
        assert_eq!(results.len(), 2);
        let a_result = results.iter().find(|r| r.path == a).unwrap();
        assert!(a_result.outcome.is_ok());
        let b_result = results.iter().find(|r| r.path == b).unwrap();
        assert!(b_result.outcome.is_err());
    }
}
