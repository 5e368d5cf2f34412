use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use pyflyby::error::{Diagnostic, Severity};
use pyflyby::format::FormatParams;
use pyflyby::ident::DottedName;
use pyflyby::imports::db::{ImportDB, PathSpec, RewriteMap};
use pyflyby::probe::{ImportProbe, NullProbe};
use pyflyby::rewriter::{self, FileResult, RewriteOutcome, Verb};
use pyflyby::text::FileText;
use serde_json::json;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::AtomicBool;

mod banner;

#[derive(Parser)]
#[command(
    name = "pyflyby",
    version,
    about = "Automatic maintenance of Python import statements",
    long_about = "pyflyby rewrites the import prologue of Python source files: adds \
                  missing imports, drops unused ones, reformats, canonicalizes, and \
                  expands star imports.\n\n\
                  Run `pyflyby` with no arguments to see an overview of all verbs."
)]
struct Cli {
    #[command(subcommand)]
    verb: Option<VerbCmd>,
}

#[derive(Subcommand)]
enum VerbCmd {
    /// Add missing imports, drop unused ones, apply mandatory/canonical rules.
    Tidy(CommonArgs),
    /// Re-render the existing prologue imports, unchanged otherwise.
    Reformat(CommonArgs),
    /// Rewrite dotted-prefix `OLD -> NEW` across the prologue's imports.
    Transform {
        #[command(flatten)]
        common: CommonArgs,
        /// `OLD=NEW` dotted-prefix rewrite; may be repeated.
        #[arg(long = "map", value_parser = parse_map_entry)]
        map: Vec<(String, String)>,
    },
    /// Like transform, using the import database's `__canonical_imports__`.
    Canonicalize(CommonArgs),
    /// Expand `from M import *` via the import probe.
    ReplaceStar(CommonArgs),
    /// Drop imports the import probe reports as unresolvable.
    RemoveBroken(CommonArgs),
    /// Apply one verb over many files in parallel.
    Collect {
        /// tidy, reformat, transform, canonicalize, replace-star, or remove-broken.
        inner_verb: String,
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long = "map", value_parser = parse_map_entry)]
        map: Vec<(String, String)>,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Files or directories to process; omit (or pass `-`) to read one file from stdin.
    paths: Vec<PathBuf>,

    /// Write the result back to disk instead of printing a diff.
    #[arg(long)]
    write: bool,

    /// Show the diff and ask for confirmation before writing each file.
    #[arg(long)]
    prompt: bool,

    /// Emit diagnostics (and, for stdin, the rewritten text) as JSON.
    #[arg(long)]
    json: bool,

    /// Import database path spec (see `PYFLYBY_PATH`); defaults to `-`.
    #[arg(long)]
    db: Option<String>,

    /// Cross-reference backtick-quoted names in docstrings against `unused`.
    #[arg(long)]
    doc_cross_references: bool,

    /// Directory names to skip when expanding a path that is a directory.
    #[arg(long)]
    exclude: Vec<String>,
}

fn parse_map_entry(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((old, new)) if !old.is_empty() && !new.is_empty() => {
            Ok((old.to_string(), new.to_string()))
        }
        _ => Err(format!("expected OLD=NEW, got `{s}`")),
    }
}

fn rewrite_map_from(pairs: &[(String, String)]) -> Result<RewriteMap> {
    let mut map = RewriteMap::new();
    for (old, new) in pairs {
        let old = DottedName::parse(old).with_context(|| format!("invalid module name `{old}`"))?;
        let new = DottedName::parse(new).with_context(|| format!("invalid module name `{new}`"))?;
        map.insert(old, new);
    }
    Ok(map)
}

fn path_spec_from(db: &Option<String>) -> PathSpec {
    let spec = db
        .clone()
        .or_else(|| std::env::var("PYFLYBY_PATH").ok())
        .unwrap_or_else(|| "-".to_string());
    PathSpec::parse(&spec)
}

// ── Path resolution ─────────────────────────────────────────────────────────

/// `true` iff `paths` is exactly the stdin sentinel (no paths, or `-` alone).
fn reads_stdin(paths: &[PathBuf]) -> bool {
    paths.is_empty() || (paths.len() == 1 && paths[0] == PathBuf::from("-"))
}

fn resolve_file_list(paths: &[PathBuf], exclude: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(pyflyby::discovery::discover_python_files(path, exclude)?);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

fn load_db(common: &CommonArgs, files: &[PathBuf]) -> ImportDB {
    let spec = path_spec_from(&common.db);
    let target = files.first().cloned().unwrap_or_else(|| PathBuf::from("."));
    let (db, load_errors) = ImportDB::load(&spec, &target);
    for e in &load_errors {
        eprintln!("{}: {e}", "warning".yellow().bold());
    }
    db
}

// ── Output ──────────────────────────────────────────────────────────────────

fn unified_diff(path: &str, before: &str, after: &str) -> String {
    similar::TextDiff::from_lines(before, after)
        .unified_diff()
        .header(&format!("a/{path}"), &format!("b/{path}"))
        .to_string()
}

fn print_diff(diff: &str) {
    for line in diff.lines() {
        let coloured = if line.starts_with('+') && !line.starts_with("+++") {
            line.green()
        } else if line.starts_with('-') && !line.starts_with("---") {
            line.red()
        } else if line.starts_with("@@") {
            line.cyan()
        } else {
            line.normal()
        };
        println!("{coloured}");
    }
}

fn confirm(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    let _ = io::stdout().flush();
    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Rolls up every file's outcome into the three facts that decide the exit code.
struct Summary {
    any_fatal: bool,
    any_changed: bool,
    any_diagnostics: bool,
}

impl Summary {
    fn new() -> Self {
        Self {
            any_fatal: false,
            any_changed: false,
            any_diagnostics: false,
        }
    }

    fn exit_code(&self) -> i32 {
        if self.any_fatal {
            1
        } else if !self.any_changed && self.any_diagnostics {
            100
        } else {
            0
        }
    }
}

fn apply_file_result(
    path: &PathBuf,
    outcome: RewriteOutcome,
    common: &CommonArgs,
    summary: &mut Summary,
) -> Vec<Diagnostic> {
    let RewriteOutcome::Applied(result) = outcome else {
        return Vec::new();
    };
    if !result.diagnostics.is_empty() {
        summary.any_diagnostics = true;
    }
    if !result.changed {
        return result.diagnostics;
    }
    summary.any_changed = true;

    let before = std::fs::read_to_string(path).unwrap_or_default();
    let diff = unified_diff(&path.display().to_string(), &before, &result.text);

    if common.write {
        let do_write = !common.prompt || {
            print_diff(&diff);
            confirm(&format!("Apply changes to {}?", path.display()))
        };
        if do_write {
            if let Err(e) = std::fs::write(path, &result.text) {
                eprintln!("{}: {}: {e}", path.display(), "error".red().bold());
                summary.any_fatal = true;
            }
        }
    } else if !common.json {
        // --json reserves stdout for the structured diagnostics array.
        println!("{}", format!("--- {}", path.display()).bold());
        print_diff(&diff);
    }
    result.diagnostics
}

fn print_diagnostics(diagnostics: &[Diagnostic], json: bool) {
    if diagnostics.is_empty() {
        return;
    }
    if json {
        let payload: Vec<_> = diagnostics
            .iter()
            .map(|d| {
                json!({
                    "file": d.file,
                    "line": d.line,
                    "col": d.col,
                    "severity": d.severity.to_string(),
                    "message": d.message,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload).unwrap());
    } else {
        for d in diagnostics {
            let line = d.to_string();
            let coloured = match d.severity {
                Severity::Error => line.red(),
                Severity::Warning => line.yellow(),
            };
            eprintln!("{coloured}");
        }
    }
}

// ── Per-verb dispatch ────────────────────────────────────────────────────────

fn run_on_files(files: &[PathBuf], verb: &Verb<'_>, params: &FormatParams, common: &CommonArgs) -> Summary {
    let cancel = AtomicBool::new(false);
    let results: Vec<FileResult> = rewriter::collect(files, verb, params, &cancel);

    let mut summary = Summary::new();
    let mut all_diagnostics = Vec::new();

    for FileResult { path, outcome } in results {
        match outcome {
            Ok(outcome) => {
                let diags = apply_file_result(&path, outcome, common, &mut summary);
                all_diagnostics.extend(diags);
            }
            Err(e) => {
                summary.any_fatal = true;
                all_diagnostics.push(Diagnostic {
                    file: path.display().to_string(),
                    line: 0,
                    col: 0,
                    severity: Severity::Error,
                    message: e.to_string(),
                });
            }
        }
    }

    print_diagnostics(&all_diagnostics, common.json);
    summary
}

fn run_on_stdin(verb: &Verb<'_>, params: &FormatParams, common: &CommonArgs) -> Result<Summary> {
    let mut source = String::new();
    io::stdin().read_to_string(&mut source).context("reading stdin")?;
    let file = FileText::from_string(source, None);
    let cancel = AtomicBool::new(false);

    let outcome = match verb {
        Verb::Reformat => rewriter::reformat_import_statements(&file, params, &cancel),
        Verb::Tidy { db, include_doc_cross_references } => {
            rewriter::tidy_imports(&file, db, params, *include_doc_cross_references, &cancel)
        }
        Verb::Transform(map) => rewriter::transform_imports(&file, map, params, &cancel),
        Verb::Canonicalize { db } => rewriter::canonicalize_imports(&file, db, params, &cancel),
        Verb::ReplaceStar { probe } => rewriter::replace_star_imports(&file, *probe, params, &cancel),
        Verb::RemoveBroken { probe } => rewriter::remove_broken_imports(&file, *probe, params, &cancel),
    }
    .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let mut summary = Summary::new();

    let RewriteOutcome::Applied(result) = outcome else {
        return Ok(summary);
    };
    summary.any_changed = result.changed;
    summary.any_diagnostics = !result.diagnostics.is_empty();

    if common.json {
        let payload = json!({
            "text": result.text,
            "changed": result.changed,
            "diagnostics": result.diagnostics.iter().map(|d| json!({
                "file": d.file, "line": d.line, "col": d.col,
                "severity": d.severity.to_string(), "message": d.message,
            })).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&payload).unwrap());
    } else {
        print!("{}", result.text);
        print_diagnostics(&result.diagnostics, false);
    }

    Ok(summary)
}

/// Run `verb` over whatever `common.paths` resolves to (stdin or a file list).
fn run_common(common: &CommonArgs, verb: &Verb<'_>, params: &FormatParams) -> Result<i32> {
    if reads_stdin(&common.paths) {
        Ok(run_on_stdin(verb, params, common)?.exit_code())
    } else {
        let files = resolve_file_list(&common.paths, &common.exclude)?;
        Ok(run_on_files(&files, verb, params, common).exit_code())
    }
}

fn dispatch(verb_cmd: VerbCmd) -> Result<i32> {
    let params = FormatParams::default();

    match &verb_cmd {
        VerbCmd::Reformat(common) => run_common(common, &Verb::Reformat, &params),
        VerbCmd::Tidy(common) => {
            let files = if reads_stdin(&common.paths) {
                Vec::new()
            } else {
                resolve_file_list(&common.paths, &common.exclude)?
            };
            let db = load_db(common, &files);
            let verb = Verb::Tidy {
                db: &db,
                include_doc_cross_references: common.doc_cross_references,
            };
            run_common(common, &verb, &params)
        }
        VerbCmd::Canonicalize(common) => {
            let files = if reads_stdin(&common.paths) {
                Vec::new()
            } else {
                resolve_file_list(&common.paths, &common.exclude)?
            };
            let db = load_db(common, &files);
            let verb = Verb::Canonicalize { db: &db };
            run_common(common, &verb, &params)
        }
        VerbCmd::Transform { common, map } => {
            let rewrite_map = rewrite_map_from(map)?;
            run_common(common, &Verb::Transform(&rewrite_map), &params)
        }
        VerbCmd::ReplaceStar(common) => {
            let probe = NullProbe;
            run_common(common, &Verb::ReplaceStar { probe: &probe as &dyn ImportProbe }, &params)
        }
        VerbCmd::RemoveBroken(common) => {
            let probe = NullProbe;
            run_common(common, &Verb::RemoveBroken { probe: &probe as &dyn ImportProbe }, &params)
        }
        VerbCmd::Collect { inner_verb, common, map } => {
            if reads_stdin(&common.paths) {
                eprintln!("{}: `collect` requires at least one file or directory path", "error".red().bold());
                return Ok(2);
            }
            let files = resolve_file_list(&common.paths, &common.exclude)?;
            if files.is_empty() {
                eprintln!("{}: `collect` requires at least one file or directory path", "error".red().bold());
                return Ok(2);
            }
            if !matches!(
                inner_verb.as_str(),
                "reformat" | "tidy" | "canonicalize" | "transform" | "replace-star" | "remove-broken"
            ) {
                eprintln!(
                    "{}: unknown verb `{inner_verb}` (expected tidy, reformat, transform, canonicalize, replace-star, remove-broken)",
                    "error".red().bold()
                );
                return Ok(2);
            }
            let rewrite_map = rewrite_map_from(map)?;
            let probe = NullProbe;
            let db;
            let verb = match inner_verb.as_str() {
                "reformat" => Verb::Reformat,
                "tidy" => {
                    db = load_db(common, &files);
                    Verb::Tidy { db: &db, include_doc_cross_references: common.doc_cross_references }
                }
                "canonicalize" => {
                    db = load_db(common, &files);
                    Verb::Canonicalize { db: &db }
                }
                "transform" => Verb::Transform(&rewrite_map),
                "replace-star" => Verb::ReplaceStar { probe: &probe as &dyn ImportProbe },
                _ => Verb::RemoveBroken { probe: &probe as &dyn ImportProbe },
            };
            Ok(run_on_files(&files, &verb, &params, common).exit_code())
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let Some(verb_cmd) = cli.verb else {
        banner::show_welcome();
        process::exit(0);
    };

    match dispatch(verb_cmd) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            process::exit(1);
        }
    }
}
