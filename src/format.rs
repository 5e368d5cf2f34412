//! Import formatting: group ordering, alignment, and line-wrapping.

use crate::error::PyflybyError;
use crate::imports::collections::ImportSet;
use crate::imports::stmt::{Import, ImportStatement};

/// When/how to wrap a multi-import `from` statement onto several lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HangingIndent {
    #[default]
    Auto,
    Never,
    Always,
}

/// How the `import` keyword (or first alias column, in hanging form) aligns
/// across a group of `from`-statements with differing module-name widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignImports {
    #[default]
    None,
    /// Align at the next multiple of this tab stop past the longest `from M`.
    Tabstop(usize),
    /// Align at this fixed absolute column.
    Column(usize),
}

/// Rendering configuration, matching pyflyby's historical defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatParams {
    pub align_imports: AlignImports,
    pub from_spaces: usize,
    pub separate_from_imports: bool,
    pub align_future: bool,
    pub hanging_indent: HangingIndent,
    pub max_line_length: usize,
    pub indent_continuation: usize,
    pub use_parens: bool,
}

impl Default for FormatParams {
    fn default() -> Self {
        Self {
            align_imports: AlignImports::None,
            from_spaces: 1,
            separate_from_imports: false,
            align_future: false,
            hanging_indent: HangingIndent::Auto,
            max_line_length: 79,
            indent_continuation: 4,
            use_parens: false,
        }
    }
}

// ── Single-statement rendering ─────────────────────────────────────────────

/// `from`-header text, or `None` for a plain `import ...` statement.
fn header_text(stmt: &ImportStatement) -> Option<String> {
    if stmt.level == 0 && stmt.from_module.is_none() {
        return None;
    }
    let dots = ".".repeat(stmt.level as usize);
    let module = stmt
        .from_module
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_default();
    Some(format!("from {dots}{module}"))
}

/// The bare member name this import contributes to a `from`-statement's
/// alias list (the suffix of `fullname` beyond the shared `from_module`).
fn member_of(stmt: &ImportStatement, imp: &Import) -> String {
    match &stmt.from_module {
        Some(m) => {
            let atoms = imp.fullname.atoms();
            atoms[m.len().min(atoms.len())..].join(".")
        }
        None => imp.fullname.to_string(),
    }
}

fn alias_text(member: &str, import_as: Option<&str>) -> String {
    match import_as {
        Some(a) => format!("{member} as {a}"),
        None => member.to_string(),
    }
}

/// Render one [`ImportStatement`], choosing a single line when it fits and a
/// parenthesised hanging-indent form otherwise.
pub fn render_import_statement(stmt: &ImportStatement, params: &FormatParams) -> String {
    match header_text(stmt) {
        None => render_plain(stmt),
        Some(header) => render_from(stmt, &header, params, None),
    }
}

fn render_plain(stmt: &ImportStatement) -> String {
    // `group_into_statements` never folds two plain imports into one
    // statement (spec §4.9 item 2: one `import X` per line, sorted), so in
    // practice this sees exactly one `Import`; a comma-joined list here
    // only matters for a statement parsed straight from `import a, b` source
    // and re-rendered without going through grouping first.
    let names: Vec<String> = stmt
        .imports()
        .iter()
        .map(|imp| match &imp.import_as {
            Some(a) => format!("{} as {a}", imp.fullname),
            None => imp.fullname.to_string(),
        })
        .collect();
    format!("import {}\n", names.join(", "))
}

/// Column the `import` keyword starts at, given the header text and the
/// alignment policy in force for its group.
fn align_gap(header: &str, params: &FormatParams, align_col: Option<usize>) -> String {
    let min_gap = params.from_spaces.max(1);
    match align_col {
        Some(col) if col > header.len() => " ".repeat(col - header.len()),
        _ => " ".repeat(min_gap),
    }
}

fn render_from(stmt: &ImportStatement, header: &str, params: &FormatParams, align_col: Option<usize>) -> String {
    let mut aliases: Vec<String> = stmt
        .imports()
        .iter()
        .map(|imp| alias_text(&member_of(stmt, imp), imp.import_as.as_deref()))
        .collect();
    // Single-line candidate uses declaration order; the hanging form below
    // sorts separately by `(import_as or member)`.
    let gap = align_gap(header, params, align_col);
    let single_line = format!("{header}{gap}import {}\n", aliases.join(", "));

    let force_wrap =
        params.hanging_indent == HangingIndent::Always || (params.use_parens && aliases.len() > 1);
    let fits = single_line.trim_end_matches('\n').len() <= params.max_line_length;
    if fits && !force_wrap {
        return single_line;
    }
    if params.hanging_indent == HangingIndent::Never {
        return single_line;
    }

    aliases.sort_by_key(|a| a.to_lowercase());
    let indent = " ".repeat(params.indent_continuation);
    let mut out = format!("{header} import (\n");
    for alias in &aliases {
        out.push_str(&indent);
        out.push_str(alias);
        out.push_str(",\n");
    }
    out.push_str(")\n");
    out
}

// ── Group ordering ──────────────────────────────────────────

fn is_future(stmt: &ImportStatement) -> bool {
    stmt.from_module.as_ref().is_some_and(|m| m.to_string() == "__future__")
}

/// Order statements: future-directive imports always first; then, per
/// `separate_from_imports`, either two further blocks (plain `import X`
/// sorted by lower-cased `fullname`, then `from X import ...` sorted by
/// lower-cased `from_module`) or one merged, interleaved block sorted by the
/// same per-kind key.
fn sort_key(stmt: &ImportStatement, separate_from_imports: bool) -> (u8, String) {
    let group = if is_future(stmt) {
        0
    } else if !separate_from_imports {
        1
    } else if stmt.from_module.is_none() {
        1
    } else {
        2
    };
    let key = match &stmt.from_module {
        Some(m) => m.to_string().to_lowercase(),
        None => stmt
            .imports()
            .first()
            .map(|i| i.fullname.to_string().to_lowercase())
            .unwrap_or_default(),
    };
    (group, key)
}

/// Alignment column for a contiguous run of `from`-statements sharing one
/// group, per `params.align_imports`: `Tabstop(n)` lands on the
/// next multiple of `n` past the run's longest header; `Column(c)` is fixed.
fn group_align_col(headers: &[&str], params: &FormatParams) -> Option<usize> {
    match params.align_imports {
        AlignImports::None => None,
        AlignImports::Column(c) => Some(c),
        AlignImports::Tabstop(n) if n > 0 => {
            let max_len = headers.iter().map(|h| h.len()).max().unwrap_or(0);
            Some((max_len / n + 1) * n)
        }
        AlignImports::Tabstop(_) => None,
    }
}

/// Render every statement in an [`ImportSet`], grouped and ordered by
/// `params`, and concatenated with blank-line separators between groups.
pub fn render_import_set(
    set: &ImportSet,
    params: &FormatParams,
    allow_conflicts: bool,
) -> Result<String, PyflybyError> {
    let statements = set.group_into_statements(allow_conflicts)?;
    let mut ordered: Vec<&ImportStatement> = statements.iter().collect();
    ordered.sort_by(|a, b| {
        sort_key(a, params.separate_from_imports).cmp(&sort_key(b, params.separate_from_imports))
    });

    // Alignment is computed per contiguous same-group run of `from`-style
    // statements — headers from one group never pad a different group's gap.
    let headers: Vec<Option<String>> = ordered.iter().map(|s| header_text(s)).collect();
    let groups: Vec<u8> = ordered
        .iter()
        .map(|s| sort_key(s, params.separate_from_imports).0)
        .collect();
    let mut align_cols: Vec<Option<usize>> = vec![None; ordered.len()];
    let mut start = 0;
    while start < ordered.len() {
        let mut end = start + 1;
        while end < ordered.len() && groups[end] == groups[start] {
            end += 1;
        }
        let run_headers: Vec<&str> = headers[start..end]
            .iter()
            .filter_map(|h| h.as_deref())
            .collect();
        if !run_headers.is_empty() {
            let col = group_align_col(&run_headers, params);
            for slot in align_cols.iter_mut().take(end).skip(start) {
                *slot = col;
            }
        }
        start = end;
    }

    let mut out = String::new();
    let mut prev_group: Option<u8> = None;
    for (i, stmt) in ordered.iter().enumerate() {
        let group = groups[i];
        if let Some(prev) = prev_group {
            if prev != group {
                out.push('\n');
            }
        }
        let rendered = match &headers[i] {
            None => render_plain(stmt),
            Some(header) if is_future(stmt) && params.align_future => {
                let mut future_params = params.clone();
                future_params.hanging_indent = HangingIndent::Always;
                render_from(stmt, header, &future_params, None)
            }
            Some(header) => render_from(stmt, header, params, align_cols[i]),
        };
        out.push_str(&rendered);
        prev_group = Some(group);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::DottedName;

    fn dn(s: &str) -> DottedName {
        DottedName::parse(s).unwrap()
    }

    #[test]
    fn test_render_plain_single() {
        let stmt = ImportStatement::new(None, 0, vec![Import::new(dn("os"), None, 0)]).unwrap();
        assert_eq!(
            render_import_statement(&stmt, &FormatParams::default()),
            "import os\n"
        );
    }

    #[test]
    fn test_render_from_single_line() {
        let stmt = ImportStatement::new(
            Some(dn("os")),
            0,
            vec![Import::new(dn("os.path"), None, 0)],
        )
        .unwrap();
        assert_eq!(
            render_import_statement(&stmt, &FormatParams::default()),
            "from os import path\n"
        );
    }

    #[test]
    fn test_render_from_wraps_when_too_long() {
        let long_module = dn("a.very.long.dotted.module.path.that.pushes.past.the.line.width.limit");
        let stmt = ImportStatement::new(
            Some(long_module.clone()),
            0,
            vec![
                Import::new(
                    DottedName::new([long_module.atoms().to_vec(), vec!["first_name".to_string()]].concat()),
                    None,
                    0,
                ),
                Import::new(
                    DottedName::new([long_module.atoms().to_vec(), vec!["second_name".to_string()]].concat()),
                    None,
                    0,
                ),
            ],
        )
        .unwrap();
        let rendered = render_import_statement(&stmt, &FormatParams::default());
        assert!(rendered.contains("import (\n"));
        assert!(rendered.trim_end().ends_with(')'));
    }

    #[test]
    fn test_render_bare_relative_import() {
        let stmt = ImportStatement::new(None, 1, vec![Import::new(dn("sibling"), None, 1)]).unwrap();
        assert_eq!(
            render_import_statement(&stmt, &FormatParams::default()),
            "from . import sibling\n"
        );
    }
}
