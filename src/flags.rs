//! Compiler flags: the finite set of `__future__` directives.
//!
//! Hand-rolled bitset over a `u16` rather than pulling in the `bitflags`
//! crate, matching `fast_parser::lexer`'s hand-rolled indent stack.

use crate::ast::{Stmt, StmtKind};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompilerFlags(u16);

impl CompilerFlags {
    pub const NONE: CompilerFlags = CompilerFlags(0);
    pub const DIVISION: CompilerFlags = CompilerFlags(1 << 0);
    pub const ABSOLUTE_IMPORT: CompilerFlags = CompilerFlags(1 << 1);
    pub const PRINT_FUNCTION: CompilerFlags = CompilerFlags(1 << 2);
    pub const UNICODE_LITERALS: CompilerFlags = CompilerFlags(1 << 3);
    pub const WITH_STATEMENT: CompilerFlags = CompilerFlags(1 << 4);
    pub const GENERATOR_STOP: CompilerFlags = CompilerFlags(1 << 5);
    pub const ANNOTATIONS: CompilerFlags = CompilerFlags(1 << 6);

    pub fn contains(self, other: CompilerFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn union(self, other: CompilerFlags) -> CompilerFlags {
        CompilerFlags(self.0 | other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    fn from_future_name(name: &str) -> Option<CompilerFlags> {
        Some(match name {
            "division" => CompilerFlags::DIVISION,
            "absolute_import" => CompilerFlags::ABSOLUTE_IMPORT,
            "print_function" => CompilerFlags::PRINT_FUNCTION,
            "unicode_literals" => CompilerFlags::UNICODE_LITERALS,
            "with_statement" => CompilerFlags::WITH_STATEMENT,
            "generator_stop" => CompilerFlags::GENERATOR_STOP,
            "annotations" => CompilerFlags::ANNOTATIONS,
            _ => return None,
        })
    }

    /// Union of every `__future__` directive declared by leading top-level
    /// `from __future__ import ...` statements in `stmts`.
    pub fn from_future_imports(stmts: &[Stmt<'_>]) -> CompilerFlags {
        let mut flags = CompilerFlags::NONE;
        for stmt in stmts {
            if let StmtKind::ImportFrom { module, names, .. } = &stmt.kind {
                if module == &Some("__future__") {
                    for alias in names {
                        if let Some(f) = CompilerFlags::from_future_name(alias.name) {
                            flags |= f;
                        }
                    }
                }
            } else if !matches!(stmt.kind, StmtKind::Import(_)) {
                // Future imports must precede any other non-import statement;
                // stop scanning once we're past the prologue's import region.
                break;
            }
        }
        flags
    }

    fn names(self) -> Vec<&'static str> {
        let table: &[(CompilerFlags, &str)] = &[
            (CompilerFlags::DIVISION, "division"),
            (CompilerFlags::ABSOLUTE_IMPORT, "absolute_import"),
            (CompilerFlags::PRINT_FUNCTION, "print_function"),
            (CompilerFlags::UNICODE_LITERALS, "unicode_literals"),
            (CompilerFlags::WITH_STATEMENT, "with_statement"),
            (CompilerFlags::GENERATOR_STOP, "generator_stop"),
            (CompilerFlags::ANNOTATIONS, "annotations"),
        ];
        table
            .iter()
            .filter(|(f, _)| self.contains(*f))
            .map(|(_, n)| *n)
            .collect()
    }
}

impl BitOr for CompilerFlags {
    type Output = CompilerFlags;
    fn bitor(self, rhs: CompilerFlags) -> CompilerFlags {
        self.union(rhs)
    }
}

impl BitOrAssign for CompilerFlags {
    fn bitor_assign(&mut self, rhs: CompilerFlags) {
        *self = self.union(rhs);
    }
}

impl fmt::Display for CompilerFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names().join(", "))
    }
}
