//! Go source analysis
//!
//! A small front end for the one language peep instruments:
//! - `lexer`: tokens with byte spans and automatic semicolon insertion
//! - `parser`: package clause, imports, top-level declarations, and the
//!   statements of every function body
//! - `ast`: the syntax tree, mixing spans of parsed code with synthesized nodes
//! - `visit`: depth-first traversal over declarations, statements, expressions
//! - `printer`: serialization back to source, byte-exact for untouched code

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod visit;

use std::path::Path;

use crate::domain::PeepError;

pub use ast::{
    AssignOp, BinOp, Block, Decl, Expr, FuncDecl, GenDecl, GenKeyword, ImportDecl, ImportSpec,
    SourceFile, Span, Stmt, ENTRY_POINT,
};
pub use parser::{parse_file, parse_source};
pub use printer::print;
pub use visit::{inspect, Node};

/// A syntax error at a byte offset, before it is tied to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub offset: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self { offset, message: message.into() }
    }

    /// Resolve the offset to a 1-based line and column within `src`.
    pub fn into_peep_error(self, path: &Path, src: &str) -> PeepError {
        let offset = self.offset.min(src.len());
        let before = &src[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = src[line_start..offset].chars().count() + 1;
        PeepError::Parse { path: path.to_path_buf(), line, column, message: self.message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_to_line_column() {
        let src = "package main\n\nfunc main() {\n\tx y\n}";
        let offset = src.find('y').unwrap();
        let err = SyntaxError::new(offset, "boom").into_peep_error(Path::new("a.go"), src);
        match err {
            PeepError::Parse { line, column, .. } => assert_eq!((line, column), (4, 4)),
            other => panic!("unexpected {other:?}"),
        }
    }
}
