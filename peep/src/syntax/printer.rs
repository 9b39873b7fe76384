//! Serialize a [`SourceFile`] back to Go source
//!
//! Untouched regions are copied from the original text, so comments and
//! formatting survive. Rewritten import declarations and function bodies
//! splice synthesized code into the surrounding original text.

use std::fmt::Write;

use super::ast::{AssignOp, BinOp, Decl, Expr, ImportDecl, ImportLayout, ImportSpec, SourceFile, Stmt};

/// Render the (possibly mutated) tree as Go source.
pub fn print(file: &SourceFile) -> String {
    let src = file.source();
    let mut out = String::with_capacity(src.len() + 1024);
    let mut cursor = 0;

    for decl in &file.imports {
        match decl.layout {
            ImportLayout::Synthesized => {
                let at = file.header_end.max(cursor);
                out.push_str(&src[cursor..at]);
                cursor = at;
                out.push_str("\n\n");
                write_import_decl(&mut out, src, decl);
            }
            ImportLayout::Group { span, .. } | ImportLayout::Single { span } => {
                if decl.is_rewritten() {
                    out.push_str(&src[cursor..span.start]);
                    write_import_decl(&mut out, src, decl);
                    cursor = span.end;
                }
            }
        }
    }

    for decl in &file.decls {
        let Decl::Func(func) = decl else { continue };
        let Some(body) = &func.body else { continue };
        if !body.is_rewritten() {
            continue;
        }
        out.push_str(&src[cursor..body.open]);
        cursor = body.open;
        let mut after_synthesized = false;
        for stmt in &body.stmts {
            match stmt {
                Stmt::Source(span) => {
                    let gap = &src[cursor..span.start];
                    if after_synthesized && !gap.contains('\n') {
                        // Original statement shared the line with `{`.
                        out.push_str("\n\t");
                        out.push_str(gap.trim_start());
                    } else {
                        out.push_str(gap);
                    }
                    out.push_str(&src[span.start..span.end]);
                    cursor = span.end;
                    after_synthesized = false;
                }
                synthesized => {
                    out.push('\n');
                    write_stmt(&mut out, src, synthesized, 1);
                    after_synthesized = true;
                }
            }
        }
        if body.stmts.iter().all(|s| !matches!(s, Stmt::Source(_))) {
            // Keep the closing brace on its own line when the body was empty.
            let tail = &src[cursor..body.close];
            if !tail.contains('\n') {
                out.push('\n');
                cursor = body.close;
            }
        }
    }

    out.push_str(&src[cursor..]);
    out
}

fn write_import_decl(out: &mut String, src: &str, decl: &ImportDecl) {
    match decl.layout {
        ImportLayout::Group { span, lparen_end } => {
            out.push_str(&src[span.start..lparen_end]);
            let mut tail_start = lparen_end;
            for spec in &decl.specs {
                match spec.origin {
                    Some(origin) => {
                        out.push_str(&src[origin.chunk.start..origin.chunk.end]);
                        tail_start = origin.chunk.end;
                    }
                    None => {
                        out.push_str("\n\t");
                        write_spec(out, src, spec);
                    }
                }
            }
            let tail = &src[tail_start..span.end];
            if !tail.starts_with('\n') && !tail.starts_with("\r\n") {
                out.push('\n');
            }
            out.push_str(tail);
        }
        ImportLayout::Single { .. } | ImportLayout::Synthesized if decl.specs.len() == 1 => {
            out.push_str("import ");
            write_spec(out, src, &decl.specs[0]);
        }
        ImportLayout::Single { .. } | ImportLayout::Synthesized => {
            out.push_str("import (");
            for spec in &decl.specs {
                out.push_str("\n\t");
                write_spec(out, src, spec);
            }
            out.push_str("\n)");
        }
    }
}

fn write_spec(out: &mut String, src: &str, spec: &ImportSpec) {
    if let Some(origin) = spec.origin {
        out.push_str(&src[origin.text.start..origin.text.end]);
        return;
    }
    if let Some(name) = &spec.name {
        out.push_str(name);
        out.push(' ');
    }
    out.push_str(&quote(&spec.path));
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}

fn write_stmts(out: &mut String, src: &str, stmts: &[Stmt], depth: usize) {
    for stmt in stmts {
        out.push('\n');
        write_stmt(out, src, stmt, depth);
    }
    out.push('\n');
    indent(out, depth - 1);
}

/// Write one statement at `depth` tabs, without a trailing newline.
fn write_stmt(out: &mut String, src: &str, stmt: &Stmt, depth: usize) {
    indent(out, depth);
    match stmt {
        Stmt::Source(span) => out.push_str(&src[span.start..span.end]),
        Stmt::Assign { lhs, op, rhs } => {
            write_list(out, src, lhs, depth);
            out.push_str(match op {
                AssignOp::Define => " := ",
                AssignOp::Assign => " = ",
            });
            write_list(out, src, rhs, depth);
        }
        Stmt::Var { name, ty } => {
            let _ = write!(out, "var {name} ");
            write_expr(out, src, ty, depth);
        }
        Stmt::Expr(expr) => write_expr(out, src, expr, depth),
        Stmt::If { cond, then } => {
            out.push_str("if ");
            write_expr(out, src, cond, depth);
            out.push_str(" {");
            write_stmts(out, src, then, depth + 1);
            out.push('}');
        }
        Stmt::Defer(call) => {
            out.push_str("defer ");
            write_expr(out, src, call, depth);
        }
        Stmt::Go(call) => {
            out.push_str("go ");
            write_expr(out, src, call, depth);
        }
        Stmt::Range { key, iter, body } => {
            out.push_str("for ");
            if let Some(key) = key {
                write_expr(out, src, key, depth);
                out.push_str(" = ");
            }
            out.push_str("range ");
            write_expr(out, src, iter, depth);
            out.push_str(" {");
            write_stmts(out, src, body, depth + 1);
            out.push('}');
        }
    }
}

fn write_list(out: &mut String, src: &str, exprs: &[Expr], depth: usize) {
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expr(out, src, expr, depth);
    }
}

fn write_expr(out: &mut String, src: &str, expr: &Expr, depth: usize) {
    match expr {
        Expr::Ident(name) | Expr::Int(name) => out.push_str(name),
        Expr::Str(value) => out.push_str(&quote(value)),
        Expr::Selector(base, name) => {
            write_expr(out, src, base, depth);
            out.push('.');
            out.push_str(name);
        }
        Expr::Call(fun, args) => {
            write_expr(out, src, fun, depth);
            out.push('(');
            write_list(out, src, args, depth);
            out.push(')');
        }
        Expr::Binary(lhs, op, rhs) => {
            write_expr(out, src, lhs, depth);
            out.push_str(match op {
                BinOp::Neq => " != ",
                BinOp::Gt => " > ",
                BinOp::Mul => " * ",
            });
            write_expr(out, src, rhs, depth);
        }
        Expr::AddrOf(inner) => {
            out.push('&');
            write_expr(out, src, inner, depth);
        }
        Expr::Index(base, index) => {
            write_expr(out, src, base, depth);
            out.push('[');
            write_expr(out, src, index, depth);
            out.push(']');
        }
        Expr::FuncLit(body) => {
            out.push_str("func() {");
            write_stmts(out, src, body, depth + 1);
            out.push('}');
        }
        Expr::MapLit { key, value, entries } => {
            out.push_str("map[");
            write_expr(out, src, key, depth);
            out.push(']');
            write_expr(out, src, value, depth);
            out.push('{');
            for (k, v) in entries {
                out.push('\n');
                indent(out, depth + 1);
                write_expr(out, src, k, depth + 1);
                out.push_str(": ");
                write_expr(out, src, v, depth + 1);
                out.push(',');
            }
            out.push('\n');
            indent(out, depth);
            out.push('}');
        }
        Expr::EmptyInterface => out.push_str("interface{}"),
    }
}

/// Quote a value as a Go interpreted string literal.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_source;

    #[test]
    fn test_untouched_file_prints_identically() {
        let src = "// Package doc\npackage main\n\nimport (\n\t\"fmt\" // printing\n)\n\n\
                   /* block */\nfunc main() {\n\tfmt.Println(\"hi\") // trailing\n}\n";
        let file = parse_source("a.go", src).unwrap();
        assert_eq!(print(&file), src);
    }

    #[test]
    fn test_prints_synthesized_statements() {
        let stmt = Stmt::If {
            cond: Expr::ident("err").binary(BinOp::Neq, Expr::ident("nil")),
            then: vec![Stmt::Expr(Expr::path("log", "Fatal").call(vec![Expr::ident("err")]))],
        };
        let mut out = String::new();
        write_stmt(&mut out, "", &stmt, 1);
        assert_eq!(out, "\tif err != nil {\n\t\tlog.Fatal(err)\n\t}");
    }

    #[test]
    fn test_prints_func_literal_and_map() {
        let stmt = Stmt::Defer(
            Expr::FuncLit(vec![Stmt::Assign {
                lhs: vec![Expr::ident("m")],
                op: AssignOp::Define,
                rhs: vec![Expr::MapLit {
                    key: Box::new(Expr::ident("string")),
                    value: Box::new(Expr::EmptyInterface),
                    entries: vec![(Expr::str("a"), Expr::int(1))],
                }],
            }])
            .call(vec![]),
        );
        let mut out = String::new();
        write_stmt(&mut out, "", &stmt, 1);
        assert_eq!(
            out,
            "\tdefer func() {\n\t\tm := map[string]interface{}{\n\t\t\t\"a\": 1,\n\t\t}\n\t}()"
        );
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("C:\\prof\\\"x\".prof"), "\"C:\\\\prof\\\\\\\"x\\\".prof\"");
        assert_eq!(quote("plain"), "\"plain\"");
    }
}
