//! Depth-first traversal
//!
//! [`inspect`] visits every top-level declaration, then the statements of
//! each function body and the expressions inside synthesized statements.
//! Returning `false` from the callback skips the children of that node.

use super::ast::{Decl, Expr, SourceFile, Stmt};

#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Decl(&'a Decl),
    Stmt(&'a Stmt),
    Expr(&'a Expr),
}

/// Walk `file` in source order, calling `f` for each node before its children.
pub fn inspect<'a>(file: &'a SourceFile, f: &mut impl FnMut(Node<'a>) -> bool) {
    for decl in &file.decls {
        if !f(Node::Decl(decl)) {
            continue;
        }
        if let Decl::Func(func) = decl {
            if let Some(body) = &func.body {
                walk_stmts(&body.stmts, f);
            }
        }
    }
}

fn walk_stmts<'a>(stmts: &'a [Stmt], f: &mut impl FnMut(Node<'a>) -> bool) {
    for stmt in stmts {
        walk_stmt(stmt, f);
    }
}

fn walk_stmt<'a>(stmt: &'a Stmt, f: &mut impl FnMut(Node<'a>) -> bool) {
    if !f(Node::Stmt(stmt)) {
        return;
    }
    match stmt {
        Stmt::Source(_) => {}
        Stmt::Assign { lhs, rhs, .. } => {
            for expr in lhs.iter().chain(rhs) {
                walk_expr(expr, f);
            }
        }
        Stmt::Var { ty, .. } => walk_expr(ty, f),
        Stmt::Expr(expr) | Stmt::Defer(expr) | Stmt::Go(expr) => walk_expr(expr, f),
        Stmt::If { cond, then } => {
            walk_expr(cond, f);
            walk_stmts(then, f);
        }
        Stmt::Range { key, iter, body } => {
            if let Some(key) = key {
                walk_expr(key, f);
            }
            walk_expr(iter, f);
            walk_stmts(body, f);
        }
    }
}

fn walk_expr<'a>(expr: &'a Expr, f: &mut impl FnMut(Node<'a>) -> bool) {
    if !f(Node::Expr(expr)) {
        return;
    }
    match expr {
        Expr::Ident(_) | Expr::Str(_) | Expr::Int(_) | Expr::EmptyInterface => {}
        Expr::Selector(base, _) | Expr::AddrOf(base) => walk_expr(base, f),
        Expr::Call(fun, args) => {
            walk_expr(fun, f);
            for arg in args {
                walk_expr(arg, f);
            }
        }
        Expr::Binary(lhs, _, rhs) | Expr::Index(lhs, rhs) => {
            walk_expr(lhs, f);
            walk_expr(rhs, f);
        }
        Expr::FuncLit(body) => walk_stmts(body, f),
        Expr::MapLit { key, value, entries } => {
            walk_expr(key, f);
            walk_expr(value, f);
            for (k, v) in entries {
                walk_expr(k, f);
                walk_expr(v, f);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_source;

    const SRC: &str = "package main\n\ntype T struct{}\n\nfunc (T) main() {}\n\n\
                       func helper() {\n\tx := 1\n\t_ = x\n}\n\nfunc main() {\n\thelper()\n}\n";

    #[test]
    fn test_visits_decls_and_statements() {
        let file = parse_source("a.go", SRC).unwrap();
        let (mut decls, mut stmts) = (0, 0);
        inspect(&file, &mut |node| {
            match node {
                Node::Decl(_) => decls += 1,
                Node::Stmt(_) => stmts += 1,
                Node::Expr(_) => {}
            }
            true
        });
        assert_eq!(decls, 4);
        assert_eq!(stmts, 3);
    }

    #[test]
    fn test_false_skips_children() {
        let file = parse_source("a.go", SRC).unwrap();
        let mut stmts = 0;
        inspect(&file, &mut |node| match node {
            Node::Decl(_) => false,
            _ => {
                stmts += 1;
                true
            }
        });
        assert_eq!(stmts, 0);
    }

    #[test]
    fn test_descends_into_synthesized_expressions() {
        let mut file = parse_source("a.go", SRC).unwrap();
        let Some(Decl::Func(main)) = file.decls.last_mut() else { panic!("no func") };
        let body = main.body.as_mut().unwrap();
        body.stmts.insert(
            0,
            Stmt::Defer(Expr::FuncLit(vec![Stmt::Expr(Expr::path("os", "Exit").call(vec![Expr::int(0)]))]).call(vec![])),
        );
        let mut selectors = Vec::new();
        inspect(&file, &mut |node| {
            if let Node::Expr(Expr::Selector(_, name)) = node {
                selectors.push(name.clone());
            }
            true
        });
        assert_eq!(selectors, ["Exit"]);
    }
}
