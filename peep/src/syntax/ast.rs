//! Syntax tree for one Go compilation unit
//!
//! Parsed code keeps byte spans into the original source so the printer can
//! reproduce it exactly. Code synthesized by the instrumenter is built from
//! the closed [`Stmt`] and [`Expr`] variants.

use std::path::{Path, PathBuf};

/// Half-open byte range into [`SourceFile::source`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A parsed compilation unit (the syntax tree the instrumenter mutates).
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub package: String,
    pub imports: Vec<ImportDecl>,
    pub decls: Vec<Decl>,
    pub(crate) src: String,
    /// Byte offset just past the package name
    pub(crate) header_end: usize,
}

impl SourceFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The text this tree was parsed from.
    pub fn source(&self) -> &str {
        &self.src
    }

    pub fn text(&self, span: Span) -> &str {
        &self.src[span.start..span.end]
    }

    /// Every imported package path, in declaration order.
    pub fn import_paths(&self) -> impl Iterator<Item = &str> + '_ {
        self.imports.iter().flat_map(|decl| decl.specs.iter().map(|spec| spec.path.as_str()))
    }

    pub fn funcs(&self) -> impl Iterator<Item = &FuncDecl> + '_ {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Func(func) => Some(func),
            Decl::Gen(_) => None,
        })
    }
}

/// One `import` declaration, single or parenthesized.
#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub specs: Vec<ImportSpec>,
    pub(crate) layout: ImportLayout,
}

impl ImportDecl {
    pub fn is_grouped(&self) -> bool {
        match self.layout {
            ImportLayout::Group { .. } => true,
            ImportLayout::Single { .. } => false,
            ImportLayout::Synthesized => self.specs.len() > 1,
        }
    }

    /// True once a spec without source text has been added.
    pub(crate) fn is_rewritten(&self) -> bool {
        self.specs.iter().any(|spec| spec.origin.is_none())
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum ImportLayout {
    /// `import ( ... )`; `lparen_end` is just past the `(`
    Group { span: Span, lparen_end: usize },
    /// `import "path"`
    Single { span: Span },
    /// Added by the import resolver; has no source text
    Synthesized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Alias, `.` or `_`
    pub name: Option<String>,
    /// Unquoted import path
    pub path: String,
    pub(crate) origin: Option<SpecOrigin>,
}

impl ImportSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self { name: None, path: path.into(), origin: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SpecOrigin {
    /// The alias and path literal
    pub text: Span,
    /// Everything from the end of the previous spec through this spec's
    /// trailing comment, used when the enclosing group is rewritten
    pub chunk: Span,
}

#[derive(Debug, Clone)]
pub enum Decl {
    Func(FuncDecl),
    Gen(GenDecl),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenKeyword {
    Type,
    Var,
    Const,
}

/// `type`, `var` or `const` declaration, kept verbatim.
#[derive(Debug, Clone)]
pub struct GenDecl {
    pub keyword: GenKeyword,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub name: String,
    /// The parenthesized receiver of a method
    pub receiver: Option<Span>,
    pub span: Span,
    pub body: Option<Block>,
}

impl FuncDecl {
    /// `func main()` with no receiver: the program's starting function.
    pub fn is_entry_point(&self) -> bool {
        self.name == ENTRY_POINT && self.receiver.is_none()
    }
}

pub const ENTRY_POINT: &str = "main";

#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    /// Byte offset just past `{`
    pub(crate) open: usize,
    /// Byte offset of `}`
    pub(crate) close: usize,
}

impl Block {
    pub(crate) fn is_rewritten(&self) -> bool {
        self.stmts.iter().any(|stmt| !matches!(stmt, Stmt::Source(_)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// A statement parsed from the file, printed verbatim
    Source(Span),
    Assign { lhs: Vec<Expr>, op: AssignOp, rhs: Vec<Expr> },
    /// `var name T`
    Var { name: String, ty: Expr },
    Expr(Expr),
    If { cond: Expr, then: Vec<Stmt> },
    Defer(Expr),
    Go(Expr),
    /// `for [key =] range iter { body }`
    Range { key: Option<Expr>, iter: Expr, body: Vec<Stmt> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `:=`
    Define,
    /// `=`
    Assign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Neq,
    Gt,
    Mul,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(String),
    /// Unquoted string value
    Str(String),
    Int(String),
    Selector(Box<Expr>, String),
    Call(Box<Expr>, Vec<Expr>),
    Binary(Box<Expr>, BinOp, Box<Expr>),
    /// `&x`
    AddrOf(Box<Expr>),
    Index(Box<Expr>, Box<Expr>),
    /// `func() { body }`
    FuncLit(Vec<Stmt>),
    /// `map[key]value{k: v, ...}`
    MapLit { key: Box<Expr>, value: Box<Expr>, entries: Vec<(Expr, Expr)> },
    /// `interface{}`
    EmptyInterface,
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(name.into())
    }

    pub fn str(value: impl Into<String>) -> Self {
        Expr::Str(value.into())
    }

    pub fn int(value: impl ToString) -> Self {
        Expr::Int(value.to_string())
    }

    /// `pkg.Name` with both parts as identifiers.
    pub fn path(pkg: &str, name: &str) -> Self {
        Expr::ident(pkg).dot(name)
    }

    #[must_use]
    pub fn dot(self, name: &str) -> Self {
        Expr::Selector(Box::new(self), name.to_string())
    }

    #[must_use]
    pub fn call(self, args: Vec<Expr>) -> Self {
        Expr::Call(Box::new(self), args)
    }

    #[must_use]
    pub fn binary(self, op: BinOp, rhs: Expr) -> Self {
        Expr::Binary(Box::new(self), op, Box::new(rhs))
    }

    #[must_use]
    pub fn index(self, index: Expr) -> Self {
        Expr::Index(Box::new(self), Box::new(index))
    }
}
