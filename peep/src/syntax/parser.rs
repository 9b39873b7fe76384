//! Declaration-level Go parser
//!
//! Builds a [`SourceFile`] from the token stream: package clause, imports,
//! and top-level declarations. Function bodies are split into their
//! top-level statements; nested blocks of control statements are walked
//! recursively so malformed statements anywhere in a block are rejected.

use std::path::{Path, PathBuf};

use super::ast::{
    Block, Decl, FuncDecl, GenDecl, GenKeyword, ImportDecl, ImportLayout, ImportSpec, SourceFile,
    Span, SpecOrigin, Stmt,
};
use super::lexer::{tokenize, Keyword, Token, TokenKind};
use super::SyntaxError;
use crate::domain::{PeepError, Result};

/// Read and parse a Go file.
///
/// # Errors
/// `Io` if the file cannot be read, `Parse` if it is not valid Go.
pub fn parse_file(path: &Path) -> Result<SourceFile> {
    let src = std::fs::read_to_string(path).map_err(|e| PeepError::io("read", path, e))?;
    parse_source(path, src)
}

/// Parse Go source text; `path` is only used for diagnostics and naming.
///
/// # Errors
/// `Parse` with the line and column of the first syntax error.
pub fn parse_source(path: impl Into<PathBuf>, src: impl Into<String>) -> Result<SourceFile> {
    let path = path.into();
    let src = src.into();
    let unit = Parser::new(&src).and_then(Parser::parse_unit);
    match unit {
        Ok(unit) => Ok(SourceFile {
            path,
            package: unit.package,
            imports: unit.imports,
            decls: unit.decls,
            header_end: unit.header_end,
            src,
        }),
        Err(err) => Err(err.into_peep_error(&path, &src)),
    }
}

struct Unit {
    package: String,
    header_end: usize,
    imports: Vec<ImportDecl>,
    decls: Vec<Decl>,
}

struct Parser<'a> {
    src: &'a str,
    toks: Vec<Token>,
    /// For every delimiter, the index of its partner
    partner: Vec<usize>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Result<Self, SyntaxError> {
        let toks: Vec<Token> =
            tokenize(src)?.into_iter().filter(|t| t.kind != TokenKind::Comment).collect();
        let partner = match_delimiters(src, &toks)?;
        Ok(Self { src, toks, partner, pos: 0 })
    }

    fn parse_unit(mut self) -> Result<Unit, SyntaxError> {
        self.expect(TokenKind::Keyword(Keyword::Package), "'package'")?;
        let name = self.expect(TokenKind::Ident, "package name")?;
        let package = name.text(self.src).to_string();
        self.expect_semi()?;

        let mut imports = Vec::new();
        while self.peek_kind() == Some(TokenKind::Keyword(Keyword::Import)) {
            imports.push(self.import_decl()?);
        }

        let mut decls = Vec::new();
        while let Some(tok) = self.peek() {
            match tok.kind {
                TokenKind::Keyword(Keyword::Func) => decls.push(Decl::Func(self.func_decl()?)),
                TokenKind::Keyword(Keyword::Type) => decls.push(self.gen_decl(GenKeyword::Type)?),
                TokenKind::Keyword(Keyword::Var) => decls.push(self.gen_decl(GenKeyword::Var)?),
                TokenKind::Keyword(Keyword::Const) => {
                    decls.push(self.gen_decl(GenKeyword::Const)?);
                }
                TokenKind::Keyword(Keyword::Import) => {
                    return Err(self.error_here("imports must appear before other declarations"));
                }
                TokenKind::Semi { .. } => self.pos += 1,
                _ => return Err(self.error_here("non-declaration statement outside function body")),
            }
        }

        Ok(Unit { package, header_end: name.span.end, imports, decls })
    }

    fn import_decl(&mut self) -> Result<ImportDecl, SyntaxError> {
        let keyword = self.bump();
        if self.peek_kind() != Some(TokenKind::LParen) {
            let spec = self.import_spec(keyword.span.end)?;
            let end = spec.origin.map_or(keyword.span.end, |o| o.text.end);
            self.expect_semi()?;
            return Ok(ImportDecl {
                specs: vec![spec],
                layout: ImportLayout::Single { span: Span::new(keyword.span.start, end) },
            });
        }

        let lparen = self.bump();
        let close = self.partner[self.pos - 1];
        let mut specs = Vec::new();
        let mut prev_end = lparen.span.end;
        while self.pos < close {
            if matches!(self.peek_kind(), Some(TokenKind::Semi { .. })) {
                self.pos += 1;
                continue;
            }
            let spec = self.import_spec(prev_end)?;
            prev_end = spec.origin.map_or(prev_end, |o| o.chunk.end);
            specs.push(spec);
            if self.pos < close && !matches!(self.peek_kind(), Some(TokenKind::Semi { .. })) {
                return Err(self.unexpected("';'"));
            }
        }
        let rparen = self.bump();
        self.expect_semi()?;
        Ok(ImportDecl {
            specs,
            layout: ImportLayout::Group {
                span: Span::new(keyword.span.start, rparen.span.end),
                lparen_end: lparen.span.end,
            },
        })
    }

    fn import_spec(&mut self, chunk_start: usize) -> Result<ImportSpec, SyntaxError> {
        let first = self.peek().ok_or_else(|| self.error_here("expected import path"))?;
        let name = if first.kind == TokenKind::Ident || first.is_op(self.src, ".") {
            self.pos += 1;
            Some(first.text(self.src).to_string())
        } else {
            None
        };
        let lit = match self.peek() {
            Some(tok) if matches!(tok.kind, TokenKind::String | TokenKind::RawString) => tok,
            _ => return Err(self.unexpected("import path")),
        };
        self.pos += 1;
        let path = unquote(lit.text(self.src));
        if path.is_empty() {
            return Err(SyntaxError::new(lit.span.start, "invalid import path (empty string)"));
        }
        let chunk_end = self.trailing_comment_end(lit.span.end);
        Ok(ImportSpec {
            name,
            path,
            origin: Some(SpecOrigin {
                text: Span::new(first.span.start, lit.span.end),
                chunk: Span::new(chunk_start, chunk_end),
            }),
        })
    }

    /// End of a `//` comment on the same line as `offset`, or `offset` itself.
    fn trailing_comment_end(&self, offset: usize) -> usize {
        let rest = &self.src[offset..];
        let trimmed = rest.trim_start_matches([' ', '\t']);
        if !trimmed.starts_with("//") {
            return offset;
        }
        let comment_start = offset + (rest.len() - trimmed.len());
        comment_start + trimmed.find(['\r', '\n']).unwrap_or(trimmed.len())
    }

    fn func_decl(&mut self) -> Result<FuncDecl, SyntaxError> {
        let func = self.bump();
        let receiver = if self.peek_kind() == Some(TokenKind::LParen) {
            let (open, close) = self.skip_group();
            Some(Span::new(open.span.start, close.span.end))
        } else {
            None
        };
        let name = self.expect(TokenKind::Ident, "function name")?;
        if self.peek_kind() == Some(TokenKind::LBrack) {
            self.skip_group();
        }
        if self.peek_kind() != Some(TokenKind::LParen) {
            return Err(self.unexpected("'('"));
        }
        self.skip_group();

        // Result types, which may themselves contain braces.
        while let Some(tok) = self.peek() {
            match tok.kind {
                TokenKind::LBrace | TokenKind::Semi { .. } => break,
                TokenKind::LParen | TokenKind::LBrack => {
                    self.skip_group();
                }
                TokenKind::Keyword(Keyword::Struct | Keyword::Interface) => {
                    self.pos += 1;
                    if self.peek_kind() == Some(TokenKind::LBrace) {
                        self.skip_group();
                    }
                }
                _ => self.pos += 1,
            }
        }

        let body = if self.peek_kind() == Some(TokenKind::LBrace) {
            Some(self.body()?)
        } else {
            None
        };
        let end = self.toks[self.pos - 1].span.end;
        self.expect_semi()?;
        Ok(FuncDecl {
            name: name.text(self.src).to_string(),
            receiver,
            span: Span::new(func.span.start, end),
            body,
        })
    }

    fn body(&mut self) -> Result<Block, SyntaxError> {
        let open = self.pos;
        let close = self.partner[open];
        let spans = self.statement_list(open + 1, close, false)?;
        self.pos = close + 1;
        Ok(Block {
            stmts: spans.into_iter().map(Stmt::Source).collect(),
            open: self.toks[open].span.end,
            close: self.toks[close].span.start,
        })
    }

    fn gen_decl(&mut self, keyword: GenKeyword) -> Result<Decl, SyntaxError> {
        let start = self.bump().span.start;
        if self.peek_kind() == Some(TokenKind::LParen) {
            self.skip_group();
        } else {
            while let Some(tok) = self.peek() {
                if matches!(tok.kind, TokenKind::Semi { .. }) {
                    break;
                }
                self.pos = self.step(self.pos);
            }
        }
        let end = self.toks[self.pos - 1].span.end;
        self.expect_semi()?;
        Ok(Decl::Gen(GenDecl { keyword, span: Span::new(start, end) }))
    }

    /// Split `toks[lo..hi]` into statements. With `clauses`, `case ...:` and
    /// `default:` labels of a switch or select body are skipped over.
    fn statement_list(&self, lo: usize, hi: usize, clauses: bool) -> Result<Vec<Span>, SyntaxError> {
        let mut spans = Vec::new();
        let mut i = lo;
        while i < hi {
            let tok = self.toks[i];
            if matches!(tok.kind, TokenKind::Semi { .. }) {
                i += 1;
                continue;
            }
            if clauses && matches!(tok.kind, TokenKind::Keyword(Keyword::Case | Keyword::Default)) {
                let mut j = i + 1;
                while j < hi && !self.toks[j].is_op(self.src, ":") {
                    j = self.step(j);
                }
                if j >= hi {
                    return Err(self.unexpected_at(j, "':'"));
                }
                i = j + 1;
                continue;
            }
            let end = self.statement(i, hi)?;
            spans.push(Span::new(tok.span.start, self.toks[end - 1].span.end));
            i = end;
        }
        Ok(spans)
    }

    /// Parse one statement starting at `i`; returns the index past its last token.
    fn statement(&self, mut i: usize, hi: usize) -> Result<usize, SyntaxError> {
        // Labels
        if self.toks[i].kind == TokenKind::Ident
            && i + 1 < hi
            && self.toks[i + 1].is_op(self.src, ":")
        {
            i += 2;
            if i >= hi || matches!(self.toks[i].kind, TokenKind::Semi { .. }) {
                return Ok(i);
            }
        }
        match self.toks[i].kind {
            TokenKind::Keyword(kw @ (Keyword::If | Keyword::For | Keyword::Switch | Keyword::Select)) => {
                self.control(kw, i, hi)
            }
            TokenKind::LBrace => {
                let close = self.partner[i];
                self.statement_list(i + 1, close, false)?;
                Ok(close + 1)
            }
            _ => {
                let mut j = i;
                while j < hi && !matches!(self.toks[j].kind, TokenKind::Semi { .. }) {
                    j = self.step(j);
                }
                self.check_operands(i, j)?;
                Ok(j)
            }
        }
    }

    fn control(&self, kw: Keyword, i: usize, hi: usize) -> Result<usize, SyntaxError> {
        let clauses = matches!(kw, Keyword::Switch | Keyword::Select);
        let mut header = i + 1;
        loop {
            let open = self.block_open(header, hi)?;
            self.check_operands(header, open)?;
            let close = self.partner[open];
            self.statement_list(open + 1, close, clauses)?;
            let next = close + 1;
            if kw != Keyword::If
                || next >= hi
                || self.toks[next].kind != TokenKind::Keyword(Keyword::Else)
            {
                return Ok(next);
            }
            match self.toks.get(next + 1).map(|t| t.kind) {
                Some(TokenKind::Keyword(Keyword::If)) => header = next + 2,
                Some(TokenKind::LBrace) if next + 1 < hi => {
                    let close = self.partner[next + 1];
                    self.statement_list(next + 2, close, false)?;
                    return Ok(close + 1);
                }
                _ => return Err(self.unexpected_at(next + 1, "'if' or '{' after else")),
            }
        }
    }

    /// Find the `{` that opens a control statement's block.
    fn block_open(&self, header: usize, hi: usize) -> Result<usize, SyntaxError> {
        let mut k = header;
        while k < hi {
            match self.toks[k].kind {
                TokenKind::LBrace if !self.is_composite_brace(header, k) => return Ok(k),
                kind if kind.is_open() => k = self.partner[k] + 1,
                _ => k += 1,
            }
        }
        Err(self.unexpected_at(hi, "'{' after control clause"))
    }

    /// Whether the `{` at `k` belongs to a literal type (`[]T{`, `map[K]V{`,
    /// `struct{...}{`) rather than the block. Go requires `T{}` literals in
    /// headers to be parenthesized, so only these forms need detecting.
    fn is_composite_brace(&self, header: usize, k: usize) -> bool {
        if k <= header {
            return false;
        }
        let prev = self.toks[k - 1];
        match prev.kind {
            TokenKind::Keyword(Keyword::Struct | Keyword::Interface) => true,
            // `struct{...}{`: the previous group is a type body
            TokenKind::RBrace => {
                let open = self.partner[k - 1];
                open > header
                    && matches!(
                        self.toks[open - 1].kind,
                        TokenKind::Keyword(Keyword::Struct | Keyword::Interface)
                    )
            }
            TokenKind::Ident => {
                let mut m = k - 1;
                while m >= header + 2
                    && self.toks[m - 1].is_op(self.src, ".")
                    && self.toks[m - 2].kind == TokenKind::Ident
                {
                    m -= 2;
                }
                while m > header && self.toks[m - 1].is_op(self.src, "*") {
                    m -= 1;
                }
                m > header && self.toks[m - 1].kind == TokenKind::RBrack
            }
            _ => false,
        }
    }

    /// Reject two operands in a row at the statement's top level, e.g.
    /// `invalid syntax here` or `f() g()`. Declarations and type expressions
    /// are exempt. A skipped group is recorded as its opener.
    fn check_operands(&self, lo: usize, hi: usize) -> Result<(), SyntaxError> {
        let mut j = lo;
        while j < hi {
            if matches!(
                self.toks[j].kind,
                TokenKind::Keyword(
                    Keyword::Func
                        | Keyword::Var
                        | Keyword::Const
                        | Keyword::Type
                        | Keyword::Chan
                        | Keyword::Map
                        | Keyword::Struct
                        | Keyword::Interface
                )
            ) {
                return Ok(());
            }
            j = self.step(j);
        }

        let mut prev: Option<TokenKind> = None;
        let mut j = lo;
        while j < hi {
            let tok = self.toks[j];
            if matches!(tok.kind, TokenKind::Semi { .. }) {
                prev = None;
            } else if tok.kind.is_operand()
                && prev.is_some_and(|kind| kind.is_operand() || kind == TokenKind::LParen)
            {
                return Err(SyntaxError::new(
                    tok.span.start,
                    format!("unexpected {} at end of statement", self.describe(j)),
                ));
            } else {
                prev = Some(tok.kind);
            }
            j = self.step(j);
        }
        Ok(())
    }

    fn step(&self, j: usize) -> usize {
        if self.toks[j].kind.is_open() {
            self.partner[j] + 1
        } else {
            j + 1
        }
    }

    fn peek(&self) -> Option<Token> {
        self.toks.get(self.pos).copied()
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn bump(&mut self) -> Token {
        let tok = self.toks[self.pos];
        self.pos += 1;
        tok
    }

    /// Consume a delimited group starting at the current opener.
    fn skip_group(&mut self) -> (Token, Token) {
        let open = self.toks[self.pos];
        let close_idx = self.partner[self.pos];
        self.pos = close_idx + 1;
        (open, self.toks[close_idx])
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, SyntaxError> {
        match self.peek() {
            Some(tok) if tok.kind == kind => {
                self.pos += 1;
                Ok(tok)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    /// A `;` or the end of an enclosing group or file.
    fn expect_semi(&mut self) -> Result<(), SyntaxError> {
        match self.peek_kind() {
            Some(TokenKind::Semi { .. }) => {
                self.pos += 1;
                Ok(())
            }
            None | Some(TokenKind::RParen | TokenKind::RBrace) => Ok(()),
            _ => Err(self.unexpected("';'")),
        }
    }

    fn describe(&self, idx: usize) -> String {
        match self.toks.get(idx) {
            None => "EOF".to_string(),
            Some(tok) => match tok.kind {
                TokenKind::Semi { auto: true } if tok.span.start == self.src.len() => {
                    "EOF".to_string()
                }
                TokenKind::Semi { auto: true } => "newline".to_string(),
                TokenKind::Ident => format!("name {}", tok.text(self.src)),
                _ => format!("'{}'", tok.text(self.src)),
            },
        }
    }

    fn offset_of(&self, idx: usize) -> usize {
        self.toks.get(idx).map_or(self.src.len(), |t| t.span.start)
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        self.unexpected_at(self.pos, expected)
    }

    fn unexpected_at(&self, idx: usize, expected: &str) -> SyntaxError {
        SyntaxError::new(
            self.offset_of(idx),
            format!("expected {expected}, found {}", self.describe(idx)),
        )
    }

    fn error_here(&self, message: &str) -> SyntaxError {
        SyntaxError::new(self.offset_of(self.pos), message)
    }
}

/// Pair every `(`, `[`, `{` with its closer.
fn match_delimiters(src: &str, toks: &[Token]) -> Result<Vec<usize>, SyntaxError> {
    let mut partner = vec![usize::MAX; toks.len()];
    let mut stack: Vec<usize> = Vec::new();
    for (i, tok) in toks.iter().enumerate() {
        if tok.kind.is_open() {
            stack.push(i);
        } else if tok.kind.is_close() {
            let Some(open) = stack.pop() else {
                return Err(SyntaxError::new(
                    tok.span.start,
                    format!("unexpected '{}'", tok.text(src)),
                ));
            };
            let expected = closer_for(toks[open].kind);
            if tok.kind != expected.0 {
                return Err(SyntaxError::new(
                    tok.span.start,
                    format!("expected '{}', found '{}'", expected.1, tok.text(src)),
                ));
            }
            partner[open] = i;
            partner[i] = open;
        }
    }
    if let Some(open) = stack.pop() {
        return Err(SyntaxError::new(
            src.len(),
            format!("expected '{}', found EOF", closer_for(toks[open].kind).1),
        ));
    }
    Ok(partner)
}

fn closer_for(open: TokenKind) -> (TokenKind, char) {
    match open {
        TokenKind::LParen => (TokenKind::RParen, ')'),
        TokenKind::LBrack => (TokenKind::RBrack, ']'),
        _ => (TokenKind::RBrace, '}'),
    }
}

/// Decode a Go string or raw string literal.
fn unquote(lit: &str) -> String {
    if let Some(raw) = lit.strip_prefix('`') {
        return raw.trim_end_matches('`').to_string();
    }
    let inner = lit.strip_prefix('"').and_then(|s| s.strip_suffix('"')).unwrap_or(lit);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other @ ('\\' | '"' | '\'')) => out.push(other),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
