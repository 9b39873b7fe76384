//! Go tokenizer
//!
//! Produces tokens with byte spans into the original source, including
//! comments, and performs Go's automatic semicolon insertion: a newline (or
//! end of file) after an identifier, a literal, one of the keywords `break`,
//! `continue`, `fallthrough`, `return`, or one of `++ -- ) ] }` becomes a `;`.

use super::ast::Span;
use super::SyntaxError;

/// Reserved words of the Go language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Break,
    Case,
    Chan,
    Const,
    Continue,
    Default,
    Defer,
    Else,
    Fallthrough,
    For,
    Func,
    Go,
    Goto,
    If,
    Import,
    Interface,
    Map,
    Package,
    Range,
    Return,
    Select,
    Struct,
    Switch,
    Type,
    Var,
}

impl Keyword {
    pub fn from_ident(ident: &str) -> Option<Self> {
        let kw = match ident {
            "break" => Keyword::Break,
            "case" => Keyword::Case,
            "chan" => Keyword::Chan,
            "const" => Keyword::Const,
            "continue" => Keyword::Continue,
            "default" => Keyword::Default,
            "defer" => Keyword::Defer,
            "else" => Keyword::Else,
            "fallthrough" => Keyword::Fallthrough,
            "for" => Keyword::For,
            "func" => Keyword::Func,
            "go" => Keyword::Go,
            "goto" => Keyword::Goto,
            "if" => Keyword::If,
            "import" => Keyword::Import,
            "interface" => Keyword::Interface,
            "map" => Keyword::Map,
            "package" => Keyword::Package,
            "range" => Keyword::Range,
            "return" => Keyword::Return,
            "select" => Keyword::Select,
            "struct" => Keyword::Struct,
            "switch" => Keyword::Switch,
            "type" => Keyword::Type,
            "var" => Keyword::Var,
            _ => return None,
        };
        Some(kw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Keyword(Keyword),
    Int,
    Float,
    Imag,
    Rune,
    String,
    RawString,
    LParen,
    RParen,
    LBrack,
    RBrack,
    LBrace,
    RBrace,
    /// `;`, either written or inserted at a line break
    Semi { auto: bool },
    /// Any other operator or punctuation; see [`Token::text`]
    Operator,
    Comment,
}

impl TokenKind {
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::Int
                | TokenKind::Float
                | TokenKind::Imag
                | TokenKind::Rune
                | TokenKind::String
                | TokenKind::RawString
        )
    }

    /// Identifiers and literals: the tokens that can stand alone as an operand.
    pub fn is_operand(self) -> bool {
        self == TokenKind::Ident || self.is_literal()
    }

    pub fn is_open(self) -> bool {
        matches!(self, TokenKind::LParen | TokenKind::LBrack | TokenKind::LBrace)
    }

    pub fn is_close(self) -> bool {
        matches!(self, TokenKind::RParen | TokenKind::RBrack | TokenKind::RBrace)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn text<'a>(&self, src: &'a str) -> &'a str {
        &src[self.span.start..self.span.end]
    }

    pub fn is_op(&self, src: &str, op: &str) -> bool {
        self.kind == TokenKind::Operator && self.text(src) == op
    }
}

// Longest operators first so prefix matching picks the maximal munch.
const OPERATORS: &[&str] = &[
    "<<=", ">>=", "&^=", "...", "&&", "||", "<-", "++", "--", "==", "!=", "<=", ">=", ":=", "+=",
    "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "&^", "+", "-", "*", "/", "%", "&", "|",
    "^", "<", ">", "=", "!", ",", ".", ":", "~",
];

/// Byte order mark, ignored at the start of a file
const BOM: char = '\u{FEFF}';

/// Tokenize a complete Go compilation unit.
pub fn tokenize(src: &str) -> Result<Vec<Token>, SyntaxError> {
    Lexer { src, pos: 0, tokens: Vec::new() }.run()
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    tokens: Vec<Token>,
}

impl Lexer<'_> {
    fn run(mut self) -> Result<Vec<Token>, SyntaxError> {
        if self.src.starts_with(BOM) {
            self.pos = BOM.len_utf8();
        }
        while let Some(c) = self.peek() {
            let start = self.pos;
            match c {
                '\n' => {
                    self.insert_semi(start);
                    self.pos += 1;
                }
                ' ' | '\t' | '\r' => self.pos += 1,
                '/' if self.rest().starts_with("//") => {
                    let len = self.rest().find('\n').unwrap_or(self.rest().len());
                    self.pos += len;
                    self.push(TokenKind::Comment, start);
                }
                '/' if self.rest().starts_with("/*") => {
                    let Some(len) = self.rest()[2..].find("*/") else {
                        return Err(SyntaxError::new(start, "comment not terminated"));
                    };
                    let body = &self.rest()[..len + 4];
                    if body.contains('\n') {
                        self.insert_semi(start);
                    }
                    self.pos += len + 4;
                    self.push(TokenKind::Comment, start);
                }
                '"' => self.quoted('"', TokenKind::String, "string literal not terminated")?,
                '\'' => self.quoted('\'', TokenKind::Rune, "rune literal not terminated")?,
                '`' => {
                    let Some(len) = self.rest()[1..].find('`') else {
                        return Err(SyntaxError::new(start, "raw string literal not terminated"));
                    };
                    self.pos += len + 2;
                    self.push(TokenKind::RawString, start);
                }
                '(' => self.single(TokenKind::LParen),
                ')' => self.single(TokenKind::RParen),
                '[' => self.single(TokenKind::LBrack),
                ']' => self.single(TokenKind::RBrack),
                '{' => self.single(TokenKind::LBrace),
                '}' => self.single(TokenKind::RBrace),
                ';' => self.single(TokenKind::Semi { auto: false }),
                c if c.is_ascii_digit() => self.number(),
                '.' if self.rest()[1..].starts_with(|c: char| c.is_ascii_digit()) => self.number(),
                c if c == '_' || c.is_alphabetic() => self.ident(),
                _ => {
                    let Some(op) = OPERATORS.iter().find(|op| self.rest().starts_with(**op)) else {
                        return Err(SyntaxError::new(
                            start,
                            format!("invalid character U+{:04X} '{c}'", c as u32),
                        ));
                    };
                    self.pos += op.len();
                    self.push(TokenKind::Operator, start);
                }
            }
        }
        self.insert_semi(self.src.len());
        Ok(self.tokens)
    }

    fn rest(&self) -> &str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token { kind, span: Span::new(start, self.pos) });
    }

    fn single(&mut self, kind: TokenKind) {
        let start = self.pos;
        self.pos += 1;
        self.push(kind, start);
    }

    /// Emit an automatic `;` if the last significant token ends a statement.
    fn insert_semi(&mut self, at: usize) {
        let last = self.tokens.iter().rev().find(|t| t.kind != TokenKind::Comment);
        let Some(last) = last else { return };
        let ends_statement = match last.kind {
            TokenKind::Ident | TokenKind::RParen | TokenKind::RBrack | TokenKind::RBrace => true,
            TokenKind::Keyword(kw) => matches!(
                kw,
                Keyword::Break | Keyword::Continue | Keyword::Fallthrough | Keyword::Return
            ),
            TokenKind::Operator => matches!(last.text(self.src), "++" | "--"),
            kind => kind.is_literal(),
        };
        if ends_statement {
            self.tokens.push(Token { kind: TokenKind::Semi { auto: true }, span: Span::new(at, at) });
        }
    }

    fn quoted(&mut self, quote: char, kind: TokenKind, unterminated: &str) -> Result<(), SyntaxError> {
        let start = self.pos;
        let mut chars = self.rest().char_indices().skip(1);
        while let Some((offset, c)) = chars.next() {
            match c {
                '\\' => {
                    chars.next();
                }
                '\n' => break,
                c if c == quote => {
                    self.pos += offset + 1;
                    self.push(kind, start);
                    return Ok(());
                }
                _ => {}
            }
        }
        Err(SyntaxError::new(start, unterminated))
    }

    fn ident(&mut self) {
        let start = self.pos;
        let len = self
            .rest()
            .char_indices()
            .find(|(_, c)| !(*c == '_' || c.is_alphanumeric()))
            .map_or(self.rest().len(), |(i, _)| i);
        self.pos += len;
        let kind = match Keyword::from_ident(&self.src[start..self.pos]) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Ident,
        };
        self.push(kind, start);
    }

    fn number(&mut self) {
        let start = self.pos;
        let rest = self.rest();
        let hex = rest.starts_with("0x") || rest.starts_with("0X");
        let mut prev = '\0';
        let mut len = 0;
        for c in rest.chars() {
            let exponent_sign = (c == '+' || c == '-')
                && if hex { matches!(prev, 'p' | 'P') } else { matches!(prev, 'e' | 'E') };
            if !(c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign) {
                break;
            }
            prev = c;
            len += c.len_utf8();
        }
        self.pos += len;
        let text = &self.src[start..self.pos];
        let kind = if text.ends_with('i') {
            TokenKind::Imag
        } else if text.contains('.')
            || (!hex && text.contains(['e', 'E']))
            || (hex && text.contains(['p', 'P']))
        {
            TokenKind::Float
        } else {
            TokenKind::Int
        };
        self.push(kind, start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_semicolon_inserted_after_call() {
        let kinds = kinds("fmt.Println(x)\n");
        assert_eq!(kinds.last(), Some(&TokenKind::Semi { auto: true }));
    }

    #[test]
    fn test_no_semicolon_after_operator() {
        let kinds = kinds("x := a +\n b");
        let semis = kinds.iter().filter(|k| matches!(k, TokenKind::Semi { .. })).count();
        assert_eq!(semis, 1, "only the final line break ends the statement");
    }

    #[test]
    fn test_keywords_and_literals() {
        let src = "return 0x1F, 1.5e-3, 2i, 'a', \"s\\\"q\", `raw\nstring`";
        let kinds = kinds(src);
        assert_eq!(kinds[0], TokenKind::Keyword(Keyword::Return));
        assert!(kinds.contains(&TokenKind::Int));
        assert!(kinds.contains(&TokenKind::Float));
        assert!(kinds.contains(&TokenKind::Imag));
        assert!(kinds.contains(&TokenKind::Rune));
        assert!(kinds.contains(&TokenKind::String));
        assert!(kinds.contains(&TokenKind::RawString));
    }

    #[test]
    fn test_hex_literal_does_not_swallow_plus() {
        let src = "0x1e+2";
        let tokens = tokenize(src).unwrap();
        assert_eq!(tokens[0].text(src), "0x1e");
        assert!(tokens[1].is_op(src, "+"));
    }

    #[test]
    fn test_multiline_comment_acts_as_newline() {
        let kinds = kinds("x++ /* one\ntwo */ y");
        assert_eq!(kinds[2], TokenKind::Semi { auto: true });
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("x := \"oops\n").unwrap_err();
        assert_eq!(err.offset, 5);
        assert!(err.message.contains("not terminated"));
    }

    #[test]
    fn test_leading_byte_order_mark_is_skipped() {
        let src = "\u{FEFF}package main\n";
        let tokens = tokenize(src).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::Package));
        assert_eq!(tokens[0].span.start, 3);
        assert!(tokenize("x \u{FEFF}").is_err());
    }

    #[test]
    fn test_invalid_character() {
        let err = tokenize("x := 1 # 2").unwrap_err();
        assert!(err.message.contains("invalid character"));
    }
}
