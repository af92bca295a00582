//! Tokenizer for the shader scripting surface.
//!
//! Produces a flat token stream with explicit `Newline`, `Indent` and
//! `Dedent` tokens so the parser never has to look at whitespace.

use crate::error::{CompileError, CompileResult};
use crate::source::ast::BinaryOperator;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Name(String),
    Int(String),
    Float(String),
    Str(String),

    // Keywords
    Def,
    Class,
    Return,
    Yield,
    If,
    Elif,
    Else,
    For,
    In,
    While,
    Break,
    Continue,
    Pass,
    And,
    Or,
    Not,
    Is,
    True,
    False,
    None,
    /// Keywords with no translation; the parser reports them by name.
    Reserved(&'static str),

    // Punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Semicolon,
    Dot,
    Arrow,
    At,

    // Operators
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    SlashSlash,
    Percent,
    LtLt,
    GtGt,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Lt,
    Gt,
    LtEq,
    GtEq,
    EqEq,
    NotEq,
    Eq,
    AugAssign(BinaryOperator),

    // Layout
    Newline,
    Indent,
    Dedent,
    Eof,
}

fn keyword(word: &str) -> Option<TokenKind> {
    Some(match word {
        "def" => TokenKind::Def,
        "class" => TokenKind::Class,
        "return" => TokenKind::Return,
        "yield" => TokenKind::Yield,
        "if" => TokenKind::If,
        "elif" => TokenKind::Elif,
        "else" => TokenKind::Else,
        "for" => TokenKind::For,
        "in" => TokenKind::In,
        "while" => TokenKind::While,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "pass" => TokenKind::Pass,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "not" => TokenKind::Not,
        "is" => TokenKind::Is,
        "True" => TokenKind::True,
        "False" => TokenKind::False,
        "None" => TokenKind::None,
        "lambda" => TokenKind::Reserved("lambda"),
        "with" => TokenKind::Reserved("with"),
        "try" => TokenKind::Reserved("try"),
        "except" => TokenKind::Reserved("except"),
        "finally" => TokenKind::Reserved("finally"),
        "raise" => TokenKind::Reserved("raise"),
        "import" => TokenKind::Reserved("import"),
        "from" => TokenKind::Reserved("from"),
        "global" => TokenKind::Reserved("global"),
        "nonlocal" => TokenKind::Reserved("nonlocal"),
        "del" => TokenKind::Reserved("del"),
        "assert" => TokenKind::Reserved("assert"),
        "as" => TokenKind::Reserved("as"),
        "async" => TokenKind::Reserved("async"),
        "await" => TokenKind::Reserved("await"),
        _ => return None,
    })
}

pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: usize,
    depth: usize,
    indents: Vec<usize>,
    at_line_start: bool,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            src: source.as_bytes(),
            pos: 0,
            line: 1,
            depth: 0,
            indents: vec![0],
            at_line_start: true,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the entire source, ending with `Eof`.
    pub fn tokenize(source: &str) -> CompileResult<Vec<Token>> {
        let mut lexer = Lexer::new(source);
        lexer.run()?;
        Ok(lexer.tokens)
    }

    fn peek(&self) -> u8 {
        self.src.get(self.pos).copied().unwrap_or(0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        self.src.get(self.pos + offset).copied().unwrap_or(0)
    }

    fn push(&mut self, kind: TokenKind) {
        self.tokens.push(Token {
            kind,
            line: self.line,
        });
    }

    fn last_is_newline(&self) -> bool {
        matches!(
            self.tokens.last().map(|t| &t.kind),
            None | Some(TokenKind::Newline) | Some(TokenKind::Indent) | Some(TokenKind::Dedent)
        )
    }

    fn run(&mut self) -> CompileResult<()> {
        while self.pos < self.src.len() {
            if self.at_line_start && self.depth == 0 {
                self.at_line_start = false;
                if !self.read_indentation()? {
                    continue;
                }
            }

            let ch = self.peek();
            match ch {
                b' ' | b'\t' | b'\r' => self.pos += 1,
                b'#' => self.skip_comment(),
                b'\\' if self.peek_at(1) == b'\n' => {
                    self.pos += 2;
                    self.line += 1;
                }
                b'\n' => {
                    if self.depth == 0 && !self.last_is_newline() {
                        self.push(TokenKind::Newline);
                    }
                    self.pos += 1;
                    self.line += 1;
                    self.at_line_start = true;
                }
                b'"' | b'\'' => self.read_string()?,
                b'0'..=b'9' => self.read_number()?,
                b'.' if self.peek_at(1).is_ascii_digit() => self.read_number()?,
                c if c == b'_' || c.is_ascii_alphabetic() => self.read_word(),
                _ => self.read_operator()?,
            }
        }

        if !self.last_is_newline() {
            self.push(TokenKind::Newline);
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push(TokenKind::Dedent);
        }
        self.push(TokenKind::Eof);
        Ok(())
    }

    /// Measures the indentation of a logical line and emits indent tokens.
    /// Returns `false` when the line is blank or holds only a comment.
    fn read_indentation(&mut self) -> CompileResult<bool> {
        let mut width = 0;
        while self.pos < self.src.len() {
            match self.peek() {
                b' ' => width += 1,
                b'\t' => width = (width / 8 + 1) * 8,
                b'\r' => {}
                _ => break,
            }
            self.pos += 1;
        }

        match self.peek() {
            b'\n' => {
                self.pos += 1;
                self.line += 1;
                self.at_line_start = true;
                return Ok(false);
            }
            b'#' => {
                self.skip_comment();
                return Ok(false);
            }
            0 => return Ok(false),
            _ => {}
        }

        let current = *self.indents.last().unwrap_or(&0);
        if width > current {
            self.indents.push(width);
            self.push(TokenKind::Indent);
        } else if width < current {
            while *self.indents.last().unwrap_or(&0) > width {
                self.indents.pop();
                self.push(TokenKind::Dedent);
            }
            if *self.indents.last().unwrap_or(&0) != width {
                return Err(CompileError::indentation(
                    self.line,
                    "unindent does not match any outer indentation level",
                ));
            }
        }

        Ok(true)
    }

    fn skip_comment(&mut self) {
        while self.pos < self.src.len() && self.peek() != b'\n' {
            self.pos += 1;
        }
    }

    fn read_word(&mut self) {
        let start = self.pos;
        while self.peek() == b'_' || self.peek().is_ascii_alphanumeric() {
            self.pos += 1;
        }

        // string prefixes such as r"..." or b'...'
        if matches!(self.peek(), b'"' | b'\'') && self.pos - start <= 2 {
            let prefix = &self.src[start..self.pos];
            if prefix
                .iter()
                .all(|c| matches!(c.to_ascii_lowercase(), b'r' | b'b' | b'u' | b'f'))
            {
                return;
            }
        }

        let word = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        let kind = keyword(&word).unwrap_or(TokenKind::Name(word));
        self.push(kind);
    }

    fn read_string(&mut self) -> CompileResult<()> {
        let quote = self.peek();
        let start_line = self.line;
        let triple = self.peek_at(1) == quote && self.peek_at(2) == quote;
        self.pos += if triple { 3 } else { 1 };

        let start = self.pos;
        loop {
            if self.pos >= self.src.len() {
                return Err(CompileError::syntax(start_line, "unterminated string literal"));
            }

            let ch = self.peek();
            if ch == b'\\' {
                self.pos += 2;
                continue;
            }
            if ch == b'\n' {
                if !triple {
                    return Err(CompileError::syntax(start_line, "unterminated string literal"));
                }
                self.line += 1;
            }
            if ch == quote && (!triple || (self.peek_at(1) == quote && self.peek_at(2) == quote)) {
                break;
            }
            self.pos += 1;
        }

        let text = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        self.pos += if triple { 3 } else { 1 };
        self.tokens.push(Token {
            kind: TokenKind::Str(text),
            line: start_line,
        });
        Ok(())
    }

    fn read_number(&mut self) -> CompileResult<()> {
        let start = self.pos;
        let mut float = false;

        if self.peek() == b'0'
            && matches!(self.peek_at(1), b'x' | b'X' | b'o' | b'O' | b'b' | b'B')
        {
            self.pos += 2;
            while self.peek() == b'_' || self.peek().is_ascii_hexdigit() {
                self.pos += 1;
            }
        } else {
            while self.peek() == b'_' || self.peek().is_ascii_digit() {
                self.pos += 1;
            }
            if self.peek() == b'.' {
                float = true;
                self.pos += 1;
                while self.peek() == b'_' || self.peek().is_ascii_digit() {
                    self.pos += 1;
                }
            }
            if matches!(self.peek(), b'e' | b'E') {
                let sign = matches!(self.peek_at(1), b'+' | b'-') as usize;
                if self.peek_at(1 + sign).is_ascii_digit() {
                    float = true;
                    self.pos += 1 + sign;
                    while self.peek().is_ascii_digit() {
                        self.pos += 1;
                    }
                }
            }
        }

        if matches!(self.peek(), b'j' | b'J') {
            return Err(CompileError::unsupported(
                "complex literal",
                "complex numbers have no GLSL equivalent",
            ));
        }

        let text: String = String::from_utf8_lossy(&self.src[start..self.pos])
            .chars()
            .filter(|c| *c != '_')
            .collect();
        self.push(if float {
            TokenKind::Float(text)
        } else {
            TokenKind::Int(text)
        });
        Ok(())
    }

    fn read_operator(&mut self) -> CompileResult<()> {
        let three = [self.peek(), self.peek_at(1), self.peek_at(2)];
        let (kind, len) = match three {
            [b'*', b'*', b'='] => (TokenKind::Reserved("**="), 3),
            [b'/', b'/', b'='] => (TokenKind::AugAssign(BinaryOperator::FloorDiv), 3),
            [b'<', b'<', b'='] => (TokenKind::AugAssign(BinaryOperator::LShift), 3),
            [b'>', b'>', b'='] => (TokenKind::AugAssign(BinaryOperator::RShift), 3),
            [b'*', b'*', _] => (TokenKind::StarStar, 2),
            [b'/', b'/', _] => (TokenKind::SlashSlash, 2),
            [b'<', b'<', _] => (TokenKind::LtLt, 2),
            [b'>', b'>', _] => (TokenKind::GtGt, 2),
            [b'<', b'=', _] => (TokenKind::LtEq, 2),
            [b'>', b'=', _] => (TokenKind::GtEq, 2),
            [b'=', b'=', _] => (TokenKind::EqEq, 2),
            [b'!', b'=', _] => (TokenKind::NotEq, 2),
            [b'-', b'>', _] => (TokenKind::Arrow, 2),
            [b'+', b'=', _] => (TokenKind::AugAssign(BinaryOperator::Add), 2),
            [b'-', b'=', _] => (TokenKind::AugAssign(BinaryOperator::Sub), 2),
            [b'*', b'=', _] => (TokenKind::AugAssign(BinaryOperator::Mul), 2),
            [b'@', b'=', _] => (TokenKind::AugAssign(BinaryOperator::MatMul), 2),
            [b'/', b'=', _] => (TokenKind::AugAssign(BinaryOperator::Div), 2),
            [b'%', b'=', _] => (TokenKind::AugAssign(BinaryOperator::Mod), 2),
            [b'&', b'=', _] => (TokenKind::AugAssign(BinaryOperator::BitAnd), 2),
            [b'|', b'=', _] => (TokenKind::AugAssign(BinaryOperator::BitOr), 2),
            [b'^', b'=', _] => (TokenKind::AugAssign(BinaryOperator::BitXor), 2),
            [b'(', _, _] => (TokenKind::LParen, 1),
            [b')', _, _] => (TokenKind::RParen, 1),
            [b'[', _, _] => (TokenKind::LBracket, 1),
            [b']', _, _] => (TokenKind::RBracket, 1),
            [b'{', _, _] => (TokenKind::LBrace, 1),
            [b'}', _, _] => (TokenKind::RBrace, 1),
            [b',', _, _] => (TokenKind::Comma, 1),
            [b':', _, _] => (TokenKind::Colon, 1),
            [b';', _, _] => (TokenKind::Semicolon, 1),
            [b'.', _, _] => (TokenKind::Dot, 1),
            [b'@', _, _] => (TokenKind::At, 1),
            [b'+', _, _] => (TokenKind::Plus, 1),
            [b'-', _, _] => (TokenKind::Minus, 1),
            [b'*', _, _] => (TokenKind::Star, 1),
            [b'/', _, _] => (TokenKind::Slash, 1),
            [b'%', _, _] => (TokenKind::Percent, 1),
            [b'&', _, _] => (TokenKind::Amp, 1),
            [b'|', _, _] => (TokenKind::Pipe, 1),
            [b'^', _, _] => (TokenKind::Caret, 1),
            [b'~', _, _] => (TokenKind::Tilde, 1),
            [b'<', _, _] => (TokenKind::Lt, 1),
            [b'>', _, _] => (TokenKind::Gt, 1),
            [b'=', _, _] => (TokenKind::Eq, 1),
            [other, _, _] => {
                return Err(CompileError::syntax(
                    self.line,
                    format!("unexpected character '{}'", other as char),
                ))
            }
        };

        match kind {
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => self.depth += 1,
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                self.depth = self.depth.saturating_sub(1)
            }
            _ => {}
        }

        self.pos += len;
        self.push(kind);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn emits_indent_and_dedent() {
        let tokens = kinds("if x:\n    y = 1\nz = 2\n");
        assert_eq!(
            tokens,
            vec![
                TokenKind::If,
                TokenKind::Name("x".into()),
                TokenKind::Colon,
                TokenKind::Newline,
                TokenKind::Indent,
                TokenKind::Name("y".into()),
                TokenKind::Eq,
                TokenKind::Int("1".into()),
                TokenKind::Newline,
                TokenKind::Dedent,
                TokenKind::Name("z".into()),
                TokenKind::Eq,
                TokenKind::Int("2".into()),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn joins_lines_inside_brackets() {
        let tokens = kinds("a = f(1,\n      2)\n");
        assert!(!tokens[..tokens.len() - 2].contains(&TokenKind::Newline));
    }

    #[test]
    fn reads_float_forms() {
        assert_eq!(
            kinds("1.0 .5 2e3 7")[..4],
            [
                TokenKind::Float("1.0".into()),
                TokenKind::Float(".5".into()),
                TokenKind::Float("2e3".into()),
                TokenKind::Int("7".into()),
            ]
        );
    }

    #[test]
    fn skips_comments_and_docstrings_stay_tokens() {
        let tokens = kinds("# comment\n\"\"\"doc\nstring\"\"\"\n");
        assert_eq!(tokens[0], TokenKind::Str("doc\nstring".into()));
    }

    #[test]
    fn rejects_mismatched_dedent() {
        let result = Lexer::tokenize("if x:\n        a = 1\n    b = 2\n");
        assert!(matches!(result, Err(CompileError::Indentation { line: 3, .. })));
    }
}
