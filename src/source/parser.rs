//! Recursive descent parser for the shader scripting surface.
//!
//! Parses a token stream into the tagged-union AST. Constructs with no GLSL
//! counterpart that would otherwise need a full grammar (`with`, `try`,
//! `lambda`, dict literals, ...) are rejected here by name.

use crate::error::{CompileError, CompileResult};
use crate::source::ast::*;
use crate::source::lexer::{Lexer, Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

/// Parses an already de-indented module into its top-level statements.
pub fn parse_module(source: &str) -> CompileResult<Vec<Stmt>> {
    let tokens = Lexer::tokenize(source)?;
    Parser::new(tokens).parse_program()
}

fn unsupported_keyword(word: &str) -> CompileError {
    let reason = match word {
        "with" => {
            "'with' statements are not supported in GLSL; context managers have no equivalent in shader code"
        }
        "try" | "except" | "finally" => {
            "try/except blocks are not supported in GLSL; shaders do not support exception handling"
        }
        "raise" => "shaders do not support exception handling",
        "lambda" => "lambda functions are not supported; define a regular function instead",
        "import" | "from" => "imports are resolved by the registry, not inside shader code",
        "global" | "nonlocal" => "shader functions cannot rebind outer scopes",
        "async" | "await" => "shaders have no asynchronous execution",
        _ => "this keyword has no GLSL translation",
    };
    CompileError::unsupported(word, reason)
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    pub fn parse_program(&mut self) -> CompileResult<Vec<Stmt>> {
        let mut body = Vec::new();
        loop {
            match self.peek() {
                TokenKind::Eof => break,
                TokenKind::Newline => {
                    self.pos += 1;
                }
                TokenKind::Indent => return Err(self.error("unexpected indent")),
                _ => body.append(&mut self.parse_statement()?),
            }
        }
        Ok(body)
    }

    // ── Helpers ──

    fn peek(&self) -> &TokenKind {
        self.tokens
            .get(self.pos)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    fn peek2(&self) -> &TokenKind {
        self.tokens
            .get(self.pos + 1)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos.min(self.tokens.len().saturating_sub(1)))
            .map(|t| t.line)
            .unwrap_or(0)
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> CompileResult<()> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.error(format!("expected {}, found {:?}", what, self.peek())))
        }
    }

    fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::syntax(self.line(), message)
    }

    fn ident(&mut self) -> CompileResult<String> {
        match self.advance() {
            TokenKind::Name(name) => Ok(name),
            other => {
                self.pos -= 1;
                Err(self.error(format!("expected identifier, found {:?}", other)))
            }
        }
    }

    // ── Statements ──

    fn parse_statement(&mut self) -> CompileResult<Vec<Stmt>> {
        match self.peek() {
            TokenKind::Def => Ok(vec![Stmt::FunctionDef(self.parse_def(vec![])?)]),
            TokenKind::Class => Ok(vec![Stmt::ClassDef(self.parse_class()?)]),
            TokenKind::At => self.parse_decorated(),
            TokenKind::If => Ok(vec![self.parse_if()?]),
            TokenKind::While => Ok(vec![self.parse_while()?]),
            TokenKind::For => Ok(vec![self.parse_for()?]),
            TokenKind::Reserved(word) => Err(unsupported_keyword(word)),
            _ => self.parse_simple_statements(),
        }
    }

    fn parse_simple_statements(&mut self) -> CompileResult<Vec<Stmt>> {
        let mut result = vec![self.parse_simple()?];
        while self.eat(&TokenKind::Semicolon) {
            if matches!(self.peek(), TokenKind::Newline | TokenKind::Eof) {
                break;
            }
            result.push(self.parse_simple()?);
        }
        if !self.eat(&TokenKind::Newline) && *self.peek() != TokenKind::Eof {
            return Err(self.error(format!("unexpected {:?} after statement", self.peek())));
        }
        Ok(result)
    }

    fn parse_simple(&mut self) -> CompileResult<Stmt> {
        match self.peek().clone() {
            TokenKind::Pass => {
                self.pos += 1;
                Ok(Stmt::Pass)
            }
            TokenKind::Break => {
                self.pos += 1;
                Ok(Stmt::Break)
            }
            TokenKind::Continue => {
                self.pos += 1;
                Ok(Stmt::Continue)
            }
            TokenKind::Return => {
                self.pos += 1;
                if self.at_statement_end() {
                    Ok(Stmt::Return(None))
                } else {
                    Ok(Stmt::Return(Some(self.parse_testlist()?)))
                }
            }
            TokenKind::Yield => {
                self.pos += 1;
                if self.at_statement_end() {
                    Ok(Stmt::Yield(None))
                } else {
                    Ok(Stmt::Yield(Some(self.parse_testlist()?)))
                }
            }
            TokenKind::Reserved(word) => Err(unsupported_keyword(word)),
            _ => self.parse_expr_statement(),
        }
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.peek(),
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::Eof
        )
    }

    fn parse_expr_statement(&mut self) -> CompileResult<Stmt> {
        let first = self.parse_testlist()?;

        match self.peek().clone() {
            TokenKind::AugAssign(op) => {
                self.pos += 1;
                let value = self.parse_testlist()?;
                Ok(Stmt::AugAssign {
                    target: first,
                    op,
                    value,
                })
            }
            TokenKind::Reserved("**=") => Err(CompileError::unsupported(
                "**=",
                "exponentiation has no GLSL operator; call pow() instead",
            )),
            TokenKind::Colon => {
                self.pos += 1;
                let annotation = self.parse_test()?;
                let value = if self.eat(&TokenKind::Eq) {
                    Some(self.parse_test_or_comprehension()?)
                } else {
                    None
                };
                Ok(Stmt::AnnAssign {
                    target: first,
                    annotation,
                    value,
                })
            }
            TokenKind::Eq => {
                let mut targets = vec![first];
                let mut value = None;
                while self.eat(&TokenKind::Eq) {
                    let next = self.parse_test_or_comprehension()?;
                    if let Some(previous) = value.replace(next) {
                        targets.push(previous);
                    }
                }
                let value = value.ok_or_else(|| self.error("expected assignment value"))?;
                Ok(Stmt::Assign {
                    targets,
                    value,
                    kind: AssignKind::Auto,
                })
            }
            _ => Ok(Stmt::Expr(first)),
        }
    }

    /// Right-hand side of `=`: a plain expression list, where a bare
    /// generator (`x for i in range(3)`) becomes a comprehension.
    fn parse_test_or_comprehension(&mut self) -> CompileResult<Expr> {
        let value = self.parse_testlist()?;
        if *self.peek() == TokenKind::For {
            let generators = self.parse_comprehension_clauses()?;
            return Ok(Expr::ListComp {
                elt: Box::new(value),
                generators,
            });
        }
        Ok(value)
    }

    fn parse_block(&mut self) -> CompileResult<Vec<Stmt>> {
        self.expect(&TokenKind::Colon, "':'")?;
        if !self.eat(&TokenKind::Newline) {
            return self.parse_simple_statements();
        }
        if !self.eat(&TokenKind::Indent) {
            return Err(CompileError::indentation(self.line(), "expected an indented block"));
        }

        let mut body = Vec::new();
        loop {
            match self.peek() {
                TokenKind::Dedent => {
                    self.pos += 1;
                    break;
                }
                TokenKind::Eof => break,
                TokenKind::Newline => self.pos += 1,
                TokenKind::Indent => {
                    return Err(CompileError::indentation(self.line(), "unexpected indent"))
                }
                _ => body.append(&mut self.parse_statement()?),
            }
        }
        Ok(body)
    }

    fn parse_decorated(&mut self) -> CompileResult<Vec<Stmt>> {
        let mut decorators = Vec::new();
        while self.eat(&TokenKind::At) {
            decorators.push(self.parse_test()?);
            self.expect(&TokenKind::Newline, "newline after decorator")?;
        }
        match self.peek() {
            TokenKind::Def => Ok(vec![Stmt::FunctionDef(self.parse_def(decorators)?)]),
            TokenKind::Class => Ok(vec![Stmt::ClassDef(self.parse_class()?)]),
            other => Err(self.error(format!(
                "decorator must precede def or class, found {:?}",
                other
            ))),
        }
    }

    fn parse_def(&mut self, decorators: Vec<Expr>) -> CompileResult<FunctionDef> {
        self.expect(&TokenKind::Def, "'def'")?;
        let name = self.ident()?;
        self.expect(&TokenKind::LParen, "'('")?;

        let mut params = Vec::new();
        while *self.peek() != TokenKind::RParen {
            if matches!(self.peek(), TokenKind::Star | TokenKind::StarStar) {
                return Err(CompileError::unsupported(
                    "variadic parameter",
                    "GLSL functions take a fixed parameter list",
                ));
            }
            let param_name = self.ident()?;
            let annotation = if self.eat(&TokenKind::Colon) {
                Some(self.parse_test()?)
            } else {
                None
            };
            if *self.peek() == TokenKind::Eq {
                return Err(CompileError::malformed(format!(
                    "parameter '{}' has a default value; GLSL parameters cannot",
                    param_name
                )));
            }
            params.push(Param {
                name: param_name,
                annotation,
            });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen, "')'")?;

        let returns = if self.eat(&TokenKind::Arrow) {
            Some(self.parse_test()?)
        } else {
            None
        };
        let body = self.parse_block()?;

        Ok(FunctionDef {
            name,
            params,
            returns,
            decorators,
            body,
        })
    }

    fn parse_class(&mut self) -> CompileResult<ClassDef> {
        self.expect(&TokenKind::Class, "'class'")?;
        let name = self.ident()?;
        let mut bases = Vec::new();
        if self.eat(&TokenKind::LParen) {
            while *self.peek() != TokenKind::RParen {
                bases.push(self.parse_test()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RParen, "')'")?;
        }
        let body = self.parse_block()?;
        Ok(ClassDef { name, bases, body })
    }

    fn parse_if(&mut self) -> CompileResult<Stmt> {
        // `if` or `elif`
        self.pos += 1;
        let test = self.parse_test()?;
        let body = self.parse_block()?;
        let orelse = match self.peek() {
            TokenKind::Elif => vec![self.parse_if()?],
            TokenKind::Else => {
                self.pos += 1;
                self.parse_block()?
            }
            _ => vec![],
        };
        Ok(Stmt::If { test, body, orelse })
    }

    fn reject_loop_else(&self) -> CompileResult<()> {
        if *self.peek() == TokenKind::Else {
            return Err(CompileError::unsupported(
                "loop else",
                "'else' clauses on loops have no GLSL equivalent",
            ));
        }
        Ok(())
    }

    fn parse_while(&mut self) -> CompileResult<Stmt> {
        self.expect(&TokenKind::While, "'while'")?;
        let test = self.parse_test()?;
        let body = self.parse_block()?;
        self.reject_loop_else()?;
        Ok(Stmt::While { test, body })
    }

    fn parse_for(&mut self) -> CompileResult<Stmt> {
        self.expect(&TokenKind::For, "'for'")?;
        let target = self.parse_target_list()?;
        self.expect(&TokenKind::In, "'in'")?;
        let iter = self.parse_testlist()?;
        let body = self.parse_block()?;
        self.reject_loop_else()?;
        Ok(Stmt::For { target, iter, body })
    }

    fn parse_target_list(&mut self) -> CompileResult<Expr> {
        let first = self.parse_bitor()?;
        if *self.peek() != TokenKind::Comma {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if *self.peek() == TokenKind::In {
                break;
            }
            items.push(self.parse_bitor()?);
        }
        Ok(Expr::Tuple(items))
    }

    // ── Expressions ──

    fn parse_testlist(&mut self) -> CompileResult<Expr> {
        let first = self.parse_test()?;
        if *self.peek() != TokenKind::Comma {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.at_statement_end()
                || matches!(self.peek(), TokenKind::Eq | TokenKind::RParen | TokenKind::For)
            {
                break;
            }
            items.push(self.parse_test()?);
        }
        Ok(Expr::Tuple(items))
    }

    pub fn parse_test(&mut self) -> CompileResult<Expr> {
        if let TokenKind::Reserved(word) = self.peek() {
            return Err(unsupported_keyword(word));
        }
        let body = self.parse_or()?;
        if *self.peek() == TokenKind::If {
            self.pos += 1;
            let test = self.parse_or()?;
            self.expect(&TokenKind::Else, "'else' in conditional expression")?;
            let orelse = self.parse_test()?;
            return Ok(Expr::IfExp {
                test: Box::new(test),
                body: Box::new(body),
                orelse: Box::new(orelse),
            });
        }
        Ok(body)
    }

    fn parse_bool_chain(
        &mut self,
        token: TokenKind,
        op: BoolOperator,
        next: fn(&mut Parser) -> CompileResult<Expr>,
    ) -> CompileResult<Expr> {
        let first = next(self)?;
        if *self.peek() != token {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.eat(&token) {
            values.push(next(self)?);
        }
        Ok(Expr::BoolOp { op, values })
    }

    fn parse_or(&mut self) -> CompileResult<Expr> {
        self.parse_bool_chain(TokenKind::Or, BoolOperator::Or, Parser::parse_and)
    }

    fn parse_and(&mut self) -> CompileResult<Expr> {
        self.parse_bool_chain(TokenKind::And, BoolOperator::And, Parser::parse_not)
    }

    fn parse_not(&mut self) -> CompileResult<Expr> {
        if self.eat(&TokenKind::Not) {
            let operand = self.parse_not()?;
            return Ok(Expr::UnaryOp {
                op: UnaryOperator::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    fn compare_operator(&mut self) -> Option<CompareOperator> {
        let op = match (self.peek(), self.peek2()) {
            (TokenKind::Lt, _) => CompareOperator::Lt,
            (TokenKind::Gt, _) => CompareOperator::Gt,
            (TokenKind::LtEq, _) => CompareOperator::LtE,
            (TokenKind::GtEq, _) => CompareOperator::GtE,
            (TokenKind::EqEq, _) => CompareOperator::Eq,
            (TokenKind::NotEq, _) => CompareOperator::NotEq,
            (TokenKind::In, _) => CompareOperator::In,
            (TokenKind::Not, TokenKind::In) => {
                self.pos += 1;
                CompareOperator::NotIn
            }
            (TokenKind::Is, TokenKind::Not) => {
                self.pos += 1;
                CompareOperator::IsNot
            }
            (TokenKind::Is, _) => CompareOperator::Is,
            _ => return None,
        };
        self.pos += 1;
        Some(op)
    }

    fn parse_comparison(&mut self) -> CompileResult<Expr> {
        let left = self.parse_bitor()?;
        let mut ops = Vec::new();
        let mut comparators = Vec::new();
        while let Some(op) = self.compare_operator() {
            ops.push(op);
            comparators.push(self.parse_bitor()?);
        }
        if ops.is_empty() {
            return Ok(left);
        }
        Ok(Expr::Compare {
            left: Box::new(left),
            ops,
            comparators,
        })
    }

    fn parse_binary_level(
        &mut self,
        table: &[(TokenKind, BinaryOperator)],
        next: fn(&mut Parser) -> CompileResult<Expr>,
    ) -> CompileResult<Expr> {
        let mut left = next(self)?;
        'outer: loop {
            for (token, op) in table {
                if self.peek() == token {
                    self.pos += 1;
                    let right = next(self)?;
                    left = Expr::BinaryOp {
                        left: Box::new(left),
                        op: *op,
                        right: Box::new(right),
                    };
                    continue 'outer;
                }
            }
            break;
        }
        Ok(left)
    }

    fn parse_bitor(&mut self) -> CompileResult<Expr> {
        self.parse_binary_level(&[(TokenKind::Pipe, BinaryOperator::BitOr)], Parser::parse_xor)
    }

    fn parse_xor(&mut self) -> CompileResult<Expr> {
        self.parse_binary_level(&[(TokenKind::Caret, BinaryOperator::BitXor)], Parser::parse_bitand)
    }

    fn parse_bitand(&mut self) -> CompileResult<Expr> {
        self.parse_binary_level(&[(TokenKind::Amp, BinaryOperator::BitAnd)], Parser::parse_shift)
    }

    fn parse_shift(&mut self) -> CompileResult<Expr> {
        self.parse_binary_level(
            &[
                (TokenKind::LtLt, BinaryOperator::LShift),
                (TokenKind::GtGt, BinaryOperator::RShift),
            ],
            Parser::parse_arith,
        )
    }

    fn parse_arith(&mut self) -> CompileResult<Expr> {
        self.parse_binary_level(
            &[
                (TokenKind::Plus, BinaryOperator::Add),
                (TokenKind::Minus, BinaryOperator::Sub),
            ],
            Parser::parse_term,
        )
    }

    fn parse_term(&mut self) -> CompileResult<Expr> {
        self.parse_binary_level(
            &[
                (TokenKind::Star, BinaryOperator::Mul),
                (TokenKind::Slash, BinaryOperator::Div),
                (TokenKind::SlashSlash, BinaryOperator::FloorDiv),
                (TokenKind::Percent, BinaryOperator::Mod),
                (TokenKind::At, BinaryOperator::MatMul),
            ],
            Parser::parse_factor,
        )
    }

    fn parse_factor(&mut self) -> CompileResult<Expr> {
        let op = match self.peek() {
            TokenKind::Plus => UnaryOperator::Plus,
            TokenKind::Minus => UnaryOperator::Minus,
            TokenKind::Tilde => UnaryOperator::Invert,
            _ => return self.parse_power(),
        };
        self.pos += 1;
        let operand = self.parse_factor()?;
        Ok(Expr::UnaryOp {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_power(&mut self) -> CompileResult<Expr> {
        let base = self.parse_primary()?;
        if self.eat(&TokenKind::StarStar) {
            let exponent = self.parse_factor()?;
            return Ok(Expr::BinaryOp {
                left: Box::new(base),
                op: BinaryOperator::Pow,
                right: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> CompileResult<Expr> {
        let mut expr = self.parse_atom()?;
        loop {
            match self.peek() {
                TokenKind::Dot => {
                    self.pos += 1;
                    let attr = self.ident()?;
                    expr = Expr::attribute(expr, attr);
                }
                TokenKind::LParen => {
                    self.pos += 1;
                    let (args, keywords) = self.parse_call_arguments()?;
                    expr = Expr::Call {
                        func: Box::new(expr),
                        args,
                        keywords,
                    };
                }
                TokenKind::LBracket => {
                    self.pos += 1;
                    let index = self.parse_subscript_index()?;
                    self.expect(&TokenKind::RBracket, "']'")?;
                    expr = Expr::subscript(expr, index);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_subscript_index(&mut self) -> CompileResult<Expr> {
        if *self.peek() == TokenKind::Colon {
            return Err(CompileError::unsupported("slice", "GLSL has no slicing syntax"));
        }
        let index = self.parse_testlist()?;
        if *self.peek() == TokenKind::Colon {
            return Err(CompileError::unsupported("slice", "GLSL has no slicing syntax"));
        }
        Ok(index)
    }

    fn parse_call_arguments(&mut self) -> CompileResult<(Vec<Expr>, Vec<Keyword>)> {
        let mut args = Vec::new();
        let mut keywords = Vec::new();

        while *self.peek() != TokenKind::RParen {
            if matches!(self.peek(), TokenKind::Star | TokenKind::StarStar) {
                return Err(CompileError::unsupported(
                    "argument unpacking",
                    "GLSL calls take a fixed argument list",
                ));
            }

            let keyword = match (self.peek(), self.peek2()) {
                (TokenKind::Name(name), TokenKind::Eq) => Some(name.clone()),
                _ => None,
            };
            if let Some(name) = keyword {
                self.pos += 2;
                let value = self.parse_test()?;
                keywords.push(Keyword { name, value });
            } else {
                if !keywords.is_empty() {
                    return Err(self.error("positional argument follows keyword argument"));
                }
                let value = self.parse_test()?;
                if *self.peek() == TokenKind::For {
                    return Err(CompileError::unsupported(
                        "GeneratorExp",
                        "generator expressions are not supported in GLSL",
                    ));
                }
                args.push(value);
            }

            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen, "')'")?;
        Ok((args, keywords))
    }

    fn parse_comprehension_clauses(&mut self) -> CompileResult<Vec<Comprehension>> {
        let mut generators = Vec::new();
        while self.eat(&TokenKind::For) {
            let target = self.parse_target_list()?;
            self.expect(&TokenKind::In, "'in'")?;
            let iter = self.parse_or()?;
            let mut ifs = Vec::new();
            while self.eat(&TokenKind::If) {
                ifs.push(self.parse_or()?);
            }
            generators.push(Comprehension { target, iter, ifs });
        }
        Ok(generators)
    }

    fn parse_atom(&mut self) -> CompileResult<Expr> {
        let line = self.line();
        match self.advance() {
            TokenKind::Name(name) => Ok(Expr::Name(name)),
            TokenKind::Int(text) => Ok(Expr::Literal(Literal::Int(text))),
            TokenKind::Float(text) => Ok(Expr::Literal(Literal::Float(text))),
            TokenKind::Str(mut text) => {
                while let TokenKind::Str(next) = self.peek().clone() {
                    self.pos += 1;
                    text.push_str(&next);
                }
                Ok(Expr::Literal(Literal::Str(text)))
            }
            TokenKind::True => Ok(Expr::Literal(Literal::Bool(true))),
            TokenKind::False => Ok(Expr::Literal(Literal::Bool(false))),
            TokenKind::None => Ok(Expr::Literal(Literal::None)),
            TokenKind::LParen => {
                if self.eat(&TokenKind::RParen) {
                    return Ok(Expr::Tuple(vec![]));
                }
                let inner = self.parse_testlist()?;
                if *self.peek() == TokenKind::For {
                    return Err(CompileError::unsupported(
                        "GeneratorExp",
                        "generator expressions are not supported in GLSL",
                    ));
                }
                self.expect(&TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::LBracket => {
                if self.eat(&TokenKind::RBracket) {
                    return Ok(Expr::List(vec![]));
                }
                let first = self.parse_test()?;
                if *self.peek() == TokenKind::For {
                    let generators = self.parse_comprehension_clauses()?;
                    self.expect(&TokenKind::RBracket, "']'")?;
                    return Ok(Expr::ListComp {
                        elt: Box::new(first),
                        generators,
                    });
                }
                let mut items = vec![first];
                while self.eat(&TokenKind::Comma) {
                    if *self.peek() == TokenKind::RBracket {
                        break;
                    }
                    items.push(self.parse_test()?);
                }
                self.expect(&TokenKind::RBracket, "']'")?;
                Ok(Expr::List(items))
            }
            TokenKind::LBrace => Err(CompileError::unsupported(
                "Dict",
                "dictionary and set literals are not supported in GLSL",
            )),
            TokenKind::Yield => Err(CompileError::unsupported(
                "Yield",
                "yield is only allowed as a statement",
            )),
            TokenKind::Reserved(word) => Err(unsupported_keyword(word)),
            other => Err(CompileError::syntax(
                line,
                format!("unexpected {:?} in expression", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(source: &str) -> Stmt {
        let mut body = parse_module(source).unwrap();
        assert_eq!(body.len(), 1, "{:?}", body);
        body.remove(0)
    }

    #[test]
    fn parses_function_signature() {
        let stmt = parse_one("def f(x: float, v: vec3) -> vec4:\n    return vec4(v, x)\n");
        let def = match stmt {
            Stmt::FunctionDef(def) => def,
            other => panic!("expected def, got {:?}", other),
        };
        assert_eq!(def.name, "f");
        assert_eq!(def.params.len(), 2);
        assert_eq!(def.params[1].annotation, Some(Expr::name("vec3")));
        assert_eq!(def.returns, Some(Expr::name("vec4")));
        assert!(matches!(def.body[0], Stmt::Return(Some(Expr::Call { .. }))));
    }

    #[test]
    fn binds_multiplication_tighter_than_addition() {
        let stmt = parse_one("c = a + b * 2.0\n");
        match stmt {
            Stmt::Assign { value, .. } => match value {
                Expr::BinaryOp { op: BinaryOperator::Add, right, .. } => {
                    assert!(matches!(*right, Expr::BinaryOp { op: BinaryOperator::Mul, .. }))
                }
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parses_elif_as_nested_if() {
        let stmt = parse_one("if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n");
        match stmt {
            Stmt::If { orelse, .. } => {
                assert!(matches!(&orelse[0], Stmt::If { orelse, .. } if orelse.len() == 1))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parses_bare_comprehension_assignment() {
        let stmt = parse_one("arr = i * 2 for i in range(4) if i > 0\n");
        match stmt {
            Stmt::Assign {
                value: Expr::ListComp { generators, .. },
                ..
            } => {
                assert_eq!(generators.len(), 1);
                assert_eq!(generators[0].ifs.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parses_decorated_class_and_keywords() {
        let body = parse_module(
            "@compute_shader_layout(local_size_x=16)\ndef cs():\n    pass\nclass Out(ShaderInterface):\n    color = vec4(flat)\n",
        )
        .unwrap();
        match &body[0] {
            Stmt::FunctionDef(def) => match &def.decorators[0] {
                Expr::Call { keywords, .. } => assert_eq!(keywords[0].name, "local_size_x"),
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(&body[1], Stmt::ClassDef(class) if class.body.len() == 1));
    }

    #[test]
    fn rejects_with_statement() {
        let result = parse_module("with open('f') as f:\n    pass\n");
        match result {
            Err(CompileError::UnsupportedConstruct { reason, .. }) => {
                assert!(reason.contains("'with' statements are not supported"))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rejects_try_statement() {
        let result = parse_module("try:\n    x = 1\nexcept:\n    x = 0\n");
        assert!(matches!(
            result,
            Err(CompileError::UnsupportedConstruct { ref construct, .. }) if construct == "try"
        ));
    }

    #[test]
    fn collects_multiple_targets() {
        match parse_one("a = b = 1\n") {
            Stmt::Assign { targets, .. } => assert_eq!(targets.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }
}
