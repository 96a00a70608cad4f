use pmql_error::{PmqlError, Result};

use crate::ast::{AstParseable, BinaryOperator, Expr, Literal, UnaryOperator};
use crate::keywords::Keyword;
use crate::tokens::{Token, TokenWithLocation, Tokenizer};

#[derive(Debug)]
pub struct Parser {
    toks: Vec<TokenWithLocation>,
    /// Index of the token we should process next.
    idx: usize,
}

impl Parser {
    pub fn try_new(input: &str) -> Result<Self> {
        let toks = Tokenizer::new(input).tokenize()?;
        Ok(Parser::with_tokens(toks))
    }

    pub fn with_tokens(toks: Vec<TokenWithLocation>) -> Self {
        Parser { toks, idx: 0 }
    }

    /// Parse a complete expression, requiring that all tokens are consumed.
    pub fn parse_expression(&mut self) -> Result<Expr> {
        if self.toks.is_empty() {
            return Err(PmqlError::new("Empty expression"));
        }

        let expr = Expr::parse(self)?;

        if let Some(tok) = self.next() {
            return Err(
                PmqlError::new(format!("Unexpected trailing input: '{}'", tok.token))
                    .with_field("line", tok.line)
                    .with_field("col", tok.col),
            );
        }

        Ok(expr)
    }

    pub(crate) fn next(&mut self) -> Option<&TokenWithLocation> {
        let tok = self.toks.get(self.idx)?;
        self.idx += 1;
        Some(tok)
    }

    pub(crate) fn peek(&self) -> Option<&TokenWithLocation> {
        self.toks.get(self.idx)
    }

    /// Consume the next token, erroring with `expected` if the stream is
    /// exhausted.
    fn next_or(&mut self, expected: &str) -> Result<TokenWithLocation> {
        match self.next() {
            Some(tok) => Ok(tok.clone()),
            None => Err(PmqlError::new(format!(
                "Expected {expected}, found end of input"
            ))),
        }
    }

    fn expect_token(&mut self, want: Token) -> Result<()> {
        let tok = self.next_or(&format!("'{want}'"))?;
        if tok.token != want {
            return Err(
                PmqlError::new(format!("Expected '{}', got '{}'", want, tok.token))
                    .with_field("line", tok.line)
                    .with_field("col", tok.col),
            );
        }
        Ok(())
    }

    /// Consume a non-empty brace payload, e.g. the `{a}` of a variable.
    fn expect_payload(&mut self, what: &str) -> Result<String> {
        let tok = self.next_or(what)?;
        match tok.token {
            Token::RawValue(value) if !value.is_empty() => Ok(value),
            Token::RawValue(_) => Err(PmqlError::new(format!("Empty {what}"))
                .with_field("line", tok.line)
                .with_field("col", tok.col)),
            other => Err(PmqlError::new(format!("Expected {what}, got '{other}'"))
                .with_field("line", tok.line)
                .with_field("col", tok.col)),
        }
    }
}

impl AstParseable for Expr {
    fn parse(parser: &mut Parser) -> Result<Self> {
        let tok = parser.next_or("an expression")?;

        match tok.token {
            Token::Word(w) => match w.keyword {
                Some(Keyword::NULL) => Ok(Expr::Literal(Literal::Null)),
                Some(Keyword::IF) => parse_if(parser),
                None => {
                    let raw = parser.expect_payload("constant value")?;
                    Ok(Expr::Literal(Literal::Typed { ty: w.value, raw }))
                }
            },
            Token::Dollar => {
                let name = parser.expect_payload("variable name")?;
                Ok(Expr::Variable(name))
            }
            Token::At => parse_call(parser),
            Token::LeftParen => parse_operation(parser),
            other => Err(PmqlError::new(format!(
                "Unexpected token '{other}', expected an expression"
            ))
            .with_field("line", tok.line)
            .with_field("col", tok.col)),
        }
    }
}

/// Parse the remainder of `if(cond, then, else)` after the `if` keyword.
fn parse_if(parser: &mut Parser) -> Result<Expr> {
    parser.expect_token(Token::LeftParen)?;
    let cond = Expr::parse(parser)?;
    parser.expect_token(Token::Comma)?;
    let then_expr = Expr::parse(parser)?;
    parser.expect_token(Token::Comma)?;
    let else_expr = Expr::parse(parser)?;
    parser.expect_token(Token::RightParen)?;

    Ok(Expr::If {
        cond: Box::new(cond),
        then_expr: Box::new(then_expr),
        else_expr: Box::new(else_expr),
    })
}

/// Parse the remainder of `@name(arg, ...)` after the `@` sign.
fn parse_call(parser: &mut Parser) -> Result<Expr> {
    let tok = parser.next_or("a function name")?;
    let name = match tok.token {
        Token::Word(w) if w.keyword.is_none() => w.value,
        other => {
            return Err(PmqlError::new(format!(
                "Expected a function name, got '{other}'"
            ))
            .with_field("line", tok.line)
            .with_field("col", tok.col));
        }
    };

    parser.expect_token(Token::LeftParen)?;

    let mut args = Vec::new();
    if parser.peek().map(|t| &t.token) != Some(&Token::RightParen) {
        loop {
            args.push(Expr::parse(parser)?);
            match parser.peek().map(|t| &t.token) {
                Some(Token::Comma) => {
                    parser.next();
                }
                _ => break,
            }
        }
    }
    parser.expect_token(Token::RightParen)?;

    Ok(Expr::Call { name, args })
}

/// Parse a parenthesized unary or binary operation. The opening paren was
/// already consumed. Bare parenthesized expressions are not part of the
/// grammar, so a binary operator is required unless the parens hold a unary
/// operation.
fn parse_operation(parser: &mut Parser) -> Result<Expr> {
    if let Some(op) = parser.peek().and_then(|t| unary_operator(&t.token)) {
        parser.next();
        let expr = Expr::parse(parser)?;
        parser.expect_token(Token::RightParen)?;
        return Ok(Expr::Unary {
            op,
            expr: Box::new(expr),
        });
    }

    let left = Expr::parse(parser)?;

    let tok = parser.next_or("a binary operator")?;
    let op = match binary_operator(&tok.token) {
        Some(op) => op,
        None => {
            return Err(PmqlError::new(format!(
                "Expected a binary operator, got '{}'",
                tok.token
            ))
            .with_field("line", tok.line)
            .with_field("col", tok.col));
        }
    };

    let right = Expr::parse(parser)?;
    parser.expect_token(Token::RightParen)?;

    Ok(Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    })
}

fn unary_operator(tok: &Token) -> Option<UnaryOperator> {
    match tok {
        Token::Minus => Some(UnaryOperator::Negate),
        Token::Not => Some(UnaryOperator::Not),
        Token::BitNot => Some(UnaryOperator::BitNot),
        _ => None,
    }
}

fn binary_operator(tok: &Token) -> Option<BinaryOperator> {
    match tok {
        Token::Plus => Some(BinaryOperator::Plus),
        Token::Minus => Some(BinaryOperator::Minus),
        Token::Mul => Some(BinaryOperator::Multiply),
        Token::Div => Some(BinaryOperator::Divide),
        Token::Mod => Some(BinaryOperator::Modulo),
        Token::DoubleEq => Some(BinaryOperator::Eq),
        Token::Neq => Some(BinaryOperator::NotEq),
        Token::Gt => Some(BinaryOperator::Gt),
        Token::Lt => Some(BinaryOperator::Lt),
        Token::GtEq => Some(BinaryOperator::GtEq),
        Token::LtEq => Some(BinaryOperator::LtEq),
        Token::And => Some(BinaryOperator::And),
        Token::Or => Some(BinaryOperator::Or),
        Token::BitAnd => Some(BinaryOperator::BitwiseAnd),
        Token::BitOr => Some(BinaryOperator::BitwiseOr),
        Token::BitXor => Some(BinaryOperator::BitwiseXor),
        _ => None,
    }
}
