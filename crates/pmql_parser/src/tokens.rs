use std::fmt;

use pmql_error::{PmqlError, Result};

use crate::keywords::Keyword;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Identifier-like token: type name, function name, or keyword.
    Word(Word),
    /// Brace-delimited raw payload, e.g. `{42}` in `int{42}`. May be empty;
    /// the parser decides whether an empty payload is acceptable.
    RawValue(String),
    /// `$`, introduces a variable.
    Dollar,
    /// `@`, introduces an extension function call.
    At,
    Comma,
    LeftParen,
    RightParen,
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    DoubleEq,
    Neq,
    Gt,
    GtEq,
    Lt,
    LtEq,
    And,
    Or,
    Not,
    BitAnd,
    BitOr,
    BitXor,
    BitNot,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) => write!(f, "{}", w.value),
            Token::RawValue(v) => write!(f, "{{{v}}}"),
            Token::Dollar => write!(f, "$"),
            Token::At => write!(f, "@"),
            Token::Comma => write!(f, ","),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Mul => write!(f, "*"),
            Token::Div => write!(f, "/"),
            Token::Mod => write!(f, "%"),
            Token::DoubleEq => write!(f, "=="),
            Token::Neq => write!(f, "!="),
            Token::Gt => write!(f, ">"),
            Token::GtEq => write!(f, ">="),
            Token::Lt => write!(f, "<"),
            Token::LtEq => write!(f, "<="),
            Token::And => write!(f, "&&"),
            Token::Or => write!(f, "||"),
            Token::Not => write!(f, "!"),
            Token::BitAnd => write!(f, "&"),
            Token::BitOr => write!(f, "|"),
            Token::BitXor => write!(f, "^"),
            Token::BitNot => write!(f, "~"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub value: String,
    pub keyword: Option<Keyword>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenWithLocation {
    pub token: Token,
    pub line: usize,
    pub col: usize,
}

#[derive(Debug)]
pub struct Tokenizer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    col: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Tokenizer {
            chars: input.chars().peekable(),
            line: 0,
            col: 0,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<TokenWithLocation>> {
        let mut toks = Vec::new();
        while let Some(tok) = self.next_token()? {
            toks.push(tok);
        }
        Ok(toks)
    }

    fn next_token(&mut self) -> Result<Option<TokenWithLocation>> {
        self.skip_whitespace();

        let (line, col) = (self.line, self.col);
        let c = match self.bump() {
            Some(c) => c,
            None => return Ok(None),
        };

        let token = match c {
            '$' => Token::Dollar,
            '@' => Token::At,
            ',' => Token::Comma,
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Mul,
            '/' => Token::Div,
            '%' => Token::Mod,
            '^' => Token::BitXor,
            '~' => Token::BitNot,
            '{' => self.raw_value(line, col)?,
            '=' => match self.bump_if('=') {
                true => Token::DoubleEq,
                false => {
                    return Err(
                        PmqlError::new("Unexpected character '=', did you mean '=='?")
                            .with_field("line", line)
                            .with_field("col", col),
                    );
                }
            },
            '!' => match self.bump_if('=') {
                true => Token::Neq,
                false => Token::Not,
            },
            '>' => match self.bump_if('=') {
                true => Token::GtEq,
                false => Token::Gt,
            },
            '<' => match self.bump_if('=') {
                true => Token::LtEq,
                false => Token::Lt,
            },
            '&' => match self.bump_if('&') {
                true => Token::And,
                false => Token::BitAnd,
            },
            '|' => match self.bump_if('|') {
                true => Token::Or,
                false => Token::BitOr,
            },
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut value = String::from(c);
                while let Some(&n) = self.chars.peek() {
                    if n.is_ascii_alphanumeric() || n == '_' {
                        value.push(n);
                        self.bump();
                    } else {
                        break;
                    }
                }
                let keyword = Keyword::from_word(&value);
                Token::Word(Word { value, keyword })
            }
            other => {
                return Err(PmqlError::new(format!("Unexpected character '{other}'"))
                    .with_field("line", line)
                    .with_field("col", col));
            }
        };

        Ok(Some(TokenWithLocation { token, line, col }))
    }

    /// Consume a brace-delimited payload. The opening brace was already
    /// consumed; nested braces are not allowed.
    fn raw_value(&mut self, line: usize, col: usize) -> Result<Token> {
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('}') => return Ok(Token::RawValue(value)),
                Some('{') => {
                    return Err(PmqlError::new("Unexpected '{' inside a value")
                        .with_field("line", self.line)
                        .with_field("col", self.col));
                }
                Some(c) => value.push(c),
                None => {
                    return Err(PmqlError::new("Unterminated value, expected '}'")
                        .with_field("line", line)
                        .with_field("col", col));
                }
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn bump_if(&mut self, expected: char) -> bool {
        if self.chars.peek() == Some(&expected) {
            self.bump();
            return true;
        }
        false
    }
}
