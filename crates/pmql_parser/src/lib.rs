//! Parser for the pmql textual expression syntax.
//!
//! Expressions look like `(${a} + (-int{42}))`: typed constants (`int{42}`,
//! `bool{true}`, `null`), variables (`${name}`), parenthesized unary/binary
//! operations, conditions (`if(c, a, b)`) and extension function calls
//! (`@avail(${a}, ${b})`).

pub mod ast;
pub mod keywords;
pub mod parser;
pub mod tokens;

use pmql_error::Result;

/// Parse a complete expression from a string.
///
/// Errors if the input is empty, malformed, or contains trailing tokens.
pub fn parse(input: &str) -> Result<ast::Expr> {
    parser::Parser::try_new(input)?.parse_expression()
}
