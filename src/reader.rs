//! Token-sequence validation and expression-tree construction.
//!
//! Reading happens in two phases. The validity scan enforces the structural
//! contract over the raw token sequence: at least three tokens, parenthesis
//! counts that balance exactly once at the final token (which also forces the
//! input to open with `(` and rejects a second top-level form), and at least
//! one parenthesis pair. Construction then consumes tokens left to right into
//! an [`Expression`] tree, classifying the token after each `(` as the node
//! head. Any classification failure, premature exhaustion, or nesting past
//! [`MAX_PARSE_DEPTH`] is a [`ParseError`]; the interpreter boundary converts
//! that to a boolean.

use std::collections::VecDeque;

use crate::ast::{Expression, token_to_atom};
use crate::tokenizer::{Token, tokenize};
use crate::{MAX_PARSE_DEPTH, ParseError, ParseErrorKind};

/// Structural validity of a token sequence: exactly one parenthesized root
/// expression and nothing else.
fn valid(tokens: &[Token]) -> bool {
    if tokens.len() < 3 {
        return false;
    }
    let mut open = 0usize;
    let mut close = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::Open => open += 1,
            Token::Close => close += 1,
            Token::Atom(_) => {}
        }
        // Counts may only meet at the final token. At i == 0 this rejects
        // any input not opening with '(', later it rejects trailing forms.
        if open == close && i + 1 != tokens.len() {
            return false;
        }
    }
    open > 0 && close > 0 && open == close
}

fn read_expression(
    tokens: &mut VecDeque<Token>,
    depth: usize,
) -> Result<Expression, ParseError> {
    if depth >= MAX_PARSE_DEPTH {
        return Err(ParseError::new(
            ParseErrorKind::TooDeeplyNested,
            format!("expression nesting exceeds the maximum depth of {MAX_PARSE_DEPTH}"),
        ));
    }
    match tokens.pop_front() {
        None => Err(ParseError::new(
            ParseErrorKind::Incomplete,
            "unexpected end of input",
        )),
        Some(Token::Open) => {
            let head = match tokens.pop_front() {
                Some(Token::Atom(text)) => token_to_atom(&text).ok_or_else(|| {
                    ParseError::new(
                        ParseErrorKind::InvalidAtom,
                        format!("'{text}' is not a valid atom"),
                    )
                })?,
                Some(other) => {
                    return Err(ParseError::new(
                        ParseErrorKind::InvalidAtom,
                        format!("expected an atom after '(', found '{other}'"),
                    ));
                }
                None => {
                    return Err(ParseError::new(
                        ParseErrorKind::Incomplete,
                        "input ended after '('",
                    ));
                }
            };
            let mut tail = Vec::new();
            loop {
                match tokens.front() {
                    Some(Token::Close) => {
                        tokens.pop_front();
                        break;
                    }
                    Some(_) => tail.push(read_expression(tokens, depth + 1)?),
                    None => {
                        return Err(ParseError::new(
                            ParseErrorKind::Incomplete,
                            "missing closing parenthesis",
                        ));
                    }
                }
            }
            Ok(Expression { head, tail })
        }
        Some(Token::Close) => Err(ParseError::new(
            ParseErrorKind::InvalidSyntax,
            "unexpected ')'",
        )),
        Some(Token::Atom(text)) => token_to_atom(&text)
            .map(|head| Expression {
                head,
                tail: Vec::new(),
            })
            .ok_or_else(|| {
                ParseError::new(
                    ParseErrorKind::InvalidAtom,
                    format!("'{text}' is not a valid atom"),
                )
            }),
    }
}

/// Tokenize, validate, and construct the single root expression of `source`.
pub fn parse_source(source: &str) -> Result<Expression, ParseError> {
    let tokens = tokenize(source);
    if !valid(&tokens) {
        return Err(ParseError::new(
            ParseErrorKind::InvalidSyntax,
            "input is not a single balanced expression",
        ));
    }
    let mut queue: VecDeque<Token> = tokens.into();
    read_expression(&mut queue, 0)
}
