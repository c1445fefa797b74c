//! Character stream to ordered token sequence.
//!
//! Parentheses are always emitted as standalone tokens, even when glued to
//! other characters. A `;` begins a comment: the partial atom token
//! accumulated for the current whitespace-delimited chunk is discarded, and
//! the rest of that source line produces no tokens. Whitespace separates
//! tokens, no token is empty, and empty input yields an empty sequence. The
//! tokenizer itself never fails; classifying token text into atoms is the
//! reader's job.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    combinator::{map, value},
    multi::many0,
    sequence::{preceded, terminated},
};

/// One lexical token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Open,
    Close,
    Atom(String),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Token::Open => write!(f, "("),
            Token::Close => write!(f, ")"),
            Token::Atom(text) => write!(f, "{text}"),
        }
    }
}

/// Characters that terminate an atom token.
fn is_delimiter(c: char) -> bool {
    c == '(' || c == ')' || c == ';' || c.is_whitespace()
}

fn token(input: &str) -> IResult<&str, Token> {
    alt((
        value(Token::Open, char('(')),
        value(Token::Close, char(')')),
        map(take_while1(|c| !is_delimiter(c)), |text: &str| {
            Token::Atom(text.to_owned())
        }),
    ))
    .parse(input)
}

fn line_tokens(input: &str) -> IResult<&str, Vec<Token>> {
    preceded(multispace0, many0(terminated(token, multispace0))).parse(input)
}

/// Cut a line at its comment, discarding the partial atom token the `;`
/// interrupts. Tokens completed earlier on the line (including parens that
/// closed a pending atom) survive; everything from the start of the pending
/// atom onward is dropped.
fn strip_comment(line: &str) -> &str {
    let mut pending_atom_start: Option<usize> = None;
    for (i, c) in line.char_indices() {
        if c == ';' {
            return &line[..pending_atom_start.unwrap_or(i)];
        }
        if c == '(' || c == ')' || c.is_whitespace() {
            pending_atom_start = None;
        } else if pending_atom_start.is_none() {
            pending_atom_start = Some(i);
        }
    }
    line
}

/// Tokenize a complete, possibly multi-line source text.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for line in source.lines() {
        let visible = strip_comment(line);
        // The atom branch accepts any run of non-delimiter characters, so
        // lexing a comment-stripped line cannot fail or leave a remainder.
        let mut lexed = line_tokens(visible).map(|(_, t)| t).unwrap_or_default();
        tokens.append(&mut lexed);
    }
    tokens
}
