//! Core value and expression-tree types for the interpreter, plus the
//! token-classification rules turning raw token text into atoms. The main
//! enum, [`Atom`], covers every value kind the language manipulates: booleans,
//! IEEE-double numbers, symbols, and the three geometric primitives (point,
//! line, arc). [`Expression`] is the rose tree used both as the parse tree and
//! as the runtime value representation - a head atom plus ordered children,
//! each node exclusively owned by its parent. Ergonomic helper functions such
//! as [`num`], [`sym`], and [`boolean`] are provided for convenient tree
//! construction in tests.

use std::fmt;

/// A 2-D point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A line segment between two ordered points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub first: Point,
    pub second: Point,
}

/// A circular arc: center, a start point on the circumference, and the
/// swept angle in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arc {
    pub center: Point,
    pub start: Point,
    pub span: f64,
}

/// One typed scalar or geometric value. Exactly one kind is active at a
/// time and equality is kind-sensitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    /// The absence of a value (e.g. the result of `draw`)
    None,
    Boolean(bool),
    Number(f64),
    Symbol(String),
    Point(Point),
    Line(Line),
    Arc(Arc),
}

impl Atom {
    /// The symbol name, if this atom is a symbol.
    pub(crate) fn symbol_name(&self) -> Option<&str> {
        match self {
            Atom::Symbol(name) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Whether this atom can be queued for rendering.
    pub(crate) fn is_drawable(&self) -> bool {
        matches!(self, Atom::Point(_) | Atom::Line(_) | Atom::Arc(_))
    }

    /// Human-readable kind label for error messages.
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Atom::None => "none",
            Atom::Boolean(_) => "a Boolean",
            Atom::Number(_) => "a Number",
            Atom::Symbol(_) => "a Symbol",
            Atom::Point(_) => "a Point",
            Atom::Line(_) => "a Line",
            Atom::Arc(_) => "an Arc",
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Atom::None => write!(f, "()"),
            Atom::Boolean(true) => write!(f, "True"),
            Atom::Boolean(false) => write!(f, "False"),
            Atom::Number(n) => write!(f, "{n}"),
            Atom::Symbol(name) => write!(f, "{name}"),
            Atom::Point(p) => write!(f, "({},{})", p.x, p.y),
            Atom::Line(l) => write!(
                f,
                "(({},{}),({},{}))",
                l.first.x, l.first.y, l.second.x, l.second.y
            ),
            Atom::Arc(a) => write!(
                f,
                "(({},{}),({},{}) {})",
                a.center.x, a.center.y, a.start.x, a.start.y, a.span
            ),
        }
    }
}

/// The parse tree and runtime value representation: a head [`Atom`] plus an
/// ordered, possibly empty sequence of child expressions. Literal
/// expressions (Boolean/Number head) are leaves by construction - the
/// reader never attaches children to them.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub head: Atom,
    pub tail: Vec<Expression>,
}

impl Expression {
    /// An empty expression with a None head.
    pub fn none() -> Self {
        Expression {
            head: Atom::None,
            tail: Vec::new(),
        }
    }

    pub fn boolean(value: bool) -> Self {
        Expression {
            head: Atom::Boolean(value),
            tail: Vec::new(),
        }
    }

    pub fn number(value: f64) -> Self {
        Expression {
            head: Atom::Number(value),
            tail: Vec::new(),
        }
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Expression {
            head: Atom::Symbol(name.into()),
            tail: Vec::new(),
        }
    }

    pub fn point(point: Point) -> Self {
        Expression {
            head: Atom::Point(point),
            tail: Vec::new(),
        }
    }

    pub fn line(line: Line) -> Self {
        Expression {
            head: Atom::Line(line),
            tail: Vec::new(),
        }
    }

    pub fn arc(arc: Arc) -> Self {
        Expression {
            head: Atom::Arc(arc),
            tail: Vec::new(),
        }
    }

    /// A leaf carries no children.
    pub(crate) fn is_leaf(&self) -> bool {
        self.tail.is_empty()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.tail.is_empty() {
            return write!(f, "{}", self.head);
        }
        write!(f, "({}", self.head)?;
        for child in &self.tail {
            write!(f, " {child}")?;
        }
        write!(f, ")")
    }
}

/// Characters admitted by the permissive numeric pre-check. The `-` is only
/// admitted when the token is longer than one character, so a bare `-` stays
/// a symbol.
fn is_number_candidate(token: &str) -> bool {
    token.chars().all(|c| {
        c.is_ascii_digit()
            || c == '.'
            || c == 'e'
            || c == 'E'
            || (c == '-' && token.len() > 1)
    })
}

/// A symbol is any token whose first character is not a digit.
fn is_symbol_token(token: &str) -> bool {
    token
        .chars()
        .next()
        .is_some_and(|c| !c.is_ascii_digit())
}

/// Classify one token as an atom.
///
/// `True`/`False` are booleans (exact case). Tokens passing the permissive
/// numeric pre-check are numbers iff the full `f64` parse succeeds; the
/// pre-check deliberately admits malformed mixes like `1.2.3` and leaves the
/// rejection to the parse. Remaining tokens not starting with a digit are
/// symbols, which covers operator tokens (`+`, `<`, `=`) and keywords.
/// Everything else (e.g. `1abc`) fails classification.
pub(crate) fn token_to_atom(token: &str) -> Option<Atom> {
    match token {
        "True" => Some(Atom::Boolean(true)),
        "False" => Some(Atom::Boolean(false)),
        _ if is_number_candidate(token) => token.parse::<f64>().ok().map(Atom::Number),
        _ if is_symbol_token(token) => Some(Atom::Symbol(token.to_owned())),
        _ => None,
    }
}

/// Helper function for creating number leaves - works great in test tables.
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn num(value: f64) -> Expression {
    Expression::number(value)
}

/// Helper function for creating symbol leaves.
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn sym<S: AsRef<str>>(name: S) -> Expression {
    Expression::symbol(name.as_ref())
}

/// Helper function for creating boolean leaves.
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn boolean(value: bool) -> Expression {
    Expression::boolean(value)
}
