//! The symbol table and the evaluator operating over it.
//!
//! An [`Environment`] maps case-sensitive names to entries: either a stored
//! value or a reference into the built-in registry. It is seeded with the
//! fixed builtin/constant set at construction and on [`Environment::reset`],
//! and mutated only by `define`. Exactly one environment is mutated in place
//! per interpreter session; there is no shared global state.
//!
//! Evaluation dispatches on the head atom: literals return unchanged, the
//! special forms `begin`/`define`/`if` and the geometry/drawing forms
//! `point`/`line`/`arc`/`draw` have hardcoded rules, and everything else is a
//! generic procedure call. Generic calls are deliberately depth-limited: a
//! call is applied directly when all its children are leaves, and otherwise
//! each non-leaf child is resolved through a single procedure application
//! over its own children - one extra nesting level, never a recursive
//! re-entry into the evaluator. Arbitrary nesting is available only through
//! the special forms that re-invoke evaluation (`begin`, `if`, `draw`).
//!
//! On failure the whole evaluation aborts immediately; `define` bindings
//! committed by earlier, already-completed sibling steps (e.g. inside a
//! `begin`) are not rolled back.

use std::collections::HashMap;

use crate::Error;
use crate::ast::{Arc, Atom, Expression, Line, Point};
use crate::builtins::{Arity, BuiltinOp, OpKind, builtin_ops};

/// One environment entry: a stored value, or a built-in operation. The
/// registry's special-form markers occupy `Builtin` slots with no callable
/// behind them, solely to block redefinition.
#[derive(Debug, Clone)]
pub(crate) enum EnvEntry {
    Stored(Expression),
    Builtin(&'static BuiltinOp),
}

/// Mutable symbol table plus the drawable accumulator.
#[derive(Debug, Clone)]
pub struct Environment {
    bindings: HashMap<String, EnvEntry>,
    drawables: Vec<Atom>,
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        let mut env = Environment {
            bindings: HashMap::new(),
            drawables: Vec::new(),
        };
        env.install_defaults();
        env
    }

    /// Seed the fixed builtin/constant set.
    fn install_defaults(&mut self) {
        for op in builtin_ops() {
            self.bindings
                .insert(op.name.to_owned(), EnvEntry::Builtin(op));
        }
        self.bindings.insert(
            "pi".to_owned(),
            EnvEntry::Stored(Expression::number(std::f64::consts::PI)),
        );
    }

    /// Clear user bindings and restore exactly the fixed builtin/constant
    /// set. The drawable accumulator is untouched.
    pub fn reset(&mut self) {
        self.bindings.clear();
        self.install_defaults();
    }

    fn lookup(&self, name: &str) -> Option<&EnvEntry> {
        self.bindings.get(name)
    }

    /// Drain the geometry accumulated by `draw` evaluations, in append
    /// order.
    pub(crate) fn take_drawables(&mut self) -> Vec<Atom> {
        std::mem::take(&mut self.drawables)
    }

    /// Evaluate an expression tree against this environment.
    pub fn evaluate(&mut self, expr: &Expression) -> Result<Expression, Error> {
        match &expr.head {
            Atom::Number(_) | Atom::Boolean(_) => Ok(expr.clone()),
            Atom::Symbol(name) => match name.as_str() {
                "begin" => self.eval_begin(expr),
                "define" => self.eval_define(expr),
                "if" => self.eval_if(expr),
                "point" => self.make_point(expr),
                "line" => self.make_line(expr),
                "arc" => self.make_arc(expr),
                "draw" => self.eval_draw(expr),
                _ => self.eval_call(expr),
            },
            other => Err(Error::wrong_type(format!(
                "cannot evaluate an expression headed by {}",
                other.kind_name()
            ))),
        }
    }

    /// Generic procedure call: simple when every child is a leaf, complex
    /// otherwise.
    fn eval_call(&self, expr: &Expression) -> Result<Expression, Error> {
        if expr.tail.iter().all(Expression::is_leaf) {
            self.apply_simple(expr)
        } else {
            self.apply_complex(expr)
        }
    }

    /// Apply a procedure to an all-leaf tail, or resolve a bare binding.
    fn apply_simple(&self, expr: &Expression) -> Result<Expression, Error> {
        let Some(name) = expr.head.symbol_name() else {
            return Err(Error::wrong_type(format!(
                "a procedure application requires a Symbol head, got {}",
                expr.head.kind_name()
            )));
        };
        let Some(entry) = self.lookup(name) else {
            return Err(Error::undefined_procedure(name));
        };
        match entry {
            EnvEntry::Stored(value) => {
                if expr.tail.is_empty() {
                    // Bare variable/constant reference
                    Ok(value.clone())
                } else {
                    Err(Error::wrong_type(format!("'{name}' is not a procedure")))
                }
            }
            EnvEntry::Builtin(op) => {
                if expr.tail.is_empty() {
                    return Err(Error::not_an_expression(format!(
                        "'{name}' names a procedure, not a value"
                    )));
                }
                let OpKind::Function(func) = op.kind else {
                    return Err(Error::not_an_expression(format!(
                        "special form '{name}' cannot be applied as a procedure"
                    )));
                };
                let args = self.scalar_arguments(&expr.tail)?;
                op.arity.validate(name, args.len())?;
                func(&args)
            }
        }
    }

    /// Build the ordered scalar argument list for a procedure application.
    /// Boolean and Number children copy their value; Symbol children resolve
    /// through the environment and copy the bound scalar payload. Geometry
    /// and procedures cannot be passed as scalar arguments.
    fn scalar_arguments(&self, tail: &[Expression]) -> Result<Vec<Atom>, Error> {
        let mut args = Vec::with_capacity(tail.len());
        for child in tail {
            let atom = match &child.head {
                Atom::Boolean(_) | Atom::Number(_) => child.head.clone(),
                Atom::Symbol(name) => match self.lookup(name) {
                    Some(EnvEntry::Stored(value)) => match &value.head {
                        Atom::Boolean(_) | Atom::Number(_) => value.head.clone(),
                        other => {
                            return Err(Error::wrong_type(format!(
                                "'{name}' is bound to {}, not a scalar argument",
                                other.kind_name()
                            )));
                        }
                    },
                    Some(EnvEntry::Builtin(_)) => {
                        return Err(Error::wrong_type(format!(
                            "'{name}' names a procedure and cannot be an argument"
                        )));
                    }
                    None => return Err(Error::undefined_atom(name)),
                },
                other => {
                    return Err(Error::wrong_type(format!(
                        "{} cannot be a procedure argument",
                        other.kind_name()
                    )));
                }
            };
            args.push(atom);
        }
        Ok(args)
    }

    /// Complex call: flatten each non-leaf child through one simple
    /// application of its own head, then apply the all-leaf form. This is
    /// the single extra nesting level generic calls support.
    fn apply_complex(&self, expr: &Expression) -> Result<Expression, Error> {
        let mut flattened = Expression {
            head: expr.head.clone(),
            tail: Vec::with_capacity(expr.tail.len()),
        };
        for child in &expr.tail {
            if child.is_leaf() {
                flattened.tail.push(child.clone());
            } else {
                flattened.tail.push(self.apply_simple(child)?);
            }
        }
        self.apply_simple(&flattened)
    }

    /// `begin`: evaluate each child in order against the shared
    /// environment, returning the last value.
    fn eval_begin(&mut self, expr: &Expression) -> Result<Expression, Error> {
        if expr.tail.is_empty() {
            return Err(Error::wrong_arity("begin", Arity::AtLeast(1), 0));
        }
        let mut last = Expression::none();
        for child in &expr.tail {
            last = self.evaluate(child)?;
        }
        Ok(last)
    }

    /// `define`: bind an unbound symbol to a literal, an aliased value, a
    /// constructed geometry, or the numeric result of a general call.
    /// Returns the new binding's value.
    fn eval_define(&mut self, expr: &Expression) -> Result<Expression, Error> {
        if expr.tail.len() != 2 {
            return Err(Error::wrong_arity("define", Arity::Exact(2), expr.tail.len()));
        }
        let name = match &expr.tail[0].head {
            Atom::Symbol(name) => name.clone(),
            other => {
                return Err(Error::wrong_type(format!(
                    "define requires a Symbol to bind, got {}",
                    other.kind_name()
                )));
            }
        };
        if self.bindings.contains_key(&name) {
            return Err(Error::already_defined(name));
        }

        let target = &expr.tail[1];
        let value = if target.is_leaf() {
            match &target.head {
                // An existing binding is aliased by value
                Atom::Symbol(source) => match self.lookup(source) {
                    Some(EnvEntry::Stored(bound)) => bound.clone(),
                    Some(EnvEntry::Builtin(_)) => {
                        return Err(Error::wrong_type(format!(
                            "'{source}' names a procedure and has no value to bind"
                        )));
                    }
                    None => return Err(Error::undefined_atom(source)),
                },
                Atom::Boolean(_) | Atom::Number(_) => Expression {
                    head: target.head.clone(),
                    tail: Vec::new(),
                },
                other => {
                    return Err(Error::wrong_type(format!(
                        "define cannot bind {}",
                        other.kind_name()
                    )));
                }
            }
        } else {
            match target.head.symbol_name() {
                Some("point") => self.make_point(target)?,
                Some("line") => self.make_line(target)?,
                Some("arc") => self.make_arc(target)?,
                _ => {
                    let result = self.eval_call(target)?;
                    match result.head {
                        Atom::Number(_) => result,
                        ref other => {
                            return Err(Error::wrong_type(format!(
                                "define expected a numeric result, got {}",
                                other.kind_name()
                            )));
                        }
                    }
                }
            }
        };

        self.bindings.insert(name, EnvEntry::Stored(value.clone()));
        Ok(value)
    }

    /// `if`: exactly three children, two shapes.
    ///
    /// Shape 1 - every child is a leaf: the condition must be a Boolean
    /// literal and the chosen branch is returned as a literal, never
    /// resolved through the environment, even when it is a Symbol.
    ///
    /// Shape 2 - some child carries children: every such child is first
    /// resolved through one simple application (both branches eagerly), the
    /// condition must then be Boolean, and a Symbol branch resolves through
    /// the environment. The shape-1/shape-2 asymmetry in symbol resolution
    /// is intentional and preserved.
    fn eval_if(&mut self, expr: &Expression) -> Result<Expression, Error> {
        if expr.tail.len() != 3 {
            return Err(Error::wrong_arity("if", Arity::Exact(3), expr.tail.len()));
        }

        if expr.tail.iter().all(Expression::is_leaf) {
            let condition = match &expr.tail[0].head {
                Atom::Boolean(b) => *b,
                other => {
                    return Err(Error::wrong_type(format!(
                        "if condition must be a Boolean, got {}",
                        other.kind_name()
                    )));
                }
            };
            let branch = if condition { &expr.tail[1] } else { &expr.tail[2] };
            return Ok(branch.clone());
        }

        let mut resolved = Vec::with_capacity(3);
        for child in &expr.tail {
            if child.is_leaf() {
                resolved.push(child.clone());
            } else {
                resolved.push(self.apply_simple(child)?);
            }
        }
        let condition = match &resolved[0].head {
            Atom::Boolean(b) => *b,
            other => {
                return Err(Error::wrong_type(format!(
                    "if condition must evaluate to a Boolean, got {}",
                    other.kind_name()
                )));
            }
        };
        let branch = if condition { &resolved[1] } else { &resolved[2] };
        match &branch.head {
            Atom::Symbol(name) => match self.lookup(name) {
                Some(EnvEntry::Stored(value)) => Ok(value.clone()),
                Some(EnvEntry::Builtin(_)) => Err(Error::wrong_type(format!(
                    "'{name}' names a procedure, not a value"
                ))),
                None => Err(Error::undefined_atom(name)),
            },
            _ => Ok(branch.clone()),
        }
    }

    /// `draw`: queue each child's geometry for external rendering. A child
    /// whose head symbol is bound contributes its bound value; anything
    /// else is evaluated. Point/Line/Arc results append to the drawable
    /// accumulator in order; every other kind is silently dropped. Returns
    /// an empty expression.
    fn eval_draw(&mut self, expr: &Expression) -> Result<Expression, Error> {
        for child in &expr.tail {
            let bound = child.head.symbol_name().and_then(|name| {
                self.lookup(name).map(|entry| match entry {
                    EnvEntry::Stored(value) => value.clone(),
                    // A procedure has no drawable value; it falls through
                    // to the silent drop below
                    EnvEntry::Builtin(_) => Expression::none(),
                })
            });
            let value = match bound {
                Some(value) => value,
                None => self.evaluate(child)?,
            };
            if value.head.is_drawable() {
                self.drawables.push(value.head);
            }
        }
        Ok(Expression::none())
    }

    /// Resolve one `point` coordinate: a Number leaf, or a Symbol/call
    /// resolving to a Number.
    fn resolve_coordinate(&self, child: &Expression) -> Result<f64, Error> {
        match &child.head {
            Atom::Number(n) => Ok(*n),
            Atom::Symbol(_) => {
                let result = self.apply_simple(child)?;
                match result.head {
                    Atom::Number(n) => Ok(n),
                    ref other => Err(Error::wrong_type(format!(
                        "point coordinates must resolve to Numbers, got {}",
                        other.kind_name()
                    ))),
                }
            }
            other => Err(Error::wrong_type(format!(
                "point coordinates must be numeric, got {}",
                other.kind_name()
            ))),
        }
    }

    /// Construct the Point a `point` form denotes.
    fn point_value(&self, expr: &Expression) -> Result<Point, Error> {
        if expr.tail.len() != 2 {
            return Err(Error::malformed_geometry(format!(
                "point requires exactly 2 coordinates, got {}",
                expr.tail.len()
            )));
        }
        let x = self.resolve_coordinate(&expr.tail[0])?;
        let y = self.resolve_coordinate(&expr.tail[1])?;
        Ok(Point { x, y })
    }

    fn make_point(&self, expr: &Expression) -> Result<Expression, Error> {
        Ok(Expression::point(self.point_value(expr)?))
    }

    /// Resolve a line/arc endpoint: a nested `point` form, or a Symbol
    /// bound to a Point.
    fn resolve_endpoint(&self, child: &Expression) -> Result<Point, Error> {
        match &child.head {
            Atom::Symbol(name) if name == "point" => self.point_value(child),
            Atom::Symbol(name) => match self.lookup(name) {
                Some(EnvEntry::Stored(value)) => match value.head {
                    Atom::Point(point) => Ok(point),
                    ref other => Err(Error::wrong_type(format!(
                        "'{name}' is bound to {}, not a Point",
                        other.kind_name()
                    ))),
                },
                Some(EnvEntry::Builtin(_)) => Err(Error::wrong_type(format!(
                    "'{name}' names a procedure, not a Point"
                ))),
                None => Err(Error::undefined_atom(name)),
            },
            other => Err(Error::malformed_geometry(format!(
                "endpoints must be point forms or Point bindings, got {}",
                other.kind_name()
            ))),
        }
    }

    fn make_line(&self, expr: &Expression) -> Result<Expression, Error> {
        if expr.tail.len() != 2 {
            return Err(Error::malformed_geometry(format!(
                "line requires exactly 2 endpoints, got {}",
                expr.tail.len()
            )));
        }
        let first = self.resolve_endpoint(&expr.tail[0])?;
        let second = self.resolve_endpoint(&expr.tail[1])?;
        Ok(Expression::line(Line { first, second }))
    }

    /// Resolve the arc span: a Number leaf, or a Symbol/call resolved
    /// through the generic call machinery (so one nested call level is
    /// available, as everywhere else).
    fn resolve_span(&self, child: &Expression) -> Result<f64, Error> {
        match &child.head {
            Atom::Number(n) => Ok(*n),
            Atom::Symbol(_) => {
                let result = self.eval_call(child)?;
                match result.head {
                    Atom::Number(n) => Ok(n),
                    ref other => Err(Error::wrong_type(format!(
                        "arc span must resolve to a Number, got {}",
                        other.kind_name()
                    ))),
                }
            }
            other => Err(Error::wrong_type(format!(
                "arc span must be numeric, got {}",
                other.kind_name()
            ))),
        }
    }

    fn make_arc(&self, expr: &Expression) -> Result<Expression, Error> {
        if expr.tail.len() != 3 {
            return Err(Error::malformed_geometry(format!(
                "arc requires a center, a start point, and a span, got {} argument(s)",
                expr.tail.len()
            )));
        }
        let center = self.resolve_endpoint(&expr.tail[0])?;
        let start = self.resolve_endpoint(&expr.tail[1])?;
        let span = self.resolve_span(&expr.tail[2])?;
        Ok(Expression::arc(Arc {
            center,
            start,
            span,
        }))
    }
}
