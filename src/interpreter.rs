//! Composition root tying the pieces together.
//!
//! An [`Interpreter`] owns one [`Environment`] and the last successfully
//! parsed expression tree. Collaborators feed source text into
//! [`Interpreter::parse`], trigger [`Interpreter::evaluate`]/
//! [`Interpreter::reset`], and pull the last value and the accumulated
//! drawable list back out. Everything is synchronous; each call runs to
//! completion or fails before returning.

use crate::Error;
use crate::ast::{Atom, Expression};
use crate::environment::Environment;
use crate::reader::parse_source;

/// One interpreter session: a fixed-builtin environment plus the last
/// parsed tree. Sessions share nothing; concurrent use means one
/// interpreter per session.
#[derive(Debug)]
pub struct Interpreter {
    env: Environment,
    tree: Expression,
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter {
            env: Environment::new(),
            tree: Expression::none(),
        }
    }

    /// Parse `source` into the held expression tree. Returns true iff
    /// tokenization, validity, and tree construction all succeed. On
    /// failure the previously held tree is stale and must not be
    /// evaluated; parse failures never propagate as errors past this
    /// boundary.
    pub fn parse(&mut self, source: &str) -> bool {
        match parse_source(source) {
            Ok(tree) => {
                self.tree = tree;
                true
            }
            Err(_) => false,
        }
    }

    /// Evaluate the last parsed tree against the session environment.
    /// Bindings committed before a failure persist.
    pub fn evaluate(&mut self) -> Result<Expression, Error> {
        self.env.evaluate(&self.tree)
    }

    /// Restore the fixed builtin/constant environment, discarding user
    /// bindings and the held tree. Accumulated drawables survive.
    pub fn reset(&mut self) {
        self.tree = Expression::none();
        self.env.reset();
    }

    /// Drain the geometry accumulated by `draw` evaluations since the last
    /// pull, in evaluation order.
    pub fn drawables(&mut self) -> Vec<Atom> {
        self.env.take_drawables()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Line, Point, boolean, num};
    use std::f64::consts::PI;

    /// Parse and evaluate one program, panicking on parse failure.
    fn run(interp: &mut Interpreter, program: &str) -> Result<Expression, Error> {
        assert!(interp.parse(program), "failed to parse: {program}");
        interp.evaluate()
    }

    #[test]
    fn test_parse_reports_validity() {
        let valid = vec![
            "(begin (define r 10) (* pi (* r r)))",
            "(1)",
            "(+1)",
            "(+ 1 2) ; trailing comment",
        ];
        let invalid = vec![
            "(f",
            "(begin (define r 10) (* pi (* r r",
            "(begin (define r 10) (* pi (* r r))) )",
            "hello",
            "",
            "( )",
            "(1abc)",
            "(+ 1 2) (+ 3 4)",
        ];
        for program in valid {
            let mut interp = Interpreter::new();
            assert!(interp.parse(program), "expected parse success: {program:?}");
        }
        for program in invalid {
            let mut interp = Interpreter::new();
            assert!(!interp.parse(program), "expected parse failure: {program:?}");
        }
    }

    #[test]
    fn test_end_to_end_programs() {
        let mut interp = Interpreter::new();
        assert_eq!(
            run(&mut interp, "(begin (define r 10) (* pi (* r r)))"),
            Ok(num(PI * 100.0))
        );

        let mut interp = Interpreter::new();
        assert_eq!(
            run(
                &mut interp,
                "(begin (define a 1) (define b pi) (if (< a b) b a))"
            ),
            Ok(num(PI))
        );

        let mut interp = Interpreter::new();
        assert_eq!(run(&mut interp, "(if (< 1 2) (- 5 6) True)"), Ok(num(-1.0)));
        assert_eq!(run(&mut interp, "(sin pi)"), Ok(num(0.0)));
        assert_eq!(run(&mut interp, "(not False)"), Ok(boolean(true)));
    }

    #[test]
    fn test_environment_persists_across_evaluations() {
        let mut interp = Interpreter::new();
        assert_eq!(run(&mut interp, "(define r 10)"), Ok(num(10.0)));
        assert_eq!(run(&mut interp, "(* r r)"), Ok(num(100.0)));
    }

    #[test]
    fn test_reset_discards_user_bindings() {
        let mut interp = Interpreter::new();
        assert_eq!(
            run(&mut interp, "(begin (define a 1) (define b 1) (+ a b))"),
            Ok(num(2.0))
        );

        interp.reset();

        assert_eq!(
            run(&mut interp, "(+ a b)"),
            Err(Error::UndefinedAtom("a".to_owned()))
        );
    }

    #[test]
    fn test_drawables_drain_per_pull() {
        let mut interp = Interpreter::new();
        let result = run(
            &mut interp,
            "(draw (point 0 0) (line (point 0 0) (point 10 0)))",
        );
        assert_eq!(result, Ok(Expression::none()));

        let first_pull = interp.drawables();
        assert_eq!(
            first_pull,
            vec![
                Atom::Point(Point { x: 0.0, y: 0.0 }),
                Atom::Line(Line {
                    first: Point { x: 0.0, y: 0.0 },
                    second: Point { x: 10.0, y: 0.0 },
                }),
            ]
        );

        // The pull drained the accumulator
        assert_eq!(interp.drawables(), vec![]);

        // New draws accumulate again
        run(&mut interp, "(draw (point 1 1))").unwrap_or_else(|e| panic!("draw failed: {e}"));
        assert_eq!(
            interp.drawables(),
            vec![Atom::Point(Point { x: 1.0, y: 1.0 })]
        );
    }

    #[test]
    fn test_drawables_survive_reset() {
        let mut interp = Interpreter::new();
        run(&mut interp, "(draw (point 2 2))").unwrap_or_else(|e| panic!("draw failed: {e}"));

        interp.reset();

        assert_eq!(
            interp.drawables(),
            vec![Atom::Point(Point { x: 2.0, y: 2.0 })]
        );
    }

    #[test]
    fn test_drawables_accumulate_across_evaluations() {
        let mut interp = Interpreter::new();
        run(&mut interp, "(draw (point 0 0))").unwrap_or_else(|e| panic!("draw failed: {e}"));
        run(&mut interp, "(draw (point 1 0))").unwrap_or_else(|e| panic!("draw failed: {e}"));

        assert_eq!(
            interp.drawables(),
            vec![
                Atom::Point(Point { x: 0.0, y: 0.0 }),
                Atom::Point(Point { x: 1.0, y: 0.0 }),
            ]
        );
    }

    #[test]
    fn test_failed_evaluation_keeps_committed_bindings() {
        let mut interp = Interpreter::new();
        let result = run(&mut interp, "(begin (define a 7) (+ a ghost))");
        assert_eq!(result, Err(Error::UndefinedAtom("ghost".to_owned())));

        // The binding committed before the failure persists
        assert_eq!(run(&mut interp, "(a)"), Ok(num(7.0)));
    }
}
