//! Built-in operation registry.
//!
//! Every procedure the language ships with is defined once here as a
//! [`BuiltinOp`]: a name, an arity contract, and either a callable
//! ([`OpKind::Function`]) or a special-form marker ([`OpKind::SpecialForm`]).
//! The markers (`begin`, `if`, `define`) carry no callable - their evaluation
//! rules are hardcoded in the environment - and exist in the registry solely
//! so the environment seeds them as reserved names, blocking redefinition.
//!
//! Procedures are pure functions over an ordered atom list. Arity is
//! validated from the registry entry before a procedure runs and every
//! argument is type-checked before any computation happens; there is no
//! truthiness and no numeric coercion.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use crate::Error;
use crate::ast::{Atom, Expression};

/// Canonical signature shared by every built-in procedure.
pub type ProcFn = fn(&[Atom]) -> Result<Expression, Error>;

/// Accepted argument counts for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Between(usize, usize),
}

impl Arity {
    fn accepts(self, got: usize) -> bool {
        match self {
            Arity::Exact(n) => got == n,
            Arity::AtLeast(n) => got >= n,
            Arity::Between(min, max) => (min..=max).contains(&got),
        }
    }

    pub(crate) fn validate(self, operation: &str, got: usize) -> Result<(), Error> {
        if self.accepts(got) {
            Ok(())
        } else {
            Err(Error::wrong_arity(operation, self, got))
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "exactly {n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
            Arity::Between(min, max) => write!(f, "between {min} and {max}"),
        }
    }
}

/// The implementation behind a registry entry.
#[derive(Debug, Clone, Copy)]
pub enum OpKind {
    /// Regular procedure applied to evaluated scalar arguments
    Function(ProcFn),
    /// Reserved name whose evaluation rule lives in the environment
    SpecialForm,
}

/// Definition of one built-in operation.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinOp {
    pub name: &'static str,
    pub kind: OpKind,
    pub arity: Arity,
}

fn expect_number(operation: &str, atom: &Atom) -> Result<f64, Error> {
    match atom {
        Atom::Number(n) => Ok(*n),
        other => Err(Error::wrong_type(format!(
            "'{operation}' requires Number arguments, got {}",
            other.kind_name()
        ))),
    }
}

fn expect_boolean(operation: &str, atom: &Atom) -> Result<bool, Error> {
    match atom {
        Atom::Boolean(b) => Ok(*b),
        other => Err(Error::wrong_type(format!(
            "'{operation}' requires Boolean arguments, got {}",
            other.kind_name()
        ))),
    }
}

fn boolean_arguments(operation: &str, args: &[Atom]) -> Result<Vec<bool>, Error> {
    args.iter()
        .map(|atom| expect_boolean(operation, atom))
        .collect()
}

fn number_arguments(operation: &str, args: &[Atom]) -> Result<Vec<f64>, Error> {
    args.iter()
        .map(|atom| expect_number(operation, atom))
        .collect()
}

//
// Procedure implementations
//

fn proc_not(args: &[Atom]) -> Result<Expression, Error> {
    let value = expect_boolean("not", &args[0])?;
    Ok(Expression::boolean(!value))
}

fn proc_and(args: &[Atom]) -> Result<Expression, Error> {
    let values = boolean_arguments("and", args)?;
    Ok(Expression::boolean(values.iter().all(|v| *v)))
}

fn proc_or(args: &[Atom]) -> Result<Expression, Error> {
    let values = boolean_arguments("or", args)?;
    Ok(Expression::boolean(values.iter().any(|v| *v)))
}

// Macro to generate the binary numeric comparison procedures
macro_rules! numeric_comparison {
    ($name:ident, $op:tt, $label:literal) => {
        fn $name(args: &[Atom]) -> Result<Expression, Error> {
            let first = expect_number($label, &args[0])?;
            let second = expect_number($label, &args[1])?;
            Ok(Expression::boolean(first $op second))
        }
    };
}

numeric_comparison!(proc_less_than, <, "<");
numeric_comparison!(proc_less_than_eq, <=, "<=");
numeric_comparison!(proc_greater_than, >, ">");
numeric_comparison!(proc_greater_than_eq, >=, ">=");
numeric_comparison!(proc_equal, ==, "=");

fn proc_add(args: &[Atom]) -> Result<Expression, Error> {
    let values = number_arguments("+", args)?;
    Ok(Expression::number(values.iter().sum()))
}

/// Unary form negates, binary form subtracts second from first.
fn proc_subtract_or_negate(args: &[Atom]) -> Result<Expression, Error> {
    let values = number_arguments("-", args)?;
    match values.as_slice() {
        [only] => Ok(Expression::number(-only)),
        [first, second] => Ok(Expression::number(first - second)),
        // The registry arity admits only 1 or 2 arguments
        _ => Err(Error::wrong_arity("-", Arity::Between(1, 2), values.len())),
    }
}

fn proc_multiply(args: &[Atom]) -> Result<Expression, Error> {
    let values = number_arguments("*", args)?;
    Ok(Expression::number(values.iter().product()))
}

/// Quotient of the two arguments. Division by zero is not guarded; the IEEE
/// result (infinity or NaN) propagates.
fn proc_divide(args: &[Atom]) -> Result<Expression, Error> {
    let first = expect_number("/", &args[0])?;
    let second = expect_number("/", &args[1])?;
    Ok(Expression::number(first / second))
}

fn proc_log10(args: &[Atom]) -> Result<Expression, Error> {
    let value = expect_number("log10", &args[0])?;
    Ok(Expression::number(value.log10()))
}

fn proc_pow(args: &[Atom]) -> Result<Expression, Error> {
    let base = expect_number("pow", &args[0])?;
    let exponent = expect_number("pow", &args[1])?;
    Ok(Expression::number(base.powf(exponent)))
}

/// Sine in radians. Results with magnitude below 0.001 clamp to exactly
/// zero, so `(sin pi)` is 0 rather than a sub-epsilon residue.
fn proc_sin(args: &[Atom]) -> Result<Expression, Error> {
    let value = expect_number("sin", &args[0])?;
    let result = value.sin();
    Ok(Expression::number(if result.abs() < 0.001 {
        0.0
    } else {
        result
    }))
}

fn proc_cos(args: &[Atom]) -> Result<Expression, Error> {
    let value = expect_number("cos", &args[0])?;
    Ok(Expression::number(value.cos()))
}

/// Two-argument arctangent: atan2(first, second).
fn proc_arctan(args: &[Atom]) -> Result<Expression, Error> {
    let y = expect_number("arctan", &args[0])?;
    let x = expect_number("arctan", &args[1])?;
    Ok(Expression::number(y.atan2(x)))
}

/// The fixed registry of built-in operations.
static BUILTIN_OPS: LazyLock<Vec<BuiltinOp>> = LazyLock::new(|| {
    vec![
        // Logical operations
        BuiltinOp {
            name: "not",
            kind: OpKind::Function(proc_not),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            name: "and",
            kind: OpKind::Function(proc_and),
            arity: Arity::AtLeast(1),
        },
        BuiltinOp {
            name: "or",
            kind: OpKind::Function(proc_or),
            arity: Arity::AtLeast(1),
        },
        // Relational comparisons
        BuiltinOp {
            name: "<",
            kind: OpKind::Function(proc_less_than),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            name: "<=",
            kind: OpKind::Function(proc_less_than_eq),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            name: ">",
            kind: OpKind::Function(proc_greater_than),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            name: ">=",
            kind: OpKind::Function(proc_greater_than_eq),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            name: "=",
            kind: OpKind::Function(proc_equal),
            arity: Arity::Exact(2),
        },
        // Arithmetic
        BuiltinOp {
            name: "+",
            kind: OpKind::Function(proc_add),
            arity: Arity::AtLeast(1),
        },
        BuiltinOp {
            name: "-",
            kind: OpKind::Function(proc_subtract_or_negate),
            arity: Arity::Between(1, 2),
        },
        BuiltinOp {
            name: "*",
            kind: OpKind::Function(proc_multiply),
            arity: Arity::AtLeast(1),
        },
        BuiltinOp {
            name: "/",
            kind: OpKind::Function(proc_divide),
            arity: Arity::Exact(2),
        },
        // Math
        BuiltinOp {
            name: "log10",
            kind: OpKind::Function(proc_log10),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            name: "pow",
            kind: OpKind::Function(proc_pow),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            name: "sin",
            kind: OpKind::Function(proc_sin),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            name: "cos",
            kind: OpKind::Function(proc_cos),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            name: "arctan",
            kind: OpKind::Function(proc_arctan),
            arity: Arity::Exact(2),
        },
        // Reserved special-form names; evaluation rules live in the
        // environment, the registry entry only blocks redefinition
        BuiltinOp {
            name: "begin",
            kind: OpKind::SpecialForm,
            arity: Arity::AtLeast(1),
        },
        BuiltinOp {
            name: "if",
            kind: OpKind::SpecialForm,
            arity: Arity::Exact(3),
        },
        BuiltinOp {
            name: "define",
            kind: OpKind::SpecialForm,
            arity: Arity::Exact(2),
        },
    ]
});

/// Lazy map from name to registry entry.
static BUILTIN_INDEX: LazyLock<HashMap<&'static str, &'static BuiltinOp>> = LazyLock::new(|| {
    let ops: &'static [BuiltinOp] = BUILTIN_OPS.as_slice();
    ops.iter().map(|op| (op.name, op)).collect()
});

/// All registry entries, in definition order.
pub(crate) fn builtin_ops() -> &'static [BuiltinOp] {
    BUILTIN_OPS.as_slice()
}

/// Find a registry entry by name.
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn find_op(name: &str) -> Option<&'static BuiltinOp> {
    BUILTIN_INDEX.get(name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{boolean, num};

    /// Invoke a registered procedure through the registry, validating arity
    /// the way the evaluator does.
    fn call_builtin(name: &str, args: &[Atom]) -> Result<Expression, Error> {
        let op = find_op(name).unwrap_or_else(|| panic!("builtin '{name}' not registered"));
        let OpKind::Function(func) = op.kind else {
            panic!("expected a function builtin in tests, got special form '{name}'");
        };
        op.arity.validate(name, args.len())?;
        func(args)
    }

    fn numbers(values: &[f64]) -> Vec<Atom> {
        values.iter().map(|v| Atom::Number(*v)).collect()
    }

    fn booleans(values: &[bool]) -> Vec<Atom> {
        values.iter().map(|v| Atom::Boolean(*v)).collect()
    }

    #[test]
    fn test_arithmetic_procedures() {
        // Each of these evaluates to -1
        let minus_one_cases: Vec<(&str, Vec<Atom>)> = vec![
            ("+", numbers(&[1.0, -2.0])),
            ("+", numbers(&[-3.0, 1.0, 1.0])),
            ("-", numbers(&[1.0])),
            ("-", numbers(&[1.0, 2.0])),
            ("*", numbers(&[1.0, -1.0])),
            ("*", numbers(&[1.0, 1.0, -1.0])),
            ("/", numbers(&[-1.0, 1.0])),
            ("/", numbers(&[1.0, -1.0])),
        ];
        for (i, (name, args)) in minus_one_cases.iter().enumerate() {
            let result = call_builtin(name, args);
            assert_eq!(
                result,
                Ok(num(-1.0)),
                "arithmetic test #{} ({name}) failed",
                i + 1
            );
        }

        assert_eq!(
            call_builtin("+", &numbers(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])),
            Ok(num(21.0))
        );
    }

    #[test]
    fn test_division_is_unguarded() {
        assert_eq!(
            call_builtin("/", &numbers(&[1.0, 0.0])),
            Ok(num(f64::INFINITY))
        );
    }

    #[test]
    fn test_relational_procedures() {
        let true_cases: Vec<(&str, [f64; 2])> = vec![
            ("<", [1.0, 2.0]),
            ("<=", [1.0, 2.0]),
            ("<=", [1.0, 1.0]),
            (">", [2.0, 1.0]),
            (">=", [2.0, 1.0]),
            (">=", [2.0, 2.0]),
            ("=", [4.0, 4.0]),
        ];
        let false_cases: Vec<(&str, [f64; 2])> = vec![
            ("<", [2.0, 1.0]),
            ("<=", [2.0, 1.0]),
            (">", [1.0, 2.0]),
            (">=", [1.0, 2.0]),
            ("=", [0.0, 4.0]),
        ];
        for (name, args) in true_cases {
            assert_eq!(call_builtin(name, &numbers(&args)), Ok(boolean(true)));
        }
        for (name, args) in false_cases {
            assert_eq!(call_builtin(name, &numbers(&args)), Ok(boolean(false)));
        }
    }

    #[test]
    fn test_logical_procedures() {
        assert_eq!(call_builtin("not", &booleans(&[true])), Ok(boolean(false)));
        assert_eq!(call_builtin("not", &booleans(&[false])), Ok(boolean(true)));

        assert_eq!(
            call_builtin("and", &booleans(&[true, true, false])),
            Ok(boolean(false))
        );
        assert_eq!(
            call_builtin("and", &booleans(&[true, true])),
            Ok(boolean(true))
        );
        assert_eq!(
            call_builtin("or", &booleans(&[false, false])),
            Ok(boolean(false))
        );
        assert_eq!(
            call_builtin("or", &booleans(&[false, true, false])),
            Ok(boolean(true))
        );
    }

    #[test]
    fn test_math_procedures() {
        assert_eq!(call_builtin("log10", &numbers(&[100.0])), Ok(num(2.0)));
        assert_eq!(call_builtin("pow", &numbers(&[10.0, 3.0])), Ok(num(1000.0)));
        assert_eq!(
            call_builtin("arctan", &numbers(&[1.0, 0.0])),
            Ok(num(1.0f64.atan2(0.0)))
        );
        assert_eq!(
            call_builtin("cos", &numbers(&[std::f64::consts::PI])),
            Ok(num(-1.0))
        );
    }

    #[test]
    fn test_sin_clamps_near_zero() {
        // sin(pi) is a sub-epsilon residue; the clamp makes it exactly zero
        assert_eq!(
            call_builtin("sin", &numbers(&[std::f64::consts::PI])),
            Ok(num(0.0))
        );
        // The clamp is on magnitude: values near -0 clamp too
        assert_eq!(
            call_builtin("sin", &numbers(&[-1e-9])),
            Ok(num(0.0))
        );
        // Ordinary results pass through
        assert_eq!(
            call_builtin("sin", &numbers(&[std::f64::consts::FRAC_PI_2])),
            Ok(num(1.0))
        );
    }

    #[test]
    fn test_arity_errors() {
        let cases: Vec<(&str, Vec<Atom>)> = vec![
            ("<", numbers(&[1.0, 1.0, 2.0])),
            ("-", numbers(&[1.0, 1.0, 2.0])),
            ("sin", numbers(&[0.0, 1.0])),
            ("cos", numbers(&[0.0, 1.0])),
            ("arctan", numbers(&[0.0])),
            ("log10", numbers(&[1.0, 2.0, 3.0])),
            ("pow", numbers(&[10.0])),
            ("not", booleans(&[true, false])),
        ];
        for (name, args) in cases {
            match call_builtin(name, &args) {
                Err(Error::WrongArity { operation, .. }) => assert_eq!(operation, name),
                other => panic!("expected WrongArity from '{name}', got {other:?}"),
            }
        }
    }

    #[test]
    fn test_type_errors() {
        let cases: Vec<(&str, Vec<Atom>)> = vec![
            ("sin", booleans(&[true])),
            ("cos", booleans(&[true])),
            ("arctan", vec![Atom::Number(1.0), Atom::Boolean(false)]),
            ("+", vec![Atom::Number(1.0), Atom::Boolean(true)]),
            ("not", numbers(&[4.0])),
            ("and", vec![Atom::Boolean(true), Atom::Number(1.0)]),
            ("<", vec![Atom::Boolean(true), Atom::Number(1.0)]),
        ];
        for (name, args) in cases {
            match call_builtin(name, &args) {
                Err(Error::WrongType(_)) => {}
                other => panic!("expected WrongType from '{name}', got {other:?}"),
            }
        }
    }

    #[test]
    fn test_registry_covers_language() {
        let names: Vec<&str> = builtin_ops().iter().map(|op| op.name).collect();
        for required in [
            "not", "and", "or", "<", "<=", ">", ">=", "=", "+", "-", "*", "/", "log10", "pow",
            "sin", "cos", "arctan", "begin", "if", "define",
        ] {
            assert!(names.contains(&required), "missing builtin '{required}'");
        }
        assert!(matches!(
            find_op("begin").map(|op| op.kind),
            Some(OpKind::SpecialForm)
        ));
        assert!(find_op("nope").is_none());
    }
}
