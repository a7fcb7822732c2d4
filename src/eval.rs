use std::fmt::Display;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{EvalError, EvaluationError};
use crate::parse::{Ast, BinaryOp, Parser};

/// Placeholder replaced by the reading's value before tokenizing.
pub const ATTR_PLACEHOLDER: &str = "ATTR";

// The fixed pattern-match template. The capture is non-greedy so it stops
// at the first closing quote.
static PATTERN_TEMPLATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Regex\(ATTR, '(.+?)'\)").expect("template regex is valid"));

/// A raw attribute value carried by a reading: numeric or textual.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Number(f64),
    Text(String),
}

impl Display for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttrValue::Number(n) => write!(f, "{n}"),
            AttrValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        AttrValue::Number(n)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

/// Result of one evaluation: a number for arithmetic formulas, or the
/// literal text `"True"` / `"False"` for pattern-match formulas. Kept
/// textual rather than boolean so both shapes serialize uniformly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Stateless expression service: substitution, dispatch, tokenizing,
/// parsing and evaluation behind a single entry point.
///
/// For a fixed `(formula, value)` pair the result is always identical; the
/// interpreter holds no state across calls and formulas are re-parsed on
/// every evaluation, since each call substitutes a fresh value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Interpreter;

impl Interpreter {
    pub fn new() -> Self {
        Interpreter
    }

    /// Evaluates `formula` against one attribute value.
    ///
    /// A formula containing `Regex(` is matched directly against the
    /// value's string form; anything else has every `ATTR` occurrence
    /// substituted and goes through the tokenizer, parser and evaluator.
    /// Arithmetic is never shortcut to any host-language evaluation.
    pub fn evaluate(&self, formula: &str, value: &AttrValue) -> Result<Value, EvaluationError> {
        self.dispatch(formula, value)
            .map_err(|cause| EvaluationError {
                formula: formula.to_string(),
                cause,
            })
    }

    fn dispatch(&self, formula: &str, value: &AttrValue) -> Result<Value, EvalError> {
        if is_pattern_formula(formula) {
            let pattern = extract_pattern(formula)?;
            return evaluate_ast(&Ast::PatternMatch(pattern), value);
        }
        let substituted = formula.replace(ATTR_PLACEHOLDER, &value.to_string());
        let ast = Parser::new(&substituted).parse()?;
        evaluate_ast(&ast, value)
    }
}

/// Whether a formula is the pattern-match shape rather than arithmetic.
/// This is a literal containment check, not grammar disambiguation.
pub fn is_pattern_formula(formula: &str) -> bool {
    formula.contains("Regex(")
}

fn extract_pattern(formula: &str) -> Result<String, EvalError> {
    PATTERN_TEMPLATE
        .captures(formula)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or(EvalError::MalformedTemplate)
}

/// Post-order walk of a parsed formula.
pub fn evaluate_ast(node: &Ast, attr_value: &AttrValue) -> Result<Value, EvalError> {
    match node {
        Ast::PatternMatch(pattern) => {
            // the entire stringified value must match, not a substring
            let anchored = format!(r"\A(?:{pattern})\z");
            let regex = Regex::new(&anchored).map_err(|source| EvalError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            let matched = regex.is_match(&attr_value.to_string());
            Ok(Value::Text(
                if matched { "True" } else { "False" }.to_string(),
            ))
        }
        node => Ok(Value::Number(evaluate_numeric(node)?)),
    }
}

fn evaluate_numeric(node: &Ast) -> Result<f64, EvalError> {
    match node {
        Ast::Number(n) => Ok(*n),
        Ast::UnaryMinus(operand) => Ok(-evaluate_numeric(operand)?),
        Ast::BinaryOp { left, op, right } => {
            let left = evaluate_numeric(left)?;
            let right = evaluate_numeric(right)?;
            match op {
                BinaryOp::Add => Ok(left + right),
                BinaryOp::Sub => Ok(left - right),
                BinaryOp::Mul => Ok(left * right),
                BinaryOp::Div => {
                    if right == 0.0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    Ok(left / right)
                }
            }
        }
        Ast::PatternMatch(_) => Err(EvalError::MisplacedPattern),
    }
}
