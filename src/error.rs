use miette::Diagnostic;
use thiserror::Error;

/// A malformed token sequence, detected while parsing a formula.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum SyntaxError {
    #[error("unexpected end of expression")]
    #[diagnostic(help("the formula ended where a number, `(` or unary `-` was expected"))]
    UnexpectedEnd,

    #[error("unexpected token `{token}`")]
    #[diagnostic(help("formulas admit decimal numbers, `+ - * /` and parentheses"))]
    UnexpectedToken { token: String },

    #[error("mismatched parentheses")]
    #[diagnostic(help("a `(` group was opened but never closed"))]
    MismatchedParens,
}

/// Any failure while evaluating a single formula.
#[derive(Debug, Error, Diagnostic)]
pub enum EvalError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("division by zero")]
    DivisionByZero,

    #[error("invalid regex pattern `{pattern}`")]
    #[diagnostic(help("the pattern inside `Regex(ATTR, '...')` must be a valid regular expression"))]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid regex expression format")]
    #[diagnostic(help("pattern-match formulas must have the exact shape `Regex(ATTR, '<pattern>')`"))]
    MalformedTemplate,

    #[error("pattern match is not valid inside an arithmetic expression")]
    MisplacedPattern,
}

/// The single error type surfaced by the expression service: every internal
/// failure is wrapped here with the offending formula attached, so callers
/// never see a bare lexer, parser or regex error.
#[derive(Debug, Error, Diagnostic)]
#[error("error evaluating expression `{formula}`")]
pub struct EvaluationError {
    pub formula: String,
    #[source]
    #[diagnostic_source]
    pub cause: EvalError,
}

/// Why one reading was skipped by the pipeline driver. None of these is
/// fatal to the stream.
#[derive(Debug, Error, Diagnostic)]
pub enum PipelineError {
    #[error("record is not a JSON object")]
    InvalidShape,

    #[error("missing or null required field `{field}`")]
    MissingField { field: &'static str },

    #[error("no binding for asset `{asset_id}`, attribute `{attribute_id}`")]
    BindingNotFound {
        asset_id: String,
        attribute_id: String,
    },

    #[error("non-numeric value `{value}` for an arithmetic formula")]
    NonNumericValue { value: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error("sink write failed")]
    Sink(#[from] std::io::Error),
}
