//! KPI formula engine: a small expression language evaluated over a stream
//! of attribute readings.
//!
//! A formula is a text string with the `ATTR` placeholder, either an
//! arithmetic expression (`+ - * /`, decimal numbers, parentheses, unary
//! minus) or the pattern-match shape `Regex(ATTR, '<pattern>')`. The
//! [`Interpreter`] substitutes a value, parses and evaluates; the
//! [`PipelineDriver`] runs that evaluation over a lazy stream of readings,
//! isolating per-record failures so the stream never halts.
//!
//! ```
//! use kpi_engine::{AttrValue, Interpreter, Value};
//!
//! let interpreter = Interpreter::new();
//!
//! let result = interpreter.evaluate("ATTR+50", &AttrValue::Number(100.0));
//! assert_eq!(result.unwrap(), Value::Number(150.0));
//!
//! let result = interpreter.evaluate("Regex(ATTR, 'A.*')", &AttrValue::from("Abc"));
//! assert_eq!(result.unwrap(), Value::Text("True".to_string()));
//! ```

pub mod bindings;
pub mod error;
pub mod eval;
pub mod lex;
pub mod parse;
pub mod pipeline;
pub mod sinks;
pub mod sources;

pub use bindings::{Binding, InMemoryBindingStore};
pub use error::{EvalError, EvaluationError, PipelineError, SyntaxError};
pub use eval::{ATTR_PLACEHOLDER, AttrValue, Interpreter, Value};
pub use lex::{Lexer, Token, TokenKind};
pub use parse::{Ast, BinaryOp, Parser};
pub use pipeline::{
    BindingStore, DataSink, DataSource, EvaluationOutcome, PipelineDriver, Reading, RunStats,
};
pub use sinks::{JsonLinesSink, MemorySink};
pub use sources::FileDataSource;
