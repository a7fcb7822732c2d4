use std::thread;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::eval::{AttrValue, Interpreter, Value, is_pattern_formula};

/// Default delay between readings, matching the upstream feed cadence.
/// A deliberate constant-rate throttle, not adaptive backpressure.
pub const DEFAULT_PACE: Duration = Duration::from_secs(5);

/// Prefix marking an attribute id as a computed output.
pub const OUTPUT_PREFIX: &str = "output_";

/// A lazy stream of decoded ingress records.
///
/// Implementations yield one record per independently decodable unit (for
/// the file source, one non-blank line); raw units that fail to decode are
/// logged and skipped inside the source and never terminate the stream.
pub trait DataSource {
    fn next_record(&mut self) -> Option<serde_json::Value>;
}

/// Synchronous destination for evaluation outcomes. A failed write aborts
/// only the reading being processed, never the pipeline.
pub trait DataSink {
    fn write(&mut self, outcome: &EvaluationOutcome) -> std::io::Result<()>;
}

/// Read-only lookup of the formula bound to an (asset, attribute) pair.
/// Uniqueness per pair is the catalog's contract.
pub trait BindingStore {
    fn find(&self, asset_id: &str, attribute_id: &str) -> Option<&str>;
}

/// One validated ingress record. Lives for a single pipeline iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub asset_id: String,
    pub attribute_id: String,
    pub timestamp: String,
    pub value: AttrValue,
}

impl Reading {
    /// Validates a decoded record: it must be a JSON object and all four
    /// fields must be present and non-null. Empty-string identifiers count
    /// as missing.
    pub fn from_record(record: &serde_json::Value) -> Result<Self, PipelineError> {
        let fields = record.as_object().ok_or(PipelineError::InvalidShape)?;
        let asset_id = required_text(fields, "asset_id")?;
        let attribute_id = required_text(fields, "attribute_id")?;
        let timestamp = required_text(fields, "timestamp")?;
        let value = match fields.get("value") {
            None | Some(serde_json::Value::Null) => {
                return Err(PipelineError::MissingField { field: "value" });
            }
            Some(serde_json::Value::Number(n)) => match n.as_f64() {
                Some(n) => AttrValue::Number(n),
                None => AttrValue::Text(n.to_string()),
            },
            Some(serde_json::Value::String(s)) => AttrValue::Text(s.clone()),
            Some(other) => AttrValue::Text(other.to_string()),
        };
        Ok(Reading {
            asset_id,
            attribute_id,
            timestamp,
            value,
        })
    }
}

fn required_text(
    fields: &serde_json::Map<String, serde_json::Value>,
    field: &'static str,
) -> Result<String, PipelineError> {
    match fields.get(field) {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        _ => Err(PipelineError::MissingField { field }),
    }
}

/// The computed result of applying a formula to one reading, destined for
/// the sink. The attribute id carries the [`OUTPUT_PREFIX`] to mark it as
/// derived.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationOutcome {
    pub asset_id: String,
    pub attribute_id: String,
    pub timestamp: String,
    pub result: Value,
}

/// Per-run counters, reported once the source is exhausted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub processed: u64,
    pub skipped: u64,
}

/// Drives the evaluation loop: fetch, validate, resolve, coerce, evaluate,
/// emit, pace. Strictly sequential; one reading is finished before the next
/// is fetched, and readings are processed in source order.
pub struct PipelineDriver<B, S> {
    bindings: B,
    sink: S,
    interpreter: Interpreter,
    pace: Duration,
}

impl<B: BindingStore, S: DataSink> PipelineDriver<B, S> {
    pub fn new(bindings: B, sink: S) -> Self {
        PipelineDriver {
            bindings,
            sink,
            interpreter: Interpreter::new(),
            pace: DEFAULT_PACE,
        }
    }

    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Drains the source, pausing `pace` between readings. Every per-record
    /// failure is logged with asset/attribute context and skipped; the loop
    /// ends only when the source is exhausted, with no sentinel emitted.
    pub fn run(&mut self, source: &mut dyn DataSource) -> RunStats {
        let mut stats = RunStats::default();
        while let Some(record) = source.next_record() {
            match self.process(&record) {
                Ok(outcome) => {
                    stats.processed += 1;
                    info!(
                        asset_id = %outcome.asset_id,
                        attribute_id = %outcome.attribute_id,
                        result = %outcome.result,
                        "processed reading"
                    );
                }
                Err(error) => {
                    stats.skipped += 1;
                    let asset_id = record
                        .get("asset_id")
                        .and_then(serde_json::Value::as_str)
                        .unwrap_or("<unknown>");
                    let attribute_id = record
                        .get("attribute_id")
                        .and_then(serde_json::Value::as_str)
                        .unwrap_or("<unknown>");
                    warn!(asset_id, attribute_id, %error, "skipping reading");
                }
            }
            if !self.pace.is_zero() {
                thread::sleep(self.pace);
            }
        }
        stats
    }

    fn process(&mut self, record: &serde_json::Value) -> Result<EvaluationOutcome, PipelineError> {
        let reading = Reading::from_record(record)?;
        let formula = self
            .bindings
            .find(&reading.asset_id, &reading.attribute_id)
            .ok_or_else(|| PipelineError::BindingNotFound {
                asset_id: reading.asset_id.clone(),
                attribute_id: reading.attribute_id.clone(),
            })?
            .to_string();

        let value = coerce_value(reading.value, &formula)?;
        let result = self.interpreter.evaluate(&formula, &value)?;

        let outcome = EvaluationOutcome {
            asset_id: reading.asset_id,
            attribute_id: format!("{OUTPUT_PREFIX}{}", reading.attribute_id),
            timestamp: reading.timestamp,
            result,
        };
        self.sink.write(&outcome)?;
        Ok(outcome)
    }
}

/// Numeric-looking strings become numbers before evaluation. A value that
/// is neither numeric nor destined for a pattern-match formula is rejected
/// without invoking the expression service.
fn coerce_value(value: AttrValue, formula: &str) -> Result<AttrValue, PipelineError> {
    match value {
        AttrValue::Text(text) if looks_numeric(&text) => match text.parse() {
            Ok(n) => Ok(AttrValue::Number(n)),
            Err(_) => Err(PipelineError::NonNumericValue { value: text }),
        },
        AttrValue::Text(text) if !is_pattern_formula(formula) => {
            Err(PipelineError::NonNumericValue { value: text })
        }
        value => Ok(value),
    }
}

/// Unsigned decimal digits with at most one `.`; no sign, no exponent.
fn looks_numeric(text: &str) -> bool {
    let mut digits = 0usize;
    let mut dots = 0usize;
    for c in text.chars() {
        if c.is_ascii_digit() {
            digits += 1;
        } else if c == '.' {
            dots += 1;
        } else {
            return false;
        }
    }
    digits > 0 && dots <= 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn looks_numeric_accepts_plain_decimals_only() {
        assert!(looks_numeric("100"));
        assert!(looks_numeric("3.5"));
        assert!(looks_numeric("12."));
        assert!(!looks_numeric(""));
        assert!(!looks_numeric("."));
        assert!(!looks_numeric("-5"));
        assert!(!looks_numeric("1e5"));
        assert!(!looks_numeric("1.2.3"));
    }

    #[test]
    fn reading_requires_all_four_fields() {
        let record = json!({
            "asset_id": "A001",
            "attribute_id": "temp",
            "value": 21.5
        });
        let err = Reading::from_record(&record).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingField { field: "timestamp" }
        ));
    }

    #[test]
    fn reading_rejects_null_and_empty_fields() {
        let record = json!({
            "asset_id": "",
            "attribute_id": "temp",
            "timestamp": "2024-01-01T00:00:00Z",
            "value": 1
        });
        assert!(matches!(
            Reading::from_record(&record),
            Err(PipelineError::MissingField { field: "asset_id" })
        ));

        let record = json!({
            "asset_id": "A001",
            "attribute_id": "temp",
            "timestamp": "2024-01-01T00:00:00Z",
            "value": null
        });
        assert!(matches!(
            Reading::from_record(&record),
            Err(PipelineError::MissingField { field: "value" })
        ));
    }

    #[test]
    fn reading_rejects_non_object_records() {
        assert!(matches!(
            Reading::from_record(&json!([1, 2, 3])),
            Err(PipelineError::InvalidShape)
        ));
    }

    #[test]
    fn coercion_skips_text_against_arithmetic_formulas() {
        let err = coerce_value(AttrValue::from("hello"), "ATTR+1").unwrap_err();
        assert!(matches!(err, PipelineError::NonNumericValue { .. }));
    }

    #[test]
    fn coercion_converts_numeric_strings() {
        let value = coerce_value(AttrValue::from("100"), "ATTR+1").unwrap();
        assert_eq!(value, AttrValue::Number(100.0));
    }

    #[test]
    fn coercion_passes_text_through_to_pattern_formulas() {
        let value = coerce_value(AttrValue::from("Abc"), "Regex(ATTR, 'A.*')").unwrap();
        assert_eq!(value, AttrValue::Text("Abc".to_string()));
    }
}
