use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::pipeline::{DataSink, EvaluationOutcome};

/// Appends one JSON object per outcome; the streaming counterpart of the
/// catalog's evaluation log.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl JsonLinesSink<BufWriter<File>> {
    pub fn append(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(JsonLinesSink {
            writer: BufWriter::new(file),
        })
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesSink { writer }
    }
}

impl<W: Write> DataSink for JsonLinesSink<W> {
    fn write(&mut self, outcome: &EvaluationOutcome) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, outcome)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

/// Collects outcomes in memory, in write order.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub outcomes: Vec<EvaluationOutcome>,
}

impl MemorySink {
    pub fn new() -> Self {
        MemorySink::default()
    }
}

impl DataSink for MemorySink {
    fn write(&mut self, outcome: &EvaluationOutcome) -> io::Result<()> {
        self.outcomes.push(outcome.clone());
        Ok(())
    }
}
