use rmsg_api::{LinearSpec, ProcessSpawner, RangeSpec, Record, RecordSink};

use crate::external::{ExternalProcessAdapter, ExternalSpec};
use crate::linear::linear_values;
use crate::range::generate_degrees;
use crate::GenerateError;

/// Where MCU values come from.
#[derive(Debug, Clone)]
pub enum Strategy {
    Linear(LinearSpec),
    External(ExternalSpec),
}

/// Generates records for a range and streams each one to the sink as soon
/// as it is complete. A failure stops the run; records already written stay
/// written.
///
/// The sink is not flushed here: the caller owns it and flushes it on every
/// exit path.
pub struct RecordPipeline<'a> {
    range: RangeSpec,
    strategy: Strategy,
    spawner: &'a dyn ProcessSpawner,
}

impl<'a> RecordPipeline<'a> {
    pub fn new(range: RangeSpec, strategy: Strategy, spawner: &'a dyn ProcessSpawner) -> Self {
        Self { range, strategy, spawner }
    }

    /// Run to completion and return the number of records written.
    pub fn run<S: RecordSink + ?Sized>(&self, sink: &mut S) -> Result<usize, GenerateError> {
        let written = match &self.strategy {
            Strategy::Linear(linear) => self.run_linear(linear, sink)?,
            Strategy::External(external) => self.run_external(external, sink)?,
        };
        tracing::info!(records = written, "generation complete");
        Ok(written)
    }

    fn run_linear<S: RecordSink + ?Sized>(
        &self,
        linear: &LinearSpec,
        sink: &mut S,
    ) -> Result<usize, GenerateError> {
        let degrees = generate_degrees(&self.range)?;
        let values = linear_values(degrees.len(), linear);

        let mut written = 0;
        for (degree, mcu) in degrees.zip(values) {
            emit(sink, Record::new(degree, mcu?))?;
            written += 1;
        }
        Ok(written)
    }

    fn run_external<S: RecordSink + ?Sized>(
        &self,
        external: &ExternalSpec,
        sink: &mut S,
    ) -> Result<usize, GenerateError> {
        // Range errors surface before anything is spawned.
        let degrees = generate_degrees(&self.range)?;
        let expected = degrees.len();

        let mut adapter = ExternalProcessAdapter::new(external.clone());
        adapter.start(self.spawner)?;

        let mut written = 0;
        for degree in degrees {
            let mcu = adapter.request(degree).inspect_err(|e| {
                tracing::error!(degree, answered = written, expected, error = %e, "round trip failed");
            })?;
            emit(sink, Record::new(degree, mcu))?;
            written += 1;
        }

        adapter.finish()?;
        Ok(written)
    }
}

fn emit<S: RecordSink + ?Sized>(sink: &mut S, record: Record) -> Result<(), GenerateError> {
    sink.write_record(&record).map_err(GenerateError::Sink)
}
