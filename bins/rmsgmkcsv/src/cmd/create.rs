use codec_csv::CsvRecordSink;
use rmsg_api::RecordSink;
use rmsg_pipeline::{RecordPipeline, Strategy};
use transport_process::StdProcessSpawner;

use super::config::Effective;
use super::error::CliError;

// ═══════════════════════════════════════════════════════════════
//  create linear | create exec
// ═══════════════════════════════════════════════════════════════

pub fn run(eff: &Effective) -> Result<(), CliError> {
    let out = eff.destination.open()?;
    let mut sink = CsvRecordSink::from_config(out, &eff.csv).map_err(|e| CliError::Config(e.to_string()))?;

    match &eff.strategy {
        Strategy::Linear(linear) => tracing::info!(
            range = ?eff.range,
            start = linear.start,
            step = linear.step,
            output = %eff.destination,
            "creating linear records"
        ),
        Strategy::External(external) => tracing::info!(
            range = ?eff.range,
            program = %external.program,
            output = %eff.destination,
            "creating records from external program"
        ),
    }

    let spawner = StdProcessSpawner;
    let pipeline = RecordPipeline::new(eff.range, eff.strategy.clone(), &spawner);
    let result = pipeline.run(&mut sink).inspect_err(|e| {
        tracing::error!(kind = %e.kind(), error = %e, "generation stopped");
    });

    // flush на любом исходе: записи до ошибки должны попасть в выход
    let flushed = sink.flush().map_err(|e| CliError::Output {
        context: "cannot flush",
        target: eff.destination.to_string(),
        source: e,
    });

    match (result, flushed) {
        (Ok(records), Ok(())) => {
            tracing::info!(records, output = %eff.destination, "done");
            Ok(())
        }
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e.into()),
        (Err(e), Err(flush_err)) => {
            tracing::warn!(error = %flush_err, "flush after failed run");
            Err(e.into())
        }
    }
}
