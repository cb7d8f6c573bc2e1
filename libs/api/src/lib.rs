mod error;
mod record;

pub use error::{ErrorKind, FrameError};
pub use record::{
    milli_to_degrees, LinearSpec, RangeSpec, Record,
    DEFAULT_MAX_MILLI_DEGREES, MAX_STEP_COUNT, MILLI_DEGREES_PER_DEGREE,
};

use std::io::{Read, Write};

// ════════════════════════════════════════════════════════════════
//  Record Sink
// ════════════════════════════════════════════════════════════════

/// Write-only destination for completed records.
///
/// The sink owns all formatting (delimiter, line terminator, buffering).
/// Callers hand it text fields in record order and call `flush` once after
/// the last record, on success and failure paths alike.
pub trait RecordSink {
    fn write(&mut self, fields: &[&str]) -> std::io::Result<()>;

    fn flush(&mut self) -> std::io::Result<()>;

    /// Write one record as `(degree, mcu_value)`.
    fn write_record(&mut self, record: &Record) -> std::io::Result<()> {
        let [degree, mcu] = record.fields();
        self.write(&[degree.as_str(), mcu.as_str()])
    }
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    fn write(&mut self, fields: &[&str]) -> std::io::Result<()> {
        (**self).write(fields)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        (**self).flush()
    }
}

impl<S: RecordSink + ?Sized> RecordSink for Box<S> {
    fn write(&mut self, fields: &[&str]) -> std::io::Result<()> {
        (**self).write(fields)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        (**self).flush()
    }
}

// ════════════════════════════════════════════════════════════════
//  Child Process Transport
// ════════════════════════════════════════════════════════════════

/// Handle to a running child process with its stdin/stdout attached.
///
/// All methods are blocking. The pipes are handed out once; dropping a
/// pipe closes it.
pub trait ChildProcess {
    /// Operating-system id, for logging.
    fn id(&self) -> u32;

    /// Take the write side connected to the child's stdin.
    fn take_stdin(&mut self) -> Option<Box<dyn Write>>;

    /// Take the read side connected to the child's stdout.
    fn take_stdout(&mut self) -> Option<Box<dyn Read>>;

    /// Exit code if the child has already exited (`Some(-1)` when it was
    /// terminated by a signal), `None` while it is still running.
    fn try_wait(&mut self) -> std::io::Result<Option<i32>>;

    /// Ask the operating system to kill the child.
    fn kill(&mut self) -> std::io::Result<()>;

    /// Block until the child has exited and reap it.
    fn wait(&mut self) -> std::io::Result<Option<i32>>;
}

/// Starts child processes with both pipes attached.
pub trait ProcessSpawner {
    fn spawn(&self, program: &str, args: &[String]) -> std::io::Result<Box<dyn ChildProcess>>;
}

// ════════════════════════════════════════════════════════════════
//  Framing
// ════════════════════════════════════════════════════════════════

/// Message boundaries inside a byte stream.
///
/// Implementations are stateless: the caller owns the buffer.
pub trait Framing {
    /// Extract one frame from `buf`.
    /// Returns `(frame, bytes_consumed)`, or `None` if the frame is incomplete.
    fn decode(&self, buf: &[u8]) -> Result<Option<(Vec<u8>, usize)>, FrameError>;

    /// Append framed `data` to `buf`.
    fn encode(&self, data: &[u8], buf: &mut Vec<u8>);
}
