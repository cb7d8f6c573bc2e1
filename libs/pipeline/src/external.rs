use std::io::{Read, Write};
use std::time::{Duration, Instant};

use framing_lines::LinesFraming;
use rmsg_api::{milli_to_degrees, ChildProcess, Framing, ProcessSpawner};

use crate::GenerateError;

/// Longest response line accepted from the external program.
pub const MAX_RESPONSE_LINE: usize = 4096;

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

// ═══════════════════════════════════════════════════════════════
//  External program description
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalSpec {
    pub program: String,
    pub args: Vec<String>,
    /// How long to wait for the program to exit by itself once its stdin is
    /// closed. Zero kills it right away.
    pub grace: Duration,
}

impl ExternalSpec {
    /// Split a command line (`program arg...`). `None` if it is empty.
    pub fn from_command(command: &[String], grace: Duration) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            grace,
        })
    }
}

/// Request text for a milli-degree value: the shortest decimal that
/// round-trips `milli / 1000` as an `f64`, never in exponent form.
pub fn format_degrees(milli_degrees: i64) -> String {
    format!("{}", milli_to_degrees(milli_degrees))
}

// ═══════════════════════════════════════════════════════════════
//  Adapter
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    NotStarted,
    Running,
    Draining,
    Terminated,
}

/// Drives one external program through the line protocol: one request
/// line in, one response line out, never more than one request in flight.
///
/// The child and both of its pipes belong to the adapter. Teardown closes
/// stdin, then stdout, then kills and reaps the child. It runs from
/// [`finish`](Self::finish) or, on error paths, from `Drop`.
pub struct ExternalProcessAdapter {
    spec: ExternalSpec,
    state: AdapterState,
    child: Option<Box<dyn ChildProcess>>,
    stdin: Option<Box<dyn Write>>,
    stdout: Option<Box<dyn Read>>,
    framing: LinesFraming,
    /// Bytes read from stdout but not yet decoded.
    buf: Vec<u8>,
    out: Vec<u8>,
    answered: usize,
}

impl ExternalProcessAdapter {
    pub fn new(spec: ExternalSpec) -> Self {
        Self {
            spec,
            state: AdapterState::NotStarted,
            child: None,
            stdin: None,
            stdout: None,
            framing: LinesFraming::new(MAX_RESPONSE_LINE),
            buf: Vec::with_capacity(256),
            out: Vec::with_capacity(64),
            answered: 0,
        }
    }

    pub fn state(&self) -> AdapterState {
        self.state
    }

    /// Round trips completed so far.
    pub fn answered(&self) -> usize {
        self.answered
    }

    /// Launch the program and attach both pipes.
    pub fn start(&mut self, spawner: &dyn ProcessSpawner) -> Result<(), GenerateError> {
        if self.state != AdapterState::NotStarted {
            return Err(self.start_failed(std::io::Error::other("adapter was already started")));
        }

        let mut child = spawner
            .spawn(&self.spec.program, &self.spec.args)
            .map_err(|e| self.start_failed(e))?;

        let (Some(stdin), Some(stdout)) = (child.take_stdin(), child.take_stdout()) else {
            if let Err(e) = child.kill().and_then(|_| child.wait()) {
                tracing::warn!(program = %self.spec.program, error = %e, "cannot kill half-attached child");
            }
            return Err(self.start_failed(std::io::Error::other("stdin/stdout not piped")));
        };

        tracing::info!(
            program = %self.spec.program,
            args = ?self.spec.args,
            pid = child.id(),
            "external program started"
        );

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stdout = Some(stdout);
        self.state = AdapterState::Running;
        Ok(())
    }

    fn start_failed(&self, source: std::io::Error) -> GenerateError {
        GenerateError::ProcessStartFailed { program: self.spec.program.clone(), source }
    }

    /// One round trip: send `milli_degrees` as decimal degrees and read the
    /// MCU value the program answers with.
    pub fn request(&mut self, milli_degrees: i64) -> Result<i64, GenerateError> {
        if self.state != AdapterState::Running {
            return Err(GenerateError::ProcessIo {
                context: "request",
                source: std::io::Error::other(format!("adapter is {:?}, not running", self.state)),
            });
        }

        let text = format_degrees(milli_degrees);
        self.write_request(&text)?;
        let mcu = self.read_response()?;
        self.answered += 1;
        tracing::trace!(degrees = %text, mcu, "round trip");
        Ok(mcu)
    }

    fn write_request(&mut self, text: &str) -> Result<(), GenerateError> {
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(GenerateError::PrematureProcessExit { answered: self.answered });
        };

        self.out.clear();
        self.framing.encode(text.as_bytes(), &mut self.out);

        match stdin.write_all(&self.out).and_then(|_| stdin.flush()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                Err(GenerateError::PrematureProcessExit { answered: self.answered })
            }
            Err(e) => Err(GenerateError::ProcessIo { context: "write request", source: e }),
        }
    }

    fn read_response(&mut self) -> Result<i64, GenerateError> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Err(GenerateError::PrematureProcessExit { answered: self.answered });
        };

        let mut tmp = [0u8; 256];
        loop {
            match self.framing.decode(&self.buf) {
                Ok(Some((line, consumed))) => {
                    self.buf.drain(..consumed);
                    return parse_mcu(&line);
                }
                Ok(None) => {}
                Err(e) => {
                    let preview = String::from_utf8_lossy(&self.buf[..self.buf.len().min(32)]).into_owned();
                    return Err(GenerateError::McuParseError { text: preview, reason: e.to_string() });
                }
            }

            match stdout.read(&mut tmp) {
                Ok(0) if self.buf.is_empty() => {
                    return Err(GenerateError::PrematureProcessExit { answered: self.answered });
                }
                Ok(0) => {
                    // Last line without a terminator.
                    let line = std::mem::take(&mut self.buf);
                    let line = line.strip_suffix(b"\r").unwrap_or(&line);
                    return parse_mcu(line);
                }
                Ok(n) => self.buf.extend_from_slice(&tmp[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(GenerateError::ProcessIo { context: "read response", source: e }),
            }
        }
    }

    /// Close both pipes and terminate the program.
    ///
    /// Only an unexpected failure while closing stdin is returned; broken
    /// pipes and a failed kill are logged and tolerated.
    pub fn finish(&mut self) -> Result<(), GenerateError> {
        if matches!(self.state, AdapterState::NotStarted | AdapterState::Terminated) {
            return Ok(());
        }
        self.state = AdapterState::Draining;

        let mut result = Ok(());
        if let Some(mut stdin) = self.stdin.take() {
            match stdin.flush() {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    tracing::debug!(error = %e, "stdin already closed");
                }
                Err(e) => result = Err(GenerateError::ProcessIo { context: "close stdin", source: e }),
            }
        }
        self.stdout = None;
        self.buf.clear();

        if let Some(mut child) = self.child.take() {
            self.terminate(child.as_mut());
        }
        self.state = AdapterState::Terminated;
        result
    }

    fn terminate(&self, child: &mut dyn ChildProcess) {
        let pid = child.id();

        if !self.spec.grace.is_zero() {
            let deadline = Instant::now() + self.spec.grace;
            loop {
                match child.try_wait() {
                    Ok(Some(code)) => {
                        tracing::info!(pid, code, "external program exited");
                        return;
                    }
                    Ok(None) if Instant::now() < deadline => std::thread::sleep(EXIT_POLL_INTERVAL),
                    Ok(None) => break,
                    Err(e) => {
                        tracing::debug!(pid, error = %e, "cannot poll external program");
                        break;
                    }
                }
            }
        }

        if let Err(e) = child.kill() {
            tracing::warn!(pid, error = %e, "kill external program");
        }
        match child.wait() {
            Ok(code) => tracing::info!(pid, ?code, answered = self.answered, "external program terminated"),
            Err(e) => tracing::warn!(pid, error = %e, "reap external program"),
        }
    }
}

impl Drop for ExternalProcessAdapter {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            tracing::warn!(program = %self.spec.program, error = %e, "teardown after failure");
        }
    }
}

fn parse_mcu(line: &[u8]) -> Result<i64, GenerateError> {
    let text = std::str::from_utf8(line).map_err(|e| GenerateError::McuParseError {
        text: String::from_utf8_lossy(line).into_owned(),
        reason: e.to_string(),
    })?;
    text.parse::<i64>().map_err(|e| GenerateError::McuParseError {
        text: text.to_string(),
        reason: e.to_string(),
    })
}
