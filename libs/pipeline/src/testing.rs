//! In-memory `ProcessSpawner` for tests: a scripted child that answers each
//! request line through a responder function.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{Read, Write};
use std::rc::Rc;

use rmsg_api::{ChildProcess, ProcessSpawner};

type Responder = dyn Fn(&str) -> Option<String>;

/// Everything the scripted child observed.
#[derive(Default)]
pub(crate) struct ChildLog {
    pub spawned: Vec<(String, Vec<String>)>,
    pub requests: Vec<String>,
    /// Response bytes not read yet.
    pub pending: VecDeque<u8>,
    /// The responder declined: stdout is at EOF and stdin is broken.
    pub eof: bool,
    pub stdin_closed: bool,
    pub kills: usize,
    pub waits: usize,
    /// A request arrived while an earlier response was still unread.
    pub overlapped: bool,
}

/// Echoes `floor(degrees)` for every request.
pub(crate) fn floor_degrees(line: &str) -> Option<String> {
    let degrees: f64 = line.parse().ok()?;
    Some(format!("{}\n", degrees.floor() as i64))
}

pub(crate) struct ScriptedSpawner {
    pub log: Rc<RefCell<ChildLog>>,
    responder: Rc<Responder>,
    fail_spawn: bool,
    fail_kill: bool,
    exits_on_stdin_close: bool,
}

impl ScriptedSpawner {
    pub fn new(responder: impl Fn(&str) -> Option<String> + 'static) -> Self {
        Self {
            log: Rc::default(),
            responder: Rc::new(responder),
            fail_spawn: false,
            fail_kill: false,
            exits_on_stdin_close: false,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail_spawn = true;
        self
    }

    pub fn kill_fails(mut self) -> Self {
        self.fail_kill = true;
        self
    }

    pub fn exits_on_stdin_close(mut self) -> Self {
        self.exits_on_stdin_close = true;
        self
    }
}

impl ProcessSpawner for ScriptedSpawner {
    fn spawn(&self, program: &str, args: &[String]) -> std::io::Result<Box<dyn ChildProcess>> {
        if self.fail_spawn {
            return Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no such program"));
        }
        self.log.borrow_mut().spawned.push((program.to_string(), args.to_vec()));
        Ok(Box::new(ScriptedChild {
            log: self.log.clone(),
            responder: self.responder.clone(),
            fail_kill: self.fail_kill,
            exits_on_stdin_close: self.exits_on_stdin_close,
            stdin_taken: false,
            stdout_taken: false,
        }))
    }
}

struct ScriptedChild {
    log: Rc<RefCell<ChildLog>>,
    responder: Rc<Responder>,
    fail_kill: bool,
    exits_on_stdin_close: bool,
    stdin_taken: bool,
    stdout_taken: bool,
}

impl ChildProcess for ScriptedChild {
    fn id(&self) -> u32 {
        4242
    }

    fn take_stdin(&mut self) -> Option<Box<dyn Write>> {
        if std::mem::replace(&mut self.stdin_taken, true) {
            return None;
        }
        Some(Box::new(ScriptedStdin {
            log: self.log.clone(),
            responder: self.responder.clone(),
            partial: Vec::new(),
        }))
    }

    fn take_stdout(&mut self) -> Option<Box<dyn Read>> {
        if std::mem::replace(&mut self.stdout_taken, true) {
            return None;
        }
        Some(Box::new(ScriptedStdout { log: self.log.clone() }))
    }

    fn try_wait(&mut self) -> std::io::Result<Option<i32>> {
        let exited = self.exits_on_stdin_close && self.log.borrow().stdin_closed;
        Ok(exited.then_some(0))
    }

    fn kill(&mut self) -> std::io::Result<()> {
        if self.fail_kill {
            return Err(std::io::Error::other("already exited"));
        }
        self.log.borrow_mut().kills += 1;
        Ok(())
    }

    fn wait(&mut self) -> std::io::Result<Option<i32>> {
        self.log.borrow_mut().waits += 1;
        Ok(Some(-1))
    }
}

struct ScriptedStdin {
    log: Rc<RefCell<ChildLog>>,
    responder: Rc<Responder>,
    partial: Vec<u8>,
}

impl Write for ScriptedStdin {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        let mut log = self.log.borrow_mut();
        if log.eof {
            return Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe));
        }
        if !log.pending.is_empty() {
            log.overlapped = true;
        }

        self.partial.extend_from_slice(data);
        while let Some(pos) = self.partial.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line[..pos]).into_owned();
            match (self.responder)(&text) {
                Some(response) => log.pending.extend(response.bytes()),
                None => log.eof = true,
            }
            log.requests.push(text);
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for ScriptedStdin {
    fn drop(&mut self) {
        self.log.borrow_mut().stdin_closed = true;
    }
}

struct ScriptedStdout {
    log: Rc<RefCell<ChildLog>>,
}

impl Read for ScriptedStdout {
    fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
        let mut log = self.log.borrow_mut();
        let n = out.len().min(log.pending.len());
        for (slot, byte) in out.iter_mut().zip(log.pending.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}
