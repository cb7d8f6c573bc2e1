use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};

use rmsg_api::{ChildProcess, ProcessSpawner};

/// Spawns real operating-system processes with stdin and stdout piped.
/// The child's stderr is inherited so its diagnostics stay visible.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdProcessSpawner;

impl ProcessSpawner for StdProcessSpawner {
    fn spawn(&self, program: &str, args: &[String]) -> std::io::Result<Box<dyn ChildProcess>> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;
        tracing::debug!(program, pid = child.id(), "process spawned");
        Ok(Box::new(StdChild { child }))
    }
}

pub struct StdChild {
    child: Child,
}

fn exit_code(status: ExitStatus) -> i32 {
    // Signal-terminated children have no code.
    status.code().unwrap_or(-1)
}

impl ChildProcess for StdChild {
    fn id(&self) -> u32 {
        self.child.id()
    }

    fn take_stdin(&mut self) -> Option<Box<dyn Write>> {
        self.child.stdin.take().map(|s| Box::new(s) as Box<dyn Write>)
    }

    fn take_stdout(&mut self) -> Option<Box<dyn Read>> {
        self.child.stdout.take().map(|s| Box::new(s) as Box<dyn Read>)
    }

    fn try_wait(&mut self) -> std::io::Result<Option<i32>> {
        Ok(self.child.try_wait()?.map(exit_code))
    }

    fn kill(&mut self) -> std::io::Result<()> {
        self.child.kill()
    }

    fn wait(&mut self) -> std::io::Result<Option<i32>> {
        Ok(Some(exit_code(self.child.wait()?)))
    }
}
