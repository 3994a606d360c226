//! Supervised external app processes

use std::io;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use log::{debug, info, warn};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

/// A child process running one external app
///
/// Termination is signal-then-poll: nothing here ever blocks waiting for
/// the child.
#[derive(Debug)]
pub struct ExternalProcess {
    child: Child,
    exited: bool,
}

impl ExternalProcess {
    /// Run `interpreter entry`
    pub fn spawn(interpreter: &Path, entry: &Path) -> io::Result<Self> {
        let child = Command::new(interpreter)
            .arg(entry)
            .stdin(Stdio::null())
            .spawn()?;
        info!(
            "Started {} {} (pid {})",
            interpreter.display(),
            entry.display(),
            child.id()
        );
        Ok(Self { child, exited: false })
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    fn signal(&self, signal: Signal) -> nix::Result<()> {
        if self.exited {
            return Ok(());
        }
        kill(Pid::from_raw(self.child.id() as i32), signal)
    }

    /// SIGSTOP
    pub fn stop(&self) -> nix::Result<()> {
        self.signal(Signal::SIGSTOP)
    }

    /// SIGCONT
    pub fn cont(&self) -> nix::Result<()> {
        self.signal(Signal::SIGCONT)
    }

    /// SIGTERM followed by one non-blocking reap; true if it already exited
    ///
    /// A stopped child is continued so the pending SIGTERM is delivered.
    pub fn terminate(&mut self) -> bool {
        if let Err(e) = self.signal(Signal::SIGTERM) {
            debug!("SIGTERM to {}: {}", self.pid(), e);
        }
        if let Err(e) = self.cont() {
            debug!("SIGCONT to {}: {}", self.pid(), e);
        }
        self.try_reap()
    }

    /// Collect the exit status if the child has exited
    ///
    /// The exit code is not inspected.
    pub fn try_reap(&mut self) -> bool {
        if self.exited {
            return true;
        }
        match self.child.try_wait() {
            Ok(Some(status)) => {
                debug!("pid {} exited: {}", self.pid(), status);
                self.exited = true;
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("Reaping pid {} failed: {}", self.pid(), e);
                false
            }
        }
    }
}
