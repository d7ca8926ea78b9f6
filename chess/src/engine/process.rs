use super::Transport;

use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use log::{debug, warn};

/// Engine running as a child process
///
/// The engine's stdout is read on a background thread, which forwards complete lines over a
/// channel. So [`Transport::poll_line()`] only checks the channel and never waits.
pub struct ProcessTransport {
    child: Child,
    stdin: Option<ChildStdin>,
    lines: Receiver<String>,
    reader: Option<JoinHandle<()>>,
}

impl ProcessTransport {
    /// Spawns the engine executable `path` with piped stdin and stdout
    pub fn spawn(path: &str) -> io::Result<ProcessTransport> {
        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        let stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "engine stdout not piped"))?;

        let (tx, rx) = mpsc::channel();
        let reader = thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!("cannot read engine output: {}", e);
                        break;
                    }
                };
                if tx.send(line).is_err() {
                    break;
                }
            }
            debug!("engine output closed");
        });
        debug!("spawned engine {:?}, pid {}", path, child.id());

        Ok(ProcessTransport {
            child,
            stdin,
            lines: rx,
            reader: Some(reader),
        })
    }
}

impl Transport for ProcessTransport {
    fn send_line(&mut self, line: &str) -> io::Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "engine stdin closed"))?;
        writeln!(stdin, "{}", line)?;
        stdin.flush()
    }

    fn poll_line(&mut self) -> io::Result<Option<String>> {
        match self.lines.try_recv() {
            Ok(line) => Ok(Some(line)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "engine closed its output",
            )),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        drop(self.stdin.take());
        let status = self.child.wait()?;
        debug!("engine exited with {}", status);
        if let Some(reader) = self.reader.take() {
            if reader.join().is_err() {
                warn!("engine reader thread panicked");
            }
        }
        Ok(())
    }
}

impl Drop for ProcessTransport {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
