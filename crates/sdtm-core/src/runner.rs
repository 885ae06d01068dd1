//! Executes generated programs.
//!
//! The interpreter and its arguments are fixed at construction; the program
//! path is appended last. The working directory is the project root so
//! relative paths inside programs resolve the same way for both sides.
//!
//! The child is supervised with `try_wait` polling and killed once the
//! timeout expires. On unix it runs in its own process group and the whole
//! group is killed, so processes it forked die with it. stderr is drained on a
//! separate thread and collected over a channel with a bounded grace period,
//! so a descendant that keeps the pipe open cannot stall the runner.

use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::RunnerError;

/// Default wall-clock limit for one program.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1800);

/// Longest diagnostic kept in the state error log.
pub const MAX_DIAGNOSTIC_CHARS: usize = 2000;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long stderr may stay open after the program itself has exited.
const STDERR_GRACE: Duration = Duration::from_secs(1);

/// What happened when a program ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// `None` when the process was killed or ended by a signal.
    pub exit_code: Option<i32>,
    pub stderr: String,
    pub timed_out: bool,
    pub duration: Duration,
}

impl RunOutcome {
    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Short description of how the process ended.
    pub fn status_text(&self) -> String {
        if self.timed_out {
            format!("timed out after {}s", self.duration.as_secs())
        } else {
            match self.exit_code {
                Some(code) => format!("exit code {code}"),
                None => "terminated by signal".to_string(),
            }
        }
    }

    /// stderr truncated for the error log.
    pub fn diagnostic(&self) -> String {
        truncate_chars(self.stderr.trim(), MAX_DIAGNOSTIC_CHARS)
    }
}

/// Runs one program to completion.
pub trait ProgramRunner: Send + Sync {
    /// Fails only when the program cannot be started or supervised; a
    /// non-zero exit is reported through [`RunOutcome`].
    fn run(&self, program: &Path) -> Result<RunOutcome, RunnerError>;
}

/// Runs programs as child processes of a fixed interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRunner {
    interpreter: String,
    args: Vec<String>,
    working_dir: PathBuf,
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(interpreter: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// `Rscript --vanilla <program>`.
    pub fn rscript(working_dir: impl Into<PathBuf>) -> Self {
        Self::new("Rscript", working_dir).with_args(["--vanilla"])
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl ProgramRunner for ProcessRunner {
    fn run(&self, program: &Path) -> Result<RunOutcome, RunnerError> {
        let start = Instant::now();
        let mut command = Command::new(&self.interpreter);
        command
            .args(&self.args)
            .arg(program)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        let mut child = command.spawn().map_err(|source| RunnerError::Spawn {
            interpreter: self.interpreter.clone(),
            program: program.to_path_buf(),
            source,
        })?;

        let stderr_chunks = child.stderr.take().map(spawn_stderr_reader);

        let wait_err = |source| RunnerError::Wait {
            program: program.to_path_buf(),
            source,
        };
        let mut timed_out = false;
        let status = loop {
            if let Some(status) = child.try_wait().map_err(wait_err)? {
                break Some(status);
            }
            if start.elapsed() >= self.timeout {
                timed_out = true;
                kill_process_tree(&mut child);
                break None;
            }
            thread::sleep(POLL_INTERVAL);
        };

        let stderr = stderr_chunks
            .map(|chunks| drain_stderr(&chunks, STDERR_GRACE))
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default();
        let duration = start.elapsed();

        let outcome = RunOutcome {
            exit_code: status.and_then(|s| s.code()),
            stderr,
            timed_out,
            duration,
        };
        if timed_out {
            warn!(
                program = %program.display(),
                timeout_secs = self.timeout.as_secs(),
                "program timed out and was killed"
            );
        } else {
            debug!(
                program = %program.display(),
                exit_code = ?outcome.exit_code,
                duration_ms = outcome.duration.as_millis(),
                "program finished"
            );
        }
        Ok(outcome)
    }
}

fn spawn_stderr_reader(mut pipe: ChildStderr) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut chunk = [0u8; 4096];
        loop {
            match pipe.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(chunk[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    debug!(error = %err, "stderr read failed, diagnostic may be truncated");
                    break;
                }
            }
        }
    });
    rx
}

/// Collects stderr until the pipe closes or `grace` runs out.
fn drain_stderr(chunks: &Receiver<Vec<u8>>, grace: Duration) -> Vec<u8> {
    let deadline = Instant::now() + grace;
    let mut buf = Vec::new();
    loop {
        match chunks.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(chunk) => buf.extend_from_slice(&chunk),
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                debug!(
                    grace_ms = grace.as_millis(),
                    "stderr still open after program exit, diagnostic may be truncated"
                );
                break;
            }
        }
    }
    buf
}

#[cfg(unix)]
fn kill_process_tree(child: &mut Child) {
    // A negative pid addresses the process group created at spawn.
    let group = format!("-{}", child.id());
    match Command::new("kill")
        .args(["-KILL", "--", group.as_str()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(status) if status.success() => {}
        Ok(status) => debug!(%status, "process group kill failed"),
        Err(err) => debug!(error = %err, "process group kill failed"),
    }
    kill_child(child);
}

#[cfg(not(unix))]
fn kill_process_tree(child: &mut Child) {
    kill_child(child);
}

fn kill_child(child: &mut Child) {
    if let Err(err) = child.kill() {
        debug!(error = %err, "kill failed, child already exited");
    }
    if let Err(err) = child.wait() {
        debug!(error = %err, "reaping killed child failed");
    }
}

/// First `max` characters of `text`, on a character boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("abc", 5), "abc");
        assert_eq!(truncate_chars("ééé", 2), "éé");
        let long = "x".repeat(MAX_DIAGNOSTIC_CHARS + 10);
        let outcome = RunOutcome {
            exit_code: Some(1),
            stderr: long,
            timed_out: false,
            duration: Duration::ZERO,
        };
        assert_eq!(outcome.diagnostic().chars().count(), MAX_DIAGNOSTIC_CHARS);
        assert_eq!(outcome.status_text(), "exit code 1");
    }

    #[test]
    fn missing_interpreter_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new("definitely-not-an-interpreter-7f3a", dir.path());
        let err = runner.run(&dir.path().join("p.R")).unwrap_err();
        assert!(matches!(err, RunnerError::Spawn { .. }));
    }

    #[cfg(unix)]
    mod unix {
        use super::*;

        fn script(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("program.sh");
            std::fs::write(&path, body).unwrap();
            path
        }

        #[test]
        fn captures_stderr_and_exit_code() {
            let dir = tempfile::tempdir().unwrap();
            let program = script(dir.path(), "echo 'Error: object SEX not found' >&2\nexit 3\n");
            let outcome = ProcessRunner::new("sh", dir.path()).run(&program).unwrap();
            assert_eq!(outcome.exit_code, Some(3));
            assert!(!outcome.succeeded());
            assert_eq!(outcome.diagnostic(), "Error: object SEX not found");
        }

        #[test]
        fn runs_in_working_directory() {
            let dir = tempfile::tempdir().unwrap();
            let program = script(dir.path(), "echo done > marker.txt\n");
            let outcome = ProcessRunner::new("sh", dir.path()).run(&program).unwrap();
            assert!(outcome.succeeded());
            assert!(dir.path().join("marker.txt").exists());
        }

        #[test]
        fn kills_program_after_timeout() {
            let dir = tempfile::tempdir().unwrap();
            let program = script(dir.path(), "exec sleep 5\n");
            let outcome = ProcessRunner::new("sh", dir.path())
                .with_timeout(Duration::from_millis(300))
                .run(&program)
                .unwrap();
            assert!(outcome.timed_out);
            assert!(!outcome.succeeded());
            assert!(outcome.duration < Duration::from_secs(5));
        }

        #[test]
        fn timeout_kills_forked_children() {
            let dir = tempfile::tempdir().unwrap();
            let program = script(dir.path(), "sleep 6\necho unreachable >&2\n");
            let wall = Instant::now();
            let outcome = ProcessRunner::new("sh", dir.path())
                .with_timeout(Duration::from_millis(300))
                .run(&program)
                .unwrap();
            let elapsed = wall.elapsed();
            assert!(outcome.timed_out);
            assert!(elapsed < Duration::from_secs(4), "runner blocked for {elapsed:?}");
            assert!(outcome.duration <= elapsed);
            assert!(outcome.duration >= Duration::from_millis(300));
            assert!(!outcome.stderr.contains("unreachable"));
        }

        #[test]
        fn background_child_holding_stderr_does_not_block() {
            let dir = tempfile::tempdir().unwrap();
            let program = script(
                dir.path(),
                "sleep 6 &\necho 'Error: write failed' >&2\nexit 2\n",
            );
            let wall = Instant::now();
            let outcome = ProcessRunner::new("sh", dir.path()).run(&program).unwrap();
            let elapsed = wall.elapsed();
            assert_eq!(outcome.exit_code, Some(2));
            assert!(!outcome.timed_out);
            assert_eq!(outcome.diagnostic(), "Error: write failed");
            assert!(elapsed < Duration::from_secs(4), "runner blocked for {elapsed:?}");
        }
    }
}
