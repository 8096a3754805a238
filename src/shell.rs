use std::error;
use std::fmt;
use std::io;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::{trace, warn};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

/// Terminal state of one external program invocation
///
/// Exactly one of these is produced per call to [`Shell::exec`]: the process
/// either exits on its own, is killed once its timer fires, or never starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    /// Process exited. `code` is `None` when it was terminated by a signal
    Exited {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    /// Timer fired first, process was killed
    TimedOut,
    /// Process could not be started. [reason]
    SpawnFailed(String),
}

impl ExecOutcome {
    /// Stdout of a clean (zero) exit, anything else is an error
    pub fn into_stdout(self) -> Result<String, ExecError> {
        match self {
            ExecOutcome::Exited {
                code: Some(0),
                stdout,
                ..
            } => Ok(stdout),
            ExecOutcome::Exited {
                code: Some(code),
                stderr,
                ..
            } => Err(ExecError::Exit {
                code,
                stderr: stderr.trim().to_string(),
            }),
            ExecOutcome::Exited { code: None, .. } => Err(ExecError::Signal),
            ExecOutcome::TimedOut => Err(ExecError::TimedOut),
            ExecOutcome::SpawnFailed(reason) => Err(ExecError::Spawn(reason)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    /// Program could not be started. [reason]
    Spawn(String),
    /// Non-zero exit. [code, stderr]
    Exit { code: i32, stderr: String },
    /// Terminated by a signal
    Signal,
    /// Killed after exceeding its timeout
    TimedOut,
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ExecError::*;
        match self {
            Spawn(reason) => write!(f, "Failed to start: {}", reason),
            Exit { code, stderr } if stderr.is_empty() => write!(f, "Exited with code {}", code),
            Exit { code, stderr } => write!(f, "Exited with code {} ({})", code, stderr),
            Signal => write!(f, "Terminated by signal"),
            TimedOut => write!(f, "Timed out"),
        }
    }
}

impl error::Error for ExecError {}

/// Runs external programs (vtysh, bgpq4)
#[async_trait]
pub trait Shell: Send + Sync {
    /// Run `program` with `args`. With a `timeout`, the process is killed
    /// if it has not exited when the timer fires.
    async fn exec(&self, program: &str, args: &[String], timeout: Option<Duration>)
        -> ExecOutcome;
}

/// [`Shell`] backed by real child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShell;

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> io::Result<String> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[async_trait]
impl Shell for SystemShell {
    async fn exec(
        &self,
        program: &str,
        args: &[String],
        timeout: Option<Duration>,
    ) -> ExecOutcome {
        trace!("exec: {} {}", program, args.join(" "));
        let mut child = match Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(err) => return ExecOutcome::SpawnFailed(err.to_string()),
        };

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let run = async {
            let (stdout, stderr) = tokio::try_join!(read_pipe(stdout), read_pipe(stderr))?;
            let status = child.wait().await?;
            Ok::<_, io::Error>((status, stdout, stderr))
        };

        let finished = match timeout {
            Some(limit) => {
                let result = tokio::time::timeout(limit, run).await;
                match result {
                    Ok(finished) => finished,
                    Err(_) => {
                        // start_kill + wait, so the child is reaped before returning
                        if let Err(err) = child.kill().await {
                            warn!("Failed to kill {} after timeout: {}", program, err);
                        }
                        return ExecOutcome::TimedOut;
                    }
                }
            }
            None => run.await,
        };

        match finished {
            Ok((status, stdout, stderr)) => ExecOutcome::Exited {
                code: status.code(),
                stdout,
                stderr,
            },
            Err(err) => ExecOutcome::SpawnFailed(err.to_string()),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    type Responder = Box<dyn Fn(&str, &[String]) -> ExecOutcome + Send + Sync>;

    /// Shell that answers from a closure and records every invocation
    pub(crate) struct ScriptedShell {
        responder: Responder,
        pub(crate) calls: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl ScriptedShell {
        pub(crate) fn new<F>(responder: F) -> Self
        where
            F: Fn(&str, &[String]) -> ExecOutcome + Send + Sync + 'static,
        {
            Self {
                responder: Box::new(responder),
                calls: Mutex::new(vec![]),
            }
        }

        pub(crate) fn calls(&self) -> Vec<(String, Vec<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Shell for ScriptedShell {
        async fn exec(
            &self,
            program: &str,
            args: &[String],
            _timeout: Option<Duration>,
        ) -> ExecOutcome {
            self.calls
                .lock()
                .unwrap()
                .push((program.to_string(), args.to_vec()));
            (self.responder)(program, args)
        }
    }

    impl ExecOutcome {
        /// Clean exit with `stdout`
        pub(crate) fn success(stdout: impl Into<String>) -> Self {
            ExecOutcome::Exited {
                code: Some(0),
                stdout: stdout.into(),
                stderr: String::new(),
            }
        }
    }

    /// Builds `["-c", d1, "-c", d2, ...]`
    pub(crate) fn vtysh_args(directives: &[&str]) -> Vec<String> {
        directives
            .iter()
            .flat_map(|d| vec!["-c".to_string(), d.to_string()])
            .collect()
    }
}
