//! Runner process spawning.
//!
//! The runner inherits this process's stdio and runs to completion. It
//! stays in our process group, so a Ctrl-C from the terminal reaches it
//! directly; the wrapper only swallows SIGINT and keeps waiting. SIGTERM
//! aimed at the wrapper is forwarded. The runner's exit code becomes ours.

use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};

use super::command::DelegationCommand;
use super::error::DelegateError;

/// A running runner process.
#[derive(Debug)]
pub struct RunnerProcess {
    child: Child,
}

impl RunnerProcess {
    /// Spawn the runner for `command`.
    ///
    /// # Errors
    ///
    /// Returns `DelegateError` if the process fails to spawn.
    pub fn spawn(command: &DelegationCommand) -> Result<Self, DelegateError> {
        let mut cmd = Command::new(command.program());
        cmd.args(command.build_args())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd
            .spawn()
            .map_err(|e| DelegateError::from_spawn(command.program(), e))?;

        tracing::debug!(pid = ?child.id(), program = %command.program(), "Spawned runner");
        Ok(Self { child })
    }

    /// Wait for the runner to exit, forwarding SIGTERM to it meanwhile.
    ///
    /// # Errors
    ///
    /// Returns an error if waiting fails or signal handlers cannot be installed.
    pub async fn wait(&mut self) -> Result<ExitStatus, DelegateError> {
        #[cfg(unix)]
        {
            self.wait_unix().await
        }

        #[cfg(not(unix))]
        {
            self.wait_other().await
        }
    }

    #[cfg(unix)]
    async fn wait_unix(&mut self) -> Result<ExitStatus, DelegateError> {
        use nix::sys::signal::Signal;
        use tokio::signal::unix::{signal, SignalKind};

        let pid = self.child.id();
        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;

        loop {
            tokio::select! {
                status = self.child.wait() => return Ok(status?),
                _ = interrupt.recv() => {
                    tracing::debug!("Interrupt received, runner gets it from the terminal");
                }
                _ = terminate.recv() => forward_signal(pid, Signal::SIGTERM),
            }
        }
    }

    #[cfg(not(unix))]
    async fn wait_other(&mut self) -> Result<ExitStatus, DelegateError> {
        loop {
            tokio::select! {
                status = self.child.wait() => return Ok(status?),
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupt received, waiting for runner to exit");
                }
            }
        }
    }
}

#[cfg(unix)]
fn forward_signal(pid: Option<u32>, signal: nix::sys::signal::Signal) {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Some(pid) = pid else {
        return;
    };
    let nix_pid = Pid::from_raw(i32::try_from(pid).unwrap_or(i32::MAX));
    match kill(nix_pid, signal) {
        Ok(()) => tracing::debug!(pid, %signal, "Forwarded signal to runner"),
        Err(e) => tracing::debug!(pid, %signal, error = %e, "Failed to forward signal"),
    }
}

/// Map an exit status to a process exit code.
///
/// On Unix a death by signal maps to `128 + signal`, as shells report it.
#[must_use]
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        status.signal().map_or(1, |sig| 128 + sig)
    }

    #[cfg(not(unix))]
    {
        1
    }
}

/// Spawn the runner, wait for it, and return its exit code.
///
/// # Errors
///
/// Returns `DelegateError` if the runner cannot be spawned or awaited.
pub async fn run(command: &DelegationCommand) -> Result<i32, DelegateError> {
    let mut process = RunnerProcess::spawn(command)?;
    let status = process.wait().await?;
    let code = exit_code(status);
    tracing::info!(code, "Runner exited");
    Ok(code)
}
