//! Bounded subprocess execution
//!
//! Programs are resolved with `which`, run with piped output and a closed stdin,
//! and canceled together with their children when the bound expires.

use crate::error::{Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

/// Captured result of a finished program
#[derive(Debug)]
pub struct ProgramOutput {
    /// Termination status
    pub status: ExitStatus,
    /// Everything written to standard output
    pub stdout: Vec<u8>,
    /// Everything written to standard error
    pub stderr: Vec<u8>,
}

impl ProgramOutput {
    /// Standard output decoded lossily
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Standard error decoded lossily and trimmed
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// One program call
#[derive(Debug)]
pub(crate) struct Invocation<'a> {
    pub program: &'a Path,
    pub args: Vec<OsString>,
    pub working_dir: Option<&'a Path>,
    pub timeout: Duration,
}

/// Resolve a configured program name or path to an executable
pub(crate) fn resolve(program: &Path) -> Result<PathBuf> {
    which::which(program).map_err(|e| Error::ProgramUnavailable {
        program: display_name(program),
        reason: e.to_string(),
    })
}

/// The short name used in errors and logs
pub(crate) fn display_name(program: &Path) -> String {
    program
        .file_name()
        .unwrap_or(program.as_os_str())
        .to_string_lossy()
        .into_owned()
}

/// Run a program to completion or until its bound expires
///
/// Returns the output whatever the exit status. Use [`run_checked`] to turn a
/// non-zero status into [`Error::ProgramError`].
pub(crate) async fn run(invocation: Invocation<'_>) -> Result<ProgramOutput> {
    let name = display_name(invocation.program);
    let binary = resolve(invocation.program)?;

    let mut cmd = Command::new(&binary);
    cmd.args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = invocation.working_dir {
        cmd.current_dir(dir);
    }
    #[cfg(unix)]
    cmd.process_group(0);

    debug!(program = %name, ?binary, args = ?invocation.args, cwd = ?invocation.working_dir, "running program");

    let started = Instant::now();
    let child = cmd.spawn().map_err(|e| Error::ProgramUnavailable {
        program: name.clone(),
        reason: e.to_string(),
    })?;
    let pid = child.id();

    match tokio::time::timeout(invocation.timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => {
            debug!(
                program = %name,
                code = ?output.status.code(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "program finished"
            );
            Ok(ProgramOutput {
                status: output.status,
                stdout: output.stdout,
                stderr: output.stderr,
            })
        }
        Ok(Err(e)) => Err(Error::Io(e)),
        Err(_) => {
            // the direct child is already killed on drop, its descendants are not
            if let Some(pid) = pid {
                kill_process_group(pid);
            }
            warn!(program = %name, timeout_ms = invocation.timeout.as_millis() as u64, "program timed out");
            Err(Error::Timeout {
                program: name,
                after: invocation.timeout,
            })
        }
    }
}

/// Run a program and require a successful exit status
pub(crate) async fn run_checked(invocation: Invocation<'_>) -> Result<ProgramOutput> {
    let name = display_name(invocation.program);
    let output = run(invocation).await?;
    if output.status.success() {
        Ok(output)
    } else {
        Err(Error::ProgramError {
            program: name,
            code: output.status.code(),
            stderr: output.stderr_text(),
        })
    }
}

#[cfg(unix)]
fn kill_process_group(pid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: killpg takes plain integers and has no memory effects
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc != 0 {
        debug!(pgid, error = %std::io::Error::last_os_error(), "process group already gone");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}
