//! Child process execution under a deadline.

use std::ffi::OsStr;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};

/// Captured result of a finished tool invocation.
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

#[derive(Debug)]
pub enum ToolError {
    Spawn(io::Error),
    Io(io::Error),
    TimedOut(Duration),
}

/// Run `program` with `args`, capturing stdout and stderr.
///
/// The child gets no stdin. On Unix it runs in its own process group, so
/// terminal signals aimed at the server do not reach it and anything it spawns
/// can be killed with it. If it has not exited after `deadline` the whole group
/// is killed and the child reaped before `ToolError::TimedOut` is returned.
pub async fn run_tool<I, S>(program: &str, args: I, deadline: Duration) -> Result<ToolOutput, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    command.process_group(0);

    let mut child = command.spawn().map_err(ToolError::Spawn)?;
    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();

    let start = std::time::Instant::now();
    let finished = tokio::time::timeout(deadline, async {
        let read_stdout = async {
            let mut buf = Vec::new();
            if let Some(out) = stdout.as_mut() {
                out.read_to_end(&mut buf).await?;
            }
            Ok::<_, io::Error>(buf)
        };
        let read_stderr = async {
            let mut buf = Vec::new();
            if let Some(err) = stderr.as_mut() {
                err.read_to_end(&mut buf).await?;
            }
            Ok::<_, io::Error>(buf)
        };
        tokio::try_join!(child.wait(), read_stdout, read_stderr)
    })
    .await;

    match finished {
        Ok(Ok((status, stdout, stderr))) => {
            tracing::debug!(
                program = %program,
                exit_code = ?status.code(),
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Tool finished"
            );
            Ok(ToolOutput {
                status,
                stdout,
                stderr,
            })
        }
        Ok(Err(e)) => {
            kill_tool(&mut child, program).await;
            Err(ToolError::Io(e))
        }
        Err(_) => {
            tracing::warn!(
                program = %program,
                deadline_secs = deadline.as_secs_f64(),
                "Tool exceeded deadline, killing"
            );
            kill_tool(&mut child, program).await;
            Err(ToolError::TimedOut(deadline))
        }
    }
}

/// Kill the tool's process group, then the child itself, and reap it.
async fn kill_tool(child: &mut Child, program: &str) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            tracing::warn!(error = %e, program = %program, pid = pid, "Failed to kill tool process group");
        }
    }
    if let Err(e) = child.kill().await {
        tracing::warn!(error = %e, program = %program, "Failed to kill tool process");
    }
}
