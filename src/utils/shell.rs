// src/utils/shell.rs
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, trace, warn};

use crate::adapters::AdapterFailure;

const STDERR_EXCERPT_CHARS: usize = 512;

/// Run an external tool without a shell, feeding `stdin` and enforcing `timeout`.
///
/// The child is killed when the timeout elapses. A missing program, a spawn error,
/// a timeout and a non-zero exit all come back as an [`AdapterFailure`].
pub async fn run_tool(
    program: &str,
    args: &[String],
    stdin: Option<String>,
    timeout: Duration,
) -> Result<Output, AdapterFailure> {
    let resolved = which::which(program).map_err(|_| AdapterFailure::Missing {
        tool: program.to_string(),
    })?;

    debug!("Executing {} {:?} with timeout {:?}", resolved.display(), args, timeout);

    let mut child = Command::new(&resolved)
        .args(args)
        .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| AdapterFailure::Spawn {
            tool: program.to_string(),
            message: e.to_string(),
        })?;

    if let (Some(input), Some(mut handle)) = (stdin, child.stdin.take()) {
        tokio::spawn(async move {
            if let Err(e) = handle.write_all(input.as_bytes()).await {
                trace!("Tool closed stdin early: {}", e);
            }
        });
    }

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(AdapterFailure::Spawn {
                tool: program.to_string(),
                message: e.to_string(),
            })
        }
        Err(_) => {
            warn!("{} timed out after {} seconds", program, timeout.as_secs());
            return Err(AdapterFailure::TimedOut {
                tool: program.to_string(),
                seconds: timeout.as_secs(),
            });
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let excerpt: String = stderr.trim().chars().take(STDERR_EXCERPT_CHARS).collect();
        warn!("{} failed: {}", program, excerpt);
        return Err(AdapterFailure::NonZeroExit {
            tool: program.to_string(),
            code: output.status.code(),
            stderr: excerpt,
        });
    }

    trace!("{} succeeded with {} bytes of output", program, output.stdout.len());
    Ok(output)
}
