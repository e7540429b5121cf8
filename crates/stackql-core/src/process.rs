//! Subprocess execution
//!
//! Runs an executable to completion and maps its exit status onto the error
//! taxonomy. No timeout is enforced here; the StackQL binary honours
//! `--apirequesttimeout` itself.

use std::ffi::OsStr;
use std::path::Path;

use tokio::process::Command;
use tracing::debug;

use crate::{Error, Result};

/// Captured text streams of a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output
    pub stdout: String,
    /// Standard error, which the StackQL binary uses for status messages
    pub stderr: String,
}

/// Run `program` with `args`, returning its standard output as text.
///
/// A non-zero exit status yields [`Error::CommandExecution`] carrying the
/// standard error text. A program that cannot be launched yields
/// [`Error::Spawn`].
pub async fn run<P, I, S>(program: P, args: I) -> Result<String>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    Ok(run_captured(program, args).await?.stdout)
}

/// Like [`run`], but keeps both output streams of a successful run.
pub async fn run_captured<P, I, S>(program: P, args: I) -> Result<CommandOutput>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let program = program.as_ref();
    debug!(program = %program.display(), "running command");

    let output = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| Error::Spawn {
            program: program.display().to_string(),
            source,
        })?;

    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    if output.status.success() {
        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr,
        })
    } else {
        debug!(program = %program.display(), status = ?output.status.code(), "command failed");
        Err(Error::CommandExecution(stderr))
    }
}
