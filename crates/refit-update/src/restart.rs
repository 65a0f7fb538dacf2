//! Process restart after an update or rollback

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;

use crate::error::{Error, Result};

/// Startup flag requesting a rollback before anything else runs
pub const ROLLBACK_FLAG: &str = "--rollback";

/// Something that can restart the host process
pub trait Restarter: Send + Sync {
    /// Restart the process; only returns if the restart could not happen
    fn restart(&self) -> Result<()>;
}

/// Re-executes the current binary with its original arguments
///
/// `--rollback` is dropped from the arguments so a restart triggered by a
/// startup rollback does not roll back again.
#[derive(Debug, Clone)]
pub struct ExecRestarter {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ExecRestarter {
    pub fn new(program: impl Into<PathBuf>, args: impl IntoIterator<Item = OsString>) -> Self {
        Self {
            program: program.into(),
            args: strip_rollback_flag(args),
        }
    }

    /// Restart the running executable with the arguments it was started with
    pub fn from_current_process() -> Result<Self> {
        let program = std::env::current_exe()
            .map_err(|e| Error::restart(format!("cannot locate current executable: {}", e)))?;
        Ok(Self::new(program, std::env::args_os().skip(1)))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }
}

impl Restarter for ExecRestarter {
    fn restart(&self) -> Result<()> {
        info!("Restarting {}", self.program.display());

        let mut command = Command::new(&self.program);
        command.args(&self.args);
        replace_process(command)
    }
}

#[cfg(unix)]
fn replace_process(mut command: Command) -> Result<()> {
    use std::os::unix::process::CommandExt;

    // exec only returns on failure
    let err = command.exec();
    Err(Error::restart(err.to_string()))
}

#[cfg(not(unix))]
fn replace_process(mut command: Command) -> Result<()> {
    command
        .spawn()
        .map_err(|e| Error::restart(e.to_string()))?;
    std::process::exit(0)
}

fn strip_rollback_flag(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter().filter(|a| a != ROLLBACK_FLAG).collect()
}
