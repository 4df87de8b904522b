use std::ffi::OsStr;
use std::io;
use std::process::{Command, Output};

/// Execute a command and return its output
pub fn execute_command<I, S>(cmd: &str, args: I) -> io::Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    log::debug!("Running command: {}", cmd);
    Command::new(cmd).args(args).output()
}

/// Check if a command is available in PATH
pub fn is_command_available(cmd: &str, version_args: &[&str]) -> bool {
    execute_command(cmd, version_args)
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Trimmed stdout of a successful command
pub fn command_stdout(cmd: &str, args: &[&str]) -> Option<String> {
    execute_command(cmd, args)
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
}
