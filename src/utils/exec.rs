use crate::utils::error::Result;
use std::borrow::Cow;
use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Privilege escalation wrapper, `doas` on OpenBSD and `sudo` everywhere else.
pub const SUDO_PROGRAM: &str = if cfg!(target_os = "openbsd") {
    "doas"
} else {
    "sudo"
};

pub struct CommandOutput {
    pub success: bool,
    pub output: Vec<u8>,
}

impl CommandOutput {
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.output)
    }
}

/// Runs a command to completion, capturing stdout and stderr as one buffer.
pub fn run_capture(cmd: &mut Command) -> Result<CommandOutput> {
    tracing::debug!("Executing: {:?}", cmd);
    let out = cmd.output()?;
    let mut merged = out.stdout;
    merged.extend_from_slice(&out.stderr);
    Ok(CommandOutput {
        success: out.status.success(),
        output: merged,
    })
}

/// Builds a command wrapped with the privilege escalation helper. If the
/// helper is not on PATH the command runs unwrapped and may fail with a
/// permission error instead.
pub fn command_with_sudo<P, S>(program: P, args: &[S]) -> Command
where
    P: AsRef<OsStr>,
    S: AsRef<OsStr>,
{
    match lookup_path(SUDO_PROGRAM) {
        Some(sudo) => {
            let mut cmd = Command::new(sudo);
            cmd.arg("--").arg(program.as_ref()).args(args);
            cmd
        }
        None => {
            let mut cmd = Command::new(program.as_ref());
            cmd.args(args);
            cmd
        }
    }
}

/// Resolves a program name against PATH, like `which`.
pub fn lookup_path(program: &str) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;
    for dir in env::split_paths(&path_var) {
        if dir.as_os_str().is_empty() {
            continue;
        }
        let candidate = dir.join(program);
        if is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

pub fn binary_exists(program: &str) -> bool {
    lookup_path(program).is_some()
}

pub fn path_exists(path: &Path) -> bool {
    path.exists()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_path_finds_shell() {
        // Any Unix test environment has sh on PATH.
        #[cfg(unix)]
        assert!(lookup_path("sh").is_some());
        assert!(lookup_path("definitely-not-a-real-binary-name").is_none());
    }

    #[test]
    fn test_run_capture_merges_streams() {
        #[cfg(unix)]
        {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", "echo to-stdout; echo to-stderr 1>&2"]);
            let out = run_capture(&mut cmd).unwrap();
            assert!(out.success);
            assert!(out.text().contains("to-stdout"));
            assert!(out.text().contains("to-stderr"));
        }
    }

    #[test]
    fn test_run_capture_reports_failure() {
        #[cfg(unix)]
        {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", "exit 3"]);
            let out = run_capture(&mut cmd).unwrap();
            assert!(!out.success);
        }
    }
}
