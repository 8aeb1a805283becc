//! Hand-off of executable subcommands to an external process.

use std::{
    ffi::OsStr,
    io,
    path::{Path, PathBuf},
    process::{Command as StdCommand, ExitStatus, Stdio},
};

/// Starts an executable subcommand and waits for it.
///
/// Returns the exit code the current process should finish with.
pub trait Launcher {
    fn launch(&self, program: &Path, args: &[String]) -> io::Result<i32>;
}

/// Spawns the program with inherited standard streams.
///
/// The child shares the process group, so terminal signals reach it directly;
/// a child killed by a signal is reported as `128 + signal`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLauncher;

impl Launcher for ProcessLauncher {
    fn launch(&self, program: &Path, args: &[String]) -> io::Result<i32> {
        log::debug!("spawning {} {:?}", program.display(), args);
        let status = StdCommand::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;
        Ok(match status.code() {
            Some(code) => code,
            None => terminated_by_signal(status),
        })
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = exit_status.signal() {
        128 + signal
    } else if exit_status.core_dumped() {
        255
    } else {
        1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    1
}

pub(crate) struct Resolved {
    pub(crate) file: PathBuf,
    pub(crate) dir: Option<PathBuf>,
}

/// Finds the executable for subcommand `sub` of command `parent`.
///
/// A local file next to the running script wins over a bare name looked up in `PATH`.
pub(crate) fn resolve(
    parent: &str,
    sub: &str,
    executable_file: Option<&str>,
    executable_dir: Option<&Path>,
    script_path: Option<&Path>,
) -> Resolved {
    let base_name = match executable_file {
        Some(it) => it.to_string(),
        None => format!("{parent}-{sub}"),
    };
    let mut dir = executable_dir.map(Path::to_path_buf);
    if let Some(script) = script_path {
        let script = script.canonicalize().unwrap_or_else(|_| script.to_path_buf());
        let script_dir = script.parent().unwrap_or_else(|| Path::new(""));
        dir = Some(match &dir {
            Some(it) => script_dir.join(it),
            None => script_dir.to_path_buf(),
        });
    }

    let mut file = PathBuf::from(&base_name);
    if let Some(dir) = dir.as_deref().filter(|it| !it.as_os_str().is_empty()) {
        let mut local = find_file(dir, &base_name);
        // Legacy search using the script name rather than the command name.
        if local.is_none() && executable_file.is_none() {
            if let Some(stem) = script_path.and_then(Path::file_stem).and_then(OsStr::to_str) {
                if stem != parent {
                    local = find_file(dir, &format!("{stem}-{sub}"));
                }
            }
        }
        if let Some(local) = local {
            file = local;
        }
    }
    log::debug!("resolved executable for `{sub}`: {}", file.display());
    Resolved { file, dir }
}

fn find_file(dir: &Path, base_name: &str) -> Option<PathBuf> {
    let local = dir.join(base_name);
    if local.exists() {
        return Some(local);
    }
    let suffix = std::env::consts::EXE_SUFFIX;
    if suffix.is_empty() || base_name.ends_with(suffix) {
        return None;
    }
    let local = dir.join(format!("{base_name}{suffix}"));
    local.exists().then_some(local)
}

pub(crate) fn missing_message(file: &Path, dir: Option<&Path>, sub: &str) -> String {
    let dir_message = match dir {
        Some(dir) => {
            format!("searched for local subcommand relative to directory '{}'", dir.display())
        }
        None => "no directory for search for local subcommand, use executable_dir() to supply a custom directory".to_string(),
    };
    format!(
        "'{}' does not exist
 - if '{sub}' is not meant to be an executable command, declare it with command() instead of executable_command()
 - if the default executable name is not suitable, use executable_file() to supply a custom name or path
 - {dir_message}",
        file.display()
    )
}
