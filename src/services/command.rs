//! External command construction shared by formatters and hooks.

use std::path::Path;
use std::process::Command;

/// Placeholder replaced by the saved file's path in command arguments.
pub const FILE_PLACEHOLDER: &str = "$FILE";

/// Build a command for `file`.
///
/// Every `$FILE` in `args` is replaced by the file path. When no argument
/// mentions `$FILE` and `append_path` is set, the path is appended as the
/// last argument. Without an explicit `working_dir` a command for an absolute
/// path runs in the file's directory, where tools look for project files.
pub fn build_command(
    command: &str,
    args: &[String],
    working_dir: Option<&Path>,
    file: &Path,
    append_path: bool,
) -> Command {
    let file_str = file.to_string_lossy();
    let mut cmd = Command::new(command);

    let mut mentioned = false;
    for arg in args {
        if arg.contains(FILE_PLACEHOLDER) {
            mentioned = true;
            cmd.arg(arg.replace(FILE_PLACEHOLDER, &file_str));
        } else {
            cmd.arg(arg);
        }
    }
    if append_path && !mentioned {
        cmd.arg(file);
    }

    match working_dir {
        Some(dir) => {
            cmd.current_dir(dir);
        }
        None => {
            if let Some(parent) = file.parent().filter(|_| file.is_absolute()) {
                cmd.current_dir(parent);
            }
        }
    }

    cmd
}

/// Short human-readable description of a process failure.
pub fn failure_text(stdout: &[u8], stderr: &[u8]) -> String {
    let stderr = String::from_utf8_lossy(stderr);
    if !stderr.trim().is_empty() {
        return stderr.trim().to_string();
    }
    String::from_utf8_lossy(stdout).trim().to_string()
}
