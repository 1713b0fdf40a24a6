use std::ffi::{CStr, CString};
use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::RawFd;
use std::os::unix::fs::OpenOptionsExt;

use nix::errno::Errno;
use nix::fcntl::{OFlag, open};
use nix::sys::stat::Mode;
use nix::unistd::{close, dup2};

use crate::ast::Command;
use crate::error::ExecError;

const FILE_MODE: u32 = 0o644;

fn output_flags(append: bool) -> OFlag {
    let base = OFlag::O_WRONLY | OFlag::O_CREAT;
    if append { base | OFlag::O_APPEND } else { base | OFlag::O_TRUNC }
}

fn c_path(path: &str) -> Result<CString, ExecError> {
    CString::new(path).map_err(|_| ExecError::InvalidArgument(path.to_string()))
}

/// A stage's redirections, converted for use after fork.
#[derive(Debug, Default)]
pub struct ChildRedirects {
    input: Option<CString>,
    output: Option<(CString, bool)>,
    error: Option<CString>,
}

impl ChildRedirects {
    pub fn new(cmd: &Command) -> Result<Self, ExecError> {
        Ok(ChildRedirects {
            input: cmd.input_file.as_deref().map(c_path).transpose()?,
            output: cmd
                .output_file
                .as_deref()
                .map(|p| Ok::<_, ExecError>((c_path(p)?, cmd.append_output)))
                .transpose()?,
            error: cmd.error_file.as_deref().map(c_path).transpose()?,
        })
    }

    /// Rebinds the standard descriptors of the current (child) process.
    ///
    /// Runs after any pipe wiring, so a file always wins over a pipe. On
    /// failure returns the path that could not be opened.
    pub fn apply(&self) -> Result<(), (&CStr, Errno)> {
        if let Some(path) = &self.input {
            replace_fd(path, OFlag::O_RDONLY, libc::STDIN_FILENO)?;
        }
        if let Some((path, append)) = &self.output {
            replace_fd(path, output_flags(*append), libc::STDOUT_FILENO)?;
        }
        if let Some(path) = &self.error {
            replace_fd(path, output_flags(false), libc::STDERR_FILENO)?;
        }
        Ok(())
    }
}

fn replace_fd(path: &CStr, flags: OFlag, target: RawFd) -> Result<(), (&CStr, Errno)> {
    let fd = open(path, flags, Mode::from_bits_truncate(FILE_MODE)).map_err(|e| (path, e))?;
    if fd != target {
        dup2(fd, target).map_err(|e| (path, e))?;
        let _ = close(fd);
    }
    Ok(())
}

/// Redirect targets opened in the shell process for a builtin.
#[derive(Debug, Default)]
pub struct BuiltinStreams {
    pub output: Option<File>,
    pub error: Option<File>,
}

impl BuiltinStreams {
    /// Opens in the same order a child would: input, output, error.
    ///
    /// Builtins never read standard input, but a missing input file is
    /// still an error.
    pub fn open(cmd: &Command) -> Result<Self, ExecError> {
        if let Some(path) = &cmd.input_file {
            File::open(path).map_err(|e| redirect_error(path, e))?;
        }
        let output = cmd
            .output_file
            .as_deref()
            .map(|path| open_for_write(path, cmd.append_output))
            .transpose()?;
        let error = cmd
            .error_file
            .as_deref()
            .map(|path| open_for_write(path, false))
            .transpose()?;
        Ok(BuiltinStreams { output, error })
    }
}

fn open_for_write(path: &str, append: bool) -> Result<File, ExecError> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .append(append)
        .truncate(!append)
        .mode(FILE_MODE)
        .open(path)
        .map_err(|e| redirect_error(path, e))
}

fn redirect_error(path: &str, source: io::Error) -> ExecError {
    ExecError::Redirect {
        path: path.to_string(),
        source,
    }
}
