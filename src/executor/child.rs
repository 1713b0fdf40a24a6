//! Code that runs between fork and exec.
//!
//! Argument vectors and redirect paths are converted by the parent
//! beforehand, so a child only wires descriptors and execs. It never logs.

use std::ffi::CString;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::mem::ManuallyDrop;
use std::os::fd::{FromRawFd, RawFd};

use nix::errno::Errno;
use nix::unistd::{close, dup2, execvp};

use crate::ast::Command;
use crate::error::{
    ExecError, STATUS_EXEC_FAILED, STATUS_NOT_FOUND, STATUS_PERMISSION_DENIED,
    STATUS_REDIRECT_FAILED,
};
use crate::executor::builtin::BuiltinManager;
use crate::executor::redirect::ChildRedirects;
use crate::signal;
use crate::state::ShellState;

/// One pipeline stage, ready to be run in a child.
pub struct PreparedStage<'a> {
    pub command: &'a Command,
    argv: Vec<CString>,
    redirects: ChildRedirects,
    builtin: bool,
}

impl<'a> PreparedStage<'a> {
    pub fn new(command: &'a Command, builtins: &BuiltinManager) -> Result<Self, ExecError> {
        let argv = command
            .args
            .iter()
            .map(|arg| CString::new(arg.as_str()).map_err(|_| ExecError::InvalidArgument(arg.clone())))
            .collect::<Result<Vec<_>, _>>()?;
        let builtin = command.name().is_some_and(|name| builtins.is_builtin(name));
        Ok(PreparedStage {
            command,
            argv,
            redirects: ChildRedirects::new(command)?,
            builtin,
        })
    }
}

/// Pipe ends a child has to wire up before running its stage.
#[derive(Debug, Default, Clone, Copy)]
pub struct StageFds {
    pub stdin: Option<RawFd>,
    pub stdout: Option<RawFd>,
    /// Read end of this stage's own output pipe, meant for the next stage.
    pub unused: Option<RawFd>,
}

fn _exit(status: i32) -> ! {
    // SAFETY: ends the child without running the parent's exit handlers.
    unsafe { libc::_exit(status) }
}

fn write_stderr(parts: &[&[u8]]) {
    for part in parts {
        // SAFETY: plain write(2) of a valid buffer.
        unsafe {
            libc::write(libc::STDERR_FILENO, part.as_ptr().cast(), part.len());
        }
    }
}

fn report(program: &[u8], context: &[u8], cause: &str) {
    write_stderr(&[program, b": ", context, b": ", cause.as_bytes(), b"\n"]);
}

fn move_fd(fd: RawFd, target: RawFd) {
    if fd != target {
        let _ = dup2(fd, target);
        let _ = close(fd);
    }
}

fn wire(fds: StageFds) {
    if let Some(fd) = fds.unused {
        let _ = close(fd);
    }
    if let Some(fd) = fds.stdin {
        move_fd(fd, libc::STDIN_FILENO);
    }
    if let Some(fd) = fds.stdout {
        move_fd(fd, libc::STDOUT_FILENO);
    }
}

fn exec_failure_status(err: Errno) -> (i32, &'static str) {
    match err {
        Errno::ENOENT => (STATUS_NOT_FOUND, "command not found"),
        Errno::EACCES => (STATUS_PERMISSION_DENIED, "permission denied"),
        other => (STATUS_EXEC_FAILED, other.desc()),
    }
}

/// Body of a forked child. Never returns.
pub fn run_stage(
    stage: &PreparedStage<'_>,
    fds: StageFds,
    program: &[u8],
    builtins: &BuiltinManager,
    state: &mut ShellState,
) -> ! {
    signal::reset_for_child();
    wire(fds);

    if let Err((path, err)) = stage.redirects.apply() {
        report(program, path.to_bytes(), err.desc());
        _exit(STATUS_REDIRECT_FAILED);
    }

    if stage.builtin {
        _exit(run_builtin(stage, builtins, state));
    }

    let Some(name) = stage.argv.first() else {
        _exit(0);
    };
    let err = match execvp::<CString>(name, &stage.argv) {
        Ok(never) => match never {},
        Err(err) => err,
    };
    let (status, cause) = exec_failure_status(err);
    report(program, name.to_bytes(), cause);
    _exit(status)
}

// Inside a pipeline a builtin writes straight to the wired descriptors.
fn run_builtin(stage: &PreparedStage<'_>, builtins: &BuiltinManager, state: &mut ShellState) -> i32 {
    // SAFETY: descriptors 1 and 2 stay open until the child exits, and
    // ManuallyDrop keeps them from being closed here.
    let stdout = ManuallyDrop::new(unsafe { File::from_raw_fd(libc::STDOUT_FILENO) });
    let stderr = ManuallyDrop::new(unsafe { File::from_raw_fd(libc::STDERR_FILENO) });
    let mut out = BufWriter::new(&*stdout);
    let mut err = BufWriter::new(&*stderr);

    let status = builtins
        .execute(&stage.command.args, state, &mut out, &mut err)
        .unwrap_or(STATUS_NOT_FOUND);
    let _ = out.flush();
    let _ = err.flush();
    status
}
