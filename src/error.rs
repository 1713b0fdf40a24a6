use std::io;
use thiserror::Error;

pub const STATUS_FORK_FAILED: i32 = 3;
/// Any exec failure other than "not found" or "permission denied".
pub const STATUS_EXEC_FAILED: i32 = 4;
pub const STATUS_PIPE_FAILED: i32 = 5;
pub const STATUS_REDIRECT_FAILED: i32 = 6;
pub const STATUS_PERMISSION_DENIED: i32 = 126;
pub const STATUS_NOT_FOUND: i32 = 127;
/// Added to the signal number of a child killed by a signal.
pub const STATUS_SIGNAL_BASE: i32 = 128;

/// Failures of the shell process itself while setting up a pipeline.
///
/// Failures inside a forked child never come back as an `ExecError`; the
/// child exits with one of the status codes above instead.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("fork: {}", .0.desc())]
    Fork(nix::Error),
    #[error("pipe: {}", .0.desc())]
    Pipe(nix::Error),
    #[error("wait: {}", .0.desc())]
    Wait(nix::Error),
    #[error("{path}: {}", io_cause(.source))]
    Redirect { path: String, source: io::Error },
    #[error("{0}: argument contains a NUL byte")]
    InvalidArgument(String),
}

impl ExecError {
    pub fn status(&self) -> i32 {
        match self {
            ExecError::Fork(_) => STATUS_FORK_FAILED,
            ExecError::Pipe(_) => STATUS_PIPE_FAILED,
            ExecError::Redirect { .. } => STATUS_REDIRECT_FAILED,
            ExecError::Wait(_) | ExecError::InvalidArgument(_) => 1,
        }
    }
}

/// Renders an io error without the trailing " (os error N)".
pub fn io_cause(err: &io::Error) -> String {
    let text = err.to_string();
    match text.find(" (os error") {
        Some(idx) => text[..idx].to_string(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::errno::Errno;

    #[test]
    fn test_status_codes() {
        assert_eq!(ExecError::Fork(Errno::EAGAIN).status(), 3);
        assert_eq!(ExecError::Pipe(Errno::EMFILE).status(), 5);
        let redirect = ExecError::Redirect {
            path: "out.txt".into(),
            source: io::Error::from_raw_os_error(libc::EACCES),
        };
        assert_eq!(redirect.status(), 6);
        assert_eq!(ExecError::InvalidArgument("a\0b".into()).status(), 1);
    }

    #[test]
    fn test_messages_are_human_readable() {
        let redirect = ExecError::Redirect {
            path: "/nope/out.txt".into(),
            source: io::Error::from_raw_os_error(libc::ENOENT),
        };
        assert_eq!(redirect.to_string(), "/nope/out.txt: No such file or directory");
        assert_eq!(ExecError::Pipe(Errno::EMFILE).to_string(), "pipe: Too many open files");
    }

    #[test]
    fn test_io_cause_strips_os_error_suffix() {
        let err = io::Error::from_raw_os_error(libc::ENOTDIR);
        assert_eq!(io_cause(&err), "Not a directory");
        let custom = io::Error::other("plain message");
        assert_eq!(io_cause(&custom), "plain message");
    }
}
