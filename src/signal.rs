//! Signal dispositions for the shell process and for its children.

use nix::sys::signal::{
    SaFlags, SigAction, SigHandler, SigSet, SigmaskHow, Signal, sigaction, sigprocmask,
};

use crate::executor::reaper;

/// Signals the shell handles or ignores and its children must get back.
const CHILD_DEFAULTS: [Signal; 7] = [
    Signal::SIGINT,
    Signal::SIGQUIT,
    Signal::SIGTSTP,
    Signal::SIGTTIN,
    Signal::SIGTTOU,
    Signal::SIGCHLD,
    Signal::SIGPIPE,
];

extern "C" fn on_sigint(_: libc::c_int) {
    // Only async-signal-safe calls here
    let newline = b"\n";
    unsafe {
        libc::write(libc::STDOUT_FILENO, newline.as_ptr().cast(), newline.len());
    }
}

/// Ctrl-C only moves the prompt to a new line, job-control signals are
/// ignored and SIGCHLD drives the background collector.
pub fn install_shell_handlers() -> nix::Result<()> {
    let interrupt = SigAction::new(
        SigHandler::Handler(on_sigint),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    let child = SigAction::new(
        SigHandler::Handler(reaper::on_sigchld),
        SaFlags::SA_RESTART | SaFlags::SA_NOCLDSTOP,
        SigSet::empty(),
    );
    let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());

    // SAFETY: both handlers restrict themselves to async-signal-safe calls.
    unsafe {
        sigaction(Signal::SIGINT, &interrupt)?;
        sigaction(Signal::SIGCHLD, &child)?;
        for sig in [Signal::SIGQUIT, Signal::SIGTSTP, Signal::SIGTTIN, Signal::SIGTTOU] {
            sigaction(sig, &ignore)?;
        }
    }
    log::debug!("signal handlers installed");
    Ok(())
}

/// Called in a freshly forked child before redirection and exec.
pub fn reset_for_child() {
    let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    for sig in CHILD_DEFAULTS {
        // SAFETY: restoring SIG_DFL installs no handler code.
        let _ = unsafe { sigaction(sig, &default) };
    }
    let _ = sigprocmask(SigmaskHow::SIG_SETMASK, Some(&SigSet::empty()), None);
}

/// Keeps SIGCHLD blocked while alive, so a child can be forked and
/// registered with the collector before its termination is handled.
pub struct ChildSignalBlock {
    previous: SigSet,
}

impl ChildSignalBlock {
    pub fn new() -> nix::Result<Self> {
        let mut block = SigSet::empty();
        block.add(Signal::SIGCHLD);
        let mut previous = SigSet::empty();
        sigprocmask(SigmaskHow::SIG_BLOCK, Some(&block), Some(&mut previous))?;
        Ok(ChildSignalBlock { previous })
    }
}

impl Drop for ChildSignalBlock {
    fn drop(&mut self) {
        let _ = sigprocmask(SigmaskHow::SIG_SETMASK, Some(&self.previous), None);
    }
}
