//! Collector for background children.
//!
//! Background pids are registered in a fixed table of atomics that the
//! SIGCHLD handler scans with `waitpid(pid, WNOHANG)`. The handler never
//! waits on an unregistered pid, so foreground waits and the collector
//! cannot steal each other's children.

use std::sync::Mutex;
use std::sync::atomic::{AtomicI32, Ordering};

use nix::errno::Errno;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;

const SLOTS: usize = 64;
const EMPTY: i32 = 0;

static TRACKED: [AtomicI32; SLOTS] = [const { AtomicI32::new(EMPTY) }; SLOTS];

// Pids that did not fit in the table; only touched outside signal context.
static OVERFLOW: Mutex<Vec<Pid>> = Mutex::new(Vec::new());

/// Hands a background child to the collector.
///
/// Call with SIGCHLD blocked, between fork and the next unblock.
pub fn track(pid: Pid) {
    for slot in &TRACKED {
        if slot
            .compare_exchange(EMPTY, pid.as_raw(), Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            return;
        }
    }
    log::warn!("background table full, pid {} reaped at next prompt", pid);
    if let Ok(mut overflow) = OVERFLOW.lock() {
        overflow.push(pid);
    }
}

pub fn is_tracked(pid: Pid) -> bool {
    TRACKED
        .iter()
        .any(|slot| slot.load(Ordering::SeqCst) == pid.as_raw())
}

// true once `pid` is gone: reaped now, or never our child
fn try_reap(pid: Pid) -> bool {
    match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
        Ok(WaitStatus::Exited(..)) | Ok(WaitStatus::Signaled(..)) => true,
        Err(Errno::ECHILD) => true,
        _ => false,
    }
}

/// Reaps every registered child that has terminated.
pub fn reap_tracked() {
    for slot in &TRACKED {
        let raw = slot.load(Ordering::SeqCst);
        if raw != EMPTY && try_reap(Pid::from_raw(raw)) {
            let _ = slot.compare_exchange(raw, EMPTY, Ordering::SeqCst, Ordering::SeqCst);
        }
    }
}

/// Reaps overflow pids. Not for signal context.
pub fn reap_overflow() {
    if let Ok(mut overflow) = OVERFLOW.lock() {
        overflow.retain(|&pid| !try_reap(pid));
    }
}

#[cfg(target_os = "linux")]
unsafe fn errno_location() -> *mut libc::c_int {
    unsafe { libc::__errno_location() }
}

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
unsafe fn errno_location() -> *mut libc::c_int {
    unsafe { libc::__error() }
}

pub extern "C" fn on_sigchld(_: libc::c_int) {
    // SAFETY: errno is thread-local and the pointer stays valid for the
    // whole handler.
    unsafe {
        let errno = errno_location();
        let saved = *errno;
        reap_tracked();
        *errno = saved;
    }
}
