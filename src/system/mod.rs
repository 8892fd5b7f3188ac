//! Wrappers around the handful of process-control syscalls the shell needs.
use std::{
    io,
    os::fd::{AsRawFd, RawFd},
};

use interface::ProcessId;

use self::signal::SignalNumber;

pub mod interface;

pub mod signal;

pub mod wait;

/// Map the `-1` returned by a failing C call to the current `errno` value.
pub(crate) fn cerr<Int: Copy + TryInto<libc::c_long>>(res: Int) -> io::Result<Int> {
    match res.try_into() {
        Ok(-1) => Err(io::Error::last_os_error()),
        _ => Ok(res),
    }
}

pub(crate) fn _exit(status: libc::c_int) -> ! {
    // SAFETY: `_exit` terminates the process without touching any state that
    // could be observed afterwards.
    unsafe { libc::_exit(status) }
}

pub(crate) enum ForkResult {
    // Parent process branch with the child process' PID.
    Parent(ProcessId),
    // Child process branch.
    Child,
}

unsafe fn inner_fork() -> io::Result<ForkResult> {
    let pid = cerr(unsafe { libc::fork() })?;
    if pid == 0 {
        Ok(ForkResult::Child)
    } else {
        Ok(ForkResult::Parent(ProcessId::new(pid)))
    }
}

#[cfg(target_os = "linux")]
/// Create a new process.
pub(crate) fn fork() -> io::Result<ForkResult> {
    // SAFETY: `fork` is implemented using `clone` in linux so we don't need to worry about signal
    // safety.
    unsafe { inner_fork() }
}

#[cfg(not(target_os = "linux"))]
/// Create a new process.
///
/// # Safety
///
/// In a multithreaded program, only async-signal-safe functions are guaranteed to work in the
/// child process until a call to `execve` or a similar function is done.
pub(crate) unsafe fn fork() -> io::Result<ForkResult> {
    inner_fork()
}

/// Send a signal to a process with the specified ID.
pub(crate) fn kill(pid: ProcessId, signal: SignalNumber) -> io::Result<()> {
    // SAFETY: This function cannot cause UB even if `pid` is not a valid process ID or if
    // `signal` is not a valid signal code.
    cerr(unsafe { libc::kill(pid.get(), signal) }).map(|_| ())
}

/// Duplicate an owned descriptor over one of the standard streams.
pub(crate) fn dup2<F: AsRawFd>(source: &F, target: RawFd) -> io::Result<()> {
    // SAFETY: both descriptors are valid for the duration of the call; `dup2`
    // does not take ownership of either.
    cerr(unsafe { libc::dup2(source.as_raw_fd(), target) }).map(|_| ())
}

/// Return the process identifier for the current process.
pub(crate) fn process_id() -> ProcessId {
    // NOTE libstd casts the `i32` that `libc::getpid` returns into `u32`
    // here we cast it back into `i32`
    ProcessId::new(std::process::id() as libc::pid_t)
}

pub(crate) fn make_zeroed_sigaction() -> libc::sigaction {
    // SAFETY: since sigaction is a C struct, all-zeroes is a valid representation
    // We cannot use a "literal struct" initialization method since the exact representation
    // of libc::sigaction is not fixed, see e.g. https://github.com/trifectatechfoundation/sudo-rs/issues/829
    unsafe { std::mem::zeroed() }
}
