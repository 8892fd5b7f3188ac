#![deny(unsafe_code)]

//! Launching external commands.
//!
//! The child side of the fork is a one-way street: it either replaces the
//! process image or reports on its own stderr and exits non-zero. No child
//! failure is ever surfaced to the parent as anything other than a wait
//! status.

use std::{
    fmt,
    fs::{File, OpenOptions},
    io,
    os::unix::fs::OpenOptionsExt,
    os::unix::process::CommandExt,
    path::Path,
    process::Command,
};

use crate::common::{CommandLine, Error};
use crate::log::{dev_info, dev_warn};
use crate::system::{
    _exit, dup2, fork,
    interface::ProcessId,
    signal::{consts::*, SignalHandler, SignalHandlerBehavior, SignalNumber},
    wait::{Wait, WaitError, WaitOptions, WaitStatus},
    ForkResult,
};

const DEV_NULL: &str = "/dev/null";

/// Outcome of a command in the wire format shared by the `status` builtin
/// and the background reaper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExitReason {
    Code(i32),
    Signal(SignalNumber),
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Code(code) => write!(f, "exit value {code}"),
            ExitReason::Signal(signal) => write!(f, "terminated by signal {signal}"),
        }
    }
}

impl ExitReason {
    pub(crate) fn from_wait_status(status: &WaitStatus) -> Self {
        if let Some(code) = status.exit_status() {
            ExitReason::Code(code)
        } else if let Some(signal) = status.term_signal() {
            ExitReason::Signal(signal)
        } else {
            // not produced without WUNTRACED; don't poison the status slot
            dev_warn!("unexpected wait status {status:?}");
            ExitReason::Code(1)
        }
    }
}

/// What became of a launched command, from the parent's point of view.
pub(crate) enum Spawned {
    /// The command ran in the foreground and this is its outcome.
    Foreground(ExitReason),
    /// The command is running in the background; the caller records the pid.
    Background(ProcessId),
}

/// Fork and execute one command.
///
/// A command requested in the background still runs in the foreground while
/// foreground-only mode is on. Fork failure leaves no partial state behind.
pub(crate) fn launch(cmdline: &CommandLine, foreground_only: bool) -> Result<Spawned, Error> {
    let run_in_background = cmdline.background && !foreground_only;

    let ForkResult::Parent(child_pid) = fork().map_err(|err| {
        dev_warn!("unable to fork command process: {err}");
        Error::Spawn(err)
    })?
    else {
        exec_child(cmdline, run_in_background)
    };

    dev_info!("spawned command process with pid {child_pid}");

    if run_in_background {
        Ok(Spawned::Background(child_pid))
    } else {
        Ok(Spawned::Foreground(wait_for_foreground(child_pid)))
    }
}

/// Block until the foreground child terminates and classify the outcome.
///
/// The blocking wait is reissued when the stop-signal toggle interrupts it;
/// an interrupted wait says nothing about the child.
pub(crate) fn wait_for_foreground(child_pid: ProcessId) -> ExitReason {
    let status = loop {
        match child_pid.wait(WaitOptions::new()) {
            Ok((_pid, status)) => break status,
            Err(WaitError::Io(err)) if was_interrupted(&err) => {}
            Err(WaitError::NotReady) => {}
            Err(WaitError::Io(err)) => {
                dev_warn!("cannot wait for foreground pid {child_pid}: {err}");
                return ExitReason::Code(1);
            }
        }
    };

    let reason = ExitReason::from_wait_status(&status);
    if let ExitReason::Signal(_) = reason {
        println_ignore_io_error!("{reason}");
    }
    reason
}

pub(crate) fn was_interrupted(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::Interrupted
}

/// Child-side entry point; never returns to the interpreter loop.
fn exec_child(cmdline: &CommandLine, run_in_background: bool) -> ! {
    if redirect_stdio(cmdline, run_in_background).is_err() {
        _exit(1);
    }

    reset_signal_dispositions(run_in_background);

    let err = Command::new(cmdline.program())
        .args(cmdline.arguments())
        .exec();

    // exec only returns on failure
    eprintln_ignore_io_error!("{}: no such file or directory", cmdline.program());
    dev_warn!("failed to execute command: {err}");
    _exit(1)
}

/// Apply the command's redirections over the child's standard streams.
///
/// Every failure is reported here, on the child's stderr, naming the path
/// that failed; the caller only learns "give up".
fn redirect_stdio(cmdline: &CommandLine, run_in_background: bool) -> Result<(), ()> {
    // A background child is detached from the terminal: unless the user
    // redirected explicitly, it reads EOF and its output is discarded.
    let null = Path::new(DEV_NULL);
    let stdin_path = cmdline
        .stdin
        .as_deref()
        .or(run_in_background.then_some(null));
    let stdout_path = cmdline
        .stdout
        .as_deref()
        .or(run_in_background.then_some(null));

    if let Some(path) = stdin_path {
        let file = File::open(path).map_err(|err| {
            eprintln_ignore_io_error!("cannot open {} for input", path.display());
            dev_warn!("opening {} read-only: {err}", path.display());
        })?;
        dup2(&file, libc::STDIN_FILENO).map_err(|err| {
            eprintln_ignore_io_error!(
                "cannot redirect standard input from {}: {err}",
                path.display()
            );
        })?;
    }

    if let Some(path) = stdout_path {
        let file = open_output(path).map_err(|err| {
            eprintln_ignore_io_error!("cannot open {} for output", path.display());
            dev_warn!("opening {} for writing: {err}", path.display());
        })?;
        dup2(&file, libc::STDOUT_FILENO).map_err(|err| {
            eprintln_ignore_io_error!(
                "cannot redirect standard output to {}: {err}",
                path.display()
            );
        })?;
    }

    // the original descriptors close on exec; only the standard streams are
    // inherited
    Ok(())
}

fn open_output(path: &Path) -> io::Result<File> {
    if path == Path::new(DEV_NULL) {
        // the device exists; creation semantics make no sense for it
        OpenOptions::new().write(true).open(path)
    } else {
        // 0644: owner read/write, group and others read-only
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o644)
            .open(path)
    }
}

fn reset_signal_dispositions(run_in_background: bool) {
    // The terminal-stop toggle belongs to the shell; children never see it.
    let tstp = SignalHandler::register(SIGTSTP, SignalHandlerBehavior::Ignore);

    // Background children are shielded from the interrupt key; a child
    // running in the foreground gets the default action back, since the
    // shell itself ignores SIGINT.
    let int_behavior = if run_in_background {
        SignalHandlerBehavior::Ignore
    } else {
        SignalHandlerBehavior::Default
    };
    let int = SignalHandler::register(SIGINT, int_behavior);

    for handler in [tstp, int] {
        match handler {
            // exec replaces the image; there is nothing to restore
            Ok(handler) => handler.forget(),
            Err(err) => dev_warn!("cannot reset child signal disposition: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use std::time::Instant;

    use pretty_assertions::assert_eq;

    use super::{launch, ExitReason, Spawned};
    use crate::common::CommandLine;
    use crate::system::kill;
    use crate::system::wait::{Wait, WaitOptions};

    fn cmdline(args: &[&str]) -> CommandLine {
        CommandLine {
            args: args.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn temp_path(tag: &str) -> PathBuf {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("Failed to get system time")
            .as_nanos();
        std::env::temp_dir().join(format!("smallsh_{tag}_{}_{timestamp}", std::process::id()))
    }

    fn foreground_reason(cmdline: &CommandLine, foreground_only: bool) -> ExitReason {
        match launch(cmdline, foreground_only).unwrap() {
            Spawned::Foreground(reason) => reason,
            Spawned::Background(_) => panic!("command unexpectedly ran in the background"),
        }
    }

    #[test]
    fn foreground_exit_codes() {
        assert_eq!(foreground_reason(&cmdline(&["true"]), false), ExitReason::Code(0));
        assert_eq!(foreground_reason(&cmdline(&["false"]), false), ExitReason::Code(1));
        assert_eq!(
            foreground_reason(&cmdline(&["sh", "-c", "exit 42"]), false),
            ExitReason::Code(42)
        );
    }

    #[test]
    fn foreground_termination_by_signal() {
        let reason = foreground_reason(&cmdline(&["sh", "-c", "kill -TERM $$"]), false);
        assert_eq!(reason, ExitReason::Signal(libc::SIGTERM));
        assert_eq!(reason.to_string(), format!("terminated by signal {}", libc::SIGTERM));
    }

    #[test]
    fn unknown_program_exits_nonzero() {
        assert_eq!(
            foreground_reason(&cmdline(&["smallsh-no-such-program"]), false),
            ExitReason::Code(1)
        );
    }

    #[test]
    fn background_flag_is_overridden_in_foreground_only_mode() {
        let mut sleepless = cmdline(&["true"]);
        sleepless.background = true;

        assert_eq!(foreground_reason(&sleepless, true), ExitReason::Code(0));
    }

    #[test]
    fn background_launch_returns_without_blocking() {
        let mut cmdline = cmdline(&["sleep", "5"]);
        cmdline.background = true;

        let started = Instant::now();
        let Spawned::Background(pid) = launch(&cmdline, false).unwrap() else {
            panic!("command unexpectedly ran in the foreground");
        };
        assert!(started.elapsed().as_secs() < 5);

        kill(pid, libc::SIGKILL).unwrap();
        let (_, status) = pid.wait(WaitOptions::new()).unwrap();
        assert_eq!(status.term_signal(), Some(libc::SIGKILL));
    }

    #[test]
    fn background_stdin_defaults_to_the_null_device() {
        // without the /dev/null default this would hang on the test's stdin
        let mut catty = cmdline(&["cat"]);
        catty.background = true;

        let Spawned::Background(pid) = launch(&catty, false).unwrap() else {
            panic!("command unexpectedly ran in the foreground");
        };

        let (_, status) = pid.wait(WaitOptions::new()).unwrap();
        assert_eq!(status.exit_status(), Some(0));
    }

    #[test]
    fn output_redirection_creates_a_0644_file() {
        let path = temp_path("out");

        let mut hello = cmdline(&["echo", "hello"]);
        hello.stdout = Some(path.clone());

        assert_eq!(foreground_reason(&hello, false), ExitReason::Code(0));

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn output_redirection_truncates_an_existing_file() {
        let path = temp_path("trunc");
        std::fs::write(&path, "x".repeat(100)).unwrap();

        let mut hi = cmdline(&["echo", "hi"]);
        hi.stdout = Some(path.clone());

        assert_eq!(foreground_reason(&hi, false), ExitReason::Code(0));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hi\n");

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_input_file_fails_the_child() {
        let mut cat = cmdline(&["cat"]);
        cat.stdin = Some(temp_path("missing"));

        assert_eq!(foreground_reason(&cat, false), ExitReason::Code(1));
    }

    #[test]
    fn input_redirection_feeds_the_child() {
        let input = temp_path("in");
        let output = temp_path("copied");
        std::fs::write(&input, "line of input\n").unwrap();

        let mut cat = cmdline(&["cat"]);
        cat.stdin = Some(input.clone());
        cat.stdout = Some(output.clone());

        assert_eq!(foreground_reason(&cat, false), ExitReason::Code(0));
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "line of input\n");

        std::fs::remove_file(&input).unwrap();
        std::fs::remove_file(&output).unwrap();
    }

    #[test]
    fn exit_reason_wire_format() {
        assert_eq!(ExitReason::Code(0).to_string(), "exit value 0");
        assert_eq!(ExitReason::Code(127).to_string(), "exit value 127");
        assert_eq!(ExitReason::Signal(2).to_string(), "terminated by signal 2");
    }
}
