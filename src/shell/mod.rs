//! The interactive read-eval loop.
//!
//! Each iteration reaps finished background children, reports a pending
//! foreground-only mode change, prompts, and dispatches one command — to a
//! builtin or to the launcher. Only this loop mutates the job table and the
//! last-foreground status; the signal handler touches nothing but the mode
//! flag.

mod builtins;
mod jobs;
mod parser;
mod readline;

use std::io;

use crate::common::CommandLine;
use crate::exec::{self, ExitReason, Spawned};
use crate::log::{dev_info, user_error};
use crate::system::signal::{self, consts::*, SignalHandler, SignalHandlerBehavior};
use crate::system::{interface::ProcessId, process_id};

use self::builtins::Builtin;
use self::jobs::JobTable;
use self::readline::ReadOutcome;

pub fn main() {
    crate::log::ShellLogger::new("smallsh: ").into_global_logger();

    dev_info!("development logs are enabled");

    match Shell::new() {
        Ok(mut shell) => std::process::exit(shell.run()),
        Err(err) => {
            user_error!("cannot install signal handlers: {err}");
            std::process::exit(1);
        }
    }
}

struct Shell {
    pid: ProcessId,
    jobs: JobTable,
    last_foreground: ExitReason,
    /// The mode most recently reported to the user; notifications fire only
    /// when the flag actually differs from this.
    reported_foreground_only: bool,
    /// Keeps the dispositions installed for the lifetime of the interpreter.
    _signal_handlers: [SignalHandler; 2],
}

impl Shell {
    fn new() -> io::Result<Self> {
        let signal_handlers = [
            SignalHandler::register(SIGINT, SignalHandlerBehavior::Ignore)?,
            SignalHandler::register(SIGTSTP, SignalHandlerBehavior::ToggleForegroundOnly)?,
        ];

        Ok(Self {
            pid: process_id(),
            jobs: JobTable::new(),
            last_foreground: ExitReason::Code(0),
            reported_foreground_only: false,
            _signal_handlers: signal_handlers,
        })
    }

    fn run(&mut self) -> i32 {
        loop {
            self.reap();
            self.notify_mode_change_if_any();

            print_flush_ignore_io_error!(":");

            match readline::read_command(&mut io::stdin().lock()) {
                Ok(ReadOutcome::Line(line)) => {
                    if !self.interpret(&line) {
                        return 0;
                    }
                }
                // reprompt; a mode-change notification is likely pending
                Ok(ReadOutcome::Interrupted) => {}
                Ok(ReadOutcome::Eof) => {
                    self.shutdown();
                    return 0;
                }
                Err(err) => {
                    user_error!("cannot read input: {err}");
                    return 1;
                }
            }
        }
    }

    /// Execute one input line. Returns `false` when the interpreter should
    /// exit.
    fn interpret(&mut self, line: &str) -> bool {
        let line = parser::expand_pid(line, self.pid);

        let cmdline = match parser::parse(&line) {
            Ok(Some(cmdline)) => cmdline,
            Ok(None) => return true,
            Err(err) => {
                eprintln_ignore_io_error!("{err}");
                return true;
            }
        };

        match Builtin::from_name(cmdline.program()) {
            Some(Builtin::Exit) => {
                self.shutdown();
                return false;
            }
            Some(Builtin::Cd) => builtins::change_directory(&cmdline.args),
            Some(Builtin::Status) => println_ignore_io_error!("{}", self.last_foreground),
            None => self.launch(&cmdline),
        }

        true
    }

    fn launch(&mut self, cmdline: &CommandLine) {
        match exec::launch(cmdline, signal::foreground_only()) {
            // background completions never touch this slot
            Ok(Spawned::Foreground(reason)) => self.last_foreground = reason,
            Ok(Spawned::Background(pid)) => {
                println_ignore_io_error!("background pid is {pid}");
                self.jobs.push(pid);
            }
            Err(err) => user_error!("{err}"),
        }
    }

    /// Collect finished background children and report their outcomes.
    fn reap(&mut self) {
        for (pid, reason) in self.jobs.poll_finished() {
            println_ignore_io_error!("background pid {pid} is done: {reason}");
        }
    }

    fn notify_mode_change_if_any(&mut self) {
        let Some(foreground_only) = signal::take_mode_change() else {
            return;
        };

        // an even burst of toggles between polls nets out to no transition
        if foreground_only == self.reported_foreground_only {
            return;
        }
        self.reported_foreground_only = foreground_only;

        if foreground_only {
            println_ignore_io_error!("\nEntering foreground-only mode (& is now ignored)");
        } else {
            println_ignore_io_error!("\nExiting foreground-only mode");
        }
    }

    /// Ask all background children to terminate; does not wait for them.
    fn shutdown(&mut self) {
        if !self.jobs.is_empty() {
            dev_info!("exiting with {} background jobs still tracked", self.jobs.len());
        }
        self.jobs.terminate_all();
    }
}
