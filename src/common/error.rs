use std::{fmt, io};

/// Which half of an I/O redirection an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectOp {
    Input,
    Output,
}

/// Failures the interpreter loop reports and survives.
///
/// Child-side failures are deliberately absent: a child reports on its own
/// stderr and exits non-zero, and the parent only ever sees them as a wait
/// status.
#[derive(Debug)]
pub enum Error {
    /// A `<` or `>` operator without a filename token after it.
    RedirectWithoutTarget(RedirectOp),
    /// fork(2) failed; no child was created and the command was abandoned.
    Spawn(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::RedirectWithoutTarget(RedirectOp::Input) => {
                f.write_str("Input redirection not specified!")
            }
            Error::RedirectWithoutTarget(RedirectOp::Output) => {
                f.write_str("Output redirection not specified!")
            }
            Error::Spawn(e) => write!(f, "cannot spawn child process: {e}"),
        }
    }
}
