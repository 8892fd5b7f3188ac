//! Utilities to handle signals.
//!
//! The shell installs exactly two dispositions for itself: SIGINT is ignored
//! outright, and SIGTSTP toggles foreground-only mode through the flag in
//! [`mode`]. Children re-register their own dispositions after the fork.

mod handler;
mod mode;
mod set;

pub(crate) use handler::{SignalHandler, SignalHandlerBehavior};
pub(crate) use mode::{foreground_only, take_mode_change};

use std::borrow::Cow;

pub(crate) type SignalNumber = libc::c_int;

macro_rules! define_consts {
    ($($signal:ident,)*) => {
        pub(crate) mod consts {
            pub(crate) use libc::{$($signal,)*};
        }

        pub(crate) fn signal_name(signal: SignalNumber) -> Cow<'static, str> {
            match signal {
                $(consts::$signal => stringify!($signal).into(),)*
                _ => format!("signal #{signal}").into(),
            }
        }
    };
}

define_consts! {
    SIGINT,
    SIGQUIT,
    SIGTSTP,
    SIGTERM,
    SIGCHLD,
    SIGCONT,
    SIGKILL,
    SIGSTOP,
}

#[cfg(test)]
mod tests {
    use super::{consts::*, signal_name};

    #[test]
    fn names_known_signals() {
        assert_eq!(signal_name(SIGINT), "SIGINT");
        assert_eq!(signal_name(SIGTSTP), "SIGTSTP");
        assert_eq!(signal_name(-1), "signal #-1");
    }
}
