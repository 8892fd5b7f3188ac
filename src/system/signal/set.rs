use crate::system::{cerr, make_zeroed_sigaction};

use super::{handler::SignalHandlerBehavior, mode};

use std::{io, mem::MaybeUninit};

#[repr(transparent)]
pub(super) struct SignalAction {
    raw: libc::sigaction,
}

impl SignalAction {
    pub(super) fn new(behavior: SignalHandlerBehavior) -> io::Result<Self> {
        let (sa_sigaction, sa_mask, sa_flags) = match behavior {
            // `SA_RESTART` so a delivery of the ignored signal never makes a
            // blocking call of ours fail with `EINTR`.
            SignalHandlerBehavior::Default => (libc::SIG_DFL, SignalSet::empty()?, libc::SA_RESTART),
            SignalHandlerBehavior::Ignore => (libc::SIG_IGN, SignalSet::empty()?, libc::SA_RESTART),
            // A full `sa_mask` so the flag flip cannot be interrupted by
            // another handler, and no `SA_RESTART`: the blocking prompt read
            // must fail with `EINTR` so the pending mode change is reported
            // before the next command is read.
            SignalHandlerBehavior::ToggleForegroundOnly => (
                mode::toggle_foreground_only as libc::sighandler_t,
                SignalSet::full()?,
                0,
            ),
        };

        let mut raw: libc::sigaction = make_zeroed_sigaction();
        raw.sa_sigaction = sa_sigaction;
        raw.sa_mask = sa_mask.raw;
        raw.sa_flags = sa_flags;

        Ok(Self { raw })
    }

    pub(super) fn register(&self, signal: super::SignalNumber) -> io::Result<Self> {
        let mut original_action = MaybeUninit::<Self>::zeroed();

        // SAFETY: `self.raw` is a fully initialized `sigaction` and the out
        // pointer is valid for writes of the same type.
        cerr(unsafe { libc::sigaction(signal, &self.raw, original_action.as_mut_ptr().cast()) })?;

        // SAFETY: a successful `sigaction` call wrote the previous action.
        Ok(unsafe { original_action.assume_init() })
    }
}

// A signal set used to mask signal delivery while a handler runs.
#[repr(transparent)]
struct SignalSet {
    raw: libc::sigset_t,
}

impl SignalSet {
    /// Create an empty set.
    fn empty() -> io::Result<Self> {
        let mut set = MaybeUninit::<Self>::zeroed();

        // SAFETY: `sigemptyset` initializes the pointed-to set.
        cerr(unsafe { libc::sigemptyset(set.as_mut_ptr().cast()) })?;

        // SAFETY: initialized by the call above.
        Ok(unsafe { set.assume_init() })
    }

    /// Create a set containing all the signals.
    fn full() -> io::Result<Self> {
        let mut set = MaybeUninit::<Self>::zeroed();

        // SAFETY: `sigfillset` initializes the pointed-to set.
        cerr(unsafe { libc::sigfillset(set.as_mut_ptr().cast()) })?;

        // SAFETY: initialized by the call above.
        Ok(unsafe { set.assume_init() })
    }
}
