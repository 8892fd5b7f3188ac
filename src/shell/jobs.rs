//! Bookkeeping for background children.
//!
//! Only the interpreter loop ever touches the table; nothing here runs in
//! signal-handler context, so no locking is needed.

use crate::exec::ExitReason;
use crate::log::dev_warn;
use crate::system::{
    interface::ProcessId,
    kill,
    signal::consts::SIGTERM,
    wait::{Wait, WaitError, WaitOptions},
};

pub(crate) struct JobTable {
    pids: Vec<ProcessId>,
}

impl JobTable {
    pub(crate) const fn new() -> Self {
        Self { pids: Vec::new() }
    }

    /// Track a newly spawned background child.
    pub(crate) fn push(&mut self, pid: ProcessId) {
        debug_assert!(!self.pids.contains(&pid));
        self.pids.push(pid);
    }

    pub(crate) fn len(&self) -> usize {
        self.pids.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pids.is_empty()
    }

    /// Sweep the table once without blocking.
    ///
    /// Every pid that has terminated is removed and its classified outcome
    /// returned; the rest stay for the next sweep. Removing in place while
    /// scanning keeps the index on the element that slid into the freed
    /// slot, so no entry is skipped or visited twice.
    pub(crate) fn poll_finished(&mut self) -> Vec<(ProcessId, ExitReason)> {
        let mut finished = Vec::new();

        let mut index = 0;
        while index < self.pids.len() {
            let pid = self.pids[index];
            match pid.wait(WaitOptions::new().no_hang()) {
                Err(WaitError::NotReady) => index += 1,
                Ok((_, status)) => {
                    self.pids.remove(index);
                    finished.push((pid, ExitReason::from_wait_status(&status)));
                }
                Err(WaitError::Io(err)) => {
                    // ECHILD: this pid can never be reaped; evict it or the
                    // same error would come back on every sweep
                    dev_warn!("cannot poll background pid {pid}: {err}");
                    self.pids.remove(index);
                }
            }
        }

        finished
    }

    /// Ask every still-running child to terminate.
    ///
    /// Does not block, does not report, does not clear the table; the
    /// interpreter is exiting and the kernel inherits the children.
    pub(crate) fn terminate_all(&self) {
        for &pid in &self.pids {
            match pid.wait(WaitOptions::new().no_hang()) {
                Err(WaitError::NotReady) => {
                    if let Err(err) = kill(pid, SIGTERM) {
                        dev_warn!("cannot terminate background pid {pid}: {err}");
                    }
                }
                // already terminated between the last sweep and now
                Ok(_) => {}
                Err(WaitError::Io(err)) => {
                    dev_warn!("cannot poll background pid {pid}: {err}")
                }
            }
        }
    }

    #[cfg(test)]
    fn capacity(&self) -> usize {
        self.pids.capacity()
    }
}

#[cfg(test)]
mod tests {
    use std::process::{Child, Command};
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::JobTable;
    use crate::exec::ExitReason;
    use crate::system::interface::ProcessId;

    fn spawn_sleep() -> Child {
        Command::new("sleep").arg("5").spawn().unwrap()
    }

    fn pid_of(child: &Child) -> ProcessId {
        ProcessId::new(child.id() as i32)
    }

    fn drain(jobs: &mut JobTable, count: usize) -> Vec<(ProcessId, ExitReason)> {
        let mut outcomes = Vec::new();
        while outcomes.len() < count {
            outcomes.extend(jobs.poll_finished());
            std::thread::sleep(Duration::from_millis(10));
        }
        outcomes
    }

    #[test]
    fn tracks_children_until_terminated() {
        let mut jobs = JobTable::new();

        let children: Vec<Child> = (0..3).map(|_| spawn_sleep()).collect();
        for child in &children {
            jobs.push(pid_of(child));
        }
        assert_eq!(jobs.len(), 3);
        assert!(jobs.capacity() >= jobs.len());

        // nothing has finished, and polling must not consume entries
        assert!(jobs.poll_finished().is_empty());
        assert!(jobs.poll_finished().is_empty());
        assert_eq!(jobs.len(), 3);

        jobs.terminate_all();
        // termination requests do not remove entries
        assert_eq!(jobs.len(), 3);

        let outcomes = drain(&mut jobs, 3);
        assert!(jobs.is_empty());
        for (_, reason) in outcomes {
            assert_eq!(reason, ExitReason::Signal(libc::SIGTERM));
        }
    }

    #[test]
    fn reaps_exit_codes() {
        let mut jobs = JobTable::new();

        let child = Command::new("sh").args(["-c", "exit 7"]).spawn().unwrap();
        let pid = pid_of(&child);
        jobs.push(pid);

        let outcomes = drain(&mut jobs, 1);
        assert_eq!(outcomes, vec![(pid, ExitReason::Code(7))]);
        assert!(jobs.is_empty());
    }

    #[test]
    fn evicts_pids_that_cannot_be_waited_for() {
        let mut jobs = JobTable::new();

        // pid 1 is never a child of the test process
        jobs.push(ProcessId::new(1));

        assert!(jobs.poll_finished().is_empty());
        assert!(jobs.is_empty());
    }
}
