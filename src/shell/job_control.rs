use std::fmt;
use std::io::Write;
use std::process::ExitStatus;

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::sys::wait::{self, WaitPidFlag};
use nix::unistd::Pid;

use crate::errors::Result;
use crate::util::SmallshExitStatusExt;

/// Tracks detached children until they have been reaped.
///
/// Order is irrelevant: entries are removed by swapping with the last one.
#[derive(Default)]
pub struct JobManager {
    jobs: Vec<Pid>,
}

impl JobManager {
    pub fn add_job(&mut self, pid: Pid) {
        debug!("tracking background pid {}", pid);
        self.jobs.push(pid);
    }

    pub fn has_jobs(&self) -> bool {
        !self.jobs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.jobs.contains(&pid)
    }

    /// Polls every tracked job without blocking, reporting and removing the
    /// ones that have terminated. Jobs still running are left for the next call.
    pub fn do_job_notification(&mut self, stdout: &mut dyn Write) -> Result<()> {
        let mut i = 0;
        while i < self.jobs.len() {
            let pid = self.jobs[i];
            match wait::waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
                Ok(wait_status) => {
                    if let Some(status) = ExitStatus::from_wait_status(wait_status) {
                        info!("background pid {} finished: {:?}", pid, wait_status);
                        writeln!(
                            stdout,
                            "background pid {} is done: {}",
                            pid,
                            status.describe()
                        )?;
                        self.jobs.swap_remove(i);
                        continue;
                    }
                }
                Err(Errno::EINTR) => continue,
                Err(Errno::ECHILD) => {
                    warn!("background pid {} is not a child, forgetting it", pid);
                    self.jobs.swap_remove(i);
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
            i += 1;
        }

        stdout.flush()?;
        Ok(())
    }

    /// Sends SIGTERM to every tracked job. Their exit status is not collected.
    pub fn kill_all(&mut self) {
        for pid in self.jobs.drain(..) {
            debug!("sending SIGTERM to background pid {}", pid);
            let temp_result = signal::kill(pid, Signal::SIGTERM);
            log_if_err!(temp_result, "failed to terminate background pid {}", pid);
        }
    }
}

impl fmt::Debug for JobManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} jobs:", self.jobs.len())?;
        for pid in &self.jobs {
            write!(f, " {}", pid)?;
        }

        Ok(())
    }
}
