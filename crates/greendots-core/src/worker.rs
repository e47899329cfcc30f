//! Forked worker processes.
//!
//! A [`Worker`] owns one forked child and the parent's half of the channel
//! the child reports through. The child runs a caller-supplied unit of work
//! against the channel's write end and exits; the parent later calls
//! [`Worker::wait`] to collect every byte the child wrote.
//!
//! ```no_run
//! use std::io::Write;
//! use greendots_core::Worker;
//!
//! let worker = Worker::fork(|writer| {
//!     let _ = writer.write_all(b"hello");
//! })?;
//! assert_eq!(worker.wait()?, b"hello");
//! # Ok::<(), greendots_core::Error>(())
//! ```

use std::io;
use std::panic::{self, AssertUnwindSafe};

use crate::channel::{Channel, ChannelReader, ChannelWriter};
use crate::config::WorkerConfig;
use crate::error::{Error, Result};

/// Handle to a forked child process and its result channel.
///
/// Dropping a worker without calling [`wait`](Self::wait) closes the read end
/// and reaps the child only if it has already exited. The child is never
/// killed.
#[derive(Debug)]
pub struct Worker {
    /// Process ID of the child.
    pid: libc::pid_t,
    /// Parent's half of the channel (read end only after fork).
    channel: Channel,
    /// Whether the child has been reaped.
    reaped: bool,
}

impl Worker {
    /// Fork a child that runs `work` with the channel's write end.
    ///
    /// Returns in the parent only. In the child, `work` runs, the write end
    /// is closed, and the process exits without returning to the caller.
    ///
    /// # Errors
    /// Returns [`Error::Pipe`] if the channel cannot be created and
    /// [`Error::Fork`] if the OS refuses to create the child.
    pub fn fork<F>(work: F) -> Result<Self>
    where
        F: FnOnce(&mut ChannelWriter),
    {
        Self::fork_with(&WorkerConfig::default(), work)
    }

    /// Fork a child using an explicit configuration.
    pub fn fork_with<F>(config: &WorkerConfig, work: F) -> Result<Self>
    where
        F: FnOnce(&mut ChannelWriter),
    {
        let mut channel = Channel::new()?.read_chunk_size(config.read_chunk_size);

        let pid = unsafe { libc::fork() };

        if pid < 0 {
            return Err(Error::Fork(io::Error::last_os_error()));
        }

        if pid == 0 {
            run_child(channel, work, config.panic_exit_code);
        }

        // The child holds its own copy; ours would keep end-of-data from arriving.
        channel.close_writer();
        tracing::debug!(pid, "forked worker");

        Ok(Self {
            pid,
            channel,
            reaped: false,
        })
    }

    /// Get the process ID of the child.
    pub fn pid(&self) -> libc::pid_t {
        self.pid
    }

    /// Block until the child has exited, then return everything it wrote.
    ///
    /// The channel is drained to end-of-data before the child is reaped, so a
    /// child writing more than the pipe buffer holds is never stuck on a full
    /// pipe. End-of-data arrives only once every copy of the write end is
    /// closed. If the child forked a grandchild that still holds it, this
    /// call blocks until that grandchild lets go.
    ///
    /// How the child terminated is not reported: a child whose work panicked
    /// yields whatever it wrote before panicking.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if reading the channel fails and [`Error::Wait`]
    /// if the child cannot be reaped.
    pub fn wait(mut self) -> Result<Vec<u8>> {
        let read = self.channel.with_reader(ChannelReader::read_all);
        self.reap()?;
        let bytes = read??;
        tracing::debug!(pid = self.pid, bytes = bytes.len(), "worker completed");
        Ok(bytes)
    }

    fn reap(&mut self) -> Result<()> {
        let mut status: libc::c_int = 0;
        loop {
            let rc = unsafe { libc::waitpid(self.pid, &mut status, 0) };
            if rc >= 0 {
                break;
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(Error::Wait(err));
            }
        }
        self.reaped = true;
        Ok(())
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if self.reaped {
            return;
        }

        let mut status: libc::c_int = 0;
        let rc = unsafe { libc::waitpid(self.pid, &mut status, libc::WNOHANG) };
        match rc {
            0 => tracing::debug!(pid = self.pid, "worker dropped while child still running"),
            rc if rc < 0 => tracing::warn!(
                pid = self.pid,
                "Failed to reap dropped worker: {}",
                io::Error::last_os_error()
            ),
            _ => tracing::debug!(pid = self.pid, "reaped dropped worker"),
        }
    }
}

/// Child side of [`Worker::fork_with`]. Never returns.
///
/// Exits with `_exit` so the parent's atexit handlers and buffered stdio are
/// not run a second time in the child. Nothing is logged here: a logging lock
/// held by another parent thread at fork time would never be released.
fn run_child<F>(mut channel: Channel, work: F, panic_exit_code: i32) -> !
where
    F: FnOnce(&mut ChannelWriter),
{
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| channel.with_writer(work)));

    let code = match outcome {
        Ok(Ok(())) => 0,
        Ok(Err(_)) => 1,
        Err(_) => panic_exit_code,
    };

    drop(channel);
    unsafe { libc::_exit(code) }
}
