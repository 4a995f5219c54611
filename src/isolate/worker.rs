//! One forked worker per isolated poll, waited on with a deadline.

use super::IsolationError;

/// How waiting on the worker ended.
#[derive(Debug)]
pub(crate) enum Waited {
    /// The worker wrote a complete report frame (body only).
    Reported(Vec<u8>),
    /// The worker missed the deadline and was killed.
    Killed,
}

#[cfg(unix)]
pub(crate) use unix::spawn_and_wait;

#[cfg(not(unix))]
pub(crate) fn spawn_and_wait<W>(
    _work: W,
    _limit: std::time::Duration,
) -> Result<Waited, IsolationError>
where
    W: FnOnce() -> Vec<u8>,
{
    Err(IsolationError::Unsupported)
}

#[cfg(unix)]
mod unix {
    use std::fs::File;
    use std::io::{self, Write};
    use std::os::unix::io::FromRawFd;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::mpsc::{self, RecvTimeoutError};
    use std::thread;
    use std::time::Duration;

    use super::super::wire;
    use super::{IsolationError, Waited};

    /// Both ends are close-on-exec, so processes the target starts never hold
    /// the write end open past the worker's death.
    #[cfg(any(target_os = "linux", target_os = "android"))]
    fn pipe_fds() -> io::Result<[libc::c_int; 2]> {
        let mut fds = [0 as libc::c_int; 2];
        // SAFETY: `fds` has room for the two descriptors pipe2() writes.
        if unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(fds)
    }

    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    fn pipe_fds() -> io::Result<[libc::c_int; 2]> {
        let mut fds = [0 as libc::c_int; 2];
        // SAFETY: `fds` has room for the two descriptors pipe() writes.
        if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
            return Err(io::Error::last_os_error());
        }
        for fd in fds {
            // SAFETY: `fd` was just returned by pipe().
            if unsafe { libc::fcntl(fd, libc::F_SETFD, libc::FD_CLOEXEC) } == -1 {
                let err = io::Error::last_os_error();
                // SAFETY: both descriptors are ours and not wrapped yet.
                unsafe {
                    libc::close(fds[0]);
                    libc::close(fds[1]);
                }
                return Err(err);
            }
        }
        Ok(fds)
    }

    fn pipe() -> io::Result<(File, File)> {
        let fds = pipe_fds()?;
        // SAFETY: both descriptors are fresh and owned by nothing else.
        let ends = unsafe { (File::from_raw_fd(fds[0]), File::from_raw_fd(fds[1])) };
        Ok(ends)
    }

    /// Fork, run `work` in the child, and wait up to `limit` for its frame.
    ///
    /// The child never returns from this function: it writes the frame `work`
    /// produced and calls `_exit`. A child still running at `limit` gets
    /// `SIGKILL`. Either way the child is reaped before returning.
    pub(crate) fn spawn_and_wait<W>(work: W, limit: Duration) -> Result<Waited, IsolationError>
    where
        W: FnOnce() -> Vec<u8>,
    {
        let (mut reader, writer) = pipe().map_err(IsolationError::Pipe)?;

        // SAFETY: the child only runs `work`, writes to its pipe end and
        // `_exit`s; it never unwinds back into the parent's stack frames.
        let pid = unsafe { libc::fork() };
        if pid < 0 {
            return Err(IsolationError::Fork(io::Error::last_os_error()));
        }
        if pid == 0 {
            drop(reader);
            child_main(work, writer);
        }
        drop(writer);
        tracing::debug!(pid, "spawned isolated poll worker");

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(wire::read_frame(&mut reader));
        });

        match rx.recv_timeout(limit) {
            Ok(Ok(body)) => {
                reap(pid);
                Ok(Waited::Reported(body))
            }
            Ok(Err(_)) | Err(RecvTimeoutError::Disconnected) => {
                let status = reap(pid);
                Err(IsolationError::WorkerDied { status })
            }
            Err(RecvTimeoutError::Timeout) => {
                // SAFETY: `pid` is our own unreaped child.
                unsafe {
                    libc::kill(pid, libc::SIGKILL);
                }
                let status = reap(pid);
                tracing::debug!(pid, %status, "isolated poll worker killed");
                Ok(Waited::Killed)
            }
        }
    }

    fn child_main<W>(work: W, mut writer: File) -> !
    where
        W: FnOnce() -> Vec<u8>,
    {
        let code = match panic::catch_unwind(AssertUnwindSafe(work)) {
            Ok(frame) => match writer.write_all(&frame).and_then(|()| writer.flush()) {
                Ok(()) => 0,
                Err(_) => 2,
            },
            Err(_) => 101,
        };
        // SAFETY: `_exit` ends the child without running the parent's
        // atexit handlers or destructors.
        unsafe { libc::_exit(code) }
    }

    /// Wait for the child and describe how it ended.
    fn reap(pid: libc::pid_t) -> String {
        let mut status: libc::c_int = 0;
        loop {
            // SAFETY: `pid` is our child and `status` is a valid out pointer.
            let r = unsafe { libc::waitpid(pid, &mut status, 0) };
            if r == -1 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return format!("waitpid failed: {}", err);
            }
            break;
        }
        if libc::WIFEXITED(status) {
            format!("exit code {}", libc::WEXITSTATUS(status))
        } else if libc::WIFSIGNALED(status) {
            format!("killed by signal {}", libc::WTERMSIG(status))
        } else {
            format!("wait status {}", status)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn pipe_ends_are_close_on_exec() {
            use std::os::unix::io::AsRawFd;

            let (reader, writer) = pipe().unwrap();
            for end in [&reader, &writer] {
                // SAFETY: the descriptor is owned by `end` and open.
                let flags = unsafe { libc::fcntl(end.as_raw_fd(), libc::F_GETFD) };
                assert!(flags != -1);
                assert_ne!(flags & libc::FD_CLOEXEC, 0);
            }
        }
    }
}
