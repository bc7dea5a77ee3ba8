//! Signal plumbing for orderly shutdown.
//!
//! `SIGINT`/`SIGTERM` handlers publish a flag and write one byte to a
//! self-pipe. The accept loop polls the pipe's read end alongside the
//! listener, so a signal unblocks it even when no connection ever
//! arrives (the raw `accept` syscall would otherwise be retried on
//! `EINTR` inside the standard library, never returning to our loop).
//! Worker threads block both signals so delivery always reaches the
//! main thread.

use std::io;
use std::os::unix::io::RawFd;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

static SHUTDOWN: AtomicBool = AtomicBool::new(false);
static WAKE_READ: AtomicI32 = AtomicI32::new(-1);
static WAKE_WRITE: AtomicI32 = AtomicI32::new(-1);

extern "C" fn request_shutdown(_sig: libc::c_int) {
    SHUTDOWN.store(true, Ordering::SeqCst);
    // Only async-signal-safe calls are allowed here; write(2) is one.
    let fd = WAKE_WRITE.load(Ordering::SeqCst);
    if fd >= 0 {
        let byte = [1u8];
        unsafe { libc::write(fd, byte.as_ptr().cast(), 1) };
    }
}

/// Has a shutdown signal been delivered?
pub fn shutdown_requested() -> bool {
    SHUTDOWN.load(Ordering::SeqCst)
}

/// Create the wake pipe and install the `SIGINT`/`SIGTERM` handlers.
/// Idempotent.
pub fn install_shutdown_handlers() -> io::Result<()> {
    if WAKE_READ.load(Ordering::SeqCst) < 0 {
        let mut fds = [0 as libc::c_int; 2];
        if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
            return Err(io::Error::last_os_error());
        }
        // The read end must not block once the pending bytes are drained.
        unsafe { libc::fcntl(fds[0], libc::F_SETFL, libc::O_NONBLOCK) };
        WAKE_READ.store(fds[0], Ordering::SeqCst);
        WAKE_WRITE.store(fds[1], Ordering::SeqCst);
    }
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = request_shutdown as libc::sighandler_t;
        libc::sigemptyset(&mut action.sa_mask);
        action.sa_flags = 0;
        for sig in [libc::SIGINT, libc::SIGTERM] {
            if libc::sigaction(sig, &action, std::ptr::null_mut()) != 0 {
                return Err(io::Error::last_os_error());
            }
        }
    }
    Ok(())
}

/// Read end of the wake pipe, polled by the accept loop next to the
/// listener. -1 when the handlers were never installed (a negative fd is
/// ignored by `poll`).
pub fn wake_fd() -> RawFd {
    WAKE_READ.load(Ordering::SeqCst)
}

/// Unblock the accept loop without a signal (used by `Server::shutdown`).
pub fn wake_accept_loop() {
    let fd = WAKE_WRITE.load(Ordering::SeqCst);
    if fd >= 0 {
        let byte = [1u8];
        unsafe { libc::write(fd, byte.as_ptr().cast(), 1) };
    }
}

/// Consume pending wake bytes so the pipe does not stay readable forever.
pub fn drain_wake_pipe() {
    let fd = WAKE_READ.load(Ordering::SeqCst);
    if fd >= 0 {
        let mut buf = [0u8; 64];
        while unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) } > 0 {}
    }
}

/// Block the shutdown signals on the calling (worker) thread.
pub fn mask_shutdown_signals() {
    unsafe {
        let mut set: libc::sigset_t = std::mem::zeroed();
        libc::sigemptyset(&mut set);
        libc::sigaddset(&mut set, libc::SIGINT);
        libc::sigaddset(&mut set, libc::SIGTERM);
        libc::pthread_sigmask(libc::SIG_BLOCK, &set, std::ptr::null_mut());
    }
}
