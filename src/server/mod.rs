//! Server lifecycle: container opening, listener setup, signal-driven
//! shutdown and the accept loop.

pub mod service;
mod signals;

use std::io;
use std::net::TcpListener;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use log::{info, warn};

use crate::container::ImgfsFile;
use crate::error::{ImgfsError, Result};
use crate::http::net::handle_connection;

pub use service::{handle_http_message, ApiCall};

/// Port used when none is given on the command line (or 0 is).
pub const DEFAULT_LISTENING_PORT: u16 = 8000;

/// Everything a request handler needs, shared across worker threads.
///
/// The single coarse mutex is the concurrency design: every store
/// operation holds it for its whole critical section, so concurrent
/// requests observe a total order of mutations. The container becomes
/// `None` once [`Server::shutdown`] has closed it; a request arriving
/// after that is answered with an error reply.
pub struct ServerState {
    pub fs: Mutex<Option<ImgfsFile>>,
    pub port: u16,
}

/// A running imgFS server: shared state plus the listening socket.
pub struct Server {
    state: Arc<ServerState>,
    listener: Mutex<Option<TcpListener>>,
    stop: AtomicBool,
}

impl Server {
    /// Open the container read-write, print its header, bind the listener
    /// and install the shutdown signal handlers.
    pub fn startup<P: AsRef<Path>>(imgfs_path: P, port: Option<u16>) -> Result<Server> {
        let fs = ImgfsFile::open(imgfs_path, true)?;
        println!("{}", fs.header);

        let port = match port {
            None | Some(0) => DEFAULT_LISTENING_PORT,
            Some(p) => p,
        };
        let listener = TcpListener::bind(("127.0.0.1", port))?;
        // Accepts must never block: the loop only calls accept after poll
        // reported the listener readable, and a wake byte has to get it
        // back to the shutdown check immediately.
        listener.set_nonblocking(true)?;
        signals::install_shutdown_handlers()?;

        info!("imgFS server started on http://localhost:{port}");
        Ok(Server {
            state: Arc::new(ServerState { fs: Mutex::new(Some(fs)), port }),
            listener: Mutex::new(Some(listener)),
            stop: AtomicBool::new(false),
        })
    }

    /// Accept connections until a shutdown signal arrives or
    /// [`Server::shutdown`] is called.
    ///
    /// Each connection gets a detached worker thread that masks the
    /// shutdown signals, reads one request, dispatches it and closes the
    /// socket. A failing connection is logged and forgotten; only a hard
    /// `accept` failure ends the loop with an error.
    pub fn run(&self) -> Result<()> {
        loop {
            if signals::shutdown_requested() || self.stop.load(Ordering::SeqCst) {
                break;
            }
            let guard = self.listener.lock().map_err(|_| ImgfsError::Runtime)?;
            let Some(listener) = guard.as_ref() else { break };

            if !wait_for_connection(listener)? {
                // Woken by a signal or a wake byte; re-check the flags.
                continue;
            }
            match listener.accept() {
                Ok((stream, peer)) => {
                    // Accepted sockets must go back to blocking mode; the
                    // worker reads and writes synchronously.
                    let _ = stream.set_nonblocking(false);
                    let state = Arc::clone(&self.state);
                    thread::spawn(move || {
                        signals::mask_shutdown_signals();
                        let outcome = handle_connection(stream, |message, out| {
                            handle_http_message(&state, message, out)
                        });
                        if let Err(e) = outcome {
                            warn!("connection from {peer} failed: {e}");
                        }
                    });
                }
                Err(e) if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
                {
                    continue;
                }
                Err(e) => {
                    warn!("accept failed: {e}");
                    return Err(e.into());
                }
            }
        }
        self.shutdown();
        Ok(())
    }

    /// Close the listener and the container.
    ///
    /// Safe to call any number of times: later calls find both already
    /// released. Also unblocks a concurrently running accept loop, so a
    /// caller on another thread can use this to stop [`Server::run`].
    pub fn shutdown(&self) {
        if !self.stop.swap(true, Ordering::SeqCst) {
            info!("shutting down");
        }
        signals::wake_accept_loop();
        if let Ok(mut guard) = self.listener.lock() {
            guard.take();
        }
        if let Ok(mut guard) = self.state.fs.lock() {
            guard.take();
        }
    }

    /// Port the listener is bound to.
    pub fn port(&self) -> u16 {
        self.state.port
    }
}

/// Block until the listener has a pending connection or the wake pipe
/// fires. Returns whether the listener is readable.
fn wait_for_connection(listener: &TcpListener) -> Result<bool> {
    let mut fds = [
        libc::pollfd { fd: listener.as_raw_fd(), events: libc::POLLIN, revents: 0 },
        libc::pollfd { fd: signals::wake_fd(), events: libc::POLLIN, revents: 0 },
    ];
    let rc = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, -1) };
    if rc < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            // A signal landed mid-poll; the caller re-checks the flags.
            return Ok(false);
        }
        return Err(err.into());
    }
    if fds[1].revents != 0 {
        signals::drain_wake_pipe();
    }
    Ok((fds[0].revents & libc::POLLIN) != 0)
}
