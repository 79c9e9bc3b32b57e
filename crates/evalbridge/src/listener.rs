//! TCP listener backing the debugger session.
//!
//! The listener owns a small tokio runtime so that the blocking bridge API can
//! start and stop it without the caller running an executor. Connections are
//! accepted and held open; no debugger protocol is spoken over them.

use std::{
    io,
    net::SocketAddr,
    sync::mpsc::{self, Receiver},
    time::Duration,
};

use tokio::{
    io::AsyncReadExt,
    net::{TcpListener, TcpSocket, TcpStream},
    runtime::{Builder, Runtime},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// How long [`DebugListener::stop`] waits for the accept loop to exit.
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle for a running debug listener.
///
/// Nothing here blocks on the listener's runtime, so the handle can be
/// created, stopped and dropped from plain threads and from inside other
/// tokio runtimes alike.
pub(crate) struct DebugListener {
    /// Runtime driving the accept loop. Taken on drop.
    runtime: Option<Runtime>,
    /// Disconnects once the accept loop has exited and closed its socket.
    stopped: Option<Receiver<()>>,
    /// Token used to signal shutdown to the accept loop and open sessions.
    shutdown_token: CancellationToken,
    /// The actual bound address.
    pub(crate) bound_addr: SocketAddr,
}

impl DebugListener {
    /// Bind `addr` and start accepting connections in the background.
    pub(crate) fn bind(addr: SocketAddr) -> io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("evalbridge-debugger")
            .enable_io()
            .build()?;

        let (listener, bound_addr) = match listen(&runtime, addr) {
            Ok(bound) => bound,
            Err(e) => {
                runtime.shutdown_background();
                return Err(e);
            }
        };
        info!("Debug server listening on {}", bound_addr);

        let shutdown_token = CancellationToken::new();
        let shutdown_token_loop = shutdown_token.clone();
        let (stopped_tx, stopped) = mpsc::channel();

        runtime.spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_token_loop.cancelled() => {
                        info!("Debug server shutting down");
                        break;
                    }
                    result = listener.accept() => {
                        match result {
                            Ok((stream, peer_addr)) => {
                                info!("Debugger attached from {}", peer_addr);
                                tokio::spawn(hold_session(
                                    stream,
                                    peer_addr,
                                    shutdown_token_loop.clone(),
                                ));
                            }
                            Err(e) => {
                                error!("Failed to accept debugger connection: {}", e);
                            }
                        }
                    }
                }
            }
            drop(listener);
            drop(stopped_tx);
        });

        Ok(Self {
            runtime: Some(runtime),
            stopped: Some(stopped),
            shutdown_token,
            bound_addr,
        })
    }

    /// Stop accepting connections, close open sessions, and wait for the
    /// accept loop to release the port.
    pub(crate) fn stop(mut self) {
        self.shutdown_token.cancel();
        if let Some(stopped) = self.stopped.take() {
            if let Err(mpsc::RecvTimeoutError::Timeout) = stopped.recv_timeout(STOP_TIMEOUT) {
                warn!("Debug accept loop did not exit within {:?}", STOP_TIMEOUT);
            }
        }
    }
}

impl Drop for DebugListener {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// Bind a listening socket registered with `runtime`'s reactor.
fn listen(runtime: &Runtime, addr: SocketAddr) -> io::Result<(TcpListener, SocketAddr)> {
    let _guard = runtime.enter();
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    #[cfg(unix)]
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    let listener = socket.listen(1024)?;
    let bound_addr = listener.local_addr()?;
    Ok((listener, bound_addr))
}

/// Keep a debugger connection open, discarding input, until the peer goes
/// away or the listener shuts down.
async fn hold_session(mut stream: TcpStream, peer_addr: SocketAddr, shutdown: CancellationToken) {
    let mut buf = [0u8; 4096];
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            read = stream.read(&mut buf) => match read {
                Ok(0) => break,
                Ok(n) => debug!("Discarded {} bytes from debugger {}", n, peer_addr),
                Err(e) => {
                    debug!("Debugger connection from {} failed: {}", peer_addr, e);
                    break;
                }
            },
        }
    }
    info!("Debugger from {} detached", peer_addr);
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, TcpStream as StdTcpStream};

    use super::*;

    fn loopback(port: u16) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, port))
    }

    #[test]
    fn accepts_connections_until_stopped() {
        let listener = DebugListener::bind(loopback(0)).unwrap();
        let addr = listener.bound_addr;
        assert_ne!(addr.port(), 0);

        StdTcpStream::connect(addr).unwrap();

        listener.stop();
        assert!(StdTcpStream::connect(addr).is_err());
    }

    #[test]
    fn bind_fails_on_taken_port() {
        let taken = std::net::TcpListener::bind(loopback(0)).unwrap();
        let addr = taken.local_addr().unwrap();
        assert!(DebugListener::bind(addr).is_err());
    }

    #[tokio::test]
    async fn runs_inside_another_async_runtime() {
        let listener = DebugListener::bind(loopback(0)).unwrap();
        let addr = listener.bound_addr;
        tokio::net::TcpStream::connect(addr).await.unwrap();
        listener.stop();
        assert!(tokio::net::TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn failed_bind_inside_async_runtime_does_not_panic() {
        let taken = std::net::TcpListener::bind(loopback(0)).unwrap();
        let addr = taken.local_addr().unwrap();
        assert!(DebugListener::bind(addr).is_err());
    }

    #[tokio::test]
    async fn drop_inside_async_runtime_does_not_panic() {
        let listener = DebugListener::bind(loopback(0)).unwrap();
        drop(listener);
    }
}
