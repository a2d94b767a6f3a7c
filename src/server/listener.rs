use std::fmt;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};

use crate::http::connection::Connection;
use crate::http::handler::Handler;
use crate::server::Shared;

/// A source of incoming connections.
pub trait Listener: Send + 'static {
    type Io: AsyncRead + AsyncWrite + Unpin + Send + 'static;
    type Addr: fmt::Display + Send + 'static;

    fn accept(&mut self) -> impl Future<Output = io::Result<(Self::Io, Self::Addr)>> + Send;
}

impl Listener for TcpListener {
    type Io = TcpStream;
    type Addr = SocketAddr;

    async fn accept(&mut self) -> io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self).await
    }
}

/// Accepts connections until the server is closed, spawning one task per
/// connection. The listener is dropped, and its socket closed, on return.
pub(crate) async fn run<L, H>(mut listener: L, handler: Arc<H>, shared: Arc<Shared>)
where
    L: Listener,
    H: Handler,
{
    loop {
        let accepted = tokio::select! {
            biased;
            _ = shared.shutdown.notified() => break,
            res = listener.accept() => res,
        };

        let (io, peer) = match accepted {
            Ok(conn) => conn,
            Err(e) => {
                if shared.closed.load(Ordering::Acquire) {
                    break;
                }
                tracing::warn!(error = %e, "Failed to accept connection");
                continue;
            }
        };

        tracing::debug!(%peer, "Accepted connection");

        let handler = Arc::clone(&handler);
        tokio::spawn(async move {
            if let Err(e) = Connection::new(io).run(handler.as_ref()).await {
                tracing::error!("Connection error from {}: {:#}", peer, e);
            }
            tracing::debug!(%peer, "Connection closed");
        });
    }
}
