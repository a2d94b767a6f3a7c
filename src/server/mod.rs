//! Connection-accepting server.
//!
//! [`Server::serve`] binds a TCP port and returns at once; accepting happens
//! on a dedicated task, and every accepted connection is handled on its own
//! task. Connections share nothing except the server's closed flag.

pub mod listener;

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::http::handler::Handler;
use listener::Listener;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("accept loop terminated abnormally: {0}")]
    AcceptLoop(#[from] tokio::task::JoinError),
}

/// State shared between the server handle and its accept loop.
pub(crate) struct Shared {
    pub(crate) closed: AtomicBool,
    pub(crate) shutdown: Notify,
}

/// Handle to a running server.
///
/// Closing stops new connections from being accepted; connections already
/// being handled run to completion.
pub struct Server {
    shared: Arc<Shared>,
    local_addr: Option<SocketAddr>,
    accept_task: Mutex<Option<JoinHandle<()>>>,
}

impl Server {
    /// Binds `0.0.0.0:port` and starts accepting connections in the background.
    ///
    /// Port `0` picks a free port; see [`local_addr`](Self::local_addr).
    pub async fn serve<H: Handler>(port: u16, handler: H) -> Result<Server, ServerError> {
        let listener = TcpListener::bind(("0.0.0.0", port))
            .await
            .map_err(|source| ServerError::Bind { port, source })?;
        let local_addr = listener.local_addr().ok();

        tracing::info!("Listening on {}", local_addr.map_or_else(|| port.to_string(), |a| a.to_string()));

        let mut server = Self::start(listener, handler);
        server.local_addr = local_addr;
        Ok(server)
    }

    /// Starts the accept loop over an already-bound listener.
    pub fn start<L, H>(listener: L, handler: H) -> Server
    where
        L: Listener,
        H: Handler,
    {
        let shared = Arc::new(Shared {
            closed: AtomicBool::new(false),
            shutdown: Notify::new(),
        });

        let accept_task = tokio::spawn(listener::run(listener, Arc::new(handler), Arc::clone(&shared)));

        Server {
            shared,
            local_addr: None,
            accept_task: Mutex::new(Some(accept_task)),
        }
    }

    /// The bound address, when serving over TCP.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Stops accepting connections and waits for the listening socket to be
    /// released. Calling it again after the first close does nothing.
    pub async fn close(&self) -> Result<(), ServerError> {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!("Server already closed");
            return Ok(());
        }
        self.shared.shutdown.notify_one();

        let task = match self.accept_task.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(task) = task {
            task.await?;
        }

        tracing::info!("Server closed");
        Ok(())
    }
}
