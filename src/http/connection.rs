use anyhow::Context;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::http::handler::Handler;
use crate::http::parser::read_request;
use crate::http::writer::{ResponseWriter, WriterState};

/// A single accepted connection: one request in, one response out.
///
/// The stream is owned by the connection and dropped when [`run`](Self::run)
/// returns, so the socket is closed on every exit path.
pub struct Connection<S> {
    stream: S,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Reads the request, hands it to `handler`, then shuts the stream down.
    ///
    /// A request that fails to parse is logged as a warning and dropped
    /// without any response; only handler and transport failures are
    /// returned as errors.
    pub async fn run<H: Handler>(mut self, handler: &H) -> anyhow::Result<()> {
        let request = match read_request(&mut self.stream).await {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse request");
                return self
                    .stream
                    .shutdown()
                    .await
                    .context("failed to shut down connection");
            }
        };

        tracing::debug!(
            method = %request.method(),
            target = %request.target(),
            body_len = request.body.len(),
            "Request parsed"
        );

        let mut writer = ResponseWriter::new(&mut self.stream);
        let handled = handler.handle(&mut writer, &request).await;

        match writer.state() {
            WriterState::Body | WriterState::Done => {}
            state => tracing::debug!(?state, "Handler left response incomplete"),
        }

        let closed = self.stream.shutdown().await;
        handled.context("handler failed")?;
        closed.context("failed to shut down connection")?;
        Ok(())
    }
}
