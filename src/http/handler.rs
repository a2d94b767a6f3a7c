use std::future::Future;

use tokio::io::AsyncWrite;

use crate::http::request::Request;
use crate::http::writer::ResponseWriter;

/// Application code invoked once per connection with the parsed request.
///
/// The handler owns the whole response: it must drive the writer from the
/// status line through to the body (and trailers, for chunked bodies). An
/// error returned here is logged and the connection is closed; whatever was
/// already written stays written.
///
/// # Example
///
/// ```ignore
/// struct Hello;
///
/// impl Handler for Hello {
///     async fn handle<W>(&self, w: &mut ResponseWriter<W>, _req: &Request) -> anyhow::Result<()>
///     where
///         W: AsyncWrite + Unpin + Send,
///     {
///         let body = b"hello\n";
///         w.write_status_line(StatusCode::OK).await?;
///         w.write_headers(&default_headers(body.len())).await?;
///         w.write_body(body).await?;
///         Ok(())
///     }
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    fn handle<W>(
        &self,
        writer: &mut ResponseWriter<W>,
        request: &Request,
    ) -> impl Future<Output = anyhow::Result<()>> + Send
    where
        W: AsyncWrite + Unpin + Send;
}
