//! Demonstration handler used by the `wirehttp` binary.
//!
//! Routes:
//! - `/yourproblem` → 400 with an HTML page
//! - `/myproblem` → 500 with an HTML page
//! - `/httpbin/<path>` → `<upstream>/<path>`, streamed back chunked with
//!   `x-content-sha256` and `x-content-length` trailers
//! - anything else → 200 with an HTML page

pub mod upstream;

use anyhow::Result;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tokio::io::AsyncWrite;

use crate::http::handler::Handler;
use crate::http::headers::Headers;
use crate::http::request::Request;
use crate::http::response::{StatusCode, default_headers};
use crate::http::writer::ResponseWriter;
use upstream::Upstream;

const PROXY_PREFIX: &str = "/httpbin/";

const BAD_REQUEST_PAGE: &str = "<html>
  <head>
    <title>400 Bad Request</title>
  </head>
  <body>
    <h1>Bad Request</h1>
    <p>Your request honestly kinda sucked.</p>
  </body>
</html>
";

const SERVER_ERROR_PAGE: &str = "<html>
  <head>
    <title>500 Internal Server Error</title>
  </head>
  <body>
    <h1>Internal Server Error</h1>
    <p>Okay, you know what? This one is on me.</p>
  </body>
</html>
";

const OK_PAGE: &str = "<html>
  <head>
    <title>200 OK</title>
  </head>
  <body>
    <h1>Success!</h1>
    <p>Your request was an absolute banger.</p>
  </body>
</html>
";

pub struct DemoHandler {
    upstream: Upstream,
}

impl DemoHandler {
    pub fn new(upstream_base: &str) -> Result<Self> {
        Ok(Self {
            upstream: Upstream::new(upstream_base, Duration::from_secs(5))?,
        })
    }

    /// Streams an upstream response back as a chunked body.
    async fn proxy<W>(&self, w: &mut ResponseWriter<W>, path: &str) -> Result<()>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let mut resp = match self.upstream.fetch(path).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(%path, error = %e, "Upstream request failed");
                return write_page(w, StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_PAGE).await;
            }
        };

        w.write_status_line(resp.status).await?;

        let mut headers = Headers::new();
        for (key, value) in &resp.headers {
            if matches!(key, "content-length" | "transfer-encoding" | "connection") {
                continue;
            }
            headers.add(key, value)?;
        }
        headers.add("Transfer-Encoding", "chunked")?;
        headers.add("Trailer", "X-Content-SHA256, X-Content-Length")?;
        headers.override_value("connection", "close");
        w.write_headers(&headers).await?;

        let mut sha256 = Sha256::new();
        let mut total = 0;
        while let Some(chunk) = resp.next_chunk().await? {
            sha256.update(&chunk);
            total += w.write_chunked_body(&chunk).await?;
        }
        w.write_chunked_body_done().await?;

        let mut trailers = Headers::new();
        trailers.add("X-Content-SHA256", &format!("{:x}", sha256.finalize()))?;
        trailers.add("X-Content-Length", &total.to_string())?;
        w.write_trailers(&trailers).await?;

        tracing::debug!(%path, status = resp.status.as_u16(), bytes = total, "Proxied upstream response");
        Ok(())
    }
}

impl Handler for DemoHandler {
    async fn handle<W>(&self, w: &mut ResponseWriter<W>, req: &Request) -> Result<()>
    where
        W: AsyncWrite + Unpin + Send,
    {
        if let Some(path) = req.target().strip_prefix(PROXY_PREFIX) {
            return self.proxy(w, path).await;
        }

        match req.target() {
            "/yourproblem" => write_page(w, StatusCode::BAD_REQUEST, BAD_REQUEST_PAGE).await,
            "/myproblem" => write_page(w, StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_PAGE).await,
            _ => write_page(w, StatusCode::OK, OK_PAGE).await,
        }
    }
}

async fn write_page<W>(w: &mut ResponseWriter<W>, status: StatusCode, page: &str) -> Result<()>
where
    W: AsyncWrite + Unpin + Send,
{
    let mut headers = default_headers(page.len());
    headers.override_value("Content-Type", "text/html");

    w.write_status_line(status).await?;
    w.write_headers(&headers).await?;
    w.write_body(page.as_bytes()).await?;
    Ok(())
}
