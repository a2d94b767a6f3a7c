//! wirehttp - HTTP/1.1 over raw byte streams
//!
//! A streaming request parser, a stateful response writer with chunked
//! bodies and trailers, and a server that runs one handler call per
//! connection.

pub mod config;
pub mod demo;
pub mod http;
pub mod server;
