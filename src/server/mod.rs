//! Async TCP front door.
//!
//! Every accepted connection gets its own Tokio task, which reads requests off
//! the socket, hands them to the handler, and writes the responses back.
//! Connections are persistent until the peer closes them, asks for
//! `Connection: close`, or sits idle past [`IDLE_TIMEOUT`].

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::http::{
    StatusCode,
    request::{Request, RequestError},
    response::Response,
};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Largest request we buffer before answering 413. GET requests are tiny, so this is generous.
const MAX_REQUEST_SIZE: usize = 64 * 1024;

const INITIAL_BUF_SIZE: usize = 4096;

/// How long a keep-alive connection may sit without sending a byte.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// A bound listener that dispatches requests to a handler.
///
/// # Examples
///
/// ```rust,no_run
/// use reelgate::server::Server;
/// use reelgate::http::{Request, Response, StatusCode};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let server = Server::bind("127.0.0.1:8080").await?;
///     server.run(|_req: Request| async {
///         Response::new(StatusCode::Ok).body("pong")
///     }).await?;
///     Ok(())
/// }
/// ```
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Server {
    /// Binds to `addr`. Port `0` picks a free port; see [`local_addr`](Self::local_addr).
    ///
    /// # Errors
    ///
    /// [`ServerError::Bind`] if the address is taken or not permitted.
    pub async fn bind(addr: impl AsRef<str>) -> Result<Self, ServerError> {
        let addr = addr.as_ref();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_owned(),
                source,
            })?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts connections forever, one task per connection.
    ///
    /// Accept errors are logged and skipped; only a failure to read the
    /// listener's own address would surface here.
    pub async fn run<H, F>(self, handler: H) -> Result<(), ServerError>
    where
        H: Fn(Request) -> F + Send + Sync + 'static,
        F: Future<Output = Response> + Send + 'static,
    {
        let handler = Arc::new(handler);
        info!(address = %self.local_addr, "listening");

        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            debug!(%peer, "connection accepted");
            let handler = Arc::clone(&handler);

            tokio::spawn(async move {
                if let Err(e) = serve_connection(stream, peer, handler).await {
                    warn!(%peer, error = %e, "connection closed with error");
                }
            });
        }
    }
}

async fn serve_connection<H, F>(
    mut stream: TcpStream,
    peer: SocketAddr,
    handler: Arc<H>,
) -> Result<(), std::io::Error>
where
    H: Fn(Request) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    let mut buf = BytesMut::with_capacity(INITIAL_BUF_SIZE);

    loop {
        // Answer every complete request already buffered before touching the socket again.
        while !buf.is_empty() {
            let (request, body_offset) = match Request::parse(&buf) {
                Ok(pair) => pair,
                Err(RequestError::Incomplete) => break,
                Err(e) => {
                    warn!(%peer, error = %e, "malformed request");
                    let response =
                        Response::error(StatusCode::BadRequest, format!("bad request: {e}"))
                            .keep_alive(false);
                    stream.write_all(&response.into_bytes()).await?;
                    return Ok(());
                }
            };

            // Bodies are ignored, but they still have to be drained off the socket.
            let consumed = match request.content_length().unwrap_or(0) {
                len if len <= MAX_REQUEST_SIZE => body_offset + len,
                len => {
                    warn!(%peer, content_length = len, "declared body too large");
                    let response = Response::error(StatusCode::PayloadTooLarge, "request too large")
                        .keep_alive(false);
                    stream.write_all(&response.into_bytes()).await?;
                    return Ok(());
                }
            };
            if buf.len() < consumed {
                break;
            }

            let keep_alive = request.is_keep_alive();
            let response = handler(request).await.keep_alive(keep_alive);
            stream.write_all(&response.into_bytes()).await?;
            stream.flush().await?;

            let _ = buf.split_to(consumed);

            if !keep_alive {
                return Ok(());
            }
        }

        if buf.len() > MAX_REQUEST_SIZE {
            warn!(%peer, size = buf.len(), "request too large");
            let response =
                Response::error(StatusCode::PayloadTooLarge, "request too large").keep_alive(false);
            stream.write_all(&response.into_bytes()).await?;
            return Ok(());
        }

        let read = match tokio::time::timeout(IDLE_TIMEOUT, stream.read_buf(&mut buf)).await {
            Ok(read) => read?,
            Err(_) => {
                debug!(%peer, "idle timeout");
                return Ok(());
            }
        };
        if read == 0 {
            debug!(%peer, "connection closed by peer");
            return Ok(());
        }
    }
}
