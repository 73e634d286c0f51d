//! HTTP server implementation.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio::signal;
use log::{info, warn, error};

use crate::parser::{parse_request, request_len};
use crate::server::config::ServerConfig;
use crate::server::engine::Engine;
use crate::server::error::Error;
use crate::server::response::{HttpResponse, StatusCode};

/// Serves an [`Engine`] over TCP.
///
/// Creating the server ends the registration phase: the engine is moved
/// behind an `Arc` and only read from then on.
pub struct HttpServer {
    /// The server configuration.
    pub config: ServerConfig,
    engine: Arc<Engine>,
}

impl HttpServer {
    pub fn new(config: ServerConfig, engine: Engine) -> Self {
        Self {
            config,
            engine: Arc::new(engine),
        }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    fn display_server_info(&self) {
        info!("Registered endpoints:");
        for (method, pattern) in self.engine.routes().routes() {
            info!("  {method:<7} {pattern}");
        }
    }

    async fn setup_listener(&self) -> Result<TcpListener, Error> {
        let listener = TcpListener::bind(&self.config.addr).await?;
        info!("Server listening on http://{addr}", addr = self.config.addr);
        Ok(listener)
    }

    /// Set up a Ctrl+C handler for graceful shutdown.
    fn setup_ctrl_c_handler(shutdown_tx: mpsc::Sender<()>, tasks: &mut JoinSet<()>) {
        tasks.spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl+C, initiating graceful shutdown");
                    let _ = shutdown_tx.send(()).await;
                }
                Err(e) => {
                    error!("Error setting up Ctrl+C handler: {e}");
                }
            }
        });
    }

    async fn handle_new_connection(
        mut socket: tokio::net::TcpStream,
        addr: SocketAddr,
        semaphore: Arc<Semaphore>,
        engine: Arc<Engine>,
        config: &ServerConfig,
        tasks: &mut JoinSet<()>,
    ) {
        let permit = match semaphore.try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!("Connection limit reached, rejecting connection from {addr}");
                let response = HttpResponse::new(StatusCode::ServiceUnavailable)
                    .with_content_type("text/plain")
                    .with_body_string("Server is at capacity, please try again later");
                let _ = socket.write_all(&response.to_bytes()).await;
                return;
            }
        };

        let read_buffer_size = config.read_buffer_size;
        let max_request_size = config.max_request_size;

        tasks.spawn(async move {
            let _permit = permit;

            if let Err(e) = Self::handle_connection(&mut socket, engine, read_buffer_size, max_request_size).await {
                warn!("Error handling connection from {addr}: {e}");
            }
        });
    }

    /// Returns `true` when the accept loop should stop.
    async fn handle_connection_error(e: std::io::Error) -> bool {
        error!("Error accepting connection: {e}");

        if e.kind() == std::io::ErrorKind::BrokenPipe {
            error!("Critical error accepting connection, shutting down");
            return true;
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
        false
    }

    async fn perform_shutdown(tasks: &mut JoinSet<()>, timeout: Duration) {
        info!("Waiting for {len} active connections to complete...", len = tasks.len());
        let drained = tokio::time::timeout(timeout, async {
            while let Some(res) = tasks.join_next().await {
                if let Err(e) = res {
                    error!("Task failed during shutdown: {e}");
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!("Shutdown timed out after {timeout:?}, aborting {len} connections", len = tasks.len());
            tasks.abort_all();
        }
        info!("Server shutdown complete");
    }

    /// Start the server and listen for incoming connections until Ctrl+C.
    pub async fn start(&self) -> Result<(), Error> {
        self.display_server_info();
        let listener = self.setup_listener().await?;

        let semaphore = Arc::new(Semaphore::new(self.config.max_connections));
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let mut tasks = JoinSet::new();

        Self::setup_ctrl_c_handler(shutdown_tx, &mut tasks);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Shutting down server...");
                    break;
                }

                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((socket, addr)) => {
                            Self::handle_new_connection(
                                socket,
                                addr,
                                semaphore.clone(),
                                self.engine.clone(),
                                &self.config,
                                &mut tasks
                            ).await;
                        },
                        Err(e) => {
                            if Self::handle_connection_error(e).await {
                                break;
                            }
                        }
                    }
                }
            }
        }

        Self::perform_shutdown(&mut tasks, self.config.shutdown_timeout).await;

        Ok(())
    }

    /// Read bytes until a whole request is buffered.
    ///
    /// Returns `None` if the peer closed the connection before sending anything.
    async fn read_request(
        socket: &mut (impl AsyncRead + Unpin),
        read_buffer_size: usize,
        max_request_size: usize,
    ) -> Result<Option<Vec<u8>>, Error> {
        let mut buf = Vec::new();
        let mut chunk = vec![0; read_buffer_size.max(1)];

        loop {
            let n = socket.read(&mut chunk).await?;
            if n == 0 {
                return Ok((!buf.is_empty()).then_some(buf));
            }
            buf.extend_from_slice(&chunk[..n]);

            match request_len(&buf) {
                Ok(Some(len)) if len > max_request_size => return Err(Error::RequestTooLarge(max_request_size)),
                Ok(Some(len)) if buf.len() >= len => return Ok(Some(buf)),
                // let the parser report a malformed head
                Err(_) => return Ok(Some(buf)),
                Ok(_) if buf.len() > max_request_size => return Err(Error::RequestTooLarge(max_request_size)),
                Ok(_) => {}
            }
        }
    }

    /// Handle a single connection: read one request, dispatch it, write the
    /// response.
    ///
    /// The engine runs on the blocking pool. If a handler panics and no
    /// [`recovery`](crate::recovery) middleware catches it, the connection is
    /// closed without a response and [`Error::HandlerPanicked`] is returned.
    pub async fn handle_connection(
        socket: &mut (impl AsyncRead + AsyncWrite + Unpin),
        engine: Arc<Engine>,
        read_buffer_size: usize,
        max_request_size: usize,
    ) -> Result<(), Error> {
        let bytes = match Self::read_request(socket, read_buffer_size, max_request_size).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Ok(()),
            Err(Error::RequestTooLarge(limit)) => {
                let response = HttpResponse::new(StatusCode::PayloadTooLarge)
                    .with_content_type("text/plain")
                    .with_body_string(format!("Request exceeds {limit} bytes"));
                socket.write_all(&response.to_bytes()).await?;
                return Err(Error::RequestTooLarge(limit));
            }
            Err(e) => return Err(e),
        };

        let request = match parse_request(&bytes) {
            Ok(req) => req,
            Err(e) => {
                let response = HttpResponse::new(StatusCode::BadRequest)
                    .with_content_type("text/plain")
                    .with_body_string(format!("Error parsing request: {e}"));
                socket.write_all(&response.to_bytes()).await?;
                return Err(Error::ParseError(e));
            }
        };

        let target = format!("{} {}", request.method, request.request_uri());
        let response = match tokio::task::spawn_blocking(move || engine.dispatch(request)).await {
            Ok(response) => response,
            Err(e) if e.is_panic() => {
                error!("Handler panicked while serving {target}, closing connection");
                return Err(Error::HandlerPanicked(target));
            }
            Err(e) => return Err(Error::InternalError(e.to_string())),
        };

        let response = response.with_header("Connection", "close");
        socket.write_all(&response.to_bytes()).await?;
        socket.flush().await?;

        Ok(())
    }
}
