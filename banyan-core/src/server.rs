// HTTP/1 server driving a single request handler

use crate::{Error, HttpRequest, HttpResponse};
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming as IncomingBody;
use hyper::header::{HeaderName, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Handles every request the server accepts.
#[async_trait]
pub trait RequestHandler: Send + Sync + 'static {
    async fn handle(&self, req: HttpRequest) -> Result<HttpResponse, Error>;
}

/// Largest request body read by default.
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// HTTP server bound to one address and one handler.
pub struct Server<H> {
    addr: SocketAddr,
    handler: Arc<H>,
    body_limit: usize,
}

impl<H: RequestHandler> Server<H> {
    pub fn new(addr: SocketAddr, handler: H) -> Self {
        Self {
            addr,
            handler: Arc::new(handler),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Reject request bodies larger than `bytes` with 413 while they stream in.
    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serve until Ctrl-C is received.
    pub async fn listen(self) -> Result<(), Error> {
        self.serve_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!(error = %err, "Failed to listen for shutdown signal");
            }
        })
        .await
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    pub async fn serve_until<F>(self, shutdown: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve_listener(listener, shutdown).await
    }

    /// Serve connections from an already bound listener until `shutdown` resolves.
    ///
    /// In-flight connections keep running on their own tasks after shutdown.
    pub async fn serve_listener<F>(self, listener: TcpListener, shutdown: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, "Server listening");

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(err) => {
                            warn!(error = %err, "Failed to accept connection");
                            continue;
                        }
                    };

                    let io = TokioIo::new(stream);
                    let handler = self.handler.clone();
                    let body_limit = self.body_limit;

                    tokio::spawn(async move {
                        let service = service_fn(move |req: Request<IncomingBody>| {
                            let handler = handler.clone();
                            async move { handle_request(req, handler, body_limit).await }
                        });

                        if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                            debug!(peer = %peer, error = %err, "Error serving connection");
                        }
                    });
                }
                _ = &mut shutdown => {
                    info!("Shutdown signal received, stopping server");
                    return Ok(());
                }
            }
        }
    }
}

/// Handle an incoming HTTP request
async fn handle_request<H: RequestHandler>(
    req: Request<IncomingBody>,
    handler: Arc<H>,
    body_limit: usize,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let response = match into_http_request(req, body_limit).await {
        Ok(request) => {
            let method = request.method.clone();
            let path = request.path.clone();

            match handler.handle(request).await {
                Ok(resp) => resp,
                Err(err) => {
                    if err.is_client_error() {
                        debug!(method = %method, path = %path, error = %err, "Request rejected");
                    } else {
                        error!(method = %method, path = %path, error = %err, "Request failed");
                    }
                    err.into_response()
                }
            }
        }
        Err(err) => {
            debug!(error = %err, "Failed to read request");
            err.into_response()
        }
    };

    Ok(into_hyper_response(response))
}

async fn into_http_request(
    req: Request<IncomingBody>,
    body_limit: usize,
) -> Result<HttpRequest, Error> {
    let (parts, body) = req.into_parts();

    let mut request = HttpRequest::new(parts.method.to_string(), parts.uri.path());
    request.query_params = parse_query(parts.uri.query());

    for (name, value) in &parts.headers {
        if let Ok(value_str) = value.to_str() {
            request
                .headers
                .insert(name.to_string(), value_str.to_string());
        }
    }

    request.body = Limited::new(body, body_limit)
        .collect()
        .await
        .map_err(|err| body_error(err, body_limit))?
        .to_bytes()
        .to_vec();

    Ok(request)
}

fn body_error(err: Box<dyn std::error::Error + Send + Sync>, limit: usize) -> Error {
    if err.is::<LengthLimitError>() {
        return Error::PayloadTooLarge(format!("request body exceeds {} bytes", limit));
    }
    match err.downcast::<hyper::Error>() {
        Ok(err) => Error::Hyper(*err),
        Err(err) => Error::Internal(err.to_string()),
    }
}

fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    query
        .and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
        .map(|pairs| pairs.into_iter().collect())
        .unwrap_or_default()
}

fn into_hyper_response(response: HttpResponse) -> Response<Full<Bytes>> {
    let mut out = Response::new(Full::new(Bytes::from(response.body)));
    *out.status_mut() =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    for (key, value) in response.headers {
        match (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                out.headers_mut().insert(name, value);
            }
            _ => warn!(header = %key, "Dropping response header with invalid name or value"),
        }
    }

    out
}
