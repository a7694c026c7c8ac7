//! HTTP ingress
//!
//! Binds a TCP listener and serves the route table over hyper's http1
//! connection driver. Each request runs inside an info span carrying a
//! fresh request id.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::Instrument;

use crate::{AppState, routes};

/// The statusdeck API server.
pub struct Server {
    listener: TcpListener,
    state: Arc<AppState>,
}

impl Server {
    /// Bind the listener. Use port 0 to let the OS pick (tests do).
    pub async fn bind(addr: &str, state: AppState) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            state: Arc::new(state),
        })
    }

    /// The address the listener actually bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until the task is dropped.
    pub async fn serve(self) -> std::io::Result<()> {
        let addr = self.listener.local_addr()?;
        tracing::info!("statusdeck API listening on http://{}", addr);

        loop {
            let (stream, _) = self.listener.accept().await?;
            let io = TokioIo::new(stream);
            let state = self.state.clone();

            tokio::task::spawn(async move {
                let service = service_fn(move |req: hyper::Request<Incoming>| {
                    let state = state.clone();
                    async move {
                        let request_id = uuid::Uuid::new_v4().to_string();
                        let span = tracing::info_span!(
                            "HTTPRequest",
                            statusdeck.http.method = %req.method(),
                            statusdeck.http.path = %req.uri().path(),
                            statusdeck.http.request_id = %request_id
                        );
                        let response = routes::dispatch(req, state).instrument(span).await;
                        Ok::<_, Infallible>(response)
                    }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    tracing::error!("Error serving connection: {:?}", err);
                }
            });
        }
    }
}
