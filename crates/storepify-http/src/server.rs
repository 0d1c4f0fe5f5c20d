//! HTTP/1 server on hyper with graceful shutdown

use crate::{Handler, Request, respond};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

/// Broadcasts a shutdown signal to the accept loop and open connections
#[derive(Clone)]
pub struct ShutdownCoordinator {
	sender: broadcast::Sender<()>,
	grace_period: Duration,
}

impl ShutdownCoordinator {
	/// Create a coordinator; connections get `grace_period` to finish
	pub fn new(grace_period: Duration) -> Self {
		let (sender, _) = broadcast::channel(1);
		Self {
			sender,
			grace_period,
		}
	}

	pub fn subscribe(&self) -> broadcast::Receiver<()> {
		self.sender.subscribe()
	}

	/// Signal shutdown to every subscriber
	pub fn shutdown(&self) {
		let _ = self.sender.send(());
	}

	/// Trigger shutdown on Ctrl-C
	pub fn shutdown_on_ctrl_c(&self) {
		let coordinator = self.clone();
		tokio::spawn(async move {
			if tokio::signal::ctrl_c().await.is_ok() {
				tracing::info!("shutdown signal received");
				coordinator.shutdown();
			}
		});
	}
}

/// Serves a [`Handler`] over HTTP/1
pub struct HttpServer {
	handler: Arc<dyn Handler>,
}

impl HttpServer {
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self { handler }
	}

	/// Accept connections on `addr` until `coordinator` signals shutdown
	pub async fn listen_with_shutdown(
		self,
		addr: SocketAddr,
		coordinator: ShutdownCoordinator,
	) -> std::io::Result<()> {
		let listener = TcpListener::bind(addr).await?;
		tracing::info!(%addr, "server listening");

		let mut shutdown_rx = coordinator.subscribe();
		let mut connections = tokio::task::JoinSet::new();

		loop {
			tokio::select! {
				accepted = listener.accept() => {
					let (stream, remote_addr) = match accepted {
						Ok(pair) => pair,
						Err(error) => {
							tracing::warn!(%error, "failed to accept connection");
							continue;
						}
					};
					let handler = self.handler.clone();
					let mut conn_shutdown = coordinator.subscribe();
					connections.spawn(async move {
						tokio::select! {
							result = Self::handle_connection(stream, remote_addr, handler) => {
								if let Err(error) = result {
									tracing::debug!(%remote_addr, %error, "connection closed with error");
								}
							}
							_ = conn_shutdown.recv() => {}
						}
					});
				}
				_ = shutdown_rx.recv() => {
					tracing::info!("stopping server");
					break;
				}
			}
		}

		let drain = async { while connections.join_next().await.is_some() {} };
		if tokio::time::timeout(coordinator.grace_period, drain)
			.await
			.is_err()
		{
			tracing::warn!("grace period elapsed with open connections");
			connections.abort_all();
		}
		Ok(())
	}

	async fn handle_connection(
		stream: TcpStream,
		remote_addr: SocketAddr,
		handler: Arc<dyn Handler>,
	) -> Result<(), hyper::Error> {
		let service = RequestService {
			handler,
			remote_addr,
		};
		http1::Builder::new()
			.serve_connection(TokioIo::new(stream), service)
			.await
	}
}

struct RequestService {
	handler: Arc<dyn Handler>,
	remote_addr: SocketAddr,
}

impl Service<hyper::Request<Incoming>> for RequestService {
	type Response = hyper::Response<Full<Bytes>>;
	type Error = Box<dyn std::error::Error + Send + Sync>;
	type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

	fn call(&self, req: hyper::Request<Incoming>) -> Self::Future {
		let handler = self.handler.clone();
		let remote_addr = self.remote_addr;

		Box::pin(async move {
			let (parts, body) = req.into_parts();
			let body = body.collect().await?.to_bytes();

			let mut request = Request::new(parts.method, parts.uri, parts.version, parts.headers, body);
			request.remote_addr = Some(remote_addr);

			let response = respond(handler.as_ref(), request).await;

			let mut builder = hyper::Response::builder().status(response.status);
			if let Some(headers) = builder.headers_mut() {
				headers.extend(response.headers);
			}
			Ok(builder.body(Full::new(response.body))?)
		})
	}
}
