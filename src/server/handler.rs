// src/server/handler.rs
use hyper::{Body, Request, Response};
use std::sync::Arc;
use tower::Service;

use crate::node::ChainNode;

#[derive(Clone)]
pub struct RequestHandler {
    node: Arc<ChainNode>,
}

impl RequestHandler {
    pub fn new(node: Arc<ChainNode>) -> Self {
        Self { node }
    }
}

impl Service<Request<Body>> for RequestHandler {
    type Response = Response<Body>;
    type Error = Box<dyn std::error::Error + Send + Sync>;
    type Future = futures::future::BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let node = self.node.clone();
        Box::pin(async move {
            // Lookup failures are answered, never dropped with the connection.
            let response = node.handle(req).await.unwrap_or_else(|e| {
                tracing::warn!(%e, status = %e.status(), "lookup failed");
                Response::from(e)
            });
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(response)
        })
    }
}
