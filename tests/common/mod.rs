#![allow(dead_code)]

use axum::{Router, extract::ConnectInfo};
use quota_shortener::api::routes::public_routes;
use quota_shortener::application::services::{LinkService, LinkSettings, QuotaPolicy, RateLimiter};
use quota_shortener::infrastructure::store::InMemoryStore;
use quota_shortener::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::Layer;

pub const DOMAIN: &str = "short.ly";

/// Peer address every request appears to come from.
pub const PEER: &str = "127.0.0.1:12345";

/// State backed by a fresh in-memory store and default tunables.
///
/// `behind_proxy` is enabled so tests can pick a client identity per request
/// through `X-Forwarded-For`.
pub fn create_test_state() -> AppState {
    create_test_state_with(QuotaPolicy::default(), LinkSettings::new(DOMAIN))
}

pub fn create_test_state_with(policy: QuotaPolicy, settings: LinkSettings) -> AppState {
    let store = Arc::new(InMemoryStore::new());
    let rate_limiter = Arc::new(RateLimiter::new(store.clone(), policy));
    let link_service = Arc::new(LinkService::new(store, rate_limiter, settings));

    AppState::new(link_service, true)
}

/// Full public router with a fake peer address.
pub fn create_test_app(state: AppState) -> Router {
    public_routes().layer(MockConnectInfoLayer).with_state(state)
}

#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = PEER.parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}
