//! The `pingora::proxy::ProxyHttp` implementation that ties routing,
//! middleware, and upstream selection into one request/response cycle
//! (spec.md §4.7-§4.8).
//!
//! Grounded on `router-core/src/app/gateway.rs`: the teacher's
//! `GatewayApp` already shapes `request_filter` / `upstream_peer` /
//! `response_filter` around a single path-matching decision made once
//! up front and threaded through `CTX`. This module keeps that shape
//! and replaces the teacher's flat path table with the vhost + trie +
//! middleware-chain pipeline built in `route`, `vhost`, and
//! `middleware`.

use std::sync::Arc;

use async_trait::async_trait;
use log::error;
use pingora::http::ResponseHeader;
use pingora::protocols::Digest;
use pingora::prelude::HttpPeer;
use pingora::proxy::{ProxyHttp, Session};
use pingora::Result;

use crate::route::{ContextPool, Method, PooledContext};
use crate::upstream::Replica;
use crate::vhost::VhostLookup;

use super::composer::{Gateway, RouteHandler, Terminal};
use super::handlers::{method_not_allowed, not_found, send_response};

pub struct GatewayApp {
    gateway: Arc<Gateway>,
    context_pool: Arc<ContextPool>,
}

impl GatewayApp {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        GatewayApp {
            gateway,
            context_pool: ContextPool::new(),
        }
    }
}

pub struct GatewayCtx {
    pooled: PooledContext,
    handler: Option<Arc<RouteHandler>>,
    replica: Option<Arc<Replica>>,
    connected: bool,
}

fn host_header(session: &Session) -> String {
    session
        .req_header()
        .headers
        .get("host")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl ProxyHttp for GatewayApp {
    type CTX = GatewayCtx;

    fn new_ctx(&self) -> Self::CTX {
        GatewayCtx {
            pooled: self.context_pool.acquire(),
            handler: None,
            replica: None,
            connected: false,
        }
    }

    async fn request_filter(&self, session: &mut Session, ctx: &mut Self::CTX) -> Result<bool> {
        let host = host_header(session);
        let req = session.req_header();
        let path = req.uri.path().to_string();
        let query = req.uri.query().map(str::to_string);
        let method = Method::from_http(&req.method);
        let authorization = req
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let referer = req
            .headers
            .get("referer")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let forwarded_for = req
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let connection = req
            .headers
            .get("connection")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let upgrade = req
            .headers
            .get("upgrade")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let remote_ip = session
            .client_addr()
            .and_then(|addr| addr.as_inet())
            .map(|addr| addr.ip())
            .unwrap_or_else(|| "0.0.0.0".parse().unwrap());

        let Some(method) = method else {
            send_response(session, method_not_allowed()).await?;
            return Ok(true);
        };

        let lookup = self.gateway.dispatch(&host, method, &path);
        let handler = match lookup {
            VhostLookup::UnknownHost => {
                send_response(session, not_found()).await?;
                return Ok(true);
            }
            VhostLookup::Matched(crate::route::Lookup::NotFound) => {
                send_response(session, not_found()).await?;
                return Ok(true);
            }
            VhostLookup::Matched(crate::route::Lookup::MethodNotAllowed) => {
                send_response(session, method_not_allowed()).await?;
                return Ok(true);
            }
            VhostLookup::Matched(crate::route::Lookup::Matched {
                handler,
                params,
            }) => {
                for (name, value) in params {
                    ctx.pooled.params.push(name, value);
                }
                Arc::clone(handler)
            }
        };

        let request_info = crate::middleware::RequestInfo {
            method: req.method.as_str(),
            host: &host,
            path: &path,
            remote_ip,
            forwarded_for: forwarded_for.as_deref(),
            query: query.as_deref(),
            referer: referer.as_deref(),
            authorization: authorization.as_deref(),
            connection: connection.as_deref(),
            upgrade: upgrade.as_deref(),
            params: &ctx.pooled.params,
        };

        if let Some(response) = handler.chain.run(&request_info) {
            send_response(session, response).await?;
            return Ok(true);
        }

        match &handler.terminal {
            Terminal::RedirectPermanent | Terminal::RedirectTemporary => {
                let status = if matches!(handler.terminal, Terminal::RedirectPermanent) {
                    301
                } else {
                    302
                };
                let location = format!("https://{host}{path}");
                let response = crate::middleware::Response::new(status, Vec::new())
                    .with_header("Location", location);
                send_response(session, response).await?;
                return Ok(true);
            }
            Terminal::Proxy { .. } => {}
        }

        ctx.handler = Some(handler);
        Ok(false)
    }

    async fn upstream_peer(
        &self,
        _session: &mut Session,
        ctx: &mut Self::CTX,
    ) -> Result<Box<HttpPeer>> {
        let handler = ctx
            .handler
            .as_ref()
            .expect("upstream_peer called without a resolved route");
        let Terminal::Proxy {
            upstream,
            remote_host,
        } = &handler.terminal
        else {
            return Err(pingora::Error::new_str("route has no upstream to proxy to"));
        };

        let Some(replica) = upstream.pick() else {
            error!("upstream group for '{remote_host}' has no replicas to pick from");
            return Err(pingora::Error::new_str("no upstream replicas available"));
        };

        let peer = HttpPeer::new(replica.addr, handler.header_policy.is_tls, remote_host.clone());
        ctx.replica = Some(replica);

        Ok(Box::new(peer))
    }

    async fn connected_to_upstream(
        &self,
        _session: &mut Session,
        _reused: bool,
        _peer: &HttpPeer,
        #[cfg(unix)] _fd: std::os::unix::io::RawFd,
        #[cfg(windows)] _sock: std::os::windows::io::RawSocket,
        _digest: Option<&Digest>,
        ctx: &mut Self::CTX,
    ) -> Result<()> {
        if let Some(replica) = &ctx.replica {
            replica.on_connected();
            ctx.connected = true;
        }
        Ok(())
    }

    async fn response_filter(
        &self,
        _session: &mut Session,
        upstream_response: &mut ResponseHeader,
        ctx: &mut Self::CTX,
    ) -> Result<()> {
        if let Some(handler) = &ctx.handler {
            handler.header_policy.apply(upstream_response)?;
        }
        Ok(())
    }

    fn fail_to_connect(
        &self,
        _session: &mut Session,
        _peer: &HttpPeer,
        ctx: &mut Self::CTX,
        e: Box<pingora::Error>,
    ) -> Box<pingora::Error> {
        if let Some(replica) = &ctx.replica {
            error!("failed to connect to upstream replica {}: {e}", replica.addr);
        }
        e
    }

    async fn logging(&self, _session: &mut Session, _e: Option<&pingora::Error>, ctx: &mut Self::CTX) {
        if ctx.connected {
            if let Some(replica) = ctx.replica.take() {
                replica.on_disconnected();
            }
        }
    }
}

/// The port-80 side of the vhost map (spec.md §4.6): for any host the
/// secure side has a route for, answer a permanent redirect to the
/// same host and path over HTTPS; for anything else, 404. Grounded on
/// `original_source/proxy.go`'s parallel `secure`/`insecure` maps — this
/// reuses `Gateway::contains` rather than building a second map, since
/// the host set the redirect side needs to answer for is exactly the
/// one the secure side already composed.
pub struct InsecureRedirectApp {
    gateway: Arc<Gateway>,
}

impl InsecureRedirectApp {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        InsecureRedirectApp { gateway }
    }
}

#[async_trait]
impl ProxyHttp for InsecureRedirectApp {
    type CTX = ();

    fn new_ctx(&self) -> Self::CTX {}

    async fn request_filter(&self, session: &mut Session, _ctx: &mut Self::CTX) -> Result<bool> {
        let host = host_header(session);
        let req = session.req_header();
        let path = req.uri.path().to_string();
        let query = req.uri.query().map(|q| format!("?{q}")).unwrap_or_default();

        let response = if self.gateway.contains(&host) {
            crate::middleware::Response::new(301, Vec::new())
                .with_header("Location", format!("https://{host}{path}{query}"))
        } else {
            not_found()
        };

        send_response(session, response).await?;
        Ok(true)
    }

    async fn upstream_peer(
        &self,
        _session: &mut Session,
        _ctx: &mut Self::CTX,
    ) -> Result<Box<HttpPeer>> {
        Err(pingora::Error::new_str(
            "the insecure listener never proxies upstream",
        ))
    }
}
