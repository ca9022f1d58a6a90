//! The per-route policy chain: an ordered list of wrappers around a
//! terminal handler, each of which can short-circuit the request with
//! its own response (spec.md §4.4).
//!
//! Grounded on `original_source/middleware/chain.go`'s `Chainable`
//! interface and `Chain.Link`. The original builds a literal
//! `http.Handler` closure chain; we can't borrow that shape directly
//! since nothing here owns an HTTP server loop (that's `proxy::gateway`,
//! built on `pingora::proxy::ProxyHttp`), so a [`Middleware`] answers a
//! plain [`Outcome`] instead of writing to a `ResponseWriter`. The
//! gateway's `request_filter` phase walks the chain and only talks to
//! pingora once a verdict comes back.

pub mod basic_auth;
pub mod go_get;
pub mod instrument;
pub mod ip_restrict;
pub mod websocket;
pub mod whitelist;

use std::net::IpAddr;

use crate::route::Params;

/// The facts about an inbound request a policy needs to decide on. Not
/// the request itself — just the attributes middlewares actually
/// consult, kept free of any pingora or hyper type so this module has
/// no framework dependency of its own.
pub struct RequestInfo<'a> {
    pub method: &'a str,
    pub host: &'a str,
    pub path: &'a str,
    pub remote_ip: IpAddr,
    pub forwarded_for: Option<&'a str>,
    pub query: Option<&'a str>,
    pub referer: Option<&'a str>,
    pub authorization: Option<&'a str>,
    pub connection: Option<&'a str>,
    pub upgrade: Option<&'a str>,
    pub params: &'a Params,
}

impl<'a> RequestInfo<'a> {
    /// The address to judge IP/whitelist policy against. The original
    /// preferred `X-Forwarded-For`'s first hop over the socket's remote
    /// address only in production (`original_source/middleware/handlers.go`'s
    /// `parseForwarderIP`, gated by spec.md §6's `APP_ENV`); `trust_xff`
    /// carries that gate in from the [`crate::system::StartupScope`]
    /// each policy wrapper was built with, rather than reading the
    /// environment itself on every request.
    pub fn trust_forwarded_ip(&self, trust_xff: bool) -> IpAddr {
        if !trust_xff {
            return self.remote_ip;
        }
        self.forwarded_for
            .and_then(|header| header.split(',').next())
            .map(str::trim)
            .and_then(|ip| ip.parse().ok())
            .unwrap_or(self.remote_ip)
    }
}

/// A minimal, framework-agnostic HTTP response a middleware can hand
/// back to short-circuit the chain.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Response {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn plain_text(status: u16, message: impl Into<String>) -> Self {
        Response::new(status, message.into().into_bytes())
            .with_header("Content-Type", "text/plain; charset=utf-8")
    }
}

/// What a middleware decided to do with a request.
pub enum Outcome {
    /// Let the chain proceed to the next link (or the terminal proxy
    /// handler, if this was the last one).
    Continue,
    /// Answer the request directly; nothing further in the chain runs.
    Respond(Response),
}

/// One link in the policy chain. By design there is no guarantee a
/// middleware calls onward — matching the original's `Chainable`
/// docstring verbatim in spirit: a middleware that answers `Respond`
/// simply ends the request there.
pub trait Middleware: Send + Sync {
    fn evaluate(&self, request: &RequestInfo<'_>) -> Outcome;

    /// A short name used in diagnostics and instrumentation labels.
    fn name(&self) -> &str;
}

/// An ordered sequence of middlewares evaluated front-to-back.
#[derive(Default)]
pub struct Chain {
    links: Vec<Box<dyn Middleware>>,
}

impl Chain {
    pub fn new() -> Self {
        Chain { links: Vec::new() }
    }

    pub fn push(&mut self, middleware: Box<dyn Middleware>) -> &mut Self {
        self.links.push(middleware);
        self
    }

    /// Run the chain against `request`, stopping at the first
    /// middleware that answers. Returns `None` if every link let the
    /// request through, meaning the terminal proxy handler should run.
    pub fn run(&self, request: &RequestInfo<'_>) -> Option<Response> {
        for link in &self.links {
            if let Outcome::Respond(response) = link.evaluate(request) {
                return Some(response);
            }
        }
        None
    }
}
