//! Process-wide configuration slots.
//!
//! Grounded on `router-core/src/config.rs`'s `RoutingData` enum: a
//! single `#[derive(Configure)]` type whose variants are the distinct
//! pieces of runtime configuration the rest of the process reads back
//! out by key, set once at startup by whatever owns parsing the
//! on-disk config (out of scope here per spec.md §1 — this crate
//! receives already-typed [`RouteEntry`]/[`WhitelistEntry`] values, not
//! YAML bytes).

use mini_config::Configure;
use serde::{Deserialize, Serialize};

use crate::upstream::SelectionStrategy;

pub const DEFAULT_SHUTDOWN_GRACE_SECONDS: u64 = 5;

/// What an API route's path-restriction layer (`middleware::ip_restrict`)
/// treats this route as, matching the original's `HandlerType` string
/// (`api` vs. everything else).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteKind {
    Api,
    Web,
}

/// What a matched route ultimately does once the policy chain has let
/// the request through (spec.md §4.7's "proxy composer").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TerminalKind {
    Proxy,
    RedirectPermanent,
    RedirectTemporary,
}

/// One route table entry: the host and template it answers, the
/// policies that gate it, and what it does once they pass. Mirrors the
/// original's `Proxy`/`yaml:"..."` struct, minus the YAML tags — this
/// value arrives already parsed.
///
/// There is deliberately no per-route HTTP method: the original's
/// `mux.Handle(p.HostPath, chain)` dispatches by host+path alone, and
/// `router.All(path, chain)` is the only registration call it ever
/// makes (`original_source/router.go`'s `All`, `reverse_proxy.go:219`).
/// A route answers every one of [`crate::route::Method::ALL`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteEntry {
    pub host: String,
    /// Additional host names the same chain answers under, in addition
    /// to `host` (`original_source/middleware/proxy.go`'s `HostAlias`).
    #[serde(default)]
    pub host_aliases: Vec<String>,
    pub template: String,
    pub kind: RouteKind,
    pub terminal: TerminalKind,
    pub remote_host: String,
    /// `0` means "unset"; the composer defaults it to 443/80 from
    /// `tls`, the same default `normalise()` applies upstream.
    pub remote_port: u16,
    /// Whether this route should be treated as a WebSocket upgrade
    /// target: the composer wraps it with a hijacker instead of the
    /// usual category wrapper (spec.md §4.7 step 5).
    #[serde(default)]
    pub ws: bool,
    pub selection_strategy: SelectionStrategy,
    pub tls: bool,
    pub cors: Vec<String>,
    pub allowed_cidrs: Vec<String>,
    pub open_path_prefixes: Vec<String>,
    pub basic_auth: Option<BasicAuthEntry>,
    pub go_get_remote_base: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicAuthEntry {
    pub user: String,
    pub password: String,
}

/// One whitelist entry: a path prefix and the networks/hostnames
/// allowed to reach it, per `original_source/middleware/api_handler.go`'s
/// `ApiWhitelist`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhitelistEntry {
    pub path: String,
    pub ips: Vec<String>,
    pub hostnames: Vec<String>,
}

/// The process-wide configuration keys this crate publishes through
/// `mini_config`. Anything that owns startup (the `main.rs` binary, or
/// an embedding application) populates these once; `proxy::composer`
/// and `system::lifecycle` read them back out.
#[derive(Debug, Clone, Configure)]
pub enum RoutingData {
    Routes(Vec<RouteEntry>),
    Whitelist(Vec<WhitelistEntry>),
    ShutdownGraceSeconds(u64),
}

impl Default for RoutingData {
    fn default() -> Self {
        RoutingData::ShutdownGraceSeconds(DEFAULT_SHUTDOWN_GRACE_SECONDS)
    }
}
