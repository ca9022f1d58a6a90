//! Binary entry point wiring the dispatch engine to a running pingora
//! server.
//!
//! Grounded on the teacher's `router-core/src/main.rs` and
//! `system/server.rs`: bootstrap a `pingora::server::Server`, attach one
//! TCP listener, and hand it off to `run_forever`. Real deployments
//! supply their own [`gateway_core::config::RouteEntry`] /
//! `WhitelistEntry` values (parsing whatever on-disk format they use is
//! explicitly out of this crate's scope) — the handful of routes built
//! here exist only so the binary has something to serve.

use std::sync::Arc;

use log::LevelFilter;
use pingora::proxy::http_proxy_service;
use pingora::server::Server;

use gateway_core::config::{RouteEntry, RouteKind, TerminalKind};
use gateway_core::proxy::{compose, GatewayApp, InsecureRedirectApp};
use gateway_core::system::logging;
use gateway_core::system::startup::StartupScope;
use gateway_core::upstream::SelectionStrategy;

const DEFAULT_PORT: u16 = 6193;
const INSECURE_PORT: u16 = 80;

fn example_routes() -> Vec<RouteEntry> {
    vec![RouteEntry {
        host: "localhost".to_string(),
        host_aliases: vec![],
        template: "/healthz".to_string(),
        kind: RouteKind::Web,
        terminal: TerminalKind::Proxy,
        remote_host: "127.0.0.1".to_string(),
        remote_port: 8080,
        ws: false,
        selection_strategy: SelectionStrategy::LeastConnections,
        tls: false,
        cors: vec![],
        allowed_cidrs: vec![],
        open_path_prefixes: vec![],
        basic_auth: None,
        go_get_remote_base: None,
    }]
}

fn main() {
    logging::init(LevelFilter::Info);

    let startup = StartupScope::from_env();
    let (gateway, errors) = compose(&example_routes(), &[], &startup);
    for err in &errors {
        log::warn!("route composition error: {err}");
    }
    let gateway = Arc::new(gateway);

    let mut server = Server::new(None).expect("failed to initialise the pingora server");
    server.bootstrap();

    let app = GatewayApp::new(Arc::clone(&gateway));
    let mut service = http_proxy_service(&server.configuration, app);
    service.add_tcp(&format!("0.0.0.0:{DEFAULT_PORT}"));
    server.add_service(service);

    let insecure_app = InsecureRedirectApp::new(gateway);
    let mut insecure_service = http_proxy_service(&server.configuration, insecure_app);
    insecure_service.add_tcp(&format!("0.0.0.0:{INSECURE_PORT}"));
    server.add_service(insecure_service);

    log::info!("listening on 0.0.0.0:{DEFAULT_PORT} (https), 0.0.0.0:{INSECURE_PORT} (redirect)");
    server.run_forever();
}
