//! Build the dispatch engine — virtual hosts, per-route policy chains,
//! and upstream groups — from a flat list of route entries (spec.md
//! §4.7).
//!
//! Grounded on `original_source/middleware/proxy.go`'s `Configure` /
//! `normalise` / `parseRemoteHost` / `reverseProxy`: normalise the
//! remote URL's scheme and port, resolve the remote host to one or
//! more IPs via DNS, assemble the handler chain (instrumented →
//! IP-restricted → category wrapper → the terminal handler) in that
//! fixed order, then register it against the host's mux — and, for
//! every configured alias, the same chain again under the alias's own
//! host entry. A malformed entry is logged and skipped rather than
//! aborting the whole composition (`original_source/pkg/liberty/server.go`'s
//! `NewProxy`: `fmt.Printf("the proxy for '%s' was not configured..."); continue`).

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use dns_lookup::lookup_host;
use log::warn;

use crate::config::{RouteEntry, RouteKind as ConfigRouteKind, TerminalKind, WhitelistEntry};
use crate::error::ConfigError;
use crate::middleware::basic_auth::{BasicAuth, StaticCredentials};
use crate::middleware::go_get::GoGet;
use crate::middleware::instrument::Instrument;
use crate::middleware::ip_restrict::{IpRestrict, RouteKind as IpRouteKind};
use crate::middleware::websocket::WebSocketHijack;
use crate::middleware::whitelist::{Whitelist, WhitelistEntry as MwWhitelistEntry};
use crate::middleware::Chain;
use crate::system::startup::StartupScope;
use crate::upstream::UpstreamGroup;
use crate::vhost::VirtualHosts;

use super::headers::HeaderPolicy;

/// What a matched route does once its policy chain lets a request
/// through.
pub enum Terminal {
    Proxy {
        upstream: Arc<UpstreamGroup>,
        remote_host: String,
    },
    RedirectPermanent,
    RedirectTemporary,
}

pub struct RouteHandler {
    pub chain: Chain,
    pub terminal: Terminal,
    pub header_policy: HeaderPolicy,
}

/// The fully composed engine: one router per virtual host, each
/// handler carrying its own policy chain and terminal action.
pub type Gateway = VirtualHosts<Arc<RouteHandler>>;

/// Compose a [`Gateway`] from route and whitelist entries. Entries that
/// fail to parse or resolve are skipped, with the reason logged and
/// returned alongside the gateway so the caller can decide whether a
/// partially composed gateway is acceptable to start with.
pub fn compose(
    routes: &[RouteEntry],
    whitelist: &[WhitelistEntry],
    startup: &StartupScope,
) -> (Gateway, Vec<ConfigError>) {
    let mut gateway = VirtualHosts::new();
    let mut errors = Vec::new();
    let trust_xff = startup.trust_forwarded_for();
    let shared_whitelist = Arc::new(build_whitelist(whitelist, trust_xff));

    for entry in routes {
        match build_handler(entry, &shared_whitelist, trust_xff) {
            Ok(handler) => {
                let handler = Arc::new(handler);
                if let Err(err) = register_under_host_and_aliases(&mut gateway, entry, &handler) {
                    warn!("route '{}' on host '{}' was skipped: {err}", entry.template, entry.host);
                    errors.push(err);
                }
            }
            Err(err) => {
                warn!("route '{}' on host '{}' was skipped: {err}", entry.template, entry.host);
                errors.push(err);
            }
        }
    }

    (gateway, errors)
}

/// Registration for step 8: the chain answers every method under the
/// route's own host, and — per `original_source/middleware/proxy.go`'s
/// `HostAlias` loop — under every configured alias host too.
fn register_under_host_and_aliases(
    gateway: &mut Gateway,
    entry: &RouteEntry,
    handler: &Arc<RouteHandler>,
) -> Result<(), ConfigError> {
    gateway
        .register(&entry.host, &entry.template, Arc::clone(handler))
        .map_err(|err| ConfigError::InvalidPattern(entry.template.clone(), err))?;

    for alias in &entry.host_aliases {
        gateway
            .register(alias, &entry.template, Arc::clone(handler))
            .map_err(|err| ConfigError::InvalidPattern(entry.template.clone(), err))?;
    }

    Ok(())
}

fn build_whitelist(entries: &[WhitelistEntry], trust_xff: bool) -> Whitelist {
    let entries = entries
        .iter()
        .map(|entry| MwWhitelistEntry {
            path_prefix: entry.path.clone(),
            nets: entry
                .ips
                .iter()
                .filter_map(|cidr| cidr.parse().ok())
                .collect(),
            hostnames: entry.hostnames.clone(),
        })
        .collect();
    Whitelist::new(entries, trust_xff)
}

fn build_handler(
    entry: &RouteEntry,
    shared_whitelist: &Arc<Whitelist>,
    trust_xff: bool,
) -> Result<RouteHandler, ConfigError> {
    let mut chain = Chain::new();
    chain.push(Box::new(Instrument::new(format!(
        "{}{}",
        entry.host, entry.template
    ))));

    // IP restriction runs ahead of everything below it, websocket routes
    // included (spec.md §4.7 step 7).
    if !entry.allowed_cidrs.is_empty() {
        let nets = entry
            .allowed_cidrs
            .iter()
            .map(|cidr| {
                cidr.parse()
                    .map_err(|e| ConfigError::InvalidCidr(cidr.clone(), format!("{e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let kind = match entry.kind {
            ConfigRouteKind::Api => IpRouteKind::Api,
            ConfigRouteKind::Web => IpRouteKind::Web,
        };
        chain.push(Box::new(IpRestrict::new(
            nets,
            kind,
            entry.open_path_prefixes.clone(),
            trust_xff,
        )));
    }

    if entry.ws {
        // A websocket upgrade bypasses the category wrapper (the
        // original hands it straight to its own proxy, skipping the
        // whitelist/basic-auth/go-get handlers entirely) but still gets
        // detected and logged on its way to the terminal handler.
        chain.push(Box::new(WebSocketHijack::new()));
    } else {
        if matches!(entry.kind, ConfigRouteKind::Api) {
            chain.push(Box::new(ArcWhitelist(Arc::clone(shared_whitelist))));
        }

        if let Some(credentials) = &entry.basic_auth {
            chain.push(Box::new(BasicAuth::new(Box::new(StaticCredentials::new(
                credentials.user.clone(),
                credentials.password.clone(),
            )))));
        }

        if let Some(remote_base) = &entry.go_get_remote_base {
            chain.push(Box::new(GoGet::new(remote_base.clone())));
        }
    }

    let terminal = match entry.terminal {
        TerminalKind::Proxy => {
            let (addrs, remote_host) = resolve_remote(entry)?;
            Terminal::Proxy {
                upstream: Arc::new(UpstreamGroup::new(addrs, entry.selection_strategy)),
                remote_host,
            }
        }
        TerminalKind::RedirectPermanent => Terminal::RedirectPermanent,
        TerminalKind::RedirectTemporary => Terminal::RedirectTemporary,
    };

    Ok(RouteHandler {
        chain,
        terminal,
        header_policy: HeaderPolicy {
            cors_origins: entry.cors.clone(),
            is_tls: entry.tls,
        },
    })
}

/// Steps 1-2 of the composer: normalise the remote host into a
/// `scheme://host:port` URL, then resolve `host` to one or more
/// addresses. A literal IP address skips DNS entirely; a name goes
/// through forward lookup (`original_source/middleware/proxy.go`'s
/// `net.LookupIP`).
fn resolve_remote(entry: &RouteEntry) -> Result<(Vec<SocketAddr>, String), ConfigError> {
    let scheme = if entry.tls { "https" } else { "http" };
    let port = match entry.remote_port {
        0 if entry.tls => 443,
        0 => 80,
        explicit => explicit,
    };

    let normalised = format!("{scheme}://{}:{port}", entry.remote_host);
    let uri: http::Uri = normalised
        .parse()
        .map_err(|e| ConfigError::InvalidRemoteUrl(entry.remote_host.clone(), format!("{e}")))?;
    let host = uri
        .host()
        .ok_or_else(|| ConfigError::InvalidRemoteUrl(entry.remote_host.clone(), "missing host".to_string()))?;

    let ips: Vec<IpAddr> = if let Ok(literal) = host.parse::<IpAddr>() {
        vec![literal]
    } else {
        lookup_host(host)
            .map_err(|e| ConfigError::UpstreamResolution(host.to_string(), format!("{e}")))?
    };

    if ips.is_empty() {
        return Err(ConfigError::NoReplicas(entry.remote_host.clone()));
    }

    let addrs = ips.into_iter().map(|ip| SocketAddr::new(ip, port)).collect();
    Ok((addrs, entry.remote_host.clone()))
}

/// Adapts a shared [`Whitelist`] (one instance serves every API route)
/// to the per-chain `Box<dyn Middleware>` slot.
struct ArcWhitelist(Arc<Whitelist>);

impl crate::middleware::Middleware for ArcWhitelist {
    fn evaluate(&self, request: &crate::middleware::RequestInfo<'_>) -> crate::middleware::Outcome {
        self.0.evaluate(request)
    }

    fn name(&self) -> &str {
        "whitelist"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn startup(trust_xff: bool) -> StartupScope {
        use crate::system::startup::Environment;
        StartupScope::with_environment(if trust_xff {
            Environment::Prod
        } else {
            Environment::Dev
        })
    }

    fn sample_entry() -> RouteEntry {
        RouteEntry {
            host: "example.com".to_string(),
            host_aliases: vec!["alias.example.com".to_string()],
            template: "/api/widgets/:id".to_string(),
            kind: ConfigRouteKind::Api,
            terminal: TerminalKind::Proxy,
            remote_host: "127.0.0.1".to_string(),
            remote_port: 8080,
            ws: false,
            selection_strategy: crate::upstream::SelectionStrategy::LeastConnections,
            tls: false,
            cors: vec![],
            allowed_cidrs: vec!["10.0.0.0/8".to_string()],
            open_path_prefixes: vec![],
            basic_auth: None,
            go_get_remote_base: None,
        }
    }

    #[test]
    fn composes_a_valid_route() {
        let (gateway, errors) = compose(&[sample_entry()], &[], &startup(false));
        assert!(errors.is_empty());
        assert!(gateway.contains("example.com"));
    }

    #[test]
    fn registers_the_same_chain_under_every_host_alias() {
        let (gateway, errors) = compose(&[sample_entry()], &[], &startup(false));
        assert!(errors.is_empty());
        assert!(gateway.contains("alias.example.com"));
    }

    #[test]
    fn skips_a_route_whose_remote_host_cannot_be_resolved() {
        let mut entry = sample_entry();
        entry.remote_host = "this-host-does-not-resolve.invalid".to_string();
        let (_gateway, errors) = compose(&[entry], &[], &startup(false));
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ConfigError::UpstreamResolution(_, _)));
    }

    #[test]
    fn literal_ip_upstream_skips_dns_and_resolves_directly() {
        let entry = sample_entry();
        let (addrs, remote_host) = resolve_remote(&entry).unwrap();
        assert_eq!(addrs, vec!["127.0.0.1:8080".parse().unwrap()]);
        assert_eq!(remote_host, "127.0.0.1");
    }

    #[test]
    fn skips_a_route_with_an_invalid_cidr() {
        let mut entry = sample_entry();
        entry.allowed_cidrs = vec!["not-a-cidr".to_string()];
        let (_gateway, errors) = compose(&[entry], &[], &startup(false));
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ConfigError::InvalidCidr(_, _)));
    }
}
