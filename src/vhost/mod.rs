//! Virtual-host dispatch: route the `Host` header to the router
//! configured for that host, answering 404 for a host nobody has
//! registered (spec.md §4.6).
//!
//! Grounded on `original_source/pkg/liberty/server.go`'s `Proxy`: a
//! `map[string]*VHost` keyed on the exact `r.Host` value, with an
//! unmatched host falling through to `http.NotFound`. The teacher's
//! `router-core/src/app/proxy_host.rs` is the model for pulling the
//! host out of the request by hand rather than trusting a framework
//! accessor, since pingora hands the gateway raw header bytes at the
//! same layer.

use std::collections::HashMap;

use crate::error::PatternError;
use crate::route::{Lookup, Method, Router};

pub enum VhostLookup<'a, H> {
    Matched(Lookup<'a, H>),
    UnknownHost,
}

/// A map from virtual host name to the router answering that host's
/// traffic. One instance of this sits in front of the whole engine
/// (spec.md §3's `Gateway` aggregate).
pub struct VirtualHosts<H> {
    hosts: HashMap<String, Router<H>>,
}

impl<H: Clone> Default for VirtualHosts<H> {
    fn default() -> Self {
        VirtualHosts {
            hosts: HashMap::new(),
        }
    }
}

impl<H: Clone> VirtualHosts<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, host: impl Into<String>, router: Router<H>) {
        self.hosts.insert(normalize_host(&host.into()), router);
    }

    /// Register one route under `host`, creating that host's router on
    /// first use. Used when composing the engine incrementally from a
    /// flat list of route entries (`proxy::composer`). Answers every
    /// recognised HTTP method — there is no per-route verb (spec.md
    /// §4.7 step 8).
    pub fn register(&mut self, host: &str, template: &str, handler: H) -> Result<(), PatternError> {
        self.hosts
            .entry(normalize_host(host))
            .or_insert_with(Router::new)
            .register(template, handler)
    }

    pub fn dispatch(&self, host: &str, method: Method, path: &str) -> VhostLookup<'_, H> {
        match self.hosts.get(&normalize_host(host)) {
            Some(router) => VhostLookup::Matched(router.dispatch(method, path)),
            None => VhostLookup::UnknownHost,
        }
    }

    pub fn contains(&self, host: &str) -> bool {
        self.hosts.contains_key(&normalize_host(host))
    }
}

/// `Host` headers are case-insensitive (RFC 7230 §5.4) and may carry an
/// explicit port (`example.com:8443`) that plays no part in vhost
/// identity here, since the listener itself already pins the port.
fn normalize_host(host: &str) -> String {
    let without_port = host.split(':').next().unwrap_or(host);
    without_port.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_are_case_and_port_insensitive() {
        let mut vhosts: VirtualHosts<&'static str> = VirtualHosts::new();
        let mut router = Router::new();
        router.register("/", "home").unwrap();
        vhosts.insert("Example.com", router);

        assert!(matches!(
            vhosts.dispatch("example.COM:8443", Method::Get, "/"),
            VhostLookup::Matched(Lookup::Matched { .. })
        ));
    }

    #[test]
    fn unregistered_host_is_unknown() {
        let vhosts: VirtualHosts<&'static str> = VirtualHosts::new();
        assert!(matches!(
            vhosts.dispatch("nowhere.example", Method::Get, "/"),
            VhostLookup::UnknownHost
        ));
    }
}
