//! Restrict a route to an allow-listed set of client networks, with an
//! optional bypass for paths that have been declared open.
//!
//! Grounded on `original_source/middleware/handlers.go`'s
//! `IPRestrictedHandler`: an allow-list of `net.IPNet` CIDRs, and — for
//! API-typed routes specifically — a set of open path prefixes that
//! bypass the restriction entirely. We use `ipnet` for CIDR containment
//! (the teacher crate doesn't need CIDR matching itself, so this is
//! pulled in from the wider pack, same as `vishalbelsare-agentgateway`
//! does for its network-policy layer).

use ipnet::IpNet;

use super::{Middleware, Outcome, RequestInfo, Response};

/// Per spec.md's supplemented open-paths behaviour: only an API-typed
/// route consults the open-path bypass; everything else is restricted
/// purely by network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Api,
    Web,
}

pub struct IpRestrict {
    allowed: Vec<IpNet>,
    kind: RouteKind,
    open_path_prefixes: Vec<String>,
    trust_xff: bool,
}

impl IpRestrict {
    pub fn new(
        allowed: Vec<IpNet>,
        kind: RouteKind,
        open_path_prefixes: Vec<String>,
        trust_xff: bool,
    ) -> Self {
        IpRestrict {
            allowed,
            kind,
            open_path_prefixes,
            trust_xff,
        }
    }

    fn is_open_path(&self, path: &str) -> bool {
        self.kind == RouteKind::Api
            && self
                .open_path_prefixes
                .iter()
                .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

impl Middleware for IpRestrict {
    fn evaluate(&self, request: &RequestInfo<'_>) -> Outcome {
        if self.is_open_path(request.path) {
            return Outcome::Continue;
        }

        let ip = request.trust_forwarded_ip(self.trust_xff);
        if self.allowed.iter().any(|net| net.contains(&ip)) {
            return Outcome::Continue;
        }

        Outcome::Respond(Response::plain_text(
            403,
            format!("IP {ip} is not allowed to access this resource"),
        ))
    }

    fn name(&self) -> &str {
        "ip-restrict"
    }
}
