//! Request-level logging, the first link in most chains.
//!
//! Grounded on `original_source/middleware/handlers.go`'s
//! `InstrumentedHandler` (a prometheus-backed timer around the
//! downstream handler). Counters and histograms are an observability
//! surface spec.md's Non-goals exclude, but ambient structured logging
//! is not optional (SPEC_FULL.md §B) — so this link logs at `log::info`
//! the way `router-core` logs request lifecycle events, rather than
//! emitting metrics.

use log::info;

use super::{Middleware, Outcome, RequestInfo};

pub struct Instrument {
    label: String,
}

impl Instrument {
    pub fn new(label: impl Into<String>) -> Self {
        Instrument {
            label: label.into(),
        }
    }
}

impl Middleware for Instrument {
    fn evaluate(&self, request: &RequestInfo<'_>) -> Outcome {
        info!(
            "{} {} {}{} -> {}",
            request.method,
            request.host,
            request.path,
            request.query.map(|q| format!("?{q}")).unwrap_or_default(),
            self.label,
        );
        Outcome::Continue
    }

    fn name(&self) -> &str {
        "instrument"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::Params;

    #[test]
    fn always_continues() {
        let mw = Instrument::new("checkout-api");
        let params = Params::default();
        let request = RequestInfo {
            method: "GET",
            host: "example.com",
            path: "/checkout",
            remote_ip: "127.0.0.1".parse().unwrap(),
            forwarded_for: None,
            query: Some("step=2"),
            referer: None,
            authorization: None,
            connection: None,
            upgrade: None,
            params: &params,
        };
        assert!(matches!(mw.evaluate(&request), Outcome::Continue));
    }
}
