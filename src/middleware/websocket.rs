//! WebSocket-upgrade detection for routes flagged `ws` (spec.md §4.7
//! step 5).
//!
//! Grounded on `original_source/middleware/proxy.go`'s `Ws bool` field,
//! which short-circuits straight to `websocketProxy(p.RemoteHost)`,
//! skipping the category wrapper (basic-auth/whitelist/go-get)
//! entirely. Frame-level proxying itself stays out of scope (spec.md
//! §1); this link only recognises the handshake and lets the terminal
//! proxy handler carry the rest of the connection, the same way the
//! original's `mux.Handle` bypass leaves the actual byte-shovelling to
//! a dedicated reverse proxy underneath.

use log::debug;

use super::{Middleware, Outcome, RequestInfo};

pub struct WebSocketHijack;

impl WebSocketHijack {
    pub fn new() -> Self {
        WebSocketHijack
    }
}

impl Default for WebSocketHijack {
    fn default() -> Self {
        Self::new()
    }
}

/// `Connection: Upgrade` plus `Upgrade: websocket` (RFC 6455 §4.1),
/// matched case-insensitively since both are token headers and
/// `Connection` is often a comma-joined list (`keep-alive, Upgrade`).
pub fn is_upgrade_request(connection: Option<&str>, upgrade: Option<&str>) -> bool {
    let has_upgrade_token = connection
        .map(|value| {
            value
                .split(',')
                .any(|token| token.trim().eq_ignore_ascii_case("upgrade"))
        })
        .unwrap_or(false);

    let wants_websocket = upgrade
        .map(|value| value.trim().eq_ignore_ascii_case("websocket"))
        .unwrap_or(false);

    has_upgrade_token && wants_websocket
}

impl Middleware for WebSocketHijack {
    fn evaluate(&self, request: &RequestInfo<'_>) -> Outcome {
        if is_upgrade_request(request.connection, request.upgrade) {
            debug!(
                "{} {} is a websocket upgrade, handing off to the terminal proxy",
                request.host, request.path
            );
        }
        Outcome::Continue
    }

    fn name(&self) -> &str {
        "websocket-hijack"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::Params;

    fn request<'a>(
        connection: Option<&'a str>,
        upgrade: Option<&'a str>,
        params: &'a Params,
    ) -> RequestInfo<'a> {
        RequestInfo {
            method: "GET",
            host: "example.com",
            path: "/ws",
            remote_ip: "127.0.0.1".parse().unwrap(),
            forwarded_for: None,
            query: None,
            referer: None,
            authorization: None,
            connection,
            upgrade,
            params,
        }
    }

    #[test]
    fn detects_a_standard_upgrade_handshake() {
        assert!(is_upgrade_request(Some("Upgrade"), Some("websocket")));
        assert!(is_upgrade_request(Some("keep-alive, Upgrade"), Some("WebSocket")));
    }

    #[test]
    fn ignores_ordinary_requests() {
        assert!(!is_upgrade_request(None, None));
        assert!(!is_upgrade_request(Some("keep-alive"), None));
        assert!(!is_upgrade_request(Some("Upgrade"), Some("h2c")));
    }

    #[test]
    fn always_continues_so_the_terminal_handler_runs() {
        let mw = WebSocketHijack::new();
        let params = Params::default();
        assert!(matches!(
            mw.evaluate(&request(Some("Upgrade"), Some("websocket"), &params)),
            Outcome::Continue
        ));
        assert!(matches!(
            mw.evaluate(&request(None, None, &params)),
            Outcome::Continue
        ));
    }
}
