//! Response header injection applied to every proxied response.
//!
//! Grounded on `original_source/middleware/transport.go`'s `Transport`
//! (a `http.RoundTripper` wrapper): set `Access-Control-Allow-Origin`
//! when the route configures CORS origins, then unconditionally stamp
//! `Vary: Accept-Encoding`, a `Server` banner, `X-Frame-Options`, and —
//! for TLS-terminated routes — `Strict-Transport-Security`. Applied
//! here in `GatewayApp::response_filter` (`proxy::gateway`) rather than
//! at a `RoundTripper` layer, since pingora's `ProxyHttp` trait exposes
//! the same seam directly.

use pingora::http::ResponseHeader;
use pingora::Result;

const SERVER_BANNER: &str = "gateway-core";

pub struct HeaderPolicy {
    pub cors_origins: Vec<String>,
    pub is_tls: bool,
}

impl HeaderPolicy {
    pub fn apply(&self, headers: &mut ResponseHeader) -> Result<()> {
        if !self.cors_origins.is_empty() {
            headers.insert_header("Access-Control-Allow-Origin", self.cors_origins.join(" "))?;
        }
        headers.insert_header("Vary", "Accept-Encoding")?;
        headers.insert_header("Server", SERVER_BANNER)?;
        headers.insert_header("X-Frame-Options", "SAMEORIGIN")?;
        if self.is_tls {
            headers.insert_header(
                "Strict-Transport-Security",
                "max-age=31536000; includeSubDomains",
            )?;
        }
        Ok(())
    }
}
