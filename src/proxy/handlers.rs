//! Building and sending the engine's own direct responses: 404 for an
//! unknown host or path, 405 for a path matched under the wrong verb,
//! and whatever a middleware decided to answer with itself.
//!
//! Grounded on `router-core/src/system/default_page/p404.rs`: the
//! teacher keeps its not-found page as a small, self-contained text
//! body rather than reaching for a templating crate, which this module
//! follows for the engine's built-in error pages.

use bytes::Bytes;
use pingora::http::ResponseHeader;
use pingora::proxy::Session;
use pingora::Result;

use crate::middleware::Response as PolicyResponse;

pub fn not_found() -> PolicyResponse {
    PolicyResponse::plain_text(404, "404 Not Found\n")
}

pub fn method_not_allowed() -> PolicyResponse {
    PolicyResponse::plain_text(405, "405 Method Not Allowed\n")
}

pub fn bad_gateway() -> PolicyResponse {
    PolicyResponse::plain_text(502, "502 Bad Gateway\n")
}

/// Write a [`PolicyResponse`] directly to the client, short-circuiting
/// the proxy pass. Used both for the engine's own 404/405 pages and for
/// whatever a middleware in the chain decided to answer with.
pub async fn send_response(session: &mut Session, response: PolicyResponse) -> Result<()> {
    let mut header = ResponseHeader::build(response.status, Some(response.headers.len() + 1))?;
    for (name, value) in &response.headers {
        header.insert_header(name.clone(), value.clone())?;
    }
    header.insert_header("Content-Length", response.body.len().to_string())?;

    session
        .write_response_header(Box::new(header), false)
        .await?;
    session
        .write_response_body(Some(Bytes::from(response.body)), true)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_uses_the_expected_status() {
        assert_eq!(not_found().status, 404);
        assert_eq!(method_not_allowed().status, 405);
        assert_eq!(bad_gateway().status, 502);
    }
}
