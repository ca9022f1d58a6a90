//! Answer Go's `go get` vanity-import protocol with a `go-import` meta
//! page instead of proxying the request upstream.
//!
//! Grounded on `original_source/middleware/go_get_handler.go`: when the
//! request carries `?go-get=1`, render a tiny HTML document advertising
//! the repository's git remote rather than forwarding to the backend.
//! The original renders this with `html/template`; we build the same
//! four placeholders with ordinary string formatting instead of taking
//! on a templating crate for one fixed document, and escape the two
//! request-derived fields (`host`, `path`) since they land in HTML
//! attribute and text context.

use super::{Middleware, Outcome, RequestInfo, Response};

pub struct GoGet {
    /// The git remote prefix, e.g. `https://github.com/example-org`.
    pub remote_base: String,
}

impl GoGet {
    pub fn new(remote_base: impl Into<String>) -> Self {
        GoGet {
            remote_base: remote_base.into(),
        }
    }

    fn render(&self, host: &str, path: &str) -> Vec<u8> {
        let host = escape_html(host);
        let path = escape_html(path);
        format!(
            "<!DOCTYPE html>\n\
<html>\n\
<head>\n\
<meta http-equiv=\"Content-Type\" content=\"text/html; charset=utf-8\"/>\n\
<meta name=\"go-import\" content=\"{host}{path} git {base}{path}\">\n\
<meta http-equiv=\"refresh\" content=\"0; url=https://pkg.go.dev/{host}{path}\">\n\
</head>\n\
<body>\n\
<a href=\"https://pkg.go.dev/{host}{path}\">{host}{path}</a>.\n\
</body>\n\
</html>\n",
            host = host,
            path = path,
            base = self.remote_base,
        )
        .into_bytes()
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl Middleware for GoGet {
    fn evaluate(&self, request: &RequestInfo<'_>) -> Outcome {
        let wants_go_get = request
            .query
            .map(|q| q.split('&').any(|kv| kv == "go-get=1"))
            .unwrap_or(false);

        if !wants_go_get {
            return Outcome::Continue;
        }

        let body = self.render(request.host, request.path);
        Outcome::Respond(
            Response::new(200, body).with_header("Content-Type", "text/html; charset=utf-8"),
        )
    }

    fn name(&self) -> &str {
        "go-get"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::Params;

    fn request<'a>(path: &'a str, query: Option<&'a str>, params: &'a Params) -> RequestInfo<'a> {
        RequestInfo {
            method: "GET",
            host: "example.com",
            path,
            remote_ip: "127.0.0.1".parse().unwrap(),
            forwarded_for: None,
            query,
            referer: None,
            authorization: None,
            connection: None,
            upgrade: None,
            params,
        }
    }

    #[test]
    fn ignores_requests_without_go_get() {
        let mw = GoGet::new("https://github.com/example-org");
        let params = Params::default();
        assert!(matches!(
            mw.evaluate(&request("/widgets", None, &params)),
            Outcome::Continue
        ));
    }

    #[test]
    fn renders_go_import_meta_for_go_get_requests() {
        let mw = GoGet::new("https://github.com/example-org");
        let params = Params::default();
        match mw.evaluate(&request("/widgets", Some("go-get=1"), &params)) {
            Outcome::Respond(response) => {
                let body = String::from_utf8(response.body).unwrap();
                assert!(body.contains("go-import"));
                assert!(body.contains("example.com/widgets"));
            }
            Outcome::Continue => panic!("expected a go-import response"),
        }
    }
}
