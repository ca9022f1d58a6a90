//! Path-pattern routing: parsing templates, matching them against
//! incoming requests, and pooling the per-request capture state
//! (spec.md §4.1-§4.3).

mod context;
mod pattern;
mod trie;

pub use context::{Context, ContextPool, Params, PooledContext};
pub use pattern::{CaptureVar, Method, RoutePattern, WILDCARD_VAR};
pub use trie::{Lookup, Trie};

use crate::error::{ConfigError, PatternError};

/// A single registered route: the template it answers under every
/// recognised verb, and the opaque handler it dispatches to once
/// matched. There is no per-route method selection (spec.md §4.7 step
/// 8 and `original_source/router.go`'s `Router.All`): registering a
/// template wires it under all of [`Method::ALL`] at once.
pub struct Router<H> {
    trie: Trie<H>,
    /// The chain consulted when the trie reports no match at all —
    /// the router's own fallback, set to the most recently registered
    /// handler (`original_source/reverse_proxy.go:220`'s unconditional
    /// `router.NotFound = chain`: any sub-path under a configured host
    /// still reaches an upstream rather than bouncing with a bare 404).
    not_found: Option<H>,
}

impl<H: Clone> Default for Router<H> {
    fn default() -> Self {
        Router {
            trie: Trie::new(),
            not_found: None,
        }
    }
}

impl<H: Clone> Router<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `template` and register it under every recognised HTTP
    /// verb, returning the parse error (rather than panicking) so the
    /// caller can skip a malformed route entry and continue composing
    /// the rest (spec.md §7). Also becomes this router's not-found
    /// fallback, overwriting whichever route registered it last.
    pub fn register(&mut self, template: &str, handler: H) -> Result<(), PatternError> {
        for method in Method::ALL {
            let pattern = RoutePattern::new(method, template)?;
            self.trie.insert(&pattern, handler.clone());
        }
        self.not_found = Some(handler);
        Ok(())
    }

    pub fn dispatch(&self, method: Method, path: &str) -> Lookup<'_, H> {
        match self.trie.lookup(method, path) {
            Lookup::NotFound => match &self.not_found {
                Some(handler) => Lookup::Matched {
                    handler,
                    params: Vec::new(),
                },
                None => Lookup::NotFound,
            },
            other => other,
        }
    }
}

/// Registers one route entry, turning a parse failure into a
/// [`ConfigError`] tagged with the owning template, for callers that
/// build a [`Router`] from a list of configuration entries rather than
/// hand-written calls to [`Router::register`].
pub fn register_or_skip<H: Clone>(
    router: &mut Router<H>,
    template: &str,
    handler: H,
) -> Result<(), ConfigError> {
    router
        .register(template, handler)
        .map_err(|err| ConfigError::InvalidPattern(template.to_string(), err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_dispatches_registered_routes() {
        let mut router: Router<&'static str> = Router::new();
        router.register("/ping", "pong").unwrap();
        match router.dispatch(Method::Get, "/ping") {
            Lookup::Matched { handler, .. } => assert_eq!(*handler, "pong"),
            _ => panic!("expected a match"),
        }
    }

    #[test]
    fn registering_a_template_answers_every_method() {
        let mut router: Router<&'static str> = Router::new();
        router.register("/ping", "pong").unwrap();
        for method in Method::ALL {
            match router.dispatch(method, "/ping") {
                Lookup::Matched { handler, .. } => assert_eq!(*handler, "pong"),
                _ => panic!("expected {method} to match"),
            }
        }
    }

    #[test]
    fn unmatched_sub_path_falls_through_to_the_not_found_handler() {
        let mut router: Router<&'static str> = Router::new();
        router.register("/app", "app-chain").unwrap();
        match router.dispatch(Method::Get, "/app/deeper/than/registered") {
            Lookup::Matched { handler, params } => {
                assert_eq!(*handler, "app-chain");
                assert!(params.is_empty());
            }
            _ => panic!("expected the not-found fallback to answer"),
        }
    }

    #[test]
    fn router_with_no_registrations_has_no_fallback() {
        let router: Router<&'static str> = Router::new();
        assert!(matches!(
            router.dispatch(Method::Get, "/anything"),
            Lookup::NotFound
        ));
    }

    #[test]
    fn malformed_template_is_reported_not_panicked() {
        let mut router: Router<&'static str> = Router::new();
        let err = register_or_skip(&mut router, "/a/*/b", "x").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern(_, PatternError::WildcardNotTerminal)));
    }
}
