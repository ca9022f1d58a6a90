//! Environment facts gathered once at composition time, rather than
//! read ad hoc from inside request handling (spec.md §9's "gather into
//! a single immutable startup-scope structure").
//!
//! Grounded on `original_source/middleware/handlers.go`'s
//! `parseForwarderIP`, which only trusts `X-Forwarded-For` when the
//! process is running in production — spec.md §6's `APP_ENV` gate. The
//! original reads the environment variable inline, at request time;
//! here it's read once and threaded down as a plain `bool`, so a
//! misconfigured environment can't flip trust mid-process and
//! `middleware::ip_restrict`/`middleware::whitelist` never touch
//! `std::env` themselves.

use std::env;

const APP_ENV_VAR: &str = "APP_ENV";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Stage,
    Prod,
}

impl Environment {
    fn from_str(value: &str) -> Self {
        match value {
            "prod" | "production" => Environment::Prod,
            "stage" | "staging" => Environment::Stage,
            _ => Environment::Dev,
        }
    }
}

/// Facts read from the process environment once, at startup, and
/// carried through the rest of composition. `BasicAuthEntry` credentials
/// and CORS/CIDR lists still arrive per-route through `RouteEntry`
/// rather than through here — this only covers the one setting spec.md
/// ties to the process's deployment environment rather than to a route.
pub struct StartupScope {
    environment: Environment,
}

impl StartupScope {
    pub fn from_env() -> Self {
        let environment = env::var(APP_ENV_VAR)
            .map(|value| Environment::from_str(&value))
            .unwrap_or(Environment::Dev);
        StartupScope { environment }
    }

    pub fn with_environment(environment: Environment) -> Self {
        StartupScope { environment }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Whether `X-Forwarded-For` should be trusted over the socket's
    /// peer address — true in production only.
    pub fn trust_forwarded_for(&self) -> bool {
        self.environment == Environment::Prod
    }
}
