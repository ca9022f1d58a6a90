//! Error taxonomy for the engine.
//!
//! Route misses and method mismatches are not modelled as errors: they
//! become `404`/`405` responses directly (spec.md §7). Only the two
//! phases that can genuinely fail independently of a well-formed
//! request get typed errors: composing the engine from route entries,
//! and validating a route template at construction time.

use thiserror::Error;

/// Failure while building the engine from a list of route entries.
///
/// Per spec.md §7, a configuration error is never fatal to the process:
/// the offending route entry is skipped with a diagnostic and
/// composition continues with the remaining entries.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("remote host url '{0}' could not be parsed: {1}")]
    InvalidRemoteUrl(String, String),

    #[error("DNS lookup for upstream host '{0}' failed: {1}")]
    UpstreamResolution(String, String),

    #[error("invalid CIDR '{0}': {1}")]
    InvalidCidr(String, String),

    #[error("route template '{0}' is invalid: {1}")]
    InvalidPattern(String, #[source] PatternError),

    #[error("no upstream replicas resolved for host '{0}'")]
    NoReplicas(String),
}

/// Failure while parsing or inserting a route template.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum PatternError {
    #[error("empty route template")]
    Empty,

    #[error("wildcard '*' may only appear as the final segment of a template")]
    WildcardNotTerminal,

    #[error("capture marker at byte {0} has an empty variable name")]
    EmptyCaptureName(usize),
}
