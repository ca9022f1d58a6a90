//! The request dispatch surface (spec.md §4.7-§4.8): composing route
//! entries into a running gateway, and the `pingora::proxy::ProxyHttp`
//! glue that drives it.

pub mod composer;
pub mod gateway;
pub mod handlers;
pub mod headers;

pub use composer::{compose, Gateway, RouteHandler, Terminal};
pub use gateway::{GatewayApp, InsecureRedirectApp};
