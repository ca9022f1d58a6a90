//! A single upstream backend and its live connection count.
//!
//! Grounded on `original_source/pkg/liberty/balancer.go`'s `server`
//! type: an atomic counter bumped on `http.StateNew` and dropped again
//! on `http.StateClosed`/`http.StateHijacked`. pingora's
//! `connected_to_upstream` and `logging` phases (`proxy::gateway`) are
//! the equivalent hook points here, since this crate has no
//! `net.Conn`-level `ConnState` callback of its own to hang the counter
//! off.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};

/// One backend instance behind a host entry — e.g. one of several IPs
/// a `RemoteHost` resolved to (spec.md §4.5).
pub struct Replica {
    pub addr: SocketAddr,
    open_conns: AtomicU32,
}

impl Replica {
    pub fn new(addr: SocketAddr) -> Self {
        Replica {
            addr,
            open_conns: AtomicU32::new(0),
        }
    }

    pub fn open_conns(&self) -> u32 {
        self.open_conns.load(Ordering::Acquire)
    }

    pub fn on_connected(&self) {
        self.open_conns.fetch_add(1, Ordering::AcqRel);
    }

    pub fn on_disconnected(&self) {
        self.open_conns.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
            Some(n.saturating_sub(1))
        })
        .ok();
    }
}
