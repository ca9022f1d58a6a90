//! Per-request parameter capture and the context pool that carries it.
//!
//! Grounded on the original's `router/context.go` (a `sync.Pool` of
//! `*Context` values keyed off the request) and on the teacher's general
//! preference for `parking_lot::Mutex` over `std::sync::Mutex` for
//! short, hot critical sections (used for the upstream group's lock,
//! §upstream/group.rs) — reused here for the free list.

use parking_lot::Mutex;
use std::sync::Arc;

/// An ordered list of captured `(name, value)` pairs. Duplicate names
/// are permitted; `get` returns the first occurrence (spec.md §3, §9
/// Open Questions: first-occurrence semantics are pinned down here).
#[derive(Debug, Default, Clone)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn clear(&mut self) {
        self.0.clear();
    }
}

/// The per-request state threaded through the middleware chain. Exactly
/// one context exists per in-flight request (spec.md §3).
#[derive(Debug, Default)]
pub struct Context {
    pub params: Params,
}

impl Context {
    fn reset(&mut self) {
        self.params.clear();
    }
}

/// A free list of recycled [`Context`] values. Acquiring yields a
/// recycled context or allocates a fresh one; the returned guard resets
/// and returns the context to the pool on drop — including on an
/// unwinding panic, so a context is never leaked or returned dirty
/// (spec.md §5 "Resource discipline").
#[derive(Debug, Default)]
pub struct ContextPool {
    free: Mutex<Vec<Box<Context>>>,
}

impl ContextPool {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn acquire(self: &Arc<Self>) -> PooledContext {
        let ctx = self
            .free
            .lock()
            .pop()
            .unwrap_or_else(|| Box::new(Context::default()));
        PooledContext {
            ctx: Some(ctx),
            pool: Arc::clone(self),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.free.lock().len()
    }
}

/// RAII handle to a pooled [`Context`]. Acquired before the trie match
/// and held through the terminal handler; returned to the pool on drop.
pub struct PooledContext {
    ctx: Option<Box<Context>>,
    pool: Arc<ContextPool>,
}

impl std::ops::Deref for PooledContext {
    type Target = Context;
    fn deref(&self) -> &Context {
        self.ctx.as_deref().expect("context taken before drop")
    }
}

impl std::ops::DerefMut for PooledContext {
    fn deref_mut(&mut self) -> &mut Context {
        self.ctx.as_deref_mut().expect("context taken before drop")
    }
}

impl Drop for PooledContext {
    fn drop(&mut self) {
        if let Some(mut ctx) = self.ctx.take() {
            ctx.reset();
            self.pool.free.lock().push(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn params_lookup_returns_first_occurrence() {
        let mut p = Params::default();
        p.push("a", "first");
        p.push("a", "second");
        assert_eq!(p.get("a"), Some("first"));
    }

    #[test]
    fn pool_recycles_and_resets_contexts() {
        let pool = ContextPool::new();
        {
            let mut ctx = pool.acquire();
            ctx.params.push("owner", "alice");
            assert_eq!(ctx.params.len(), 1);
        }
        assert_eq!(pool.len(), 1);
        let ctx = pool.acquire();
        assert!(ctx.params.is_empty());
    }

    #[test]
    fn concurrent_acquire_release_leaves_pool_clean() {
        let pool = ContextPool::new();
        let handles: Vec<_> = (0..32)
            .map(|i| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    let mut ctx = pool.acquire();
                    ctx.params.push("n", i.to_string());
                    assert_eq!(ctx.params.get("n"), Some(i.to_string().as_str()));
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let free = pool.free.lock();
        assert!(free.iter().all(|c| c.params.is_empty()));
    }
}
