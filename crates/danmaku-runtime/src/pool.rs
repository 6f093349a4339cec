#![forbid(unsafe_code)]

//! Render handle pool.
//!
//! Message churn is high and handles may be expensive to create on the host
//! side, so released handles are parked here and reused. The pool only grows
//! while the scheduler is alive; peak memory is traded for zero steady-state
//! allocation.
//!
//! Closure: at any instant between scheduler calls,
//! `idle_len() + active messages == allocated()`.

use crate::surface::RenderHandle;

/// Recycling store of idle render handles.
#[derive(Debug)]
pub struct HandlePool<H> {
    idle: Vec<H>,
    allocated: usize,
}

impl<H> Default for HandlePool<H> {
    fn default() -> Self {
        Self {
            idle: Vec::new(),
            allocated: 0,
        }
    }
}

impl<H: RenderHandle> HandlePool<H> {
    /// An empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take an idle handle, or allocate one with `create` if none is idle.
    pub fn acquire_with(&mut self, create: impl FnOnce() -> H) -> H {
        if let Some(handle) = self.idle.pop() {
            return handle;
        }
        self.allocated += 1;
        tracing::debug!(
            target: "danmaku.pool",
            allocated = self.allocated,
            "pool grew"
        );
        create()
    }

    /// Deactivate and clear `handle`, then park it for reuse.
    pub fn release(&mut self, mut handle: H) {
        handle.set_active(false);
        handle.set_text("");
        self.idle.push(handle);
    }

    /// Allocate handles up front until at least `count` are idle.
    pub fn prewarm(&mut self, count: usize, mut create: impl FnMut() -> H) {
        while self.idle.len() < count {
            self.allocated += 1;
            self.idle.push(create());
        }
    }

    /// Drop every idle handle and forget the allocation count.
    ///
    /// Only valid when no handle is checked out, i.e. when the surface the
    /// handles belong to has gone away and every message was terminated.
    /// Returns the number of handles dropped.
    pub fn discard(&mut self) -> usize {
        let dropped = self.idle.len();
        self.idle.clear();
        self.allocated = 0;
        dropped
    }

    /// Handles currently parked.
    #[inline]
    pub fn idle_len(&self) -> usize {
        self.idle.len()
    }

    /// Handles ever created through this pool.
    #[inline]
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    /// Iterate over the parked handles.
    pub fn idle(&self) -> impl Iterator<Item = &H> {
        self.idle.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use danmaku_core::{Point, Rgba, Size};

    #[derive(Debug, Default)]
    struct Probe {
        text: String,
        active: bool,
    }

    impl RenderHandle for Probe {
        fn set_text(&mut self, text: &str) {
            self.text = text.to_owned();
        }
        fn set_color(&mut self, _color: Rgba) {}
        fn set_position(&mut self, _position: Point) {}
        fn measure(&self) -> Size {
            Size::new(self.text.len() as f32, 1.0)
        }
        fn set_active(&mut self, active: bool) {
            self.active = active;
        }
        fn is_active(&self) -> bool {
            self.active
        }
    }

    #[test]
    fn acquire_allocates_only_when_empty() {
        let mut pool = HandlePool::<Probe>::new();
        let mut created = 0;
        let a = pool.acquire_with(|| {
            created += 1;
            Probe::default()
        });
        assert_eq!(pool.allocated(), 1);
        pool.release(a);
        let _b = pool.acquire_with(|| {
            created += 1;
            Probe::default()
        });
        assert_eq!(created, 1);
        assert_eq!(pool.allocated(), 1);
        assert_eq!(pool.idle_len(), 0);
    }

    #[test]
    fn release_clears_and_deactivates() {
        let mut pool = HandlePool::new();
        let mut h = pool.acquire_with(Probe::default);
        h.set_text("hello");
        h.set_active(true);
        pool.release(h);
        let parked = pool.idle().next().unwrap();
        assert!(parked.text.is_empty());
        assert!(!parked.is_active());
    }

    #[test]
    fn prewarm_fills_idle_set() {
        let mut pool = HandlePool::new();
        pool.prewarm(4, Probe::default);
        assert_eq!(pool.idle_len(), 4);
        assert_eq!(pool.allocated(), 4);
        pool.prewarm(2, Probe::default);
        assert_eq!(pool.allocated(), 4);
    }

    #[test]
    fn discard_empties_everything() {
        let mut pool = HandlePool::new();
        pool.prewarm(3, Probe::default);
        assert_eq!(pool.discard(), 3);
        assert_eq!(pool.idle_len(), 0);
        assert_eq!(pool.allocated(), 0);
    }
}
