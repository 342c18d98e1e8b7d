use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::device::NativeSurface;

use super::Engine;

/// Host-assigned surface identifier.
pub type SurfaceId = i64;

/// A surface announced before any engine claimed its id.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSurface {
    pub surface: NativeSurface,
    /// Last size reported while unclaimed.
    pub size: Option<(i32, i32)>,
}

#[derive(Default)]
struct Inner {
    engines: BTreeMap<SurfaceId, Weak<Engine>>,
    pending: BTreeMap<SurfaceId, PendingSurface>,
}

/// Routes host surface notifications by id to the engine bound to that id.
///
/// Resolves both orderings: an engine binding before its surface exists, and
/// a surface appearing before any engine binds its id. Engine callbacks run
/// outside the registry lock.
pub struct SurfaceRegistry {
    inner: Mutex<Inner>,
}

static GLOBAL: SurfaceRegistry = SurfaceRegistry::new();

/// The process-wide surface registry.
pub fn surfaces() -> &'static SurfaceRegistry {
    &GLOBAL
}

impl SurfaceRegistry {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                engines: BTreeMap::new(),
                pending: BTreeMap::new(),
            }),
        }
    }

    fn engine(&self, id: SurfaceId) -> Option<Arc<Engine>> {
        self.inner.lock().engines.get(&id).and_then(Weak::upgrade)
    }

    /// Binds `engine` to `id` and hands it any pending surface for that id.
    pub fn bind(&self, id: SurfaceId, engine: &Arc<Engine>) {
        let pending = {
            let mut inner = self.inner.lock();
            inner.engines.insert(id, Arc::downgrade(engine));
            inner.pending.remove(&id)
        };

        if let Some(p) = pending {
            log::debug!("surface {id} claimed from pending");
            // Size first, so the loop started by `created` never renders at
            // the stale default size.
            if let Some((w, h)) = p.size {
                engine.on_surface_changed(w, h);
            }
            engine.on_surface_created(p.surface);
        }
    }

    /// Removes the binding for `id` if it still points at `engine`.
    pub fn unbind(&self, id: SurfaceId, engine: &Engine) -> bool {
        let mut inner = self.inner.lock();
        let owned = inner
            .engines
            .get(&id)
            .is_some_and(|w| std::ptr::eq(w.as_ptr(), engine));
        if owned {
            inner.engines.remove(&id);
        }
        owned
    }

    /// Hands `surface` to the engine bound to `id`, or keeps it pending.
    ///
    /// The lookup and the pending insert happen under one guard, so a
    /// concurrent `bind` either sees the pending record or is seen here.
    pub fn notify_created(&self, id: SurfaceId, surface: NativeSurface) {
        let engine = {
            let mut inner = self.inner.lock();
            match inner.engines.get(&id).and_then(Weak::upgrade) {
                Some(engine) => engine,
                None => {
                    log::debug!("surface {id} created before bind; keeping it pending");
                    inner
                        .pending
                        .insert(id, PendingSurface { surface, size: None });
                    return;
                }
            }
        };
        engine.on_surface_created(surface);
    }

    pub fn notify_changed(&self, id: SurfaceId, width: i32, height: i32) {
        let engine = {
            let mut inner = self.inner.lock();
            match inner.engines.get(&id).and_then(Weak::upgrade) {
                Some(engine) => engine,
                None => {
                    match inner.pending.get_mut(&id) {
                        Some(p) => p.size = Some((width, height)),
                        None => log::warn!("size change for unknown surface {id}"),
                    }
                    return;
                }
            }
        };
        engine.on_surface_changed(width, height);
    }

    pub fn notify_destroyed(&self, id: SurfaceId) {
        let engine = {
            let mut inner = self.inner.lock();
            match inner.engines.get(&id).and_then(Weak::upgrade) {
                Some(engine) => engine,
                None => {
                    inner.pending.remove(&id);
                    return;
                }
            }
        };
        engine.on_surface_destroyed();
    }

    pub fn is_bound(&self, id: SurfaceId) -> bool {
        self.engine(id).is_some()
    }

    pub fn pending(&self, id: SurfaceId) -> Option<PendingSurface> {
        self.inner.lock().pending.get(&id).cloned()
    }
}

impl Default for SurfaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
