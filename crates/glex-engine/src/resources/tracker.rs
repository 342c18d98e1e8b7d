use std::sync::atomic::{AtomicU64, Ordering};

/// Kind of GL object being counted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Program,
    Shader,
    Buffer,
    VertexArray,
    Texture,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        Self::Program,
        Self::Shader,
        Self::Buffer,
        Self::VertexArray,
        Self::Texture,
    ];
}

/// Point-in-time copy of the counters.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ResourceStats {
    pub programs: u64,
    pub shaders: u64,
    pub buffers: u64,
    pub vertex_arrays: u64,
    pub textures: u64,
}

impl ResourceStats {
    pub fn get(&self, kind: ResourceKind) -> u64 {
        match kind {
            ResourceKind::Program => self.programs,
            ResourceKind::Shader => self.shaders,
            ResourceKind::Buffer => self.buffers,
            ResourceKind::VertexArray => self.vertex_arrays,
            ResourceKind::Texture => self.textures,
        }
    }

    pub fn total(&self) -> u64 {
        ResourceKind::ALL.iter().map(|&k| self.get(k)).sum()
    }
}

/// Atomic counters of live GL objects.
///
/// Deletes saturate at zero, so a double delete can never drive a counter
/// negative or wrap it.
#[derive(Debug, Default)]
pub struct ResourceTracker {
    programs: AtomicU64,
    shaders: AtomicU64,
    buffers: AtomicU64,
    vertex_arrays: AtomicU64,
    textures: AtomicU64,
}

static GLOBAL: ResourceTracker = ResourceTracker::new();

/// The process-wide tracker.
pub fn tracker() -> &'static ResourceTracker {
    &GLOBAL
}

impl ResourceTracker {
    pub const fn new() -> Self {
        Self {
            programs: AtomicU64::new(0),
            shaders: AtomicU64::new(0),
            buffers: AtomicU64::new(0),
            vertex_arrays: AtomicU64::new(0),
            textures: AtomicU64::new(0),
        }
    }

    fn counter(&self, kind: ResourceKind) -> &AtomicU64 {
        match kind {
            ResourceKind::Program => &self.programs,
            ResourceKind::Shader => &self.shaders,
            ResourceKind::Buffer => &self.buffers,
            ResourceKind::VertexArray => &self.vertex_arrays,
            ResourceKind::Texture => &self.textures,
        }
    }

    pub fn on_create(&self, kind: ResourceKind) {
        self.on_create_n(kind, 1);
    }

    pub fn on_create_n(&self, kind: ResourceKind, count: u64) {
        self.counter(kind).fetch_add(count, Ordering::AcqRel);
    }

    pub fn on_delete(&self, kind: ResourceKind) {
        self.on_delete_n(kind, 1);
    }

    /// Decrements by `count`, clamping at zero.
    pub fn on_delete_n(&self, kind: ResourceKind, count: u64) {
        let counter = self.counter(kind);
        let prev = counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                Some(cur.saturating_sub(count))
            })
            .unwrap_or_default();
        if prev < count {
            log::warn!("{kind:?} counter underflow: deleting {count} with {prev} live");
        }
    }

    pub fn count(&self, kind: ResourceKind) -> u64 {
        self.counter(kind).load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> ResourceStats {
        ResourceStats {
            programs: self.count(ResourceKind::Program),
            shaders: self.count(ResourceKind::Shader),
            buffers: self.count(ResourceKind::Buffer),
            vertex_arrays: self.count(ResourceKind::VertexArray),
            textures: self.count(ResourceKind::Texture),
        }
    }

    /// Zeroes every counter.
    pub fn reset(&self) {
        for kind in ResourceKind::ALL {
            self.counter(kind).store(0, Ordering::Release);
        }
    }
}
