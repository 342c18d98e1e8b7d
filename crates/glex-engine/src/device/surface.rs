use raw_window_handle::RawWindowHandle;

/// Host drawing surface the context renders into.
///
/// Wraps the raw window handle delivered by the host's surface-created
/// callback. The handle is only dereferenced by the platform driver while
/// creating the window surface.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NativeSurface {
    raw: RawWindowHandle,
}

// SAFETY: the handle is an opaque token. The host guarantees the native window
// outlives the engine's surface-destroyed notification, and the engine only
// hands it to the platform driver, which performs its own synchronization.
unsafe impl Send for NativeSurface {}
unsafe impl Sync for NativeSurface {}

impl NativeSurface {
    pub fn new(raw: RawWindowHandle) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> RawWindowHandle {
        self.raw
    }
}

impl From<RawWindowHandle> for NativeSurface {
    fn from(raw: RawWindowHandle) -> Self {
        Self::new(raw)
    }
}
