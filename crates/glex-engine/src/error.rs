//! Engine error type.
//!
//! Internal operations return [`EngineResult`]. The [`Engine`](crate::engine::Engine)
//! façade never hands these to the host; it renders them into the last-error
//! string instead.

use parking_lot::Mutex;

use crate::device::{FeatureLevel, ShaderKind};

/// Errors produced by the engine core.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No display, config or context could be obtained.
    #[error("context negotiation failed: {0}")]
    ContextNegotiation(String),

    #[error("{kind} shader compile failed: {log}")]
    ShaderCompile { kind: ShaderKind, log: String },

    #[error("program link failed: {0}")]
    ShaderLink(String),

    #[error("unknown stage '{0}'")]
    UnknownStage(String),

    #[error("stage '{stage}' requires higher feature level (needs {required}, context provides {available})")]
    FeatureLevelTooLow {
        stage: String,
        required: FeatureLevel,
        available: FeatureLevel,
    },

    #[error("stage '{stage}' failed to initialize: {reason}")]
    StageInit { stage: String, reason: String },

    /// Operation attempted while the context or thread is not ready.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// Presentation failed; carries the platform error code.
    #[error("swap buffers failed (platform error 0x{0:04x})")]
    SwapFailed(i32),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("registration failed: {0}")]
    Registration(String),

    #[error("failed to spawn render thread")]
    ThreadSpawn(#[from] std::io::Error),

    #[error("shader file: {0}")]
    ShaderFile(String),
}

impl EngineError {
    pub(crate) fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// True for failures that end a running render loop.
    pub fn is_fatal_to_loop(&self) -> bool {
        matches!(self, Self::SwapFailed(_))
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Most recent failure, as text.
///
/// Each `record` overwrites the previous message. Reading and clearing are
/// independent of every other engine lock.
#[derive(Debug, Default)]
pub struct LastError {
    message: Mutex<Option<String>>,
}

impl LastError {
    pub const fn new() -> Self {
        Self {
            message: Mutex::new(None),
        }
    }

    /// Logs `err` at error level and stores its message.
    pub fn record(&self, err: &EngineError) {
        log::error!("{err}");
        self.set(err.to_string());
    }

    pub fn set(&self, message: impl Into<String>) {
        *self.message.lock() = Some(message.into());
    }

    pub fn get(&self) -> Option<String> {
        self.message.lock().clone()
    }

    pub fn clear(&self) {
        *self.message.lock() = None;
    }

    pub fn is_set(&self) -> bool {
        self.message.lock().is_some()
    }
}
