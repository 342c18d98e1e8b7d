use crate::device::{ContextConfig, FeatureLevel};
use crate::paint::Color;
use crate::render::ShaderStage;

/// Engine construction parameters.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Initial frame-rate target; clamped to at least 1.
    pub target_fps: u32,

    /// Clear color applied before the stages draw.
    pub background: Color,

    /// Stage list requested before the host asks for anything else.
    pub default_stages: Vec<String>,

    pub context: ContextConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            background: Color::DEFAULT_BACKGROUND,
            default_stages: vec![ShaderStage::NAME.to_owned()],
            context: ContextConfig::default(),
        }
    }
}

/// Coarse engine lifecycle state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EngineState {
    /// No surface.
    Unbound,
    /// Context and pipeline exist; the loop is not running.
    SurfaceReady,
    /// The render thread is active.
    Running,
}

/// Negotiated context description for hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextInfo {
    pub version: String,
    pub renderer: String,
    pub feature_level: Option<FeatureLevel>,
    pub width: i32,
    pub height: i32,
}

impl ContextInfo {
    pub(crate) fn not_initialized() -> Self {
        Self {
            version: "not initialized".into(),
            renderer: "not initialized".into(),
            feature_level: None,
            width: 0,
            height: 0,
        }
    }
}
