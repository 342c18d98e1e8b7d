/// Framebuffer and presentation parameters for a [`GraphicsContext`](super::GraphicsContext).
///
/// Keep this structure stable and minimal. Channel sizes are minimums passed to
/// config selection; the platform may hand back a larger config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextConfig {
    pub red_size: u8,
    pub green_size: u8,
    pub blue_size: u8,
    pub alpha_size: u8,
    pub depth_size: u8,
    pub stencil_size: u8,

    /// Swap interval 1 when set, 0 otherwise.
    pub vsync: bool,
}

impl ContextConfig {
    pub fn swap_interval(&self) -> i32 {
        i32::from(self.vsync)
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            red_size: 8,
            green_size: 8,
            blue_size: 8,
            alpha_size: 8,
            depth_size: 16,
            stencil_size: 0,
            vsync: true,
        }
    }
}
