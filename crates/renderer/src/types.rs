use std::time::Duration;

use slideconfig::{AssetSource, ResolvedSlide};
use transition::hover::DEFAULT_HOVER_DURATION;
use transition::slider::DEFAULT_DURATION;

/// Which demo the window runs.
///
/// * `Slider` cycles through the whole deck on wheel and key input.
/// * `Hover` shows the first two slides on a centred plane and blends them
///   while the pointer rests over it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DemoMode {
    #[default]
    Slider,
    Hover,
}

/// Output color handling for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSpaceMode {
    /// Photos are sampled as stored; prefer a non-sRGB swapchain.
    #[default]
    Auto,
    Gamma,
    /// Decode textures to linear and let an sRGB swapchain re-encode.
    Linear,
}

/// Anti-aliasing policy for the render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Antialiasing {
    /// Pick the highest sample count supported by the surface format.
    #[default]
    Auto,
    /// Disable MSAA and render directly into the swapchain.
    Off,
    /// Request a specific MSAA sample count (clamped to what the device supports).
    Samples(u32),
}

/// Immutable configuration passed to the renderer at start-up.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Window size in physical pixels.
    pub surface_size: (u32, u32),
    pub mode: DemoMode,
    pub slides: Vec<ResolvedSlide>,
    /// Displacement map; a flat placeholder is used when absent.
    pub displacement: Option<AssetSource>,
    pub transition_duration: Duration,
    pub hover_duration: Duration,
    pub intensity: f32,
    pub hover_intensity: f32,
    /// Optional frame cap while animating; None = redraw on every vblank.
    pub target_fps: Option<f32>,
    pub antialiasing: Antialiasing,
    pub color_space: ColorSpaceMode,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (1600, 900),
            mode: DemoMode::Slider,
            slides: Vec::new(),
            displacement: None,
            transition_duration: DEFAULT_DURATION,
            hover_duration: DEFAULT_HOVER_DURATION,
            intensity: 1.0,
            hover_intensity: 1.0,
            target_fps: None,
            antialiasing: Antialiasing::default(),
            color_space: ColorSpaceMode::default(),
        }
    }
}
