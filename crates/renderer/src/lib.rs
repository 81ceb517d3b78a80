//! Renderer crate for slidewave.
//!
//! Glues the winit window, the `wgpu` displacement and overlay pipelines and
//! the background image loader to the transition controller. The overall
//! flow is:
//!
//! ```text
//!   CLI / slidewave
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ WindowState ──▶ winit event loop ──▶ render_frame()
//!          ▲                 │                    │
//!          │                 │                    ├─▶ Slider::tick() ─▶ GPU UBO
//!          │                 │                    └─▶ overlay::build() ─▶ instances
//!   AssetLoader workers ◀────┘ (crossbeam channel, drained per frame)
//! ```
//!
//! `WindowState` owns the GPU resources and the controller; `Renderer` is the
//! thin entry point the binary talks to.

mod assets;
mod compile;
mod gpu;
mod overlay;
mod types;
mod window;

use anyhow::Result;

pub use types::{Antialiasing, ColorSpaceMode, DemoMode, RendererConfig};

/// High-level entry point that owns the chosen configuration.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Opens the window and blocks until it is closed.
    ///
    /// Fails when no window or GPU adapter can be created, or when the deck
    /// is empty.
    pub fn run(&mut self) -> Result<()> {
        window::run(self.config.clone())
    }
}
