//! GPU side of the slider.
//!
//! - `context` owns wgpu instance/device/surface wiring and rebuilds the
//!   swapchain when the window resizes.
//! - `textures` keeps one texture per slide plus the displacement map, each
//!   starting as a 1x1 placeholder until its image arrives.
//! - `pipeline` builds the displacement and overlay render pipelines.
//! - `uniforms` mirrors the std140 uniform blocks declared in `compile.rs`.
//! - `state` glues everything together and exposes the `GpuState` API used by
//!   `window`.

mod context;
mod pipeline;
mod state;
mod textures;
mod uniforms;

pub(crate) use state::{FrameInput, GpuState};
