use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use transition::{
    Direction, DisplacementUniforms, HoverEffect, PlaneRect, SlideDeck, SlideLayout, Slider,
};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, KeyEvent, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::assets::{AssetEvent, AssetLoader, AssetSlot};
use crate::gpu::{FrameInput, GpuState};
use crate::overlay::{self, OverlayQuad};
use crate::types::{DemoMode, RendererConfig};

const WINDOW_TITLE: &str = "slidewave";

/// What the window is currently showing.
enum Demo {
    Slider(Slider),
    Hover {
        effect: HoverEffect,
        image_size: [f32; 2],
        texture_b: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Step(Direction),
    Quit,
}

/// Owns everything the event loop touches: window, GPU state, controller
/// and the asset channel.
pub(crate) struct WindowState {
    window: Arc<Window>,
    gpu: GpuState,
    demo: Demo,
    assets: AssetLoader,
    pending_assets: usize,
    captions: Vec<Vec<String>>,
    pacer: FramePacer,
}

impl WindowState {
    pub(crate) fn new(window: Arc<Window>, config: &RendererConfig) -> Result<Self> {
        let layouts = config
            .slides
            .iter()
            .map(|slide| SlideLayout {
                strips: slide.strips,
                lines: slide.lines.len(),
            })
            .collect();
        let deck = SlideDeck::new(layouts).context("cannot build slide deck")?;

        let size = window.inner_size();
        let gpu = GpuState::new(
            window.as_ref(),
            size,
            config.antialiasing,
            config.color_space,
            deck.len(),
        )
        .context("failed to initialise GPU state")?;

        let demo = match config.mode {
            DemoMode::Slider => {
                let mut slider = Slider::new(deck, config.transition_duration, config.intensity);
                slider.handle_resize(size.width, size.height);
                Demo::Slider(slider)
            }
            DemoMode::Hover => Demo::Hover {
                effect: HoverEffect::new(config.hover_duration, config.hover_intensity),
                image_size: [1.0, 1.0],
                texture_b: Direction::Next.step(0, deck.len()),
            },
        };

        let assets = AssetLoader::new(gpu.max_texture_dimension());
        let mut pending_assets = 0;
        for (index, slide) in config.slides.iter().enumerate() {
            if assets.load(AssetSlot::Slide(index), slide.source.clone()) {
                pending_assets += 1;
            }
        }
        match &config.displacement {
            Some(source) => {
                if assets.load(AssetSlot::Displacement, source.clone()) {
                    pending_assets += 1;
                }
            }
            None => tracing::warn!("no displacement map configured; transitions will not distort"),
        }

        tracing::info!(
            mode = ?config.mode,
            slides = config.slides.len(),
            "window ready"
        );

        Ok(Self {
            window,
            gpu,
            demo,
            assets,
            pending_assets,
            captions: config.slides.iter().map(|slide| slide.lines.clone()).collect(),
            pacer: FramePacer::new(config.target_fps),
        })
    }

    pub(crate) fn window(&self) -> &Window {
        self.window.as_ref()
    }

    fn viewport(&self) -> [f32; 2] {
        let size = self.gpu.size();
        [size.width as f32, size.height as f32]
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.gpu.resize(new_size);
        if let Demo::Slider(slider) = &mut self.demo {
            slider.handle_resize(new_size.width, new_size.height);
        }
        self.window.request_redraw();
    }

    fn request(&mut self, direction: Direction) {
        let Demo::Slider(slider) = &mut self.demo else {
            return;
        };
        if slider.request(direction, Instant::now()).is_some() {
            self.window.request_redraw();
        }
    }

    fn handle_cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        let viewport = self.viewport();
        if let Demo::Hover { effect, .. } = &mut self.demo {
            effect.pointer_moved(
                [position.x as f32, position.y as f32],
                viewport,
                Instant::now(),
            );
        }
    }

    fn handle_cursor_left(&mut self) {
        if let Demo::Hover { effect, .. } = &mut self.demo {
            effect.pointer_left(Instant::now());
        }
    }

    /// Uploads whatever the asset workers have finished since the last frame.
    fn drain_assets(&mut self) {
        for event in self.assets.drain() {
            self.pending_assets = self.pending_assets.saturating_sub(1);
            match event {
                AssetEvent::Loaded { slot, image } => {
                    let (width, height) = image.dimensions();
                    match slot {
                        AssetSlot::Slide(index) => {
                            if index == 0 {
                                self.record_image_size(width, height);
                            }
                            self.gpu.upload_slide(index, image);
                        }
                        AssetSlot::Displacement => self.gpu.upload_displacement(image),
                    }
                }
                AssetEvent::Failed { slot, error } => {
                    tracing::error!(%slot, %error, "failed to load image; keeping placeholder");
                }
            }
        }
    }

    fn record_image_size(&mut self, width: u32, height: u32) {
        match &mut self.demo {
            Demo::Slider(slider) => slider.set_image_size(width, height),
            Demo::Hover { image_size, .. } => {
                *image_size = [width.max(1) as f32, height.max(1) as f32];
            }
        }
    }

    pub(crate) fn render_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.drain_assets();
        let now = Instant::now();
        let viewport = self.viewport();
        let (uniforms, plane, quads): (DisplacementUniforms, Option<PlaneRect>, Vec<OverlayQuad>) =
            match &mut self.demo {
                Demo::Slider(slider) => {
                    let outcome = slider.tick(now);
                    if let Some(done) = outcome.completed {
                        tracing::info!(slide = done.to, "showing slide");
                    }
                    let quads = overlay::build(slider.stage(), &self.captions, viewport);
                    (slider.uniforms(), None, quads)
                }
                Demo::Hover {
                    effect,
                    image_size,
                    texture_b,
                } => {
                    effect.tick(now);
                    let rect = effect.plane_rect(viewport);
                    let uniforms = DisplacementUniforms {
                        disp_power: effect.progress(),
                        intensity: effect.intensity(),
                        resolution: [rect.width, rect.height],
                        size: *image_size,
                        texture_a: 0,
                        texture_b: *texture_b,
                    };
                    (uniforms, Some(rect), Vec::new())
                }
            };
        let result = self.gpu.render(&FrameInput {
            uniforms,
            plane,
            quads: &quads,
        });
        if result.is_ok() {
            self.pacer.mark_rendered(now);
        }
        result
    }

    /// True while something on screen is still moving or about to change.
    fn wants_frames(&self) -> bool {
        let moving = match &self.demo {
            Demo::Slider(slider) => slider.wants_frames(),
            Demo::Hover { effect, .. } => effect.is_animating(),
        };
        moving || self.pending_assets > 0
    }
}

/// Spacing between redraws; `None` leaves pacing to vsync.
#[derive(Debug, Clone)]
struct FramePacer {
    interval: Option<Duration>,
    last_frame: Option<Instant>,
}

impl FramePacer {
    fn new(target_fps: Option<f32>) -> Self {
        let interval = target_fps
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .and_then(|fps| match Duration::try_from_secs_f32(1.0 / fps) {
                Ok(interval) => Some(interval),
                Err(err) => {
                    tracing::warn!(fps, error = %err, "frame cap out of range; running uncapped");
                    None
                }
            });
        Self {
            interval,
            last_frame: None,
        }
    }

    fn mark_rendered(&mut self, now: Instant) {
        self.last_frame = Some(now);
    }

    fn next_deadline(&self) -> Option<Instant> {
        Some(self.last_frame? + self.interval?)
    }

    fn ready_for_frame(&self, now: Instant) -> bool {
        self.next_deadline().map_or(true, |deadline| now >= deadline)
    }
}

/// Positive "next" delta advances. winit reports scrolling down as a
/// negative y.
fn wheel_direction(delta: MouseScrollDelta) -> Option<Direction> {
    let y = match delta {
        MouseScrollDelta::LineDelta(_, y) => y as f64,
        MouseScrollDelta::PixelDelta(position) => position.y,
    };
    if y == 0.0 {
        None
    } else if y < 0.0 {
        Some(Direction::Next)
    } else {
        Some(Direction::Prev)
    }
}

fn key_action(key: &Key) -> Option<KeyAction> {
    match key {
        Key::Named(NamedKey::ArrowRight | NamedKey::ArrowDown | NamedKey::PageDown) => {
            Some(KeyAction::Step(Direction::Next))
        }
        Key::Named(NamedKey::ArrowLeft | NamedKey::ArrowUp | NamedKey::PageUp) => {
            Some(KeyAction::Step(Direction::Prev))
        }
        Key::Named(NamedKey::Escape) => Some(KeyAction::Quit),
        _ => None,
    }
}

fn pressed(event: &KeyEvent) -> bool {
    event.state == ElementState::Pressed
}

pub(crate) fn run(config: RendererConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let window = WindowBuilder::new()
        .with_title(WINDOW_TITLE)
        .with_inner_size(PhysicalSize::new(
            config.surface_size.0,
            config.surface_size.1,
        ))
        .build(&event_loop)
        .context("failed to create window")?;
    let window = Arc::new(window);

    let mut state = WindowState::new(window, &config)?;
    state.window().request_redraw();

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                match event {
                    WindowEvent::CloseRequested | WindowEvent::Destroyed => elwt.exit(),
                    WindowEvent::KeyboardInput { event, .. } if pressed(&event) => {
                        match key_action(&event.logical_key) {
                            Some(KeyAction::Step(direction)) => state.request(direction),
                            Some(KeyAction::Quit) => elwt.exit(),
                            None => {}
                        }
                    }
                    WindowEvent::MouseWheel { delta, .. } => {
                        if let Some(direction) = wheel_direction(delta) {
                            state.request(direction);
                        }
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        state.handle_cursor_moved(position);
                        state.window().request_redraw();
                    }
                    WindowEvent::CursorLeft { .. } => {
                        state.handle_cursor_left();
                        state.window().request_redraw();
                    }
                    WindowEvent::Resized(new_size) => state.resize(new_size),
                    WindowEvent::RedrawRequested => match state.render_frame() {
                        Ok(()) => {}
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            state.resize(state.gpu.size());
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            tracing::error!("surface out of memory; exiting");
                            elwt.exit();
                        }
                        Err(wgpu::SurfaceError::Timeout) => {
                            tracing::warn!("surface timeout; retrying next frame");
                        }
                        Err(other) => {
                            tracing::warn!(error = ?other, "surface error; retrying next frame");
                        }
                    },
                    _ => {}
                }
            }
            Event::AboutToWait => {
                if !state.wants_frames() {
                    elwt.set_control_flow(ControlFlow::Wait);
                    return;
                }
                let now = Instant::now();
                if state.pacer.ready_for_frame(now) {
                    tracing::trace!("animating: issuing redraw");
                    state.window().request_redraw();
                    elwt.set_control_flow(ControlFlow::Wait);
                } else if let Some(deadline) = state.pacer.next_deadline() {
                    elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
                }
            }
            _ => {}
        })
        .map_err(|err| anyhow!("window event loop error: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrolling_down_advances() {
        assert_eq!(
            wheel_direction(MouseScrollDelta::LineDelta(0.0, -1.0)),
            Some(Direction::Next)
        );
        assert_eq!(
            wheel_direction(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 12.0))),
            Some(Direction::Prev)
        );
        assert_eq!(wheel_direction(MouseScrollDelta::LineDelta(3.0, 0.0)), None);
    }

    #[test]
    fn navigation_keys_map_to_directions() {
        for key in [NamedKey::ArrowRight, NamedKey::ArrowDown, NamedKey::PageDown] {
            assert_eq!(
                key_action(&Key::Named(key)),
                Some(KeyAction::Step(Direction::Next))
            );
        }
        for key in [NamedKey::ArrowLeft, NamedKey::ArrowUp, NamedKey::PageUp] {
            assert_eq!(
                key_action(&Key::Named(key)),
                Some(KeyAction::Step(Direction::Prev))
            );
        }
        assert_eq!(
            key_action(&Key::Named(NamedKey::Escape)),
            Some(KeyAction::Quit)
        );
        assert_eq!(key_action(&Key::Named(NamedKey::Space)), None);
    }

    #[test]
    fn uncapped_pacer_is_always_ready() {
        let mut pacer = FramePacer::new(None);
        let now = Instant::now();
        assert!(pacer.ready_for_frame(now));
        pacer.mark_rendered(now);
        assert!(pacer.ready_for_frame(now));
        assert_eq!(pacer.next_deadline(), None);
    }

    #[test]
    fn capped_pacer_waits_for_interval() {
        let mut pacer = FramePacer::new(Some(8.0));
        let start = Instant::now();
        assert!(pacer.ready_for_frame(start));
        pacer.mark_rendered(start);
        assert!(!pacer.ready_for_frame(start + Duration::from_millis(60)));
        assert!(pacer.ready_for_frame(start + Duration::from_millis(125)));
        assert_eq!(
            pacer.next_deadline(),
            Some(start + Duration::from_millis(125))
        );
    }

    #[test]
    fn invalid_fps_disables_cap() {
        assert!(FramePacer::new(Some(0.0)).interval.is_none());
        assert!(FramePacer::new(Some(f32::NAN)).interval.is_none());
    }

    #[test]
    fn vanishingly_small_fps_runs_uncapped() {
        let pacer = FramePacer::new(Some(1e-30));
        assert!(pacer.interval.is_none());
        assert!(pacer.ready_for_frame(Instant::now()));
    }
}
