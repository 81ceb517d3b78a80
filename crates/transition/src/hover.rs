use std::time::{Duration, Instant};

use crate::easing::Easing;
use crate::timeline::Tween;

pub const DEFAULT_HOVER_DURATION: Duration = Duration::from_millis(500);

/// Width over height of the hover plane.
const PLANE_ASPECT: f32 = 16.0 / 9.0;
/// Share of the viewport height covered by the plane: a 2.25 unit tall plane
/// seen by a 75° camera from 2 units away.
const PLANE_HEIGHT_FRACTION: f32 = 0.733;

/// Pixel rectangle of the hover plane inside the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PlaneRect {
    /// Centred 16:9 plane, shrunk to fit narrow viewports.
    pub fn centered(viewport: [f32; 2]) -> Self {
        let [vw, vh] = viewport;
        let mut height = vh * PLANE_HEIGHT_FRACTION;
        let mut width = height * PLANE_ASPECT;
        if width > vw {
            width = vw;
            height = width / PLANE_ASPECT;
        }
        Self {
            x: (vw - width) * 0.5,
            y: (vh - height) * 0.5,
            width,
            height,
        }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Pointer-over-plane displacement: progress eases towards 1 while the
/// pointer is over the plane and back to 0 when it leaves.
#[derive(Debug, Clone)]
pub struct HoverEffect {
    duration: Duration,
    intensity: f32,
    progress: f32,
    hovered: bool,
    tween: Option<Tween>,
}

impl HoverEffect {
    pub fn new(duration: Duration, intensity: f32) -> Self {
        Self {
            duration,
            intensity,
            progress: 0.0,
            hovered: false,
            tween: None,
        }
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    pub fn plane_rect(&self, viewport: [f32; 2]) -> PlaneRect {
        PlaneRect::centered(viewport)
    }

    /// Pointer position in physical pixels.
    pub fn pointer_moved(&mut self, position: [f32; 2], viewport: [f32; 2], now: Instant) {
        let hit = self.plane_rect(viewport).contains(position[0], position[1]);
        self.set_hovered(hit, now);
    }

    /// Pointer left the window; treated as far outside the plane.
    pub fn pointer_left(&mut self, now: Instant) {
        self.set_hovered(false, now);
    }

    fn set_hovered(&mut self, hovered: bool, now: Instant) {
        if hovered == self.hovered {
            return;
        }
        self.hovered = hovered;
        let target = if hovered { 1.0 } else { 0.0 };
        tracing::trace!(hovered, from = self.progress, "hover retarget");
        self.tween = Some(Tween::new(
            self.progress,
            target,
            self.duration,
            Easing::Power2Out,
            now,
        ));
    }

    /// Advances the progress tween; returns true when a redraw is needed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(tween) = self.tween else {
            return false;
        };
        let (value, finished) = tween.sample(now);
        self.progress = value;
        if finished {
            self.tween = None;
        }
        true
    }
}
