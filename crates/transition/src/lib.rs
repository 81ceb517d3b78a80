//! Transition state machine for the displacement slider.
//!
//! Everything in this crate is GPU-free and driven by caller-supplied
//! `Instant`s, so the sequencing can be exercised deterministically:
//!
//! ```text
//!   wheel / keys ──▶ Slider::request(direction, now)
//!                        │  texture pair assigned, generation bumped
//!                        ├─▶ Tween (disp_power 0 → 1, expo in-out)
//!                        └─▶ Timeline (stage tracks, ~3.5s)
//!   frame loop   ──▶ Slider::tick(now) ──▶ TickOutcome { redraw, completed }
//! ```
//!
//! - `easing` holds the curves used by tweens and timeline tracks.
//! - `timeline` provides the scalar `Tween` and the targeted-track `Timeline`.
//! - `stage` is the owned replacement for per-element styles (slide
//!   containers, image strips, text lines, bullets, scroll hint).
//! - `slider` is the transition controller.
//! - `hover` drives the pointer-over-plane demo.

pub mod easing;
pub mod hover;
pub mod slider;
pub mod stage;
pub mod timeline;

pub use easing::Easing;
pub use hover::{HoverEffect, PlaneRect};
pub use slider::{
    Completion, Direction, DisplacementUniforms, Generation, Slider, TickOutcome,
    TransitionState,
};
pub use stage::{
    BulletStyle, HintStyle, SlideDeck, SlideLayout, SlideStyle, Stage, StripStyle, Target,
};
pub use timeline::{Timeline, Track, Tween};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("slide deck must contain at least one slide")]
    EmptyDeck,
    #[error("slide {0} must have at least one image strip")]
    NoStrips(usize),
}
