use std::time::{Duration, Instant};

use crate::easing::Easing;
use crate::stage::{SlideDeck, Stage, Target, INACTIVE_BULLET_ALPHA};
use crate::timeline::{Timeline, Tween};

/// Monotonically increasing id of a transition.
pub type Generation = u64;

pub const DEFAULT_DURATION: Duration = Duration::from_millis(2500);

const STRIP_EXIT_PERCENT: f32 = 185.0;
const STRIP_ENTER_PERCENT: f32 = 150.0;
const STRIP_STRETCH: f32 = 1.5;
const STRIP_STAGGER: f32 = 0.075;
const STRIP_DURATION: f32 = 1.5;
const LINE_TRAVEL_PERCENT: f32 = 100.0;
const LINE_DURATION: f32 = 2.0;
const LINE_ENTER_AT: f32 = 1.5;
const BULLET_DURATION: f32 = 1.5;
const INCOMING_AT: f32 = 1.0;
const OUTGOING_HIDDEN_AT: f32 = 2.0;
const HINT_TRAVEL_PERCENT: f32 = 100.0;
const HINT_DURATION: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

impl Direction {
    /// +1 for forward travel. Translations are multiplied by this.
    pub fn sign(self) -> f32 {
        match self {
            Direction::Next => 1.0,
            Direction::Prev => -1.0,
        }
    }

    pub fn step(self, current: usize, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        match self {
            Direction::Next => (current + 1) % len,
            Direction::Prev => (current + len - 1) % len,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionState {
    pub current: usize,
    /// True for the whole shader tween; requests are dropped while set.
    pub animating: bool,
    /// True until the first transition starts.
    pub initial: bool,
}

/// Values the displacement shader reads each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplacementUniforms {
    pub disp_power: f32,
    pub intensity: f32,
    pub resolution: [f32; 2],
    /// Pixel size of the first slide image, for cover-fit in the shader.
    pub size: [f32; 2],
    pub texture_a: usize,
    pub texture_b: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub generation: Generation,
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub redraw: bool,
    pub completed: Option<Completion>,
}

#[derive(Debug, Clone, Copy)]
struct ActiveTransition {
    generation: Generation,
    from: usize,
    to: usize,
    tween: Tween,
}

#[derive(Debug, Clone)]
struct RunningTimeline {
    generation: Generation,
    started: Instant,
    timeline: Timeline,
}

impl RunningTimeline {
    fn elapsed(&self, now: Instant) -> f32 {
        now.saturating_duration_since(self.started).as_secs_f32()
    }

    fn settle(&self, stage: &mut Stage) {
        self.timeline.sample(self.timeline.duration(), stage);
    }
}

/// Transition controller: slide index state, the shader tween and the stage
/// timelines that run alongside it.
#[derive(Debug, Clone)]
pub struct Slider {
    deck: SlideDeck,
    stage: Stage,
    state: TransitionState,
    uniforms: DisplacementUniforms,
    duration: Duration,
    generation: Generation,
    active: Option<ActiveTransition>,
    stage_run: Option<RunningTimeline>,
    hint_run: Option<RunningTimeline>,
}

impl Slider {
    pub fn new(deck: SlideDeck, duration: Duration, intensity: f32) -> Self {
        let stage = Stage::new(&deck);
        let next = Direction::Next.step(0, deck.len());
        Self {
            stage,
            state: TransitionState {
                current: 0,
                animating: false,
                initial: true,
            },
            uniforms: DisplacementUniforms {
                disp_power: 0.0,
                intensity,
                resolution: [1.0, 1.0],
                size: [1.0, 1.0],
                texture_a: 0,
                texture_b: next,
            },
            duration,
            generation: 0,
            active: None,
            stage_run: None,
            hint_run: None,
            deck,
        }
    }

    pub fn deck(&self) -> &SlideDeck {
        &self.deck
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn state(&self) -> TransitionState {
        self.state
    }

    pub fn uniforms(&self) -> DisplacementUniforms {
        self.uniforms
    }

    pub fn current(&self) -> usize {
        self.state.current
    }

    pub fn is_animating(&self) -> bool {
        self.state.animating
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// True while any tween or timeline still needs frames.
    pub fn wants_frames(&self) -> bool {
        self.active.is_some() || self.stage_run.is_some() || self.hint_run.is_some()
    }

    pub fn request_next(&mut self, now: Instant) -> Option<Generation> {
        self.request(Direction::Next, now)
    }

    pub fn request_prev(&mut self, now: Instant) -> Option<Generation> {
        self.request(Direction::Prev, now)
    }

    /// Starts a transition towards the neighbouring slide.
    ///
    /// Returns `None` without side effects while a transition is animating.
    pub fn request(&mut self, direction: Direction, now: Instant) -> Option<Generation> {
        if self.state.animating {
            tracing::trace!(?direction, "transition already running; request dropped");
            return None;
        }
        self.state.animating = true;

        let from = self.state.current;
        let to = direction.step(from, self.deck.len());
        self.uniforms.texture_a = from;
        self.uniforms.texture_b = to;
        self.uniforms.disp_power = 0.0;

        self.generation += 1;
        let generation = self.generation;

        if let Some(stale) = self.stage_run.take() {
            tracing::trace!(
                stale = stale.generation,
                generation,
                "settling stage timeline of previous transition"
            );
            stale.settle(&mut self.stage);
        }

        let tween = Tween::new(0.0, 1.0, self.duration, Easing::ExpoInOut, now);
        self.active = Some(ActiveTransition {
            generation,
            from,
            to,
            tween,
        });

        let timeline = if from == to {
            Timeline::new()
        } else {
            build_stage_timeline(&self.deck, from, to, direction)
        };
        self.stage_run = Some(RunningTimeline {
            generation,
            started: now,
            timeline,
        });

        if self.state.initial {
            self.state.initial = false;
            self.hint_run = Some(RunningTimeline {
                generation,
                started: now,
                timeline: build_hint_timeline(),
            });
        }

        tracing::debug!(generation, from, to, ?direction, "transition started");
        Some(generation)
    }

    /// Advances the shader tween and stage timelines to `now`.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        if let Some(active) = self.active {
            let (value, finished) = active.tween.sample(now);
            outcome.redraw = true;
            if finished {
                self.active = None;
                self.uniforms.disp_power = 0.0;
                self.state.current = active.to;
                self.state.animating = false;
                self.uniforms.texture_a = active.to;
                self.uniforms.texture_b = Direction::Next.step(active.to, self.deck.len());
                tracing::debug!(
                    generation = active.generation,
                    from = active.from,
                    to = active.to,
                    "transition complete"
                );
                outcome.completed = Some(Completion {
                    generation: active.generation,
                    from: active.from,
                    to: active.to,
                });
            } else {
                self.uniforms.disp_power = value;
            }
        }

        for slot in [&mut self.stage_run, &mut self.hint_run] {
            let Some(run) = slot.as_ref() else {
                continue;
            };
            let elapsed = run.elapsed(now);
            run.timeline.sample(elapsed, &mut self.stage);
            outcome.redraw = true;
            if elapsed >= run.timeline.duration() {
                *slot = None;
            }
        }

        outcome
    }

    /// Records a new viewport size.
    ///
    /// Mid-transition the texture pair and `disp_power` are left alone; at
    /// rest the pair is re-synchronised to `(current, next)`.
    pub fn handle_resize(&mut self, width: u32, height: u32) {
        self.uniforms.resolution = [width.max(1) as f32, height.max(1) as f32];
        if self.state.animating {
            return;
        }
        let current = self.state.current;
        self.uniforms.texture_a = current;
        self.uniforms.texture_b = Direction::Next.step(current, self.deck.len());
        self.uniforms.disp_power = 0.0;
    }

    /// Records the pixel size of the first slide image once it has loaded.
    pub fn set_image_size(&mut self, width: u32, height: u32) {
        self.uniforms.size = [width.max(1) as f32, height.max(1) as f32];
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.uniforms.intensity = intensity;
    }
}

fn build_stage_timeline(deck: &SlideDeck, from: usize, to: usize, direction: Direction) -> Timeline {
    let sign = direction.sign();
    let mut timeline = Timeline::new();
    let (outgoing, incoming) = match (deck.layout(from), deck.layout(to)) {
        (Some(outgoing), Some(incoming)) => (*outgoing, *incoming),
        _ => return timeline,
    };

    let outgoing_strips = || (0..outgoing.strips).map(move |strip| (from, strip));
    timeline
        .stagger(
            outgoing_strips().map(|(slide, strip)| Target::StripOffset { slide, strip }),
            0.0,
            -STRIP_EXIT_PERCENT * sign,
            STRIP_STAGGER,
            STRIP_STAGGER,
            STRIP_DURATION,
            Easing::ExpoInOut,
        )
        .stagger(
            outgoing_strips().map(|(slide, strip)| Target::StripScale { slide, strip }),
            1.0,
            STRIP_STRETCH,
            STRIP_STAGGER,
            STRIP_STAGGER,
            STRIP_DURATION,
            Easing::ExpoInOut,
        )
        .tween(
            Target::BulletText(from),
            1.0,
            INACTIVE_BULLET_ALPHA,
            0.0,
            BULLET_DURATION,
            Easing::Linear,
        )
        .tween(
            Target::BulletLine(from),
            1.0,
            0.0,
            0.0,
            BULLET_DURATION,
            Easing::ExpoInOut,
        );
    for line in 0..outgoing.lines {
        timeline.tween(
            Target::LineOffset { slide: from, line },
            0.0,
            -LINE_TRAVEL_PERCENT * sign,
            0.0,
            LINE_DURATION,
            Easing::Power4InOut,
        );
    }

    timeline
        .set(Target::SlideAlpha(to), 0.0, 1.0, INCOMING_AT)
        .set(Target::SlideAlpha(from), 1.0, 0.0, OUTGOING_HIDDEN_AT);

    let incoming_strips = || (0..incoming.strips).map(move |strip| (to, strip));
    timeline
        .stagger(
            incoming_strips().map(|(slide, strip)| Target::StripOffset { slide, strip }),
            STRIP_ENTER_PERCENT * sign,
            0.0,
            INCOMING_AT,
            STRIP_STAGGER,
            STRIP_DURATION,
            Easing::ExpoInOut,
        )
        .stagger(
            incoming_strips().map(|(slide, strip)| Target::StripScale { slide, strip }),
            STRIP_STRETCH,
            1.0,
            INCOMING_AT,
            STRIP_STAGGER,
            STRIP_DURATION,
            Easing::ExpoInOut,
        )
        .tween(
            Target::BulletText(to),
            INACTIVE_BULLET_ALPHA,
            1.0,
            INCOMING_AT,
            BULLET_DURATION,
            Easing::Linear,
        )
        .tween(
            Target::BulletLine(to),
            0.0,
            1.0,
            INCOMING_AT,
            BULLET_DURATION,
            Easing::ExpoInOut,
        );
    for line in 0..incoming.lines {
        timeline.tween(
            Target::LineOffset { slide: to, line },
            LINE_TRAVEL_PERCENT * sign,
            0.0,
            LINE_ENTER_AT,
            LINE_DURATION,
            Easing::Power4Out,
        );
    }

    timeline
}

fn build_hint_timeline() -> Timeline {
    let mut timeline = Timeline::new();
    timeline
        .tween(
            Target::HintOffset,
            0.0,
            HINT_TRAVEL_PERCENT,
            0.0,
            HINT_DURATION,
            Easing::Power4InOut,
        )
        .tween(
            Target::HintAlpha,
            1.0,
            0.0,
            0.0,
            HINT_DURATION,
            Easing::Power4InOut,
        );
    timeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::SlideLayout;

    fn deck(count: usize) -> SlideDeck {
        SlideDeck::new(
            (0..count)
                .map(|_| SlideLayout {
                    strips: 3,
                    lines: 2,
                })
                .collect(),
        )
        .unwrap()
    }

    fn slider(count: usize) -> Slider {
        Slider::new(deck(count), DEFAULT_DURATION, 1.0)
    }

    fn secs(value: f32) -> Duration {
        Duration::from_secs_f32(value)
    }

    /// Runs the shader tween and stage timelines to completion.
    fn finish(slider: &mut Slider, start: Instant) -> Instant {
        let end = start + secs(4.0);
        slider.tick(end);
        assert!(!slider.wants_frames());
        end
    }

    #[test]
    fn next_and_prev_follow_modular_order() {
        let mut slider = slider(3);
        let mut now = Instant::now();
        let mut expected = 0usize;
        let moves = [
            Direction::Next,
            Direction::Next,
            Direction::Next,
            Direction::Prev,
            Direction::Prev,
            Direction::Prev,
            Direction::Prev,
        ];
        for direction in moves {
            assert!(slider.request(direction, now).is_some());
            now = finish(&mut slider, now);
            expected = direction.step(expected, 3);
            assert_eq!(slider.current(), expected);
        }
        assert_eq!(slider.current(), 2);
    }

    #[test]
    fn requests_while_animating_are_dropped() {
        let mut slider = slider(3);
        let now = Instant::now();
        let first = slider.request_next(now);
        assert_eq!(first, Some(1));
        assert_eq!(slider.request_next(now), None);
        assert_eq!(slider.request_prev(now + secs(1.0)), None);
        assert_eq!(slider.generation(), 1);

        let outcome = slider.tick(now + secs(2.6));
        let completion = outcome.completed.unwrap();
        assert_eq!(completion.from, 0);
        assert_eq!(completion.to, 1);
        assert_eq!(slider.current(), 1);
    }

    #[test]
    fn completion_resets_power_and_clears_animating() {
        let mut slider = slider(3);
        let now = Instant::now();
        slider.request_next(now);

        let mid = slider.tick(now + secs(1.25));
        assert!(mid.redraw);
        assert!(mid.completed.is_none());
        let power = slider.uniforms().disp_power;
        assert!(power > 0.0 && power < 1.0);
        assert!(slider.is_animating());

        let done = slider.tick(now + secs(2.5));
        assert!(done.completed.is_some());
        assert_eq!(slider.uniforms().disp_power, 0.0);
        assert!(!slider.is_animating());
        assert_eq!(slider.uniforms().texture_a, 1);
        assert_eq!(slider.uniforms().texture_b, 2);
    }

    #[test]
    fn next_then_prev_round_trips() {
        let mut slider = slider(4);
        let now = Instant::now();
        slider.request_next(now);
        let now = finish(&mut slider, now);
        assert_eq!(slider.current(), 1);
        slider.request_prev(now);
        finish(&mut slider, now);
        assert_eq!(slider.current(), 0);
        assert_eq!(slider.stage().visible_slides(), 1);
        assert!(slider.stage().slides()[0].is_visible());
    }

    #[test]
    fn container_swap_never_leaves_stage_empty() {
        for direction in [Direction::Next, Direction::Prev] {
            let mut slider = slider(3);
            let start = Instant::now();
            slider.request(direction, start);
            for step in 0..=400 {
                let t = step as f32 * 0.01;
                slider.tick(start + secs(t));
                let visible = slider.stage().visible_slides();
                if (INCOMING_AT..OUTGOING_HIDDEN_AT).contains(&t) {
                    assert!((1..=2).contains(&visible), "t={t} visible={visible}");
                } else {
                    assert_eq!(visible, 1, "t={t} direction={direction:?}");
                }
            }
        }
    }

    #[test]
    fn both_containers_move_during_crossover() {
        let mut slider = slider(2);
        let start = Instant::now();
        slider.request_next(start);
        slider.tick(start + secs(1.5));
        let slides = slider.stage().slides();
        assert!(slides[0].is_visible() && slides[1].is_visible());
        assert!(slides[0].lines[0] != 0.0 && slides[0].lines[0] != -100.0);
        assert!(slides[1].strips[0].y_percent != 0.0);
    }

    #[test]
    fn resize_mid_transition_preserves_power_and_pair() {
        let mut slider = slider(3);
        let now = Instant::now();
        slider.request_next(now);
        slider.tick(now + secs(1.4));
        let before = slider.uniforms();
        slider.handle_resize(1280, 720);
        let after = slider.uniforms();
        assert_eq!(after.disp_power, before.disp_power);
        assert_eq!((after.texture_a, after.texture_b), (0, 1));
        assert_eq!(after.resolution, [1280.0, 720.0]);
    }

    #[test]
    fn resize_at_rest_resyncs_texture_pair() {
        let mut slider = slider(3);
        let now = Instant::now();
        slider.request_prev(now);
        finish(&mut slider, now);
        slider.handle_resize(800, 600);
        let uniforms = slider.uniforms();
        assert_eq!((uniforms.texture_a, uniforms.texture_b), (2, 0));
        assert_eq!(uniforms.disp_power, 0.0);
    }

    #[test]
    fn scroll_hint_only_runs_on_first_transition() {
        let mut slider = slider(3);
        assert!(slider.state().initial);
        let now = Instant::now();
        slider.request_next(now);
        assert!(!slider.state().initial);
        let now = finish(&mut slider, now);
        let hint = slider.stage().hint();
        assert_eq!(hint.alpha, 0.0);
        assert_eq!(hint.y_percent, HINT_TRAVEL_PERCENT);

        slider.request_next(now);
        assert!(slider.hint_run.is_none());
    }

    #[test]
    fn directions_mirror_translation_signs() {
        let mut forward = slider(3);
        let mut backward = slider(3);
        let start = Instant::now();
        forward.request_next(start);
        backward.request_prev(start);
        let t = start + secs(0.9);
        forward.tick(t);
        backward.tick(t);
        let out_fwd = &forward.stage().slides()[0];
        let out_back = &backward.stage().slides()[0];
        assert!(out_fwd.strips[0].y_percent < 0.0);
        assert!((out_fwd.strips[0].y_percent + out_back.strips[0].y_percent).abs() < 1e-4);
        assert!((out_fwd.lines[0] + out_back.lines[0]).abs() < 1e-4);
    }

    #[test]
    fn stale_stage_timeline_is_settled_before_next_transition() {
        let mut slider = slider(3);
        let start = Instant::now();
        slider.request_next(start);
        // Shader tween is done at 2.5s but incoming lines run until 3.5s.
        let mid = start + secs(2.6);
        slider.tick(mid);
        assert!(!slider.is_animating());
        assert!(slider.stage().slides()[1].lines[0] != 0.0);

        slider.request_next(mid);
        assert_eq!(slider.stage().slides()[1].lines[0], 0.0);
        assert_eq!(slider.stage().bullets()[1].line_scale, 1.0);
        assert_eq!(slider.stage().bullets()[0].line_scale, 0.0);
    }

    #[test]
    fn single_slide_deck_runs_shader_tween_only() {
        let mut slider = slider(1);
        let now = Instant::now();
        assert_eq!(slider.request_next(now), Some(1));
        let completion = slider.tick(now + secs(3.0)).completed.unwrap();
        assert_eq!((completion.from, completion.to), (0, 0));
        assert_eq!(slider.stage().visible_slides(), 1);
        assert_eq!(slider.uniforms().texture_b, 0);
    }

    #[test]
    fn stagger_delays_each_strip() {
        let timeline = build_stage_timeline(&deck(2), 0, 1, Direction::Next);
        let incoming: Vec<f32> = timeline
            .tracks()
            .iter()
            .filter(|track| matches!(track.target, Target::StripOffset { slide: 1, .. }))
            .map(|track| track.start)
            .collect();
        assert_eq!(incoming.len(), 3);
        assert!((incoming[0] - 1.0).abs() < 1e-6);
        assert!((incoming[2] - 1.15).abs() < 1e-5);
        assert!((timeline.duration() - 3.5).abs() < 1e-5);
    }
}
