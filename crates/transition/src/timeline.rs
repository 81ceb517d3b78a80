use std::time::{Duration, Instant};

use crate::easing::Easing;
use crate::stage::{Stage, Target};

/// Scalar tween anchored to a wall-clock start.
#[derive(Debug, Clone, Copy)]
pub struct Tween {
    start: Instant,
    duration: Duration,
    from: f32,
    to: f32,
    easing: Easing,
}

impl Tween {
    pub fn new(from: f32, to: f32, duration: Duration, easing: Easing, now: Instant) -> Self {
        Self {
            start: now,
            duration,
            from,
            to,
            easing,
        }
    }

    /// Returns the eased value at `now` and whether the tween has finished.
    pub fn sample(&self, now: Instant) -> (f32, bool) {
        if self.duration.is_zero() {
            return (self.to, true);
        }
        let elapsed = now.saturating_duration_since(self.start);
        let progress = elapsed.as_secs_f32() / self.duration.as_secs_f32().max(f32::EPSILON);
        let eased = self.easing.sample(progress);
        let value = self.from + (self.to - self.from) * eased;
        (value, progress >= 1.0)
    }

    pub fn target(&self) -> f32 {
        self.to
    }
}

/// One animated property on the stage, positioned in timeline seconds.
///
/// A zero `duration` makes the track a step: `from` before `start`, `to`
/// from `start` onwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Track {
    pub target: Target,
    pub from: f32,
    pub to: f32,
    pub start: f32,
    pub duration: f32,
    pub easing: Easing,
}

impl Track {
    pub fn value_at(&self, t: f32) -> f32 {
        if t < self.start {
            return self.from;
        }
        if self.duration <= 0.0 || t >= self.end() {
            return self.to;
        }
        let progress = (t - self.start) / self.duration;
        self.from + (self.to - self.from) * self.easing.sample(progress)
    }

    pub fn end(&self) -> f32 {
        self.start + self.duration.max(0.0)
    }
}

/// Ordered collection of tracks sampled together against a [`Stage`].
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    tracks: Vec<Track>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tween(
        &mut self,
        target: Target,
        from: f32,
        to: f32,
        start: f32,
        duration: f32,
        easing: Easing,
    ) -> &mut Self {
        self.tracks.push(Track {
            target,
            from,
            to,
            start,
            duration,
            easing,
        });
        self
    }

    pub fn set(&mut self, target: Target, from: f32, to: f32, at: f32) -> &mut Self {
        self.tween(target, from, to, at, 0.0, Easing::Linear)
    }

    /// Adds one track per target, each starting `step` seconds after the last.
    #[allow(clippy::too_many_arguments)]
    pub fn stagger<I>(
        &mut self,
        targets: I,
        from: f32,
        to: f32,
        start: f32,
        step: f32,
        duration: f32,
        easing: Easing,
    ) -> &mut Self
    where
        I: IntoIterator<Item = Target>,
    {
        for (index, target) in targets.into_iter().enumerate() {
            self.tween(target, from, to, start + step * index as f32, duration, easing);
        }
        self
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// End time of the last track, in seconds.
    pub fn duration(&self) -> f32 {
        self.tracks
            .iter()
            .map(Track::end)
            .fold(0.0_f32, f32::max)
    }

    pub fn sample(&self, t: f32, stage: &mut Stage) {
        for track in &self.tracks {
            stage.apply(track.target, track.value_at(t));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::{SlideDeck, SlideLayout};

    fn deck() -> SlideDeck {
        SlideDeck::new(vec![
            SlideLayout {
                strips: 2,
                lines: 1,
            },
            SlideLayout {
                strips: 2,
                lines: 1,
            },
        ])
        .unwrap()
    }

    #[test]
    fn tween_reports_progress_and_completion() {
        let start = Instant::now();
        let tween = Tween::new(0.0, 1.0, Duration::from_millis(100), Easing::Linear, start);
        let (value, finished) = tween.sample(start + Duration::from_millis(50));
        assert!((value - 0.5).abs() < 0.05);
        assert!(!finished);

        let (value, finished) = tween.sample(start + Duration::from_millis(150));
        assert_eq!(value, 1.0);
        assert!(finished);
    }

    #[test]
    fn zero_duration_tween_is_immediate() {
        let start = Instant::now();
        let tween = Tween::new(0.2, 0.9, Duration::ZERO, Easing::ExpoInOut, start);
        assert_eq!(tween.sample(start), (0.9, true));
    }

    #[test]
    fn step_track_switches_at_start() {
        let track = Track {
            target: Target::SlideAlpha(0),
            from: 1.0,
            to: 0.0,
            start: 2.0,
            duration: 0.0,
            easing: Easing::Linear,
        };
        assert_eq!(track.value_at(1.999), 1.0);
        assert_eq!(track.value_at(2.0), 0.0);
        assert_eq!(track.end(), 2.0);
    }

    #[test]
    fn stagger_offsets_each_target() {
        let mut timeline = Timeline::new();
        timeline.stagger(
            [
                Target::StripOffset { slide: 0, strip: 0 },
                Target::StripOffset { slide: 0, strip: 1 },
            ],
            0.0,
            -185.0,
            0.075,
            0.075,
            1.5,
            Easing::ExpoInOut,
        );
        let starts: Vec<f32> = timeline.tracks().iter().map(|track| track.start).collect();
        assert!((starts[0] - 0.075).abs() < 1e-6);
        assert!((starts[1] - 0.15).abs() < 1e-6);
        assert!((timeline.duration() - 1.65).abs() < 1e-5);
    }

    #[test]
    fn sample_applies_tracks_to_stage() {
        let deck = deck();
        let mut stage = Stage::new(&deck);
        let mut timeline = Timeline::new();
        timeline
            .tween(
                Target::LineOffset { slide: 0, line: 0 },
                0.0,
                -100.0,
                0.0,
                2.0,
                Easing::Linear,
            )
            .set(Target::SlideAlpha(1), 0.0, 1.0, 1.0);

        timeline.sample(1.0, &mut stage);
        assert!((stage.slides()[0].lines[0] + 50.0).abs() < 1e-4);
        assert_eq!(stage.slides()[1].alpha, 1.0);

        timeline.sample(timeline.duration(), &mut stage);
        assert_eq!(stage.slides()[0].lines[0], -100.0);
    }
}
