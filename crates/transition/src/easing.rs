/// Easing curves mapping normalised time to normalised progress.
///
/// The `PowerN` names follow the GSAP convention where `power1` is quadratic,
/// so `Power2` is cubic and `Power4` is quintic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    Power2Out,
    Power4Out,
    Power4InOut,
    ExpoInOut,
}

impl Easing {
    pub fn sample(self, t: f32) -> f32 {
        let clamped = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => clamped,
            Easing::Power2Out => 1.0 - (1.0 - clamped).powi(3),
            Easing::Power4Out => 1.0 - (1.0 - clamped).powi(5),
            Easing::Power4InOut => {
                if clamped < 0.5 {
                    16.0 * clamped.powi(5)
                } else {
                    1.0 - (-2.0 * clamped + 2.0).powi(5) / 2.0
                }
            }
            Easing::ExpoInOut => {
                if clamped <= 0.0 {
                    0.0
                } else if clamped >= 1.0 {
                    1.0
                } else if clamped < 0.5 {
                    2.0_f32.powf(20.0 * clamped - 10.0) / 2.0
                } else {
                    (2.0 - 2.0_f32.powf(-20.0 * clamped + 10.0)) / 2.0
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 5] = [
        Easing::Linear,
        Easing::Power2Out,
        Easing::Power4Out,
        Easing::Power4InOut,
        Easing::ExpoInOut,
    ];

    #[test]
    fn curves_hit_endpoints() {
        for curve in ALL {
            assert!(curve.sample(0.0).abs() < 1e-3, "{curve:?} at 0");
            assert!((curve.sample(1.0) - 1.0).abs() < 1e-3, "{curve:?} at 1");
        }
    }

    #[test]
    fn curves_increase_monotonically() {
        for curve in ALL {
            let mut last = 0.0;
            for step in 0..=100 {
                let sample = curve.sample(step as f32 / 100.0);
                assert!(sample >= last - 1e-5, "{curve:?} dipped at step {step}");
                last = sample;
            }
        }
    }

    #[test]
    fn in_out_curves_are_symmetric_about_midpoint() {
        for curve in [Easing::Power4InOut, Easing::ExpoInOut] {
            assert!((curve.sample(0.5) - 0.5).abs() < 1e-4);
            let early = curve.sample(0.2);
            let late = curve.sample(0.8);
            assert!((early + late - 1.0).abs() < 1e-4, "{curve:?}");
        }
    }

    #[test]
    fn out_curves_front_load_progress() {
        assert!(Easing::Power2Out.sample(0.25) > 0.5);
        assert!(Easing::Power4Out.sample(0.25) > Easing::Power2Out.sample(0.25));
    }

    #[test]
    fn input_outside_unit_range_is_clamped() {
        assert_eq!(Easing::ExpoInOut.sample(-3.0), 0.0);
        assert_eq!(Easing::Linear.sample(7.0), 1.0);
    }
}
