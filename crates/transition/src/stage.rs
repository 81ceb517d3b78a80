use crate::TransitionError;

/// Element counts for one slide. Bullet `i` always belongs to slide `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideLayout {
    pub strips: usize,
    pub lines: usize,
}

/// Immutable ordered set of slides, built once at start-up.
#[derive(Debug, Clone)]
pub struct SlideDeck {
    slides: Vec<SlideLayout>,
}

impl SlideDeck {
    pub fn new(slides: Vec<SlideLayout>) -> Result<Self, TransitionError> {
        if slides.is_empty() {
            return Err(TransitionError::EmptyDeck);
        }
        if let Some(index) = slides.iter().position(|slide| slide.strips == 0) {
            return Err(TransitionError::NoStrips(index));
        }
        Ok(Self { slides })
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn layout(&self, index: usize) -> Option<&SlideLayout> {
        self.slides.get(index)
    }

    pub fn layouts(&self) -> &[SlideLayout] {
        &self.slides
    }
}

/// Addressable animated property on the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    SlideAlpha(usize),
    StripOffset { slide: usize, strip: usize },
    StripScale { slide: usize, strip: usize },
    LineOffset { slide: usize, line: usize },
    BulletText(usize),
    BulletLine(usize),
    HintOffset,
    HintAlpha,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StripStyle {
    /// Vertical translation as a percentage of the strip's own height.
    pub y_percent: f32,
    pub scale_y: f32,
}

impl Default for StripStyle {
    fn default() -> Self {
        Self {
            y_percent: 0.0,
            scale_y: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlideStyle {
    /// Container opacity; zero also means hidden.
    pub alpha: f32,
    pub strips: Vec<StripStyle>,
    /// Per-line vertical translation in percent of the line height.
    pub lines: Vec<f32>,
}

impl SlideStyle {
    pub fn is_visible(&self) -> bool {
        self.alpha > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BulletStyle {
    pub text_alpha: f32,
    /// Horizontal scale of the underline, anchored at its right edge.
    pub line_scale: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HintStyle {
    pub y_percent: f32,
    pub alpha: f32,
}

pub(crate) const INACTIVE_BULLET_ALPHA: f32 = 0.25;

/// Owned per-element styles that the timelines animate and the overlay draws.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    slides: Vec<SlideStyle>,
    bullets: Vec<BulletStyle>,
    hint: HintStyle,
}

impl Stage {
    /// Initial styles: slide 0 and bullet 0 active, everything else at rest.
    pub fn new(deck: &SlideDeck) -> Self {
        let slides = deck
            .layouts()
            .iter()
            .enumerate()
            .map(|(index, layout)| SlideStyle {
                alpha: if index == 0 { 1.0 } else { 0.0 },
                strips: vec![StripStyle::default(); layout.strips],
                lines: vec![0.0; layout.lines],
            })
            .collect();
        let bullets = (0..deck.len())
            .map(|index| {
                if index == 0 {
                    BulletStyle {
                        text_alpha: 1.0,
                        line_scale: 1.0,
                    }
                } else {
                    BulletStyle {
                        text_alpha: INACTIVE_BULLET_ALPHA,
                        line_scale: 0.0,
                    }
                }
            })
            .collect();
        Self {
            slides,
            bullets,
            hint: HintStyle {
                y_percent: 0.0,
                alpha: 1.0,
            },
        }
    }

    pub fn slides(&self) -> &[SlideStyle] {
        &self.slides
    }

    pub fn bullets(&self) -> &[BulletStyle] {
        &self.bullets
    }

    pub fn hint(&self) -> HintStyle {
        self.hint
    }

    pub fn visible_slides(&self) -> usize {
        self.slides.iter().filter(|slide| slide.is_visible()).count()
    }

    pub fn get(&self, target: Target) -> Option<f32> {
        match target {
            Target::SlideAlpha(slide) => self.slides.get(slide).map(|s| s.alpha),
            Target::StripOffset { slide, strip } => self
                .slides
                .get(slide)
                .and_then(|s| s.strips.get(strip))
                .map(|s| s.y_percent),
            Target::StripScale { slide, strip } => self
                .slides
                .get(slide)
                .and_then(|s| s.strips.get(strip))
                .map(|s| s.scale_y),
            Target::LineOffset { slide, line } => self
                .slides
                .get(slide)
                .and_then(|s| s.lines.get(line))
                .copied(),
            Target::BulletText(index) => self.bullets.get(index).map(|b| b.text_alpha),
            Target::BulletLine(index) => self.bullets.get(index).map(|b| b.line_scale),
            Target::HintOffset => Some(self.hint.y_percent),
            Target::HintAlpha => Some(self.hint.alpha),
        }
    }

    /// Writes `value` into `target`; returns false when the target does not exist.
    pub fn apply(&mut self, target: Target, value: f32) -> bool {
        let slot = match target {
            Target::SlideAlpha(slide) => self.slides.get_mut(slide).map(|s| &mut s.alpha),
            Target::StripOffset { slide, strip } => self
                .slides
                .get_mut(slide)
                .and_then(|s| s.strips.get_mut(strip))
                .map(|s| &mut s.y_percent),
            Target::StripScale { slide, strip } => self
                .slides
                .get_mut(slide)
                .and_then(|s| s.strips.get_mut(strip))
                .map(|s| &mut s.scale_y),
            Target::LineOffset { slide, line } => self
                .slides
                .get_mut(slide)
                .and_then(|s| s.lines.get_mut(line)),
            Target::BulletText(index) => self.bullets.get_mut(index).map(|b| &mut b.text_alpha),
            Target::BulletLine(index) => self.bullets.get_mut(index).map(|b| &mut b.line_scale),
            Target::HintOffset => Some(&mut self.hint.y_percent),
            Target::HintAlpha => Some(&mut self.hint.alpha),
        };
        match slot {
            Some(slot) => {
                *slot = value;
                true
            }
            None => {
                tracing::warn!(?target, "stage target out of range; ignoring");
                false
            }
        }
    }
}
