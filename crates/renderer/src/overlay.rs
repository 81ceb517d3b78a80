//! Lays the stage out as coloured rectangles in pixel space.
//!
//! Every element is clipped to its own mask box on the CPU, which stands in
//! for the `overflow: hidden` wrappers strips and text lines slide out of.

use bytemuck::{Pod, Zeroable};
use transition::{BulletStyle, HintStyle, SlideStyle, Stage};

/// One instanced rectangle: `rect` is x, y, width, height from the top-left.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct OverlayQuad {
    pub rect: [f32; 4],
    pub color: [f32; 4],
}

const WHITE: [f32; 3] = [1.0, 1.0, 1.0];
const STRIP_ALPHA: f32 = 0.16;
const LINE_ALPHA: f32 = 0.92;
const HINT_ALPHA: f32 = 0.8;

const STRIP_REGION: [f32; 4] = [0.56, 0.18, 0.36, 0.64];
const STRIP_GAP: f32 = 0.01;
const LINE_LEFT: f32 = 0.08;
const LINE_TOP: f32 = 0.38;
const LINE_HEIGHT: f32 = 0.06;
const LINE_SPACING: f32 = 1.25;
const LINE_MAX_WIDTH: f32 = 0.42;
/// Approximate advance of one glyph relative to the line height.
const GLYPH_ADVANCE: f32 = 0.55;
const BULLET_LEFT: f32 = 0.08;
const BULLET_STEP: f32 = 0.1;
const BULLET_TOP: f32 = 0.9;
const BULLET_UNDERLINE_WIDTH: f32 = 0.07;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Rect {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
}

impl Rect {
    fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    fn translate_y(self, dy: f32) -> Self {
        Self {
            y: self.y + dy,
            ..self
        }
    }

    /// Scales vertically about the centre.
    fn scale_y(self, scale: f32) -> Self {
        let h = self.h * scale.max(0.0);
        Self {
            y: self.y + (self.h - h) * 0.5,
            h,
            ..self
        }
    }

    fn intersect(self, other: Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.w).min(other.x + other.w);
        let bottom = (self.y + self.h).min(other.y + other.h);
        (right > left && bottom > top).then(|| Rect::new(left, top, right - left, bottom - top))
    }
}

fn push(quads: &mut Vec<OverlayQuad>, rect: Option<Rect>, rgb: [f32; 3], alpha: f32) {
    let Some(rect) = rect else {
        return;
    };
    if alpha <= 0.0 {
        return;
    }
    quads.push(OverlayQuad {
        rect: [rect.x, rect.y, rect.w, rect.h],
        color: [rgb[0], rgb[1], rgb[2], alpha.min(1.0)],
    });
}

/// Builds the overlay for `stage`. `captions[i]` holds the text lines of
/// slide `i` and only sizes the line bars.
pub(crate) fn build(
    stage: &Stage,
    captions: &[Vec<String>],
    viewport: [f32; 2],
) -> Vec<OverlayQuad> {
    let mut quads = Vec::new();
    if viewport[0] < 1.0 || viewport[1] < 1.0 {
        return quads;
    }
    for (index, slide) in stage.slides().iter().enumerate() {
        if !slide.is_visible() {
            continue;
        }
        push_strips(&mut quads, slide, viewport);
        let caption = captions.get(index).map(Vec::as_slice).unwrap_or(&[]);
        push_lines(&mut quads, slide, caption, viewport);
    }
    for (index, bullet) in stage.bullets().iter().enumerate() {
        push_bullet(&mut quads, index, bullet, viewport);
    }
    push_hint(&mut quads, stage.hint(), viewport);
    quads
}

fn push_strips(quads: &mut Vec<OverlayQuad>, slide: &SlideStyle, [vw, vh]: [f32; 2]) {
    let count = slide.strips.len();
    if count == 0 {
        return;
    }
    let [rx, ry, rw, rh] = STRIP_REGION;
    let gap = STRIP_GAP * vw;
    let region_w = rw * vw;
    let column_w = (region_w - gap * (count - 1) as f32) / count as f32;
    for (index, strip) in slide.strips.iter().enumerate() {
        let mask = Rect::new(
            rx * vw + index as f32 * (column_w + gap),
            ry * vh,
            column_w,
            rh * vh,
        );
        let moved = mask
            .scale_y(strip.scale_y)
            .translate_y(strip.y_percent / 100.0 * mask.h);
        push(quads, moved.intersect(mask), WHITE, STRIP_ALPHA * slide.alpha);
    }
}

fn push_lines(
    quads: &mut Vec<OverlayQuad>,
    slide: &SlideStyle,
    caption: &[String],
    [vw, vh]: [f32; 2],
) {
    let line_h = LINE_HEIGHT * vh;
    for (index, offset) in slide.lines.iter().enumerate() {
        let width = caption
            .get(index)
            .map(|text| text.chars().count().max(1) as f32 * GLYPH_ADVANCE * line_h)
            .unwrap_or(LINE_MAX_WIDTH * vw * 0.5)
            .clamp(line_h, LINE_MAX_WIDTH * vw);
        let mask = Rect::new(
            LINE_LEFT * vw,
            LINE_TOP * vh + index as f32 * line_h * LINE_SPACING,
            width,
            line_h,
        );
        let moved = mask.translate_y(offset / 100.0 * line_h);
        push(quads, moved.intersect(mask), WHITE, LINE_ALPHA * slide.alpha);
    }
}

fn push_bullet(
    quads: &mut Vec<OverlayQuad>,
    index: usize,
    bullet: &BulletStyle,
    [vw, vh]: [f32; 2],
) {
    let x = (BULLET_LEFT + BULLET_STEP * index as f32) * vw;
    let y = BULLET_TOP * vh;
    let marker = Rect::new(x, y, 0.02 * vw, 0.014 * vh);
    push(quads, Some(marker), WHITE, bullet.text_alpha);

    let full = BULLET_UNDERLINE_WIDTH * vw;
    let scaled = full * bullet.line_scale.clamp(0.0, 1.0);
    if scaled > 0.0 {
        // Scales from the right edge.
        let underline = Rect::new(
            x + full - scaled,
            y + 0.025 * vh,
            scaled,
            (0.003 * vh).max(2.0),
        );
        push(quads, Some(underline), WHITE, 1.0);
    }
}

fn push_hint(quads: &mut Vec<OverlayQuad>, hint: HintStyle, [vw, vh]: [f32; 2]) {
    let width = (0.002 * vw).max(2.0);
    let mask = Rect::new(vw * 0.5 - width * 0.5, 0.86 * vh, width, 0.08 * vh);
    let moved = mask.translate_y(hint.y_percent / 100.0 * mask.h);
    push(quads, moved.intersect(mask), WHITE, HINT_ALPHA * hint.alpha);
}

#[cfg(test)]
mod tests {
    use super::*;
    use transition::{SlideDeck, SlideLayout, Target};

    const VIEWPORT: [f32; 2] = [1600.0, 900.0];

    fn initial_stage() -> Stage {
        let deck = SlideDeck::new(vec![
            SlideLayout {
                strips: 2,
                lines: 1,
            };
            2
        ])
        .unwrap();
        Stage::new(&deck)
    }

    fn captions() -> Vec<Vec<String>> {
        vec![vec!["Evening".into()], vec!["Ridge".into()]]
    }

    #[test]
    fn initial_stage_draws_first_slide_bullets_and_hint() {
        let quads = build(&initial_stage(), &captions(), VIEWPORT);
        // 2 strips + 1 line + bullet 0 marker/underline + bullet 1 marker + hint
        assert_eq!(quads.len(), 7);
        assert!(quads.iter().all(|quad| quad.color[3] > 0.0));
    }

    #[test]
    fn strips_translated_past_mask_are_clipped_away() {
        let mut stage = initial_stage();
        stage.apply(Target::StripOffset { slide: 0, strip: 0 }, -185.0);
        stage.apply(Target::StripScale { slide: 0, strip: 0 }, 1.5);
        stage.apply(Target::StripOffset { slide: 0, strip: 1 }, -40.0);
        let quads = build(&stage, &captions(), VIEWPORT);
        assert_eq!(quads.len(), 6);

        let strip_top = STRIP_REGION[1] * VIEWPORT[1];
        let partial = quads[0];
        assert_eq!(partial.rect[1], strip_top);
        assert!((partial.rect[3] - STRIP_REGION[3] * VIEWPORT[1] * 0.6).abs() < 1e-2);
    }

    #[test]
    fn underline_scales_from_right_edge() {
        let mut stage = initial_stage();
        stage.apply(Target::BulletLine(0), 0.5);
        let quads = build(&stage, &captions(), VIEWPORT);
        let full = BULLET_UNDERLINE_WIDTH * VIEWPORT[0];
        let underline = quads
            .iter()
            .find(|quad| (quad.rect[2] - full * 0.5).abs() < 1e-3)
            .expect("underline quad");
        let left = BULLET_LEFT * VIEWPORT[0];
        assert!((underline.rect[0] - (left + full * 0.5)).abs() < 1e-3);
    }

    #[test]
    fn hidden_hint_and_empty_viewport_produce_nothing() {
        let mut stage = initial_stage();
        stage.apply(Target::HintAlpha, 0.0);
        let with_hint = build(&initial_stage(), &captions(), VIEWPORT).len();
        assert_eq!(build(&stage, &captions(), VIEWPORT).len(), with_hint - 1);
        assert!(build(&stage, &captions(), [0.0, 0.0]).is_empty());
    }

    #[test]
    fn rect_intersection_handles_disjoint_boxes() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(a.intersect(Rect::new(20.0, 0.0, 5.0, 5.0)), None);
        assert_eq!(
            a.intersect(Rect::new(5.0, 5.0, 10.0, 10.0)),
            Some(Rect::new(5.0, 5.0, 5.0, 5.0))
        );
    }
}
