use bytemuck::{Pod, Zeroable};
use transition::DisplacementUniforms;

/// std140 mirror of the `DisplacementParams` block in the fragment shader.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct DisplacementParams {
    pub disp_power: f32,
    pub intensity: f32,
    pub resolution: [f32; 2],
    pub size: [f32; 2],
    pub padding: [f32; 2],
}

unsafe impl Zeroable for DisplacementParams {}
unsafe impl Pod for DisplacementParams {}

impl DisplacementParams {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            disp_power: 0.0,
            intensity: 1.0,
            resolution: [width.max(1) as f32, height.max(1) as f32],
            size: [1.0, 1.0],
            padding: [0.0; 2],
        }
    }

    /// Copies the controller's values; `resolution` overrides the controller's
    /// when drawing into a sub-viewport.
    pub fn update(&mut self, source: &DisplacementUniforms, resolution: Option<[f32; 2]>) {
        self.disp_power = source.disp_power.clamp(0.0, 1.0);
        self.intensity = source.intensity;
        self.resolution = resolution.unwrap_or(source.resolution);
        self.size = source.size;
    }
}

/// std140 mirror of the overlay vertex shader's `OverlayParams` block.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct OverlayParams {
    pub viewport: [f32; 2],
    pub padding: [f32; 2],
}

unsafe impl Zeroable for OverlayParams {}
unsafe impl Pod for OverlayParams {}

impl OverlayParams {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: [width.max(1) as f32, height.max(1) as f32],
            padding: [0.0; 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{align_of, offset_of, size_of};

    #[test]
    fn displacement_params_match_std140_layout() {
        assert_eq!(size_of::<DisplacementParams>(), 32);
        assert_eq!(align_of::<DisplacementParams>(), 16);
        assert_eq!(offset_of!(DisplacementParams, intensity), 4);
        assert_eq!(offset_of!(DisplacementParams, resolution), 8);
        assert_eq!(offset_of!(DisplacementParams, size), 16);
        assert_eq!(size_of::<OverlayParams>(), 16);
    }

    #[test]
    fn update_clamps_power_and_prefers_viewport_resolution() {
        let mut params = DisplacementParams::new(10, 10);
        let source = DisplacementUniforms {
            disp_power: 1.2,
            intensity: 0.4,
            resolution: [1920.0, 1080.0],
            size: [4000.0, 3000.0],
            texture_a: 0,
            texture_b: 1,
        };
        params.update(&source, None);
        assert_eq!(params.disp_power, 1.0);
        assert_eq!(params.resolution, [1920.0, 1080.0]);
        params.update(&source, Some([640.0, 360.0]));
        assert_eq!(params.resolution, [640.0, 360.0]);
        assert_eq!(params.size, [4000.0, 3000.0]);
    }
}
