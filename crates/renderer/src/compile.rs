use std::borrow::Cow;

use wgpu::naga::ShaderStage;

/// Compiles one of the built-in GLSL sources through naga's frontend.
fn compile_glsl(
    device: &wgpu::Device,
    label: &str,
    source: &'static str,
    stage: ShaderStage,
) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(source),
            stage,
            defines: &[],
        },
    })
}

/// Compiles the static full-screen triangle vertex shader.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    compile_glsl(
        device,
        "fullscreen triangle vertex",
        VERTEX_SHADER_GLSL,
        ShaderStage::Vertex,
    )
}

pub(crate) fn compile_displacement_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    compile_glsl(
        device,
        "displacement fragment",
        DISPLACEMENT_FRAGMENT_GLSL,
        ShaderStage::Fragment,
    )
}

/// Returns the (vertex, fragment) pair for the instanced rectangle overlay.
pub(crate) fn compile_overlay_shaders(
    device: &wgpu::Device,
) -> (wgpu::ShaderModule, wgpu::ShaderModule) {
    (
        compile_glsl(
            device,
            "overlay vertex",
            OVERLAY_VERTEX_GLSL,
            ShaderStage::Vertex,
        ),
        compile_glsl(
            device,
            "overlay fragment",
            OVERLAY_FRAGMENT_GLSL,
            ShaderStage::Fragment,
        ),
    )
}

/// Minimal full-screen triangle vertex shader.
const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    uint vertex_index = uint(gl_VertexIndex);
    vec2 pos = positions[vertex_index];
    v_uv = pos * 0.5 + vec2(0.5, 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

/// Blends `texture_a` into `texture_b`, pushing each through the displacement
/// map in opposite directions as `disp_power` goes from 0 to 1.
///
/// The uniform block layout must match `DisplacementParams` in
/// `gpu/uniforms.rs`.
const DISPLACEMENT_FRAGMENT_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform DisplacementParams {
    float disp_power;
    float intensity;
    vec2 resolution;
    vec2 size;
    vec2 _padding;
} params;

layout(set = 1, binding = 0) uniform texture2D texture_a;
layout(set = 1, binding = 1) uniform sampler sampler_a;
layout(set = 1, binding = 2) uniform texture2D texture_b;
layout(set = 1, binding = 3) uniform sampler sampler_b;
layout(set = 1, binding = 4) uniform texture2D displacement;
layout(set = 1, binding = 5) uniform sampler displacement_sampler;

// Scales uv so an image of `size` covers a viewport of `resolution`.
vec2 cover_uv(vec2 uv) {
    vec2 s = max(params.resolution, vec2(1.0));
    vec2 i = max(params.size, vec2(1.0));
    float screen_ratio = s.x / s.y;
    float image_ratio = i.x / i.y;
    vec2 scaled;
    vec2 offset;
    if (screen_ratio < image_ratio) {
        scaled = vec2(i.x * s.y / i.y, s.y);
        offset = vec2((scaled.x - s.x) * 0.5, 0.0) / scaled;
    } else {
        scaled = vec2(s.x, i.y * s.x / i.x);
        offset = vec2(0.0, (scaled.y - s.y) * 0.5) / scaled;
    }
    return uv * s / scaled + offset;
}

void main() {
    vec2 uv = cover_uv(v_uv);
    vec4 disp = texture(sampler2D(displacement, displacement_sampler), uv);
    vec2 shift = disp.rg * params.intensity;

    vec2 pos_a = uv + shift * params.disp_power;
    vec2 pos_b = uv - shift * (1.0 - params.disp_power);

    vec4 color_a = texture(sampler2D(texture_a, sampler_a), pos_a);
    vec4 color_b = texture(sampler2D(texture_b, sampler_b), pos_b);
    outColor = mix(color_a, color_b, params.disp_power);
}
";

/// Instanced rectangles in pixel space, origin top-left.
const OVERLAY_VERTEX_GLSL: &str = r"#version 450
layout(location = 0) in vec4 rect;
layout(location = 1) in vec4 color;
layout(location = 0) out vec4 v_color;

layout(std140, set = 0, binding = 0) uniform OverlayParams {
    vec2 viewport;
    vec2 _padding;
} params;

const vec2 corners[6] = vec2[6](
    vec2(0.0, 0.0),
    vec2(1.0, 0.0),
    vec2(0.0, 1.0),
    vec2(0.0, 1.0),
    vec2(1.0, 0.0),
    vec2(1.0, 1.0)
);

void main() {
    vec2 corner = corners[uint(gl_VertexIndex)];
    vec2 pixel = rect.xy + corner * rect.zw;
    vec2 ndc = vec2(
        pixel.x / params.viewport.x * 2.0 - 1.0,
        1.0 - pixel.y / params.viewport.y * 2.0
    );
    v_color = color;
    gl_Position = vec4(ndc, 0.0, 1.0);
}
";

const OVERLAY_FRAGMENT_GLSL: &str = r"#version 450
layout(location = 0) in vec4 v_color;
layout(location = 0) out vec4 outColor;

void main() {
    outColor = vec4(v_color.rgb * v_color.a, v_color.a);
}
";
