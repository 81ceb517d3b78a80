use anyhow::Result;
use image::RgbaImage;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use transition::{DisplacementUniforms, PlaneRect};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::overlay::OverlayQuad;
use crate::types::{Antialiasing, ColorSpaceMode};

use super::context::GpuContext;
use super::pipeline::{DisplacementPipeline, OverlayPipeline};
use super::textures::TextureLibrary;
use super::uniforms::{DisplacementParams, OverlayParams};

const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.024,
    a: 1.0,
};

/// Everything `render` needs for one frame.
pub(crate) struct FrameInput<'a> {
    pub uniforms: DisplacementUniforms,
    /// Restricts the displacement draw to a sub-rectangle (hover plane).
    pub plane: Option<PlaneRect>,
    pub quads: &'a [OverlayQuad],
}

struct MultisampleTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl MultisampleTarget {
    fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
        sample_count: u32,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("msaa color target"),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

/// Cached bind group for a texture pair at a given library revision.
struct PairBinding {
    key: (usize, usize, u64),
    bind_group: wgpu::BindGroup,
}

struct OverlayBuffer {
    buffer: wgpu::Buffer,
    capacity: usize,
}

pub(crate) struct GpuState {
    context: GpuContext,
    multisample_target: Option<MultisampleTarget>,
    displacement: DisplacementPipeline,
    overlay: OverlayPipeline,
    textures: TextureLibrary,
    params: DisplacementParams,
    params_buffer: wgpu::Buffer,
    params_bind_group: wgpu::BindGroup,
    overlay_params_buffer: wgpu::Buffer,
    overlay_params_bind_group: wgpu::BindGroup,
    pair: Option<PairBinding>,
    instances: Option<OverlayBuffer>,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        size: PhysicalSize<u32>,
        antialiasing: Antialiasing,
        color_space: ColorSpaceMode,
        slide_count: usize,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, size, antialiasing, color_space)?;
        let device = &context.device;

        let displacement =
            DisplacementPipeline::new(device, context.surface_format, context.sample_count);
        let overlay = OverlayPipeline::new(device, context.surface_format, context.sample_count);
        let textures = TextureLibrary::new(device, &context.queue, slide_count, context.color_space);

        let params = DisplacementParams::new(context.size.width, context.size.height);
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("displacement uniform buffer"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let params_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("displacement uniform bind group"),
            layout: &displacement.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: params_buffer.as_entire_binding(),
            }],
        });

        let overlay_params = OverlayParams::new(context.size.width, context.size.height);
        let overlay_params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("overlay uniform buffer"),
            contents: bytemuck::bytes_of(&overlay_params),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let overlay_params_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("overlay uniform bind group"),
            layout: &overlay.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: overlay_params_buffer.as_entire_binding(),
            }],
        });

        let multisample_target = (context.sample_count > 1).then(|| {
            MultisampleTarget::new(
                device,
                context.surface_format,
                context.size,
                context.sample_count,
            )
        });

        tracing::info!(
            width = context.size.width,
            height = context.size.height,
            sample_count = context.sample_count,
            slide_count,
            "GPU state ready"
        );

        Ok(Self {
            context,
            multisample_target,
            displacement,
            overlay,
            textures,
            params,
            params_buffer,
            params_bind_group,
            overlay_params_buffer,
            overlay_params_bind_group,
            pair: None,
            instances: None,
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn max_texture_dimension(&self) -> u32 {
        self.context.max_texture_dimension
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.context.resize(new_size);
        let overlay_params = OverlayParams::new(new_size.width, new_size.height);
        self.context.queue.write_buffer(
            &self.overlay_params_buffer,
            0,
            bytemuck::bytes_of(&overlay_params),
        );
        self.multisample_target = (self.context.sample_count > 1).then(|| {
            MultisampleTarget::new(
                &self.context.device,
                self.context.surface_format,
                self.context.size,
                self.context.sample_count,
            )
        });
    }

    pub(crate) fn upload_slide(&mut self, index: usize, image: RgbaImage) {
        let (width, height) = image.dimensions();
        if self
            .textures
            .upload_slide(&self.context.device, &self.context.queue, index, image)
        {
            tracing::debug!(index, width, height, "slide texture uploaded");
        }
    }

    pub(crate) fn upload_displacement(&mut self, image: RgbaImage) {
        let (width, height) = image.dimensions();
        self.textures
            .upload_displacement(&self.context.device, &self.context.queue, image);
        tracing::debug!(width, height, "displacement texture uploaded");
    }

    /// Draws the displacement plane, then the overlay, and presents.
    pub(crate) fn render(&mut self, frame_input: &FrameInput<'_>) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let plane_resolution = frame_input
            .plane
            .map(|rect| [rect.width.max(1.0), rect.height.max(1.0)]);
        self.params.update(&frame_input.uniforms, plane_resolution);
        self.context.queue.write_buffer(
            &self.params_buffer,
            0,
            bytemuck::bytes_of(&self.params),
        );
        self.refresh_pair(frame_input.uniforms.texture_a, frame_input.uniforms.texture_b);
        self.upload_instances(frame_input.quads);

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("render encoder"),
                });
        let (attachment_view, resolve_target) =
            if let Some(msaa) = self.multisample_target.as_ref() {
                (&msaa.view, Some(&view))
            } else {
                (&view, None)
            };

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("slide pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: attachment_view,
                    depth_slice: None,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(BACKGROUND),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(pair) = self.pair.as_ref() {
                let surface_w = self.context.size.width as f32;
                let surface_h = self.context.size.height as f32;
                let visible = match frame_input.plane {
                    Some(rect) => {
                        let x = rect.x.clamp(0.0, surface_w);
                        let y = rect.y.clamp(0.0, surface_h);
                        let w = rect.width.min(surface_w - x);
                        let h = rect.height.min(surface_h - y);
                        render_pass.set_viewport(x, y, w, h, 0.0, 1.0);
                        w >= 1.0 && h >= 1.0
                    }
                    None => true,
                };
                if visible {
                    render_pass.set_pipeline(&self.displacement.pipeline);
                    render_pass.set_bind_group(0, &self.params_bind_group, &[]);
                    render_pass.set_bind_group(1, &pair.bind_group, &[]);
                    render_pass.draw(0..3, 0..1);
                }
                render_pass.set_viewport(0.0, 0.0, surface_w, surface_h, 0.0, 1.0);
            }

            if let Some(instances) = self.instances.as_ref() {
                if !frame_input.quads.is_empty() {
                    render_pass.set_pipeline(&self.overlay.pipeline);
                    render_pass.set_bind_group(0, &self.overlay_params_bind_group, &[]);
                    render_pass.set_vertex_buffer(0, instances.buffer.slice(..));
                    render_pass.draw(0..6, 0..frame_input.quads.len() as u32);
                }
            }
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn refresh_pair(&mut self, a: usize, b: usize) {
        let key = (a, b, self.textures.revision());
        if self.pair.as_ref().is_some_and(|pair| pair.key == key) {
            return;
        }
        match self
            .displacement
            .texture_bind_group(&self.context.device, &self.textures, a, b)
        {
            Some(bind_group) => {
                tracing::trace!(a, b, revision = key.2, "rebuilt texture pair bind group");
                self.pair = Some(PairBinding { key, bind_group });
            }
            None => {
                tracing::warn!(a, b, "texture pair out of range; skipping plane draw");
                self.pair = None;
            }
        }
    }

    fn upload_instances(&mut self, quads: &[OverlayQuad]) {
        if quads.is_empty() {
            return;
        }
        let needed = quads.len();
        let fits = self
            .instances
            .as_ref()
            .is_some_and(|instances| instances.capacity >= needed);
        if !fits {
            let capacity = needed.next_power_of_two().max(32);
            let buffer = self.context.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("overlay instance buffer"),
                size: (capacity * std::mem::size_of::<OverlayQuad>()) as wgpu::BufferAddress,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            self.instances = Some(OverlayBuffer { buffer, capacity });
        }
        if let Some(instances) = self.instances.as_ref() {
            self.context
                .queue
                .write_buffer(&instances.buffer, 0, bytemuck::cast_slice(quads));
        }
    }
}
