use image::imageops::flip_vertical_in_place;
use image::RgbaImage;
use wgpu::util::{DeviceExt, TextureDataOrder};

use super::context::SurfaceColorSpace;

/// Dark grey shown for slides whose image has not arrived (or never will).
const SLIDE_PLACEHOLDER: [u8; 4] = [24, 24, 28, 255];
/// Mid grey displacement yields a uniform shift instead of a distortion.
const DISPLACEMENT_PLACEHOLDER: [u8; 4] = [128, 128, 128, 255];

pub(crate) struct TextureResource {
    _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

/// One texture per slide plus the displacement map; every slot starts out as
/// a 1x1 placeholder and is replaced once its image is decoded.
pub(crate) struct TextureLibrary {
    slides: Vec<TextureResource>,
    displacement: TextureResource,
    color_space: SurfaceColorSpace,
    /// Bumped on every upload so cached bind groups can be invalidated.
    revision: u64,
}

impl TextureLibrary {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        slide_count: usize,
        color_space: SurfaceColorSpace,
    ) -> Self {
        let slides = (0..slide_count)
            .map(|index| {
                create_placeholder(
                    device,
                    queue,
                    &format!("slide placeholder #{index}"),
                    SLIDE_PLACEHOLDER,
                    wgpu::AddressMode::ClampToEdge,
                    color_space,
                )
            })
            .collect();
        let displacement = create_placeholder(
            device,
            queue,
            "displacement placeholder",
            DISPLACEMENT_PLACEHOLDER,
            wgpu::AddressMode::Repeat,
            // Displacement values are data, never colour-managed.
            SurfaceColorSpace::Gamma,
        );
        Self {
            slides,
            displacement,
            color_space,
            revision: 0,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn slide(&self, index: usize) -> Option<&TextureResource> {
        self.slides.get(index)
    }

    pub fn displacement(&self) -> &TextureResource {
        &self.displacement
    }

    /// Replaces the texture for `index`; out-of-range slots are ignored.
    pub fn upload_slide(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        index: usize,
        image: RgbaImage,
    ) -> bool {
        if index >= self.slides.len() {
            tracing::warn!(index, "texture upload for unknown slide ignored");
            return false;
        }
        self.slides[index] = create_from_image(
            device,
            queue,
            &format!("slide texture #{index}"),
            image,
            wgpu::AddressMode::ClampToEdge,
            self.color_space,
        );
        self.revision += 1;
        true
    }

    pub fn upload_displacement(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: RgbaImage,
    ) {
        self.displacement = create_from_image(
            device,
            queue,
            "displacement texture",
            image,
            wgpu::AddressMode::Repeat,
            SurfaceColorSpace::Gamma,
        );
        self.revision += 1;
    }
}

fn create_placeholder(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    texel: [u8; 4],
    address_mode: wgpu::AddressMode,
    color_space: SurfaceColorSpace,
) -> TextureResource {
    upload(
        device,
        queue,
        label,
        (1, 1),
        &texel,
        address_mode,
        color_space,
    )
}

fn create_from_image(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    mut image: RgbaImage,
    address_mode: wgpu::AddressMode,
    color_space: SurfaceColorSpace,
) -> TextureResource {
    // Shader uv has its origin bottom-left.
    flip_vertical_in_place(&mut image);
    let dimensions = image.dimensions();
    upload(
        device,
        queue,
        label,
        dimensions,
        image.as_raw(),
        address_mode,
        color_space,
    )
}

fn upload(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    (width, height): (u32, u32),
    data: &[u8],
    address_mode: wgpu::AddressMode,
    color_space: SurfaceColorSpace,
) -> TextureResource {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: color_space.texture_format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        TextureDataOrder::LayerMajor,
        data,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        address_mode_w: address_mode,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    });

    TextureResource {
        _texture: texture,
        view,
        sampler,
    }
}
