use crate::error::RenderError;
use crate::gpu::GpuContext;

/// A GPU texture that can be bound to shaders.
#[derive(Debug)]
pub struct Texture {
    #[allow(dead_code)]
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    /// Create a texture from raw RGBA data.
    pub fn from_rgba(gpu: &GpuContext, data: &[u8], width: u32, height: u32, label: &str) -> Self {
        use wgpu::util::DeviceExt;

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
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
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{label} Sampler")),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            width,
            height,
        }
    }

    /// Load a texture from an image file.
    pub fn from_file(gpu: &GpuContext, path: &str) -> Result<Self, RenderError> {
        let img = image::open(path)?.to_rgba8();
        log::debug!("loaded texture {path} ({}x{})", img.width(), img.height());
        Ok(Self::from_image(gpu, &img, path))
    }

    /// Load a texture from embedded bytes.
    pub fn from_bytes(gpu: &GpuContext, bytes: &[u8], label: &str) -> Result<Self, RenderError> {
        let img = decode_rgba(bytes)?;
        Ok(Self::from_image(gpu, &img, label))
    }

    fn from_image(gpu: &GpuContext, img: &image::RgbaImage, label: &str) -> Self {
        let (width, height) = img.dimensions();
        Self::from_rgba(gpu, img, width, height, label)
    }

    /// A single-color 1x1 texture.
    pub fn solid(gpu: &GpuContext, rgba: [u8; 4], label: &str) -> Self {
        Self::from_rgba(gpu, &rgba, 1, 1, label)
    }

    /// A two-tone checkerboard, `size` pixels square with `cells` cells per side.
    pub fn checker(gpu: &GpuContext, size: u32, cells: u32) -> Self {
        let data = checker_pixels(size, cells, [235, 235, 235, 255], [90, 90, 100, 255]);
        Self::from_rgba(gpu, &data, size, size, "Checker Texture")
    }
}

/// Decode any supported image format into tightly packed RGBA8.
fn decode_rgba(bytes: &[u8]) -> Result<image::RgbaImage, RenderError> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

fn checker_pixels(size: u32, cells: u32, light: [u8; 4], dark: [u8; 4]) -> Vec<u8> {
    let cell = (size / cells.max(1)).max(1);
    let mut data = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let color = if (x / cell + y / cell) % 2 == 0 {
                light
            } else {
                dark
            };
            data.extend_from_slice(&color);
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checker_alternates_cells() {
        let light = [255, 255, 255, 255];
        let dark = [0, 0, 0, 255];
        let data = checker_pixels(4, 2, light, dark);
        assert_eq!(data.len(), 4 * 4 * 4);

        let pixel = |x: usize, y: usize| &data[(y * 4 + x) * 4..(y * 4 + x) * 4 + 4];
        assert_eq!(pixel(0, 0), light);
        assert_eq!(pixel(1, 1), light);
        assert_eq!(pixel(2, 0), dark);
        assert_eq!(pixel(0, 2), dark);
        assert_eq!(pixel(3, 3), light);
    }

    #[test]
    fn decodes_png_to_rgba() {
        let mut source = image::RgbImage::new(2, 1);
        source.put_pixel(0, 0, image::Rgb([255, 0, 0]));
        source.put_pixel(1, 0, image::Rgb([0, 0, 255]));
        let mut png = Vec::new();
        source
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let decoded = decode_rgba(&png).unwrap();
        assert_eq!(decoded.dimensions(), (2, 1));
        assert_eq!(decoded.as_raw().as_slice(), &[255, 0, 0, 255, 0, 0, 255, 255]);
    }

    #[test]
    fn undecodable_bytes_are_a_texture_error() {
        match decode_rgba(b"not an image") {
            Err(RenderError::Texture(_)) => {}
            other => panic!("expected a texture error, got {other:?}"),
        }
    }

    #[test]
    fn checker_tolerates_more_cells_than_pixels() {
        let data = checker_pixels(2, 8, [1; 4], [2; 4]);
        assert_eq!(&data[0..4], &[1u8; 4]);
        assert_eq!(&data[4..8], &[2u8; 4]);
    }
}
