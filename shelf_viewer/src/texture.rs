use std::{borrow::Cow, path::Path};

use anyhow::{Result, ensure};
use image::ImageError;
use shelf_core::CoverLoadError;

/// A cover scan decoded to tightly packed RGBA8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCover {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

pub fn decode_cover(path: &Path) -> std::result::Result<DecodedCover, CoverLoadError> {
    let label = path.display().to_string();
    let reader = image::io::Reader::open(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => CoverLoadError::Missing(label.clone()),
        _ => CoverLoadError::Io {
            path: label.clone(),
            reason: err.to_string(),
        },
    })?;
    let reader = reader.with_guessed_format().map_err(|err| CoverLoadError::Io {
        path: label.clone(),
        reason: err.to_string(),
    })?;
    let image = reader.decode().map_err(|err| match err {
        ImageError::IoError(io) => CoverLoadError::Io {
            path: label.clone(),
            reason: io.to_string(),
        },
        other => CoverLoadError::Decode {
            path: label.clone(),
            reason: other.to_string(),
        },
    })?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(CoverLoadError::Decode {
            path: label,
            reason: "image has no pixels".to_string(),
        });
    }
    Ok(DecodedCover {
        width,
        height,
        data: rgba.into_raw(),
    })
}

pub struct TextureUpload<'a> {
    data: Cow<'a, [u8]>,
    bytes_per_row: u32,
}

impl TextureUpload<'_> {
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.bytes_per_row
    }
}

/// Pad RGBA rows to the copy alignment wgpu requires, borrowing the source
/// when it is already aligned.
pub fn prepare_rgba_upload(width: u32, height: u32, data: &[u8]) -> Result<TextureUpload<'_>> {
    ensure!(width > 0 && height > 0, "texture has no dimensions");
    let row_bytes = 4usize * width as usize;
    let alignment = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize;
    let expected = row_bytes * height as usize;
    ensure!(
        data.len() >= expected,
        "texture buffer ({}) smaller than {}x{} RGBA ({})",
        data.len(),
        width,
        height,
        expected
    );

    if row_bytes % alignment == 0 {
        return Ok(TextureUpload {
            data: Cow::Borrowed(&data[..expected]),
            bytes_per_row: row_bytes as u32,
        });
    }

    let padded_row_bytes = row_bytes.div_ceil(alignment) * alignment;
    let mut buffer = vec![0u8; padded_row_bytes * height as usize];
    for (row, source) in data[..expected].chunks_exact(row_bytes).enumerate() {
        let offset = row * padded_row_bytes;
        buffer[offset..offset + row_bytes].copy_from_slice(source);
    }

    Ok(TextureUpload {
        data: Cow::Owned(buffer),
        bytes_per_row: padded_row_bytes as u32,
    })
}

/// A cover living on the GPU. Dropping it releases the texture.
pub struct GpuCover {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

impl GpuCover {
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

/// Layout and sampler shared by every cover bind group.
pub struct CoverBinding {
    pub layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

impl CoverBinding {
    pub fn new(device: &wgpu::Device) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("cover-bind-group-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("cover-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        Self { layout, sampler }
    }

    pub fn upload(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        cover: &DecodedCover,
    ) -> Result<GpuCover> {
        let extent = wgpu::Extent3d {
            width: cover.width,
            height: cover.height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let upload = prepare_rgba_upload(cover.width, cover.height, &cover.data)?;
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            upload.pixels(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(upload.bytes_per_row()),
                rows_per_image: Some(cover.height),
            },
            extent,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });
        Ok(GpuCover {
            _texture: texture,
            bind_group,
        })
    }

    /// 1x1 white texture for flat-tinted draws (placeholders, outlines).
    pub fn white(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<GpuCover> {
        let pixel = DecodedCover {
            width: 1,
            height: 1,
            data: vec![255; 4],
        };
        self.upload(device, queue, "white-texture", &pixel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn aligned_rows_are_borrowed() {
        let data = vec![7u8; 64 * 4 * 2];
        let upload = prepare_rgba_upload(64, 2, &data).expect("upload");
        assert_eq!(upload.bytes_per_row(), 256);
        assert!(matches!(upload.data, Cow::Borrowed(_)));
    }

    #[test]
    fn unaligned_rows_are_padded() {
        let data: Vec<u8> = (0..(3 * 4 * 2)).map(|value| value as u8).collect();
        let upload = prepare_rgba_upload(3, 2, &data).expect("upload");
        assert_eq!(upload.bytes_per_row(), 256);
        assert_eq!(upload.pixels().len(), 512);
        assert_eq!(&upload.pixels()[..12], &data[..12]);
        assert_eq!(&upload.pixels()[256..268], &data[12..24]);
        assert!(upload.pixels()[12..256].iter().all(|byte| *byte == 0));
    }

    #[test]
    fn short_buffer_is_rejected() {
        assert!(prepare_rgba_upload(4, 4, &[0u8; 10]).is_err());
        assert!(prepare_rgba_upload(0, 4, &[]).is_err());
    }

    #[test]
    fn decode_reads_png_covers() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("cover.png");
        let image: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_fn(5, 3, |x, y| Rgba([x as u8 * 40, y as u8 * 80, 10, 255]));
        image.save(&path).expect("write png");

        let cover = decode_cover(&path).expect("decode");
        assert_eq!((cover.width, cover.height), (5, 3));
        assert_eq!(cover.data.len(), 5 * 3 * 4);
        assert_eq!(&cover.data[4..8], &[40, 0, 10, 255]);
    }

    #[test]
    fn decode_classifies_failures() {
        let temp = tempdir().expect("temp dir");
        let missing = temp.path().join("missing.png");
        assert!(matches!(
            decode_cover(&missing),
            Err(CoverLoadError::Missing(_))
        ));

        let garbage = temp.path().join("garbage.png");
        fs::write(&garbage, b"definitely not an image").expect("write");
        assert!(matches!(
            decode_cover(&garbage),
            Err(CoverLoadError::Decode { .. })
        ));
    }
}
