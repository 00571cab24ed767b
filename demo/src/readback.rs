use std::{path::Path, sync::mpsc};

use anyhow::Context;
use frostglass_wgpu::BlurRenderer;

/// Copies `texture` back to the CPU as tightly packed RGBA8 rows.
pub fn read_rgba8(renderer: &BlurRenderer, texture: &wgpu::Texture) -> anyhow::Result<Vec<u8>> {
    let device = renderer.device();
    let extent = texture.size();
    let unpadded = extent.width * 4;
    let padded = unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
        * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("frostglass_demo_readback"),
        size: u64::from(padded) * u64::from(extent.height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("frostglass_demo_readback_encoder"),
    });
    encoder.copy_texture_to_buffer(
        texture.as_image_copy(),
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(extent.height),
            },
        },
        extent,
    );
    renderer.queue().submit(Some(encoder.finish()));

    let slice = buffer.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device
        .poll(wgpu::PollType::wait_indefinitely())
        .context("device poll failed")?;
    rx.recv()
        .context("map callback dropped")?
        .context("readback buffer map failed")?;

    let mapped = slice.get_mapped_range();
    let mut pixels = Vec::with_capacity((unpadded * extent.height) as usize);
    for row in mapped.chunks_exact(padded as usize) {
        pixels.extend_from_slice(&row[..unpadded as usize]);
    }
    drop(mapped);
    buffer.unmap();
    Ok(pixels)
}

/// Writes tightly packed RGBA8 pixels as a PNG.
pub fn save_png(path: &Path, pixels: &[u8], width: u32, height: u32) -> anyhow::Result<()> {
    image::save_buffer_with_format(
        path,
        pixels,
        width,
        height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("failed to write {}", path.display()))
}
