use frostglass::{AllocationError, PxSize, RenderTarget, TargetSlot};
use tracing::warn;

/// Usages every blur target needs: it is drawn into, sampled, and used as a
/// copy destination for backdrops.
pub(crate) const TARGET_USAGES: wgpu::TextureUsages = wgpu::TextureUsages::RENDER_ATTACHMENT
    .union(wgpu::TextureUsages::TEXTURE_BINDING)
    .union(wgpu::TextureUsages::COPY_DST)
    .union(wgpu::TextureUsages::COPY_SRC);

/// A render target backed by a wgpu texture.
#[derive(Debug)]
pub struct WgpuTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: PxSize,
}

impl WgpuTarget {
    pub(crate) fn new(
        device: &wgpu::Device,
        slot: TargetSlot,
        size: PxSize,
        format: wgpu::TextureFormat,
    ) -> Result<Self, AllocationError> {
        check_extent(size, device.limits().max_texture_dimension_2d).inspect_err(|err| {
            warn!(%slot, %err, "refusing blur target allocation");
        })?;

        let label = format!("frostglass {slot} target");
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&label),
            size: wgpu::Extent3d {
                width: size.width.positive(),
                height: size.height.positive(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: TARGET_USAGES,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(Self {
            texture,
            view,
            size,
        })
    }

    /// The backing texture.
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    /// A view of the whole texture.
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

impl RenderTarget for WgpuTarget {
    fn size(&self) -> PxSize {
        self.size
    }
}

/// Rejects extents wgpu would refuse: empty ones and ones above the device's
/// 2D texture limit.
pub fn check_extent(size: PxSize, limit: u32) -> Result<(), AllocationError> {
    let width = size.width.positive();
    let height = size.height.positive();
    if width == 0 || height == 0 {
        return Err(AllocationError::EmptyExtent { width, height });
    }
    if width > limit || height > limit {
        return Err(AllocationError::ExceedsLimit {
            width,
            height,
            limit,
        });
    }
    Ok(())
}
