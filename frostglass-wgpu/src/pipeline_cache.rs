use std::{io, path::Path};

use tracing::{debug, info};

use crate::config::PipelineCachePolicy;

/// Creates a pipeline cache according to `policy`, seeded from disk when a
/// persisted cache for this adapter exists.
pub(crate) fn initialize_cache(
    device: &wgpu::Device,
    adapter_info: &wgpu::AdapterInfo,
    policy: &PipelineCachePolicy,
) -> Option<wgpu::PipelineCache> {
    if !policy.is_enabled() || !device.features().contains(wgpu::Features::PIPELINE_CACHE) {
        return None;
    }

    let cache_data = policy.directory().and_then(|dir| {
        let key = wgpu::util::pipeline_cache_key(adapter_info)?;
        let data = std::fs::read(dir.join(key)).ok()?;
        debug!(bytes = data.len(), "loaded pipeline cache");
        Some(data)
    });

    // SAFETY: `fallback` makes wgpu discard data that does not match this
    // adapter and driver instead of trusting it.
    unsafe {
        Some(device.create_pipeline_cache(&wgpu::PipelineCacheDescriptor {
            label: Some("frostglass_pipeline_cache"),
            data: cache_data.as_deref(),
            fallback: true,
        }))
    }
}

/// Writes `cache` into `dir` under the adapter-specific cache key.
pub(crate) fn save_cache(
    cache: &wgpu::PipelineCache,
    adapter_info: &wgpu::AdapterInfo,
    dir: &Path,
) -> io::Result<()> {
    let cache_filename = wgpu::util::pipeline_cache_key(adapter_info)
        .ok_or_else(|| io::Error::new(io::ErrorKind::Unsupported, "Cache not supported"))?;

    if let Some(data) = cache.get_data() {
        std::fs::create_dir_all(dir)?;
        let cache_path = dir.join(&cache_filename);
        std::fs::write(&cache_path, &data)?;
        info!(path = %cache_path.display(), bytes = data.len(), "saved pipeline cache");
    }

    Ok(())
}
