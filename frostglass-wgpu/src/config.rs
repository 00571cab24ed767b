//! Renderer configuration.

use std::path::PathBuf;

/// Where compiled pipelines are cached between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineCachePolicy {
    /// Do not create a `wgpu::PipelineCache`.
    Disabled,
    /// Create a cache for this process only.
    InMemory,
    /// Load the cache from, and save it to, a directory. `None` uses the
    /// user cache directory.
    Persistent(Option<PathBuf>),
}

impl Default for PipelineCachePolicy {
    fn default() -> Self {
        PipelineCachePolicy::Persistent(None)
    }
}

impl PipelineCachePolicy {
    /// Directory the cache is persisted to, if any.
    pub fn directory(&self) -> Option<PathBuf> {
        match self {
            PipelineCachePolicy::Persistent(Some(dir)) => Some(dir.clone()),
            PipelineCachePolicy::Persistent(None) => dirs::cache_dir(),
            PipelineCachePolicy::Disabled | PipelineCachePolicy::InMemory => None,
        }
    }

    /// Returns `true` if a pipeline cache should be created at all.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, PipelineCachePolicy::Disabled)
    }
}

/// Settings for [`crate::BlurRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Format of the frame texture and of every blur target. Backdrop copies
    /// require both to match.
    pub target_format: wgpu::TextureFormat,
    /// Pipeline cache behaviour.
    pub pipeline_cache: PipelineCachePolicy,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            target_format: wgpu::TextureFormat::Rgba8Unorm,
            pipeline_cache: PipelineCachePolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_directory_wins() {
        let dir = PathBuf::from("/tmp/frostglass-cache");
        let policy = PipelineCachePolicy::Persistent(Some(dir.clone()));
        assert_eq!(policy.directory(), Some(dir));
        assert!(policy.is_enabled());
    }

    #[test]
    fn non_persistent_policies_have_no_directory() {
        assert_eq!(PipelineCachePolicy::InMemory.directory(), None);
        assert_eq!(PipelineCachePolicy::Disabled.directory(), None);
        assert!(!PipelineCachePolicy::Disabled.is_enabled());
        assert!(PipelineCachePolicy::InMemory.is_enabled());
    }
}
