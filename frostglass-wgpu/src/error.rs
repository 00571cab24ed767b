use thiserror::Error;

/// Failure to bring up a [`crate::BlurRenderer`].
#[derive(Debug, Error)]
pub enum RendererError {
    /// No adapter satisfied the request.
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    /// The adapter refused to open a device.
    #[error("failed to open GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    /// The target format cannot be rendered to and sampled from.
    #[error("texture format {0:?} is not renderable and filterable")]
    UnsupportedFormat(wgpu::TextureFormat),
}
