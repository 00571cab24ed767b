//! wgpu backend for [`frostglass`].
//!
//! [`BlurRenderer`] owns the compiled programs for one device. Each frame,
//! [`BlurRenderer::begin_frame`] wraps the frame's command encoder and
//! texture in a [`BlurFrame`], which implements [`frostglass::RenderDevice`]
//! and is passed to [`frostglass::BlurEffect::paint`].
//!
//! ```no_run
//! # async fn run() -> Result<(), frostglass_wgpu::RendererError> {
//! use frostglass::PxSize;
//! use frostglass_wgpu::{BlurRenderer, RendererConfig};
//!
//! let renderer = BlurRenderer::headless(RendererConfig::default()).await?;
//! let frame = renderer.create_frame_texture(PxSize::from_u32(1280, 720));
//! let mut encoder = renderer
//!     .device()
//!     .create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
//! {
//!     let mut blur_frame = renderer.begin_frame(&mut encoder, &frame);
//!     // effect.paint(&mut blur_frame, dirty);
//! #   let _ = &mut blur_frame;
//! }
//! renderer.queue().submit(Some(encoder.finish()));
//! renderer.shutdown();
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs, clippy::unwrap_used)]

pub mod config;
mod error;
mod frame;
mod pipeline_cache;
mod pipelines;
mod renderer;
mod target;
#[cfg(test)]
mod test;

pub use crate::{
    config::{PipelineCachePolicy, RendererConfig},
    error::RendererError,
    frame::BlurFrame,
    pipelines::BlurPipelines,
    renderer::BlurRenderer,
    target::{WgpuTarget, check_extent},
};

pub use wgpu;

#[cfg(test)]
mod shader_tests {
    //! Parse and validate the WGSL programs and check that the uniform structs
    //! match the layouts naga computes for them.

    use crate::pipelines::{CompositeUniforms, KernelUniforms};

    const KERNEL_WGSL: &str = include_str!("shaders/kernel.wgsl");
    const COMPOSITE_WGSL: &str = include_str!("shaders/composite.wgsl");

    fn validate(source: &str) -> naga::Module {
        let module = match naga::front::wgsl::parse_str(source) {
            Ok(module) => module,
            Err(err) => panic!("WGSL parse failed:\n{}", err.emit_to_string(source)),
        };
        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        if let Err(err) = validator.validate(&module) {
            panic!("WGSL validation failed: {err:?}");
        }
        module
    }

    fn struct_span(module: &naga::Module, name: &str) -> u32 {
        module
            .types
            .iter()
            .find_map(|(_, ty)| match (&ty.name, &ty.inner) {
                (Some(ty_name), naga::TypeInner::Struct { span, .. }) if ty_name == name => {
                    Some(*span)
                }
                _ => None,
            })
            .unwrap_or_else(|| panic!("struct {name} not found"))
    }

    fn entry_points(module: &naga::Module) -> Vec<&str> {
        module
            .entry_points
            .iter()
            .map(|entry| entry.name.as_str())
            .collect()
    }

    #[test]
    fn kernel_program_is_valid() {
        let module = validate(KERNEL_WGSL);
        assert_eq!(entry_points(&module), ["vs_main", "fs_main"]);
        assert_eq!(
            struct_span(&module, "KernelParams") as usize,
            std::mem::size_of::<KernelUniforms>()
        );
    }

    #[test]
    fn kernel_program_bounds_its_loop() {
        let bound = format!("const MAX_STEPS: u32 = {}u;", frostglass::MAX_KERNEL_STEPS);
        assert!(KERNEL_WGSL.contains(&bound), "kernel.wgsl must declare `{bound}`");
        assert!(KERNEL_WGSL.contains("let steps = min(params.steps, MAX_STEPS);"));
        assert!(KERNEL_WGSL.contains("i <= steps;"));
    }

    #[test]
    fn composite_program_is_valid() {
        let module = validate(COMPOSITE_WGSL);
        assert_eq!(
            entry_points(&module),
            ["vs_main", "fs_copy", "fs_brightness"]
        );
        assert_eq!(
            struct_span(&module, "CompositeParams") as usize,
            std::mem::size_of::<CompositeUniforms>()
        );
    }
}
