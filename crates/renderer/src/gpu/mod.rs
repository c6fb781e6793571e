//! GPU orchestration for the color-effect renderer.
//!
//! - `context` owns wgpu instance/device/surface wiring and knows how to
//!   rebuild swapchain state when the window resizes.
//! - `pipeline` compiles the wrapped color effect into a render pipeline with
//!   a single uniform bind group.
//! - `uniforms` mirrors the effect's uniform block and is rewritten from the
//!   driver's parameters every frame.
//! - `state` glues everything together and exposes the `GpuState` API used by
//!   `window`.

mod context;
mod pipeline;
mod state;
mod uniforms;

pub(crate) use state::GpuState;
