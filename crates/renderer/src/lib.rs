//! Renderer crate for Harmonic Shaders.
//!
//! The crate glues the winit window, the `wgpu` rendering pipeline, and the
//! shader parameter driver together. The overall flow is:
//!
//! ```text
//!   CLI / harmonic
//!          │ RendererConfig + haptics sink
//!          ▼
//!   Renderer::run ──▶ WindowState ──▶ winit event loop
//!                         │   press / release ──▶ ParameterDriver
//!                         │   AboutToWait     ──▶ tick() at base / speed
//!                         ▼
//!                    render_frame() ──▶ EffectUniforms ──▶ GPU UBO
//! ```
//!
//! `WindowState` owns all GPU resources (surface, device, pipeline, uniforms)
//! and the driver, while `Renderer` is the thin entry point. Color effects are
//! GLSL functions wrapped at runtime into a full fragment shader that receives
//! the five effect parameters through a uniform block.

mod compile;
mod gpu;
mod runtime;
mod types;
mod window;

use anyhow::Result;
use driver::BoxedHaptics;

pub use compile::{load_effect, wrap_color_effect, BUNDLED_EFFECT, EFFECT_ENTRY};
pub use runtime::RenderPolicy;
pub use types::{ColorSpaceMode, EffectSource, RendererConfig};

/// Entry point used by the CLI.
pub struct Renderer {
    config: RendererConfig,
    haptics: BoxedHaptics,
}

impl Renderer {
    /// Builds a renderer that fires interaction feedback into `haptics`.
    pub fn new(config: RendererConfig, haptics: BoxedHaptics) -> Self {
        Self { config, haptics }
    }

    /// Opens the window and blocks until it is closed.
    ///
    /// Must be called from the main thread on platforms that require it.
    pub fn run(self) -> Result<()> {
        window::run_window(self.config, self.haptics)
    }
}
