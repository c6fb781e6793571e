use std::path::PathBuf;

use crate::runtime::RenderPolicy;

/// Output color handling for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSpaceMode {
    /// Present the effect's output as-is on a non-sRGB swapchain.
    #[default]
    Auto,
    /// Treat shader outputs as gamma-encoded; use non-sRGB surfaces.
    Gamma,
    /// Treat shader outputs as linear and let an sRGB swapchain encode them.
    Linear,
}

/// Where the color-effect GLSL comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EffectSource {
    /// The harmonic wave effect compiled into the binary.
    #[default]
    Bundled,
    /// A user GLSL file defining `harmonicColorEffect`.
    File(PathBuf),
}

/// Immutable configuration passed to the renderer at start-up.
///
/// `RendererConfig` mirrors CLI flags and config-file settings: which effect
/// to compile, how large the window should be, and how the animation clock
/// behaves.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial window size in physical pixels.
    pub surface_size: (u32, u32),
    /// Open a borderless fullscreen window instead of a sized one.
    pub fullscreen: bool,
    /// Color effect to compile.
    pub effect: EffectSource,
    /// Input color handed to the effect for every pixel.
    pub base_color: [f32; 4],
    /// Desired color handling for the swapchain.
    pub color_space: ColorSpaceMode,
    /// Prefer tear-free (Fifo) presentation.
    pub vsync: bool,
    /// Mirror the interaction caption into the window title.
    pub captions: bool,
    /// Parameters for the shader parameter driver.
    pub driver: driver::DriverConfig,
    /// Whether the animation clock runs or stays pinned.
    pub policy: RenderPolicy,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            fullscreen: false,
            effect: EffectSource::default(),
            base_color: [0.0, 0.0, 0.0, 1.0],
            color_space: ColorSpaceMode::default(),
            vsync: true,
            captions: true,
            driver: driver::DriverConfig::default(),
            policy: RenderPolicy::default(),
        }
    }
}
