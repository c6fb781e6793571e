use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use renderer::{ColorSpaceMode, EffectSource, RenderPolicy, Renderer, RendererConfig};
use settings::{ColorSpaceSetting, HarmonicConfig};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::haptics::haptics_for;
use crate::paths::AppPaths;

/// Settings together with the file they were read from, if any.
#[derive(Debug)]
pub struct LoadedSettings {
    pub settings: HarmonicConfig,
    pub source: Option<PathBuf>,
}

pub fn run(config_override: Option<&Path>, args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let LoadedSettings {
        mut settings,
        source,
    } = load_settings(&paths, config_override)?;
    tracing::debug!(
        config_dir = %paths.config_dir().display(),
        source = ?source,
        "resolved harmonic settings"
    );

    apply_overrides(&mut settings, &args);
    settings
        .validate()
        .context("command-line overrides produced an invalid configuration")?;

    let config = renderer_config(&settings, args.still);
    tracing::info!(
        effect = ?config.effect,
        haptics = ?settings.haptics.mode,
        "starting harmonic shaders"
    );
    Renderer::new(config, haptics_for(settings.haptics.mode)).run()
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the explicit config file, or the default one when it exists.
///
/// Relative `shader.path` entries are resolved against the config file's
/// directory.
pub fn load_settings(paths: &AppPaths, explicit: Option<&Path>) -> Result<LoadedSettings> {
    let (mut settings, source) = match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("configuration file {} does not exist", path.display());
            }
            let settings = HarmonicConfig::load(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            (settings, Some(path.to_path_buf()))
        }
        None => {
            let path = paths.config_file();
            let exists = path.exists();
            let settings = HarmonicConfig::load_or_default(&path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            (settings, exists.then_some(path))
        }
    };

    if let (Some(shader), Some(source)) = (settings.shader.path.as_mut(), source.as_ref()) {
        if shader.is_relative() {
            if let Some(parent) = source.parent() {
                *shader = parent.join(&*shader);
            }
        }
    }

    Ok(LoadedSettings { settings, source })
}

pub fn apply_overrides(settings: &mut HarmonicConfig, args: &RunArgs) {
    if let Some(shader) = &args.shader {
        settings.shader.path = Some(shader.clone());
    }
    if let Some((width, height)) = args.size {
        settings.window.width = width;
        settings.window.height = height;
    }
    if args.fullscreen {
        settings.window.fullscreen = true;
    }
    if let Some(color_space) = args.color_space {
        settings.shader.color_space = color_space;
    }
    if let Some(mode) = args.haptics {
        settings.haptics.mode = mode;
    }
    if args.no_vsync {
        settings.window.vsync = false;
    }
    if let Some(transition) = args.transition {
        settings.animation.transition = transition;
    }
}

pub fn renderer_config(settings: &HarmonicConfig, still: Option<f32>) -> RendererConfig {
    RendererConfig {
        surface_size: (settings.window.width, settings.window.height),
        fullscreen: settings.window.fullscreen,
        effect: match &settings.shader.path {
            Some(path) => EffectSource::File(path.clone()),
            None => EffectSource::Bundled,
        },
        base_color: settings.shader.base_color,
        color_space: map_color_space(settings.shader.color_space),
        vsync: settings.window.vsync,
        captions: settings.window.captions,
        driver: settings.driver_config(),
        policy: match still {
            Some(time) => RenderPolicy::Still { time },
            None => RenderPolicy::Animate,
        },
    }
}

fn map_color_space(setting: ColorSpaceSetting) -> ColorSpaceMode {
    match setting {
        ColorSpaceSetting::Auto => ColorSpaceMode::Auto,
        ColorSpaceSetting::Gamma => ColorSpaceMode::Gamma,
        ColorSpaceSetting::Linear => ColorSpaceMode::Linear,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use settings::HapticsMode;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_default_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let paths = AppPaths::from_raw(dir.path().to_path_buf());
        let loaded = load_settings(&paths, None).unwrap();
        assert_eq!(loaded.settings, HarmonicConfig::default());
        assert!(loaded.source.is_none());
    }

    #[test]
    fn explicit_file_must_exist() {
        let dir = TempDir::new().unwrap();
        let paths = AppPaths::from_raw(dir.path().to_path_buf());
        let missing = dir.path().join("nope.toml");
        assert!(load_settings(&paths, Some(&missing)).is_err());
    }

    #[test]
    fn relative_shader_path_resolves_against_config_file() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("custom.toml");
        fs::write(&config_path, "[shader]\npath = \"effects/waves.glsl\"\n").unwrap();
        let paths = AppPaths::from_raw(dir.path().join("unused"));

        let loaded = load_settings(&paths, Some(&config_path)).unwrap();
        assert_eq!(
            loaded.settings.shader.path,
            Some(dir.path().join("effects/waves.glsl"))
        );
        assert_eq!(loaded.source, Some(config_path));
    }

    #[test]
    fn overrides_take_precedence_over_file() {
        let mut settings = HarmonicConfig::default();
        let args = RunArgs {
            shader: Some(PathBuf::from("/tmp/effect.glsl")),
            size: Some((640, 480)),
            fullscreen: true,
            still: None,
            color_space: Some(ColorSpaceSetting::Linear),
            haptics: Some(HapticsMode::Off),
            no_vsync: true,
            transition: Some(Duration::from_millis(500)),
        };
        apply_overrides(&mut settings, &args);

        assert_eq!(settings.window.width, 640);
        assert_eq!(settings.window.height, 480);
        assert!(settings.window.fullscreen);
        assert!(!settings.window.vsync);
        assert_eq!(settings.shader.color_space, ColorSpaceSetting::Linear);
        assert_eq!(settings.haptics.mode, HapticsMode::Off);
        assert_eq!(settings.animation.transition, Duration::from_millis(500));
    }

    #[test]
    fn renderer_config_mirrors_settings() {
        let mut settings = HarmonicConfig::default();
        settings.shader.path = Some(PathBuf::from("/tmp/effect.glsl"));
        settings.window.captions = false;

        let config = renderer_config(&settings, Some(4.0));
        assert_eq!(
            config.effect,
            EffectSource::File(PathBuf::from("/tmp/effect.glsl"))
        );
        assert_eq!(config.surface_size, (1280, 720));
        assert_eq!(config.policy, RenderPolicy::Still { time: 4.0 });
        assert!(!config.captions);
        assert_eq!(config.driver, settings.driver_config());

        let animated = renderer_config(&HarmonicConfig::default(), None);
        assert_eq!(animated.effect, EffectSource::Bundled);
        assert_eq!(animated.policy, RenderPolicy::Animate);
    }
}
