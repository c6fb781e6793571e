use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use driver::{AnimationCurve, DriverConfig, Setpoint};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

pub const CURRENT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CurveSetting {
    Linear,
    EaseInOut,
    #[default]
    Spring,
}

impl From<CurveSetting> for AnimationCurve {
    fn from(value: CurveSetting) -> Self {
        match value {
            CurveSetting::Linear => AnimationCurve::Linear,
            CurveSetting::EaseInOut => AnimationCurve::EaseInOut,
            CurveSetting::Spring => AnimationCurve::Spring,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpaceSetting {
    #[default]
    Auto,
    Gamma,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HapticsMode {
    /// Record each pulse as a tracing event.
    #[default]
    Log,
    /// Ring the terminal bell on each pulse.
    Bell,
    Off,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HarmonicConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub animation: AnimationSettings,
    #[serde(default)]
    pub resting: SetpointSettings,
    #[serde(default)]
    pub active: SetpointSettings,
    #[serde(default)]
    pub shader: ShaderSettings,
    #[serde(default)]
    pub window: WindowSettings,
    #[serde(default)]
    pub haptics: HapticsSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnimationSettings {
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub base_interval: Duration,
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub transition: Duration,
    pub curve: CurveSetting,
    pub layers: f32,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        let defaults = DriverConfig::default();
        Self {
            base_interval: defaults.base_interval,
            transition: defaults.transition,
            curve: CurveSetting::default(),
            layers: defaults.layers,
        }
    }
}

/// Partial set-point; unset fields fall back to the phase's built-in value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct SetpointSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amplitude: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

impl SetpointSettings {
    pub fn resolve(&self, fallback: Setpoint) -> Setpoint {
        Setpoint {
            amplitude: self.amplitude.unwrap_or(fallback.amplitude),
            speed: self.speed.unwrap_or(fallback.speed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ShaderSettings {
    /// Optional GLSL file providing `harmonicColorEffect`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Input color handed to the effect for every pixel.
    pub base_color: [f32; 4],
    pub color_space: ColorSpaceSetting,
}

impl Default for ShaderSettings {
    fn default() -> Self {
        Self {
            path: None,
            base_color: [0.0, 0.0, 0.0, 1.0],
            color_space: ColorSpaceSetting::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowSettings {
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    pub vsync: bool,
    /// Mirror the interaction caption into the window title.
    pub captions: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: true,
            captions: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HapticsSettings {
    pub mode: HapticsMode,
}

impl Default for HarmonicConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            animation: AnimationSettings::default(),
            resting: SetpointSettings::default(),
            active: SetpointSettings::default(),
            shader: ShaderSettings::default(),
            window: WindowSettings::default(),
            haptics: HapticsSettings::default(),
        }
    }
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn serialize_duration<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*value).to_string())
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Duration::try_from_secs_f64(v)
                .map_err(|err| E::custom(format!("invalid duration {v}: {err}")))
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl HarmonicConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: HarmonicConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Loads `path` when it exists, otherwise returns the built-in defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            base_interval: self.animation.base_interval,
            transition: self.animation.transition,
            curve: self.animation.curve.into(),
            layers: self.animation.layers,
            resting: self.resting.resolve(Setpoint::RESTING),
            active: self.active.resolve(Setpoint::ACTIVE),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CURRENT_VERSION {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected {CURRENT_VERSION}",
                self.version
            )));
        }

        self.driver_config()
            .validate()
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;

        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(
                "window dimensions must be greater than zero".into(),
            ));
        }

        if let Some(component) = self
            .shader
            .base_color
            .iter()
            .find(|value| !(0.0..=1.0).contains(*value))
        {
            return Err(ConfigError::Invalid(format!(
                "shader.base_color components must be within 0.0-1.0 (got {component})"
            )));
        }

        if let Some(path) = &self.shader.path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("shader.path may not be empty".into()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = 1

[animation]
base_interval = "8ms"
transition = 0.5
curve = "ease-in-out"
layers = 4

[resting]
amplitude = 0.25

[active]
speed = 3.0

[shader]
path = "effects/ripple.glsl"
base_color = [0.1, 0.0, 0.2, 1.0]
color_space = "linear"

[window]
width = 800
height = 600
fullscreen = true

[haptics]
mode = "bell"
"#;

    #[test]
    fn parses_sample_config() {
        let config = HarmonicConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.animation.base_interval, Duration::from_millis(8));
        assert_eq!(config.animation.transition, Duration::from_millis(500));
        assert_eq!(config.animation.curve, CurveSetting::EaseInOut);
        assert_eq!(config.shader.color_space, ColorSpaceSetting::Linear);
        assert_eq!(
            config.shader.path.as_deref(),
            Some(Path::new("effects/ripple.glsl"))
        );
        assert!(config.window.fullscreen);
        assert!(config.window.vsync);
        assert_eq!(config.haptics.mode, HapticsMode::Bell);
    }

    #[test]
    fn partial_setpoints_fall_back_per_phase() {
        let config = HarmonicConfig::from_toml_str(SAMPLE).unwrap();
        let driver = config.driver_config();
        assert_eq!(driver.resting.amplitude, 0.25);
        assert_eq!(driver.resting.speed, 1.0);
        assert_eq!(driver.active.amplitude, 2.0);
        assert_eq!(driver.active.speed, 3.0);
        assert_eq!(driver.curve, AnimationCurve::EaseInOut);
        assert_eq!(driver.layers, 4.0);
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = HarmonicConfig::from_toml_str("").unwrap();
        assert_eq!(config, HarmonicConfig::default());
        assert_eq!(config.driver_config(), DriverConfig::default());
    }

    #[test]
    fn rejects_unknown_version() {
        let err = HarmonicConfig::from_toml_str("version = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_speed() {
        let err = HarmonicConfig::from_toml_str("[active]\nspeed = 0.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("speed")));
    }

    #[test]
    fn rejects_out_of_range_color() {
        let err =
            HarmonicConfig::from_toml_str("[shader]\nbase_color = [1.5, 0.0, 0.0, 1.0]").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_malformed_duration() {
        let err =
            HarmonicConfig::from_toml_str("[animation]\ntransition = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_overflowing_duration() {
        let err =
            HarmonicConfig::from_toml_str("[animation]\nbase_interval = 1e300\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_unknown_curve() {
        let err = HarmonicConfig::from_toml_str("[animation]\ncurve = \"bouncy\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_or_default_handles_missing_and_present_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harmonic.toml");
        let missing = HarmonicConfig::load_or_default(&path).unwrap();
        assert_eq!(missing, HarmonicConfig::default());

        fs::write(&path, "[window]\nwidth = 640\nheight = 480\n").unwrap();
        let loaded = HarmonicConfig::load_or_default(&path).unwrap();
        assert_eq!(loaded.window.width, 640);
        assert_eq!(loaded.window.height, 480);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = HarmonicConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
