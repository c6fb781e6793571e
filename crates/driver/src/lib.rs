//! Shader parameter driver for the harmonic background.
//!
//! The driver is an explicit two-state machine (resting / active) plus a
//! per-tick update function. It owns the animation clock and the animated
//! amplitude/speed values, and turns them into the five parameters the color
//! effect consumes every frame:
//!
//! ```text
//!   press / release ──▶ ParameterDriver ──▶ tick() ──▶ parameters() ──▶ GPU
//!                            │
//!                            └─▶ HapticFeedback (one pulse per press)
//! ```
//!
//! Nothing here touches the window system or the GPU, so the whole contract
//! is testable with synthetic `Instant`s.

mod haptics;
mod machine;
mod params;
mod timeline;

use std::time::Duration;

pub use haptics::{BoxedHaptics, HapticFeedback, ImpactStyle, NoHaptics};
pub use machine::{InteractionPhase, ParameterDriver, Transition};
pub use params::{ShaderParameters, SurfaceRect};
pub use timeline::AnimationCurve;

/// Upper bound on wave layers accepted by the bundled shader loop.
pub const MAX_LAYERS: f32 = 16.0;

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("base interval must be greater than zero")]
    ZeroInterval,
    #[error("{phase} speed must be positive and finite (got {value})")]
    InvalidSpeed { phase: &'static str, value: f64 },
    #[error("{phase} amplitude must be finite (got {value})")]
    InvalidAmplitude { phase: &'static str, value: f32 },
    #[error("layer count must be between 1 and 16 (got {0})")]
    InvalidLayers(f32),
}

/// Amplitude and speed the driver settles on in a given phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Setpoint {
    pub amplitude: f32,
    pub speed: f64,
}

impl Setpoint {
    pub const RESTING: Setpoint = Setpoint {
        amplitude: 0.5,
        speed: 1.0,
    };

    pub const ACTIVE: Setpoint = Setpoint {
        amplitude: 2.0,
        speed: 2.0,
    };

    fn validate(&self, phase: &'static str) -> Result<(), DriverError> {
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(DriverError::InvalidSpeed {
                phase,
                value: self.speed,
            });
        }
        if !self.amplitude.is_finite() {
            return Err(DriverError::InvalidAmplitude {
                phase,
                value: self.amplitude,
            });
        }
        Ok(())
    }
}

/// Tunables for [`ParameterDriver`].
#[derive(Debug, Clone, PartialEq)]
pub struct DriverConfig {
    /// Nominal tick spacing at speed 1.0 (about 60 Hz).
    pub base_interval: Duration,
    /// Length of the amplitude/speed transition between set-points.
    pub transition: Duration,
    pub curve: AnimationCurve,
    /// Wave layer count forwarded to the shader.
    pub layers: f32,
    pub resting: Setpoint,
    pub active: Setpoint,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_millis(16),
            transition: Duration::from_millis(300),
            curve: AnimationCurve::Spring,
            layers: 6.0,
            resting: Setpoint::RESTING,
            active: Setpoint::ACTIVE,
        }
    }
}

impl DriverConfig {
    pub fn validate(&self) -> Result<(), DriverError> {
        if self.base_interval.is_zero() {
            return Err(DriverError::ZeroInterval);
        }
        if !(1.0..=MAX_LAYERS).contains(&self.layers) {
            return Err(DriverError::InvalidLayers(self.layers));
        }
        self.resting.validate("resting")?;
        self.active.validate("active")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_reference_constants() {
        let config = DriverConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.base_interval, Duration::from_millis(16));
        assert_eq!(config.transition, Duration::from_millis(300));
        assert_eq!(config.layers, 6.0);
        assert_eq!(config.resting, Setpoint::RESTING);
        assert_eq!(config.active, Setpoint::ACTIVE);
    }

    #[test]
    fn validation_rejects_non_positive_speed() {
        let config = DriverConfig {
            active: Setpoint {
                amplitude: 2.0,
                speed: 0.0,
            },
            ..DriverConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DriverError::InvalidSpeed { phase: "active", .. })
        ));
    }

    #[test]
    fn validation_rejects_layer_count_out_of_range() {
        for layers in [0.0, 17.0, f32::NAN] {
            let config = DriverConfig {
                layers,
                ..DriverConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(DriverError::InvalidLayers(_))
            ));
        }
    }
}
