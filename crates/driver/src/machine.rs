use std::time::{Duration, Instant};

use tracing::debug;

use crate::haptics::{BoxedHaptics, ImpactStyle};
use crate::params::{ShaderParameters, SurfaceRect};
use crate::timeline::Tween;
use crate::{DriverConfig, DriverError, Setpoint};

/// Interaction state of the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionPhase {
    Resting,
    Active,
}

impl InteractionPhase {
    /// Foreground caption shown for the phase.
    pub fn caption(self) -> &'static str {
        match self {
            InteractionPhase::Resting => "Hold Anywhere!",
            InteractionPhase::Active => "Holding...",
        }
    }
}

/// Outcome of a press or release event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Began,
    Ended,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Clock {
    Running,
    Frozen,
}

/// Computes shader parameters from interaction state and a tick clock.
///
/// Presses and releases move the driver between [`InteractionPhase::Resting`]
/// and [`InteractionPhase::Active`]; each move animates amplitude and speed
/// toward the new phase's set-point. Every [`tick`](Self::tick) advances the
/// elapsed time by `base_interval * speed`, and the next tick is due after
/// `base_interval / speed`.
pub struct ParameterDriver {
    config: DriverConfig,
    phase: InteractionPhase,
    amplitude: Tween,
    speed: Tween,
    elapsed: f64,
    clock: Clock,
    ticks: u64,
    haptics: BoxedHaptics,
}

impl ParameterDriver {
    pub fn new(
        config: DriverConfig,
        haptics: BoxedHaptics,
        now: Instant,
    ) -> Result<Self, DriverError> {
        config.validate()?;
        let resting = config.resting;
        Ok(Self {
            config,
            phase: InteractionPhase::Resting,
            amplitude: Tween::settled(f64::from(resting.amplitude), now),
            speed: Tween::settled(resting.speed, now),
            elapsed: 0.0,
            clock: Clock::Running,
            ticks: 0,
            haptics,
        })
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn phase(&self) -> InteractionPhase {
        self.phase
    }

    pub fn is_interacting(&self) -> bool {
        self.phase == InteractionPhase::Active
    }

    pub fn caption(&self) -> &'static str {
        self.phase.caption()
    }

    /// Handles the start of a press. Only the first press of a gesture counts.
    pub fn press(&mut self, now: Instant) -> Transition {
        if self.is_interacting() {
            return Transition::Ignored;
        }
        self.phase = InteractionPhase::Active;
        self.animate_to(self.config.active, now);
        self.haptics.impact(ImpactStyle::Medium);
        debug!(
            amplitude = self.config.active.amplitude,
            speed = self.config.active.speed,
            "interaction began"
        );
        Transition::Began
    }

    /// Handles the end of a press. Ignored unless a press is active.
    pub fn release(&mut self, now: Instant) -> Transition {
        if !self.is_interacting() {
            return Transition::Ignored;
        }
        self.phase = InteractionPhase::Resting;
        self.animate_to(self.config.resting, now);
        debug!(
            amplitude = self.config.resting.amplitude,
            speed = self.config.resting.speed,
            "interaction ended"
        );
        Transition::Ended
    }

    fn animate_to(&mut self, target: Setpoint, now: Instant) {
        let duration = self.config.transition;
        let curve = self.config.curve;
        self.amplitude
            .retarget(f64::from(target.amplitude), now, duration, curve);
        self.speed.retarget(target.speed, now, duration, curve);
    }

    /// Advances the animation clock by one step scaled by the current speed.
    pub fn tick(&mut self, now: Instant) -> f64 {
        self.ticks = self.ticks.saturating_add(1);
        if self.clock == Clock::Running {
            let step = self.config.base_interval.as_secs_f64() * self.speed(now);
            self.elapsed += step.max(0.0);
        }
        self.elapsed
    }

    /// Delay until the next tick at the current speed.
    ///
    /// Saturates at `Duration::MAX` for speeds too small to represent.
    pub fn tick_interval(&self, now: Instant) -> Duration {
        let speed = self.speed(now).max(f64::EPSILON);
        Duration::try_from_secs_f64(self.config.base_interval.as_secs_f64() / speed)
            .unwrap_or(Duration::MAX)
    }

    /// Pins the animation clock; later ticks leave elapsed time untouched.
    pub fn freeze_at(&mut self, seconds: f64) {
        self.elapsed = self.elapsed.max(seconds.max(0.0));
        self.clock = Clock::Frozen;
    }

    pub fn is_frozen(&self) -> bool {
        self.clock == Clock::Frozen
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn amplitude(&self, now: Instant) -> f32 {
        self.amplitude.value(now) as f32
    }

    pub fn speed(&self, now: Instant) -> f64 {
        self.speed.value(now)
    }

    /// True while amplitude or speed are still moving toward their set-point.
    pub fn is_animating(&self, now: Instant) -> bool {
        !self.amplitude.is_finished(now) || !self.speed.is_finished(now)
    }

    /// Set-point currently being animated toward.
    pub fn target(&self) -> Setpoint {
        Setpoint {
            amplitude: self.amplitude.target() as f32,
            speed: self.speed.target(),
        }
    }

    pub fn parameters(&self, bounds: SurfaceRect, now: Instant) -> ShaderParameters {
        ShaderParameters {
            bounds,
            layers: self.config.layers,
            time: self.elapsed as f32,
            amplitude: self.amplitude(now),
            interaction: if self.is_interacting() { 1.0 } else { 0.0 },
        }
    }
}
