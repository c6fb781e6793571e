use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Easing applied while a value moves between set-points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationCurve {
    Linear,
    EaseInOut,
    /// Critically damped spring, normalised to land on the target exactly
    /// when the transition duration elapses.
    #[default]
    Spring,
}

/// Angular frequency of the spring expressed in units of the transition
/// duration (one full oscillation period per transition).
const SPRING_OMEGA: f64 = TAU;

impl AnimationCurve {
    pub fn sample(self, t: f64) -> f64 {
        let clamped = t.clamp(0.0, 1.0);
        match self {
            AnimationCurve::Linear => clamped,
            AnimationCurve::EaseInOut => {
                if clamped < 0.5 {
                    2.0 * clamped * clamped
                } else {
                    -1.0 + (4.0 - 2.0 * clamped) * clamped
                }
            }
            AnimationCurve::Spring => {
                // x(t) = 1 - (1 + wt) e^(-wt), divided by x(1) so the curve ends at 1.
                let settle = |p: f64| 1.0 - (1.0 + SPRING_OMEGA * p) * (-SPRING_OMEGA * p).exp();
                settle(clamped) / settle(1.0)
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnimationCurve::Linear => "linear",
            AnimationCurve::EaseInOut => "ease-in-out",
            AnimationCurve::Spring => "spring",
        }
    }
}

impl fmt::Display for AnimationCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnimationCurve {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(AnimationCurve::Linear),
            "ease-in-out" | "easeinout" | "ease" => Ok(AnimationCurve::EaseInOut),
            "spring" | "damped" => Ok(AnimationCurve::Spring),
            other => Err(format!(
                "unknown animation curve '{other}'; expected spring, ease-in-out, or linear"
            )),
        }
    }
}

/// A scalar moving from `from` to `to` over a fixed duration.
///
/// Retargeting starts the next leg from wherever the value currently is, so
/// reversing mid-flight never jumps.
#[derive(Debug, Clone)]
pub(crate) struct Tween {
    from: f64,
    to: f64,
    start: Instant,
    duration: Duration,
    curve: AnimationCurve,
}

impl Tween {
    pub fn settled(value: f64, now: Instant) -> Self {
        Self {
            from: value,
            to: value,
            start: now,
            duration: Duration::ZERO,
            curve: AnimationCurve::Linear,
        }
    }

    pub fn retarget(&mut self, to: f64, now: Instant, duration: Duration, curve: AnimationCurve) {
        let current = self.value(now);
        *self = Self {
            from: current,
            to,
            start: now,
            duration,
            curve,
        };
    }

    fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.start);
        elapsed.as_secs_f64() / self.duration.as_secs_f64()
    }

    pub fn value(&self, now: Instant) -> f64 {
        let progress = self.progress(now);
        if progress >= 1.0 {
            return self.to;
        }
        self.from + (self.to - self.from) * self.curve.sample(progress)
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }

    pub fn target(&self) -> f64 {
        self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curves_start_at_zero_and_end_at_one() {
        for curve in [
            AnimationCurve::Linear,
            AnimationCurve::EaseInOut,
            AnimationCurve::Spring,
        ] {
            assert!(curve.sample(0.0).abs() < 1e-9, "{curve} at 0");
            assert!((curve.sample(1.0) - 1.0).abs() < 1e-9, "{curve} at 1");
        }
    }

    #[test]
    fn spring_curve_increases_monotonically_without_overshoot() {
        let curve = AnimationCurve::Spring;
        let mut last = 0.0;
        for step in 0..=100 {
            let sample = curve.sample(step as f64 / 100.0);
            assert!(sample >= last - 1e-12);
            assert!(sample <= 1.0 + 1e-12);
            last = sample;
        }
    }

    #[test]
    fn spring_front_loads_motion() {
        let curve = AnimationCurve::Spring;
        assert!(curve.sample(0.5) > AnimationCurve::Linear.sample(0.5));
    }

    #[test]
    fn ease_in_out_is_symmetric_about_midpoint() {
        let curve = AnimationCurve::EaseInOut;
        assert!((curve.sample(0.5) - 0.5).abs() < 1e-9);
        assert!((curve.sample(0.25) + curve.sample(0.75) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn parses_curve_names() {
        assert_eq!("Spring".parse::<AnimationCurve>(), Ok(AnimationCurve::Spring));
        assert_eq!(
            "ease-in-out".parse::<AnimationCurve>(),
            Ok(AnimationCurve::EaseInOut)
        );
        assert!("bouncy".parse::<AnimationCurve>().is_err());
    }

    #[test]
    fn tween_reaches_target_at_duration() {
        let start = Instant::now();
        let mut tween = Tween::settled(0.5, start);
        tween.retarget(2.0, start, Duration::from_millis(300), AnimationCurve::Spring);
        let mid = tween.value(start + Duration::from_millis(150));
        assert!(mid > 0.5 && mid < 2.0);
        assert!(!tween.is_finished(start + Duration::from_millis(150)));
        assert_eq!(tween.value(start + Duration::from_millis(300)), 2.0);
        assert!(tween.is_finished(start + Duration::from_millis(300)));
    }

    #[test]
    fn retarget_continues_from_current_value() {
        let start = Instant::now();
        let mut tween = Tween::settled(1.0, start);
        tween.retarget(2.0, start, Duration::from_millis(100), AnimationCurve::Linear);
        let halfway = start + Duration::from_millis(50);
        tween.retarget(1.0, halfway, Duration::from_millis(100), AnimationCurve::Linear);
        assert!((tween.value(halfway) - 1.5).abs() < 1e-9);
        assert_eq!(tween.target(), 1.0);
    }
}
