/// Strength of a discrete feedback pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactStyle {
    Light,
    Medium,
    Heavy,
}

/// Sink for discrete feedback pulses fired on interaction start.
pub trait HapticFeedback {
    fn impact(&mut self, style: ImpactStyle);
}

/// Feedback sink that discards every pulse.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHaptics;

impl HapticFeedback for NoHaptics {
    fn impact(&mut self, _style: ImpactStyle) {}
}

/// Convenient alias for owning feedback sinks behind trait objects.
pub type BoxedHaptics = Box<dyn HapticFeedback>;
