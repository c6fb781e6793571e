use std::io::{self, Write};

use driver::{BoxedHaptics, HapticFeedback, ImpactStyle, NoHaptics};
use settings::HapticsMode;

/// Records each pulse as a tracing event.
#[derive(Debug, Default)]
pub struct TracingHaptics {
    pulses: u64,
}

impl HapticFeedback for TracingHaptics {
    fn impact(&mut self, style: ImpactStyle) {
        self.pulses += 1;
        tracing::info!(?style, pulse = self.pulses, "haptic pulse");
    }
}

/// Rings the terminal bell on each pulse.
pub struct BellHaptics<W: Write> {
    out: W,
}

impl<W: Write> BellHaptics<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> HapticFeedback for BellHaptics<W> {
    fn impact(&mut self, style: ImpactStyle) {
        let result = self
            .out
            .write_all(b"\x07")
            .and_then(|()| self.out.flush());
        if let Err(err) = result {
            tracing::debug!(?style, error = %err, "failed to ring terminal bell");
        }
    }
}

pub fn haptics_for(mode: HapticsMode) -> BoxedHaptics {
    match mode {
        HapticsMode::Log => Box::new(TracingHaptics::default()),
        HapticsMode::Bell => Box::new(BellHaptics::new(io::stderr())),
        HapticsMode::Off => Box::new(NoHaptics),
    }
}
