//! Fixed-timestep accumulator.

use excavator_core::StepConfig;

/// Converts variable frame deltas into whole fixed steps.
///
/// Frame deltas are clamped to `max_frame_delta` before accumulating and at
/// most `max_steps_per_frame` steps run per frame. Time left over after the
/// step cap is folded back below one step so a long stall cannot snowball.
#[derive(Debug, Clone)]
pub struct FixedStepper {
    fixed_timestep: f32,
    max_steps_per_frame: u32,
    max_frame_delta: f32,
    accumulator: f32,
}

impl FixedStepper {
    pub fn new(config: &StepConfig) -> Self {
        Self {
            fixed_timestep: config.fixed_timestep,
            max_steps_per_frame: config.max_steps_per_frame,
            max_frame_delta: config.max_frame_delta,
            accumulator: 0.0,
        }
    }

    /// Clamp a raw frame delta. Negative and non-finite deltas count as zero.
    pub fn clamp_delta(&self, delta: f32) -> f32 {
        if delta.is_finite() {
            delta.clamp(0.0, self.max_frame_delta)
        } else {
            0.0
        }
    }

    /// Accumulate `delta` and return how many fixed steps to run this frame.
    pub fn advance(&mut self, delta: f32) -> u32 {
        self.accumulator += self.clamp_delta(delta);

        let mut steps = 0;
        while self.accumulator >= self.fixed_timestep && steps < self.max_steps_per_frame {
            self.accumulator -= self.fixed_timestep;
            steps += 1;
        }

        if self.accumulator >= self.fixed_timestep {
            self.accumulator %= self.fixed_timestep;
        }

        steps
    }

    /// Unsimulated time carried into the next frame.
    pub fn remainder(&self) -> f32 {
        self.accumulator
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}
