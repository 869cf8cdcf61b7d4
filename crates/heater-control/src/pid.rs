//! Fixed-point PID control, matching `Fixed16_16`'s saturating-arithmetic
//! contract so a heater loop never panics or divides by zero.

use fixed_time::Fixed1616;

/// A control object consuming `target - measured` and producing a duty
/// fraction, generic the way a float-backed PID would be generic over its
/// numeric type — the control loop only depends on this trait, not on a
/// specific gain algorithm.
pub trait HeaterController {
    /// `error` is `target - measured`; `dt` is the control-loop period.
    /// Returns the new duty, already clamped to this controller's output range.
    fn update(&mut self, error: Fixed1616, dt: Fixed1616) -> Fixed1616;
    fn reset(&mut self);
}

/// A PID controller using 16.16 fixed-point arithmetic throughout, with
/// anti-windup via a precomputed integral clamp.
#[derive(Debug, Clone, Copy)]
pub struct FixedPid {
    kp: Fixed1616,
    ki: Fixed1616,
    kd: Fixed1616,
    integral: Fixed1616,
    prev_error: Fixed1616,
    output_max: Fixed1616,
    integral_max: Fixed1616,
}

impl FixedPid {
    /// `output_max` is the duty ceiling — `Fixed1616::ONE` for a [0,1] duty
    /// fraction, or a PWM max-duty count if the caller wants raw ticks.
    pub fn new(kp: Fixed1616, ki: Fixed1616, kd: Fixed1616, output_max: Fixed1616) -> Self {
        let integral_max = if ki > Fixed1616::ZERO { output_max / ki } else { Fixed1616::ZERO };
        Self {
            kp,
            ki,
            kd,
            integral: Fixed1616::ZERO,
            prev_error: Fixed1616::ZERO,
            output_max,
            integral_max,
        }
    }
}

impl HeaterController for FixedPid {
    fn update(&mut self, error: Fixed1616, dt: Fixed1616) -> Fixed1616 {
        let p_term = self.kp * error;

        self.integral = (self.integral + error * dt).clamp(-self.integral_max, self.integral_max);
        let i_term = self.ki * self.integral;

        let derivative = (error - self.prev_error) / dt;
        self.prev_error = error;
        let d_term = self.kd * derivative;

        (p_term + i_term + d_term).clamp(Fixed1616::ZERO, self.output_max)
    }

    fn reset(&mut self) {
        self.integral = Fixed1616::ZERO;
        self.prev_error = Fixed1616::ZERO;
    }
}
