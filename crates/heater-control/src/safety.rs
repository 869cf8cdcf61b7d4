//! Per-heater thermal safety checks: absolute temperature range and
//! heating-rate ("is it actually heating up") thermal-runaway detection.

use fixed_time::{Fixed1616, TimeType};

/// A specific safety-related fault for one heater.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum HeaterFault {
    /// Reading below `min_safe_temp` — likely a shorted or disconnected sensor.
    TempTooLow,
    /// Reading above `max_safe_temp` — likely a runaway or disconnected sensor.
    TempTooHigh,
    /// The heater has been commanded on for longer than `min_heat_gain_ticks`
    /// without gaining `min_heat_gain_temp` — the heater element or sensor
    /// isn't doing its job.
    ThermalRunaway,
}

/// Temperature and time limits a heater must stay within.
#[derive(Debug, Clone, Copy)]
pub struct SafetyLimits {
    pub min_safe_temp: Fixed1616,
    pub max_safe_temp: Fixed1616,
    /// Minimum temperature gain required within `min_heat_gain_ticks` of the
    /// heater turning on (e.g. 2 degrees within 30 seconds of ticks).
    pub min_heat_gain_temp: Fixed1616,
    pub min_heat_gain_ticks: u32,
}

/// Tracks one heater's safety state across control-loop ticks.
#[derive(Clone, Copy)]
pub struct HeaterSafety {
    limits: SafetyLimits,
    heater_was_on: bool,
    start_time: TimeType,
    start_temp: Fixed1616,
}

impl HeaterSafety {
    pub fn new(limits: SafetyLimits) -> Self {
        Self {
            limits,
            heater_was_on: false,
            start_time: TimeType::ZERO,
            start_temp: Fixed1616::ZERO,
        }
    }

    /// Checks one reading. `heater_on` is the commanded state for this tick
    /// (not the actual duty written), since the runaway clock starts the
    /// instant the heater is asked to turn on.
    pub fn check(&mut self, now: TimeType, temp: Fixed1616, heater_on: bool) -> Result<(), HeaterFault> {
        if temp < self.limits.min_safe_temp {
            return Err(HeaterFault::TempTooLow);
        }
        if temp > self.limits.max_safe_temp {
            return Err(HeaterFault::TempTooHigh);
        }

        if heater_on && !self.heater_was_on {
            self.start_time = now;
            self.start_temp = temp;
        }
        self.heater_was_on = heater_on;

        if heater_on {
            let elapsed = now.wrapping_sub(self.start_time);
            if elapsed > self.limits.min_heat_gain_ticks {
                let gain = temp - self.start_temp;
                if gain < self.limits.min_heat_gain_temp {
                    return Err(HeaterFault::ThermalRunaway);
                }
            }
        } else {
            self.start_time = now;
            self.start_temp = temp;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> SafetyLimits {
        SafetyLimits {
            min_safe_temp: Fixed1616::from_f32(-10.0),
            max_safe_temp: Fixed1616::from_f32(280.0),
            min_heat_gain_temp: Fixed1616::from_f32(2.0),
            min_heat_gain_ticks: 20,
        }
    }

    #[test]
    fn absolute_max_temp_trips_immediately() {
        let mut safety = HeaterSafety::new(limits());
        let fault = safety.check(TimeType(0), Fixed1616::from_f32(285.0), true).unwrap_err();
        assert_eq!(fault, HeaterFault::TempTooHigh);
    }

    #[test]
    fn slow_heating_trips_thermal_runaway() {
        let mut safety = HeaterSafety::new(limits());
        safety.check(TimeType(0), Fixed1616::from_f32(25.0), true).unwrap();
        let fault = safety.check(TimeType(21), Fixed1616::from_f32(26.0), true).unwrap_err();
        assert_eq!(fault, HeaterFault::ThermalRunaway);
    }

    #[test]
    fn adequate_heating_rate_stays_ok() {
        let mut safety = HeaterSafety::new(limits());
        safety.check(TimeType(0), Fixed1616::from_f32(25.0), true).unwrap();
        assert!(safety.check(TimeType(15), Fixed1616::from_f32(35.0), true).is_ok());
    }

    #[test]
    fn turning_heater_off_resets_the_runaway_clock() {
        let mut safety = HeaterSafety::new(limits());
        safety.check(TimeType(0), Fixed1616::from_f32(25.0), true).unwrap();
        safety.check(TimeType(10), Fixed1616::from_f32(25.0), false).unwrap();
        // Heater comes back on at t=10 with no gain yet; the clock restarts here.
        safety.check(TimeType(10), Fixed1616::from_f32(25.0), true).unwrap();
        assert!(safety.check(TimeType(25), Fixed1616::from_f32(25.5), true).is_ok());
    }
}
