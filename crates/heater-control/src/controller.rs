//! The per-heater control channel and the fixed-size aggregate that wires
//! heaters, fans, and the wait/M-command protocol together.
//!
//! Mirrors `axis-stepper`'s one-engine-per-axis split: each
//! [`HeaterChannel`] owns its own safety monitor and controller and is
//! ticked independently by the caller (the sim harness or a board's task
//! loop), rather than one object driving every heater through a bitmask.

use core::sync::atomic::{AtomicBool, Ordering};

use fixed_time::{Fixed1616, TimeType};

use crate::command::{FanId, HeaterCommand, HeaterId, MAX_WAIT_HEATERS};
use crate::error::{HeaterConfigError, HeaterError};
use crate::pid::HeaterController;
use crate::safety::{HeaterFault, HeaterSafety, SafetyLimits};

/// A GPIO/PWM sink consumed by a heater channel, the way `axis-stepper`
/// consumes a `Stepper` trait rather than a concrete pin type.
pub trait HeaterOutput {
    /// Writes a duty fraction (matching the controller's output range).
    fn set_duty(&mut self, duty: Fixed1616);
    /// Hard enable/disable, independent of duty — used by the safety latch.
    fn enable(&mut self, on: bool);
}

/// Per-heater configuration. A plain `Copy` struct built once at init, as
/// with every other config type in this workspace — there is no persisted
/// or re-parsed heater configuration in the core.
#[derive(Debug, Clone, Copy)]
pub struct HeaterConfig {
    pub safety: SafetyLimits,
    pub min_extrusion_temp: Fixed1616,
    /// Control-loop period, in whatever time unit the caller's `dt` uses
    /// consistently with the controller's gains (seconds, typically).
    pub dt: Fixed1616,
    /// Maximum `|measured - target|` considered "in range" for wait commands.
    pub in_range_hysteresis: Fixed1616,
}

fn validate(config: &HeaterConfig) -> Result<(), HeaterConfigError> {
    if config.safety.min_safe_temp >= config.safety.max_safe_temp {
        return Err(HeaterConfigError::InvalidSafeRange);
    }
    if config.min_extrusion_temp < config.safety.min_safe_temp || config.min_extrusion_temp > config.safety.max_safe_temp {
        return Err(HeaterConfigError::InvalidExtrusionTemp);
    }
    Ok(())
}

fn abs_diff(a: Fixed1616, b: Fixed1616) -> Fixed1616 {
    if a >= b {
        a - b
    } else {
        b - a
    }
}

/// Snapshot of one heater's state, as reported by `M105`/`M921`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaterReport {
    pub heater: HeaterId,
    pub current: Fixed1616,
    pub target: Fixed1616,
    pub fault: Option<HeaterFault>,
}

/// One heater's full control state: safety monitor, controller, and the
/// thermal-runaway latch.
pub struct HeaterChannel<C> {
    config: HeaterConfig,
    controller: C,
    safety: HeaterSafety,
    target: Fixed1616,
    last_temp: Fixed1616,
    latched: Option<HeaterFault>,
    /// Guards the duty write against a concurrent disable (e.g. from
    /// `force_unset`, which an emergency-abort path can call from
    /// interrupt context) clobbering a fresher "off" with a stale duty.
    was_not_unset: AtomicBool,
    cold_extrusion_permitted: bool,
}

impl<C: HeaterController> HeaterChannel<C> {
    pub fn new(config: HeaterConfig, controller: C) -> Result<Self, HeaterConfigError> {
        validate(&config)?;
        Ok(Self::new_unchecked(config, controller))
    }

    fn new_unchecked(config: HeaterConfig, controller: C) -> Self {
        Self {
            config,
            controller,
            safety: HeaterSafety::new(config.safety),
            target: Fixed1616::ZERO,
            last_temp: Fixed1616::ZERO,
            latched: None,
            was_not_unset: AtomicBool::new(true),
            cold_extrusion_permitted: false,
        }
    }

    pub fn set_target(&mut self, target: Fixed1616) {
        self.target = target;
        if target == Fixed1616::ZERO {
            self.controller.reset();
        }
    }

    pub fn target(&self) -> Fixed1616 {
        self.target
    }

    pub fn latched(&self) -> Option<HeaterFault> {
        self.latched
    }

    /// Clears a latched fault (`M922`). Does not restore a target — the
    /// caller must reissue `M104`/`M109` to turn the heater back on.
    pub fn clear_latch(&mut self) {
        self.latched = None;
        self.was_not_unset.store(true, Ordering::SeqCst);
    }

    pub fn permit_cold_extrusion(&mut self, permitted: bool) {
        self.cold_extrusion_permitted = permitted;
    }

    /// Whether a move on an axis fed by this heater may proceed right now.
    pub fn extrusion_safe(&self) -> bool {
        self.cold_extrusion_permitted || self.last_temp >= self.config.min_extrusion_temp
    }

    fn is_in_range(&self) -> bool {
        abs_diff(self.last_temp, self.target) <= self.config.in_range_hysteresis
    }

    /// Immediately forces the heater off, bypassing the latch — models the
    /// ISR-callable `unset()` an emergency-abort path would invoke.
    pub fn force_unset(&mut self, output: &mut impl HeaterOutput) {
        self.was_not_unset.store(false, Ordering::SeqCst);
        critical_section::with(|_| {
            output.enable(false);
            output.set_duty(Fixed1616::ZERO);
        });
    }

    fn latch(&mut self, fault: HeaterFault, output: &mut impl HeaterOutput) {
        self.latched = Some(fault);
        self.target = Fixed1616::ZERO;
        self.force_unset(output);
    }

    /// Runs one control-loop iteration: safety check, then (if the heater
    /// is not latched) one PID update, written to `output` under an
    /// interrupt-lock.
    pub fn tick(&mut self, now: TimeType, measured_temp: Fixed1616, output: &mut impl HeaterOutput) -> Result<Fixed1616, HeaterFault> {
        self.last_temp = measured_temp;

        if let Some(fault) = self.latched {
            output.set_duty(Fixed1616::ZERO);
            return Err(fault);
        }

        let heater_on = self.target != Fixed1616::ZERO;
        if let Err(fault) = self.safety.check(now, measured_temp, heater_on) {
            self.latch(fault, output);
            return Err(fault);
        }

        let duty = if heater_on {
            self.controller.update(self.target - measured_temp, self.config.dt)
        } else {
            self.controller.reset();
            Fixed1616::ZERO
        };

        self.was_not_unset.store(true, Ordering::SeqCst);
        critical_section::with(|_| {
            if self.was_not_unset.load(Ordering::SeqCst) {
                output.set_duty(duty);
            }
        });
        Ok(duty)
    }
}

struct HeaterWait {
    pending: heapless::Vec<HeaterId, MAX_WAIT_HEATERS>,
    deadline: TimeType,
    next_report: TimeType,
}

/// Outcome of dispatching one decoded M-command.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaterCommandOutcome<const HEATERS: usize> {
    Accepted,
    Reports(heapless::Vec<HeaterReport, HEATERS>),
    WaitStarted,
}

/// A fixed-size set of heater channels plus fans, with the wait/M-command
/// protocol layered on top.
pub struct HeaterControlLoop<const HEATERS: usize, const FANS: usize, C> {
    channels: [HeaterChannel<C>; HEATERS],
    fans: [u8; FANS],
    wait: Option<HeaterWait>,
    wait_timeout_ticks: u32,
    wait_report_period_ticks: u32,
}

impl<const HEATERS: usize, const FANS: usize, C: HeaterController> HeaterControlLoop<HEATERS, FANS, C> {
    pub fn new(
        configs: [HeaterConfig; HEATERS],
        controllers: [C; HEATERS],
        wait_timeout_ticks: u32,
        wait_report_period_ticks: u32,
    ) -> Result<Self, HeaterConfigError> {
        for config in &configs {
            validate(config)?;
        }
        let mut controllers = controllers.into_iter();
        let channels = core::array::from_fn(|i| {
            HeaterChannel::new_unchecked(configs[i], controllers.next().expect("one controller per configured heater"))
        });
        Ok(Self { channels, fans: [0; FANS], wait: None, wait_timeout_ticks, wait_report_period_ticks })
    }

    pub fn channel(&mut self, heater: HeaterId) -> Option<&mut HeaterChannel<C>> {
        self.channels.get_mut(heater as usize)
    }

    pub fn set_fan(&mut self, fan: FanId, duty: u8) {
        if let Some(slot) = self.fans.get_mut(fan as usize) {
            *slot = duty;
        }
    }

    pub fn fan_duty(&self, fan: FanId) -> u8 {
        self.fans.get(fan as usize).copied().unwrap_or(0)
    }

    pub fn reports(&self) -> heapless::Vec<HeaterReport, HEATERS> {
        let mut out = heapless::Vec::new();
        for (i, channel) in self.channels.iter().enumerate() {
            let _ = out.push(HeaterReport {
                heater: i as HeaterId,
                current: channel.last_temp,
                target: channel.target,
                fault: channel.latched,
            });
        }
        out
    }

    fn begin_wait(&mut self, now: TimeType, heaters: &[HeaterId]) -> Result<(), HeaterError> {
        let mut pending: heapless::Vec<HeaterId, MAX_WAIT_HEATERS> = heapless::Vec::new();
        for &h in heaters {
            let channel = self.channels.get(h as usize).ok_or(HeaterError::HeaterNotEnabled)?;
            if channel.target == Fixed1616::ZERO {
                return Err(HeaterError::HeaterNotEnabled);
            }
            pending.push(h).map_err(|_| HeaterError::HeaterNotEnabled)?;
        }
        self.wait = Some(HeaterWait {
            pending,
            deadline: now.wrapping_add(self.wait_timeout_ticks),
            next_report: now.wrapping_add(self.wait_report_period_ticks),
        });
        Ok(())
    }

    /// Dispatches one decoded command. `SetTargetAndWait`/`WaitForHeaters`
    /// only *start* the wait — call [`Self::poll_wait`] every tick
    /// afterward to drive it to completion.
    pub fn dispatch(&mut self, now: TimeType, cmd: HeaterCommand) -> Result<HeaterCommandOutcome<HEATERS>, HeaterError> {
        match cmd {
            HeaterCommand::SetTarget { heater, target } => {
                if let Some(channel) = self.channel(heater) {
                    channel.set_target(target);
                }
                Ok(HeaterCommandOutcome::Accepted)
            }
            HeaterCommand::SetTargetAndWait { heater, target } => {
                if let Some(channel) = self.channel(heater) {
                    channel.set_target(target);
                }
                self.begin_wait(now, &[heater])?;
                Ok(HeaterCommandOutcome::WaitStarted)
            }
            HeaterCommand::WaitForHeaters { heaters } => {
                self.begin_wait(now, &heaters)?;
                Ok(HeaterCommandOutcome::WaitStarted)
            }
            HeaterCommand::ReportAll | HeaterCommand::DebugAdcDump => Ok(HeaterCommandOutcome::Reports(self.reports())),
            HeaterCommand::FanSet { fan, duty } => {
                self.set_fan(fan, duty);
                Ok(HeaterCommandOutcome::Accepted)
            }
            HeaterCommand::FanOff { fan } => {
                self.set_fan(fan, 0);
                Ok(HeaterCommandOutcome::Accepted)
            }
            HeaterCommand::ColdExtrusionPermit { heater, permitted } => {
                if let Some(channel) = self.channel(heater) {
                    channel.permit_cold_extrusion(permitted);
                }
                Ok(HeaterCommandOutcome::Accepted)
            }
            HeaterCommand::ClearLatchedError { heater } => {
                if let Some(channel) = self.channel(heater) {
                    channel.clear_latch();
                }
                Ok(HeaterCommandOutcome::Accepted)
            }
        }
    }

    /// Advances the in-flight wait, if any. Returns `None` while still
    /// waiting, `Some(Ok(()))` once every waited-on heater is in range, or
    /// `Some(Err(_))` on timeout or a thermal latch.
    pub fn poll_wait(&mut self, now: TimeType) -> Option<Result<(), HeaterError>> {
        let mut wait = self.wait.take()?;

        let mut i = 0;
        while i < wait.pending.len() {
            let h = wait.pending[i];
            let channel = &self.channels[h as usize];
            if channel.latched.is_some() {
                return Some(Err(HeaterError::HeaterThermalRunaway));
            }
            if channel.is_in_range() {
                wait.pending.swap_remove(i);
            } else {
                i += 1;
            }
        }

        if wait.pending.is_empty() {
            return Some(Ok(()));
        }

        if now.is_at_or_after(wait.deadline) {
            return Some(Err(HeaterError::WaitTimedOut));
        }

        if now.is_at_or_after(wait.next_report) {
            wait.next_report = wait.next_report.wrapping_add(self.wait_report_period_ticks);
        }

        self.wait = Some(wait);
        None
    }

    pub fn is_waiting(&self) -> bool {
        self.wait.is_some()
    }
}
