//! Structural/setup errors and in-band control-loop faults.
//!
//! Hot-path thermal faults don't flow through these types — they latch a
//! flag on the affected [`crate::controller::HeaterChannel`] instead (see
//! [`crate::safety::HeaterFault`]). These are the outcomes a caller sees
//! from the command-dispatch surface: config validation and the wait/
//! M-command protocol.

/// Raised when a [`crate::controller::HeaterConfig`] can't produce a
/// working channel.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum HeaterConfigError {
    /// `min_safe_temp >= max_safe_temp`.
    InvalidSafeRange,
    /// `min_extrusion_temp` falls outside `[min_safe_temp, max_safe_temp]`.
    InvalidExtrusionTemp,
}

/// Failure modes of the wait/M-command surface (`M109`/`M190`/`M191`/`M116`).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum HeaterError {
    /// `WaitTimeout` elapsed before every waited-on heater reached range.
    WaitTimedOut,
    /// A waited-on heater latched off due to a thermal fault.
    HeaterThermalRunaway,
    /// A wait was requested for a heater with no target set (target `0`).
    HeaterNotEnabled,
}
