//! The decoded command surface the (out-of-scope) G-code layer hands to the
//! aux-control core. The core never parses G-code text, only this enum.

use fixed_time::Fixed1616;

pub type HeaterId = u8;
pub type FanId = u8;

/// Upper bound on how many heaters a single wait command can enumerate
/// (`M116 T0 T1 B`-style), matching `heapless`'s no-alloc fixed capacity.
pub const MAX_WAIT_HEATERS: usize = 4;

/// Decoded form of the §6.4 M-commands.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaterCommand {
    /// `M104`/`M140`/`M141` — set a heater's target, non-blocking.
    SetTarget { heater: HeaterId, target: Fixed1616 },
    /// `M109`/`M190`/`M191` — set a target and block until in range.
    SetTargetAndWait { heater: HeaterId, target: Fixed1616 },
    /// `M116` — block until every listed heater is in range, without
    /// changing any target.
    WaitForHeaters { heaters: heapless::Vec<HeaterId, MAX_WAIT_HEATERS> },
    /// `M105` — report current temperature and target for every heater.
    ReportAll,
    /// `M106` — set a fan's duty (0..=255).
    FanSet { fan: FanId, duty: u8 },
    /// `M107` — fan off.
    FanOff { fan: FanId },
    /// `M302` — permit (or forbid) extrusion below `min_extrusion_temp`.
    ColdExtrusionPermit { heater: HeaterId, permitted: bool },
    /// `M921` — dump the last raw ADC reading for every heater.
    DebugAdcDump,
    /// `M922` — clear a heater's latched thermal fault.
    ClearLatchedError { heater: HeaterId },
}
