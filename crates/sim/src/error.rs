//! Harness-level errors, surfaced to whatever drives the sim (a `#[test]`,
//! `examples/run_sim.rs`, or CI).

use motion_planner::PlannerError;

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("motion planner rejected the harness configuration or queue: {0:?}")]
    Planner(PlannerError),
}

impl From<PlannerError> for SimError {
    fn from(e: PlannerError) -> Self {
        SimError::Planner(e)
    }
}
