//! Common types and layout helpers shared by every device kind.

/// Observation slots appended after the one-hot state encoding: one reserved
/// slot followed by the signed power fraction.
pub const OBS_EXTRA_SLOTS: usize = 2;

/// Production cycles a producer must complete before it counts as a winner
/// and reports `done`.
pub const DEFAULT_PRODUCTION_TARGET: u32 = 20;

/// Outcome of advancing one device by one tick.
#[derive(Debug, Clone)]
pub struct DeviceStep {
    /// One-hot state encoding plus reserved and power-fraction slots.
    pub observation: Vec<f32>,
    /// Reward fixed by the exact (state, action) transition taken.
    pub reward: f32,
    /// Device-local termination flag.
    pub done: bool,
    /// Transition trace of the form `"<prev> => <action> => <next>"`.
    pub trace: String,
    /// True only when a producer moved `Execute => Completed` this tick.
    pub cycle_completed: bool,
}

/// Builds the observation vector shared by every device kind.
///
/// Layout: `state_slots` one-hot positions indexed directly by the state
/// ordinal, one reserved slot, then `power / max_allowed_power` in the final
/// slot. Because ordinals index the vector directly, a kind with
/// non-contiguous ordinals (the main grid's `Selling = 4`) lights the
/// reserved slot instead of a dedicated one.
pub fn state_observation(
    ordinal: usize,
    state_slots: usize,
    power: f32,
    max_allowed_power: f32,
) -> Vec<f32> {
    let mut obs = vec![0.0; state_slots + OBS_EXTRA_SLOTS];
    obs[ordinal] = 1.0;
    let last = obs.len() - 1;
    obs[last] = power / max_allowed_power;
    obs
}
