//! Error taxonomy for environment construction and stepping.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EnvError>;

/// Errors surfaced by scenario validation, device construction, and the
/// per-tick API.
///
/// A budget violation is deliberately not represented here: exceeding the
/// energy cost budget is a valid terminal episode outcome, reported through
/// the `done` flag and a reward penalty rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    /// Invalid or inconsistent configuration, raised at construction and
    /// never recovered.
    #[error("config error: {field} — {message}")]
    Config {
        /// Dotted field path (e.g., `"environment.max_allowed_power"`).
        field: String,
        /// Human-readable constraint description.
        message: String,
    },

    /// Action index outside the device's alphabet. Fatal per call; the
    /// index is never clamped and the device is left untouched.
    #[error("invalid action {action} for device \"{device}\" (alphabet size {alphabet})")]
    InvalidAction {
        /// Name of the device that rejected the action.
        device: String,
        /// The offending action index.
        action: usize,
        /// Number of actions the device accepts.
        alphabet: usize,
    },

    /// Action vector length does not match the device registry.
    #[error("expected {expected} actions, got {got}")]
    ActionCount { expected: usize, got: usize },

    /// Episode lifecycle misuse: stepping before the first reset, or
    /// reseeding mid-episode.
    #[error("episode state error: {0}")]
    EpisodeState(String),
}

impl EnvError {
    /// Shorthand for a [`EnvError::Config`] with owned field/message text.
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            message: message.into(),
        }
    }
}
