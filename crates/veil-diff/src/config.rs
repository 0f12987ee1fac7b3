//! Diff configuration.

/// Options for [`crate::diff_with`].
#[derive(Debug, Clone, Default)]
pub struct DiffConfig {
    /// Replay the script against the source before returning it and fail
    /// if it does not reproduce the target.
    pub verify: bool,
}
