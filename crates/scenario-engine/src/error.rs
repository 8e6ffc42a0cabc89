use thiserror::Error;

/// Library-boundary errors: conditions a correct caller can hit (bad seed
/// config, restoring a foreign snapshot) as opposed to the handler-level
/// [`crate::result::ActionResult`] codes surfaced to agents, or the
/// `debug_assert!`-guarded internal invariants that should never fire in a
/// correct build.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown agent name: {0}")]
    UnknownAgent(String),

    #[error("snapshot hash mismatch: state was modified or snapshot is foreign")]
    SnapshotHashMismatch,

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] scenario_config::error::ConfigError),
}
