//! Action result codes.
//!
//! These are handler-level outcomes, not Rust errors: every action handler
//! runs to completion and returns exactly one of these codes, with no
//! partial mutation on the failing path. See `EngineError` for the separate
//! category of library-boundary failures.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionResult {
    Success,
    Failed,
    FailedPath,
    FailedTarget,
    FailedBlocked,
    FailedStatus,
    FailedRandom,
}

impl ActionResult {
    pub fn is_success(self) -> bool {
        matches!(self, ActionResult::Success)
    }

    /// The `last_action_result` string recorded on the acting entity.
    pub fn as_str(self) -> &'static str {
        match self {
            ActionResult::Success => "success",
            ActionResult::Failed => "failed",
            ActionResult::FailedPath => "failed_path",
            ActionResult::FailedTarget => "failed_target",
            ActionResult::FailedBlocked => "failed_blocked",
            ActionResult::FailedStatus => "failed_status",
            ActionResult::FailedRandom => "failed_random",
        }
    }
}

impl std::fmt::Display for ActionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_success_is_success() {
        assert!(ActionResult::Success.is_success());
        assert!(!ActionResult::Failed.is_success());
    }

    #[test]
    fn as_str_matches_external_contract() {
        assert_eq!(ActionResult::FailedPath.as_str(), "failed_path");
        assert_eq!(ActionResult::FailedRandom.as_str(), "failed_random");
    }
}
