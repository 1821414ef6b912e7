//! Session configuration

use serde::{Deserialize, Serialize};

/// How existing answers are treated at session start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMode {
    /// Leave prior answers in place and fill the gaps
    #[default]
    Continue,
    /// Reset targeted fields to unanswered before the first turn
    Overwrite,
}

/// Configuration for one fill session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Hard cap on absolute turn numbers across all calls
    pub max_turns_total: u32,
    /// Resumable per-call cap; `None` means only the total cap applies
    pub max_turns_this_call: Option<u32>,
    /// Absolute number of the first turn of this call (for resumed sessions)
    pub starting_turn_number: u32,
    /// Most issues surfaced to the filler per turn
    pub max_issues_per_turn: usize,
    /// Most patches applied per turn; excess defers to the next turn
    pub max_patches_per_turn: usize,
    /// Bound on concurrently running sub-sessions
    pub max_parallel_agents: usize,
    /// Restrict this session to fields with these roles (unroled fields
    /// are always in scope)
    pub target_roles: Option<Vec<String>>,
    /// Continue or overwrite existing answers
    pub fill_mode: FillMode,
    /// Retries per filler call on retryable failures
    pub filler_retries: u32,
}

impl SessionConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With total turn cap
    #[inline]
    #[must_use]
    pub fn with_max_turns(mut self, max: u32) -> Self {
        self.max_turns_total = max;
        self
    }

    /// With per-call turn cap
    #[inline]
    #[must_use]
    pub fn with_max_turns_this_call(mut self, max: u32) -> Self {
        self.max_turns_this_call = Some(max);
        self
    }

    /// With starting turn offset (resumption)
    #[inline]
    #[must_use]
    pub fn starting_at(mut self, turn: u32) -> Self {
        self.starting_turn_number = turn;
        self
    }

    /// With per-turn issue cap
    #[inline]
    #[must_use]
    pub fn with_max_issues_per_turn(mut self, max: usize) -> Self {
        self.max_issues_per_turn = max;
        self
    }

    /// With per-turn patch cap
    #[inline]
    #[must_use]
    pub fn with_max_patches_per_turn(mut self, max: usize) -> Self {
        self.max_patches_per_turn = max;
        self
    }

    /// With sub-session concurrency bound
    #[inline]
    #[must_use]
    pub fn with_max_parallel_agents(mut self, max: usize) -> Self {
        self.max_parallel_agents = max.max(1);
        self
    }

    /// With target roles
    #[inline]
    #[must_use]
    pub fn with_target_roles(mut self, roles: Vec<String>) -> Self {
        self.target_roles = Some(roles);
        self
    }

    /// With fill mode
    #[inline]
    #[must_use]
    pub fn with_fill_mode(mut self, mode: FillMode) -> Self {
        self.fill_mode = mode;
        self
    }

    /// With filler retry count
    #[inline]
    #[must_use]
    pub fn with_filler_retries(mut self, retries: u32) -> Self {
        self.filler_retries = retries;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_turns_total: 50,
            max_turns_this_call: None,
            starting_turn_number: 0,
            max_issues_per_turn: 10,
            max_patches_per_turn: 20,
            max_parallel_agents: 4,
            target_roles: None,
            fill_mode: FillMode::Continue,
            filler_retries: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = SessionConfig::new();
        assert_eq!(config.max_turns_total, 50);
        assert_eq!(config.max_turns_this_call, None);
        assert_eq!(config.fill_mode, FillMode::Continue);
    }

    #[test]
    fn config_builder() {
        let config = SessionConfig::new()
            .with_max_turns(5)
            .with_max_turns_this_call(2)
            .starting_at(3)
            .with_max_parallel_agents(0);
        assert_eq!(config.max_turns_total, 5);
        assert_eq!(config.max_turns_this_call, Some(2));
        assert_eq!(config.starting_turn_number, 3);
        // Concurrency is clamped to at least one worker.
        assert_eq!(config.max_parallel_agents, 1);
    }
}
