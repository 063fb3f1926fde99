// Engine-level configuration
//
//! Layered `config::Config` (a file source under env overrides) covering
//! the handful of engine-wide knobs left as open design questions rather
//! than fixed behavior: which OR-join resolution strategy to default to,
//! how often to snapshot, and whether a domain callback panic should be
//! caught or allowed to unwind the host.

use serde::Deserialize;

/// An OR-join is "pending" while an upstream task that still feeds one
/// of its unmarked incoming conditions remains active. The default
/// resolution strategy is left open; we make it a host-configurable
/// policy rather than hardcode one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrJoinPolicy {
    /// Wait until no upstream task that could still feed this join
    /// remains active (the conservative default — never fires early).
    WaitForUpstream,
    /// Fire as soon as any one incoming condition is marked, regardless
    /// of upstream activity.
    FireEarly,
}

impl Default for OrJoinPolicy {
    fn default() -> Self {
        OrJoinPolicy::WaitForUpstream
    }
}

fn default_snapshot_cadence() -> u32 {
    50
}

fn default_catch_callback_panics() -> bool {
    true
}

/// Engine-wide configuration, loaded once per host process by layering
/// a file over environment overrides.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub or_join_policy: OrJoinPolicy,
    /// How many mutating spans may accumulate for a workflow before the
    /// host should call `insert_snapshot` again (purely advisory — the
    /// engine itself never snapshots; see `audit::reconstruct`).
    #[serde(default = "default_snapshot_cadence")]
    pub snapshot_cadence: u32,
    /// Whether a panicking `TaskCallback` should be caught and turned
    /// into `WorkflowError::CallbackFailed`, or allowed to unwind into
    /// the host.
    #[serde(default = "default_catch_callback_panics")]
    pub catch_callback_panics: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            or_join_policy: OrJoinPolicy::default(),
            snapshot_cadence: default_snapshot_cadence(),
            catch_callback_panics: default_catch_callback_panics(),
        }
    }
}

impl EngineConfig {
    /// Layers a `workflow_engine.{toml,yaml,json,...}` file (if present)
    /// under `WORKFLOW_ENGINE_*` environment overrides.
    pub fn load() -> std::result::Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("workflow_engine").required(false))
            .add_source(config::Environment::with_prefix("WORKFLOW_ENGINE"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_waits_for_upstream() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.or_join_policy, OrJoinPolicy::WaitForUpstream);
        assert!(cfg.catch_callback_panics);
    }
}
