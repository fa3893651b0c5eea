//! Flow configuration.

use crate::session::{AcquisitionConfig, KeepAliveConfig};

/// Where to resume after a permission grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResumePolicy {
    /// Re-check only the permission step.
    #[default]
    FromPermission,
    /// Re-run every check, catching a connectivity loss during the prompt.
    FullGate,
}

impl ResumePolicy {
    /// Config-file spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResumePolicy::FromPermission => "from_permission",
            ResumePolicy::FullGate => "full_gate",
        }
    }
}

impl std::fmt::Display for ResumePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResumePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "from_permission" | "permission" => Ok(ResumePolicy::FromPermission),
            "full_gate" | "full" => Ok(ResumePolicy::FullGate),
            other => Err(format!("unknown resume policy '{}'", other)),
        }
    }
}

/// Settings the controller applies when the gate is satisfied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowConfig {
    /// Session configuration.
    pub acquisition: AcquisitionConfig,
    /// Keep-alive timing; `None` leaves keep-alive off.
    pub keep_alive: Option<KeepAliveConfig>,
    /// Resumption after a permission grant.
    pub resume_policy: ResumePolicy,
}

impl FlowConfig {
    /// Set the acquisition configuration.
    pub fn with_acquisition(mut self, acquisition: AcquisitionConfig) -> Self {
        self.acquisition = acquisition;
        self
    }

    /// Enable keep-alive.
    pub fn with_keep_alive(mut self, keep_alive: KeepAliveConfig) -> Self {
        self.keep_alive = Some(keep_alive);
        self
    }

    /// Set the resume policy.
    pub fn with_resume_policy(mut self, policy: ResumePolicy) -> Self {
        self.resume_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_policy_parse() {
        assert_eq!("full_gate".parse::<ResumePolicy>(), Ok(ResumePolicy::FullGate));
        assert_eq!(" From_Permission ".parse::<ResumePolicy>(), Ok(ResumePolicy::FromPermission));
        assert!("sometimes".parse::<ResumePolicy>().is_err());
        assert_eq!(ResumePolicy::default(), ResumePolicy::FromPermission);
    }

    #[test]
    fn test_default_has_no_keep_alive() {
        let config = FlowConfig::default();
        assert!(config.keep_alive.is_none());
        assert_eq!(config.acquisition, AcquisitionConfig::default());
    }
}
