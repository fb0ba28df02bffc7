//! Panel configuration, driven by environment variables.

use crate::registry::{AgentProfile, AgentRegistry};

/// Top-level panel configuration.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Base URL of the completion service, up to the agent-id segment.
    pub api_base: String,
    /// Bearer token for the service.
    pub api_token: String,
    /// Maximum host evaluations per debate.
    pub max_rounds: u32,
    /// Transport timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            api_base: std::env::var("PANEL_API_BASE")
                .unwrap_or_else(|_| "http://localhost:9380/api/v1/agents".into()),
            api_token: std::env::var("PANEL_API_TOKEN").unwrap_or_default(),
            max_rounds: std::env::var("PANEL_MAX_ROUNDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8),
            request_timeout_secs: std::env::var("PANEL_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
        }
    }
}

/// The standard prospecting panel roster.
///
/// Agent ids default to their keys and can be overridden per agent with
/// `PANEL_AGENT_<KEY>_ID`.
pub fn default_registry() -> AgentRegistry {
    AgentRegistry::new(vec![
        panelist("general", "Regional Geologist"),
        panelist("geophysical", "Geophysical Expert"),
        panelist("geochemical", "Geochemical Expert"),
        panelist("achievement", "Survey Archive Expert"),
        host("host", "Moderator"),
    ])
}

fn agent_id(key: &str) -> String {
    std::env::var(format!("PANEL_AGENT_{}_ID", key.to_uppercase()))
        .unwrap_or_else(|_| key.to_string())
}

fn panelist(key: &str, name: &str) -> AgentProfile {
    AgentProfile::new(key, name, &agent_id(key))
}

fn host(key: &str, name: &str) -> AgentProfile {
    AgentProfile::host(key, name, &agent_id(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_roster() {
        let registry = default_registry();
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.panelists().len(), 4);
        assert_eq!(registry.host().unwrap().key, "host");
        assert!(registry.resolve("geochemical").is_some());
        assert!(registry.resolve("achievement").is_some());
    }

    #[test]
    fn test_config_defaults() {
        // Only checks the hard-coded fallbacks; env overrides are
        // process-global and not worth racing in tests.
        let config = PanelConfig::default();
        assert!(config.max_rounds >= 1);
        assert!(config.request_timeout_secs >= 1);
    }
}
