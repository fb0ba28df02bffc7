//! Agent registry - the fixed roster of debate participants.
//!
//! Holds each agent's identity plus the mutable conversation-session
//! handle assigned by the transport on first contact. The registry owns
//! the handles exclusively; everything else reads agents through it.

use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::transport::AgentTransport;

/// A registered participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Stable lowercase key, e.g. "geophysical".
    pub key: String,
    /// Display name used as the transcript role.
    pub name: String,
    /// Identifier of the agent in the external service.
    pub agent_id: String,
    /// Opaque session handle; nil until the first successful
    /// session-creation call, reset on explicit refresh.
    pub session_id: Option<String>,
    /// Whether this is the distinguished moderator.
    pub is_host: bool,
}

impl AgentProfile {
    pub fn new(key: &str, name: &str, agent_id: &str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            agent_id: agent_id.to_string(),
            session_id: None,
            is_host: false,
        }
    }

    pub fn host(key: &str, name: &str, agent_id: &str) -> Self {
        Self {
            is_host: true,
            ..Self::new(key, name, agent_id)
        }
    }
}

/// Per-agent outcome of a session bootstrap fan-out.
#[derive(Debug, Clone)]
pub struct BootstrapResult {
    pub key: String,
    pub outcome: Result<String, String>,
}

/// Fixed, ordered set of agents for one panel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentRegistry {
    agents: Vec<AgentProfile>,
}

impl AgentRegistry {
    pub fn new(agents: Vec<AgentProfile>) -> Self {
        Self { agents }
    }

    /// Resolve a key case-insensitively; the host emits keys with
    /// arbitrary capitalization.
    pub fn resolve(&self, key: &str) -> Option<&AgentProfile> {
        self.agents
            .iter()
            .find(|a| a.key.eq_ignore_ascii_case(key))
    }

    /// The distinguished moderator agent.
    pub fn host(&self) -> Option<&AgentProfile> {
        self.agents.iter().find(|a| a.is_host)
    }

    /// Every non-host agent, in registration order.
    pub fn panelists(&self) -> Vec<&AgentProfile> {
        self.agents.iter().filter(|a| !a.is_host).collect()
    }

    pub fn agents(&self) -> &[AgentProfile] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Record a session handle issued by the transport.
    pub fn set_session(&mut self, key: &str, session_id: String) {
        if let Some(agent) = self
            .agents
            .iter_mut()
            .find(|a| a.key.eq_ignore_ascii_case(key))
        {
            agent.session_id = Some(session_id);
        }
    }

    /// Reset every session handle to nil.
    pub fn clear_sessions(&mut self) {
        for agent in &mut self.agents {
            agent.session_id = None;
        }
    }

    /// Create one session per agent, in parallel and independently.
    ///
    /// A failure for one agent does not abort the others; each branch
    /// settles on its own and the per-agent outcomes are returned so the
    /// success count is a property of the data. Existing handles are
    /// discarded first.
    pub async fn ensure_sessions(
        &mut self,
        transport: &dyn AgentTransport,
    ) -> Vec<BootstrapResult> {
        self.clear_sessions();

        let session_name = format!("panel-{}", Utc::now().timestamp_millis());
        let calls = self.agents.iter().map(|agent| {
            let key = agent.key.clone();
            let agent_id = agent.agent_id.clone();
            let name = session_name.clone();
            async move {
                let outcome = transport
                    .create_session(&agent_id, &name)
                    .await
                    .map_err(|e| e.to_string());
                BootstrapResult { key, outcome }
            }
        });

        let results = join_all(calls).await;
        for result in &results {
            match &result.outcome {
                Ok(session_id) => self.set_session(&result.key, session_id.clone()),
                Err(error) => warn!(agent = %result.key, %error, "session creation failed"),
            }
        }
        results
    }
}

/// How many bootstrap branches succeeded.
pub fn succeeded(results: &[BootstrapResult]) -> usize {
    results.iter().filter(|r| r.outcome.is_ok()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_registry() -> AgentRegistry {
        AgentRegistry::new(vec![
            AgentProfile::new("general", "Regional Geologist", "agent-gen"),
            AgentProfile::new("geophysical", "Geophysical Expert", "agent-geo"),
            AgentProfile::host("host", "Moderator", "agent-host"),
        ])
    }

    #[test]
    fn test_resolve_case_insensitive() {
        let registry = sample_registry();
        let agent = registry.resolve("Geophysical").unwrap();
        assert_eq!(agent.key, "geophysical");
        assert!(registry.resolve("GENERAL").is_some());
        assert!(registry.resolve("geochemical").is_none());
    }

    #[test]
    fn test_host_and_panelists_split() {
        let registry = sample_registry();
        assert_eq!(registry.host().unwrap().key, "host");

        let panelists = registry.panelists();
        assert_eq!(panelists.len(), 2);
        assert!(panelists.iter().all(|a| !a.is_host));
    }

    #[test]
    fn test_panelists_preserve_registration_order() {
        let registry = sample_registry();
        let keys: Vec<&str> = registry.panelists().iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, ["general", "geophysical"]);
    }

    #[test]
    fn test_session_lifecycle() {
        let mut registry = sample_registry();
        assert!(registry.resolve("general").unwrap().session_id.is_none());

        registry.set_session("GENERAL", "sess-1".to_string());
        assert_eq!(
            registry.resolve("general").unwrap().session_id.as_deref(),
            Some("sess-1")
        );

        registry.clear_sessions();
        assert!(registry.resolve("general").unwrap().session_id.is_none());
    }

    #[test]
    fn test_succeeded_counts_ok_branches() {
        let results = vec![
            BootstrapResult {
                key: "general".to_string(),
                outcome: Ok("s-1".to_string()),
            },
            BootstrapResult {
                key: "host".to_string(),
                outcome: Err("timeout".to_string()),
            },
        ];
        assert_eq!(succeeded(&results), 1);
    }
}
