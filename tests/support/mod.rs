//! Shared test support: a deterministic scripted transport (no LLM calls).

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use orepanel::registry::{AgentProfile, AgentRegistry};
use orepanel::transport::{AgentTransport, Completion, CompletionRequest, TransportError};
use orepanel::{DebateConfig, PanelOrchestrator};

/// One recorded transport call.
#[derive(Debug, Clone)]
pub struct Call {
    pub agent_id: String,
    pub question: String,
    #[allow(dead_code)]
    pub session_id: Option<String>,
}

enum Script {
    Reply {
        answer: String,
        references: Vec<serde_json::Value>,
    },
    Fail,
}

/// Transport answering from per-agent FIFO scripts and recording every call.
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Script>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a reply for an agent; replies are served in push order.
    pub fn push_reply(&self, agent_id: &str, reply: &str) {
        self.push_reply_with_references(agent_id, reply, vec![]);
    }

    /// Queue a reply backed by knowledge-base citation chunks.
    pub fn push_reply_with_references(
        &self,
        agent_id: &str,
        reply: &str,
        references: Vec<serde_json::Value>,
    ) {
        self.scripts
            .lock()
            .unwrap()
            .entry(agent_id.to_string())
            .or_default()
            .push_back(Script::Reply {
                answer: reply.to_string(),
                references,
            });
    }

    /// Queue a transport failure for an agent.
    pub fn push_failure(&self, agent_id: &str) {
        self.scripts
            .lock()
            .unwrap()
            .entry(agent_id.to_string())
            .or_default()
            .push_back(Script::Fail);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, agent_id: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.agent_id == agent_id)
            .collect()
    }
}

#[async_trait]
impl AgentTransport for ScriptedTransport {
    async fn create_session(
        &self,
        agent_id: &str,
        _name: &str,
    ) -> Result<String, TransportError> {
        Ok(format!("sess-{}", agent_id))
    }

    async fn complete(
        &self,
        agent_id: &str,
        request: CompletionRequest,
    ) -> Result<Completion, TransportError> {
        self.calls.lock().unwrap().push(Call {
            agent_id: agent_id.to_string(),
            question: request.question.clone(),
            session_id: request.session_id.clone(),
        });

        let script = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(agent_id)
            .and_then(VecDeque::pop_front);
        match script {
            Some(Script::Reply { answer, references }) => Ok(Completion {
                answer,
                session_id: Some(format!("sess-{}", agent_id)),
                reference_chunks: references,
            }),
            Some(Script::Fail) => Err(TransportError::Api {
                code: 500,
                message: "scripted failure".to_string(),
            }),
            None => Err(TransportError::Api {
                code: 500,
                message: "script exhausted".to_string(),
            }),
        }
    }
}

/// The standard test roster; agent ids equal keys.
pub fn test_registry() -> AgentRegistry {
    AgentRegistry::new(vec![
        AgentProfile::new("general", "Regional Geologist", "general"),
        AgentProfile::new("geophysical", "Geophysical Expert", "geophysical"),
        AgentProfile::host("host", "Moderator", "host"),
    ])
}

pub fn orchestrator_with(
    transport: Arc<ScriptedTransport>,
    max_rounds: u32,
) -> PanelOrchestrator {
    PanelOrchestrator::new(
        transport,
        test_registry(),
        DebateConfig {
            max_rounds,
            reference_material: None,
        },
    )
}

/// Script both panelists with a plain first-round answer.
pub fn script_panelists(transport: &ScriptedTransport) {
    transport.push_reply("general", "porphyry system likely along the contact");
    transport.push_reply("geophysical", "450nT magnetic high in the north block");
}
