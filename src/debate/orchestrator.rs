//! Debate orchestrator - drives the broadcast -> host-loop debate cycle.
//!
//! Fans the topic out to every panelist, then repeatedly asks the host to
//! either interrogate one panelist or conclude with a structured report.
//! Every transport fault is absorbed here: agent calls degrade to inline
//! error entries, uninterpretable host replies surface as raw text, and
//! the round budget is a policy stop rather than an error. Nothing past
//! the public entry points panics or propagates a transport fault.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use thiserror::Error;
use tracing::{info, warn};

use super::prompts;
use super::state::{DebatePhase, DebateSession, TransitionError};
use crate::events::{EventBus, PanelEvent, SharedEventBus};
use crate::extract::{extract_command, FinishContent, HostCommand};
use crate::registry::{succeeded, AgentRegistry};
use crate::transport::{AgentTransport, Completion, CompletionRequest, TransportError};

/// Configuration for the debate orchestrator.
#[derive(Debug, Clone)]
pub struct DebateConfig {
    /// Maximum host evaluations per debate.
    pub max_rounds: u32,
    /// Operator-supplied reference material appended to every prompt.
    pub reference_material: Option<String>,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            max_rounds: 8,
            reference_material: None,
        }
    }
}

/// Error from the orchestrator's public entry points.
#[derive(Debug, Error)]
pub enum DebateError {
    #[error("a debate is already running")]
    AlreadyRunning,

    #[error("nothing to discuss: topic and transcript are both empty")]
    NothingToDiscuss,

    #[error("no host agent registered")]
    NoHostRegistered,

    #[error("intervention instruction is empty")]
    EmptyInstruction,

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Outcome of a completed debate.
#[derive(Debug, Clone)]
pub struct DebateOutcome {
    /// Terminal phase the debate ended in.
    pub terminal_phase: DebatePhase,
    /// Host evaluations performed.
    pub rounds_completed: u32,
    /// Final report, present only when the host concluded.
    pub report: Option<FinishContent>,
    /// Raw host text shown when the host could not be interpreted.
    pub raw_host_text: Option<String>,
}

impl DebateOutcome {
    /// Whether the host produced a conclusion.
    pub fn is_success(&self) -> bool {
        self.terminal_phase == DebatePhase::Finished
    }

    /// Compact summary line.
    pub fn summary_line(&self) -> String {
        format!(
            "[{}] {} rounds | report={}",
            self.terminal_phase,
            self.rounds_completed,
            self.report.is_some()
        )
    }
}

/// Outcome of an operator intervention.
#[derive(Debug, Clone)]
pub enum InterventionOutcome {
    /// The host concluded with a report.
    Report(FinishContent),
    /// The host replied with something else; shown verbatim.
    RawText(String),
    /// The host could not be reached.
    NoResponse,
}

/// The debate orchestrator. Owns the session, the registry, and the
/// event hand-off to presentation collaborators.
pub struct PanelOrchestrator {
    transport: Arc<dyn AgentTransport>,
    registry: AgentRegistry,
    config: DebateConfig,
    events: SharedEventBus,
    session: DebateSession,
}

impl PanelOrchestrator {
    pub fn new(
        transport: Arc<dyn AgentTransport>,
        registry: AgentRegistry,
        config: DebateConfig,
    ) -> Self {
        Self::with_events(transport, registry, config, EventBus::new().shared())
    }

    pub fn with_events(
        transport: Arc<dyn AgentTransport>,
        registry: AgentRegistry,
        config: DebateConfig,
        events: SharedEventBus,
    ) -> Self {
        let session = DebateSession::new(config.max_rounds);
        Self {
            transport,
            registry,
            config,
            events,
            session,
        }
    }

    pub fn session(&self) -> &DebateSession {
        &self.session
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn events(&self) -> &SharedEventBus {
        &self.events
    }

    /// Subscribe to the engine's event stream.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<PanelEvent> {
        self.events.subscribe()
    }

    /// Reset every agent session and clear the transcript.
    ///
    /// Returns how many of N agents got a fresh session id. Rejected
    /// while a debate is running.
    pub async fn refresh_sessions(&mut self) -> Result<usize, DebateError> {
        if self.session.is_running() {
            return Err(DebateError::AlreadyRunning);
        }
        self.session.transcript.clear();
        let results = self.registry.ensure_sessions(self.transport.as_ref()).await;
        let ok = succeeded(&results);
        info!(succeeded = ok, total = results.len(), "sessions refreshed");
        self.events.publish(PanelEvent::SessionsRefreshed {
            succeeded: ok,
            total: results.len(),
            timestamp: Utc::now(),
        });
        Ok(ok)
    }

    /// Discard the transcript. Only safe while no debate is running.
    pub fn clear_history(&mut self) -> Result<(), DebateError> {
        if self.session.is_running() {
            return Err(DebateError::AlreadyRunning);
        }
        self.session.transcript.clear();
        Ok(())
    }

    /// Run a full debate on `topic`.
    ///
    /// Rejected while a debate is already running, and when the topic is
    /// empty with nothing in the transcript to continue from. A terminal
    /// session is re-armed first: the new debate continues on the same
    /// transcript with a fresh round budget.
    pub async fn start_debate(&mut self, topic: &str) -> Result<DebateOutcome, DebateError> {
        if self.session.is_running() {
            return Err(DebateError::AlreadyRunning);
        }
        if topic.trim().is_empty() && self.session.transcript.is_empty() {
            return Err(DebateError::NothingToDiscuss);
        }
        if self.registry.host().is_none() {
            return Err(DebateError::NoHostRegistered);
        }

        self.session.rearm();
        self.session
            .transition(DebatePhase::Broadcasting, "initial fan-out")?;

        if !topic.trim().is_empty() {
            self.session.transcript.append("user", None, topic);
            self.events.publish(PanelEvent::MessagePosted {
                role: "user".to_string(),
                agent: None,
                content: topic.to_string(),
                references: vec![],
                timestamp: Utc::now(),
            });
        }

        self.broadcast_to_panelists(topic).await;
        let outcome = self.run_host_loop().await?;

        self.events.publish(PanelEvent::DebateConcluded {
            phase: outcome.terminal_phase,
            rounds: outcome.rounds_completed,
            timestamp: Utc::now(),
        });
        info!("{}", outcome.summary_line());
        Ok(outcome)
    }

    /// Inject a priority instruction outside the round loop.
    ///
    /// One-shot side channel: available at any time, does not consult or
    /// modify the round counter or the phase. A FINISH command triggers
    /// the same report and geometry hand-off as the main loop; anything
    /// else comes back as raw text for display.
    pub async fn intervene(&mut self, instruction: &str) -> Result<InterventionOutcome, DebateError> {
        if instruction.trim().is_empty() {
            return Err(DebateError::EmptyInstruction);
        }
        let Some(host) = self.registry.host() else {
            return Err(DebateError::NoHostRegistered);
        };
        let host_key = host.key.clone();

        let entry = format!("(priority directive) {}", instruction);
        self.session.transcript.append("user", None, &entry);
        self.events.publish(PanelEvent::MessagePosted {
            role: "user".to_string(),
            agent: None,
            content: entry,
            references: vec![],
            timestamp: Utc::now(),
        });

        let history = self.session.transcript.render();
        let prompt = self.augmented(prompts::intervention_prompt(instruction, &history));
        let Some(answer) = self.call_agent(&host_key, &prompt, true).await else {
            return Ok(InterventionOutcome::NoResponse);
        };

        match extract_command(&answer) {
            HostCommand::Finish { content } => {
                self.conclude_with_report(&host_key, &content);
                Ok(InterventionOutcome::Report(content))
            }
            _ => {
                self.show_raw_host_text(&host_key, &answer);
                Ok(InterventionOutcome::RawText(answer))
            }
        }
    }

    /// Query one agent directly, outside the debate loop, with the
    /// current history as context.
    pub async fn ask_agent(&mut self, key: &str, question: Option<&str>) -> Option<String> {
        let history = self.session.transcript.render();
        let prompt = self.augmented(prompts::manual_prompt(question, &history));
        if let Some(q) = question {
            self.session.transcript.append("user", None, q);
            self.events.publish(PanelEvent::MessagePosted {
                role: "user".to_string(),
                agent: None,
                content: q.to_string(),
                references: vec![],
                timestamp: Utc::now(),
            });
        }
        self.call_agent(key, &prompt, false).await
    }

    // ── internals ────────────────────────────────────────────────────

    /// Fan the initial prompt out to every panelist concurrently and wait
    /// for all branches to settle. Failures count as settled; no branch
    /// aborts a sibling.
    async fn broadcast_to_panelists(&mut self, topic: &str) {
        let prompt = self.augmented(prompts::initial_prompt(topic));
        let panelists: Vec<(String, String, Option<String>)> = self
            .registry
            .panelists()
            .iter()
            .map(|a| (a.key.clone(), a.agent_id.clone(), a.session_id.clone()))
            .collect();

        let transport = Arc::clone(&self.transport);
        let calls = panelists.into_iter().map(|(key, agent_id, session_id)| {
            let transport = Arc::clone(&transport);
            let prompt = prompt.clone();
            async move {
                let outcome = transport
                    .complete(&agent_id, CompletionRequest::new(prompt, session_id))
                    .await;
                (key, outcome)
            }
        });

        // Settle all, then apply per-branch results sequentially; no
        // shared state is mutated inside the join.
        let results = join_all(calls).await;
        for (key, outcome) in results {
            self.apply_completion(&key, outcome, false);
        }
    }

    /// The host loop: evaluate, interpret, interrogate or conclude.
    async fn run_host_loop(&mut self) -> Result<DebateOutcome, DebateError> {
        loop {
            if !self.session.has_rounds_remaining() {
                // Policy boundary, not an error: stop without a report.
                self.session
                    .transition(DebatePhase::RoundsExhausted, "round budget spent")?;
                return Ok(self.outcome(None, None));
            }
            self.session
                .transition(DebatePhase::HostEvaluating, "host evaluation")?;

            let host_key = match self.registry.host() {
                Some(host) => host.key.clone(),
                None => {
                    self.session
                        .transition(DebatePhase::Aborted, "host missing from registry")?;
                    return Ok(self.outcome(None, None));
                }
            };

            let history = self.session.transcript.render();
            let prompt = self.augmented(prompts::host_prompt(&history));
            let Some(answer) = self.call_agent(&host_key, &prompt, true).await else {
                self.session
                    .transition(DebatePhase::Aborted, "host unavailable")?;
                return Ok(self.outcome(None, None));
            };

            match extract_command(&answer) {
                HostCommand::Unrecognized => {
                    // The loop cannot safely continue once the host cannot
                    // be interpreted; show the raw text and stop.
                    self.show_raw_host_text(&host_key, &answer);
                    self.session
                        .transition(DebatePhase::Aborted, "unrecognized host reply")?;
                    return Ok(self.outcome(None, Some(answer)));
                }
                HostCommand::Finish { content } => {
                    self.conclude_with_report(&host_key, &content);
                    self.session
                        .transition(DebatePhase::Finished, "host concluded")?;
                    return Ok(self.outcome(Some(content), None));
                }
                HostCommand::Ask { target, content } => {
                    let Some((target_key, target_name)) = self
                        .registry
                        .resolve(&target)
                        .map(|a| (a.key.clone(), a.name.clone()))
                    else {
                        self.show_raw_host_text(&host_key, &answer);
                        self.session
                            .transition(DebatePhase::Aborted, "unknown follow-up target")?;
                        return Ok(self.outcome(None, Some(answer)));
                    };

                    self.session
                        .transition(DebatePhase::AgentFollowUp, "host interrogates panelist")?;

                    let host_name = self.display_name(&host_key);
                    let question_entry = format!("(follow-up to {}) {}", target_name, content);
                    self.session
                        .transcript
                        .append(&host_name, Some(&host_key), &question_entry);
                    self.events.publish(PanelEvent::FollowUpIssued {
                        target: target_key.clone(),
                        question: content.clone(),
                        timestamp: Utc::now(),
                    });

                    let prompt = self.augmented(prompts::follow_up_prompt(&content));
                    // A failed follow-up still settles the turn; the error
                    // entry is in the transcript and the host decides next.
                    let _ = self.call_agent(&target_key, &prompt, false).await;
                }
            }
        }
    }

    /// Call one agent. On success the session handle is refreshed and,
    /// when not silent, the answer joins the transcript. Failures are
    /// converted to `None` plus an inline error entry - never thrown.
    async fn call_agent(&mut self, key: &str, prompt: &str, silent: bool) -> Option<String> {
        let (agent_id, session_id) = match self.registry.resolve(key) {
            Some(agent) => (agent.agent_id.clone(), agent.session_id.clone()),
            None => {
                warn!(agent = key, "call to unregistered agent");
                return None;
            }
        };
        let outcome = self
            .transport
            .complete(&agent_id, CompletionRequest::new(prompt, session_id))
            .await;
        self.apply_completion(key, outcome, silent)
    }

    /// Apply one settled completion to the session: session-handle update,
    /// transcript append, event publication.
    fn apply_completion(
        &mut self,
        key: &str,
        outcome: Result<Completion, TransportError>,
        silent: bool,
    ) -> Option<String> {
        let name = self.display_name(key);
        match outcome {
            Ok(completion) => {
                if let Some(session_id) = completion.session_id {
                    self.registry.set_session(key, session_id);
                }
                if !silent {
                    self.session
                        .transcript
                        .append(&name, Some(key), &completion.answer);
                    self.events.publish(PanelEvent::MessagePosted {
                        role: name,
                        agent: Some(key.to_string()),
                        content: completion.answer.clone(),
                        references: completion.reference_chunks,
                        timestamp: Utc::now(),
                    });
                }
                Some(completion.answer)
            }
            Err(error) => {
                warn!(agent = key, %error, "agent call failed");
                if !silent {
                    self.session.transcript.append(
                        "system",
                        Some(key),
                        &format!("request failed: {}", error),
                    );
                    self.events.publish(PanelEvent::AgentCallFailed {
                        agent: key.to_string(),
                        error: error.to_string(),
                        timestamp: Utc::now(),
                    });
                }
                None
            }
        }
    }

    /// FINISH hand-off shared by the host loop and the intervention path:
    /// notify the map layer when the report carries geometry, then record
    /// and publish the report itself.
    fn conclude_with_report(&mut self, host_key: &str, content: &FinishContent) {
        if let Some(report) = content.as_report() {
            if report.has_geometry() {
                self.events.publish(PanelEvent::GeospatialReady {
                    payload: report.clone(),
                    timestamp: Utc::now(),
                });
            }
        }
        let name = self.display_name(host_key);
        let text = content.display_text();
        self.session.transcript.append(&name, Some(host_key), &text);
        self.events.publish(PanelEvent::MessagePosted {
            role: name,
            agent: Some(host_key.to_string()),
            content: text,
            references: vec![],
            timestamp: Utc::now(),
        });
    }

    /// Show the host's reply verbatim when it cannot be interpreted.
    fn show_raw_host_text(&mut self, host_key: &str, raw: &str) {
        let name = self.display_name(host_key);
        self.session.transcript.append(&name, Some(host_key), raw);
        self.events.publish(PanelEvent::MessagePosted {
            role: name,
            agent: Some(host_key.to_string()),
            content: raw.to_string(),
            references: vec![],
            timestamp: Utc::now(),
        });
    }

    fn display_name(&self, key: &str) -> String {
        self.registry
            .resolve(key)
            .map(|a| a.name.clone())
            .unwrap_or_else(|| key.to_string())
    }

    fn augmented(&self, prompt: String) -> String {
        prompts::augment(prompt, self.config.reference_material.as_deref())
    }

    fn outcome(
        &self,
        report: Option<FinishContent>,
        raw_host_text: Option<String>,
    ) -> DebateOutcome {
        DebateOutcome {
            terminal_phase: self.session.phase,
            rounds_completed: self.session.round,
            report,
            raw_host_text,
        }
    }
}
