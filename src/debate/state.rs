//! Debate state machine - phases, transitions, and session tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::transcript::Transcript;

/// Phase of a debate session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebatePhase {
    /// Session created but no debate running.
    Idle,
    /// Initial fan-out to every panelist is in flight.
    Broadcasting,
    /// The host is deciding: interrogate someone or conclude.
    HostEvaluating,
    /// One panelist is answering a host follow-up.
    AgentFollowUp,
    /// The host emitted a final report.
    Finished,
    /// The host could not be interpreted (or reached); raw text shown.
    Aborted,
    /// Round budget spent without a conclusion. Policy stop, not an error.
    RoundsExhausted,
}

impl DebatePhase {
    /// Whether this is a terminal phase.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Aborted | Self::RoundsExhausted)
    }

    /// Valid transitions from this phase.
    pub fn valid_transitions(self) -> &'static [DebatePhase] {
        match self {
            Self::Idle => &[Self::Broadcasting],
            // Broadcast branches settle individually and never abort the
            // debate; the first abort can only come out of a host round.
            Self::Broadcasting => &[Self::HostEvaluating, Self::RoundsExhausted],
            Self::HostEvaluating => &[Self::AgentFollowUp, Self::Finished, Self::Aborted],
            Self::AgentFollowUp => &[Self::HostEvaluating, Self::RoundsExhausted, Self::Aborted],
            Self::Finished | Self::Aborted | Self::RoundsExhausted => &[],
        }
    }
}

impl std::fmt::Display for DebatePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Broadcasting => write!(f, "broadcasting"),
            Self::HostEvaluating => write!(f, "host_evaluating"),
            Self::AgentFollowUp => write!(f, "agent_follow_up"),
            Self::Finished => write!(f, "finished"),
            Self::Aborted => write!(f, "aborted"),
            Self::RoundsExhausted => write!(f, "rounds_exhausted"),
        }
    }
}

/// A phase transition record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: DebatePhase,
    pub to: DebatePhase,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
}

/// Error for invalid state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub from: DebatePhase,
    pub to: DebatePhase,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid transition {} -> {} (allowed: {:?})",
            self.from,
            self.to,
            self.from.valid_transitions()
        )
    }
}

impl std::error::Error for TransitionError {}

/// A debate session: explicit state owned by the orchestrator, never
/// hidden in globals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateSession {
    /// Unique session identifier.
    pub id: String,
    /// Current phase.
    pub phase: DebatePhase,
    /// Host evaluations performed in the current debate.
    pub round: u32,
    /// Maximum host evaluations per debate.
    pub max_rounds: u32,
    /// Everything said so far. Cleared only by explicit reset.
    pub transcript: Transcript,
    /// Transition history.
    pub transitions: Vec<PhaseTransition>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
}

impl DebateSession {
    pub fn new(max_rounds: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            phase: DebatePhase::Idle,
            round: 0,
            max_rounds,
            transcript: Transcript::new(),
            transitions: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Whether a debate is currently in flight. Terminal phases and Idle
    /// both count as not running.
    pub fn is_running(&self) -> bool {
        !self.phase.is_terminal() && self.phase != DebatePhase::Idle
    }

    pub fn is_complete(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Whether the host may be evaluated again this debate.
    pub fn has_rounds_remaining(&self) -> bool {
        self.round < self.max_rounds
    }

    /// Transition to a new phase with a reason.
    ///
    /// The round counter increments on entering `HostEvaluating`.
    pub fn transition(&mut self, to: DebatePhase, reason: &str) -> Result<(), TransitionError> {
        if !self.phase.valid_transitions().contains(&to) {
            return Err(TransitionError {
                from: self.phase,
                to,
            });
        }

        self.transitions.push(PhaseTransition {
            from: self.phase,
            to,
            timestamp: Utc::now(),
            reason: reason.to_string(),
        });
        self.phase = to;

        if to == DebatePhase::HostEvaluating {
            self.round += 1;
        }

        Ok(())
    }

    /// Re-arm a terminal session for another debate on the same
    /// transcript. The round counter resets; history stays.
    pub fn rearm(&mut self) {
        if self.phase.is_terminal() {
            self.transitions.push(PhaseTransition {
                from: self.phase,
                to: DebatePhase::Idle,
                timestamp: Utc::now(),
                reason: "re-armed for a new debate".to_string(),
            });
            self.phase = DebatePhase::Idle;
            self.round = 0;
        }
    }

    /// Compact status line.
    pub fn status_line(&self) -> String {
        format!(
            "[{}] round {}/{} | {} transcript entries",
            self.phase,
            self.round,
            self.max_rounds,
            self.transcript.len()
        )
    }
}
